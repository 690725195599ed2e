pub mod common;
pub mod orders;
pub mod products;
pub mod sales;
pub mod users;

use crate::config::AppConfig;
use crate::db::DatabaseAccess;
use crate::services::{
    analytics::AnalyticsService, orders::OrderService, products::ProductService,
    users::UserService,
};
use std::sync::Arc;

pub use crate::AppState;

/// Services layer used by the HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub products: Arc<ProductService>,
    pub users: Arc<UserService>,
    pub analytics: Arc<AnalyticsService>,
}

impl AppServices {
    pub fn new(db: DatabaseAccess, config: &AppConfig) -> Self {
        Self {
            orders: Arc::new(OrderService::new(db.clone(), config.dashboard_list_limit)),
            products: Arc::new(ProductService::new(
                db.clone(),
                config.low_stock_threshold,
                config.dashboard_list_limit,
            )),
            users: Arc::new(UserService::new(db.clone())),
            analytics: Arc::new(AnalyticsService::new(db)),
        }
    }
}
