//! Storefront Admin API
//!
//! Backend for an e-commerce admin dashboard: catalog and user management,
//! the transactional order workflow, and sales reports over the sales ledger.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    http::HeaderValue,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::db::{DatabaseAccess, DbPool};

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(DatabaseAccess::new(db.clone()), &config);
        Self {
            db,
            config,
            services,
        }
    }
}

/// Dashboard endpoints
pub fn api_routes() -> Router<AppState> {
    let orders = Router::new()
        .route(
            "/pedidos",
            get(handlers::orders::list_orders).post(handlers::orders::create_order),
        )
        .route("/pedidos/recientes", get(handlers::orders::list_recent_orders))
        .route(
            "/pedidos/:id",
            get(handlers::orders::get_order).put(handlers::orders::update_order),
        );

    let products = Router::new()
        .route(
            "/productos",
            get(handlers::products::list_products).post(handlers::products::create_product),
        )
        .route("/productos/mas_vendidos", get(handlers::products::top_products))
        .route("/productos/poco_stock", get(handlers::products::low_stock))
        .route(
            "/productos/:id",
            get(handlers::products::get_product)
                .put(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        );

    let users = Router::new()
        .route("/users", get(handlers::users::list_users))
        .route("/users/users_ultimo_mes", get(handlers::users::users_last_month))
        .route(
            "/users/:id",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        );

    let sales = Router::new()
        .route("/ventas/mensual", get(handlers::sales::monthly_sales))
        .route(
            "/ventas/mensuales_ultimo_mes",
            get(handlers::sales::monthly_sales_last_month),
        )
        .route(
            "/ventas/total_ultimo_mes",
            get(handlers::sales::last_month_sale_count),
        )
        .route("/ventas/categorias", get(handlers::sales::category_sales))
        .route(
            "/ventas/categoria/detalle",
            get(handlers::sales::category_sales_detail),
        )
        .route("/ventas/tendencia", get(handlers::sales::sales_trend));

    Router::new()
        .merge(orders)
        .merge(products)
        .merge(users)
        .merge(sales)
}

/// CORS policy: any origin unless explicit origins are configured and the
/// permissive flag is off
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    if cfg.should_allow_permissive_cors() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Full application router with middleware applied
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::<AppState>::new()
        .route("/", get(|| async { "storefront-admin-api up" }))
        .nest("/health", health::health_routes())
        .merge(api_routes())
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(cors)
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
