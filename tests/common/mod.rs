#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use storefront_admin_api::{
    config::AppConfig,
    db::{self, DbPool},
    entities::{product, sale, user},
    services::users::hash_password,
    AppState,
};
use tower::ServiceExt;

/// Helper harness for spinning up the application against a private
/// in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with a fresh, migrated schema.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_000,
            "test".to_string(),
        );
        // one connection: every pooled sqlite memory connection is its own database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = storefront_admin_api::app_router(state.clone());

        Self { router, state }
    }

    pub fn db(&self) -> &DbPool {
        &self.state.db
    }

    /// Send a request and return the raw response.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Send a bodiless request carrying extra headers.
    pub async fn send_with_headers(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder.body(Body::empty()).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Send a request and decode the JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.send(method, uri, body).await;
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse response body")
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn seed_user(&self, name: &str, email: &str, created_at: DateTime<Utc>) -> user::Model {
        user::ActiveModel {
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            role: Set("cliente".to_string()),
            status: Set(Some("activo".to_string())),
            password_hash: Set(hash_password("initial-password").expect("hash seed password")),
            last_login_at: Set(None),
            created_at: Set(created_at),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed user for tests")
    }

    pub async fn seed_product(
        &self,
        name: &str,
        category: &str,
        price: Decimal,
        stock: i32,
    ) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            description: Set(format!("{} for integration tests", name)),
            category: Set(category.to_string()),
            brand: Set(Some("Acme".to_string())),
            kind: Set("fisico".to_string()),
            price: Set(price),
            stock: Set(stock),
            photo: Set(None),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed product for tests")
    }

    pub async fn seed_sale(
        &self,
        product_id: i32,
        sold_at: DateTime<Utc>,
        quantity: i32,
        total: Decimal,
    ) -> sale::Model {
        sale::ActiveModel {
            product_id: Set(product_id),
            sold_at: Set(sold_at),
            quantity: Set(quantity),
            total: Set(total),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .expect("seed sale for tests")
    }

    pub async fn product(&self, id: i32) -> product::Model {
        product::Entity::find_by_id(id)
            .one(self.db())
            .await
            .expect("query product")
            .expect("product should exist")
    }
}
