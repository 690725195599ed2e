mod common;

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use sea_orm::EntityTrait;
use serde_json::json;
use storefront_admin_api::{entities::user, services::users::verify_password};

use common::TestApp;

async fn stored_hash(app: &TestApp, id: i32) -> String {
    user::Entity::find_by_id(id)
        .one(app.db())
        .await
        .expect("query user")
        .expect("user should exist")
        .password_hash
}

#[tokio::test]
async fn user_views_never_expose_the_password() {
    let app = TestApp::new().await;
    let seeded = app.seed_user("Lucia", "lucia@example.com", Utc::now()).await;

    let (status, list) = app.get("/users").await;
    assert_eq!(status, StatusCode::OK);
    let first = &list.as_array().unwrap()[0];
    assert_eq!(first["id"], seeded.id);
    assert_eq!(first["email"], "lucia@example.com");
    assert_eq!(first["estado"], "activo");
    assert!(first["ultima_sesion"].is_null());
    assert!(first.get("password").is_none());
    assert!(first.get("password_hash").is_none());

    let (status, single) = app.get(&format!("/users/{}", seeded.id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(single["name"], "Lucia");
    assert!(single.get("password_hash").is_none());
}

#[tokio::test]
async fn update_without_password_keeps_the_stored_hash() {
    let app = TestApp::new().await;
    let seeded = app.seed_user("Lucia", "lucia@example.com", Utc::now()).await;

    for password in [json!(null), json!("")] {
        let (status, body) = app
            .request(
                Method::PUT,
                &format!("/users/{}", seeded.id),
                Some(json!({
                    "name": "Lucia Gomez",
                    "email": "lucia.gomez@example.com",
                    "role": "admin",
                    "estado": "inactivo",
                    "password": password
                })),
            )
            .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "Lucia Gomez");
        assert_eq!(body["role"], "admin");
        assert_eq!(body["estado"], "inactivo");
    }

    assert_eq!(stored_hash(&app, seeded.id).await, seeded.password_hash);
}

#[tokio::test]
async fn update_with_password_stores_a_new_hash() {
    let app = TestApp::new().await;
    let seeded = app.seed_user("Lucia", "lucia@example.com", Utc::now()).await;

    let (status, body) = app
        .request(
            Method::PUT,
            &format!("/users/{}", seeded.id),
            Some(json!({
                "name": "Lucia",
                "email": "lucia@example.com",
                "role": "cliente",
                "estado": "activo",
                "password": "nueva-clave"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("password").is_none());

    let hash = stored_hash(&app, seeded.id).await;
    assert_ne!(hash, "nueva-clave");
    assert!(verify_password("nueva-clave", &hash));
    assert!(!verify_password("initial-password", &hash));
}

#[tokio::test]
async fn update_of_missing_user_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::PUT,
            "/users/999999",
            Some(json!({
                "name": "Nadie",
                "email": "nadie@example.com",
                "role": "cliente",
                "estado": "activo"
            })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Usuario no encontrado");
}

#[tokio::test]
async fn deleted_user_is_gone() {
    let app = TestApp::new().await;
    let seeded = app.seed_user("Lucia", "lucia@example.com", Utc::now()).await;

    let (status, body) = app
        .request(Method::DELETE, &format!("/users/{}", seeded.id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Usuario eliminado correctamente");

    let (status, body) = app.get(&format!("/users/{}", seeded.id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Usuario no encontrado");
}

#[tokio::test]
async fn users_last_month_counts_recent_signups() {
    let app = TestApp::new().await;
    let now = Utc::now();
    app.seed_user("Nueva", "nueva@example.com", now - Duration::days(2)).await;
    app.seed_user("Reciente", "reciente@example.com", now - Duration::days(20)).await;
    app.seed_user("Antigua", "antigua@example.com", now - Duration::days(45)).await;

    let (status, body) = app.get("/users/users_ultimo_mes").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([{"total_users": 2}]));
}
