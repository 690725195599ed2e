mod common;

use axum::http::{Method, StatusCode};
use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde_json::{json, Value};
use storefront_admin_api::entities::{order, order_line, sale};

use common::TestApp;

fn order_body(user_id: i32, lines: Value) -> Value {
    json!({
        "id_usuario": user_id,
        "estado": "pendiente",
        "direccion": "Calle Mayor 1",
        "ciudad": "Madrid",
        "pais": "España",
        "codigo_postal": "28013",
        "metodo_pago": "tarjeta",
        "cantidad_total": 55.0,
        "lineas": lines
    })
}

#[tokio::test]
async fn create_order_writes_lines_sales_and_decrements_stock() {
    let app = TestApp::new().await;
    let customer = app.seed_user("Lucia", "lucia@example.com", Utc::now()).await;
    let a = app.seed_product("Auriculares", "Electronica", dec!(10.00), 10).await;
    let b = app.seed_product("Bombilla", "Hogar", dec!(25.00), 5).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/pedidos",
            Some(order_body(
                customer.id,
                json!([
                    {"id_producto": a.id, "cantidad": 3, "precio": 10.0},
                    {"id_producto": b.id, "cantidad": 1, "precio": 25.0}
                ]),
            )),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Pedido creado correctamente");
    let order_id = body["id_pedido"].as_i64().expect("order id") as i32;

    assert_eq!(app.product(a.id).await.stock, 7);
    assert_eq!(app.product(b.id).await.stock, 4);

    let sales = sale::Entity::find()
        .order_by_asc(sale::Column::Id)
        .all(app.db())
        .await
        .expect("query sales");
    assert_eq!(sales.len(), 2);
    assert_eq!(sales[0].product_id, a.id);
    assert_eq!(sales[0].quantity, 3);
    assert_eq!(sales[0].total, dec!(30.00));
    assert_eq!(sales[1].product_id, b.id);
    assert_eq!(sales[1].total, dec!(25.00));

    let lines = order_line::Entity::find()
        .filter(order_line::Column::OrderId.eq(order_id))
        .order_by_asc(order_line::Column::Id)
        .all(app.db())
        .await
        .expect("query order lines");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].sale_id, Some(sales[0].id));
    assert_eq!(lines[1].sale_id, Some(sales[1].id));

    let stored = order::Entity::find_by_id(order_id)
        .one(app.db())
        .await
        .expect("query order")
        .expect("order should exist");
    // the client total is stored as sent
    assert_eq!(stored.total, dec!(55.00));

    let (status, detail) = app.get(&format!("/pedidos/{}", order_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["id"], order_id);
    assert_eq!(detail["cliente_nombre"], "Lucia");
    assert_eq!(detail["cliente_email"], "lucia@example.com");
    assert_eq!(detail["fecha"], Utc::now().format("%Y-%m-%d").to_string());

    let products = detail["productos"].as_array().expect("productos array");
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["id"], a.id);
    assert_eq!(products[0]["nombre"], "Auriculares");
    assert_eq!(products[0]["cantidad"], 3);
    assert_eq!(products[0]["subtotal"].as_f64(), Some(30.0));
    assert_eq!(products[1]["subtotal"].as_f64(), Some(25.0));
}

#[tokio::test]
async fn stock_is_allowed_to_go_negative() {
    let app = TestApp::new().await;
    let customer = app.seed_user("Pablo", "pablo@example.com", Utc::now()).await;
    let item = app.seed_product("Taza", "Hogar", dec!(4.50), 2).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/pedidos",
            Some(order_body(
                customer.id,
                json!([{"id_producto": item.id, "cantidad": 5, "precio": 4.5}]),
            )),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.product(item.id).await.stock, -3);
}

#[tokio::test]
async fn failing_line_rolls_back_the_whole_order() {
    let app = TestApp::new().await;
    let customer = app.seed_user("Marta", "marta@example.com", Utc::now()).await;
    let a = app.seed_product("Auriculares", "Electronica", dec!(10.00), 10).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/pedidos",
            Some(order_body(
                customer.id,
                json!([
                    {"id_producto": a.id, "cantidad": 3, "precio": 10.0},
                    {"id_producto": 999_999, "cantidad": 1, "precio": 1.0}
                ]),
            )),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().is_some());

    assert_eq!(order::Entity::find().count(app.db()).await.unwrap(), 0);
    assert_eq!(sale::Entity::find().count(app.db()).await.unwrap(), 0);
    assert_eq!(order_line::Entity::find().count(app.db()).await.unwrap(), 0);
    assert_eq!(app.product(a.id).await.stock, 10);
}

#[tokio::test]
async fn overflowing_line_amount_is_a_server_error_and_rolls_back() {
    let app = TestApp::new().await;
    let customer = app.seed_user("Marta", "marta@example.com", Utc::now()).await;
    let a = app.seed_product("Auriculares", "Electronica", dec!(10.00), 10).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/pedidos",
            Some(order_body(
                customer.id,
                json!([
                    {"id_producto": a.id, "cantidad": 3, "precio": 10.0},
                    {"id_producto": a.id, "cantidad": 1_000_000_000, "precio": 1e20}
                ]),
            )),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["message"].as_str().unwrap().contains("overflows"));
    assert_eq!(order::Entity::find().count(app.db()).await.unwrap(), 0);
    assert_eq!(sale::Entity::find().count(app.db()).await.unwrap(), 0);
    assert_eq!(app.product(a.id).await.stock, 10);
}

#[tokio::test]
async fn overflowing_replacement_lines_are_rejected() {
    let app = TestApp::new().await;
    let customer = app.seed_user("Lucia", "lucia@example.com", Utc::now()).await;
    let a = app.seed_product("Auriculares", "Electronica", dec!(10.00), 10).await;

    let (_, created) = app
        .request(
            Method::POST,
            "/pedidos",
            Some(order_body(
                customer.id,
                json!([{"id_producto": a.id, "cantidad": 2, "precio": 10.0}]),
            )),
        )
        .await;
    let order_id = created["id_pedido"].as_i64().unwrap();

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/pedidos/{}", order_id),
            Some(order_body(
                customer.id,
                json!([{"id_producto": a.id, "cantidad": 1_000_000_000, "precio": 1e20}]),
            )),
        )
        .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    let (status, detail) = app.get(&format!("/pedidos/{}", order_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["productos"].as_array().unwrap().len(), 1);
    assert_eq!(detail["productos"][0]["subtotal"].as_f64(), Some(20.0));
}

#[tokio::test]
async fn order_without_lines_only_writes_the_header() {
    let app = TestApp::new().await;
    let customer = app.seed_user("Ines", "ines@example.com", Utc::now()).await;

    let (status, body) = app
        .request(Method::POST, "/pedidos", Some(order_body(customer.id, json!([]))))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, detail) = app.get(&format!("/pedidos/{}", body["id_pedido"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["productos"], json!([]));
    assert_eq!(sale::Entity::find().count(app.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn update_with_empty_lines_keeps_existing_lines() {
    let app = TestApp::new().await;
    let customer = app.seed_user("Lucia", "lucia@example.com", Utc::now()).await;
    let a = app.seed_product("Auriculares", "Electronica", dec!(10.00), 10).await;

    let (_, created) = app
        .request(
            Method::POST,
            "/pedidos",
            Some(order_body(
                customer.id,
                json!([{"id_producto": a.id, "cantidad": 2, "precio": 10.0}]),
            )),
        )
        .await;
    let order_id = created["id_pedido"].as_i64().unwrap();

    let mut update = order_body(customer.id, json!([]));
    update["estado"] = json!("enviado");
    update["ciudad"] = json!("Sevilla");

    let (status, body) = app
        .request(Method::PUT, &format!("/pedidos/{}", order_id), Some(update))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Pedido actualizado correctamente");

    let (_, detail) = app.get(&format!("/pedidos/{}", order_id)).await;
    assert_eq!(detail["estado"], "enviado");
    assert_eq!(detail["ciudad"], "Sevilla");
    assert_eq!(detail["productos"].as_array().unwrap().len(), 1);
    assert_eq!(detail["productos"][0]["cantidad"], 2);
}

#[tokio::test]
async fn update_with_lines_replaces_them_without_touching_sales_or_stock() {
    let app = TestApp::new().await;
    let customer = app.seed_user("Lucia", "lucia@example.com", Utc::now()).await;
    let a = app.seed_product("Auriculares", "Electronica", dec!(10.00), 10).await;
    let b = app.seed_product("Bombilla", "Hogar", dec!(25.00), 5).await;

    let (_, created) = app
        .request(
            Method::POST,
            "/pedidos",
            Some(order_body(
                customer.id,
                json!([{"id_producto": a.id, "cantidad": 3, "precio": 10.0}]),
            )),
        )
        .await;
    let order_id = created["id_pedido"].as_i64().unwrap();

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/pedidos/{}", order_id),
            Some(order_body(
                customer.id,
                json!([
                    {"id_producto": b.id, "cantidad": 2, "precio": 25.0},
                    {"id_producto": a.id, "cantidad": 1, "precio": 9.5}
                ]),
            )),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let lines = order_line::Entity::find()
        .filter(order_line::Column::OrderId.eq(order_id as i32))
        .order_by_asc(order_line::Column::Id)
        .all(app.db())
        .await
        .unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].product_id, b.id);
    assert!(lines.iter().all(|line| line.sale_id.is_none()));

    // only the original create wrote ledger entries and moved stock
    assert_eq!(sale::Entity::find().count(app.db()).await.unwrap(), 1);
    assert_eq!(app.product(a.id).await.stock, 7);
    assert_eq!(app.product(b.id).await.stock, 5);

    let (_, detail) = app.get(&format!("/pedidos/{}", order_id)).await;
    assert_eq!(detail["productos"][0]["subtotal"].as_f64(), Some(50.0));
    assert_eq!(detail["productos"][1]["subtotal"].as_f64(), Some(9.5));
}

#[tokio::test]
async fn update_of_missing_order_succeeds_without_effect() {
    let app = TestApp::new().await;
    let customer = app.seed_user("Lucia", "lucia@example.com", Utc::now()).await;

    let (status, _) = app
        .request(Method::PUT, "/pedidos/999999", Some(order_body(customer.id, json!([]))))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(order::Entity::find().count(app.db()).await.unwrap(), 0);
}

#[tokio::test]
async fn missing_order_is_not_found() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/pedidos/999999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Pedido no encontrado");
}

#[tokio::test]
async fn order_lists_join_the_customer_and_recent_is_capped() {
    let app = TestApp::new().await;
    let customer = app.seed_user("Lucia", "lucia@example.com", Utc::now()).await;

    for _ in 0..7 {
        let (status, _) = app
            .request(Method::POST, "/pedidos", Some(order_body(customer.id, json!([]))))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, all) = app.get("/pedidos").await;
    assert_eq!(status, StatusCode::OK);
    let all = all.as_array().unwrap();
    assert_eq!(all.len(), 7);
    assert_eq!(all[0]["cliente_nombre"], "Lucia");
    assert_eq!(all[0]["total"].as_f64(), Some(55.0));

    let (status, recent) = app.get("/pedidos/recientes").await;
    assert_eq!(status, StatusCode::OK);
    let recent = recent.as_array().unwrap();
    assert_eq!(recent.len(), 5);
    let ids: Vec<i64> = recent.iter().map(|o| o["id"].as_i64().unwrap()).collect();
    let mut sorted = ids.clone();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    assert_eq!(ids, sorted);
    assert_eq!(ids[0], 7);
}
