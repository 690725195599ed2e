use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    errors::ServiceError,
    handlers::common::MessageResponse,
    services::orders::{OrderDetail, OrderPayload, OrderSummary},
    AppState,
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({"message": "Pedido creado correctamente", "id_pedido": 42}))]
pub struct OrderCreatedResponse {
    pub message: String,
    pub id_pedido: i32,
}

/// Create an order with its lines, sales entries and stock decrements
#[utoipa::path(
    post,
    path = "/pedidos",
    tag = "orders",
    request_body = OrderPayload,
    responses(
        (status = 200, description = "Order created", body = OrderCreatedResponse),
        (status = 500, description = "Order rejected; nothing was persisted", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<OrderPayload>,
) -> Result<Json<OrderCreatedResponse>, ServiceError> {
    let id_pedido = state.services.orders.create_order(payload).await?;
    Ok(Json(OrderCreatedResponse {
        message: "Pedido creado correctamente".to_string(),
        id_pedido,
    }))
}

#[utoipa::path(
    get,
    path = "/pedidos",
    tag = "orders",
    responses(
        (status = 200, description = "All orders with their owner", body = [OrderSummary]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderSummary>>, ServiceError> {
    Ok(Json(state.services.orders.list_orders().await?))
}

#[utoipa::path(
    get,
    path = "/pedidos/recientes",
    tag = "orders",
    responses(
        (status = 200, description = "Most recently placed orders", body = [OrderSummary]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_recent_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<OrderSummary>>, ServiceError> {
    Ok(Json(state.services.orders.list_recent_orders().await?))
}

#[utoipa::path(
    get,
    path = "/pedidos/{id}",
    tag = "orders",
    params(("id" = i32, Path, description = "Order id")),
    responses(
        (status = 200, description = "Order with its products", body = OrderDetail),
        (status = 404, description = "Order not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OrderDetail>, ServiceError> {
    Ok(Json(state.services.orders.get_order(id).await?))
}

/// Update the order header; a non-empty `lineas` replaces the order lines
#[utoipa::path(
    put,
    path = "/pedidos/{id}",
    tag = "orders",
    params(("id" = i32, Path, description = "Order id")),
    request_body = OrderPayload,
    responses(
        (status = 200, description = "Order updated", body = MessageResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<OrderPayload>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.services.orders.update_order(id, payload).await?;
    Ok(Json(MessageResponse::new("Pedido actualizado correctamente")))
}
