use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    errors::ServiceError,
    handlers::common::MessageResponse,
    services::products::{LowStockCount, ProductPayload, ProductResponse, TopProduct},
    AppState,
};

#[utoipa::path(
    get,
    path = "/productos",
    tag = "products",
    responses(
        (status = 200, description = "Full catalog", body = [ProductResponse]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, ServiceError> {
    Ok(Json(state.services.products.list_products().await?))
}

#[utoipa::path(
    get,
    path = "/productos/{id}",
    tag = "products",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<ProductResponse>, ServiceError> {
    Ok(Json(state.services.products.get_product(id).await?))
}

#[utoipa::path(
    post,
    path = "/productos",
    tag = "products",
    request_body = ProductPayload,
    responses(
        (status = 200, description = "Product created", body = MessageResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.services.products.create_product(payload).await?;
    Ok(Json(MessageResponse::new("Producto creado correctamente")))
}

#[utoipa::path(
    put,
    path = "/productos/{id}",
    tag = "products",
    params(("id" = i32, Path, description = "Product id")),
    request_body = ProductPayload,
    responses(
        (status = 200, description = "Product updated", body = MessageResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.services.products.update_product(id, payload).await?;
    Ok(Json(MessageResponse::new("Producto actualizado correctamente")))
}

#[utoipa::path(
    delete,
    path = "/productos/{id}",
    tag = "products",
    params(("id" = i32, Path, description = "Product id")),
    responses(
        (status = 200, description = "Product deleted", body = MessageResponse),
        (status = 500, description = "Product still referenced or database failure", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.services.products.delete_product(id).await?;
    Ok(Json(MessageResponse::new("Producto eliminado correctamente")))
}

#[utoipa::path(
    get,
    path = "/productos/mas_vendidos",
    tag = "products",
    responses(
        (status = 200, description = "Best selling products", body = [TopProduct]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn top_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<TopProduct>>, ServiceError> {
    Ok(Json(state.services.products.top_products().await?))
}

/// Number of products at or below the low-stock threshold, as a one-element list
#[utoipa::path(
    get,
    path = "/productos/poco_stock",
    tag = "products",
    responses(
        (status = 200, description = "Low stock count", body = [LowStockCount]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn low_stock(
    State(state): State<AppState>,
) -> Result<Json<Vec<LowStockCount>>, ServiceError> {
    let count = state.services.products.low_stock_count().await?;
    Ok(Json(vec![count]))
}
