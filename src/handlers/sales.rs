//! Sales-ledger report endpoints backing the dashboard charts.

use axum::{extract::State, Json};

use crate::{
    errors::ServiceError,
    services::analytics::{CategoryChart, CategorySalesData, SalesData, SalesTrend},
    AppState,
};

#[utoipa::path(
    get,
    path = "/ventas/mensual",
    tag = "sales",
    responses(
        (status = 200, description = "Revenue per month over the trailing twelve months", body = [SalesData]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn monthly_sales(
    State(state): State<AppState>,
) -> Result<Json<Vec<SalesData>>, ServiceError> {
    Ok(Json(state.services.analytics.monthly_sales_trend().await?))
}

#[utoipa::path(
    get,
    path = "/ventas/mensuales_ultimo_mes",
    tag = "sales",
    responses(
        (status = 200, description = "Revenue of the last full month", body = [SalesData]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn monthly_sales_last_month(
    State(state): State<AppState>,
) -> Result<Json<Vec<SalesData>>, ServiceError> {
    Ok(Json(state.services.analytics.monthly_sales_last_month().await?))
}

#[utoipa::path(
    get,
    path = "/ventas/total_ultimo_mes",
    tag = "sales",
    responses(
        (status = 200, description = "Number of sales entries in the last full month", body = [SalesData]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn last_month_sale_count(
    State(state): State<AppState>,
) -> Result<Json<Vec<SalesData>>, ServiceError> {
    Ok(Json(state.services.analytics.last_month_sale_count().await?))
}

#[utoipa::path(
    get,
    path = "/ventas/categorias",
    tag = "sales",
    responses(
        (status = 200, description = "Revenue per category, largest first", body = [CategorySalesData]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn category_sales(
    State(state): State<AppState>,
) -> Result<Json<Vec<CategorySalesData>>, ServiceError> {
    Ok(Json(state.services.analytics.category_sales().await?))
}

#[utoipa::path(
    get,
    path = "/ventas/categoria/detalle",
    tag = "sales",
    responses(
        (status = 200, description = "Category revenue as chart series", body = CategoryChart),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn category_sales_detail(
    State(state): State<AppState>,
) -> Result<Json<CategoryChart>, ServiceError> {
    Ok(Json(state.services.analytics.category_sales_chart().await?))
}

#[utoipa::path(
    get,
    path = "/ventas/tendencia",
    tag = "sales",
    responses(
        (status = 200, description = "Current year against previous year", body = SalesTrend),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn sales_trend(State(state): State<AppState>) -> Result<Json<SalesTrend>, ServiceError> {
    Ok(Json(state.services.analytics.sales_trend().await?))
}
