use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storefront Admin API",
        version = "0.1.0",
        description = r#"
Backend for the storefront admin dashboard: catalog, users, orders and
sales reporting.

Creating an order writes the order, one sales entry and one order line per
requested line, and decrements stock, in a single transaction.

Errors use one body shape:

```json
{
  "error": "Not Found",
  "message": "Producto no encontrado",
  "request_id": "6f1c...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:8000", description = "Local development")
    ),
    tags(
        (name = "orders", description = "Order workflow"),
        (name = "products", description = "Catalog management and stock queries"),
        (name = "users", description = "User management"),
        (name = "sales", description = "Sales reports for dashboard charts"),
        (name = "health", description = "Health check endpoints")
    ),
    paths(
        crate::handlers::orders::create_order,
        crate::handlers::orders::list_orders,
        crate::handlers::orders::list_recent_orders,
        crate::handlers::orders::get_order,
        crate::handlers::orders::update_order,

        crate::handlers::products::list_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,
        crate::handlers::products::top_products,
        crate::handlers::products::low_stock,

        crate::handlers::users::list_users,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::users::users_last_month,

        crate::handlers::sales::monthly_sales,
        crate::handlers::sales::monthly_sales_last_month,
        crate::handlers::sales::last_month_sale_count,
        crate::handlers::sales::category_sales,
        crate::handlers::sales::category_sales_detail,
        crate::handlers::sales::sales_trend,

        crate::health::health_check,
    ),
    components(
        schemas(
            crate::handlers::common::MessageResponse,
            crate::handlers::orders::OrderCreatedResponse,
            crate::services::orders::OrderPayload,
            crate::services::orders::OrderLineInput,
            crate::services::orders::OrderSummary,
            crate::services::orders::OrderDetail,
            crate::services::orders::OrderDetailLine,
            crate::services::products::ProductResponse,
            crate::services::products::ProductPayload,
            crate::services::products::TopProduct,
            crate::services::products::LowStockCount,
            crate::services::users::UserResponse,
            crate::services::users::UserUpdate,
            crate::services::users::NewUsersCount,
            crate::services::analytics::SalesData,
            crate::services::analytics::CategorySalesData,
            crate::services::analytics::CategoryChart,
            crate::services::analytics::ChartSeries,
            crate::services::analytics::SalesTrend,
            crate::health::HealthInfo,
            crate::health::HealthStatus,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi())
}
