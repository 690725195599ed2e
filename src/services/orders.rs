use crate::{
    db::DatabaseAccess,
    entities::{order, order_line, product, sale, user},
    errors::ServiceError,
    services::format_day,
};
use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

/// One requested line: product, quantity and unit price
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderLineInput {
    pub id_producto: i32,
    pub cantidad: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub precio: Decimal,
}

impl OrderLineInput {
    pub fn line_total(&self) -> Result<Decimal, ServiceError> {
        line_amount(self.precio, self.cantidad)
    }
}

/// `price × quantity`, failing instead of overflowing the decimal range
fn line_amount(price: Decimal, quantity: i32) -> Result<Decimal, ServiceError> {
    price.checked_mul(Decimal::from(quantity)).ok_or_else(|| {
        ServiceError::InternalError(format!(
            "line amount overflows: {} x {}",
            price, quantity
        ))
    })
}

/// Body of order create and update requests. A client-sent `fecha_pedido`
/// is ignored; the placement time is assigned by the server.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderPayload {
    pub id_usuario: i32,
    pub estado: String,
    pub direccion: String,
    pub ciudad: String,
    pub pais: String,
    pub codigo_postal: String,
    pub metodo_pago: String,
    /// Stored as sent, never recomputed from the lines
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub cantidad_total: Decimal,
    #[serde(default)]
    pub lineas: Vec<OrderLineInput>,
}

/// Order header joined with its owner
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub id: i32,
    pub cliente_nombre: String,
    pub cliente_email: String,
    /// Placement day, `YYYY-MM-DD`
    pub fecha: String,
    pub estado: String,
    pub direccion: String,
    pub ciudad: String,
    pub pais: String,
    pub codigo_postal: String,
    pub metodo_pago: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetailLine {
    /// Product id
    pub id: i32,
    pub nombre: String,
    pub cantidad: i32,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub precio: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub subtotal: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub header: OrderSummary,
    pub productos: Vec<OrderDetailLine>,
}

#[derive(Debug, FromQueryResult)]
struct OrderHeaderRow {
    id: i32,
    customer_name: String,
    customer_email: String,
    placed_at: DateTime<Utc>,
    status: String,
    address: String,
    city: String,
    country: String,
    postal_code: String,
    payment_method: String,
    total: Decimal,
}

impl From<OrderHeaderRow> for OrderSummary {
    fn from(row: OrderHeaderRow) -> Self {
        Self {
            id: row.id,
            cliente_nombre: row.customer_name,
            cliente_email: row.customer_email,
            fecha: format_day(&row.placed_at),
            estado: row.status,
            direccion: row.address,
            ciudad: row.city,
            pais: row.country,
            codigo_postal: row.postal_code,
            metodo_pago: row.payment_method,
            total: row.total,
        }
    }
}

#[derive(Debug, FromQueryResult)]
struct OrderLineRow {
    product_id: i32,
    product_name: String,
    quantity: i32,
    price: Decimal,
}

/// Order Workflow: the transactional create/update paths and order reads
#[derive(Clone)]
pub struct OrderService {
    db: DatabaseAccess,
    recent_limit: u64,
}

impl OrderService {
    pub fn new(db: DatabaseAccess, recent_limit: u64) -> Self {
        Self { db, recent_limit }
    }

    /// Creates the order header and, per line in input order, a sales
    /// ledger entry, the order line pointing at that entry, and the stock
    /// decrement. Everything commits together or not at all.
    #[instrument(skip(self, request), fields(user_id = request.id_usuario, lines = request.lineas.len()))]
    pub async fn create_order(&self, request: OrderPayload) -> Result<i32, ServiceError> {
        let order_id = self
            .db
            .transaction("create_order", move |txn| {
                Box::pin(async move {
                    let header = order::ActiveModel {
                        user_id: Set(request.id_usuario),
                        placed_at: Set(Utc::now()),
                        status: Set(request.estado),
                        address: Set(request.direccion),
                        city: Set(request.ciudad),
                        country: Set(request.pais),
                        postal_code: Set(request.codigo_postal),
                        payment_method: Set(request.metodo_pago),
                        total: Set(request.cantidad_total),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    for line in request.lineas {
                        let entry = sale::ActiveModel {
                            product_id: Set(line.id_producto),
                            sold_at: Set(Utc::now()),
                            quantity: Set(line.cantidad),
                            total: Set(line.line_total()?),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;

                        order_line::ActiveModel {
                            order_id: Set(header.id),
                            sale_id: Set(Some(entry.id)),
                            product_id: Set(line.id_producto),
                            quantity: Set(line.cantidad),
                            price: Set(line.precio),
                            ..Default::default()
                        }
                        .insert(txn)
                        .await?;

                        // unconditional: stock may go negative
                        product::Entity::update_many()
                            .col_expr(
                                product::Column::Stock,
                                Expr::col(product::Column::Stock).sub(line.cantidad),
                            )
                            .filter(product::Column::Id.eq(line.id_producto))
                            .exec(txn)
                            .await?;
                    }

                    Ok(header.id)
                })
            })
            .await?;

        counter!("storefront.orders.created", 1);
        info!(order_id, "Order created");
        Ok(order_id)
    }

    /// Rewrites the header fields. A non-empty line list replaces the
    /// order's lines; the replacement writes no sales entries and leaves
    /// stock untouched. An empty list keeps the existing lines.
    #[instrument(skip(self, request), fields(lines = request.lineas.len()))]
    pub async fn update_order(&self, id: i32, request: OrderPayload) -> Result<(), ServiceError> {
        // replacement lines must have a representable subtotal for GetOrder
        for line in &request.lineas {
            line.line_total()?;
        }

        self.db
            .transaction("update_order", move |txn| {
                Box::pin(async move {
                    order::Entity::update_many()
                        .set(order::ActiveModel {
                            status: Set(request.estado),
                            address: Set(request.direccion),
                            city: Set(request.ciudad),
                            country: Set(request.pais),
                            postal_code: Set(request.codigo_postal),
                            payment_method: Set(request.metodo_pago),
                            ..Default::default()
                        })
                        .filter(order::Column::Id.eq(id))
                        .exec(txn)
                        .await?;

                    if !request.lineas.is_empty() {
                        order_line::Entity::delete_many()
                            .filter(order_line::Column::OrderId.eq(id))
                            .exec(txn)
                            .await?;

                        let replacement = request.lineas.into_iter().map(|line| order_line::ActiveModel {
                            order_id: Set(id),
                            sale_id: Set(None),
                            product_id: Set(line.id_producto),
                            quantity: Set(line.cantidad),
                            price: Set(line.precio),
                            ..Default::default()
                        });
                        order_line::Entity::insert_many(replacement).exec(txn).await?;
                    }

                    Ok(())
                })
            })
            .await?;

        info!(order_id = id, "Order updated");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn get_order(&self, id: i32) -> Result<OrderDetail, ServiceError> {
        let header = self
            .db
            .execute("get_order", |db| {
                Self::header_query()
                    .filter(order::Column::Id.eq(id))
                    .into_model::<OrderHeaderRow>()
                    .one(db)
            })
            .await?
            .ok_or_else(ServiceError::order_not_found)?;

        let lines = self
            .db
            .execute("get_order_lines", |db| {
                order_line::Entity::find()
                    .select_only()
                    .column_as(order_line::Column::ProductId, "product_id")
                    .column_as(product::Column::Name, "product_name")
                    .column_as(order_line::Column::Quantity, "quantity")
                    .column_as(order_line::Column::Price, "price")
                    .join(JoinType::InnerJoin, order_line::Relation::Product.def())
                    .filter(order_line::Column::OrderId.eq(id))
                    .order_by_asc(order_line::Column::Id)
                    .into_model::<OrderLineRow>()
                    .all(db)
            })
            .await?;

        let productos = lines
            .into_iter()
            .map(|line| {
                Ok(OrderDetailLine {
                    id: line.product_id,
                    nombre: line.product_name,
                    cantidad: line.quantity,
                    precio: line.price,
                    subtotal: line_amount(line.price, line.quantity)?,
                })
            })
            .collect::<Result<Vec<_>, ServiceError>>()?;

        Ok(OrderDetail {
            header: header.into(),
            productos,
        })
    }

    #[instrument(skip(self))]
    pub async fn list_orders(&self) -> Result<Vec<OrderSummary>, ServiceError> {
        let rows = self
            .db
            .execute("list_orders", |db| {
                Self::header_query()
                    .order_by_asc(order::Column::Id)
                    .into_model::<OrderHeaderRow>()
                    .all(db)
            })
            .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    /// Most recently placed orders first
    #[instrument(skip(self))]
    pub async fn list_recent_orders(&self) -> Result<Vec<OrderSummary>, ServiceError> {
        let limit = self.recent_limit;
        let rows = self
            .db
            .execute("list_recent_orders", |db| {
                Self::header_query()
                    .order_by_desc(order::Column::PlacedAt)
                    .order_by_desc(order::Column::Id)
                    .limit(limit)
                    .into_model::<OrderHeaderRow>()
                    .all(db)
            })
            .await?;

        Ok(rows.into_iter().map(OrderSummary::from).collect())
    }

    fn header_query() -> Select<order::Entity> {
        order::Entity::find()
            .select_only()
            .column(order::Column::Id)
            .column_as(user::Column::Name, "customer_name")
            .column_as(user::Column::Email, "customer_email")
            .column(order::Column::PlacedAt)
            .column(order::Column::Status)
            .column(order::Column::Address)
            .column(order::Column::City)
            .column(order::Column::Country)
            .column(order::Column::PostalCode)
            .column(order::Column::PaymentMethod)
            .column(order::Column::Total)
            .join(JoinType::InnerJoin, order::Relation::User.def())
    }
}
