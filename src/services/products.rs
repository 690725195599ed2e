use crate::{
    db::DatabaseAccess,
    entities::{order_line, product},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::{Expr, SimpleExpr},
    ColumnTrait, EntityTrait, FromQueryResult, JoinType, Order, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait, Set,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

/// Product as returned by the catalog endpoints
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id_producto: i32,
    pub nombre: String,
    pub descripcion: String,
    pub categoria: String,
    pub marca: Option<String>,
    pub tipo: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub precio: Decimal,
    pub unidades: i32,
    pub foto: Option<String>,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id_producto: model.id,
            nombre: model.name,
            descripcion: model.description,
            categoria: model.category,
            marca: model.brand,
            tipo: model.kind,
            precio: model.price,
            unidades: model.stock,
            foto: model.photo,
        }
    }
}

/// Body of product create and update requests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductPayload {
    pub nombre: String,
    pub descripcion: String,
    pub categoria: String,
    #[serde(default)]
    pub marca: Option<String>,
    pub tipo: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub precio: Decimal,
    pub unidades: i32,
    #[serde(default)]
    pub foto: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TopProduct {
    pub nombre: String,
    pub categoria: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub precio: Decimal,
    /// Number of order lines referencing the product
    pub unidades_vendidas: i64,
    pub ingresos_totales: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LowStockCount {
    pub stock: u64,
}

#[derive(Debug, FromQueryResult)]
struct TopProductRow {
    name: String,
    category: String,
    price: Decimal,
    units_sold: i64,
    revenue: f64,
}

/// Product management and the product-side dashboard queries
#[derive(Clone)]
pub struct ProductService {
    db: DatabaseAccess,
    low_stock_threshold: i32,
    list_limit: u64,
}

impl ProductService {
    pub fn new(db: DatabaseAccess, low_stock_threshold: i32, list_limit: u64) -> Self {
        Self {
            db,
            low_stock_threshold,
            list_limit,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_products(&self) -> Result<Vec<ProductResponse>, ServiceError> {
        let products = self
            .db
            .execute("list_products", |db| {
                product::Entity::find()
                    .order_by_asc(product::Column::Id)
                    .all(db)
            })
            .await?;

        Ok(products.into_iter().map(ProductResponse::from).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_product(&self, id: i32) -> Result<ProductResponse, ServiceError> {
        self.db
            .execute("get_product", |db| product::Entity::find_by_id(id).one(db))
            .await?
            .map(ProductResponse::from)
            .ok_or_else(ServiceError::product_not_found)
    }

    #[instrument(skip(self, payload), fields(name = %payload.nombre))]
    pub async fn create_product(&self, payload: ProductPayload) -> Result<i32, ServiceError> {
        let model = product::ActiveModel {
            name: Set(payload.nombre),
            description: Set(payload.descripcion),
            category: Set(payload.categoria),
            brand: Set(payload.marca),
            kind: Set(payload.tipo),
            price: Set(payload.precio),
            stock: Set(payload.unidades),
            photo: Set(payload.foto),
            ..Default::default()
        };

        let result = self
            .db
            .execute("create_product", |db| product::Entity::insert(model).exec(db))
            .await?;

        info!(product_id = result.last_insert_id, "Product created");
        Ok(result.last_insert_id)
    }

    /// Overwrites every editable field. `marca` is only replaced when the
    /// payload carries one. A missing id updates nothing and still succeeds.
    #[instrument(skip(self, payload))]
    pub async fn update_product(&self, id: i32, payload: ProductPayload) -> Result<(), ServiceError> {
        let mut changes = product::ActiveModel {
            name: Set(payload.nombre),
            description: Set(payload.descripcion),
            category: Set(payload.categoria),
            kind: Set(payload.tipo),
            price: Set(payload.precio),
            stock: Set(payload.unidades),
            photo: Set(payload.foto),
            ..Default::default()
        };
        if let Some(brand) = payload.marca {
            changes.brand = Set(Some(brand));
        }

        let result = self
            .db
            .execute("update_product", |db| {
                product::Entity::update_many()
                    .set(changes)
                    .filter(product::Column::Id.eq(id))
                    .exec(db)
            })
            .await?;

        info!(product_id = id, rows_affected = result.rows_affected, "Product updated");
        Ok(())
    }

    /// Hard delete; rows still referenced by orders or sales make the
    /// database reject it.
    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        let result = self
            .db
            .execute("delete_product", |db| product::Entity::delete_by_id(id).exec(db))
            .await?;

        info!(product_id = id, rows_affected = result.rows_affected, "Product deleted");
        Ok(())
    }

    /// Products ranked by how many order lines reference them, with the
    /// revenue those lines represent. Products never ordered rank last with
    /// zero counts.
    #[instrument(skip(self))]
    pub async fn top_products(&self) -> Result<Vec<TopProduct>, ServiceError> {
        let dialect = self.db.dialect();
        let units_sold: SimpleExpr =
            Expr::col((order_line::Entity, order_line::Column::ProductId)).count();
        let revenue = Expr::cust(
            dialect.real_sum_product(("order_lines", "quantity"), ("order_lines", "price")),
        );
        let limit = self.list_limit;

        let rows = self
            .db
            .execute("top_products", |db| {
                product::Entity::find()
                    .select_only()
                    .column_as(product::Column::Name, "name")
                    .column_as(product::Column::Category, "category")
                    .column_as(product::Column::Price, "price")
                    .column_as(units_sold.clone(), "units_sold")
                    .column_as(revenue, "revenue")
                    .join(JoinType::LeftJoin, product::Relation::OrderLines.def())
                    .group_by(product::Column::Name)
                    .group_by(product::Column::Category)
                    .group_by(product::Column::Price)
                    .order_by(units_sold, Order::Desc)
                    .order_by_asc(product::Column::Name)
                    .limit(limit)
                    .into_model::<TopProductRow>()
                    .all(db)
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| TopProduct {
                nombre: row.name,
                categoria: row.category,
                precio: row.price,
                unidades_vendidas: row.units_sold,
                ingresos_totales: row.revenue,
            })
            .collect())
    }

    #[instrument(skip(self))]
    pub async fn low_stock_count(&self) -> Result<LowStockCount, ServiceError> {
        let threshold = self.low_stock_threshold;
        let stock = self
            .db
            .execute("low_stock_count", |db| {
                product::Entity::find()
                    .filter(product::Column::Stock.lte(threshold))
                    .count(db)
            })
            .await?;

        Ok(LowStockCount { stock })
    }
}
