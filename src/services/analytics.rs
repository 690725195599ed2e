use crate::{
    db::DatabaseAccess,
    entities::{product, sale},
    errors::ServiceError,
};
use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, TimeZone, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, EntityTrait, FromQueryResult, JoinType, Order, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

const CATEGORY_SERIES_NAME: &str = "Ventas";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesData {
    /// Three-letter month label, e.g. "Jan"
    pub month: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategorySalesData {
    pub category: String,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartSeries {
    pub name: String,
    pub data: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryChart {
    pub categories: Vec<String>,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SalesTrend {
    pub months: Vec<String>,
    /// Previous year first, then the current year
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, FromQueryResult)]
struct MonthAmountRow {
    month: i64,
    amount: f64,
}

#[derive(Debug, FromQueryResult)]
struct MonthCountRow {
    month: i64,
    sales: i64,
}

#[derive(Debug, FromQueryResult)]
struct CategoryAmountRow {
    category: String,
    amount: f64,
}

/// Sales total for one calendar month of one year
#[derive(Debug, Clone, PartialEq, FromQueryResult)]
pub struct MonthlyTotal {
    pub year: i64,
    pub month: i64,
    pub amount: f64,
}

/// "Jan" for 1 ... "Dec" for 12; out-of-range numbers are echoed back
pub fn month_label(month: i64) -> String {
    u8::try_from(month)
        .ok()
        .and_then(|m| chrono::Month::try_from(m).ok())
        .map(|m| m.name()[..3].to_string())
        .unwrap_or_else(|| month.to_string())
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

fn out_of_range() -> ServiceError {
    ServiceError::InternalError("date out of range".to_string())
}

/// `[first day of previous month, first day of current month)`
pub fn last_full_month(now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>), ServiceError> {
    let first_of_month = now.date_naive() - Days::new(u64::from(now.day0()));
    let first_of_previous = first_of_month
        .checked_sub_months(Months::new(1))
        .ok_or_else(out_of_range)?;
    Ok((midnight(first_of_previous), midnight(first_of_month)))
}

fn months_back(now: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>, ServiceError> {
    now.checked_sub_months(Months::new(months))
        .ok_or_else(out_of_range)
}

/// Splits year/month totals into the previous-year and current-year series.
///
/// Month labels come from current-year rows only, in query order; each
/// series holds its year's amounts in the order they appear. Rows from
/// other years are dropped. The series are not aligned on a month grid.
pub fn shape_sales_trend(rows: &[MonthlyTotal], current_year: i32) -> SalesTrend {
    let current_year = i64::from(current_year);
    let last_year = current_year - 1;

    let mut months: Vec<String> = Vec::new();
    let mut current_data = Vec::new();
    let mut last_data = Vec::new();

    for row in rows {
        if row.year == current_year {
            current_data.push(row.amount);
            let label = month_label(row.month);
            if !months.contains(&label) {
                months.push(label);
            }
        } else if row.year == last_year {
            last_data.push(row.amount);
        }
    }

    SalesTrend {
        months,
        series: vec![
            ChartSeries {
                name: last_year.to_string(),
                data: last_data,
            },
            ChartSeries {
                name: current_year.to_string(),
                data: current_data,
            },
        ],
    }
}

/// Sales-ledger reports. Date windows are computed here and bound as
/// parameters; only month/year extraction is delegated to the engine.
#[derive(Clone)]
pub struct AnalyticsService {
    db: DatabaseAccess,
}

impl AnalyticsService {
    pub fn new(db: DatabaseAccess) -> Self {
        Self { db }
    }

    pub async fn monthly_sales_last_month(&self) -> Result<Vec<SalesData>, ServiceError> {
        self.monthly_sales_last_month_at(Utc::now()).await
    }

    /// Revenue of the last full calendar month
    #[instrument(skip(self))]
    pub async fn monthly_sales_last_month_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SalesData>, ServiceError> {
        let (start, end) = last_full_month(now)?;
        self.revenue_by_month("monthly_sales_last_month", start, Some(end))
            .await
    }

    pub async fn monthly_sales_trend(&self) -> Result<Vec<SalesData>, ServiceError> {
        self.monthly_sales_trend_at(Utc::now()).await
    }

    /// Revenue of the trailing twelve months, keyed by month number only
    #[instrument(skip(self))]
    pub async fn monthly_sales_trend_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SalesData>, ServiceError> {
        let start = months_back(now, 12)?;
        self.revenue_by_month("monthly_sales_trend", start, None).await
    }

    pub async fn last_month_sale_count(&self) -> Result<Vec<SalesData>, ServiceError> {
        self.last_month_sale_count_at(Utc::now()).await
    }

    /// Number of ledger entries in the last full calendar month, reported in
    /// the `amount` field
    #[instrument(skip(self))]
    pub async fn last_month_sale_count_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SalesData>, ServiceError> {
        let (start, end) = last_full_month(now)?;
        let dialect = self.db.dialect();
        let month = dialect.month("sales", "sold_at");

        let rows = self
            .db
            .execute("last_month_sale_count", |db| {
                sale::Entity::find()
                    .select_only()
                    .column_as(month.clone(), "month")
                    .column_as(Expr::col((sale::Entity, sale::Column::Id)).count(), "sales")
                    .filter(sale::Column::SoldAt.gte(start))
                    .filter(sale::Column::SoldAt.lt(end))
                    .group_by(month.clone())
                    .order_by(month, Order::Asc)
                    .into_model::<MonthCountRow>()
                    .all(db)
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| SalesData {
                month: month_label(row.month),
                amount: row.sales as f64,
            })
            .collect())
    }

    /// Revenue per product category, largest first
    #[instrument(skip(self))]
    pub async fn category_sales(&self) -> Result<Vec<CategorySalesData>, ServiceError> {
        let dialect = self.db.dialect();
        let amount = dialect.real_sum("sales", "total");

        let rows = self
            .db
            .execute("category_sales", |db| {
                sale::Entity::find()
                    .select_only()
                    .column_as(product::Column::Category, "category")
                    .column_as(amount.clone(), "amount")
                    .join(JoinType::InnerJoin, sale::Relation::Product.def())
                    .group_by(product::Column::Category)
                    .order_by(amount, Order::Desc)
                    .into_model::<CategoryAmountRow>()
                    .all(db)
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| CategorySalesData {
                category: row.category,
                amount: row.amount,
            })
            .collect())
    }

    /// Category revenue shaped for a bar chart
    pub async fn category_sales_chart(&self) -> Result<CategoryChart, ServiceError> {
        let (categories, data): (Vec<String>, Vec<f64>) = self
            .category_sales()
            .await?
            .into_iter()
            .map(|row| (row.category, row.amount))
            .unzip();

        Ok(CategoryChart {
            categories,
            series: vec![ChartSeries {
                name: CATEGORY_SERIES_NAME.to_string(),
                data,
            }],
        })
    }

    pub async fn sales_trend(&self) -> Result<SalesTrend, ServiceError> {
        self.sales_trend_at(Utc::now()).await
    }

    /// Current year against the previous one over the trailing 24 months
    #[instrument(skip(self))]
    pub async fn sales_trend_at(&self, now: DateTime<Utc>) -> Result<SalesTrend, ServiceError> {
        let start = months_back(now, 24)?;
        let dialect = self.db.dialect();
        let year = dialect.year("sales", "sold_at");
        let month = dialect.month("sales", "sold_at");
        let amount = dialect.real_sum("sales", "total");

        let rows = self
            .db
            .execute("sales_trend", |db| {
                sale::Entity::find()
                    .select_only()
                    .column_as(year.clone(), "year")
                    .column_as(month.clone(), "month")
                    .column_as(amount, "amount")
                    .filter(sale::Column::SoldAt.gte(start))
                    .group_by(year.clone())
                    .group_by(month.clone())
                    .order_by(year, Order::Asc)
                    .order_by(month, Order::Asc)
                    .into_model::<MonthlyTotal>()
                    .all(db)
            })
            .await?;

        Ok(shape_sales_trend(&rows, now.year()))
    }

    async fn revenue_by_month(
        &self,
        operation: &str,
        start: DateTime<Utc>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Vec<SalesData>, ServiceError> {
        let dialect = self.db.dialect();
        let month = dialect.month("sales", "sold_at");
        let amount = dialect.real_sum("sales", "total");

        let rows = self
            .db
            .execute(operation, |db| {
                let mut query = sale::Entity::find()
                    .select_only()
                    .column_as(month.clone(), "month")
                    .column_as(amount, "amount")
                    .filter(sale::Column::SoldAt.gte(start));
                if let Some(end) = end {
                    query = query.filter(sale::Column::SoldAt.lt(end));
                }
                query
                    .group_by(month.clone())
                    .order_by(month, Order::Asc)
                    .into_model::<MonthAmountRow>()
                    .all(db)
            })
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| SalesData {
                month: month_label(row.month),
                amount: row.amount,
            })
            .collect())
    }
}
