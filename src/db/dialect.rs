//! Engine-specific SQL fragments used by the reporting queries.
//!
//! Date-part extraction and floating-point sums are the only places where the
//! supported backends disagree; everything else is built with sea-query.

use sea_orm::sea_query::{Expr, SimpleExpr};
use sea_orm::DbBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlDialect {
    Postgres,
    Sqlite,
    MySql,
}

impl SqlDialect {
    pub fn from_backend(backend: DbBackend) -> Self {
        match backend {
            DbBackend::Postgres => SqlDialect::Postgres,
            DbBackend::Sqlite => SqlDialect::Sqlite,
            DbBackend::MySql => SqlDialect::MySql,
        }
    }

    fn quote(&self, ident: &str) -> String {
        match self {
            SqlDialect::MySql => format!("`{}`", ident),
            SqlDialect::Postgres | SqlDialect::Sqlite => format!("\"{}\"", ident),
        }
    }

    fn column(&self, table: &str, column: &str) -> String {
        format!("{}.{}", self.quote(table), self.quote(column))
    }

    /// Calendar month (1-12) of a timestamp column, as a 64-bit integer
    pub fn month_sql(&self, table: &str, column: &str) -> String {
        let col = self.column(table, column);
        match self {
            SqlDialect::Postgres => format!("CAST(EXTRACT(MONTH FROM {}) AS BIGINT)", col),
            SqlDialect::Sqlite => format!("CAST(strftime('%m', {}) AS INTEGER)", col),
            SqlDialect::MySql => format!("CAST(MONTH({}) AS SIGNED)", col),
        }
    }

    /// Calendar year of a timestamp column, as a 64-bit integer
    pub fn year_sql(&self, table: &str, column: &str) -> String {
        let col = self.column(table, column);
        match self {
            SqlDialect::Postgres => format!("CAST(EXTRACT(YEAR FROM {}) AS BIGINT)", col),
            SqlDialect::Sqlite => format!("CAST(strftime('%Y', {}) AS INTEGER)", col),
            SqlDialect::MySql => format!("CAST(YEAR({}) AS SIGNED)", col),
        }
    }

    /// `SUM(expr)` as a double, zero when there are no rows
    pub fn real_sum_sql(&self, inner: &str) -> String {
        match self {
            SqlDialect::Postgres => {
                format!("CAST(COALESCE(SUM({}), 0) AS DOUBLE PRECISION)", inner)
            }
            SqlDialect::Sqlite => format!("CAST(COALESCE(SUM({}), 0) AS REAL)", inner),
            SqlDialect::MySql => format!("CAST(COALESCE(SUM({}), 0) AS DOUBLE)", inner),
        }
    }

    /// `SUM(table.column)` as a double
    pub fn real_sum_of(&self, table: &str, column: &str) -> String {
        self.real_sum_sql(&self.column(table, column))
    }

    /// `SUM(left.a * right.b)` as a double
    pub fn real_sum_product(&self, left: (&str, &str), right: (&str, &str)) -> String {
        let product = format!(
            "{} * {}",
            self.column(left.0, left.1),
            self.column(right.0, right.1)
        );
        self.real_sum_sql(&product)
    }

    pub fn month(&self, table: &str, column: &str) -> SimpleExpr {
        Expr::cust(self.month_sql(table, column))
    }

    pub fn year(&self, table: &str, column: &str) -> SimpleExpr {
        Expr::cust(self.year_sql(table, column))
    }

    pub fn real_sum(&self, table: &str, column: &str) -> SimpleExpr {
        Expr::cust(self.real_sum_of(table, column))
    }
}
