pub mod dialect;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use futures::future::BoxFuture;
use metrics::{counter, gauge, histogram};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DatabaseTransaction, DbErr,
    TransactionTrait,
};
use sea_orm_migration::MigratorTrait;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub use dialect::SqlDialect;

/// Type alias for a database connection pool
pub type DbPool = DatabaseConnection;

/// Pool settings derived from [`AppConfig`]
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
    pub acquire_timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            acquire_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&AppConfig> for DbConfig {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            url: cfg.database_url.clone(),
            max_connections: cfg.db_max_connections,
            min_connections: cfg.db_min_connections,
            connect_timeout: Duration::from_secs(cfg.db_connect_timeout_secs),
            idle_timeout: Duration::from_secs(cfg.db_idle_timeout_secs),
            acquire_timeout: Duration::from_secs(cfg.db_acquire_timeout_secs),
        }
    }
}

/// Establishes a connection pool to the database with custom configuration
///
/// # Errors
/// Returns a `ServiceError::DatabaseError` if the pool cannot be opened
pub async fn establish_connection_with_config(config: &DbConfig) -> Result<DbPool, ServiceError> {
    debug!(
        max_connections = config.max_connections,
        min_connections = config.min_connections,
        "Configuring database connection"
    );

    let mut opt = ConnectOptions::new(config.url.clone());
    opt.max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(config.connect_timeout)
        .acquire_timeout(config.acquire_timeout)
        .idle_timeout(config.idle_timeout)
        .sqlx_logging(false);

    gauge!("storefront_db.max_connections", config.max_connections as f64);

    let db_pool = Database::connect(opt).await.map_err(|e| {
        error!(error = %e, "Database connection establishment failed");
        ServiceError::DatabaseError(e)
    })?;

    info!(
        backend = ?db_pool.get_database_backend(),
        "Database connection pool established"
    );
    Ok(db_pool)
}

/// Establish DB pool using AppConfig tuning
pub async fn establish_connection_from_app_config(cfg: &AppConfig) -> Result<DbPool, ServiceError> {
    let db_cfg: DbConfig = cfg.into();
    establish_connection_with_config(&db_cfg).await
}

/// Pool handle used by the services: every statement borrows a pooled
/// connection for its own duration, and multi-statement work goes through
/// [`DatabaseAccess::transaction`].
#[derive(Debug, Clone)]
pub struct DatabaseAccess {
    pool: Arc<DbPool>,
}

impl DatabaseAccess {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }

    pub fn dialect(&self) -> SqlDialect {
        SqlDialect::from_backend(self.pool.get_database_backend())
    }

    /// Execute query with metrics and logging
    pub async fn execute<'a, F, Fut, T>(&'a self, operation: &str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&'a DbPool) -> Fut + Send,
        Fut: Future<Output = Result<T, DbErr>> + Send + 'a,
        T: Send,
    {
        let start = Instant::now();
        debug!(operation = %operation, "Starting database operation");

        let result = f(&self.pool).await.map_err(|e| {
            error!(operation = %operation, error = %e, "Database operation failed");
            counter!("storefront_db.operation.error", 1, "operation" => operation.to_string());
            ServiceError::DatabaseError(e)
        });

        let elapsed = start.elapsed();
        histogram!("storefront_db.operation.duration", elapsed, "operation" => operation.to_string());
        if result.is_ok() {
            debug!(operation = %operation, duration = ?elapsed, "Database operation completed");
        }

        result
    }

    /// Runs `f` inside one database transaction. Commits when `f` returns
    /// `Ok`, rolls back on any error (including a failed commit).
    pub async fn transaction<F, T>(&self, label: &str, f: F) -> Result<T, ServiceError>
    where
        F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, ServiceError>>
            + Send,
        T: Send,
    {
        let transaction_id = Uuid::new_v4();
        let start = Instant::now();

        debug!(transaction_id = %transaction_id, label = %label, "Starting database transaction");
        counter!("storefront_db.transaction.started", 1);

        let result = self.pool.transaction::<F, T, ServiceError>(f).await;

        let elapsed = start.elapsed();
        histogram!("storefront_db.transaction.duration", elapsed);

        match &result {
            Ok(_) => {
                counter!("storefront_db.transaction.committed", 1);
                debug!(transaction_id = %transaction_id, label = %label, duration = ?elapsed, "Transaction committed");
            }
            Err(e) => {
                counter!("storefront_db.transaction.rolled_back", 1);
                warn!(transaction_id = %transaction_id, label = %label, error = %e, duration = ?elapsed, "Transaction rolled back");
            }
        }

        result.map_err(ServiceError::from)
    }
}

/// Applies the embedded migrations
pub async fn run_migrations(pool: &DbPool) -> Result<(), ServiceError> {
    info!("Running database migrations");
    let start = Instant::now();

    let result = crate::migrator::Migrator::up(pool, None)
        .await
        .map_err(ServiceError::DatabaseError);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => info!("Database migrations completed in {:?}", elapsed),
        Err(e) => error!("Database migrations failed after {:?}: {}", elapsed, e),
    }

    result
}

/// Checks if the database connection is active
pub async fn check_connection(pool: &DbPool) -> Result<(), ServiceError> {
    let start = Instant::now();
    let result = pool.ping().await.map_err(ServiceError::DatabaseError);

    let elapsed = start.elapsed();
    match &result {
        Ok(_) => {
            debug!("Database connection check successful in {:?}", elapsed);
            gauge!("storefront_db.connection_latency", elapsed.as_millis() as f64);
        }
        Err(e) => {
            error!("Database connection check failed after {:?}: {}", elapsed, e);
            counter!("storefront_db.connection_failures", 1);
        }
    }

    result
}

pub async fn close_pool(pool: DbPool) -> Result<(), ServiceError> {
    info!("Closing database connection pool");
    pool.close().await.map_err(ServiceError::DatabaseError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use sea_orm::Statement;

    async fn memory_pool() -> DbPool {
        let config = DbConfig {
            url: "sqlite::memory:".into(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        };
        establish_connection_with_config(&config).await.unwrap()
    }

    async fn count_rows(pool: &DbPool) -> i64 {
        let row = pool
            .query_one(Statement::from_string(
                pool.get_database_backend(),
                "SELECT COUNT(*) AS n FROM scratch".to_owned(),
            ))
            .await
            .unwrap()
            .unwrap();
        row.try_get("", "n").unwrap()
    }

    #[tokio::test]
    async fn memory_pool_answers_ping_and_migrates() {
        let pool = memory_pool().await;
        assert!(check_connection(&pool).await.is_ok());
        assert!(run_migrations(&pool).await.is_ok());
    }

    #[tokio::test]
    async fn transaction_commits_on_ok_and_rolls_back_on_err() {
        let pool = memory_pool().await;
        pool.execute_unprepared("CREATE TABLE scratch (id INTEGER PRIMARY KEY)")
            .await
            .unwrap();
        let pool = Arc::new(pool);
        let access = DatabaseAccess::new(pool.clone());

        let committed = access
            .transaction("scratch_ok", |txn| {
                Box::pin(async move {
                    txn.execute_unprepared("INSERT INTO scratch (id) VALUES (1)").await?;
                    Ok(7)
                })
            })
            .await;
        assert_eq!(committed.unwrap(), 7);

        let failed: Result<(), ServiceError> = access
            .transaction("scratch_err", |txn| {
                Box::pin(async move {
                    txn.execute_unprepared("INSERT INTO scratch (id) VALUES (2)").await?;
                    Err(ServiceError::InternalError("abort".into()))
                })
            })
            .await;
        assert_matches!(failed, Err(ServiceError::InternalError(_)));

        assert_eq!(count_rows(&pool).await, 1);
    }

    #[tokio::test]
    async fn execute_maps_database_errors() {
        let access = DatabaseAccess::new(Arc::new(memory_pool().await));
        let result = access
            .execute("missing_table", |db| async move {
                db.execute_unprepared("SELECT * FROM nowhere").await
            })
            .await;
        assert_matches!(result, Err(ServiceError::DatabaseError(_)));
    }
}
