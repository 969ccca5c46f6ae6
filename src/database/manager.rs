use serde_json::{Map, Value};
use sqlx::{
    postgres::{PgArguments, PgPoolOptions},
    PgExecutor, PgPool, Postgres, Row, Transaction,
};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::AppConfig;

/// A store row surfaced as a JSON object keyed by column name.
pub type JsonRow = Map<String, Value>;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    #[error("Reference outside the caller's organization: {0}")]
    InvalidReference(&'static str),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some("23505") => return DatabaseError::UniqueViolation(db_err.message().to_string()),
                Some("23503") => return DatabaseError::ForeignKeyViolation(db_err.message().to_string()),
                _ => {}
            }
        }
        DatabaseError::Sqlx(err)
    }
}

/// Uniform async gateway over the shared connection pool: execute, fetch-one, fetch-many.
#[derive(Clone)]
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Connect eagerly; fails fast when the store is unreachable.
    pub async fn connect(config: &AppConfig) -> Result<Self, DatabaseError> {
        let url = config.database_url().map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        let pool = Self::pool_options(config).connect(&url).await?;
        info!("Connected database pool (max {} connections)", config.database.max_connections);
        Ok(Self { pool })
    }

    /// Build a pool that only opens connections on first use.
    pub fn connect_lazy(config: &AppConfig) -> Result<Self, DatabaseError> {
        let url = config.database_url().map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        let pool = Self::pool_options(config).connect_lazy(&url)?;
        Ok(Self { pool })
    }

    fn pool_options(config: &AppConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.connection_timeout))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        Ok(self.pool.begin().await?)
    }

    /// Run a statement and return the number of affected rows.
    pub async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64, DatabaseError> {
        execute_on(&self.pool, sql, params).await
    }

    pub async fn fetch_one(&self, sql: &str, params: &[Value]) -> Result<Option<JsonRow>, DatabaseError> {
        fetch_one_on(&self.pool, sql, params).await
    }

    pub async fn fetch_all(&self, sql: &str, params: &[Value]) -> Result<Vec<JsonRow>, DatabaseError> {
        fetch_all_on(&self.pool, sql, params).await
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        info!("Closed database pool");
    }
}

pub async fn execute_on<'e, E>(executor: E, sql: &str, params: &[Value]) -> Result<u64, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let mut q = sqlx::query(sql);
    for p in params {
        q = bind_param(q, p);
    }
    Ok(q.execute(executor).await?.rows_affected())
}

pub async fn fetch_one_on<'e, E>(executor: E, sql: &str, params: &[Value]) -> Result<Option<JsonRow>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let wrapped = wrap_row_to_json(sql);
    let mut q = sqlx::query(&wrapped);
    for p in params {
        q = bind_param(q, p);
    }
    match q.fetch_optional(executor).await? {
        Some(row) => Ok(Some(row_object(&row)?)),
        None => Ok(None),
    }
}

pub async fn fetch_all_on<'e, E>(executor: E, sql: &str, params: &[Value]) -> Result<Vec<JsonRow>, DatabaseError>
where
    E: PgExecutor<'e>,
{
    let wrapped = wrap_row_to_json(sql);
    let mut q = sqlx::query(&wrapped);
    for p in params {
        q = bind_param(q, p);
    }
    let rows = q.fetch_all(executor).await?;
    rows.iter().map(row_object).collect()
}

/// Every read goes through `row_to_json` so column types map onto JSON without per-table structs.
fn wrap_row_to_json(sql: &str) -> String {
    format!("SELECT row_to_json(t) AS row FROM ({}) t", sql)
}

fn row_object(row: &sqlx::postgres::PgRow) -> Result<JsonRow, DatabaseError> {
    match row.try_get::<Value, _>("row")? {
        Value::Object(map) => Ok(map),
        other => Err(DatabaseError::QueryError(format!("unexpected row format: {}", other))),
    }
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(u) = n.as_u64() {
                // Postgres doesn't have u64; cast down if safe
                q.bind(u as i64)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        // JSONB
        Value::Array(_) | Value::Object(_) => q.bind(v),
    }
}
