use serde_json::Value;
use sqlx::PgExecutor;
use tracing::error;

use crate::database::models::ResourceSpec;
use crate::database::record::{shape_input, shape_output, shape_rows, Operation};
use crate::database::{DatabaseManager, ListQuery, Repository, ScopeKey};
use crate::error::ApiError;

/// Read-modify-return CRUD for one resource: shape input, write, re-read the
/// canonical row, shape output.
#[derive(Clone)]
pub struct ResourceService {
    db: DatabaseManager,
    repo: Repository,
}

impl ResourceService {
    pub fn new(db: DatabaseManager, spec: &'static ResourceSpec) -> Self {
        Self {
            db,
            repo: Repository::new(spec),
        }
    }

    pub fn spec(&self) -> &'static ResourceSpec {
        self.repo.spec()
    }

    pub async fn list(&self, scope: &ScopeKey, query: &ListQuery) -> Result<Vec<Value>, ApiError> {
        let rows = self.repo.select_any(self.db.pool(), scope, query).await?;
        Ok(shape_rows(self.spec(), &rows))
    }

    pub async fn get(&self, scope: &ScopeKey, id: &str) -> Result<Value, ApiError> {
        let row = self.repo.select_404(self.db.pool(), scope, id).await?;
        Ok(shape_output(self.spec(), &row))
    }

    pub async fn create(&self, scope: &ScopeKey, body: &Value) -> Result<Value, ApiError> {
        let row = shape_input(self.spec(), body, Operation::Create)?;
        self.repo.check_references(self.db.pool(), scope, &row).await?;
        let id = self.repo.insert(self.db.pool(), scope, row).await?;
        refetch(&self.repo, self.db.pool(), scope, &id).await
    }

    pub async fn update(&self, scope: &ScopeKey, id: &str, body: &Value) -> Result<Value, ApiError> {
        let row = shape_input(self.spec(), body, Operation::Update)?;
        self.repo.check_references(self.db.pool(), scope, &row).await?;
        self.repo.update(self.db.pool(), scope, id, row).await?;
        refetch(&self.repo, self.db.pool(), scope, id).await
    }

    /// Idempotent: deleting a missing row is not an error.
    pub async fn delete(&self, scope: &ScopeKey, id: &str) -> Result<(), ApiError> {
        self.repo.delete(self.db.pool(), scope, id).await?;
        Ok(())
    }
}

/// Re-reads a row just written. A miss here means the write succeeded but the
/// row vanished, which is reported distinctly from a plain not-found.
pub async fn refetch<'e, E>(repo: &Repository, executor: E, scope: &ScopeKey, id: &str) -> Result<Value, ApiError>
where
    E: PgExecutor<'e>,
{
    match repo.select_one(executor, scope, id).await? {
        Some(row) => Ok(shape_output(repo.spec(), &row)),
        None => {
            error!("{} {} was written but could not be re-read", repo.spec().table, id);
            Err(ApiError::internal_server_error(format!(
                "{} saved but could not be retrieved",
                repo.spec().name
            )))
        }
    }
}
