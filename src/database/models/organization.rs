use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};

use crate::database::manager::DatabaseError;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Organization {
    pub async fn insert<'e, E>(executor: E, id: &str, name: &str) -> Result<Organization, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let org = sqlx::query_as::<_, Organization>(
            "INSERT INTO \"organizations\" (\"id\", \"name\") VALUES ($1, $2) RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(org)
    }

    pub async fn find<'e, E>(executor: E, id: &str) -> Result<Option<Organization>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let org = sqlx::query_as::<_, Organization>("SELECT * FROM \"organizations\" WHERE \"id\" = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(org)
    }
}
