use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgExecutor};

use crate::auth::Role;
use crate::database::manager::DatabaseError;

/// Account row. The password hash never leaves this type: [`PublicUser`] is what goes over the wire.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: String,
    pub organization_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub organization_id: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::User)
    }

    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
            organization_id: self.organization_id.clone(),
            created_at: self.created_at,
        }
    }

    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM \"users\" WHERE lower(\"email\") = lower($1)")
            .bind(email)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: &str) -> Result<Option<User>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let user = sqlx::query_as::<_, User>("SELECT * FROM \"users\" WHERE \"id\" = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(user)
    }

    pub async fn list_for_organization<'e, E>(executor: E, organization_id: &str) -> Result<Vec<User>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM \"users\" WHERE \"organization_id\" = $1 ORDER BY \"created_at\" ASC",
        )
        .bind(organization_id)
        .fetch_all(executor)
        .await?;
        Ok(users)
    }

    pub async fn insert<'e, E>(executor: E, user: &NewUser<'_>) -> Result<User, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let created = sqlx::query_as::<_, User>(
            "INSERT INTO \"users\" (\"id\", \"email\", \"password_hash\", \"name\", \"role\", \"organization_id\") \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(user.id)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.name)
        .bind(user.role.as_str())
        .bind(user.organization_id)
        .fetch_one(executor)
        .await?;
        Ok(created)
    }

    /// Role change restricted to the caller's organization.
    pub async fn set_role<'e, E>(
        executor: E,
        id: &str,
        organization_id: &str,
        role: Role,
    ) -> Result<Option<User>, DatabaseError>
    where
        E: PgExecutor<'e>,
    {
        let updated = sqlx::query_as::<_, User>(
            "UPDATE \"users\" SET \"role\" = $1 WHERE \"id\" = $2 AND \"organization_id\" = $3 RETURNING *",
        )
        .bind(role.as_str())
        .bind(id)
        .bind(organization_id)
        .fetch_optional(executor)
        .await?;
        Ok(updated)
    }
}

pub struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub role: Role,
    pub organization_id: &'a str,
}
