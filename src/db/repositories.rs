use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::authz::{IdentityReader, IdentityRepository, MembershipRepository};
use crate::errors::{AppError, AppResult};
use crate::models::{ActorRef, CompanyId, Identity, IdentityId, Membership};

use super::row_parsers::{db_identity_from_row, db_membership_from_rows};

#[derive(Debug, Clone)]
pub struct SqliteIdentityRepository {
    pool: SqlitePool,
}

impl SqliteIdentityRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityReader for SqliteIdentityRepository {
    async fn find_by_actor(&self, actor: &ActorRef) -> AppResult<Option<Identity>> {
        let row = sqlx::query(
            "SELECT id, actor_id, display_name, created_at FROM identities WHERE actor_id = ?",
        )
        .bind(actor.id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(db_identity_from_row).transpose()
    }
}

#[async_trait]
impl IdentityRepository for SqliteIdentityRepository {
    async fn create(&self, actor: &ActorRef) -> AppResult<Identity> {
        let identity = Identity::provision(actor);

        // The UNIQUE(actor_id) constraint settles races; losers read the winner back
        let result = sqlx::query(
            "INSERT INTO identities (id, actor_id, display_name, created_at) VALUES (?, ?, ?, ?) ON CONFLICT(actor_id) DO NOTHING",
        )
        .bind(identity.id.to_string())
        .bind(identity.actor_id.to_string())
        .bind(&identity.display_name)
        .bind(identity.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            tracing::info!(actor_id = %actor.id, identity_id = %identity.id, "provisioned identity");
            return Ok(identity);
        }

        self.find_by_actor(actor).await?.ok_or_else(|| {
            AppError::internal(format!("identity for actor {} missing after conflicting insert", actor.id))
        })
    }
}

#[derive(Debug, Clone)]
pub struct SqliteMembershipRepository {
    pool: SqlitePool,
}

impl SqliteMembershipRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipRepository for SqliteMembershipRepository {
    async fn find_membership(
        &self,
        company_id: CompanyId,
        identity_id: IdentityId,
    ) -> AppResult<Option<Membership>> {
        let rows = sqlx::query(
            "SELECT role FROM company_member_roles WHERE company_id = ? AND identity_id = ? ORDER BY role",
        )
        .bind(company_id.to_string())
        .bind(identity_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        db_membership_from_rows(company_id, identity_id, &rows)
    }
}
