//! Process-local stores for embedders without a database, and for tests.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use crate::authz::{IdentityReader, IdentityRepository, MembershipRepository};
use crate::errors::{AppError, AppResult};
use crate::models::{ActorRef, CompanyId, Identity, IdentityId, Membership, Role};

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> AppResult<MutexGuard<'a, T>> {
    mutex
        .lock()
        .map_err(|_| AppError::internal(format!("{} lock poisoned", what)))
}

#[derive(Debug, Default)]
pub struct InMemoryIdentityRepository {
    by_actor: Mutex<HashMap<Uuid, Identity>>,
}

impl InMemoryIdentityRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of identities provisioned so far.
    pub fn count(&self) -> AppResult<usize> {
        Ok(lock(&self.by_actor, "identity store")?.len())
    }
}

#[async_trait]
impl IdentityReader for InMemoryIdentityRepository {
    async fn find_by_actor(&self, actor: &ActorRef) -> AppResult<Option<Identity>> {
        let map = lock(&self.by_actor, "identity store")?;
        Ok(map.get(&actor.id).cloned())
    }
}

#[async_trait]
impl IdentityRepository for InMemoryIdentityRepository {
    async fn create(&self, actor: &ActorRef) -> AppResult<Identity> {
        let mut map = lock(&self.by_actor, "identity store")?;
        if let Some(existing) = map.get(&actor.id) {
            return Ok(existing.clone());
        }

        let identity = Identity::provision(actor);
        map.insert(actor.id, identity.clone());
        tracing::info!(actor_id = %actor.id, identity_id = %identity.id, "provisioned identity");
        Ok(identity)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryMembershipRepository {
    roles: Mutex<HashMap<(CompanyId, IdentityId), BTreeSet<Role>>>,
}

impl InMemoryMembershipRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a role for `identity_id` in `company_id`.
    pub fn grant(
        &self,
        company_id: CompanyId,
        identity_id: IdentityId,
        role: Role,
    ) -> AppResult<()> {
        let mut roles = lock(&self.roles, "membership store")?;
        roles.entry((company_id, identity_id)).or_default().insert(role);
        Ok(())
    }
}

#[async_trait]
impl MembershipRepository for InMemoryMembershipRepository {
    async fn find_membership(
        &self,
        company_id: CompanyId,
        identity_id: IdentityId,
    ) -> AppResult<Option<Membership>> {
        let roles = lock(&self.roles, "membership store")?;
        match roles.get(&(company_id, identity_id)) {
            Some(set) if !set.is_empty() => {
                Membership::new(company_id, identity_id, set.iter().copied()).map(Some)
            }
            _ => Ok(None),
        }
    }
}
