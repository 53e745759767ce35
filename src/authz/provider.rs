use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::{ActorRef, CompanyId, Identity, IdentityId, Membership};

use super::resolver::IdentityResolver;

/// Lookup-only side of the identity store.
#[async_trait]
pub trait IdentityReader: Send + Sync {
    async fn find_by_actor(&self, actor: &ActorRef) -> AppResult<Option<Identity>>;
}

/// Writable identity store.
#[async_trait]
pub trait IdentityRepository: IdentityReader {
    /// Insert-if-absent keyed on `actor.id`.
    ///
    /// Must be atomic: when two callers race for the same actor, both get the
    /// single record that was persisted.
    async fn create(&self, actor: &ActorRef) -> AppResult<Identity>;
}

#[async_trait]
pub trait MembershipRepository: Send + Sync {
    async fn find_membership(
        &self,
        company_id: CompanyId,
        identity_id: IdentityId,
    ) -> AppResult<Option<Membership>>;
}

/// Storage handle for action paths. May provision identities.
#[derive(Clone)]
pub struct Provider {
    identities: Arc<dyn IdentityRepository>,
    reader: Arc<dyn IdentityReader>,
    memberships: Arc<dyn MembershipRepository>,
}

impl Provider {
    pub fn new<I, M>(identities: Arc<I>, memberships: Arc<M>) -> Self
    where
        I: IdentityRepository + 'static,
        M: MembershipRepository + 'static,
    {
        Self {
            reader: identities.clone(),
            identities,
            memberships,
        }
    }

    pub fn resolver(&self) -> IdentityResolver<'_, dyn IdentityRepository> {
        IdentityResolver::new(self.identities.as_ref())
    }

    pub fn memberships(&self) -> &dyn MembershipRepository {
        self.memberships.as_ref()
    }

    /// Same stores, with the identity write capability removed.
    pub fn read_only(&self) -> ReadOnlyProvider {
        ReadOnlyProvider {
            identities: Arc::clone(&self.reader),
            memberships: Arc::clone(&self.memberships),
        }
    }
}

/// Storage handle for completion and inspection paths.
#[derive(Clone)]
pub struct ReadOnlyProvider {
    identities: Arc<dyn IdentityReader>,
    memberships: Arc<dyn MembershipRepository>,
}

impl ReadOnlyProvider {
    pub fn new<I, M>(identities: Arc<I>, memberships: Arc<M>) -> Self
    where
        I: IdentityReader + 'static,
        M: MembershipRepository + 'static,
    {
        Self {
            identities,
            memberships,
        }
    }

    pub fn resolver(&self) -> IdentityResolver<'_, dyn IdentityReader> {
        IdentityResolver::new(self.identities.as_ref())
    }

    pub fn memberships(&self) -> &dyn MembershipRepository {
        self.memberships.as_ref()
    }
}
