use crate::errors::AppResult;
use crate::models::{ActorRef, Identity};

use super::provider::{IdentityReader, IdentityRepository};

/// Maps an external actor reference to its internal identity.
///
/// Which modes are available depends on the store it wraps: over an
/// [`IdentityReader`] only [`resolve_if_exists`](Self::resolve_if_exists)
/// exists, so read-only callers cannot provision by accident.
pub struct IdentityResolver<'a, R: ?Sized> {
    repository: &'a R,
}

impl<'a, R: ?Sized> IdentityResolver<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        Self { repository }
    }
}

impl<R: IdentityReader + ?Sized> IdentityResolver<'_, R> {
    pub async fn resolve_if_exists(&self, actor: &ActorRef) -> AppResult<Option<Identity>> {
        self.repository.find_by_actor(actor).await
    }
}

impl<R: IdentityRepository + ?Sized> IdentityResolver<'_, R> {
    pub async fn resolve_or_create(&self, actor: &ActorRef) -> AppResult<Identity> {
        if let Some(identity) = self.repository.find_by_actor(actor).await? {
            return Ok(identity);
        }

        // create() is insert-if-absent, so a concurrent winner is returned here
        let identity = self.repository.create(actor).await?;
        tracing::debug!(
            actor_id = %actor.id,
            identity_id = %identity.id,
            "resolved identity through create"
        );
        Ok(identity)
    }
}
