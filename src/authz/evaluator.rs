use std::sync::Arc;

use crate::errors::AppResult;
use crate::models::{ActorRef, CompanyId, IdentityId};

use super::principal::Principal;
use super::provider::{MembershipRepository, Provider, ReadOnlyProvider};
use super::{AccessLevel, DEFAULT_OVERRIDE_CAPABILITY};

/// Decides whether a principal bypasses company checks entirely
pub trait OverridePolicy: Send + Sync {
    fn has_override(&self, principal: &Principal) -> bool;
}

/// Override granted by holding one capability string.
#[derive(Debug, Clone)]
pub struct CapabilityOverride {
    capability: String,
}

impl CapabilityOverride {
    pub fn new(capability: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
        }
    }
}

impl Default for CapabilityOverride {
    fn default() -> Self {
        Self::new(DEFAULT_OVERRIDE_CAPABILITY)
    }
}

impl OverridePolicy for CapabilityOverride {
    fn has_override(&self, principal: &Principal) -> bool {
        principal.has_capability(&self.capability)
    }
}

/// Outcome of the checks that need no storage.
enum Screen<'p> {
    Allow,
    Deny,
    Resolve(&'p ActorRef, CompanyId),
}

/// Company access decisions.
///
/// Evaluation order:
/// 1. missing principal, provider or company -> deny
/// 2. override capability -> allow
/// 3. non-interactive principal -> deny
/// 4. no identity -> deny
/// 5. membership roles decide
///
/// The plain variants provision an identity on first use and belong on
/// action paths. The `_if_known` variants only look identities up and belong
/// on completion and inspection paths. Storage failures are returned as
/// errors, never as a deny.
#[derive(Clone)]
pub struct AccessEngine {
    override_policy: Arc<dyn OverridePolicy>,
}

impl Default for AccessEngine {
    fn default() -> Self {
        Self::new(Arc::new(CapabilityOverride::default()))
    }
}

impl AccessEngine {
    pub fn new(override_policy: Arc<dyn OverridePolicy>) -> Self {
        Self { override_policy }
    }

    pub fn with_capability(capability: impl Into<String>) -> Self {
        Self::new(Arc::new(CapabilityOverride::new(capability)))
    }

    pub async fn can_read(
        &self,
        principal: Option<&Principal>,
        provider: Option<&Provider>,
        company_id: Option<CompanyId>,
    ) -> AppResult<bool> {
        self.check(principal, provider, company_id, AccessLevel::Read).await
    }

    pub async fn can_manage(
        &self,
        principal: Option<&Principal>,
        provider: Option<&Provider>,
        company_id: Option<CompanyId>,
    ) -> AppResult<bool> {
        self.check(principal, provider, company_id, AccessLevel::Manage).await
    }

    pub async fn can_read_if_known(
        &self,
        principal: Option<&Principal>,
        provider: Option<&ReadOnlyProvider>,
        company_id: Option<CompanyId>,
    ) -> AppResult<bool> {
        self.check_if_known(principal, provider, company_id, AccessLevel::Read).await
    }

    pub async fn can_manage_if_known(
        &self,
        principal: Option<&Principal>,
        provider: Option<&ReadOnlyProvider>,
        company_id: Option<CompanyId>,
    ) -> AppResult<bool> {
        self.check_if_known(principal, provider, company_id, AccessLevel::Manage).await
    }

    /// Creating check: an unknown player gets an identity provisioned before
    /// membership is evaluated.
    pub async fn check(
        &self,
        principal: Option<&Principal>,
        provider: Option<&Provider>,
        company_id: Option<CompanyId>,
        level: AccessLevel,
    ) -> AppResult<bool> {
        let Some(provider) = provider else {
            tracing::debug!(level = %level, "no provider, denied");
            return Ok(false);
        };

        let (actor, company_id) = match self.screen(principal, company_id, level) {
            Screen::Allow => return Ok(true),
            Screen::Deny => return Ok(false),
            Screen::Resolve(actor, company_id) => (actor, company_id),
        };

        let identity = provider.resolver().resolve_or_create(actor).await?;
        Self::evaluate(provider.memberships(), identity.id, company_id, level).await
    }

    /// Non-creating check: an unknown player is denied and nothing is written.
    pub async fn check_if_known(
        &self,
        principal: Option<&Principal>,
        provider: Option<&ReadOnlyProvider>,
        company_id: Option<CompanyId>,
        level: AccessLevel,
    ) -> AppResult<bool> {
        let Some(provider) = provider else {
            tracing::debug!(level = %level, "no provider, denied");
            return Ok(false);
        };

        let (actor, company_id) = match self.screen(principal, company_id, level) {
            Screen::Allow => return Ok(true),
            Screen::Deny => return Ok(false),
            Screen::Resolve(actor, company_id) => (actor, company_id),
        };

        let Some(identity) = provider.resolver().resolve_if_exists(actor).await? else {
            tracing::debug!(
                actor_id = %actor.id,
                company_id = %company_id,
                level = %level,
                "no identity yet, denied"
            );
            return Ok(false);
        };

        Self::evaluate(provider.memberships(), identity.id, company_id, level).await
    }

    fn screen<'p>(
        &self,
        principal: Option<&'p Principal>,
        company_id: Option<CompanyId>,
        level: AccessLevel,
    ) -> Screen<'p> {
        let (Some(principal), Some(company_id)) = (principal, company_id) else {
            tracing::debug!(level = %level, "missing principal or company, denied");
            return Screen::Deny;
        };

        // Checked before the interactive test so console administrators pass
        if self.override_policy.has_override(principal) {
            tracing::debug!(
                principal = %principal,
                company_id = %company_id,
                level = %level,
                "override bypass"
            );
            return Screen::Allow;
        }

        if !principal.is_interactive() {
            tracing::debug!(
                principal = %principal,
                company_id = %company_id,
                level = %level,
                "non-interactive principal, denied"
            );
            return Screen::Deny;
        }

        // Interactive principals always carry an actor reference
        let Some(actor) = principal.actor() else {
            return Screen::Deny;
        };
        Screen::Resolve(actor, company_id)
    }

    async fn evaluate(
        memberships: &dyn MembershipRepository,
        identity_id: IdentityId,
        company_id: CompanyId,
        level: AccessLevel,
    ) -> AppResult<bool> {
        let Some(membership) = memberships.find_membership(company_id, identity_id).await? else {
            tracing::debug!(
                identity_id = %identity_id,
                company_id = %company_id,
                level = %level,
                "not a member, denied"
            );
            return Ok(false);
        };

        let allowed = membership.grants(level);
        tracing::debug!(
            identity_id = %identity_id,
            company_id = %company_id,
            level = %level,
            roles = ?membership.roles(),
            allowed,
            "membership evaluated"
        );
        Ok(allowed)
    }
}
