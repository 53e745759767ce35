//! Authorization module - company access decisions
//!
//! This module implements the access decision engine with support for:
//! - Global override capability (administrative bypass)
//! - Interactive vs. non-interactive principals
//! - Lazy identity provisioning on action paths only
//! - Role-based read/manage evaluation against company membership

mod evaluator;
mod principal;
mod provider;
mod resolver;

pub use evaluator::{AccessEngine, CapabilityOverride, OverridePolicy};
pub use principal::{Principal, PrincipalKind};
pub use provider::{
    IdentityReader, IdentityRepository, MembershipRepository, Provider, ReadOnlyProvider,
};
pub use resolver::IdentityResolver;

use std::env::VarError;
use std::fmt;
use std::str::FromStr;

use crate::errors::AppError;
use crate::suggest::Enumerated;

/// Capability granting read and manage on every company.
pub const DEFAULT_OVERRIDE_CAPABILITY: &str = "companies.admin";

/// What the caller intends to do with a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessLevel {
    /// Visibility of company data.
    Read,
    /// Authority to mutate company data.
    Manage,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Read => "READ",
            AccessLevel::Manage => "MANAGE",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessLevel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "READ" => Ok(AccessLevel::Read),
            "MANAGE" => Ok(AccessLevel::Manage),
            other => Err(AppError::bad_request(format!("unknown access level '{}'", other))),
        }
    }
}

impl Enumerated for AccessLevel {
    fn variants() -> &'static [Self] {
        &[AccessLevel::Read, AccessLevel::Manage]
    }

    fn canonical_name(&self) -> &'static str {
        self.as_str()
    }
}

/// Engine settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessConfig {
    pub override_capability: String,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            override_capability: DEFAULT_OVERRIDE_CAPABILITY.to_string(),
        }
    }
}

impl AccessConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_var(std::env::var("OVERRIDE_CAPABILITY"))
    }

    fn from_var(value: Result<String, VarError>) -> Result<Self, AppError> {
        match value {
            Ok(value) if value.trim().is_empty() => Err(AppError::configuration(
                "OVERRIDE_CAPABILITY must not be empty",
            )),
            Ok(value) => Ok(Self {
                override_capability: value.trim().to_string(),
            }),
            Err(VarError::NotPresent) => Ok(Self::default()),
            Err(VarError::NotUnicode(_)) => Err(AppError::configuration(
                "OVERRIDE_CAPABILITY must be valid UTF-8",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::OsString;
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::db::memory::{InMemoryIdentityRepository, InMemoryMembershipRepository};
    use crate::models::{ActorRef, CompanyId};

    #[test]
    fn access_level_parses_any_case() {
        assert_eq!("read".parse::<AccessLevel>().unwrap(), AccessLevel::Read);
        assert_eq!(" Manage ".parse::<AccessLevel>().unwrap(), AccessLevel::Manage);
        assert_eq!("MANAGE".parse::<AccessLevel>().unwrap(), AccessLevel::Manage);
        assert!(matches!("own".parse::<AccessLevel>(), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn unset_override_capability_uses_default() {
        let config = AccessConfig::from_var(Err(VarError::NotPresent)).unwrap();
        assert_eq!(config, AccessConfig::default());
        assert_eq!(config.override_capability, DEFAULT_OVERRIDE_CAPABILITY);
    }

    #[test]
    fn blank_override_capability_is_rejected() {
        let result = AccessConfig::from_var(Ok("   ".to_string()));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[test]
    fn non_unicode_override_capability_is_rejected() {
        let result = AccessConfig::from_var(Err(VarError::NotUnicode(OsString::from("bad"))));
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    async fn configured_override_capability_replaces_default() {
        let config = AccessConfig::from_var(Ok(" ops.superuser ".to_string())).unwrap();
        assert_eq!(config.override_capability, "ops.superuser");

        let engine = AccessEngine::with_capability(config.override_capability);
        let provider = Provider::new(
            Arc::new(InMemoryIdentityRepository::new()),
            Arc::new(InMemoryMembershipRepository::new()),
        );
        let company = Some(CompanyId::new(Uuid::new_v4()));

        let custom = Principal::console().with_capabilities(vec!["ops.superuser".to_string()]);
        assert!(engine.can_manage(Some(&custom), Some(&provider), company).await.unwrap());

        let legacy = Principal::player(ActorRef::new(Uuid::new_v4(), "Admin"))
            .with_capabilities(vec![DEFAULT_OVERRIDE_CAPABILITY.to_string()]);
        assert!(!engine.can_read(Some(&legacy), Some(&provider), company).await.unwrap());
    }
}
