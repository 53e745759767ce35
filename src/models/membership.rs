use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::authz::AccessLevel;
use crate::errors::AppError;
use crate::models::{CompanyId, IdentityId};
use crate::suggest::Enumerated;

/// Privilege tag carried by a membership. Declaration order is rank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Owner,
    Manager,
    Operator,
    Member,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Owner, Role::Manager, Role::Operator, Role::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "OWNER",
            Role::Manager => "MANAGER",
            Role::Operator => "OPERATOR",
            Role::Member => "MEMBER",
        }
    }

    pub fn grants_manage(&self) -> bool {
        matches!(self, Role::Owner | Role::Manager)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "OWNER" => Ok(Role::Owner),
            "MANAGER" => Ok(Role::Manager),
            "OPERATOR" => Ok(Role::Operator),
            "MEMBER" => Ok(Role::Member),
            other => Err(AppError::bad_request(format!("unknown role '{}'", other))),
        }
    }
}

impl Enumerated for Role {
    fn variants() -> &'static [Self] {
        &Self::ALL
    }

    fn canonical_name(&self) -> &'static str {
        self.as_str()
    }
}

/// One identity's standing inside one company.
///
/// The role set is never empty; a record with no roles is not a membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Membership {
    company_id: CompanyId,
    identity_id: IdentityId,
    roles: BTreeSet<Role>,
}

impl Membership {
    pub fn new(
        company_id: CompanyId,
        identity_id: IdentityId,
        roles: impl IntoIterator<Item = Role>,
    ) -> Result<Self, AppError> {
        let roles: BTreeSet<Role> = roles.into_iter().collect();
        if roles.is_empty() {
            return Err(AppError::internal(format!(
                "membership of {} in company {} has no roles",
                identity_id, company_id
            )));
        }

        Ok(Self {
            company_id,
            identity_id,
            roles,
        })
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn identity_id(&self) -> IdentityId {
        self.identity_id
    }

    pub fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Any membership grants read; manage needs OWNER or MANAGER.
    pub fn grants(&self, level: AccessLevel) -> bool {
        match level {
            AccessLevel::Read => true,
            AccessLevel::Manage => self.roles.iter().any(Role::grants_manage),
        }
    }
}
