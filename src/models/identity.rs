use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::utc_now;

/// External reference to a principal: the platform-assigned id plus the
/// label the principal is currently displayed under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorRef {
    pub id: Uuid,
    pub label: String,
}

impl ActorRef {
    pub fn new(id: Uuid, label: impl Into<String>) -> Self {
        Self {
            id,
            label: label.into(),
        }
    }
}

impl fmt::Display for ActorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(Uuid);

impl IdentityId {
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Internal record for a principal, bound one-to-one to an actor id for its
/// whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub actor_id: Uuid,
    /// Label seen when the identity was provisioned.
    pub display_name: String,
    pub created_at: DateTime<Utc>,
}

impl Identity {
    /// Fresh, not yet persisted identity for `actor`.
    pub fn provision(actor: &ActorRef) -> Self {
        Self {
            id: IdentityId::generate(),
            actor_id: actor.id,
            display_name: actor.label.clone(),
            created_at: utc_now(),
        }
    }
}
