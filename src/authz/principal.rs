use std::collections::HashSet;
use std::fmt;

use crate::models::ActorRef;

/// Closed set of principal types the front end can hand us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrincipalKind {
    /// Connected user with a platform-assigned id; can hold an identity.
    Player(ActorRef),
    /// Server console or other non-interactive caller.
    Console,
}

/// Principal represents the caller together with the capabilities the front
/// end has granted it
#[derive(Debug, Clone)]
pub struct Principal {
    pub kind: PrincipalKind,
    pub capabilities: HashSet<String>,
}

impl Principal {
    pub fn player(actor: ActorRef) -> Self {
        Self {
            kind: PrincipalKind::Player(actor),
            capabilities: HashSet::new(),
        }
    }

    pub fn console() -> Self {
        Self {
            kind: PrincipalKind::Console,
            capabilities: HashSet::new(),
        }
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = String>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.contains(capability)
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self.kind, PrincipalKind::Player(_))
    }

    /// External reference used for identity resolution, if this principal
    /// can hold an identity at all.
    pub fn actor(&self) -> Option<&ActorRef> {
        match &self.kind {
            PrincipalKind::Player(actor) => Some(actor),
            PrincipalKind::Console => None,
        }
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PrincipalKind::Player(actor) => write!(f, "player:{}", actor.id),
            PrincipalKind::Console => f.write_str("console"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn only_players_are_interactive() {
        let player = Principal::player(ActorRef::new(Uuid::new_v4(), "Steve"));
        assert!(player.is_interactive());
        assert!(player.actor().is_some());

        let console = Principal::console();
        assert!(!console.is_interactive());
        assert!(console.actor().is_none());
    }

    #[test]
    fn capabilities_are_exact_matches() {
        let console = Principal::console().with_capabilities(vec!["companies.admin".to_string()]);
        assert!(console.has_capability("companies.admin"));
        assert!(!console.has_capability("companies"));
    }
}
