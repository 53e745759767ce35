pub mod company;
pub mod identity;
pub mod membership;

pub use company::CompanyId;
pub use identity::{ActorRef, Identity, IdentityId};
pub use membership::{Membership, Role};
