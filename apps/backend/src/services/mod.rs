pub mod catalog;
pub mod registry;
pub mod session_actor;

pub use catalog::{CardCatalog, InMemoryCatalog, ResolvedCards};
pub use registry::{Membership, MembershipRole, SessionRegistry, SessionSummary};
pub use session_actor::{spawn_session, SessionCommand, SessionHandle};
