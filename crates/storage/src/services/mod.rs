pub mod admission;
pub mod lifecycle;
pub mod policy;
pub mod team_formation;

pub use lifecycle::{LifecycleRules, TransitionOutcome};
pub use team_formation::{InvitationOutcome, TeamRules};
