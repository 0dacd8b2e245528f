pub mod actor;
pub mod competition;
pub mod ids;
pub mod portfolio_item;
pub mod registration;
pub mod result;
pub mod team;
pub mod user;

pub use actor::Actor;
pub use competition::{Competition, CompetitionStatus, CompetitionType, Schedule};
pub use ids::{IdKind, new_id};
pub use portfolio_item::PortfolioItem;
pub use registration::{PaymentStatus, Registration, RegistrationStatus};
pub use result::{Achievement, CompetitionResult};
pub use team::{InvitationKind, InvitationStatus, Team, TeamInvitation, TeamMember, TeamStatus};
pub use user::{Role, User, UserStatus};
