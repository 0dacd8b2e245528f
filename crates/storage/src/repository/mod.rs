pub mod competition;
pub mod organizer;
pub mod portfolio;
pub mod registration;
pub mod result;
pub mod team;
pub mod user;

pub use competition::CompetitionRepository;
pub use organizer::OrganizerRepository;
pub use portfolio::PortfolioRepository;
pub use registration::{ParticipantContact, RegistrationRepository, RegistrationScope};
pub use result::{AchievementRepository, ResultRepository};
pub use team::{InvitationRepository, TeamRepository};
pub use user::{NewUser, UserRepository};

/// Transaction handle threaded through multi-statement mutations
pub type Tx<'c> = sqlx::Transaction<'c, sqlx::Postgres>;
