use uuid::Uuid;

/// Prefix identifying which entity an id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdKind {
    User,
    Competition,
    Team,
    TeamMember,
    Invitation,
    Registration,
    Result,
    Achievement,
    PortfolioItem,
}

impl IdKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::User => "usr",
            Self::Competition => "comp",
            Self::Team => "team",
            Self::TeamMember => "tm",
            Self::Invitation => "inv",
            Self::Registration => "reg",
            Self::Result => "res",
            Self::Achievement => "ach",
            Self::PortfolioItem => "port",
        }
    }
}

/// Generates a fresh opaque id such as `reg_3f2c...`; ids are never reused.
pub fn new_id(kind: IdKind) -> String {
    format!("{}_{}", kind.prefix(), Uuid::new_v4().simple())
}
