//! Single authorization policy consulted by every mutating service.

use crate::error::{Result, StorageError};
use crate::models::{Actor, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateCompetition,
    /// Update, transition or delete a competition
    ManageCompetition,
    ViewCompetitionRegistrations,
    RecordResults,
    /// Submit a registration on behalf of a user
    RegisterParticipant,
    ViewRegistration,
    CancelRegistration,
    /// Confirm, reject or change payment status
    ReviewRegistration,
    /// Hard delete, reserved to administrators
    DeleteRegistration,
    /// Create, add/remove members, invite, disband
    ManageTeam,
    ReviewTeam,
    LeaveTeam,
    RespondInvitation,
    ManageProfile,
    AdministerUsers,
}

/// Ownership facts about the thing being acted on
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Platform,
    Competition {
        organizer_id: &'a str,
    },
    Registration {
        owner_id: &'a str,
        organizer_id: &'a str,
    },
    Team {
        captain_id: &'a str,
        organizer_id: &'a str,
    },
    TeamMember {
        member_id: &'a str,
        captain_id: &'a str,
        organizer_id: &'a str,
    },
    User {
        user_id: &'a str,
    },
    Invitation {
        recipient_id: &'a str,
    },
}

pub fn is_allowed(actor: &Actor, action: Action, resource: Resource<'_>) -> bool {
    if actor.is_admin() {
        return true;
    }

    match (action, resource) {
        (Action::CreateCompetition, Resource::Platform) => actor.role == Role::Organizer,

        (
            Action::ManageCompetition
            | Action::ViewCompetitionRegistrations
            | Action::RecordResults,
            Resource::Competition { organizer_id },
        ) => actor.role == Role::Organizer && actor.is(organizer_id),

        (Action::RegisterParticipant, Resource::User { user_id }) => actor.is(user_id),

        (
            Action::ViewRegistration | Action::CancelRegistration,
            Resource::Registration {
                owner_id,
                organizer_id,
            },
        ) => actor.is(owner_id) || actor.is(organizer_id),

        (
            Action::ReviewRegistration,
            Resource::Registration { organizer_id, .. },
        ) => actor.is(organizer_id),

        (
            Action::ManageTeam,
            Resource::Team {
                captain_id,
                organizer_id,
            },
        ) => actor.is(captain_id) || actor.is(organizer_id),

        (Action::ReviewTeam, Resource::Team { organizer_id, .. }) => actor.is(organizer_id),

        (
            Action::LeaveTeam,
            Resource::TeamMember {
                member_id,
                captain_id,
                organizer_id,
            },
        ) => actor.is(member_id) || actor.is(captain_id) || actor.is(organizer_id),

        (Action::RespondInvitation, Resource::Invitation { recipient_id }) => {
            actor.is(recipient_id)
        }

        (Action::ManageProfile, Resource::User { user_id }) => actor.is(user_id),

        _ => false,
    }
}

pub fn authorize(actor: &Actor, action: Action, resource: Resource<'_>) -> Result<()> {
    if is_allowed(actor, action, resource) {
        Ok(())
    } else {
        tracing::warn!(
            user_id = %actor.user_id,
            role = %actor.role,
            ?action,
            "Authorization denied"
        );
        Err(StorageError::Forbidden(format!(
            "{} is not allowed to perform {:?}",
            actor.role, action
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn athlete(id: &str) -> Actor {
        Actor::new(id, Role::Athlete)
    }

    fn organizer(id: &str) -> Actor {
        Actor::new(id, Role::Organizer)
    }

    fn admin() -> Actor {
        Actor::new("usr_admin", Role::Admin)
    }

    #[test]
    fn test_admin_passes_everything() {
        let resource = Resource::Competition {
            organizer_id: "usr_other",
        };
        assert!(is_allowed(&admin(), Action::ManageCompetition, resource));
        assert!(is_allowed(&admin(), Action::AdministerUsers, Resource::Platform));
    }

    #[test]
    fn test_only_organizers_create_competitions() {
        assert!(is_allowed(
            &organizer("usr_o"),
            Action::CreateCompetition,
            Resource::Platform
        ));
        assert!(!is_allowed(
            &athlete("usr_a"),
            Action::CreateCompetition,
            Resource::Platform
        ));
    }

    #[test]
    fn test_organizer_manages_only_own_competitions() {
        let own = Resource::Competition {
            organizer_id: "usr_o",
        };
        let foreign = Resource::Competition {
            organizer_id: "usr_x",
        };
        assert!(is_allowed(&organizer("usr_o"), Action::ManageCompetition, own));
        assert!(!is_allowed(&organizer("usr_o"), Action::ManageCompetition, foreign));
        // An athlete id matching the organizer field is not enough
        assert!(!is_allowed(&athlete("usr_o"), Action::ManageCompetition, own));
    }

    #[test]
    fn test_registration_cancel_by_owner_or_organizer() {
        let resource = Resource::Registration {
            owner_id: "usr_a",
            organizer_id: "usr_o",
        };
        assert!(is_allowed(&athlete("usr_a"), Action::CancelRegistration, resource));
        assert!(is_allowed(&organizer("usr_o"), Action::CancelRegistration, resource));
        assert!(!is_allowed(&athlete("usr_b"), Action::CancelRegistration, resource));
    }

    #[test]
    fn test_owner_cannot_review_own_registration() {
        let resource = Resource::Registration {
            owner_id: "usr_a",
            organizer_id: "usr_o",
        };
        assert!(!is_allowed(&athlete("usr_a"), Action::ReviewRegistration, resource));
        assert!(is_allowed(&organizer("usr_o"), Action::ReviewRegistration, resource));
    }

    #[test]
    fn test_register_only_self() {
        let me = Resource::User { user_id: "usr_a" };
        let other = Resource::User { user_id: "usr_b" };
        assert!(is_allowed(&athlete("usr_a"), Action::RegisterParticipant, me));
        assert!(!is_allowed(&athlete("usr_a"), Action::RegisterParticipant, other));
    }

    #[test]
    fn test_team_management() {
        let team = Resource::Team {
            captain_id: "usr_c",
            organizer_id: "usr_o",
        };
        assert!(is_allowed(&athlete("usr_c"), Action::ManageTeam, team));
        assert!(is_allowed(&organizer("usr_o"), Action::ManageTeam, team));
        assert!(!is_allowed(&athlete("usr_m"), Action::ManageTeam, team));
        assert!(!is_allowed(&athlete("usr_c"), Action::ReviewTeam, team));
    }

    #[test]
    fn test_member_may_leave() {
        let membership = Resource::TeamMember {
            member_id: "usr_m",
            captain_id: "usr_c",
            organizer_id: "usr_o",
        };
        assert!(is_allowed(&athlete("usr_m"), Action::LeaveTeam, membership));
        assert!(!is_allowed(&athlete("usr_z"), Action::LeaveTeam, membership));
    }

    #[test]
    fn test_only_admin_deletes_registrations() {
        let resource = Resource::Registration {
            owner_id: "usr_a",
            organizer_id: "usr_o",
        };
        assert!(is_allowed(&admin(), Action::DeleteRegistration, resource));
        assert!(!is_allowed(&organizer("usr_o"), Action::DeleteRegistration, resource));
        assert!(!is_allowed(&athlete("usr_a"), Action::DeleteRegistration, resource));
    }

    #[test]
    fn test_mismatched_resource_is_denied() {
        assert!(!is_allowed(
            &organizer("usr_o"),
            Action::ManageCompetition,
            Resource::User { user_id: "usr_o" }
        ));
    }

    #[test]
    fn test_authorize_returns_forbidden() {
        let err = authorize(&athlete("usr_a"), Action::AdministerUsers, Resource::Platform)
            .unwrap_err();
        assert!(matches!(err, StorageError::Forbidden(_)));
    }
}
