//! Team formation against a live database.
//!
//! Run with: cargo test -p storage --test team_tests -- --ignored

mod common;

use sqlx::PgPool;

use common::{open_competition, seed_user};
use storage::dto::team::CreateTeamRequest;
use storage::error::{ErrorKind, StorageError};
use storage::models::{InvitationStatus, Role, TeamStatus};
use storage::repository::TeamRepository;
use storage::services::{TeamRules, team_formation};

fn team_request(competition_id: &str, name: &str) -> CreateTeamRequest {
    CreateTeamRequest {
        competition_id: competition_id.to_string(),
        name: name.to_string(),
        captain_id: None,
    }
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_team_never_exceeds_cap(pool: PgPool) {
    let rules = TeamRules::default();
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let captain = seed_user(&pool, "Carl", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, None).await;

    let team = team_formation::create_team(&pool, &captain, rules, &team_request(&competition.id, "Rust"))
        .await
        .unwrap();
    assert_eq!(team.status, TeamStatus::NeedsMembers);

    let second = seed_user(&pool, "Maria", Role::Athlete).await;
    team_formation::add_member(&pool, &captain, rules, &team.id, &second.user_id)
        .await
        .unwrap();
    let third = seed_user(&pool, "Nikita", Role::Athlete).await;
    team_formation::add_member(&pool, &captain, rules, &team.id, &third.user_id)
        .await
        .unwrap();

    let fourth = seed_user(&pool, "Pavel", Role::Athlete).await;
    let err = team_formation::add_member(&pool, &captain, rules, &team.id, &fourth.user_id)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::TeamFull));

    let detail = TeamRepository::new(&pool).find_detail(&team.id).await.unwrap();
    assert_eq!(detail.members.len(), 3);
    assert_eq!(detail.members.iter().filter(|m| m.is_captain).count(), 1);
    assert_eq!(detail.members[0].user_id, captain.user_id);
    assert_eq!(detail.team.status, TeamStatus::Pending);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_one_team_per_competition(pool: PgPool) {
    let rules = TeamRules::default();
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let carl = seed_user(&pool, "Carl", Role::Athlete).await;
    let dina = seed_user(&pool, "Dina", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, None).await;

    let first = team_formation::create_team(&pool, &carl, rules, &team_request(&competition.id, "A"))
        .await
        .unwrap();
    let err = team_formation::create_team(&pool, &carl, rules, &team_request(&competition.id, "B"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let other = team_formation::create_team(&pool, &dina, rules, &team_request(&competition.id, "C"))
        .await
        .unwrap();
    let err = team_formation::add_member(&pool, &dina, rules, &other.id, &carl.user_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    assert_ne!(first.id, other.id);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_captain_cannot_leave_and_status_falls_back(pool: PgPool) {
    let rules = TeamRules::default();
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let captain = seed_user(&pool, "Carl", Role::Athlete).await;
    let member = seed_user(&pool, "Maria", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, None).await;

    let team = team_formation::create_team(&pool, &captain, rules, &team_request(&competition.id, "Rust"))
        .await
        .unwrap();
    team_formation::add_member(&pool, &captain, rules, &team.id, &member.user_id)
        .await
        .unwrap();

    let err = team_formation::remove_member(&pool, &captain, rules, &team.id, &captain.user_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    team_formation::remove_member(&pool, &member, rules, &team.id, &member.user_id)
        .await
        .unwrap();

    let team = TeamRepository::new(&pool).find_by_id(&team.id).await.unwrap();
    assert_eq!(team.status, TeamStatus::NeedsMembers);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_invitation_acceptance_adds_member(pool: PgPool) {
    let rules = TeamRules::default();
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let captain = seed_user(&pool, "Carl", Role::Athlete).await;
    let invitee = seed_user(&pool, "Maria", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, None).await;

    let team = team_formation::create_team(&pool, &captain, rules, &team_request(&competition.id, "Rust"))
        .await
        .unwrap();

    let invitation = team_formation::invite(&pool, &captain, rules, &team.id, &invitee.user_id)
        .await
        .unwrap();

    let err = team_formation::respond(&pool, &captain, rules, &invitation.id, true)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let outcome = team_formation::respond(&pool, &invitee, rules, &invitation.id, true)
        .await
        .unwrap();
    assert_eq!(outcome.invitation.status, InvitationStatus::Accepted);
    assert!(outcome.member.is_some());

    let err = team_formation::respond(&pool, &invitee, rules, &invitation.id, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_failed_acceptance_leaves_invitation_pending(pool: PgPool) {
    let rules = TeamRules::new(2, 2).unwrap();
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let captain = seed_user(&pool, "Carl", Role::Athlete).await;
    let first = seed_user(&pool, "Maria", Role::Athlete).await;
    let second = seed_user(&pool, "Nikita", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, None).await;

    let team = team_formation::create_team(&pool, &captain, rules, &team_request(&competition.id, "Rust"))
        .await
        .unwrap();

    let request = team_formation::request_to_join(&pool, &second, rules, &team.id)
        .await
        .unwrap();
    team_formation::add_member(&pool, &captain, rules, &team.id, &first.user_id)
        .await
        .unwrap();

    let err = team_formation::respond(&pool, &captain, rules, &request.id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::TeamFull));

    let invitations = storage::repository::InvitationRepository::new(&pool)
        .list_for_team(&team.id)
        .await
        .unwrap();
    assert_eq!(invitations.len(), 1);
    assert_eq!(invitations[0].status, InvitationStatus::Pending);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_organizer_review(pool: PgPool) {
    let rules = TeamRules::new(3, 1).unwrap();
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let captain = seed_user(&pool, "Carl", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, None).await;

    let team = team_formation::create_team(&pool, &captain, rules, &team_request(&competition.id, "Solo"))
        .await
        .unwrap();
    assert_eq!(team.status, TeamStatus::Pending);

    let err = team_formation::set_team_status(&pool, &captain, &team.id, TeamStatus::Confirmed)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let confirmed = team_formation::set_team_status(&pool, &organizer, &team.id, TeamStatus::Confirmed)
        .await
        .unwrap();
    assert_eq!(confirmed.status, TeamStatus::Confirmed);

    let err = team_formation::set_team_status(&pool, &organizer, &team.id, TeamStatus::Pending)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}
