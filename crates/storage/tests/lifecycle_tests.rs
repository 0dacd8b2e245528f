//! Competition lifecycle against a live database.
//!
//! Run with: cargo test -p storage --test lifecycle_tests -- --ignored

mod common;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use common::{assert_counter_consistent, competition_request, open_competition, seed_user};
use storage::dto::competition::UpdateCompetitionRequest;
use storage::dto::registration::CreateRegistrationRequest;
use storage::dto::result::RecordResultRequest;
use storage::error::{ErrorKind, StorageError};
use storage::models::{CompetitionStatus, RegistrationStatus, Role};
use storage::repository::{CompetitionRepository, RegistrationRepository};
use storage::services::{LifecycleRules, admission, lifecycle};

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_forward_path_to_completion(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let mut req = competition_request(None);
    req.initial_status = None;

    let competition = lifecycle::create(&pool, &organizer, LifecycleRules::default(), &req)
        .await
        .unwrap();
    assert_eq!(competition.status, CompetitionStatus::Draft);

    for target in [
        CompetitionStatus::Moderation,
        CompetitionStatus::RegistrationOpen,
        CompetitionStatus::RegistrationClosed,
        CompetitionStatus::InProgress,
        CompetitionStatus::Completed,
    ] {
        let outcome = lifecycle::transition(&pool, &organizer, &competition.id, target)
            .await
            .unwrap();
        assert_eq!(outcome.competition.status, target);
    }

    let err = lifecycle::transition(&pool, &organizer, &competition.id, CompetitionStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidTransition { .. }));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_skipping_a_step_is_rejected(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let competition = open_competition(&pool, &organizer, None).await;

    let err = lifecycle::transition(&pool, &organizer, &competition.id, CompetitionStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_cancellation_cancels_registrations(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let competition = open_competition(&pool, &organizer, Some(10)).await;
    let req = CreateRegistrationRequest {
        competition_id: competition.id.clone(),
        user_id: None,
        team_id: None,
    };

    for name in ["Alice", "Boris"] {
        let athlete = seed_user(&pool, name, Role::Athlete).await;
        admission::register(&pool, &athlete, &req, Utc::now()).await.unwrap();
    }

    let outcome = lifecycle::transition(&pool, &organizer, &competition.id, CompetitionStatus::Cancelled)
        .await
        .unwrap();

    assert_eq!(outcome.competition.status, CompetitionStatus::Cancelled);
    assert_eq!(outcome.competition.current_participants, 0);
    assert_eq!(outcome.cancelled.len(), 2);

    let registrations = RegistrationRepository::new(&pool)
        .list(
            &Default::default(),
            storage::repository::RegistrationScope::OrganizedBy(&organizer.user_id),
        )
        .await
        .unwrap();
    assert!(registrations.iter().all(|r| r.status == RegistrationStatus::Cancelled));
    assert_counter_consistent(&pool, &competition.id).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_only_owner_transitions(pool: PgPool) {
    let owner = seed_user(&pool, "Olga", Role::Organizer).await;
    let other = seed_user(&pool, "Oleg", Role::Organizer).await;
    let competition = open_competition(&pool, &owner, None).await;

    let err = lifecycle::transition(&pool, &other, &competition.id, CompetitionStatus::Cancelled)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_update_revalidates_dates_and_capacity(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let athlete = seed_user(&pool, "Alice", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, Some(5)).await;

    let bad_dates = UpdateCompetitionRequest {
        event_end: Some(competition.event_start - Duration::hours(1)),
        ..Default::default()
    };
    let err = lifecycle::update(&pool, &organizer, &competition.id, &bad_dates)
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidDateRange(_)));

    admission::register(
        &pool,
        &athlete,
        &CreateRegistrationRequest {
            competition_id: competition.id.clone(),
            user_id: None,
            team_id: None,
        },
        Utc::now(),
    )
    .await
    .unwrap();

    let too_small = UpdateCompetitionRequest {
        max_participants: Some(1),
        ..Default::default()
    };
    let updated = lifecycle::update(&pool, &organizer, &competition.id, &too_small)
        .await
        .unwrap();
    assert_eq!(updated.max_participants, Some(1));

    let rename = UpdateCompetitionRequest {
        title: Some("Renamed".to_string()),
        ..Default::default()
    };
    let renamed = lifecycle::update(&pool, &organizer, &competition.id, &rename)
        .await
        .unwrap();
    assert_eq!(renamed.title, "Renamed");
    assert_eq!(renamed.status, CompetitionStatus::RegistrationOpen);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_capacity_below_admitted_is_conflict(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let competition = open_competition(&pool, &organizer, Some(5)).await;
    let req = CreateRegistrationRequest {
        competition_id: competition.id.clone(),
        user_id: None,
        team_id: None,
    };
    for name in ["Alice", "Boris"] {
        let athlete = seed_user(&pool, name, Role::Athlete).await;
        admission::register(&pool, &athlete, &req, Utc::now()).await.unwrap();
    }

    let shrink = UpdateCompetitionRequest {
        max_participants: Some(1),
        ..Default::default()
    };
    let err = lifecycle::update(&pool, &organizer, &competition.id, &shrink)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_results_only_after_completion(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let athlete = seed_user(&pool, "Alice", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, None).await;

    let result = RecordResultRequest {
        user_id: Some(athlete.user_id.clone()),
        team_id: None,
        place: Some(1),
        score: Some(Decimal::new(9850, 2)),
        time_spent: Some("02:14:00".to_string()),
        notes: None,
    };

    let err = lifecycle::record_result(&pool, &organizer, &competition.id, &result)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    for target in [
        CompetitionStatus::RegistrationClosed,
        CompetitionStatus::InProgress,
        CompetitionStatus::Completed,
    ] {
        lifecycle::transition(&pool, &organizer, &competition.id, target)
            .await
            .unwrap();
    }

    let recorded = lifecycle::record_result(&pool, &organizer, &competition.id, &result)
        .await
        .unwrap();
    assert_eq!(recorded.place, Some(1));
    assert_eq!(recorded.user_id.as_deref(), Some(athlete.user_id.as_str()));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_athlete_cannot_create_competition(pool: PgPool) {
    let athlete = seed_user(&pool, "Alice", Role::Athlete).await;
    let err = lifecycle::create(
        &pool,
        &athlete,
        LifecycleRules::default(),
        &competition_request(None),
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_detail_includes_organizer(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let competition = open_competition(&pool, &organizer, Some(10)).await;

    let detail = CompetitionRepository::new(&pool)
        .find_detail(&competition.id)
        .await
        .unwrap();

    assert_eq!(detail.organizer.id, organizer.user_id);
    assert_eq!(detail.organizer.name, "Olga");
    assert_eq!(detail.organizer.email, "olga@example.com");
    assert!(detail.teams.is_empty());
}
