//! Admission against a live database.
//!
//! Requires PostgreSQL reachable through DATABASE_URL.
//! Run with: cargo test -p storage --test admission_tests -- --ignored

mod common;

use chrono::Utc;
use futures::future::join_all;
use sqlx::PgPool;

use common::{assert_counter_consistent, open_competition, seed_user};
use storage::dto::registration::{CreateRegistrationRequest, UpdateRegistrationStatusRequest};
use storage::error::{ErrorKind, StorageError};
use storage::models::{CompetitionStatus, PaymentStatus, RegistrationStatus, Role};
use storage::repository::{CompetitionRepository, UserRepository};
use storage::services::admission;
use storage::services::lifecycle;

fn registration_for(competition_id: &str) -> CreateRegistrationRequest {
    CreateRegistrationRequest {
        competition_id: competition_id.to_string(),
        user_id: None,
        team_id: None,
    }
}

async fn participants(pool: &PgPool, competition_id: &str) -> i32 {
    CompetitionRepository::new(pool)
        .find_by_id(competition_id)
        .await
        .unwrap()
        .current_participants
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_capacity_scenario(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let a = seed_user(&pool, "Alice", Role::Athlete).await;
    let b = seed_user(&pool, "Boris", Role::Athlete).await;
    let d = seed_user(&pool, "Dmitry", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, Some(2)).await;
    let req = registration_for(&competition.id);

    let reg_a = admission::register(&pool, &a, &req, Utc::now()).await.unwrap();
    assert_eq!(participants(&pool, &competition.id).await, 1);

    admission::register(&pool, &b, &req, Utc::now()).await.unwrap();
    assert_eq!(participants(&pool, &competition.id).await, 2);

    let err = admission::register(&pool, &d, &req, Utc::now()).await.unwrap_err();
    assert!(matches!(err, StorageError::CapacityExceeded));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(participants(&pool, &competition.id).await, 2);

    let cancelled = admission::cancel(&pool, &a, &reg_a.id).await.unwrap();
    assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
    assert_eq!(participants(&pool, &competition.id).await, 1);

    admission::register(&pool, &d, &req, Utc::now()).await.unwrap();
    assert_eq!(participants(&pool, &competition.id).await, 2);

    assert_counter_consistent(&pool, &competition.id).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_concurrent_registrations_never_overbook(pool: PgPool) {
    const CAPACITY: usize = 5;
    const EXTRA: usize = 7;

    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let competition = open_competition(&pool, &organizer, Some(CAPACITY as i32)).await;

    let mut athletes = Vec::new();
    for i in 0..CAPACITY + EXTRA {
        athletes.push(seed_user(&pool, &format!("Athlete{i}"), Role::Athlete).await);
    }

    let attempts = athletes.into_iter().map(|actor| {
        let pool = pool.clone();
        let req = registration_for(&competition.id);
        tokio::spawn(async move { admission::register(&pool, &actor, &req, Utc::now()).await })
    });

    let outcomes: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked"))
        .collect();

    let admitted = outcomes.iter().filter(|r| r.is_ok()).count();
    let conflicts = outcomes
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind() == ErrorKind::Conflict))
        .count();

    assert_eq!(admitted, CAPACITY);
    assert_eq!(conflicts, EXTRA);
    assert_eq!(participants(&pool, &competition.id).await, CAPACITY as i32);
    assert_counter_consistent(&pool, &competition.id).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_duplicate_registration_rejected(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let athlete = seed_user(&pool, "Alice", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, None).await;
    let req = registration_for(&competition.id);

    admission::register(&pool, &athlete, &req, Utc::now()).await.unwrap();
    let err = admission::register(&pool, &athlete, &req, Utc::now()).await.unwrap_err();
    assert!(matches!(err, StorageError::AlreadyRegistered));

    let concurrent = join_all((0..4).map(|_| {
        let pool = pool.clone();
        let actor = athlete.clone();
        let req = req.clone();
        tokio::spawn(async move { admission::register(&pool, &actor, &req, Utc::now()).await })
    }))
    .await;

    for outcome in concurrent {
        assert!(matches!(outcome.unwrap(), Err(StorageError::AlreadyRegistered)));
    }
    assert_eq!(participants(&pool, &competition.id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_duplicate_on_full_competition_is_already_registered(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let athlete = seed_user(&pool, "Alice", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, Some(1)).await;
    let req = registration_for(&competition.id);

    admission::register(&pool, &athlete, &req, Utc::now()).await.unwrap();
    assert_eq!(participants(&pool, &competition.id).await, 1);

    let err = admission::register(&pool, &athlete, &req, Utc::now()).await.unwrap_err();
    assert!(matches!(err, StorageError::AlreadyRegistered));
    assert_counter_consistent(&pool, &competition.id).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_closed_competition_refuses_registration(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let athlete = seed_user(&pool, "Alice", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, Some(10)).await;

    lifecycle::transition(
        &pool,
        &organizer,
        &competition.id,
        CompetitionStatus::RegistrationClosed,
    )
    .await
    .unwrap();

    let err = admission::register(&pool, &athlete, &registration_for(&competition.id), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::RegistrationClosed(_)));
    assert_eq!(err.kind(), ErrorKind::InvalidState);

    let with_foreign_team = CreateRegistrationRequest {
        team_id: Some("team_does_not_exist".to_string()),
        ..registration_for(&competition.id)
    };
    let err = admission::register(&pool, &athlete, &with_foreign_team, Utc::now())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidState);
    assert_eq!(participants(&pool, &competition.id).await, 0);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_deleting_user_releases_their_slots(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let alice = seed_user(&pool, "Alice", Role::Athlete).await;
    let boris = seed_user(&pool, "Boris", Role::Athlete).await;
    let first = open_competition(&pool, &organizer, Some(2)).await;
    let second = open_competition(&pool, &organizer, None).await;

    for competition in [&first, &second] {
        admission::register(&pool, &alice, &registration_for(&competition.id), Utc::now())
            .await
            .unwrap();
    }
    admission::register(&pool, &boris, &registration_for(&first.id), Utc::now())
        .await
        .unwrap();

    // A cancelled registration must not be released a second time
    let cancelled = admission::register(&pool, &boris, &registration_for(&second.id), Utc::now())
        .await
        .unwrap();
    admission::cancel(&pool, &boris, &cancelled.id).await.unwrap();

    UserRepository::new(&pool).delete(&alice.user_id).await.unwrap();

    assert_eq!(participants(&pool, &first.id).await, 1);
    assert_eq!(participants(&pool, &second.id).await, 0);
    assert_counter_consistent(&pool, &first.id).await;
    assert_counter_consistent(&pool, &second.id).await;

    // The freed slot is usable again
    let clara = seed_user(&pool, "Clara", Role::Athlete).await;
    admission::register(&pool, &clara, &registration_for(&first.id), Utc::now())
        .await
        .unwrap();
    assert_counter_consistent(&pool, &first.id).await;

    let err = UserRepository::new(&pool).delete(&alice.user_id).await.unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_rejection_releases_slot(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let athlete = seed_user(&pool, "Alice", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, Some(1)).await;

    let reg = admission::register(&pool, &athlete, &registration_for(&competition.id), Utc::now())
        .await
        .unwrap();

    let rejected = admission::set_status(
        &pool,
        &organizer,
        &reg.id,
        &UpdateRegistrationStatusRequest {
            status: RegistrationStatus::Rejected,
            payment_status: None,
            payment_id: None,
        },
    )
    .await
    .unwrap();

    assert_eq!(rejected.status, RegistrationStatus::Rejected);
    assert_eq!(participants(&pool, &competition.id).await, 0);

    // REJECTED -> CANCELLED must not release the slot a second time
    admission::cancel(&pool, &athlete, &reg.id).await.unwrap();
    assert_eq!(participants(&pool, &competition.id).await, 0);
    assert_counter_consistent(&pool, &competition.id).await;
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_payment_only_update_keeps_status(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let athlete = seed_user(&pool, "Alice", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, None).await;

    let reg = admission::register(&pool, &athlete, &registration_for(&competition.id), Utc::now())
        .await
        .unwrap();

    let updated = admission::set_status(
        &pool,
        &organizer,
        &reg.id,
        &UpdateRegistrationStatusRequest {
            status: RegistrationStatus::Pending,
            payment_status: Some(PaymentStatus::Paid),
            payment_id: Some("pay_42".to_string()),
        },
    )
    .await
    .unwrap();

    assert_eq!(updated.status, RegistrationStatus::Pending);
    assert_eq!(updated.payment_status, PaymentStatus::Paid);
    assert_eq!(participants(&pool, &competition.id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_athlete_cannot_review_or_cancel_others(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let alice = seed_user(&pool, "Alice", Role::Athlete).await;
    let boris = seed_user(&pool, "Boris", Role::Athlete).await;
    let competition = open_competition(&pool, &organizer, None).await;

    let reg = admission::register(&pool, &alice, &registration_for(&competition.id), Utc::now())
        .await
        .unwrap();

    let err = admission::cancel(&pool, &boris, &reg.id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    let err = admission::delete_registration(&pool, &organizer, &reg.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    assert_eq!(participants(&pool, &competition.id).await, 1);
}

#[sqlx::test(migrations = "./migrations")]
#[ignore]
async fn test_invariant_after_mixed_operations(pool: PgPool) {
    let organizer = seed_user(&pool, "Olga", Role::Organizer).await;
    let admin = seed_user(&pool, "Root", Role::Admin).await;
    let competition = open_competition(&pool, &organizer, Some(4)).await;
    let req = registration_for(&competition.id);

    let mut registrations = Vec::new();
    for name in ["Alice", "Boris", "Clara", "Dmitry"] {
        let actor = seed_user(&pool, name, Role::Athlete).await;
        registrations.push((
            actor.clone(),
            admission::register(&pool, &actor, &req, Utc::now()).await.unwrap(),
        ));
    }

    let confirm = UpdateRegistrationStatusRequest {
        status: RegistrationStatus::Confirmed,
        payment_status: None,
        payment_id: None,
    };
    admission::set_status(&pool, &organizer, &registrations[0].1.id, &confirm)
        .await
        .unwrap();
    admission::cancel(&pool, &registrations[1].0, &registrations[1].1.id)
        .await
        .unwrap();
    admission::delete_registration(&pool, &admin, &registrations[2].1.id)
        .await
        .unwrap();

    assert_eq!(participants(&pool, &competition.id).await, 2);
    assert_counter_consistent(&pool, &competition.id).await;
}
