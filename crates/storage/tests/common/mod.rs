#![allow(dead_code)]

use chrono::{Duration, Utc};
use sqlx::PgPool;

use storage::dto::competition::CreateCompetitionRequest;
use storage::models::{Actor, Competition, CompetitionStatus, CompetitionType, Role, UserStatus};
use storage::repository::{NewUser, UserRepository};
use storage::services::{LifecycleRules, lifecycle};

pub async fn seed_user(pool: &PgPool, name: &str, role: Role) -> Actor {
    let user = UserRepository::new(pool)
        .create(&NewUser {
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            password_hash: "not-a-real-hash".to_string(),
            role,
            status: UserStatus::Active,
            region: Some("Novosibirsk".to_string()),
            organization: None,
            email_verified: true,
            verification_code: None,
        })
        .await
        .expect("seed user");

    Actor::new(user.id, user.role)
}

pub fn competition_request(max_participants: Option<i32>) -> CreateCompetitionRequest {
    let now = Utc::now();
    CreateCompetitionRequest {
        title: "Regional sport programming cup".to_string(),
        competition_type: CompetitionType::Regional,
        discipline: "Product programming".to_string(),
        description: Some("Team and solo tracks".to_string()),
        rules: None,
        prizes: None,
        region: "Novosibirsk".to_string(),
        registration_start: now - Duration::days(1),
        registration_end: now + Duration::days(1),
        event_start: now + Duration::days(2),
        event_end: now + Duration::days(3),
        max_participants,
        initial_status: Some(CompetitionStatus::RegistrationOpen),
        organizer_id: None,
    }
}

/// A competition open for registration right now
pub async fn open_competition(
    pool: &PgPool,
    organizer: &Actor,
    max_participants: Option<i32>,
) -> Competition {
    lifecycle::create(
        pool,
        organizer,
        LifecycleRules::default(),
        &competition_request(max_participants),
    )
    .await
    .expect("create competition")
}

/// Asserts the counter matches the registrations holding a slot
pub async fn assert_counter_consistent(pool: &PgPool, competition_id: &str) {
    let (counter, holding): (i32, i64) = sqlx::query_as(
        r#"
        SELECT c.current_participants,
               (SELECT COUNT(*) FROM registrations r
                 WHERE r.competition_id = c.id AND r.status IN ('PENDING', 'CONFIRMED'))
        FROM competitions c WHERE c.id = $1
        "#,
    )
    .bind(competition_id)
    .fetch_one(pool)
    .await
    .expect("counter query");

    assert_eq!(i64::from(counter), holding, "counter drifted from registrations");
}
