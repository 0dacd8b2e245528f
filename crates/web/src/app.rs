use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::WebError;
use crate::features;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        features::auth::handlers::register,
        features::auth::handlers::verify_email,
        features::auth::handlers::login,
        features::users::handlers::get_user,
        features::users::handlers::update_user,
        features::users::handlers::list_portfolio,
        features::users::handlers::add_portfolio_item,
        features::users::handlers::delete_portfolio_item,
        features::users::handlers::list_achievements,
        features::users::handlers::award_achievement,
        features::admin::handlers::list_users,
        features::admin::handlers::create_user,
        features::admin::handlers::get_user,
        features::admin::handlers::update_user,
        features::admin::handlers::delete_user,
        features::competitions::handlers::list_competitions,
        features::competitions::handlers::get_competition,
        features::competitions::handlers::create_competition,
        features::competitions::handlers::update_competition,
        features::competitions::handlers::transition_competition,
        features::competitions::handlers::delete_competition,
        features::competitions::handlers::list_results,
        features::competitions::handlers::record_result,
        features::competitions::handlers::list_registrations,
        features::registrations::handlers::create_registration,
        features::registrations::handlers::list_registrations,
        features::registrations::handlers::check_registration,
        features::registrations::handlers::get_registration,
        features::registrations::handlers::update_status,
        features::registrations::handlers::cancel_registration,
        features::registrations::handlers::delete_registration,
        features::teams::handlers::list_teams,
        features::teams::handlers::get_team,
        features::teams::handlers::create_team,
        features::teams::handlers::add_member,
        features::teams::handlers::remove_member,
        features::teams::handlers::disband_team,
        features::teams::handlers::update_status,
        features::teams::handlers::invite,
        features::teams::handlers::request_to_join,
        features::teams::handlers::list_invitations,
        features::invitations::handlers::list_incoming,
        features::invitations::handlers::respond,
        features::organizer::handlers::stats,
        features::organizer::handlers::competitions,
        features::organizer::handlers::registrations,
    ),
    components(
        schemas(
            storage::dto::user::RegisterUserRequest,
            storage::dto::user::LoginRequest,
            storage::dto::user::LoginResponse,
            storage::dto::user::VerifyEmailRequest,
            storage::dto::user::UserResponse,
            storage::dto::user::UserProfileResponse,
            storage::dto::user::UpdateProfileRequest,
            storage::dto::user::AdminCreateUserRequest,
            storage::dto::user::AdminCreateUserResponse,
            storage::dto::user::AdminUpdateUserRequest,
            storage::dto::user::CreatePortfolioItemRequest,
            storage::dto::user::PortfolioItemResponse,
            storage::dto::user::CreateAchievementRequest,
            storage::dto::user::AchievementResponse,
            storage::dto::common::PageMeta,
            storage::dto::competition::CreateCompetitionRequest,
            storage::dto::competition::UpdateCompetitionRequest,
            storage::dto::competition::TransitionRequest,
            storage::dto::competition::CompetitionResponse,
            storage::dto::competition::CompetitionListItem,
            storage::dto::competition::CompetitionDetailResponse,
            storage::dto::competition::OrganizerInfo,
            storage::dto::competition::TeamSummary,
            storage::dto::registration::CreateRegistrationRequest,
            storage::dto::registration::UpdateRegistrationStatusRequest,
            storage::dto::registration::RegistrationResponse,
            storage::dto::registration::RegistrationDetail,
            storage::dto::registration::RegistrationCheckResponse,
            storage::dto::result::RecordResultRequest,
            storage::dto::result::ResultResponse,
            storage::dto::team::CreateTeamRequest,
            storage::dto::team::AddMemberRequest,
            storage::dto::team::UpdateTeamStatusRequest,
            storage::dto::team::RespondInvitationRequest,
            storage::dto::team::TeamResponse,
            storage::dto::team::TeamListItem,
            storage::dto::team::TeamDetailResponse,
            storage::dto::team::MemberInfo,
            storage::dto::team::InvitationResponse,
            storage::dto::organizer::OrganizerStats,
            storage::dto::organizer::RecentRegistration,
            storage::models::Role,
            storage::models::UserStatus,
            storage::models::CompetitionType,
            storage::models::CompetitionStatus,
            storage::models::RegistrationStatus,
            storage::models::PaymentStatus,
            storage::models::TeamStatus,
            storage::models::TeamMember,
            storage::models::InvitationKind,
            storage::models::InvitationStatus,
            features::invitations::handlers::RespondInvitationResponse,
        )
    ),
    tags(
        (name = "auth", description = "Sign up, email verification and login"),
        (name = "users", description = "Profiles, portfolio and achievements"),
        (name = "admin", description = "User administration"),
        (name = "competitions", description = "Competition lifecycle and results"),
        (name = "registrations", description = "Registration and capacity admission"),
        (name = "teams", description = "Team formation"),
        (name = "invitations", description = "Answering team invitations and requests"),
        (name = "organizer", description = "Organizer dashboard"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn not_found() -> WebError {
    WebError::NotFound
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/auth", features::auth::routes::routes())
        .nest("/users", features::users::routes::routes(state.clone()))
        .nest("/admin", features::admin::routes::routes(state.clone()))
        .nest(
            "/competitions",
            features::competitions::routes::routes(state.clone()),
        )
        .nest(
            "/registrations",
            features::registrations::routes::routes(state.clone()),
        )
        .nest("/teams", features::teams::routes::routes(state.clone()))
        .nest(
            "/invitations",
            features::invitations::routes::routes(state.clone()),
        )
        .nest("/organizer", features::organizer::routes::routes(state.clone()));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(health))
        .nest("/api", api)
        .fallback(not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
