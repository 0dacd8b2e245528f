use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;
use storage::error::{ErrorKind, StorageError};
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Validation(ValidationErrors),
    BadRequest(String),
    Unauthorized(String),
    NotFound,
    InternalServerError(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            Self::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            Self::NotFound => write!(f, "Resource not found"),
            Self::InternalServerError(msg) => write!(f, "Internal server error: {}", msg),
        }
    }
}

impl WebError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Storage(e) => match e.kind() {
                ErrorKind::NotFound => (StatusCode::NOT_FOUND, "not_found"),
                ErrorKind::Forbidden => (StatusCode::FORBIDDEN, "forbidden"),
                ErrorKind::Conflict => (StatusCode::CONFLICT, "conflict"),
                ErrorKind::InvalidState => (StatusCode::UNPROCESSABLE_ENTITY, "invalid_state"),
                ErrorKind::Validation => (StatusCode::BAD_REQUEST, "validation"),
                ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            },
            Self::Validation(_) | Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "validation"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            Self::NotFound => (StatusCode::NOT_FOUND, "not_found"),
            Self::InternalServerError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status_code, kind) = self.status_and_kind();

        let body = match &self {
            Self::Storage(e) if status_code == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!("Storage error: {:?}", e);
                json!({
                    "error": "An internal error occurred",
                    "kind": kind
                })
            }
            Self::Storage(e) => {
                json!({
                    "error": e.to_string(),
                    "kind": kind
                })
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                json!({
                    "error": "Validation failed",
                    "kind": kind,
                    "details": field_errors
                })
            }
            Self::BadRequest(msg) | Self::Unauthorized(msg) => {
                json!({
                    "error": msg,
                    "kind": kind
                })
            }
            Self::NotFound => {
                json!({
                    "error": "Resource not found",
                    "kind": kind
                })
            }
            Self::InternalServerError(msg) => {
                tracing::error!("Internal server error: {}", msg);
                json!({
                    "error": "An internal error occurred",
                    "kind": kind
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

pub type WebResult<T> = Result<T, WebError>;

#[cfg(test)]
mod tests {
    use super::*;
    use storage::models::CompetitionStatus;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_taxonomy_status_codes() {
        let cases = [
            (StorageError::NotFound("Competition"), StatusCode::NOT_FOUND),
            (StorageError::Forbidden("no".into()), StatusCode::FORBIDDEN),
            (StorageError::AlreadyRegistered, StatusCode::CONFLICT),
            (StorageError::CapacityExceeded, StatusCode::CONFLICT),
            (StorageError::TeamFull, StatusCode::CONFLICT),
            (
                StorageError::RegistrationClosed("closed".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                StorageError::InvalidTransition {
                    from: CompetitionStatus::Draft,
                    to: CompetitionStatus::Completed,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                StorageError::InvalidDateRange("event_end is before event_start"),
                StatusCode::BAD_REQUEST,
            ),
            (
                StorageError::Database(sqlx::Error::PoolTimedOut),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(WebError::from(err).into_response().status(), expected);
        }
    }

    #[tokio::test]
    async fn test_conflict_body_names_kind() {
        let response = WebError::from(StorageError::CapacityExceeded).into_response();
        let body = body_json(response).await;
        assert_eq!(body["kind"], "conflict");
        assert!(body["error"].as_str().unwrap().contains("maximum"));
    }

    #[tokio::test]
    async fn test_internal_errors_are_not_leaked() {
        let response = WebError::from(StorageError::Database(sqlx::Error::PoolClosed)).into_response();
        let body = body_json(response).await;
        assert_eq!(body["error"], "An internal error occurred");
        assert_eq!(body["kind"], "internal");
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let response = WebError::Unauthorized("missing bearer token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(response).await["kind"], "unauthorized");
    }
}
