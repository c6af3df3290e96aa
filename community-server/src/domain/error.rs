use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use crate::domain::form::FormErrors;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("group not found: {0}")]
    GroupNotFound(String),
    #[error("post not found: {0}")]
    PostNotFound(i64),
    #[error("page not found: {0}")]
    PageNotFound(String),
    #[error("user already exists: {0}")]
    UserAlreadyExists(String),
    #[error("group already exists: {0}")]
    GroupAlreadyExists(String),
    #[error("users cannot follow themselves")]
    SelfFollow,
    #[error("invalid form: {0}")]
    Validation(FormErrors),
    #[error("forbidden")]
    Forbidden,
    #[error("unauthorized")]
    Unauthorized,
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::UserNotFound(_)
                | DomainError::GroupNotFound(_)
                | DomainError::PostNotFound(_)
                | DomainError::PageNotFound(_)
        )
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Internal(format!("database error: {err}"))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::UserNotFound(_)
            | DomainError::GroupNotFound(_)
            | DomainError::PostNotFound(_)
            | DomainError::PageNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::UserAlreadyExists(_) | DomainError::GroupAlreadyExists(_) => {
                StatusCode::CONFLICT
            }
            DomainError::SelfFollow => StatusCode::BAD_REQUEST,
            DomainError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DomainError::Unauthorized => StatusCode::UNAUTHORIZED,
            DomainError::Forbidden => StatusCode::FORBIDDEN,
            DomainError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let details = match self {
            DomainError::UserNotFound(username) => Some(json!({ "username": username })),
            DomainError::GroupNotFound(slug) => Some(json!({ "slug": slug })),
            DomainError::PostNotFound(id) => Some(json!({ "post_id": id })),
            DomainError::PageNotFound(path) => Some(json!({ "path": path })),
            DomainError::Validation(errors) => Some(json!({ "errors": errors })),
            _ => None,
        };

        // Internal details stay in the logs.
        let message = match self {
            DomainError::Internal(detail) => {
                tracing::error!(error = %detail, "internal error");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[actix_web::test]
    async fn not_found_renders_json_details() {
        let err = DomainError::GroupNotFound("cats".into());
        assert!(err.is_not_found());

        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "group not found: cats");
        assert_eq!(value["details"]["slug"], "cats");
    }

    #[actix_web::test]
    async fn internal_errors_hide_their_cause() {
        let response = DomainError::Internal("connection refused".into()).error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body()).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(!text.contains("connection refused"));
    }
}
