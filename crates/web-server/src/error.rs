use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use database::DbError;
use serde_json::json;
use thiserror::Error;
use tracing;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),
    #[error("Invalid request parameter: {0}")]
    BadRequest(String),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// A malformed path parameter (e.g. a non-numeric repo id) becomes a 400
/// wearing the same envelope as every other failure.
impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

/// Converts our custom `AppError` into an HTTP response.
///
/// Every failure answers with the same JSON envelope,
/// `{"error": <machine kind>, "message": <text>}`, so clients can branch on
/// the kind without parsing prose.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::Database(DbError::QueryTimeout(_)) => (
                StatusCode::GATEWAY_TIMEOUT,
                "timeout",
                "The database query did not complete in time".to_string(),
            ),
            AppError::Database(db_err) => {
                tracing::error!(error = ?db_err, "Database error.");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal database error occurred".to_string(),
                )
            }
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
        };

        let body = Json(json!({ "error": kind, "message": message }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use std::time::Duration;

    async fn envelope_of(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_maps_to_404_with_envelope() {
        let (status, body) = envelope_of(AppError::NotFound("Repo 42 not found".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
        assert_eq!(body["message"], "Repo 42 not found");
    }

    #[tokio::test]
    async fn bad_request_maps_to_400_with_envelope() {
        let (status, body) = envelope_of(AppError::BadRequest("not a number".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "bad_request");
        assert_eq!(body["message"], "not a number");
    }

    #[tokio::test]
    async fn query_timeout_maps_to_504() {
        let err = AppError::Database(DbError::QueryTimeout(Duration::from_secs(10)));
        let (status, body) = envelope_of(err).await;
        assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body["error"], "timeout");
    }

    #[tokio::test]
    async fn other_database_errors_map_to_500_with_generic_message() {
        let err = AppError::Database(DbError::ConnectionConfigError(
            "DATABASE_URL must be set".into(),
        ));
        let (status, body) = envelope_of(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "internal_error");
        // The raw driver detail never reaches the client.
        assert_eq!(body["message"], "An internal database error occurred");
    }
}
