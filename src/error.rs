use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde_json::json;
use tracing::error;

/// Error taxonomy shared by the engines and mapped to HTTP responses at the
/// API boundary. Everything except `Database` is recoverable by the caller.
#[derive(Debug, thiserror::Error)]
pub enum HrError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("attendance already marked for this date")]
    DuplicateRecord,

    #[error("{0}")]
    InvalidState(&'static str),

    #[error("{0}")]
    InvalidRequest(&'static str),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl actix_web::ResponseError for HrError {
    fn status_code(&self) -> StatusCode {
        match self {
            HrError::NotFound(_) => StatusCode::NOT_FOUND,
            HrError::DuplicateRecord => StatusCode::CONFLICT,
            HrError::InvalidState(_) | HrError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            HrError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let HrError::Database(err) = self {
            error!(error = %err, "database failure");
            return HttpResponse::InternalServerError().json(json!({
                "message": "Internal Server Error"
            }));
        }

        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}
