use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use sharegallery_core::Error;

/// Error returned by API handlers, rendered as a plain-text body
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::NotFound(_) => Self {
                status: StatusCode::NOT_FOUND,
                message: "Image not found".to_string(),
            },
            Error::Remote(_) => {
                tracing::error!(error = %err, "Error reading image from remote share");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Error reading image file from remote share".to_string(),
                }
            }
            Error::Resize(_) | Error::StorageIo(_) => {
                tracing::error!(error = %err, "Error generating thumbnail");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Error generating thumbnail".to_string(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), self.message).into_response()
    }
}
