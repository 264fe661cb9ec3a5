use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use ream_storage::registration::RegistrationError;
use thiserror::Error;
use tracing::error;

use crate::{attestation_data::AttestationDataError, coordinator::SubmissionError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found: {0}")]
    NotFound(String),

    #[error("Internal Server Error: {0}")]
    InternalError(String),

    #[error("Service Unavailable: {0}")]
    ServiceUnavailable(String),
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).body(self.to_string())
    }

    fn status_code(&self) -> StatusCode {
        match *self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<AttestationDataError> for ApiError {
    fn from(err: AttestationDataError) -> Self {
        match err {
            AttestationDataError::InProgressTimeout(_) => {
                ApiError::ServiceUnavailable(err.to_string())
            }
            err => {
                error!("Failed to get attestation data: {err}");
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<SubmissionError> for ApiError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::Pool(_) | SubmissionError::InvalidSubnet(_) => {
                ApiError::BadRequest(err.to_string())
            }
            err => {
                error!("Failed to submit operation: {err}");
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::NotFound(_) => ApiError::NotFound(err.to_string()),
            err => {
                error!("Failed to read validator registration: {err}");
                ApiError::InternalError(err.to_string())
            }
        }
    }
}
