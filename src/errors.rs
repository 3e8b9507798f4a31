use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use time::Date;
use tracing::warn;
use crate::capacity::PARTY_SIZES;
use crate::models::visiter::VisiterId;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("party size must be between {} and {}, got {0}", PARTY_SIZES.start(), PARTY_SIZES.end())]
    InvalidPartySize(u32),
    #[error("a visit on {0} is already booked")]
    DuplicateDate(Date),
    #[error("booking failed, only {remaining} places left on {date}")]
    CapacityExceeded { date: Date, remaining: u32 },
    #[error("reservation {0} not found")]
    NotFound(VisiterId),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
    #[error("visit service request failed: {0:#}")]
    Request(anyhow::Error),
}

impl BookingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::InvalidPartySize(_) | BookingError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            BookingError::DuplicateDate(_) | BookingError::CapacityExceeded { .. } => {
                StatusCode::CONFLICT
            }
            BookingError::NotFound(_) => StatusCode::NOT_FOUND,
            BookingError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            BookingError::Request(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            BookingError::Storage(e) => {
                warn!("Reservation storage failed due to: {:#}", e);
                "Something went wrong, please try again.".to_string()
            }
            BookingError::Request(e) => {
                warn!("Visit service request failed due to: {:#}", e);
                "The visit service could not be reached, please try again.".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<JsonRejection> for BookingError {
    fn from(rejection: JsonRejection) -> Self {
        BookingError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for BookingError {
    fn from(rejection: PathRejection) -> Self {
        BookingError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for BookingError {
    fn from(rejection: QueryRejection) -> Self {
        BookingError::BadRequest(rejection.body_text())
    }
}
