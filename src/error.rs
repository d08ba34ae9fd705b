use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

use crate::validation::ValidationError;

pub type Result<T> = std::result::Result<T, TripError>;

#[derive(Error, Debug)]
pub enum TripError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Trip not found: {0}")]
    TripNotFound(String),

    #[error("Participant {participant_id} not found in trip {trip_id}")]
    ParticipantNotFound {
        trip_id: String,
        participant_id: String,
    },

    #[error("No participants found for trip {0}")]
    NoParticipants(String),

    #[error("No results found for trip {0}, calculate it first")]
    NoResults(String),

    #[error("Concurrent update on trip {0}, try again")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] mongodb::error::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bson::ser::Error),
}

impl ResponseError for TripError {
    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();

        HttpResponse::build(status_code).json(json!({
            "error": {
                "code": status_code.as_u16(),
                "message": self.to_string(),
                "type": self.error_type()
            }
        }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            TripError::Validation(_) => StatusCode::BAD_REQUEST,
            TripError::TripNotFound(_)
            | TripError::ParticipantNotFound { .. }
            | TripError::NoParticipants(_)
            | TripError::NoResults(_) => StatusCode::NOT_FOUND,
            TripError::Conflict(_) => StatusCode::CONFLICT,
            TripError::Database(_) | TripError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl TripError {
    fn error_type(&self) -> &str {
        match self {
            TripError::Validation(_) => "validation_error",
            TripError::TripNotFound(_) | TripError::ParticipantNotFound { .. } => "not_found",
            TripError::NoParticipants(_) => "empty_trip",
            TripError::NoResults(_) => "not_calculated",
            TripError::Conflict(_) => "conflict",
            TripError::Database(_) => "database_error",
            TripError::Serialization(_) => "serialization_error",
        }
    }
}
