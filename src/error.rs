//! Error taxonomy of the playback proxy.
//!
//! Every failure a handler can produce is one of the [`ApiError`] variants.
//! Provider failures arrive as [`SpotifyError`] and are converted at the
//! handler boundary, so raw provider responses never reach the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{spotify::SpotifyError, types::ErrorBody};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0} is required")]
    MissingInput(&'static str),

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Login state does not match this session")]
    InvalidLoginState,

    #[error("Not authenticated with Spotify")]
    NotAuthenticated,

    #[error("No active playback session")]
    NoActiveSession,

    #[error("Artist {0} has no top tracks")]
    NoTracks(String),

    #[error("A playback toggle is already in progress")]
    ToggleInFlight,

    #[error("Spotify API error")]
    Upstream { status: Option<u16>, message: String },

    #[error("Token exchange failed: {0}")]
    Exchange(String),

    #[error("Server misconfigured: {0}")]
    Configuration(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingInput(_) | ApiError::InvalidInput(_) | ApiError::InvalidLoginState => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::NoActiveSession | ApiError::NoTracks(_) => StatusCode::NOT_FOUND,
            ApiError::ToggleInFlight => StatusCode::CONFLICT,
            ApiError::Upstream { .. } | ApiError::Exchange(_) => StatusCode::BAD_GATEWAY,
            ApiError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            ApiError::Upstream { status, message } => Some(match status {
                Some(code) => format!("upstream status {code}: {message}"),
                None => message.clone(),
            }),
            _ => None,
        }
    }
}

impl From<SpotifyError> for ApiError {
    fn from(err: SpotifyError) -> Self {
        match err {
            SpotifyError::Status { status, body } => {
                crate::warning!("Spotify responded {}: {}", status, body);
                ApiError::Upstream {
                    status: Some(status),
                    message: reason_phrase(status),
                }
            }
            SpotifyError::Malformed(reason) => ApiError::Upstream {
                status: None,
                message: reason,
            },
            SpotifyError::Http(e) => ApiError::Upstream {
                status: e.status().map(|s| s.as_u16()),
                message: "request to Spotify failed".to_string(),
            },
        }
    }
}

fn reason_phrase(status: u16) -> String {
    StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("unexpected status")
        .to_string()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.to_string(),
            details: self.details(),
        };
        (status, Json(body)).into_response()
    }
}
