//! # Spotify Integration Module
//!
//! This module provides the interface to the Spotify Web API used by the
//! playback proxy. It is the only place in the crate that talks to Spotify:
//! HTTP handlers call into a shared [`SpotifyClient`] and convert its
//! [`SpotifyError`] into the proxy's own error taxonomy.
//!
//! ## Architecture
//!
//! ```text
//! HTTP handlers (api::auth, api::playback)
//!          ↓
//! Spotify Integration Layer
//!     ├── Authentication (authorization code + client secret)
//!     ├── Artist Operations (search, top tracks)
//!     └── Player Operations (state, now playing, play, pause)
//!          ↓
//! HTTP Layer (reqwest, JSON)
//!          ↓
//! Spotify Web API
//! ```
//!
//! ## Core Modules
//!
//! - [`auth`] - Builds the authorize URL and exchanges authorization codes
//! - [`artists`] - Artist search and top tracks
//! - [`player`] - Playback state, currently playing track, play and pause
//!
//! ## Error Handling
//!
//! Non-2xx responses become [`SpotifyError::Status`] carrying the status and
//! body, bodies missing expected fields become [`SpotifyError::Malformed`],
//! and transport failures are passed through as [`SpotifyError::Http`]. No
//! retries are attempted; every call is made exactly once.
//!
//! ## API Coverage
//!
//! - `POST /api/token` - Authorization code exchange
//! - `GET /search?type=artist` - Artist search
//! - `GET /artists/{id}/top-tracks` - Market-scoped top tracks
//! - `GET /me/player` - Playback state
//! - `GET /me/player/currently-playing` - Currently playing track
//! - `PUT /me/player/play` - Resume or start playback
//! - `PUT /me/player/pause` - Pause playback
//!
//! ## Configuration Integration
//!
//! All endpoint base URLs come from [`crate::config::Config`], which lets the
//! integration tests point the client at a local fake provider.

use reqwest::{Client, Response};
use thiserror::Error;

use crate::config::Config;

pub mod artists;
pub mod auth;
pub mod player;

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Spotify API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response format from Spotify API: {0}")]
    Malformed(String),
}

/// Shared Spotify Web API client.
///
/// Cheap to clone; the underlying `reqwest::Client` keeps one connection
/// pool for the whole process.
#[derive(Debug, Clone)]
pub struct SpotifyClient {
    http: Client,
    client_id: String,
    client_secret: String,
    api_url: String,
    auth_url: String,
    token_url: String,
    market: String,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            api_url: config.api_url.trim_end_matches('/').to_string(),
            auth_url: config.auth_url.clone(),
            token_url: config.token_url.clone(),
            market: config.market.clone(),
        }
    }

    fn api(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}

/// Turns a non-2xx response into [`SpotifyError::Status`].
async fn ensure_success(response: Response) -> Result<Response, SpotifyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SpotifyError::Status {
        status: status.as_u16(),
        body,
    })
}
