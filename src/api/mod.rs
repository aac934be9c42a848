//! # API Module
//!
//! This module provides the HTTP endpoints of the Vinylspin backend. It
//! implements the Spotify login flow, session inspection and the playback
//! proxy that forwards search and player commands to the Spotify Web API.
//!
//! ## Overview
//!
//! Every route under `/api/spotify` runs behind [`session_layer`], which
//! resolves (or creates) the caller's session from a signed cookie. The
//! access token obtained during login is stored in that session and never
//! sent to the browser, except through [`token`] for in-browser playback
//! devices.
//!
//! ## Endpoints
//!
//! ### Authentication
//!
//! - [`login`] - Redirects to Spotify's authorization page
//! - [`callback`] - Exchanges the authorization code and notifies the opener window
//! - [`session`] - Reports whether the session is authenticated
//! - [`token`] - Returns the session token for a playback device
//!
//! ### Playback
//!
//! - [`search`] - Artist search
//! - [`current_track`] - Currently playing track or `null`
//! - [`toggle_play`] - Play/pause flip
//! - [`play_random`] - Plays a random top track of an artist
//!
//! ### Monitoring
//!
//! - [`health`] - Status, version and live session count
//!
//! ## Error Handling
//!
//! Handlers return [`crate::error::ApiError`]; its `IntoResponse` impl maps
//! each kind to its status code and a JSON `{error, details}` body.
//!
//! ## Usage Example
//!
//! ```rust,ignore
//! use vinylspin::{config::Config, server};
//!
//! let app = server::router(server::AppState::new(Config::from_env()?));
//! ```

mod auth;
mod health;
mod playback;
mod session;

pub use auth::{callback, login, session, token};
pub use health::health;
pub use playback::{current_track, play_random, search, toggle_play};
pub use session::{SESSION_COOKIE, SessionId, session_layer};
