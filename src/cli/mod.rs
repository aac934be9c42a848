//! # CLI Module
//!
//! This module provides the command-line front-end of Vinylspin. It runs the
//! backend server and, as a stand-in for the browser UI, drives the
//! [`crate::client::PlayerHook`] against a running backend.
//!
//! ## Command Categories
//!
//! ### Server
//!
//! - [`serve`] - Loads configuration and starts the HTTP backend
//!
//! ### Authentication
//!
//! - [`login`] - Opens Spotify's authorization page and redeems the redirected address
//! - [`status`] - Shows whether the stored session is authenticated
//!
//! ### Playback
//!
//! - [`search`] - Lists artists matching a query
//! - [`play_random`] - Plays a random top track of an artist
//! - [`toggle`] - Play/pause
//! - [`now_playing`] - Shows the current track
//!
//! ## Sessions
//!
//! The backend identifies a client by its session cookie. The CLI keeps that
//! cookie in the local data directory so that `login` and later commands
//! share one session.
//!
//! ## Usage Patterns
//!
//! ```bash
//! vinylspin serve                          # Start the backend
//! vinylspin login                          # Authenticate with Spotify
//! vinylspin search "boards of canada"      # Find an artist
//! vinylspin play-random "boards of canada" # Spin a random top track
//! vinylspin toggle                         # Pause / resume
//! ```
//!
//! ## Error Handling
//!
//! Client failures never abort a command; they are printed as notifications
//! through [`ConsoleNotifier`]. Only fatal startup errors of `serve` exit
//! with a non-zero code.

mod artists;
mod auth;
mod playback;

pub use artists::search;
pub use auth::login;
pub use auth::status;
pub use playback::now_playing;
pub use playback::play_random;
pub use playback::toggle;

use crate::{
    client::{Backend, Notification, Notifier, PlayerHook, SessionJar, Variant},
    config, error, server, success, warning,
};

/// Prints notifications with the crate's console macros.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        match notification.variant {
            Variant::Destructive => warning!("{}: {}", notification.title, notification.description),
            Variant::Default => success!("{}: {}", notification.title, notification.description),
        }
    }
}

pub async fn serve(addr: Option<String>) {
    let mut config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => error!("Cannot load configuration. Err: {}", e),
    };
    if let Some(addr) = addr {
        config.server_addr = addr;
    }

    if let Err(e) = server::start_api_server(config).await {
        error!("Server stopped. Err: {}", e);
    }
}

async fn new_hook(backend_url: &str) -> PlayerHook<ConsoleNotifier> {
    let backend = match Backend::new(backend_url, SessionJar::persistent().await) {
        Ok(b) => b,
        Err(e) => error!("Cannot create HTTP client. Err: {}", e),
    };
    PlayerHook::new(backend, ConsoleNotifier)
}

async fn require_session(hook: &mut PlayerHook<ConsoleNotifier>) -> bool {
    if hook.refresh_session().await {
        return true;
    }
    warning!("Not authenticated. Run vinylspin login");
    false
}
