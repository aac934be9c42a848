//! Configuration management for Vinylspin.
//!
//! This module handles loading and accessing configuration values from environment
//! variables and `.env` files. It provides a centralized way to manage the
//! Spotify credentials, the public hostname used to derive the OAuth redirect
//! URI, the session signing secret and the server bind address.
//!
//! The configuration system follows a hierarchical approach:
//! 1. Environment variables (highest priority)
//! 2. `.env` file in the working directory
//! 3. `.env` file in the local data directory
//! 4. Application defaults (where applicable)

use std::{env, path::PathBuf};

use chrono::Duration;

use crate::Res;

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:5000";
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_SESSION_SECRET: &str = "vinyl-player-secret";
pub const DEFAULT_SPOTIFY_API_URL: &str = "https://api.spotify.com/v1";
pub const DEFAULT_SPOTIFY_AUTH_URL: &str = "https://accounts.spotify.com/authorize";
pub const DEFAULT_SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
pub const DEFAULT_MARKET: &str = "US";
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

/// Scopes requested during login. Playback control needs the two
/// `*-playback-state` scopes, `streaming` covers in-browser devices.
pub const SPOTIFY_SCOPE: &str = "streaming user-read-email user-read-private user-read-playback-state user-modify-playback-state";

pub const CALLBACK_PATH: &str = "/api/spotify/callback";

/// Loads environment variables from `.env` files.
///
/// A `.env` in the current working directory is read first, then the one in the
/// platform-specific local data directory under `vinylspin/.env`. Variables
/// that are already set in the process environment are never overwritten.
///
/// # Directory Structure
///
/// The function looks for the data-directory `.env` file in:
/// - Linux: `~/.local/share/vinylspin/.env`
/// - macOS: `~/Library/Application Support/vinylspin/.env`
/// - Windows: `%LOCALAPPDATA%/vinylspin/.env`
///
/// # Errors
///
/// Returns an error if the data directory cannot be created or if an existing
/// `.env` file cannot be parsed. A missing file is not an error.
pub async fn load_env() -> Result<(), String> {
    let _ = dotenv::dotenv();

    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Returns the application's local data directory (`<data_local_dir>/vinylspin`).
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("vinylspin");
    path
}

/// Returns the backend URL the client talks to.
///
/// Reads `VINYLSPIN_BACKEND_URL`, falling back to [`DEFAULT_BACKEND_URL`].
pub fn backend_url() -> String {
    env::var("VINYLSPIN_BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string())
}

/// Runtime configuration of the backend.
///
/// Built once at startup by [`Config::from_env`] and injected into the
/// server state; handlers never read the environment themselves.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to (`SERVER_ADDRESS`).
    pub server_addr: String,
    /// Spotify application client id (`SPOTIFY_CLIENT_ID`).
    pub client_id: String,
    /// Spotify application client secret (`SPOTIFY_CLIENT_SECRET`).
    pub client_secret: String,
    /// Comma separated list of public hostnames (`PUBLIC_HOSTNAMES`).
    /// The first entry is used to derive the OAuth redirect URI.
    pub public_hosts: Option<String>,
    /// Secret used to sign session cookies (`SESSION_SECRET`).
    pub session_secret: String,
    /// Marks cookies `Secure` (`APP_ENV=production`).
    pub production: bool,
    /// How long a session lives after it is created (`SESSION_TTL_HOURS`).
    pub session_ttl: Duration,
    /// Market used for the top-tracks lookup (`SPOTIFY_MARKET`).
    pub market: String,
    /// Spotify Web API base URL (`SPOTIFY_API_URL`).
    pub api_url: String,
    /// Spotify authorize endpoint (`SPOTIFY_API_AUTH_URL`).
    pub auth_url: String,
    /// Spotify token endpoint (`SPOTIFY_API_TOKEN_URL`).
    pub token_url: String,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Fails if `SPOTIFY_CLIENT_ID` or `SPOTIFY_CLIENT_SECRET` is missing or if
    /// `SESSION_TTL_HOURS` is not an integer. A missing `PUBLIC_HOSTNAMES` is
    /// reported but tolerated: login requests will fail until it is set.
    pub fn from_env() -> Res<Self> {
        let client_id = env::var("SPOTIFY_CLIENT_ID").map_err(|_| "SPOTIFY_CLIENT_ID must be set")?;
        let client_secret =
            env::var("SPOTIFY_CLIENT_SECRET").map_err(|_| "SPOTIFY_CLIENT_SECRET must be set")?;

        let session_ttl = match env::var("SESSION_TTL_HOURS") {
            Ok(hours) => Duration::hours(hours.trim().parse::<i64>()?),
            Err(_) => Duration::hours(DEFAULT_SESSION_TTL_HOURS),
        };

        Ok(Self {
            server_addr: env_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            client_id,
            client_secret,
            public_hosts: env::var("PUBLIC_HOSTNAMES").ok().filter(|h| !h.trim().is_empty()),
            session_secret: env_or("SESSION_SECRET", DEFAULT_SESSION_SECRET),
            production: env::var("APP_ENV").map(|v| v == "production").unwrap_or(false),
            session_ttl,
            market: env_or("SPOTIFY_MARKET", DEFAULT_MARKET),
            api_url: env_or("SPOTIFY_API_URL", DEFAULT_SPOTIFY_API_URL),
            auth_url: env_or("SPOTIFY_API_AUTH_URL", DEFAULT_SPOTIFY_AUTH_URL),
            token_url: env_or("SPOTIFY_API_TOKEN_URL", DEFAULT_SPOTIFY_TOKEN_URL),
        })
    }

    /// Derives the OAuth redirect URI from the first public hostname.
    ///
    /// Returns `None` when no usable hostname is configured; callers must
    /// treat that as a hard failure rather than sending an empty URI.
    ///
    /// # Example
    ///
    /// ```
    /// // PUBLIC_HOSTNAMES="vinyl.example.com,backup.example.com"
    /// assert_eq!(
    ///     config.redirect_uri().as_deref(),
    ///     Some("https://vinyl.example.com/api/spotify/callback")
    /// );
    /// ```
    pub fn redirect_uri(&self) -> Option<String> {
        let hosts = self.public_hosts.as_deref()?;
        let host = hosts.split(',').next()?.trim();
        if host.is_empty() {
            return None;
        }
        Some(format!("https://{host}{CALLBACK_PATH}"))
    }

    /// Prints which settings are present, never their values.
    pub fn log_summary(&self) {
        crate::info!("Spotify configuration:");
        crate::info!("- Client ID: {}", set_or_missing(&self.client_id));
        crate::info!("- Client Secret: {}", set_or_missing(&self.client_secret));
        match self.redirect_uri() {
            Some(uri) => crate::info!("- Redirect URI: {}", uri),
            None => crate::warning!("- Redirect URI: not configured, set PUBLIC_HOSTNAMES"),
        }
        if self.session_secret == DEFAULT_SESSION_SECRET {
            crate::warning!("- Session secret: using the built-in default");
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn set_or_missing(value: &str) -> &'static str {
    if value.is_empty() { "Missing" } else { "Set" }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_hosts(hosts: Option<&str>) -> Config {
        Config {
            server_addr: DEFAULT_SERVER_ADDRESS.to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            public_hosts: hosts.map(str::to_string),
            session_secret: DEFAULT_SESSION_SECRET.to_string(),
            production: false,
            session_ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            market: DEFAULT_MARKET.to_string(),
            api_url: DEFAULT_SPOTIFY_API_URL.to_string(),
            auth_url: DEFAULT_SPOTIFY_AUTH_URL.to_string(),
            token_url: DEFAULT_SPOTIFY_TOKEN_URL.to_string(),
        }
    }

    #[test]
    fn redirect_uri_uses_first_host() {
        let config = config_with_hosts(Some("vinyl.example.com, other.example.com"));
        assert_eq!(
            config.redirect_uri().as_deref(),
            Some("https://vinyl.example.com/api/spotify/callback")
        );
    }

    #[test]
    fn redirect_uri_is_absent_without_hosts() {
        assert_eq!(config_with_hosts(None).redirect_uri(), None);
        assert_eq!(config_with_hosts(Some(" ,foo")).redirect_uri(), None);
    }
}
