//! # Client Module
//!
//! The consumer side of the Vinylspin backend. [`PlayerHook`] keeps the
//! state a user interface needs (authentication flag, current track, last
//! search results) and exposes the user actions: login, search, play/pause
//! and play-random. It never talks to Spotify directly; everything goes
//! through the backend routes.
//!
//! ## Failure Model
//!
//! Actions never return errors. A failure is turned into a [`Notification`]
//! for the injected [`Notifier`] and the action resolves to a safe default:
//! `false`, an empty list or `None`.
//!
//! ## Polling
//!
//! The session flag is refreshed on demand with [`PlayerHook::refresh_session`].
//! The current track is only fetched while authenticated and is cached until
//! invalidated; a successful random play or toggle invalidates it.
//!
//! ## Login
//!
//! The backend only authenticates the session whose browser finishes the
//! Spotify flow. A UI sharing that browser's cookie uses
//! [`PlayerHook::login`] and waits; a client with its own session (the
//! command line) calls [`PlayerHook::begin_login`] and then hands the
//! redirected address to [`PlayerHook::complete_login`].
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut hook = PlayerHook::new(Backend::new(url, SessionJar::in_memory())?, notifier);
//! if hook.login().await {
//!     let artists = hook.search_artists("daft punk").await;
//!     hook.play_random_track(&artists[0].id).await;
//! }
//! ```

mod device;
mod jar;

use std::time::{Duration, Instant};

use reqwest::{Client, RequestBuilder, Response, StatusCode, header, redirect};
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use device::{PlaybackDevice, TokenProvider};
pub use jar::SessionJar;

use crate::{
    Res,
    types::{
        Artist, AuthMessage, CurrentTrack, ErrorBody, PlayRandomRequest, SessionToken, TogglePlayRequest,
        TogglePlayResponse, Track,
    },
};

const LOGIN_TIMEOUT: Duration = Duration::from_secs(60);
const LOGIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend responded {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Default,
    Destructive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Variant,
}

impl Notification {
    pub fn error(description: impl Into<String>) -> Self {
        Self {
            title: "Error".to_string(),
            description: description.into(),
            variant: Variant::Destructive,
        }
    }
}

/// Receives user-visible notifications.
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// HTTP access to the backend, carrying the session cookie.
#[derive(Debug, Clone)]
pub struct Backend {
    http: Client,
    base_url: String,
    jar: SessionJar,
}

impl Backend {
    pub fn new(base_url: impl Into<String>, jar: SessionJar) -> Result<Self, ClientError> {
        // The login route answers with a redirect to Spotify that must be
        // handed to the browser, not followed here.
        let http = Client::builder().redirect(redirect::Policy::none()).build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            jar,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn jar(&self) -> &SessionJar {
        &self.jar
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/spotify{}", self.base_url, path)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ClientError> {
        let request = match self.jar.header() {
            Some(cookie) => request.header(header::COOKIE, cookie),
            None => request,
        };

        let response = request.send().await?;
        let set_cookies: Vec<String> = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok().map(str::to_string))
            .collect();
        for value in &set_cookies {
            self.jar.absorb(value).await;
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = ensure_success(self.send(request).await?).await?;
        Ok(response.json::<T>().await?)
    }

    pub async fn session_status(&self) -> Result<bool, ClientError> {
        let response = self.send(self.http.get(self.url("/session"))).await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::UNAUTHORIZED => Ok(false),
            _ => Err(status_error(response).await),
        }
    }

    /// Asks the backend to start a login and returns Spotify's authorize URL.
    pub async fn login_url(&self) -> Result<String, ClientError> {
        let response = self.send(self.http.get(self.url("/login"))).await?;
        if !response.status().is_redirection() {
            return Err(status_error(response).await);
        }

        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ClientError::Unexpected("redirect without location".to_string()))
    }

    /// Finishes a login whose callback did not reach the backend with this
    /// client's session, from the `code` and `state` Spotify redirected with.
    pub async fn complete_login(&self, code: &str, state: &str) -> Result<(), ClientError> {
        let request = self
            .http
            .get(self.url("/callback"))
            .query(&[("code", code), ("state", state)]);
        let response = self.send(request).await?;
        if response.status().is_success() {
            return Ok(());
        }

        Err(ClientError::Status {
            status: response.status().as_u16(),
            message: AuthMessage::ERROR.to_string(),
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<Artist>, ClientError> {
        self.json(self.http.get(self.url("/search")).query(&[("q", query)]))
            .await
    }

    pub async fn current_track(&self) -> Result<Option<CurrentTrack>, ClientError> {
        self.json(self.http.get(self.url("/current-track"))).await
    }

    pub async fn toggle_play(&self, device_id: Option<&str>) -> Result<TogglePlayResponse, ClientError> {
        let body = TogglePlayRequest {
            device_id: device_id.map(str::to_string),
        };
        self.json(self.http.post(self.url("/toggle-play")).json(&body))
            .await
    }

    pub async fn play_random(&self, artist_id: &str, device_id: Option<&str>) -> Result<Track, ClientError> {
        let body = PlayRandomRequest {
            artist_id: Some(artist_id.to_string()),
            device_id: device_id.map(str::to_string),
        };
        self.json(self.http.post(self.url("/play-random")).json(&body))
            .await
    }

    pub async fn session_token(&self) -> Result<String, ClientError> {
        let token: SessionToken = self.json(self.http.get(self.url("/token"))).await?;
        Ok(token.token)
    }
}

impl TokenProvider for Backend {
    async fn fetch_token(&self) -> Res<String> {
        Ok(self.session_token().await?)
    }
}

async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(status_error(response).await)
    }
}

async fn status_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .map(|body| body.error)
        .unwrap_or(text);
    ClientError::Status { status, message }
}

fn redirect_params(redirected_url: &str) -> Result<(String, String), ClientError> {
    let url = reqwest::Url::parse(redirected_url.trim())
        .map_err(|e| ClientError::Unexpected(format!("invalid redirect address: {e}")))?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    };

    match (param("code"), param("state")) {
        (Some(code), Some(state)) => Ok((code, state)),
        _ => Err(ClientError::Unexpected(
            "redirect address carries no code and state".to_string(),
        )),
    }
}

type Opener = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Client-side state and actions on top of the backend.
pub struct PlayerHook<N: Notifier> {
    backend: Backend,
    notifier: N,
    opener: Opener,
    login_timeout: Duration,
    poll_interval: Duration,
    authenticated: bool,
    current_track: Option<Option<CurrentTrack>>,
    search_results: Vec<Artist>,
    device: Option<PlaybackDevice>,
}

impl<N: Notifier> PlayerHook<N> {
    pub fn new(backend: Backend, notifier: N) -> Self {
        Self {
            backend,
            notifier,
            opener: Box::new(|url| webbrowser::open(url).is_ok()),
            login_timeout: LOGIN_TIMEOUT,
            poll_interval: LOGIN_POLL_INTERVAL,
            authenticated: false,
            current_track: None,
            search_results: Vec::new(),
            device: None,
        }
    }

    /// Replaces how the authorize URL is shown to the user.
    pub fn with_opener(mut self, opener: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        self.opener = Box::new(opener);
        self
    }

    pub fn with_login_timeout(mut self, timeout: Duration, poll_interval: Duration) -> Self {
        self.login_timeout = timeout;
        self.poll_interval = poll_interval;
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn search_results(&self) -> &[Artist] {
        &self.search_results
    }

    pub fn device(&self) -> Option<&PlaybackDevice> {
        self.device.as_ref()
    }

    /// Whether the cached current track is playing; `false` when unknown.
    pub fn is_playing(&self) -> bool {
        matches!(&self.current_track, Some(Some(track)) if track.is_playing)
    }

    /// Re-reads the authentication flag from the backend.
    pub async fn refresh_session(&mut self) -> bool {
        self.authenticated = match self.backend.session_status().await {
            Ok(authenticated) => authenticated,
            Err(e) => {
                self.fail("Failed to check the session", &e);
                false
            }
        };
        if !self.authenticated {
            self.current_track = None;
        }
        self.authenticated
    }

    /// Opens Spotify's authorization page and waits for the session to
    /// become authenticated.
    ///
    /// Gives up after the login timeout; abandoning the browser flow just
    /// leaves the hook unauthenticated.
    pub async fn login(&mut self) -> bool {
        if self.begin_login().await.is_none() {
            return false;
        }
        self.wait_for_login().await
    }

    /// Asks the backend to start a login and hands the authorize URL to the
    /// opener. Returns the URL, or `None` after notifying a failure.
    pub async fn begin_login(&mut self) -> Option<String> {
        let url = match self.backend.login_url().await {
            Ok(url) => url,
            Err(e) => {
                self.fail("Failed to start login", &e);
                return None;
            }
        };

        if !(self.opener)(&url) {
            crate::warning!(
                "Failed to open browser. Please navigate to the following URL manually:\n{}",
                url
            );
        }
        Some(url)
    }

    /// Polls the session until it is authenticated or the login timeout
    /// passes. The last polling error, if any, is notified on timeout.
    pub async fn wait_for_login(&mut self) -> bool {
        let mut last_error = None;
        let start = Instant::now();
        while start.elapsed() < self.login_timeout {
            match self.backend.session_status().await {
                Ok(true) => {
                    self.authenticated = true;
                    self.current_track = None;
                    return true;
                }
                Ok(false) => {}
                Err(e) => last_error = Some(e),
            }
            tokio::time::sleep(self.poll_interval).await;
        }

        self.authenticated = false;
        if let Some(e) = last_error {
            self.fail("Failed to check the session", &e);
        }
        false
    }

    /// Completes a login from the address Spotify redirected the browser to.
    ///
    /// Used when the browser finishing the flow does not share this client's
    /// session, as with the command line. The backend still checks that the
    /// `state` belongs to this session.
    pub async fn complete_login(&mut self, redirected_url: &str) -> bool {
        let (code, state) = match redirect_params(redirected_url) {
            Ok(params) => params,
            Err(e) => {
                self.fail("Failed to complete login", &e);
                return false;
            }
        };

        match self.backend.complete_login(&code, &state).await {
            Ok(()) => {
                self.authenticated = true;
                self.current_track = None;
                true
            }
            Err(e) => {
                self.fail("Failed to complete login", &e);
                false
            }
        }
    }

    pub async fn search_artists(&mut self, query: &str) -> Vec<Artist> {
        match self.backend.search(query).await {
            Ok(artists) => {
                self.search_results = artists.clone();
                artists
            }
            Err(e) => {
                self.fail("Failed to search artists", &e);
                Vec::new()
            }
        }
    }

    /// Returns the current track, fetching it when the cache is stale.
    pub async fn current_track(&mut self) -> Option<CurrentTrack> {
        if !self.authenticated {
            return None;
        }
        if let Some(cached) = &self.current_track {
            return cached.clone();
        }

        match self.backend.current_track().await {
            Ok(track) => {
                self.current_track = Some(track.clone());
                track
            }
            Err(e) => {
                self.fail("Failed to load the current track", &e);
                None
            }
        }
    }

    pub fn invalidate_current_track(&mut self) {
        self.current_track = None;
    }

    pub async fn toggle_play(&mut self) -> Option<TogglePlayResponse> {
        let device_id = self.device.as_ref().map(|d| d.id().to_string());
        match self.backend.toggle_play(device_id.as_deref()).await {
            Ok(response) => {
                self.invalidate_current_track();
                Some(response)
            }
            Err(e) => {
                self.fail("Failed to control playback", &e);
                None
            }
        }
    }

    pub async fn play_random_track(&mut self, artist_id: &str) -> Option<Track> {
        let device_id = self.device.as_ref().map(|d| d.id().to_string());
        match self.backend.play_random(artist_id, device_id.as_deref()).await {
            Ok(track) => {
                self.invalidate_current_track();
                Some(track)
            }
            Err(e) => {
                self.fail("Failed to play random track", &e);
                None
            }
        }
    }

    /// Initializes a playback device with a token from the session and
    /// routes later playback commands to it.
    pub async fn connect_device(&mut self, id: &str, name: &str) -> bool {
        match PlaybackDevice::initialize(id, name, &self.backend).await {
            Ok(device) => {
                self.device = Some(device);
                true
            }
            Err(e) => {
                self.notifier.notify(Notification::error(format!(
                    "Failed to connect playback device: {e}"
                )));
                false
            }
        }
    }

    pub fn disconnect_device(&mut self) -> Option<PlaybackDevice> {
        self.device.take()
    }

    fn fail(&self, description: &str, err: &ClientError) {
        crate::warning!("{}: {}", description, err);
        self.notifier.notify(Notification::error(description));
    }
}
