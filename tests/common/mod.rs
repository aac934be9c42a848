#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use chrono::Duration;
use rand::{SeedableRng, rngs::StdRng};
use serde_json::{Value, json};
use tokio::net::TcpListener;

use vinylspin::{
    client::{Backend, Notification, Notifier, SessionJar},
    config::{Config, DEFAULT_MARKET, DEFAULT_SESSION_SECRET},
    server::{self, AppState},
    utils::verify_session_cookie,
};

pub const CLIENT_ID: &str = "client-id";
pub const CLIENT_SECRET: &str = "client-secret";
pub const PUBLIC_HOST: &str = "vinyl.test";
pub const ACCESS_TOKEN: &str = "access-token-1";

/// Scripted Spotify stand-in. Every request is recorded as `METHOD uri`.
#[derive(Clone)]
pub struct FakeSpotify {
    inner: Arc<Mutex<FakeState>>,
}

pub struct FakeState {
    pub calls: Vec<String>,
    pub token_status: u16,
    pub token_body: Value,
    pub token_requests: Vec<(Option<String>, String)>,
    pub search_status: u16,
    pub search_body: Value,
    pub top_tracks: Value,
    /// `None` answers 204.
    pub player: Option<Value>,
    /// `None` answers 204.
    pub currently_playing: Option<Value>,
    pub command_status: u16,
    pub play_bodies: Vec<Value>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            calls: Vec::new(),
            token_status: 200,
            token_body: json!({
                "access_token": ACCESS_TOKEN,
                "token_type": "Bearer",
                "expires_in": 3600
            }),
            token_requests: Vec::new(),
            search_status: 200,
            search_body: json!({ "artists": { "items": [] } }),
            top_tracks: json!({ "tracks": [] }),
            player: None,
            currently_playing: None,
            command_status: 204,
            play_bodies: Vec::new(),
        }
    }
}

impl FakeSpotify {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeState::default())),
        }
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut FakeState) -> T) -> T {
        f(&mut self.inner.lock().unwrap())
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    pub fn calls_matching(&self, needle: &str) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| c.contains(needle))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.with(|s| s.calls.clear());
    }

    fn router(&self) -> Router {
        Router::new()
            .route("/api/token", post(token))
            .route("/v1/search", get(search))
            .route("/v1/artists/{id}/top-tracks", get(top_tracks))
            .route("/v1/me/player", get(player))
            .route("/v1/me/player/currently-playing", get(currently_playing))
            .route("/v1/me/player/play", put(play))
            .route("/v1/me/player/pause", put(pause))
            .layer(middleware::from_fn_with_state(self.clone(), record))
            .with_state(self.clone())
    }
}

async fn record(State(fake): State<FakeSpotify>, request: Request, next: Next) -> Response {
    let call = format!("{} {}", request.method(), request.uri());
    fake.with(|s| s.calls.push(call));
    next.run(request).await
}

fn respond(status: u16, body: Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap();
    if status == StatusCode::NO_CONTENT {
        return status.into_response();
    }
    (status, Json(body)).into_response()
}

async fn token(State(fake): State<FakeSpotify>, headers: HeaderMap, body: String) -> Response {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let (status, body) = fake.with(|s| {
        s.token_requests.push((auth, body));
        (s.token_status, s.token_body.clone())
    });
    respond(status, body)
}

async fn search(State(fake): State<FakeSpotify>) -> Response {
    let (status, body) = fake.with(|s| (s.search_status, s.search_body.clone()));
    respond(status, body)
}

async fn top_tracks(State(fake): State<FakeSpotify>, Path(_id): Path<String>) -> Response {
    respond(200, fake.with(|s| s.top_tracks.clone()))
}

async fn player(State(fake): State<FakeSpotify>) -> Response {
    match fake.with(|s| s.player.clone()) {
        Some(body) => respond(200, body),
        None => respond(204, Value::Null),
    }
}

async fn currently_playing(State(fake): State<FakeSpotify>) -> Response {
    match fake.with(|s| s.currently_playing.clone()) {
        Some(body) => respond(200, body),
        None => respond(204, Value::Null),
    }
}

async fn play(State(fake): State<FakeSpotify>, body: Bytes) -> Response {
    let status = fake.with(|s| {
        if let Ok(value) = serde_json::from_slice::<Value>(&body) {
            s.play_bodies.push(value);
        }
        s.command_status
    });
    respond(status, json!({}))
}

async fn pause(State(fake): State<FakeSpotify>) -> Response {
    respond(fake.with(|s| s.command_status), json!({}))
}

pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

pub fn test_config(provider_url: &str) -> Config {
    Config {
        server_addr: "127.0.0.1:0".to_string(),
        client_id: CLIENT_ID.to_string(),
        client_secret: CLIENT_SECRET.to_string(),
        public_hosts: Some(PUBLIC_HOST.to_string()),
        session_secret: DEFAULT_SESSION_SECRET.to_string(),
        production: false,
        session_ttl: Duration::hours(24),
        market: DEFAULT_MARKET.to_string(),
        api_url: format!("{provider_url}/v1"),
        auth_url: format!("{provider_url}/authorize"),
        token_url: format!("{provider_url}/api/token"),
    }
}

pub struct TestApp {
    pub url: String,
    pub provider_url: String,
    pub spotify: FakeSpotify,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(|_| {}).await
    }

    pub async fn spawn_with(configure: impl FnOnce(&mut Config)) -> Self {
        let spotify = FakeSpotify::new();
        let provider_url = serve(spotify.router()).await;

        let mut config = test_config(&provider_url);
        configure(&mut config);

        let state = AppState::with_rng(config, StdRng::seed_from_u64(7));
        let url = serve(server::router(state.clone())).await;

        Self {
            url,
            provider_url,
            spotify,
            state,
        }
    }

    pub fn api(&self, path: &str) -> String {
        format!("{}/api/spotify{}", self.url, path)
    }

    pub fn backend(&self) -> Backend {
        Backend::new(&self.url, SessionJar::in_memory()).unwrap()
    }

    /// Calls the callback route carrying the backend's session cookie, the
    /// way the browser that started the login would.
    pub async fn callback(&self, backend: &Backend, query: &str) -> reqwest::Response {
        let mut request = raw_client().get(self.api(&format!("/callback?{query}")));
        if let Some(cookie) = backend.jar().header() {
            request = request.header(header::COOKIE, cookie);
        }
        request.send().await.unwrap()
    }

    /// Session id behind the backend's cookie.
    pub fn session_id(&self, backend: &Backend) -> String {
        let cookie = cookie_of(backend.jar().header());
        let value = cookie.split_once('=').unwrap().1;
        verify_session_cookie(DEFAULT_SESSION_SECRET, value).expect("cookie is signed")
    }

    /// Runs login and callback for the backend's session.
    pub async fn authenticate(&self, backend: &Backend) {
        let url = backend.login_url().await.unwrap();
        let state = state_param(&url).expect("authorize URL carries a state");
        let response = self
            .callback(backend, &format!("code=good-code&state={state}"))
            .await;
        assert_eq!(response.status(), 200);
        assert!(backend.session_status().await.unwrap());
        self.spotify.clear_calls();
    }
}

pub fn state_param(url: &str) -> Option<String> {
    reqwest::Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
}

/// A reqwest client that does not follow redirects.
pub fn raw_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

pub fn cookie_of(jar_header: Option<String>) -> String {
    jar_header.expect("session cookie was issued")
}

pub fn track_json(id: &str, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "artists": [{ "name": "Artist" }],
        "uri": format!("spotify:track:{id}"),
        "popularity": 50
    })
}

/// A local file: Spotify sends no catalog id for it.
pub fn local_track_json(name: &str) -> Value {
    json!({
        "id": null,
        "name": name,
        "artists": [{ "name": "Home Recording" }],
        "uri": format!("spotify:local:Home+Recording::{name}:180"),
        "is_local": true
    })
}

#[derive(Clone, Default)]
pub struct RecordingNotifier(pub Arc<Mutex<Vec<Notification>>>);

impl RecordingNotifier {
    pub fn descriptions(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.description.clone())
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.0.lock().unwrap().push(notification);
    }
}
