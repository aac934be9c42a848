use std::{
    net::SocketAddr,
    str::FromStr,
    sync::{Arc, Mutex},
    time::Duration,
};

use axum::{
    Router, middleware,
    routing::{get, post},
};
use rand::{RngCore, SeedableRng, rngs::StdRng};
use tokio::net::TcpListener;

use crate::{
    Res, api, config::Config, info, management::SessionStore, spotify::SpotifyClient,
    types::Track, utils,
};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// State shared by every handler.
///
/// The session store, the Spotify client and the random source are all
/// injected here so that handlers never reach for globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: SessionStore,
    pub spotify: SpotifyClient,
    rng: Arc<Mutex<Box<dyn RngCore + Send>>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self::with_rng(config, StdRng::from_os_rng())
    }

    /// Builds the state with a caller-supplied random source, e.g. a seeded
    /// `StdRng` for deterministic tests.
    pub fn with_rng<R: RngCore + Send + 'static>(config: Config, rng: R) -> Self {
        Self {
            sessions: SessionStore::new(config.session_ttl),
            spotify: SpotifyClient::new(&config),
            config: Arc::new(config),
            rng: Arc::new(Mutex::new(Box::new(rng))),
        }
    }

    /// Picks one of `tracks` uniformly at random.
    pub fn pick_track(&self, tracks: &[Track]) -> Option<Track> {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        utils::pick_uniform(tracks, &mut **rng).cloned()
    }
}

pub fn router(state: AppState) -> Router {
    let spotify_routes = Router::new()
        .route("/login", get(api::login))
        .route("/callback", get(api::callback))
        .route("/session", get(api::session))
        .route("/token", get(api::token))
        .route("/session-token", get(api::token))
        .route("/search", get(api::search))
        .route("/current-track", get(api::current_track))
        .route("/toggle-play", post(api::toggle_play))
        .route("/play-random", post(api::play_random))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::session_layer,
        ));

    Router::new()
        .route("/health", get(api::health))
        .nest("/api/spotify", spotify_routes)
        .with_state(state)
}

pub async fn start_api_server(config: Config) -> Res<()> {
    config.log_summary();

    let addr = SocketAddr::from_str(&config.server_addr)
        .map_err(|e| format!("Failed to parse server address: {e}"))?;
    let listener = TcpListener::bind(&addr).await?;

    let state = AppState::new(config);
    spawn_session_sweeper(state.sessions.clone());

    info!("Listening on http://{}", addr);
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn spawn_session_sweeper(sessions: SessionStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                info!("Purged {} expired sessions", purged);
            }
        }
    });
}
