mod common;

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use serde_json::json;
use vinylspin::client::{Backend, PlayerHook, SessionJar, Variant};

use common::{RecordingNotifier, TestApp, raw_client, serve, state_param, track_json};

async fn hook_for(app: &TestApp, authenticated: bool) -> (PlayerHook<RecordingNotifier>, RecordingNotifier) {
    let backend = app.backend();
    if authenticated {
        app.authenticate(&backend).await;
    }
    let notifier = RecordingNotifier::default();
    let mut hook = PlayerHook::new(backend, notifier.clone())
        .with_opener(|_| true)
        .with_login_timeout(Duration::from_millis(300), Duration::from_millis(50));
    hook.refresh_session().await;
    (hook, notifier)
}

#[tokio::test]
async fn login_completes_when_browser_finishes_the_flow() {
    let app = TestApp::spawn().await;
    let callback_base = app.api("/callback");
    let notifier = RecordingNotifier::default();
    let backend = app.backend();
    let jar = backend.jar().clone();

    // plays the part of the login popup: shares the page's cookie and
    // follows the authorize URL back to the callback
    let mut hook = PlayerHook::new(backend, notifier.clone())
        .with_opener(move |url| {
            let (Some(state), Some(cookie)) = (state_param(url), jar.header()) else {
                return false;
            };
            let callback = format!("{callback_base}?code=abc&state={state}");
            tokio::spawn(async move {
                let _ = raw_client()
                    .get(callback)
                    .header(reqwest::header::COOKIE, cookie)
                    .send()
                    .await;
            });
            true
        })
        .with_login_timeout(Duration::from_secs(5), Duration::from_millis(20));

    assert!(!hook.is_authenticated());
    assert!(hook.login().await);
    assert!(hook.is_authenticated());
    assert!(notifier.descriptions().is_empty());
}

#[tokio::test]
async fn abandoned_login_times_out_unauthenticated() {
    let app = TestApp::spawn().await;
    let (mut hook, notifier) = hook_for(&app, false).await;

    assert!(!hook.login().await);
    assert!(!hook.is_authenticated());
    assert!(notifier.descriptions().is_empty());
}

// Backend stand-in whose session route starts failing once the login began.
async fn flaky_backend(down: Arc<AtomicBool>) -> String {
    async fn login() -> impl IntoResponse {
        (
            StatusCode::FOUND,
            [(header::LOCATION, "https://accounts.test/authorize?state=s1")],
        )
    }

    async fn session(State(down): State<Arc<AtomicBool>>) -> StatusCode {
        if down.load(Ordering::SeqCst) {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::UNAUTHORIZED
        }
    }

    let router = Router::new()
        .route("/api/spotify/login", get(login))
        .route("/api/spotify/session", get(session))
        .with_state(down);
    serve(router).await
}

#[tokio::test]
async fn backend_failure_during_login_is_notified() {
    let down = Arc::new(AtomicBool::new(false));
    let url = flaky_backend(down.clone()).await;
    let notifier = RecordingNotifier::default();

    let mut hook = PlayerHook::new(
        Backend::new(url, SessionJar::in_memory()).unwrap(),
        notifier.clone(),
    )
    .with_opener(move |_| {
        down.store(true, Ordering::SeqCst);
        true
    })
    .with_login_timeout(Duration::from_millis(200), Duration::from_millis(20));

    assert!(!hook.login().await);
    assert!(!hook.is_authenticated());
    assert_eq!(notifier.descriptions(), ["Failed to check the session"]);
}

#[tokio::test]
async fn pasted_redirect_completes_login_for_the_hook_session() {
    let app = TestApp::spawn().await;
    let (mut hook, notifier) = hook_for(&app, false).await;

    let url = hook.begin_login().await.unwrap();
    let state = state_param(&url).unwrap();

    // the browser lands on the callback without the hook's cookie
    let response = raw_client()
        .get(app.api(&format!("/callback?code=abc&state={state}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    assert!(!hook.refresh_session().await);

    let redirected = format!("https://vinyl.test/api/spotify/callback?code=abc&state={state}");
    assert!(hook.complete_login(&redirected).await);
    assert!(hook.is_authenticated());
    assert!(hook.refresh_session().await);
    assert!(notifier.descriptions().is_empty());
}

#[tokio::test]
async fn pasted_redirect_of_another_login_is_rejected() {
    let app = TestApp::spawn().await;
    let (mut hook, notifier) = hook_for(&app, false).await;
    hook.begin_login().await.unwrap();

    let other = app.backend();
    let foreign_state = state_param(&other.login_url().await.unwrap()).unwrap();
    let redirected =
        format!("https://vinyl.test/api/spotify/callback?code=abc&state={foreign_state}");

    assert!(!hook.complete_login(&redirected).await);
    assert!(!hook.complete_login("https://vinyl.test/api/spotify/callback").await);
    assert!(!hook.refresh_session().await);
    assert_eq!(
        notifier.descriptions(),
        ["Failed to complete login", "Failed to complete login"]
    );
    assert!(app.spotify.with(|s| s.token_requests.is_empty()));
}

#[tokio::test]
async fn login_without_public_host_notifies() {
    let app = TestApp::spawn_with(|c| c.public_hosts = None).await;
    let (mut hook, notifier) = hook_for(&app, false).await;

    assert!(!hook.login().await);
    assert_eq!(notifier.descriptions(), ["Failed to start login"]);
}

#[tokio::test]
async fn unauthenticated_hook_never_fetches_current_track() {
    let app = TestApp::spawn().await;
    let (mut hook, notifier) = hook_for(&app, false).await;

    assert_eq!(hook.current_track().await, None);
    assert!(!hook.is_playing());
    assert!(app.spotify.calls().is_empty());
    assert!(notifier.descriptions().is_empty());
}

#[tokio::test]
async fn failed_search_notifies_and_keeps_previous_results() {
    let app = TestApp::spawn().await;
    let (mut hook, notifier) = hook_for(&app, true).await;
    app.spotify.with(|s| {
        s.search_body = json!({ "artists": { "items": [{ "id": "a1", "name": "First" }] } })
    });

    let found = hook.search_artists("first").await;
    assert_eq!(found.len(), 1);

    app.spotify.with(|s| s.search_status = 500);
    assert!(hook.search_artists("again").await.is_empty());
    assert_eq!(hook.search_results()[0].id, "a1");

    let notifications = notifier.0.lock().unwrap().clone();
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].title, "Error");
    assert_eq!(notifications[0].description, "Failed to search artists");
    assert_eq!(notifications[0].variant, Variant::Destructive);
}

#[tokio::test]
async fn current_track_is_cached_until_a_random_play() {
    let app = TestApp::spawn().await;
    let (mut hook, notifier) = hook_for(&app, true).await;
    app.spotify.with(|s| {
        s.currently_playing = Some(json!({ "is_playing": true, "item": track_json("t1", "Old") }));
        s.top_tracks = json!({ "tracks": [track_json("t2", "New")] });
    });

    assert_eq!(hook.current_track().await.unwrap().track.id.as_deref(), Some("t1"));
    assert!(hook.is_playing());
    assert_eq!(hook.current_track().await.unwrap().track.id.as_deref(), Some("t1"));
    assert_eq!(
        app.spotify.calls_matching("currently-playing").len(),
        1
    );

    let played = hook.play_random_track("artist1").await.unwrap();
    assert_eq!(played.id.as_deref(), Some("t2"));

    app.spotify.with(|s| {
        s.currently_playing = Some(json!({ "is_playing": true, "item": track_json("t2", "New") }))
    });
    assert_eq!(hook.current_track().await.unwrap().track.id.as_deref(), Some("t2"));
    assert_eq!(
        app.spotify.calls_matching("currently-playing").len(),
        2
    );
    assert!(notifier.descriptions().is_empty());
}

#[tokio::test]
async fn failed_random_play_notifies() {
    let app = TestApp::spawn().await;
    let (mut hook, notifier) = hook_for(&app, true).await;

    assert_eq!(hook.play_random_track("artist1").await, None);
    assert_eq!(notifier.descriptions(), ["Failed to play random track"]);
}

#[tokio::test]
async fn toggle_without_active_session_notifies() {
    let app = TestApp::spawn().await;
    let (mut hook, notifier) = hook_for(&app, true).await;

    assert_eq!(hook.toggle_play().await, None);
    assert_eq!(notifier.descriptions(), ["Failed to control playback"]);
}

#[tokio::test]
async fn connected_device_receives_playback_commands() {
    let app = TestApp::spawn().await;
    let (mut hook, notifier) = hook_for(&app, true).await;
    app.spotify
        .with(|s| s.player = Some(json!({ "is_playing": false })));

    assert!(hook.connect_device("web-player", "Vinyl Player").await);
    assert_eq!(hook.device().unwrap().id(), "web-player");

    let result = hook.toggle_play().await.unwrap();
    assert!(result.is_playing);
    assert_eq!(result.device_id.as_deref(), Some("web-player"));
    assert!(app.spotify.calls_matching("PUT /v1/me/player/play")[0].contains("device_id=web-player"));

    assert!(hook.disconnect_device().is_some());
    assert!(hook.device().is_none());
    assert!(notifier.descriptions().is_empty());
}

#[tokio::test]
async fn device_needs_an_authenticated_session() {
    let app = TestApp::spawn().await;
    let (mut hook, notifier) = hook_for(&app, false).await;

    assert!(!hook.connect_device("web-player", "Vinyl Player").await);
    assert!(hook.device().is_none());
    assert!(notifier.descriptions()[0].starts_with("Failed to connect playback device"));
}
