use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};

use crate::{error::ApiError, info, server::AppState, utils, warning};

pub const SESSION_COOKIE: &str = "vinylspin.sid";

/// Id of the session the current request belongs to.
#[derive(Debug, Clone)]
pub struct SessionId(pub String);

/// Resolves the caller's session from its signed cookie, creating a new
/// session when the cookie is missing, tampered with or expired.
///
/// The session id is put into the request extensions for handlers, and a
/// `Set-Cookie` header is added whenever a new session was created.
pub async fn session_layer(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let existing = request
        .headers()
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|h| utils::cookie_value(h, SESSION_COOKIE))
        .and_then(|v| utils::verify_session_cookie(&state.config.session_secret, v));

    let (session_id, created) = match existing {
        Some(id) if state.sessions.get(&id).await.is_some() => (id, false),
        _ => (state.sessions.create().await.id, true),
    };

    request.extensions_mut().insert(SessionId(session_id.clone()));
    let mut response = next.run(request).await;

    if created {
        match HeaderValue::from_str(&session_cookie(&state, &session_id)) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warning!("Cannot encode session cookie: {}", e),
        }
    }

    info!("{} {} -> {}", method, path, response.status().as_u16());
    response
}

fn session_cookie(state: &AppState, session_id: &str) -> String {
    let secure = if state.config.production { "; Secure" } else { "" };
    format!(
        "{name}={value}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}{secure}",
        name = SESSION_COOKIE,
        value = utils::sign_session_id(&state.config.session_secret, session_id),
        max_age = state.sessions.ttl().num_seconds(),
    )
}

/// Returns the session's access token or fails with `NotAuthenticated`.
pub(crate) async fn require_token(state: &AppState, session_id: &str) -> Result<String, ApiError> {
    state
        .sessions
        .token(session_id)
        .await
        .ok_or(ApiError::NotAuthenticated)
}
