use axum::{
    Extension, Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;

use crate::{
    api::session::{SessionId, require_token},
    error::ApiError,
    info,
    server::AppState,
    success,
    types::{AuthMessage, SessionStatus, SessionToken},
    warning,
};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Redirects the browser to Spotify's authorization page.
///
/// The redirect URI is derived from the configured public hostname. When it
/// cannot be derived the login fails immediately with a 500 instead of
/// sending Spotify a request it would reject.
pub async fn login(
    State(state): State<AppState>,
    Extension(SessionId(session_id)): Extension<SessionId>,
) -> Result<Response, ApiError> {
    let Some(redirect_uri) = state.config.redirect_uri() else {
        warning!("Spotify login aborted: set PUBLIC_HOSTNAMES to derive the redirect URI");
        return Err(ApiError::Configuration(
            "redirect URI is not configured".to_string(),
        ));
    };

    // only reachable when the session lifetime is shorter than a request
    let oauth_state = state.sessions.begin_login(&session_id).await.ok_or_else(|| {
        ApiError::Configuration("session expired before login started, check SESSION_TTL_HOURS".to_string())
    })?;
    let url = state.spotify.authorize_url(&redirect_uri, &oauth_state)?;

    info!("Spotify login - redirect URI: {}", redirect_uri);
    Ok((StatusCode::FOUND, [(header::LOCATION, url)]).into_response())
}

/// Completes the authorization code flow.
///
/// The callback only ever authenticates the session of the browser making
/// it, and only when `state` equals the nonce that session recorded at
/// login. Answers with a tiny page that posts `auth-success` or `auth-error`
/// to the window that opened the login popup and then closes itself. A
/// failed exchange never touches a token that is already stored.
pub async fn callback(
    State(state): State<AppState>,
    Extension(SessionId(session_id)): Extension<SessionId>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        if let Some(reason) = params.error {
            warning!("Spotify authorization was not granted: {}", reason);
        }
        return (StatusCode::BAD_REQUEST, "Authorization code is required").into_response();
    };

    match complete_login(&state, &session_id, &code, params.state.as_deref()).await {
        Ok(()) => {
            success!("Spotify session authenticated");
            callback_page(StatusCode::OK, AuthMessage::Success)
        }
        Err(e) => {
            warning!("Spotify authentication error: {}", e);
            warning!(
                "- Redirect URI used: {}",
                state.config.redirect_uri().unwrap_or_default()
            );
            callback_page(e.status(), AuthMessage::Error)
        }
    }
}

async fn complete_login(
    state: &AppState,
    session_id: &str,
    code: &str,
    oauth_state: Option<&str>,
) -> Result<(), ApiError> {
    let redirect_uri = state
        .config
        .redirect_uri()
        .ok_or_else(|| ApiError::Configuration("redirect URI is not configured".to_string()))?;

    let oauth_state = oauth_state
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::InvalidLoginState)?;
    if !state.sessions.redeem_login_state(session_id, oauth_state).await {
        return Err(ApiError::InvalidLoginState);
    }

    let token = state
        .spotify
        .exchange_code(code, &redirect_uri)
        .await
        .map_err(|e| ApiError::Exchange(e.to_string()))?;

    if !state.sessions.set_token(session_id, token).await {
        return Err(ApiError::Exchange("session expired during login".to_string()));
    }
    Ok(())
}

fn callback_page(status: StatusCode, message: AuthMessage) -> Response {
    let hint = match message {
        AuthMessage::Success => "",
        AuthMessage::Error => {
            "<p>Login was not completed in this browser. If it was started from \
             the vinylspin command line, paste this page's address there.</p>"
        }
    };
    let page = format!(
        r#"<!DOCTYPE html>
<html>
  <body>
    {hint}
    <script>
      if (window.opener) {{
        window.opener.postMessage('{message}', '*');
        window.close();
      }}
    </script>
  </body>
</html>
"#,
        message = message.as_str()
    );
    (status, Html(page)).into_response()
}

pub async fn session(
    State(state): State<AppState>,
    Extension(SessionId(session_id)): Extension<SessionId>,
) -> (StatusCode, Json<SessionStatus>) {
    let authenticated = state.sessions.is_authenticated(&session_id).await;
    let status = if authenticated {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    (status, Json(SessionStatus { authenticated }))
}

/// Hands the session token to an in-browser playback device.
pub async fn token(
    State(state): State<AppState>,
    Extension(SessionId(session_id)): Extension<SessionId>,
) -> Result<Json<SessionToken>, ApiError> {
    let token = require_token(&state, &session_id).await?;
    Ok(Json(SessionToken { token }))
}
