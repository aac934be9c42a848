use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Query, State},
};
use serde::{Deserialize, de::DeserializeOwned};

use crate::{
    api::session::{SessionId, require_token},
    error::ApiError,
    info,
    server::AppState,
    spotify::player::PlayerCommand,
    types::{
        Artist, CurrentTrack, PlayRandomRequest, TogglePlayRequest, TogglePlayResponse, Track,
    },
    warning,
};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// `GET /api/spotify/search?q=` - artists in Spotify's ranking order.
pub async fn search(
    State(state): State<AppState>,
    Extension(SessionId(session_id)): Extension<SessionId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Artist>>, ApiError> {
    let token = require_token(&state, &session_id).await?;
    let query = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or(ApiError::MissingInput("Search query"))?;

    let artists = state
        .spotify
        .search_artists(&token, &query)
        .await
        .inspect_err(|e| warning!("Search failed: {}", e))?;

    Ok(Json(artists))
}

/// `GET /api/spotify/current-track` - the playing track or `null`.
pub async fn current_track(
    State(state): State<AppState>,
    Extension(SessionId(session_id)): Extension<SessionId>,
) -> Result<Json<Option<CurrentTrack>>, ApiError> {
    let token = require_token(&state, &session_id).await?;
    let playing = state.spotify.currently_playing(&token).await?;

    let current = playing.and_then(|p| {
        p.item.map(|track| CurrentTrack {
            track,
            is_playing: p.is_playing,
            progress_ms: p.progress_ms,
        })
    });
    Ok(Json(current))
}

/// `POST /api/spotify/toggle-play` - pauses if playing, resumes otherwise.
///
/// The returned `is_playing` is the expected new state; it is not read back
/// from Spotify. Only one toggle per session runs at a time.
pub async fn toggle_play(
    State(state): State<AppState>,
    Extension(SessionId(session_id)): Extension<SessionId>,
    body: Bytes,
) -> Result<Json<TogglePlayResponse>, ApiError> {
    let token = require_token(&state, &session_id).await?;
    let request: TogglePlayRequest = parse_optional_body(&body)?;
    let device_id = request.device_id.filter(|d| !d.is_empty());

    let _guard = state
        .sessions
        .try_begin_toggle(&session_id)
        .await
        .ok_or(ApiError::ToggleInFlight)?;

    let Some(playback) = state.spotify.playback_state(&token).await? else {
        warning!("Toggle play failed: no active playback session");
        return Err(ApiError::NoActiveSession);
    };

    let command = PlayerCommand::toggle_of(playback.is_playing);
    state
        .spotify
        .send_command(&token, command, device_id.as_deref())
        .await
        .inspect_err(|e| warning!("Failed to {} playback: {}", command.as_str(), e))?;

    Ok(Json(TogglePlayResponse {
        success: true,
        is_playing: !playback.is_playing,
        device_id: device_id.or_else(|| playback.device.and_then(|d| d.id)),
    }))
}

/// `POST /api/spotify/play-random` - plays one of the artist's top tracks.
pub async fn play_random(
    State(state): State<AppState>,
    Extension(SessionId(session_id)): Extension<SessionId>,
    body: Bytes,
) -> Result<Json<Track>, ApiError> {
    let token = require_token(&state, &session_id).await?;
    let request: PlayRandomRequest = parse_optional_body(&body)?;

    let artist_id = request
        .artist_id
        .filter(|id| !id.trim().is_empty())
        .ok_or(ApiError::MissingInput("artistId"))?;
    if !artist_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ApiError::InvalidInput(format!("malformed artist id {artist_id}")));
    }
    let device_id = request.device_id.filter(|d| !d.is_empty());

    let tracks = state.spotify.artist_top_tracks(&token, &artist_id).await?;
    let track = state
        .pick_track(&tracks)
        .ok_or_else(|| ApiError::NoTracks(artist_id.clone()))?;

    state
        .spotify
        .play_uris(&token, vec![track.uri.clone()], device_id.as_deref())
        .await
        .inspect_err(|e| warning!("Failed to play track: {}", e))?;

    info!("Playing \"{}\" by {}", track.name, track.artist_names());
    Ok(Json(track))
}

/// Parses a JSON body that may be absent altogether.
fn parse_optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidInput(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_yields_defaults() {
        let request: TogglePlayRequest = parse_optional_body(&Bytes::new()).unwrap();
        assert!(request.device_id.is_none());
    }

    #[test]
    fn body_fields_are_read() {
        let body = Bytes::from_static(br#"{"artistId":"abc","device_id":"dev"}"#);
        let request: PlayRandomRequest = parse_optional_body(&body).unwrap();
        assert_eq!(request.artist_id.as_deref(), Some("abc"));
        assert_eq!(request.device_id.as_deref(), Some("dev"));
    }

    #[test]
    fn malformed_body_is_rejected() {
        let body = Bytes::from_static(b"{not json");
        let result: Result<PlayRandomRequest, _> = parse_optional_body(&body);
        assert!(matches!(result, Err(ApiError::InvalidInput(_))));
    }
}
