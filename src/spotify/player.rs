use reqwest::StatusCode;

use crate::{
    spotify::{SpotifyClient, SpotifyError, ensure_success},
    types::{CurrentlyPlayingResponse, PlaybackState, StartPlaybackRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    Play,
    Pause,
}

impl PlayerCommand {
    /// Command that flips the current state.
    pub fn toggle_of(is_playing: bool) -> Self {
        if is_playing {
            PlayerCommand::Pause
        } else {
            PlayerCommand::Play
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerCommand::Play => "play",
            PlayerCommand::Pause => "pause",
        }
    }
}

impl SpotifyClient {
    /// Reads the user's playback state.
    ///
    /// Spotify answers `204 No Content` when there is no active playback
    /// session; that case is `Ok(None)`.
    pub async fn playback_state(&self, token: &str) -> Result<Option<PlaybackState>, SpotifyError> {
        let response = self
            .http
            .get(self.api("/me/player"))
            .bearer_auth(token)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        Ok(Some(response.json::<PlaybackState>().await?))
    }

    /// Reads the currently playing item, `Ok(None)` when nothing is playing.
    pub async fn currently_playing(
        &self,
        token: &str,
    ) -> Result<Option<CurrentlyPlayingResponse>, SpotifyError> {
        let response = self
            .http
            .get(self.api("/me/player/currently-playing"))
            .bearer_auth(token)
            .send()
            .await?;

        let response = ensure_success(response).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        Ok(Some(response.json::<CurrentlyPlayingResponse>().await?))
    }

    /// Sends a play or pause command, optionally targeting one device.
    ///
    /// A plain `play` resumes whatever the device was playing.
    pub async fn send_command(
        &self,
        token: &str,
        command: PlayerCommand,
        device_id: Option<&str>,
    ) -> Result<(), SpotifyError> {
        let mut request = self
            .http
            .put(self.api(&format!("/me/player/{}", command.as_str())))
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_LENGTH, 0);

        if let Some(device_id) = device_id {
            request = request.query(&[("device_id", device_id)]);
        }

        ensure_success(request.send().await?).await?;
        Ok(())
    }

    /// Starts playback of the given track URIs.
    pub async fn play_uris(
        &self,
        token: &str,
        uris: Vec<String>,
        device_id: Option<&str>,
    ) -> Result<(), SpotifyError> {
        let mut request = self
            .http
            .put(self.api("/me/player/play"))
            .bearer_auth(token)
            .json(&StartPlaybackRequest { uris });

        if let Some(device_id) = device_id {
            request = request.query(&[("device_id", device_id)]);
        }

        ensure_success(request.send().await?).await?;
        Ok(())
    }
}
