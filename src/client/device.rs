use std::future::Future;

use crate::Res;

/// Source of access tokens for a playback device.
///
/// Passed explicitly when a device is initialized instead of being
/// registered as a bare callback.
pub trait TokenProvider {
    fn fetch_token(&self) -> impl Future<Output = Res<String>> + Send;
}

/// A playback endpoint registered with Spotify.
#[derive(Debug, Clone)]
pub struct PlaybackDevice {
    id: String,
    name: String,
}

impl PlaybackDevice {
    /// Initializes the device once the provider hands out a usable token.
    ///
    /// The token only proves the session may drive playback; it is not
    /// kept past this call.
    pub async fn initialize<P: TokenProvider>(
        id: impl Into<String>,
        name: impl Into<String>,
        provider: &P,
    ) -> Res<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("device id must not be empty".into());
        }

        let token = provider.fetch_token().await?;
        if token.trim().is_empty() {
            return Err("token provider returned an empty token".into());
        }

        Ok(Self {
            id,
            name: name.into(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
