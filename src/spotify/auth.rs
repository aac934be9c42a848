use reqwest::header::AUTHORIZATION;

use crate::{
    config::SPOTIFY_SCOPE,
    spotify::{SpotifyClient, SpotifyError, ensure_success},
    types::TokenResponse,
    utils,
};

impl SpotifyClient {
    /// Builds the Spotify authorization URL the browser is redirected to.
    ///
    /// # Arguments
    ///
    /// * `redirect_uri` - Callback URL registered for the application
    /// * `state` - Opaque nonce echoed back on the callback, tying it to the
    ///   session that started the login
    ///
    /// # Example
    ///
    /// ```
    /// let url = spotify.authorize_url("https://vinyl.example.com/api/spotify/callback", "nonce")?;
    /// assert!(url.starts_with("https://accounts.spotify.com/authorize?"));
    /// ```
    pub fn authorize_url(&self, redirect_uri: &str, state: &str) -> Result<String, SpotifyError> {
        let url = reqwest::Url::parse_with_params(
            &self.auth_url,
            &[
                ("response_type", "code"),
                ("client_id", self.client_id.as_str()),
                ("scope", SPOTIFY_SCOPE),
                ("redirect_uri", redirect_uri),
                ("state", state),
            ],
        )
        .map_err(|e| SpotifyError::Malformed(format!("invalid authorize URL: {e}")))?;

        Ok(url.into())
    }

    /// Exchanges an authorization code for an access token.
    ///
    /// Completes the authorization code flow with a single server-to-server
    /// POST authenticated with HTTP Basic credentials built from the client
    /// id and secret. This is the final step in the authentication process.
    ///
    /// # Arguments
    ///
    /// * `code` - Authorization code received from the OAuth callback
    /// * `redirect_uri` - Same redirect URI that was used for the authorize request
    ///
    /// # Returns
    ///
    /// - `Ok(String)` - The access token
    /// - `Err(SpotifyError::Status)` - Spotify answered with a non-2xx status
    /// - `Err(SpotifyError::Malformed)` - The response carried no access token
    /// - `Err(SpotifyError::Http)` - Network or decoding failure
    ///
    /// # Security Note
    ///
    /// The authorization code is single-use and expires quickly. The exchange
    /// happens immediately inside the callback request.
    pub async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, SpotifyError> {
        let response = self
            .http
            .post(&self.token_url)
            .header(
                AUTHORIZATION,
                utils::basic_auth(&self.client_id, &self.client_secret),
            )
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await?;

        let token = ensure_success(response).await?.json::<TokenResponse>().await?;

        token
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SpotifyError::Malformed("no access token received".to_string()))
    }
}
