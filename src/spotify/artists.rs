use crate::{
    spotify::{SpotifyClient, SpotifyError, ensure_success},
    types::{Artist, ArtistSearchResponse, TopTracksResponse, Track},
};

impl SpotifyClient {
    /// Searches the Spotify catalog for artists.
    ///
    /// # Arguments
    ///
    /// * `token` - Session access token
    /// * `query` - Free-text search query, sent URL-encoded
    ///
    /// # Returns
    ///
    /// The `artists.items` array exactly as Spotify returned it, in Spotify's
    /// ranking order. A response without that array is reported as
    /// [`SpotifyError::Malformed`].
    ///
    /// # Example
    ///
    /// ```
    /// let artists = spotify.search_artists(&token, "radiohead").await?;
    /// println!("Best match: {}", artists[0].name);
    /// ```
    pub async fn search_artists(&self, token: &str, query: &str) -> Result<Vec<Artist>, SpotifyError> {
        let response = self
            .http
            .get(self.api("/search"))
            .query(&[("type", "artist"), ("q", query)])
            .bearer_auth(token)
            .send()
            .await?;

        let res = ensure_success(response)
            .await?
            .json::<ArtistSearchResponse>()
            .await?;

        res.artists
            .and_then(|a| a.items)
            .ok_or_else(|| SpotifyError::Malformed("missing artists.items".to_string()))
    }

    /// Fetches an artist's top tracks for the configured market.
    pub async fn artist_top_tracks(&self, token: &str, artist_id: &str) -> Result<Vec<Track>, SpotifyError> {
        let response = self
            .http
            .get(self.api(&format!("/artists/{artist_id}/top-tracks")))
            .query(&[("market", self.market.as_str())])
            .bearer_auth(token)
            .send()
            .await?;

        let res = ensure_success(response)
            .await?
            .json::<TopTracksResponse>()
            .await?;

        Ok(res.tracks)
    }
}
