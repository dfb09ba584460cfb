use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::{SpotifyError, Track, TrackPage};

const PLAYLIST_PAGE_SIZE: u32 = 50;
const MAX_RECOMMENDATION_SEEDS: usize = 5;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct RecommendationsResponse {
    #[serde(default)]
    tracks: Vec<Track>,
}

#[derive(Debug, Deserialize)]
struct CurrentUser {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PlaylistPage {
    #[serde(default)]
    items: Vec<PlaylistSummary>,
    #[serde(default)]
    total: u32,
}

#[derive(Debug, Deserialize)]
struct PlaylistSummary {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedPlaylist {
    id: String,
}

#[derive(Clone)]
pub struct SpotifyApi {
    base_url: String,
    client: reqwest::Client,
}

impl SpotifyApi {
    pub fn new(base_url: String, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub async fn search_tracks(
        &self,
        access_token: &str,
        terms: &str,
        offset: u32,
        limit: u32,
    ) -> Result<TrackPage, SpotifyError> {
        let request = self
            .client
            .get(format!("{}/search", self.base_url))
            .bearer_auth(access_token)
            .query(&[
                ("q", terms.to_string()),
                ("type", "track".to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ]);

        let response: SearchResponse = send_json(request).await?;
        Ok(response.tracks)
    }

    pub async fn track(&self, access_token: &str, track_id: &str) -> Result<Track, SpotifyError> {
        let request = self
            .client
            .get(format!("{}/tracks/{track_id}", self.base_url))
            .bearer_auth(access_token);

        send_json(request).await
    }

    pub async fn recommendations(
        &self,
        access_token: &str,
        seed_track_ids: &[String],
        limit: u32,
    ) -> Result<Vec<Track>, SpotifyError> {
        let seeds = seed_track_ids
            .iter()
            .take(MAX_RECOMMENDATION_SEEDS)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        let request = self
            .client
            .get(format!("{}/recommendations", self.base_url))
            .bearer_auth(access_token)
            .query(&[("seed_tracks", seeds), ("limit", limit.to_string())]);

        let response: RecommendationsResponse = send_json(request).await?;
        Ok(response.tracks)
    }

    pub async fn current_user_id(&self, access_token: &str) -> Result<String, SpotifyError> {
        let request = self
            .client
            .get(format!("{}/me", self.base_url))
            .bearer_auth(access_token);

        let user: CurrentUser = send_json(request).await?;
        Ok(user.id)
    }

    /// Pages through the user's playlists looking for `name`; creates a
    /// private playlist when none matches.
    pub async fn find_or_create_playlist(
        &self,
        access_token: &str,
        name: &str,
    ) -> Result<String, SpotifyError> {
        let mut offset = 0_u32;
        loop {
            let request = self
                .client
                .get(format!("{}/me/playlists", self.base_url))
                .bearer_auth(access_token)
                .query(&[
                    ("offset", offset.to_string()),
                    ("limit", PLAYLIST_PAGE_SIZE.to_string()),
                ]);
            let page: PlaylistPage = send_json(request).await?;

            if let Some(existing) = page.items.iter().find(|playlist| playlist.name == name) {
                return Ok(existing.id.clone());
            }

            offset = offset.saturating_add(PLAYLIST_PAGE_SIZE);
            if page.items.is_empty() || offset >= page.total {
                break;
            }
        }

        let user_id = self.current_user_id(access_token).await?;
        let request = self
            .client
            .post(format!("{}/users/{user_id}/playlists", self.base_url))
            .bearer_auth(access_token)
            .json(&json!({ "name": name, "public": false }));

        let created: CreatedPlaylist = send_json(request).await?;
        Ok(created.id)
    }

    pub async fn add_track_to_playlist(
        &self,
        access_token: &str,
        playlist_id: &str,
        track_id: &str,
    ) -> Result<(), SpotifyError> {
        let request = self
            .client
            .post(format!("{}/playlists/{playlist_id}/tracks", self.base_url))
            .bearer_auth(access_token)
            .json(&json!({ "uris": [format!("spotify:track:{track_id}")] }));

        let _: Value = send_json(request).await?;
        Ok(())
    }
}

async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, SpotifyError> {
    let response = request
        .send()
        .await
        .map_err(|err| SpotifyError::Transport(err.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SpotifyError::Api {
            status: status.as_u16(),
            message: parse_api_error_message(&body),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|err| SpotifyError::InvalidResponse(err.to_string()))
}

fn parse_api_error_message(body: &str) -> String {
    #[derive(Deserialize)]
    struct ApiErrorEnvelope {
        error: Option<ApiErrorDetails>,
    }

    #[derive(Deserialize)]
    struct ApiErrorDetails {
        message: Option<String>,
    }

    serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|details| details.message)
        .unwrap_or_else(|| "unknown".to_string())
}
