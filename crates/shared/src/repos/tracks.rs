use serde_json::Value;
use tracing::info;

use crate::models::TrackReference;

use super::conversations::keep_newest;
use super::{Store, StoreError, document_path};

const SEEDED_TRACK_COLLECTION: &str = "spotify_tracks";
const LISTENING_HISTORY_COLLECTION: &str = "history";
const PLAYLIST_ID_COLLECTION: &str = "spotify_playlists";
const PLAYLIST_URL_PATH: &str = "spotify_playlist/url";

pub const DEFAULT_PLAYLIST_URL: &str = "https://open.spotify.com/playlist/7oJx24EcRU7fIVoTdqKscK";

const DEFAULT_TRACKS: [(&str, &str, &str); 10] = [
    ("0VjIjW4GlUZAMYd2vXMi3b", "Blinding Lights", "The Weeknd"),
    ("7qiZfU4dY1lWllzX7mPBI3", "Shape of You", "Ed Sheeran"),
    ("3n3Ppam7vgaVa1iaRUc9Lp", "Mr. Brightside", "The Killers"),
    ("1mea3bSkSGXuIRvnydlB5b", "Viva La Vida", "Coldplay"),
    ("6UelLqGlWMcVH1E5c4H7lY", "Watermelon Sugar", "Harry Styles"),
    ("2Fxmhks0bxGSBdJ92vM42m", "bad guy", "Billie Eilish"),
    ("4cOdK2wGLETKBW3PvgPWqT", "Never Gonna Give You Up", "Rick Astley"),
    ("7qEHsqek33rTcFNT9PFqLf", "Someone You Loved", "Lewis Capaldi"),
    ("39LLxExYz6ewLAcYrzQQyP", "Levitating", "Dua Lipa"),
    ("5HCyWlXZPP0y6Gqq8TgA20", "STAY", "The Kid LAROI, Justin Bieber"),
];

/// The ten tracks written into `spotify_tracks/track_{n}` on first start.
pub fn default_tracks() -> Vec<TrackReference> {
    DEFAULT_TRACKS
        .iter()
        .map(|(id, name, artist)| TrackReference {
            id: (*id).to_string(),
            name: (*name).to_string(),
            artist: (*artist).to_string(),
            url: format!("https://open.spotify.com/track/{id}"),
        })
        .collect()
}

fn seeded_track_path(index: usize) -> String {
    format!("{SEEDED_TRACK_COLLECTION}/track_{index}")
}

impl Store {
    /// Writes the default track list and shared playlist URL unless they are
    /// already present. Returns whether anything was written.
    pub async fn seed_default_tracks(&self) -> Result<bool, StoreError> {
        let mut seeded = false;

        if self.backend.get(&seeded_track_path(1)).await?.is_none() {
            for (offset, track) in default_tracks().iter().enumerate() {
                self.put_typed(&seeded_track_path(offset + 1), track).await?;
            }
            seeded = true;
        }

        if self.backend.get(PLAYLIST_URL_PATH).await?.is_none() {
            self.backend
                .put(
                    PLAYLIST_URL_PATH,
                    &Value::String(DEFAULT_PLAYLIST_URL.to_string()),
                )
                .await?;
            seeded = true;
        }

        if seeded {
            info!("seeded default track list and playlist url");
        }
        Ok(seeded)
    }

    /// Reads `track_1..=track_10`, skipping gaps. An empty store falls back
    /// to the built-in defaults so recommendations never come back empty.
    pub async fn list_seeded_tracks(&self) -> Result<Vec<TrackReference>, StoreError> {
        let mut tracks = Vec::with_capacity(DEFAULT_TRACKS.len());
        for index in 1..=DEFAULT_TRACKS.len() {
            if let Some(track) = self
                .get_typed::<TrackReference>(&seeded_track_path(index))
                .await?
            {
                tracks.push(track);
            }
        }

        if tracks.is_empty() {
            return Ok(default_tracks());
        }
        Ok(tracks)
    }

    pub async fn load_listening_history(
        &self,
        user_id: &str,
    ) -> Result<Vec<TrackReference>, StoreError> {
        let path = document_path(LISTENING_HISTORY_COLLECTION, user_id)?;
        Ok(self.get_typed(&path).await?.unwrap_or_default())
    }

    /// Moves the track to the newest position of the user's history.
    pub async fn record_listened_track(
        &self,
        user_id: &str,
        track: &TrackReference,
    ) -> Result<(), StoreError> {
        let path = document_path(LISTENING_HISTORY_COLLECTION, user_id)?;
        let _guard = self.locks.lock(&path).await;

        let mut history: Vec<TrackReference> = self.get_typed(&path).await?.unwrap_or_default();
        history.retain(|existing| existing.id != track.id);
        history.push(track.clone());
        keep_newest(&mut history, self.limits.listening_history_max);

        self.put_typed(&path, &history).await
    }

    pub async fn playlist_url(&self) -> Result<String, StoreError> {
        Ok(self
            .get_typed::<String>(PLAYLIST_URL_PATH)
            .await?
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PLAYLIST_URL.to_string()))
    }

    pub async fn cached_playlist_id(&self, user_id: &str) -> Result<Option<String>, StoreError> {
        let path = document_path(PLAYLIST_ID_COLLECTION, user_id)?;
        self.get_typed(&path).await
    }

    pub async fn cache_playlist_id(
        &self,
        user_id: &str,
        playlist_id: &str,
    ) -> Result<(), StoreError> {
        let path = document_path(PLAYLIST_ID_COLLECTION, user_id)?;
        self.put_typed(&path, &playlist_id).await
    }
}
