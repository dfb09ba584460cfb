use serde::Deserialize;
use thiserror::Error;

use crate::models::TrackReference;
use crate::repos::StoreError;

mod api;
mod oauth;
pub mod session;

pub use api::SpotifyApi;
pub use oauth::{DEFAULT_SCOPES, SpotifyOAuth, SpotifyOAuthConfig, TokenGrant};

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("spotify request failed: {0}")]
    Transport(String),
    #[error("spotify api returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("spotify oauth failed: status={status} error={error}")]
    OAuth { status: u16, error: String },
    #[error("spotify response was invalid: {0}")]
    InvalidResponse(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub popularity: u32,
    #[serde(default)]
    pub artists: Vec<Artist>,
    #[serde(default)]
    pub album: Album,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Artist {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Album {
    #[serde(default)]
    pub images: Vec<AlbumImage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AlbumImage {
    pub url: String,
    #[serde(default)]
    pub width: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExternalUrls {
    #[serde(default)]
    pub spotify: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackPage {
    #[serde(default)]
    pub items: Vec<Track>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub offset: u32,
    #[serde(default)]
    pub limit: u32,
}

impl Track {
    pub fn artist_list(&self) -> String {
        self.artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn share_url(&self) -> String {
        self.external_urls
            .spotify
            .clone()
            .unwrap_or_else(|| format!("https://open.spotify.com/track/{}", self.id))
    }

    /// Widest album image, or an empty string when the album has none.
    pub fn artwork_url(&self) -> String {
        self.album
            .images
            .iter()
            .max_by_key(|image| image.width.unwrap_or(0))
            .map(|image| image.url.clone())
            .unwrap_or_default()
    }

    pub fn to_reference(&self) -> TrackReference {
        TrackReference {
            id: self.id.clone(),
            name: self.name.clone(),
            artist: self.artist_list(),
            url: self.share_url(),
        }
    }
}

impl TrackPage {
    /// Whether results exist past this page, given the requested window.
    pub fn has_more(&self, skip: u32, limit: u32) -> bool {
        self.total > skip.saturating_add(limit)
    }
}
