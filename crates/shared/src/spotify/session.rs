//! Spotify credential lifecycle per LINE user.
//!
//! A user is unauthenticated until the OAuth callback stores a token record.
//! Expiry is checked lazily on each use; an expired record is refreshed
//! inline, exactly once, and the refreshed record replaces the stored one.

use tracing::{info, warn};

use crate::models::SpotifyTokenRecord;
use crate::repos::{Store, StoreError};

use super::{SpotifyError, SpotifyOAuth};

pub const TOKEN_EXPIRY_SKEW_SECONDS: i64 = 30;

/// Returns a usable access token, refreshing it when expired. `None` means
/// the user has not connected Spotify, or the stored record cannot be read
/// or refreshed.
pub async fn valid_access_token(
    store: &Store,
    oauth: &SpotifyOAuth,
    user_id: &str,
    now_unix: i64,
) -> Result<Option<String>, SpotifyError> {
    let record = match store.load_spotify_token(user_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return Ok(None),
        Err(StoreError::InvalidData { path, message }) => {
            warn!(
                user_id,
                %path,
                %message,
                "unreadable spotify token record, treating as disconnected"
            );
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    if !record.is_expired(now_unix, TOKEN_EXPIRY_SKEW_SECONDS) {
        return Ok(Some(record.access_token));
    }

    let Some(refresh_token) = record.refresh_token else {
        warn!(user_id, "expired spotify token has no refresh token");
        return Ok(None);
    };

    let grant = oauth.refresh(&refresh_token).await?;
    let refreshed = grant.into_record(now_unix, Some(refresh_token));
    store.save_spotify_token(user_id, &refreshed).await?;
    info!(user_id, "refreshed spotify access token");

    Ok(Some(refreshed.access_token))
}

/// Exchanges an authorization code and stores the resulting record.
pub async fn complete_authorization(
    store: &Store,
    oauth: &SpotifyOAuth,
    user_id: &str,
    code: &str,
    now_unix: i64,
) -> Result<SpotifyTokenRecord, SpotifyError> {
    let grant = oauth.exchange_code(code).await?;
    let record = grant.into_record(now_unix, None);
    store.save_spotify_token(user_id, &record).await?;
    info!(user_id, "stored spotify authorization");

    Ok(record)
}
