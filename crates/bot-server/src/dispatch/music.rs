use chrono::Utc;
use rand::seq::SliceRandom;
use shared::line::{LineMessage, flex};
use shared::models::TrackReference;
use shared::spotify::SpotifyError;
use shared::spotify::session::valid_access_token;
use tracing::{info, warn};

use super::{ActionError, ActionResult, replies};
use crate::http::AppState;
use crate::http::tokens::{generate_secure_token, hash_token};

pub(super) const SEARCH_PAGE_SIZE: u32 = 10;
const MAX_SEARCH_PAGE_SIZE: u32 = 50;
const RECOMMENDATION_SEEDS: usize = 5;
const RECOMMENDATION_LIMIT: u32 = 10;

pub(super) async fn connect_spotify(state: &AppState, user_id: String) -> ActionResult {
    let state_token = generate_secure_token("st");
    let ttl = i64::try_from(state.settings.oauth_state_ttl_seconds).unwrap_or(i64::MAX);
    let expires_at = Utc::now().timestamp().saturating_add(ttl);

    state
        .store
        .store_oauth_state(&hash_token(&state_token), &user_id, expires_at)
        .await?;

    let authorize_url = state
        .spotify_oauth
        .authorize_url(&state_token)
        .map_err(|err| ActionError::AuthorizeUrl(err.to_string()))?;

    Ok(vec![LineMessage::text(replies::connect_prompt(&authorize_url))])
}

/// Personalized when the user has listening history and a connected account;
/// otherwise, or when anything on that path fails, a random seeded track.
pub(super) async fn recommend_song(state: &AppState, user_id: String) -> ActionResult {
    let history = state.store.load_listening_history(&user_id).await?;

    if !history.is_empty() {
        match personalized_pick(state, &user_id, &history).await {
            Ok(Some(track)) => {
                return Ok(vec![LineMessage::text(replies::recommendation(&track))]);
            }
            Ok(None) => {
                info!(user_id = %user_id, "no personalized recommendation; using seeded list")
            }
            Err(err) => warn!(
                user_id = %user_id,
                "personalized recommendation failed; using seeded list: {err}"
            ),
        }
    }

    let seeded = state.store.list_seeded_tracks().await?;
    let Some(track) = pick_random(&seeded) else {
        return Ok(vec![LineMessage::text(replies::NO_TRACKS_TEXT)]);
    };

    Ok(vec![LineMessage::text(replies::recommendation(&track))])
}

async fn personalized_pick(
    state: &AppState,
    user_id: &str,
    history: &[TrackReference],
) -> Result<Option<TrackReference>, SpotifyError> {
    let now = Utc::now().timestamp();
    let Some(access_token) =
        valid_access_token(&state.store, &state.spotify_oauth, user_id, now).await?
    else {
        return Ok(None);
    };

    let seeds = history
        .iter()
        .rev()
        .take(RECOMMENDATION_SEEDS)
        .map(|track| track.id.clone())
        .collect::<Vec<_>>();

    let candidates = state
        .spotify_api
        .recommendations(&access_token, &seeds, RECOMMENDATION_LIMIT)
        .await?
        .iter()
        .filter(|track| !history.iter().any(|known| known.id == track.id))
        .map(|track| track.to_reference())
        .collect::<Vec<_>>();

    Ok(pick_random(&candidates))
}

fn pick_random(tracks: &[TrackReference]) -> Option<TrackReference> {
    tracks.choose(&mut rand::thread_rng()).cloned()
}

pub(super) async fn search(
    state: &AppState,
    user_id: String,
    terms: String,
    skip: u32,
    limit: u32,
) -> ActionResult {
    let terms = terms.trim();
    if terms.is_empty() {
        return Ok(vec![LineMessage::text(replies::SEARCH_USAGE_TEXT)]);
    }

    let now = Utc::now().timestamp();
    let Some(access_token) =
        valid_access_token(&state.store, &state.spotify_oauth, &user_id, now).await?
    else {
        return Ok(vec![LineMessage::text(replies::CONNECT_FIRST_TEXT)]);
    };

    let limit = limit.clamp(1, MAX_SEARCH_PAGE_SIZE);
    let page = state
        .spotify_api
        .search_tracks(&access_token, terms, skip, limit)
        .await?;

    Ok(match flex::search_results(&page, terms, skip, limit) {
        Some(message) => vec![message],
        None => vec![LineMessage::text(replies::no_search_results(terms))],
    })
}

/// Adds the track to the user's jukebox playlist and records it as listened.
/// The track is looked up before the playlist is touched.
pub(super) async fn add_track(state: &AppState, user_id: String, track_id: String) -> ActionResult {
    let now = Utc::now().timestamp();
    let Some(access_token) =
        valid_access_token(&state.store, &state.spotify_oauth, &user_id, now).await?
    else {
        return Ok(vec![LineMessage::text(replies::CONNECT_FIRST_TEXT)]);
    };

    let track = state.spotify_api.track(&access_token, &track_id).await?;
    let playlist_id = match state.store.cached_playlist_id(&user_id).await? {
        Some(playlist_id) => playlist_id,
        None => resolve_playlist(state, &user_id, &access_token).await?,
    };

    match state
        .spotify_api
        .add_track_to_playlist(&access_token, &playlist_id, &track_id)
        .await
    {
        Ok(()) => {}
        Err(SpotifyError::Api { status: 404, .. }) => {
            warn!(user_id = %user_id, "cached playlist is gone; resolving again");
            let playlist_id = resolve_playlist(state, &user_id, &access_token).await?;
            state
                .spotify_api
                .add_track_to_playlist(&access_token, &playlist_id, &track_id)
                .await?;
        }
        Err(err) => return Err(err.into()),
    }

    state
        .store
        .record_listened_track(&user_id, &track.to_reference())
        .await?;
    info!(user_id = %user_id, track_id = %track_id, "added track to playlist");

    Ok(vec![flex::track_added(&state.settings.playlist_name)])
}

async fn resolve_playlist(
    state: &AppState,
    user_id: &str,
    access_token: &str,
) -> Result<String, ActionError> {
    let playlist_id = state
        .spotify_api
        .find_or_create_playlist(access_token, &state.settings.playlist_name)
        .await?;
    state.store.cache_playlist_id(user_id, &playlist_id).await?;
    Ok(playlist_id)
}

pub(super) async fn playlist(state: &AppState) -> ActionResult {
    let url = state.store.playlist_url().await?;
    Ok(vec![LineMessage::text(replies::playlist(&url))])
}
