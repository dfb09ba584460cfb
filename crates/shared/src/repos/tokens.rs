use crate::models::SpotifyTokenRecord;

use super::{Store, StoreError, document_path};

const SPOTIFY_TOKEN_COLLECTION: &str = "spotify_tokens";

impl Store {
    pub async fn load_spotify_token(
        &self,
        user_id: &str,
    ) -> Result<Option<SpotifyTokenRecord>, StoreError> {
        let path = document_path(SPOTIFY_TOKEN_COLLECTION, user_id)?;
        self.get_typed(&path).await
    }

    pub async fn save_spotify_token(
        &self,
        user_id: &str,
        record: &SpotifyTokenRecord,
    ) -> Result<(), StoreError> {
        let path = document_path(SPOTIFY_TOKEN_COLLECTION, user_id)?;
        self.put_typed(&path, record).await
    }
}

#[cfg(test)]
mod tests {
    use crate::models::SpotifyTokenRecord;
    use crate::repos::{Store, StoreLimits};

    #[tokio::test]
    async fn save_overwrites_whole_record() {
        let store = Store::in_memory(StoreLimits::default());
        assert!(store.load_spotify_token("U1").await.expect("load").is_none());

        store
            .save_spotify_token(
                "U1",
                &SpotifyTokenRecord {
                    access_token: "first".to_string(),
                    refresh_token: Some("refresh".to_string()),
                    expires_at: Some(10),
                },
            )
            .await
            .expect("save");
        let replacement = SpotifyTokenRecord {
            access_token: "second".to_string(),
            refresh_token: None,
            expires_at: Some(20),
        };
        store
            .save_spotify_token("U1", &replacement)
            .await
            .expect("save again");

        assert_eq!(
            store.load_spotify_token("U1").await.expect("load"),
            Some(replacement)
        );
    }
}
