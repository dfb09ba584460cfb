use crate::models::OAuthStateRecord;

use super::{Store, StoreError, document_path};

const OAUTH_STATE_COLLECTION: &str = "oauth_states";

impl Store {
    /// `state_hash` is the hex digest of the state token handed to the user;
    /// the raw token is never stored.
    pub async fn store_oauth_state(
        &self,
        state_hash: &str,
        user_id: &str,
        expires_at: i64,
    ) -> Result<(), StoreError> {
        let path = document_path(OAUTH_STATE_COLLECTION, state_hash)?;
        self.put_typed(
            &path,
            &OAuthStateRecord {
                user_id: user_id.to_string(),
                expires_at,
            },
        )
        .await
    }

    /// Returns the user bound to the state and deletes the record. Expired
    /// or unknown states yield `None`.
    pub async fn consume_oauth_state(
        &self,
        state_hash: &str,
        now_unix: i64,
    ) -> Result<Option<String>, StoreError> {
        let path = document_path(OAUTH_STATE_COLLECTION, state_hash)?;
        let _guard = self.locks.lock(&path).await;

        let Some(record) = self.get_typed::<OAuthStateRecord>(&path).await? else {
            return Ok(None);
        };
        self.backend.delete(&path).await?;

        Ok((record.expires_at > now_unix).then_some(record.user_id))
    }
}
