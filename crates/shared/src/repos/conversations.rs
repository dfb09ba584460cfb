use crate::models::ConversationTurn;

use super::{Store, StoreError, document_path};

const CONVERSATION_COLLECTION: &str = "chat";

impl Store {
    pub async fn load_conversation(
        &self,
        conversation_id: &str,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let path = document_path(CONVERSATION_COLLECTION, conversation_id)?;
        Ok(self.get_typed(&path).await?.unwrap_or_default())
    }

    /// Appends turns and trims the record to the newest
    /// `conversation_max_turns` entries. Returns the stored conversation.
    pub async fn append_conversation_turns(
        &self,
        conversation_id: &str,
        turns: &[ConversationTurn],
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let path = document_path(CONVERSATION_COLLECTION, conversation_id)?;
        let _guard = self.locks.lock(&path).await;

        let mut conversation: Vec<ConversationTurn> =
            self.get_typed(&path).await?.unwrap_or_default();
        conversation.extend_from_slice(turns);
        keep_newest(&mut conversation, self.limits.conversation_max_turns);

        self.put_typed(&path, &conversation).await?;
        Ok(conversation)
    }

    pub async fn clear_conversation(&self, conversation_id: &str) -> Result<(), StoreError> {
        let path = document_path(CONVERSATION_COLLECTION, conversation_id)?;
        let _guard = self.locks.lock(&path).await;
        self.backend.delete(&path).await
    }
}

pub(super) fn keep_newest<T>(items: &mut Vec<T>, max_len: usize) {
    if max_len > 0 && items.len() > max_len {
        let excess = items.len() - max_len;
        items.drain(..excess);
    }
}
