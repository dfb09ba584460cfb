use shared::line::LineMessage;
use shared::llm::prompts::{chat_request, summary_request};
use shared::models::ConversationTurn;
use tracing::info;

use super::{ActionResult, replies};
use crate::http::AppState;

/// Stores the user turn, asks the model with the bounded history, and stores
/// the answer. A failed model call leaves the user turn in place.
pub(super) async fn chat(state: &AppState, conversation_id: String, text: String) -> ActionResult {
    let history = state
        .store
        .append_conversation_turns(&conversation_id, &[ConversationTurn::user(text)])
        .await?;

    let response = state.llm.generate(chat_request(&history)).await?;
    info!(
        conversation_id = %conversation_id,
        model = %response.model,
        turns = history.len(),
        "generated chat reply"
    );

    state
        .store
        .append_conversation_turns(
            &conversation_id,
            &[ConversationTurn::model(response.text.clone())],
        )
        .await?;

    Ok(vec![LineMessage::text(response.text)])
}

pub(super) async fn clear(state: &AppState, conversation_id: String) -> ActionResult {
    state.store.clear_conversation(&conversation_id).await?;
    info!(conversation_id = %conversation_id, "cleared conversation");
    Ok(vec![LineMessage::text(replies::HISTORY_CLEARED_TEXT)])
}

pub(super) async fn summarize(state: &AppState, conversation_id: String) -> ActionResult {
    let history = state.store.load_conversation(&conversation_id).await?;
    if history.is_empty() {
        return Ok(vec![LineMessage::text(replies::EMPTY_HISTORY_TEXT)]);
    }

    let response = state.llm.generate(summary_request(&history)).await?;
    Ok(vec![LineMessage::text(replies::summary(&response.text))])
}
