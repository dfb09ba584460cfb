//! Per-event flow: receive, classify, act, reply.
//!
//! Every action returns the messages to send; failures are logged here and
//! replaced with a generic apology so the user always gets an answer.

use serde_json::Value;
use shared::intent::Intent;
use shared::line::{EventMessage, LineMessage, PostbackCommand, WebhookEvent};
use shared::llm::LlmGatewayError;
use shared::repos::StoreError;
use shared::spotify::SpotifyError;
use shared::weather::WeatherError;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::http::AppState;

mod conversation;
mod music;
mod replies;
mod weather;

#[derive(Debug, Error)]
pub(crate) enum ActionError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Spotify(#[from] SpotifyError),
    #[error(transparent)]
    Llm(#[from] LlmGatewayError),
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error("could not build authorization link: {0}")]
    AuthorizeUrl(String),
}

type ActionResult = Result<Vec<LineMessage>, ActionError>;

/// Who sent the event. Tokens and history follow the user; chat memory
/// follows the conversation (group, room, or one-to-one chat).
#[derive(Debug, Clone)]
pub(crate) struct Sender {
    pub(crate) user_id: Option<String>,
    pub(crate) conversation_id: Option<String>,
}

pub(crate) async fn handle_raw_event(state: &AppState, raw: Value) {
    let event = match WebhookEvent::parse(raw) {
        Ok(event) => event,
        Err(err) => {
            warn!("skipping malformed webhook event: {err}");
            return;
        }
    };

    let kind = event.kind();
    let sender = event
        .source()
        .map(|source| Sender {
            user_id: source.user_id.clone(),
            conversation_id: source.conversation_id().map(str::to_string),
        })
        .unwrap_or(Sender {
            user_id: None,
            conversation_id: None,
        });

    let (reply_token, outcome) = match event {
        WebhookEvent::Message {
            reply_token,
            message: EventMessage::Text { text, .. },
            ..
        } => {
            let outcome = handle_text(state, &sender, &text).await;
            (reply_token, outcome)
        }
        WebhookEvent::Postback {
            reply_token,
            postback,
            ..
        } => {
            let outcome = match PostbackCommand::parse(&postback.data) {
                Some(command) => handle_postback(state, &sender, command).await,
                None => {
                    warn!(data = %postback.data, "ignoring unrecognized postback");
                    Ok(Vec::new())
                }
            };
            (reply_token, outcome)
        }
        WebhookEvent::Follow { reply_token, .. } => {
            (reply_token, Ok(vec![LineMessage::text(replies::WELCOME_TEXT)]))
        }
        _ => {
            info!(kind, "ignoring webhook event");
            return;
        }
    };

    let messages = match outcome {
        Ok(messages) => messages,
        Err(err) => {
            error!(kind, user_id = ?sender.user_id, "event handling failed: {err}");
            vec![LineMessage::text(replies::APOLOGY_TEXT)]
        }
    };

    if let Err(err) = state.line.reply(&reply_token, &messages).await {
        error!(kind, "failed to send reply: {err}");
    }
}

async fn handle_text(state: &AppState, sender: &Sender, text: &str) -> ActionResult {
    let intent = state.classifier.classify(text).await;
    info!(intent = intent.name(), user_id = ?sender.user_id, "classified message");

    match intent {
        Intent::ConnectSpotify => {
            with_user(sender, |user_id| music::connect_spotify(state, user_id)).await
        }
        Intent::RecommendSong => {
            with_user(sender, |user_id| music::recommend_song(state, user_id)).await
        }
        Intent::SearchTrack { terms } => {
            with_user(sender, |user_id| {
                music::search(state, user_id, terms, 0, music::SEARCH_PAGE_SIZE)
            })
            .await
        }
        Intent::Playlist => music::playlist(state).await,
        Intent::Weather { location } => weather::forecast(state, location).await,
        Intent::Earthquake => weather::earthquake(state).await,
        Intent::ClearHistory => {
            with_conversation(sender, |conversation_id| {
                conversation::clear(state, conversation_id)
            })
            .await
        }
        Intent::Summary => {
            with_conversation(sender, |conversation_id| {
                conversation::summarize(state, conversation_id)
            })
            .await
        }
        Intent::Help => Ok(vec![LineMessage::text(replies::HELP_TEXT)]),
        Intent::Chat => {
            with_conversation(sender, |conversation_id| {
                conversation::chat(state, conversation_id, text.to_string())
            })
            .await
        }
    }
}

async fn handle_postback(
    state: &AppState,
    sender: &Sender,
    command: PostbackCommand,
) -> ActionResult {
    match command {
        PostbackCommand::AddTrack { track } => {
            with_user(sender, |user_id| music::add_track(state, user_id, track)).await
        }
        PostbackCommand::SearchMore { terms, skip, limit } => {
            with_user(sender, |user_id| {
                music::search(state, user_id, terms, skip, limit)
            })
            .await
        }
    }
}

async fn with_user<F, Fut>(sender: &Sender, action: F) -> ActionResult
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = ActionResult>,
{
    match sender.user_id.clone() {
        Some(user_id) => action(user_id).await,
        None => Ok(vec![LineMessage::text(replies::USER_REQUIRED_TEXT)]),
    }
}

async fn with_conversation<F, Fut>(sender: &Sender, action: F) -> ActionResult
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = ActionResult>,
{
    match sender.conversation_id.clone() {
        Some(conversation_id) => action(conversation_id).await,
        None => Ok(Vec::new()),
    }
}
