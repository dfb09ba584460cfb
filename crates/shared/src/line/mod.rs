mod client;
mod events;
pub mod flex;
mod messages;
mod signature;

pub use client::{LineApiError, LineClient};
pub use events::{
    EventMessage, EventSource, PostbackCommand, PostbackContent, WebhookEvent, WebhookPayload,
};
pub use messages::{LineMessage, MAX_ALT_TEXT_CHARS, MAX_MESSAGES_PER_REPLY, MAX_TEXT_CHARS};
pub use signature::{LINE_SIGNATURE_HEADER, sign_body, verify_signature};
