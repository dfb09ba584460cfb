use serde::Serialize;
use serde_json::Value;

pub const MAX_TEXT_CHARS: usize = 5000;
pub const MAX_ALT_TEXT_CHARS: usize = 400;
pub const MAX_MESSAGES_PER_REPLY: usize = 5;

const TRUNCATION_MARKER: char = '…';

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum LineMessage {
    Text {
        text: String,
    },
    Image {
        original_content_url: String,
        preview_image_url: String,
    },
    Flex {
        alt_text: String,
        contents: Value,
    },
}

impl LineMessage {
    /// Text message clipped to the platform's per-message limit.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text {
            text: truncate_chars(text.into(), MAX_TEXT_CHARS),
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        let url = url.into();
        Self::Image {
            original_content_url: url.clone(),
            preview_image_url: url,
        }
    }

    pub fn flex(alt_text: impl Into<String>, contents: Value) -> Self {
        Self::Flex {
            alt_text: truncate_chars(alt_text.into(), MAX_ALT_TEXT_CHARS),
            contents,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            _ => None,
        }
    }
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }

    let mut truncated = text.chars().take(max_chars - 1).collect::<String>();
    truncated.push(TRUNCATION_MARKER);
    truncated
}
