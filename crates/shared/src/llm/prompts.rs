use crate::models::{ConversationRole, ConversationTurn};

use super::gateway::LlmRequest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Chat,
    Summary,
    IntentClassification,
}

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub kind: PromptKind,
    pub system_prompt: &'static str,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

pub fn template_for(kind: PromptKind) -> PromptTemplate {
    let (system_prompt, max_output_tokens, temperature) = match kind {
        PromptKind::Chat => (
            "你是一個友善的 LINE 聊天機器人，熟悉音樂、天氣與日常話題。請一律使用繁體中文回答，語氣自然、簡潔，回覆不超過 300 字。",
            1024,
            0.7,
        ),
        PromptKind::Summary => (
            "你是對話摘要助手。請以繁體中文，用條列方式整理以下對話的重點，最多五點，不要加入對話中沒有的內容。",
            512,
            0.2,
        ),
        PromptKind::IntentClassification => (
            "你是訊息分類器。請判斷使用者訊息屬於哪一類，只回覆一個英文字母，不要有其他文字。\n\
             A: 連接 Spotify 帳號\n\
             B: 推薦歌曲\n\
             C: 搜尋歌曲\n\
             D: 查看歌單\n\
             E: 查詢天氣\n\
             F: 查詢地震\n\
             G: 清空對話紀錄\n\
             H: 摘要對話\n\
             I: 使用說明\n\
             J: 一般聊天",
            4,
            0.0,
        ),
    };

    PromptTemplate {
        kind,
        system_prompt,
        max_output_tokens,
        temperature,
    }
}

impl PromptTemplate {
    fn request(&self, turns: Vec<ConversationTurn>) -> LlmRequest {
        LlmRequest::new(turns)
            .with_system_prompt(self.system_prompt)
            .with_max_output_tokens(self.max_output_tokens)
            .with_temperature(self.temperature)
    }
}

/// Continues a stored conversation; the history must end with the new user
/// turn. Leading model turns left over from trimming are dropped so the
/// request opens with the user.
pub fn chat_request(history: &[ConversationTurn]) -> LlmRequest {
    let turns = history
        .iter()
        .skip_while(|turn| turn.role == ConversationRole::Model)
        .cloned()
        .collect();
    template_for(PromptKind::Chat).request(turns)
}

/// Renders the history as one transcript so the model summarizes it instead
/// of continuing it.
pub fn summary_request(history: &[ConversationTurn]) -> LlmRequest {
    let transcript = history
        .iter()
        .map(|turn| {
            let speaker = match turn.role {
                ConversationRole::User => "使用者",
                ConversationRole::Model => "機器人",
            };
            format!("{speaker}：{}", turn.text)
        })
        .collect::<Vec<_>>()
        .join("\n");

    template_for(PromptKind::Summary).request(vec![ConversationTurn::user(transcript)])
}

pub fn intent_request(text: &str) -> LlmRequest {
    template_for(PromptKind::IntentClassification).request(vec![ConversationTurn::user(text)])
}
