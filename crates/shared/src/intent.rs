use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use crate::llm::LlmGateway;
use crate::llm::prompts::intent_request;
use crate::weather::extract_location;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    ConnectSpotify,
    RecommendSong,
    SearchTrack { terms: String },
    Playlist,
    Weather { location: Option<String> },
    Earthquake,
    ClearHistory,
    Summary,
    Help,
    Chat,
}

impl Intent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectSpotify => "connect_spotify",
            Self::RecommendSong => "recommend_song",
            Self::SearchTrack { .. } => "search_track",
            Self::Playlist => "playlist",
            Self::Weather { .. } => "weather",
            Self::Earthquake => "earthquake",
            Self::ClearHistory => "clear_history",
            Self::Summary => "summary",
            Self::Help => "help",
            Self::Chat => "chat",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentStrategy {
    Keyword,
    Hybrid,
}

impl FromStr for IntentStrategy {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keyword" => Ok(Self::Keyword),
            "hybrid" => Ok(Self::Hybrid),
            other => Err(format!(
                "INTENT_CLASSIFIER must be one of keyword, hybrid (got '{other}')"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum KeywordAction {
    ConnectSpotify,
    RecommendSong,
    SearchTrack,
    Playlist,
    Weather,
    Earthquake,
    ClearHistory,
    Summary,
    Help,
}

/// Checked in order; the first entry with a contained keyword wins.
const KEYWORD_TABLE: &[(&[&str], KeywordAction)] = &[
    (&["連接spotify"], KeywordAction::ConnectSpotify),
    (&["推薦歌曲"], KeywordAction::RecommendSong),
    (&["搜尋", "找歌"], KeywordAction::SearchTrack),
    (&["歌單", "播放清單"], KeywordAction::Playlist),
    (&["天氣"], KeywordAction::Weather),
    (&["地震"], KeywordAction::Earthquake),
    (&["清空"], KeywordAction::ClearHistory),
    (&["摘要"], KeywordAction::Summary),
    (&["help", "說明", "指令"], KeywordAction::Help),
];

pub fn classify_keywords(text: &str) -> Option<Intent> {
    let lowered = text.to_lowercase();

    KEYWORD_TABLE.iter().find_map(|(keywords, action)| {
        let keyword = keywords.iter().find(|keyword| lowered.contains(**keyword))?;
        Some(match action {
            KeywordAction::ConnectSpotify => Intent::ConnectSpotify,
            KeywordAction::RecommendSong => Intent::RecommendSong,
            KeywordAction::SearchTrack => Intent::SearchTrack {
                terms: search_terms(text, keyword),
            },
            KeywordAction::Playlist => Intent::Playlist,
            KeywordAction::Weather => Intent::Weather {
                location: extract_location(text).map(str::to_string),
            },
            KeywordAction::Earthquake => Intent::Earthquake,
            KeywordAction::ClearHistory => Intent::ClearHistory,
            KeywordAction::Summary => Intent::Summary,
            KeywordAction::Help => Intent::Help,
        })
    })
}

/// Maps a single-letter model answer to an intent. The raw answer is stripped
/// of everything but ASCII letters and upper-cased before comparing.
pub fn parse_llm_label(raw: &str, text: &str) -> Option<Intent> {
    let label = raw
        .chars()
        .filter(char::is_ascii_alphabetic)
        .collect::<String>()
        .to_ascii_uppercase();

    let intent = match label.as_str() {
        "A" => Intent::ConnectSpotify,
        "B" => Intent::RecommendSong,
        "C" => Intent::SearchTrack {
            terms: text.trim().to_string(),
        },
        "D" => Intent::Playlist,
        "E" => Intent::Weather {
            location: extract_location(text).map(str::to_string),
        },
        "F" => Intent::Earthquake,
        "G" => Intent::ClearHistory,
        "H" => Intent::Summary,
        "I" => Intent::Help,
        "J" => Intent::Chat,
        _ => return None,
    };

    Some(intent)
}

/// Text following the matched keyword, e.g. `搜尋 周杰倫 晴天` gives `周杰倫 晴天`.
fn search_terms(text: &str, keyword: &str) -> String {
    let rest = match text.find(keyword) {
        Some(index) => &text[index + keyword.len()..],
        None => text,
    };

    rest.trim_start_matches([':', '：'])
        .trim()
        .to_string()
}

#[derive(Clone)]
pub struct IntentClassifier {
    strategy: IntentStrategy,
    llm: Option<Arc<dyn LlmGateway>>,
}

impl IntentClassifier {
    pub fn keyword() -> Self {
        Self {
            strategy: IntentStrategy::Keyword,
            llm: None,
        }
    }

    pub fn new(strategy: IntentStrategy, llm: Arc<dyn LlmGateway>) -> Self {
        Self {
            strategy,
            llm: Some(llm),
        }
    }

    /// Keyword table first; in hybrid mode unmatched text is labelled by the
    /// model. Unknown labels and gateway failures fall back to chat.
    pub async fn classify(&self, text: &str) -> Intent {
        if let Some(intent) = classify_keywords(text) {
            return intent;
        }

        let (IntentStrategy::Hybrid, Some(llm)) = (self.strategy, self.llm.as_ref()) else {
            return Intent::Chat;
        };

        match llm.generate(intent_request(text)).await {
            Ok(response) => parse_llm_label(&response.text, text).unwrap_or_else(|| {
                warn!(label = %response.text, "unrecognized intent label");
                Intent::Chat
            }),
            Err(err) => {
                warn!(error = %err, "intent classification failed");
                Intent::Chat
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::llm::{
        LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmRequest, LlmResponse,
    };

    use super::{Intent, IntentClassifier, IntentStrategy, classify_keywords, parse_llm_label};

    struct FixedLabel {
        label: Option<&'static str>,
        calls: AtomicUsize,
    }

    impl LlmGateway for FixedLabel {
        fn generate<'a>(&'a self, _request: LlmRequest) -> LlmGatewayFuture<'a> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let label = self.label;
            Box::pin(async move {
                match label {
                    Some(text) => Ok(LlmResponse {
                        model: "test".to_string(),
                        text: text.to_string(),
                        usage: None,
                    }),
                    None => Err(LlmGatewayError::Timeout),
                }
            })
        }
    }

    fn hybrid(label: Option<&'static str>) -> (IntentClassifier, Arc<FixedLabel>) {
        let gateway = Arc::new(FixedLabel {
            label,
            calls: AtomicUsize::new(0),
        });
        (
            IntentClassifier::new(IntentStrategy::Hybrid, gateway.clone()),
            gateway,
        )
    }

    #[test]
    fn keyword_table_covers_commands() {
        assert_eq!(classify_keywords("推薦歌曲"), Some(Intent::RecommendSong));
        assert_eq!(classify_keywords("清空"), Some(Intent::ClearHistory));
        assert_eq!(classify_keywords("幫我摘要一下"), Some(Intent::Summary));
        assert_eq!(classify_keywords("我要連接Spotify"), Some(Intent::ConnectSpotify));
        assert_eq!(classify_keywords("HELP"), Some(Intent::Help));
        assert_eq!(classify_keywords("地震"), Some(Intent::Earthquake));
        assert_eq!(classify_keywords("播放清單"), Some(Intent::Playlist));
        assert_eq!(classify_keywords("你好"), None);
    }

    #[test]
    fn first_matching_row_wins() {
        assert_eq!(
            classify_keywords("推薦歌曲之後清空"),
            Some(Intent::RecommendSong)
        );
    }

    #[test]
    fn search_keeps_terms_after_keyword() {
        assert_eq!(
            classify_keywords("搜尋：周杰倫 晴天"),
            Some(Intent::SearchTrack {
                terms: "周杰倫 晴天".to_string()
            })
        );
        assert_eq!(
            classify_keywords("找歌"),
            Some(Intent::SearchTrack {
                terms: String::new()
            })
        );
    }

    #[test]
    fn weather_extracts_location() {
        assert_eq!(
            classify_keywords("台中天氣"),
            Some(Intent::Weather {
                location: Some("臺中市".to_string())
            })
        );
        assert_eq!(
            classify_keywords("天氣"),
            Some(Intent::Weather { location: None })
        );
    }

    #[test]
    fn llm_label_is_stripped_and_upper_cased() {
        assert_eq!(parse_llm_label(" b.\n", "x"), Some(Intent::RecommendSong));
        assert_eq!(parse_llm_label("\"F\"", "x"), Some(Intent::Earthquake));
        assert_eq!(parse_llm_label("Z", "x"), None);
        assert_eq!(parse_llm_label("AB", "x"), None);
    }

    #[test]
    fn strategy_parses_from_env_value() {
        assert_eq!("Hybrid".parse::<IntentStrategy>(), Ok(IntentStrategy::Hybrid));
        assert!("llm-only".parse::<IntentStrategy>().is_err());
    }

    #[tokio::test]
    async fn keyword_mode_never_calls_model() {
        let intent = IntentClassifier::keyword().classify("今天過得如何").await;
        assert_eq!(intent, Intent::Chat);
    }

    #[tokio::test]
    async fn hybrid_uses_model_only_when_keywords_miss() {
        let (classifier, gateway) = hybrid(Some("E"));

        assert_eq!(classifier.classify("清空").await, Intent::ClearHistory);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);

        assert_eq!(
            classifier.classify("高雄會下雨嗎").await,
            Intent::Weather {
                location: Some("高雄市".to_string())
            }
        );
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn hybrid_falls_back_to_chat_on_unknown_label_or_failure() {
        let (classifier, _) = hybrid(Some("maybe?"));
        assert_eq!(classifier.classify("隨便聊聊").await, Intent::Chat);

        let (classifier, _) = hybrid(None);
        assert_eq!(classifier.classify("隨便聊聊").await, Intent::Chat);
    }
}
