use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tokio::time::sleep;
use tracing::warn;

use crate::config::ConfigError;
use crate::config_env::{
    optional_trimmed_env, parse_http_url_env, parse_u32_env, parse_u64_env, require_env,
};

use super::gateway::{
    LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmRequest, LlmResponse, LlmTokenUsage,
};

const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_MS: u64 = 15_000;
const DEFAULT_MAX_RETRIES: u32 = 1;
const DEFAULT_RETRY_BASE_BACKOFF_MS: u64 = 250;

const DEFAULT_PRIMARY_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_FALLBACK_MODEL: &str = "gemini-1.5-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Clone)]
pub struct GeminiModelRoute {
    pub primary_model: String,
    pub fallback_model: Option<String>,
}

impl GeminiModelRoute {
    fn candidate_models(&self) -> Vec<&str> {
        let mut candidates = Vec::new();
        if !self.primary_model.is_empty() {
            candidates.push(self.primary_model.as_str());
        }

        if let Some(fallback_model) = self.fallback_model.as_deref()
            && !fallback_model.is_empty()
            && fallback_model != self.primary_model
        {
            candidates.push(fallback_model);
        }

        candidates
    }
}

#[derive(Debug, Clone)]
pub struct GeminiGatewayConfig {
    pub api_base_url: String,
    pub api_key: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_backoff_ms: u64,
    pub model_route: GeminiModelRoute,
}

impl GeminiGatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_http_url_env("GEMINI_API_BASE_URL", DEFAULT_API_BASE_URL)?,
            api_key: require_env("GEMINI_API_KEY")?,
            timeout_ms: parse_u64_env("GEMINI_TIMEOUT_MS", DEFAULT_TIMEOUT_MS)?,
            max_retries: parse_u32_env("GEMINI_MAX_RETRIES", DEFAULT_MAX_RETRIES)?,
            retry_base_backoff_ms: parse_u64_env(
                "GEMINI_RETRY_BASE_BACKOFF_MS",
                DEFAULT_RETRY_BASE_BACKOFF_MS,
            )?,
            model_route: GeminiModelRoute {
                primary_model: optional_trimmed_env("GEMINI_MODEL_PRIMARY")
                    .unwrap_or_else(|| DEFAULT_PRIMARY_MODEL.to_string()),
                fallback_model: optional_trimmed_env("GEMINI_MODEL_FALLBACK")
                    .or_else(|| Some(DEFAULT_FALLBACK_MODEL.to_string())),
            },
        })
    }
}

#[derive(Debug, Error)]
pub enum GeminiConfigError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build Gemini http client: {0}")]
    HttpClient(String),
}

#[derive(Clone)]
pub struct GeminiGateway {
    client: reqwest::Client,
    config: GeminiGatewayConfig,
}

impl GeminiGateway {
    pub fn new(config: GeminiGatewayConfig) -> Result<Self, GeminiConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|err| GeminiConfigError::HttpClient(err.to_string()))?;

        Ok(Self { client, config })
    }

    async fn generate_for_model(
        &self,
        model: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, ModelAttemptError> {
        let mut attempt = 0_u32;

        loop {
            match self.send_once(model, request).await {
                Ok(response) => return Ok(response),
                Err(err) => {
                    if err.retryable && attempt < self.config.max_retries {
                        let backoff_multiplier = 2_u64.saturating_pow(attempt);
                        let backoff_ms = self
                            .config
                            .retry_base_backoff_ms
                            .saturating_mul(backoff_multiplier);
                        warn!(
                            model,
                            attempt,
                            backoff_ms,
                            error = %err.error,
                            "retrying gemini request"
                        );
                        sleep(Duration::from_millis(backoff_ms)).await;
                        attempt = attempt.saturating_add(1);
                        continue;
                    }

                    return Err(ModelAttemptError {
                        error: err.error,
                        fallback_allowed: err.fallback_allowed,
                    });
                }
            }
        }
    }

    async fn send_once(
        &self,
        model: &str,
        request: &LlmRequest,
    ) -> Result<LlmResponse, SendAttemptError> {
        let url = format!(
            "{}/models/{model}:generateContent",
            self.config.api_base_url.trim_end_matches('/')
        );

        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&request_body(request))
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    SendAttemptError::retryable(LlmGatewayError::Timeout, true)
                } else {
                    SendAttemptError::retryable(
                        LlmGatewayError::ProviderFailure("request_unavailable".to_string()),
                        true,
                    )
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|_| {
            SendAttemptError::non_retryable(
                LlmGatewayError::InvalidProviderPayload("response_body_read_failed".to_string()),
                true,
            )
        })?;

        if !status.is_success() {
            let provider_status = parse_provider_error_status(&body);
            let fallback_allowed =
                status != StatusCode::UNAUTHORIZED && status != StatusCode::FORBIDDEN;
            return Err(SendAttemptError {
                error: LlmGatewayError::ProviderFailure(format!(
                    "status={} code={provider_status}",
                    status.as_u16()
                )),
                retryable: is_retryable_status(status),
                fallback_allowed,
            });
        }

        let parsed: GeminiSuccessResponse = serde_json::from_str(&body).map_err(|_| {
            SendAttemptError::non_retryable(
                LlmGatewayError::InvalidProviderPayload("response_json_parse_failed".to_string()),
                true,
            )
        })?;

        let candidate = parsed.candidates.first().ok_or_else(|| {
            SendAttemptError::non_retryable(
                LlmGatewayError::InvalidProviderPayload("missing_candidate".to_string()),
                true,
            )
        })?;

        let text = candidate
            .content
            .as_ref()
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(SendAttemptError::non_retryable(
                LlmGatewayError::InvalidProviderPayload("empty_candidate_text".to_string()),
                true,
            ));
        }

        Ok(LlmResponse {
            model: parsed.model_version.unwrap_or_else(|| model.to_string()),
            text: text.trim().to_string(),
            usage: parsed.usage_metadata.map(|usage| LlmTokenUsage {
                prompt_tokens: clamp_u64_to_u32(usage.prompt_token_count.unwrap_or(0)),
                completion_tokens: clamp_u64_to_u32(usage.candidates_token_count.unwrap_or(0)),
                total_tokens: clamp_u64_to_u32(usage.total_token_count.unwrap_or(0)),
            }),
        })
    }
}

impl LlmGateway for GeminiGateway {
    fn generate<'a>(&'a self, request: LlmRequest) -> LlmGatewayFuture<'a> {
        Box::pin(async move {
            let candidate_models = self.config.model_route.candidate_models();

            for (index, model) in candidate_models.iter().enumerate() {
                match self.generate_for_model(model, &request).await {
                    Ok(response) => return Ok(response),
                    Err(model_err) => {
                        let has_more_candidates = index + 1 < candidate_models.len();
                        if has_more_candidates && model_err.fallback_allowed {
                            warn!(
                                model,
                                error = %model_err.error,
                                "falling back to next gemini model"
                            );
                            continue;
                        }
                        return Err(model_err.error);
                    }
                }
            }

            Err(LlmGatewayError::ProviderFailure(
                "no_gemini_model_candidates".to_string(),
            ))
        })
    }
}

fn request_body(request: &LlmRequest) -> Value {
    let contents = request
        .turns
        .iter()
        .map(|turn| {
            json!({
                "role": turn.role.as_str(),
                "parts": [{ "text": turn.text }],
            })
        })
        .collect::<Vec<_>>();

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "maxOutputTokens": request.max_output_tokens,
            "temperature": request.temperature,
        },
    });

    if let Some(system_prompt) = request.system_prompt.as_deref() {
        body["systemInstruction"] = json!({ "parts": [{ "text": system_prompt }] });
    }

    body
}

#[derive(Debug)]
struct SendAttemptError {
    error: LlmGatewayError,
    retryable: bool,
    fallback_allowed: bool,
}

impl SendAttemptError {
    fn retryable(error: LlmGatewayError, fallback_allowed: bool) -> Self {
        Self {
            error,
            retryable: true,
            fallback_allowed,
        }
    }

    fn non_retryable(error: LlmGatewayError, fallback_allowed: bool) -> Self {
        Self {
            error,
            retryable: false,
            fallback_allowed,
        }
    }
}

#[derive(Debug)]
struct ModelAttemptError {
    error: LlmGatewayError,
    fallback_allowed: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiSuccessResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    model_version: Option<String>,
    usage_metadata: Option<GeminiUsage>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
    total_token_count: Option<u64>,
}

fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::REQUEST_TIMEOUT
            | StatusCode::TOO_MANY_REQUESTS
            | StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}

fn parse_provider_error_status(body: &str) -> String {
    #[derive(Deserialize)]
    struct ProviderErrorEnvelope {
        error: Option<ProviderErrorDetails>,
    }

    #[derive(Deserialize)]
    struct ProviderErrorDetails {
        status: Option<String>,
    }

    serde_json::from_str::<ProviderErrorEnvelope>(body)
        .ok()
        .and_then(|envelope| envelope.error)
        .and_then(|details| details.status)
        .unwrap_or_else(|| "unknown".to_string())
}

fn clamp_u64_to_u32(value: u64) -> u32 {
    value.min(u32::MAX as u64) as u32
}
