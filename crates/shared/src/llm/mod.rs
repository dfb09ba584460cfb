pub mod gateway;
pub mod gemini;
pub mod prompts;

pub use gateway::{
    LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmRequest, LlmResponse, LlmTokenUsage,
};
pub use gemini::{GeminiConfigError, GeminiGateway, GeminiGatewayConfig, GeminiModelRoute};
