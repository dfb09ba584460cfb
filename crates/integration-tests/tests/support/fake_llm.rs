#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use shared::llm::{LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmRequest, LlmResponse};

/// Answers every request with a fixed text and keeps the requests it saw.
#[derive(Clone)]
pub struct FakeLlm {
    answer: Option<String>,
    requests: Arc<Mutex<Vec<LlmRequest>>>,
}

impl FakeLlm {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Some(answer.to_string()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests
            .lock()
            .expect("llm request log should lock")
            .clone()
    }
}

impl LlmGateway for FakeLlm {
    fn generate<'a>(&'a self, request: LlmRequest) -> LlmGatewayFuture<'a> {
        Box::pin(async move {
            self.requests
                .lock()
                .expect("llm request log should lock")
                .push(request);

            match &self.answer {
                Some(text) => Ok(LlmResponse {
                    model: "fake-model".to_string(),
                    text: text.clone(),
                    usage: None,
                }),
                None => Err(LlmGatewayError::ProviderFailure("fake outage".to_string())),
            }
        })
    }
}
