//! Groq-backed recommendation provider (OpenAI-compatible chat completions).

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};

use crate::error::RecommendError;
use crate::flow::answers::AnswerBag;

use super::{prompt, RecommendationProvider, Section};

const GROQ_API_BASE: &str = "https://api.groq.com/openai/v1";
const MAX_TOKENS: u32 = 2048;

/// HTTP client for the Groq chat-completions endpoint.
pub struct GroqProvider {
    api_key: SecretString,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GroqProvider {
    /// Build a provider with a per-request timeout. A request that exceeds
    /// it fails as a [`RecommendError`]; it never hangs the dispatcher.
    pub fn new(
        api_key: SecretString,
        model: String,
        timeout: Duration,
    ) -> Result<Self, RecommendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RecommendError::RequestFailed {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            api_key,
            model,
            base_url: GROQ_API_BASE.to_string(),
            client,
        })
    }

    /// Point the provider at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl RecommendationProvider for GroqProvider {
    async fn recommend(
        &self,
        answers: &AnswerBag,
        section: Section,
    ) -> Result<String, RecommendError> {
        let user_prompt = prompt::build_user_prompt(answers, section);
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "messages": [
                {"role": "system", "content": prompt::SYSTEM_PROMPT},
                {"role": "user", "content": user_prompt},
            ],
        });

        tracing::debug!(%section, model = %self.model, "requesting recommendation");

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| RecommendError::RequestFailed {
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            let status = resp.status();
            let err_body = resp.text().await.unwrap_or_default();
            return Err(RecommendError::RequestFailed {
                reason: format!("{status}: {err_body}"),
            });
        }

        let data: serde_json::Value =
            resp.json()
                .await
                .map_err(|e| RecommendError::InvalidResponse {
                    reason: e.to_string(),
                })?;

        let content = data
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| RecommendError::InvalidResponse {
                reason: "missing choices[0].message.content".to_string(),
            })?;

        tracing::info!(%section, chars = content.len(), "recommendation received");
        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> GroqProvider {
        GroqProvider::new(
            SecretString::from("test-key"),
            "test-model".to_string(),
            Duration::from_secs(2),
        )
        .unwrap()
    }

    #[test]
    fn provider_constructs_with_any_key() {
        // Auth failures happen at request time, not construction.
        let p = provider();
        assert_eq!(p.base_url, GROQ_API_BASE);
    }

    #[test]
    fn base_url_override() {
        let p = provider().with_base_url("http://127.0.0.1:9");
        assert_eq!(p.base_url, "http://127.0.0.1:9");
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_typed_failure_not_a_hang() {
        let p = provider().with_base_url("http://127.0.0.1:9");
        let result = p.recommend(&AnswerBag::new(), Section::Quick).await;

        match result {
            Err(RecommendError::RequestFailed { reason }) => {
                assert!(!reason.is_empty());
            }
            other => panic!("expected RequestFailed, got {other:?}"),
        }
    }
}
