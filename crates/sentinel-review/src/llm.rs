use std::time::Duration;

use sentinel_core::{ChatMessage, HttpConfig, ProviderConfig, SentinelError};

/// OpenAI-compatible chat completions client for one provider.
///
/// Works with any provider that exposes `{base_url}/chat/completions`:
/// OpenRouter, Together, vLLM, LiteLLM, etc. One request is one attempt;
/// retrying across models is the gateway's job.
///
/// # Examples
///
/// ```
/// use sentinel_core::{HttpConfig, ProviderConfig};
/// use sentinel_review::llm::LlmClient;
///
/// let client = LlmClient::new(&ProviderConfig::primary(), "test-key", &HttpConfig::default()).unwrap();
/// assert_eq!(client.provider(), "openrouter");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    name: String,
    base_url: String,
    api_key: String,
}

impl LlmClient {
    /// Create a client for `provider`, authenticating with `api_key`.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Provider`] if the HTTP client cannot be built.
    pub fn new(
        provider: &ProviderConfig,
        api_key: &str,
        http: &HttpConfig,
    ) -> Result<Self, SentinelError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(http.timeout_secs))
            .build()
            .map_err(|e| {
                SentinelError::provider(&provider.name, format!("failed to create HTTP client: {e}"))
            })?;
        Ok(Self {
            client,
            name: provider.name.clone(),
            base_url: provider.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    /// Provider name from the configuration.
    pub fn provider(&self) -> &str {
        &self.name
    }

    /// Send a chat completion request for `model` and return the text response.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Provider`] on transport errors, non-2xx
    /// statuses, unparseable bodies, or a missing/empty
    /// `choices[0].message.content`.
    pub async fn chat(&self, model: &str, messages: &[ChatMessage]) -> Result<String, SentinelError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": model,
            "messages": messages,
        });

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SentinelError::provider(&self.name, format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(SentinelError::provider(
                &self.name,
                format!("{status}: {}", body_text.trim()),
            ));
        }

        let response_body: serde_json::Value = response.json().await.map_err(|e| {
            SentinelError::provider(&self.name, format!("failed to parse response: {e}"))
        })?;

        extract_content(&response_body)
            .map(str::to_string)
            .ok_or_else(|| {
                SentinelError::provider(
                    &self.name,
                    format!("response has no message content: {response_body}"),
                )
            })
    }
}

/// Pull `choices[0].message.content` out of a completion body.
///
/// Empty strings count as missing.
///
/// # Examples
///
/// ```
/// use sentinel_review::llm::extract_content;
///
/// let body = serde_json::json!({"choices": [{"message": {"content": "hi"}}]});
/// assert_eq!(extract_content(&body), Some("hi"));
/// assert_eq!(extract_content(&serde_json::json!({"choices": []})), None);
/// ```
pub fn extract_content(body: &serde_json::Value) -> Option<&str> {
    body.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .filter(|s| !s.is_empty())
}
