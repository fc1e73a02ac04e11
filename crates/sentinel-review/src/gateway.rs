//! Two-level provider fallback for chat completions.
//!
//! The primary provider is tried once with its single model. If that fails
//! and the fallback provider has credentials, its models are tried strictly
//! in configured order, one request each, and the first non-empty answer
//! wins. Fallback failures are logged and skipped; only when every model has
//! failed does the gateway give up.

use sentinel_core::{ChatMessage, EnvSnapshot, SentinelConfig, SentinelError};

use crate::llm::LlmClient;

/// A provider client paired with the models to try on it.
pub struct ProviderRoute {
    client: LlmClient,
    models: Vec<String>,
}

impl ProviderRoute {
    /// Route `models` through `client`.
    pub fn new(client: LlmClient, models: Vec<String>) -> Self {
        Self { client, models }
    }

    /// Provider name.
    pub fn provider(&self) -> &str {
        self.client.provider()
    }

    /// Models in priority order.
    pub fn models(&self) -> &[String] {
        &self.models
    }
}

/// The model that produced a completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    /// Text returned by the model.
    pub text: String,
    /// Provider that answered.
    pub provider: String,
    /// Model that answered.
    pub model: String,
}

/// Orchestrates the primary provider and the optional fallback provider.
pub struct LlmGateway {
    primary: ProviderRoute,
    fallback: Option<ProviderRoute>,
}

impl LlmGateway {
    /// Assemble a gateway from explicit routes.
    ///
    /// Only the first model of `primary` is used.
    pub fn new(primary: ProviderRoute, fallback: Option<ProviderRoute>) -> Self {
        Self { primary, fallback }
    }

    /// Build the gateway from configuration and the environment snapshot.
    ///
    /// The primary key is required. The fallback route is only created when
    /// its key variable is set; otherwise a primary failure is final.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::MissingEnv`] if the primary key is not set.
    pub fn from_config(config: &SentinelConfig, env: &EnvSnapshot) -> Result<Self, SentinelError> {
        let primary_key = env.require(&config.primary.api_key_env)?;
        let primary = ProviderRoute::new(
            LlmClient::new(&config.primary, primary_key, &config.http)?,
            config.primary.models.clone(),
        );

        let fallback = match env.get(&config.fallback.api_key_env) {
            Some(key) => Some(ProviderRoute::new(
                LlmClient::new(&config.fallback, key, &config.http)?,
                config.fallback.models.clone(),
            )),
            None => None,
        };

        Ok(Self::new(primary, fallback))
    }

    /// Whether a fallback provider is configured.
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Get a completion, falling back across providers and models.
    ///
    /// # Errors
    ///
    /// - the primary's own error, unchanged, when the primary fails and no
    ///   fallback is configured
    /// - [`SentinelError::AllProvidersFailed`] when the primary and every
    ///   fallback model failed
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<Completion, SentinelError> {
        let primary_err = match self.try_primary(messages).await {
            Ok(completion) => return Ok(completion),
            Err(e) => e,
        };
        tracing::warn!(
            provider = self.primary.provider(),
            error = %primary_err,
            "primary provider failed"
        );

        let Some(fallback) = &self.fallback else {
            return Err(primary_err);
        };

        let mut attempted = Vec::with_capacity(fallback.models.len());
        for model in &fallback.models {
            attempted.push(model.clone());
            match fallback.client.chat(model, messages).await {
                Ok(text) => {
                    tracing::info!(
                        provider = fallback.provider(),
                        model = %model,
                        "fallback model answered"
                    );
                    return Ok(Completion {
                        text,
                        provider: fallback.provider().to_string(),
                        model: model.clone(),
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        provider = fallback.provider(),
                        model = %model,
                        error = %e,
                        "fallback model failed"
                    );
                }
            }
        }

        Err(SentinelError::AllProvidersFailed { attempted })
    }

    async fn try_primary(&self, messages: &[ChatMessage]) -> Result<Completion, SentinelError> {
        let model = self.primary.models.first().ok_or_else(|| {
            SentinelError::Config(format!(
                "provider '{}' has no models configured",
                self.primary.provider()
            ))
        })?;
        let text = self.primary.client.chat(model, messages).await?;
        tracing::debug!(provider = self.primary.provider(), model = %model, "primary provider answered");
        Ok(Completion {
            text,
            provider: self.primary.provider().to_string(),
            model: model.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sentinel_core::{HttpConfig, ProviderConfig};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn route(name: &str, server: &MockServer, models: &[&str]) -> ProviderRoute {
        let config = ProviderConfig {
            name: name.into(),
            base_url: server.uri(),
            api_key_env: "UNUSED".into(),
            models: models.iter().map(|m| m.to_string()).collect(),
        };
        let client = LlmClient::new(&config, "key", &HttpConfig::default()).unwrap();
        ProviderRoute::new(client, config.models)
    }

    fn completion(text: &str) -> serde_json::Value {
        serde_json::json!({ "choices": [{ "message": { "content": text } }] })
    }

    async fn respond_for_model(server: &MockServer, model: &str, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(serde_json::json!({ "model": model })))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }

    fn messages() -> Vec<ChatMessage> {
        vec![ChatMessage::system("sys"), ChatMessage::user("diff")]
    }

    #[tokio::test]
    async fn primary_success_skips_fallback() {
        let primary = MockServer::start().await;
        let fallback = MockServer::start().await;
        respond_for_model(&primary, "p", ResponseTemplate::new(200).set_body_json(completion("ok"))).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("never")))
            .expect(0)
            .mount(&fallback)
            .await;

        let gateway = LlmGateway::new(
            route("primary", &primary, &["p"]),
            Some(route("fallback", &fallback, &["a"])),
        );
        let out = gateway.complete(&messages()).await.unwrap();
        assert_eq!(out.text, "ok");
        assert_eq!(out.provider, "primary");
        assert_eq!(out.model, "p");
    }

    #[tokio::test]
    async fn third_fallback_model_wins_after_two_failures() {
        let primary = MockServer::start().await;
        let fallback = MockServer::start().await;
        respond_for_model(&primary, "p", ResponseTemplate::new(500)).await;
        respond_for_model(&fallback, "A", ResponseTemplate::new(503)).await;
        respond_for_model(
            &fallback,
            "B",
            ResponseTemplate::new(200).set_body_json(completion("")),
        )
        .await;
        respond_for_model(&fallback, "C", ResponseTemplate::new(200).set_body_json(completion("from C"))).await;

        let gateway = LlmGateway::new(
            route("primary", &primary, &["p"]),
            Some(route("fallback", &fallback, &["A", "B", "C"])),
        );
        let out = gateway.complete(&messages()).await.unwrap();
        assert_eq!(out.text, "from C");
        assert_eq!(out.model, "C");
    }

    #[tokio::test]
    async fn first_fallback_success_short_circuits() {
        let primary = MockServer::start().await;
        let fallback = MockServer::start().await;
        respond_for_model(&primary, "p", ResponseTemplate::new(401)).await;
        respond_for_model(&fallback, "A", ResponseTemplate::new(200).set_body_json(completion("from A"))).await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "model": "B" })))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&fallback)
            .await;

        let gateway = LlmGateway::new(
            route("primary", &primary, &["p"]),
            Some(route("fallback", &fallback, &["A", "B"])),
        );
        assert_eq!(gateway.complete(&messages()).await.unwrap().text, "from A");
    }

    #[tokio::test]
    async fn no_fallback_returns_primary_error_unchanged() {
        let primary = MockServer::start().await;
        respond_for_model(&primary, "p", ResponseTemplate::new(502).set_body_string("bad gateway")).await;

        let gateway = LlmGateway::new(route("primary", &primary, &["p"]), None);
        let err = gateway.complete(&messages()).await.unwrap_err();
        match err {
            SentinelError::Provider { provider, message } => {
                assert_eq!(provider, "primary");
                assert!(message.contains("502"));
                assert!(message.contains("bad gateway"));
            }
            other => panic!("expected the primary provider error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn every_model_failing_is_all_providers_failed() {
        let primary = MockServer::start().await;
        let fallback = MockServer::start().await;
        respond_for_model(&primary, "p", ResponseTemplate::new(500)).await;
        for model in ["A", "B", "C"] {
            respond_for_model(&fallback, model, ResponseTemplate::new(500)).await;
        }

        let gateway = LlmGateway::new(
            route("primary", &primary, &["p"]),
            Some(route("fallback", &fallback, &["A", "B", "C"])),
        );
        let err = gateway.complete(&messages()).await.unwrap_err();
        match err {
            SentinelError::AllProvidersFailed { attempted } => {
                assert_eq!(attempted, vec!["A", "B", "C"]);
            }
            other => panic!("expected AllProvidersFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn primary_uses_only_its_first_model() {
        let primary = MockServer::start().await;
        respond_for_model(&primary, "first", ResponseTemplate::new(500)).await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "model": "second" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("no")))
            .expect(0)
            .mount(&primary)
            .await;

        let gateway = LlmGateway::new(route("primary", &primary, &["first", "second"]), None);
        assert!(gateway.complete(&messages()).await.is_err());
    }

    #[test]
    fn from_config_requires_primary_key() {
        let config = SentinelConfig::default();
        let env = EnvSnapshot::default();
        let err = LlmGateway::from_config(&config, &env).err().unwrap();
        assert!(matches!(err, SentinelError::MissingEnv { ref name } if name == "OPENROUTER_API_KEY"));
    }

    #[test]
    fn from_config_adds_fallback_only_with_key() {
        let config = SentinelConfig::default();
        let without = EnvSnapshot::from_pairs([("OPENROUTER_API_KEY", "k")]);
        assert!(!LlmGateway::from_config(&config, &without).unwrap().has_fallback());

        let with = EnvSnapshot::from_pairs([("OPENROUTER_API_KEY", "k"), ("TOGETHER_API_KEY", "t")]);
        assert!(LlmGateway::from_config(&config, &with).unwrap().has_fallback());
    }
}
