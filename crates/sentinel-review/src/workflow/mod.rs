//! The two CI workflows: risk-gated review and PR explanation.
//!
//! Both share one shape: validate the environment, read and prepare the
//! diff, ask the [`LlmGateway`](crate::gateway::LlmGateway) for a completion,
//! and write the result back to the pull request through a
//! [`PullRequestHost`](crate::github::PullRequestHost) with retries.

pub mod explain;
pub mod review;

use std::path::Path;

use sentinel_core::{EnvSnapshot, SentinelConfig, SentinelError};
use sentinel_difflens::collect::{BoundedDiff, BranchName, DiffSource};

use crate::gateway::LlmGateway;
use crate::github::PullRequestHost;
use crate::retry::RetryPolicy;

pub use explain::{run_explain, ExplainOutcome};
pub use review::{run_review, ReviewOutcome};

/// Everything a workflow run talks to.
///
/// Borrowed for the duration of one run; the binary builds the real clients,
/// tests hand in fakes.
pub struct Workflow<'a> {
    /// Loaded configuration.
    pub config: &'a SentinelConfig,
    /// Environment captured at startup.
    pub env: &'a EnvSnapshot,
    /// Provider fallback chain.
    pub gateway: &'a LlmGateway,
    /// Pull request reads and write-backs.
    pub host: &'a dyn PullRequestHost,
    /// Where the diff comes from.
    pub diffs: &'a dyn DiffSource,
    /// Checkout root; relative paths such as the PR template resolve here.
    pub repo_root: &'a Path,
}

impl Workflow<'_> {
    /// Variables every workflow needs before it touches the network.
    pub fn required_vars(config: &SentinelConfig) -> Vec<String> {
        vec![
            config.primary.api_key_env.clone(),
            sentinel_core::env::GITHUB_TOKEN.to_string(),
        ]
    }

    fn validate_env(&self) -> Result<(), SentinelError> {
        self.env.validate(&Self::required_vars(self.config))
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.config.retry)
    }

    /// Read the diff against the base branch, then bound and redact it.
    fn prepared_diff(&self, default_limit: usize) -> Result<BoundedDiff, SentinelError> {
        let base = BranchName::parse(self.env.default_branch())?;
        let raw = self.diffs.diff_against(&base)?;
        let limit = self.env.max_diff_size(default_limit);
        Ok(sentinel_difflens::prepare_diff(&raw, limit))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use sentinel_core::{HttpConfig, ProviderConfig, RepoSlug, ReviewEvent, SentinelError};
    use sentinel_difflens::collect::{BranchName, DiffSource};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::gateway::{LlmGateway, ProviderRoute};
    use crate::github::{PullRequestHost, PullRequestInfo};
    use crate::llm::LlmClient;

    /// Recorded platform call.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        UpdateBody(u64, String),
        Comment(u64, String),
        Review(u64, ReviewEvent, String),
    }

    /// In-memory host that records writes and can fail the first N of them.
    #[derive(Default)]
    pub struct FakeHost {
        pub pr: PullRequestInfo,
        pub calls: Mutex<Vec<Call>>,
        pub failures_left: Mutex<u32>,
    }

    impl FakeHost {
        pub fn with_pr(title: &str, body: &str) -> Self {
            Self {
                pr: PullRequestInfo {
                    title: title.into(),
                    body: body.into(),
                },
                ..Self::default()
            }
        }

        pub fn failing(mut self, writes: u32) -> Self {
            self.failures_left = Mutex::new(writes);
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: Call) -> Result<(), SentinelError> {
            let mut left = self.failures_left.lock().unwrap();
            if *left > 0 {
                *left -= 1;
                return Err(SentinelError::Platform("502 Bad Gateway".into()));
            }
            self.calls.lock().unwrap().push(call);
            Ok(())
        }
    }

    #[async_trait]
    impl PullRequestHost for FakeHost {
        async fn get_pull_request(
            &self,
            _repo: &RepoSlug,
            _number: u64,
        ) -> Result<PullRequestInfo, SentinelError> {
            Ok(self.pr.clone())
        }

        async fn update_body(
            &self,
            _repo: &RepoSlug,
            number: u64,
            body: &str,
        ) -> Result<(), SentinelError> {
            self.record(Call::UpdateBody(number, body.into()))
        }

        async fn create_comment(
            &self,
            _repo: &RepoSlug,
            number: u64,
            body: &str,
        ) -> Result<(), SentinelError> {
            self.record(Call::Comment(number, body.into()))
        }

        async fn create_review(
            &self,
            _repo: &RepoSlug,
            number: u64,
            event: ReviewEvent,
            body: &str,
        ) -> Result<(), SentinelError> {
            self.record(Call::Review(number, event, body.into()))
        }
    }

    /// Diff source returning a fixed text and remembering the base it saw.
    #[derive(Default)]
    pub struct StaticDiff {
        pub text: String,
        pub seen_base: Mutex<Option<String>>,
    }

    impl StaticDiff {
        pub fn new(text: &str) -> Self {
            Self {
                text: text.into(),
                ..Self::default()
            }
        }
    }

    impl DiffSource for StaticDiff {
        fn diff_against(&self, base: &BranchName) -> Result<String, SentinelError> {
            *self.seen_base.lock().unwrap() = Some(base.to_string());
            Ok(self.text.clone())
        }
    }

    /// Gateway whose only provider always answers `text`.
    pub async fn answering(server: &MockServer, text: &str) -> LlmGateway {
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": text } }]
            })))
            .mount(server)
            .await;
        let config = ProviderConfig {
            name: "mock".into(),
            base_url: server.uri(),
            api_key_env: "MOCK_KEY".into(),
            models: vec!["mock-model".into()],
        };
        let client = LlmClient::new(&config, "key", &HttpConfig::default()).unwrap();
        LlmGateway::new(ProviderRoute::new(client, config.models), None)
    }

    /// Configuration with millisecond retry delays.
    pub fn fast_config() -> sentinel_core::SentinelConfig {
        let mut config = sentinel_core::SentinelConfig::default();
        config.retry.base_delay_ms = 1;
        config
    }
}
