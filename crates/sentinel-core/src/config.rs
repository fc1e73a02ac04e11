use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SentinelError;
use crate::types::Language;

/// Top-level configuration loaded from `.sentinel.toml`.
///
/// Every section is optional; missing keys take the defaults the CI scripts
/// have always used. Run-time inputs (tokens, PR number) come from the
/// environment snapshot, not from this file.
///
/// # Examples
///
/// ```
/// use sentinel_core::SentinelConfig;
///
/// let config = SentinelConfig::default();
/// assert_eq!(config.review.max_diff_size, 7000);
/// assert_eq!(config.explain.max_diff_size, 5000);
/// assert_eq!(config.fallback.models.len(), 3);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentinelConfig {
    /// Provider tried first, with a single model.
    #[serde(default = "ProviderConfig::primary", deserialize_with = "primary_provider")]
    pub primary: ProviderConfig,
    /// Provider tried when the primary fails, model by model.
    #[serde(default = "ProviderConfig::fallback", deserialize_with = "fallback_provider")]
    pub fallback: ProviderConfig,
    /// HTTP client settings.
    #[serde(default)]
    pub http: HttpConfig,
    /// Write-back retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Review workflow settings.
    #[serde(default)]
    pub review: ReviewConfig,
    /// Explain workflow settings.
    #[serde(default)]
    pub explain: ExplainConfig,
}

/// Keys of a `[primary]` or `[fallback]` table; absent keys keep the
/// built-in provider's value.
#[derive(Debug, Default, Deserialize)]
struct ProviderOverrides {
    name: Option<String>,
    base_url: Option<String>,
    api_key_env: Option<String>,
    models: Option<Vec<String>>,
}

impl ProviderOverrides {
    fn apply(self, base: ProviderConfig) -> ProviderConfig {
        ProviderConfig {
            name: self.name.unwrap_or(base.name),
            base_url: self.base_url.unwrap_or(base.base_url),
            api_key_env: self.api_key_env.unwrap_or(base.api_key_env),
            models: self.models.unwrap_or(base.models),
        }
    }
}

fn primary_provider<'de, D>(deserializer: D) -> Result<ProviderConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(ProviderOverrides::deserialize(deserializer)?.apply(ProviderConfig::primary()))
}

fn fallback_provider<'de, D>(deserializer: D) -> Result<ProviderConfig, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(ProviderOverrides::deserialize(deserializer)?.apply(ProviderConfig::fallback()))
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            primary: ProviderConfig::primary(),
            fallback: ProviderConfig::fallback(),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
            review: ReviewConfig::default(),
            explain: ExplainConfig::default(),
        }
    }
}

impl SentinelConfig {
    /// Load configuration from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Io`] if the file cannot be read, or
    /// [`SentinelError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, SentinelError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Toml`] if parsing fails, or
    /// [`SentinelError::Config`] if a provider has no models or a size or
    /// timeout is zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_core::SentinelConfig;
    ///
    /// let toml = r#"
    /// [review]
    /// max_diff_size = 12000
    /// "#;
    /// let config = SentinelConfig::from_toml(toml).unwrap();
    /// assert_eq!(config.review.max_diff_size, 12000);
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, SentinelError> {
        let config: Self = toml::from_str(content)?;
        config.check()?;
        Ok(config)
    }

    /// Load `explicit` if given, else `.sentinel.toml` in `dir` if present,
    /// else defaults.
    ///
    /// # Errors
    ///
    /// Propagates read and parse errors; an explicit path that does not
    /// exist yields [`SentinelError::FileNotFound`].
    pub fn discover(explicit: Option<&Path>, dir: &Path) -> Result<Self, SentinelError> {
        match explicit {
            Some(path) if !path.exists() => Err(SentinelError::FileNotFound(path.to_path_buf())),
            Some(path) => Self::from_file(path),
            None => {
                let default_path = dir.join(CONFIG_FILE_NAME);
                if default_path.exists() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn check(&self) -> Result<(), SentinelError> {
        for provider in [&self.primary, &self.fallback] {
            if provider.models.is_empty() {
                return Err(SentinelError::Config(format!(
                    "provider '{}' has no models configured",
                    provider.name
                )));
            }
        }
        let positive = [
            ("http.timeout_secs", self.http.timeout_secs),
            ("review.max_diff_size", self.review.max_diff_size as u64),
            ("explain.max_diff_size", self.explain.max_diff_size as u64),
        ];
        for (key, value) in positive {
            if value == 0 {
                return Err(SentinelError::Config(format!("{key} must be greater than 0")));
            }
        }
        Ok(())
    }
}

/// File name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".sentinel.toml";

/// An OpenAI-compatible chat completions provider.
///
/// The API key is never stored in the file; `api_key_env` names the
/// environment variable that holds it.
///
/// # Examples
///
/// ```
/// use sentinel_core::ProviderConfig;
///
/// let primary = ProviderConfig::primary();
/// assert_eq!(primary.name, "openrouter");
/// assert_eq!(primary.api_key_env, "OPENROUTER_API_KEY");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Short name used in logs and errors.
    pub name: String,
    /// Base URL; `/chat/completions` is appended.
    pub base_url: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    /// Model identifiers in priority order.
    pub models: Vec<String>,
}

impl ProviderConfig {
    /// OpenRouter with a single free model.
    pub fn primary() -> Self {
        Self {
            name: "openrouter".into(),
            base_url: "https://openrouter.ai/api/v1".into(),
            api_key_env: "OPENROUTER_API_KEY".into(),
            models: vec!["tngtech/deepseek-r1t2-chimera:free".into()],
        }
    }

    /// Together with three models, most preferred first.
    pub fn fallback() -> Self {
        Self {
            name: "together".into(),
            base_url: "https://api.together.xyz/v1".into(),
            api_key_env: "TOGETHER_API_KEY".into(),
            models: vec![
                "deepseek-ai/DeepSeek-R1-Distill-Llama-70B-free".into(),
                "deepseek-ai/DeepSeek-R1-0528".into(),
                "meta-llama/Llama-3.3-70B-Instruct-Turbo-Free".into(),
            ],
        }
    }
}

/// HTTP client settings.
///
/// # Examples
///
/// ```
/// use sentinel_core::HttpConfig;
///
/// assert_eq!(HttpConfig::default().timeout_secs, 120);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds (default: 120).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Retry policy for posting results back to the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts including the first (default: 2).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay unit; attempt `n` waits `n * base_delay_ms` (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    2
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

/// Review workflow configuration.
///
/// # Examples
///
/// ```
/// use sentinel_core::{Language, ReviewConfig};
///
/// let config = ReviewConfig::default();
/// assert_eq!(config.max_diff_size, 7000);
/// assert_eq!(config.language, Language::Portuguese);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewConfig {
    /// Diff characters kept before truncation (default: 7000).
    #[serde(default = "default_review_diff_size")]
    pub max_diff_size: usize,
    /// Prompt and risk-vocabulary language (default: `pt-br`).
    #[serde(default)]
    pub language: Language,
}

fn default_review_diff_size() -> usize {
    7000
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            max_diff_size: default_review_diff_size(),
            language: Language::default(),
        }
    }
}

/// Explain workflow configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainConfig {
    /// Diff characters kept before truncation (default: 5000).
    #[serde(default = "default_explain_diff_size")]
    pub max_diff_size: usize,
    /// Repository-relative path of the PR template.
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
    /// Prompt language (default: `pt-br`).
    #[serde(default)]
    pub language: Language,
}

fn default_explain_diff_size() -> usize {
    5000
}

fn default_template_path() -> PathBuf {
    PathBuf::from(".github/pull_request_template.md")
}

impl Default for ExplainConfig {
    fn default() -> Self {
        Self {
            max_diff_size: default_explain_diff_size(),
            template_path: default_template_path(),
            language: Language::default(),
        }
    }
}
