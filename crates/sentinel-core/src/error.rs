use std::path::PathBuf;

/// Errors that can occur across the Sentinel workflows.
///
/// Variants follow the failure taxonomy of a run so callers can match on the
/// kind of failure instead of on message text. Library crates use this type
/// directly; the binary renders it through `miette` at the boundary.
///
/// # Examples
///
/// ```
/// use sentinel_core::SentinelError;
///
/// let err = SentinelError::MissingEnv { name: "GITHUB_TOKEN".into() };
/// assert!(err.to_string().contains("GITHUB_TOKEN"));
/// assert!(err.is_configuration());
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum SentinelError {
    /// A required environment variable is absent or empty.
    #[error("missing required environment variable: {name}")]
    #[diagnostic(
        code(sentinel::config::missing_env),
        help("export {name}=... in the CI job environment")
    )]
    MissingEnv {
        /// Name of the first missing variable.
        name: String,
    },

    /// Invalid configuration value.
    #[error("configuration error: {0}")]
    #[diagnostic(code(sentinel::config::invalid))]
    Config(String),

    /// An LLM provider returned a non-success status or an unusable body.
    #[error("{provider} request failed: {message}")]
    #[diagnostic(code(sentinel::llm::provider))]
    Provider {
        /// Provider name, e.g. `openrouter`.
        provider: String,
        /// Status line or parse failure detail.
        message: String,
    },

    /// The primary provider and every fallback model failed.
    #[error("all LLM providers failed ({} fallback models tried)", attempted.len())]
    #[diagnostic(
        code(sentinel::llm::exhausted),
        help("check provider status pages and API key quotas")
    )]
    AllProvidersFailed {
        /// Fallback model identifiers tried, in order.
        attempted: Vec<String>,
    },

    /// The pull request template contains unprocessed tag syntax.
    #[error("invalid PR template: {0}")]
    #[diagnostic(code(sentinel::template::invalid))]
    TemplateValidation(String),

    /// A branch name failed the `^[A-Za-z0-9_-]+$` allow-list.
    #[error("invalid branch name: {0:?}")]
    #[diagnostic(
        code(sentinel::git::branch),
        help("branch names may only contain letters, digits, '_' and '-'")
    )]
    InvalidBranchName(String),

    /// Git command failure.
    #[error("git error: {0}")]
    #[diagnostic(code(sentinel::git::command))]
    Git(String),

    /// Source-hosting platform API failure.
    #[error("GitHub API error: {0}")]
    #[diagnostic(code(sentinel::platform))]
    Platform(String),

    /// An operation kept failing after every retry attempt.
    #[error("{description} failed after {attempts} attempts: {source}")]
    #[diagnostic(code(sentinel::retry::exhausted))]
    Retry {
        /// What was being attempted, e.g. `post review`.
        description: String,
        /// Number of attempts made.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        source: Box<SentinelError>,
    },

    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    #[diagnostic(code(sentinel::io))]
    Io(#[from] std::io::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    #[diagnostic(code(sentinel::config::toml))]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    #[diagnostic(code(sentinel::io::not_found))]
    FileNotFound(PathBuf),
}

impl SentinelError {
    /// Whether this error is a fatal configuration problem that no retry can fix.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_core::SentinelError;
    ///
    /// assert!(SentinelError::InvalidBranchName("a/b".into()).is_configuration());
    /// assert!(!SentinelError::Platform("502".into()).is_configuration());
    /// ```
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            SentinelError::MissingEnv { .. }
                | SentinelError::Config(_)
                | SentinelError::TemplateValidation(_)
                | SentinelError::InvalidBranchName(_)
                | SentinelError::Toml(_)
        )
    }

    /// Shorthand for a [`SentinelError::Provider`] error.
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        SentinelError::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
