use std::collections::HashMap;

use crate::error::SentinelError;
use crate::types::{parse_pr_number, RepoSlug, RunMode};

/// GitHub API token.
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
/// Base branch the diff is taken against.
pub const DEFAULT_BRANCH: &str = "DEFAULT_BRANCH";
/// Override for the workflow's maximum diff length.
pub const MAX_DIFF_SIZE: &str = "MAX_DIFF_SIZE";
/// Repository in `owner/repo` form.
pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
/// Pull request number.
pub const PR_NUMBER: &str = "PR_NUMBER";
/// Execution mode (`production` hides error detail).
pub const SENTINEL_ENV: &str = "SENTINEL_ENV";
/// Consulted for the execution mode when `SENTINEL_ENV` is unset.
pub const NODE_ENV: &str = "NODE_ENV";
/// REST API root, set by GitHub Actions (differs on GitHub Enterprise).
pub const GITHUB_API_URL: &str = "GITHUB_API_URL";

/// Immutable snapshot of the process environment.
///
/// Captured once at startup and handed to every component, so nothing reads
/// ambient process state mid-run and tests can build any environment they
/// need without touching the real one. Empty values count as unset.
///
/// # Examples
///
/// ```
/// use sentinel_core::EnvSnapshot;
///
/// let env = EnvSnapshot::from_pairs([("A", "1"), ("B", "")]);
/// assert_eq!(env.get("A"), Some("1"));
/// assert_eq!(env.get("B"), None);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the current process environment.
    pub fn capture() -> Self {
        Self::from_pairs(std::env::vars())
    }

    /// Build a snapshot from explicit key/value pairs.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a variable; empty values are treated as absent.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// Whether `name` has a non-empty value.
    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Check that every name in `names` has a non-empty value.
    ///
    /// Names are checked in order and the first missing one is reported.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::MissingEnv`] naming the first missing variable.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_core::{EnvSnapshot, SentinelError};
    ///
    /// let env = EnvSnapshot::from_pairs([("A", "x")]);
    /// let err = env.validate(&["A", "B"]).unwrap_err();
    /// assert!(matches!(err, SentinelError::MissingEnv { ref name } if name == "B"));
    /// ```
    pub fn validate<S: AsRef<str>>(&self, names: &[S]) -> Result<(), SentinelError> {
        for name in names {
            let name = name.as_ref();
            if !self.is_set(name) {
                return Err(SentinelError::MissingEnv {
                    name: name.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Fetch a required variable.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::MissingEnv`] if `name` is unset or empty.
    pub fn require(&self, name: &str) -> Result<&str, SentinelError> {
        self.get(name).ok_or_else(|| SentinelError::MissingEnv {
            name: name.to_string(),
        })
    }

    /// Base branch name, defaulting to `main`. Not validated here.
    pub fn default_branch(&self) -> &str {
        self.get(DEFAULT_BRANCH).unwrap_or("main")
    }

    /// Maximum diff length, or `fallback` when unset, non-numeric or not positive.
    ///
    /// # Examples
    ///
    /// ```
    /// use sentinel_core::EnvSnapshot;
    ///
    /// let env = EnvSnapshot::from_pairs([("MAX_DIFF_SIZE", "abc")]);
    /// assert_eq!(env.max_diff_size(7000), 7000);
    /// ```
    pub fn max_diff_size(&self, fallback: usize) -> usize {
        self.get(MAX_DIFF_SIZE)
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|n| *n > 0)
            .and_then(|n| usize::try_from(n).ok())
            .unwrap_or(fallback)
    }

    /// Repository slug from `GITHUB_REPOSITORY`.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::MissingEnv`] if unset, or
    /// [`SentinelError::Config`] if not in `owner/repo` form.
    pub fn repository(&self) -> Result<RepoSlug, SentinelError> {
        self.require(GITHUB_REPOSITORY)?.parse()
    }

    /// Pull request number from `PR_NUMBER`, `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::Config`] if set to a non-positive or
    /// non-numeric value.
    pub fn pr_number(&self) -> Result<Option<u64>, SentinelError> {
        self.get(PR_NUMBER).map(parse_pr_number).transpose()
    }

    /// Execution mode from `SENTINEL_ENV`, or `NODE_ENV` when that is unset.
    pub fn run_mode(&self) -> RunMode {
        RunMode::from_env_value(self.get(SENTINEL_ENV).or_else(|| self.get(NODE_ENV)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_reports_first_missing_name() {
        let env = EnvSnapshot::from_pairs([("A", "1")]);
        match env.validate(&["A", "B"]) {
            Err(SentinelError::MissingEnv { name }) => assert_eq!(name, "B"),
            other => panic!("expected MissingEnv, got {other:?}"),
        }
    }

    #[test]
    fn validate_treats_empty_as_missing() {
        let env = EnvSnapshot::from_pairs([("A", ""), ("B", "x")]);
        let err = env.validate(&["A", "B"]).unwrap_err();
        assert!(err.to_string().contains("A"));
    }

    #[test]
    fn validate_empty_list_passes() {
        let env = EnvSnapshot::default();
        let names: [&str; 0] = [];
        assert!(env.validate(&names).is_ok());
    }

    #[test]
    fn default_branch_falls_back_to_main() {
        assert_eq!(EnvSnapshot::default().default_branch(), "main");
        let env = EnvSnapshot::from_pairs([(DEFAULT_BRANCH, "develop")]);
        assert_eq!(env.default_branch(), "develop");
    }

    #[test]
    fn max_diff_size_rejects_non_positive() {
        let zero = EnvSnapshot::from_pairs([(MAX_DIFF_SIZE, "0")]);
        assert_eq!(zero.max_diff_size(5000), 5000);
        let negative = EnvSnapshot::from_pairs([(MAX_DIFF_SIZE, "-10")]);
        assert_eq!(negative.max_diff_size(5000), 5000);
        let ok = EnvSnapshot::from_pairs([(MAX_DIFF_SIZE, "1200")]);
        assert_eq!(ok.max_diff_size(5000), 1200);
    }

    #[test]
    fn pr_number_optional() {
        assert_eq!(EnvSnapshot::default().pr_number().unwrap(), None);
        let env = EnvSnapshot::from_pairs([(PR_NUMBER, "17")]);
        assert_eq!(env.pr_number().unwrap(), Some(17));
        let bad = EnvSnapshot::from_pairs([(PR_NUMBER, "x")]);
        assert!(bad.pr_number().is_err());
    }

    #[test]
    fn run_mode_falls_back_to_node_env() {
        assert_eq!(EnvSnapshot::default().run_mode(), RunMode::Development);
        let node = EnvSnapshot::from_pairs([(NODE_ENV, "production")]);
        assert_eq!(node.run_mode(), RunMode::Production);
        let both = EnvSnapshot::from_pairs([(SENTINEL_ENV, "development"), (NODE_ENV, "production")]);
        assert_eq!(both.run_mode(), RunMode::Development);
    }

    #[test]
    fn repository_requires_variable() {
        let err = EnvSnapshot::default().repository().unwrap_err();
        assert!(matches!(err, SentinelError::MissingEnv { .. }));
        let env = EnvSnapshot::from_pairs([(GITHUB_REPOSITORY, "o/r")]);
        assert_eq!(env.repository().unwrap().to_string(), "o/r");
    }
}
