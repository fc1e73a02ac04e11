//! Collecting and bounding the diff that is sent to the model.

use std::fmt;
use std::path::PathBuf;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use sentinel_core::SentinelError;

/// Appended to a diff that was cut at the size limit.
pub const TRUNCATION_MARKER: &str = "... [TRUNCATED]";

static BRANCH_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("branch regex is valid"));

/// A branch name that passed the allow-list and is safe to interpolate into
/// a `git` argument.
///
/// # Examples
///
/// ```
/// use sentinel_difflens::collect::BranchName;
///
/// assert!(BranchName::parse("release-2024_q1").is_ok());
/// assert!(BranchName::parse("main;rm -rf /").is_err());
/// assert!(BranchName::parse("../etc").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName(String);

impl BranchName {
    /// Validate `name` against `^[A-Za-z0-9_-]+$`.
    ///
    /// # Errors
    ///
    /// Returns [`SentinelError::InvalidBranchName`] for anything else,
    /// including the empty string, slashes, dots, and whitespace.
    pub fn parse(name: &str) -> Result<Self, SentinelError> {
        if BRANCH_NAME.is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(SentinelError::InvalidBranchName(name.to_string()))
        }
    }

    /// The validated name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The three-dot revision range `origin/<branch>...HEAD`.
    pub fn merge_base_range(&self) -> String {
        format!("origin/{}...HEAD", self.0)
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Something that can produce the unified diff of the current change.
pub trait DiffSource {
    /// Diff between `base` and the current state.
    ///
    /// # Errors
    ///
    /// Implementations return [`SentinelError::Git`] when the diff cannot
    /// be produced.
    fn diff_against(&self, base: &BranchName) -> Result<String, SentinelError>;
}

/// Reads the diff by running `git diff origin/<base>...HEAD` in a checkout.
#[derive(Debug, Clone)]
pub struct GitDiff {
    repo_root: PathBuf,
}

impl GitDiff {
    /// A diff source rooted at `repo_root`.
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }
}

impl DiffSource for GitDiff {
    fn diff_against(&self, base: &BranchName) -> Result<String, SentinelError> {
        let range = base.merge_base_range();
        // Arguments are passed as a vector, never through a shell.
        let output = Command::new("git")
            .arg("-C")
            .arg(&self.repo_root)
            .args(["diff", &range])
            .output()
            .map_err(|e| SentinelError::Git(format!("failed to run git diff {range}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SentinelError::Git(format!(
                "git diff {range} failed: {}",
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// A diff bounded to a maximum number of characters.
///
/// Truncation is one-way: the cut text is dropped and the marker appended.
///
/// # Examples
///
/// ```
/// use sentinel_difflens::collect::{BoundedDiff, TRUNCATION_MARKER};
///
/// let diff = BoundedDiff::new("abcdef", 4);
/// assert!(diff.truncated);
/// assert_eq!(diff.text, format!("abcd{TRUNCATION_MARKER}"));
///
/// let short = BoundedDiff::new("abc", 4);
/// assert!(!short.truncated);
/// assert_eq!(short.text, "abc");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedDiff {
    /// The kept prefix, plus [`TRUNCATION_MARKER`] when cut.
    pub text: String,
    /// Whether the original exceeded the limit.
    pub truncated: bool,
    /// Length of the original diff in characters.
    pub original_chars: usize,
}

impl BoundedDiff {
    /// Keep at most `max_chars` characters of `diff`.
    ///
    /// Lengths are counted in `char`s so a cut never lands inside a
    /// multi-byte character.
    pub fn new(diff: &str, max_chars: usize) -> Self {
        let original_chars = diff.chars().count();
        if original_chars <= max_chars {
            return Self {
                text: diff.to_string(),
                truncated: false,
                original_chars,
            };
        }

        let cut = diff
            .char_indices()
            .nth(max_chars)
            .map_or(diff.len(), |(idx, _)| idx);
        tracing::info!(
            limit = max_chars,
            original = original_chars,
            "diff truncated"
        );
        Self {
            text: format!("{}{TRUNCATION_MARKER}", &diff[..cut]),
            truncated: true,
            original_chars,
        }
    }
}
