use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SentinelError;

/// Role in a chat conversation.
///
/// # Examples
///
/// ```
/// use sentinel_core::Role;
///
/// let role = Role::System;
/// assert_eq!(serde_json::to_string(&role).unwrap(), "\"system\"");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-level instructions.
    System,
    /// User input.
    User,
}

/// A message in a chat conversation with an LLM provider.
///
/// An ordered slice of messages forms the conversation sent to a provider.
///
/// # Examples
///
/// ```
/// use sentinel_core::{ChatMessage, Role};
///
/// let msg = ChatMessage::user("Review this diff");
/// assert_eq!(msg.role, Role::User);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender.
    pub role: Role,
    /// Text content of the message.
    pub content: String,
}

impl ChatMessage {
    /// A system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// A user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// The event attached to a posted pull-request review.
///
/// # Examples
///
/// ```
/// use sentinel_core::ReviewEvent;
///
/// assert_eq!(ReviewEvent::from_approval(true), ReviewEvent::Approve);
/// assert_eq!(ReviewEvent::RequestChanges.as_str(), "REQUEST_CHANGES");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewEvent {
    /// Approve the pull request.
    Approve,
    /// Block the pull request until changes are made.
    RequestChanges,
}

impl ReviewEvent {
    /// Map an approve/reject decision to a review event.
    pub fn from_approval(approve: bool) -> Self {
        if approve {
            ReviewEvent::Approve
        } else {
            ReviewEvent::RequestChanges
        }
    }

    /// The GitHub API spelling of this event.
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewEvent::Approve => "APPROVE",
            ReviewEvent::RequestChanges => "REQUEST_CHANGES",
        }
    }
}

impl fmt::Display for ReviewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Execution mode, controlling how much error detail reaches stderr.
///
/// # Examples
///
/// ```
/// use sentinel_core::RunMode;
///
/// assert_eq!(RunMode::from_env_value(Some("production")), RunMode::Production);
/// assert_eq!(RunMode::from_env_value(None), RunMode::Development);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Print only the top-level error message.
    Production,
    /// Print the full diagnostic with its cause chain.
    #[default]
    Development,
}

impl RunMode {
    /// Interpret the value of the mode variable. Only `production` selects
    /// production mode.
    pub fn from_env_value(value: Option<&str>) -> Self {
        match value {
            Some(v) if v.trim().eq_ignore_ascii_case("production") => RunMode::Production,
            _ => RunMode::Development,
        }
    }
}

/// Language of the prompts and of the risk vocabulary the model answers in.
///
/// # Examples
///
/// ```
/// use sentinel_core::Language;
///
/// let lang: Language = "en".parse().unwrap();
/// assert_eq!(lang, Language::English);
/// assert_eq!(Language::default(), Language::Portuguese);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    /// Brazilian Portuguese.
    #[default]
    #[serde(rename = "pt-br")]
    Portuguese,
    /// English.
    #[serde(rename = "en")]
    English,
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pt-br" | "pt" | "portuguese" => Ok(Language::Portuguese),
            "en" | "english" => Ok(Language::English),
            _ => Err(format!("unknown language: {s} (expected pt-br or en)")),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Portuguese => write!(f, "pt-br"),
            Language::English => write!(f, "en"),
        }
    }
}

/// A repository identified as `owner/repo`.
///
/// # Examples
///
/// ```
/// use sentinel_core::RepoSlug;
///
/// let slug: RepoSlug = "octocat/hello-world".parse().unwrap();
/// assert_eq!(slug.owner, "octocat");
/// assert_eq!(slug.repo, "hello-world");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    /// Account or organization.
    pub owner: String,
    /// Repository name.
    pub repo: String,
}

impl FromStr for RepoSlug {
    type Err = SentinelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid =
            || SentinelError::Config(format!("invalid repository '{s}', expected owner/repo"));
        let (owner, repo) = s.trim().split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_string(),
            repo: repo.to_string(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Parse a pull request number.
///
/// # Errors
///
/// Returns [`SentinelError::Config`] if `value` is not a positive integer.
///
/// # Examples
///
/// ```
/// use sentinel_core::parse_pr_number;
///
/// assert_eq!(parse_pr_number("42").unwrap(), 42);
/// assert!(parse_pr_number("abc").is_err());
/// ```
pub fn parse_pr_number(value: &str) -> Result<u64, SentinelError> {
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SentinelError::Config(format!("invalid PR number: {value}"))),
    }
}
