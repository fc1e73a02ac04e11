//! Pull request template loading and body comparison.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use sentinel_core::SentinelError;

static UNPROCESSED_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("tag regex is valid"));

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace regex is valid"));

/// Read the PR template at `path`, or an empty string when there is none.
///
/// # Errors
///
/// Returns [`SentinelError::TemplateValidation`] if the template contains
/// angle-bracket tag syntax (e.g. leftover `<!-- -->` or `<placeholder>`),
/// or [`SentinelError::Io`] if it exists but cannot be read.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use sentinel_review::template::load_template;
///
/// let template = load_template(Path::new(".github/pull_request_template.md")).unwrap();
/// ```
pub fn load_template(path: &Path) -> Result<String, SentinelError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no PR template");
        return Ok(String::new());
    }
    let content = std::fs::read_to_string(path)?;
    validate_template(&content)?;
    Ok(content)
}

/// Reject templates that still contain tag syntax.
///
/// # Errors
///
/// Returns [`SentinelError::TemplateValidation`] naming the first tag found.
///
/// # Examples
///
/// ```
/// use sentinel_review::template::validate_template;
///
/// assert!(validate_template("## Goal\n\n## Changes").is_ok());
/// assert!(validate_template("## Goal\n<describe here>").is_err());
/// ```
pub fn validate_template(content: &str) -> Result<(), SentinelError> {
    match UNPROCESSED_TAG.find(content) {
        Some(tag) => Err(SentinelError::TemplateValidation(format!(
            "contains unprocessed tag {}",
            tag.as_str()
        ))),
        None => Ok(()),
    }
}

/// Collapse whitespace runs to one space, trim, lowercase.
///
/// # Examples
///
/// ```
/// use sentinel_review::template::normalize;
///
/// assert_eq!(normalize("  ## Goal\r\n\n  Fill  ME "), "## goal fill me");
/// ```
pub fn normalize(text: &str) -> String {
    WHITESPACE.replace_all(text, " ").trim().to_lowercase()
}

/// Whether `body` carries no information of its own: empty after
/// normalization, or equal to a non-empty `template`.
///
/// # Examples
///
/// ```
/// use sentinel_review::template::needs_fill_in;
///
/// assert!(needs_fill_in("   ", "## Goal"));
/// assert!(needs_fill_in("## goal", "## Goal\n"));
/// assert!(!needs_fill_in("Adds caching", "## Goal"));
/// assert!(!needs_fill_in("Adds caching", ""));
/// ```
pub fn needs_fill_in(body: &str, template: &str) -> bool {
    let body = normalize(body);
    if body.is_empty() {
        return true;
    }
    let template = normalize(template);
    !template.is_empty() && body == template
}
