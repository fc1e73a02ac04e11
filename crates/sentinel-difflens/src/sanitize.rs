//! Best-effort redaction of secret-shaped text before a diff leaves the process.
//!
//! The patterns are heuristics. They catch common credential shapes and
//! deliberately over-redact long opaque tokens (hashes, UUID-like identifiers),
//! but they are not a security boundary: callers must not rely on them to
//! guarantee that no secret ever reaches a third-party API.

use std::sync::LazyLock;

use regex::Regex;

/// Replacement text for every redacted span.
pub const REDACTION_MARKER: &str = "[REDACTED]";

/// A named redaction rule.
///
/// Assignment rules capture the `name=` prefix as `keep` so only the value
/// is replaced and the reviewer still sees which setting changed.
#[derive(Debug, Clone, Copy)]
pub struct SecretPattern {
    /// Identifier used in logs and tests.
    pub name: &'static str,
    /// Regular expression source.
    pub pattern: &'static str,
    /// Replacement template in `regex` syntax.
    pub replacement: &'static str,
}

/// Redaction rules, applied in this order, each over the previous output.
pub const SECRET_PATTERNS: [SecretPattern; 5] = [
    SecretPattern {
        name: "key_assignment",
        pattern: r#"(?i)(?P<keep>(?:access|api|secret|token|key)[_-]?key["']?\s*[:=]\s*['"]?)[^"']+"#,
        replacement: "${keep}[REDACTED]",
    },
    SecretPattern {
        name: "password_assignment",
        pattern: r#"(?i)(?P<keep>(?:password|pwd|secret|token)=['"]?)[^"']+"#,
        replacement: "${keep}[REDACTED]",
    },
    SecretPattern {
        name: "opaque_token",
        pattern: r"[A-Za-z0-9_-]{24,}",
        replacement: REDACTION_MARKER,
    },
    SecretPattern {
        name: "private_key_block",
        pattern: r"(?i)-----BEGIN.*PRIVATE KEY-----[\s\S]*?-----END.*PRIVATE KEY-----",
        replacement: REDACTION_MARKER,
    },
    // A block whose END line was cut off by truncation. Everything up to the
    // end of the text goes, except a trailing truncation marker.
    SecretPattern {
        name: "unterminated_private_key",
        pattern: r"(?i)-----BEGIN[^\n]*PRIVATE KEY-----[\s\S]*?(?P<tail>(?:\.\.\. \[TRUNCATED\])?\z)",
        replacement: "[REDACTED]${tail}",
    },
];

static COMPILED: LazyLock<Vec<(SecretPattern, Regex)>> = LazyLock::new(|| {
    SECRET_PATTERNS
        .iter()
        .map(|p| {
            let re = Regex::new(p.pattern).expect("secret patterns are valid regexes");
            (*p, re)
        })
        .collect()
});

/// Replace likely secrets in `text` with [`REDACTION_MARKER`].
///
/// Total and pure. Running it twice is safe; the second pass only replaces
/// whatever the first pass left matching.
///
/// # Examples
///
/// ```
/// use sentinel_difflens::sanitize::sanitize;
///
/// let out = sanitize("+API_KEY = \"sk-live-123\"");
/// assert!(out.contains("[REDACTED]"));
/// assert!(!out.contains("sk-live-123"));
/// ```
pub fn sanitize(text: &str) -> String {
    let mut out = text.to_string();
    for (rule, re) in COMPILED.iter() {
        if re.is_match(&out) {
            tracing::debug!(pattern = rule.name, "redacting secret-shaped text");
            out = re.replace_all(&out, rule.replacement).into_owned();
        }
    }
    out
}
