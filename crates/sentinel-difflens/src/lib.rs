//! Diff collection, size bounding, and secret redaction.
//!
//! A diff moves through three steps before it reaches a model: it is read
//! from git against a validated base branch ([`collect`]), cut to a maximum
//! length, and scrubbed of secret-shaped text ([`sanitize`]).

pub mod collect;
pub mod sanitize;

use collect::BoundedDiff;

/// Bound `diff` to `max_chars` characters, then redact it.
///
/// Truncation happens first so the marker is never split by a redaction and
/// the size limit applies to the original text.
///
/// # Examples
///
/// ```
/// use sentinel_difflens::prepare_diff;
///
/// let out = prepare_diff("+password=hunter2\n", 1000);
/// assert!(!out.text.contains("hunter2"));
/// assert!(!out.truncated);
/// ```
pub fn prepare_diff(diff: &str, max_chars: usize) -> BoundedDiff {
    let mut bounded = BoundedDiff::new(diff, max_chars);
    bounded.text = sanitize::sanitize(&bounded.text);
    bounded
}
