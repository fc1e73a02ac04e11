use sentinel_core::{ReviewEvent, SentinelError};
use serde::Serialize;

use crate::decision::RiskClassifier;
use crate::prompt;

use super::Workflow;

/// What a review run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    /// Review text as returned by the model.
    pub review: String,
    /// Decision derived from the review text.
    pub event: ReviewEvent,
    /// Provider that wrote the review.
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Whether the diff was cut before review.
    pub diff_truncated: bool,
    /// Pull request the review was posted on, `None` when `PR_NUMBER` is unset.
    pub posted_to: Option<u64>,
}

/// Review the current change and post an approve/request-changes review.
///
/// When `PR_NUMBER` is not set the review is still produced and returned,
/// but nothing is posted.
///
/// # Errors
///
/// - [`SentinelError::MissingEnv`] if a required variable is absent
/// - [`SentinelError::InvalidBranchName`] if `DEFAULT_BRANCH` is unsafe
/// - any gateway error when every provider failed
/// - [`SentinelError::Retry`] when posting the review kept failing
pub async fn run_review(flow: &Workflow<'_>) -> Result<ReviewOutcome, SentinelError> {
    flow.validate_env()?;

    let diff = flow.prepared_diff(flow.config.review.max_diff_size)?;
    let language = flow.config.review.language;
    let messages = prompt::review_messages(&diff.text, language);
    let completion = flow.gateway.complete(&messages).await?;

    let event = RiskClassifier::new(language).decide(&completion.text);
    tracing::info!(
        provider = %completion.provider,
        model = %completion.model,
        decision = %event,
        "review generated"
    );

    let posted_to = match flow.env.pr_number()? {
        Some(number) => {
            let repo = flow.env.repository()?;
            let body = completion.text.as_str();
            flow.retry_policy()
                .run("post review", || {
                    flow.host.create_review(&repo, number, event, body)
                })
                .await?;
            tracing::info!(pr = number, decision = %event, "review posted");
            Some(number)
        }
        None => {
            tracing::info!("PR_NUMBER not set, review not posted");
            None
        }
    };

    Ok(ReviewOutcome {
        review: completion.text,
        event,
        provider: completion.provider,
        model: completion.model,
        diff_truncated: diff.truncated,
        posted_to,
    })
}
