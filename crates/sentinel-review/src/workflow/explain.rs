use sentinel_core::env::PR_NUMBER;
use sentinel_core::SentinelError;
use serde::Serialize;

use crate::prompt::{self, ExplainInput};
use crate::template;

use super::Workflow;

/// What an explain run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExplainOutcome {
    /// The body was empty or the bare template; it was replaced with a
    /// fill-in outline and no model was called.
    FillInRequested {
        /// Pull request that was updated.
        number: u64,
    },
    /// An explanation was generated and posted as a comment.
    Explained {
        /// Pull request that was commented on.
        number: u64,
        /// Model output, without the comment header.
        explanation: String,
        /// Model identifier.
        model: String,
    },
}

/// Explain the pull request named by `PR_NUMBER`, or ask its author to
/// fill in the description first.
///
/// # Errors
///
/// - [`SentinelError::MissingEnv`] if a required variable or `PR_NUMBER` is
///   absent
/// - [`SentinelError::TemplateValidation`] if the template has tag syntax
/// - any gateway error when every provider failed
/// - [`SentinelError::Retry`] when a write-back kept failing
pub async fn run_explain(flow: &Workflow<'_>) -> Result<ExplainOutcome, SentinelError> {
    flow.validate_env()?;
    let repo = flow.env.repository()?;
    let number = flow.env.pr_number()?.ok_or_else(|| SentinelError::MissingEnv {
        name: PR_NUMBER.to_string(),
    })?;

    let pr = flow.host.get_pull_request(&repo, number).await?;
    let template = template::load_template(&flow.repo_root.join(&flow.config.explain.template_path))?;
    let language = flow.config.explain.language;
    let policy = flow.retry_policy();

    if template::needs_fill_in(&pr.body, &template) {
        policy
            .run("update PR body", || {
                flow.host.update_body(&repo, number, prompt::fill_in_body(language))
            })
            .await?;
        policy
            .run("comment on PR", || {
                flow.host.create_comment(&repo, number, prompt::fill_in_comment(language))
            })
            .await?;
        tracing::info!(pr = number, "PR body had no content, fill-in outline posted");
        return Ok(ExplainOutcome::FillInRequested { number });
    }

    let diff = flow.prepared_diff(flow.config.explain.max_diff_size)?;
    let input = ExplainInput {
        title: &pr.title,
        body: &pr.body,
        template: &template,
        diff: &diff.text,
    };
    let completion = flow
        .gateway
        .complete(&prompt::explain_messages(&input, language))
        .await?;

    let comment = prompt::explanation_comment(&completion.text, language);
    policy
        .run("post explanation", || {
            flow.host.create_comment(&repo, number, &comment)
        })
        .await?;
    tracing::info!(pr = number, model = %completion.model, "explanation posted");

    Ok(ExplainOutcome::Explained {
        number,
        explanation: completion.text,
        model: completion.model,
    })
}
