//! LLM-backed pull request review and explanation for Sentinel.
//!
//! - [`llm`]: OpenAI-compatible chat completion client
//! - [`gateway`]: primary provider with ordered fallback models
//! - [`retry`]: bounded linear-backoff retry for write-backs
//! - [`decision`]: approve/request-changes from review text
//! - [`prompt`] and [`template`]: prompt builders and PR template handling
//! - [`github`]: the pull request host seam and its GitHub client
//! - [`workflow`]: the review and explain runs

pub mod decision;
pub mod gateway;
pub mod github;
pub mod llm;
pub mod prompt;
pub mod retry;
pub mod template;
pub mod workflow;
