//! Core types, configuration, and error handling for Sentinel.
//!
//! This crate provides the shared foundation used by the other crates:
//! - [`SentinelError`]: error taxonomy using `thiserror` and `miette`
//! - [`SentinelConfig`]: configuration loaded from `.sentinel.toml`
//! - [`EnvSnapshot`]: the captured process environment and its validator
//! - Shared types: [`ChatMessage`], [`Role`], [`ReviewEvent`], [`RunMode`],
//!   [`Language`], [`RepoSlug`]

mod config;
pub mod env;
mod error;
mod types;

pub use config::{
    ExplainConfig, HttpConfig, ProviderConfig, RetryConfig, ReviewConfig, SentinelConfig,
    CONFIG_FILE_NAME,
};
pub use env::EnvSnapshot;
pub use error::SentinelError;
pub use types::{parse_pr_number, ChatMessage, Language, RepoSlug, ReviewEvent, Role, RunMode};

/// A convenience `Result` type for Sentinel operations.
pub type Result<T> = std::result::Result<T, SentinelError>;
