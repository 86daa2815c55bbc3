//! # DIPTO Copywriter
//!
//! Drafts catalog item descriptions with a hosted text-generation model.
//! The collaborator is called once per request, never retried, and every
//! failure is returned to the operator as a [`CopyError`].

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

mod error;
pub mod gemini;
pub mod prompt;

pub use error::{CopyError, CopyResult};
pub use gemini::{GeminiConfig, GeminiWriter, DEFAULT_GEMINI_ENDPOINT, DEFAULT_GEMINI_MODEL};
pub use prompt::description_prompt;

use async_trait::async_trait;

/// Produces a short marketing description for a catalog item.
#[async_trait]
pub trait DescriptionWriter: Send + Sync {
    async fn describe(&self, title: &str, category: &str) -> CopyResult<String>;
}
