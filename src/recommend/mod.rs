//! Recommendation generator boundary.
//!
//! A completed answer bag plus a section tag goes in; advisory text (or a
//! typed failure the dispatcher renders as visible text) comes out.

pub mod groq;
pub mod prompt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RecommendError;
use crate::flow::answers::AnswerBag;

pub use groq::GroqProvider;

/// Which report the generator is asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    Quick,
    Deep,
    DeepFull,
    Goal,
}

impl std::fmt::Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Quick => "quick",
            Self::Deep => "deep",
            Self::DeepFull => "deep_full",
            Self::Goal => "goal",
        };
        write!(f, "{s}")
    }
}

/// The external recommendation generator.
#[async_trait]
pub trait RecommendationProvider: Send + Sync {
    /// Build a request from the answer bag and return recommendation text.
    ///
    /// Any transport or provider failure surfaces as a [`RecommendError`]
    /// with a human-readable message — never a hang.
    async fn recommend(
        &self,
        answers: &AnswerBag,
        section: Section,
    ) -> Result<String, RecommendError>;
}
