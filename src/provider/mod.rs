//! Sentence data provider
//!
//! Fetches candidate sentences, with per-word scores and neighbouring
//! sentences, from the sentence server.

pub mod client;
pub mod mock;

pub use client::HttpSentenceProvider;
pub use mock::MockSentenceProvider;

use crate::models::SentenceRecord;
use crate::Result;
use async_trait::async_trait;

/// Filter sent with a fetch. Unset bounds mean "whole corpus".
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SentenceQuery {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub max_word_score: Option<f64>,
}

impl SentenceQuery {
    pub fn range(min: f64, max: f64, max_word_score: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            max_word_score: Some(max_word_score),
        }
    }

    pub fn corpus(max_word_score: f64) -> Self {
        Self {
            min: None,
            max: None,
            max_word_score: Some(max_word_score),
        }
    }

    /// Query-string pairs for the set bounds.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        [
            ("min", self.min),
            ("max", self.max),
            ("max_word_score", self.max_word_score),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name, v.to_string())))
        .collect()
    }
}

#[async_trait]
pub trait SentenceProvider: Send + Sync {
    async fn fetch_sentences(&self, query: &SentenceQuery) -> Result<Vec<SentenceRecord>>;
}
