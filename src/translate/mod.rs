//! Translation collaborator behind the `translate` hint
//!
//! Sends the full sentence to Gemini's `generateContent` endpoint and returns
//! the translated text.

pub mod client;
pub mod mock;
pub mod types;

pub use client::GeminiTranslationClient;
pub use mock::MockTranslationClient;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TranslationService: Send + Sync {
    async fn translate(&self, sentence: &str, language: &str) -> Result<String>;
}
