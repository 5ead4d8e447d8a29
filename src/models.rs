//! Data models and structures
//!
//! Defines the sentence records served by the data provider, the per-puzzle
//! word and puzzle structures mutated during play, and runtime configuration.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A neighbouring sentence from the same paragraph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelatedSentence {
    #[serde(alias = "sentence", alias = "current_sentence", default)]
    pub text: String,
    #[serde(alias = "total_score")]
    pub score: f64,
}

/// Word as delivered by the provider or the text analyzer, before a puzzle
/// assigns ids and play flags.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawWord {
    pub token: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub lemma: String,
    #[serde(alias = "score")]
    pub difficulty_score: f64,
}

/// Candidate sentence. Accepts both camelCase and the snake_case shape the
/// sentence server emits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SentenceRecord {
    pub id: i64,
    #[serde(alias = "current_sentence", alias = "sentence", default)]
    pub text: String,
    #[serde(default)]
    pub words: Vec<RawWord>,
    #[serde(alias = "total_score")]
    pub total_score: f64,
    #[serde(alias = "prev_sentences", default)]
    pub prev_sentences: Vec<RelatedSentence>,
    #[serde(alias = "next_sentences", default)]
    pub next_sentences: Vec<RelatedSentence>,
}

impl SentenceRecord {
    /// Reject records the engine cannot turn into a puzzle.
    pub fn check_shape(&self) -> Result<()> {
        if self.words.is_empty() && self.text.trim().is_empty() {
            return Err(Error::StaleData(format!(
                "sentence {} has neither words nor text",
                self.id
            )));
        }
        if !self.total_score.is_finite() {
            return Err(Error::StaleData(format!(
                "sentence {} has a non-finite score",
                self.id
            )));
        }
        if let Some(word) = self
            .words
            .iter()
            .find(|w| w.token.is_empty() || !w.difficulty_score.is_finite())
        {
            return Err(Error::StaleData(format!(
                "sentence {} has a malformed word {:?}",
                self.id, word.token
            )));
        }
        if self
            .prev_sentences
            .iter()
            .chain(self.next_sentences.iter())
            .any(|s| !s.score.is_finite())
        {
            return Err(Error::StaleData(format!(
                "sentence {} has a malformed related sentence",
                self.id
            )));
        }
        Ok(())
    }

    /// Sentence text, rebuilt from the tokens when the provider sent none.
    pub fn display_text(&self) -> String {
        if self.text.trim().is_empty() {
            self.words
                .iter()
                .map(|w| w.token.as_str())
                .collect::<Vec<_>>()
                .join(" ")
        } else {
            self.text.clone()
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RelatedSentences {
    pub prev: Vec<RelatedSentence>,
    pub next: Vec<RelatedSentence>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Word {
    pub id: u32,
    pub token: String,
    pub tag: String,
    pub lemma: String,
    pub difficulty_score: f64,
    pub locked: bool,
    pub selected: bool,
    pub connection_left: Option<String>,
    pub connection_right: Option<String>,
}

impl Word {
    pub fn from_raw(id: u32, raw: &RawWord) -> Self {
        Self {
            id,
            token: raw.token.clone(),
            tag: raw.tag.clone(),
            lemma: raw.lemma.clone(),
            difficulty_score: raw.difficulty_score,
            locked: false,
            selected: false,
            connection_left: None,
            connection_right: None,
        }
    }
}

/// One live sentence instance.
///
/// `scrambled_words` is always a permutation of `original_words` by id. Play
/// flags (lock, selection, connections) only live on the scrambled entries.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Puzzle {
    pub(crate) id: u32,
    pub(crate) text: String,
    pub(crate) original_words: Vec<Word>,
    pub(crate) scrambled_words: Vec<Word>,
    pub(crate) total_score: f64,
    pub(crate) related: RelatedSentences,
}

impl Puzzle {
    pub(crate) fn new(
        id: u32,
        text: String,
        original_words: Vec<Word>,
        scrambled_words: Vec<Word>,
        total_score: f64,
        related: RelatedSentences,
    ) -> Self {
        Self {
            id,
            text,
            original_words,
            scrambled_words,
            total_score,
            related,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn original_words(&self) -> &[Word] {
        &self.original_words
    }

    pub fn scrambled_words(&self) -> &[Word] {
        &self.scrambled_words
    }

    pub fn total_score(&self) -> f64 {
        self.total_score
    }

    pub fn related(&self) -> &RelatedSentences {
        &self.related
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Ask the provider for a score band each level.
    Range,
    /// Fetch the whole corpus once and build the level ladder up front.
    Batch,
}

impl FromStr for SelectionStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "range" => Ok(SelectionStrategy::Range),
            "batch" => Ok(SelectionStrategy::Batch),
            other => Err(Error::Config(format!(
                "SELECTION_STRATEGY must be 'range' or 'batch', got '{}'",
                other
            ))),
        }
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub sentence_api_url: String,
    pub gemini_api_key: Option<String>,
    pub translation_model: String,
    pub translation_language: String,
    pub selection_strategy: SelectionStrategy,
    pub max_word_score: f64,
    pub charge_translation_on_failure: bool,
    pub notification_clear_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sentence_api_url: "http://localhost:3000".to_string(),
            gemini_api_key: None,
            translation_model: "gemini-1.5-flash".to_string(),
            translation_language: "French".to_string(),
            selection_strategy: SelectionStrategy::Range,
            max_word_score: 3.0,
            charge_translation_on_failure: true,
            notification_clear_ms: 500,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            sentence_api_url: std::env::var("SENTENCE_API_URL")
                .unwrap_or(defaults.sentence_api_url),
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            translation_model: std::env::var("TRANSLATION_MODEL")
                .unwrap_or(defaults.translation_model),
            translation_language: std::env::var("TRANSLATION_LANGUAGE")
                .unwrap_or(defaults.translation_language),
            selection_strategy: parse_env("SELECTION_STRATEGY", defaults.selection_strategy)?,
            max_word_score: parse_env("MAX_WORD_SCORE", defaults.max_word_score)?,
            charge_translation_on_failure: parse_env(
                "CHARGE_TRANSLATION_ON_FAILURE",
                defaults.charge_translation_on_failure,
            )?,
            notification_clear_ms: parse_env(
                "NOTIFICATION_CLEAR_MS",
                defaults.notification_clear_ms,
            )?,
        })
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("{} is invalid: {}", name, e))),
        Err(_) => Ok(default),
    }
}
