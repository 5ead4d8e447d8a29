//! Text-analysis collaborator
//!
//! Turns raw sentence text into scored word tokens for records the provider
//! did not pre-tokenize. Real deployments can plug in a proper NLP pipeline;
//! the bundled analyzer only splits punctuation and counts syllables.

use crate::models::RawWord;

pub trait TextAnalyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Vec<RawWord>;
}

pub const WORD_TAG: &str = "Word";
pub const PUNCTUATION_TAG: &str = "Punctuation";

/// Splits on whitespace, emits each punctuation mark as its own token and
/// scores words by syllable count.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl TextAnalyzer for HeuristicAnalyzer {
    fn analyze(&self, text: &str) -> Vec<RawWord> {
        let mut tokens = Vec::new();
        let mut current = String::new();

        let chars: Vec<char> = text.chars().collect();
        for (i, &c) in chars.iter().enumerate() {
            let inner_joiner = (c == '\'' || c == '-')
                && !current.is_empty()
                && chars.get(i + 1).is_some_and(|next| next.is_alphanumeric());

            if c.is_alphanumeric() || inner_joiner {
                current.push(c);
                continue;
            }

            flush_word(&mut current, &mut tokens);
            if !c.is_whitespace() {
                tokens.push(RawWord {
                    token: c.to_string(),
                    tag: PUNCTUATION_TAG.to_string(),
                    lemma: c.to_string(),
                    difficulty_score: 0.0,
                });
            }
        }
        flush_word(&mut current, &mut tokens);

        tokens
    }
}

fn flush_word(current: &mut String, tokens: &mut Vec<RawWord>) {
    if current.is_empty() {
        return;
    }
    let word = std::mem::take(current);
    tokens.push(RawWord {
        lemma: word.to_lowercase(),
        difficulty_score: f64::from(count_syllables(&word)),
        tag: WORD_TAG.to_string(),
        token: word,
    });
}

/// Vowel-group count with a silent trailing `e`. Never less than 1.
pub fn count_syllables(word: &str) -> u32 {
    let lower = word.to_lowercase();
    let mut count = 0u32;
    let mut previous_vowel = false;

    for c in lower.chars() {
        let vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if vowel && !previous_vowel {
            count += 1;
        }
        previous_vowel = vowel;
    }

    if count > 1 && lower.ends_with('e') && !lower.ends_with("le") && !lower.ends_with("ee") {
        count -= 1;
    }

    count.max(1)
}
