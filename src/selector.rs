//! Sentence selection and puzzle materialization
//!
//! Picks the next sentence from a candidate pool using the level's difficulty
//! band, and builds fresh puzzle instances (ids assigned, flags cleared,
//! scrambled copy). Also provides the whole-corpus batch picker used when the
//! provider cannot answer range queries.

use crate::models::{Puzzle, RelatedSentences, SentenceRecord, Word};
use crate::modes::{DifficultyRangePolicy, GameMode};
use crate::rng::{shuffle, RandomSource};
use crate::text::TextAnalyzer;
use serde::Serialize;
use tracing::{debug, info, warn};

pub const MIN_SCORE: f64 = 4.0;
pub const MAX_SCORE: f64 = 80.0;
pub const SCORE_RANGE: f64 = 5.0;
pub const SENTENCES_PER_RANGE: usize = 5;
pub const DEFAULT_MAX_WORD_SCORE: f64 = 3.0;

const MAX_SCRAMBLE_ATTEMPTS: usize = 10;

/// Inclusive score band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DifficultyRange {
    pub min: f64,
    pub max: f64,
}

impl DifficultyRange {
    pub fn contains(&self, score: f64) -> bool {
        score >= self.min && score <= self.max
    }
}

/// Score band for `level` under `policy`. Level 0 is treated as level 1.
pub fn difficulty_range(level: u32, policy: &DifficultyRangePolicy) -> DifficultyRange {
    match *policy {
        DifficultyRangePolicy::Constant { min, max } => DifficultyRange { min, max },
        DifficultyRangePolicy::Progressive {
            base_min,
            base_max,
            step,
            every,
        } => {
            let steps = f64::from(level.saturating_sub(1) / every.max(1));
            DifficultyRange {
                min: base_min + steps * step,
                max: base_max + steps * step,
            }
        }
    }
}

/// Fill in missing words with the analyzer and drop records the engine
/// cannot use.
pub fn prepare_pool(records: Vec<SentenceRecord>, analyzer: &dyn TextAnalyzer) -> Vec<SentenceRecord> {
    let total = records.len();
    let pool: Vec<SentenceRecord> = records
        .into_iter()
        .filter_map(|mut record| {
            if record.words.is_empty() && !record.text.trim().is_empty() {
                record.words = analyzer.analyze(&record.text);
                if record.total_score == 0.0 {
                    record.total_score = record.words.iter().map(|w| w.difficulty_score).sum();
                }
            }
            match record.check_shape() {
                Ok(()) => Some(record),
                Err(e) => {
                    warn!("Skipping sentence record: {}", e);
                    None
                }
            }
        })
        .collect();

    if pool.len() < total {
        debug!("Prepared {} of {} sentence records", pool.len(), total);
    }
    pool
}

/// Build a fresh puzzle from a record: index-based ids, cleared flags, and a
/// scrambled copy that differs from the solved order whenever it can.
pub fn materialize(record: &SentenceRecord, id: u32, rng: &mut dyn RandomSource) -> Puzzle {
    let original_words: Vec<Word> = record
        .words
        .iter()
        .enumerate()
        .map(|(i, raw)| Word::from_raw(i as u32, raw))
        .collect();
    let scrambled_words = scramble(&original_words, rng);

    Puzzle::new(
        id,
        record.display_text(),
        original_words,
        scrambled_words,
        record.total_score,
        RelatedSentences {
            prev: record.prev_sentences.clone(),
            next: record.next_sentences.clone(),
        },
    )
}

fn scramble(words: &[Word], rng: &mut dyn RandomSource) -> Vec<Word> {
    let mut scrambled = words.to_vec();
    if words.len() < 2 {
        return scrambled;
    }

    for _ in 0..MAX_SCRAMBLE_ATTEMPTS {
        shuffle(rng, &mut scrambled);
        if !same_token_order(&scrambled, words) {
            return scrambled;
        }
    }

    // Rotation only keeps the token order when every token is identical.
    let mut rotated = words.to_vec();
    rotated.rotate_left(1);
    rotated
}

fn same_token_order(a: &[Word], b: &[Word]) -> bool {
    a.iter().map(|w| &w.token).eq(b.iter().map(|w| &w.token))
}

#[derive(Debug, Clone)]
struct ScoreBucket {
    max: f64,
    key: String,
}

fn score_buckets(start: f64, end: f64, step: f64) -> Vec<ScoreBucket> {
    let mut buckets = Vec::new();
    let mut lower = start;
    while lower < end {
        buckets.push(ScoreBucket {
            max: lower + step,
            key: format!("{}<x<={}", lower, lower + step),
        });
        lower += step;
    }
    buckets.push(ScoreBucket {
        max: f64::INFINITY,
        key: format!("{}<x", lower),
    });
    buckets
}

#[derive(Debug, Clone, Copy)]
pub struct SentenceSelector {
    max_word_score: f64,
}

impl Default for SentenceSelector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORD_SCORE)
    }
}

impl SentenceSelector {
    pub fn new(max_word_score: f64) -> Self {
        Self { max_word_score }
    }

    pub fn max_word_score(&self) -> f64 {
        self.max_word_score
    }

    /// Every word under the cap, and the sentence at least as hard as the
    /// average of itself and its neighbours.
    pub fn is_valid(&self, record: &SentenceRecord) -> bool {
        let words_under_cap = record
            .words
            .iter()
            .all(|w| w.difficulty_score <= self.max_word_score);
        if !words_under_cap {
            return false;
        }

        let neighbours = record.prev_sentences.iter().chain(&record.next_sentences);
        let count = 1 + record.prev_sentences.len() + record.next_sentences.len();
        let sum = record.total_score + neighbours.map(|s| s.score).sum::<f64>();
        record.total_score >= sum / count as f64
    }

    /// Pick the puzzle for `level`, or `None` when nothing in the pool fits
    /// the level's band.
    pub fn select_next(
        &self,
        pool: &[SentenceRecord],
        level: u32,
        mode: &GameMode,
        rng: &mut dyn RandomSource,
    ) -> Option<Puzzle> {
        let range = difficulty_range(level, &mode.range_policy);
        let eligible: Vec<&SentenceRecord> = pool
            .iter()
            .filter(|record| self.is_valid(record) && range.contains(record.total_score))
            .collect();

        debug!(
            "Level {}: {} of {} sentences eligible for range [{}, {}]",
            level,
            eligible.len(),
            pool.len(),
            range.min,
            range.max
        );

        if eligible.is_empty() {
            return None;
        }

        let record = eligible[rng.index(eligible.len())];
        info!(
            "Selected sentence {} (score {}) for level {}",
            record.id, record.total_score, level
        );
        Some(materialize(record, level, rng))
    }

    /// Whole-corpus level ladder: up to [`SENTENCES_PER_RANGE`] random picks
    /// per score bucket, ordered easiest first.
    pub fn pick_batch(&self, pool: &[SentenceRecord], rng: &mut dyn RandomSource) -> Vec<Puzzle> {
        let buckets = score_buckets(MIN_SCORE, MAX_SCORE, SCORE_RANGE);
        let mut grouped: Vec<Vec<&SentenceRecord>> = vec![Vec::new(); buckets.len()];

        for record in pool.iter().filter(|r| self.is_valid(r)) {
            let slot = buckets
                .iter()
                .position(|b| record.total_score <= b.max)
                .unwrap_or(buckets.len() - 1);
            grouped[slot].push(record);
        }

        let mut chosen: Vec<&SentenceRecord> = Vec::new();
        for (bucket, mut group) in buckets.iter().zip(grouped) {
            if group.is_empty() {
                continue;
            }
            debug!("Bucket {} holds {} sentences", bucket.key, group.len());
            for _ in 0..SENTENCES_PER_RANGE {
                if group.is_empty() {
                    break;
                }
                let index = rng.index(group.len());
                chosen.push(group.remove(index));
            }
        }

        chosen.sort_by(|a, b| a.total_score.total_cmp(&b.total_score));
        info!("Picked {} sentences for the level ladder", chosen.len());

        chosen
            .into_iter()
            .enumerate()
            .map(|(i, record)| materialize(record, i as u32, rng))
            .collect()
    }
}
