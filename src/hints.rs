//! Hint engine
//!
//! Hints are earned through a weighted random draw over the kinds a mode
//! enables, and spent one charge at a time. Spending a `lock` or `connect`
//! charge only happens when the hint actually changed the arrangement.

use crate::game::GameState;
use crate::models::Puzzle;
use crate::modes::{GameMode, HintKind, HintWeights};
use crate::rng::RandomSource;
use crate::{Error, Result};
use tracing::{debug, info};

/// Seconds added to the clock by an `extraTime` hint.
pub const EXTRA_TIME_SECONDS: i64 = 15;

/// Effect of a spent hint charge.
#[derive(Debug, Clone, PartialEq)]
pub enum HintOutcome {
    Locked { word_id: u32, index: usize },
    Connected { left: u32, right: u32, color: String },
    ExtraTime { seconds: i64, remaining: Option<i64> },
    ExtraLife { lives: Option<i32> },
}

impl HintOutcome {
    pub fn kind(&self) -> HintKind {
        match self {
            HintOutcome::Locked { .. } => HintKind::Lock,
            HintOutcome::Connected { .. } => HintKind::Connect,
            HintOutcome::ExtraTime { .. } => HintKind::ExtraTime,
            HintOutcome::ExtraLife { .. } => HintKind::ExtraLife,
        }
    }
}

/// Walk the positive-weight kinds in declaration order and return the first
/// one whose cumulative weight exceeds `draw`. `draw` is already scaled to
/// `[0, total_weight)`, so every bucket is half-open.
pub fn select_weighted(weights: &HintWeights, draw: f64) -> Option<HintKind> {
    let candidates = weights.candidates();
    let mut remaining = draw;
    for &(kind, weight) in &candidates {
        remaining -= f64::from(weight);
        if remaining < 0.0 {
            return Some(kind);
        }
    }
    // Only reachable when draw >= total; clamp to the last bucket.
    candidates.last().map(|&(kind, _)| kind)
}

/// Award one random hint for a solved sentence.
///
/// An `extraLife` draw is paid out immediately; every other kind adds a
/// charge. Returns the awarded kind, or `None` when the mode has nothing to
/// award. An `extraLife` draw awards nothing while lives are infinite.
pub fn grant_random_hint(
    mode: &GameMode,
    state: &mut GameState,
    rng: &mut dyn RandomSource,
) -> Option<HintKind> {
    let total: u32 = mode.hint_weights.candidates().iter().map(|(_, w)| w).sum();
    if total == 0 {
        return None;
    }

    let draw = rng.next_f64() * f64::from(total);
    let kind = select_weighted(&mode.hint_weights, draw)?;
    debug!("Hint draw {:.3} of {} selected {}", draw, total, kind);

    if kind == HintKind::ExtraLife {
        if state.lives().is_none() {
            debug!("Skipping {} award, lives are infinite", kind);
            return None;
        }
        state.update_lives(1);
    } else if let Err(e) = state.update_hints(kind, 1) {
        // candidates() only yields enabled kinds, so the slot exists.
        debug!("Could not award {} hint: {}", kind, e);
        return None;
    }
    info!("Awarded {} hint", kind);
    Some(kind)
}

/// Fail unless `kind` is enabled and has at least one charge.
pub fn ensure_charge(state: &GameState, kind: HintKind) -> Result<u32> {
    match state.hints(kind) {
        None => Err(Error::HintDisabled(kind)),
        Some(0) => Err(Error::OutOfHints(kind)),
        Some(count) => Ok(count),
    }
}

/// Spend one charge of a synchronous hint kind.
///
/// The charge is only consumed when the effect applied. `translate` goes
/// through the session because it needs the translation service.
pub fn use_hint(
    kind: HintKind,
    puzzle: Option<&mut Puzzle>,
    state: &mut GameState,
    timer_running: bool,
    rng: &mut dyn RandomSource,
) -> Result<HintOutcome> {
    ensure_charge(state, kind)?;

    let outcome = match kind {
        HintKind::Lock => lock_word(puzzle.ok_or(Error::NoActivePuzzle)?, rng)?,
        HintKind::Connect => connect_words(puzzle.ok_or(Error::NoActivePuzzle)?, rng)?,
        HintKind::ExtraTime => {
            if !timer_running {
                return Err(Error::NoHintAvailable(kind));
            }
            state.update_time(EXTRA_TIME_SECONDS);
            HintOutcome::ExtraTime {
                seconds: EXTRA_TIME_SECONDS,
                remaining: state.time_remaining(),
            }
        }
        HintKind::ExtraLife => {
            if state.lives().is_none() {
                return Err(Error::NoHintAvailable(kind));
            }
            state.update_lives(1);
            HintOutcome::ExtraLife {
                lives: state.lives(),
            }
        }
        HintKind::Translate => {
            return Err(Error::InvalidMove(
                "translate hints need the translation service".to_string(),
            ))
        }
    };

    state.update_hints(kind, -1)?;
    Ok(outcome)
}

/// Move one random misplaced word onto a slot that expects its token and pin
/// it there.
///
/// The word goes to its own solved index whenever that slot is still open.
/// With repeated tokens it may instead land on another open slot expecting
/// the same token, so a locked word's index can differ from its position in
/// the original order while the sentence still reads correctly.
pub fn lock_word(puzzle: &mut Puzzle, rng: &mut dyn RandomSource) -> Result<HintOutcome> {
    let misplaced: Vec<usize> = (0..puzzle.scrambled_words.len())
        .filter(|&i| !puzzle.scrambled_words[i].locked && !puzzle.is_correctly_placed(i))
        .collect();
    if misplaced.is_empty() {
        return Err(Error::NoHintAvailable(HintKind::Lock));
    }

    let from = misplaced[rng.index(misplaced.len())];
    let target = lock_target(puzzle, from).ok_or(Error::NoHintAvailable(HintKind::Lock))?;

    puzzle.scrambled_words.swap(from, target);
    let word = &mut puzzle.scrambled_words[target];
    word.locked = true;
    word.selected = false;
    debug!("Locked word {} ({:?}) at {}", word.id, word.token, target);

    Ok(HintOutcome::Locked {
        word_id: word.id,
        index: target,
    })
}

/// The word's own solved slot when it still needs filling, otherwise any
/// mismatched slot expecting the same token.
fn lock_target(puzzle: &Puzzle, from: usize) -> Option<usize> {
    let word = &puzzle.scrambled_words[from];
    let open = |i: usize| !puzzle.scrambled_words[i].locked && !puzzle.is_correctly_placed(i);

    if let Some(own) = puzzle.correct_index(word.id) {
        if open(own) {
            return Some(own);
        }
    }
    (0..puzzle.original_words.len())
        .find(|&i| puzzle.original_words[i].token == word.token && open(i))
}

/// Pairs `(left_id, right_id)` of solved-order neighbours that could still
/// be joined.
///
/// A pair qualifies when the left word has no right link, the right word has
/// no left link, and the right word does not already follow the left one in
/// the current arrangement. Links already on the outer sides must lead to the
/// solved-order neighbours, otherwise the chain would be inconsistent.
pub fn valid_connections(puzzle: &Puzzle) -> Vec<(u32, u32)> {
    let original = &puzzle.original_words;
    let flags = |id: u32| {
        puzzle
            .position_of(id)
            .map(|i| (i, &puzzle.scrambled_words[i]))
    };

    (0..original.len().saturating_sub(1))
        .filter_map(|i| {
            let (left_at, left) = flags(original[i].id)?;
            let (right_at, right) = flags(original[i + 1].id)?;

            let free = left.connection_right.is_none() && right.connection_left.is_none();
            let already_adjacent = left_at + 1 == right_at;
            let outer_left_ok = left.connection_left.as_deref().map_or(true, |color| {
                let expected = i.checked_sub(1).map(|j| original[j].id);
                linked_from_left(puzzle, color) == expected
            });
            let outer_right_ok = right.connection_right.as_deref().map_or(true, |color| {
                let expected = original.get(i + 2).map(|w| w.id);
                linked_from_right(puzzle, color) == expected
            });

            (free && !already_adjacent && outer_left_ok && outer_right_ok)
                .then_some((left.id, right.id))
        })
        .collect()
}

/// Word whose right link carries `color`.
fn linked_from_left(puzzle: &Puzzle, color: &str) -> Option<u32> {
    puzzle
        .scrambled_words
        .iter()
        .find(|w| w.connection_right.as_deref() == Some(color))
        .map(|w| w.id)
}

/// Word whose left link carries `color`.
fn linked_from_right(puzzle: &Puzzle, color: &str) -> Option<u32> {
    puzzle
        .scrambled_words
        .iter()
        .find(|w| w.connection_left.as_deref() == Some(color))
        .map(|w| w.id)
}

/// Join one random valid pair with a color no other link uses.
pub fn connect_words(puzzle: &mut Puzzle, rng: &mut dyn RandomSource) -> Result<HintOutcome> {
    let pairs = valid_connections(puzzle);
    if pairs.is_empty() {
        return Err(Error::NoHintAvailable(HintKind::Connect));
    }

    let (left, right) = pairs[rng.index(pairs.len())];
    let color = fresh_color(puzzle, rng);

    let left_at = puzzle.position_of(left).ok_or(Error::NoActivePuzzle)?;
    let right_at = puzzle.position_of(right).ok_or(Error::NoActivePuzzle)?;
    puzzle.scrambled_words[left_at].connection_right = Some(color.clone());
    puzzle.scrambled_words[right_at].connection_left = Some(color.clone());
    debug!("Connected words {} and {} with {}", left, right, color);

    Ok(HintOutcome::Connected { left, right, color })
}

fn fresh_color(puzzle: &Puzzle, rng: &mut dyn RandomSource) -> String {
    let in_use = |color: &str| {
        puzzle.scrambled_words.iter().any(|w| {
            w.connection_left.as_deref() == Some(color)
                || w.connection_right.as_deref() == Some(color)
        })
    };

    let mut color = rng.color();
    // A scripted source could repeat forever; fall back to a counter.
    for _ in 0..16 {
        if !in_use(&color) {
            return color;
        }
        color = rng.color();
    }
    (0u32..)
        .map(|n| format!("#{:06x}", n & 0x00FF_FFFF))
        .find(|c| !in_use(c))
        .unwrap_or(color)
}
