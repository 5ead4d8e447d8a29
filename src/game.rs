//! Game state machine
//!
//! `loading → start → playing → over`. All mutation goes through the named
//! methods below so the lives/level/status rules live in one place.

use crate::modes::{GameMode, HintKind, ModeKey};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Loading,
    Start,
    Playing,
    Over,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    status: GameStatus,
    mode: ModeKey,
    level: u32,
    /// `None` means infinite lives.
    lives: Option<i32>,
    /// `None` entries are hint kinds disabled in the active mode.
    hints: BTreeMap<HintKind, Option<u32>>,
    time_remaining: Option<i64>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    pub fn new() -> Self {
        Self {
            status: GameStatus::Loading,
            mode: ModeKey::Normal,
            level: 1,
            lives: None,
            hints: HintKind::ALL.iter().map(|&kind| (kind, None)).collect(),
            time_remaining: None,
        }
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn mode(&self) -> ModeKey {
        self.mode
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn lives(&self) -> Option<i32> {
        self.lives
    }

    pub fn hints(&self, kind: HintKind) -> Option<u32> {
        self.hints.get(&kind).copied().flatten()
    }

    pub fn time_remaining(&self) -> Option<i64> {
        self.time_remaining
    }

    pub fn is_playing(&self) -> bool {
        self.status == GameStatus::Playing
    }

    pub fn is_over(&self) -> bool {
        self.status == GameStatus::Over
    }

    /// Pick the mode whose first content is about to load. Only valid before
    /// anything has been loaded.
    pub fn select_mode(&mut self, key: ModeKey) -> Result<()> {
        if self.status != GameStatus::Loading {
            return Err(Error::InvalidTransition(format!(
                "cannot preload {} while {:?}",
                key, self.status
            )));
        }
        self.mode = key;
        Ok(())
    }

    /// First content is available: `loading → start`.
    pub fn mark_ready(&mut self) -> Result<()> {
        match self.status {
            GameStatus::Loading => {
                self.status = GameStatus::Start;
                Ok(())
            }
            GameStatus::Start => Ok(()),
            other => Err(Error::InvalidTransition(format!(
                "cannot become ready from {:?}",
                other
            ))),
        }
    }

    /// Start a fresh round in `key`: level 1, lives, empty hint inventory and
    /// the initial clock derived from `mode`.
    pub fn reset(&mut self, key: ModeKey, mode: &GameMode) {
        self.status = GameStatus::Playing;
        self.mode = key;
        self.level = 1;
        self.lives = mode.starting_lives;
        self.hints = HintKind::ALL
            .iter()
            .map(|&kind| {
                let count = mode.hint_weights.is_enabled(kind).then_some(0);
                (kind, count)
            })
            .collect();
        self.time_remaining = mode.timer.map(|timer| timer.initial_seconds);
    }

    /// Adjust a hint charge count and return the new count.
    pub fn update_hints(&mut self, kind: HintKind, amount: i32) -> Result<u32> {
        let slot = self
            .hints
            .get_mut(&kind)
            .and_then(|count| count.as_mut())
            .ok_or(Error::HintDisabled(kind))?;

        let updated = i64::from(*slot) + i64::from(amount);
        if updated < 0 {
            return Err(Error::OutOfHints(kind));
        }
        *slot = updated as u32;
        Ok(*slot)
    }

    /// Adjust finite lives. Dropping to zero or below ends a running game.
    pub fn update_lives(&mut self, amount: i32) {
        if let Some(lives) = self.lives.as_mut() {
            *lives += amount;
            if *lives <= 0 && self.status == GameStatus::Playing {
                self.status = GameStatus::Over;
            }
        }
    }

    /// Shift the clock; a no-op for untimed rounds.
    pub fn update_time(&mut self, amount: i64) {
        if let Some(time) = self.time_remaining.as_mut() {
            *time += amount;
        }
    }

    pub fn set_time(&mut self, time: Option<i64>) {
        self.time_remaining = time;
    }

    /// `playing → over`. Repeated calls once over are harmless.
    pub fn game_over(&mut self) -> Result<()> {
        match self.status {
            GameStatus::Playing => {
                self.status = GameStatus::Over;
                Ok(())
            }
            GameStatus::Over => Ok(()),
            other => Err(Error::InvalidTransition(format!(
                "cannot end a game that is {:?}",
                other
            ))),
        }
    }

    pub fn increment_level(&mut self) -> Result<u32> {
        if self.status != GameStatus::Playing {
            return Err(Error::InvalidTransition(format!(
                "cannot advance level while {:?}",
                self.status
            )));
        }
        self.level += 1;
        Ok(self.level)
    }
}
