//! Mode catalog
//!
//! Static table of named game modes. Each mode bundles a timer policy, the hint
//! economy weights, the starting lives, the difficulty-range policy and the
//! auto-check flag. Pure data, no behavior beyond lookups.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HintKind {
    Lock,
    Connect,
    ExtraTime,
    ExtraLife,
    Translate,
}

impl HintKind {
    /// Declaration order. Weighted draws walk candidates in exactly this order.
    pub const ALL: [HintKind; 5] = [
        HintKind::Lock,
        HintKind::Connect,
        HintKind::ExtraTime,
        HintKind::ExtraLife,
        HintKind::Translate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HintKind::Lock => "lock",
            HintKind::Connect => "connect",
            HintKind::ExtraTime => "extraTime",
            HintKind::ExtraLife => "extraLife",
            HintKind::Translate => "translate",
        }
    }
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HintKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lock" => Ok(HintKind::Lock),
            "connect" => Ok(HintKind::Connect),
            "extratime" | "extra-time" | "time" => Ok(HintKind::ExtraTime),
            "extralife" | "extra-life" | "life" => Ok(HintKind::ExtraLife),
            "translate" => Ok(HintKind::Translate),
            other => Err(format!("Unknown hint kind '{}'", other)),
        }
    }
}

/// Countdown configuration. `None` on a mode means the mode is untimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerPolicy {
    pub initial_seconds: i64,
    pub reset_on_new_level: bool,
    pub increment_seconds: i64,
}

impl TimerPolicy {
    /// Starting value for the clock when a sentence begins.
    ///
    /// Reset-per-level policies grow the allowance every five levels; the others
    /// start from `initial_seconds` and carry the remaining time forward.
    pub fn next_time(&self, level: u32, current: Option<i64>, starting: bool) -> i64 {
        if self.reset_on_new_level {
            return self.increment_seconds * (1 + i64::from(level / 5));
        }
        if starting {
            self.initial_seconds
        } else {
            current.unwrap_or(self.initial_seconds) + self.increment_seconds
        }
    }
}

/// Per-kind draw weights. `None` disables the kind in the mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintWeights {
    pub lock: Option<u32>,
    pub connect: Option<u32>,
    pub extra_time: Option<u32>,
    pub extra_life: Option<u32>,
    pub translate: Option<u32>,
}

impl HintWeights {
    pub fn weight(&self, kind: HintKind) -> Option<u32> {
        match kind {
            HintKind::Lock => self.lock,
            HintKind::Connect => self.connect,
            HintKind::ExtraTime => self.extra_time,
            HintKind::ExtraLife => self.extra_life,
            HintKind::Translate => self.translate,
        }
    }

    pub fn is_enabled(&self, kind: HintKind) -> bool {
        self.weight(kind).is_some()
    }

    /// Enabled kinds with a positive weight, in declaration order.
    pub fn candidates(&self) -> Vec<(HintKind, u32)> {
        HintKind::ALL
            .iter()
            .filter_map(|&kind| match self.weight(kind) {
                Some(weight) if weight > 0 => Some((kind, weight)),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DifficultyRangePolicy {
    /// Same band at every level.
    Constant { min: f64, max: f64 },
    /// Band shifts up by `step` every `every` levels.
    Progressive {
        base_min: f64,
        base_max: f64,
        step: f64,
        every: u32,
    },
}

impl DifficultyRangePolicy {
    pub const DEFAULT_PROGRESSIVE: DifficultyRangePolicy = DifficultyRangePolicy::Progressive {
        base_min: 5.0,
        base_max: 10.0,
        step: 5.0,
        every: 5,
    };

    pub const DEFAULT_CONSTANT: DifficultyRangePolicy =
        DifficultyRangePolicy::Constant { min: 5.0, max: 10.0 };
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameMode {
    pub timer: Option<TimerPolicy>,
    pub hint_weights: HintWeights,
    pub auto_check: bool,
    /// `None` means infinite lives.
    pub starting_lives: Option<i32>,
    pub range_policy: DifficultyRangePolicy,
    /// Wrong submissions are free in relaxed modes.
    pub relaxed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeKey {
    Normal,
    Timer,
    Countdown,
    Relax,
}

impl ModeKey {
    pub const ALL: [ModeKey; 4] = [
        ModeKey::Normal,
        ModeKey::Timer,
        ModeKey::Countdown,
        ModeKey::Relax,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModeKey::Normal => "normal",
            ModeKey::Timer => "timer",
            ModeKey::Countdown => "countdown",
            ModeKey::Relax => "relax",
        }
    }

    /// Catalog lookup.
    pub fn mode(&self) -> GameMode {
        match self {
            ModeKey::Normal => GameMode {
                timer: None,
                hint_weights: HintWeights {
                    lock: Some(3),
                    connect: Some(3),
                    extra_time: None,
                    extra_life: Some(1),
                    translate: None,
                },
                auto_check: false,
                starting_lives: Some(3),
                range_policy: DifficultyRangePolicy::DEFAULT_PROGRESSIVE,
                relaxed: false,
            },
            ModeKey::Timer => GameMode {
                timer: Some(TimerPolicy {
                    initial_seconds: 15,
                    reset_on_new_level: true,
                    increment_seconds: 15,
                }),
                hint_weights: HintWeights {
                    lock: Some(2),
                    connect: Some(2),
                    extra_time: Some(1),
                    extra_life: None,
                    translate: None,
                },
                auto_check: true,
                starting_lives: None,
                range_policy: DifficultyRangePolicy::DEFAULT_PROGRESSIVE,
                relaxed: false,
            },
            ModeKey::Countdown => GameMode {
                timer: Some(TimerPolicy {
                    initial_seconds: 300,
                    reset_on_new_level: false,
                    increment_seconds: 0,
                }),
                hint_weights: HintWeights {
                    lock: Some(2),
                    connect: Some(2),
                    extra_time: Some(1),
                    extra_life: None,
                    translate: None,
                },
                auto_check: true,
                starting_lives: None,
                range_policy: DifficultyRangePolicy::DEFAULT_PROGRESSIVE,
                relaxed: false,
            },
            ModeKey::Relax => GameMode {
                timer: None,
                hint_weights: HintWeights {
                    lock: Some(3),
                    connect: Some(3),
                    extra_time: None,
                    extra_life: Some(1),
                    translate: Some(1),
                },
                auto_check: false,
                starting_lives: Some(3),
                range_policy: DifficultyRangePolicy::DEFAULT_CONSTANT,
                relaxed: true,
            },
        }
    }
}

impl fmt::Display for ModeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModeKey {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ModeKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Unknown mode '{}'. Expected one of: normal, timer, countdown, relax",
                    s
                )
            })
    }
}
