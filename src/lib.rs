//! Sentence unscramble puzzle engine
//!
//! Picks sentences from a scored corpus by level, scrambles them, and runs
//! the player's moves, the hint economy and the per-mode clock until the
//! round ends.

pub mod arrangement;
pub mod error;
pub mod game;
pub mod hints;
pub mod models;
pub mod modes;
pub mod notify;
pub mod prompts;
pub mod provider;
pub mod rng;
pub mod selector;
pub mod session;
pub mod text;
pub mod timer;
pub mod translate;

pub use error::{Error, Result};
