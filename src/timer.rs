//! Countdown timer
//!
//! A two-state machine (`Stopped`/`Running`) over a pluggable tick source.
//! Every start gets a fresh generation number, ticks carrying an older
//! generation are dropped, and the previous source is cancelled before a new
//! one starts, so a restart never leaves two clocks running.

use crate::game::GameState;
use crate::modes::TimerPolicy;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const TICK_PERIOD: Duration = Duration::from_secs(1);

pub trait TickSource: Send {
    /// Begin delivering ticks tagged with `generation`.
    fn start(&mut self, generation: u64, period: Duration);

    /// Stop delivering ticks. Safe to call when idle.
    fn cancel(&mut self);
}

/// Wall-clock ticks from a tokio interval task, delivered as generation
/// numbers on an unbounded channel.
pub struct TokioTicker {
    events: mpsc::UnboundedSender<u64>,
    handle: Option<JoinHandle<()>>,
}

impl TokioTicker {
    pub fn new(events: mpsc::UnboundedSender<u64>) -> Self {
        Self {
            events,
            handle: None,
        }
    }

    /// Ticker plus the receiving end the event loop should poll.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<u64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl TickSource for TokioTicker {
    fn start(&mut self, generation: u64, period: Duration) {
        self.cancel();
        let events = self.events.clone();
        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // The first tick of a tokio interval fires immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if events.send(generation).is_err() {
                    break;
                }
            }
        }));
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TokioTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[derive(Debug, Default)]
struct ManualTickerState {
    active: Option<u64>,
    starts: usize,
    cancels: usize,
}

/// Test tick source: records start/cancel calls; the test delivers ticks by
/// calling [`GameTimer::tick`] itself. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    state: Arc<Mutex<ManualTickerState>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generation of the currently running source, if any.
    pub fn active_generation(&self) -> Option<u64> {
        self.state.lock().unwrap().active
    }

    pub fn start_count(&self) -> usize {
        self.state.lock().unwrap().starts
    }

    pub fn cancel_count(&self) -> usize {
        self.state.lock().unwrap().cancels
    }
}

impl TickSource for ManualTicker {
    fn start(&mut self, generation: u64, _period: Duration) {
        let mut state = self.state.lock().unwrap();
        state.active = Some(generation);
        state.starts += 1;
    }

    fn cancel(&mut self) {
        let mut state = self.state.lock().unwrap();
        if state.active.take().is_some() {
            state.cancels += 1;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Stopped,
    Running { generation: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Stale generation, stopped timer or finished game.
    Ignored,
    Running(i64),
    Expired,
}

pub struct GameTimer {
    source: Box<dyn TickSource>,
    state: TimerState,
    generation: u64,
}

impl GameTimer {
    pub fn new(source: Box<dyn TickSource>) -> Self {
        Self {
            source,
            state: TimerState::Stopped,
            generation: 0,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, TimerState::Running { .. })
    }

    /// Stop any running clock, compute the starting value from `policy` and
    /// start ticking. Untimed modes only stop.
    pub fn setup(&mut self, game: &mut GameState, policy: Option<&TimerPolicy>, starting: bool) {
        self.stop();
        let Some(policy) = policy else {
            return;
        };

        let time = policy.next_time(game.level(), game.time_remaining(), starting);
        game.set_time(Some(time));

        self.generation += 1;
        self.source.start(self.generation, TICK_PERIOD);
        self.state = TimerState::Running {
            generation: self.generation,
        };
        debug!(
            "Timer started with {}s (generation {})",
            time, self.generation
        );
    }

    pub fn stop(&mut self) {
        if let TimerState::Running { generation } = self.state {
            self.source.cancel();
            self.state = TimerState::Stopped;
            debug!("Timer stopped (generation {})", generation);
        }
    }

    /// Count one second down. Reaching zero stops the clock and ends the game.
    pub fn tick(&mut self, generation: u64, game: &mut GameState) -> TickOutcome {
        match self.state {
            TimerState::Running { generation: active } if active == generation => {}
            _ => return TickOutcome::Ignored,
        }
        if !game.is_playing() {
            self.stop();
            return TickOutcome::Ignored;
        }

        game.update_time(-1);
        match game.time_remaining() {
            Some(remaining) if remaining > 0 => TickOutcome::Running(remaining),
            _ => {
                self.stop();
                if let Err(e) = game.game_over() {
                    warn!("Timer expired outside of play: {}", e);
                }
                info!("Time is up at level {}", game.level());
                TickOutcome::Expired
            }
        }
    }

    /// Called after every solved sentence.
    pub fn reset_for_next_sentence(&mut self, game: &mut GameState, policy: Option<&TimerPolicy>) {
        if policy.is_none() {
            return;
        }
        self.stop();
        self.setup(game, policy, false);
    }
}
