//! Session orchestration
//!
//! One [`Session`] owns everything a round needs: the game state, the active
//! puzzle, the timer and the collaborators that feed them. Player events come
//! in through the named methods below and every outcome the presentation
//! layer should surface is also published on the notification channel.

use crate::game::{GameState, GameStatus};
use crate::hints::{self, HintOutcome};
use crate::models::{Config, Puzzle, SelectionStrategy, SentenceRecord, Word};
use crate::modes::{GameMode, HintKind, ModeKey};
use crate::notify::{NotificationCenter, Severity};
use crate::provider::{HttpSentenceProvider, SentenceProvider, SentenceQuery};
use crate::rng::{RandomSource, StdRandom};
use crate::selector::{self, SentenceSelector};
use crate::text::{HeuristicAnalyzer, TextAnalyzer};
use crate::timer::{GameTimer, TickOutcome, TickSource, TimerState};
use crate::translate::{GeminiTranslationClient, TranslationService};
use crate::{Error, Result};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Injectable collaborator bundle used to construct a [`Session`].
pub struct SessionServices {
    pub provider: Box<dyn SentenceProvider>,
    pub translator: Option<Box<dyn TranslationService>>,
    pub analyzer: Box<dyn TextAnalyzer>,
    pub rng: Box<dyn RandomSource>,
    pub tick_source: Box<dyn TickSource>,
    pub notifications: NotificationCenter,
}

/// Behavioural knobs taken from [`Config`].
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub selection_strategy: SelectionStrategy,
    pub max_word_score: f64,
    pub translation_language: String,
    pub charge_translation_on_failure: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for SessionSettings {
    fn from(config: &Config) -> Self {
        Self {
            selection_strategy: config.selection_strategy,
            max_word_score: config.max_word_score,
            translation_language: config.translation_language.clone(),
            charge_translation_on_failure: config.charge_translation_on_failure,
        }
    }
}

/// Result of a solve check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// The puzzle is cleared; the caller should load the next one.
    Solved {
        level: u32,
        earned: Option<HintKind>,
    },
    /// Wrong order, nothing charged.
    Unsolved,
    LifeLost {
        lives: i32,
    },
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { puzzle_id: u32 },
    NoEligibleContent,
    /// A newer fetch was issued while this one was in flight.
    Stale,
}

/// A fetch in flight. Only the most recently issued ticket may install a
/// puzzle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchTicket {
    token: u64,
    query: SentenceQuery,
}

impl FetchTicket {
    pub fn token(&self) -> u64 {
        self.token
    }

    pub fn query(&self) -> &SentenceQuery {
        &self.query
    }
}

pub struct Session {
    provider: Box<dyn SentenceProvider>,
    translator: Option<Box<dyn TranslationService>>,
    analyzer: Box<dyn TextAnalyzer>,
    rng: Box<dyn RandomSource>,
    notifications: NotificationCenter,
    timer: GameTimer,
    selector: SentenceSelector,
    settings: SessionSettings,
    state: GameState,
    puzzle: Option<Puzzle>,
    batch: Option<VecDeque<Puzzle>>,
    latest_fetch: u64,
}

impl Session {
    /// Build a session from concrete collaborators.
    ///
    /// Tests use this to inject mocks, a manual tick source and a scripted
    /// random source.
    pub fn with_services(services: SessionServices, settings: SessionSettings) -> Self {
        Self {
            provider: services.provider,
            translator: services.translator,
            analyzer: services.analyzer,
            rng: services.rng,
            notifications: services.notifications,
            timer: GameTimer::new(services.tick_source),
            selector: SentenceSelector::new(settings.max_word_score),
            settings,
            state: GameState::new(),
            puzzle: None,
            batch: None,
            latest_fetch: 0,
        }
    }

    /// Wire the HTTP provider, the optional Gemini translator and the default
    /// analyzer from configuration.
    pub fn new(config: &Config, tick_source: Box<dyn TickSource>, seed: Option<u64>) -> Self {
        let http_client = reqwest::Client::new();

        let translator: Option<Box<dyn TranslationService>> = match &config.gemini_api_key {
            Some(api_key) => {
                info!("Translation provider: Gemini (model: {})", config.translation_model);
                Some(Box::new(GeminiTranslationClient::new_with_client(
                    api_key.clone(),
                    config.translation_model.clone(),
                    http_client.clone(),
                )))
            }
            None => {
                warn!("GEMINI_API_KEY not set, translate hints are unavailable");
                None
            }
        };

        let rng: Box<dyn RandomSource> = match seed {
            Some(seed) => Box::new(StdRandom::seeded(seed)),
            None => Box::new(StdRandom::new()),
        };

        let provider =
            HttpSentenceProvider::new_with_client(config.sentence_api_url.clone(), http_client);
        info!(
            "Sentence server: {} ({:?} selection)",
            provider.base_url(),
            config.selection_strategy
        );

        Self::with_services(
            SessionServices {
                provider: Box::new(provider),
                translator,
                analyzer: Box::new(HeuristicAnalyzer::new()),
                rng,
                tick_source,
                notifications: NotificationCenter::new(Duration::from_millis(
                    config.notification_clear_ms,
                )),
            },
            SessionSettings::from(config),
        )
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn puzzle(&self) -> Option<&Puzzle> {
        self.puzzle.as_ref()
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn mode(&self) -> GameMode {
        self.state.mode().mode()
    }

    pub fn timer_state(&self) -> TimerState {
        self.timer.state()
    }

    /// Puzzles left in the batch ladder, if one has been built.
    pub fn batch_remaining(&self) -> Option<usize> {
        self.batch.as_ref().map(VecDeque::len)
    }

    /// Load the first puzzle for `key` before play begins: `loading → start`.
    ///
    /// The clock stays stopped until [`Session::start`]. Only valid while the
    /// session is still loading.
    pub async fn prepare(&mut self, key: ModeKey) -> Result<LoadOutcome> {
        self.state.select_mode(key)?;
        self.puzzle = None;
        self.batch = None;

        info!("Preloading the first {} sentence", key);
        self.load_next_puzzle().await
    }

    /// Reset the round for `key`, start its clock and make sure a puzzle is
    /// loaded.
    ///
    /// A fresh session preloads through [`Session::prepare`] first. A puzzle
    /// already prepared for the same mode is kept; any other restart fetches
    /// anew.
    pub async fn start(&mut self, key: ModeKey) -> Result<LoadOutcome> {
        self.notifications.clear();

        let preloaded = match self.state.status() {
            GameStatus::Loading => Some(self.prepare(key).await?),
            GameStatus::Start if self.state.mode() == key => self
                .puzzle
                .as_ref()
                .map(|puzzle| LoadOutcome::Loaded {
                    puzzle_id: puzzle.id(),
                }),
            _ => None,
        };

        let mode = key.mode();
        info!("Starting {} mode", key);
        self.state.reset(key, &mode);
        self.timer.setup(&mut self.state, mode.timer.as_ref(), true);

        if let Some(outcome) = preloaded {
            return Ok(outcome);
        }
        self.puzzle = None;
        self.batch = None;
        self.load_next_puzzle().await
    }

    /// Install the puzzle for the current level.
    pub async fn load_next_puzzle(&mut self) -> Result<LoadOutcome> {
        if self.settings.selection_strategy == SelectionStrategy::Batch && self.batch.is_some() {
            return self.serve_from_batch();
        }

        let ticket = self.begin_fetch();
        let result = self.provider.fetch_sentences(ticket.query()).await;
        self.complete_fetch(ticket, result)
    }

    /// Issue a fetch ticket for the current level. Any ticket issued earlier
    /// becomes stale.
    pub fn begin_fetch(&mut self) -> FetchTicket {
        self.latest_fetch += 1;

        let query = match self.settings.selection_strategy {
            SelectionStrategy::Range => {
                let range = selector::difficulty_range(self.state.level(), &self.mode().range_policy);
                SentenceQuery::range(range.min, range.max, self.selector.max_word_score())
            }
            SelectionStrategy::Batch => SentenceQuery::corpus(self.selector.max_word_score()),
        };

        debug!("Fetch {} issued with {:?}", self.latest_fetch, query);
        FetchTicket {
            token: self.latest_fetch,
            query,
        }
    }

    /// Apply a provider response. Responses to superseded tickets are dropped
    /// without touching any state.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Vec<SentenceRecord>>,
    ) -> Result<LoadOutcome> {
        if ticket.token != self.latest_fetch {
            debug!(
                "Discarding fetch {} (latest is {})",
                ticket.token, self.latest_fetch
            );
            return Ok(LoadOutcome::Stale);
        }

        let records = match result {
            Ok(records) => records,
            Err(e) => {
                error!("Failed to fetch sentences: {}", e);
                self.notifications
                    .show("Could not load a sentence", Severity::Error);
                return Err(e);
            }
        };
        let pool = selector::prepare_pool(records, self.analyzer.as_ref());

        match self.settings.selection_strategy {
            SelectionStrategy::Range => {
                let level = self.state.level();
                let mode = self.mode();
                match self
                    .selector
                    .select_next(&pool, level, &mode, self.rng.as_mut())
                {
                    Some(puzzle) => self.install(puzzle),
                    None => Ok(self.no_eligible_content()),
                }
            }
            SelectionStrategy::Batch => {
                let ladder = self.selector.pick_batch(&pool, self.rng.as_mut());
                info!("Built a ladder of {} puzzles", ladder.len());
                self.batch = Some(ladder.into());
                self.serve_from_batch()
            }
        }
    }

    fn serve_from_batch(&mut self) -> Result<LoadOutcome> {
        match self.batch.as_mut().and_then(VecDeque::pop_front) {
            Some(puzzle) => self.install(puzzle),
            None => Ok(self.no_eligible_content()),
        }
    }

    fn install(&mut self, puzzle: Puzzle) -> Result<LoadOutcome> {
        let puzzle_id = puzzle.id();
        debug!("Puzzle {}: {}", puzzle_id, puzzle.scrambled_text());
        self.puzzle = Some(puzzle);

        if self.state.status() == GameStatus::Loading {
            self.state.mark_ready()?;
        }
        Ok(LoadOutcome::Loaded { puzzle_id })
    }

    fn no_eligible_content(&mut self) -> LoadOutcome {
        warn!("No eligible sentence for level {}", self.state.level());
        self.puzzle = None;
        self.notifications.show(
            "No sentence fits this level, try a different mode",
            Severity::Error,
        );
        LoadOutcome::NoEligibleContent
    }

    fn active_puzzle(&mut self) -> Result<&mut Puzzle> {
        if !self.state.is_playing() {
            return Err(Error::InvalidTransition(format!(
                "no moves while {:?}",
                self.state.status()
            )));
        }
        self.puzzle.as_mut().ok_or(Error::NoActivePuzzle)
    }

    /// Commit a drag gesture. The final drop runs the solve check in
    /// auto-check modes.
    pub fn drag_reorder(
        &mut self,
        new_order: &[Word],
        is_final_drop: bool,
    ) -> Result<Option<CheckOutcome>> {
        self.active_puzzle()?.drag_reorder(new_order)?;

        if is_final_drop && self.mode().auto_check {
            return self.check_solution(false).map(Some);
        }
        Ok(None)
    }

    /// Click a word: select it, or swap it with the selected one.
    pub fn select_or_swap(&mut self, word_id: u32) -> Result<Option<CheckOutcome>> {
        self.active_puzzle()?.select_or_swap(word_id)?;

        if self.mode().auto_check {
            return self.check_solution(false).map(Some);
        }
        Ok(None)
    }

    /// Compare the arrangement with the solved order.
    ///
    /// `explicit` marks a player submission. Only explicit wrong answers in
    /// modes with finite lives that are not relaxed cost a life.
    pub fn check_solution(&mut self, explicit: bool) -> Result<CheckOutcome> {
        if self.active_puzzle()?.is_solved() {
            return self.on_solved();
        }

        let mode = self.mode();
        if !explicit {
            return Ok(CheckOutcome::Unsolved);
        }
        if mode.relaxed || self.state.lives().is_none() {
            self.notifications.show("Not quite", Severity::Error);
            return Ok(CheckOutcome::Unsolved);
        }

        self.state.update_lives(-1);
        if self.state.is_over() {
            self.timer.stop();
            info!("Out of lives at level {}", self.state.level());
            self.notifications.show("Game over", Severity::Error);
            return Ok(CheckOutcome::GameOver);
        }

        let lives = self.state.lives().unwrap_or_default();
        self.notifications
            .show(format!("Not quite, {} lives left", lives), Severity::Error);
        Ok(CheckOutcome::LifeLost { lives })
    }

    fn on_solved(&mut self) -> Result<CheckOutcome> {
        let mode = self.mode();
        let level = self.state.increment_level()?;
        let earned = hints::grant_random_hint(&mode, &mut self.state, self.rng.as_mut());
        self.timer
            .reset_for_next_sentence(&mut self.state, mode.timer.as_ref());
        self.puzzle = None;

        info!("Solved! Advancing to level {}", level);
        let message = match earned {
            Some(HintKind::ExtraLife) => "Correct! +1 life".to_string(),
            Some(kind) => format!("Correct! +1 hint: {}", kind),
            None => "Correct!".to_string(),
        };
        self.notifications.show(message, Severity::Success);

        Ok(CheckOutcome::Solved { level, earned })
    }

    /// Spend one charge of `kind`. Use [`Session::translate`] for translations.
    pub fn use_hint(&mut self, kind: HintKind) -> Result<HintOutcome> {
        if !self.state.is_playing() {
            return Err(Error::InvalidTransition(format!(
                "no hints while {:?}",
                self.state.status()
            )));
        }

        let result = hints::use_hint(
            kind,
            self.puzzle.as_mut(),
            &mut self.state,
            self.timer.is_running(),
            self.rng.as_mut(),
        );

        match &result {
            Ok(outcome) => {
                let message = match outcome {
                    HintOutcome::Locked { .. } => "Word locked in place".to_string(),
                    HintOutcome::Connected { .. } => "Two words connected".to_string(),
                    HintOutcome::ExtraTime { seconds, .. } => format!("+{} seconds", seconds),
                    HintOutcome::ExtraLife { .. } => "+1 life".to_string(),
                };
                self.notifications.show(message, Severity::Success);
            }
            Err(Error::NoHintAvailable(kind)) => {
                self.notifications
                    .show(format!("No valid {} available", kind), Severity::Error);
            }
            Err(e) => {
                self.notifications.show(e.to_string(), Severity::Error);
            }
        }
        result
    }

    /// Spend a `translate` charge on the active sentence.
    ///
    /// Every failure ends in `None` plus a notification. Whether a failed
    /// call keeps its charge follows `charge_translation_on_failure`.
    pub async fn translate(&mut self, language: Option<&str>) -> Option<String> {
        let language = language
            .map(str::to_string)
            .unwrap_or_else(|| self.settings.translation_language.clone());

        let text = match self.active_puzzle() {
            Ok(puzzle) => puzzle.text().to_string(),
            Err(e) => {
                self.notifications.show(e.to_string(), Severity::Error);
                return None;
            }
        };
        if let Err(e) = hints::ensure_charge(&self.state, HintKind::Translate) {
            self.notifications.show(e.to_string(), Severity::Error);
            return None;
        }
        let Some(translator) = self.translator.as_ref() else {
            self.notifications
                .show("Translation is unavailable", Severity::Error);
            return None;
        };

        if let Err(e) = self.state.update_hints(HintKind::Translate, -1) {
            self.notifications.show(e.to_string(), Severity::Error);
            return None;
        }

        match translator.translate(&text, &language).await {
            Ok(translation) => {
                info!("Translated sentence into {}", language);
                Some(translation)
            }
            Err(e) => {
                warn!("Translation failed: {}", e);
                if !self.settings.charge_translation_on_failure {
                    if let Err(e) = self.state.update_hints(HintKind::Translate, 1) {
                        warn!("Could not refund translate hint: {}", e);
                    }
                }
                self.notifications
                    .show("Translation failed", Severity::Error);
                None
            }
        }
    }

    /// Feed one timer tick.
    pub fn handle_tick(&mut self, generation: u64) -> TickOutcome {
        let outcome = self.timer.tick(generation, &mut self.state);
        if outcome == TickOutcome::Expired {
            self.notifications.show("Time's up!", Severity::Error);
        }
        outcome
    }

    /// Stop the clock, e.g. when the player quits.
    pub fn stop(&mut self) {
        self.timer.stop();
    }
}
