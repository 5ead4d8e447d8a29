use pretty_assertions::assert_eq;
use sentence_unscramble::{
    game::GameStatus,
    hints::HintOutcome,
    models::{RawWord, SelectionStrategy, SentenceRecord},
    modes::{HintKind, ModeKey},
    notify::{NotificationCenter, Severity},
    provider::{MockSentenceProvider, SentenceQuery},
    rng::{RandomSource, SequenceRandom},
    session::{CheckOutcome, LoadOutcome, Session, SessionServices, SessionSettings},
    text::HeuristicAnalyzer,
    timer::{ManualTicker, TickOutcome, TimerState},
    translate::{MockTranslationClient, TranslationService},
    Error,
};
use std::time::Duration;

fn record(id: i64, text: &str, total_score: f64) -> SentenceRecord {
    SentenceRecord {
        id,
        text: text.to_string(),
        words: text
            .split_whitespace()
            .map(|token| RawWord {
                token: token.to_string(),
                tag: "NN".to_string(),
                lemma: token.to_lowercase(),
                difficulty_score: 1.0,
            })
            .collect(),
        total_score,
        prev_sentences: vec![],
        next_sentences: vec![],
    }
}

struct Harness {
    session: Session,
    provider: MockSentenceProvider,
    ticker: ManualTicker,
}

fn harness_with(
    provider: MockSentenceProvider,
    translator: Option<Box<dyn TranslationService>>,
    rng: Box<dyn RandomSource>,
    settings: SessionSettings,
) -> Harness {
    let ticker = ManualTicker::new();
    let session = Session::with_services(
        SessionServices {
            provider: Box::new(provider.clone()),
            translator,
            analyzer: Box::new(HeuristicAnalyzer::new()),
            rng,
            tick_source: Box::new(ticker.clone()),
            // Long enough that nothing clears mid-test.
            notifications: NotificationCenter::new(Duration::from_secs(60)),
        },
        settings,
    );
    Harness {
        session,
        provider,
        ticker,
    }
}

fn harness(provider: MockSentenceProvider) -> Harness {
    harness_with(
        provider,
        None,
        Box::new(SequenceRandom::constant(0.0)),
        SessionSettings::default(),
    )
}

fn solve(session: &mut Session) -> Option<CheckOutcome> {
    let order = session.puzzle().unwrap().original_words().to_vec();
    session.drag_reorder(&order, true).unwrap()
}

#[tokio::test]
async fn test_normal_round_with_mocks() {
    let provider =
        MockSentenceProvider::new().with_sentence(record(1, "The cat sat on the mat .", 6.0));
    let Harness {
        mut session,
        provider,
        ..
    } = harness(provider);

    let outcome = session.start(ModeKey::Normal).await.unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { puzzle_id: 1 });
    assert_eq!(session.state().status(), GameStatus::Playing);
    assert_eq!(
        provider.get_queries(),
        vec![SentenceQuery::range(5.0, 10.0, 3.0)]
    );

    let puzzle = session.puzzle().unwrap();
    assert!(!puzzle.is_solved());
    assert_eq!(puzzle.text(), "The cat sat on the mat .");

    // No auto-check in normal mode: the drop alone does not submit.
    assert_eq!(solve(&mut session), None);

    let outcome = session.check_solution(true).unwrap();
    assert_eq!(
        outcome,
        CheckOutcome::Solved {
            level: 2,
            earned: Some(HintKind::Lock),
        }
    );
    assert!(session.puzzle().is_none());
    assert_eq!(session.state().hints(HintKind::Lock), Some(1));
    assert_eq!(
        session.notifications().current().message,
        "Correct! +1 hint: lock"
    );

    let outcome = session.load_next_puzzle().await.unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { puzzle_id: 2 });
    assert_eq!(provider.get_call_count(), 2);
}

#[tokio::test]
async fn test_wrong_submissions_end_the_game() {
    let provider = MockSentenceProvider::new().with_sentence(record(1, "One two three", 6.0));
    let Harness { mut session, .. } = harness(provider);
    session.start(ModeKey::Normal).await.unwrap();

    // Auto-check style calls never cost a life.
    assert_eq!(session.check_solution(false).unwrap(), CheckOutcome::Unsolved);
    assert_eq!(session.state().lives(), Some(3));

    assert_eq!(
        session.check_solution(true).unwrap(),
        CheckOutcome::LifeLost { lives: 2 }
    );
    assert_eq!(
        session.check_solution(true).unwrap(),
        CheckOutcome::LifeLost { lives: 1 }
    );
    assert_eq!(session.check_solution(true).unwrap(), CheckOutcome::GameOver);

    assert_eq!(session.state().lives(), Some(0));
    assert_eq!(session.state().status(), GameStatus::Over);
    assert!(matches!(
        session.select_or_swap(0),
        Err(Error::InvalidTransition(_))
    ));
}

#[tokio::test]
async fn test_relax_mode_forgives_wrong_submissions() {
    let provider = MockSentenceProvider::new().with_sentence(record(1, "One two three", 6.0));
    let Harness { mut session, .. } = harness(provider);
    session.start(ModeKey::Relax).await.unwrap();

    for _ in 0..5 {
        assert_eq!(session.check_solution(true).unwrap(), CheckOutcome::Unsolved);
    }
    assert_eq!(session.state().lives(), Some(3));
    assert!(session.state().is_playing());
}

#[tokio::test]
async fn test_timer_mode_auto_check_and_expiry() {
    let provider =
        MockSentenceProvider::new().with_sentence(record(1, "Time flies like an arrow", 7.0));
    let Harness {
        mut session,
        ticker,
        ..
    } = harness(provider);

    session.start(ModeKey::Timer).await.unwrap();
    assert_eq!(session.state().time_remaining(), Some(15));
    let first = ticker.active_generation().unwrap();
    assert_eq!(session.handle_tick(first), TickOutcome::Running(14));

    // Timer mode checks on every final drop.
    let outcome = solve(&mut session).unwrap();
    assert!(matches!(outcome, CheckOutcome::Solved { level: 2, .. }));
    assert_eq!(session.state().time_remaining(), Some(15));

    let second = ticker.active_generation().unwrap();
    assert!(second > first);
    assert_eq!(session.handle_tick(first), TickOutcome::Ignored);

    session.load_next_puzzle().await.unwrap();
    for expected in (1..15).rev() {
        assert_eq!(session.handle_tick(second), TickOutcome::Running(expected));
    }
    assert_eq!(session.handle_tick(second), TickOutcome::Expired);

    assert_eq!(session.state().status(), GameStatus::Over);
    assert_eq!(session.timer_state(), TimerState::Stopped);
    assert_eq!(ticker.active_generation(), None);
    let notification = session.notifications().current();
    assert_eq!(notification.message, "Time's up!");
    assert_eq!(notification.severity, Severity::Error);
}

#[tokio::test]
async fn test_extra_time_hint_extends_clock() {
    let provider = MockSentenceProvider::new().with_sentence(record(1, "Go now please", 6.0));
    // 0.999 draws the last timer-mode candidate: extraTime.
    let Harness {
        mut session,
        ticker,
        ..
    } = harness_with(
        provider,
        None,
        Box::new(SequenceRandom::constant(0.999)),
        SessionSettings::default(),
    );

    session.start(ModeKey::Timer).await.unwrap();
    let outcome = solve(&mut session).unwrap();
    assert_eq!(
        outcome,
        CheckOutcome::Solved {
            level: 2,
            earned: Some(HintKind::ExtraTime),
        }
    );
    session.load_next_puzzle().await.unwrap();

    let generation = ticker.active_generation().unwrap();
    session.handle_tick(generation);
    let outcome = session.use_hint(HintKind::ExtraTime).unwrap();

    assert_eq!(
        outcome,
        HintOutcome::ExtraTime {
            seconds: 15,
            remaining: Some(29),
        }
    );
    assert_eq!(session.state().hints(HintKind::ExtraTime), Some(0));
    assert_eq!(session.notifications().current().message, "+15 seconds");
}

#[tokio::test]
async fn test_lock_hint_survives_drags() {
    let provider =
        MockSentenceProvider::new().with_sentence(record(1, "Birds sing in the morning", 8.0));
    let Harness { mut session, .. } = harness(provider);

    session.start(ModeKey::Normal).await.unwrap();
    solve(&mut session);
    session.check_solution(true).unwrap();
    session.load_next_puzzle().await.unwrap();

    let HintOutcome::Locked { word_id, index } = session.use_hint(HintKind::Lock).unwrap() else {
        panic!("expected a lock");
    };
    assert_eq!(session.state().hints(HintKind::Lock), Some(0));
    assert_eq!(
        session.notifications().current().message,
        "Word locked in place"
    );

    let mut reversed = session.puzzle().unwrap().scrambled_words().to_vec();
    reversed.reverse();
    session.drag_reorder(&reversed, true).unwrap();

    let puzzle = session.puzzle().unwrap();
    assert_eq!(puzzle.scrambled_words()[index].id, word_id);
    assert!(puzzle.scrambled_words()[index].locked);

    // Out of charges now.
    assert!(matches!(
        session.use_hint(HintKind::Lock),
        Err(Error::OutOfHints(HintKind::Lock))
    ));
}

#[tokio::test]
async fn test_connect_hint_links_solved_neighbours() {
    let provider = MockSentenceProvider::new().with_sentence(record(1, "Up down", 6.0));
    // 0.5 of the normal weights (3, 3, 1) lands in the connect bucket.
    let Harness { mut session, .. } = harness_with(
        provider,
        None,
        Box::new(SequenceRandom::constant(0.5)),
        SessionSettings::default(),
    );

    session.start(ModeKey::Normal).await.unwrap();
    let order = session.puzzle().unwrap().original_words().to_vec();
    session.drag_reorder(&order, true).unwrap();
    let outcome = session.check_solution(true).unwrap();
    assert_eq!(
        outcome,
        CheckOutcome::Solved {
            level: 2,
            earned: Some(HintKind::Connect),
        }
    );
    session.load_next_puzzle().await.unwrap();

    // "down up": the single pair is valid once.
    assert!(matches!(
        session.use_hint(HintKind::Connect).unwrap(),
        HintOutcome::Connected { left: 0, right: 1, .. }
    ));

    let err = session.use_hint(HintKind::Connect).unwrap_err();
    assert!(matches!(err, Error::OutOfHints(HintKind::Connect)));
}

#[tokio::test]
async fn test_connect_without_valid_pair_keeps_charge_and_notifies() {
    let provider = MockSentenceProvider::new().with_sentence(record(1, "Up down", 6.0));
    let Harness { mut session, .. } = harness_with(
        provider,
        None,
        Box::new(SequenceRandom::constant(0.5)),
        SessionSettings::default(),
    );

    session.start(ModeKey::Normal).await.unwrap();
    for level in [2, 3] {
        solve(&mut session);
        assert_eq!(
            session.check_solution(true).unwrap(),
            CheckOutcome::Solved {
                level,
                earned: Some(HintKind::Connect),
            }
        );
        session.load_next_puzzle().await.unwrap();
    }
    assert_eq!(session.state().hints(HintKind::Connect), Some(2));

    assert!(matches!(
        session.use_hint(HintKind::Connect).unwrap(),
        HintOutcome::Connected { .. }
    ));
    assert_eq!(session.state().hints(HintKind::Connect), Some(1));

    // The only pair is linked now.
    let err = session.use_hint(HintKind::Connect).unwrap_err();
    assert!(matches!(err, Error::NoHintAvailable(HintKind::Connect)));
    assert_eq!(session.state().hints(HintKind::Connect), Some(1));

    let notification = session.notifications().current();
    assert!(notification.show);
    assert_eq!(notification.message, "No valid connect available");
    assert_eq!(notification.severity, Severity::Error);
}

#[tokio::test]
async fn test_timer_mode_checks_after_every_swap() {
    let provider = MockSentenceProvider::new().with_sentence(record(1, "Up down", 6.0));
    let Harness {
        mut session,
        ticker,
        ..
    } = harness(provider);

    session.start(ModeKey::Timer).await.unwrap();
    let ids: Vec<u32> = session
        .puzzle()
        .unwrap()
        .scrambled_words()
        .iter()
        .map(|w| w.id)
        .collect();
    assert_eq!(ids, vec![1, 0]);

    let generation = ticker.active_generation().unwrap();
    assert_eq!(session.handle_tick(generation), TickOutcome::Running(14));

    // Selecting alone leaves the order wrong, which is free in auto-check.
    assert_eq!(session.select_or_swap(1).unwrap(), Some(CheckOutcome::Unsolved));
    assert_eq!(session.puzzle().unwrap().selected_word().unwrap().id, 1);

    let outcome = session.select_or_swap(0).unwrap();
    assert_eq!(
        outcome,
        Some(CheckOutcome::Solved {
            level: 2,
            earned: Some(HintKind::Lock),
        })
    );
    assert_eq!(session.state().time_remaining(), Some(15));
    assert!(ticker.active_generation().unwrap() > generation);
    assert_eq!(
        session.notifications().current().message,
        "Correct! +1 hint: lock"
    );
}

#[tokio::test]
async fn test_batch_mode_serves_ladder_from_one_fetch() {
    let provider = MockSentenceProvider::new().with_sentences(vec![
        record(1, "Hard words appear here now", 20.0),
        record(2, "Easy one here", 6.0),
        record(3, "A middle level sentence", 12.0),
        record(4, "Second easy one", 8.0),
    ]);
    let settings = SessionSettings {
        selection_strategy: SelectionStrategy::Batch,
        ..SessionSettings::default()
    };
    let Harness {
        mut session,
        provider,
        ..
    } = harness_with(
        provider,
        None,
        Box::new(SequenceRandom::constant(0.0)),
        settings,
    );

    session.start(ModeKey::Normal).await.unwrap();
    assert_eq!(provider.get_queries(), vec![SentenceQuery::corpus(3.0)]);

    let mut texts = Vec::new();
    loop {
        let Some(puzzle) = session.puzzle() else {
            break;
        };
        texts.push(puzzle.text().to_string());
        solve(&mut session);
        session.check_solution(true).unwrap();
        session.load_next_puzzle().await.unwrap();
    }

    assert_eq!(
        texts,
        vec![
            "Easy one here",
            "Second easy one",
            "A middle level sentence",
            "Hard words appear here now",
        ]
    );
    assert_eq!(provider.get_call_count(), 1);
    assert_eq!(session.batch_remaining(), Some(0));
    assert!(session
        .notifications()
        .current()
        .message
        .starts_with("No sentence fits"));
}

#[tokio::test]
async fn test_no_eligible_content_notifies() {
    let provider = MockSentenceProvider::new().with_sentence(record(1, "Far too hard", 50.0));
    let Harness { mut session, .. } = harness(provider);

    let outcome = session.start(ModeKey::Normal).await.unwrap();

    assert_eq!(outcome, LoadOutcome::NoEligibleContent);
    assert!(session.puzzle().is_none());
    let notification = session.notifications().current();
    assert!(notification.show);
    assert_eq!(notification.severity, Severity::Error);
    assert!(matches!(
        session.check_solution(true),
        Err(Error::NoActivePuzzle)
    ));
}

#[tokio::test]
async fn test_provider_failure_is_reported() {
    let provider = MockSentenceProvider::new().with_failure(true);
    let Harness { mut session, .. } = harness(provider);

    let err = session.start(ModeKey::Normal).await.unwrap_err();

    assert!(matches!(err, Error::Provider(_)));
    assert_eq!(
        session.notifications().current().message,
        "Could not load a sentence"
    );
}

#[tokio::test]
async fn test_stale_fetch_is_discarded() {
    let provider = MockSentenceProvider::new();
    let Harness { mut session, .. } = harness(provider);
    session.start(ModeKey::Normal).await.unwrap();

    let slow = session.begin_fetch();
    let fast = session.begin_fetch();

    let outcome = session
        .complete_fetch(fast, Ok(vec![record(2, "Fresh sentence wins", 6.0)]))
        .unwrap();
    assert_eq!(outcome, LoadOutcome::Loaded { puzzle_id: 1 });

    let outcome = session
        .complete_fetch(slow, Ok(vec![record(1, "Old sentence loses", 6.0)]))
        .unwrap();
    assert_eq!(outcome, LoadOutcome::Stale);
    assert_eq!(session.puzzle().unwrap().text(), "Fresh sentence wins");
}

async fn relax_session_with_translate(
    translator: MockTranslationClient,
    charge_on_failure: bool,
) -> Session {
    let provider =
        MockSentenceProvider::new().with_sentence(record(1, "I like green apples", 6.0));
    let settings = SessionSettings {
        charge_translation_on_failure: charge_on_failure,
        ..SessionSettings::default()
    };
    // 0.999 of the relax weights (3, 3, 1, 1) lands on translate.
    let Harness { mut session, .. } = harness_with(
        provider,
        Some(Box::new(translator)),
        Box::new(SequenceRandom::constant(0.999)),
        settings,
    );

    session.start(ModeKey::Relax).await.unwrap();
    solve(&mut session);
    let outcome = session.check_solution(true).unwrap();
    assert_eq!(
        outcome,
        CheckOutcome::Solved {
            level: 2,
            earned: Some(HintKind::Translate),
        }
    );
    session.load_next_puzzle().await.unwrap();
    session
}

#[tokio::test]
async fn test_translate_hint_success() {
    let translator = MockTranslationClient::new().with_response("J'aime les pommes vertes".into());
    let mut session = relax_session_with_translate(translator.clone(), true).await;

    let text = session.translate(None).await;

    assert_eq!(text.as_deref(), Some("J'aime les pommes vertes"));
    assert_eq!(session.state().hints(HintKind::Translate), Some(0));
    assert_eq!(
        translator.get_requests(),
        vec![("I like green apples".to_string(), "French".to_string())]
    );
}

#[tokio::test]
async fn test_failed_translation_consumes_charge_when_configured() {
    let translator = MockTranslationClient::new().with_failure(true);
    let mut session = relax_session_with_translate(translator.clone(), true).await;

    assert_eq!(session.translate(Some("German")).await, None);

    assert_eq!(session.state().hints(HintKind::Translate), Some(0));
    assert_eq!(translator.get_call_count(), 1);
    assert_eq!(
        session.notifications().current().message,
        "Translation failed"
    );
}

#[tokio::test]
async fn test_failed_translation_refunds_charge_when_configured() {
    let translator = MockTranslationClient::new().with_failure(true);
    let mut session = relax_session_with_translate(translator.clone(), false).await;

    assert_eq!(session.translate(Some("German")).await, None);

    assert_eq!(session.state().hints(HintKind::Translate), Some(1));
    assert_eq!(translator.get_call_count(), 1);
}

#[tokio::test]
async fn test_translate_disabled_outside_relax() {
    let provider = MockSentenceProvider::new().with_sentence(record(1, "One two three", 6.0));
    let translator = MockTranslationClient::new();
    let Harness { mut session, .. } = harness_with(
        provider,
        Some(Box::new(translator.clone())),
        Box::new(SequenceRandom::constant(0.0)),
        SessionSettings::default(),
    );
    session.start(ModeKey::Normal).await.unwrap();

    assert_eq!(session.translate(None).await, None);
    assert_eq!(translator.get_call_count(), 0);
    assert_eq!(
        session.notifications().current().message,
        Error::HintDisabled(HintKind::Translate).to_string()
    );
}
