use anyhow::Result;
use clap::Parser;
use sentence_unscramble::hints::HintOutcome;
use sentence_unscramble::models::{Config, Puzzle, SelectionStrategy};
use sentence_unscramble::modes::{HintKind, ModeKey};
use sentence_unscramble::session::{CheckOutcome, LoadOutcome, Session};
use sentence_unscramble::timer::{TickOutcome, TokioTicker};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "sentence-unscramble")]
#[command(about = "Put scrambled sentences back in order")]
struct CliArgs {
    /// Game mode: normal, timer, countdown or relax.
    #[arg(long, default_value = "normal", value_parser = parse_mode_arg)]
    mode: ModeKey,

    /// Seed for reproducible sentence picks and hint draws.
    #[arg(long)]
    seed: Option<u64>,

    /// Fetch the whole corpus once and play a fixed level ladder.
    #[arg(long)]
    batch: bool,
}

fn parse_mode_arg(input: &str) -> std::result::Result<ModeKey, String> {
    input.parse()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Show,
    Select(u32),
    Drag(Vec<u32>),
    Check,
    Hint(HintKind),
    Translate(Option<String>),
    Restart(Option<ModeKey>),
    Context,
    Help,
    Quit,
}

fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let mut parts = line.split_whitespace();
    let Some(name) = parts.next() else {
        return Ok(Command::Show);
    };
    let rest: Vec<&str> = parts.collect();

    let parse_id = |raw: &str| {
        raw.parse::<u32>()
            .map_err(|_| format!("'{}' is not a word id", raw))
    };

    match name.to_ascii_lowercase().as_str() {
        "show" | "s" => Ok(Command::Show),
        "select" | "swap" | "x" => match rest.as_slice() {
            [id] => parse_id(id).map(Command::Select),
            _ => Err("usage: select <id>".to_string()),
        },
        "drag" | "d" => {
            if rest.is_empty() {
                return Err("usage: drag <id> <id> ...".to_string());
            }
            rest.iter()
                .map(|raw| parse_id(raw))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Command::Drag)
        }
        "check" | "c" => Ok(Command::Check),
        "hint" | "h" => match rest.as_slice() {
            [kind] => kind.parse().map(Command::Hint),
            _ => Err("usage: hint <lock|connect|time|life|translate>".to_string()),
        },
        "translate" | "t" => Ok(Command::Translate(
            (!rest.is_empty()).then(|| rest.join(" ")),
        )),
        "restart" | "r" => match rest.as_slice() {
            [] => Ok(Command::Restart(None)),
            [mode] => mode.parse().map(|m| Command::Restart(Some(m))),
            _ => Err("usage: restart [mode]".to_string()),
        },
        "context" | "ctx" => Ok(Command::Context),
        "help" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command '{}', try 'help'", other)),
    }
}

const HELP: &str = "\
commands:
  show                      print the current arrangement
  select <id>               select a word, or swap it with the selected one
  drag <id> <id> ...        commit a full reordering by word id
  check                     submit the current arrangement
  hint <kind>               use a lock, connect, time or life hint
  translate [language]      spend a translate hint
  restart [mode]            start a new round
  context                   show the sentences around this one
  quit";

fn render_puzzle(puzzle: &Puzzle) -> String {
    puzzle
        .scrambled_words()
        .iter()
        .map(|word| {
            let left = if word.connection_left.is_some() { "<" } else { "" };
            let right = if word.connection_right.is_some() { ">" } else { "" };
            let lock = if word.locked { "*" } else { "" };
            let mark = if word.selected { "!" } else { "" };
            format!("{}{}:{}{}{}{}", left, word.id, word.token, lock, mark, right)
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn render_context(puzzle: &Puzzle) -> String {
    let related = puzzle.related();
    let mut lines: Vec<String> = related
        .prev
        .iter()
        .map(|s| format!("  before: {}", s.text))
        .collect();
    lines.push("  (this sentence)".to_string());
    lines.extend(related.next.iter().map(|s| format!("  after:  {}", s.text)));
    lines.join("\n")
}

fn print_status(session: &Session) {
    let state = session.state();
    let lives = state
        .lives()
        .map_or_else(|| "inf".to_string(), |l| l.to_string());
    let hints = HintKind::ALL
        .iter()
        .filter_map(|&kind| state.hints(kind).map(|n| format!("{}={}", kind, n)))
        .collect::<Vec<_>>()
        .join(" ");
    let time = state
        .time_remaining()
        .map(|t| format!(" time={}s", t))
        .unwrap_or_default();

    println!(
        "level {} | lives {} | {}{}",
        state.level(),
        lives,
        hints,
        time
    );
    match session.puzzle() {
        Some(puzzle) => println!("{}", render_puzzle(puzzle)),
        None => println!("(no puzzle loaded)"),
    }
}

async fn load_next(session: &mut Session) {
    match session.load_next_puzzle().await {
        Ok(LoadOutcome::Loaded { .. }) => print_status(session),
        Ok(LoadOutcome::NoEligibleContent) => {
            println!("No more sentences for this level. Try 'restart' with another mode.")
        }
        Ok(LoadOutcome::Stale) => {}
        Err(e) => error!("Failed to load the next sentence: {}", e),
    }
}

async fn after_check(session: &mut Session, outcome: CheckOutcome) {
    match outcome {
        CheckOutcome::Solved { .. } => load_next(session).await,
        CheckOutcome::GameOver => {
            println!("Game over at level {}", session.state().level());
        }
        CheckOutcome::LifeLost { .. } | CheckOutcome::Unsolved => print_status(session),
    }
}

/// Returns `false` when the player asked to quit.
async fn handle_command(session: &mut Session, command: Command) -> bool {
    match command {
        Command::Show => print_status(session),
        Command::Help => println!("{}", HELP),
        Command::Context => match session.puzzle() {
            Some(puzzle) => println!("{}", render_context(puzzle)),
            None => println!("No puzzle loaded"),
        },
        Command::Quit => return false,
        Command::Select(id) => match session.select_or_swap(id) {
            Ok(Some(outcome)) => after_check(session, outcome).await,
            Ok(None) => print_status(session),
            Err(e) => println!("{}", e),
        },
        Command::Drag(ids) => {
            let Some(puzzle) = session.puzzle() else {
                println!("No puzzle loaded");
                return true;
            };
            let words = puzzle.scrambled_words();
            let new_order = ids
                .iter()
                .filter_map(|id| words.iter().find(|w| w.id == *id).cloned())
                .collect::<Vec<_>>();
            match session.drag_reorder(&new_order, true) {
                Ok(Some(outcome)) => after_check(session, outcome).await,
                Ok(None) => print_status(session),
                Err(e) => println!("{}", e),
            }
        }
        Command::Check => match session.check_solution(true) {
            Ok(outcome) => after_check(session, outcome).await,
            Err(e) => println!("{}", e),
        },
        Command::Hint(HintKind::Translate) => {
            if let Some(text) = session.translate(None).await {
                println!("{}", text);
            }
        }
        Command::Hint(kind) => {
            if let Ok(outcome) = session.use_hint(kind) {
                if let HintOutcome::ExtraTime { remaining: Some(t), .. } = outcome {
                    println!("{}s left", t);
                }
                print_status(session);
            }
        }
        Command::Translate(language) => {
            if let Some(text) = session.translate(language.as_deref()).await {
                println!("{}", text);
            }
        }
        Command::Restart(mode) => {
            let key = mode.unwrap_or_else(|| session.state().mode());
            match session.start(key).await {
                Ok(LoadOutcome::Loaded { .. }) => print_status(session),
                Ok(_) => println!("No sentence available for this mode"),
                Err(e) => error!("Failed to start a new round: {}", e),
            }
        }
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sentence_unscramble=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let mut config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    if args.batch {
        config.selection_strategy = SelectionStrategy::Batch;
    }

    info!("Starting sentence-unscramble in {} mode", args.mode);

    let (ticker, mut ticks) = TokioTicker::channel();
    let mut session = Session::new(&config, Box::new(ticker), args.seed);
    let mut notifications = session.notifications().subscribe();

    match session.start(args.mode).await {
        Ok(LoadOutcome::Loaded { .. }) => print_status(&session),
        Ok(_) => println!("No sentence available, check the sentence server"),
        Err(e) => {
            error!("Failed to start: {}", e);
            std::process::exit(1);
        }
    }
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match parse_command(&line) {
                    Ok(command) => {
                        if !handle_command(&mut session, command).await {
                            break;
                        }
                    }
                    Err(message) => println!("{}", message),
                }
            }
            Some(generation) = ticks.recv() => {
                match session.handle_tick(generation) {
                    TickOutcome::Running(remaining) if remaining <= 5 => {
                        println!("{}s left", remaining);
                    }
                    TickOutcome::Expired => {
                        println!("Game over at level {}", session.state().level());
                    }
                    _ => {}
                }
            }
            Ok(()) = notifications.changed() => {
                let notification = notifications.borrow_and_update().clone();
                if notification.show {
                    println!("[{:?}] {}", notification.severity, notification.message);
                }
            }
        }
    }

    session.stop();
    info!("Goodbye");
    Ok(())
}
