mod chat;
mod clipboard;

use std::io::{self, ErrorKind, Write};
use std::path::PathBuf;

use anyhow::Result;
use askgem_contracts::chat::parse_intent;
use askgem_contracts::errors::QueryFailure;
use askgem_contracts::events::EventWriter;
use askgem_contracts::request::{prefill_query, Depth};
use askgem_contracts::settings::{Settings, PROVIDER_DRYRUN};
use askgem_engine::{display_text, format_outcome, QueryEngine, QueryForm, QueryOutcome};
use chat::ChatSession;
use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "askgem",
    version,
    about = "Ask Gemini about a question or the latest screenshot"
)]
struct Cli {
    /// JSON settings file (defaults to <config dir>/askgem/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Append query lifecycle events to this JSONL file
    #[arg(long, global = true)]
    events: Option<PathBuf>,
    /// Answer locally without calling Gemini
    #[arg(long, global = true)]
    dryrun: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Ask(AskArgs),
    Quick(QuickArgs),
    Chat(ChatArgs),
}

#[derive(Debug, Parser)]
struct AskArgs {
    /// Falls back to `default_query`
    #[arg(long)]
    query: Option<String>,
    #[arg(long)]
    image: Option<PathBuf>,
    #[arg(long, default_value = "balanced")]
    depth: Depth,
    #[arg(long)]
    copy: bool,
    #[arg(long)]
    show_thoughts: bool,
}

#[derive(Debug, Parser)]
struct QuickArgs {
    /// Overrides `images_directory`
    #[arg(long)]
    dir: Option<PathBuf>,
    #[arg(long)]
    copy: bool,
    #[arg(long)]
    show_thoughts: bool,
}

#[derive(Debug, Parser)]
struct ChatArgs {
    #[arg(long, default_value = "balanced")]
    depth: Depth,
    #[arg(long)]
    show_thoughts: bool,
}

fn main() {
    init_tracing();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("askgem error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("ASKGEM_LOG").unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let engine = build_engine(&cli)?;
    match cli.command {
        Command::Ask(args) => run_ask(engine, args),
        Command::Quick(args) => run_quick(engine, args),
        Command::Chat(args) => run_chat(engine, args),
    }
}

fn build_engine(cli: &Cli) -> Result<QueryEngine> {
    let mut settings = Settings::resolve(cli.config.as_deref())?;
    if cli.dryrun {
        settings.provider = PROVIDER_DRYRUN.to_string();
    }
    settings.validate()?;

    let events_path = cli.events.clone().or_else(|| settings.events_path.clone());
    let mut engine = QueryEngine::from_settings(settings);
    if let Some(path) = events_path {
        let session_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(path = %path.display(), %session_id, "event log enabled");
        engine = engine.with_events(EventWriter::new(path, session_id));
    }
    Ok(engine)
}

fn run_ask(mut engine: QueryEngine, args: AskArgs) -> Result<i32> {
    let form = ask_form(&args, engine.settings().default_query.as_deref());
    eprintln!("Generating response...");
    let result = engine.submit(&form, now_ms());
    Ok(present(&result, args.copy, args.show_thoughts))
}

fn run_quick(engine: QueryEngine, args: QuickArgs) -> Result<i32> {
    eprintln!("Generating response...");
    let result = match args.dir.as_deref() {
        Some(dir) => engine.quick_query_in(dir),
        None => engine.quick_query(),
    };
    if let Ok(outcome) = &result {
        if let Some(path) = outcome.image_path.as_deref() {
            eprintln!("Queried {}", path.display());
        }
    }
    Ok(present(&result, args.copy, args.show_thoughts))
}

/// Interactive form: plain lines submit, slash commands adjust the form.
fn run_chat(engine: QueryEngine, args: ChatArgs) -> Result<i32> {
    let draft = prefill_query(clipboard::read_text().as_deref())
        .or_else(|| engine.settings().default_query.clone());
    let mut session = ChatSession::new(engine, args.depth, draft, args.show_thoughts);

    println!(
        "askgem chat started (depth: {}). Type /help for commands.",
        session.depth()
    );
    if let Some(text) = session.draft() {
        println!("Draft: {text}");
        println!("Press Enter to submit it.");
    }

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        let reply = session.handle(&parse_intent(input), now_ms());
        for text in &reply.lines {
            println!("{text}");
        }
        if let Some(text) = reply.copy.as_deref() {
            copy_response(text);
        }
        if reply.quit {
            break;
        }
    }
    Ok(0)
}

/// Prints the response or failure message; returns the process exit code.
fn present(result: &Result<QueryOutcome, QueryFailure>, copy: bool, show_thoughts: bool) -> i32 {
    match result {
        Ok(outcome) => {
            println!("{}", format_outcome(outcome, show_thoughts));
            if copy {
                copy_response(&outcome.text);
            }
            0
        }
        Err(_) => {
            println!("{}", display_text(result));
            1
        }
    }
}

fn copy_response(text: &str) {
    match clipboard::copy_text(text) {
        Ok(()) => eprintln!("Copied response to clipboard"),
        Err(err) => eprintln!("Copy failed: {err:#}"),
    }
}

/// The clipboard is never sent unseen; only the `chat` form offers it as a draft.
fn ask_form(args: &AskArgs, default_query: Option<&str>) -> QueryForm {
    let query = args
        .query
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .or(default_query)
        .unwrap_or_default()
        .to_string();
    QueryForm {
        query,
        image: args.image.clone(),
        depth: args.depth,
    }
}

fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use askgem_contracts::errors::FailureKind;
    use askgem_contracts::request::Depth;
    use askgem_contracts::settings::{Settings, PROVIDER_DRYRUN};
    use askgem_engine::{DryrunModel, QueryEngine};

    use super::{ask_form, AskArgs, Cli, Command};

    fn ask_args(argv: &[&str]) -> AskArgs {
        let mut full = vec!["askgem", "ask"];
        full.extend_from_slice(argv);
        match Cli::try_parse_from(full).map(|cli| cli.command) {
            Ok(Command::Ask(args)) => args,
            other => panic!("expected ask arguments, got {other:?}"),
        }
    }

    #[test]
    fn explicit_query_wins_over_default() {
        let form = ask_form(&ask_args(&["--query", "typed"]), Some("default"));
        assert_eq!(form.query, "typed");
        assert_eq!(form.depth, Depth::Balanced);
    }

    #[test]
    fn blank_query_falls_back_to_default_query() {
        let form = ask_form(&ask_args(&["--query", "  "]), Some("default"));
        assert_eq!(form.query, "default");
        assert_eq!(ask_form(&ask_args(&[]), None).query, "");
    }

    #[test]
    fn ask_without_any_query_fails_validation() {
        let settings = Settings {
            provider: PROVIDER_DRYRUN.to_string(),
            ..Settings::default()
        };
        let mut engine = QueryEngine::new(settings, Box::new(DryrunModel));
        let result = engine.submit(&ask_form(&ask_args(&[]), None), 1_000);
        assert_eq!(
            result.err().map(|failure| failure.kind()),
            Some(FailureKind::Validation)
        );
    }

    #[test]
    fn ask_arguments_parse_depth_and_globals() {
        let cli = Cli::try_parse_from([
            "askgem",
            "ask",
            "--query",
            "What is 2+2?",
            "--depth",
            "deep",
            "--dryrun",
            "--copy",
        ]);
        let Ok(cli) = cli else {
            panic!("ask arguments should parse");
        };
        assert!(cli.dryrun);
        match cli.command {
            Command::Ask(args) => {
                assert_eq!(args.query.as_deref(), Some("What is 2+2?"));
                assert_eq!(args.depth, Depth::Deep);
                assert!(args.copy);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_depth_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["askgem", "chat", "--depth", "extreme"]).is_err());
    }
}
