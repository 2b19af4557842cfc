use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use services::{AppServices, ChatGenerator, Clock, DocumentExtractor, HostStep};
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod console;
mod flows;

use console::Console;
use flows::SessionOptions;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => {
                write!(f, "invalid {flag} value: {raw} (expected a positive number)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn require_number(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<u32, ArgsError> {
    let value = require_value(args, flag)?;
    match value.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ArgsError::InvalidNumber { flag, raw: value }),
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  study [study]  [--file <path>] [--title <title>] [--db <sqlite_url>]");
    eprintln!("  study plan     [--file <path>] [--title <title>] [--days <n>] [--db <sqlite_url>]");
    eprintln!("  study quiz     [--file <path>] [--title <title>] [--questions <n>] [--db <sqlite_url>]");
    eprintln!("  study history  [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://study.sqlite3");
    eprintln!("  --days 7 (clamped to 1..=90)");
    eprintln!("  --questions 10");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_DB_URL, STUDY_AI_API_KEY, STUDY_AI_BASE_URL, STUDY_AI_MODEL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Study,
    Plan,
    Quiz,
    History,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "study" => Some(Self::Study),
            "plan" => Some(Self::Plan),
            "quiz" => Some(Self::Quiz),
            "history" => Some(Self::History),
            _ => None,
        }
    }

    fn workflow(self) -> Option<HostStep> {
        match self {
            Self::Plan => Some(HostStep::Plan),
            Self::Quiz => Some(HostStep::Quiz),
            Self::Study | Self::History => None,
        }
    }
}

struct Args {
    db_url: String,
    file: Option<PathBuf>,
    title: Option<String>,
    days: Option<u32>,
    questions: Option<u32>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self {
            db_url: std::env::var("STUDY_DB_URL")
                .ok()
                .map_or_else(|| "sqlite://study.sqlite3".into(), normalize_sqlite_url),
            file: None,
            title: None,
            days: None,
            questions: None,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--file" => parsed.file = Some(require_value(args, "--file")?.into()),
                "--title" => parsed.title = Some(require_value(args, "--title")?),
                "--days" => parsed.days = Some(require_number(args, "--days")?),
                "--questions" => parsed.questions = Some(require_number(args, "--questions")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn session_options(self, cmd: Command) -> SessionOptions {
        SessionOptions {
            file: self.file,
            title: self.title,
            workflow: cmd.workflow(),
            days: self.days,
            questions: self.questions,
        }
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

/// Open the store, or fall back to sessions that are not saved.
async fn build_services(db_url: &str, clock: Clock) -> AppServices {
    let opened = match prepare_sqlite_file(db_url) {
        Ok(()) => AppServices::new_sqlite(db_url, clock)
            .await
            .map_err(|e| e.to_string()),
        Err(err) => Err(err.to_string()),
    };
    opened.unwrap_or_else(|err| {
        warn!(db_url, error = %err, "database unavailable, running without persistence");
        AppServices::offline(
            Arc::new(ChatGenerator::from_env()),
            Arc::new(DocumentExtractor),
            clock,
        )
    })
}

async fn print_history(services: &AppServices) -> Result<(), Box<dyn std::error::Error>> {
    let Some(history) = services.history() else {
        println!("No saved history (persistence is unavailable).");
        return Ok(());
    };

    println!("Materials:");
    for material in history.materials().await? {
        println!(
            "  #{} {} ({})",
            material.id,
            material.title,
            material.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    println!("Study plans:");
    for item in history.plans().await? {
        println!(
            "  {} - {} days, {:.0}% complete",
            item.plan.title(),
            item.plan.days().len(),
            item.completion_ratio() * 100.0
        );
    }

    println!("Quiz results:");
    for record in history.quiz_results().await? {
        let result = &record.result;
        println!(
            "  quiz #{}: {}/{} ({}%) {} on {}",
            record.quiz_id,
            result.score,
            result.total_questions,
            result.percentage(),
            result.grade().label(),
            result.completed_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Without a subcommand, run the full upload → choose flow.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Study,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Study,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let clock = Clock::default();
    let services = build_services(&parsed.db_url, clock).await;

    match cmd {
        Command::History => print_history(&services).await,
        Command::Study | Command::Plan | Command::Quiz => {
            let mut host = services.host();
            let mut console = Console::new();
            flows::run_session(&mut host, &mut console, parsed.session_options(cmd)).await?;
            host.flush().await;
            if host.mirror().failed_writes() > 0 {
                eprintln!("Some progress could not be saved; see the log for details.");
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,services=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_owned());
        Args::parse(&mut iter)
    }

    #[test]
    fn parses_session_flags() {
        let args = parse(&["--file", "notes.md", "--days", "14", "--questions", "5"]).unwrap();
        assert_eq!(args.file, Some(PathBuf::from("notes.md")));
        assert_eq!(args.days, Some(14));
        assert_eq!(args.questions, Some(5));
    }

    #[test]
    fn rejects_zero_and_missing_values() {
        assert!(matches!(
            parse(&["--questions", "0"]),
            Err(ArgsError::InvalidNumber { flag: "--questions", .. })
        ));
        assert!(matches!(
            parse(&["--days"]),
            Err(ArgsError::MissingValue { flag: "--days" })
        ));
        assert!(matches!(parse(&["--bogus"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn memory_and_absolute_urls_are_kept() {
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
        assert_eq!(
            normalize_sqlite_url("sqlite:/tmp/study.db".into()),
            "sqlite:///tmp/study.db"
        );
    }
}
