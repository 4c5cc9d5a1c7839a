use std::fmt;
use std::io::{self, BufRead, Write};

use radix_core::model::{DifficultyFilter, StudyProgress};
use radix_core::radix::{Base, Conversion};
use rand::SeedableRng;
use rand::rngs::StdRng;
use services::{AppServices, Clock, DEFAULT_EXAM_SIZE, ExamAdvance, ExamSession};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingPositional { name: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidBase { raw: String },
    InvalidDifficulty { raw: String },
    InvalidCount { raw: String },
    InvalidSeed { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingPositional { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidBase { raw } => write!(f, "unknown base: {raw}"),
            ArgsError::InvalidDifficulty { raw } => write!(f, "invalid --difficulty value: {raw}"),
            ArgsError::InvalidCount { raw } => write!(f, "invalid --count value: {raw}"),
            ArgsError::InvalidSeed { raw } => write!(f, "invalid --seed value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- convert <digits> <from> <to>");
    eprintln!("  cargo run -p app -- exam [--db <sqlite_url>] [--difficulty <level>] [--count <n>] [--seed <u64>]");
    eprintln!("  cargo run -p app -- progress [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Bases: 2|bin|binary, 8|oct|octal, 10|dec|decimal, 16|hex|hexadecimal");
    eprintln!("Difficulty: all, beginner, intermediate, advanced");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://radix.sqlite3");
    eprintln!("  --count {DEFAULT_EXAM_SIZE}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  RADIX_DB_URL, RADIX_EXAM_SIZE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Convert,
    Exam,
    Progress,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "convert" => Some(Self::Convert),
            "exam" => Some(Self::Exam),
            "progress" => Some(Self::Progress),
            _ => None,
        }
    }
}

struct ConvertArgs {
    digits: String,
    conversion: Conversion,
}

impl ConvertArgs {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let digits = args
            .next()
            .ok_or(ArgsError::MissingPositional { name: "digits" })?;
        let from = parse_base(args.next(), "from")?;
        let to = parse_base(args.next(), "to")?;
        if let Some(extra) = args.next() {
            return Err(ArgsError::UnknownArg(extra));
        }
        Ok(Self {
            digits,
            conversion: Conversion::new(from, to),
        })
    }
}

fn parse_base(raw: Option<String>, name: &'static str) -> Result<Base, ArgsError> {
    let raw = raw.ok_or(ArgsError::MissingPositional { name })?;
    raw.parse().map_err(|_| ArgsError::InvalidBase { raw })
}

struct StoreArgs {
    db_url: String,
    difficulty: DifficultyFilter,
    count: usize,
    seed: Option<u64>,
}

impl StoreArgs {
    fn parse(
        args: &mut impl Iterator<Item = String>,
        allow_exam_flags: bool,
    ) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("RADIX_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://radix.sqlite3".into(), normalize_sqlite_url);
        let mut count = std::env::var("RADIX_EXAM_SIZE")
            .ok()
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_EXAM_SIZE);
        let mut difficulty = DifficultyFilter::All;
        let mut seed = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--difficulty" if allow_exam_flags => {
                    let value = require_value(args, "--difficulty")?;
                    difficulty = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidDifficulty { raw: value.clone() })?;
                }
                "--count" if allow_exam_flags => {
                    let value = require_value(args, "--count")?;
                    count = value
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| ArgsError::InvalidCount { raw: value.clone() })?;
                }
                "--seed" if allow_exam_flags => {
                    let value = require_value(args, "--seed")?;
                    seed = Some(
                        value
                            .parse()
                            .map_err(|_| ArgsError::InvalidSeed { raw: value.clone() })?,
                    );
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            difficulty,
            count,
            seed,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path = std::path::Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
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

async fn open_services(args: &StoreArgs) -> Result<AppServices, Box<dyn std::error::Error>> {
    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(&args.db_url, Clock::default_clock(), args.count).await?;
    info!(db = %args.db_url, "opened study database");
    Ok(services)
}

fn print_progress(progress: &StudyProgress) {
    println!(
        "Answered {} questions: {} correct, {} wrong ({}% accuracy)",
        progress.total_questions,
        progress.correct_answers,
        progress.wrong_answers,
        progress.accuracy_percent()
    );
    if let Some(last) = progress.last_study_date {
        println!("Last studied {}", last.format("%Y-%m-%d %H:%M UTC"));
    }
}

/// Reads a 1-based option number; `None` at end of input.
fn prompt_option(input: &mut impl BufRead) -> io::Result<Option<usize>> {
    let mut line = String::new();
    loop {
        print!("Your answer (1-4): ");
        io::stdout().flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.trim().parse::<usize>() {
            Ok(n @ 1..=4) => return Ok(Some(n - 1)),
            _ => println!("Enter a number between 1 and 4."),
        }
    }
}

async fn run_exam(args: StoreArgs) -> Result<(), Box<dyn std::error::Error>> {
    let services = open_services(&args).await?;
    let exam_loop = services.exam_loop();
    let mut session: ExamSession = match args.seed {
        Some(seed) => exam_loop.start_exam(args.difficulty, &mut StdRng::seed_from_u64(seed))?,
        None => exam_loop.start_exam_random(args.difficulty)?,
    };

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        let Some(question) = session.current_question() else {
            break;
        };
        println!();
        println!(
            "[{}/{}] ({}) {}",
            session.position() + 1,
            session.len(),
            question.difficulty(),
            question.prompt()
        );
        for (i, option) in question.options().iter().enumerate() {
            println!("  {}. {option}", i + 1);
        }

        let Some(choice) = prompt_option(&mut input)? else {
            println!();
            println!("Exam abandoned; nothing was recorded.");
            return Ok(());
        };
        let feedback = exam_loop.answer(&mut session, choice)?;
        if feedback.is_correct {
            println!("Correct. {}", feedback.explanation);
        } else {
            println!(
                "Wrong, the answer is {}. {}",
                feedback.correct_answer + 1,
                feedback.explanation
            );
        }

        match exam_loop.advance(&mut session).await {
            Ok(ExamAdvance::Next { .. }) => {}
            Ok(ExamAdvance::Completed { score, progress }) => {
                println!();
                println!(
                    "Score: {}/{} ({}%). {}",
                    score.correct(),
                    score.total(),
                    score.percentage(),
                    score.verdict().message()
                );
                print_progress(&progress);
            }
            Err(err) if session.is_complete() => {
                eprintln!("could not record result: {err}; retrying once");
                let progress = exam_loop.finalize_progress(&mut session).await?;
                print_progress(&progress);
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);

    let cmd = match argv.next() {
        None => {
            print_usage();
            return Ok(());
        }
        Some(first) if first == "--help" || first == "-h" => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(&first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            io::Error::new(io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let report = |e: ArgsError| {
        eprintln!("{e}");
        print_usage();
        e
    };

    match cmd {
        Command::Convert => {
            let args = ConvertArgs::parse(&mut argv).map_err(report)?;
            let answer = AppServices::in_memory(Clock::default_clock())?
                .practice()
                .convert(&args.digits, args.conversion)?;
            println!("{}", answer.output);
        }
        Command::Exam => {
            let args = StoreArgs::parse(&mut argv, true).map_err(report)?;
            run_exam(args).await?;
        }
        Command::Progress => {
            let args = StoreArgs::parse(&mut argv, false).map_err(report)?;
            let services = open_services(&args).await?;
            match services.ledger().load().await? {
                Some(progress) => print_progress(&progress),
                None => println!("No study progress recorded yet."),
            }
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> std::vec::IntoIter<String> {
        raw.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_convert_arguments() {
        let parsed = ConvertArgs::parse(&mut args(&["2A", "hex", "2"])).unwrap();
        assert_eq!(parsed.digits, "2A");
        assert_eq!(
            parsed.conversion,
            Conversion::new(Base::Hexadecimal, Base::Binary)
        );
        assert!(matches!(
            ConvertArgs::parse(&mut args(&["2A", "hex"])),
            Err(ArgsError::MissingPositional { name: "to" })
        ));
        assert!(matches!(
            ConvertArgs::parse(&mut args(&["2A", "base7", "2"])),
            Err(ArgsError::InvalidBase { .. })
        ));
    }

    #[test]
    fn parses_exam_flags() {
        let parsed = StoreArgs::parse(
            &mut args(&[
                "--db",
                "sqlite::memory:",
                "--difficulty",
                "beginner",
                "--count",
                "3",
                "--seed",
                "7",
            ]),
            true,
        )
        .unwrap();
        assert_eq!(parsed.db_url, "sqlite::memory:");
        assert_eq!(parsed.difficulty.to_string(), "beginner");
        assert_eq!(parsed.count, 3);
        assert_eq!(parsed.seed, Some(7));
    }

    #[test]
    fn progress_rejects_exam_flags() {
        assert!(matches!(
            StoreArgs::parse(&mut args(&["--count", "3"]), false),
            Err(ArgsError::UnknownArg(_))
        ));
        assert!(matches!(
            StoreArgs::parse(&mut args(&["--count", "0"]), true),
            Err(ArgsError::InvalidCount { .. })
        ));
    }

    #[test]
    fn normalizes_relative_paths() {
        let url = normalize_sqlite_url("sqlite:data/radix.sqlite3".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/radix.sqlite3"));
        assert_eq!(
            normalize_sqlite_url("sqlite::memory:".into()),
            "sqlite::memory:"
        );
    }
}
