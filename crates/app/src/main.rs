use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{ChoiceId, LanguageCode};
use services::hint::{EnvToken, HintChannel, HintConfig, HintEventKind};
use services::quiz::{Feedback, QuestionView, QuizController, Step, shuffle_choices};
use services::{Clock, HintApplied, SummaryRecorder, load_questions_json};
use storage::repository::{QuizSummaryRepository, Storage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingQuestions,
    InvalidLanguage { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingQuestions => write!(f, "no question file given (--questions)"),
            ArgsError::InvalidLanguage { raw } => write!(f, "invalid --lang value: {raw}"),
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  quiz --questions <file.json> [--db <sqlite_url>] [--lang <code>] [--shuffle]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://quiz.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_QUESTIONS, QUIZ_DB_URL, QUIZ_LANG");
    eprintln!("  QUIZ_ASSISTANT_URL, QUIZ_ASSISTANT_TOKEN, QUIZ_ASSISTANT_SYSTEM_PROMPT");
    eprintln!("  RUST_LOG (default: info)");
}

fn print_commands() {
    println!("Commands: <number> pick | next | back | hint <text> | close | restart | history | quit");
}

#[derive(Debug)]
struct Args {
    questions: PathBuf,
    db_url: String,
    language: Option<LanguageCode>,
    shuffle: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut questions = std::env::var("QUIZ_QUESTIONS").ok().map(PathBuf::from);
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://quiz.sqlite3".into(), normalize_sqlite_url);
        let mut language = std::env::var("QUIZ_LANG")
            .ok()
            .map(|raw| parse_language(&raw))
            .transpose()?;
        let mut shuffle = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--questions" => questions = Some(PathBuf::from(require_value(args, "--questions")?)),
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--lang" => language = Some(parse_language(&require_value(args, "--lang")?)?),
                "--shuffle" => shuffle = true,
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let questions = questions.ok_or(ArgsError::MissingQuestions)?;
        Ok(Some(Self {
            questions,
            db_url,
            language,
            shuffle,
        }))
    }
}

fn parse_language(raw: &str) -> Result<LanguageCode, ArgsError> {
    LanguageCode::new(raw).map_err(|_| ArgsError::InvalidLanguage {
        raw: raw.to_owned(),
    })
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

//
// ─── INTERACTIVE COMMANDS ──────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Pick(String),
    Next,
    Back,
    Hint(String),
    Close,
    Restart,
    History,
    Help,
    Quit,
}

impl Command {
    fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match word {
            "" => None,
            "next" | "n" => Some(Self::Next),
            "back" | "b" => Some(Self::Back),
            "hint" | "h" => Some(Self::Hint(rest.to_owned())),
            "close" => Some(Self::Close),
            "restart" => Some(Self::Restart),
            "history" => Some(Self::History),
            "help" | "?" => Some(Self::Help),
            "quit" | "q" | "exit" => Some(Self::Quit),
            "pick" if !rest.is_empty() => Some(Self::Pick(rest.to_owned())),
            other => Some(Self::Pick(other.to_owned())),
        }
    }
}

/// Resolves a pick by 1-based position first, then by choice id.
fn resolve_choice(view: &QuestionView, raw: &str) -> ChoiceId {
    raw.parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| view.choices.get(i))
        .map_or_else(|| ChoiceId::new(raw), |choice| choice.id.clone())
}

fn render(controller: &QuizController) {
    if let Some(summary) = controller.summary() {
        println!();
        println!(
            "Finished: {}/{} correct ({}%). Type `restart` to try again.",
            summary.score(),
            summary.total(),
            summary.percent()
        );
        return;
    }
    let Some(view) = controller.view() else {
        return;
    };
    println!();
    println!("Question {}/{}: {}", view.index + 1, view.total, view.prompt);
    for (position, choice) in view.choices.iter().enumerate() {
        let marker = if choice.selected { ">" } else { " " };
        let feedback = match choice.feedback {
            Some(Feedback::Correct) => " (correct)",
            Some(Feedback::Incorrect) => " (incorrect)",
            None => "",
        };
        println!("{marker} {}) {}{feedback}", position + 1, choice.term);
    }
}

async fn handle(
    command: Command,
    controller: &mut QuizController,
    storage: &Storage,
) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        Command::Pick(raw) => {
            let Some(view) = controller.view() else {
                return Ok(true);
            };
            let choice = resolve_choice(&view, &raw);
            if let Err(err) = controller.select_answer(&choice) {
                debug!(error = %err, "selection ignored");
            }
            render(controller);
        }
        Command::Next => match controller.confirm_and_advance() {
            Ok(advance) => {
                let verdict = if advance.evaluation.correct { "Correct" } else { "Wrong" };
                println!("{verdict}. Score: {}", advance.score);
                if let Step::Completed(_) = advance.step {
                    debug!("session complete");
                }
                render(controller);
            }
            Err(err) => debug!(error = %err, "advance ignored"),
        },
        Command::Back => match controller.go_to_previous() {
            Ok(_) => render(controller),
            Err(err) => debug!(error = %err, "back ignored"),
        },
        Command::Hint(text) => {
            controller.open_hint();
            match controller.send_hint(&text) {
                Ok(_) => print!("hint> "),
                Err(err) => println!("(hint not sent: {err})"),
            }
        }
        Command::Close => controller.close_hint(),
        Command::Restart => {
            controller.restart();
            render(controller);
        }
        Command::History => {
            let rows = storage.summaries.list_recent(5).await?;
            if rows.is_empty() {
                println!("No finished quizzes yet.");
            }
            for row in rows {
                let summary = row.summary;
                println!(
                    "{}  {}/{} ({}%)",
                    summary.completed_at().format("%Y-%m-%d %H:%M"),
                    summary.score(),
                    summary.total(),
                    summary.percent()
                );
            }
        }
        Command::Help => print_commands(),
        Command::Quit => return Ok(false),
    }
    std::io::stdout().flush()?;
    Ok(true)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let Some(args) = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?
    else {
        print_usage();
        return Ok(());
    };

    let raw = std::fs::read_to_string(&args.questions)?;
    let mut questions = load_questions_json(&raw)?;
    if args.shuffle {
        shuffle_choices(&mut questions, &mut rand::rng());
    }

    prepare_sqlite_file(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;
    let (sink, recorder) = SummaryRecorder::spawn(Arc::clone(&storage.summaries));

    let mut controller = QuizController::new(Clock::system(), questions, sink)?
        .with_language(args.language);
    match HintConfig::from_env()? {
        Some(config) => {
            let channel = HintChannel::from_config(&config, Arc::new(EnvToken::default()))?;
            controller = controller.with_hints(channel);
        }
        None => debug!("QUIZ_ASSISTANT_URL not set; hints disabled"),
    }

    print_commands();
    render(&controller);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let hints_enabled = controller.hints_enabled();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let Some(command) = Command::parse(&line) else { continue };
                if !handle(command, &mut controller, &storage).await? {
                    break;
                }
            }
            Some(event) = controller.next_hint_event(), if hints_enabled => {
                let kind = event.kind.clone();
                if controller.apply_hint_event(event) == HintApplied::Applied {
                    match kind {
                        HintEventKind::Chunk(text) => print!("{text}"),
                        HintEventKind::Finished => println!(),
                        HintEventKind::Failed(message) => println!("\n(hint failed: {message})"),
                    }
                    std::io::stdout().flush()?;
                }
            }
        }
    }

    drop(controller);
    let report = recorder.finish().await;
    debug!(stored = report.stored, failed = report.failed, "summary recorder finished");
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::quiz::ChoiceView;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Command::parse("  "), None);
        assert_eq!(Command::parse("n"), Some(Command::Next));
        assert_eq!(Command::parse("hint why not B?"), Some(Command::Hint("why not B?".into())));
        assert_eq!(Command::parse("2"), Some(Command::Pick("2".into())));
        assert_eq!(Command::parse("pick a"), Some(Command::Pick("a".into())));
        assert_eq!(Command::parse("q"), Some(Command::Quit));
    }

    #[test]
    fn parses_flags() {
        let parsed = Args::parse(&mut args(&[
            "--questions",
            "q.json",
            "--lang",
            "ES",
            "--shuffle",
            "--db",
            "sqlite::memory:",
        ]))
        .unwrap()
        .unwrap();
        assert_eq!(parsed.questions, PathBuf::from("q.json"));
        assert_eq!(parsed.language.unwrap().as_str(), "es");
        assert!(parsed.shuffle);
        assert_eq!(parsed.db_url, "sqlite::memory:");

        assert!(Args::parse(&mut args(&["--help"])).unwrap().is_none());
        assert!(matches!(
            Args::parse(&mut args(&["--questions"])),
            Err(ArgsError::MissingValue { flag: "--questions" })
        ));
        assert!(matches!(
            Args::parse(&mut args(&["--bogus"])),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn resolves_choice_by_position_or_id() {
        let view = QuestionView {
            question_id: "q1".into(),
            index: 0,
            total: 1,
            prompt: "Prompt".into(),
            choices: vec![
                ChoiceView {
                    id: ChoiceId::new("x"),
                    term: "first".into(),
                    selected: false,
                    feedback: None,
                },
                ChoiceView {
                    id: ChoiceId::new("y"),
                    term: "second".into(),
                    selected: false,
                    feedback: None,
                },
            ],
            can_go_back: false,
            can_confirm: false,
            is_last: true,
        };
        assert_eq!(resolve_choice(&view, "2"), ChoiceId::new("y"));
        assert_eq!(resolve_choice(&view, "x"), ChoiceId::new("x"));
        assert_eq!(resolve_choice(&view, "9"), ChoiceId::new("9"));
    }
}
