use std::fmt;

use learn_core::model::{ApiSettingsDraft, CourseId, LessonId, ModuleId, OptionId, QuestionId};
use serde::Serialize;
use services::{AppServices, Clock};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { command: Command, flag: &'static str },
    UnknownArg(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidAnswer { raw: String },
    InvalidTimeout { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { command, flag } => {
                write!(f, "{} requires {flag}", command.name())
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidAnswer { raw } => {
                write!(f, "invalid --answer value: {raw} (expected <question>=<option>)")
            }
            ArgsError::InvalidTimeout { raw } => {
                write!(f, "invalid LEARN_API_TIMEOUT_SECS value: {raw}")
            }
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

fn parse_id<T: std::str::FromStr>(raw: String, flag: &'static str) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { flag, raw })
}

fn parse_answer(raw: String) -> Result<(QuestionId, OptionId), ArgsError> {
    let parsed = raw
        .split_once('=')
        .and_then(|(q, o)| Some((q.parse().ok()?, o.parse().ok()?)));
    parsed.ok_or(ArgsError::InvalidAnswer { raw })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- outline   --course <id>");
    eprintln!("  cargo run -p app -- enroll    --course <id>");
    eprintln!("  cargo run -p app -- complete  --course <id> --module <id> --lesson <id>");
    eprintln!("  cargo run -p app -- quiz      --course <id> --module <id> [--answer <q>=<o>]...");
    eprintln!("  cargo run -p app -- dashboard");
    eprintln!();
    eprintln!("Every command accepts --api <url> to override LEARN_API_URL.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_API_URL, LEARN_API_TOKEN, LEARN_API_TIMEOUT_SECS (default 30)");
    eprintln!("  RUST_LOG (default info)");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Outline,
    Enroll,
    Complete,
    Quiz,
    Dashboard,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "outline" => Some(Self::Outline),
            "enroll" => Some(Self::Enroll),
            "complete" => Some(Self::Complete),
            "quiz" => Some(Self::Quiz),
            "dashboard" => Some(Self::Dashboard),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Outline => "outline",
            Self::Enroll => "enroll",
            Self::Complete => "complete",
            Self::Quiz => "quiz",
            Self::Dashboard => "dashboard",
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    api_url: Option<String>,
    course: Option<CourseId>,
    module: Option<ModuleId>,
    lesson: Option<LessonId>,
    answers: Vec<(QuestionId, OptionId)>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut parsed = Self::default();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--api" => parsed.api_url = Some(require_value(args, "--api")?),
                "--course" => {
                    parsed.course = Some(parse_id(require_value(args, "--course")?, "--course")?);
                }
                "--module" => {
                    parsed.module = Some(parse_id(require_value(args, "--module")?, "--module")?);
                }
                "--lesson" => {
                    parsed.lesson = Some(parse_id(require_value(args, "--lesson")?, "--lesson")?);
                }
                "--answer" => parsed
                    .answers
                    .push(parse_answer(require_value(args, "--answer")?)?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn require<T: Copy>(
        value: Option<T>,
        command: Command,
        flag: &'static str,
    ) -> Result<T, ArgsError> {
        value.ok_or(ArgsError::MissingFlag { command, flag })
    }

    fn settings_draft(&self) -> Result<ApiSettingsDraft, ArgsError> {
        let timeout_secs = match std::env::var("LEARN_API_TIMEOUT_SECS") {
            Ok(raw) => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ArgsError::InvalidTimeout { raw })?,
            ),
            Err(_) => None,
        };
        Ok(ApiSettingsDraft {
            base_url: self
                .api_url
                .clone()
                .or_else(|| std::env::var("LEARN_API_URL").ok()),
            token: std::env::var("LEARN_API_TOKEN").ok(),
            timeout_secs,
        })
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
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
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Binary glue owns configuration; services only see validated settings.
    let settings = parsed.settings_draft()?.validate()?;
    info!(api = %settings.base_url(), command = cmd.name(), "starting");
    let services = AppServices::new_http(settings, Clock::system())?;

    match cmd {
        Command::Outline => {
            let course = Args::require(parsed.course, cmd, "--course")?;
            print_json(&services.courses().outline(course).await?)
        }
        Command::Enroll => {
            let course = Args::require(parsed.course, cmd, "--course")?;
            print_json(&services.courses().enroll(course).await?)
        }
        Command::Complete => {
            let course = Args::require(parsed.course, cmd, "--course")?;
            let module = Args::require(parsed.module, cmd, "--module")?;
            let lesson = Args::require(parsed.lesson, cmd, "--lesson")?;
            let completion = services
                .courses()
                .complete_lesson(course, module, lesson)
                .await?;
            print_json(&completion)
        }
        Command::Quiz => {
            let course = Args::require(parsed.course, cmd, "--course")?;
            let module = Args::require(parsed.module, cmd, "--module")?;
            let quizzes = services.quizzes();
            let quiz = quizzes.load_quiz(module).await?;
            let mut attempt = quizzes.start_attempt();
            for (question, option) in parsed.answers {
                quizzes.select(&mut attempt, question, option)?;
            }
            print_json(&quizzes.submit(course, &quiz, &mut attempt).await?)
        }
        Command::Dashboard => print_json(&services.dashboard().summary().await?),
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = raw.iter().map(|s| (*s).to_owned());
        Args::parse(&mut iter)
    }

    #[test]
    fn quiz_flags_parse_into_ids_and_answers() {
        let parsed = args(&[
            "--course", "1", "--module", "2", "--answer", "10=101", "--answer", "11=112",
        ])
        .unwrap();
        assert_eq!(parsed.course, Some(CourseId::new(1)));
        assert_eq!(parsed.module, Some(ModuleId::new(2)));
        assert_eq!(
            parsed.answers,
            vec![
                (QuestionId::new(10), OptionId::new(101)),
                (QuestionId::new(11), OptionId::new(112)),
            ]
        );
    }

    #[test]
    fn malformed_flags_are_rejected() {
        assert!(matches!(
            args(&["--answer", "10:101"]),
            Err(ArgsError::InvalidAnswer { .. })
        ));
        assert!(matches!(
            args(&["--course", "abc"]),
            Err(ArgsError::InvalidId { flag: "--course", .. })
        ));
        assert!(matches!(
            args(&["--module"]),
            Err(ArgsError::MissingValue { flag: "--module" })
        ));
        assert!(matches!(args(&["--bogus"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn missing_required_flag_names_the_command() {
        let err = Args::require::<CourseId>(None, Command::Outline, "--course").unwrap_err();
        assert_eq!(err.to_string(), "outline requires --course");
    }
}
