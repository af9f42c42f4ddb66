use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};

use api::{HttpConfig, HttpGateway};
use exam_core::model::{AnswerValue, AttemptReport, QuestionKind, TestId};
use services::{
    Countdown, ReportService, SessionController, SessionPhase, SubmitOutcome,
};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    MissingBaseUrl,
    MissingTestId,
    InvalidTestId { raw: String },
    InvalidTickMs { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::MissingBaseUrl => {
                write!(f, "no backend url: pass --base-url or set EXAM_API_URL")
            }
            ArgsError::MissingTestId => {
                write!(f, "no test id: pass --test-id or set EXAM_TEST_ID")
            }
            ArgsError::InvalidTestId { raw } => write!(f, "invalid --test-id value: {raw}"),
            ArgsError::InvalidTickMs { raw } => write!(f, "invalid --tick-ms value: {raw}"),
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

struct Args {
    base_url: String,
    token: Option<String>,
    test_id: TestId,
    tick: Duration,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- --test-id <id> [--base-url <url>] [--token <bearer>] [--tick-ms <ms>]"
    );
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_API_URL, EXAM_API_TOKEN, EXAM_TEST_ID");
    eprintln!();
    print_commands();
}

fn print_commands() {
    eprintln!("Commands during the attempt:");
    eprintln!("  choose <n>   answer the current question with option n (1-based)");
    eprintln!("  text <...>   answer the current question with free text");
    eprintln!("  next / prev  move between questions");
    eprintln!("  goto <n>     jump to question n (1-based)");
    eprintln!("  status       show progress and time left");
    eprintln!("  submit       finalize the attempt");
    eprintln!("  quit         leave without submitting");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut base_url = std::env::var("EXAM_API_URL")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let mut token = std::env::var("EXAM_API_TOKEN")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let mut test_id = std::env::var("EXAM_TEST_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map(TestId::new);
        let mut tick = Duration::from_secs(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--base-url" => {
                    let value = require_value(args, "--base-url")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::MissingBaseUrl);
                    }
                    base_url = Some(value);
                }
                "--token" => {
                    token = Some(require_value(args, "--token")?);
                }
                "--test-id" => {
                    let value = require_value(args, "--test-id")?;
                    let parsed: u64 = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidTestId { raw: value.clone() })?;
                    test_id = Some(TestId::new(parsed));
                }
                "--tick-ms" => {
                    let value = require_value(args, "--tick-ms")?;
                    let parsed: u64 = value
                        .parse()
                        .ok()
                        .filter(|ms| *ms > 0)
                        .ok_or(ArgsError::InvalidTickMs { raw: value.clone() })?;
                    tick = Duration::from_millis(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            base_url: base_url.ok_or(ArgsError::MissingBaseUrl)?,
            token,
            test_id: test_id.ok_or(ArgsError::MissingTestId)?,
            tick,
        })
    }
}

fn format_clock(secs: u32) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

fn show_question(controller: &SessionController) {
    let (Ok(question), Ok(progress)) = (controller.current_question(), controller.progress())
    else {
        return;
    };

    println!();
    println!(
        "[{}/{}] {} ({} pts)",
        progress.cursor + 1,
        progress.total,
        question.text(),
        question.points()
    );
    for (index, option) in question.options().iter().enumerate() {
        println!("  {}. {}", index + 1, option.text());
    }
    if let Some(url) = question.image_url() {
        println!("  image: {url}");
    }
    if question.kind() == QuestionKind::TrueFalse {
        println!("  answer with: text true | text false");
    }
    match controller.answer(question.id()) {
        Ok(Some(AnswerValue::Choice(index))) => println!("  current answer: option {}", index + 1),
        Ok(Some(AnswerValue::Text(text))) => println!("  current answer: {text}"),
        _ => {}
    }
}

fn show_status(controller: &SessionController) {
    let Ok(progress) = controller.progress() else {
        return;
    };
    let time = progress
        .remaining_secs
        .map_or_else(|| "--:--".to_string(), format_clock);
    println!(
        "answered {} of {}, on question {}, time left {time}",
        progress.answered,
        progress.total,
        progress.cursor + 1
    );
}

fn record(controller: &SessionController, value: AnswerValue) {
    let Ok(question) = controller.current_question() else {
        return;
    };
    match controller.record_answer(question.id(), value) {
        Ok(()) => println!("recorded"),
        Err(err) => println!("cannot record: {err}"),
    }
}

/// Handle one line of input. Returns false once the attempt is over.
async fn handle_command(controller: &SessionController, input: &str) -> bool {
    let (command, rest) = match input.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (input, ""),
    };

    match command {
        "" => {}
        "choose" => match rest.parse::<u32>() {
            Ok(number) if number > 0 => record(controller, AnswerValue::choice(number - 1)),
            _ => println!("usage: choose <option number, starting at 1>"),
        },
        "text" => {
            if rest.is_empty() {
                println!("usage: text <your answer>");
            } else {
                record(controller, AnswerValue::text(rest));
            }
        }
        "next" => {
            let _ = controller.advance();
            show_question(controller);
        }
        "prev" => {
            let _ = controller.back();
            show_question(controller);
        }
        "goto" => match rest.parse::<usize>() {
            Ok(number) if number > 0 => {
                let _ = controller.go_to(number - 1);
                show_question(controller);
            }
            _ => println!("usage: goto <question number, starting at 1>"),
        },
        "status" => show_status(controller),
        "submit" => match controller.submit().await {
            Ok(SubmitOutcome::Submitted) => {
                println!("attempt submitted");
                return false;
            }
            Ok(SubmitOutcome::AlreadyPending) => println!("a submit is already on its way"),
            Ok(SubmitOutcome::AlreadySubmitted) => return false,
            Err(err) => println!("submit failed: {err} (type submit to retry)"),
        },
        "help" => print_commands(),
        "quit" | "exit" => return false,
        _ => println!("unknown command: {command} (try help)"),
    }
    true
}

async fn run_prompt(controller: &SessionController) -> Result<(), std::io::Error> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut poll = tokio::time::interval(Duration::from_millis(200));

    show_question(controller);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    return Ok(());
                };
                if !handle_command(controller, line.trim()).await {
                    return Ok(());
                }
            }
            _ = poll.tick() => {
                if controller.is_finished() {
                    println!();
                    println!("time is up, the attempt was submitted");
                    return Ok(());
                }
            }
        }
    }
}

fn print_report(report: &AttemptReport) {
    println!();
    println!("Results for {}", report.test.title);
    println!(
        "  attempt #{} scored {:.1}/{} points ({:.1}%)",
        report.attempt_number, report.score, report.test.total_points, report.percentage
    );
    println!(
        "  {} (passing score {}%)",
        if report.passed { "passed" } else { "not passed" },
        report.test.passing_score
    );
    println!("  time spent: {}", format_clock(report.time_spent_seconds));
    if report.has_pending_grading() {
        println!("  some answers still await manual grading");
    }
    for answer in &report.answers {
        let verdict = match answer.is_correct {
            Some(true) => "correct",
            Some(false) => "wrong",
            None => "pending",
        };
        println!(
            "  question {}: {verdict} ({:.1} pts)",
            answer.question_id, answer.points_earned
        );
        if let Some(feedback) = &answer.feedback {
            println!("    feedback: {feedback}");
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let parsed = Args::parse(&mut args).map_err(|err| {
        eprintln!("{err}");
        print_usage();
        err
    })?;

    let config = HttpConfig {
        base_url: parsed.base_url,
        token: parsed.token,
    };
    let gateway = Arc::new(HttpGateway::from_config(&config)?);
    let controller = Arc::new(SessionController::new(gateway.clone(), gateway.clone()));
    let reports = ReportService::new(gateway);

    controller.initialize(parsed.test_id).await?;
    let countdown = Countdown::spawn_with_period(Arc::clone(&controller), parsed.tick);

    let progress = controller.progress()?;
    println!("Starting {}", controller.test_title()?);
    match progress.remaining_secs {
        Some(secs) => println!(
            "{} questions, {} on the clock",
            progress.total,
            format_clock(secs)
        ),
        None => println!("{} questions, no time limit", progress.total),
    }
    println!("type help for commands");

    run_prompt(&controller).await?;
    drop(countdown);

    if controller.phase() == SessionPhase::Submitted {
        let report = reports.fetch(controller.attempt_id()?).await?;
        print_report(&report);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "warn,services=info,api=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
