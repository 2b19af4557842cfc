use std::io;
use std::path::PathBuf;

use services::{HostStep, PlanTracker, QuizPhase, QuizSession, SessionHost};
use study_core::model::{Answer, Question, StudyPlan};
use tracing::debug;

use crate::console::Console;

/// What the user picked on the command line.
#[derive(Debug, Default)]
pub struct SessionOptions {
    pub file: Option<PathBuf>,
    pub title: Option<String>,
    pub workflow: Option<HostStep>,
    pub days: Option<u32>,
    pub questions: Option<u32>,
}

enum Next {
    Back,
    Exit,
}

/// Drive one session host until the user quits or stdin closes.
pub async fn run_session(
    host: &mut SessionHost,
    console: &mut Console,
    mut opts: SessionOptions,
) -> io::Result<()> {
    loop {
        debug!(step = ?host.step(), "session step");
        match host.step() {
            HostStep::Upload => {
                if !upload(host, console, &mut opts).await? {
                    return Ok(());
                }
            }
            HostStep::Choose => {
                let picked = match opts.workflow.take() {
                    Some(step) => Some(step),
                    None => choose(console).await?,
                };
                let result = match picked {
                    Some(HostStep::Plan) => host.choose_plan().map(|_| ()),
                    Some(HostStep::Quiz) => host.choose_quiz().map(|_| ()),
                    Some(HostStep::Upload) => {
                        host.back();
                        Ok(())
                    }
                    Some(HostStep::Choose) => Ok(()),
                    None => return Ok(()),
                };
                if let Err(err) = result {
                    eprintln!("{err}");
                }
            }
            HostStep::Plan => {
                let Some(tracker) = host.plan_tracker_mut() else {
                    continue;
                };
                let next = run_plan(tracker, console, opts.days.take()).await?;
                host.flush().await;
                match next {
                    Next::Back => {
                        host.back();
                    }
                    Next::Exit => return Ok(()),
                }
            }
            HostStep::Quiz => {
                let Some(session) = host.quiz_session_mut() else {
                    continue;
                };
                let next = run_quiz(session, console, opts.questions.take()).await?;
                host.flush().await;
                match next {
                    Next::Back => {
                        host.back();
                    }
                    Next::Exit => return Ok(()),
                }
            }
        }
    }
}

/// Returns `false` when the user gave up on providing material.
async fn upload(
    host: &mut SessionHost,
    console: &mut Console,
    opts: &mut SessionOptions,
) -> io::Result<bool> {
    if let Some(path) = opts.file.take() {
        match host.upload_file(&path, opts.title.as_deref()).await {
            Ok(material) => {
                println!("Loaded \"{}\" ({} chars).", material.title(), material.content().chars().count());
                return Ok(true);
            }
            Err(err) => eprintln!("{}: {err}", path.display()),
        }
    }

    let title = match opts.title.take() {
        Some(title) => title,
        None => match console.prompt("Title (empty line to quit): ").await? {
            Some(title) if !title.is_empty() => title,
            _ => return Ok(false),
        },
    };
    println!("Paste the study material, then an empty line:");
    let content = console.read_block().await?;
    if let Err(err) = host.submit_text(&title, &content).await {
        eprintln!("{err}");
    }
    Ok(true)
}

async fn choose(console: &mut Console) -> io::Result<Option<HostStep>> {
    loop {
        let Some(line) = console
            .prompt("[p]lan, [q]uiz, [b]ack to upload, e[x]it > ")
            .await?
        else {
            return Ok(None);
        };
        match line.as_str() {
            "p" | "plan" => return Ok(Some(HostStep::Plan)),
            "q" | "quiz" => return Ok(Some(HostStep::Quiz)),
            "b" | "back" => return Ok(Some(HostStep::Upload)),
            "x" | "exit" => return Ok(None),
            _ => eprintln!("unknown choice: {line}"),
        }
    }
}

async fn ask_retry(console: &mut Console) -> io::Result<bool> {
    Ok(matches!(
        console.prompt("Try again? [y/N] ").await?.as_deref(),
        Some("y" | "yes")
    ))
}

async fn run_plan(
    tracker: &mut PlanTracker,
    console: &mut Console,
    days: Option<u32>,
) -> io::Result<Next> {
    let mut requested = days.unwrap_or_else(|| tracker.days());
    loop {
        if tracker.plan().is_none() {
            println!("Generating a {requested}-day plan...");
            if let Err(err) = tracker.generate(requested).await {
                eprintln!("{err}");
                if !ask_retry(console).await? {
                    return Ok(Next::Back);
                }
                continue;
            }
        }

        if let Some(plan) = tracker.plan() {
            print_plan(plan, tracker);
        }

        let Some(line) = console
            .prompt("day number to toggle, r [days] to regenerate, b back, q quit > ")
            .await?
        else {
            return Ok(Next::Exit);
        };
        let mut words = line.split_whitespace();
        match words.next() {
            Some("b" | "back") => return Ok(Next::Back),
            Some("q" | "quit") => return Ok(Next::Exit),
            Some("r" | "regenerate") => {
                if let Some(days) = words.next().and_then(|d| d.parse().ok()) {
                    requested = days;
                }
                println!("Generating a {requested}-day plan...");
                if let Err(err) = tracker.generate(requested).await {
                    eprintln!("{err}");
                }
            }
            Some(word) => match word.parse::<u32>() {
                Ok(day) => {
                    if let Err(err) = tracker.toggle_day(day) {
                        eprintln!("{err}");
                    }
                }
                Err(_) => eprintln!("unknown command: {line}"),
            },
            None => {}
        }
    }
}

fn print_plan(plan: &StudyPlan, tracker: &PlanTracker) {
    println!();
    println!("== {} ==", plan.title());
    if !plan.overview().is_empty() {
        println!("{}", plan.overview());
    }
    for day in plan.days() {
        let mark = if tracker.is_day_complete(day.day) { 'x' } else { ' ' };
        print!("[{mark}] Day {}: {}", day.day, day.title);
        if !day.duration.is_empty() {
            print!(" ({})", day.duration);
        }
        println!();
        for topic in &day.topics {
            println!("      - {topic}");
        }
        for activity in &day.activities {
            println!("      * {activity}");
        }
    }
    for tip in plan.tips() {
        println!("Tip: {tip}");
    }
    println!(
        "Progress: {}/{} days ({:.0}%)",
        tracker.progress().completed_count(),
        plan.days().len(),
        tracker.completion_ratio() * 100.0
    );
}

async fn run_quiz(
    session: &mut QuizSession,
    console: &mut Console,
    questions: Option<u32>,
) -> io::Result<Next> {
    if let Some(n) = questions {
        if let Err(err) = session.set_num_questions(n) {
            eprintln!("{err}");
        }
    }

    loop {
        match session.phase() {
            QuizPhase::Configuring => {
                println!("Generating {} questions...", session.num_questions());
                if let Err(err) = session.generate().await {
                    eprintln!("{err}");
                    if !ask_retry(console).await? {
                        return Ok(Next::Back);
                    }
                }
            }
            QuizPhase::InProgress => {
                if let Some(next) = quiz_turn(session, console).await? {
                    return Ok(next);
                }
            }
            QuizPhase::Completed => {
                print_result(session);
                let Some(line) = console.prompt("r retake, b back, q quit > ").await? else {
                    return Ok(Next::Exit);
                };
                match line.as_str() {
                    "r" | "retake" => session.reset(),
                    "b" | "back" => return Ok(Next::Back),
                    "q" | "quit" => return Ok(Next::Exit),
                    _ => eprintln!("unknown command: {line}"),
                }
            }
        }
    }
}

/// One prompt while a quiz is in progress; `Some` when the user leaves.
async fn quiz_turn(session: &mut QuizSession, console: &mut Console) -> io::Result<Option<Next>> {
    let Some(question) = session.current_question().cloned() else {
        return Ok(None);
    };
    print_question(session, &question);

    let Some(line) = console
        .prompt("answer, or :n :p :g <n> :s submit :b back :q quit > ")
        .await?
    else {
        return Ok(Some(Next::Exit));
    };

    let outcome = match line.split_once(' ').unwrap_or((line.as_str(), "")) {
        (":b", _) => return Ok(Some(Next::Back)),
        (":q", _) => return Ok(Some(Next::Exit)),
        (":n", _) => session.next().map(drop),
        (":p", _) => session.previous().map(drop),
        (":g", n) => match n.trim().parse::<usize>() {
            Ok(n) if n > 0 => session.go_to(n - 1),
            _ => {
                eprintln!("usage: :g <question number>");
                Ok(())
            }
        },
        (":s", _) => session.submit().map(drop),
        _ if line.is_empty() => Ok(()),
        _ => {
            let answered = session.answer_current(parse_answer(&question, &line));
            // Move on automatically unless this was the last question.
            if answered.is_ok() && !is_last(session) {
                session.next().map(drop)
            } else {
                answered
            }
        }
    };
    if let Err(err) = outcome {
        eprintln!("{err}");
    }
    Ok(None)
}

fn is_last(session: &QuizSession) -> bool {
    match (session.current_index(), session.quiz()) {
        (Some(index), Some(quiz)) => index + 1 >= quiz.len(),
        _ => true,
    }
}

fn print_question(session: &QuizSession, question: &Question) {
    let Some(progress) = session.progress() else {
        return;
    };
    let navigator: String = (0..progress.total)
        .map(|i| {
            if i == progress.current {
                '>'
            } else if session.is_answered(i) {
                '#'
            } else {
                '.'
            }
        })
        .collect();

    println!();
    println!(
        "Question {}/{} [{navigator}] {} answered",
        progress.current + 1,
        progress.total,
        progress.answered
    );
    println!("({}) {}", question.kind_label(), question.prompt());
    match question {
        Question::MultipleChoice { options, .. } => {
            for (i, option) in options.iter().enumerate() {
                println!("  {}. {option}", i + 1);
            }
        }
        Question::TrueFalse { .. } => println!("  true / false"),
        Question::ShortAnswer { .. } => {}
    }
    let given = session.answers().and_then(|a| a.get(question.id()));
    if let Some(given) = given {
        println!("  your answer: {given}");
    }
}

/// Map typed input onto the answer shape the question expects.
///
/// Numbers pick a multiple-choice option; yes/no words answer true/false.
fn parse_answer(question: &Question, input: &str) -> Answer {
    match question {
        Question::MultipleChoice { options, .. } => input
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| options.get(i))
            .map_or_else(|| Answer::from(input), |o| Answer::from(o.as_str())),
        Question::TrueFalse { .. } => match input.to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" => Answer::Bool(true),
            "f" | "false" | "n" | "no" => Answer::Bool(false),
            _ => Answer::from(input),
        },
        Question::ShortAnswer { .. } => Answer::from(input),
    }
}

fn print_result(session: &QuizSession) {
    let (Some(quiz), Some(result), Some(report)) =
        (session.quiz(), session.result(), session.live_score())
    else {
        return;
    };

    println!();
    println!("== {} ==", quiz.title());
    println!(
        "Score: {}/{} ({}%) - {}",
        result.score,
        result.total_questions,
        result.percentage(),
        result.grade().label()
    );
    for (i, question) in quiz.questions().iter().enumerate() {
        let mark = if report.is_correct(question.id()) { "ok " } else { "xx " };
        println!("{mark}{}. {}", i + 1, question.prompt());
        if let Some(given) = result.answers.get(question.id()) {
            println!("    you: {given}");
        }
        println!("    answer: {}", question.correct_answer_text());
        if !question.explanation().is_empty() {
            println!("    {}", question.explanation());
        }
    }
}
