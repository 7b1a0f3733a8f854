use std::io::{BufRead, Write};
use std::time::Instant;

use crate::error::Result;
use crate::models::{option_letter, AnswerValue, Question, QuestionKind, QuizResult};
use crate::session::{NavStatus, QuizSession, SessionState, TickOutcome};
use crate::timer::format_clock;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Answer(AnswerValue),
    Next,
    Previous,
    GoTo(usize),
    Clear,
    Submit,
    Pause,
    Help,
    Invalid(String),
}

/// Interprets one line typed while `question` is on screen. Lines starting
/// with ':' are commands; anything else is an answer.
pub fn parse_input(line: &str, question: &Question) -> Input {
    let line = line.trim();
    if line.is_empty() {
        return Input::Next;
    }

    if let Some(cmd) = line.strip_prefix(':') {
        let mut parts = cmd.split_whitespace();
        return match parts.next().map(|c| c.to_lowercase()).as_deref() {
            Some("n") | Some("next") => Input::Next,
            Some("p") | Some("prev") | Some("back") => Input::Previous,
            Some("s") | Some("submit") | Some("q") => Input::Submit,
            Some("c") | Some("clear") => Input::Clear,
            Some("pause") => Input::Pause,
            Some("h") | Some("help") | Some("?") => Input::Help,
            Some("g") | Some("go") => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
                Some(n) if n >= 1 => Input::GoTo(n - 1),
                _ => Input::Invalid("usage: :g <question number>".to_string()),
            },
            _ => Input::Invalid(format!("unknown command '{}'", line)),
        };
    }

    match question.kind() {
        QuestionKind::SingleChoice => parse_choice(line, question.options.len()),
        QuestionKind::TrueFalse => match line.to_lowercase().as_str() {
            "t" | "true" | "b" | "benar" | "y" | "ya" => Input::Answer(AnswerValue::Bool(true)),
            "f" | "false" | "s" | "salah" | "n" | "tidak" => {
                Input::Answer(AnswerValue::Bool(false))
            }
            _ => Input::Invalid("answer t (true/benar) or f (false/salah)".to_string()),
        },
        QuestionKind::FillBlank => Input::Answer(AnswerValue::Text(line.to_string())),
    }
}

fn parse_choice(line: &str, option_count: usize) -> Input {
    let index = if let Ok(n) = line.parse::<usize>() {
        n.checked_sub(1)
    } else {
        let mut chars = line.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_alphabetic() => {
                Some((c.to_ascii_uppercase() as u8 - b'A') as usize)
            }
            _ => None,
        }
    };

    match index {
        Some(i) if i < option_count => Input::Answer(AnswerValue::Choice(i)),
        _ => Input::Invalid(format!(
            "pick an option A-{} or 1-{}",
            option_letter(option_count.saturating_sub(1)),
            option_count
        )),
    }
}

const HELP: &str = "\
Answer with a letter or number (multiple choice), t/f (true-false) or the missing word.
Commands: <enter> or :n next, :p previous, :g <n> go to question, :c clear answer,
:pause, :s submit, :h help
The time limit is checked each time you press Enter; a late line is discarded.";

/// Runs `session` as a line-based prompt over `input`/`output`. Ends on
/// submit, timeout, or end of input.
pub fn run<R: BufRead, W: Write>(
    session: &mut QuizSession,
    mut input: R,
    output: &mut W,
) -> Result<QuizResult> {
    session.start()?;
    writeln!(output, "{}", HELP)?;

    let mut last = Instant::now();
    let mut line = String::new();

    while session.state() != SessionState::Completed {
        render_question(session, output)?;
        write!(output, "> ")?;
        output.flush()?;

        line.clear();
        let read = input.read_line(&mut line)?;

        let now = Instant::now();
        let outcome = session.tick(now.duration_since(last));
        last = now;
        if let TickOutcome::Completed(reason) = outcome {
            writeln!(output, "\n{}! Your answers so far were submitted.", reason.label())?;
            break;
        }

        if read == 0 {
            writeln!(output)?;
            break;
        }

        match parse_input(&line, session.current()) {
            Input::Answer(value) => {
                session.record_answer(session.cursor(), value)?;
                report_nav(session.next()?, output)?;
            }
            Input::Next => report_nav(session.next()?, output)?,
            Input::Previous => report_nav(session.previous()?, output)?,
            Input::GoTo(index) if index < session.len() => {
                report_nav(session.go_to(index)?, output)?
            }
            Input::GoTo(_) => writeln!(output, "There are only {} questions.", session.len())?,
            Input::Submit => {
                let unanswered = session.len() - session.answered_count();
                if unanswered > 0 {
                    writeln!(output, "Submitting with {} unanswered question(s).", unanswered)?;
                }
                break;
            }
            Input::Clear => session.clear_answer()?,
            Input::Pause => {
                session.toggle_pause();
                let state = if session.is_paused() { "paused" } else { "resumed" };
                writeln!(output, "Quiz {}.", state)?;
            }
            Input::Help => writeln!(output, "{}", HELP)?,
            Input::Invalid(msg) => writeln!(output, "{}", msg)?,
        }
    }

    let result = session.complete().clone();
    write_summary(&result, output)?;
    Ok(result)
}

fn report_nav<W: Write>(status: NavStatus, output: &mut W) -> Result<()> {
    match status {
        NavStatus::Moved(_) => {}
        NavStatus::AnswerRequired => writeln!(output, "Answer this question first.")?,
        NavStatus::ReadyToSubmit => {
            writeln!(output, "That was the last question. Type :s to submit or :p to review.")?
        }
        NavStatus::BackwardDisabled => writeln!(output, "Going back is disabled for this quiz.")?,
        NavStatus::AtStart => writeln!(output, "Already at the first question.")?,
    }
    Ok(())
}

fn render_question<W: Write>(session: &QuizSession, output: &mut W) -> Result<()> {
    let q = session.current();
    let timer = match session.remaining_secs() {
        Some(secs) if session.is_paused() => format!("  [{} paused]", format_clock(secs)),
        Some(secs) => format!("  [{} left]", format_clock(secs)),
        None if session.is_paused() => "  [paused]".to_string(),
        None => String::new(),
    };

    writeln!(output)?;
    writeln!(
        output,
        "Question {}/{} ({} pts){}",
        session.cursor() + 1,
        session.len(),
        q.points,
        timer
    )?;
    writeln!(output, "{}", q.prompt)?;

    let current = session.current_answer();
    match q.kind() {
        QuestionKind::SingleChoice => {
            for (i, opt) in q.options.iter().enumerate() {
                let mark = if current == Some(&AnswerValue::Choice(i)) {
                    "*"
                } else {
                    " "
                };
                writeln!(output, " {} {}. {}", mark, option_letter(i), opt)?;
            }
        }
        QuestionKind::TrueFalse => {
            writeln!(output, "   (t) True / (f) False")?;
            if let Some(a) = current {
                writeln!(output, "   current answer: {}", a.describe(&q.options))?;
            }
        }
        QuestionKind::FillBlank => {
            if let Some(a) = current {
                writeln!(output, "   current answer: {}", a.describe(&q.options))?;
            }
        }
    }
    Ok(())
}

pub fn write_summary<W: Write>(result: &QuizResult, output: &mut W) -> Result<()> {
    writeln!(output)?;
    writeln!(output, "=== Result ===")?;
    writeln!(
        output,
        "Score: {}% (grade {}) - {}",
        result.score,
        result.grade(),
        if result.passed { "PASSED" } else { "not passed" }
    )?;
    writeln!(
        output,
        "Correct: {}/{}  Points: {}/{}  Answered: {}",
        result.correct,
        result.question_count,
        result.earned_points,
        result.total_points,
        result.answered
    )?;
    writeln!(
        output,
        "Finished: {}  Time: {}",
        result.reason.label(),
        format_clock(result.elapsed_secs.min(u32::MAX as u64) as u32)
    )?;

    let missed: Vec<_> = result.outcomes.iter().filter(|o| !o.is_correct).collect();
    if !missed.is_empty() {
        writeln!(output)?;
        writeln!(output, "Review:")?;
        for o in missed {
            writeln!(output, "- {}", o.prompt)?;
            writeln!(
                output,
                "  your answer: {}  correct: {}",
                o.given_label.as_deref().unwrap_or("-"),
                o.correct_label
            )?;
            if let Some(expl) = &o.explanation {
                writeln!(output, "  {}", expl)?;
            }
        }
    }
    Ok(())
}
