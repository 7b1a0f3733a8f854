use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::{QuizError, Result};
use crate::models::{AnswerValue, Question, SessionConfig};

/// Builds the ordered question list for one session. The pool is only read;
/// every returned question is an owned copy.
pub fn select_questions<R: Rng + ?Sized>(
    pool: &[Question],
    config: &SessionConfig,
    rng: &mut R,
) -> Result<Vec<Question>> {
    let mut candidates: Vec<&Question> = pool.iter().collect();

    if let Some(category) = &config.category {
        let matching: Vec<&Question> = candidates
            .iter()
            .copied()
            .filter(|q| {
                q.category
                    .as_deref()
                    .is_some_and(|c| c.eq_ignore_ascii_case(category))
            })
            .collect();
        if matching.is_empty() {
            log::warn!(
                "no questions in category '{}', using the whole bank",
                category
            );
        } else {
            candidates = matching;
        }
    }

    if let Some(difficulty) = config.difficulty {
        let matching: Vec<&Question> = candidates
            .iter()
            .copied()
            .filter(|q| q.difficulty == difficulty)
            .collect();
        if matching.is_empty() {
            log::warn!(
                "no {} questions available, ignoring the difficulty filter",
                difficulty.as_str()
            );
        } else {
            candidates = matching;
        }
    }

    if config.shuffle_questions {
        candidates.shuffle(rng);
    }

    let take = if config.count == 0 {
        candidates.len()
    } else {
        config.count.min(candidates.len())
    };

    let mut selected: Vec<Question> = candidates.into_iter().take(take).cloned().collect();

    if selected.is_empty() {
        return Err(QuizError::EmptyPool);
    }

    if config.shuffle_options {
        for question in &mut selected {
            shuffle_options(question, rng);
        }
    }

    log::debug!("selected {} questions", selected.len());
    Ok(selected)
}

/// Permutes a single-choice question's options in place and moves the
/// answer index to follow the correct option.
pub fn shuffle_options<R: Rng + ?Sized>(question: &mut Question, rng: &mut R) {
    let AnswerValue::Choice(correct) = question.answer else {
        return;
    };
    if question.options.len() < 2 {
        return;
    }

    let mut order: Vec<usize> = (0..question.options.len()).collect();
    order.shuffle(rng);

    let options = order
        .iter()
        .map(|&i| question.options[i].clone())
        .collect();
    let new_index = order
        .iter()
        .position(|&i| i == correct)
        .unwrap_or(correct);

    question.options = options;
    question.answer = AnswerValue::Choice(new_index);
}
