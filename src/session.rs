use std::time::Duration;

use rand::Rng;

use crate::error::{QuizError, Result};
use crate::models::{
    score_percent, AnswerValue, CompletionReason, Question, QuestionOutcome, QuizResult,
    SessionConfig,
};
use crate::select::select_questions;
use crate::timer::{Countdown, TimerTick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    InProgress,
    Completed,
}

/// What a navigation call did. Refusals are statuses, not errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavStatus {
    Moved(usize),
    AnswerRequired,
    ReadyToSubmit,
    BackwardDisabled,
    AtStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Idle,
    Counting(u32),
    Advanced(NavStatus),
    Completed(CompletionReason),
}

pub struct QuizSession {
    config: SessionConfig,
    questions: Vec<Question>,
    answers: Vec<Option<AnswerValue>>,
    cursor: usize,
    furthest: usize,
    state: SessionState,
    timer: Countdown,
    pending_advance: Option<Duration>,
    elapsed: Duration,
    result: Option<QuizResult>,
}

impl QuizSession {
    pub fn new(config: SessionConfig, questions: Vec<Question>) -> Result<Self> {
        if questions.is_empty() {
            return Err(QuizError::EmptyPool);
        }
        let timer = Countdown::new(config.time_limit.filter(|secs| *secs > 0));
        Ok(Self {
            answers: vec![None; questions.len()],
            questions,
            cursor: 0,
            furthest: 0,
            state: SessionState::NotStarted,
            timer,
            pending_advance: None,
            elapsed: Duration::ZERO,
            result: None,
            config,
        })
    }

    pub fn from_pool<R: Rng + ?Sized>(
        config: SessionConfig,
        pool: &[Question],
        rng: &mut R,
    ) -> Result<Self> {
        let questions = select_questions(pool, &config, rng)?;
        Self::new(config, questions)
    }

    /// Like `from_pool`, but an empty selection is retried against the
    /// questions `fallback` returns.
    pub fn from_pool_or<R, F>(
        config: SessionConfig,
        pool: &[Question],
        fallback: F,
        rng: &mut R,
    ) -> Result<Self>
    where
        R: Rng + ?Sized,
        F: FnOnce() -> Vec<Question>,
    {
        match Self::from_pool(config.clone(), pool, rng) {
            Err(QuizError::EmptyPool) => {
                log::warn!("question pool is empty; using the built-in questions");
                Self::from_pool(config, &fallback(), rng)
            }
            other => other,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current(&self) -> &Question {
        &self.questions[self.cursor]
    }

    pub fn current_answer(&self) -> Option<&AnswerValue> {
        self.answers[self.cursor].as_ref()
    }

    pub fn answer_at(&self, index: usize) -> Option<&AnswerValue> {
        self.answers.get(index).and_then(|a| a.as_ref())
    }

    pub fn answered_count(&self) -> usize {
        self.answers.iter().filter(|a| a.is_some()).count()
    }

    pub fn is_last(&self) -> bool {
        self.cursor + 1 == self.questions.len()
    }

    pub fn can_advance(&self) -> bool {
        self.state == SessionState::InProgress && self.answers[self.cursor].is_some()
    }

    pub fn remaining_secs(&self) -> Option<u32> {
        self.timer.remaining()
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::InProgress && !self.timer.is_running()
    }

    pub fn start(&mut self) -> Result<()> {
        match self.state {
            SessionState::NotStarted => {
                self.state = SessionState::InProgress;
                self.timer.start();
                log::debug!(
                    "session started: {} questions, time limit {:?}",
                    self.questions.len(),
                    self.timer.limit()
                );
                Ok(())
            }
            SessionState::InProgress => Ok(()),
            SessionState::Completed => Err(QuizError::SessionCompleted),
        }
    }

    fn ensure_in_progress(&self) -> Result<()> {
        match self.state {
            SessionState::InProgress => Ok(()),
            SessionState::NotStarted => Err(QuizError::SessionNotStarted),
            SessionState::Completed => Err(QuizError::SessionCompleted),
        }
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.questions.len() {
            return Err(QuizError::InvalidIndex {
                index,
                len: self.questions.len(),
            });
        }
        Ok(())
    }

    pub fn record_answer(&mut self, index: usize, value: AnswerValue) -> Result<()> {
        self.ensure_in_progress()?;
        self.check_index(index)?;

        let revisiting = self.config.allow_back && index <= self.furthest;
        if index != self.cursor && !revisiting {
            return Err(QuizError::InvalidIndex {
                index,
                len: self.questions.len(),
            });
        }

        let question = &self.questions[index];
        if value.kind() != question.kind() {
            return Err(QuizError::InvalidAnswerType {
                expected: question.kind(),
                found: value.kind(),
            });
        }
        if let AnswerValue::Choice(option) = value {
            if option >= question.options.len() {
                return Err(QuizError::InvalidIndex {
                    index: option,
                    len: question.options.len(),
                });
            }
        }

        self.answers[index] = Some(value);
        self.pending_advance = self.config.auto_advance;
        Ok(())
    }

    pub fn clear_answer(&mut self) -> Result<()> {
        self.ensure_in_progress()?;
        self.answers[self.cursor] = None;
        self.pending_advance = None;
        Ok(())
    }

    pub fn next(&mut self) -> Result<NavStatus> {
        self.ensure_in_progress()?;
        self.pending_advance = None;

        if self.answers[self.cursor].is_none() {
            return Ok(NavStatus::AnswerRequired);
        }
        if self.is_last() {
            return Ok(NavStatus::ReadyToSubmit);
        }
        self.move_to(self.cursor + 1);
        Ok(NavStatus::Moved(self.cursor))
    }

    pub fn previous(&mut self) -> Result<NavStatus> {
        self.ensure_in_progress()?;
        if !self.config.allow_back {
            return Ok(NavStatus::BackwardDisabled);
        }
        if self.cursor == 0 {
            return Ok(NavStatus::AtStart);
        }
        self.pending_advance = None;
        self.move_to(self.cursor - 1);
        Ok(NavStatus::Moved(self.cursor))
    }

    pub fn go_to(&mut self, index: usize) -> Result<NavStatus> {
        self.ensure_in_progress()?;
        self.check_index(index)?;
        if !self.config.allow_back && index < self.cursor {
            return Ok(NavStatus::BackwardDisabled);
        }
        self.pending_advance = None;
        self.move_to(index);
        Ok(NavStatus::Moved(self.cursor))
    }

    fn move_to(&mut self, index: usize) {
        self.cursor = index.min(self.questions.len() - 1);
        self.furthest = self.furthest.max(self.cursor);
    }

    pub fn pause(&mut self) {
        if self.state == SessionState::InProgress {
            self.timer.pause();
        }
    }

    pub fn resume(&mut self) {
        if self.state == SessionState::InProgress {
            self.timer.resume();
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.is_paused() {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Feeds wall time into the session. Drives the countdown and any
    /// pending auto-advance.
    pub fn tick(&mut self, elapsed: Duration) -> TickOutcome {
        if self.state != SessionState::InProgress {
            return TickOutcome::Idle;
        }
        if self.is_paused() {
            return TickOutcome::Idle;
        }
        self.elapsed += elapsed;

        let timer = self.timer.advance(elapsed);
        if timer == TimerTick::Expired {
            log::info!("time limit reached, completing session");
            self.finish(CompletionReason::TimedOut);
            return TickOutcome::Completed(CompletionReason::TimedOut);
        }

        if let Some(delay) = self.pending_advance {
            if elapsed >= delay {
                self.pending_advance = None;
                if let Ok(status) = self.next() {
                    if status == NavStatus::ReadyToSubmit && self.config.auto_submit {
                        self.finish(CompletionReason::AutoSubmitted);
                        return TickOutcome::Completed(CompletionReason::AutoSubmitted);
                    }
                    return TickOutcome::Advanced(status);
                }
            } else {
                self.pending_advance = Some(delay - elapsed);
            }
        }

        match timer {
            TimerTick::Running(left) => TickOutcome::Counting(left),
            _ => TickOutcome::Idle,
        }
    }

    /// Scores the session once. Later calls return the stored result.
    pub fn complete(&mut self) -> &QuizResult {
        self.finish(CompletionReason::Submitted)
    }

    fn finish(&mut self, reason: CompletionReason) -> &QuizResult {
        let result = match self.result.take() {
            Some(existing) => existing,
            None => {
                self.timer.stop();
                self.pending_advance = None;
                self.state = SessionState::Completed;
                let result = self.score(reason);
                log::debug!(
                    "session completed ({}): {}/{} points, {}%",
                    reason.as_str(),
                    result.earned_points,
                    result.total_points,
                    result.score
                );
                result
            }
        };
        self.result.insert(result)
    }

    fn score(&self, reason: CompletionReason) -> QuizResult {
        let mut correct = 0;
        let mut earned_points: u32 = 0;
        let mut total_points: u32 = 0;

        let outcomes: Vec<QuestionOutcome> = self
            .questions
            .iter()
            .zip(&self.answers)
            .map(|(question, given)| {
                total_points = total_points.saturating_add(question.points);
                let is_correct = given.as_ref().is_some_and(|g| question.is_correct(g));
                let points_earned = if is_correct { question.points } else { 0 };
                if is_correct {
                    correct += 1;
                    earned_points = earned_points.saturating_add(points_earned);
                }
                QuestionOutcome {
                    question_id: question.id.clone(),
                    prompt: question.prompt.clone(),
                    given: given.clone(),
                    given_label: given.as_ref().map(|g| g.describe(&question.options)),
                    correct_label: question.correct_label(),
                    is_correct,
                    points_earned,
                    points_possible: question.points,
                    explanation: question.explanation.clone(),
                }
            })
            .collect();

        let score = score_percent(earned_points, total_points);
        QuizResult {
            category: self.config.category.clone(),
            correct,
            answered: self.answered_count(),
            question_count: self.questions.len(),
            earned_points,
            total_points,
            score,
            pass_threshold: self.config.pass_threshold,
            passed: score >= self.config.pass_threshold,
            reason,
            elapsed_secs: self.elapsed.as_secs(),
            outcomes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn plain_config() -> SessionConfig {
        SessionConfig {
            count: 0,
            shuffle_questions: false,
            shuffle_options: false,
            ..SessionConfig::default()
        }
    }

    fn started(questions: Vec<Question>, config: SessionConfig) -> QuizSession {
        let mut s = QuizSession::new(config, questions).unwrap();
        s.start().unwrap();
        s
    }

    fn correct_choice(q: &Question) -> AnswerValue {
        q.answer.clone()
    }

    mod lifecycle_tests {
        use super::*;

        #[test]
        fn new_session_is_not_started() {
            let s = QuizSession::new(plain_config(), five_choice_questions()).unwrap();
            assert_eq!(s.state(), SessionState::NotStarted);
            assert_eq!(s.cursor(), 0);
            assert_eq!(s.answered_count(), 0);
        }

        #[test]
        fn empty_questions_fail() {
            let result = QuizSession::new(plain_config(), vec![]);
            assert!(matches!(result, Err(QuizError::EmptyPool)));
        }

        #[test]
        fn from_pool_selects_questions() {
            let config = SessionConfig {
                count: 3,
                ..SessionConfig::default()
            };
            let mut rng = StdRng::seed_from_u64(7);
            let s = QuizSession::from_pool(config, &five_choice_questions(), &mut rng).unwrap();
            assert_eq!(s.len(), 3);
        }

        #[test]
        fn from_empty_pool_fails() {
            let mut rng = StdRng::seed_from_u64(7);
            let result = QuizSession::from_pool(plain_config(), &[], &mut rng);
            assert!(matches!(result, Err(QuizError::EmptyPool)));
        }

        #[test]
        fn empty_pool_uses_fallback() {
            let mut rng = StdRng::seed_from_u64(7);
            let s = QuizSession::from_pool_or(plain_config(), &[], five_choice_questions, &mut rng)
                .unwrap();
            assert_eq!(s.len(), 5);
        }

        #[test]
        fn fallback_not_called_for_usable_pool() {
            let mut rng = StdRng::seed_from_u64(7);
            let pool = vec![true_false("only", true)];
            let s = QuizSession::from_pool_or(
                plain_config(),
                &pool,
                || panic!("fallback should not run"),
                &mut rng,
            )
            .unwrap();
            assert_eq!(s.len(), 1);
        }

        #[test]
        fn start_is_idempotent() {
            let mut s = started(five_choice_questions(), plain_config());
            s.start().unwrap();
            assert_eq!(s.state(), SessionState::InProgress);
        }

        #[test]
        fn start_after_completion_fails() {
            let mut s = started(five_choice_questions(), plain_config());
            s.complete();
            assert!(matches!(s.start(), Err(QuizError::SessionCompleted)));
        }

        #[test]
        fn record_before_start_fails() {
            let mut s = QuizSession::new(plain_config(), five_choice_questions()).unwrap();
            let result = s.record_answer(0, AnswerValue::Choice(0));
            assert!(matches!(result, Err(QuizError::SessionNotStarted)));
        }
    }

    mod recording_tests {
        use super::*;

        #[test]
        fn records_current_answer() {
            let mut s = started(five_choice_questions(), plain_config());
            s.record_answer(0, AnswerValue::Choice(2)).unwrap();
            assert_eq!(s.current_answer(), Some(&AnswerValue::Choice(2)));
            assert!(s.can_advance());
        }

        #[test]
        fn overwrites_previous_answer() {
            let mut s = started(five_choice_questions(), plain_config());
            s.record_answer(0, AnswerValue::Choice(2)).unwrap();
            s.record_answer(0, AnswerValue::Choice(1)).unwrap();
            assert_eq!(s.current_answer(), Some(&AnswerValue::Choice(1)));
            assert_eq!(s.answered_count(), 1);
        }

        #[test]
        fn boolean_on_single_choice_is_type_error() {
            let mut s = started(five_choice_questions(), plain_config());
            let result = s.record_answer(0, AnswerValue::Bool(true));
            assert!(matches!(
                result,
                Err(QuizError::InvalidAnswerType {
                    expected: crate::models::QuestionKind::SingleChoice,
                    found: crate::models::QuestionKind::TrueFalse,
                })
            ));
            assert!(s.current_answer().is_none());
        }

        #[test]
        fn text_on_true_false_is_type_error() {
            let mut s = started(vec![true_false("tf", true)], plain_config());
            let result = s.record_answer(0, AnswerValue::Text("true".into()));
            assert!(matches!(result, Err(QuizError::InvalidAnswerType { .. })));
        }

        #[test]
        fn option_out_of_range_is_index_error() {
            let mut s = started(five_choice_questions(), plain_config());
            let result = s.record_answer(0, AnswerValue::Choice(4));
            assert!(matches!(
                result,
                Err(QuizError::InvalidIndex { index: 4, len: 4 })
            ));
        }

        #[test]
        fn question_index_out_of_range() {
            let mut s = started(five_choice_questions(), plain_config());
            let result = s.record_answer(9, AnswerValue::Choice(0));
            assert!(matches!(
                result,
                Err(QuizError::InvalidIndex { index: 9, len: 5 })
            ));
        }

        #[test]
        fn cannot_answer_ahead_of_cursor() {
            let mut s = started(five_choice_questions(), plain_config());
            let result = s.record_answer(2, AnswerValue::Choice(0));
            assert!(matches!(result, Err(QuizError::InvalidIndex { .. })));
        }

        #[test]
        fn can_revise_visited_answer_with_back_navigation() {
            let mut s = started(five_choice_questions(), plain_config());
            s.record_answer(0, AnswerValue::Choice(0)).unwrap();
            s.next().unwrap();
            s.record_answer(0, AnswerValue::Choice(3)).unwrap();
            assert_eq!(s.answer_at(0), Some(&AnswerValue::Choice(3)));
        }

        #[test]
        fn cannot_revise_visited_answer_when_forward_only() {
            let config = SessionConfig {
                allow_back: false,
                ..plain_config()
            };
            let mut s = started(five_choice_questions(), config);
            s.record_answer(0, AnswerValue::Choice(0)).unwrap();
            s.next().unwrap();
            let result = s.record_answer(0, AnswerValue::Choice(3));
            assert!(matches!(result, Err(QuizError::InvalidIndex { .. })));
        }

        #[test]
        fn recording_after_completion_fails() {
            let mut s = started(five_choice_questions(), plain_config());
            s.complete();
            let result = s.record_answer(0, AnswerValue::Choice(0));
            assert!(matches!(result, Err(QuizError::SessionCompleted)));
        }

        #[test]
        fn clear_answer_resets_slot() {
            let mut s = started(five_choice_questions(), plain_config());
            s.record_answer(0, AnswerValue::Choice(0)).unwrap();
            s.clear_answer().unwrap();
            assert!(s.current_answer().is_none());
            assert!(!s.can_advance());
        }
    }

    mod navigation_tests {
        use super::*;

        #[test]
        fn next_requires_answer() {
            let mut s = started(five_choice_questions(), plain_config());
            assert_eq!(s.next().unwrap(), NavStatus::AnswerRequired);
            assert_eq!(s.cursor(), 0);
        }

        #[test]
        fn next_moves_after_answer() {
            let mut s = started(five_choice_questions(), plain_config());
            s.record_answer(0, AnswerValue::Choice(0)).unwrap();
            assert_eq!(s.next().unwrap(), NavStatus::Moved(1));
            assert_eq!(s.cursor(), 1);
        }

        #[test]
        fn next_on_last_answered_is_ready_to_submit() {
            let mut s = started(vec![true_false("a", true)], plain_config());
            s.record_answer(0, AnswerValue::Bool(true)).unwrap();
            assert_eq!(s.next().unwrap(), NavStatus::ReadyToSubmit);
            assert_eq!(s.cursor(), 0);
            assert_eq!(s.state(), SessionState::InProgress);
        }

        #[test]
        fn previous_restores_answer() {
            let mut s = started(five_choice_questions(), plain_config());
            s.record_answer(0, AnswerValue::Choice(2)).unwrap();
            s.next().unwrap();
            assert!(s.current_answer().is_none());
            assert_eq!(s.previous().unwrap(), NavStatus::Moved(0));
            assert_eq!(s.current_answer(), Some(&AnswerValue::Choice(2)));
        }

        #[test]
        fn previous_at_start() {
            let mut s = started(five_choice_questions(), plain_config());
            assert_eq!(s.previous().unwrap(), NavStatus::AtStart);
            assert_eq!(s.cursor(), 0);
        }

        #[test]
        fn previous_disabled() {
            let config = SessionConfig {
                allow_back: false,
                ..plain_config()
            };
            let mut s = started(five_choice_questions(), config);
            s.record_answer(0, AnswerValue::Choice(0)).unwrap();
            s.next().unwrap();
            assert_eq!(s.previous().unwrap(), NavStatus::BackwardDisabled);
            assert_eq!(s.cursor(), 1);
        }

        #[test]
        fn go_to_in_range() {
            let mut s = started(five_choice_questions(), plain_config());
            assert_eq!(s.go_to(4).unwrap(), NavStatus::Moved(4));
            assert_eq!(s.go_to(1).unwrap(), NavStatus::Moved(1));
        }

        #[test]
        fn go_to_out_of_range() {
            let mut s = started(five_choice_questions(), plain_config());
            assert!(matches!(s.go_to(5), Err(QuizError::InvalidIndex { .. })));
            assert_eq!(s.cursor(), 0);
        }

        #[test]
        fn go_to_backward_when_forward_only_is_noop() {
            let config = SessionConfig {
                allow_back: false,
                ..plain_config()
            };
            let mut s = started(five_choice_questions(), config);
            s.go_to(3).unwrap();
            assert_eq!(s.go_to(1).unwrap(), NavStatus::BackwardDisabled);
            assert_eq!(s.cursor(), 3);
        }

        #[test]
        fn navigation_after_completion_fails() {
            let mut s = started(five_choice_questions(), plain_config());
            s.complete();
            assert!(matches!(s.next(), Err(QuizError::SessionCompleted)));
            assert!(matches!(s.previous(), Err(QuizError::SessionCompleted)));
            assert!(matches!(s.go_to(0), Err(QuizError::SessionCompleted)));
        }

        #[test]
        fn cursor_stays_in_bounds() {
            let questions = five_choice_questions();
            let mut s = started(questions.clone(), plain_config());
            for step in 0..40 {
                let q = s.current().clone();
                let _ = s.record_answer(s.cursor(), correct_choice(&q));
                let _ = match step % 3 {
                    0 => s.next(),
                    1 => s.previous(),
                    _ => s.next(),
                };
                assert!(s.cursor() < s.len());
            }
        }
    }

    mod timer_tests {
        use super::*;

        #[test]
        fn time_limit_expiry_completes_with_zero() {
            let config = SessionConfig {
                time_limit: Some(1),
                ..plain_config()
            };
            let mut s = started(five_choice_questions(), config);
            let outcome = s.tick(Duration::from_secs(1));
            assert_eq!(outcome, TickOutcome::Completed(CompletionReason::TimedOut));
            assert_eq!(s.state(), SessionState::Completed);
            let result = s.complete();
            assert_eq!(result.score, 0);
            assert_eq!(result.reason, CompletionReason::TimedOut);
        }

        #[test]
        fn expiry_counts_answers_recorded_so_far() {
            let questions = five_choice_questions();
            let config = SessionConfig {
                time_limit: Some(5),
                ..plain_config()
            };
            let mut s = started(questions.clone(), config);
            s.record_answer(0, correct_choice(&questions[0])).unwrap();
            assert_eq!(s.tick(Duration::from_secs(2)), TickOutcome::Counting(3));
            s.tick(Duration::from_secs(3));
            assert_eq!(s.complete().correct, 1);
        }

        #[test]
        fn unlimited_session_never_times_out() {
            let mut s = started(five_choice_questions(), plain_config());
            assert_eq!(s.tick(Duration::from_secs(86_400)), TickOutcome::Idle);
            assert_eq!(s.state(), SessionState::InProgress);
        }

        #[test]
        fn tick_before_start_is_idle() {
            let config = SessionConfig {
                time_limit: Some(1),
                ..plain_config()
            };
            let mut s = QuizSession::new(config, five_choice_questions()).unwrap();
            assert_eq!(s.tick(Duration::from_secs(5)), TickOutcome::Idle);
            assert_eq!(s.remaining_secs(), Some(1));
        }

        #[test]
        fn pause_halts_countdown() {
            let config = SessionConfig {
                time_limit: Some(10),
                ..plain_config()
            };
            let mut s = started(five_choice_questions(), config);
            s.tick(Duration::from_secs(2));
            s.pause();
            assert!(s.is_paused());
            s.tick(Duration::from_secs(60));
            assert_eq!(s.remaining_secs(), Some(8));
            s.toggle_pause();
            assert!(!s.is_paused());
            s.tick(Duration::from_secs(1));
            assert_eq!(s.remaining_secs(), Some(7));
        }

        #[test]
        fn untimed_session_can_pause() {
            let mut s = started(five_choice_questions(), plain_config());
            s.pause();
            assert!(s.is_paused());
            s.toggle_pause();
            assert!(!s.is_paused());
        }

        #[test]
        fn paused_time_is_not_counted() {
            let mut s = started(five_choice_questions(), plain_config());
            s.tick(Duration::from_secs(3));
            s.pause();
            s.tick(Duration::from_secs(100));
            assert_eq!(s.complete().elapsed_secs, 3);
        }

        #[test]
        fn late_tick_after_submit_is_ignored() {
            let config = SessionConfig {
                time_limit: Some(2),
                ..plain_config()
            };
            let mut s = started(five_choice_questions(), config);
            s.complete();
            assert_eq!(s.tick(Duration::from_secs(5)), TickOutcome::Idle);
            assert_eq!(s.complete().reason, CompletionReason::Submitted);
        }
    }

    mod auto_advance_tests {
        use super::*;

        fn auto_config(submit: bool) -> SessionConfig {
            SessionConfig {
                auto_advance: Some(Duration::from_millis(500)),
                auto_submit: submit,
                ..plain_config()
            }
        }

        #[test]
        fn advances_after_delay() {
            let mut s = started(five_choice_questions(), auto_config(false));
            s.record_answer(0, AnswerValue::Choice(0)).unwrap();
            assert_eq!(s.tick(Duration::from_millis(300)), TickOutcome::Idle);
            assert_eq!(s.cursor(), 0);
            assert_eq!(
                s.tick(Duration::from_millis(300)),
                TickOutcome::Advanced(NavStatus::Moved(1))
            );
            assert_eq!(s.cursor(), 1);
        }

        #[test]
        fn pause_holds_pending_advance() {
            let config = SessionConfig {
                time_limit: Some(60),
                ..auto_config(false)
            };
            let mut s = started(five_choice_questions(), config);
            s.record_answer(0, AnswerValue::Choice(0)).unwrap();
            s.pause();
            assert_eq!(s.tick(Duration::from_secs(1)), TickOutcome::Idle);
            assert_eq!(s.cursor(), 0);

            s.resume();
            assert_eq!(
                s.tick(Duration::from_secs(1)),
                TickOutcome::Advanced(NavStatus::Moved(1))
            );
        }

        #[test]
        fn manual_navigation_cancels_pending_advance() {
            let mut s = started(five_choice_questions(), auto_config(false));
            s.record_answer(0, AnswerValue::Choice(0)).unwrap();
            s.next().unwrap();
            s.tick(Duration::from_secs(1));
            assert_eq!(s.cursor(), 1);
        }

        #[test]
        fn auto_submits_on_last_question() {
            let mut s = started(vec![true_false("a", true)], auto_config(true));
            s.record_answer(0, AnswerValue::Bool(true)).unwrap();
            assert_eq!(
                s.tick(Duration::from_secs(1)),
                TickOutcome::Completed(CompletionReason::AutoSubmitted)
            );
            assert_eq!(s.complete().score, 100);
        }

        #[test]
        fn without_auto_submit_last_question_waits() {
            let mut s = started(vec![true_false("a", true)], auto_config(false));
            s.record_answer(0, AnswerValue::Bool(true)).unwrap();
            assert_eq!(
                s.tick(Duration::from_secs(1)),
                TickOutcome::Advanced(NavStatus::ReadyToSubmit)
            );
            assert_eq!(s.state(), SessionState::InProgress);
        }
    }

    mod scoring_tests {
        use super::*;

        #[test]
        fn all_correct_scores_100_and_passes() {
            let questions = five_choice_questions();
            let mut s = started(questions.clone(), plain_config());
            for (i, q) in questions.iter().enumerate() {
                s.record_answer(i, correct_choice(q)).unwrap();
                s.next().unwrap();
            }
            let result = s.complete();
            assert_eq!(result.score, 100);
            assert!(result.passed);
            assert_eq!(result.correct, 5);
            assert_eq!(result.earned_points, 50);
        }

        #[test]
        fn three_correct_two_unanswered_scores_60() {
            let questions = five_choice_questions();
            let mut s = started(questions.clone(), plain_config());
            for (i, q) in questions.iter().enumerate().take(3) {
                s.record_answer(i, correct_choice(q)).unwrap();
                s.next().unwrap();
            }
            let result = s.complete();
            assert_eq!(result.earned_points, 30);
            assert_eq!(result.total_points, 50);
            assert_eq!(result.score, 60);
            assert!(!result.passed);
            assert_eq!(result.answered, 3);
        }

        #[test]
        fn wrong_answers_earn_nothing() {
            let questions = vec![choice("a", &["x", "y"], 0), choice("b", &["x", "y"], 1)];
            let mut s = started(questions, plain_config());
            s.record_answer(0, AnswerValue::Choice(1)).unwrap();
            s.next().unwrap();
            s.record_answer(1, AnswerValue::Choice(1)).unwrap();
            let result = s.complete();
            assert_eq!(result.correct, 1);
            assert_eq!(result.score, 50);
            assert!(!result.outcomes[0].is_correct);
            assert_eq!(result.outcomes[0].given_label.as_deref(), Some("B. y"));
        }

        #[test]
        fn fill_blank_trimmed_case_insensitive() {
            let mut s = started(vec![fill_blank("f", "SFTP")], plain_config());
            s.record_answer(0, AnswerValue::Text("  sftp ".into())).unwrap();
            let result = s.complete();
            assert_eq!(result.correct, 1);
            assert_eq!(result.score, 100);
        }

        #[test]
        fn weighted_points() {
            let mut heavy = true_false("heavy", true);
            heavy.points = 30;
            let light = true_false("light", true);
            let mut s = started(vec![heavy, light], plain_config());
            s.record_answer(0, AnswerValue::Bool(true)).unwrap();
            let result = s.complete();
            assert_eq!(result.earned_points, 30);
            assert_eq!(result.total_points, 40);
            assert_eq!(result.score, 75);
            assert!(result.passed);
        }

        #[test]
        fn all_unanswered_scores_zero() {
            let mut s = started(five_choice_questions(), plain_config());
            let result = s.complete();
            assert_eq!(result.score, 0);
            assert_eq!(result.correct, 0);
            assert!(result.outcomes.iter().all(|o| o.given.is_none()));
        }

        #[test]
        fn complete_is_idempotent() {
            let questions = five_choice_questions();
            let mut s = started(questions.clone(), plain_config());
            s.record_answer(0, correct_choice(&questions[0])).unwrap();
            let first = s.complete().clone();
            let second = s.complete().clone();
            assert_eq!(first, second);
            assert_eq!(first.score, 20);
        }

        #[test]
        fn custom_threshold() {
            let config = SessionConfig {
                pass_threshold: 50,
                ..plain_config()
            };
            let questions = vec![true_false("a", true), true_false("b", true)];
            let mut s = started(questions, config);
            s.record_answer(0, AnswerValue::Bool(true)).unwrap();
            let result = s.complete();
            assert_eq!(result.score, 50);
            assert!(result.passed);
        }

        #[test]
        fn complete_without_start() {
            let mut s = QuizSession::new(plain_config(), five_choice_questions()).unwrap();
            let result = s.complete();
            assert_eq!(result.score, 0);
            assert_eq!(s.state(), SessionState::Completed);
        }

        #[test]
        fn score_always_within_bounds() {
            let mut rng = StdRng::seed_from_u64(99);
            for _ in 0..20 {
                let questions = five_choice_questions();
                let mut s = started(questions.clone(), plain_config());
                for i in 0..questions.len() {
                    let pick = rng.gen_range(0..5);
                    if pick < 4 {
                        s.record_answer(i, AnswerValue::Choice(pick)).unwrap();
                        s.next().unwrap();
                    } else {
                        s.go_to((i + 1).min(questions.len() - 1)).unwrap();
                    }
                }
                let result = s.complete();
                assert!(result.score <= 100);
            }
        }
    }
}
