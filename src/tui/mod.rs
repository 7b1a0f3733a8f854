mod ui;
mod widgets;

use std::io;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::bank::{self, QuestionBank};
use crate::certificate::{self, SavedAttempt};
use crate::config::AppConfig;
use crate::db::{Database, Stats};
use crate::error::{QuizError, Result};
use crate::models::{AnswerRecord, AnswerValue, QuestionKind, QuizResult, ResultRecord};
use crate::session::{NavStatus, QuizSession, TickOutcome};
use crate::tutor::{Conversation, HttpTutor, Tutor};

const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Menu,
    Quiz,
    Results,
    History,
    Tutor,
    Error,
}

impl View {
    fn next(&self) -> Self {
        match self {
            View::Menu => View::History,
            View::History => View::Tutor,
            View::Tutor => View::Menu,
            other => *other,
        }
    }

    fn prev(&self) -> Self {
        match self {
            View::Menu => View::Tutor,
            View::History => View::Menu,
            View::Tutor => View::History,
            other => *other,
        }
    }
}

pub struct StatefulList<T> {
    pub items: Vec<T>,
    pub selected: Option<usize>,
}

impl<T> StatefulList<T> {
    fn with_items(items: Vec<T>) -> Self {
        let selected = if items.is_empty() { None } else { Some(0) };
        Self { items, selected }
    }

    fn next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(i) if i + 1 < self.items.len() => i + 1,
            _ => 0,
        };
        self.selected = Some(i);
    }

    fn previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.selected {
            Some(0) | None => self.items.len() - 1,
            Some(i) => i - 1,
        };
        self.selected = Some(i);
    }

    fn selected_item(&self) -> Option<&T> {
        self.selected.and_then(|i| self.items.get(i))
    }
}

/// One row of the start menu. `category: None` means every category.
#[derive(Debug, Clone)]
pub struct MenuEntry {
    pub category: Option<String>,
    pub label: String,
    pub questions: usize,
    pub best_score: Option<i64>,
}

/// What `r` on the error panel tries again.
#[derive(Debug, Clone)]
pub enum Retry {
    StartQuiz(Option<String>),
    SaveResult,
    Reload,
}

pub struct App {
    db: Database,
    config: AppConfig,
    bank: QuestionBank,
    pub view: View,
    pub menu: StatefulList<MenuEntry>,
    pub stats: Stats,
    pub session: Option<QuizSession>,
    started_at: Option<DateTime<Utc>>,
    pub answer_input: String,
    pub status: Option<String>,
    pub last_result: Option<QuizResult>,
    pub saved: Option<SavedAttempt>,
    pub results_scroll: u16,
    pub history: StatefulList<ResultRecord>,
    pub history_answers: Vec<AnswerRecord>,
    pub conversation: Conversation,
    pub chat_input: String,
    pub chat_error: Option<String>,
    pub chat_pending: bool,
    tutor: Option<Box<dyn Tutor>>,
    pub error: Option<QuizError>,
    retry: Option<Retry>,
    pub should_quit: bool,
}

impl App {
    pub fn new(db: Database, config: AppConfig) -> Result<Self> {
        let bank = bank::load_or_builtin(config.bank.as_deref());
        let mut app = Self {
            db,
            config,
            bank,
            view: View::Menu,
            menu: StatefulList::with_items(Vec::new()),
            stats: Stats::default(),
            session: None,
            started_at: None,
            answer_input: String::new(),
            status: None,
            last_result: None,
            saved: None,
            results_scroll: 0,
            history: StatefulList::with_items(Vec::new()),
            history_answers: Vec::new(),
            conversation: Conversation::new(),
            chat_input: String::new(),
            chat_error: None,
            chat_pending: false,
            tutor: None,
            error: None,
            retry: None,
            should_quit: false,
        };
        app.refresh_data()?;
        Ok(app)
    }

    pub fn refresh_data(&mut self) -> Result<()> {
        self.stats = self.db.get_stats()?;
        let best = self.db.best_scores()?;
        let best_for = |name: &str| best.iter().find(|(c, _)| c == name).map(|(_, s)| *s);

        let mut entries = vec![MenuEntry {
            category: None,
            label: "All topics".to_string(),
            questions: self.bank.len(),
            best_score: best_for("all"),
        }];
        entries.extend(self.bank.categories().into_iter().map(|c| MenuEntry {
            best_score: best_for(&c.name),
            category: Some(c.name.clone()),
            label: c.name,
            questions: c.questions,
        }));

        let selected = self.menu.selected;
        self.menu = StatefulList::with_items(entries);
        if let Some(i) = selected.filter(|i| *i < self.menu.items.len()) {
            self.menu.selected = Some(i);
        }

        self.history = StatefulList::with_items(self.db.list_results(None, HISTORY_LIMIT)?);
        self.load_history_answers()?;
        Ok(())
    }

    fn load_history_answers(&mut self) -> Result<()> {
        self.history_answers = match self.history.selected_item() {
            Some(record) => self.db.get_result_answers(record.id)?,
            None => Vec::new(),
        };
        Ok(())
    }

    fn fail(&mut self, err: QuizError, retry: Option<Retry>) {
        log::debug!("tui error: {}", err);
        self.error = Some(err);
        self.retry = retry;
        self.view = View::Error;
    }

    fn start_quiz(&mut self, category: Option<String>) {
        let config = self.config.quiz.session_config(category.clone(), None);
        let created = QuizSession::from_pool_or(
            config,
            &self.bank.questions,
            || bank::builtin().questions,
            &mut rand::thread_rng(),
        )
        .and_then(|mut session| session.start().map(|_| session));
        match created {
            Ok(session) => {
                self.session = Some(session);
                self.started_at = Some(Utc::now());
                self.answer_input.clear();
                self.status = None;
                self.last_result = None;
                self.saved = None;
                self.view = View::Quiz;
            }
            Err(e) => self.fail(e, Some(Retry::StartQuiz(category))),
        }
    }

    fn finish_quiz(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        self.last_result = Some(session.complete().clone());
        self.session = None;
        self.results_scroll = 0;
        self.save_result();
    }

    fn save_result(&mut self) {
        let Some(result) = self.last_result.as_ref() else {
            return;
        };
        let started_at = self.started_at.unwrap_or_else(Utc::now);
        match certificate::record_attempt(&self.db, &self.config, result, started_at) {
            Ok(saved) => {
                self.saved = Some(saved);
                self.view = View::Results;
                if let Err(e) = self.refresh_data() {
                    self.fail(e, Some(Retry::Reload));
                }
            }
            Err(e) => self.fail(e, Some(Retry::SaveResult)),
        }
    }

    fn retry(&mut self) {
        self.error = None;
        match self.retry.take() {
            Some(Retry::StartQuiz(category)) => self.start_quiz(category),
            Some(Retry::SaveResult) => self.save_result(),
            Some(Retry::Reload) => match self.refresh_data() {
                Ok(()) => self.view = View::Menu,
                Err(e) => self.fail(e, Some(Retry::Reload)),
            },
            None => self.view = View::Menu,
        }
    }

    fn back_to_menu(&mut self) {
        self.error = None;
        self.retry = None;
        self.session = None;
        self.view = View::Menu;
    }

    /// Feeds wall time to a running quiz.
    pub fn on_tick(&mut self, elapsed: Duration) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match session.tick(elapsed) {
            TickOutcome::Completed(reason) => {
                self.status = Some(reason.label().to_string());
                self.finish_quiz();
            }
            TickOutcome::Advanced(status) => {
                self.answer_input.clear();
                self.status = nav_message(status);
            }
            TickOutcome::Counting(_) | TickOutcome::Idle => {}
        }
    }

    fn send_pending_chat(&mut self) {
        if !self.chat_pending {
            return;
        }
        self.chat_pending = false;
        let text = std::mem::take(&mut self.chat_input);

        if self.tutor.is_none() {
            match HttpTutor::from_config(&self.config.tutor) {
                Ok(tutor) => self.tutor = Some(Box::new(tutor)),
                Err(e) => {
                    self.chat_error = Some(e.to_string());
                    self.chat_input = text;
                    return;
                }
            }
        }
        let Some(tutor) = self.tutor.as_deref() else {
            return;
        };
        match self.conversation.send(tutor, &text) {
            Ok(_) => self.chat_error = None,
            Err(e) => {
                self.chat_error = Some(e.to_string());
                self.chat_input = text;
            }
        }
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        if key == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return Ok(());
        }

        match self.view {
            View::Quiz => self.handle_quiz_key(key, modifiers),
            View::Tutor => {
                self.handle_tutor_key(key, modifiers);
                Ok(())
            }
            View::Error => {
                match key {
                    KeyCode::Char('r') => self.retry(),
                    KeyCode::Char('m') | KeyCode::Esc => self.back_to_menu(),
                    KeyCode::Char('q') => self.should_quit = true,
                    _ => {}
                }
                Ok(())
            }
            View::Results => {
                match key {
                    KeyCode::Char('j') | KeyCode::Down => {
                        self.results_scroll = self.results_scroll.saturating_add(1)
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        self.results_scroll = self.results_scroll.saturating_sub(1)
                    }
                    KeyCode::Char('m') | KeyCode::Enter | KeyCode::Esc => self.back_to_menu(),
                    KeyCode::Char('q') => self.should_quit = true,
                    _ => {}
                }
                Ok(())
            }
            View::Menu | View::History => self.handle_list_key(key, modifiers),
        }
    }

    fn handle_list_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        match key {
            KeyCode::Char('q') => self.should_quit = true,

            KeyCode::Char('r') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.refresh_data()?;
            }

            KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => self.view = self.view.prev(),
            KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => self.view = self.view.next(),

            KeyCode::Char('j') | KeyCode::Down => match self.view {
                View::Menu => self.menu.next(),
                _ => {
                    self.history.next();
                    self.load_history_answers()?;
                }
            },
            KeyCode::Char('k') | KeyCode::Up => match self.view {
                View::Menu => self.menu.previous(),
                _ => {
                    self.history.previous();
                    self.load_history_answers()?;
                }
            },

            KeyCode::Char('g') => match self.view {
                View::Menu if !self.menu.items.is_empty() => self.menu.selected = Some(0),
                View::History if !self.history.items.is_empty() => {
                    self.history.selected = Some(0);
                    self.load_history_answers()?;
                }
                _ => {}
            },
            KeyCode::Char('G') => match self.view {
                View::Menu if !self.menu.items.is_empty() => {
                    self.menu.selected = Some(self.menu.items.len() - 1)
                }
                View::History if !self.history.items.is_empty() => {
                    self.history.selected = Some(self.history.items.len() - 1);
                    self.load_history_answers()?;
                }
                _ => {}
            },

            KeyCode::Enter if self.view == View::Menu => {
                if let Some(entry) = self.menu.selected_item() {
                    let category = entry.category.clone();
                    self.start_quiz(category);
                }
            }

            _ => {}
        }
        Ok(())
    }

    fn handle_quiz_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> Result<()> {
        let Some(session) = self.session.as_mut() else {
            self.view = View::Menu;
            return Ok(());
        };
        let ctrl = modifiers.contains(KeyModifiers::CONTROL);

        match key {
            KeyCode::Char('s') if ctrl => {
                self.finish_quiz();
                return Ok(());
            }
            KeyCode::Char('p') if ctrl => {
                session.toggle_pause();
                return Ok(());
            }
            KeyCode::Esc => {
                log::info!("quiz abandoned");
                self.back_to_menu();
                return Ok(());
            }
            _ => {}
        }

        if session.is_paused() {
            self.status = Some("Paused: Ctrl-P to resume".to_string());
            return Ok(());
        }

        match key {
            KeyCode::Right => {
                self.status = nav_message(session.next()?);
                self.answer_input.clear();
                return Ok(());
            }
            KeyCode::Left => {
                self.status = nav_message(session.previous()?);
                self.answer_input.clear();
                return Ok(());
            }
            KeyCode::Delete => {
                session.clear_answer()?;
                self.answer_input.clear();
                return Ok(());
            }
            _ => {}
        }

        let cursor = session.cursor();
        let question = session.current();
        match (question.kind(), key) {
            (QuestionKind::SingleChoice, KeyCode::Char(c)) => {
                if let Some(index) = choice_index(c, question.options.len()) {
                    session.record_answer(cursor, AnswerValue::Choice(index))?;
                    self.status = None;
                }
            }
            (QuestionKind::TrueFalse, KeyCode::Char(c)) => {
                let value = match c.to_ascii_lowercase() {
                    't' | 'b' | 'y' => Some(true),
                    'f' | 's' | 'n' => Some(false),
                    _ => None,
                };
                if let Some(value) = value {
                    session.record_answer(cursor, AnswerValue::Bool(value))?;
                    self.status = None;
                }
            }
            (QuestionKind::FillBlank, KeyCode::Char(c)) => self.answer_input.push(c),
            (QuestionKind::FillBlank, KeyCode::Backspace) => {
                self.answer_input.pop();
            }
            (QuestionKind::FillBlank, KeyCode::Enter) => {
                let text = self.answer_input.trim().to_string();
                if !text.is_empty() {
                    session.record_answer(cursor, AnswerValue::Text(text))?;
                }
                self.status = nav_message(session.next()?);
                self.answer_input.clear();
            }
            (_, KeyCode::Enter) => {
                self.status = nav_message(session.next()?);
            }
            _ => {}
        }
        Ok(())
    }

    fn handle_tutor_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        match key {
            KeyCode::Char('l') if modifiers.contains(KeyModifiers::CONTROL) => {
                self.conversation.clear();
                self.chat_error = None;
            }
            KeyCode::Esc => self.view = View::Menu,
            KeyCode::Tab => self.view = self.view.next(),
            KeyCode::BackTab => self.view = self.view.prev(),
            KeyCode::Enter if !self.chat_input.trim().is_empty() => self.chat_pending = true,
            KeyCode::Backspace => {
                self.chat_input.pop();
            }
            KeyCode::Char(c) => self.chat_input.push(c),
            _ => {}
        }
    }
}

fn choice_index(c: char, option_count: usize) -> Option<usize> {
    let index = if let Some(d) = c.to_digit(10) {
        (d as usize).checked_sub(1)?
    } else if c.is_ascii_alphabetic() {
        (c.to_ascii_lowercase() as u8 - b'a') as usize
    } else {
        return None;
    };
    (index < option_count).then_some(index)
}

fn nav_message(status: NavStatus) -> Option<String> {
    match status {
        NavStatus::Moved(_) => None,
        NavStatus::AnswerRequired => Some("Answer this question first".to_string()),
        NavStatus::ReadyToSubmit => Some("Last question: Ctrl-S to submit".to_string()),
        NavStatus::BackwardDisabled => Some("Going back is disabled for this quiz".to_string()),
        NavStatus::AtStart => Some("Already at the first question".to_string()),
    }
}

pub fn run(db: Database, config: AppConfig) -> std::result::Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = match App::new(db, config) {
        Ok(mut app) => run_app(&mut terminal, &mut app),
        Err(e) => Err(e.into()),
    };

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if app.chat_pending {
            app.send_pending_chat();
            last_tick = Instant::now();
            continue;
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if let Err(e) = app.handle_key(key.code, key.modifiers) {
                    app.fail(e, None);
                }
            }
        }

        let now = Instant::now();
        app.on_tick(now.duration_since(last_tick));
        last_tick = now;

        if app.should_quit {
            return Ok(());
        }
    }
}
