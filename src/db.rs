use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::models::{AnswerRecord, Certificate, CompletionReason, QuizResult, ResultRecord};

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(Self { conn })
    }

    /// Opens and initializes the database at `path`. When that fails, the
    /// learner still gets a working (but unsaved) in-memory store.
    pub fn open_or_memory<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Self::open(path).and_then(|db| db.init().map(|_| db)) {
            Ok(db) => Ok(db),
            Err(e) => {
                log::warn!(
                    "progress store at {} is unavailable ({}); progress will not be saved",
                    path.display(),
                    e
                );
                let db = Self::open(":memory:")?;
                db.init()?;
                Ok(db)
            }
        }
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                category TEXT,
                started_at TEXT NOT NULL,
                finished_at TEXT NOT NULL DEFAULT (datetime('now')),
                correct INTEGER NOT NULL,
                question_count INTEGER NOT NULL,
                earned_points INTEGER NOT NULL,
                total_points INTEGER NOT NULL,
                score INTEGER NOT NULL CHECK(score BETWEEN 0 AND 100),
                passed INTEGER NOT NULL,
                reason TEXT NOT NULL DEFAULT 'submitted'
                    CHECK(reason IN ('submitted', 'timed_out', 'auto_submitted'))
            );

            -- Per-question answers for a finished result
            CREATE TABLE IF NOT EXISTS result_answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                result_id INTEGER NOT NULL,
                position INTEGER NOT NULL,
                question_id TEXT NOT NULL,
                prompt TEXT NOT NULL,
                given TEXT,
                correct_answer TEXT NOT NULL,
                is_correct INTEGER NOT NULL,
                points_earned INTEGER NOT NULL,
                FOREIGN KEY (result_id) REFERENCES results(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS profile (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS certificates (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                learner TEXT NOT NULL,
                result_id INTEGER NOT NULL,
                score INTEGER NOT NULL,
                category TEXT,
                issued_at TEXT NOT NULL DEFAULT (datetime('now')),
                FOREIGN KEY (result_id) REFERENCES results(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_results_category ON results(category);
            CREATE INDEX IF NOT EXISTS idx_results_finished ON results(finished_at);
            CREATE INDEX IF NOT EXISTS idx_result_answers_result ON result_answers(result_id);
            "#,
        )?;

        self.migrate()?;

        Ok(())
    }

    // Databases created before elapsed time was tracked lack the column
    fn migrate(&self) -> Result<()> {
        let has_elapsed: bool = self
            .conn
            .prepare("SELECT elapsed_secs FROM results LIMIT 1")
            .is_ok();

        if !has_elapsed {
            self.conn.execute_batch(
                "ALTER TABLE results ADD COLUMN elapsed_secs INTEGER NOT NULL DEFAULT 0;",
            )?;
        }

        Ok(())
    }

    // Result operations

    /// Stores a finished quiz with its answers. When `certificate_for` names
    /// a learner, a certificate is issued in the same transaction.
    pub fn save_result(
        &self,
        result: &QuizResult,
        started_at: DateTime<Utc>,
        certificate_for: Option<&str>,
    ) -> Result<(i64, Option<i64>)> {
        let tx = self.conn.unchecked_transaction()?;
        let now = Utc::now();

        tx.execute(
            r#"
            INSERT INTO results (category, started_at, finished_at, correct, question_count,
                                 earned_points, total_points, score, passed, reason, elapsed_secs)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                result.category,
                started_at.to_rfc3339(),
                now.to_rfc3339(),
                result.correct as i64,
                result.question_count as i64,
                result.earned_points,
                result.total_points,
                result.score,
                result.passed,
                result.reason.as_str(),
                result.elapsed_secs as i64,
            ],
        )?;
        let result_id = tx.last_insert_rowid();

        for (position, outcome) in result.outcomes.iter().enumerate() {
            tx.execute(
                r#"
                INSERT INTO result_answers (result_id, position, question_id, prompt, given,
                                            correct_answer, is_correct, points_earned)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    result_id,
                    position as i64,
                    outcome.question_id,
                    outcome.prompt,
                    outcome.given_label,
                    outcome.correct_label,
                    outcome.is_correct,
                    outcome.points_earned,
                ],
            )?;
        }

        let certificate_id = match certificate_for {
            Some(learner) => {
                tx.execute(
                    "INSERT INTO certificates (learner, result_id, score, category, issued_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        learner,
                        result_id,
                        result.score,
                        result.category,
                        now.to_rfc3339()
                    ],
                )?;
                Some(tx.last_insert_rowid())
            }
            None => None,
        };

        tx.commit()?;
        Ok((result_id, certificate_id))
    }

    fn row_to_result(row: &rusqlite::Row<'_>) -> Result<ResultRecord> {
        let reason_str: String = row.get(10)?;
        Ok(ResultRecord {
            id: row.get(0)?,
            category: row.get(1)?,
            started_at: row.get(2)?,
            finished_at: row.get(3)?,
            correct: row.get(4)?,
            question_count: row.get(5)?,
            earned_points: row.get(6)?,
            total_points: row.get(7)?,
            score: row.get(8)?,
            passed: row.get(9)?,
            reason: CompletionReason::from_str(&reason_str).unwrap_or(CompletionReason::Submitted),
            elapsed_secs: row.get(11)?,
        })
    }

    pub fn get_result(&self, id: i64) -> Result<Option<ResultRecord>> {
        self.conn
            .query_row(
                r#"
                SELECT id, category, started_at, finished_at, correct, question_count,
                       earned_points, total_points, score, passed, reason, elapsed_secs
                FROM results
                WHERE id = ?1
                "#,
                params![id],
                Self::row_to_result,
            )
            .optional()
    }

    pub fn list_results(&self, category: Option<&str>, limit: usize) -> Result<Vec<ResultRecord>> {
        let limit = if limit == 0 { -1 } else { limit as i64 };
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, category, started_at, finished_at, correct, question_count,
                   earned_points, total_points, score, passed, reason, elapsed_secs
            FROM results
            WHERE ?1 IS NULL OR category = ?1
            ORDER BY finished_at DESC, id DESC
            LIMIT ?2
            "#,
        )?;

        let rows = stmt.query_map(params![category, limit], Self::row_to_result)?;
        rows.collect()
    }

    pub fn get_result_answers(&self, result_id: i64) -> Result<Vec<AnswerRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT question_id, prompt, given, correct_answer, is_correct, points_earned
            FROM result_answers
            WHERE result_id = ?1
            ORDER BY position
            "#,
        )?;

        let rows = stmt.query_map(params![result_id], |row| {
            Ok(AnswerRecord {
                question_id: row.get(0)?,
                prompt: row.get(1)?,
                given: row.get(2)?,
                correct_answer: row.get(3)?,
                is_correct: row.get(4)?,
                points_earned: row.get(5)?,
            })
        })?;
        rows.collect()
    }

    pub fn best_scores(&self) -> Result<Vec<(String, i64)>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT COALESCE(category, 'all'), MAX(score)
            FROM results
            GROUP BY COALESCE(category, 'all')
            ORDER BY 1
            "#,
        )?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;
        rows.collect()
    }

    // Profile operations
    pub fn set_learner_name(&self, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO profile (key, value) VALUES ('learner', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![name],
        )?;
        Ok(())
    }

    pub fn learner_name(&self) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM profile WHERE key = 'learner'",
                [],
                |row| row.get(0),
            )
            .optional()
    }

    // Certificate operations
    /// The best certificate earned so far.
    pub fn get_certificate(&self) -> Result<Option<Certificate>> {
        self.conn
            .query_row(
                r#"
                SELECT id, learner, result_id, score, category, issued_at
                FROM certificates
                ORDER BY score DESC, issued_at DESC
                LIMIT 1
                "#,
                [],
                |row| {
                    Ok(Certificate {
                        id: row.get(0)?,
                        learner: row.get(1)?,
                        result_id: row.get(2)?,
                        score: row.get(3)?,
                        category: row.get(4)?,
                        issued_at: row.get(5)?,
                    })
                },
            )
            .optional()
    }

    pub fn reset(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            DELETE FROM certificates;
            DELETE FROM result_answers;
            DELETE FROM results;
            "#,
        )
    }

    // Statistics
    pub fn get_stats(&self) -> Result<Stats> {
        let (attempts, passed, best_score, avg_score): (i64, i64, Option<i64>, Option<f64>) =
            self.conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(passed), 0), MAX(score), AVG(score) FROM results",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        let questions_answered: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM result_answers WHERE given IS NOT NULL",
            [],
            |row| row.get(0),
        )?;

        let certificate_unlocked: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM certificates)",
            [],
            |row| row.get(0),
        )?;

        Ok(Stats {
            attempts,
            passed,
            best_score: best_score.unwrap_or(0),
            avg_score: avg_score.unwrap_or(0.0),
            questions_answered,
            certificate_unlocked,
        })
    }
}

#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Stats {
    pub attempts: i64,
    pub passed: i64,
    pub best_score: i64,
    pub avg_score: f64,
    pub questions_answered: i64,
    pub certificate_unlocked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnswerValue, QuestionOutcome};

    fn setup_db() -> Database {
        let db = Database::open(":memory:").expect("Failed to create in-memory database");
        db.init().expect("Failed to initialize database");
        db
    }

    fn outcome(id: &str, given: Option<AnswerValue>, is_correct: bool) -> QuestionOutcome {
        QuestionOutcome {
            question_id: id.to_string(),
            prompt: format!("Prompt {}", id),
            given_label: given.as_ref().map(|g| g.describe(&[])),
            given,
            correct_label: "True".to_string(),
            is_correct,
            points_earned: if is_correct { 10 } else { 0 },
            points_possible: 10,
            explanation: None,
        }
    }

    fn save(db: &Database, result: QuizResult) -> i64 {
        db.save_result(&result, Utc::now(), None).unwrap().0
    }

    fn make_result(category: Option<&str>, score: u8, passed: bool) -> QuizResult {
        QuizResult {
            category: category.map(String::from),
            correct: 1,
            answered: 1,
            question_count: 2,
            earned_points: 10,
            total_points: 20,
            score,
            pass_threshold: 70,
            passed,
            reason: CompletionReason::Submitted,
            elapsed_secs: 42,
            outcomes: vec![
                outcome("a", Some(AnswerValue::Bool(true)), true),
                outcome("b", None, false),
            ],
        }
    }

    mod init_tests {
        use super::*;

        #[test]
        fn init_creates_tables() {
            let db = setup_db();
            let tables: Vec<String> = db
                .conn
                .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
                .unwrap()
                .query_map([], |row| row.get(0))
                .unwrap()
                .collect::<Result<Vec<_>>>()
                .unwrap();

            assert!(tables.contains(&"results".to_string()));
            assert!(tables.contains(&"result_answers".to_string()));
            assert!(tables.contains(&"profile".to_string()));
            assert!(tables.contains(&"certificates".to_string()));
        }

        #[test]
        fn init_is_idempotent() {
            let db = setup_db();
            db.init().unwrap();
            db.init().unwrap();
        }

        #[test]
        fn migrate_adds_elapsed_column() {
            let db = Database::open(":memory:").unwrap();
            db.conn
                .execute_batch(
                    "CREATE TABLE results (
                        id INTEGER PRIMARY KEY AUTOINCREMENT,
                        category TEXT,
                        started_at TEXT NOT NULL,
                        finished_at TEXT NOT NULL,
                        correct INTEGER NOT NULL,
                        question_count INTEGER NOT NULL,
                        earned_points INTEGER NOT NULL,
                        total_points INTEGER NOT NULL,
                        score INTEGER NOT NULL,
                        passed INTEGER NOT NULL,
                        reason TEXT NOT NULL DEFAULT 'submitted'
                    );",
                )
                .unwrap();
            db.init().unwrap();
            assert!(db.conn.prepare("SELECT elapsed_secs FROM results").is_ok());
        }

        #[test]
        fn open_or_memory_falls_back() {
            let db = Database::open_or_memory("/nonexistent-dir/deeper/netquiz.db").unwrap();
            let stats = db.get_stats().unwrap();
            assert_eq!(stats.attempts, 0);
        }

        #[test]
        fn open_or_memory_uses_real_file() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("netquiz.db");
            {
                let db = Database::open_or_memory(&path).unwrap();
                save(&db, make_result(None, 50, false));
            }
            let db = Database::open_or_memory(&path).unwrap();
            assert_eq!(db.get_stats().unwrap().attempts, 1);
        }
    }

    mod result_tests {
        use super::*;

        #[test]
        fn save_and_get_result() {
            let db = setup_db();
            let id = save(&db, make_result(Some("protokol"), 50, false));

            let r = db.get_result(id).unwrap().unwrap();
            assert_eq!(r.category.as_deref(), Some("protokol"));
            assert_eq!(r.score, 50);
            assert!(!r.passed);
            assert_eq!(r.earned_points, 10);
            assert_eq!(r.total_points, 20);
            assert_eq!(r.reason, CompletionReason::Submitted);
            assert_eq!(r.elapsed_secs, 42);
            assert_eq!(r.elapsed_clock(), "00:42");
        }

        #[test]
        fn get_result_not_found() {
            let db = setup_db();
            assert!(db.get_result(999).unwrap().is_none());
        }

        #[test]
        fn save_result_stores_answers_in_order() {
            let db = setup_db();
            let id = save(&db, make_result(None, 50, false));

            let answers = db.get_result_answers(id).unwrap();
            assert_eq!(answers.len(), 2);
            assert_eq!(answers[0].question_id, "a");
            assert_eq!(answers[0].given.as_deref(), Some("True"));
            assert!(answers[0].is_correct);
            assert_eq!(answers[1].question_id, "b");
            assert!(answers[1].given.is_none());
            assert!(!answers[1].is_correct);
        }

        #[test]
        fn list_results_newest_first_and_filtered() {
            let db = setup_db();
            save(&db, make_result(Some("osi"), 40, false));
            save(&db, make_result(Some("protokol"), 80, true));
            save(&db, make_result(Some("osi"), 90, true));

            let all = db.list_results(None, 0).unwrap();
            assert_eq!(all.len(), 3);
            assert_eq!(all[0].score, 90);

            let osi = db.list_results(Some("osi"), 0).unwrap();
            assert_eq!(osi.len(), 2);

            let limited = db.list_results(None, 1).unwrap();
            assert_eq!(limited.len(), 1);
        }

        #[test]
        fn best_scores_per_category() {
            let db = setup_db();
            save(&db, make_result(Some("osi"), 40, false));
            save(&db, make_result(Some("osi"), 90, true));
            save(&db, make_result(None, 60, false));

            let best = db.best_scores().unwrap();
            assert_eq!(best, vec![("all".to_string(), 60), ("osi".to_string(), 90)]);
        }
    }

    mod profile_tests {
        use super::*;

        #[test]
        fn learner_name_round_trip() {
            let db = setup_db();
            assert!(db.learner_name().unwrap().is_none());
            db.set_learner_name("Budi").unwrap();
            db.set_learner_name("Budi Santoso").unwrap();
            assert_eq!(db.learner_name().unwrap().as_deref(), Some("Budi Santoso"));
        }
    }

    mod certificate_tests {
        use super::*;

        #[test]
        fn no_certificate_initially() {
            let db = setup_db();
            assert!(db.get_certificate().unwrap().is_none());
            assert!(!db.get_stats().unwrap().certificate_unlocked);
        }

        #[test]
        fn unlock_returns_best() {
            let db = setup_db();
            db.save_result(&make_result(None, 75, true), Utc::now(), Some("Ani"))
                .unwrap();
            let (r2, cert_id) = db
                .save_result(&make_result(Some("keamanan"), 95, true), Utc::now(), Some("Ani"))
                .unwrap();
            assert!(cert_id.is_some());

            let cert = db.get_certificate().unwrap().unwrap();
            assert_eq!(cert.score, 95);
            assert_eq!(cert.result_id, r2);
            assert_eq!(cert.category.as_deref(), Some("keamanan"));
            assert!(db.get_stats().unwrap().certificate_unlocked);
        }
    }

    mod attempt_tests {
        use super::*;

        #[test]
        fn failed_certificate_insert_rolls_back_result() {
            let db = setup_db();
            db.conn.execute_batch("DROP TABLE certificates;").unwrap();
            let saved = db.save_result(&make_result(None, 90, true), Utc::now(), Some("Ani"));
            assert!(saved.is_err());
            assert!(db.list_results(None, 0).unwrap().is_empty());
        }
    }

    mod stats_tests {
        use super::*;

        #[test]
        fn stats_empty_db() {
            let db = setup_db();
            let stats = db.get_stats().unwrap();
            assert_eq!(stats.attempts, 0);
            assert_eq!(stats.passed, 0);
            assert_eq!(stats.best_score, 0);
            assert_eq!(stats.avg_score, 0.0);
        }

        #[test]
        fn stats_aggregate_results() {
            let db = setup_db();
            save(&db, make_result(None, 40, false));
            save(&db, make_result(None, 80, true));

            let stats = db.get_stats().unwrap();
            assert_eq!(stats.attempts, 2);
            assert_eq!(stats.passed, 1);
            assert_eq!(stats.best_score, 80);
            assert!((stats.avg_score - 60.0).abs() < 0.01);
            assert_eq!(stats.questions_answered, 2);
        }

        #[test]
        fn reset_clears_everything() {
            let db = setup_db();
            db.save_result(&make_result(None, 80, true), Utc::now(), Some("Ani"))
                .unwrap();
            db.set_learner_name("Ani").unwrap();

            db.reset().unwrap();
            let stats = db.get_stats().unwrap();
            assert_eq!(stats.attempts, 0);
            assert!(!stats.certificate_unlocked);
            assert_eq!(db.learner_name().unwrap().as_deref(), Some("Ani"));
        }
    }
}
