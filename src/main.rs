mod bank;
mod certificate;
mod config;
mod db;
mod error;
mod models;
mod runner;
mod select;
mod session;
mod timer;
mod tui;
mod tutor;

use std::io::{self, Write};

use chrono::Utc;
use clap::{Parser, Subcommand};

use config::AppConfig;
use db::Database;
use models::{Difficulty, JsonOutput};
use session::QuizSession;

#[derive(Parser)]
#[command(name = "netquiz")]
#[command(about = "Timed quizzes for an introductory computer networking course")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the progress database
    Init,

    /// Take a quiz in the terminal
    Quiz {
        /// Only ask questions from this category
        #[arg(long, short)]
        category: Option<String>,

        /// easy, medium or hard
        #[arg(long, short)]
        difficulty: Option<String>,

        /// Number of questions (0 = all)
        #[arg(long, short = 'n')]
        count: Option<usize>,

        /// Time limit in seconds
        #[arg(long, short)]
        time_limit: Option<u32>,

        /// Keep bank order for questions and options
        #[arg(long)]
        no_shuffle: bool,

        /// Disallow going back to earlier questions
        #[arg(long)]
        forward_only: bool,

        /// Question bank file or URL (overrides config)
        #[arg(long, short)]
        bank: Option<String>,
    },

    /// Inspect question banks
    #[command(subcommand)]
    Bank(BankCommands),

    /// Show past quiz results
    Results {
        /// Filter by category
        #[arg(long, short)]
        category: Option<String>,

        /// Maximum rows (0 = all)
        #[arg(long, short, default_value_t = 20)]
        limit: usize,

        /// Show the answers of one result
        #[arg(long)]
        id: Option<i64>,
    },

    /// Show progress statistics
    Stats,

    /// Set the learner name printed on certificates
    Name {
        name: String,
    },

    /// Print the best certificate earned
    Certificate,

    /// Ask the networking tutor a question
    Ask {
        /// The question for the tutor
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Delete all results and certificates
    Reset {
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },

    /// Launch interactive terminal UI
    Tui,
}

#[derive(Subcommand)]
enum BankCommands {
    /// List questions in the bank
    List {
        /// Filter by category
        #[arg(long, short)]
        category: Option<String>,

        /// Question bank file or URL (overrides config)
        #[arg(long, short)]
        bank: Option<String>,
    },

    /// List categories with question counts
    Categories {
        /// Question bank file or URL (overrides config)
        #[arg(long, short)]
        bank: Option<String>,
    },

    /// Load a bank file or URL and report what would be used
    Check {
        source: String,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    let db_path = config.db_path();
    let db = Database::open_or_memory(&db_path)?;

    match cli.command {
        Commands::Init => {
            db.init()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Database initialized at: {}", db_path.display());
            }
        }

        Commands::Quiz {
            category,
            difficulty,
            count,
            time_limit,
            no_shuffle,
            forward_only,
            bank,
        } => {
            let difficulty = difficulty
                .map(|d| {
                    Difficulty::from_str(&d).ok_or_else(|| {
                        format!("Invalid difficulty '{}'. Use: easy, medium, or hard", d)
                    })
                })
                .transpose()?;

            let mut session_config = config.quiz.session_config(category, difficulty);
            if let Some(count) = count {
                session_config.count = count;
            }
            if time_limit.is_some() {
                session_config.time_limit = time_limit.filter(|t| *t > 0);
            }
            if no_shuffle {
                session_config.shuffle_questions = false;
                session_config.shuffle_options = false;
            }
            if forward_only {
                session_config.allow_back = false;
            }

            let source = bank.or_else(|| config.bank.clone());
            let pool = bank::load_or_builtin(source.as_deref());
            let mut session = QuizSession::from_pool_or(
                session_config,
                &pool.questions,
                || bank::builtin().questions,
                &mut rand::thread_rng(),
            )?;

            let started_at = Utc::now();
            let stdin = io::stdin();
            let result = if cli.json {
                runner::run(&mut session, stdin.lock(), &mut io::stderr())?
            } else {
                runner::run(&mut session, stdin.lock(), &mut io::stdout())?
            };

            let saved = certificate::record_attempt(&db, &config, &result, started_at)?;
            if cli.json {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                        "result_id": saved.result_id,
                        "certificate_id": saved.certificate_id,
                        "result": result
                    })))?
                );
            } else {
                println!();
                println!("Saved as result #{}.", saved.result_id);
                if saved.certificate_id.is_some() {
                    println!("Certificate unlocked! View it with: netquiz certificate");
                }
            }
        }

        Commands::Bank(bank_cmd) => match bank_cmd {
            BankCommands::List { category, bank } => {
                let source = bank.or_else(|| config.bank.clone());
                let pool = bank::load_or_builtin(source.as_deref());
                let questions: Vec<_> = pool
                    .questions
                    .iter()
                    .filter(|q| match &category {
                        Some(c) => q
                            .category
                            .as_deref()
                            .is_some_and(|qc| qc.eq_ignore_ascii_case(c)),
                        None => true,
                    })
                    .collect();

                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&questions))?);
                } else if questions.is_empty() {
                    println!("No questions found.");
                } else {
                    println!("{:<16} {:<14} {:<7} {:>4} PROMPT", "ID", "TYPE", "LEVEL", "PTS");
                    println!("{}", "-".repeat(90));
                    for q in questions {
                        println!(
                            "{:<16} {:<14} {:<7} {:>4} {}",
                            truncate(&q.id, 16),
                            q.kind().as_str(),
                            q.difficulty.as_str(),
                            q.points,
                            truncate(&q.prompt, 44)
                        );
                    }
                }
            }

            BankCommands::Categories { bank } => {
                let source = bank.or_else(|| config.bank.clone());
                let categories = bank::load_or_builtin(source.as_deref()).categories();
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&categories))?);
                } else if categories.is_empty() {
                    println!("No categories found.");
                } else {
                    println!("{:<30} {:>9} {:>7}", "CATEGORY", "QUESTIONS", "POINTS");
                    println!("{}", "-".repeat(48));
                    for c in categories {
                        println!("{:<30} {:>9} {:>7}", truncate(&c.name, 30), c.questions, c.points);
                    }
                }
            }

            BankCommands::Check { source } => match bank::load(&source) {
                Ok(pool) => {
                    let categories = pool.categories();
                    if cli.json {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                "version": pool.version,
                                "questions": pool.len(),
                                "categories": categories
                            })))?
                        );
                    } else {
                        println!(
                            "{}: {} usable questions (version {})",
                            source,
                            pool.len(),
                            pool.version.as_deref().unwrap_or("-")
                        );
                        for c in categories {
                            println!("  {:<28} {}", c.name, c.questions);
                        }
                    }
                }
                Err(e) if cli.json => {
                    println!("{}", serde_json::to_string(&JsonOutput::<()>::err(e.to_string()))?);
                }
                Err(e) => return Err(e.into()),
            },
        },

        Commands::Results {
            category,
            limit,
            id,
        } => {
            if let Some(id) = id {
                match db.get_result(id)? {
                    Some(record) => {
                        let answers = db.get_result_answers(id)?;
                        if cli.json {
                            println!(
                                "{}",
                                serde_json::to_string(&JsonOutput::ok(serde_json::json!({
                                    "result": record,
                                    "answers": answers
                                })))?
                            );
                        } else {
                            println!(
                                "Result #{}: {}% ({}/{} correct, {})",
                                record.id,
                                record.score,
                                record.correct,
                                record.question_count,
                                record.reason.label()
                            );
                            println!(
                                "Finished: {}  Time taken: {}",
                                record.finished_at,
                                record.elapsed_clock()
                            );
                            println!();
                            for a in answers {
                                let mark = if a.is_correct { "+" } else { "x" };
                                println!("[{}] {}", mark, a.prompt);
                                println!(
                                    "    given: {}  correct: {}",
                                    a.given.as_deref().unwrap_or("-"),
                                    a.correct_answer
                                );
                            }
                        }
                    }
                    None if cli.json => {
                        println!(
                            "{}",
                            serde_json::to_string(&JsonOutput::<()>::err("Result not found"))?
                        );
                    }
                    None => println!("Result not found."),
                }
            } else {
                let results = db.list_results(category.as_deref(), limit)?;
                if cli.json {
                    println!("{}", serde_json::to_string(&JsonOutput::ok(&results))?);
                } else if results.is_empty() {
                    println!("No results yet. Take a quiz with: netquiz quiz");
                } else {
                    println!(
                        "{:<5} {:<20} {:<18} {:>6} {:>7}  STATUS",
                        "ID", "FINISHED", "CATEGORY", "SCORE", "CORRECT"
                    );
                    println!("{}", "-".repeat(72));
                    for r in results {
                        println!(
                            "{:<5} {:<20} {:<18} {:>5}% {:>3}/{:<3}  {}",
                            r.id,
                            format_timestamp(&r.finished_at),
                            truncate(r.category.as_deref().unwrap_or("all"), 18),
                            r.score,
                            r.correct,
                            r.question_count,
                            if r.passed { "passed" } else { "-" }
                        );
                    }
                }
            }
        }

        Commands::Stats => {
            let stats = db.get_stats()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&stats))?);
            } else {
                println!("=== Quiz Statistics ===");
                println!("Attempts: {}", stats.attempts);
                println!("Passed: {}", stats.passed);
                println!("Best score: {}%", stats.best_score);
                println!("Average score: {:.1}%", stats.avg_score);
                println!("Questions answered: {}", stats.questions_answered);
                println!(
                    "Certificate: {}",
                    if stats.certificate_unlocked {
                        "unlocked"
                    } else {
                        "locked"
                    }
                );
            }
        }

        Commands::Name { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err("Name cannot be empty".into());
            }
            db.set_learner_name(name)?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("Learner name set to '{}'.", name);
            }
        }

        Commands::Certificate => match db.get_certificate()? {
            Some(cert) if cli.json => {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&cert))?);
            }
            Some(cert) => println!("{}", certificate::render(&cert)),
            None if cli.json => {
                println!(
                    "{}",
                    serde_json::to_string(&JsonOutput::<()>::err("No certificate unlocked"))?
                );
            }
            None => println!("No certificate yet. Pass a quiz to unlock one."),
        },

        Commands::Ask { message } => {
            let tutor = tutor::HttpTutor::from_config(&config.tutor)?;
            let mut conversation = tutor::Conversation::new();
            let reply = conversation.send(&tutor, &message.join(" "))?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::ok(&reply))?);
            } else {
                println!("{}", reply);
            }
        }

        Commands::Reset { yes } => {
            if !yes && !confirm("Delete all quiz results and certificates?")? {
                println!("Cancelled.");
                return Ok(());
            }
            db.reset()?;
            if cli.json {
                println!("{}", serde_json::to_string(&JsonOutput::<()>::ok(()))?);
            } else {
                println!("All results and certificates deleted.");
            }
        }

        Commands::Tui => {
            tui::run(db, config)?;
        }
    }

    Ok(())
}

fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn format_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
