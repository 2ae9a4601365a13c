use std::fmt;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use qcm_core::model::{ChoiceId, Correctness};
use qcm_core::session::{AdvanceOutcome, QuestionStatus, QuizPhase};
use qcm_core::{Clock, correct_ids};
use services::{CatalogService, QuizLoopService, QuizSession};
use storage::bank::{BankStore, BankSummary};
use storage::fs::FsBankStore;
use storage::progress::FileProgressStore;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
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
    data_dir: PathBuf,
    state_dir: PathBuf,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--data-dir <dir>] [--state-dir <dir>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --data-dir  ./data");
    eprintln!("  --state-dir ./state");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QCM_DATA_DIR, QCM_STATE_DIR");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut data_dir =
            std::env::var("QCM_DATA_DIR").map_or_else(|_| PathBuf::from("data"), PathBuf::from);
        let mut state_dir =
            std::env::var("QCM_STATE_DIR").map_or_else(|_| PathBuf::from("state"), PathBuf::from);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--data-dir" => data_dir = PathBuf::from(require_value(args, "--data-dir")?),
                "--state-dir" => state_dir = PathBuf::from(require_value(args, "--state-dir")?),
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            data_dir,
            state_dir,
        })
    }
}

// Prompts, reads one trimmed line; `None` on EOF.
fn read_line(prompt: &str) -> io::Result<Option<String>> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn print_bank_list(banks: &[BankSummary]) {
    if banks.is_empty() {
        println!("Aucun fichier de questions trouvé.");
        return;
    }
    for bank in banks {
        println!(
            "  {}  [{}] {} — {} questions",
            bank.id, bank.category, bank.description, bank.question_count
        );
    }
}

fn print_catalog_help() {
    println!("Commandes:");
    println!("  liste                 tous les fichiers de questions");
    println!("  annees                années disponibles");
    println!("  annee <a>             fichiers contenant des questions de l'année <a>");
    println!("  chercher <termes>     recherche par pertinence");
    println!("  ouvrir <id>           démarrer un quiz (l'id peut contenir des espaces)");
    println!("  ouvrir \"<id>\" [annee] idem, restreint à une année");
    println!("  quitter");
}

fn print_quiz_help() {
    println!("Commandes:");
    println!("  a..e                  cocher / décocher une réponse");
    println!("  verifier              vérifier la réponse");
    println!("  valider               marquer l'erreur comme comprise");
    println!("  marquer               marquer la question à revoir");
    println!("  suivant / precedent   naviguer");
    println!("  aller <n>             sauter à la question n");
    println!("  terminer              passer en mode révision");
    println!("  resultats             afficher le score");
    println!("  recommencer           recommencer (acquis conservés)");
    println!("  oublier               effacer les acquis");
    println!("  retour                revenir à la liste des fichiers");
}

fn print_question(session: &QuizSession) {
    let Some(question) = session.current_question() else {
        println!("Aucune question.");
        return;
    };
    let state = session.state();
    let index = state.current_index();
    let progress = state.progress();

    let mut tags = Vec::new();
    if let Some(year) = question.year_asked() {
        tags.push(year.to_string());
    }
    if let Some(subtopic) = question.subtopic() {
        tags.push(subtopic.to_string());
    }
    let status = match state.question_status(index) {
        QuestionStatus::Answered => "répondu",
        QuestionStatus::Marked => "à revoir",
        QuestionStatus::Unanswered => "sans réponse",
    };

    println!();
    println!(
        "Question {}/{} ({status}, {} répondues){}",
        index + 1,
        progress.total,
        progress.answered,
        if tags.is_empty() {
            String::new()
        } else {
            format!(" [{}]", tags.join(", "))
        }
    );
    println!("{}", question.prompt().unwrap_or("(énoncé manquant)"));

    let answer = session.current_answer();
    for choice in session.current_choices() {
        let mark = if answer.contains(choice.id) { "x" } else { " " };
        println!("  [{mark}] {}. {}", choice.id.letter(), choice.text);
    }
}

fn print_verdict(session: &QuizSession, correct: bool) {
    if correct {
        println!("Bonne réponse !");
    } else {
        println!("Mauvaise réponse.");
    }

    let Some(question) = session.current_question() else {
        return;
    };
    let expected = correct_ids(question);
    for choice in session.current_choices() {
        let flag = match choice.correctness {
            Correctness::Correct => "vrai",
            Correctness::Incorrect => "faux",
            Correctness::Unspecified => "non précisé",
        };
        let marker = if expected.contains(&choice.id) { "*" } else { " " };
        if choice.explanation.trim().is_empty() {
            println!("  {marker}{}. ({flag})", choice.id.letter());
        } else {
            println!(
                "  {marker}{}. ({flag}) {}",
                choice.id.letter(),
                choice.explanation
            );
        }
    }
    if let Some(overall) = question.overall_explanation() {
        println!("Explication : {overall}");
    }
}

fn print_results(session: &QuizSession) {
    let results = session.results();
    if results.is_empty() {
        println!("Aucune réponse enregistrée.");
        return;
    }
    println!(
        "Score : {}/{} ({} %)",
        results.correct_answers, results.total_questions, results.score
    );
    for record in &results.per_question {
        let selected: Vec<String> = record
            .selected
            .iter()
            .map(|id| id.letter().to_string())
            .collect();
        println!(
            "  Q{} : {} — {}",
            record.question_index + 1,
            if selected.is_empty() {
                "(aucune)".to_string()
            } else {
                selected.join(", ")
            },
            if record.verdict { "correct" } else { "incorrect" }
        );
    }
}

async fn run_quiz(service: &QuizLoopService, mut session: QuizSession) -> io::Result<()> {
    println!(
        "Fichier « {} » : {} questions, {} acquises.",
        session.bank_id(),
        session.questions().len(),
        session.state().mastered().len()
    );
    print_question(&session);

    loop {
        let prompt = match session.state().phase() {
            QuizPhase::Practicing => "quiz> ",
            QuizPhase::Reviewing => "revision> ",
        };
        let Some(line) = read_line(prompt)? else {
            return Ok(());
        };
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or("");

        match command {
            "" => {}
            "a" | "b" | "c" | "d" | "e" => {
                if let Ok(id) = command.parse::<ChoiceId>() {
                    let selected = !session.current_answer().contains(id);
                    session.toggle_choice(id, selected);
                    print_question(&session);
                }
            }
            "verifier" => match service.verify_current(&mut session).await {
                Ok(Some(correct)) => print_verdict(&session, correct),
                Ok(None) => println!("Cochez au moins une réponse avant de vérifier."),
                Err(err) => println!("{}", err.user_message()),
            },
            "valider" => {
                session.validate_incorrect(session.state().current_index());
                println!("Erreur validée.");
            }
            "marquer" => {
                session.toggle_review_flag(session.state().current_index());
                print_question(&session);
            }
            "suivant" => match session.advance() {
                AdvanceOutcome::Advanced => print_question(&session),
                AdvanceOutcome::NeedsVerification => {
                    println!("Vérifiez votre réponse avant de continuer.");
                }
                AdvanceOutcome::Completed => {
                    println!("Quiz terminé.");
                    print_results(&session);
                }
            },
            "precedent" => {
                if session.retreat() {
                    print_question(&session);
                } else {
                    println!("Vous êtes à la première question.");
                }
            }
            "aller" => match words.next().and_then(|n| n.parse::<usize>().ok()) {
                Some(n) if n >= 1 && session.jump_to(n - 1) => print_question(&session),
                _ => println!("Numéro de question invalide."),
            },
            "terminer" => {
                session.finish();
                println!("Quiz terminé.");
                print_results(&session);
            }
            "resultats" => print_results(&session),
            "recommencer" => {
                session.restart();
                println!("Quiz recommencé, acquis conservés.");
                print_question(&session);
            }
            "oublier" => match service.clear_mastery(&mut session).await {
                Ok(()) => println!("Acquis effacés."),
                Err(err) => println!("{}", err.user_message()),
            },
            "aide" => print_quiz_help(),
            "retour" => return Ok(()),
            "quitter" => std::process::exit(0),
            other => println!("Commande inconnue : {other} (« aide » pour la liste)"),
        }
    }
}

/// Splits the argument of `ouvrir` into a bank id and an optional year label.
///
/// Bank ids routinely contain spaces ("Cardiologie (Février 2025)"), so the
/// whole remainder is the id by default. Quoting the id frees the tail for a
/// year label, itself possibly multi-word: `ouvrir "Cardio (2025)" Juin 2024`.
fn parse_open_args(rest: &str) -> Option<(&str, Option<&str>)> {
    let rest = rest.trim();
    if rest.is_empty() {
        return None;
    }
    if let Some(quoted) = rest.strip_prefix('"') {
        let (id, tail) = quoted.split_once('"')?;
        let year = tail.trim();
        return Some((id, (!year.is_empty()).then_some(year)));
    }
    Some((rest, None))
}

async fn run_catalog(catalog: &CatalogService, quiz: &QuizLoopService) -> io::Result<()> {
    println!("Entraînement QCM — « aide » pour la liste des commandes.");

    loop {
        let Some(line) = read_line("qcm> ")? else {
            return Ok(());
        };
        // The remainder keeps its spaces: ids and year labels contain them.
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line.as_str(), ""),
        };

        match command {
            "" => {}
            "liste" => match catalog.list_banks().await {
                Ok(banks) => print_bank_list(&banks),
                Err(err) => println!("{}", err.user_message()),
            },
            "annees" => match catalog.list_years().await {
                Ok(years) if years.is_empty() => println!("Aucune année disponible."),
                Ok(years) => println!("  {}", years.join(", ")),
                Err(err) => println!("{}", err.user_message()),
            },
            "annee" => {
                if rest.is_empty() {
                    println!("Usage : annee <a>");
                    continue;
                }
                match catalog.list_banks_by_year(rest).await {
                    Ok(banks) => print_bank_list(&banks),
                    Err(err) => println!("{}", err.user_message()),
                }
            }
            "chercher" => {
                if rest.is_empty() {
                    println!("Usage : chercher <termes>");
                    continue;
                }
                match catalog.search(rest).await {
                    Ok(hits) if hits.is_empty() => println!("Aucun résultat."),
                    Ok(hits) => {
                        for hit in hits {
                            println!("  {}  (pertinence {})", hit.summary.id, hit.match_score);
                        }
                    }
                    Err(err) => println!("{}", err.user_message()),
                }
            }
            "ouvrir" => {
                let Some((raw_id, year)) = parse_open_args(rest) else {
                    println!("Usage : ouvrir <id>  ou  ouvrir \"<id>\" [annee]");
                    continue;
                };
                match quiz.start_quiz_named(raw_id, year).await {
                    Ok(session) => run_quiz(quiz, session).await?,
                    Err(err) => println!("{}", err.user_message()),
                }
            }
            "aide" => print_catalog_help(),
            "quitter" => return Ok(()),
            other => println!("Commande inconnue : {other} (« aide » pour la liste)"),
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    log::info!(
        "data dir {}, state dir {}",
        args.data_dir.display(),
        args.state_dir.display()
    );

    let banks: Arc<dyn BankStore> = Arc::new(FsBankStore::new(&args.data_dir));
    let progress = Arc::new(FileProgressStore::new(&args.state_dir));
    let clock = Clock::default_clock();

    let catalog = CatalogService::new(Arc::clone(&banks));
    let quiz = QuizLoopService::new(clock, banks, progress);

    run_catalog(&catalog, &quiz).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
