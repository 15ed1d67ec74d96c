mod assignment;
mod directory;
mod display;
mod error;
mod form;
mod inference;
mod notes;
mod storage;
mod web;

use clap::{Parser, Subcommand};
use env_logger::Env;
use log::info;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use assignment::Session;
use directory::{CsvDirectory, DirectorySource, PersonnelDirectory};
use display::{format_person, print_report, summary};
use error::AppError;
use form::{quick_fill, FormDocument};
use storage::{spawn_writer, JsonFileStorage, Storage};

/// Assigns on-duty personnel to crew roles and fills the combat-group form.
#[derive(Parser)]
#[command(name = "combat-roster", version)]
struct Cli {
    /// JSON file holding the saved assignment
    #[arg(long, env = "COMBAT_ROSTER_STATE", default_value = "combat_roster_state.json")]
    state: PathBuf,

    /// Roster CSV exported from the duty schedule
    #[arg(long, env = "COMBAT_ROSTER_DIRECTORY", default_value = "data/roster.csv")]
    roster: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the assignment editor API
    Serve {
        #[arg(long, env = "COMBAT_ROSTER_PORT", default_value_t = 8080)]
        port: u16,

        /// Front-end files served under /static
        #[arg(long, env = "COMBAT_ROSTER_STATIC")]
        static_dir: Option<PathBuf>,
    },
    /// Fill a form description with the saved assignment
    Fill {
        /// Form description (JSON)
        form: PathBuf,

        /// Where to write the filled form; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the saved assignment
    Summary,
    /// Re-read the roster and clear every assignment
    Reload {
        /// Confirm that the current assignment may be discarded
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));
    let cli = Cli::parse();
    let storage: Arc<dyn Storage> = Arc::new(JsonFileStorage::new(&cli.state));

    match cli.command {
        Command::Serve { port, static_dir } => {
            let source: Arc<dyn DirectorySource> = Arc::new(CsvDirectory::new(&cli.roster));
            let mut session = Session::open(source.as_ref(), storage.as_ref()).await?;
            let (listener, save_status, _writer) = spawn_writer(storage.clone());
            session.subscribe(Box::new(listener));

            println!("Starting web server on port {}...", port);
            let state = web::AppState {
                session: Mutex::new(session),
                save_status,
                directory_source: source,
            };
            web::start_server(port, state, static_dir).await?;
        }
        Command::Fill { form, out } => {
            // The roster is not needed to project an existing assignment.
            let saved = storage.get_assignment_state().await?;
            let session = Session::restore(PersonnelDirectory::default(), saved);
            if session.store().is_empty() {
                println!("請先編排人員！");
                return Ok(());
            }

            let text = tokio::fs::read_to_string(&form).await?;
            let mut document: FormDocument = serde_json::from_str(&text)?;
            let report = quick_fill(&mut document, session.store().assignments(), session.notes());

            let filled = serde_json::to_string_pretty(&document)?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, filled).await?;
                    info!("Filled form written to {}", path.display());
                }
                None => println!("{}", filled),
            }
            print_report(&report);
        }
        Command::Summary => {
            let saved = storage.get_assignment_state().await?;
            let directory = match CsvDirectory::new(&cli.roster).load().await {
                Ok(directory) => directory,
                Err(e) => {
                    info!("Roster unavailable ({}); listing assignments only", e);
                    PersonnelDirectory::default()
                }
            };
            let session = Session::restore(directory, saved);

            println!("{}", summary(session.model(), session.store()));
            if !session.notes().is_empty() {
                println!("\n備註:\n{}", session.notes());
            }
            let available = session.available();
            if !available.is_empty() {
                println!("\n未編排人員 ({}):", available.len());
                for person in &available {
                    println!("  - {}", format_person(person));
                }
            }
        }
        Command::Reload { yes } => {
            let directory = CsvDirectory::new(&cli.roster).load().await?;
            let saved = storage.get_assignment_state().await?;
            let mut session = Session::restore(PersonnelDirectory::default(), saved);
            let (listener, _status, writer) = spawn_writer(storage.clone());
            session.subscribe(Box::new(listener));

            if let Err(e) = session.reload(directory, yes) {
                println!("{} (pass --yes)", e);
                return Ok(());
            }
            println!(
                "讀取完成！上班人員 {} 名，作戰編組已清空。",
                session.directory().roster().len()
            );
            // Dropping the session closes the save queue; wait for the last write.
            drop(session);
            if let Err(e) = writer.await {
                log::warn!("Persistence writer did not finish: {}", e);
            }
        }
    }

    Ok(())
}
