use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod analytics;
mod auth;
mod fetcher;
mod grades;
mod history;
mod login;
mod models;
mod notes;
mod projection;
mod report;
mod session;
mod store;

use auth::{AuthProvider, LocalAuth};
use fetcher::{FetchError, HttpFetcher, DEFAULT_API_URL};
use login::{LoginError, LoginOutcome};
use models::StudentRecord;
use session::{Session, Theme};
use store::{FileStore, KeyValueStore, PgStore};

const DEFAULT_STORE_PATH: &str = ".noterep-store.json";

#[derive(Parser)]
#[command(name = "noterep")]
#[command(about = "Course records, required SEE marks and CGPA projections for MSRIT students", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the session table in Postgres (requires DATABASE_URL)
    InitDb,
    /// Fetch a student's records and start a session
    Login {
        #[arg(long)]
        usn: String,
        #[arg(long)]
        dob: String,
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Log in again with an account from the login history
    QuickLogin {
        #[arg(long)]
        usn: String,
    },
    /// Refetch the current student's records
    Reload {
        #[arg(long)]
        endpoint: Option<String>,
    },
    /// Forget the current session
    Logout,
    /// List recent logins
    History,
    /// Remove an account from the login history
    Forget {
        #[arg(long)]
        usn: String,
    },
    /// List the records API endpoints
    Endpoints,
    /// Switch to another endpoint and reload the current student
    UseEndpoint { name: String },
    /// Required SEE marks per course and grade
    Marks {
        /// Show SEE ranges per grade band instead of minimums
        #[arg(long)]
        ranges: bool,
        /// Also write the grid as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Predicted SGPA and the CGPA it leads to
    Predict,
    /// Past semesters and cumulative credits
    Academic,
    /// Write a markdown report for the current student
    Report {
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
    /// List course notes, optionally only those with a tag
    Notes {
        #[arg(long)]
        tag: Option<String>,
    },
    /// Show or set the theme preference
    Theme { theme: Option<Theme> },
    /// Sign in on this device
    SignIn {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Show the signed-in user
    Whoami,
    /// Sign out on this device
    SignOut,
}

struct Config {
    database_url: Option<String>,
    api_url: String,
    store_path: PathBuf,
}

impl Config {
    fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            api_url: std::env::var("NOTEREP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            store_path: std::env::var("NOTEREP_STORE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH)),
        }
    }
}

enum Backend {
    Postgres(PgStore),
    File(FileStore),
}

impl Backend {
    async fn open(config: &Config) -> anyhow::Result<Self> {
        match config.database_url.as_deref() {
            Some(url) => {
                let store = PgStore::connect(url)
                    .await
                    .context("failed to connect to Postgres")?;
                Ok(Backend::Postgres(store))
            }
            None => Ok(Backend::File(FileStore::new(&config.store_path))),
        }
    }

    fn store(&self) -> &dyn KeyValueStore {
        match self {
            Backend::Postgres(store) => store,
            Backend::File(store) => store,
        }
    }
}

async fn require_record(session: &Session<'_>) -> anyhow::Result<StudentRecord> {
    session
        .load()
        .await?
        .and_then(|saved| saved.record)
        .context("Please login first")
}

fn announce(outcome: &LoginOutcome) {
    println!("Welcome, {}!", outcome.record.name);
    println!(
        "{} ({}) from endpoint {}",
        outcome.record.semester, outcome.record.usn, outcome.endpoint
    );
    if outcome.history.len() > 1 {
        println!("{} accounts available for quick login.", outcome.history.len());
    }
}

fn explain(err: LoginError) -> anyhow::Error {
    if matches!(err, LoginError::Fetch(FetchError::EndpointInactive)) {
        warn!("try switching to a different semester endpoint with `noterep use-endpoint`");
    }
    err.into()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let backend = Backend::open(&config).await?;
    let store = backend.store();
    let session = Session::new(store);
    let fetcher = HttpFetcher::new(&config.api_url)?;

    match cli.command {
        Commands::InitDb => {
            let Backend::Postgres(pg) = &backend else {
                anyhow::bail!("DATABASE_URL must be set to a production Postgres instance");
            };
            pg.init_db().await?;
            println!("Schema ready.");
        }
        Commands::Login { usn, dob, endpoint } => {
            let outcome = login::login(&fetcher, &session, &usn, &dob, endpoint.as_deref())
                .await
                .map_err(explain)?;
            announce(&outcome);
        }
        Commands::QuickLogin { usn } => {
            let outcome = login::quick_login(&fetcher, &session, &usn)
                .await
                .map_err(explain)?;
            announce(&outcome);
        }
        Commands::Reload { endpoint } => {
            let outcome = login::reload(&fetcher, &session, endpoint.as_deref())
                .await
                .map_err(explain)?;
            announce(&outcome);
        }
        Commands::Logout => {
            session.clear().await?;
            println!("Logged out.");
        }
        Commands::History => {
            let history = session.login_history().await?;
            if history.is_empty() {
                println!("No recent logins.");
                return Ok(());
            }
            println!("Quick Login:");
            for entry in history.iter() {
                println!(
                    "- {} ({}) last login {} on {}",
                    entry.name,
                    entry.usn,
                    entry.last_used.date_naive(),
                    entry
                        .endpoint_title
                        .as_deref()
                        .or(entry.endpoint.as_deref())
                        .unwrap_or("unknown endpoint")
                );
            }
        }
        Commands::Forget { usn } => {
            let remaining = session.remove_from_history(&usn).await?;
            println!("{} accounts remembered.", remaining.len());
        }
        Commands::Endpoints => {
            let catalog = login::endpoint_catalog(&fetcher, &session).await?;
            for endpoint in catalog.active_endpoints.iter() {
                let marker = if catalog.current.as_deref() == Some(endpoint.name.as_str()) {
                    "*"
                } else {
                    " "
                };
                println!("{marker} {} - {}", endpoint.name, endpoint.title);
            }
        }
        Commands::UseEndpoint { name } => match login::reload(&fetcher, &session, Some(name.as_str())).await {
            Ok(outcome) => announce(&outcome),
            Err(LoginError::NotLoggedIn) => {
                anyhow::bail!("Please login first before switching endpoints");
            }
            Err(err) => return Err(explain(err)),
        },
        Commands::Marks { ranges, csv } => {
            let record = require_record(&session).await?;
            if ranges {
                print!("{}", report::render_ranges(&record));
            } else {
                print!("{}", report::render_marks_table(&record));
            }
            if let Some(path) = csv {
                let file = std::fs::File::create(&path)
                    .with_context(|| format!("failed to create {}", path.display()))?;
                report::write_marks_csv(&record, file)?;
                info!(path = %path.display(), "required marks exported");
            }
        }
        Commands::Predict => {
            let record = require_record(&session).await?;
            print!("{}", report::render_predictions(&record));
        }
        Commands::Academic => {
            let record = require_record(&session).await?;
            print!("{}", report::render_academic_history(&record));
        }
        Commands::Report { out } => {
            let record = require_record(&session).await?;
            let endpoint = session.current_endpoint().await?;
            let report = report::build_report(
                &record,
                endpoint.as_deref(),
                chrono::Utc::now().date_naive(),
            );
            std::fs::write(&out, report)?;
            println!("Report written to {}.", out.display());
        }
        Commands::Notes { tag } => {
            let matches = notes::filter_by_tag(&notes::CSE_AIML_NOTES, tag.as_deref());
            if matches.is_empty() {
                info!(tags = ?notes::tags(&notes::CSE_AIML_NOTES), "no notes carry that tag");
            }
            print!("{}", notes::render_notes(&matches));
        }
        Commands::Theme { theme } => {
            if let Some(theme) = theme {
                session.set_theme(theme).await?;
            }
            println!("Theme: {}", session.theme().await?);
        }
        Commands::SignIn { name, email } => {
            let auth = LocalAuth::new(Session::new(store));
            let user = auth.sign_in(&name, email.as_deref()).await?;
            println!("Signed in as {} ({}).", user.display_name, user.tracking_username);
        }
        Commands::Whoami => {
            let auth = LocalAuth::new(Session::new(store));
            match auth.current_user().await? {
                Some(user) => println!("{} <{}> on device {}", user.display_name, user.email, user.id),
                None => println!("Not signed in."),
            }
        }
        Commands::SignOut => {
            let auth = LocalAuth::new(Session::new(store));
            auth.sign_out().await?;
            println!("Signed out.");
        }
    }

    Ok(())
}
