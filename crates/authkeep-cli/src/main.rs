//! authkeep - keep a signed-in token session on this machine.
//!
//! Signs in with a bearer token, shows who is signed in, and signs out.
//! The raw token is persisted through the configured storage backend so a
//! later invocation can restore the session.

mod display;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use authkeep_core::{decode, Config, SessionIdentity, SessionStore, StorageBackend, TokenStorage};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "authkeep")]
#[command(about = "Sign in with a bearer token and inspect the current session")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Token storage backend: local, secure or memory
    #[arg(short, long)]
    backend: Option<StorageBackend>,

    /// Write logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with a token (prompts if none is given)
    SignIn {
        /// Access token
        #[arg(short, long, env = "AUTHKEEP_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the signed-in user
    Whoami {
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },

    /// Sign out and forget the stored token
    SignOut,

    /// Print the stored access token
    Token,

    /// Decode a token's claims without signing in
    Decode {
        /// Token to decode
        token: String,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// The returned guard must be held until exit so buffered file logs are flushed.
fn init_tracing(log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or_else(|| Path::new("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| anyhow::anyhow!("Invalid log file path: {}", path.display()))?;
            let (writer, guard) =
                tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));

            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

fn print_identity(out: &mut impl Write, identity: &SessionIdentity, json: bool) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(identity)?)?;
    } else {
        writeln!(out, "{}", display::format_identity(identity, Utc::now()))?;
    }
    Ok(())
}

fn prompt_token() -> Result<String> {
    let token = rpassword::prompt_password("Token: ").context("Failed to read token")?;
    Ok(token.trim().to_string())
}

/// Execute one command against `session`, writing results to `out`.
fn run<S: TokenStorage>(
    command: Commands,
    session: &mut SessionStore<S>,
    out: &mut impl Write,
) -> Result<()> {
    match command {
        Commands::SignIn { token, json } => {
            let token = match token {
                Some(token) => token.trim().to_string(),
                None => prompt_token()?,
            };
            session
                .sign_in(token.as_str())
                .context("Sign-in failed")?;

            match session.current_session() {
                Some(identity) => print_identity(out, identity, json)?,
                None => writeln!(out, "No token given; nothing changed.")?,
            }
        }
        Commands::Whoami { json } => {
            session
                .restore()
                .context("Failed to restore session")?;

            match session.current_session() {
                Some(identity) => print_identity(out, identity, json)?,
                None => writeln!(out, "Not signed in.")?,
            }
        }
        Commands::SignOut => {
            session.sign_out();
            writeln!(out, "Signed out.")?;
        }
        Commands::Token => match session.read_token().context("Failed to read token")? {
            Some(token) => writeln!(out, "{}", token)?,
            None => writeln!(out, "No token stored.")?,
        },
        Commands::Decode { token } => {
            let claims = decode(token.trim()).context("Failed to decode token")?;
            writeln!(out, "{}", serde_json::to_string_pretty(&claims)?)?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.log_file.as_deref())?;

    let mut config = match cli.config {
        Some(ref path) => Config::load_from(path)?.with_env_overrides()?,
        None => Config::load()?,
    };
    if let Some(backend) = cli.backend {
        config.backend = Some(backend);
    }

    let storage = config.build_storage()?;
    info!(backend = storage.name(), "authkeep starting");
    let mut session = SessionStore::new(storage);

    run(cli.command, &mut session, &mut io::stdout().lock())
}

// ============================================================================
// Tests
// ============================================================================
