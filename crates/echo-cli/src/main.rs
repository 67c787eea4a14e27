//! Echo CLI - a command-line client for the Echo social feed.
//!
//! Sign in, inspect and edit your profile, and upload an avatar against an
//! Echo backend. The session is kept between runs in the configured store.

mod commands;

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use echo_core::{ApiClient, Config, Navigator, LOGIN_ROUTE};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Log file prefix inside the log directory (rotated daily)
const LOG_FILE_PREFIX: &str = "echo.log";

#[derive(Debug, Parser)]
#[command(name = "echo", version, about = "Command-line client for the Echo social feed")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a new account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "")]
        bio: String,
    },
    /// Sign in and store the session
    Login {
        /// Defaults to the last username that signed in
        #[arg(long)]
        username: Option<String>,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show whether a session is stored
    Status,
    /// Fetch and show your profile
    Me {
        /// Print the raw user record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change nickname, bio or password
    UpdateProfile {
        #[arg(long)]
        nickname: Option<String>,
        #[arg(long)]
        bio: Option<String>,
        /// Prompt for a new password
        #[arg(long)]
        change_password: bool,
    },
    /// Upload a png, jpg or gif (max 2MB) as your avatar
    UploadAvatar { path: PathBuf },
}

/// Stands in for the browser's redirect to the login page.
///
/// Serves both logout and the login guard, so the hint only states that no
/// session is stored.
struct CliNavigator;

fn redirect_hint(route: &str) -> String {
    if route == LOGIN_ROUTE {
        "Not signed in. Run `echo login` to sign in.".to_string()
    } else {
        format!("Continue at {}", route)
    }
}

impl Navigator for CliNavigator {
    fn redirect(&self, route: &str) {
        info!(route, "Redirect");
        println!("{}", redirect_hint(route));
    }
}

/// Initialize the tracing subscriber, writing to a daily log file.
///
/// Use RUST_LOG to control the level (e.g. RUST_LOG=echo_core=debug).
/// Falls back to stderr when the log directory cannot be created.
fn init_tracing(config: &Config) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let log_dir = config
        .cache_dir()
        .ok()
        .map(|dir| dir.join("logs"))
        .filter(|dir| std::fs::create_dir_all(dir).is_ok());

    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let mut config = Config::load()?;

    let _log_guard = init_tracing(&config);
    info!(api = %config.api_base_url, storage = ?config.storage, "Echo CLI starting");

    let client = ApiClient::from_config(&config)?.with_navigator(Arc::new(CliNavigator));

    match cli.command {
        Command::Register {
            username,
            email,
            bio,
        } => commands::register(&client, username, email, bio).await,
        Command::Login { username, password } => {
            commands::login(&client, &mut config, username, password).await
        }
        Command::Logout => {
            commands::logout(&client);
            Ok(())
        }
        Command::Status => commands::status(&client, &config),
        Command::Me { json } => commands::me(&client, &config, json).await,
        Command::UpdateProfile {
            nickname,
            bio,
            change_password,
        } => commands::update_profile(&client, nickname, bio, change_password).await,
        Command::UploadAvatar { path } => commands::upload_avatar(&client, &config, &path).await,
    }
}
