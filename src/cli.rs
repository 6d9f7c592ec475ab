use anyhow::{Context, bail};
use chrono::Utc;
use clap::{Parser, Subcommand};
use rusqlite::Connection;

use crate::api::{self, AppState, SignupRequest};
use crate::config::Config;
use crate::db;
use crate::display;
use crate::models::Profile;

/// Hunter Quest - clear daily quests, earn XP, climb the hunter ranks
#[derive(Parser, Debug)]
#[command(name = "hunter-quest")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub config: Config,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Host to bind to
        #[arg(short = 'H', long, env = "HUNTER_QUEST_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, env = "HUNTER_QUEST_PORT", default_value_t = 8080)]
        port: u16,
    },

    /// Create the database and tables
    Init,

    /// Register a hunter and print their API token
    Signup {
        username: String,

        #[arg(long)]
        display_name: Option<String>,
    },

    /// Show a hunter's level, rank and XP bar
    Profile { username: String },

    /// Show the top hunters
    Leaderboard {
        #[arg(short, long, default_value_t = 10)]
        limit: u32,
    },

    /// Grant admin rights
    Promote { username: String },
}

pub async fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config;
    config.validate()?;
    let path = config.database_path();
    let conn = db::open_db(&path).with_context(|| format!("opening {}", path.display()))?;
    tracing::debug!(db = %path.display(), "database ready");

    match cli.command {
        Commands::Serve { host, port } => {
            let state = AppState::new(conn, &config)?;
            api::run_server(&format!("{}:{}", host, port), state).await?;
        }
        Commands::Init => {
            println!("Database initialised at {}", path.display());
        }
        Commands::Signup {
            username,
            display_name,
        } => {
            let (profile, token) = register(&conn, &username, display_name.as_deref())?;
            println!("Registered @{}", profile.username);
            println!("API token: {}", token);
        }
        Commands::Profile { username } => {
            let Some(profile) = db::get_profile_by_username(&conn, &username)? else {
                bail!("no hunter named '{}'", username);
            };
            println!("{}", display::render_profile(&config.progression()?, &profile)?);
        }
        Commands::Leaderboard { limit } => {
            let entries = db::leaderboard(&conn, limit.max(1))?;
            println!("{}", display::render_leaderboard(&entries));
        }
        Commands::Promote { username } => {
            if !db::set_admin(&conn, &username, true)? {
                bail!("no hunter named '{}'", username);
            }
            println!("@{} is now an admin", username);
        }
    }

    Ok(())
}

/// Create a profile and its api token with the same rules as `POST /api/signup`.
fn register(
    conn: &Connection,
    username: &str,
    display_name: Option<&str>,
) -> anyhow::Result<(Profile, String)> {
    let username = username.trim();
    SignupRequest {
        username: username.to_string(),
        display_name: None,
    }
    .validate()
    .map_err(anyhow::Error::msg)?;

    let display_name = display_name
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    let profile = Profile::new(username.to_string(), display_name, Utc::now());
    let token = api::generate_token();
    if let Err(e) = db::insert_profile(conn, &profile, &token) {
        if db::is_constraint_violation(&e) {
            bail!("username '{}' is already taken", username);
        }
        return Err(e.into());
    }
    Ok((profile, token))
}
