use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use clap::Args;
use std::path::PathBuf;

use crate::db;
use crate::xp::{FEEDBACK_XP, Progression, XP_PER_LEVEL, XpError};

/// runtime settings, from flags or HUNTER_QUEST_* env vars
#[derive(Args, Debug, Clone)]
pub struct Config {
    /// SQLite database file (defaults to the platform data dir)
    #[arg(short = 'D', long, global = true, env = "HUNTER_QUEST_DB")]
    pub database: Option<PathBuf>,

    /// Reference timezone as minutes east of UTC, used to decide "today"
    #[arg(
        long,
        global = true,
        env = "HUNTER_QUEST_UTC_OFFSET_MINUTES",
        default_value_t = 0,
        allow_hyphen_values = true
    )]
    pub utc_offset_minutes: i32,

    /// XP constant K in level = floor(sqrt(xp / K)) + 1
    #[arg(long, global = true, env = "HUNTER_QUEST_XP_PER_LEVEL", default_value_t = XP_PER_LEVEL)]
    pub xp_per_level: u64,

    /// XP awarded for submitting feedback
    #[arg(long, global = true, env = "HUNTER_QUEST_FEEDBACK_XP", default_value_t = FEEDBACK_XP)]
    pub feedback_xp: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            utc_offset_minutes: 0,
            xp_per_level: XP_PER_LEVEL,
            feedback_xp: FEEDBACK_XP,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("utc offset of {0} minutes is out of range")]
    InvalidOffset(i32),
    #[error("feedback xp must be non-negative, got {0}")]
    InvalidFeedbackXp(i64),
    #[error(transparent)]
    Progression(#[from] XpError),
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(db::default_db_path)
    }

    pub fn progression(&self) -> Result<Progression, ConfigError> {
        Ok(Progression::new(self.xp_per_level)?)
    }

    pub fn reference_offset(&self) -> Result<FixedOffset, ConfigError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::InvalidOffset(self.utc_offset_minutes))
    }

    /// fail fast on anything the server could not run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.progression()?;
        self.reference_offset()?;
        if self.feedback_xp < 0 {
            return Err(ConfigError::InvalidFeedbackXp(self.feedback_xp));
        }
        Ok(())
    }
}

/// calendar day of `now` in the reference timezone
pub fn local_day(now: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    now.with_timezone(&offset).date_naive()
}
