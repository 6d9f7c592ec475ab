//! Request/response bodies for the HTTP API.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    DauStat, Feedback, FeedbackType, LeaderboardEntry, Profile, Quest, QuestCategory,
    QuestDifficulty, RetentionStat, StreakIntensity, TotalStats,
};
use crate::xp::LevelProgress;

pub const DEFAULT_LEADERBOARD_LIMIT: u32 = 50;
pub const MAX_LEADERBOARD_LIMIT: u32 = 100;
pub const DEFAULT_STATS_DAYS: u32 = 7;
pub const MAX_STATS_DAYS: u32 = 90;
pub const RECENT_FEEDBACK_LIMIT: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SignupRequest {
    /// 3-32 chars of ascii letters, digits or underscore
    pub fn validate(&self) -> Result<(), String> {
        let name = self.username.trim();
        if !(3..=32).contains(&name.len()) {
            return Err("Username must be 3-32 characters".to_string());
        }
        if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err("Username may only contain letters, digits and underscores".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupResponse {
    pub profile: Profile,
    pub api_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub profile: Profile,
    pub progress: LevelProgress,
    pub xp_for_next_level: u64,
    pub rank_color: String,
    pub streak_intensity: StreakIntensity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestsResponse {
    pub quests: Vec<Quest>,
    #[serde(rename = "completedToday")]
    pub completed_today: Vec<Uuid>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateQuestRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<QuestCategory>,
    #[serde(default)]
    pub difficulty: Option<QuestDifficulty>,
    #[serde(default)]
    pub is_daily: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompleteQuestRequest {
    #[serde(default)]
    pub quest_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRequest {
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaderboardQuery {
    pub limit: Option<u32>,
}

impl LeaderboardQuery {
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_LEADERBOARD_LIMIT)
            .clamp(1, MAX_LEADERBOARD_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsQuery {
    pub days: Option<u32>,
}

impl StatsQuery {
    pub fn effective_days(&self) -> u32 {
        self.days.unwrap_or(DEFAULT_STATS_DAYS).clamp(1, MAX_STATS_DAYS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStatsResponse {
    pub totals: TotalStats,
    pub dau: Vec<DauStat>,
    pub retention: Vec<RetentionStat>,
    pub recent_feedback: Vec<Feedback>,
}
