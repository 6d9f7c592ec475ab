use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// hunter rank, ordered E < D < C < B < A < S
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HunterRank {
    E,
    D,
    C,
    B,
    A,
    S,
}

impl HunterRank {
    pub fn as_str(&self) -> &'static str {
        match self {
            HunterRank::E => "E",
            HunterRank::D => "D",
            HunterRank::C => "C",
            HunterRank::B => "B",
            HunterRank::A => "A",
            HunterRank::S => "S",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            HunterRank::E => "E-Rank Hunter",
            HunterRank::D => "D-Rank Hunter",
            HunterRank::C => "C-Rank Hunter",
            HunterRank::B => "B-Rank Hunter",
            HunterRank::A => "A-Rank Hunter",
            HunterRank::S => "S-Rank Hunter",
        }
    }

    /// badge colour, hex
    pub fn color(&self) -> &'static str {
        match self {
            HunterRank::E => "#808080",
            HunterRank::D => "#22c55e",
            HunterRank::C => "#3b82f6",
            HunterRank::B => "#a855f7",
            HunterRank::A => "#f97316",
            HunterRank::S => "#ffd700",
        }
    }
}

impl fmt::Display for HunterRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HunterRank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "E" => Ok(HunterRank::E),
            "D" => Ok(HunterRank::D),
            "C" => Ok(HunterRank::C),
            "B" => Ok(HunterRank::B),
            "A" => Ok(HunterRank::A),
            "S" => Ok(HunterRank::S),
            other => Err(format!("unknown hunter rank '{}'", other)),
        }
    }
}

/// quest difficulty, drives the xp reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum QuestDifficulty {
    #[default]
    E,
    D,
    C,
    B,
    A,
    S,
}

impl QuestDifficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestDifficulty::E => "E",
            QuestDifficulty::D => "D",
            QuestDifficulty::C => "C",
            QuestDifficulty::B => "B",
            QuestDifficulty::A => "A",
            QuestDifficulty::S => "S",
        }
    }
}

impl FromStr for QuestDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "E" => Ok(QuestDifficulty::E),
            "D" => Ok(QuestDifficulty::D),
            "C" => Ok(QuestDifficulty::C),
            "B" => Ok(QuestDifficulty::B),
            "A" => Ok(QuestDifficulty::A),
            "S" => Ok(QuestDifficulty::S),
            other => Err(format!("unknown quest difficulty '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestCategory {
    Study,
    Fitness,
    Coding,
    Health,
    #[default]
    General,
}

impl QuestCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestCategory::Study => "study",
            QuestCategory::Fitness => "fitness",
            QuestCategory::Coding => "coding",
            QuestCategory::Health => "health",
            QuestCategory::General => "general",
        }
    }
}

impl FromStr for QuestCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study" => Ok(QuestCategory::Study),
            "fitness" => Ok(QuestCategory::Fitness),
            "coding" => Ok(QuestCategory::Coding),
            "health" => Ok(QuestCategory::Health),
            "general" => Ok(QuestCategory::General),
            other => Err(format!("unknown quest category '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Bug,
    Feature,
    Other,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Bug => "bug",
            FeedbackType::Feature => "feature",
            FeedbackType::Other => "other",
        }
    }
}

impl FromStr for FeedbackType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bug" => Ok(FeedbackType::Bug),
            "feature" => Ok(FeedbackType::Feature),
            "other" => Ok(FeedbackType::Other),
            other => Err(format!("unknown feedback type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    Pending,
    Reviewed,
    Resolved,
}

impl FeedbackStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackStatus::Pending => "pending",
            FeedbackStatus::Reviewed => "reviewed",
            FeedbackStatus::Resolved => "resolved",
        }
    }
}

impl FromStr for FeedbackStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FeedbackStatus::Pending),
            "reviewed" => Ok(FeedbackStatus::Reviewed),
            "resolved" => Ok(FeedbackStatus::Resolved),
            other => Err(format!("unknown feedback status '{}'", other)),
        }
    }
}

/// streak flame intensity shown next to the streak count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreakIntensity {
    Low,
    Medium,
    Intense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub xp: i64,
    pub level: u32,
    pub hunter_rank: HunterRank,
    pub streak_count: u32,
    pub last_active_date: Option<NaiveDate>,
    pub total_quests_completed: u32,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// fresh level-1 profile
    pub fn new(username: String, display_name: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username,
            display_name,
            xp: 0,
            level: 1,
            hunter_rank: HunterRank::E,
            streak_count: 0,
            last_active_date: None,
            total_quests_completed: 0,
            is_admin: false,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub xp_reward: i64,
    pub difficulty: QuestDifficulty,
    pub category: QuestCategory,
    pub is_daily: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub id: Uuid,
    pub user_id: Uuid,
    pub quest_id: Uuid,
    pub xp_earned: i64,
    pub completed_at: DateTime<Utc>,
    /// calendar day in the reference timezone
    pub completed_on: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub feedback_type: FeedbackType,
    pub message: String,
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub position: u32,
    pub username: String,
    pub display_name: Option<String>,
    pub xp: i64,
    pub level: u32,
    pub hunter_rank: HunterRank,
    pub streak_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DauStat {
    pub date: NaiveDate,
    pub users: u32,
}

/// users from one signup-week cohort who were active `week` weeks after it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionStat {
    /// monday of the signup week
    pub cohort: NaiveDate,
    pub week: u32,
    pub users: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalStats {
    pub total_users: u32,
    pub total_quests: u32,
    pub total_completions: u32,
    pub total_xp_awarded: i64,
    pub active_today: u32,
    pub feedback_pending: u32,
}

pub const EVENT_QUEST_COMPLETED: &str = "quest_completed";
pub const EVENT_FEEDBACK_SUBMITTED: &str = "feedback_submitted";
