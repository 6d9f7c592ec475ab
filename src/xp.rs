use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{HunterRank, QuestDifficulty, StreakIntensity};

pub const XP_PER_LEVEL: u64 = 100;
pub const FEEDBACK_XP: i64 = 50;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum XpError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Level curve: `level = floor(sqrt(points / K)) + 1`.
///
/// Holds only the validated constant `K`, so it is `Copy` and safe to share
/// between the server and any client-side renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progression {
    xp_per_level: u64,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            xp_per_level: XP_PER_LEVEL,
        }
    }
}

/// progress inside the current level band
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelProgress {
    pub level: u32,
    pub current: u64,
    pub needed: u64,
    /// 0.0..=100.0
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionChange {
    pub leveled_up: bool,
    pub old_level: u32,
    pub new_level: u32,
    pub old_rank: HunterRank,
    pub new_rank: HunterRank,
    pub rank_changed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakUpdate {
    pub new_streak: u32,
    pub broken: bool,
}

impl Progression {
    pub fn new(xp_per_level: u64) -> Result<Self, XpError> {
        if xp_per_level == 0 {
            return Err(XpError::InvalidArgument(
                "xp per level must be positive".to_string(),
            ));
        }
        Ok(Self { xp_per_level })
    }

    pub fn xp_per_level(&self) -> u64 {
        self.xp_per_level
    }

    /// floor(sqrt(points / K)) + 1, exact in integers
    pub fn level_from_points(&self, points: i64) -> Result<u32, XpError> {
        let points = non_negative(points)?;
        let level = (points / self.xp_per_level).isqrt() + 1;
        u32::try_from(level)
            .map_err(|_| XpError::InvalidArgument(format!("level {} out of range", level)))
    }

    /// K * level^2, the upper bound of the level's band
    pub fn points_required_for_level(&self, level: u32) -> Result<u64, XpError> {
        check_level(level)?;
        let level = u64::from(level);
        level
            .checked_mul(level)
            .and_then(|sq| sq.checked_mul(self.xp_per_level))
            .ok_or_else(|| XpError::InvalidArgument(format!("level {} out of range", level)))
    }

    pub fn rank_for_points(&self, points: i64) -> Result<HunterRank, XpError> {
        rank_from_level(self.level_from_points(points)?)
    }

    pub fn progress(&self, points: i64) -> Result<LevelProgress, XpError> {
        let level = self.level_from_points(points)?;
        let floor = self.band_floor(level)?;
        let ceiling = self.points_required_for_level(level)?;

        let current = points as u64 - floor;
        let needed = ceiling - floor;
        let percentage = (current as f64 * 100.0 / needed as f64).min(100.0);

        Ok(LevelProgress {
            level,
            current,
            needed,
            percentage,
        })
    }

    pub fn detect_change(&self, old_points: i64, new_points: i64) -> Result<ProgressionChange, XpError> {
        let old_level = self.level_from_points(old_points)?;
        let new_level = self.level_from_points(new_points)?;
        let old_rank = rank_from_level(old_level)?;
        let new_rank = rank_from_level(new_level)?;

        Ok(ProgressionChange {
            leveled_up: new_level > old_level,
            old_level,
            new_level,
            old_rank,
            new_rank,
            rank_changed: old_rank != new_rank,
        })
    }

    /// K * (level - 1)^2
    fn band_floor(&self, level: u32) -> Result<u64, XpError> {
        match level {
            0 => Err(XpError::InvalidArgument("level must be at least 1".to_string())),
            1 => Ok(0),
            _ => self.points_required_for_level(level - 1),
        }
    }
}

/// rank thresholds, checked highest first
pub fn rank_from_level(level: u32) -> Result<HunterRank, XpError> {
    check_level(level)?;
    let rank = match level {
        50.. => HunterRank::S,
        30.. => HunterRank::A,
        20.. => HunterRank::B,
        10.. => HunterRank::C,
        5.. => HunterRank::D,
        _ => HunterRank::E,
    };
    Ok(rank)
}

/// xp reward for a quest of this difficulty
pub fn quest_reward(difficulty: QuestDifficulty) -> i64 {
    match difficulty {
        QuestDifficulty::E => 10,
        QuestDifficulty::D => 20,
        QuestDifficulty::C => 35,
        QuestDifficulty::B => 50,
        QuestDifficulty::A => 75,
        QuestDifficulty::S => 100,
    }
}

/// One-step streak transition.
///
/// `today` is passed in rather than read from the clock. A last-active date
/// after `today` (clock skew, backdating) counts as the same day.
pub fn continue_streak(
    last_active_date: Option<NaiveDate>,
    current_streak: u32,
    today: NaiveDate,
) -> StreakUpdate {
    let Some(last_active) = last_active_date else {
        return StreakUpdate {
            new_streak: 1,
            broken: false,
        };
    };

    match (today - last_active).num_days() {
        ..=0 => StreakUpdate {
            new_streak: current_streak,
            broken: false,
        },
        1 => StreakUpdate {
            new_streak: current_streak.saturating_add(1),
            broken: false,
        },
        _ => StreakUpdate {
            new_streak: 1,
            broken: true,
        },
    }
}

pub fn streak_intensity(streak: u32) -> StreakIntensity {
    match streak {
        7.. => StreakIntensity::Intense,
        3.. => StreakIntensity::Medium,
        _ => StreakIntensity::Low,
    }
}

fn non_negative(points: i64) -> Result<u64, XpError> {
    u64::try_from(points)
        .map_err(|_| XpError::InvalidArgument(format!("points must be non-negative, got {}", points)))
}

fn check_level(level: u32) -> Result<(), XpError> {
    if level < 1 {
        return Err(XpError::InvalidArgument(
            "level must be at least 1".to_string(),
        ));
    }
    Ok(())
}
