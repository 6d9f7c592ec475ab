//! XP-awarding flows: quest completion and feedback rewards.
//!
//! Each flow runs inside one SQLite transaction so the read-modify-write of a
//! profile's totals cannot interleave with another award for the same user.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::db;
use crate::error::AppError;
use crate::models::{
    Completion, EVENT_FEEDBACK_SUBMITTED, EVENT_QUEST_COMPLETED, Feedback, FeedbackStatus,
    FeedbackType, HunterRank, Profile,
};
use crate::notifications::{self, Celebration};
use crate::xp::{self, Progression, ProgressionChange};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOutcome {
    pub success: bool,
    pub xp_earned: i64,
    pub new_xp: i64,
    pub new_level: u32,
    pub new_rank: HunterRank,
    pub leveled_up: bool,
    pub rank_changed: bool,
    pub new_streak: u32,
    pub streak_broken: bool,
    pub message: String,
    pub celebration: Option<Celebration>,
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackOutcome {
    pub success: bool,
    pub xp_awarded: i64,
    pub new_xp: i64,
    pub new_level: u32,
    pub new_rank: HunterRank,
    pub leveled_up: bool,
    pub celebration: Option<Celebration>,
}

/// A feedback submission as it arrives from the user.
#[derive(Debug, Clone, Copy)]
pub struct FeedbackInput<'a> {
    pub feedback_type: FeedbackType,
    pub message: &'a str,
}

/// Mark a quest done for `today` and award its XP.
///
/// Fails with `NotFound` for a missing, inactive or foreign quest and with
/// `Conflict` when the quest was already completed on `today`.
pub fn complete_quest(
    conn: &mut Connection,
    engine: &Progression,
    user_id: Uuid,
    quest_id: Uuid,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> Result<CompletionOutcome, AppError> {
    let tx = conn.transaction()?;

    let quest = db::get_active_quest(&tx, quest_id, user_id)?
        .ok_or_else(|| AppError::NotFound("Quest not found".to_string()))?;

    if db::completion_exists_on(&tx, quest_id, user_id, today)? {
        return Err(AppError::Conflict("Quest already completed today".to_string()));
    }

    let mut profile = db::get_profile(&tx, user_id)?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    let xp_earned = quest.xp_reward;
    let new_xp = profile.xp.saturating_add(xp_earned);
    let change = engine.detect_change(profile.xp, new_xp)?;
    let streak = xp::continue_streak(profile.last_active_date, profile.streak_count, today);

    let completion = Completion {
        id: Uuid::new_v4(),
        user_id,
        quest_id,
        xp_earned,
        completed_at: now,
        completed_on: today,
    };
    db::insert_completion(&tx, &completion).map_err(|e| {
        if db::is_constraint_violation(&e) {
            AppError::Conflict("Quest already completed today".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    apply_change(&mut profile, new_xp, &change, now);
    profile.streak_count = streak.new_streak;
    profile.last_active_date = Some(today);
    profile.total_quests_completed = profile.total_quests_completed.saturating_add(1);
    db::update_progress(&tx, &profile)?;

    db::log_activity(
        &tx,
        user_id,
        EVENT_QUEST_COMPLETED,
        &json!({
            "quest_id": quest_id,
            "quest_title": quest.title,
            "xp_earned": xp_earned,
            "leveled_up": change.leveled_up,
        }),
        now,
        today,
    )?;

    tx.commit()?;

    tracing::info!(
        %user_id,
        %quest_id,
        xp_earned,
        new_xp,
        level = change.new_level,
        streak = streak.new_streak,
        "quest completed"
    );
    if change.leveled_up {
        tracing::info!(%user_id, level = change.new_level, rank = %change.new_rank, "level up");
    }
    if streak.broken {
        tracing::debug!(%user_id, "streak reset");
    }

    Ok(CompletionOutcome {
        success: true,
        xp_earned,
        new_xp,
        new_level: change.new_level,
        new_rank: change.new_rank,
        leveled_up: change.leveled_up,
        rank_changed: change.rank_changed,
        new_streak: streak.new_streak,
        streak_broken: streak.broken,
        message: notifications::quest_complete(&quest.title, xp_earned, streak.new_streak),
        celebration: notifications::level_up(&change),
        profile,
    })
}

/// Store a piece of feedback and pay out the feedback reward.
pub fn submit_feedback(
    conn: &mut Connection,
    engine: &Progression,
    user_id: Uuid,
    input: FeedbackInput<'_>,
    reward: i64,
    now: DateTime<Utc>,
    today: NaiveDate,
) -> Result<FeedbackOutcome, AppError> {
    let FeedbackInput { feedback_type, message } = input;
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("Message is required".to_string()));
    }

    let tx = conn.transaction()?;

    let mut profile = db::get_profile(&tx, user_id)?
        .ok_or_else(|| AppError::NotFound("Profile not found".to_string()))?;

    db::insert_feedback(
        &tx,
        &Feedback {
            id: Uuid::new_v4(),
            user_id: Some(user_id),
            feedback_type,
            message: message.to_string(),
            status: FeedbackStatus::Pending,
            created_at: now,
        },
    )?;

    let new_xp = profile.xp.saturating_add(reward);
    let change = engine.detect_change(profile.xp, new_xp)?;
    apply_change(&mut profile, new_xp, &change, now);
    db::update_progress(&tx, &profile)?;

    db::log_activity(
        &tx,
        user_id,
        EVENT_FEEDBACK_SUBMITTED,
        &json!({ "xp_awarded": reward, "type": feedback_type.as_str() }),
        now,
        today,
    )?;

    tx.commit()?;

    tracing::info!(%user_id, xp_awarded = reward, new_xp, "feedback submitted");

    Ok(FeedbackOutcome {
        success: true,
        xp_awarded: reward,
        new_xp,
        new_level: change.new_level,
        new_rank: change.new_rank,
        leveled_up: change.leveled_up,
        celebration: notifications::level_up(&change),
    })
}

fn apply_change(profile: &mut Profile, new_xp: i64, change: &ProgressionChange, now: DateTime<Utc>) {
    profile.xp = new_xp;
    profile.level = change.new_level;
    profile.hunter_rank = change.new_rank;
    profile.updated_at = now;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Quest, QuestCategory, QuestDifficulty};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 19, 10, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 19).unwrap()
    }

    fn setup(xp: i64) -> (Connection, Profile) {
        let conn = db::open_in_memory().unwrap();
        let mut profile = Profile::new("jinwoo".to_string(), None, now());
        profile.xp = xp;
        db::insert_profile(&conn, &profile, "token").unwrap();
        (conn, profile)
    }

    fn add_quest(conn: &Connection, user_id: Uuid, difficulty: QuestDifficulty) -> Quest {
        let quest = Quest {
            id: Uuid::new_v4(),
            user_id,
            title: "Read 20 pages".to_string(),
            description: None,
            xp_reward: xp::quest_reward(difficulty),
            difficulty,
            category: QuestCategory::Study,
            is_daily: true,
            is_active: true,
            created_at: now(),
        };
        db::insert_quest(conn, &quest).unwrap();
        quest
    }

    #[test]
    fn test_complete_quest_awards_xp() {
        let (mut conn, profile) = setup(0);
        let quest = add_quest(&conn, profile.id, QuestDifficulty::C);
        let engine = Progression::default();

        let outcome = complete_quest(&mut conn, &engine, profile.id, quest.id, now(), today()).unwrap();
        assert_eq!(outcome.xp_earned, 35);
        assert_eq!(outcome.new_xp, 35);
        assert_eq!(outcome.new_level, 1);
        assert_eq!(outcome.new_streak, 1);
        assert!(!outcome.leveled_up);
        assert!(outcome.celebration.is_none());

        let stored = db::get_profile(&conn, profile.id).unwrap().unwrap();
        assert_eq!(stored.xp, 35);
        assert_eq!(stored.total_quests_completed, 1);
        assert_eq!(stored.last_active_date, Some(today()));

        let log = db::activity_for_user(&conn, profile.id).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].0, EVENT_QUEST_COMPLETED);
        assert_eq!(log[0].1["xp_earned"], 35);
        assert_eq!(log[0].1["quest_title"], "Read 20 pages");
    }

    #[test]
    fn test_duplicate_completion_same_day() {
        let (mut conn, profile) = setup(0);
        let quest = add_quest(&conn, profile.id, QuestDifficulty::E);
        let engine = Progression::default();

        complete_quest(&mut conn, &engine, profile.id, quest.id, now(), today()).unwrap();
        let err = complete_quest(&mut conn, &engine, profile.id, quest.id, now(), today()).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // nothing changed by the rejected attempt
        let stored = db::get_profile(&conn, profile.id).unwrap().unwrap();
        assert_eq!(stored.xp, 10);
        assert_eq!(db::activity_for_user(&conn, profile.id).unwrap().len(), 1);
    }

    #[test]
    fn test_next_day_extends_streak() {
        let (mut conn, profile) = setup(0);
        let quest = add_quest(&conn, profile.id, QuestDifficulty::E);
        let engine = Progression::default();

        complete_quest(&mut conn, &engine, profile.id, quest.id, now(), today()).unwrap();
        let tomorrow = today().succ_opt().unwrap();
        let outcome = complete_quest(
            &mut conn,
            &engine,
            profile.id,
            quest.id,
            now() + Duration::days(1),
            tomorrow,
        )
        .unwrap();
        assert_eq!(outcome.new_streak, 2);
        assert!(!outcome.streak_broken);
        assert_eq!(outcome.new_xp, 20);
    }

    #[test]
    fn test_gap_breaks_streak() {
        let (mut conn, mut profile) = setup(0);
        profile.streak_count = 6;
        profile.last_active_date = Some(today() - Duration::days(3));
        db::update_progress(&conn, &profile).unwrap();
        let quest = add_quest(&conn, profile.id, QuestDifficulty::E);

        let outcome =
            complete_quest(&mut conn, &Progression::default(), profile.id, quest.id, now(), today()).unwrap();
        assert_eq!(outcome.new_streak, 1);
        assert!(outcome.streak_broken);
    }

    #[test]
    fn test_level_up_and_rank_change() {
        // 1590 xp is level 4 (E); +20 crosses 1600 into level 5 (D)
        let (mut conn, profile) = setup(1_590);
        let quest = add_quest(&conn, profile.id, QuestDifficulty::D);

        let outcome =
            complete_quest(&mut conn, &Progression::default(), profile.id, quest.id, now(), today()).unwrap();
        assert!(outcome.leveled_up);
        assert!(outcome.rank_changed);
        assert_eq!(outcome.new_level, 5);
        assert_eq!(outcome.new_rank, HunterRank::D);
        assert!(outcome.celebration.is_some());
        assert_eq!(outcome.profile.hunter_rank, HunterRank::D);
    }

    #[test]
    fn test_foreign_or_inactive_quest_not_found() {
        let (mut conn, profile) = setup(0);
        let other = Profile::new("cha".to_string(), None, now());
        db::insert_profile(&conn, &other, "other-token").unwrap();
        let foreign = add_quest(&conn, other.id, QuestDifficulty::E);
        let engine = Progression::default();

        let err = complete_quest(&mut conn, &engine, profile.id, foreign.id, now(), today()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let own = add_quest(&conn, profile.id, QuestDifficulty::E);
        db::deactivate_quest(&conn, own.id, profile.id).unwrap();
        let err = complete_quest(&mut conn, &engine, profile.id, own.id, now(), today()).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn test_feedback_reward() {
        let (mut conn, profile) = setup(60);
        let outcome = submit_feedback(
            &mut conn,
            &Progression::default(),
            profile.id,
            FeedbackInput {
                feedback_type: FeedbackType::Feature,
                message: "  dark mode please  ",
            },
            50,
            now(),
            today(),
        )
        .unwrap();
        assert_eq!(outcome.new_xp, 110);
        assert_eq!(outcome.new_level, 2);
        assert!(outcome.leveled_up);

        let feedback = db::recent_feedback(&conn, 1).unwrap();
        assert_eq!(feedback[0].message, "dark mode please");
        assert_eq!(feedback[0].status, FeedbackStatus::Pending);

        let stored = db::get_profile(&conn, profile.id).unwrap().unwrap();
        assert_eq!(stored.level, 2);
        // feedback does not touch the streak
        assert_eq!(stored.streak_count, 0);
    }

    #[test]
    fn test_blank_feedback_rejected() {
        let (mut conn, profile) = setup(0);
        let err = submit_feedback(
            &mut conn,
            &Progression::default(),
            profile.id,
            FeedbackInput {
                feedback_type: FeedbackType::Bug,
                message: "   ",
            },
            50,
            now(),
            today(),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
        assert!(db::recent_feedback(&conn, 10).unwrap().is_empty());
    }
}
