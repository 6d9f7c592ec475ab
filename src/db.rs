use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

use crate::models::{
    Completion, DauStat, Feedback, FeedbackStatus, LeaderboardEntry, Profile, Quest,
    RetentionStat, TotalStats,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS profiles (
        id TEXT PRIMARY KEY,
        username TEXT NOT NULL UNIQUE,
        display_name TEXT,
        api_token TEXT NOT NULL UNIQUE,
        xp INTEGER NOT NULL DEFAULT 0 CHECK (xp >= 0),
        level INTEGER NOT NULL DEFAULT 1,
        hunter_rank TEXT NOT NULL DEFAULT 'E',
        streak_count INTEGER NOT NULL DEFAULT 0,
        last_active_date TEXT,
        total_quests_completed INTEGER NOT NULL DEFAULT 0,
        is_admin BOOLEAN NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS quests (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES profiles(id),
        title TEXT NOT NULL,
        description TEXT,
        xp_reward INTEGER NOT NULL,
        difficulty TEXT NOT NULL DEFAULT 'E',
        category TEXT NOT NULL DEFAULT 'general',
        is_daily BOOLEAN NOT NULL DEFAULT 1,
        is_active BOOLEAN NOT NULL DEFAULT 1,
        created_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS completions (
        id TEXT PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES profiles(id),
        quest_id TEXT NOT NULL REFERENCES quests(id),
        xp_earned INTEGER NOT NULL,
        completed_at TEXT NOT NULL,
        completed_on TEXT NOT NULL,
        UNIQUE (quest_id, completed_on)
    );

    CREATE TABLE IF NOT EXISTS activity_logs (
        id INTEGER PRIMARY KEY,
        user_id TEXT NOT NULL REFERENCES profiles(id),
        event_type TEXT NOT NULL,
        metadata TEXT NOT NULL DEFAULT '{}',
        created_at TEXT NOT NULL,
        created_on TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS feedback (
        id TEXT PRIMARY KEY,
        user_id TEXT REFERENCES profiles(id),
        type TEXT NOT NULL,
        message TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'pending',
        created_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_quests_user ON quests (user_id, is_active);
    CREATE INDEX IF NOT EXISTS idx_completions_user_day ON completions (user_id, completed_on);
    CREATE INDEX IF NOT EXISTS idx_activity_day ON activity_logs (created_on);
";

const PROFILE_COLUMNS: &str = "id, username, display_name, xp, level, hunter_rank, streak_count, \
     last_active_date, total_quests_completed, is_admin, created_at, updated_at";

const QUEST_COLUMNS: &str =
    "id, user_id, title, description, xp_reward, difficulty, category, is_daily, is_active, created_at";

/// default db file path under the platform data dir
pub fn default_db_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("hunter-quest")
        .join("hunter_quest.db")
}

/// open db + init tables
pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn = Connection::open(path)?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)
}

/// true if the error is a UNIQUE / CHECK violation
pub fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// ---- row helpers ----

fn conversion_error(idx: usize, err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, err.into())
}

fn uuid_col(row: &Row, idx: usize) -> Result<Uuid> {
    let s: String = row.get(idx)?;
    Uuid::parse_str(&s).map_err(|e| conversion_error(idx, e))
}

fn timestamp_col(row: &Row, idx: usize) -> Result<DateTime<Utc>> {
    let s: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e))
}

fn date_col(row: &Row, idx: usize) -> Result<Option<NaiveDate>> {
    let s: Option<String> = row.get(idx)?;
    s.map(|s| NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_error(idx, e)))
        .transpose()
}

fn enum_col<T: FromStr<Err = String>>(row: &Row, idx: usize) -> Result<T> {
    let s: String = row.get(idx)?;
    s.parse().map_err(|e: String| conversion_error(idx, e))
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn profile_from_row(row: &Row) -> Result<Profile> {
    Ok(Profile {
        id: uuid_col(row, 0)?,
        username: row.get(1)?,
        display_name: row.get(2)?,
        xp: row.get(3)?,
        level: row.get(4)?,
        hunter_rank: enum_col(row, 5)?,
        streak_count: row.get(6)?,
        last_active_date: date_col(row, 7)?,
        total_quests_completed: row.get(8)?,
        is_admin: row.get(9)?,
        created_at: timestamp_col(row, 10)?,
        updated_at: timestamp_col(row, 11)?,
    })
}

fn quest_from_row(row: &Row) -> Result<Quest> {
    Ok(Quest {
        id: uuid_col(row, 0)?,
        user_id: uuid_col(row, 1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        xp_reward: row.get(4)?,
        difficulty: enum_col(row, 5)?,
        category: enum_col(row, 6)?,
        is_daily: row.get(7)?,
        is_active: row.get(8)?,
        created_at: timestamp_col(row, 9)?,
    })
}

// ---- profiles ----

pub fn insert_profile(conn: &Connection, profile: &Profile, api_token: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO profiles (id, username, display_name, api_token, xp, level, hunter_rank,
             streak_count, last_active_date, total_quests_completed, is_admin, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            profile.id.to_string(),
            profile.username,
            profile.display_name,
            api_token,
            profile.xp,
            profile.level,
            profile.hunter_rank.as_str(),
            profile.streak_count,
            profile.last_active_date.map(format_date),
            profile.total_quests_completed,
            profile.is_admin,
            profile.created_at.to_rfc3339(),
            profile.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn get_profile(conn: &Connection, id: Uuid) -> Result<Option<Profile>> {
    conn.query_row(
        &format!("SELECT {} FROM profiles WHERE id = ?1", PROFILE_COLUMNS),
        params![id.to_string()],
        profile_from_row,
    )
    .optional()
}

pub fn get_profile_by_username(conn: &Connection, username: &str) -> Result<Option<Profile>> {
    conn.query_row(
        &format!("SELECT {} FROM profiles WHERE username = ?1", PROFILE_COLUMNS),
        params![username],
        profile_from_row,
    )
    .optional()
}

pub fn get_profile_by_token(conn: &Connection, api_token: &str) -> Result<Option<Profile>> {
    conn.query_row(
        &format!("SELECT {} FROM profiles WHERE api_token = ?1", PROFILE_COLUMNS),
        params![api_token],
        profile_from_row,
    )
    .optional()
}

/// save xp, level, rank & streak
pub fn update_progress(conn: &Connection, profile: &Profile) -> Result<()> {
    conn.execute(
        "UPDATE profiles SET xp = ?1, level = ?2, hunter_rank = ?3, streak_count = ?4,
             last_active_date = ?5, total_quests_completed = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            profile.xp,
            profile.level,
            profile.hunter_rank.as_str(),
            profile.streak_count,
            profile.last_active_date.map(format_date),
            profile.total_quests_completed,
            profile.updated_at.to_rfc3339(),
            profile.id.to_string(),
        ],
    )?;
    Ok(())
}

/// returns false if no such user
pub fn set_admin(conn: &Connection, username: &str, is_admin: bool) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE profiles SET is_admin = ?1 WHERE username = ?2",
        params![is_admin, username],
    )?;
    Ok(changed > 0)
}

// ---- quests ----

pub fn insert_quest(conn: &Connection, quest: &Quest) -> Result<()> {
    conn.execute(
        &format!(
            "INSERT INTO quests ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            QUEST_COLUMNS
        ),
        params![
            quest.id.to_string(),
            quest.user_id.to_string(),
            quest.title,
            quest.description,
            quest.xp_reward,
            quest.difficulty.as_str(),
            quest.category.as_str(),
            quest.is_daily,
            quest.is_active,
            quest.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// active quest owned by user
pub fn get_active_quest(conn: &Connection, quest_id: Uuid, user_id: Uuid) -> Result<Option<Quest>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM quests WHERE id = ?1 AND user_id = ?2 AND is_active = 1",
            QUEST_COLUMNS
        ),
        params![quest_id.to_string(), user_id.to_string()],
        quest_from_row,
    )
    .optional()
}

/// newest first
pub fn list_active_quests(conn: &Connection, user_id: Uuid) -> Result<Vec<Quest>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM quests WHERE user_id = ?1 AND is_active = 1
         ORDER BY created_at DESC, rowid DESC",
        QUEST_COLUMNS
    ))?;
    let rows = stmt.query_map(params![user_id.to_string()], quest_from_row)?;
    rows.collect()
}

/// soft delete, returns false if nothing matched
pub fn deactivate_quest(conn: &Connection, quest_id: Uuid, user_id: Uuid) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE quests SET is_active = 0 WHERE id = ?1 AND user_id = ?2 AND is_active = 1",
        params![quest_id.to_string(), user_id.to_string()],
    )?;
    Ok(changed > 0)
}

// ---- completions ----

pub fn insert_completion(conn: &Connection, completion: &Completion) -> Result<()> {
    conn.execute(
        "INSERT INTO completions (id, user_id, quest_id, xp_earned, completed_at, completed_on)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            completion.id.to_string(),
            completion.user_id.to_string(),
            completion.quest_id.to_string(),
            completion.xp_earned,
            completion.completed_at.to_rfc3339(),
            format_date(completion.completed_on),
        ],
    )?;
    Ok(())
}

pub fn completion_exists_on(conn: &Connection, quest_id: Uuid, user_id: Uuid, day: NaiveDate) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS (SELECT 1 FROM completions WHERE quest_id = ?1 AND user_id = ?2 AND completed_on = ?3)",
        params![quest_id.to_string(), user_id.to_string(), format_date(day)],
        |row| row.get(0),
    )
}

/// quest ids the user completed on `day`
pub fn completed_quest_ids_on(conn: &Connection, user_id: Uuid, day: NaiveDate) -> Result<Vec<Uuid>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT quest_id FROM completions WHERE user_id = ?1 AND completed_on = ?2",
    )?;
    let rows = stmt.query_map(params![user_id.to_string(), format_date(day)], |row| uuid_col(row, 0))?;
    rows.collect()
}

// ---- activity & feedback ----

pub fn log_activity(
    conn: &Connection,
    user_id: Uuid,
    event_type: &str,
    metadata: &serde_json::Value,
    at: DateTime<Utc>,
    on: NaiveDate,
) -> Result<()> {
    conn.execute(
        "INSERT INTO activity_logs (user_id, event_type, metadata, created_at, created_on)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id.to_string(),
            event_type,
            metadata.to_string(),
            at.to_rfc3339(),
            format_date(on),
        ],
    )?;
    Ok(())
}

/// (event_type, metadata) for a user, oldest first
pub fn activity_for_user(conn: &Connection, user_id: Uuid) -> Result<Vec<(String, serde_json::Value)>> {
    let mut stmt = conn.prepare(
        "SELECT event_type, metadata FROM activity_logs WHERE user_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![user_id.to_string()], |row| {
        let raw: String = row.get(1)?;
        let metadata = serde_json::from_str(&raw).map_err(|e| conversion_error(1, e))?;
        Ok((row.get::<_, String>(0)?, metadata))
    })?;
    rows.collect()
}

pub fn insert_feedback(conn: &Connection, feedback: &Feedback) -> Result<()> {
    conn.execute(
        "INSERT INTO feedback (id, user_id, type, message, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            feedback.id.to_string(),
            feedback.user_id.map(|id| id.to_string()),
            feedback.feedback_type.as_str(),
            feedback.message,
            feedback.status.as_str(),
            feedback.created_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

/// newest first
pub fn recent_feedback(conn: &Connection, limit: u32) -> Result<Vec<Feedback>> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, type, message, status, created_at FROM feedback
         ORDER BY created_at DESC, rowid DESC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        let user_id: Option<String> = row.get(1)?;
        Ok(Feedback {
            id: uuid_col(row, 0)?,
            user_id: user_id
                .map(|s| Uuid::parse_str(&s).map_err(|e| conversion_error(1, e)))
                .transpose()?,
            feedback_type: enum_col(row, 2)?,
            message: row.get(3)?,
            status: enum_col(row, 4)?,
            created_at: timestamp_col(row, 5)?,
        })
    })?;
    rows.collect()
}

// ---- leaderboard & stats ----

/// highest xp first, earlier signups win ties
pub fn leaderboard(conn: &Connection, limit: u32) -> Result<Vec<LeaderboardEntry>> {
    let mut stmt = conn.prepare(
        "SELECT username, display_name, xp, level, hunter_rank, streak_count FROM profiles
         ORDER BY xp DESC, created_at ASC, rowid ASC LIMIT ?1",
    )?;
    let rows = stmt.query_map(params![limit], |row| {
        Ok(LeaderboardEntry {
            position: 0,
            username: row.get(0)?,
            display_name: row.get(1)?,
            xp: row.get(2)?,
            level: row.get(3)?,
            hunter_rank: enum_col(row, 4)?,
            streak_count: row.get(5)?,
        })
    })?;

    let mut entries = Vec::new();
    for (i, row) in rows.enumerate() {
        let mut entry = row?;
        entry.position = i as u32 + 1;
        entries.push(entry);
    }
    Ok(entries)
}

pub fn total_stats(conn: &Connection, today: NaiveDate) -> Result<TotalStats> {
    conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM profiles),
            (SELECT COUNT(*) FROM quests WHERE is_active = 1),
            (SELECT COUNT(*) FROM completions),
            (SELECT COALESCE(SUM(xp_earned), 0) FROM completions),
            (SELECT COUNT(DISTINCT user_id) FROM activity_logs WHERE created_on = ?1),
            (SELECT COUNT(*) FROM feedback WHERE status = ?2)",
        params![format_date(today), FeedbackStatus::Pending.as_str()],
        |row| {
            Ok(TotalStats {
                total_users: row.get(0)?,
                total_quests: row.get(1)?,
                total_completions: row.get(2)?,
                total_xp_awarded: row.get(3)?,
                active_today: row.get(4)?,
                feedback_pending: row.get(5)?,
            })
        },
    )
}

/// distinct active users per day, `start..=end`, days with no activity omitted
pub fn dau_stats(conn: &Connection, start: NaiveDate, end: NaiveDate) -> Result<Vec<DauStat>> {
    let mut stmt = conn.prepare(
        "SELECT created_on, COUNT(DISTINCT user_id) FROM activity_logs
         WHERE created_on >= ?1 AND created_on <= ?2
         GROUP BY created_on
         ORDER BY created_on",
    )?;
    let rows = stmt.query_map(params![format_date(start), format_date(end)], |row| {
        let day: String = row.get(0)?;
        Ok(DauStat {
            date: NaiveDate::parse_from_str(&day, DATE_FORMAT).map_err(|e| conversion_error(0, e))?,
            users: row.get(1)?,
        })
    })?;
    rows.collect()
}

/// Weekly cohort retention up to `today`.
///
/// A cohort is the monday-based week a profile signed up in. `week` counts
/// whole weeks from the cohort start to the day of an activity-log row, and
/// `users` is the number of distinct cohort members active in that week.
pub fn weekly_retention(conn: &Connection, today: NaiveDate) -> Result<Vec<RetentionStat>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT a.user_id, p.created_at, a.created_on
         FROM activity_logs a
         JOIN profiles p ON p.id = a.user_id
         WHERE a.created_on <= ?1",
    )?;
    let rows = stmt.query_map(params![format_date(today)], |row| {
        let day: String = row.get(2)?;
        Ok((
            uuid_col(row, 0)?,
            timestamp_col(row, 1)?,
            NaiveDate::parse_from_str(&day, DATE_FORMAT).map_err(|e| conversion_error(2, e))?,
        ))
    })?;

    let mut cohorts: BTreeMap<(NaiveDate, u32), HashSet<Uuid>> = BTreeMap::new();
    for row in rows {
        let (user_id, signed_up, active_on) = row?;
        let cohort = week_start(signed_up.date_naive());
        let days = (active_on - cohort).num_days();
        if days < 0 {
            continue;
        }
        let week = u32::try_from(days / 7).unwrap_or(u32::MAX);
        cohorts.entry((cohort, week)).or_default().insert(user_id);
    }

    Ok(cohorts
        .into_iter()
        .map(|((cohort, week), users)| RetentionStat {
            cohort,
            week,
            users: u32::try_from(users.len()).unwrap_or(u32::MAX),
        })
        .collect())
}

fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FeedbackType, HunterRank, QuestCategory, QuestDifficulty};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 19, 10, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 19).unwrap()
    }

    fn hunter(conn: &Connection, name: &str, xp: i64) -> Profile {
        let mut profile = Profile::new(name.to_string(), None, now());
        profile.xp = xp;
        insert_profile(conn, &profile, &format!("token-{}", name)).unwrap();
        profile
    }

    fn quest(conn: &Connection, user_id: Uuid, title: &str) -> Quest {
        let quest = Quest {
            id: Uuid::new_v4(),
            user_id,
            title: title.to_string(),
            description: None,
            xp_reward: 10,
            difficulty: QuestDifficulty::E,
            category: QuestCategory::General,
            is_daily: true,
            is_active: true,
            created_at: now(),
        };
        insert_quest(conn, &quest).unwrap();
        quest
    }

    #[test]
    fn test_profile_roundtrip() {
        let conn = open_in_memory().unwrap();
        let mut profile = hunter(&conn, "jinwoo", 0);

        let loaded = get_profile_by_token(&conn, "token-jinwoo").unwrap().unwrap();
        assert_eq!(loaded, profile);

        profile.xp = 500;
        profile.level = 3;
        profile.hunter_rank = HunterRank::E;
        profile.streak_count = 3;
        profile.last_active_date = Some(today());
        update_progress(&conn, &profile).unwrap();

        let loaded = get_profile(&conn, profile.id).unwrap().unwrap();
        assert_eq!(loaded.xp, 500);
        assert_eq!(loaded.level, 3);
        assert_eq!(loaded.streak_count, 3);
        assert_eq!(loaded.last_active_date, Some(today()));
    }

    #[test]
    fn test_reopen_file_db_keeps_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("hunter_quest.db");
        {
            let conn = open_db(&path).unwrap();
            hunter(&conn, "jinwoo", 120);
        }
        let conn = open_db(&path).unwrap();
        let loaded = get_profile_by_username(&conn, "jinwoo").unwrap().unwrap();
        assert_eq!(loaded.xp, 120);
    }

    #[test]
    fn test_unknown_token() {
        let conn = open_in_memory().unwrap();
        hunter(&conn, "jinwoo", 0);
        assert!(get_profile_by_token(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_username_is_constraint_violation() {
        let conn = open_in_memory().unwrap();
        hunter(&conn, "jinwoo", 0);
        let dup = Profile::new("jinwoo".to_string(), None, now());
        let err = insert_profile(&conn, &dup, "other-token").unwrap_err();
        assert!(is_constraint_violation(&err));
    }

    #[test]
    fn test_quest_soft_delete() {
        let conn = open_in_memory().unwrap();
        let owner = hunter(&conn, "jinwoo", 0);
        let q = quest(&conn, owner.id, "pushups");

        assert_eq!(list_active_quests(&conn, owner.id).unwrap().len(), 1);
        assert!(deactivate_quest(&conn, q.id, owner.id).unwrap());
        assert!(!deactivate_quest(&conn, q.id, owner.id).unwrap());
        assert!(list_active_quests(&conn, owner.id).unwrap().is_empty());
        assert!(get_active_quest(&conn, q.id, owner.id).unwrap().is_none());
    }

    #[test]
    fn test_quest_not_visible_to_other_user() {
        let conn = open_in_memory().unwrap();
        let owner = hunter(&conn, "jinwoo", 0);
        let other = hunter(&conn, "cha", 0);
        let q = quest(&conn, owner.id, "pushups");

        assert!(get_active_quest(&conn, q.id, other.id).unwrap().is_none());
        assert!(!deactivate_quest(&conn, q.id, other.id).unwrap());
    }

    #[test]
    fn test_one_completion_per_quest_per_day() {
        let conn = open_in_memory().unwrap();
        let owner = hunter(&conn, "jinwoo", 0);
        let q = quest(&conn, owner.id, "pushups");
        let completion = Completion {
            id: Uuid::new_v4(),
            user_id: owner.id,
            quest_id: q.id,
            xp_earned: 10,
            completed_at: now(),
            completed_on: today(),
        };
        insert_completion(&conn, &completion).unwrap();
        assert!(completion_exists_on(&conn, q.id, owner.id, today()).unwrap());
        assert_eq!(completed_quest_ids_on(&conn, owner.id, today()).unwrap(), vec![q.id]);

        let again = Completion { id: Uuid::new_v4(), ..completion.clone() };
        assert!(is_constraint_violation(&insert_completion(&conn, &again).unwrap_err()));

        let tomorrow = Completion {
            id: Uuid::new_v4(),
            completed_on: today().succ_opt().unwrap(),
            ..completion
        };
        insert_completion(&conn, &tomorrow).unwrap();
    }

    #[test]
    fn test_leaderboard_order() {
        let conn = open_in_memory().unwrap();
        hunter(&conn, "low", 10);
        hunter(&conn, "high", 900);
        hunter(&conn, "mid", 300);

        let board = leaderboard(&conn, 2).unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].username, "high");
        assert_eq!(board[0].position, 1);
        assert_eq!(board[1].username, "mid");
        assert_eq!(board[1].position, 2);
    }

    #[test]
    fn test_stats() {
        let conn = open_in_memory().unwrap();
        let a = hunter(&conn, "a", 0);
        let b = hunter(&conn, "b", 0);
        let meta = serde_json::json!({ "xp_earned": 10 });
        let yesterday = today().pred_opt().unwrap();

        log_activity(&conn, a.id, "quest_completed", &meta, now(), today()).unwrap();
        log_activity(&conn, a.id, "quest_completed", &meta, now(), today()).unwrap();
        log_activity(&conn, b.id, "quest_completed", &meta, now(), today()).unwrap();
        log_activity(&conn, b.id, "quest_completed", &meta, now(), yesterday).unwrap();

        insert_feedback(
            &conn,
            &Feedback {
                id: Uuid::new_v4(),
                user_id: Some(a.id),
                feedback_type: FeedbackType::Bug,
                message: "xp bar flickers".to_string(),
                status: FeedbackStatus::Pending,
                created_at: now(),
            },
        )
        .unwrap();

        let stats = total_stats(&conn, today()).unwrap();
        assert_eq!(stats.total_users, 2);
        assert_eq!(stats.active_today, 2);
        assert_eq!(stats.feedback_pending, 1);

        let dau = dau_stats(&conn, yesterday, today()).unwrap();
        assert_eq!(
            dau,
            vec![
                DauStat { date: yesterday, users: 1 },
                DauStat { date: today(), users: 2 },
            ]
        );

        assert_eq!(activity_for_user(&conn, a.id).unwrap().len(), 2);
        assert_eq!(recent_feedback(&conn, 10).unwrap()[0].message, "xp bar flickers");
    }

    #[test]
    fn test_weekly_retention_two_cohorts() {
        let conn = open_in_memory().unwrap();
        let meta = serde_json::json!({ "xp_earned": 10 });
        // 2026-02-19 is a thursday, its cohort starts monday 2026-02-16
        let day = |d: u32| NaiveDate::from_ymd_opt(2026, 2, d).unwrap();

        let signed_up = |d: u32, h: u32| Utc.with_ymd_and_hms(2026, 2, d, h, 0, 0).unwrap();
        let early = Profile::new("early".to_string(), None, signed_up(3, 9));
        let early_too = Profile::new("early_too".to_string(), None, signed_up(8, 22));
        let late = hunter(&conn, "late", 0);
        insert_profile(&conn, &early, "token-early").unwrap();
        insert_profile(&conn, &early_too, "token-early-too").unwrap();

        // cohort 2026-02-02: both active in week 0, only `early` comes back in week 2
        log_activity(&conn, early.id, "quest_completed", &meta, now(), day(3)).unwrap();
        log_activity(&conn, early.id, "quest_completed", &meta, now(), day(4)).unwrap();
        log_activity(&conn, early_too.id, "quest_completed", &meta, now(), day(8)).unwrap();
        log_activity(&conn, early.id, "quest_completed", &meta, now(), day(17)).unwrap();
        // cohort 2026-02-16: week 0 only
        log_activity(&conn, late.id, "quest_completed", &meta, now(), today()).unwrap();
        // after `today`, ignored
        log_activity(&conn, late.id, "quest_completed", &meta, now(), day(25)).unwrap();

        let retention = weekly_retention(&conn, today()).unwrap();
        assert_eq!(
            retention,
            vec![
                RetentionStat { cohort: day(2), week: 0, users: 2 },
                RetentionStat { cohort: day(2), week: 2, users: 1 },
                RetentionStat { cohort: day(16), week: 0, users: 1 },
            ]
        );
    }

    #[test]
    fn test_weekly_retention_empty() {
        let conn = open_in_memory().unwrap();
        hunter(&conn, "idle", 0);
        assert!(weekly_retention(&conn, today()).unwrap().is_empty());
    }
}
