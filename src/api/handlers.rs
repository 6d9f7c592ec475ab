use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::Duration;
use uuid::Uuid;

use super::auth::{self, AuthUser};
use super::types::{
    AdminStatsResponse, CompleteQuestRequest, CreateQuestRequest, FeedbackRequest,
    HealthResponse, LeaderboardQuery, LeaderboardResponse, MeResponse, QuestsResponse,
    RECENT_FEEDBACK_LIMIT, SignupRequest, SignupResponse, StatsQuery,
};
use super::AppState;
use crate::db;
use crate::error::AppError;
use crate::models::{Profile, Quest};
use crate::rewards::{self, CompletionOutcome, FeedbackInput, FeedbackOutcome};
use crate::xp;

pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// POST /api/signup
pub async fn signup_handler(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<SignupRequest>, AppError>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    request.validate().map_err(AppError::BadRequest)?;

    let display_name = request
        .display_name
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());
    let profile = Profile::new(request.username.trim().to_string(), display_name, state.now());
    let api_token = auth::generate_token();

    let conn = state.db.lock().await;
    db::insert_profile(&conn, &profile, &api_token).map_err(|e| {
        if db::is_constraint_violation(&e) {
            AppError::Conflict("Username already taken".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    tracing::info!(user_id = %profile.id, username = %profile.username, "hunter registered");

    Ok((StatusCode::CREATED, Json(SignupResponse { profile, api_token })))
}

/// GET /api/me
pub async fn me_handler(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
) -> Result<Json<MeResponse>, AppError> {
    let progress = state.engine.progress(profile.xp)?;
    let xp_for_next_level = state.engine.points_required_for_level(progress.level)?;

    Ok(Json(MeResponse {
        rank_color: profile.hunter_rank.color().to_string(),
        streak_intensity: xp::streak_intensity(profile.streak_count),
        progress,
        xp_for_next_level,
        profile,
    }))
}

/// GET /api/quests
pub async fn list_quests_handler(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
) -> Result<Json<QuestsResponse>, AppError> {
    let today = state.today();
    let conn = state.db.lock().await;
    let quests = db::list_active_quests(&conn, profile.id)?;
    let completed_today = db::completed_quest_ids_on(&conn, profile.id, today)?;

    Ok(Json(QuestsResponse {
        quests,
        completed_today,
    }))
}

/// POST /api/quests
pub async fn create_quest_handler(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    WithRejection(Json(request), _): WithRejection<Json<CreateQuestRequest>, AppError>,
) -> Result<(StatusCode, Json<Quest>), AppError> {
    let title = request
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Title is required".to_string()))?;

    let difficulty = request.difficulty.unwrap_or_default();
    let quest = Quest {
        id: Uuid::new_v4(),
        user_id: profile.id,
        title: title.to_string(),
        description: request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty()),
        xp_reward: xp::quest_reward(difficulty),
        difficulty,
        category: request.category.unwrap_or_default(),
        is_daily: request.is_daily.unwrap_or(true),
        is_active: true,
        created_at: state.now(),
    };

    let conn = state.db.lock().await;
    db::insert_quest(&conn, &quest)?;

    tracing::info!(user_id = %profile.id, quest_id = %quest.id, xp_reward = quest.xp_reward, "quest created");

    Ok((StatusCode::CREATED, Json(quest)))
}

/// DELETE /api/quests/{id}, soft delete
pub async fn delete_quest_handler(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    WithRejection(Path(quest_id), _): WithRejection<Path<Uuid>, AppError>,
) -> Result<Json<serde_json::Value>, AppError> {
    let conn = state.db.lock().await;
    if !db::deactivate_quest(&conn, quest_id, profile.id)? {
        return Err(AppError::NotFound("Quest not found".to_string()));
    }
    tracing::info!(user_id = %profile.id, %quest_id, "quest archived");
    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /api/complete-quest
pub async fn complete_quest_handler(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    WithRejection(Json(request), _): WithRejection<Json<CompleteQuestRequest>, AppError>,
) -> Result<Json<CompletionOutcome>, AppError> {
    let quest_id = request
        .quest_id
        .ok_or_else(|| AppError::BadRequest("Quest ID is required".to_string()))?;

    let now = state.now();
    let today = state.today();
    let mut conn = state.db.lock().await;
    let outcome = rewards::complete_quest(&mut conn, &state.engine, profile.id, quest_id, now, today)?;
    Ok(Json(outcome))
}

/// POST /api/feedback
pub async fn feedback_handler(
    State(state): State<AppState>,
    AuthUser(profile): AuthUser,
    WithRejection(Json(request), _): WithRejection<Json<FeedbackRequest>, AppError>,
) -> Result<Json<FeedbackOutcome>, AppError> {
    let now = state.now();
    let today = state.today();
    let mut conn = state.db.lock().await;
    let outcome = rewards::submit_feedback(
        &mut conn,
        &state.engine,
        profile.id,
        FeedbackInput {
            feedback_type: request.feedback_type,
            message: &request.message,
        },
        state.feedback_xp,
        now,
        today,
    )?;
    Ok(Json(outcome))
}

/// GET /api/leaderboard
pub async fn leaderboard_handler(
    State(state): State<AppState>,
    _user: AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<LeaderboardQuery>, AppError>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let conn = state.db.lock().await;
    let entries = db::leaderboard(&conn, query.effective_limit())?;
    Ok(Json(LeaderboardResponse { entries }))
}

/// GET /api/admin/stats
pub async fn admin_stats_handler(
    State(state): State<AppState>,
    user: AuthUser,
    WithRejection(Query(query), _): WithRejection<Query<StatsQuery>, AppError>,
) -> Result<Json<AdminStatsResponse>, AppError> {
    user.require_admin()?;

    let today = state.today();
    let start = today - Duration::days(i64::from(query.effective_days()) - 1);

    let conn = state.db.lock().await;
    Ok(Json(AdminStatsResponse {
        totals: db::total_stats(&conn, today)?,
        dau: db::dau_stats(&conn, start, today)?,
        retention: db::weekly_retention(&conn, today)?,
        recent_feedback: db::recent_feedback(&conn, RECENT_FEEDBACK_LIMIT)?,
    }))
}
