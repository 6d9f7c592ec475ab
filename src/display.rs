use crate::models::{LeaderboardEntry, Profile, StreakIntensity};
use crate::xp::{self, Progression, XpError};

const BAR_WIDTH: usize = 20;

/// `[########------------] 150/300 XP (50.0%)`
pub fn render_xp_bar(engine: &Progression, xp: i64, width: usize) -> Result<String, XpError> {
    let progress = engine.progress(xp)?;
    let filled = ((progress.percentage / 100.0) * width as f64).floor() as usize;
    let filled = filled.min(width);

    Ok(format!(
        "[{}{}] {}/{} XP ({:.1}%)",
        "#".repeat(filled),
        "-".repeat(width - filled),
        progress.current,
        progress.needed,
        progress.percentage
    ))
}

/// multi-line profile card for the terminal
pub fn render_profile(engine: &Progression, profile: &Profile) -> Result<String, XpError> {
    let level = engine.level_from_points(profile.xp)?;
    let rank = xp::rank_from_level(level)?;
    let name = profile.display_name.as_deref().unwrap_or(&profile.username);
    let flame = match xp::streak_intensity(profile.streak_count) {
        StreakIntensity::Low => "🔥",
        StreakIntensity::Medium => "🔥🔥",
        StreakIntensity::Intense => "🔥🔥🔥",
    };

    Ok(format!(
        "{} (@{})\n[{}] {}  Level {}  {} XP\n{}\n{} {} day streak · {} quests cleared",
        name,
        profile.username,
        rank,
        rank.label(),
        level,
        profile.xp,
        render_xp_bar(engine, profile.xp, BAR_WIDTH)?,
        flame,
        profile.streak_count,
        profile.total_quests_completed
    ))
}

pub fn render_leaderboard(entries: &[LeaderboardEntry]) -> String {
    if entries.is_empty() {
        return "No hunters yet.".to_string();
    }
    entries
        .iter()
        .map(|e| {
            format!(
                "{:>3}. [{}] {:<20} Lv {:>3}  {:>8} XP  🔥{}",
                e.position,
                e.hunter_rank,
                e.display_name.as_deref().unwrap_or(&e.username),
                e.level,
                e.xp,
                e.streak_count
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
