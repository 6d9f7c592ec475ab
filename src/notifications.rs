use serde::{Deserialize, Serialize};

use crate::xp::ProgressionChange;

/// level-up banner surfaced to the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Celebration {
    pub title: String,
    pub body: String,
    pub rank_color: String,
}

pub fn level_up(change: &ProgressionChange) -> Option<Celebration> {
    if !change.leveled_up {
        return None;
    }

    let title = format!("🎉 Level Up! Level {}", change.new_level);
    let body = if change.rank_changed {
        format!(
            "Rank up! {} → {}. You are now an {}.",
            change.old_rank,
            change.new_rank,
            change.new_rank.label()
        )
    } else {
        format!("You reached level {}. Keep hunting!", change.new_level)
    };

    Some(Celebration {
        title,
        body,
        rank_color: change.new_rank.color().to_string(),
    })
}

pub fn quest_complete(title: &str, xp_earned: i64, streak: u32) -> String {
    let streak_msg = if streak > 1 {
        format!(" 🔥 {} day streak", streak)
    } else {
        String::new()
    };
    format!("Quest cleared: {} +{} XP!{}", title, xp_earned, streak_msg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HunterRank;

    fn change(old_level: u32, new_level: u32, old_rank: HunterRank, new_rank: HunterRank) -> ProgressionChange {
        ProgressionChange {
            leveled_up: new_level > old_level,
            old_level,
            new_level,
            old_rank,
            new_rank,
            rank_changed: old_rank != new_rank,
        }
    }

    #[test]
    fn test_no_celebration_without_level_up() {
        assert!(level_up(&change(3, 3, HunterRank::E, HunterRank::E)).is_none());
    }

    #[test]
    fn test_level_up_same_rank() {
        let c = level_up(&change(2, 3, HunterRank::E, HunterRank::E)).unwrap();
        assert_eq!(c.title, "🎉 Level Up! Level 3");
        assert!(!c.body.contains("Rank up"));
        assert_eq!(c.rank_color, "#808080");
    }

    #[test]
    fn test_level_up_with_rank_change() {
        let c = level_up(&change(4, 5, HunterRank::E, HunterRank::D)).unwrap();
        assert!(c.body.contains("E → D"));
        assert!(c.body.contains("D-Rank Hunter"));
        assert_eq!(c.rank_color, "#22c55e");
    }

    #[test]
    fn test_quest_complete_message() {
        assert_eq!(quest_complete("Read", 10, 1), "Quest cleared: Read +10 XP!");
        assert_eq!(
            quest_complete("Read", 35, 4),
            "Quest cleared: Read +35 XP! 🔥 4 day streak"
        );
    }
}
