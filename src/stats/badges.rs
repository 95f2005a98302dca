use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub title: &'static str,
    pub icon: &'static str,
    pub threshold: u64,
}

/// Ordered by threshold.
pub const BADGES: &[Badge] = &[
    Badge { title: "First Step", icon: "🌱", threshold: 10 },
    Badge { title: "Warming Up", icon: "🔥", threshold: 50 },
    Badge { title: "Focused", icon: "🎯", threshold: 100 },
    Badge { title: "Deep Worker", icon: "⚡", threshold: 250 },
    Badge { title: "Unstoppable", icon: "🏆", threshold: 500 },
    Badge { title: "Legend", icon: "👑", threshold: 1000 },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BadgeProgress {
    pub badge: Badge,
    pub unlocked: bool,
    /// Fraction of the threshold reached, in `[0, 1]`.
    pub progress: f64,
    pub points_to_go: u64,
}

pub fn badge_progress(points: u64) -> Vec<BadgeProgress> {
    BADGES
        .iter()
        .map(|badge| {
            let unlocked = points >= badge.threshold;
            let progress = if unlocked || badge.threshold == 0 {
                1.0
            } else {
                (points as f64 / badge.threshold as f64).clamp(0.0, 1.0)
            };
            BadgeProgress {
                badge: *badge,
                unlocked,
                progress,
                points_to_go: badge.threshold.saturating_sub(points),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_are_ascending() {
        assert!(BADGES.windows(2).all(|pair| pair[0].threshold < pair[1].threshold));
    }

    #[test]
    fn unlocks_at_threshold() {
        let progress = badge_progress(50);

        assert!(progress[0].unlocked);
        assert!(progress[1].unlocked);
        assert!(!progress[2].unlocked);
        assert_eq!(progress[1].points_to_go, 0);
        assert_eq!(progress[2].points_to_go, 50);
        assert!((progress[2].progress - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_points_unlocks_nothing() {
        let progress = badge_progress(0);
        assert!(progress.iter().all(|p| !p.unlocked && p.progress == 0.0));
    }
}
