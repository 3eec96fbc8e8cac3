//! Piecewise linear scoring rule for one component

use super::Component;
use crate::utils::{ascending_score, descending_score};
use serde::{Deserialize, Serialize};

/// Which way the raw value is rewarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringDirection {
    /// Higher intake is better (fruit, vegetables, whole grains, ...)
    Adequacy,
    /// Lower intake is better (refined grains, added sugars, sodium, saturated fat)
    Moderation,
}

/// Thresholds for one component
///
/// `low` is always the worst bound and `high` the best one. For moderation
/// components `low` is therefore the numerically larger value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringRule {
    pub component: Component,
    pub low: f64,
    pub high: f64,
    pub direction: ScoringDirection,
    pub max_score: f64,
}

impl ScoringRule {
    pub const fn adequacy(component: Component, low: f64, high: f64, max_score: f64) -> Self {
        ScoringRule {
            component,
            low,
            high,
            direction: ScoringDirection::Adequacy,
            max_score,
        }
    }

    pub const fn moderation(component: Component, low: f64, high: f64, max_score: f64) -> Self {
        ScoringRule {
            component,
            low,
            high,
            direction: ScoringDirection::Moderation,
            max_score,
        }
    }

    /// Score a raw metric value; missing (or NaN) scores 0
    pub fn score(&self, value: Option<f64>) -> f64 {
        let Some(value) = value.filter(|v| !v.is_nan()) else {
            return 0.0;
        };

        match self.direction {
            ScoringDirection::Adequacy => ascending_score(value, self.low, self.high, self.max_score),
            ScoringDirection::Moderation => descending_score(value, self.low, self.high, self.max_score),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_missing_scores_zero() {
        let rule = ScoringRule::adequacy(Component::TotalFruit, 0.0, 0.8, 5.0);
        assert_eq!(rule.score(None), 0.0);
        assert_eq!(rule.score(Some(f64::NAN)), 0.0);
    }

    #[test]
    fn test_adequacy_at_cap() {
        let rule = ScoringRule::adequacy(Component::TotalFruit, 0.0, 0.8, 5.0);
        assert_eq!(rule.score(Some(0.8)), 5.0);
        assert_relative_eq!(rule.score(Some(0.2)), 1.25, epsilon = 1e-12);
    }

    #[test]
    fn test_moderation_bounds_and_midpoint() {
        let rule = ScoringRule::moderation(Component::RefinedGrains, 4.3, 1.8, 10.0);
        assert_eq!(rule.score(Some(4.3)), 0.0);
        assert_eq!(rule.score(Some(1.8)), 10.0);
        assert_relative_eq!(rule.score(Some(3.05)), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_infinite_values_clamp() {
        let adequacy = ScoringRule::adequacy(Component::FattyAcids, 1.2, 2.5, 10.0);
        assert_eq!(adequacy.score(Some(f64::INFINITY)), 10.0);

        let moderation = ScoringRule::moderation(Component::Sodium, 2.0, 1.1, 10.0);
        assert_eq!(moderation.score(Some(f64::INFINITY)), 0.0);
    }

    #[test]
    fn test_direction_serde_names() {
        let json = serde_json::to_string(&ScoringDirection::Moderation).unwrap();
        assert_eq!(json, "\"moderation\"");
    }
}
