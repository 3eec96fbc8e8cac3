//! Diet Scorer - Main coordinator for diet-quality scoring
//!
//! Scores each participant's intake against a [`ScoringStandard`], sums the
//! 13 components into the composite `hei_score` and classifies it into a
//! quality band. Includes both sequential and parallel (Rayon) implementations;
//! participants are independent, so both produce identical tables.

use crate::aggregation::ParticipantIntake;
use crate::metrics::{CategoryBands, Component, ScoringStandard};
use anyhow::{anyhow, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Ordinal diet-quality band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DietScoreCategory {
    Poor,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    Good,
    Unknown,
}

impl DietScoreCategory {
    pub const ALL: [DietScoreCategory; 4] = [
        DietScoreCategory::Poor,
        DietScoreCategory::NeedsImprovement,
        DietScoreCategory::Good,
        DietScoreCategory::Unknown,
    ];

    /// Classify a composite score; bands are closed on the upper end
    pub fn classify(score: Option<f64>, bands: &CategoryBands) -> Self {
        match score {
            Some(s) if s.is_nan() => DietScoreCategory::Unknown,
            Some(s) if s <= bands.poor_max => DietScoreCategory::Poor,
            Some(s) if s <= bands.needs_improvement_max => DietScoreCategory::NeedsImprovement,
            Some(_) => DietScoreCategory::Good,
            None => DietScoreCategory::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DietScoreCategory::Poor => "Poor",
            DietScoreCategory::NeedsImprovement => "Needs Improvement",
            DietScoreCategory::Good => "Good",
            DietScoreCategory::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for DietScoreCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DietScoreCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        DietScoreCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| anyhow!("Unknown diet score category '{}'", s))
    }
}

/// One row of the result table
#[derive(Debug, Clone, PartialEq)]
pub struct DietQualityResult {
    pub participant_id: String,
    pub total_diet_weight: Option<f64>,
    pub food_item_weight: Option<f64>,
    /// Component scores indexed by [`Component::index`]
    pub components: [f64; Component::COUNT],
    pub hei_score: Option<f64>,
    pub category: DietScoreCategory,
}

impl DietQualityResult {
    pub fn component(&self, component: Component) -> f64 {
        self.components[component.index()]
    }
}

/// Main diet scorer
pub struct DietScorer {
    standard: ScoringStandard,
}

impl Default for DietScorer {
    fn default() -> Self {
        Self::new(ScoringStandard::hei_2015())
    }
}

impl DietScorer {
    pub fn new(standard: ScoringStandard) -> Self {
        DietScorer { standard }
    }

    pub fn standard(&self) -> &ScoringStandard {
        &self.standard
    }

    /// Score a single participant (pure function of the intake)
    pub fn score_participant(&self, intake: &ParticipantIntake) -> DietQualityResult {
        let mut components = [0.0; Component::COUNT];
        for component in Component::ALL {
            let rule = self.standard.rule(component);
            components[component.index()] = rule.score(component.metric(intake));
        }

        let hei_score: f64 = components.iter().sum();
        let hei_score = Some(hei_score);

        DietQualityResult {
            participant_id: intake.participant_id.clone(),
            total_diet_weight: intake.totals.as_ref().and_then(|t| t.total_diet_weight),
            food_item_weight: intake.aggregate.as_ref().and_then(|a| a.food_item_weight),
            components,
            hei_score,
            category: DietScoreCategory::classify(hei_score, self.standard.bands()),
        }
    }

    /// Score all participants sequentially
    pub fn score_all(&self, intakes: &[ParticipantIntake]) -> Vec<DietQualityResult> {
        intakes.iter().map(|i| self.score_participant(i)).collect()
    }

    /// Score all participants IN PARALLEL
    ///
    /// Output order matches input order.
    pub fn score_all_parallel(&self, intakes: &[ParticipantIntake]) -> Vec<DietQualityResult> {
        intakes
            .par_iter()
            .map(|i| self.score_participant(i))
            .collect()
    }
}

/// Mean scores and band counts over a result table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreSummary {
    pub participants: usize,
    /// Mean per component column, rounded to one decimal
    pub component_means: Vec<(String, f64)>,
    pub mean_hei_score: f64,
    pub category_counts: Vec<(DietScoreCategory, usize)>,
}

impl ScoreSummary {
    pub fn from_results(results: &[DietQualityResult]) -> Self {
        let n = results.len();
        let mean = |sum: f64| if n == 0 { 0.0 } else { round1(sum / n as f64) };

        let component_means = Component::ALL
            .iter()
            .map(|&c| {
                let sum: f64 = results.iter().map(|r| r.component(c)).sum();
                (c.column().to_string(), mean(sum))
            })
            .collect();

        let score_sum: f64 = results.iter().filter_map(|r| r.hei_score).sum();

        let category_counts = DietScoreCategory::ALL
            .iter()
            .map(|&cat| (cat, results.iter().filter(|r| r.category == cat).count()))
            .collect();

        ScoreSummary {
            participants: n,
            component_means,
            mean_hei_score: mean(score_sum),
            category_counts,
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregation::{PersonAggregate, PersonTotalRecord};
    use crate::nutrients::{NutrientCategory, NutrientVector};
    use approx::assert_relative_eq;

    /// Intake with 1000 kcal so totals equal densities
    fn intake(densities: &[(NutrientCategory, f64)], totals: Option<PersonTotalRecord>) -> ParticipantIntake {
        let mut vector = NutrientVector::default();
        for category in NutrientCategory::ALL {
            vector.set(category, Some(0.0));
        }
        for &(category, value) in densities {
            vector.set(category, Some(value));
        }
        ParticipantIntake {
            participant_id: "p1".to_string(),
            aggregate: Some(PersonAggregate::new("p1".to_string(), vector, 1000.0, Some(3.5))),
            totals,
        }
    }

    fn person_totals(sodium_mg: f64, satfat_g: f64, energy_kcal: f64) -> PersonTotalRecord {
        PersonTotalRecord {
            participant_id: "p1".to_string(),
            sodium_mg: Some(sodium_mg),
            satfat_g: Some(satfat_g),
            energy_kcal: Some(energy_kcal),
            total_diet_weight: Some(12.0),
        }
    }

    /// Every component at or beyond its best bound
    fn ideal_intake() -> ParticipantIntake {
        intake(
            &[
                (NutrientCategory::FruitTotal, 0.8),
                (NutrientCategory::FruitOther, 0.4),
                (NutrientCategory::VegetableTotal, 1.1),
                (NutrientCategory::VegetableDarkGreen, 0.2),
                (NutrientCategory::GrainWhole, 1.5),
                (NutrientCategory::DairyTotal, 1.3),
                (NutrientCategory::ProteinTotal, 2.5),
                (NutrientCategory::ProteinSeafoodHigh, 0.8),
                (NutrientCategory::Oils, 5.0),
                (NutrientCategory::SolidFats, 2.0),
                (NutrientCategory::GrainRefined, 1.8),
                (NutrientCategory::AddedSugars, 6.5),
            ],
            // 1.1 g sodium per 1000 kcal, 8% energy from saturated fat
            Some(person_totals(2200.0, 2000.0 * 0.08 / 9.0, 2000.0)),
        )
    }

    #[test]
    fn test_classify_band_boundaries() {
        let bands = CategoryBands::default();
        assert_eq!(DietScoreCategory::classify(Some(0.0), &bands), DietScoreCategory::Poor);
        assert_eq!(DietScoreCategory::classify(Some(60.0), &bands), DietScoreCategory::Poor);
        assert_eq!(
            DietScoreCategory::classify(Some(60.01), &bands),
            DietScoreCategory::NeedsImprovement
        );
        assert_eq!(
            DietScoreCategory::classify(Some(80.0), &bands),
            DietScoreCategory::NeedsImprovement
        );
        assert_eq!(DietScoreCategory::classify(Some(85.0), &bands), DietScoreCategory::Good);
        assert_eq!(DietScoreCategory::classify(None, &bands), DietScoreCategory::Unknown);
        assert_eq!(
            DietScoreCategory::classify(Some(f64::NAN), &bands),
            DietScoreCategory::Unknown
        );
    }

    #[test]
    fn test_category_string_roundtrip() {
        for category in DietScoreCategory::ALL {
            assert_eq!(category.to_string().parse::<DietScoreCategory>().unwrap(), category);
        }
        assert!("Excellent".parse::<DietScoreCategory>().is_err());
    }

    #[test]
    fn test_ideal_diet_scores_100() {
        let result = DietScorer::default().score_participant(&ideal_intake());

        for component in Component::ALL {
            let max = ScoringStandard::hei_2015().rule(component).max_score;
            assert_relative_eq!(result.component(component), max, epsilon = 1e-9);
        }
        assert_relative_eq!(result.hei_score.unwrap(), 100.0, epsilon = 1e-9);
        assert_eq!(result.category, DietScoreCategory::Good);
        assert_eq!(result.total_diet_weight, Some(12.0));
        assert_eq!(result.food_item_weight, Some(3.5));
    }

    #[test]
    fn test_fruit_exactly_at_cap() {
        let result = DietScorer::default()
            .score_participant(&intake(&[(NutrientCategory::FruitTotal, 0.8)], None));
        assert_eq!(result.component(Component::TotalFruit), 5.0);
    }

    #[test]
    fn test_refined_grains_worst_and_midpoint() {
        let scorer = DietScorer::default();

        let worst = scorer.score_participant(&intake(&[(NutrientCategory::GrainRefined, 4.3)], None));
        assert_eq!(worst.component(Component::RefinedGrains), 0.0);

        let mid = scorer.score_participant(&intake(&[(NutrientCategory::GrainRefined, 3.05)], None));
        assert_relative_eq!(mid.component(Component::RefinedGrains), 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_zero_solid_fats_scores_zero_fatty_acid() {
        let result = DietScorer::default().score_participant(&intake(
            &[(NutrientCategory::Oils, 50.0), (NutrientCategory::SolidFats, 0.0)],
            None,
        ));
        assert_eq!(result.component(Component::FattyAcids), 0.0);
    }

    #[test]
    fn test_composite_85_is_good() {
        // Ideal diet minus the 10-point dairy and 5 points of whole grains
        let mut intake = ideal_intake();
        if let Some(aggregate) = intake.aggregate.as_mut() {
            aggregate.densities.set(NutrientCategory::DairyTotal, Some(0.0));
            aggregate.densities.set(NutrientCategory::GrainWhole, Some(0.75));
        }

        let result = DietScorer::default().score_participant(&intake);
        assert_relative_eq!(result.hei_score.unwrap(), 85.0, epsilon = 1e-9);
        assert_eq!(result.category, DietScoreCategory::Good);
    }

    #[test]
    fn test_totals_only_participant_scores_sodium_and_sat_fat() {
        let intake = ParticipantIntake {
            participant_id: "p2".to_string(),
            aggregate: None,
            totals: Some(person_totals(2200.0, 2000.0 * 0.08 / 9.0, 2000.0)),
        };

        let result = DietScorer::default().score_participant(&intake);

        for component in Component::ALL {
            let expected = match component {
                Component::Sodium | Component::SaturatedFats => 10.0,
                _ => 0.0,
            };
            assert_relative_eq!(result.component(component), expected, epsilon = 1e-9);
        }
        assert_relative_eq!(result.hei_score.unwrap(), 20.0, epsilon = 1e-9);
        assert_eq!(result.category, DietScoreCategory::Poor);
        assert_eq!(result.food_item_weight, None);
    }

    #[test]
    fn test_component_scores_within_bounds() {
        let scorer = DietScorer::default();
        let values = [-5.0, 0.0, 0.3, 1.0, 2.2, 7.5, 30.0, 1e6];

        for &v in &values {
            let densities: Vec<(NutrientCategory, f64)> =
                NutrientCategory::ALL.iter().map(|&c| (c, v)).collect();
            let result = scorer.score_participant(&intake(&densities, Some(person_totals(v * 1000.0, v, 1000.0))));

            for component in Component::ALL {
                let max = scorer.standard().rule(component).max_score;
                let score = result.component(component);
                assert!((0.0..=max).contains(&score), "{:?} = {} for v = {}", component, score, v);
            }
            let total = result.hei_score.unwrap();
            assert!((0.0..=100.0).contains(&total));
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let intakes: Vec<ParticipantIntake> = (0..50)
            .map(|i| {
                let mut intake = intake(
                    &[
                        (NutrientCategory::FruitTotal, i as f64 * 0.02),
                        (NutrientCategory::GrainRefined, i as f64 * 0.1),
                    ],
                    None,
                );
                intake.participant_id = format!("p{:03}", i);
                intake
            })
            .collect();

        let scorer = DietScorer::default();
        assert_eq!(scorer.score_all(&intakes), scorer.score_all_parallel(&intakes));
    }

    #[test]
    fn test_summary_means_and_counts() {
        let scorer = DietScorer::default();
        let results = scorer.score_all(&[ideal_intake(), intake(&[], None)]);
        let summary = ScoreSummary::from_results(&results);

        assert_eq!(summary.participants, 2);
        // Empty plate: only refined grains and added sugars earn points (20)
        assert_relative_eq!(summary.mean_hei_score, 60.0);
        let good = summary
            .category_counts
            .iter()
            .find(|(c, _)| *c == DietScoreCategory::Good)
            .map(|(_, n)| *n);
        assert_eq!(good, Some(1));
    }
}
