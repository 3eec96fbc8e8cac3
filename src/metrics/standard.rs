//! Scoring standard: the threshold table and category bands
//!
//! The HEI-2015 table is the default. A replacement can be loaded from JSON
//! (same shape as the serialized default) and is validated before use.

use super::{Component, ScoringRule};
use crate::error::PipelineError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Composite cut points for the ordinal quality bands
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryBands {
    /// Scores up to and including this value are "Poor"
    pub poor_max: f64,
    /// Scores above `poor_max` up to and including this value are "Needs Improvement"
    pub needs_improvement_max: f64,
}

impl Default for CategoryBands {
    fn default() -> Self {
        CategoryBands {
            poor_max: 60.0,
            needs_improvement_max: 80.0,
        }
    }
}

/// Immutable threshold table handed to the scorer at construction
///
/// Every way of building one, serde included, goes through validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStandard")]
pub struct ScoringStandard {
    /// One rule per component, ordered as [`Component::ALL`] after validation
    rules: Vec<ScoringRule>,
    bands: CategoryBands,
}

/// Unvalidated JSON shape of a standard
#[derive(Deserialize)]
struct RawStandard {
    rules: Vec<ScoringRule>,
    #[serde(default)]
    bands: CategoryBands,
}

impl TryFrom<RawStandard> for ScoringStandard {
    type Error = anyhow::Error;

    fn try_from(raw: RawStandard) -> Result<Self> {
        ScoringStandard::new(raw.rules, raw.bands)
    }
}

const HEI_2015_RULES: [ScoringRule; 13] = [
    ScoringRule::adequacy(Component::TotalFruit, 0.0, 0.8, 5.0),
    ScoringRule::adequacy(Component::WholeFruit, 0.0, 0.4, 5.0),
    ScoringRule::adequacy(Component::TotalVegetables, 0.0, 1.1, 5.0),
    ScoringRule::adequacy(Component::GreensAndBeans, 0.0, 0.2, 5.0),
    ScoringRule::adequacy(Component::WholeGrains, 0.0, 1.5, 10.0),
    ScoringRule::adequacy(Component::Dairy, 0.0, 1.3, 10.0),
    ScoringRule::adequacy(Component::TotalProtein, 0.0, 2.5, 5.0),
    ScoringRule::adequacy(Component::SeafoodPlantProtein, 0.0, 0.8, 5.0),
    ScoringRule::adequacy(Component::FattyAcids, 1.2, 2.5, 10.0),
    ScoringRule::moderation(Component::RefinedGrains, 4.3, 1.8, 10.0),
    ScoringRule::moderation(Component::AddedSugars, 26.0, 6.5, 10.0),
    ScoringRule::moderation(Component::Sodium, 2.0, 1.1, 10.0),
    ScoringRule::moderation(Component::SaturatedFats, 16.0, 8.0, 10.0),
];

impl Default for ScoringStandard {
    fn default() -> Self {
        Self::hei_2015()
    }
}

impl ScoringStandard {
    /// Healthy Eating Index 2015 thresholds
    pub fn hei_2015() -> Self {
        ScoringStandard {
            rules: HEI_2015_RULES.to_vec(),
            bands: CategoryBands::default(),
        }
    }

    /// Build from rules in any order, validating completeness and bounds
    pub fn new(rules: Vec<ScoringRule>, bands: CategoryBands) -> Result<Self> {
        let mut standard = ScoringStandard { rules, bands };
        standard.validate()?;
        Ok(standard)
    }

    /// Load standard from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read scoring standard: {:?}", path))?;

        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).with_context(|| "Failed to parse scoring standard JSON")
    }

    pub fn rules(&self) -> &[ScoringRule] {
        &self.rules
    }

    pub fn bands(&self) -> &CategoryBands {
        &self.bands
    }

    /// Rule for a component (rules are stored in component order)
    pub fn rule(&self, component: Component) -> &ScoringRule {
        &self.rules[component.index()]
    }

    /// Highest attainable composite
    pub fn max_total(&self) -> f64 {
        self.rules.iter().map(|r| r.max_score).sum()
    }

    fn validate(&mut self) -> Result<()> {
        let invalid = |reason: String| -> anyhow::Error { PipelineError::InvalidStandard(reason).into() };

        let mut ordered: [Option<ScoringRule>; Component::COUNT] = [None; Component::COUNT];
        for rule in &self.rules {
            let slot = &mut ordered[rule.component.index()];
            if slot.is_some() {
                return Err(invalid(format!("component {:?} listed twice", rule.component)));
            }
            if !(rule.low.is_finite() && rule.high.is_finite()) {
                return Err(invalid(format!("{:?}: bounds must be finite", rule.component)));
            }
            if rule.low == rule.high {
                return Err(invalid(format!("{:?}: low and high are equal", rule.component)));
            }
            if !(rule.max_score > 0.0) {
                return Err(invalid(format!("{:?}: max_score must be positive", rule.component)));
            }
            *slot = Some(*rule);
        }

        let missing: Vec<Component> = Component::ALL
            .iter()
            .copied()
            .filter(|c| ordered[c.index()].is_none())
            .collect();
        if !missing.is_empty() {
            return Err(invalid(format!("missing components {:?}", missing)));
        }

        if self.bands.poor_max >= self.bands.needs_improvement_max {
            return Err(invalid("band cut points must increase".to_string()));
        }

        self.rules = ordered.into_iter().flatten().collect();
        Ok(())
    }
}
