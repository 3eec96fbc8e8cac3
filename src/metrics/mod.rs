//! Component metrics for diet-quality scoring
//!
//! Each of the 13 HEI-2015 components maps one participant's intake to a raw
//! metric value (a density, ratio or percent of energy). The thresholds that
//! turn the metric into points live in a [`ScoringStandard`], not here.

pub mod rule;
pub mod standard;

pub use rule::{ScoringDirection, ScoringRule};
pub use standard::{CategoryBands, ScoringStandard};

use crate::aggregation::ParticipantIntake;
use crate::nutrients::NutrientCategory;
use serde::{Deserialize, Serialize};

/// The 13 scored components
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    TotalFruit,
    WholeFruit,
    TotalVegetables,
    GreensAndBeans,
    WholeGrains,
    Dairy,
    TotalProtein,
    SeafoodPlantProtein,
    FattyAcids,
    RefinedGrains,
    AddedSugars,
    Sodium,
    SaturatedFats,
}

/// Which input table a component reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricSource {
    /// Per-item join, aggregated per participant
    ItemAggregate,
    /// Day-level person totals
    PersonTotals,
}

impl Component {
    /// All components, in output column order
    pub const ALL: [Component; 13] = [
        Component::TotalFruit,
        Component::WholeFruit,
        Component::TotalVegetables,
        Component::GreensAndBeans,
        Component::WholeGrains,
        Component::Dairy,
        Component::TotalProtein,
        Component::SeafoodPlantProtein,
        Component::FattyAcids,
        Component::RefinedGrains,
        Component::AddedSugars,
        Component::Sodium,
        Component::SaturatedFats,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Result table column
    pub fn column(self) -> &'static str {
        match self {
            Component::TotalFruit => "hei_total_fruit",
            Component::WholeFruit => "hei_whole_fruit",
            Component::TotalVegetables => "hei_total_veg",
            Component::GreensAndBeans => "hei_greens_beans",
            Component::WholeGrains => "hei_whole_grains",
            Component::Dairy => "hei_dairy",
            Component::TotalProtein => "hei_total_protein",
            Component::SeafoodPlantProtein => "hei_sea_plant_protein",
            Component::FattyAcids => "hei_fatty_acid",
            Component::RefinedGrains => "hei_refined_grains",
            Component::AddedSugars => "hei_added_sugars",
            Component::Sodium => "hei_sodium",
            Component::SaturatedFats => "hei_sat_fats",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Component::TotalFruit => "Total fruit",
            Component::WholeFruit => "Whole fruit",
            Component::TotalVegetables => "Total vegetables",
            Component::GreensAndBeans => "Greens & beans",
            Component::WholeGrains => "Whole grains",
            Component::Dairy => "Dairy",
            Component::TotalProtein => "Total protein foods",
            Component::SeafoodPlantProtein => "Seafood & plant protein",
            Component::FattyAcids => "Fatty acid ratio",
            Component::RefinedGrains => "Refined grains",
            Component::AddedSugars => "Added sugars",
            Component::Sodium => "Sodium",
            Component::SaturatedFats => "Saturated fat",
        }
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn source(self) -> MetricSource {
        match self {
            Component::Sodium | Component::SaturatedFats => MetricSource::PersonTotals,
            _ => MetricSource::ItemAggregate,
        }
    }

    /// Raw metric value for this component, `None` when undefined
    pub fn metric(self, intake: &ParticipantIntake) -> Option<f64> {
        use NutrientCategory as N;

        match self.source() {
            MetricSource::PersonTotals => {
                let totals = intake.totals.as_ref()?;
                match self {
                    Component::Sodium => totals.sodium_density(),
                    _ => totals.saturated_fat_pct(),
                }
            }
            MetricSource::ItemAggregate => {
                let aggregate = intake.aggregate.as_ref()?;
                let densities = &aggregate.densities;
                match self {
                    Component::TotalFruit => densities.get(N::FruitTotal),
                    Component::WholeFruit => densities.get(N::FruitOther),
                    Component::TotalVegetables => densities.get(N::VegetableTotal),
                    Component::GreensAndBeans => {
                        densities.sum_of(N::VegetableDarkGreen, N::VegetableLegumes)
                    }
                    Component::WholeGrains => densities.get(N::GrainWhole),
                    Component::Dairy => densities.get(N::DairyTotal),
                    Component::TotalProtein => densities.get(N::ProteinTotal),
                    Component::SeafoodPlantProtein => {
                        densities.sum_of(N::ProteinSeafoodHigh, N::ProteinSeafoodLow)
                    }
                    Component::FattyAcids => aggregate.fatty_acid_ratio(),
                    Component::RefinedGrains => densities.get(N::GrainRefined),
                    Component::AddedSugars => densities.get(N::AddedSugars),
                    Component::Sodium | Component::SaturatedFats => None,
                }
            }
        }
    }
}
