//! Nutrient categories of the food patterns equivalents reference
//!
//! Each category is one per-100g column of the reference table. The enum
//! fixes the column mapping so the aggregator and the component scorer agree
//! on names without passing strings around.

use serde::{Deserialize, Serialize};

/// Nutrient/food-group category carried by the reference table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NutrientCategory {
    FruitTotal,
    FruitJuice,
    FruitCitrusMelonBerry,
    FruitOther,
    VegetableTotal,
    VegetableDarkGreen,
    VegetableLegumes,
    GrainWhole,
    GrainRefined,
    DairyTotal,
    DairyMilk,
    DairyYogurt,
    DairyCheese,
    ProteinTotal,
    ProteinMeatPoultrySeafood,
    ProteinSeafoodHigh,
    ProteinSeafoodLow,
    SolidFats,
    AddedSugars,
    Oils,
}

impl NutrientCategory {
    /// All categories, in reference-table column order
    pub const ALL: [NutrientCategory; 20] = [
        NutrientCategory::FruitTotal,
        NutrientCategory::FruitJuice,
        NutrientCategory::FruitCitrusMelonBerry,
        NutrientCategory::FruitOther,
        NutrientCategory::VegetableTotal,
        NutrientCategory::VegetableDarkGreen,
        NutrientCategory::VegetableLegumes,
        NutrientCategory::GrainWhole,
        NutrientCategory::GrainRefined,
        NutrientCategory::DairyTotal,
        NutrientCategory::DairyMilk,
        NutrientCategory::DairyYogurt,
        NutrientCategory::DairyCheese,
        NutrientCategory::ProteinTotal,
        NutrientCategory::ProteinMeatPoultrySeafood,
        NutrientCategory::ProteinSeafoodHigh,
        NutrientCategory::ProteinSeafoodLow,
        NutrientCategory::SolidFats,
        NutrientCategory::AddedSugars,
        NutrientCategory::Oils,
    ];

    pub const COUNT: usize = Self::ALL.len();

    /// Column name in the reference table (per 100g)
    pub fn column(self) -> &'static str {
        match self {
            NutrientCategory::FruitTotal => "F_TOTAL",
            NutrientCategory::FruitJuice => "F_JUICE",
            NutrientCategory::FruitCitrusMelonBerry => "F_CITMLB",
            NutrientCategory::FruitOther => "F_OTHER",
            NutrientCategory::VegetableTotal => "V_TOTAL",
            NutrientCategory::VegetableDarkGreen => "V_DRKGR",
            NutrientCategory::VegetableLegumes => "V_LEGUMES",
            NutrientCategory::GrainWhole => "G_WHOLE",
            NutrientCategory::GrainRefined => "G_REFINED",
            NutrientCategory::DairyTotal => "D_TOTAL",
            NutrientCategory::DairyMilk => "D_MILK",
            NutrientCategory::DairyYogurt => "D_YOGURT",
            NutrientCategory::DairyCheese => "D_CHEESE",
            NutrientCategory::ProteinTotal => "PF_TOTAL",
            NutrientCategory::ProteinMeatPoultrySeafood => "PF_MPS_TOTAL",
            NutrientCategory::ProteinSeafoodHigh => "PF_SEAFD_HI",
            NutrientCategory::ProteinSeafoodLow => "PF_SEAFD_LOW",
            NutrientCategory::SolidFats => "SOLID_FATS",
            NutrientCategory::AddedSugars => "ADD_SUGARS",
            NutrientCategory::Oils => "OILS",
        }
    }

    /// Column name of the per-participant total after aggregation
    pub fn total_column(self) -> String {
        format!("{}_TOT", self.column())
    }

    /// Position in [`NutrientCategory::ALL`], used to index fixed-size arrays
    pub fn index(self) -> usize {
        self as usize
    }
}

/// One value per nutrient category
///
/// `None` marks a missing value (e.g. density with no energy to normalize by).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NutrientVector(pub [Option<f64>; NutrientCategory::COUNT]);

impl NutrientVector {
    pub fn get(&self, category: NutrientCategory) -> Option<f64> {
        self.0[category.index()]
    }

    pub fn set(&mut self, category: NutrientCategory, value: Option<f64>) {
        self.0[category.index()] = value;
    }

    /// Sum of two categories; missing if either side is missing
    pub fn sum_of(&self, a: NutrientCategory, b: NutrientCategory) -> Option<f64> {
        Some(self.get(a)? + self.get(b)?)
    }
}
