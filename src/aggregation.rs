//! Nutrient Aggregator
//!
//! Joins per-item consumption records to the nutrient reference by food code,
//! scales every per-100g equivalent by grams consumed, sums per participant and
//! normalizes the totals to a per-1000-kcal density.
//!
//! **Join policy**: consumption rows whose food code has no reference row are
//! excluded (inner-join semantics). The excluded count is logged and returned
//! in [`AggregationSummary`].
//!
//! Day-level sodium and saturated fat come from the person totals table, not
//! from the item join, so those records are collected separately and merged by
//! participant id in [`merge_intakes`].

use crate::data::{DietData, REFERENCE_KEY_COL};
use crate::error::PipelineError;
use crate::nutrients::{NutrientCategory, NutrientVector};
use crate::utils::{f64_values, id_values, normalize_id_column, string_values};
use anyhow::{Context, Result};
use polars::prelude::*;
use rustc_hash::FxHashSet;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const ENERGY_TOTAL: &str = "energy_total";
const MATCH_FLAG: &str = "__reference_match";

/// Per-participant nutrient totals and densities
#[derive(Debug, Clone, PartialEq)]
pub struct PersonAggregate {
    pub participant_id: String,
    /// Summed scaled amounts per category
    pub totals: NutrientVector,
    /// Summed energy of all matched items (kcal)
    pub energy_kcal: f64,
    /// Summed per-item survey weight
    pub food_item_weight: Option<f64>,
    /// Totals per 1000 kcal; missing when energy is not positive
    pub densities: NutrientVector,
}

impl PersonAggregate {
    /// Build from summed totals, deriving densities
    pub fn new(
        participant_id: String,
        totals: NutrientVector,
        energy_kcal: f64,
        food_item_weight: Option<f64>,
    ) -> Self {
        let mut densities = NutrientVector::default();
        for category in NutrientCategory::ALL {
            densities.set(category, per_1000_kcal(totals.get(category), energy_kcal));
        }

        PersonAggregate {
            participant_id,
            totals,
            energy_kcal,
            food_item_weight,
            densities,
        }
    }

    pub fn density(&self, category: NutrientCategory) -> Option<f64> {
        self.densities.get(category)
    }

    /// Oils over solid fats; undefined when solid fats density is exactly 0
    pub fn fatty_acid_ratio(&self) -> Option<f64> {
        let solid_fats = self.density(NutrientCategory::SolidFats)?;
        if solid_fats == 0.0 {
            return None;
        }
        Some(self.density(NutrientCategory::Oils)? / solid_fats)
    }
}

/// Density of `amount` per 1000 kcal of `energy_kcal`
pub fn per_1000_kcal(amount: Option<f64>, energy_kcal: f64) -> Option<f64> {
    if energy_kcal.is_nan() || energy_kcal <= 0.0 {
        return None;
    }
    amount.map(|a| a / (energy_kcal / 1000.0))
}

/// Day-level intake totals for one participant
#[derive(Debug, Clone, PartialEq)]
pub struct PersonTotalRecord {
    pub participant_id: String,
    pub sodium_mg: Option<f64>,
    pub satfat_g: Option<f64>,
    pub energy_kcal: Option<f64>,
    pub total_diet_weight: Option<f64>,
}

impl PersonTotalRecord {
    fn energy(&self) -> Option<f64> {
        self.energy_kcal.filter(|e| *e > 0.0)
    }

    /// Sodium per 1000 kcal, in grams (mg per kcal)
    pub fn sodium_density(&self) -> Option<f64> {
        Some(self.sodium_mg? / self.energy()?)
    }

    /// Percent of energy from saturated fat (9 kcal per gram)
    pub fn saturated_fat_pct(&self) -> Option<f64> {
        Some(self.satfat_g? * 9.0 / self.energy()? * 100.0)
    }
}

/// Everything the component scorer needs for one participant
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantIntake {
    pub participant_id: String,
    pub aggregate: Option<PersonAggregate>,
    pub totals: Option<PersonTotalRecord>,
}

/// Row accounting for the item join
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AggregationSummary {
    pub consumption_rows: usize,
    pub matched_rows: usize,
    pub dropped_rows: usize,
    pub participants: usize,
}

/// Result of the aggregation phase
#[derive(Debug, Clone)]
pub struct NutrientAggregation {
    /// One aggregate per participant, ordered by participant id
    pub aggregates: Vec<PersonAggregate>,
    pub summary: AggregationSummary,
}

/// Aggregate item-level consumption into per-participant densities
///
/// # Errors
/// [`PipelineError::EmptyJoin`] when no participant survives the join.
pub fn aggregate_nutrients(data: &DietData) -> Result<NutrientAggregation> {
    let mut consumption = data.consumption.clone();
    normalize_id_column(&mut consumption, "participant_id", "consumption")?;

    let consumption = consumption.lazy().select([
        col("participant_id").cast(DataType::String),
        col("food_code").cast(DataType::Int64),
        col("grams_consumed").cast(DataType::Float64),
        col("energy_kcal").cast(DataType::Float64),
        col("food_item_weight").cast(DataType::Float64),
    ]);

    let mut reference_exprs = vec![
        col(REFERENCE_KEY_COL).cast(DataType::Int64).alias("food_code"),
        lit(true).alias(MATCH_FLAG),
    ];
    reference_exprs.extend(
        NutrientCategory::ALL
            .iter()
            .map(|c| col(c.column()).cast(DataType::Float64)),
    );
    let reference = data.reference.clone().lazy().select(reference_exprs);

    // Left join keeps unmatched rows visible long enough to count them
    let joined = consumption
        .join(
            reference,
            [col("food_code")],
            [col("food_code")],
            JoinArgs::new(JoinType::Left),
        )
        .collect()
        .with_context(|| "Failed to join consumption records with nutrient reference")?;

    // Duplicate reference food codes fan out joined rows; count the input instead
    let consumption_rows = data.consumption.height();
    let dropped_rows = joined.column(MATCH_FLAG)?.null_count();
    let matched_rows = consumption_rows - dropped_rows;

    if dropped_rows > 0 {
        warn!(
            "Dropped {} of {} consumption records with no reference food code",
            dropped_rows, consumption_rows
        );
    }

    let mut aggs: Vec<Expr> = NutrientCategory::ALL
        .iter()
        .map(|c| {
            (col(c.column()) * col("grams_consumed") / lit(100.0))
                .sum()
                .alias(c.total_column())
        })
        .collect();
    aggs.push(col("energy_kcal").sum().alias(ENERGY_TOTAL));
    aggs.push(col("food_item_weight").sum().alias("food_item_weight"));

    let person_level = joined
        .lazy()
        .filter(
            col(MATCH_FLAG)
                .is_not_null()
                .and(col("participant_id").is_not_null()),
        )
        .group_by([col("participant_id")])
        .agg(aggs)
        .collect()
        .with_context(|| "Failed to aggregate nutrients by participant")?;

    let mut aggregates = extract_aggregates(&person_level)?;
    aggregates.sort_by(|a, b| compare_participant_ids(&a.participant_id, &b.participant_id));

    if aggregates.is_empty() {
        return Err(PipelineError::EmptyJoin.into());
    }

    let summary = AggregationSummary {
        consumption_rows,
        matched_rows,
        dropped_rows,
        participants: aggregates.len(),
    };

    info!(
        "Aggregated {} matched records into {} participants",
        matched_rows,
        aggregates.len()
    );

    Ok(NutrientAggregation { aggregates, summary })
}

fn extract_aggregates(person_level: &DataFrame) -> Result<Vec<PersonAggregate>> {
    const CONTEXT: &str = "person-level aggregates";

    let ids = string_values(person_level, "participant_id", CONTEXT)?;
    let energy = f64_values(person_level, ENERGY_TOTAL, CONTEXT)?;
    let weights = f64_values(person_level, "food_item_weight", CONTEXT)?;

    let category_totals: Vec<Vec<Option<f64>>> = NutrientCategory::ALL
        .iter()
        .map(|c| f64_values(person_level, &c.total_column(), CONTEXT))
        .collect::<Result<_>>()?;

    let aggregates = ids
        .into_iter()
        .enumerate()
        .filter_map(|(row, id)| {
            let id = id?;
            let mut totals = NutrientVector::default();
            for category in NutrientCategory::ALL {
                totals.set(category, category_totals[category.index()][row]);
            }
            Some(PersonAggregate::new(
                id,
                totals,
                energy[row].unwrap_or(0.0),
                weights[row],
            ))
        })
        .collect();

    Ok(aggregates)
}

/// Collect person totals, keeping the first row per participant
pub fn collect_person_totals(data: &DietData) -> Result<Vec<PersonTotalRecord>> {
    const CONTEXT: &str = "person totals";
    let df = &data.person_totals;

    let ids = id_values(df, "participant_id", CONTEXT)?;
    let sodium = f64_values(df, "sodium_mg", CONTEXT)?;
    let satfat = f64_values(df, "satfat_g", CONTEXT)?;
    let energy = f64_values(df, "energy_kcal", CONTEXT)?;
    let weight = f64_values(df, "total_diet_weight", CONTEXT)?;

    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut duplicates = 0usize;
    let mut records = Vec::with_capacity(ids.len());

    for (row, id) in ids.into_iter().enumerate() {
        let Some(id) = id else {
            debug!("Skipping person totals row {} without participant id", row);
            continue;
        };
        if !seen.insert(id.clone()) {
            duplicates += 1;
            continue;
        }
        records.push(PersonTotalRecord {
            participant_id: id,
            sodium_mg: sodium[row],
            satfat_g: satfat[row],
            energy_kcal: energy[row],
            total_diet_weight: weight[row],
        });
    }

    if duplicates > 0 {
        warn!("Ignored {} duplicate participant rows in person totals", duplicates);
    }

    Ok(records)
}

/// Order participant ids numerically when both are integers, textually otherwise
///
/// Numeric ids sort ahead of non-numeric ones.
pub fn compare_participant_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<i64>(), b.parse::<i64>()) {
        (Ok(x), Ok(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// Union of aggregates and person totals, ordered by participant id
///
/// Participants present only in the totals table still get an intake (with
/// no aggregate) so their sodium and saturated-fat components are scored.
pub fn merge_intakes(
    aggregates: Vec<PersonAggregate>,
    totals: Vec<PersonTotalRecord>,
) -> Vec<ParticipantIntake> {
    let mut merged: BTreeMap<String, ParticipantIntake> = BTreeMap::new();

    for aggregate in aggregates {
        let id = aggregate.participant_id.clone();
        merged
            .entry(id.clone())
            .or_insert_with(|| ParticipantIntake {
                participant_id: id,
                aggregate: None,
                totals: None,
            })
            .aggregate = Some(aggregate);
    }

    for record in totals {
        let id = record.participant_id.clone();
        merged
            .entry(id.clone())
            .or_insert_with(|| ParticipantIntake {
                participant_id: id,
                aggregate: None,
                totals: None,
            })
            .totals = Some(record);
    }

    let mut intakes: Vec<ParticipantIntake> = merged.into_values().collect();
    intakes.sort_by(|a, b| compare_participant_ids(&a.participant_id, &b.participant_id));
    intakes
}
