use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::UnitMixError;
use crate::types::{with_metadata, ComputationOutput, SensitivityVariable};
use crate::unit_mix::capacity::CapacityTable;
use crate::unit_mix::model::{
    self, MarketObservation, ProjectConstraints, UnitAllocation, ValuationAssumptions,
};
use crate::unit_mix::optimizer;
use crate::UnitMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Market inputs the grid can sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarketVariable {
    StudioRent,
    OneBedroomRent,
    VacancyRate,
}

impl MarketVariable {
    fn parse(name: &str) -> UnitMixResult<Self> {
        match name {
            "studio_rent" => Ok(MarketVariable::StudioRent),
            "one_bedroom_rent" => Ok(MarketVariable::OneBedroomRent),
            "vacancy_rate" => Ok(MarketVariable::VacancyRate),
            other => Err(UnitMixError::InvalidInput {
                field: "variable".into(),
                reason: format!(
                    "Unknown market variable '{other}' (expected studio_rent, \
                     one_bedroom_rent or vacancy_rate)"
                ),
            }),
        }
    }

    fn apply(self, market: &mut MarketObservation, value: Decimal) {
        match self {
            MarketVariable::StudioRent => market.studio_rent = value,
            MarketVariable::OneBedroomRent => market.one_bedroom_rent = value,
            MarketVariable::VacancyRate => market.vacancy_rate = value,
        }
    }
}

/// Input for a 2-way NOI sensitivity grid over market variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixSensitivityInput {
    /// Base market observation; swept variables override its fields
    pub market: MarketObservation,
    #[serde(default = "ProjectConstraints::new_hope")]
    pub constraints: ProjectConstraints,
    #[serde(default)]
    pub capacity_table: CapacityTable,
    /// Fixed allocation to evaluate; when absent each cell re-optimizes
    /// the mix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<UnitAllocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation: Option<ValuationAssumptions>,
    /// Row variable (studio_rent, one_bedroom_rent or vacancy_rate)
    pub variable_1: SensitivityVariable,
    /// Column variable
    pub variable_2: SensitivityVariable,
}

/// Output of the 2-way NOI sensitivity grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixSensitivityOutput {
    pub variable_1_name: String,
    pub variable_2_name: String,
    pub variable_1_values: Vec<Decimal>,
    pub variable_2_values: Vec<Decimal>,
    /// matrix[i][j] = NOI at variable_1_values[i], variable_2_values[j]
    pub matrix: Vec<Vec<Decimal>>,
    /// NOI at the midpoint of both ranges
    pub base_case_value: Decimal,
    /// Position of the base case in the matrix (row, col)
    pub base_case_position: (usize, usize),
}

// ---------------------------------------------------------------------------
// Sweep helpers
// ---------------------------------------------------------------------------

/// Generate the sweep values for a sensitivity variable from min to max
/// with step.
fn generate_sweep_values(var: &SensitivityVariable) -> UnitMixResult<Vec<Decimal>> {
    if var.step <= Decimal::ZERO {
        return Err(UnitMixError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Step must be positive".into(),
        });
    }
    if var.min > var.max {
        return Err(UnitMixError::InvalidInput {
            field: format!("variable:{}", var.name),
            reason: "Min must be <= max".into(),
        });
    }

    let mut values = Vec::new();
    let mut current = var.min;
    while current <= var.max {
        values.push(current);
        current += var.step;
    }
    // Ensure max is included if step doesn't land exactly on it
    if let Some(&last) = values.last() {
        if last < var.max {
            values.push(var.max);
        }
    }

    Ok(values)
}

/// Find the closest index to a target value in a sorted list.
fn closest_index(values: &[Decimal], target: Decimal) -> usize {
    values
        .iter()
        .enumerate()
        .min_by_key(|(_, v)| (**v - target).abs())
        .map(|(i, _)| i)
        .unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Sweep two market variables and record NOI for every combination.
///
/// With a fixed allocation each cell is one model evaluation; without one,
/// each cell runs the full mix optimizer. Cells that fail to evaluate
/// (vacancy swept past 1, or no feasible mix) record zero and a warning
/// rather than aborting the grid.
pub fn mix_sensitivity(
    input: &MixSensitivityInput,
) -> UnitMixResult<ComputationOutput<MixSensitivityOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let var_1 = MarketVariable::parse(&input.variable_1.name)?;
    let var_2 = MarketVariable::parse(&input.variable_2.name)?;
    if var_1 == var_2 {
        return Err(UnitMixError::InvalidInput {
            field: "variable_2".into(),
            reason: "Both sweep variables name the same market input".into(),
        });
    }

    let v1_values = generate_sweep_values(&input.variable_1)?;
    let v2_values = generate_sweep_values(&input.variable_2)?;

    let mut matrix = Vec::with_capacity(v1_values.len());

    for v1 in &v1_values {
        let mut row = Vec::with_capacity(v2_values.len());
        for v2 in &v2_values {
            let mut market = input.market.clone();
            var_1.apply(&mut market, *v1);
            var_2.apply(&mut market, *v2);

            match cell_noi(input, &market) {
                Ok(Some(noi)) => row.push(noi),
                Ok(None) => {
                    warnings.push(format!("No feasible mix at ({v1}, {v2})"));
                    row.push(Decimal::ZERO);
                }
                Err(e) => {
                    warnings.push(format!("Evaluation failed at ({v1}, {v2}): {e}"));
                    row.push(Decimal::ZERO);
                }
            }
        }
        matrix.push(row);
    }

    let mid1 = (input.variable_1.min + input.variable_1.max) / dec!(2);
    let mid2 = (input.variable_2.min + input.variable_2.max) / dec!(2);
    let base_row = closest_index(&v1_values, mid1);
    let base_col = closest_index(&v2_values, mid2);
    let base_case_value = matrix[base_row][base_col];

    let output = MixSensitivityOutput {
        variable_1_name: input.variable_1.name.clone(),
        variable_2_name: input.variable_2.name.clone(),
        variable_1_values: v1_values,
        variable_2_values: v2_values,
        matrix,
        base_case_value,
        base_case_position: (base_row, base_col),
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "2-Way NOI Sensitivity Grid",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// NOI for one grid cell: fixed-allocation evaluation or per-cell
/// re-optimization.
fn cell_noi(
    input: &MixSensitivityInput,
    market: &MarketObservation,
) -> UnitMixResult<Option<Decimal>> {
    match &input.allocation {
        Some(allocation) => {
            let summary = model::evaluate(
                allocation,
                market,
                &input.constraints,
                &input.capacity_table,
                input.valuation.as_ref(),
            )?;
            Ok(Some(summary.net_operating_income))
        }
        None => {
            let best = optimizer::best_mix(
                market,
                &input.constraints,
                &input.capacity_table,
                input.valuation.as_ref(),
            )?;
            Ok(best.map(|(_, summary)| summary.net_operating_income))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
