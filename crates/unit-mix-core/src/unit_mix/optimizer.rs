use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::types::{with_metadata, ComputationOutput, Money};
use crate::unit_mix::capacity::CapacityTable;
use crate::unit_mix::model::{
    self, FinancialSummary, MarketObservation, ProjectConstraints, UnitAllocation,
    ValuationAssumptions,
};
use crate::UnitMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Input for the NOI-maximizing mix search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MixOptimizerInput {
    pub market: MarketObservation,
    #[serde(default = "ProjectConstraints::new_hope")]
    pub constraints: ProjectConstraints,
    #[serde(default)]
    pub capacity_table: CapacityTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation: Option<ValuationAssumptions>,
    /// Also return NOI for every feasible candidate, for charting
    #[serde(default)]
    pub include_frontier: bool,
}

/// One feasible candidate on the NOI frontier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrontierPoint {
    pub studio_count: u32,
    pub one_bedroom_count: u32,
    pub net_operating_income: Money,
}

/// Search outcome. Infeasibility is a value, not a fault: an interactive
/// caller shows "no feasible mix" instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MixOutcome {
    Optimal {
        allocation: UnitAllocation,
        summary: FinancialSummary,
    },
    Infeasible {
        reason: String,
    },
}

/// Complete optimizer output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixOptimizerOutput {
    #[serde(flatten)]
    pub outcome: MixOutcome,
    pub candidates_evaluated: u32,
    pub candidates_rejected: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frontier: Vec<FrontierPoint>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Search every full-program allocation for the NOI maximum.
pub fn optimize_mix(
    input: &MixOptimizerInput,
) -> UnitMixResult<ComputationOutput<MixOptimizerOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let mut best: Option<(UnitAllocation, FinancialSummary)> = None;
    let mut frontier: Vec<FrontierPoint> = Vec::new();
    let mut candidates_evaluated = 0u32;
    let mut candidates_rejected = 0u32;

    // One-dimensional scan: one_bedroom_count is determined by the unit-sum
    // constraint, so studio_count alone spans the search space.
    for studio_count in 0..=input.constraints.total_units {
        let allocation = UnitAllocation {
            studio_count,
            one_bedroom_count: input.constraints.total_units - studio_count,
        };

        let used_floor_area = Decimal::from(allocation.studio_count)
            * input.constraints.studio_area_sq_ft
            + Decimal::from(allocation.one_bedroom_count)
                * input.constraints.one_bedroom_area_sq_ft;

        // Strict inequality: a mix exactly at the envelope is feasible
        if used_floor_area > input.constraints.total_floor_area_sq_ft {
            candidates_rejected += 1;
            continue;
        }

        let summary = model::evaluate(
            &allocation,
            &input.market,
            &input.constraints,
            &input.capacity_table,
            input.valuation.as_ref(),
        )?;
        candidates_evaluated += 1;

        if input.include_frontier {
            frontier.push(FrontierPoint {
                studio_count: allocation.studio_count,
                one_bedroom_count: allocation.one_bedroom_count,
                net_operating_income: summary.net_operating_income,
            });
        }

        // Strict improvement only: ties keep the lowest studio_count seen
        let improves = best.as_ref().is_none_or(|(_, incumbent)| {
            summary.net_operating_income > incumbent.net_operating_income
        });
        if improves {
            best = Some((allocation, summary));
        }
    }

    let outcome = match best {
        Some((allocation, summary)) => MixOutcome::Optimal {
            allocation,
            summary,
        },
        None => {
            warnings.push("No allocation fits the floor-area envelope".into());
            MixOutcome::Infeasible {
                reason: format!(
                    "No {}-unit mix fits within {} sq ft",
                    input.constraints.total_units, input.constraints.total_floor_area_sq_ft
                ),
            }
        }
    };

    let output = MixOptimizerOutput {
        outcome,
        candidates_evaluated,
        candidates_rejected,
        frontier,
    };

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Unit-Mix NOI Optimization (Exhaustive Search)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Bare search without the output envelope: `None` means no feasible mix.
/// Used by the sensitivity grid, which re-optimizes per cell.
pub fn best_mix(
    market: &MarketObservation,
    constraints: &ProjectConstraints,
    table: &CapacityTable,
    valuation: Option<&ValuationAssumptions>,
) -> UnitMixResult<Option<(UnitAllocation, FinancialSummary)>> {
    let mut best: Option<(UnitAllocation, FinancialSummary)> = None;

    for studio_count in 0..=constraints.total_units {
        let allocation = UnitAllocation {
            studio_count,
            one_bedroom_count: constraints.total_units - studio_count,
        };

        let used_floor_area = Decimal::from(allocation.studio_count)
            * constraints.studio_area_sq_ft
            + Decimal::from(allocation.one_bedroom_count) * constraints.one_bedroom_area_sq_ft;

        if used_floor_area > constraints.total_floor_area_sq_ft {
            continue;
        }

        let summary = model::evaluate(&allocation, market, constraints, table, valuation)?;

        let improves = best.as_ref().is_none_or(|(_, incumbent)| {
            summary.net_operating_income > incumbent.net_operating_income
        });
        if improves {
            best = Some((allocation, summary));
        }
    }

    Ok(best)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
