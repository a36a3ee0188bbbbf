use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::UnitMixError;
use crate::types::{with_metadata, ComputationOutput, Money, Rate, SqFt};
use crate::unit_mix::capacity::{CapacityTable, UnitType};
use crate::UnitMixResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Physical and cost envelope of the development. Fixed per project,
/// never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConstraints {
    pub total_units: u32,
    pub total_floor_area_sq_ft: SqFt,
    pub studio_area_sq_ft: SqFt,
    pub one_bedroom_area_sq_ft: SqFt,
    pub fixed_annual_cost: Money,
    pub variable_monthly_cost_per_studio: Money,
    pub variable_monthly_cost_per_one_bedroom: Money,
}

impl ProjectConstraints {
    /// The canonical New Hope 85-unit Class B program.
    pub fn new_hope() -> Self {
        ProjectConstraints {
            total_units: 85,
            total_floor_area_sq_ft: dec!(80000),
            studio_area_sq_ft: dec!(800),
            one_bedroom_area_sq_ft: dec!(1200),
            fixed_annual_cost: dec!(320000),
            variable_monthly_cost_per_studio: dec!(720),
            variable_monthly_cost_per_one_bedroom: dec!(1000),
        }
    }
}

/// Observed market conditions for one scenario. Supplied per evaluation,
/// not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketObservation {
    pub studio_rent: Money,
    pub one_bedroom_rent: Money,
    /// Fraction in [0, 1] (0.10 = 10%)
    pub vacancy_rate: Rate,
}

/// A candidate unit mix. Counts need not sum to the program's total; the
/// model evaluates any allocation so callers can explore outside the
/// feasible region. Feasibility is the optimizer's concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitAllocation {
    pub studio_count: u32,
    pub one_bedroom_count: u32,
}

/// Optional valuation inputs for the implied-value / DSCR extension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValuationAssumptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_rate: Option<Rate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_debt_service: Option<Money>,
}

/// Annual financials for one allocation under one market observation.
/// Derived, never stored; full decimal precision is kept until display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    pub used_floor_area_sq_ft: SqFt,
    pub studio_capacity: u32,
    pub one_bedroom_capacity: u32,
    /// Occupied studios after the absorption cap and vacancy discount
    /// (fractional)
    pub leased_studios: Decimal,
    pub leased_one_bedrooms: Decimal,
    pub annual_revenue: Money,
    pub annual_variable_cost: Money,
    pub annual_operating_expense: Money,
    pub net_operating_income: Money,
    /// NOI / cap rate; absent when no positive cap rate was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub implied_value: Option<Money>,
    /// NOI / annual debt service; absent when no positive debt service was
    /// supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debt_service_coverage_ratio: Option<Decimal>,
}

/// Full input for a single what-if evaluation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitMixInput {
    pub allocation: UnitAllocation,
    pub market: MarketObservation,
    #[serde(default = "ProjectConstraints::new_hope")]
    pub constraints: ProjectConstraints,
    #[serde(default)]
    pub capacity_table: CapacityTable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuation: Option<ValuationAssumptions>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate one allocation and wrap the summary with warnings and metadata.
pub fn evaluate_unit_mix(
    input: &UnitMixInput,
) -> UnitMixResult<ComputationOutput<FinancialSummary>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let summary = evaluate(
        &input.allocation,
        &input.market,
        &input.constraints,
        &input.capacity_table,
        input.valuation.as_ref(),
    )?;

    let built = input.allocation.studio_count + input.allocation.one_bedroom_count;
    if built != input.constraints.total_units {
        warnings.push(format!(
            "Allocation totals {built} units against the {}-unit program",
            input.constraints.total_units
        ));
    }

    if summary.used_floor_area_sq_ft > input.constraints.total_floor_area_sq_ft {
        warnings.push(format!(
            "Allocation uses {} sq ft against a {} sq ft envelope",
            summary.used_floor_area_sq_ft, input.constraints.total_floor_area_sq_ft
        ));
    }

    if input.market.vacancy_rate > dec!(0.15) {
        warnings.push(format!(
            "Vacancy rate {:.1}% exceeds 15% — above typical market norms",
            input.market.vacancy_rate * dec!(100)
        ));
    }

    if summary.net_operating_income < Decimal::ZERO {
        warnings.push("Negative NOI — rents do not cover operating costs for this mix".into());
    }

    let elapsed = start.elapsed().as_micros() as u64;

    Ok(with_metadata(
        "Unit-Mix Annual Pro Forma",
        input,
        warnings,
        elapsed,
        summary,
    ))
}

/// Pure financial model: allocation + market + constraints to annual summary.
///
/// Total over all non-negative inputs. Does not enforce the unit-count or
/// floor-area constraints, and a negative NOI is a valid outcome that
/// propagates unmodified.
pub fn evaluate(
    allocation: &UnitAllocation,
    market: &MarketObservation,
    constraints: &ProjectConstraints,
    table: &CapacityTable,
    valuation: Option<&ValuationAssumptions>,
) -> UnitMixResult<FinancialSummary> {
    validate_market(market)?;
    validate_constraints(constraints)?;

    let studio_count = Decimal::from(allocation.studio_count);
    let one_bedroom_count = Decimal::from(allocation.one_bedroom_count);

    let used_floor_area_sq_ft = studio_count * constraints.studio_area_sq_ft
        + one_bedroom_count * constraints.one_bedroom_area_sq_ft;

    let studio_capacity = table.capacity_for(market.studio_rent, UnitType::Studio);
    let one_bedroom_capacity = table.capacity_for(market.one_bedroom_rent, UnitType::OneBedroom);

    // Absorption caps the built count, then the vacancy discount applies to
    // the capped figure. Both limits reduce the same base; they are not
    // compounded in sequence.
    let occupancy = Decimal::ONE - market.vacancy_rate;
    let leased_studios =
        Decimal::from(allocation.studio_count.min(studio_capacity)) * occupancy;
    let leased_one_bedrooms =
        Decimal::from(allocation.one_bedroom_count.min(one_bedroom_capacity)) * occupancy;

    let annual_revenue = dec!(12)
        * (leased_studios * market.studio_rent + leased_one_bedrooms * market.one_bedroom_rent);

    // Variable cost accrues on built units whether or not they lease.
    let annual_variable_cost = dec!(12)
        * (studio_count * constraints.variable_monthly_cost_per_studio
            + one_bedroom_count * constraints.variable_monthly_cost_per_one_bedroom);

    let annual_operating_expense = constraints.fixed_annual_cost + annual_variable_cost;
    let net_operating_income = annual_revenue - annual_operating_expense;

    let implied_value = valuation
        .and_then(|v| v.cap_rate)
        .filter(|cap| *cap > Decimal::ZERO)
        .map(|cap| net_operating_income / cap);

    let debt_service_coverage_ratio = valuation
        .and_then(|v| v.annual_debt_service)
        .filter(|ds| *ds > Decimal::ZERO)
        .map(|ds| net_operating_income / ds);

    Ok(FinancialSummary {
        used_floor_area_sq_ft,
        studio_capacity,
        one_bedroom_capacity,
        leased_studios,
        leased_one_bedrooms,
        annual_revenue,
        annual_variable_cost,
        annual_operating_expense,
        net_operating_income,
        implied_value,
        debt_service_coverage_ratio,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_market(market: &MarketObservation) -> UnitMixResult<()> {
    if market.studio_rent < Decimal::ZERO {
        return Err(UnitMixError::InvalidInput {
            field: "studio_rent".into(),
            reason: "Rent must be non-negative".into(),
        });
    }

    if market.one_bedroom_rent < Decimal::ZERO {
        return Err(UnitMixError::InvalidInput {
            field: "one_bedroom_rent".into(),
            reason: "Rent must be non-negative".into(),
        });
    }

    if market.vacancy_rate < Decimal::ZERO || market.vacancy_rate > Decimal::ONE {
        return Err(UnitMixError::InvalidInput {
            field: "vacancy_rate".into(),
            reason: "Vacancy rate must be a fraction between 0 and 1".into(),
        });
    }

    Ok(())
}

fn validate_constraints(constraints: &ProjectConstraints) -> UnitMixResult<()> {
    if constraints.studio_area_sq_ft < Decimal::ZERO
        || constraints.one_bedroom_area_sq_ft < Decimal::ZERO
    {
        return Err(UnitMixError::InvalidInput {
            field: "unit_areas".into(),
            reason: "Per-unit areas must be non-negative".into(),
        });
    }

    if constraints.fixed_annual_cost < Decimal::ZERO {
        return Err(UnitMixError::InvalidInput {
            field: "fixed_annual_cost".into(),
            reason: "Fixed cost must be non-negative".into(),
        });
    }

    if constraints.variable_monthly_cost_per_studio < Decimal::ZERO
        || constraints.variable_monthly_cost_per_one_bedroom < Decimal::ZERO
    {
        return Err(UnitMixError::InvalidInput {
            field: "variable_monthly_costs".into(),
            reason: "Variable costs must be non-negative".into(),
        });
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    /// Canonical New Hope scenario: 55 studios / 30 one-bedrooms at
    /// 1700/2000 rents with 10% vacancy.
    fn sample_input() -> UnitMixInput {
        UnitMixInput {
            allocation: UnitAllocation {
                studio_count: 55,
                one_bedroom_count: 30,
            },
            market: MarketObservation {
                studio_rent: dec!(1700),
                one_bedroom_rent: dec!(2000),
                vacancy_rate: dec!(0.10),
            },
            constraints: ProjectConstraints::new_hope(),
            capacity_table: CapacityTable::new_hope_default(),
            valuation: None,
        }
    }

    #[test]
    fn test_canonical_scenario() {
        let result = evaluate_unit_mix(&sample_input()).unwrap();
        let out = &result.result;

        // 55 * 800 + 30 * 1200 = 80,000: exactly at the envelope
        assert_eq!(out.used_floor_area_sq_ft, dec!(80000));

        // 1700 resolves to band (1499, 1800]; 2000 to band (1800, 2100]
        assert_eq!(out.studio_capacity, 55);
        assert_eq!(out.one_bedroom_capacity, 65);

        // min(55, 55) * 0.9 and min(30, 65) * 0.9
        assert_eq!(out.leased_studios, dec!(49.5));
        assert_eq!(out.leased_one_bedrooms, dec!(27.0));

        // 12 * (49.5 * 1700 + 27 * 2000)
        assert_eq!(out.annual_revenue, dec!(1657800.0));

        // 12 * (55 * 720 + 30 * 1000)
        assert_eq!(out.annual_variable_cost, dec!(835200));
        assert_eq!(out.annual_operating_expense, dec!(1155200));
        assert_eq!(out.net_operating_income, dec!(502600.0));
    }

    #[test]
    fn test_canonical_scenario_no_warnings() {
        let result = evaluate_unit_mix(&sample_input()).unwrap();
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_vacancy_monotonically_reduces_leasing() {
        let mut input = sample_input();
        let mut previous = None;

        for vacancy in [dec!(0), dec!(0.25), dec!(0.5), dec!(0.75)] {
            input.market.vacancy_rate = vacancy;
            let out = evaluate_unit_mix(&input).unwrap().result;
            if let Some(prev) = previous {
                assert!(out.leased_studios < prev);
            }
            previous = Some(out.leased_studios);
        }

        input.market.vacancy_rate = Decimal::ONE;
        let out = evaluate_unit_mix(&input).unwrap().result;
        assert_eq!(out.leased_studios, Decimal::ZERO);
        assert_eq!(out.leased_one_bedrooms, Decimal::ZERO);
    }

    #[test]
    fn test_capacity_binds_leasing_not_count() {
        // Studio capacity at rent 1700 is 55; counts beyond it change nothing
        let mut input = sample_input();
        input.allocation.studio_count = 60;
        let at_60 = evaluate_unit_mix(&input).unwrap().result;

        input.allocation.studio_count = 70;
        let at_70 = evaluate_unit_mix(&input).unwrap().result;

        assert_eq!(at_60.leased_studios, at_70.leased_studios);
        assert_eq!(at_60.annual_revenue, at_70.annual_revenue);
    }

    #[test]
    fn test_variable_cost_charged_on_built_units() {
        // Same leasing outcome, higher built count: cost rises, revenue does not
        let mut input = sample_input();
        input.allocation.studio_count = 60;
        let at_60 = evaluate_unit_mix(&input).unwrap().result;

        input.allocation.studio_count = 70;
        let at_70 = evaluate_unit_mix(&input).unwrap().result;

        assert_eq!(at_70.annual_revenue, at_60.annual_revenue);
        assert_eq!(
            at_70.annual_variable_cost - at_60.annual_variable_cost,
            dec!(12) * dec!(10) * dec!(720)
        );
        assert!(at_70.net_operating_income < at_60.net_operating_income);
    }

    #[test]
    fn test_operating_expense_monotonic_in_counts() {
        let mut input = sample_input();
        let base = evaluate_unit_mix(&input).unwrap().result;

        input.allocation.studio_count += 5;
        let more_studios = evaluate_unit_mix(&input).unwrap().result;
        assert!(more_studios.annual_operating_expense >= base.annual_operating_expense);

        input.allocation.one_bedroom_count += 5;
        let more_both = evaluate_unit_mix(&input).unwrap().result;
        assert!(more_both.annual_operating_expense >= more_studios.annual_operating_expense);
    }

    #[test]
    fn test_negative_noi_propagates() {
        let mut input = sample_input();
        input.market.studio_rent = dec!(100);
        input.market.one_bedroom_rent = dec!(100);

        let out = evaluate_unit_mix(&input).unwrap().result;
        assert!(out.net_operating_income < Decimal::ZERO);
    }

    #[test]
    fn test_zero_allocation() {
        let mut input = sample_input();
        input.allocation = UnitAllocation {
            studio_count: 0,
            one_bedroom_count: 0,
        };

        let out = evaluate_unit_mix(&input).unwrap().result;
        assert_eq!(out.used_floor_area_sq_ft, Decimal::ZERO);
        assert_eq!(out.annual_revenue, Decimal::ZERO);
        // Fixed cost still accrues
        assert_eq!(out.net_operating_income, dec!(-320000));
    }

    #[test]
    fn test_implied_value_and_dscr() {
        let mut input = sample_input();
        input.valuation = Some(ValuationAssumptions {
            cap_rate: Some(dec!(0.05)),
            annual_debt_service: Some(dec!(400000)),
        });

        let out = evaluate_unit_mix(&input).unwrap().result;
        // 502600 / 0.05
        assert_eq!(out.implied_value, Some(dec!(10052000.0)));
        // 502600 / 400000
        assert_eq!(out.debt_service_coverage_ratio, Some(dec!(1.2565)));
    }

    #[test]
    fn test_zero_divisors_yield_undefined_not_infinite() {
        let mut input = sample_input();
        input.valuation = Some(ValuationAssumptions {
            cap_rate: Some(Decimal::ZERO),
            annual_debt_service: Some(Decimal::ZERO),
        });

        let out = evaluate_unit_mix(&input).unwrap().result;
        assert_eq!(out.implied_value, None);
        assert_eq!(out.debt_service_coverage_ratio, None);
    }

    #[test]
    fn test_no_valuation_inputs() {
        let out = evaluate_unit_mix(&sample_input()).unwrap().result;
        assert_eq!(out.implied_value, None);
        assert_eq!(out.debt_service_coverage_ratio, None);
    }

    #[test]
    fn test_allocation_sum_mismatch_warns() {
        let mut input = sample_input();
        input.allocation.one_bedroom_count = 20;

        let result = evaluate_unit_mix(&input).unwrap();
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("75 units against the 85-unit program")));
    }

    #[test]
    fn test_over_area_warns_but_evaluates() {
        let mut input = sample_input();
        input.allocation.studio_count = 85;
        input.allocation.one_bedroom_count = 85;

        let result = evaluate_unit_mix(&input).unwrap();
        assert!(result.warnings.iter().any(|w| w.contains("sq ft envelope")));
    }

    #[test]
    fn test_negative_rent_rejected() {
        let mut input = sample_input();
        input.market.studio_rent = dec!(-1);

        let result = evaluate_unit_mix(&input);
        assert!(result.is_err());
        match result.unwrap_err() {
            UnitMixError::InvalidInput { field, .. } => assert_eq!(field, "studio_rent"),
            other => panic!("Expected InvalidInput, got {other:?}"),
        }
    }

    #[test]
    fn test_vacancy_out_of_range_rejected() {
        let mut input = sample_input();
        input.market.vacancy_rate = dec!(1.2);
        assert!(evaluate_unit_mix(&input).is_err());

        input.market.vacancy_rate = dec!(-0.1);
        assert!(evaluate_unit_mix(&input).is_err());
    }

    #[test]
    fn test_negative_area_rejected() {
        let mut input = sample_input();
        input.constraints.studio_area_sq_ft = dec!(-800);
        assert!(evaluate_unit_mix(&input).is_err());
    }

    #[test]
    fn test_negative_cost_rejected() {
        let mut input = sample_input();
        input.constraints.variable_monthly_cost_per_studio = dec!(-720);
        assert!(evaluate_unit_mix(&input).is_err());
    }

    #[test]
    fn test_methodology_string() {
        let result = evaluate_unit_mix(&sample_input()).unwrap();
        assert_eq!(result.methodology, "Unit-Mix Annual Pro Forma");
    }

    #[test]
    fn test_input_deserializes_with_defaults() {
        // Constraints and capacity table fall back to the New Hope program
        let json = r#"{
            "allocation": {"studio_count": 55, "one_bedroom_count": 30},
            "market": {"studio_rent": "1700", "one_bedroom_rent": "2000", "vacancy_rate": "0.10"}
        }"#;
        let input: UnitMixInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.constraints.total_units, 85);

        let out = evaluate_unit_mix(&input).unwrap().result;
        assert_eq!(out.net_operating_income, dec!(502600.0));
    }
}
