use clap::Args;
use serde_json::Value;

use unit_mix_core::unit_mix::capacity::CapacityTable;
use unit_mix_core::unit_mix::model::{self, UnitMixInput};
use unit_mix_core::unit_mix::optimizer::{self, MixOptimizerInput};

use crate::input;
use crate::input::market_csv::{self, ColumnMap};

/// Arguments for evaluating one allocation
#[derive(Args)]
pub struct EvaluateArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Read the market observation from the first row of this CSV,
    /// overriding the input's market block
    #[arg(long)]
    pub market_csv: Option<String>,

    /// JSON file mapping CSV column names to market fields
    #[arg(long, requires = "market_csv")]
    pub column_map: Option<String>,
}

/// Arguments for the mix optimizer
#[derive(Args)]
pub struct OptimizeArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,

    /// Read the market observation from the first row of this CSV,
    /// overriding the input's market block
    #[arg(long)]
    pub market_csv: Option<String>,

    /// JSON file mapping CSV column names to market fields
    #[arg(long, requires = "market_csv")]
    pub column_map: Option<String>,

    /// Include per-candidate NOI for every feasible mix
    #[arg(long)]
    pub frontier: bool,
}

/// Arguments for printing the capacity table
#[derive(Args)]
pub struct BandsArgs {
    /// Path to a JSON/YAML capacity table; omit for the New Hope default
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_evaluate(args: EvaluateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut mix_input: UnitMixInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        return Err("--input <file> or stdin required for evaluate".into());
    };

    if let Some(ref csv_path) = args.market_csv {
        mix_input.market = read_market_from_csv(csv_path, args.column_map.as_deref())?;
    }

    let result = model::evaluate_unit_mix(&mix_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_optimize(args: OptimizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut opt_input: MixOptimizerInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        return Err("--input <file> or stdin required for optimize".into());
    };

    if let Some(ref csv_path) = args.market_csv {
        opt_input.market = read_market_from_csv(csv_path, args.column_map.as_deref())?;
    }
    if args.frontier {
        opt_input.include_frontier = true;
    }

    let result = optimizer::optimize_mix(&opt_input)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_bands(args: BandsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table: CapacityTable = match args.input {
        Some(ref path) => input::file::read_input(path)?,
        None => CapacityTable::new_hope_default(),
    };
    Ok(serde_json::to_value(table.bands())?)
}

fn read_market_from_csv(
    csv_path: &str,
    column_map_path: Option<&str>,
) -> Result<model::MarketObservation, Box<dyn std::error::Error>> {
    let map: ColumnMap = match column_map_path {
        Some(path) => input::file::read_input(path)?,
        None => ColumnMap::default(),
    };
    market_csv::read_market(csv_path, &map)
}
