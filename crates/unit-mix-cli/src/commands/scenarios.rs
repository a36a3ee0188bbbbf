use clap::Args;
use serde_json::Value;

use unit_mix_core::scenarios::sensitivity::{self, MixSensitivityInput};

use crate::input;

/// Arguments for the 2-way sensitivity grid
#[derive(Args)]
pub struct SensitivityArgs {
    /// Path to JSON/YAML input file
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_sensitivity(args: SensitivityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sens_input: MixSensitivityInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(piped) = input::stdin::read_stdin()? {
        piped
    } else {
        return Err("--input <file> or stdin required for sensitivity".into());
    };

    let result = sensitivity::mix_sensitivity(&sens_input)?;
    Ok(serde_json::to_value(result)?)
}
