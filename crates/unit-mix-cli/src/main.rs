mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::mix::{BandsArgs, EvaluateArgs, OptimizeArgs};
use commands::scenarios::SensitivityArgs;

/// Unit-mix feasibility and NOI optimization for residential development
#[derive(Parser)]
#[command(
    name = "umx",
    version,
    about = "Unit-mix feasibility and NOI optimization",
    long_about = "A CLI for the unit-mix financial model behind the New Hope \
                  development analysis. Evaluates a candidate studio/one-bedroom \
                  mix against observed market rents, searches the feasible \
                  allocation space for the NOI maximum, and sweeps rent and \
                  vacancy assumptions, all with decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one allocation's annual pro forma
    Evaluate(EvaluateArgs),
    /// Search the feasible mix space for the NOI maximum
    Optimize(OptimizeArgs),
    /// Run a 2-way rent/vacancy sensitivity grid
    Sensitivity(SensitivityArgs),
    /// Print the rent-band capacity table in effect
    Bands(BandsArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Evaluate(args) => commands::mix::run_evaluate(args),
        Commands::Optimize(args) => commands::mix::run_optimize(args),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args),
        Commands::Bands(args) => commands::mix::run_bands(args),
        Commands::Version => {
            println!("umx {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
