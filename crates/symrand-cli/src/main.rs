//! CLI for symrand: is this symbol sequence consistent with a uniform,
//! memoryless source?

mod commands;

use clap::{Parser, Subcommand};
use commands::{AlphabetArgs, InputArgs, PanelArgs};

#[derive(Parser)]
#[command(name = "symrand")]
#[command(about = "symrand — randomness test battery for finite-alphabet symbol sequences")]
#[command(version = symrand_core::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the test panel with multiple-testing correction and print verdicts
    Report {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        panel: PanelArgs,

        /// Write the corrected panel to this path
        #[arg(long)]
        output: Option<String>,

        /// Format of the --output file
        #[arg(long, default_value = "json", value_parser = ["json", "markdown"])]
        format: String,
    },

    /// Descriptive profile: frequencies, entropy, common n-grams, length factors.
    /// With --records, also per-position frequencies.
    Analyze {
        #[command(flatten)]
        input: InputArgs,

        /// n-gram width for the most-common listing
        #[arg(long, default_value = "2")]
        tuple_size: usize,

        /// How many n-grams to list
        #[arg(long, default_value = "10")]
        top: usize,

        /// Write the profile as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// First-order transition matrix, weighted edges and optional
    /// higher-order context model
    Transitions {
        #[command(flatten)]
        input: InputArgs,

        /// Drop edges observed fewer times than this
        #[arg(long, default_value = "1")]
        min_count: u64,

        /// How many of the most frequent transitions to list
        #[arg(long, default_value = "10")]
        top: usize,

        /// Also fit a next-symbol model on the preceding N symbols
        #[arg(long)]
        order: Option<usize>,

        /// Write matrix, edges and contexts as JSON
        #[arg(long)]
        output: Option<String>,
    },

    /// Estimate the panel's false-positive rate on simulated uniform sequences
    Calibrate {
        #[command(flatten)]
        alphabet: AlphabetArgs,

        #[command(flatten)]
        panel: PanelArgs,

        /// Symbols per simulated sequence
        #[arg(long, default_value = "1000")]
        length: usize,

        /// Number of simulated sequences
        #[arg(long, default_value = "200")]
        trials: usize,

        /// RNG seed (random when omitted)
        #[arg(long)]
        seed: Option<u64>,

        /// Write the calibration report as JSON
        #[arg(long)]
        output: Option<String>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Report {
            input,
            panel,
            output,
            format,
        } => commands::report::run(&input, &panel, output.as_deref(), &format),
        Commands::Analyze {
            input,
            tuple_size,
            top,
            output,
        } => commands::analyze::run(&input, tuple_size, top, output.as_deref()),
        Commands::Transitions {
            input,
            min_count,
            top,
            order,
            output,
        } => commands::transitions::run(commands::transitions::TransitionsCommandConfig {
            input: &input,
            min_count,
            top,
            order,
            output_path: output.as_deref(),
        }),
        Commands::Calibrate {
            alphabet,
            panel,
            length,
            trials,
            seed,
            output,
        } => commands::calibrate::run(commands::calibrate::CalibrateCommandConfig {
            alphabet: &alphabet,
            panel: &panel,
            length,
            trials,
            seed,
            output_path: output.as_deref(),
        }),
    }
}
