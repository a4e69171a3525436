//! Panel CLI: filter, merge and build commands.
//!
//! Commands:
//! - `filter` - keep companies covered in every source and write filtered copies
//! - `merge` - join the filtered copies on (company, period-end date)
//! - `build` - run `filter` then `merge`

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use panel::{
    CoverageReport, DEFAULT_MIN_YEARS, DatasetRegistry, FilterOptions, MergeOptions,
    MergeOutcome, Year,
};
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "panel",
    version,
    about = "Assemble a company-year panel from financial statement sources"
)]
struct Cli {
    /// Log level used when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// JSON file with dataset descriptors. Defaults to the built-in CSMAR tables.
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Keep companies covered in every source and write filtered copies.
    Filter {
        #[command(flatten)]
        filter: FilterArgs,

        /// Print the coverage report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Merge filtered copies on (company, period-end date).
    Merge {
        /// Directory holding the filtered copies (or their parent).
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Merged output file. Defaults to <data-dir>/filtered/merged_filtered.csv.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Filter, then merge the filtered copies.
    Build {
        #[command(flatten)]
        filter: FilterArgs,

        /// Merged output file. Defaults to <output-dir>/merged_filtered.csv.
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the coverage report as JSON.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Directory holding the source files.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Directory for filtered copies. Defaults to <data-dir>/filtered.
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Target years, space or comma separated. Defaults to 2018-2024.
    #[arg(long, num_args = 1.., value_delimiter = ',')]
    years: Option<Vec<Year>>,

    /// Minimum number of target years a company must appear in per source.
    #[arg(long, default_value_t = DEFAULT_MIN_YEARS)]
    min_years: usize,

    /// Keep consolidated statements alongside parent statements.
    #[arg(long, default_value_t = false)]
    allow_consolidated: bool,
}

impl FilterArgs {
    fn into_options(self) -> FilterOptions {
        let mut options = FilterOptions::new(self.data_dir)
            .with_min_years(self.min_years)
            .with_consolidated(self.allow_consolidated);
        if let Some(dir) = self.output_dir {
            options = options.with_output_dir(dir);
        }
        if let Some(years) = self.years {
            options = options.with_target_years(years);
        }
        options
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_registry(path: Option<&PathBuf>) -> Result<DatasetRegistry> {
    match path {
        Some(path) => DatasetRegistry::from_json_file(path)
            .with_context(|| format!("failed to load registry {}", path.display())),
        None => Ok(DatasetRegistry::csmar()),
    }
}

fn print_report(report: &CoverageReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn print_merge(outcome: &MergeOutcome) {
    println!(
        "Merged {} source(s) into {} ({} rows, {} keys)",
        outcome.merged.len(),
        outcome.output.display(),
        outcome.rows,
        outcome.spine_rows
    );
    if !outcome.skipped.is_empty() {
        println!("Skipped (no filtered file): {}", outcome.skipped.join(", "));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let registry = load_registry(cli.registry.as_ref())?;
    debug!(datasets = registry.len(), "Registry loaded");

    match cli.command {
        Commands::Filter { filter, json } => {
            let outcome = panel::filter::run(&registry, &filter.into_options())?;
            print_report(&outcome.report, json)?;
            for output in &outcome.outputs {
                println!("Saved {} ({} rows)", output.path.display(), output.rows);
            }
        }
        Commands::Merge { data_dir, output } => {
            let mut options = MergeOptions::new(data_dir);
            if let Some(output) = output {
                options = options.with_output(output);
            }
            print_merge(&panel::merge::run(&registry, &options)?);
        }
        Commands::Build {
            filter,
            output,
            json,
        } => {
            let outcome = panel::build(&registry, &filter.into_options(), output.as_deref())?;
            print_report(&outcome.filter.report, json)?;
            print_merge(&outcome.merge);
        }
    }
    Ok(())
}
