use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use ion_chrom_extractor::state::{Session, DEFAULT_EXTRACTION_WINDOW};
use ion_chrom_extractor::{convert_directory, run_batch, FileSource};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Parser, Debug)]
struct ExtractArgs {
    /// Text file with one `mass` or `mass=label` per line.
    #[arg(short, long)]
    masses: PathBuf,

    /// Half width of the extraction window (m/z).
    #[arg(short, long, default_value_t = DEFAULT_EXTRACTION_WINDOW)]
    window: f64,

    /// Directory the JSON records are written to. Must exist.
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Process acquisitions one after another.
    #[arg(long)]
    sequential: bool,

    /// Acquisition files (.parquet, .json or .csv).
    #[arg(required = true)]
    acquisitions: Vec<PathBuf>,
}

#[derive(Parser, Debug)]
struct ConvertArgs {
    /// Directory holding the JSON records.
    #[arg(short, long)]
    output_dir: PathBuf,

    /// Keep the JSON records after writing the tables.
    #[arg(long)]
    keep_json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract BPC and EICs from acquisitions.
    Extract(ExtractArgs),
    /// Convert JSON records into CSV tables.
    Convert(ConvertArgs),
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Commands::Extract(args) => main_extract(args),
        Commands::Convert(args) => main_convert(args),
    }
}

fn main_extract(args: ExtractArgs) -> ExitCode {
    let mut session = Session {
        extraction_window: args.window,
        parallel: !args.sequential,
        ..Session::default()
    };
    session.add_files(args.acquisitions);
    session.set_output_directory(args.output_dir);

    let config = match session
        .load_masses(&args.masses)
        .and_then(|_| session.to_config())
    {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match run_batch(&config, &FileSource, None) {
        Ok(report) if report.failed() == 0 => ExitCode::SUCCESS,
        // each failure was already logged by run_batch
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn main_convert(args: ConvertArgs) -> ExitCode {
    match convert_directory(&args.output_dir, !args.keep_json) {
        Ok(outcomes) => {
            let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
            log::info!(
                "Converted {} of {} records",
                outcomes.len() - failed,
                outcomes.len()
            );
            if failed == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
