use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use env_logger::Builder;
use log::{error, LevelFilter};

use dslab_vmp::core::config::exp_config::ExperimentConfig;
use dslab_vmp::experiment::Experiment;

#[derive(Parser, Debug)]
#[command(about, long_about = None)]
/// Runs VM placement scenarios and writes their metrics
struct Args {
    /// Path to parameter file (KEY=VALUE lines or YAML)
    #[arg(short, long)]
    config: PathBuf,

    /// Output directory (overrides OUTPUT_DIR of the config)
    #[arg(short, long)]
    output: Option<String>,

    /// Number of scenarios to run in parallel
    #[arg(short, long, default_value_t = 1)]
    threads: usize,
}

fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format(|buf, record| writeln!(buf, "{}", record.args()))
        .init();
}

fn main() -> ExitCode {
    init_logger();
    let args = Args::parse();

    let config = match ExperimentConfig::from_file(&args.config.to_string_lossy()) {
        Ok(config) => config,
        Err(e) => {
            error!("cannot load {}: {}", args.config.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let mut experiment = Experiment::new(config, args.output);
    match experiment.run(args.threads) {
        Ok(summaries) if summaries.iter().all(|s| s.error.is_none()) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("experiment failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
