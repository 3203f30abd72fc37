use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use msfeature::feature::params::{FeatureParams, ParamsError};
use msfeature::feature::pipeline::{finalize_features, select_features};

#[derive(Parser)]
#[command(
    name = "msfeature",
    version,
    about = "Post-processing of scored MS1 precursor features"
)]
struct Cli {
    /// Parameter file, JSON or KEY=VALUE properties depending on extension
    #[arg(short, long)]
    params: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve charge states and collapse isotope envelopes
    Select {
        /// File path stem, input is read from `<stem>_svr_score`
        stem: String,
    },
    /// Cluster near-duplicate features and rank them by quality score
    Finalize {
        /// File path stem, input is read from `<stem>_nn_score`
        stem: String,
    },
}

fn load_params(path: &Path) -> Result<FeatureParams, ParamsError> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => FeatureParams::from_json_file(path),
        _ => FeatureParams::from_properties_file(path),
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let params = load_params(&cli.params)?;
    match cli.command {
        Command::Select { stem } => {
            select_features(&stem, &params)?;
        }
        Command::Finalize { stem } => {
            let features = finalize_features(&stem, &params)?;
            log::info!("final feature list holds {} precursors", features.len());
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        log::error!("{}", err);
        process::exit(1);
    }
}
