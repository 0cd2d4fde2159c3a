mod etl;
mod data;
mod errors;

use std::fs::{create_dir_all, File};
use std::io;
use std::path::{Path, PathBuf};

use clap::Parser;
use log::info;
use serde::Deserialize;
use structured_logger::json::new_writer;
use structured_logger::Builder;

use crate::etl::osm_csv::OsmCsvEtl;
use crate::etl::ETL;
use crate::errors::Result;

#[derive(Parser)]
#[command(about = "Clean an OpenStreetMap extract into node/way CSV row-sets")]
struct Args {
    /// JSON config file.
    #[arg(default_value = "config/bengaluru.json")]
    config: PathBuf,

    /// Throw away cached CSVs and run again.
    #[arg(long)]
    force: bool,

    /// Check every shaped element against the row schema before writing it.
    #[arg(long)]
    validate: bool,
}

#[derive(Deserialize, Debug, Clone)]
pub struct UserConfig {
    pub data_path: String,
    pub dest_path: String,
    #[serde(default)]
    pub validate: bool,
    #[serde(default)]
    pub underscores_to_spaces: bool,
    #[serde(default)]
    pub show_progress: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn load_user_config(path: &Path) -> Result<UserConfig> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(file)?)
}


fn create_output_dir(config: &UserConfig) -> Result<PathBuf> {
    let input_fname = Path::new(&config.data_path)
        .file_name()
        .ok_or("Could not get input file name")?;
    let output_dir = Path::new(&config.dest_path).join(input_fname);
    create_dir_all(&output_dir)?;
    Ok(output_dir)
}

fn setup_logging(level: &str) {
    Builder::with_level(level)
        .with_target_writer("*", new_writer(io::stdout()))
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut user_config = load_user_config(&args.config)?;
    user_config.validate |= args.validate;

    setup_logging(&user_config.log_level);

    let output_dir = create_output_dir(&user_config)?;
    let mut etl = OsmCsvEtl::new(&user_config);
    if args.force {
        etl.clean(&output_dir)?;
    }
    etl.process(&output_dir)?;

    let output_dir_name = output_dir.display().to_string();
    info!(output_dir = output_dir_name.as_str(); "CSV row-sets ready for loading");

    Ok(())
}
