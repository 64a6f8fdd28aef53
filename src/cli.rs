use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::category::{SnowMoisture, SnowType};

#[derive(Debug, Parser)]
#[command(author, version, about = "Ski-wax survey cleaning and recommendations", long_about = None)]
pub struct Cli {
    /// YAML configuration file with default paths and options
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Clean a raw survey export into the canonical dataset snapshot
    Clean(CleanArgs),
    /// Recommend the best rated waxes for the given conditions
    Recommend(RecommendArgs),
    /// Show the first rows of the canonical dataset
    Preview(PreviewArgs),
    /// List locations, snow types and moistures present in the dataset
    Options(OptionsArgs),
    /// Answer queries read line by line from stdin
    Session(SessionArgs),
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Raw survey export (CSV, `-` for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,
    /// Destination snapshot file, overwritten on every run
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// CSV delimiter of the raw export (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the raw export (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Require the export header to equal the canonical field names
    #[arg(long = "strict-headers")]
    pub strict_headers: bool,
    /// Fail on snow type or moisture text missing from the lookup tables
    #[arg(long = "strict-categories")]
    pub strict_categories: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
#[value(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Debug, Args)]
pub struct RecommendArgs {
    /// Canonical dataset snapshot
    #[arg(short = 'd', long = "dataset")]
    pub dataset: Option<PathBuf>,
    /// Location name, matched exactly
    #[arg(long)]
    pub location: String,
    /// Air temperature in °C
    #[arg(long = "air-temp", allow_hyphen_values = true)]
    pub air_temp: f64,
    /// Snow type tag (fresh_fine, fresh_cold, old_transformed, icy, wet, artificial, mixed)
    #[arg(long = "snow-type")]
    pub snow_type: SnowType,
    /// Snow moisture tag (dry, normal, wet)
    #[arg(long = "snow-moisture")]
    pub snow_moisture: SnowMoisture,
    /// Half-width of the air temperature window
    #[arg(long)]
    pub tolerance: Option<f64>,
    /// Maximum number of waxes listed
    #[arg(long)]
    pub top: Option<usize>,
    /// Output format
    #[arg(long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Debug, Args)]
pub struct PreviewArgs {
    /// Canonical dataset snapshot
    #[arg(short = 'd', long = "dataset")]
    pub dataset: Option<PathBuf>,
    /// Number of rows to display
    #[arg(long, default_value_t = 10)]
    pub rows: usize,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    /// Canonical dataset snapshot
    #[arg(short = 'd', long = "dataset")]
    pub dataset: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct SessionArgs {
    /// Canonical dataset snapshot
    #[arg(short = 'd', long = "dataset")]
    pub dataset: Option<PathBuf>,
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
