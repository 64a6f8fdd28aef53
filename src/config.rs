//! Optional YAML configuration.
//!
//! ```yaml
//! raw_path: wax_data_seefeld.csv
//! dataset_path: wax_data_clean.csv
//! input_encoding: windows-1252
//! temperature_tolerance: 2.0
//! top: 5
//! strict_headers: false
//! strict_categories: false
//! ```
//!
//! Every key is optional; command-line flags take precedence over file values.

use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::{
    clean::{CategoryPolicy, CleanOptions, HeaderPolicy},
    recommend::{DEFAULT_TEMPERATURE_TOLERANCE, DEFAULT_TOP, RecommendOptions},
};

pub const DEFAULT_RAW_PATH: &str = "wax_data_seefeld.csv";
pub const DEFAULT_DATASET_PATH: &str = "wax_data_clean.csv";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WaxConfig {
    pub raw_path: PathBuf,
    pub dataset_path: PathBuf,
    pub delimiter: Option<char>,
    pub input_encoding: Option<String>,
    pub temperature_tolerance: f64,
    pub top: usize,
    pub strict_headers: bool,
    pub strict_categories: bool,
}

impl Default for WaxConfig {
    fn default() -> Self {
        Self {
            raw_path: PathBuf::from(DEFAULT_RAW_PATH),
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            delimiter: None,
            input_encoding: None,
            temperature_tolerance: DEFAULT_TEMPERATURE_TOLERANCE,
            top: DEFAULT_TOP,
            strict_headers: false,
            strict_categories: false,
        }
    }
}

impl WaxConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening config file {path:?}"))?;
        let config: WaxConfig =
            serde_yaml::from_reader(BufReader::new(file)).context("Parsing config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let config: WaxConfig = serde_yaml::from_str(input).context("Parsing config YAML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            self.temperature_tolerance.is_finite() && self.temperature_tolerance >= 0.0,
            "temperature_tolerance must be a non-negative number"
        );
        ensure!(self.top > 0, "top must be at least 1");
        if let Some(delimiter) = self.delimiter {
            ensure!(delimiter.is_ascii(), "delimiter must be ASCII");
        }
        Ok(())
    }

    pub fn delimiter_byte(&self) -> Option<u8> {
        self.delimiter.map(|c| c as u8)
    }

    pub fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            header_policy: if self.strict_headers {
                HeaderPolicy::Strict
            } else {
                HeaderPolicy::Positional
            },
            category_policy: if self.strict_categories {
                CategoryPolicy::Strict
            } else {
                CategoryPolicy::Lenient
            },
        }
    }

    pub fn recommend_options(&self) -> RecommendOptions {
        RecommendOptions {
            temperature_tolerance: self.temperature_tolerance,
            top: self.top,
        }
    }
}
