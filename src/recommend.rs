//! Recommendation engine.
//!
//! A query narrows the canonical dataset through four filter stages in a fixed
//! order: location, air temperature window, snow type, snow moisture. The first
//! stage that leaves no rows ends the query with a [`Diagnostic`] naming that
//! stage. Surviving rows are grouped per wax product and ranked by mean rating.

use std::{collections::HashMap, fmt, path::Path};

use anyhow::Result;
use log::debug;
use serde::Serialize;

use crate::{
    category::{SnowMoisture, SnowType},
    dataset::Dataset,
    record::CanonicalRecord,
};

pub const DEFAULT_TEMPERATURE_TOLERANCE: f64 = 2.0;
pub const DEFAULT_TOP: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub location: String,
    pub air_temp: f64,
    pub snow_type: SnowType,
    pub snow_moisture: SnowMoisture,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendOptions {
    /// Half-width of the inclusive air temperature window.
    pub temperature_tolerance: f64,
    /// Maximum number of ranked groups returned.
    pub top: usize,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            temperature_tolerance: DEFAULT_TEMPERATURE_TOLERANCE,
            top: DEFAULT_TOP,
        }
    }
}

/// One ranked wax product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub wax_brand: String,
    pub wax_product: String,
    /// Mean of the non-missing ratings; `None` when every rating is missing.
    pub avg_rating: Option<f64>,
    /// Number of rows in the group, rated or not.
    pub count: usize,
    pub avg_layers: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum Diagnostic {
    NoLocation { location: String },
    NoTemperatureRange { air_temp: f64, tolerance: f64 },
    NoSnowType { snow_type: SnowType },
    NoSnowMoisture { snow_moisture: SnowMoisture },
    NoWaxAfterGrouping,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoLocation { location } => write!(f, "no data for location {location}"),
            Diagnostic::NoTemperatureRange {
                air_temp,
                tolerance,
            } => write!(
                f,
                "no data for temperature range ({air_temp} ± {tolerance} °C)"
            ),
            Diagnostic::NoSnowType { snow_type } => write!(f, "no data for snow type {snow_type}"),
            Diagnostic::NoSnowMoisture { snow_moisture } => {
                write!(f, "no data for snow moisture {snow_moisture}")
            }
            Diagnostic::NoWaxAfterGrouping => f.write_str("no wax data after grouping"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "result", rename_all = "snake_case")]
pub enum Outcome {
    Ranked(Vec<Recommendation>),
    Diagnostic(Diagnostic),
}

impl Outcome {
    pub fn ranked(&self) -> Option<&[Recommendation]> {
        match self {
            Outcome::Ranked(rows) => Some(rows.as_slice()),
            Outcome::Diagnostic(_) => None,
        }
    }

    pub fn diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            Outcome::Diagnostic(diag) => Some(diag),
            Outcome::Ranked(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Recommender {
    options: RecommendOptions,
}

impl Recommender {
    pub fn new(options: RecommendOptions) -> Self {
        Self { options }
    }

    /// Reads the snapshot at `path` and answers `query` against it.
    pub fn recommend_from_path(&self, path: &Path, query: &Query) -> Result<Outcome> {
        let dataset = Dataset::load(path)?;
        Ok(self.recommend(&dataset, query))
    }

    pub fn recommend(&self, dataset: &Dataset, query: &Query) -> Outcome {
        let candidates: Vec<&CanonicalRecord> = dataset
            .records()
            .iter()
            .filter(|r| r.location == query.location)
            .collect();
        debug!("location '{}': {} row(s)", query.location, candidates.len());
        if candidates.is_empty() {
            return Outcome::Diagnostic(Diagnostic::NoLocation {
                location: query.location.clone(),
            });
        }

        let low = query.air_temp - self.options.temperature_tolerance;
        let high = query.air_temp + self.options.temperature_tolerance;
        let candidates = narrow(candidates, |r| {
            r.air_temp.is_some_and(|t| t >= low && t <= high)
        });
        debug!("air_temp [{low}, {high}]: {} row(s)", candidates.len());
        if candidates.is_empty() {
            return Outcome::Diagnostic(Diagnostic::NoTemperatureRange {
                air_temp: query.air_temp,
                tolerance: self.options.temperature_tolerance,
            });
        }

        let candidates = narrow(candidates, |r| r.snow_type == Some(query.snow_type));
        debug!("snow_type {}: {} row(s)", query.snow_type, candidates.len());
        if candidates.is_empty() {
            return Outcome::Diagnostic(Diagnostic::NoSnowType {
                snow_type: query.snow_type,
            });
        }

        let candidates = narrow(candidates, |r| r.snow_moisture == Some(query.snow_moisture));
        debug!(
            "snow_moisture {}: {} row(s)",
            query.snow_moisture,
            candidates.len()
        );
        if candidates.is_empty() {
            return Outcome::Diagnostic(Diagnostic::NoSnowMoisture {
                snow_moisture: query.snow_moisture,
            });
        }

        let mut ranked = aggregate(&candidates);
        if ranked.is_empty() {
            return Outcome::Diagnostic(Diagnostic::NoWaxAfterGrouping);
        }
        rank(&mut ranked);
        ranked.truncate(self.options.top);
        Outcome::Ranked(ranked)
    }
}

fn narrow<'a, F>(records: Vec<&'a CanonicalRecord>, keep: F) -> Vec<&'a CanonicalRecord>
where
    F: Fn(&CanonicalRecord) -> bool,
{
    records.into_iter().filter(|r| keep(*r)).collect()
}

#[derive(Debug, Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn add(&mut self, value: Option<i64>) {
        if let Some(v) = value {
            self.sum += v as f64;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

struct Group<'a> {
    brand: &'a str,
    product: &'a str,
    rows: usize,
    rating: MeanAccumulator,
    layers: MeanAccumulator,
}

/// Groups by (brand, product), keeping groups in order of first appearance.
/// Rows missing either key belong to no group.
fn aggregate(records: &[&CanonicalRecord]) -> Vec<Recommendation> {
    let mut positions: HashMap<(&str, &str), usize> = HashMap::new();
    let mut groups: Vec<Group<'_>> = Vec::new();
    for record in records {
        if record.wax_brand.is_empty() || record.wax_product.is_empty() {
            continue;
        }
        let key = (record.wax_brand.as_str(), record.wax_product.as_str());
        let idx = *positions.entry(key).or_insert_with(|| {
            groups.push(Group {
                brand: key.0,
                product: key.1,
                rows: 0,
                rating: MeanAccumulator::default(),
                layers: MeanAccumulator::default(),
            });
            groups.len() - 1
        });
        let group = &mut groups[idx];
        group.rows += 1;
        group.rating.add(record.rating);
        group.layers.add(record.layers);
    }
    groups
        .into_iter()
        .map(|g| Recommendation {
            wax_brand: g.brand.to_string(),
            wax_product: g.product.to_string(),
            avg_rating: g.rating.mean(),
            count: g.rows,
            avg_layers: g.layers.mean(),
        })
        .collect()
}

/// Descending by mean rating; unrated groups last. `sort_by` is stable, so
/// ties keep first-appearance order.
fn rank(rows: &mut [Recommendation]) {
    rows.sort_by(|a, b| match (a.avg_rating, b.avg_rating) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}
