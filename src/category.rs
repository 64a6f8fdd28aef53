//! Canonical snow categories and the survey lookup tables that produce them.
//!
//! Survey answers arrive as the verbatim option text of the (German) form.
//! [`LookupTable::normalize`] maps that text to a canonical tag by exact string
//! equality. There is no case folding and no trimming: text the table does not
//! know becomes missing.

use std::{collections::HashMap, fmt, str::FromStr};

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

/// Categorical field with a fixed set of canonical tags.
pub trait Category: Copy + Eq + fmt::Debug + 'static {
    /// Field name as it appears in the canonical dataset header.
    const FIELD: &'static str;

    fn all() -> &'static [Self];
    fn as_str(&self) -> &'static str;

    fn from_tag(tag: &str) -> Option<Self> {
        Self::all().iter().copied().find(|c| c.as_str() == tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnowType {
    FreshFine,
    FreshCold,
    OldTransformed,
    Icy,
    Wet,
    Artificial,
    Mixed,
}

impl Category for SnowType {
    const FIELD: &'static str = "snow_type";

    fn all() -> &'static [Self] {
        &[
            SnowType::FreshFine,
            SnowType::FreshCold,
            SnowType::OldTransformed,
            SnowType::Icy,
            SnowType::Wet,
            SnowType::Artificial,
            SnowType::Mixed,
        ]
    }

    fn as_str(&self) -> &'static str {
        match self {
            SnowType::FreshFine => "fresh_fine",
            SnowType::FreshCold => "fresh_cold",
            SnowType::OldTransformed => "old_transformed",
            SnowType::Icy => "icy",
            SnowType::Wet => "wet",
            SnowType::Artificial => "artificial",
            SnowType::Mixed => "mixed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnowMoisture {
    Dry,
    Normal,
    Wet,
}

impl Category for SnowMoisture {
    const FIELD: &'static str = "snow_moisture";

    fn all() -> &'static [Self] {
        &[SnowMoisture::Dry, SnowMoisture::Normal, SnowMoisture::Wet]
    }

    fn as_str(&self) -> &'static str {
        match self {
            SnowMoisture::Dry => "dry",
            SnowMoisture::Normal => "normal",
            SnowMoisture::Wet => "wet",
        }
    }
}

macro_rules! category_traits {
    ($ty:ty) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = anyhow::Error;

            fn from_str(s: &str) -> Result<Self> {
                <$ty as Category>::from_tag(s.trim()).ok_or_else(|| {
                    anyhow!(
                        "Unknown {} '{}'; expected one of: {}",
                        <$ty as Category>::FIELD,
                        s,
                        <$ty as Category>::all()
                            .iter()
                            .map(|c| c.as_str())
                            .collect::<Vec<_>>()
                            .join(", ")
                    )
                })
            }
        }
    };
}

category_traits!(SnowType);
category_traits!(SnowMoisture);

const SURVEY_SNOW_TYPES: &[(&str, SnowType)] = &[
    ("Neuschnee fein", SnowType::FreshFine),
    ("Neuschnee kalt", SnowType::FreshCold),
    ("Alt / umgewandelt", SnowType::OldTransformed),
    ("Eisig / gefroren", SnowType::Icy),
    ("Nassschnee", SnowType::Wet),
    ("Kunstschnee", SnowType::Artificial),
    ("Gemischt (Natur + Kunst)", SnowType::Mixed),
];

const SURVEY_SNOW_MOISTURES: &[(&str, SnowMoisture)] = &[
    ("Trocken", SnowMoisture::Dry),
    ("Normal", SnowMoisture::Normal),
    ("Nass", SnowMoisture::Wet),
];

/// Exact-match table from free text to a canonical category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTable<T> {
    entries: HashMap<String, T>,
}

impl<T: Category> LookupTable<T> {
    pub fn new<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Adds identity entries for every canonical tag so that a dataset which
    /// already went through the cleaner maps onto itself.
    pub fn with_canonical_tags(mut self) -> Self {
        for category in T::all() {
            self.entries
                .entry(category.as_str().to_string())
                .or_insert(*category);
        }
        self
    }

    pub fn normalize(&self, raw: &str) -> Option<T> {
        self.entries.get(raw).copied()
    }

    pub fn contains(&self, raw: &str) -> bool {
        self.entries.contains_key(raw)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LookupTable<SnowType> {
    /// The seven snow-type options of the survey form.
    pub fn survey_snow_types() -> Self {
        Self::new(SURVEY_SNOW_TYPES.iter().copied())
    }
}

impl LookupTable<SnowMoisture> {
    /// The three moisture options of the survey form.
    pub fn survey_snow_moistures() -> Self {
        Self::new(SURVEY_SNOW_MOISTURES.iter().copied())
    }
}
