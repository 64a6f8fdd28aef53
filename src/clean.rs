//! Dataset cleaner: raw survey export in, canonical snapshot out.
//!
//! Columns are assigned by position. Numeric fields that fail to parse and
//! category text missing from the lookup tables both degrade to missing values
//! unless a strict policy is selected.

use std::{collections::BTreeMap, io::Read, path::Path};

use anyhow::{Context, Result};
use encoding_rs::Encoding;
use log::{info, warn};

use crate::{
    category::{Category, LookupTable, SnowMoisture, SnowType},
    dataset::Dataset,
    error::CleanError,
    io_utils,
    record::{CanonicalRecord, FIELD_COUNT, FIELD_NAMES, RawRecord, coerce_float, coerce_integer},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderPolicy {
    /// Header text is ignored; only the column count is checked.
    #[default]
    Positional,
    /// Header text must equal the canonical field names.
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryPolicy {
    /// Unmapped category text becomes missing.
    #[default]
    Lenient,
    /// Non-empty unmapped category text is an error.
    Strict,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanOptions {
    pub header_policy: HeaderPolicy,
    pub category_policy: CategoryPolicy,
}

/// Counters gathered during one cleaning run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanSummary {
    pub rows: usize,
    pub missing: BTreeMap<&'static str, usize>,
    pub unmapped: BTreeMap<(&'static str, String), usize>,
}

impl CleanSummary {
    pub fn missing_count(&self, field: &str) -> usize {
        self.missing.get(field).copied().unwrap_or(0)
    }

    fn observe(&mut self, record: &CanonicalRecord) {
        self.rows += 1;
        let checks = [
            ("air_temp", record.air_temp.is_none()),
            ("snow_temp", record.snow_temp.is_none()),
            ("rating", record.rating.is_none()),
            ("layers", record.layers.is_none()),
            (SnowType::FIELD, record.snow_type.is_none()),
            (SnowMoisture::FIELD, record.snow_moisture.is_none()),
        ];
        for (field, missing) in checks {
            if missing {
                *self.missing.entry(field).or_insert(0) += 1;
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cleaner {
    snow_types: LookupTable<SnowType>,
    snow_moistures: LookupTable<SnowMoisture>,
    options: CleanOptions,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new(
            LookupTable::survey_snow_types().with_canonical_tags(),
            LookupTable::survey_snow_moistures().with_canonical_tags(),
            CleanOptions::default(),
        )
    }
}

impl Cleaner {
    pub fn new(
        snow_types: LookupTable<SnowType>,
        snow_moistures: LookupTable<SnowMoisture>,
        options: CleanOptions,
    ) -> Self {
        Self {
            snow_types,
            snow_moistures,
            options,
        }
    }

    pub fn with_options(mut self, options: CleanOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate_headers(&self, headers: &[String]) -> Result<(), CleanError> {
        if headers.len() != FIELD_COUNT {
            return Err(CleanError::ColumnCount {
                row: 1,
                expected: FIELD_COUNT,
                found: headers.len(),
            });
        }
        if self.options.header_policy == HeaderPolicy::Positional {
            return Ok(());
        }
        for (idx, (expected, found)) in FIELD_NAMES.iter().zip(headers).enumerate() {
            if found != expected {
                return Err(CleanError::HeaderMismatch {
                    position: idx + 1,
                    expected: *expected,
                    found: found.clone(),
                });
            }
        }
        Ok(())
    }

    /// Cleans a single record. `row` is the 1-based line number used in errors.
    pub fn clean_record(&self, row: usize, raw: &RawRecord) -> Result<CanonicalRecord, CleanError> {
        Ok(CanonicalRecord {
            timestamp: raw.timestamp.clone(),
            location: raw.location.trim().to_string(),
            air_temp: coerce_float(&raw.air_temp),
            snow_type: self.map_category(row, &self.snow_types, &raw.snow_type)?,
            snow_moisture: self.map_category(row, &self.snow_moistures, &raw.snow_moisture)?,
            wax_brand: raw.wax_brand.clone(),
            wax_product: raw.wax_product.clone(),
            rating: coerce_integer(&raw.rating),
            snow_temp: coerce_float(&raw.snow_temp),
            layers: coerce_integer(&raw.layers),
        })
    }

    fn map_category<T: Category>(
        &self,
        row: usize,
        table: &LookupTable<T>,
        raw: &str,
    ) -> Result<Option<T>, CleanError> {
        let mapped = table.normalize(raw);
        if mapped.is_none()
            && !raw.is_empty()
            && self.options.category_policy == CategoryPolicy::Strict
        {
            return Err(CleanError::UnmappedCategory {
                row,
                field: T::FIELD,
                value: raw.to_string(),
            });
        }
        Ok(mapped)
    }

    pub fn clean_records<'a, I>(&self, records: I) -> Result<(Dataset, CleanSummary)>
    where
        I: IntoIterator<Item = &'a RawRecord>,
    {
        let mut summary = CleanSummary::default();
        let mut cleaned = Vec::new();
        for (idx, raw) in records.into_iter().enumerate() {
            let row = idx + 2;
            let record = self.clean_record(row, raw)?;
            self.note_unmapped(&mut summary, raw, &record);
            summary.observe(&record);
            cleaned.push(record);
        }
        Ok((Dataset::new(cleaned), summary))
    }

    pub fn clean_reader<R: Read>(
        &self,
        reader: &mut csv::Reader<R>,
        encoding: &'static Encoding,
    ) -> Result<(Dataset, CleanSummary)> {
        let headers = io_utils::reader_headers(reader, encoding)?;
        self.validate_headers(&headers)?;

        let mut raw_records = Vec::new();
        for (idx, record) in reader.byte_records().enumerate() {
            let row = idx + 2;
            let record = record.with_context(|| format!("Reading row {row}"))?;
            let decoded = io_utils::decode_record(&record, encoding)
                .with_context(|| format!("Decoding row {row}"))?;
            let raw = RawRecord::from_fields(&decoded).ok_or(CleanError::ColumnCount {
                row,
                expected: FIELD_COUNT,
                found: decoded.len(),
            })?;
            raw_records.push(raw);
        }
        self.clean_records(&raw_records)
    }

    /// Reads the raw export at `input` and overwrites the snapshot at `output`.
    pub fn clean_path(
        &self,
        input: &Path,
        output: &Path,
        delimiter: Option<u8>,
        encoding: &'static Encoding,
    ) -> Result<CleanSummary> {
        let delimiter = io_utils::resolve_input_delimiter(input, delimiter);
        info!(
            "Cleaning '{}' with delimiter '{}'",
            input.display(),
            io_utils::printable_delimiter(delimiter)
        );
        let mut reader = io_utils::open_csv_reader_from_path(input, delimiter)?;
        let (dataset, summary) = self
            .clean_reader(&mut reader, encoding)
            .with_context(|| format!("Cleaning {input:?}"))?;
        dataset
            .save(output)
            .with_context(|| format!("Writing snapshot to {output:?}"))?;
        for (field, count) in &summary.missing {
            info!("{field}: {count} missing value(s)");
        }
        info!("Cleaned {} row(s) written to {:?}", summary.rows, output);
        Ok(summary)
    }

    fn note_unmapped(&self, summary: &mut CleanSummary, raw: &RawRecord, record: &CanonicalRecord) {
        let candidates = [
            (SnowType::FIELD, &raw.snow_type, record.snow_type.is_none()),
            (
                SnowMoisture::FIELD,
                &raw.snow_moisture,
                record.snow_moisture.is_none(),
            ),
        ];
        for (field, text, missing) in candidates {
            if !missing || text.is_empty() {
                continue;
            }
            let count = summary
                .unmapped
                .entry((field, text.clone()))
                .or_insert(0);
            if *count == 0 {
                warn!("Unmapped {field} text '{text}' treated as missing");
            }
            *count += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(snow_type: &str, moisture: &str) -> RawRecord {
        RawRecord {
            timestamp: "12.01.2025 09:14:00".into(),
            location: "  Möserer Steig ".into(),
            air_temp: "-4".into(),
            snow_type: snow_type.into(),
            snow_moisture: moisture.into(),
            wax_brand: "Swix".into(),
            wax_product: "V40".into(),
            rating: "4".into(),
            snow_temp: "".into(),
            layers: "zwei".into(),
        }
    }

    #[test]
    fn clean_record_coerces_and_normalizes() {
        let cleaner = Cleaner::default();
        let record = cleaner
            .clean_record(2, &raw("Neuschnee kalt", "Trocken"))
            .unwrap();
        assert_eq!(record.location, "Möserer Steig");
        assert_eq!(record.air_temp, Some(-4.0));
        assert_eq!(record.snow_type, Some(SnowType::FreshCold));
        assert_eq!(record.snow_moisture, Some(SnowMoisture::Dry));
        assert_eq!(record.rating, Some(4));
        assert_eq!(record.snow_temp, None);
        assert_eq!(record.layers, None);
    }

    #[test]
    fn unmapped_text_becomes_missing_by_default() {
        let cleaner = Cleaner::default();
        let record = cleaner.clean_record(2, &raw("Pulver", "feucht")).unwrap();
        assert_eq!(record.snow_type, None);
        assert_eq!(record.snow_moisture, None);
    }

    #[test]
    fn strict_categories_reject_unmapped_text() {
        let cleaner = Cleaner::default().with_options(CleanOptions {
            category_policy: CategoryPolicy::Strict,
            ..CleanOptions::default()
        });
        let err = cleaner.clean_record(7, &raw("Pulver", "Nass")).unwrap_err();
        assert_eq!(
            err,
            CleanError::UnmappedCategory {
                row: 7,
                field: "snow_type",
                value: "Pulver".into()
            }
        );
        // empty answers are simply missing, even in strict mode
        assert!(cleaner.clean_record(8, &raw("", "")).is_ok());
    }

    #[test]
    fn header_policies() {
        let survey_headers: Vec<String> = (0..FIELD_COUNT).map(|i| format!("Frage {i}")).collect();
        let positional = Cleaner::default();
        assert!(positional.validate_headers(&survey_headers).is_ok());
        assert_eq!(
            positional.validate_headers(&survey_headers[..9]),
            Err(CleanError::ColumnCount {
                row: 1,
                expected: 10,
                found: 9
            })
        );

        let strict = Cleaner::default().with_options(CleanOptions {
            header_policy: HeaderPolicy::Strict,
            ..CleanOptions::default()
        });
        let err = strict.validate_headers(&survey_headers).unwrap_err();
        assert!(matches!(err, CleanError::HeaderMismatch { position: 1, .. }));
        let canonical: Vec<String> = FIELD_NAMES.iter().map(|s| s.to_string()).collect();
        assert!(strict.validate_headers(&canonical).is_ok());
    }

    #[test]
    fn summary_tracks_missing_and_unmapped() {
        let cleaner = Cleaner::default();
        let records = vec![raw("Pulver", "Trocken"), raw("Pulver", "Nass"), raw("", "")];
        let (dataset, summary) = cleaner.clean_records(&records).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.missing_count("snow_type"), 3);
        assert_eq!(summary.missing_count("snow_moisture"), 1);
        assert_eq!(summary.missing_count("layers"), 3);
        assert_eq!(summary.missing_count("rating"), 0);
        assert_eq!(summary.unmapped.get(&("snow_type", "Pulver".to_string())), Some(&2));
        assert_eq!(summary.unmapped.len(), 1);
    }
}
