//! Canonical dataset and its flat-file snapshot.
//!
//! The snapshot is a comma-separated file whose header row is exactly
//! [`FIELD_NAMES`]. Missing values are empty fields. Reading a snapshot
//! re-applies numeric coercion, so hand edits degrade to missing instead of
//! failing the load.

use std::{
    fs,
    io::{Read, Write},
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use anyhow::{Context, Result, anyhow};
use encoding_rs::UTF_8;
use itertools::Itertools;
use log::{debug, info};

use crate::{
    category::{Category, SnowMoisture, SnowType},
    error::CleanError,
    io_utils,
    record::{CanonicalRecord, FIELD_COUNT, FIELD_NAMES, RawRecord, coerce_float, coerce_integer},
};

const SNAPSHOT_DELIMITER: u8 = b',';

/// Ordered records of one cleaning run, in ingestion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    records: Vec<CanonicalRecord>,
}

impl Dataset {
    pub fn new(records: Vec<CanonicalRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let mut reader = io_utils::open_csv_reader_from_path(path, SNAPSHOT_DELIMITER)?;
        Self::from_reader(&mut reader).with_context(|| format!("Loading snapshot {path:?}"))
    }

    pub fn from_reader<R: Read>(reader: &mut csv::Reader<R>) -> Result<Self> {
        let headers = io_utils::reader_headers(reader, UTF_8)?;
        validate_snapshot_headers(&headers)?;
        let mut records = Vec::new();
        for (idx, record) in reader.byte_records().enumerate() {
            let row = idx + 2;
            let record = record.with_context(|| format!("Reading row {row}"))?;
            let decoded = io_utils::decode_record(&record, UTF_8)?;
            let raw = RawRecord::from_fields(&decoded).ok_or(CleanError::ColumnCount {
                row,
                expected: FIELD_COUNT,
                found: decoded.len(),
            })?;
            records.push(parse_snapshot_record(&raw));
        }
        Ok(Self { records })
    }

    /// Overwrites `path` with this dataset. `-` writes to stdout.
    pub fn save(&self, path: &Path) -> Result<()> {
        io_utils::write_replacing(path, |out| {
            let mut writer = io_utils::csv_writer(out, SNAPSHOT_DELIMITER);
            self.write_records(&mut writer)
        })
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = io_utils::csv_writer(writer, SNAPSHOT_DELIMITER);
        self.write_records(&mut writer)
    }

    fn write_records<W: Write>(&self, writer: &mut csv::Writer<W>) -> Result<()> {
        writer
            .write_record(FIELD_NAMES)
            .context("Writing snapshot header")?;
        for (idx, record) in self.records.iter().enumerate() {
            writer
                .write_record(record.to_fields())
                .with_context(|| format!("Writing row {}", idx + 2))?;
        }
        writer.flush().context("Flushing snapshot")?;
        Ok(())
    }

    /// Distinct non-empty locations, sorted.
    pub fn locations(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.location.as_str())
            .filter(|l| !l.is_empty())
            .unique()
            .sorted()
            .map(str::to_string)
            .collect()
    }

    /// Distinct snow types present, sorted alphabetically by tag.
    pub fn snow_types(&self) -> Vec<SnowType> {
        distinct_by_tag(self.records.iter().filter_map(|r| r.snow_type))
    }

    /// Distinct snow moistures present, sorted alphabetically by tag.
    pub fn snow_moistures(&self) -> Vec<SnowMoisture> {
        distinct_by_tag(self.records.iter().filter_map(|r| r.snow_moisture))
    }
}

fn distinct_by_tag<T: Category + std::hash::Hash>(values: impl Iterator<Item = T>) -> Vec<T> {
    values.unique().sorted_by_key(|v| v.as_str()).collect()
}

fn validate_snapshot_headers(headers: &[String]) -> Result<(), CleanError> {
    if headers.len() != FIELD_COUNT {
        return Err(CleanError::ColumnCount {
            row: 1,
            expected: FIELD_COUNT,
            found: headers.len(),
        });
    }
    match FIELD_NAMES
        .iter()
        .zip(headers)
        .position(|(expected, found)| found != expected)
    {
        Some(idx) => Err(CleanError::HeaderMismatch {
            position: idx + 1,
            expected: FIELD_NAMES[idx],
            found: headers[idx].clone(),
        }),
        None => Ok(()),
    }
}

fn parse_snapshot_record(raw: &RawRecord) -> CanonicalRecord {
    CanonicalRecord {
        timestamp: raw.timestamp.clone(),
        location: raw.location.clone(),
        air_temp: coerce_float(&raw.air_temp),
        snow_type: SnowType::from_tag(&raw.snow_type),
        snow_moisture: SnowMoisture::from_tag(&raw.snow_moisture),
        wax_brand: raw.wax_brand.clone(),
        wax_product: raw.wax_product.clone(),
        rating: coerce_integer(&raw.rating),
        snow_temp: coerce_float(&raw.snow_temp),
        layers: coerce_integer(&raw.layers),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn read(path: &Path) -> Result<Self> {
        let meta = fs::metadata(path).with_context(|| format!("Inspecting snapshot {path:?}"))?;
        Ok(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// Keeps the last loaded snapshot and reloads it whenever the file's
/// modification time or length changes.
#[derive(Debug)]
pub struct SnapshotCache {
    path: PathBuf,
    current: Option<(FileStamp, Arc<Dataset>)>,
    loads: usize,
}

impl SnapshotCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: None,
            loads: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of times the snapshot was read from disk.
    pub fn loads(&self) -> usize {
        self.loads
    }

    pub fn get(&mut self) -> Result<Arc<Dataset>> {
        if io_utils::is_dash(&self.path) {
            return Err(anyhow!("Snapshot cache requires a file path, not stdin"));
        }
        let stamp = FileStamp::read(&self.path)?;
        if let Some((cached, dataset)) = &self.current
            && *cached == stamp
        {
            debug!("Snapshot {:?} unchanged; reusing cached rows", self.path);
            return Ok(Arc::clone(dataset));
        }
        let dataset = Arc::new(Dataset::load(&self.path)?);
        self.loads += 1;
        info!("Loaded {} row(s) from {:?}", dataset.len(), self.path);
        self.current = Some((stamp, Arc::clone(&dataset)));
        Ok(dataset)
    }

    pub fn invalidate(&mut self) {
        self.current = None;
    }
}
