//! CSV reader/writer construction shared by the cleaner and the snapshot store.
//!
//! - **Delimiter resolution**: `.tsv` inputs default to tab, everything else to
//!   comma, unless a delimiter is supplied.
//! - **Input encoding**: spreadsheet exports are decoded through `encoding_rs`,
//!   defaulting to UTF-8.
//! - **stdin/stdout**: the `-` path reads from stdin or writes to stdout.
//! - **Quoting**: snapshot output quotes only where needed so that missing
//!   values serialize as bare empty fields.

use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use anyhow::{Context, Result, anyhow};
use csv::QuoteStyle;
use encoding_rs::{Encoding, UTF_8};
use tempfile::NamedTempFile;

pub const DEFAULT_CSV_DELIMITER: u8 = b',';
pub const DEFAULT_TSV_DELIMITER: u8 = b'\t';

pub fn is_dash(path: &Path) -> bool {
    path == Path::new("-")
}

pub fn resolve_encoding(label: Option<&str>) -> Result<&'static Encoding> {
    if let Some(value) = label {
        Encoding::for_label(value.trim().as_bytes())
            .ok_or_else(|| anyhow!("Unknown encoding '{value}'"))
    } else {
        Ok(UTF_8)
    }
}

pub fn resolve_input_delimiter(path: &Path, provided: Option<u8>) -> u8 {
    provided.unwrap_or_else(|| match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("tsv") => DEFAULT_TSV_DELIMITER,
        _ => DEFAULT_CSV_DELIMITER,
    })
}

/// Builds a reader that tolerates ragged rows; callers check field counts
/// themselves so they can report the offending row.
pub fn open_csv_reader<R>(reader: R, delimiter: u8) -> csv::Reader<R>
where
    R: Read,
{
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .delimiter(delimiter)
        .double_quote(true)
        .flexible(true);
    builder.from_reader(reader)
}

pub fn open_csv_reader_from_path(path: &Path, delimiter: u8) -> Result<csv::Reader<Box<dyn Read>>> {
    let reader: Box<dyn Read> = if is_dash(path) {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Opening input file {path:?}"))?,
        ))
    };
    Ok(open_csv_reader(reader, delimiter))
}

/// Runs `write` against a temporary file next to `path`, then moves it over
/// `path`. Readers never observe a partially written file. `-` writes to stdout.
pub fn write_replacing<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    if is_dash(path) {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        return write(&mut out);
    }
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("Creating temporary file in {dir:?}"))?;
    {
        let mut out = BufWriter::new(staged.as_file());
        write(&mut out)?;
        out.flush().context("Flushing temporary file")?;
    }
    staged
        .persist(path)
        .with_context(|| format!("Replacing output file {path:?}"))?;
    Ok(())
}

pub fn csv_writer<W: Write>(writer: W, delimiter: u8) -> csv::Writer<W> {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(delimiter)
        .quote_style(QuoteStyle::Necessary)
        .double_quote(true);
    builder.from_writer(writer)
}

pub fn decode_bytes(bytes: &[u8], encoding: &'static Encoding) -> Result<String> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        Err(anyhow!(
            "Failed to decode text with encoding {}",
            encoding.name()
        ))
    } else {
        Ok(text.into_owned())
    }
}

pub fn decode_record(record: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>> {
    record
        .iter()
        .map(|field| decode_bytes(field, encoding))
        .collect()
}

pub fn reader_headers<R>(
    reader: &mut csv::Reader<R>,
    encoding: &'static Encoding,
) -> Result<Vec<String>>
where
    R: Read,
{
    let headers = reader.byte_headers()?.clone();
    decode_record(&headers, encoding)
}

pub fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        other => (other as char).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn tsv_extension_selects_tab() {
        assert_eq!(
            resolve_input_delimiter(&PathBuf::from("export.TSV"), None),
            b'\t'
        );
        assert_eq!(resolve_input_delimiter(&PathBuf::from("export.csv"), None), b',');
        assert_eq!(
            resolve_input_delimiter(&PathBuf::from("export.tsv"), Some(b';')),
            b';'
        );
    }

    #[test]
    fn latin1_fields_decode() {
        let encoding = resolve_encoding(Some("latin1")).unwrap();
        let record = csv::ByteRecord::from(vec![&b"M\xf6serer Steig"[..]]);
        assert_eq!(
            decode_record(&record, encoding).unwrap(),
            vec!["Möserer Steig".to_string()]
        );
    }

    #[test]
    fn unknown_encoding_is_rejected() {
        assert!(resolve_encoding(Some("klingon")).is_err());
    }
}
