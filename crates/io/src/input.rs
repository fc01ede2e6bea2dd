// Dataset readers: CSV/TSV text and Excel workbooks into RawDataset

use std::io::Read;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use encoding_rs::{Encoding, BIG5, GB18030, WINDOWS_1252};

use orderfold_recon::model::{CellValue, DatasetWarning, RawDataset, WarningKind};

use crate::error::IoError;

/// Leading bytes of an OLE compound file. Legitimate for `.xls`; under an
/// OOXML extension it means the workbook was saved with a password.
const OLE_MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    /// Zip-based workbook: xlsx, xlsm, xlsb.
    Ooxml,
    /// Other calamine formats: xls, ods.
    Workbook,
    Csv,
    Tsv,
}

impl InputFormat {
    pub fn detect(path: &Path) -> Result<Self, IoError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" => Ok(Self::Ooxml),
            "xls" | "ods" => Ok(Self::Workbook),
            "csv" | "txt" => Ok(Self::Csv),
            "tsv" => Ok(Self::Tsv),
            "" => Err(IoError::UnsupportedFormat(format!(
                "{} has no file extension",
                path.display()
            ))),
            other => Err(IoError::UnsupportedFormat(format!(
                "{} (.{other})",
                path.display()
            ))),
        }
    }
}

/// Outcome of reading a batch of files. Failed files become warnings.
#[derive(Debug, Default)]
pub struct ReadBatch {
    pub datasets: Vec<RawDataset>,
    pub warnings: Vec<DatasetWarning>,
}

fn dataset_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read one file into a dataset. The first row is the header.
pub fn read_dataset(path: &Path) -> Result<RawDataset, IoError> {
    let format = InputFormat::detect(path)?;
    let name = dataset_name(path);

    let (headers, rows) = match format {
        InputFormat::Ooxml => {
            if is_ole_container(path)? {
                return Err(IoError::Encrypted(path.display().to_string()));
            }
            read_workbook(path)?
        }
        InputFormat::Workbook => read_workbook(path)?,
        InputFormat::Csv => {
            let content = read_file_as_utf8(path)?;
            let delimiter = sniff_delimiter(&content);
            read_delimited(&content, delimiter, path)?
        }
        InputFormat::Tsv => {
            let content = read_file_as_utf8(path)?;
            read_delimited(&content, b'\t', path)?
        }
    };

    log::debug!("read '{}': {} column(s), {} row(s)", name, headers.len(), rows.len());
    Ok(RawDataset::new(name, &headers, rows))
}

/// Read every path, collecting failures as `DatasetReadFailure` warnings
/// instead of aborting the batch.
pub fn read_all<P: AsRef<Path>>(paths: &[P]) -> ReadBatch {
    let mut batch = ReadBatch::default();
    for path in paths {
        let path = path.as_ref();
        match read_dataset(path) {
            Ok(ds) => batch.datasets.push(ds),
            Err(e) => {
                log::warn!("skipping {}: {e}", path.display());
                batch.warnings.push(DatasetWarning {
                    dataset: dataset_name(path),
                    kind: WarningKind::DatasetReadFailure,
                    message: e.to_string(),
                });
            }
        }
    }
    batch
}

fn is_ole_container(path: &Path) -> Result<bool, IoError> {
    let mut file = std::fs::File::open(path)
        .map_err(|e| IoError::Open(format!("{}: {e}", path.display())))?;
    let mut magic = [0u8; 8];
    match file.read_exact(&mut magic) {
        Ok(()) => Ok(magic == OLE_MAGIC),
        // Shorter than the magic: not a container; let calamine report it.
        Err(_) => Ok(false),
    }
}

// ---------------------------------------------------------------------------
// Excel
// ---------------------------------------------------------------------------

fn read_workbook(path: &Path) -> Result<(Vec<String>, Vec<Vec<CellValue>>), IoError> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| IoError::Open(format!("{}: {e}", path.display())))?;

    let first = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| IoError::Parse(format!("{} contains no sheets", path.display())))?;

    let range = workbook
        .worksheet_range(&first)
        .map_err(|e| IoError::Parse(format!("{} sheet '{first}': {e}", path.display())))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| IoError::Parse(format!("{} sheet '{first}' is empty", path.display())))?
        .iter()
        .map(|cell| cell_from_data(cell).to_string())
        .collect();

    let data = rows
        .map(|row| row.iter().map(cell_from_data).collect::<Vec<_>>())
        .filter(|row| !row.iter().all(CellValue::is_blank))
        .collect();

    Ok((headers, data))
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::from(s.as_str()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Number(dt.as_f64())),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::from(s.as_str()),
    }
}

// ---------------------------------------------------------------------------
// CSV / TSV
// ---------------------------------------------------------------------------

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with the header's field count, weighted by that count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    log::debug!("sniffed delimiter {:?}", best as char);
    best
}

/// Read a text file and decode it to UTF-8.
///
/// A byte-order mark decides the encoding outright. Otherwise UTF-8, GB18030
/// and Big5 are tried strictly in that order; Windows-1252 is the last resort
/// and never fails.
pub fn read_file_as_utf8(path: &Path) -> Result<String, IoError> {
    let bytes =
        std::fs::read(path).map_err(|e| IoError::Open(format!("{}: {e}", path.display())))?;
    let (text, encoding) = decode_text(&bytes);
    if encoding != encoding_rs::UTF_8 {
        log::debug!("{} decoded as {}", path.display(), encoding.name());
    }
    Ok(text)
}

fn decode_text(bytes: &[u8]) -> (String, &'static Encoding) {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return (text.into_owned(), encoding);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return (s.to_string(), encoding_rs::UTF_8);
    }

    for encoding in [GB18030, BIG5] {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return (text.into_owned(), encoding);
        }
    }

    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    (text.into_owned(), WINDOWS_1252)
}

fn read_delimited(
    content: &str,
    delimiter: u8,
    path: &Path,
) -> Result<(Vec<String>, Vec<Vec<CellValue>>), IoError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let headers: Vec<String> = match records.next() {
        Some(record) => record
            .map_err(|e| IoError::Parse(format!("{}: {e}", path.display())))?
            .iter()
            .map(String::from)
            .collect(),
        None => return Err(IoError::Parse(format!("{} has no header row", path.display()))),
    };

    let mut rows = Vec::new();
    for record in records {
        let record = record.map_err(|e| IoError::Parse(format!("{}: {e}", path.display())))?;
        let row: Vec<CellValue> = record.iter().map(CellValue::from).collect();
        if !row.iter().all(CellValue::is_blank) {
            rows.push(row);
        }
    }

    Ok((headers, rows))
}
