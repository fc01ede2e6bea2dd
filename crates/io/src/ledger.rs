// Ledger writers: XLSX (file or buffer) and CSV, plus the rejected-rows report

use std::path::Path;

use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Workbook, Worksheet};

use orderfold_recon::export::{ledger_table, LedgerCell};
use orderfold_recon::model::{CanonicalLedgerRow, RejectedRecord};

use crate::error::IoError;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const REJECTED_HEADERS: [&str; 6] = [
    "dataset",
    "order_key",
    "item_name",
    "amount",
    "tracking_number",
    "reason",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerFormat {
    Xlsx,
    Csv,
}

impl LedgerFormat {
    /// Pick the format from an output path; anything but `.csv` is XLSX.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::Csv,
            _ => Self::Xlsx,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Csv => "csv",
        }
    }
}

/// Serialize the ledger in `format` to bytes.
pub fn ledger_bytes(rows: &[CanonicalLedgerRow], format: LedgerFormat) -> Result<Vec<u8>, IoError> {
    match format {
        LedgerFormat::Xlsx => xlsx_bytes(rows),
        LedgerFormat::Csv => csv_bytes(rows),
    }
}

/// Write the ledger to `path`, format chosen by extension.
pub fn write_ledger(rows: &[CanonicalLedgerRow], path: &Path) -> Result<LedgerFormat, IoError> {
    let format = LedgerFormat::from_path(path);
    let bytes = ledger_bytes(rows, format)?;
    std::fs::write(path, bytes)
        .map_err(|e| IoError::Write(format!("{}: {e}", path.display())))?;
    log::info!("wrote {} ledger row(s) to {}", rows.len(), path.display());
    Ok(format)
}

// ---------------------------------------------------------------------------
// XLSX
// ---------------------------------------------------------------------------

fn build_workbook(rows: &[CanonicalLedgerRow]) -> Result<Workbook, IoError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    write_table(worksheet, &ledger_table(rows))?;
    Ok(workbook)
}

fn write_table(worksheet: &mut Worksheet, table: &[Vec<LedgerCell>]) -> Result<(), IoError> {
    for (r, row) in table.iter().enumerate() {
        let row32 = r as u32;
        for (c, cell) in row.iter().enumerate() {
            let col16 = c as u16;
            match cell {
                LedgerCell::Text(s) if s.is_empty() => {}
                LedgerCell::Text(s) => {
                    worksheet
                        .write_string(row32, col16, s)
                        .map_err(|e| IoError::Write(format!("cell ({r}, {c}): {e}")))?;
                }
                LedgerCell::Number(n) => {
                    let value = n.to_f64().ok_or_else(|| {
                        IoError::Write(format!("cell ({r}, {c}): {n} is not representable"))
                    })?;
                    worksheet
                        .write_number(row32, col16, value)
                        .map_err(|e| IoError::Write(format!("cell ({r}, {c}): {e}")))?;
                }
            }
        }
    }
    Ok(())
}

/// The ledger as an in-memory XLSX file.
pub fn xlsx_bytes(rows: &[CanonicalLedgerRow]) -> Result<Vec<u8>, IoError> {
    build_workbook(rows)?
        .save_to_buffer()
        .map_err(|e| IoError::Write(format!("XLSX buffer: {e}")))
}

pub fn write_xlsx(rows: &[CanonicalLedgerRow], path: &Path) -> Result<(), IoError> {
    build_workbook(rows)?
        .save(path)
        .map_err(|e| IoError::Write(format!("{}: {e}", path.display())))
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// The ledger as UTF-8 CSV with a byte-order mark so spreadsheet tools
/// detect the encoding of the CJK headers.
pub fn csv_bytes(rows: &[CanonicalLedgerRow]) -> Result<Vec<u8>, IoError> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_writer(UTF8_BOM.to_vec());
    for row in ledger_table(rows) {
        let record: Vec<String> = row.iter().map(|c| c.to_string()).collect();
        writer
            .write_record(&record)
            .map_err(|e| IoError::Write(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| IoError::Write(e.to_string()))
}

pub fn write_csv(rows: &[CanonicalLedgerRow], path: &Path) -> Result<(), IoError> {
    let bytes = csv_bytes(rows)?;
    std::fs::write(path, bytes).map_err(|e| IoError::Write(format!("{}: {e}", path.display())))
}

/// One line per rejected candidate, for operator review.
pub fn write_rejected_csv(rejected: &[RejectedRecord], path: &Path) -> Result<(), IoError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| IoError::Write(format!("{}: {e}", path.display())))?;
    writer
        .write_record(REJECTED_HEADERS)
        .map_err(|e| IoError::Write(e.to_string()))?;
    for r in rejected {
        let amount = r.amount.normalize().to_string();
        let reason = r.reason.to_string();
        writer
            .write_record([
                r.dataset.as_str(),
                r.key.as_str(),
                r.item_name.as_str(),
                amount.as_str(),
                r.tracking_number.as_str(),
                reason.as_str(),
            ])
            .map_err(|e| IoError::Write(e.to_string()))?;
    }
    writer.flush().map_err(|e| IoError::Write(e.to_string()))?;
    log::info!("wrote {} rejected row(s) to {}", rejected.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{open_workbook_auto, Data, Reader};
    use orderfold_recon::export::LEDGER_HEADERS;
    use orderfold_recon::model::RejectReason;
    use rust_decimal::Decimal;
    use std::fs;
    use tempfile::tempdir;

    fn row(id: &str, amount: &str) -> CanonicalLedgerRow {
        CanonicalLedgerRow {
            order_id: id.into(),
            order_date: "2026-01-05".into(),
            currency: "USD".into(),
            amount: amount.parse().unwrap(),
            item_name: "Cotton Shirt".into(),
            quantity: Decimal::TWO,
            unit_price: "50".parse().unwrap(),
            shop_url: "https://shop".into(),
            tracking_number: "TRK1001".into(),
            carrier: "DHL".into(),
            platform_name: "ETMall".into(),
        }
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(LedgerFormat::from_path(Path::new("out.CSV")), LedgerFormat::Csv);
        assert_eq!(LedgerFormat::from_path(Path::new("out.xlsx")), LedgerFormat::Xlsx);
        assert_eq!(LedgerFormat::from_path(Path::new("out")), LedgerFormat::Xlsx);
    }

    #[test]
    fn test_xlsx_roundtrip_layout() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ledger.xlsx");
        write_xlsx(&[row("1001", "100.5")], &path).unwrap();

        let mut workbook = open_workbook_auto(&path).unwrap();
        let names = workbook.sheet_names().to_vec();
        assert_eq!(names.len(), 1);
        let range = workbook.worksheet_range(&names[0]).unwrap();
        let rows: Vec<&[Data]> = range.rows().collect();
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0][0], Data::String("version".into()));
        assert_eq!(rows[0][1], Data::String("20201013".into()));
        for (cell, header) in rows[1].iter().zip(LEDGER_HEADERS) {
            assert_eq!(cell, &Data::String(header.into()));
        }
        assert_eq!(rows[2][0], Data::String("1001".into()));
        assert_eq!(rows[2][3], Data::Float(100.5));
        assert_eq!(rows[2][5], Data::Float(2.0));
        assert_eq!(rows[2][9], Data::String("DHL".into()));
    }

    #[test]
    fn test_xlsx_bytes_is_zip() {
        let bytes = xlsx_bytes(&[row("1001", "100")]).unwrap();
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_csv_layout() {
        let bytes = csv_bytes(&[row("1001", "100.50")]).unwrap();
        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "version,20201013,,,,,,,,,");
        assert_eq!(lines[1], LEDGER_HEADERS.join(","));
        assert_eq!(
            lines[2],
            "1001,2026-01-05,USD,100.5,Cotton Shirt,2,50,https://shop,TRK1001,DHL,ETMall"
        );
    }

    #[test]
    fn test_write_ledger_picks_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ETMall_0131.csv");
        let format = write_ledger(&[row("1001", "1")], &path).unwrap();
        assert_eq!(format, LedgerFormat::Csv);
        assert!(fs::read(&path).unwrap().starts_with(UTF8_BOM));
    }

    #[test]
    fn test_rejected_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rejected.csv");
        let rejected = vec![RejectedRecord {
            dataset: "statement.csv".into(),
            key: "1004".into(),
            item_name: "Wool Scarf".into(),
            amount: "60.00".parse().unwrap(),
            tracking_number: String::new(),
            reason: RejectReason::NoTrackingNumber,
        }];
        write_rejected_csv(&rejected, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "dataset,order_key,item_name,amount,tracking_number,reason");
        assert_eq!(lines[1], "statement.csv,1004,Wool Scarf,60,,no_tracking_number");
    }
}
