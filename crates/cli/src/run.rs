//! `orderfold run` and `orderfold validate`: config layering, the pipeline
//! run, and ledger/report output.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Args, ValueEnum};
use serde::Serialize;

use orderfold_io::ledger::{ledger_bytes, write_rejected_csv, LedgerFormat};
use orderfold_recon::export::suggested_filename;
use orderfold_recon::model::{
    CanonicalLedgerRow, DatasetReport, DatasetWarning, LedgerSummary, RunMeta, RunOutcome,
};
use orderfold_recon::RunConfig;

use crate::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Xlsx,
    Csv,
}

impl From<OutputFormat> for LedgerFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Xlsx => LedgerFormat::Xlsx,
            OutputFormat::Csv => LedgerFormat::Csv,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Input files (xlsx, xlsm, xls, xlsb, ods, csv, tsv, txt)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Run config (TOML); flags below override its values
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,

    /// Shop URL written on every ledger row
    #[arg(long, env = "ORDERFOLD_SHOP_URL")]
    pub shop_url: Option<String>,

    /// Platform name written on every ledger row and used in the file name
    #[arg(long = "platform", env = "ORDERFOLD_PLATFORM")]
    pub platform_name: Option<String>,

    /// Date staleness and the output file name are measured against (YYYY-MM-DD)
    #[arg(long)]
    pub reference_date: Option<NaiveDate>,

    /// Keep returned/cancelled orders instead of rejecting them
    #[arg(long)]
    pub keep_returns: bool,

    /// Item-name keyword marking listings that must never ship
    #[arg(long)]
    pub exclude_keyword: Option<String>,

    /// Reject orders older than --stale-after-days
    #[arg(long)]
    pub exclude_stale: bool,

    /// Age in days beyond which an order is stale
    #[arg(long)]
    pub stale_after_days: Option<u32>,

    /// Ledger-currency units per one unit of the secondary currency
    #[arg(long)]
    pub exchange_rate: Option<f64>,

    /// Secondary currency code for the converted total
    #[arg(long)]
    pub secondary_currency: Option<String>,

    /// Ledger output path [default: <platform>_<MMDD>.<format>]
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Ledger format [default: from --output extension, else xlsx]
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write rejected rows with their reasons to this CSV file
    #[arg(long)]
    pub rejected: Option<PathBuf>,

    /// Output the run summary as JSON to stdout instead of the human summary
    #[arg(long)]
    pub json: bool,

    /// Number of ledger rows to preview
    #[arg(long, default_value_t = 5)]
    pub preview: usize,
}

// ---------------------------------------------------------------------------
// Config layering
// ---------------------------------------------------------------------------

/// Load the run file (if any) and apply command-line overrides, then validate.
pub fn resolve_config(args: &RunArgs) -> Result<RunConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path).map_err(|e| {
                CliError::config(format!("cannot read config {}: {e}", path.display()))
            })?;
            RunConfig::from_toml_unchecked(&text)?
        }
        None => RunConfig::default(),
    };

    if let Some(url) = &args.shop_url {
        config.shop_url = url.clone();
    }
    if let Some(name) = &args.platform_name {
        config.platform_name = name.clone();
    }
    if args.reference_date.is_some() {
        config.reference_date = args.reference_date;
    }
    if args.keep_returns {
        config.exclusions.return_or_cancelled = false;
    }
    if let Some(keyword) = &args.exclude_keyword {
        config.exclusions.keyword = keyword.clone();
    }
    if args.exclude_stale {
        config.exclusions.stale_orders = true;
    }
    if let Some(days) = args.stale_after_days {
        config.exclusions.stale_after_days = days;
    }
    if args.exchange_rate.is_some() {
        config.currency.exchange_rate = args.exchange_rate;
    }
    if let Some(code) = &args.secondary_currency {
        config.currency.secondary = code.clone();
    }

    config.validate().map_err(|e| {
        let err = CliError::from(e);
        if args.config.is_none() {
            err.with_hint("pass --config run.toml or both --shop-url and --platform")
        } else {
            err
        }
    })?;
    Ok(config)
}

/// Where the ledger goes and in which format.
fn resolve_output(
    args: &RunArgs,
    platform_name: &str,
    reference_date: NaiveDate,
) -> Result<(PathBuf, LedgerFormat), CliError> {
    match (&args.output, args.format) {
        (Some(path), None) => Ok((path.clone(), LedgerFormat::from_path(path))),
        (Some(path), Some(format)) => {
            let format = LedgerFormat::from(format);
            let has_ext = path.extension().is_some();
            if has_ext && LedgerFormat::from_path(path) != format {
                return Err(CliError::args(format!(
                    "--format {} conflicts with output path {}",
                    format.extension(),
                    path.display()
                )));
            }
            Ok((path.clone(), format))
        }
        (None, format) => {
            let format = format.map(LedgerFormat::from).unwrap_or(LedgerFormat::Xlsx);
            let name = suggested_filename(platform_name, reference_date, format.extension());
            Ok((PathBuf::from(name), format))
        }
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct RunReport<'a> {
    meta: &'a RunMeta,
    datasets: &'a [DatasetReport],
    summary: &'a LedgerSummary,
    warnings: &'a [DatasetWarning],
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejected_report: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diagnostic: Option<&'static str>,
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = resolve_config(&args)?;

    let batch = orderfold_io::read_all(&args.files);
    if batch.datasets.is_empty() {
        let detail = batch
            .warnings
            .iter()
            .map(|w| w.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        return Err(CliError::input(format!("no input file could be read: {detail}")));
    }

    let mut outcome = orderfold_recon::run(&config, &batch.datasets)?;
    let mut warnings = batch.warnings;
    warnings.append(&mut outcome.warnings);
    outcome.warnings = warnings;

    let (out_path, format) =
        resolve_output(&args, &config.platform_name, outcome.meta.reference_date)?;

    let written = if outcome.ledger.is_empty() {
        None
    } else {
        let bytes = ledger_bytes(&outcome.ledger, format)?;
        std::fs::write(&out_path, bytes).map_err(|e| {
            CliError::output(format!("cannot write {}: {e}", out_path.display()))
        })?;
        Some(out_path)
    };

    if let Some(path) = &args.rejected {
        write_rejected_csv(&outcome.rejected, path)?;
    }

    if args.json {
        let report = RunReport {
            meta: &outcome.meta,
            datasets: &outcome.datasets,
            summary: &outcome.summary,
            warnings: &outcome.warnings,
            output: written.as_ref().map(|p| p.display().to_string()),
            rejected_report: args.rejected.as_ref().map(|p| p.display().to_string()),
            diagnostic: outcome.diagnostic(),
        };
        let json = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json}");
        return Ok(());
    }

    print_summary(&outcome, written.as_deref(), args.rejected.as_deref());
    if args.preview > 0 && !outcome.ledger.is_empty() {
        print_preview(&outcome.ledger, args.preview);
    }
    Ok(())
}

fn print_summary(outcome: &RunOutcome, written: Option<&Path>, rejected: Option<&Path>) {
    for ds in &outcome.datasets {
        eprintln!("  {:<32} {:<15} {} row(s)", ds.name, ds.shape.to_string(), ds.rows);
    }
    for w in &outcome.warnings {
        eprintln!("warning: {}: {}", w.dataset, w.message);
    }

    let s = &outcome.summary;
    eprintln!(
        "accepted {} row(s), total {:.2}; rejected {} row(s), total {:.2}",
        s.accepted_count, s.accepted_sum, s.rejected_count, s.rejected_sum,
    );
    if let (Some(sum), Some(code)) = (&s.secondary_sum, &s.secondary_currency) {
        eprintln!("accepted total in {code}: {sum:.2}");
    }
    if !s.rejected_by_reason.is_empty() {
        let parts: Vec<String> =
            s.rejected_by_reason.iter().map(|(r, n)| format!("{r}={n}")).collect();
        eprintln!("rejected by reason: {}", parts.join(", "));
    }

    match written {
        Some(path) => eprintln!("wrote {}", path.display()),
        None => {
            if let Some(msg) = outcome.diagnostic() {
                eprintln!("{msg}");
            }
        }
    }
    if let Some(path) = rejected {
        eprintln!("wrote {}", path.display());
    }
}

fn print_preview(rows: &[CanonicalLedgerRow], limit: usize) {
    println!(
        "{:<16} {:<10} {:<4} {:>12} {:>6} {:>10}  {:<18} {:<12} {}",
        "order_id", "date", "cur", "amount", "qty", "unit", "tracking", "carrier", "item"
    );
    for row in rows.iter().take(limit) {
        println!(
            "{:<16} {:<10} {:<4} {:>12.2} {:>6} {:>10.2}  {:<18} {:<12} {}",
            row.order_id,
            row.order_date,
            row.currency,
            row.amount,
            row.quantity.normalize(),
            row.unit_price,
            row.tracking_number,
            row.carrier,
            row.item_name,
        );
    }
    if rows.len() > limit {
        println!("... {} more row(s)", rows.len() - limit);
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

pub fn cmd_validate(config_path: PathBuf) -> Result<(), CliError> {
    let text = std::fs::read_to_string(&config_path).map_err(|e| {
        CliError::config(format!("cannot read config {}: {e}", config_path.display()))
    })?;
    let config = RunConfig::from_toml(&text)?;

    eprintln!("ok: {}", config_path.display());
    eprintln!("  shop_url:         {}", config.shop_url);
    eprintln!("  platform_name:    {}", config.platform_name);
    eprintln!(
        "  exclusions:       returns={} keyword={:?} stale={}",
        config.exclusions.return_or_cancelled,
        config.exclusions.keyword,
        if config.exclusions.stale_orders {
            format!("> {} days", config.exclusions.stale_after_days)
        } else {
            "off".to_string()
        },
    );
    if let Some(rate) = config.currency.exchange_rate {
        eprintln!("  exchange_rate:    {rate} per {}", config.currency.secondary);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args_with(config: Option<PathBuf>) -> RunArgs {
        RunArgs {
            files: vec![PathBuf::from("in.csv")],
            config,
            preview: 5,
            ..RunArgs::default()
        }
    }

    #[test]
    fn flags_override_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(
            &path,
            "shop_url = \"https://a\"\nplatform_name = \"A\"\n[exclusions]\nstale_after_days = 30\n",
        )
        .unwrap();

        let mut args = args_with(Some(path));
        args.platform_name = Some("B".into());
        args.keep_returns = true;
        args.exchange_rate = Some(31.5);
        let config = resolve_config(&args).unwrap();

        assert_eq!(config.shop_url, "https://a");
        assert_eq!(config.platform_name, "B");
        assert!(!config.exclusions.return_or_cancelled);
        assert_eq!(config.exclusions.stale_after_days, 30);
        assert_eq!(config.currency.exchange_rate, Some(31.5));
    }

    #[test]
    fn flags_alone_are_enough() {
        let mut args = args_with(None);
        args.shop_url = Some("https://a".into());
        args.platform_name = Some("A".into());
        assert!(resolve_config(&args).is_ok());
    }

    #[test]
    fn missing_shop_url_is_config_error() {
        let err = resolve_config(&args_with(None)).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_INVALID_CONFIG);
        assert!(err.hint.is_some());
    }

    #[test]
    fn bad_exchange_rate_flag_is_config_error() {
        let mut args = args_with(None);
        args.shop_url = Some("https://a".into());
        args.platform_name = Some("A".into());
        args.exchange_rate = Some(0.0);
        let err = resolve_config(&args).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_INVALID_CONFIG);
    }

    #[test]
    fn default_output_name() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let args = args_with(None);
        let (path, format) = resolve_output(&args, "ETMall", date).unwrap();
        assert_eq!(path, PathBuf::from("ETMall_0131.xlsx"));
        assert_eq!(format, LedgerFormat::Xlsx);

        let args = RunArgs { format: Some(OutputFormat::Csv), ..args_with(None) };
        let (path, _) = resolve_output(&args, "ETMall", date).unwrap();
        assert_eq!(path, PathBuf::from("ETMall_0131.csv"));
    }

    #[test]
    fn format_conflicting_with_extension() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let args = RunArgs {
            output: Some(PathBuf::from("out.xlsx")),
            format: Some(OutputFormat::Csv),
            ..args_with(None)
        };
        let err = resolve_output(&args, "ETMall", date).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_USAGE);
    }
}
