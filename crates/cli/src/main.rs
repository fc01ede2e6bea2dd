// orderfold CLI - reconcile marketplace order exports into an upload ledger

mod exit_codes;
mod inspect;
mod run;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand};

use orderfold_io::IoError;
use orderfold_recon::ReconError;

use exit_codes::{
    EXIT_ERROR, EXIT_INPUT_READ, EXIT_INVALID_CONFIG, EXIT_NO_USABLE_DATA, EXIT_OUTPUT_WRITE,
    EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "orderfold")]
#[command(about = "Reconcile marketplace order exports into an upload ledger")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log verbosity: -v for progress, -vv for per-row decisions (RUST_LOG overrides)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile input files and write the upload ledger
    #[command(after_help = "\
Examples:
  orderfold run statement.xlsx orders.xlsx --config run.toml
  orderfold run unified.xlsx --shop-url https://shop.example/ms/1 --platform ETMall
  orderfold run *.csv -c run.toml -o ledger.csv --rejected rejected.csv
  orderfold run statement.csv orders.csv -c run.toml --json")]
    Run(run::RunArgs),

    /// Read and classify input files without producing a ledger
    #[command(after_help = "\
Examples:
  orderfold inspect statement.xlsx orders.xlsx
  orderfold inspect exports/*.csv --json")]
    Inspect {
        /// Input files (xlsx, xlsm, xls, xlsb, ods, csv, tsv, txt)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output JSON to stdout instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Parse and validate a run config without running
    #[command(after_help = "\
Examples:
  orderfold validate run.toml")]
    Validate {
        /// Path to the run config (TOML)
        config: PathBuf,
    },
}

fn long_version() -> &'static str {
    if cfg!(debug_assertions) {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  orderfold-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   debug",
            "\ntarget:  ", env!("TARGET"),
        )
    } else {
        concat!(
            env!("CARGO_PKG_VERSION"),
            " (", env!("GIT_COMMIT_HASH"), ")",
            "\nengine:  orderfold-recon ", env!("CARGO_PKG_VERSION"),
            "\nbuild:   release",
            "\ntarget:  ", env!("TARGET"),
        )
    }
}

fn init_logging(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run(args) => run::cmd_run(args),
        Commands::Inspect { files, json } => inspect::cmd_inspect(files, json),
        Commands::Validate { config } => run::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn no_data(msg: impl Into<String>) -> Self {
        Self { code: EXIT_NO_USABLE_DATA, message: msg.into(), hint: None }
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INPUT_READ, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_INVALID_CONFIG, message: msg.into(), hint: None }
    }

    pub fn output(msg: impl Into<String>) -> Self {
        Self { code: EXIT_OUTPUT_WRITE, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ReconError> for CliError {
    fn from(err: ReconError) -> Self {
        match err {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => {
                CliError::config(err.to_string())
                    .with_hint("run `orderfold validate <run.toml>` to check the config")
            }
            ReconError::NoUsableData(_) => CliError::no_data(err.to_string()).with_hint(
                "inputs must be a channel statement (渠道单号), an order list (客户订单号) \
                 or a unified export (出貨指示日 + 訂單編號); see `orderfold inspect`",
            ),
        }
    }
}

impl From<IoError> for CliError {
    fn from(err: IoError) -> Self {
        match err {
            IoError::Write(_) => CliError::output(err.to_string()),
            IoError::Encrypted(_) => CliError::input(err.to_string())
                .with_hint("remove the workbook password in Excel and save a copy"),
            _ => CliError::input(err.to_string()),
        }
    }
}
