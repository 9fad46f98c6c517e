//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvDatasetAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::table_report::{
    format_optional, render_indicator_table, render_ranking_table, CsvReport,
};
use crate::domain::config_validation::{dataset_path, validate_config};
use crate::domain::error::FlowError;
use crate::domain::indicator::{
    trim_warmup, IndicatorConfig, IndicatorKind, IndicatorRow, MfiZone, DEFAULT_CMF_WINDOW,
    DEFAULT_MFI_WINDOW,
};
use crate::domain::query::{latest_day_ranking, parse_date_range, DEFAULT_RANKING_LIMIT};
use crate::domain::session::Session;
use crate::ports::config_port::ConfigPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "idxflow", about = "Money-flow indicators for IDX daily stock data")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show CMF and MFI for one stock
    Indicators {
        #[arg(long)]
        code: String,
        /// First trading date, YYYY-MM-DD
        #[arg(long)]
        start: Option<String>,
        /// Last trading date, YYYY-MM-DD
        #[arg(long)]
        end: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(long)]
        cmf_window: Option<usize>,
        #[arg(long)]
        mfi_window: Option<usize>,
        /// Drop leading rows without an MFI value
        #[arg(long)]
        trim_warmup: bool,
        /// Write the rows to a CSV file instead of printing a table
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Rank the latest trading day by volume
    Ranking {
        #[arg(short, long)]
        limit: Option<usize>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// List stock codes in the dataset
    Codes {
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
    /// Show data range for the dataset or one stock
    Info {
        #[arg(long)]
        code: Option<String>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(short, long)]
        data: Option<PathBuf>,
    },
}

/// Command-line values that take precedence over the INI file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub data: Option<PathBuf>,
    pub cmf_window: Option<usize>,
    pub mfi_window: Option<usize>,
    pub trim_warmup: bool,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub dataset_path: PathBuf,
    pub indicators: IndicatorConfig,
    pub trim_warmup: bool,
    pub ranking_limit: usize,
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Indicators {
            code,
            start,
            end,
            config,
            data,
            cmf_window,
            mfi_window,
            trim_warmup,
            csv,
        } => {
            let overrides = Overrides {
                data,
                cmf_window,
                mfi_window,
                trim_warmup,
                limit: None,
            };
            run_indicators(
                &code,
                start.as_deref(),
                end.as_deref(),
                config.as_deref(),
                &overrides,
                csv.as_deref(),
            )
        }
        Command::Ranking {
            limit,
            config,
            data,
            csv,
        } => {
            let overrides = Overrides {
                data,
                limit,
                ..Overrides::default()
            };
            run_ranking(config.as_deref(), &overrides, csv.as_deref())
        }
        Command::Codes { config, data } => {
            let overrides = Overrides {
                data,
                ..Overrides::default()
            };
            run_codes(config.as_deref(), &overrides)
        }
        Command::Info { code, config, data } => {
            let overrides = Overrides {
                data,
                ..Overrides::default()
            };
            run_info(code.as_deref(), config.as_deref(), &overrides)
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = FlowError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Merges the INI values with command-line overrides.
///
/// Without a config file every setting falls back to its default, except
/// the dataset path which must then come from `--data`.
pub fn build_settings(
    config: &dyn ConfigPort,
    overrides: &Overrides,
) -> Result<Settings, FlowError> {
    validate_config(config)?;

    let dataset_path = dataset_path(config, overrides.data.as_deref())?;

    let cmf_window = match overrides.cmf_window {
        Some(w) => w,
        None => config_usize(config, "indicators", "cmf_window", DEFAULT_CMF_WINDOW)?,
    };
    let mfi_window = match overrides.mfi_window {
        Some(w) => w,
        None => config_usize(config, "indicators", "mfi_window", DEFAULT_MFI_WINDOW)?,
    };
    let indicators = IndicatorConfig::new(cmf_window, mfi_window)?;

    let trim_warmup =
        overrides.trim_warmup || config.get_bool("indicators", "trim_warmup", false);

    let ranking_limit = match overrides.limit {
        Some(0) => {
            return Err(FlowError::ConfigInvalid {
                section: "ranking".into(),
                key: "limit".into(),
                reason: "limit must be a positive integer".into(),
            });
        }
        Some(n) => n,
        None => config_usize(config, "ranking", "limit", DEFAULT_RANKING_LIMIT)?,
    };

    Ok(Settings {
        dataset_path,
        indicators,
        trim_warmup,
        ranking_limit,
    })
}

fn config_usize(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, FlowError> {
    let value = config.get_int(section, key, default as i64);
    usize::try_from(value).map_err(|_| FlowError::ConfigInvalid {
        section: section.into(),
        key: key.into(),
        reason: format!("{} must be a positive integer", key),
    })
}

/// Stock codes are matched exactly; the CLI accepts them in any case.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}

fn resolve_settings(
    config_path: Option<&Path>,
    overrides: &Overrides,
) -> Result<Settings, ExitCode> {
    let adapter = match config_path {
        Some(path) => {
            eprintln!("Loading config from {}", path.display());
            load_config(path)?
        }
        None => FileConfigAdapter::empty(),
    };
    build_settings(&adapter, overrides).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn open_session(settings: &Settings) -> Result<Session, ExitCode> {
    eprintln!("Loading dataset from {}", settings.dataset_path.display());
    let port = CsvDatasetAdapter::new(settings.dataset_path.clone());
    Session::open(&port, settings.indicators).map_err(|e| {
        eprintln!("error: {e}");
        ExitCode::from(&e)
    })
}

fn run_indicators(
    code: &str,
    start: Option<&str>,
    end: Option<&str>,
    config_path: Option<&Path>,
    overrides: &Overrides,
    csv_path: Option<&Path>,
) -> ExitCode {
    let settings = match resolve_settings(config_path, overrides) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let (start_date, end_date) = match parse_date_range(start, end) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let mut session = match open_session(&settings) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let code = normalize_code(code);
    let rows = match session.indicators(&code, start_date, end_date) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if rows.is_empty() {
        eprintln!("No data found for stock {}", code);
        return ExitCode::SUCCESS;
    }

    let total = rows.len();
    let rows: Vec<IndicatorRow> = if settings.trim_warmup {
        trim_warmup(rows.to_vec())
    } else {
        rows.to_vec()
    };

    let min_history = settings.indicators.min_history();
    if total < min_history {
        eprintln!(
            "{}: only {} bars in range, {} needed for {} and {}",
            code,
            total,
            min_history,
            IndicatorKind::Cmf(settings.indicators.cmf_window),
            IndicatorKind::Mfi(settings.indicators.mfi_window),
        );
    }

    if let Some(path) = csv_path {
        if let Err(e) = CsvReport.write_indicators(&rows, path) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Wrote {} rows to {}", rows.len(), path.display());
        return ExitCode::SUCCESS;
    }

    print_summary(&code, &rows, &settings.indicators);
    print!("{}", render_indicator_table(&rows));
    ExitCode::SUCCESS
}

fn print_summary(code: &str, rows: &[IndicatorRow], config: &IndicatorConfig) {
    let (Some(first), Some(last)) = (rows.first(), rows.last()) else {
        return;
    };
    let name = last
        .bar
        .company_name
        .as_deref()
        .map(|n| format!(" ({})", n))
        .unwrap_or_default();
    println!(
        "{}{}: {} bars, {} to {}",
        code,
        name,
        rows.len(),
        first.bar.trading_date,
        last.bar.trading_date
    );

    let zone = last
        .mfi
        .map(|m| format!(" [{}]", MfiZone::classify(m).label()))
        .unwrap_or_default();
    println!(
        "Latest {} = {}, {} = {}{}",
        IndicatorKind::Cmf(config.cmf_window),
        format_optional(last.cmf, 4, false),
        IndicatorKind::Mfi(config.mfi_window),
        format_optional(last.mfi, 2, false),
        zone
    );
    println!();
}

fn run_ranking(
    config_path: Option<&Path>,
    overrides: &Overrides,
    csv_path: Option<&Path>,
) -> ExitCode {
    let settings = match resolve_settings(config_path, overrides) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let session = match open_session(&settings) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let dataset = session.dataset();

    let rows = match latest_day_ranking(&dataset, settings.ranking_limit) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    if rows.is_empty() {
        eprintln!("No trading days in dataset");
        return ExitCode::SUCCESS;
    }

    if let Some(path) = csv_path {
        if let Err(e) = CsvReport.write_ranking(&rows, path) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Wrote {} rows to {}", rows.len(), path.display());
        return ExitCode::SUCCESS;
    }

    if let Some(latest) = dataset.latest_date() {
        println!("Top {} by volume on {}", rows.len(), latest);
        println!();
    }
    print!("{}", render_ranking_table(&rows));
    ExitCode::SUCCESS
}

fn run_codes(config_path: Option<&Path>, overrides: &Overrides) -> ExitCode {
    let settings = match resolve_settings(config_path, overrides) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let session = match open_session(&settings) {
        Ok(s) => s,
        Err(code) => return code,
    };

    let codes = session.dataset().codes();
    if codes.is_empty() {
        eprintln!("No stock codes found");
        return ExitCode::SUCCESS;
    }
    for code in &codes {
        println!("{}", code);
    }
    eprintln!("{} codes", codes.len());
    ExitCode::SUCCESS
}

fn run_info(code: Option<&str>, config_path: Option<&Path>, overrides: &Overrides) -> ExitCode {
    let settings = match resolve_settings(config_path, overrides) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let session = match open_session(&settings) {
        Ok(s) => s,
        Err(code) => return code,
    };
    let dataset = session.dataset();

    if let Some(code) = code {
        let code = normalize_code(code);
        match dataset.code_range(&code) {
            Some(range) => println!(
                "{}: {} bars, {} to {}",
                code, range.bars, range.first, range.last
            ),
            None => eprintln!("{}: no data found", code),
        }
        return ExitCode::SUCCESS;
    }

    let Some(range) = dataset.data_range() else {
        eprintln!("Dataset is empty");
        return ExitCode::SUCCESS;
    };
    let schema = dataset.schema();
    let yes_no = |present: bool| if present { "yes" } else { "no" };
    println!(
        "{} rows, {} codes, {} to {}",
        range.bars,
        dataset.codes().len(),
        range.first,
        range.last
    );
    println!("foreign flow: {}", yes_no(schema.foreign_flow));
    println!("frequency:    {}", yes_no(schema.frequency));
    println!("sector:       {}", yes_no(schema.sector));
    println!("company name: {}", yes_no(schema.company_name));
    ExitCode::SUCCESS
}
