//! Text tables and CSV export for indicator and ranking rows.
//!
//! Number conventions:
//! - prices: 2 decimals, thousands separators
//! - volume, frequency, net foreign: integers, thousands separators
//! - CMF: 4 decimals, MFI: 2 decimals
//! - missing values: `-`

use crate::domain::error::FlowError;
use crate::domain::indicator::IndicatorRow;
use crate::domain::query::RankingRow;
use crate::ports::report_port::ReportPort;
use std::fmt::Write as _;
use std::io::Write;
use std::path::Path;

const MISSING: &str = "-";

/// Formats `value` with `decimals` places and `,` between thousands.
pub fn format_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }
    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3 + 1);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let negative = value < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

pub fn format_optional(value: Option<f64>, decimals: usize, grouped: bool) -> String {
    match value {
        Some(v) if grouped => format_thousands(v, decimals),
        Some(v) => format!("{:.*}", decimals, v),
        None => MISSING.to_string(),
    }
}

/// Indicator table, newest trading day first.
pub fn render_indicator_table(rows: &[IndicatorRow]) -> String {
    let header = [
        "Date", "Open", "High", "Low", "Close", "Volume", "NetForeign", "CMF", "MFI",
    ];
    let body: Vec<Vec<String>> = rows
        .iter()
        .rev()
        .map(|r| {
            vec![
                r.bar.trading_date.to_string(),
                format_thousands(r.bar.open, 2),
                format_thousands(r.bar.high, 2),
                format_thousands(r.bar.low, 2),
                format_thousands(r.bar.close, 2),
                format_thousands(r.bar.volume, 0),
                format_optional(r.bar.net_foreign_flow(), 0, true),
                format_optional(r.cmf, 4, false),
                format_optional(r.mfi, 2, false),
            ]
        })
        .collect();
    render_table(&header, &body)
}

pub fn render_ranking_table(rows: &[RankingRow]) -> String {
    let header = ["#", "Code", "Company", "Close", "Volume", "NetForeign", "Frequency"];
    let body: Vec<Vec<String>> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| {
            vec![
                (i + 1).to_string(),
                r.stock_code.clone(),
                r.company_name.clone().unwrap_or_else(|| MISSING.to_string()),
                format_thousands(r.close, 2),
                format_thousands(r.volume, 0),
                format_optional(r.net_foreign_flow, 0, true),
                r.frequency
                    .map(|f| format_thousands(f as f64, 0))
                    .unwrap_or_else(|| MISSING.to_string()),
            ]
        })
        .collect();
    render_table(&header, &body)
}

fn render_table(header: &[&str], body: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in body {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header_cells: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    push_line(&mut out, &header_cells, &widths);
    let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
    push_line(&mut out, &rule, &widths);
    for row in body {
        push_line(&mut out, row, &widths);
    }
    out
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let line: Vec<String> = cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, (cell, &w))| {
            // First column left-aligned, numbers right-aligned.
            if i == 0 {
                format!("{:<w$}", cell, w = w)
            } else {
                format!("{:>w$}", cell, w = w)
            }
        })
        .collect();
    let _ = writeln!(out, "{}", line.join("  ").trim_end());
}

/// CSV writer with the same columns as the text tables.
pub struct CsvReport;

impl CsvReport {
    pub fn write_indicators_to<W: Write>(
        rows: &[IndicatorRow],
        writer: W,
    ) -> Result<(), FlowError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            "StockCode",
            "TradingDate",
            "Open",
            "High",
            "Low",
            "Close",
            "Volume",
            "TypicalPrice",
            "NetForeign",
            "CMF",
            "MFI",
        ])
        .map_err(csv_error)?;

        for r in rows {
            wtr.write_record([
                r.bar.stock_code.clone(),
                r.bar.trading_date.to_string(),
                r.bar.open.to_string(),
                r.bar.high.to_string(),
                r.bar.low.to_string(),
                r.bar.close.to_string(),
                r.bar.volume.to_string(),
                format!("{:.4}", r.typical_price),
                r.bar
                    .net_foreign_flow()
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
                r.cmf.map(|v| format!("{:.4}", v)).unwrap_or_default(),
                r.mfi.map(|v| format!("{:.2}", v)).unwrap_or_default(),
            ])
            .map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_ranking_to<W: Write>(rows: &[RankingRow], writer: W) -> Result<(), FlowError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record([
            "Rank",
            "StockCode",
            "CompanyName",
            "Close",
            "Volume",
            "NetForeign",
            "Frequency",
        ])
        .map_err(csv_error)?;

        for (i, r) in rows.iter().enumerate() {
            wtr.write_record([
                (i + 1).to_string(),
                r.stock_code.clone(),
                r.company_name.clone().unwrap_or_default(),
                r.close.to_string(),
                r.volume.to_string(),
                r.net_foreign_flow.map(|v| v.to_string()).unwrap_or_default(),
                r.frequency.map(|v| v.to_string()).unwrap_or_default(),
            ])
            .map_err(csv_error)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

impl ReportPort for CsvReport {
    fn write_indicators(&self, rows: &[IndicatorRow], output_path: &Path) -> Result<(), FlowError> {
        let file = std::fs::File::create(output_path)?;
        Self::write_indicators_to(rows, file)
    }

    fn write_ranking(&self, rows: &[RankingRow], output_path: &Path) -> Result<(), FlowError> {
        let file = std::fs::File::create(output_path)?;
        Self::write_ranking_to(rows, file)
    }
}

fn csv_error(e: csv::Error) -> FlowError {
    FlowError::Dataset {
        reason: format!("CSV write error: {}", e),
    }
}
