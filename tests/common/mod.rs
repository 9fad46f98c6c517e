#![allow(dead_code)]

use chrono::NaiveDate;
use idxflow::domain::dataset::Dataset;
use idxflow::domain::error::FlowError;
pub use idxflow::domain::price_bar::PriceBar;
use idxflow::ports::data_port::DatasetPort;
use std::cell::Cell;
use std::io::Write;

pub struct MockDatasetPort {
    pub bars: Vec<PriceBar>,
    pub error: Option<String>,
    pub loads: Cell<usize>,
}

impl MockDatasetPort {
    pub fn new() -> Self {
        Self {
            bars: Vec::new(),
            error: None,
            loads: Cell::new(0),
        }
    }

    pub fn with_bars(mut self, bars: Vec<PriceBar>) -> Self {
        self.bars.extend(bars);
        self
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.error = Some(reason.to_string());
        self
    }
}

impl DatasetPort for MockDatasetPort {
    fn load(&self) -> Result<Dataset, FlowError> {
        self.loads.set(self.loads.get() + 1);
        if let Some(reason) = &self.error {
            return Err(FlowError::Dataset {
                reason: reason.clone(),
            });
        }
        Ok(Dataset::from_bars(self.bars.clone()))
    }

    fn describe(&self) -> String {
        "mock".to_string()
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_bar(code: &str, date: &str, close: f64) -> PriceBar {
    PriceBar::new(
        code,
        NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
        close - 5.0,
        close + 10.0,
        close - 10.0,
        close,
        1_000.0,
    )
}

/// Daily bars with a close that oscillates around `start_price`.
pub fn generate_bars(
    code: &str,
    start_date: &str,
    count: usize,
    start_price: f64,
) -> Vec<PriceBar> {
    let start = NaiveDate::parse_from_str(start_date, "%Y-%m-%d").unwrap();
    (0..count)
        .map(|i| {
            let swing = ((i % 5) as f64 - 2.0) * 15.0;
            let close = start_price + i as f64 + swing;
            PriceBar::new(
                code,
                start + chrono::Duration::days(i as i64),
                close - 5.0,
                close + 20.0,
                close - 20.0,
                close,
                10_000.0 + (i % 7) as f64 * 1_500.0,
            )
            .with_foreign(4_000.0 + i as f64 * 10.0, 3_500.0)
        })
        .collect()
}

/// Header of the raw combined export.
pub const EXPORT_HEADER: &str = "Stock Code,Company Name,Last Trading Date,Open Price,\
High,Low,Close,Volume,Frequency,Foreign Buy,Foreign Sell,Sector";

pub fn export_line(bar: &PriceBar) -> String {
    format!(
        "{},{} Tbk,{},{},{},{},{},{},{},{},{},Finance",
        bar.stock_code,
        bar.stock_code,
        bar.trading_date,
        bar.open,
        bar.high,
        bar.low,
        bar.close,
        bar.volume,
        120,
        bar.foreign_buy.unwrap_or(0.0),
        bar.foreign_sell.unwrap_or(0.0),
    )
}

pub fn write_temp_file(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

pub fn write_export(bars: &[PriceBar]) -> tempfile::NamedTempFile {
    let mut content = String::from(EXPORT_HEADER);
    content.push('\n');
    for bar in bars {
        content.push_str(&export_line(bar));
        content.push('\n');
    }
    write_temp_file(&content)
}
