//! CSV dataset adapter.
//!
//! Reads the combined daily export (one row per stock per trading day) and
//! hands back a validated [`Dataset`]. Header names are matched loosely so
//! both the raw export (`Stock Code`, `Last Trading Date`, `Open Price`,
//! `Net Foreign`, ...) and normalised names (`StockCode`, `TradingDate`,
//! `foreign_buy`, ...) load the same way.

use crate::domain::dataset::{Dataset, DatasetSchema};
use crate::domain::error::FlowError;
use crate::domain::price_bar::PriceBar;
use crate::ports::data_port::DatasetPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::Read;
use std::path::PathBuf;

// Slash and dash dates with the year last are day-first, as in IDX exports:
// `01/02/2024` is 1 February.
const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    StockCode,
    TradingDate,
    Open,
    High,
    Low,
    Close,
    Volume,
    ForeignBuy,
    ForeignSell,
    NetForeign,
    Frequency,
    Sector,
    CompanyName,
}

impl Column {
    fn name(self) -> &'static str {
        match self {
            Column::StockCode => "StockCode",
            Column::TradingDate => "TradingDate",
            Column::Open => "Open",
            Column::High => "High",
            Column::Low => "Low",
            Column::Close => "Close",
            Column::Volume => "Volume",
            Column::ForeignBuy => "ForeignBuy",
            Column::ForeignSell => "ForeignSell",
            Column::NetForeign => "NetForeign",
            Column::Frequency => "Frequency",
            Column::Sector => "Sector",
            Column::CompanyName => "CompanyName",
        }
    }

    fn from_header(header: &str) -> Option<Column> {
        let key: String = header
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        let column = match key.as_str() {
            "stockcode" | "code" | "ticker" | "symbol" => Column::StockCode,
            "tradingdate" | "lasttradingdate" | "date" => Column::TradingDate,
            "open" | "openprice" => Column::Open,
            "high" | "highprice" => Column::High,
            "low" | "lowprice" => Column::Low,
            "close" | "closeprice" => Column::Close,
            "volume" => Column::Volume,
            "foreignbuy" => Column::ForeignBuy,
            "foreignsell" => Column::ForeignSell,
            "netforeign" | "netforeignflow" => Column::NetForeign,
            "frequency" => Column::Frequency,
            "sector" => Column::Sector,
            "companyname" => Column::CompanyName,
            _ => return None,
        };
        Some(column)
    }
}

const REQUIRED: [Column; 6] = [
    Column::StockCode,
    Column::Open,
    Column::High,
    Column::Low,
    Column::Close,
    Column::Volume,
];

struct ColumnMap {
    index: HashMap<Column, usize>,
}

impl ColumnMap {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, FlowError> {
        let mut index = HashMap::new();
        for (i, header) in headers.iter().enumerate() {
            if let Some(column) = Column::from_header(header) {
                index.entry(column).or_insert(i);
            }
        }

        if !index.contains_key(&Column::TradingDate) {
            return Err(FlowError::data(
                Column::TradingDate.name(),
                "all",
                "no usable date column (expected TradingDate or Last Trading Date)",
            ));
        }
        for column in REQUIRED {
            if !index.contains_key(&column) {
                return Err(FlowError::data(
                    column.name(),
                    "all",
                    "required column missing from header",
                ));
            }
        }

        Ok(Self { index })
    }

    fn has(&self, column: Column) -> bool {
        self.index.contains_key(&column)
    }

    fn get<'r>(&self, record: &'r csv::StringRecord, column: Column) -> Option<&'r str> {
        self.index
            .get(&column)
            .and_then(|&i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Optional columns present in the header. Foreign flow also needs at
    /// least one row with a value.
    fn schema(&self, bars: &[PriceBar]) -> DatasetSchema {
        let foreign_columns = (self.has(Column::ForeignBuy) && self.has(Column::ForeignSell))
            || self.has(Column::NetForeign);
        DatasetSchema {
            foreign_flow: foreign_columns
                && bars.iter().any(|b| b.net_foreign_flow().is_some()),
            frequency: self.has(Column::Frequency),
            sector: self.has(Column::Sector),
            company_name: self.has(Column::CompanyName),
        }
    }
}

#[derive(Default)]
struct DropCounts {
    bad_date: usize,
    missing_code: usize,
    duplicate: usize,
    // Kept, with NaN in the unparseable fields.
    coerced: usize,
}

pub struct CsvDatasetAdapter {
    path: PathBuf,
}

impl CsvDatasetAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn parse_str(content: &str) -> Result<Dataset, FlowError> {
        parse_reader(content.as_bytes())
    }
}

impl DatasetPort for CsvDatasetAdapter {
    fn load(&self) -> Result<Dataset, FlowError> {
        let content = fs::read_to_string(&self.path).map_err(|e| FlowError::Dataset {
            reason: format!("failed to read {}: {}", self.path.display(), e),
        })?;
        parse_reader(content.as_bytes())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

fn parse_reader<R: Read>(reader: R) -> Result<Dataset, FlowError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().map_err(|e| FlowError::Dataset {
        reason: format!("CSV header error: {}", e),
    })?;
    let columns = ColumnMap::from_headers(headers)?;

    let mut bars = Vec::new();
    let mut seen: HashSet<(String, NaiveDate)> = HashSet::new();
    let mut dropped = DropCounts::default();

    for result in rdr.records() {
        let record = result.map_err(|e| FlowError::Dataset {
            reason: format!("CSV parse error: {}", e),
        })?;
        let line = record.position().map_or(0, |p| p.line());

        let Some(code) = columns.get(&record, Column::StockCode) else {
            dropped.missing_code += 1;
            continue;
        };

        let Some(date) = columns
            .get(&record, Column::TradingDate)
            .and_then(parse_date)
        else {
            log::debug!("line {}: {} has an unparseable trading date", line, code);
            dropped.bad_date += 1;
            continue;
        };

        if !seen.insert((code.to_string(), date)) {
            dropped.duplicate += 1;
            continue;
        }

        let (bar, bad_fields) = build_bar(&columns, &record, code, date);
        if !bad_fields.is_empty() {
            log::warn!(
                "line {}: {} {} has non-numeric {}, kept with missing values",
                line,
                code,
                date,
                bad_fields.join(", ")
            );
            dropped.coerced += 1;
        }
        bars.push(bar);
    }

    report_drops(&dropped);
    let schema = columns.schema(&bars);
    Ok(Dataset::new(bars, schema))
}

fn build_bar(
    columns: &ColumnMap,
    record: &csv::StringRecord,
    code: &str,
    date: NaiveDate,
) -> (PriceBar, Vec<&'static str>) {
    let mut bad_fields = Vec::new();
    let mut required = |column: Column| {
        columns
            .get(record, column)
            .and_then(parse_number)
            .unwrap_or_else(|| {
                bad_fields.push(column.name());
                f64::NAN
            })
    };
    let optional = |column: Column| columns.get(record, column).and_then(parse_number);
    let text = |column: Column| columns.get(record, column).map(str::to_string);

    let open = required(Column::Open);
    let high = required(Column::High);
    let low = required(Column::Low);
    let close = required(Column::Close);
    let volume = required(Column::Volume);

    let mut bar = PriceBar::new(code, date, open, high, low, close, volume);
    bar.foreign_buy = optional(Column::ForeignBuy);
    bar.foreign_sell = optional(Column::ForeignSell);
    bar.net_foreign = optional(Column::NetForeign);
    bar.frequency = optional(Column::Frequency)
        .filter(|f| f.is_finite() && *f >= 0.0)
        .map(|f| f.round() as u64);
    bar.sector = text(Column::Sector);
    bar.company_name = text(Column::CompanyName);
    (bar, bad_fields)
}

fn report_drops(dropped: &DropCounts) {
    if dropped.missing_code > 0 {
        log::warn!("dropped {} rows without a stock code", dropped.missing_code);
    }
    if dropped.bad_date > 0 {
        log::warn!("dropped {} rows with unparseable dates", dropped.bad_date);
    }
    if dropped.coerced > 0 {
        log::warn!(
            "{} rows have non-numeric price or volume, indicators left empty for them",
            dropped.coerced
        );
    }
    if dropped.duplicate > 0 {
        log::warn!("dropped {} duplicate stock/date rows", dropped.duplicate);
    }
}

pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// Parses a number, ignoring thousands separators.
pub(crate) fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value.chars().filter(|&c| c != ',').collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::{compute, IndicatorConfig};
    use crate::domain::query::latest_day_ranking;
    use tempfile::TempDir;

    const EXPORT: &str = "\
Stock Code , Company Name,Sector,Last Trading Date,Open Price,High,Low,Close,Volume,Foreign Buy,Foreign Sell,Frequency
BBCA,Bank Central Asia Tbk.,Finance,2024-01-15,9500,9700,9400,9650,\"12,500,000\",300000,120000,5321
BBCA,Bank Central Asia Tbk.,Finance,2024-01-16,9650,9800,9600,9750,11000000,,,4980
TLKM,Telkom Indonesia (Persero) Tbk.,Infrastructure,2024-01-16,3900,3950,3880,3920,80000000,100,400,12000
";

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_raw_export_headers() {
        let ds = CsvDatasetAdapter::parse_str(EXPORT).unwrap();
        assert_eq!(ds.len(), 3);

        let bar = &ds.bars()[0];
        assert_eq!(bar.stock_code, "BBCA");
        assert_eq!(bar.trading_date, date(2024, 1, 15));
        assert_eq!(bar.open, 9500.0);
        assert_eq!(bar.close, 9650.0);
        assert_eq!(bar.volume, 12_500_000.0);
        assert_eq!(bar.net_foreign_flow(), Some(180_000.0));
        assert_eq!(bar.frequency, Some(5321));
        assert_eq!(bar.sector.as_deref(), Some("Finance"));
        assert_eq!(bar.company_name.as_deref(), Some("Bank Central Asia Tbk."));
    }

    #[test]
    fn schema_reflects_columns() {
        let ds = CsvDatasetAdapter::parse_str(EXPORT).unwrap();
        let schema = ds.schema();
        assert!(schema.foreign_flow);
        assert!(schema.frequency);
        assert!(schema.sector);
        assert!(schema.company_name);
    }

    #[test]
    fn empty_foreign_cells_are_missing() {
        let ds = CsvDatasetAdapter::parse_str(EXPORT).unwrap();
        let bar = &ds.bars()[1];
        assert_eq!(bar.foreign_buy, None);
        assert_eq!(bar.net_foreign_flow(), None);
    }

    #[test]
    fn net_foreign_column_enables_foreign_flow() {
        let csv = "Stock Code,Last Trading Date,Open Price,High,Low,Close,Volume,Net Foreign\n\
                   ASII,2024-02-01,5000,5100,4950,5050,100,-2500\n";
        let ds = CsvDatasetAdapter::parse_str(csv).unwrap();
        assert!(ds.schema().foreign_flow);
        assert_eq!(ds.bars()[0].net_foreign_flow(), Some(-2500.0));
    }

    #[test]
    fn normalised_headers_are_accepted() {
        let csv = "stock_code,trading_date,open,high,low,close,volume\n\
                   ASII,2024-02-01,5000,5100,4950,5050,100\n";
        let ds = CsvDatasetAdapter::parse_str(csv).unwrap();
        assert_eq!(ds.len(), 1);
        assert!(!ds.schema().foreign_flow);
        assert!(!ds.schema().frequency);
    }

    #[test]
    fn missing_date_column_is_reported() {
        let csv = "Stock Code,Open,High,Low,Close,Volume\nASII,1,2,0.5,1.5,10\n";
        let err = CsvDatasetAdapter::parse_str(csv).unwrap_err();
        assert!(matches!(err, FlowError::Data { field, reason, .. }
            if field == "TradingDate" && reason.contains("no usable date column")));
    }

    #[test]
    fn missing_required_column_is_named() {
        let csv = "Stock Code,Date,Open,High,Low,Volume\nASII,2024-02-01,1,2,0.5,10\n";
        let err = CsvDatasetAdapter::parse_str(csv).unwrap_err();
        assert!(matches!(err, FlowError::Data { field, .. } if field == "Close"));
    }

    #[test]
    fn drops_rows_with_invalid_dates() {
        let csv = "Stock Code,Date,Open,High,Low,Close,Volume\n\
                   ASII,2024-02-01,1,2,0.5,1.5,10\n\
                   ASII,not-a-date,1,2,0.5,1.5,10\n\
                   ASII,,1,2,0.5,1.5,10\n";
        let ds = CsvDatasetAdapter::parse_str(csv).unwrap();
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn keeps_rows_with_non_numeric_required_fields() {
        let csv = "Stock Code,Date,Open,High,Low,Close,Volume\n\
                   ASII,2024-02-01,1,2,0.5,1.5,10\n\
                   ASII,2024-02-02,1,2,0.5,n/a,10\n\
                   ASII,2024-02-03,1,2,0.5,1.5,\n\
                   ASII,2024-02-04,1,2,0.5,1.8,10\n";
        let ds = CsvDatasetAdapter::parse_str(csv).unwrap();
        assert_eq!(ds.len(), 4);
        assert!(ds.bars()[1].close.is_nan());
        assert!(ds.bars()[2].volume.is_nan());

        let config = IndicatorConfig::new(1, 1).unwrap();
        let rows = compute(ds.bars(), &config).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows[0].cmf.is_some());
        for row in &rows[1..3] {
            assert!(row.cmf.is_none());
            assert!(row.mfi.is_none());
        }
        assert!(rows[3].cmf.is_some());
    }

    #[test]
    fn empty_foreign_cells_everywhere_disable_foreign_flow() {
        let csv = "StockCode,TradingDate,Open,High,Low,Close,Volume,ForeignBuy,ForeignSell\n\
                   AAAA,2024-02-01,1,2,0.5,1.5,500,,\n\
                   BBBB,2024-02-01,1,2,0.5,1.5,800,,\n";
        let ds = CsvDatasetAdapter::parse_str(csv).unwrap();
        assert!(!ds.schema().foreign_flow);
        assert!(matches!(
            latest_day_ranking(&ds, 25),
            Err(FlowError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn drops_duplicate_code_date_rows_keeping_first() {
        let csv = "Stock Code,Date,Open,High,Low,Close,Volume\n\
                   ASII,2024-02-01,1,2,0.5,1.5,10\n\
                   ASII,2024-02-01,9,9,9,9,99\n\
                   BBRI,2024-02-01,1,2,0.5,1.5,10\n";
        let ds = CsvDatasetAdapter::parse_str(csv).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.bars()[0].volume, 10.0);
    }

    #[test]
    fn drops_rows_without_code() {
        let csv = "Stock Code,Date,Open,High,Low,Close,Volume\n\
                   ,2024-02-01,1,2,0.5,1.5,10\n";
        assert!(CsvDatasetAdapter::parse_str(csv).unwrap().is_empty());
    }

    #[test]
    fn parse_date_formats() {
        assert_eq!(parse_date("2024-03-05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024/03/05"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("05/03/2024"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("05-03-2024"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("2024-03-05 00:00:00"), Some(date(2024, 3, 5)));
        assert_eq!(parse_date("March 5"), None);
    }

    #[test]
    fn ambiguous_slash_dates_are_day_first() {
        assert_eq!(parse_date("01/02/2024"), Some(date(2024, 2, 1)));
        assert_eq!(parse_date("13/02/2024"), Some(date(2024, 2, 13)));
        assert_eq!(parse_date("02/13/2024"), None);
    }

    #[test]
    fn parse_number_strips_thousands_separators() {
        assert_eq!(parse_number("1,234,500"), Some(1_234_500.0));
        assert_eq!(parse_number("-250.5"), Some(-250.5));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("daily.csv");
        fs::write(&path, EXPORT).unwrap();

        let adapter = CsvDatasetAdapter::new(path.clone());
        let ds = adapter.load().unwrap();
        assert_eq!(ds.codes(), vec!["BBCA", "TLKM"]);
        assert_eq!(adapter.describe(), path.display().to_string());
    }

    #[test]
    fn load_missing_file_is_dataset_error() {
        let adapter = CsvDatasetAdapter::new(PathBuf::from("/nonexistent/daily.csv"));
        assert!(matches!(adapter.load(), Err(FlowError::Dataset { .. })));
    }
}
