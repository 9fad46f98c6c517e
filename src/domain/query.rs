//! Selection and projection over the loaded dataset.
//!
//! - `select_stock`: one stock's bars in date order
//! - `select_date_range`: inclusive date slice of a series
//! - `latest_day_ranking`: volume leaderboard for the most recent trading day

use crate::domain::dataset::Dataset;
use crate::domain::error::FlowError;
use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;

pub const DEFAULT_RANKING_LIMIT: usize = 25;

#[derive(Debug, Clone, PartialEq)]
pub struct RankingRow {
    pub stock_code: String,
    pub company_name: Option<String>,
    pub close: f64,
    pub volume: f64,
    pub net_foreign_flow: Option<f64>,
    pub frequency: Option<u64>,
}

/// All bars for `code`, stable-sorted ascending by trading date.
///
/// An unknown code yields an empty vector.
pub fn select_stock(dataset: &Dataset, code: &str) -> Vec<PriceBar> {
    let mut bars: Vec<PriceBar> = dataset
        .bars()
        .iter()
        .filter(|b| b.stock_code == code)
        .cloned()
        .collect();
    bars.sort_by_key(|b| b.trading_date);
    bars
}

/// Bars of `series` with `start <= trading_date <= end`.
pub fn select_date_range(
    series: &[PriceBar],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PriceBar>, FlowError> {
    check_order(start, end)?;

    let Some((start, end)) = clamp_range(series, start, end) else {
        return Ok(Vec::new());
    };

    Ok(series
        .iter()
        .filter(|b| b.trading_date >= start && b.trading_date <= end)
        .cloned()
        .collect())
}

/// Narrows `[start, end]` to the dates actually present in `series`.
///
/// Returns `None` when the series is empty or does not overlap the range.
pub fn clamp_range(
    series: &[PriceBar],
    start: NaiveDate,
    end: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    let first = series.iter().map(|b| b.trading_date).min()?;
    let last = series.iter().map(|b| b.trading_date).max()?;
    let start = start.max(first);
    let end = end.min(last);
    (start <= end).then_some((start, end))
}

/// `select_stock` followed by `select_date_range`.
pub fn select_stock_range(
    dataset: &Dataset,
    code: &str,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<PriceBar>, FlowError> {
    select_date_range(&select_stock(dataset, code), start, end)
}

/// Parses `YYYY-MM-DD` bounds; either may be omitted to leave it open.
pub fn parse_date_range(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(NaiveDate, NaiveDate), FlowError> {
    let parse = |value: Option<&str>, fallback: NaiveDate| match value {
        None => Ok(fallback),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            FlowError::InvalidRange {
                start: start.unwrap_or("").to_string(),
                end: end.unwrap_or("").to_string(),
                reason: format!("cannot parse {:?}, expected YYYY-MM-DD", s),
            }
        }),
    };

    let start_date = parse(start, NaiveDate::MIN)?;
    let end_date = parse(end, NaiveDate::MAX)?;
    check_order(start_date, end_date)?;
    Ok((start_date, end_date))
}

/// Top `limit` rows of the most recent trading day, by descending volume.
///
/// The latest day is taken across every stock in the dataset. Rows with
/// equal volume keep their dataset order.
pub fn latest_day_ranking(
    dataset: &Dataset,
    limit: usize,
) -> Result<Vec<RankingRow>, FlowError> {
    if !dataset.schema().foreign_flow {
        return Err(FlowError::UnsupportedOperation {
            operation: "latest_day_ranking".into(),
            reason: "dataset has no foreign flow columns (ForeignBuy/ForeignSell or NetForeign)"
                .into(),
        });
    }

    let Some(latest) = dataset.latest_date() else {
        return Ok(Vec::new());
    };

    let mut rows: Vec<RankingRow> = dataset
        .bars()
        .iter()
        .filter(|b| b.trading_date == latest)
        .map(|b| RankingRow {
            stock_code: b.stock_code.clone(),
            company_name: b.company_name.clone(),
            close: b.close,
            volume: b.volume,
            net_foreign_flow: b.net_foreign_flow(),
            frequency: b.frequency,
        })
        .collect();

    rows.sort_by(|a, b| ranked_volume(b).total_cmp(&ranked_volume(a)));
    rows.truncate(limit);

    log::debug!("ranking for {}: {} rows", latest, rows.len());
    Ok(rows)
}

/// Unparseable volumes rank last.
fn ranked_volume(row: &RankingRow) -> f64 {
    if row.volume.is_finite() {
        row.volume
    } else {
        f64::NEG_INFINITY
    }
}

fn check_order(start: NaiveDate, end: NaiveDate) -> Result<(), FlowError> {
    if start > end {
        return Err(FlowError::InvalidRange {
            start: start.to_string(),
            end: end.to_string(),
            reason: "start date is after end date".into(),
        });
    }
    Ok(())
}
