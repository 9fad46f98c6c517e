//! Money-flow indicator engine.
//!
//! This module provides the per-stock indicator pipeline:
//! - `IndicatorConfig`: window sizes for CMF and MFI
//! - `IndicatorKind`: indicator identity + parameters, used for labels
//! - `IndicatorRow`: a price bar augmented with its derived money-flow fields
//! - `compute`: builds the derived rows for one stock's ordered history
//!
//! Rows are built fresh on every call from a read-only slice; nothing is
//! written back into the source bars.

pub mod cmf;
pub mod mfi;

use crate::domain::error::FlowError;
use crate::domain::price_bar::PriceBar;
use std::fmt;

pub use cmf::calculate_cmf;
pub use mfi::{calculate_mfi, flow_directions, MfiZone};

pub const DEFAULT_CMF_WINDOW: usize = 20;
pub const DEFAULT_MFI_WINDOW: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IndicatorConfig {
    pub cmf_window: usize,
    pub mfi_window: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            cmf_window: DEFAULT_CMF_WINDOW,
            mfi_window: DEFAULT_MFI_WINDOW,
        }
    }
}

impl IndicatorConfig {
    pub fn new(cmf_window: usize, mfi_window: usize) -> Result<Self, FlowError> {
        if cmf_window == 0 {
            return Err(FlowError::ConfigInvalid {
                section: "indicators".into(),
                key: "cmf_window".into(),
                reason: "cmf_window must be at least 1".into(),
            });
        }
        if mfi_window == 0 {
            return Err(FlowError::ConfigInvalid {
                section: "indicators".into(),
                key: "mfi_window".into(),
                reason: "mfi_window must be at least 1".into(),
            });
        }
        Ok(Self {
            cmf_window,
            mfi_window,
        })
    }

    /// Series shorter than this get no indicator values at all.
    pub fn min_history(&self) -> usize {
        self.cmf_window.max(self.mfi_window)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndicatorKind {
    Cmf(usize),
    Mfi(usize),
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Cmf(window) => write!(f, "CMF({})", window),
            IndicatorKind::Mfi(window) => write!(f, "MFI({})", window),
        }
    }
}

/// Typical-price movement against the previous usable bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowDirection {
    Positive,
    Negative,
    Flat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorRow {
    pub bar: PriceBar,
    pub typical_price: f64,
    pub raw_money_flow: f64,
    pub direction: Option<FlowDirection>,
    pub cmf: Option<f64>,
    pub mfi: Option<f64>,
}

/// Compute CMF and MFI for one stock's history.
///
/// `series` must hold a single stock code with strictly ascending trading
/// dates. The output is aligned one-to-one with the input; rows without
/// enough history carry `None`.
pub fn compute(
    series: &[PriceBar],
    config: &IndicatorConfig,
) -> Result<Vec<IndicatorRow>, FlowError> {
    check_series(series)?;

    for bar in series {
        if let Some(field) = bar.unusable_field() {
            log::warn!(
                "{} {}: {} is not a usable number, indicators left empty for this row",
                bar.stock_code,
                bar.trading_date,
                field
            );
        }
    }

    let directions = flow_directions(series);
    let (cmf_values, mfi_values) = if series.len() < config.min_history() {
        log::debug!(
            "only {} bars, need {} for indicators",
            series.len(),
            config.min_history()
        );
        (vec![None; series.len()], vec![None; series.len()])
    } else {
        (
            calculate_cmf(series, config.cmf_window),
            calculate_mfi(series, config.mfi_window),
        )
    };

    let rows = series
        .iter()
        .zip(directions)
        .zip(cmf_values.into_iter().zip(mfi_values))
        .map(|((bar, direction), (cmf, mfi))| {
            let typical_price = bar.typical_price();
            IndicatorRow {
                bar: bar.clone(),
                typical_price,
                raw_money_flow: typical_price * bar.volume,
                direction,
                cmf,
                mfi,
            }
        })
        .collect();

    Ok(rows)
}

/// Drop the leading rows whose MFI is still warming up.
pub fn trim_warmup(rows: Vec<IndicatorRow>) -> Vec<IndicatorRow> {
    let first = rows
        .iter()
        .position(|r| r.mfi.is_some())
        .unwrap_or(rows.len());
    rows.into_iter().skip(first).collect()
}

fn check_series(series: &[PriceBar]) -> Result<(), FlowError> {
    let Some(first) = series.first() else {
        return Ok(());
    };

    for pair in series.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if curr.stock_code != first.stock_code {
            return Err(FlowError::data(
                "StockCode",
                &first.stock_code,
                format!("series mixes {} and {}", first.stock_code, curr.stock_code),
            ));
        }
        if curr.trading_date <= prev.trading_date {
            return Err(FlowError::data(
                "TradingDate",
                &first.stock_code,
                format!(
                    "dates must be strictly ascending, found {} after {}",
                    curr.trading_date, prev.trading_date
                ),
            ));
        }
    }
    Ok(())
}

pub(crate) fn usable(bar: &PriceBar) -> bool {
    bar.unusable_field().is_none()
}
