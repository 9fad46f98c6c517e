//! Daily price bar for one listed stock.

use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub stock_code: String,
    pub trading_date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub foreign_buy: Option<f64>,
    pub foreign_sell: Option<f64>,
    /// Precomputed net foreign value when the export ships one.
    pub net_foreign: Option<f64>,
    pub frequency: Option<u64>,
    pub sector: Option<String>,
    pub company_name: Option<String>,
}

impl PriceBar {
    pub fn new(
        stock_code: impl Into<String>,
        trading_date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            stock_code: stock_code.into(),
            trading_date,
            open,
            high,
            low,
            close,
            volume,
            foreign_buy: None,
            foreign_sell: None,
            net_foreign: None,
            frequency: None,
            sector: None,
            company_name: None,
        }
    }

    pub fn with_foreign(mut self, buy: f64, sell: f64) -> Self {
        self.foreign_buy = Some(buy);
        self.foreign_sell = Some(sell);
        self
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// ((close - low) - (high - close)) / (high - low), 0 when high == low
    pub fn money_flow_multiplier(&self) -> f64 {
        let range = self.high - self.low;
        if range == 0.0 {
            0.0
        } else {
            ((self.close - self.low) - (self.high - self.close)) / range
        }
    }

    /// foreign_buy - foreign_sell, falling back to the precomputed net column.
    pub fn net_foreign_flow(&self) -> Option<f64> {
        match (self.foreign_buy, self.foreign_sell) {
            (Some(buy), Some(sell)) => Some(buy - sell),
            _ => self.net_foreign,
        }
    }

    /// The first required field that cannot take part in indicator sums.
    pub fn unusable_field(&self) -> Option<&'static str> {
        if !self.high.is_finite() {
            Some("High")
        } else if !self.low.is_finite() {
            Some("Low")
        } else if !self.close.is_finite() {
            Some("Close")
        } else if !self.volume.is_finite() || self.volume < 0.0 {
            Some("Volume")
        } else {
            None
        }
    }
}
