//! In-memory dataset handed over by the loader.

use crate::domain::price_bar::PriceBar;
use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Optional columns the loader found in the source table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetSchema {
    pub foreign_flow: bool,
    pub frequency: bool,
    pub sector: bool,
    pub company_name: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
    pub bars: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Dataset {
    bars: Vec<PriceBar>,
    schema: DatasetSchema,
}

impl Dataset {
    pub fn new(bars: Vec<PriceBar>, schema: DatasetSchema) -> Self {
        Self { bars, schema }
    }

    /// Builds a dataset whose schema is inferred from the bars themselves.
    pub fn from_bars(bars: Vec<PriceBar>) -> Self {
        let schema = DatasetSchema {
            foreign_flow: bars.iter().any(|b| b.net_foreign_flow().is_some()),
            frequency: bars.iter().any(|b| b.frequency.is_some()),
            sector: bars.iter().any(|b| b.sector.is_some()),
            company_name: bars.iter().any(|b| b.company_name.is_some()),
        };
        Self { bars, schema }
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn schema(&self) -> DatasetSchema {
        self.schema
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn codes(&self) -> Vec<String> {
        let unique: BTreeSet<&str> = self.bars.iter().map(|b| b.stock_code.as_str()).collect();
        unique.into_iter().map(str::to_string).collect()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.bars.iter().map(|b| b.trading_date).max()
    }

    pub fn data_range(&self) -> Option<DataRange> {
        range_of(self.bars.iter())
    }

    pub fn code_range(&self, code: &str) -> Option<DataRange> {
        range_of(self.bars.iter().filter(|b| b.stock_code == code))
    }
}

fn range_of<'a>(bars: impl Iterator<Item = &'a PriceBar>) -> Option<DataRange> {
    bars.fold(None, |acc, bar| {
        let date = bar.trading_date;
        Some(match acc {
            None => DataRange {
                first: date,
                last: date,
                bars: 1,
            },
            Some(r) => DataRange {
                first: r.first.min(date),
                last: r.last.max(date),
                bars: r.bars + 1,
            },
        })
    })
}
