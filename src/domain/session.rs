//! Owned dataset handle with memoised indicator results.
//!
//! A `Session` holds one immutable dataset snapshot. Indicator rows for a
//! `(code, start, end)` selection are computed once and reused until the
//! dataset is reloaded, at which point every memoised result is dropped.

use crate::domain::dataset::Dataset;
use crate::domain::error::FlowError;
use crate::domain::indicator::{self, IndicatorConfig, IndicatorRow};
use crate::domain::query::select_stock_range;
use crate::ports::data_port::DatasetPort;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    pub code: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

pub struct Session {
    dataset: Arc<Dataset>,
    config: IndicatorConfig,
    memo: HashMap<SelectionKey, Arc<Vec<IndicatorRow>>>,
}

impl Session {
    pub fn new(dataset: Dataset, config: IndicatorConfig) -> Self {
        Self {
            dataset: Arc::new(dataset),
            config,
            memo: HashMap::new(),
        }
    }

    pub fn open(port: &dyn DatasetPort, config: IndicatorConfig) -> Result<Self, FlowError> {
        let dataset = port.load()?;
        log::info!("loaded {} rows from {}", dataset.len(), port.describe());
        Ok(Self::new(dataset, config))
    }

    pub fn dataset(&self) -> Arc<Dataset> {
        Arc::clone(&self.dataset)
    }

    pub fn memo_len(&self) -> usize {
        self.memo.len()
    }

    /// Indicator rows for one stock over `[start, end]`.
    pub fn indicators(
        &mut self,
        code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Arc<Vec<IndicatorRow>>, FlowError> {
        let key = SelectionKey {
            code: code.to_string(),
            start,
            end,
        };
        if let Some(rows) = self.memo.get(&key) {
            log::debug!("memo hit for {} {}..{}", code, start, end);
            return Ok(Arc::clone(rows));
        }

        let series = select_stock_range(&self.dataset, code, start, end)?;
        let rows = Arc::new(indicator::compute(&series, &self.config)?);
        self.memo.insert(key, Arc::clone(&rows));
        Ok(rows)
    }

    /// Replace the dataset with a fresh load from `port`.
    ///
    /// The new dataset is fully loaded before the swap; on failure the
    /// current snapshot and memo are kept as they were.
    pub fn reload(&mut self, port: &dyn DatasetPort) -> Result<(), FlowError> {
        let dataset = port.load()?;
        log::info!(
            "reloaded {} rows from {}, dropping {} memoised selections",
            dataset.len(),
            port.describe(),
            self.memo.len()
        );
        self.replace(dataset);
        Ok(())
    }

    pub fn replace(&mut self, dataset: Dataset) {
        self.dataset = Arc::new(dataset);
        self.memo.clear();
    }
}
