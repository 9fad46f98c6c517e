//! Report output port trait.

use crate::domain::error::FlowError;
use crate::domain::indicator::IndicatorRow;
use crate::domain::query::RankingRow;
use std::path::Path;

/// Port for exporting selections to a file.
pub trait ReportPort {
    fn write_indicators(&self, rows: &[IndicatorRow], output_path: &Path) -> Result<(), FlowError>;

    fn write_ranking(&self, rows: &[RankingRow], output_path: &Path) -> Result<(), FlowError>;
}
