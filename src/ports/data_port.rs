//! Dataset access port trait.

use crate::domain::dataset::Dataset;
use crate::domain::error::FlowError;

/// Supplies a fully validated dataset: required columns present, numbers
/// coerced, invalid dates and duplicate rows removed.
pub trait DatasetPort {
    fn load(&self) -> Result<Dataset, FlowError>;

    /// Human-readable origin of the data, used in log lines.
    fn describe(&self) -> String {
        "dataset".to_string()
    }
}
