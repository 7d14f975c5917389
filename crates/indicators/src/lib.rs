pub mod assembly;
pub mod config;
pub mod macd;
pub mod naming;
pub mod rsi;
pub mod series;
pub mod sma;

pub use assembly::{assemble, AssemblyError, AugmentedSeries, IndicatorColumn, IndicatorReport, IndicatorStatus};
pub use config::{IndicatorConfig, IndicatorFamily, IndicatorKind, IndicatorSet, ParseConfigError};
pub use naming::{ColumnKey, PRICE_COLUMNS};
pub use series::Column;

use rust_decimal::Decimal;
use serde::Serialize;

/// Why an indicator produced no values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Unavailable {
    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },
    #[error("Insufficient data: need {required} observations, have {available}")]
    InsufficientData { required: usize, available: usize },
}

/// A batch indicator over a close-price series.
///
/// Implementations are pure: the same closes always give the same columns.
pub trait Indicator: Send + Sync {
    /// Keys of the columns produced, in the order `compute` returns them.
    fn columns(&self) -> Vec<ColumnKey>;

    /// The minimum number of observations needed before any output is defined.
    fn period(&self) -> usize;

    /// Compute one column per key, each the same length as `closes`.
    fn compute(&self, closes: &[Decimal]) -> Result<Vec<Column>, Unavailable>;
}
