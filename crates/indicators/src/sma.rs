use crate::naming::ColumnKey;
use crate::series::{defined, rolling_mean, Column};
use crate::{Indicator, Unavailable};
use rust_decimal::Decimal;

/// Simple moving average of closes with the relaxed head policy of
/// [`rolling_mean`]. Empty when `window == 0`.
pub fn sma(closes: &[Decimal], window: usize) -> Column {
    rolling_mean(&defined(closes), window)
}

/// Simple Moving Average (SMA).
#[derive(Debug, Clone, Copy)]
pub struct Sma {
    window: usize,
}

impl Sma {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Indicator for Sma {
    fn columns(&self) -> Vec<ColumnKey> {
        vec![ColumnKey::Sma {
            window: self.window,
        }]
    }

    fn period(&self) -> usize {
        1
    }

    fn compute(&self, closes: &[Decimal]) -> Result<Vec<Column>, Unavailable> {
        if self.window == 0 {
            return Err(Unavailable::InvalidParameters {
                message: "SMA window must be > 0".to_string(),
            });
        }
        Ok(vec![sma(closes, self.window)])
    }
}
