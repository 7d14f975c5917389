use crate::naming::ColumnKey;
use crate::series::{defined, ewma, subtract, Column};
use crate::{Indicator, Unavailable};
use rust_decimal::Decimal;

/// MACD output with all three components, index-aligned with the input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MacdColumns {
    pub line: Column,
    pub signal: Column,
    pub histogram: Column,
}

impl MacdColumns {
    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }
}

/// MACD (Moving Average Convergence Divergence).
///
/// - line = EWMA(fast) − EWMA(slow)
/// - signal = EWMA(line, signal)
/// - histogram = line − signal
///
/// The EWMAs have no warm-up, so every point is defined even for series
/// shorter than `slow`. Parameters with `slow <= fast` or a zero period give
/// empty columns.
pub fn macd(closes: &[Decimal], fast: usize, slow: usize, signal: usize) -> MacdColumns {
    if fast == 0 || signal == 0 || slow <= fast || closes.is_empty() {
        return MacdColumns::default();
    }

    let xs = defined(closes);
    let line = subtract(&ewma(&xs, fast), &ewma(&xs, slow));
    let signal_line = ewma(&line, signal);
    let histogram = subtract(&line, &signal_line);

    MacdColumns {
        line,
        signal: signal_line,
        histogram,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self { fast, slow, signal }
    }

    fn validate(&self) -> Result<(), Unavailable> {
        if self.fast == 0 || self.signal == 0 {
            return Err(Unavailable::InvalidParameters {
                message: "MACD periods must be > 0".to_string(),
            });
        }
        if self.slow <= self.fast {
            return Err(Unavailable::InvalidParameters {
                message: format!(
                    "MACD slow period ({}) must exceed fast period ({})",
                    self.slow, self.fast
                ),
            });
        }
        Ok(())
    }
}

impl Indicator for Macd {
    fn columns(&self) -> Vec<ColumnKey> {
        let (fast, slow, signal) = (self.fast, self.slow, self.signal);
        vec![
            ColumnKey::MacdLine { fast, slow, signal },
            ColumnKey::MacdSignal { fast, slow, signal },
            ColumnKey::MacdHistogram { fast, slow, signal },
        ]
    }

    fn period(&self) -> usize {
        1
    }

    fn compute(&self, closes: &[Decimal]) -> Result<Vec<Column>, Unavailable> {
        self.validate()?;
        if closes.len() < self.slow {
            tracing::debug!(
                observations = closes.len(),
                slow = self.slow,
                "MACD computed on a series shorter than its slow period"
            );
        }
        let out = macd(closes, self.fast, self.slow, self.signal);
        Ok(vec![out.line, out.signal, out.histogram])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn closes() -> Vec<Decimal> {
        [10i64, 11, 12, 11, 10, 9, 10, 11, 12, 13, 14, 13, 15, 16, 15]
            .into_iter()
            .map(Decimal::from)
            .collect::<Vec<Decimal>>()
    }

    #[test]
    fn test_histogram_is_line_minus_signal() {
        let out = macd(&closes(), 3, 6, 4);
        assert_eq!(out.line.len(), 15);
        for ((l, s), h) in out.line.iter().zip(&out.signal).zip(&out.histogram) {
            assert_eq!(h.unwrap(), l.unwrap() - s.unwrap());
        }
    }

    #[test]
    fn test_macd_starts_at_zero() {
        // Both EWMAs seed on the first close.
        let out = macd(&closes(), 3, 6, 4);
        assert_eq!(out.line[0], Some(Decimal::ZERO));
        assert_eq!(out.signal[0], Some(Decimal::ZERO));
        assert_eq!(out.histogram[0], Some(Decimal::ZERO));
    }

    #[test]
    fn test_macd_on_series_shorter_than_slow() {
        let out = macd(&closes(), 12, 26, 9);
        assert_eq!(out.line.len(), 15);
        assert!(out.line.iter().all(Option::is_some));
    }

    #[test]
    fn test_macd_rising_series_line_positive() {
        let rising: Vec<Decimal> = (1..=40i64).map(|i| Decimal::from(i) * dec!(1.5)).collect();
        let out = macd(&rising, 12, 26, 9);
        assert!(out.line[1..].iter().all(|v| v.unwrap() > Decimal::ZERO));
    }

    #[test]
    fn test_macd_invalid_periods() {
        assert!(macd(&closes(), 30, 12, 9).is_empty());
        assert!(macd(&closes(), 12, 12, 9).is_empty());
        assert!(macd(&closes(), 0, 12, 9).is_empty());
        assert!(macd(&closes(), 12, 26, 0).is_empty());
        assert!(matches!(
            Macd::new(30, 12, 9).compute(&closes()),
            Err(Unavailable::InvalidParameters { .. })
        ));
    }
}
