use crate::naming::ColumnKey;
use crate::series::{defined, diff, rolling_mean_strict, Column};
use crate::{Indicator, Unavailable};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Relative Strength Index over simple (not Wilder-smoothed) average gain/loss.
///
/// The averages use the strict rolling mean, so the first `window` entries
/// are undefined. With no losses in the window RSI saturates at 100; with
/// neither gains nor losses it is undefined. Returns an empty column when
/// `window == 0` or the series is shorter than `window`; a series of exactly
/// `window` closes gives an all-`None` column. Assembly goes through
/// [`Rsi`], which reports anything under `window + 1` closes as
/// [`Unavailable::InsufficientData`].
pub fn rsi(closes: &[Decimal], window: usize) -> Column {
    if window == 0 || closes.len() < window {
        return Vec::new();
    }

    let delta = diff(&defined(closes));
    let gains: Column = delta.iter().map(|d| d.map(|d| d.max(Decimal::ZERO))).collect();
    let losses: Column = delta.iter().map(|d| d.map(|d| (-d).max(Decimal::ZERO))).collect();

    let avg_gain = rolling_mean_strict(&gains, window);
    let avg_loss = rolling_mean_strict(&losses, window);
    if avg_gain.is_empty() {
        // Single observation: no deltas at all.
        return vec![None; closes.len()];
    }

    avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(g, l)| match (g, l) {
            (Some(g), Some(l)) => strength_index(*g, *l),
            _ => None,
        })
        .collect()
}

fn strength_index(avg_gain: Decimal, avg_loss: Decimal) -> Option<Decimal> {
    if avg_loss.is_zero() {
        return if avg_gain.is_zero() { None } else { Some(dec!(100)) };
    }
    let rs = avg_gain / avg_loss;
    Some(dec!(100) - dec!(100) / (Decimal::ONE + rs))
}

/// Relative Strength Index (RSI).
#[derive(Debug, Clone, Copy)]
pub struct Rsi {
    window: usize,
}

impl Rsi {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl Indicator for Rsi {
    fn columns(&self) -> Vec<ColumnKey> {
        vec![ColumnKey::Rsi {
            window: self.window,
        }]
    }

    fn period(&self) -> usize {
        // one extra data point for the first change
        self.window.saturating_add(1)
    }

    fn compute(&self, closes: &[Decimal]) -> Result<Vec<Column>, Unavailable> {
        if self.window == 0 {
            return Err(Unavailable::InvalidParameters {
                message: "RSI window must be > 0".to_string(),
            });
        }
        if closes.len() < self.period() {
            return Err(Unavailable::InsufficientData {
                required: self.period(),
                available: closes.len(),
            });
        }
        Ok(vec![rsi(closes, self.window)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wilder_sample() -> Vec<Decimal> {
        vec![
            dec!(44), dec!(44.34), dec!(44.09), dec!(43.61), dec!(44.33),
            dec!(44.83), dec!(45.10), dec!(45.42), dec!(45.84), dec!(46.08),
            dec!(45.89), dec!(46.03), dec!(45.61), dec!(46.28), dec!(46.28),
            dec!(46.00), dec!(46.03), dec!(46.41), dec!(46.22), dec!(45.64),
        ]
    }

    #[test]
    fn test_rsi_strict_head() {
        let out = rsi(&wilder_sample(), 14);
        assert_eq!(out.len(), 20);
        assert!(out[..14].iter().all(Option::is_none));
        assert!(out[14..].iter().all(Option::is_some));
    }

    #[test]
    fn test_rsi_bounded() {
        for window in [2, 5, 14] {
            for v in rsi(&wilder_sample(), window).into_iter().flatten() {
                assert!(v >= Decimal::ZERO && v <= dec!(100), "rsi {} out of range", v);
            }
        }
    }

    #[test]
    fn test_rsi_first_value() {
        // Over the first 14 changes: gains sum 3.62, losses sum 1.34.
        let out = rsi(&wilder_sample(), 14);
        let expected = dec!(100) - dec!(100) / (Decimal::ONE + dec!(3.62) / dec!(1.34));
        let got = out[14].unwrap();
        assert!((got - expected).abs() < dec!(0.0000001), "got {}", got);
    }

    #[test]
    fn test_rsi_monotonic_increase_saturates() {
        let closes: Vec<Decimal> = (1..=30i64).map(Decimal::from).collect();
        let out = rsi(&closes, 14);
        assert!(out[..14].iter().all(Option::is_none));
        assert!(out[14..].iter().all(|v| *v == Some(dec!(100))));
    }

    #[test]
    fn test_rsi_flat_series_is_undefined() {
        let closes = vec![dec!(50); 20];
        assert!(rsi(&closes, 14).iter().all(Option::is_none));
    }

    #[test]
    fn test_rsi_short_series() {
        assert!(rsi(&[dec!(1), dec!(2)], 14).is_empty());
        assert_eq!(
            Rsi::new(14).compute(&[dec!(1), dec!(2)]),
            Err(Unavailable::InsufficientData {
                required: 15,
                available: 2
            })
        );

        let exact = &wilder_sample()[..14];
        let out = rsi(exact, 14);
        assert_eq!(out.len(), 14);
        assert!(out.iter().all(Option::is_none));
        assert_eq!(
            Rsi::new(14).compute(exact),
            Err(Unavailable::InsufficientData {
                required: 15,
                available: 14
            })
        );
    }
}
