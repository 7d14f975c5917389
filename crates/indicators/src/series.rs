//! Numeric primitives over date-aligned sequences.
//!
//! A [`Column`] holds one slot per observation; `None` marks "no value".

use rust_decimal::Decimal;

/// One value slot per observation, aligned with the source series.
pub type Column = Vec<Option<Decimal>>;

/// Lift a fully defined sequence into a [`Column`].
pub fn defined(values: &[Decimal]) -> Column {
    values.iter().copied().map(Some).collect()
}

/// Running state for a trailing window over optional values.
struct Window {
    len: usize,
    sum: Decimal,
    count: usize,
}

impl Window {
    fn new(len: usize) -> Self {
        Self {
            len,
            sum: Decimal::ZERO,
            count: 0,
        }
    }

    /// Push `values[i]` and evict the observation that falls out of the window.
    fn advance(&mut self, values: &[Option<Decimal>], i: usize) {
        if let Some(v) = values[i] {
            self.sum += v;
            self.count += 1;
        }
        if i >= self.len {
            if let Some(old) = values[i - self.len] {
                self.sum -= old;
                self.count -= 1;
            }
        }
    }
}

fn is_undefined(values: &[Option<Decimal>]) -> bool {
    values.iter().all(Option::is_none)
}

/// Trailing arithmetic mean with a relaxed minimum period.
///
/// Before `window` observations have accumulated, the mean is taken over
/// whatever is available (at least one value), so the line starts at the
/// first defined point. Returns an empty column for `window == 0` or input
/// with no defined values.
pub fn rolling_mean(values: &[Option<Decimal>], window: usize) -> Column {
    if window == 0 || is_undefined(values) {
        return Vec::new();
    }

    let mut state = Window::new(window);
    (0..values.len())
        .map(|i| {
            state.advance(values, i);
            if state.count == 0 {
                None
            } else {
                Some(state.sum / Decimal::from(state.count))
            }
        })
        .collect()
}

/// Trailing arithmetic mean that stays undefined until the window holds
/// `window` defined observations.
pub fn rolling_mean_strict(values: &[Option<Decimal>], window: usize) -> Column {
    if window == 0 || is_undefined(values) {
        return Vec::new();
    }

    let mut state = Window::new(window);
    (0..values.len())
        .map(|i| {
            state.advance(values, i);
            if state.count == window {
                Some(state.sum / Decimal::from(window))
            } else {
                None
            }
        })
        .collect()
}

/// Exponentially weighted moving average, `α = 2 / (span + 1)`.
///
/// Seeded with the first defined value; no minimum period. Undefined inputs
/// produce undefined outputs and leave the running average untouched.
pub fn ewma(values: &[Option<Decimal>], span: usize) -> Column {
    if span == 0 || is_undefined(values) {
        return Vec::new();
    }

    let alpha = Decimal::TWO / (Decimal::from(span) + Decimal::ONE);
    let keep = Decimal::ONE - alpha;
    let mut prev: Option<Decimal> = None;

    values
        .iter()
        .map(|x| {
            let x = (*x)?;
            let y = match prev {
                None => x,
                Some(p) => alpha * x + keep * p,
            };
            prev = Some(y);
            Some(y)
        })
        .collect()
}

/// First difference; undefined at the first index or next to an undefined value.
pub fn diff(values: &[Option<Decimal>]) -> Column {
    values
        .iter()
        .enumerate()
        .map(|(i, x)| match (i.checked_sub(1).and_then(|j| values[j]), x) {
            (Some(prev), Some(cur)) => Some(*cur - prev),
            _ => None,
        })
        .collect()
}

/// Element-wise `a - b`, undefined where either side is.
pub fn subtract(a: &[Option<Decimal>], b: &[Option<Decimal>]) -> Column {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(*x - *y),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn closes() -> Column {
        defined(&[
            dec!(10),
            dec!(11),
            dec!(12),
            dec!(11),
            dec!(10),
            dec!(9),
            dec!(10),
            dec!(11),
            dec!(12),
            dec!(13),
        ])
    }

    #[test]
    fn test_rolling_mean_relaxed_head() {
        let out = rolling_mean(&closes(), 3);
        assert_eq!(out.len(), 10);
        assert_eq!(out[0], Some(dec!(10)));
        assert_eq!(out[1], Some(dec!(10.5)));
        assert_eq!(out[2], Some(dec!(11)));
        assert_eq!(out[3], Some(dec!(34) / dec!(3)));
        assert_eq!(out[9], Some(dec!(12)));
    }

    #[test]
    fn test_rolling_mean_strict_head() {
        let out = rolling_mean_strict(&closes(), 3);
        assert_eq!(out.len(), 10);
        assert_eq!(&out[..2], &[None, None]);
        assert_eq!(out[2], Some(dec!(11)));

        // With a leading gap the first full window ends one slot later.
        let gapped = diff(&closes());
        let out = rolling_mean_strict(&gapped, 3);
        assert!(out[..3].iter().all(Option::is_none));
        assert!(out[3..].iter().all(Option::is_some));
    }

    #[test]
    fn test_rolling_mean_relaxed_skips_gaps() {
        let out = rolling_mean(&[None, Some(dec!(4)), Some(dec!(6))], 2);
        assert_eq!(out, vec![None, Some(dec!(4)), Some(dec!(5))]);
    }

    #[test]
    fn test_rolling_mean_degenerate_inputs() {
        assert!(rolling_mean(&closes(), 0).is_empty());
        assert!(rolling_mean(&[], 3).is_empty());
        assert!(rolling_mean(&[None, None], 3).is_empty());
        assert!(rolling_mean_strict(&closes(), 0).is_empty());
    }

    #[test]
    fn test_ewma_seed_and_recurrence() {
        let out = ewma(&defined(&[dec!(2), dec!(4), dec!(6)]), 3);
        // alpha = 0.5
        assert_eq!(out, vec![Some(dec!(2)), Some(dec!(3)), Some(dec!(4.5))]);
    }

    #[test]
    fn test_ewma_defined_everywhere() {
        let input = closes();
        let out = ewma(&input, 26);
        assert_eq!(out.len(), input.len());
        assert_eq!(out[0], input[0]);
        assert!(out.iter().all(Option::is_some));
        assert!(ewma(&input, 0).is_empty());
    }

    #[test]
    fn test_ewma_max_span() {
        let out = ewma(&closes(), usize::MAX);
        assert_eq!(out.len(), 10);
        assert_eq!(out[0], Some(dec!(10)));
        assert!(out.iter().all(Option::is_some));
    }

    #[test]
    fn test_ewma_carries_over_gaps() {
        let out = ewma(&[None, Some(dec!(2)), None, Some(dec!(4))], 3);
        assert_eq!(out, vec![None, Some(dec!(2)), None, Some(dec!(3))]);
    }

    #[test]
    fn test_diff() {
        let out = diff(&defined(&[dec!(10), dec!(12), dec!(9)]));
        assert_eq!(out, vec![None, Some(dec!(2)), Some(dec!(-3))]);
        assert!(diff(&[]).is_empty());
    }
}
