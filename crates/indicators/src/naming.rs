use serde::{Serialize, Serializer};
use std::fmt;

/// Columns carried over from the raw price series.
pub const PRICE_COLUMNS: [&str; 6] = ["date", "open", "high", "low", "close", "volume"];

/// Identity of a derived column.
///
/// The rendered name is a function of indicator kind and every parameter, and
/// the numeric suffix keeps it disjoint from [`PRICE_COLUMNS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ColumnKey {
    Sma { window: usize },
    Rsi { window: usize },
    MacdLine { fast: usize, slow: usize, signal: usize },
    MacdSignal { fast: usize, slow: usize, signal: usize },
    MacdHistogram { fast: usize, slow: usize, signal: usize },
}

impl ColumnKey {
    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ColumnKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnKey::Sma { window } => write!(f, "sma_{}", window),
            ColumnKey::Rsi { window } => write!(f, "rsi_{}", window),
            ColumnKey::MacdLine { fast, slow, signal } => {
                write!(f, "macd_{}_{}_{}", fast, slow, signal)
            }
            ColumnKey::MacdSignal { fast, slow, signal } => {
                write!(f, "macd_signal_{}_{}_{}", fast, slow, signal)
            }
            ColumnKey::MacdHistogram { fast, slow, signal } => {
                write!(f, "macd_hist_{}_{}_{}", fast, slow, signal)
            }
        }
    }
}

impl Serialize for ColumnKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_are_distinct() {
        let keys = [
            ColumnKey::Sma { window: 20 },
            ColumnKey::Sma { window: 60 },
            ColumnKey::Rsi { window: 20 },
            ColumnKey::MacdLine { fast: 12, slow: 26, signal: 9 },
            ColumnKey::MacdLine { fast: 1, slow: 22, signal: 69 },
            ColumnKey::MacdLine { fast: 12, slow: 2, signal: 69 },
            ColumnKey::MacdSignal { fast: 12, slow: 26, signal: 9 },
            ColumnKey::MacdHistogram { fast: 12, slow: 26, signal: 9 },
            ColumnKey::MacdHistogram { fast: 5, slow: 35, signal: 5 },
        ];
        let names: HashSet<String> = keys.iter().map(ColumnKey::name).collect();
        assert_eq!(names.len(), keys.len());
        assert!(names.iter().all(|n| !PRICE_COLUMNS.contains(&n.as_str())));
    }

    #[test]
    fn test_name_format() {
        assert_eq!(ColumnKey::Sma { window: 20 }.name(), "sma_20");
        assert_eq!(
            ColumnKey::MacdSignal { fast: 12, slow: 26, signal: 9 }.name(),
            "macd_signal_12_26_9"
        );
    }
}
