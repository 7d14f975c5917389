use crate::macd::Macd;
use crate::naming::ColumnKey;
use crate::rsi::Rsi;
use crate::sma::Sma;
use crate::Indicator;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Indicator families, used to group panels and toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndicatorFamily {
    Sma,
    Rsi,
    Macd,
}

/// An indicator and its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IndicatorKind {
    Sma { window: usize },
    Rsi { window: usize },
    Macd { fast: usize, slow: usize, signal: usize },
}

impl IndicatorKind {
    pub fn family(&self) -> IndicatorFamily {
        match self {
            IndicatorKind::Sma { .. } => IndicatorFamily::Sma,
            IndicatorKind::Rsi { .. } => IndicatorFamily::Rsi,
            IndicatorKind::Macd { .. } => IndicatorFamily::Macd,
        }
    }

    /// Keys of the columns this configuration contributes.
    pub fn column_keys(&self) -> Vec<ColumnKey> {
        self.indicator().columns()
    }

    /// Build the calculator for this configuration.
    pub fn indicator(&self) -> Box<dyn Indicator> {
        match *self {
            IndicatorKind::Sma { window } => Box::new(Sma::new(window)),
            IndicatorKind::Rsi { window } => Box::new(Rsi::new(window)),
            IndicatorKind::Macd { fast, slow, signal } => Box::new(Macd::new(fast, slow, signal)),
        }
    }
}

impl fmt::Display for IndicatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorKind::Sma { window } => write!(f, "SMA({})", window),
            IndicatorKind::Rsi { window } => write!(f, "RSI({})", window),
            IndicatorKind::Macd { fast, slow, signal } => {
                write!(f, "MACD({}, {}, {})", fast, slow, signal)
            }
        }
    }
}

fn enabled_by_default() -> bool {
    true
}

/// One configured indicator with its on/off toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndicatorConfig {
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(flatten)]
    pub kind: IndicatorKind,
}

impl IndicatorConfig {
    pub fn enabled(kind: IndicatorKind) -> Self {
        Self {
            enabled: true,
            kind,
        }
    }

    pub fn disabled(kind: IndicatorKind) -> Self {
        Self {
            enabled: false,
            kind,
        }
    }
}

/// The full set of indicators requested for one analysis.
///
/// Deserializes from TOML as a list of `[[indicator]]` tables; a document
/// without any falls back to [`IndicatorSet::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSet {
    #[serde(rename = "indicator")]
    indicators: Vec<IndicatorConfig>,
}

impl Default for IndicatorSet {
    /// Short and long SMA (20, 60), RSI 14, MACD 12/26/9, all enabled.
    fn default() -> Self {
        Self::new(vec![
            IndicatorConfig::enabled(IndicatorKind::Sma { window: 20 }),
            IndicatorConfig::enabled(IndicatorKind::Sma { window: 60 }),
            IndicatorConfig::enabled(IndicatorKind::Rsi { window: 14 }),
            IndicatorConfig::enabled(IndicatorKind::Macd {
                fast: 12,
                slow: 26,
                signal: 9,
            }),
        ])
    }
}

impl IndicatorSet {
    pub fn new(indicators: Vec<IndicatorConfig>) -> Self {
        Self { indicators }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn indicators(&self) -> &[IndicatorConfig] {
        &self.indicators
    }

    pub fn enabled(&self) -> impl Iterator<Item = &IndicatorConfig> {
        self.indicators.iter().filter(|c| c.enabled)
    }

    /// Enabled configurations of one family.
    pub fn enabled_kinds(&self, family: IndicatorFamily) -> Vec<IndicatorKind> {
        self.enabled()
            .filter(|c| c.kind.family() == family)
            .map(|c| c.kind)
            .collect()
    }

    pub fn is_enabled(&self, family: IndicatorFamily) -> bool {
        self.enabled().any(|c| c.kind.family() == family)
    }

    pub fn set_enabled(&mut self, family: IndicatorFamily, enabled: bool) {
        for config in &mut self.indicators {
            if config.kind.family() == family {
                config.enabled = enabled;
            }
        }
    }

    /// Replace every configuration of `family` with enabled `kinds`.
    pub fn replace(&mut self, family: IndicatorFamily, kinds: &[IndicatorKind]) {
        self.indicators.retain(|c| c.kind.family() != family);
        self.indicators.extend(
            kinds
                .iter()
                .filter(|k| k.family() == family)
                .map(|k| IndicatorConfig::enabled(*k)),
        );
    }

    /// Apply a textual override for one family. `none` disables the family;
    /// anything else lists its periods (`20,60`, or `12,26,9` for MACD).
    pub fn apply_override(
        &mut self,
        family: IndicatorFamily,
        value: &str,
    ) -> Result<(), ParseConfigError> {
        if value.trim().eq_ignore_ascii_case("none") {
            self.set_enabled(family, false);
            return Ok(());
        }
        let kinds = match family {
            IndicatorFamily::Sma => parse_periods(value)?
                .into_iter()
                .map(|window| IndicatorKind::Sma { window })
                .collect(),
            IndicatorFamily::Rsi => parse_periods(value)?
                .into_iter()
                .map(|window| IndicatorKind::Rsi { window })
                .collect(),
            IndicatorFamily::Macd => vec![parse_macd(value)?],
        };
        self.replace(family, &kinds);
        Ok(())
    }
}

/// Error from parsing a comma-separated period list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseConfigError {
    #[error("Invalid period '{0}'")]
    InvalidPeriod(String),
    #[error("MACD expects fast,slow,signal but got '{0}'")]
    MacdArity(String),
}

/// Parse `"20,60"` into periods.
pub fn parse_periods(s: &str) -> Result<Vec<usize>, ParseConfigError> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<usize>()
                .map_err(|_| ParseConfigError::InvalidPeriod(p.to_string()))
        })
        .collect()
}

/// Parse `"12,26,9"` into a MACD kind. Ordering is not validated here.
pub fn parse_macd(s: &str) -> Result<IndicatorKind, ParseConfigError> {
    match parse_periods(s)?.as_slice() {
        [fast, slow, signal] => Ok(IndicatorKind::Macd {
            fast: *fast,
            slow: *slow,
            signal: *signal,
        }),
        _ => Err(ParseConfigError::MacdArity(s.to_string())),
    }
}
