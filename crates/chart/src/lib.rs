//! Chart data adapter.
//!
//! Picks, from an [`AugmentedSeries`], exactly the columns each chart panel
//! draws. No values are computed here; every line shares the series' date axis.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashSet;
use tickerlens_indicators::{AugmentedSeries, Column, ColumnKey, IndicatorFamily, IndicatorKind, IndicatorSet};

/// RSI overbought reference line.
pub const RSI_OVERBOUGHT: Decimal = dec!(70);
/// RSI oversold reference line.
pub const RSI_OVERSOLD: Decimal = dec!(30);
/// MACD zero reference line.
pub const MACD_ZERO: Decimal = Decimal::ZERO;

/// One drawable line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub label: String,
    /// False when the indicator was enabled but could not be computed.
    pub available: bool,
    pub values: Column,
}

/// Candles plus moving-average overlays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePanel {
    pub open: Vec<Decimal>,
    pub high: Vec<Decimal>,
    pub low: Vec<Decimal>,
    pub close: Vec<Decimal>,
    pub volume: Vec<Decimal>,
    pub overlays: Vec<LineSeries>,
}

/// RSI lines with fixed 70/30 thresholds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OscillatorPanel {
    pub lines: Vec<LineSeries>,
    pub overbought: Decimal,
    pub oversold: Decimal,
}

/// One MACD parameterization with a zero reference line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MacdPanel {
    pub label: String,
    pub line: LineSeries,
    pub signal: LineSeries,
    pub histogram: LineSeries,
    pub zero_line: Decimal,
}

/// Everything the presentation layer needs to draw one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub symbol: String,
    pub dates: Vec<NaiveDate>,
    pub price: PricePanel,
    /// Present only when at least one RSI is enabled.
    pub oscillator: Option<OscillatorPanel>,
    /// One panel per enabled MACD configuration.
    pub macd: Vec<MacdPanel>,
}

impl ChartData {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn has_oscillator(&self) -> bool {
        self.oscillator.is_some()
    }

    pub fn has_macd(&self) -> bool {
        !self.macd.is_empty()
    }
}

/// Shape `series` into chart panels for the indicators enabled in `set`.
pub fn build_chart(series: &AugmentedSeries, set: &IndicatorSet) -> ChartData {
    let bars = series.prices().bars();

    let overlays = enabled_unique(set, IndicatorFamily::Sma)
        .iter()
        .flat_map(|kind| lines_for(series, kind))
        .collect();

    let rsi_lines: Vec<LineSeries> = enabled_unique(set, IndicatorFamily::Rsi)
        .iter()
        .flat_map(|kind| lines_for(series, kind))
        .collect();
    let oscillator = (!rsi_lines.is_empty()).then(|| OscillatorPanel {
        lines: rsi_lines,
        overbought: RSI_OVERBOUGHT,
        oversold: RSI_OVERSOLD,
    });

    let macd = enabled_unique(set, IndicatorFamily::Macd)
        .iter()
        .filter_map(|kind| {
            let mut lines = lines_for(series, kind).into_iter();
            match (lines.next(), lines.next(), lines.next()) {
                (Some(line), Some(signal), Some(histogram)) => Some(MacdPanel {
                    label: kind.to_string(),
                    line,
                    signal,
                    histogram,
                    zero_line: MACD_ZERO,
                }),
                _ => None,
            }
        })
        .collect();

    ChartData {
        symbol: series.prices().symbol().to_string(),
        dates: series.prices().dates(),
        price: PricePanel {
            open: bars.iter().map(|b| b.open).collect(),
            high: bars.iter().map(|b| b.high).collect(),
            low: bars.iter().map(|b| b.low).collect(),
            close: bars.iter().map(|b| b.close).collect(),
            volume: bars.iter().map(|b| b.volume).collect(),
            overlays,
        },
        oscillator,
        macd,
    }
}

fn enabled_unique(set: &IndicatorSet, family: IndicatorFamily) -> Vec<IndicatorKind> {
    let mut seen = HashSet::new();
    set.enabled_kinds(family)
        .into_iter()
        .filter(|k| seen.insert(*k))
        .collect()
}

/// Lines for every column of `kind`. Columns missing from `series` (assembled
/// with a different set) are skipped.
fn lines_for(series: &AugmentedSeries, kind: &IndicatorKind) -> Vec<LineSeries> {
    let available = series.report(kind).map(|r| r.is_computed()).unwrap_or(false);
    kind.column_keys()
        .iter()
        .filter_map(|key| match series.column(key) {
            Some(col) => Some(LineSeries {
                name: col.name(),
                label: line_label(key),
                available,
                values: col.values.clone(),
            }),
            None => {
                tracing::warn!(column = %key, "Enabled indicator missing from assembled series");
                None
            }
        })
        .collect()
}

fn line_label(key: &ColumnKey) -> String {
    match key {
        ColumnKey::Sma { window } => format!("SMA {}", window),
        ColumnKey::Rsi { window } => format!("RSI {}", window),
        ColumnKey::MacdLine { .. } => "MACD".to_string(),
        ColumnKey::MacdSignal { .. } => "Signal".to_string(),
        ColumnKey::MacdHistogram { .. } => "Histogram".to_string(),
    }
}
