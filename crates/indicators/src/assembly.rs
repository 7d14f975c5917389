//! Indicator assembly: raw prices plus enabled configurations in, one
//! augmented, row-aligned series out.

use crate::config::{IndicatorKind, IndicatorSet};
use crate::naming::ColumnKey;
use crate::series::Column;
use crate::Unavailable;
use serde::Serialize;
use std::collections::HashSet;
use tickerlens_core::PriceSeries;
use tracing::{debug, warn};

/// A derived column aligned index-for-index with the price bars.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndicatorColumn {
    pub key: ColumnKey,
    pub values: Column,
}

impl IndicatorColumn {
    pub fn name(&self) -> String {
        self.key.name()
    }

    /// Whether at least one slot holds a value.
    pub fn has_values(&self) -> bool {
        self.values.iter().any(Option::is_some)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IndicatorStatus {
    Computed,
    Unavailable(Unavailable),
}

/// Outcome of one enabled indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndicatorReport {
    pub indicator: IndicatorKind,
    pub label: String,
    pub columns: Vec<ColumnKey>,
    #[serde(flatten)]
    pub status: IndicatorStatus,
}

impl IndicatorReport {
    pub fn is_computed(&self) -> bool {
        self.status == IndicatorStatus::Computed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssemblyError {
    #[error("No price data for {0}")]
    NoData(String),
}

/// Price series plus derived indicator columns.
///
/// Every column has exactly `prices.len()` slots. Columns of enabled
/// indicators are always present; an indicator that could not be computed
/// contributes all-`None` columns and an `Unavailable` report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AugmentedSeries {
    prices: PriceSeries,
    columns: Vec<IndicatorColumn>,
    reports: Vec<IndicatorReport>,
}

impl AugmentedSeries {
    pub fn prices(&self) -> &PriceSeries {
        &self.prices
    }

    pub fn columns(&self) -> &[IndicatorColumn] {
        &self.columns
    }

    pub fn reports(&self) -> &[IndicatorReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn column(&self, key: &ColumnKey) -> Option<&IndicatorColumn> {
        self.columns.iter().find(|c| c.key == *key)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&IndicatorColumn> {
        self.columns.iter().find(|c| c.key.name() == name)
    }

    pub fn has_column(&self, key: &ColumnKey) -> bool {
        self.column(key).is_some()
    }

    pub fn report(&self, kind: &IndicatorKind) -> Option<&IndicatorReport> {
        self.reports.iter().find(|r| r.indicator == *kind)
    }
}

/// Compute every enabled indicator over `raw` and attach the results.
///
/// `raw` is only read. Disabled indicators produce no columns; a failing
/// indicator never blocks the others. Identical configurations are computed
/// once. Returns [`AssemblyError::NoData`] for an empty series.
pub fn assemble(raw: &PriceSeries, set: &IndicatorSet) -> Result<AugmentedSeries, AssemblyError> {
    if raw.is_empty() {
        return Err(AssemblyError::NoData(raw.symbol().to_string()));
    }

    let closes = raw.closes();
    let len = closes.len();
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    let mut reports = Vec::new();

    for config in set.enabled() {
        let kind = config.kind;
        if !seen.insert(kind) {
            debug!(indicator = %kind, "Skipping duplicate indicator configuration");
            continue;
        }

        let indicator = kind.indicator();
        let keys = indicator.columns();
        let (values, status) = match indicator.compute(&closes) {
            Ok(values) => (values, IndicatorStatus::Computed),
            Err(reason) => {
                warn!(
                    symbol = %raw.symbol(),
                    indicator = %kind,
                    %reason,
                    "Indicator unavailable"
                );
                (vec![vec![None; len]; keys.len()], IndicatorStatus::Unavailable(reason))
            }
        };

        debug_assert_eq!(values.len(), keys.len());
        for (key, values) in keys.iter().zip(values) {
            debug_assert_eq!(values.len(), len);
            columns.push(IndicatorColumn { key: *key, values });
        }
        reports.push(IndicatorReport {
            indicator: kind,
            label: kind.to_string(),
            columns: keys,
            status,
        });
    }

    debug!(
        symbol = %raw.symbol(),
        bars = len,
        columns = columns.len(),
        "Assembled indicator series"
    );

    Ok(AugmentedSeries {
        prices: raw.clone(),
        columns,
        reports,
    })
}
