use crate::models::CompanyInfo;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which per-share metric the multiple is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuationMethod {
    /// Trailing EPS × target P/E.
    Earnings,
    /// Book value per share × target P/B.
    Book,
}

impl fmt::Display for ValuationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValuationMethod::Earnings => f.write_str("earnings"),
            ValuationMethod::Book => f.write_str("book"),
        }
    }
}

impl FromStr for ValuationMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "earnings" | "eps" | "pe" => Ok(ValuationMethod::Earnings),
            "book" | "bps" | "pb" => Ok(ValuationMethod::Book),
            other => Err(format!("Unknown valuation method '{}'", other)),
        }
    }
}

/// A multiple-based fair value estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuationEstimate {
    pub method: ValuationMethod,
    pub per_share_metric: Decimal,
    pub multiple: Decimal,
    pub fair_value: Decimal,
    pub current_price: Option<Decimal>,
    /// (fair − current) / current × 100, when the current price is known.
    pub upside_pct: Option<Decimal>,
}

/// Estimate fair value per share. Returns `None` when an input is unavailable
/// or not positive.
pub fn estimate(
    info: &CompanyInfo,
    method: ValuationMethod,
    multiple: Decimal,
) -> Option<ValuationEstimate> {
    if multiple <= Decimal::ZERO {
        return None;
    }

    let per_share_metric = match method {
        ValuationMethod::Earnings => info.trailing_eps?,
        ValuationMethod::Book => {
            let price = info.current_price?;
            let pb = info.price_to_book?;
            if pb <= Decimal::ZERO {
                return None;
            }
            price.checked_div(pb)?
        }
    };
    if per_share_metric <= Decimal::ZERO {
        tracing::debug!(%method, %per_share_metric, "Non-positive per-share metric, no estimate");
        return None;
    }

    let Some(fair_value) = per_share_metric.checked_mul(multiple) else {
        tracing::debug!(%method, %multiple, "Fair value out of range, no estimate");
        return None;
    };
    let current_price = info.current_price.filter(|p| *p > Decimal::ZERO);
    let upside_pct = current_price.and_then(|p| {
        (fair_value - p)
            .checked_div(p)?
            .checked_mul(Decimal::ONE_HUNDRED)
    });

    Some(ValuationEstimate {
        method,
        per_share_metric,
        multiple,
        fair_value,
        current_price,
        upside_pct,
    })
}
