use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Market Data
// ---------------------------------------------------------------------------

/// A single daily OHLCV bar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
}

impl Bar {
    /// Whether the bar satisfies the usual OHLC ordering and non-negativity.
    pub fn is_well_formed(&self) -> bool {
        let non_negative = [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .all(|v| *v >= Decimal::ZERO);
        non_negative
            && self.high >= self.low
            && self.high >= self.open.max(self.close)
            && self.low <= self.open.min(self.close)
    }
}

/// Raised when bars handed to [`PriceSeries::new`] break the date ordering contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SeriesError {
    #[error("Dates out of order: {next} follows {prev}")]
    Unsorted { prev: NaiveDate, next: NaiveDate },
    #[error("Duplicate date: {0}")]
    DuplicateDate(NaiveDate),
}

/// An ordered daily price history for one symbol.
///
/// Dates are strictly ascending. The only way to build one is [`PriceSeries::new`],
/// so every series in circulation upholds that.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Result<Self, SeriesError> {
        for pair in bars.windows(2) {
            let (prev, next) = (pair[0].date, pair[1].date);
            if next == prev {
                return Err(SeriesError::DuplicateDate(next));
            }
            if next < prev {
                return Err(SeriesError::Unsorted { prev, next });
            }
        }
        Ok(Self {
            symbol: symbol.into(),
            bars,
        })
    }

    pub fn empty(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            bars: Vec::new(),
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.bars.iter().map(|b| b.date).collect()
    }

    pub fn closes(&self) -> Vec<Decimal> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.bars.first().map(|b| b.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.bars.last().map(|b| b.date)
    }

    /// Number of bars that violate OHLC ordering. Such bars are kept as-is.
    pub fn malformed_bars(&self) -> usize {
        self.bars.iter().filter(|b| !b.is_well_formed()).count()
    }

    /// Bars dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> PriceSeries {
        let from = self.bars.partition_point(|b| b.date < start);
        Self {
            symbol: self.symbol.clone(),
            bars: self.bars[from..].to_vec(),
        }
    }

    /// Trim to the given lookback, anchored on the last available date.
    pub fn for_period(&self, period: LookbackPeriod) -> PriceSeries {
        match self.last_date().and_then(|last| period.start_date(last)) {
            Some(start) => self.since(start),
            None => self.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Lookback
// ---------------------------------------------------------------------------

/// How far back the price history reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LookbackPeriod {
    #[serde(rename = "3mo")]
    ThreeMonths,
    #[serde(rename = "6mo")]
    SixMonths,
    #[serde(rename = "1y")]
    OneYear,
    #[serde(rename = "2y")]
    TwoYears,
    #[serde(rename = "5y")]
    FiveYears,
    #[serde(rename = "max")]
    Max,
}

impl LookbackPeriod {
    pub const ALL: [LookbackPeriod; 6] = [
        LookbackPeriod::ThreeMonths,
        LookbackPeriod::SixMonths,
        LookbackPeriod::OneYear,
        LookbackPeriod::TwoYears,
        LookbackPeriod::FiveYears,
        LookbackPeriod::Max,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LookbackPeriod::ThreeMonths => "3mo",
            LookbackPeriod::SixMonths => "6mo",
            LookbackPeriod::OneYear => "1y",
            LookbackPeriod::TwoYears => "2y",
            LookbackPeriod::FiveYears => "5y",
            LookbackPeriod::Max => "max",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LookbackPeriod::ThreeMonths => "3 months",
            LookbackPeriod::SixMonths => "6 months",
            LookbackPeriod::OneYear => "1 year",
            LookbackPeriod::TwoYears => "2 years",
            LookbackPeriod::FiveYears => "5 years",
            LookbackPeriod::Max => "max",
        }
    }

    fn months(&self) -> Option<u32> {
        match self {
            LookbackPeriod::ThreeMonths => Some(3),
            LookbackPeriod::SixMonths => Some(6),
            LookbackPeriod::OneYear => Some(12),
            LookbackPeriod::TwoYears => Some(24),
            LookbackPeriod::FiveYears => Some(60),
            LookbackPeriod::Max => None,
        }
    }

    /// First date included when the window ends at `anchor`. `None` means unbounded.
    pub fn start_date(&self, anchor: NaiveDate) -> Option<NaiveDate> {
        self.months()
            .and_then(|m| anchor.checked_sub_months(Months::new(m)))
    }
}

impl Default for LookbackPeriod {
    fn default() -> Self {
        LookbackPeriod::OneYear
    }
}

impl fmt::Display for LookbackPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown lookback period '{0}' (expected one of 3mo, 6mo, 1y, 2y, 5y, max)")]
pub struct ParsePeriodError(pub String);

impl FromStr for LookbackPeriod {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_lowercase();
        LookbackPeriod::ALL
            .into_iter()
            .find(|p| p.as_str() == token)
            .ok_or(ParsePeriodError(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Fundamentals
// ---------------------------------------------------------------------------

/// Company profile and headline fundamentals. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompanyInfo {
    pub name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub website: Option<String>,
    pub employees: Option<u64>,
    pub currency: Option<String>,
    pub current_price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub trailing_pe: Option<Decimal>,
    pub trailing_eps: Option<Decimal>,
    pub price_to_book: Option<Decimal>,
}

impl CompanyInfo {
    /// True when the provider returned nothing usable.
    pub fn is_empty(&self) -> bool {
        *self == CompanyInfo::default()
    }
}
