use crate::models::*;
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Data Provider Trait
// ---------------------------------------------------------------------------

/// Errors that can occur while fetching market data.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("Data not found: {0}")]
    NotFound(String),
    #[error("Parse error: {0}")]
    ParseError(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("API error: {0}")]
    ApiError(String),
    #[error("Malformed price series: {0}")]
    Series(#[from] SeriesError),
}

/// Supplies price history and company fundamentals for a ticker symbol.
///
/// An empty [`PriceSeries`] is a valid answer (the symbol exists but has no
/// bars in range); callers decide how to present it.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Load the daily price history covering `period`.
    async fn load_history(
        &self,
        symbol: &str,
        period: LookbackPeriod,
    ) -> Result<PriceSeries, DataError>;

    /// Load the company profile. Missing fields are `None`, never an error.
    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, DataError>;
}
