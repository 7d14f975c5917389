pub mod cache;
pub mod csv_loader;
pub mod yahoo;

pub use cache::{CachedDataProvider, DEFAULT_TTL};
pub use yahoo::YahooDataProvider;

use async_trait::async_trait;
use std::path::PathBuf;
use tickerlens_core::{CompanyInfo, DataError, DataProvider, LookbackPeriod, PriceSeries};

/// A directory of `{SYMBOL}.csv` price files with optional
/// `{SYMBOL}.info.json` company profiles alongside.
pub struct CsvDataProvider {
    pub directory: PathBuf,
}

impl CsvDataProvider {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Resolve `{symbol}{suffix}`, trying the symbol as given and then upper-cased.
    fn find_file(&self, symbol: &str, suffix: &str) -> Option<PathBuf> {
        [symbol.to_string(), symbol.to_uppercase()]
            .iter()
            .map(|s| self.directory.join(format!("{}{}", s, suffix)))
            .find(|p| p.is_file())
    }

    /// Symbols with a price file in the directory, sorted.
    pub fn available_symbols(&self) -> Result<Vec<String>, DataError> {
        let mut symbols = Vec::new();
        for entry in std::fs::read_dir(&self.directory)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "csv").unwrap_or(false) {
                if let Some(stem) = path.file_stem() {
                    symbols.push(stem.to_string_lossy().to_string());
                }
            }
        }
        symbols.sort();
        Ok(symbols)
    }
}

fn validate_symbol(symbol: &str) -> Result<&str, DataError> {
    let symbol = symbol.trim();
    let valid = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
        && !symbol.contains("..");
    if valid {
        Ok(symbol)
    } else {
        Err(DataError::NotFound(format!("Invalid symbol '{}'", symbol)))
    }
}

#[async_trait]
impl DataProvider for CsvDataProvider {
    async fn load_history(
        &self,
        symbol: &str,
        period: LookbackPeriod,
    ) -> Result<PriceSeries, DataError> {
        let symbol = validate_symbol(symbol)?;
        let file_path = self.find_file(symbol, ".csv").ok_or_else(|| {
            DataError::NotFound(format!(
                "CSV file not found for {} in {}",
                symbol,
                self.directory.display()
            ))
        })?;

        let bars = csv_loader::load_bars_from_csv(&file_path)?;
        let series = PriceSeries::new(symbol.to_uppercase(), bars)?;
        tracing::debug!(%symbol, %period, bars = series.len(), file = %file_path.display(), "Loaded CSV history");
        Ok(series.for_period(period))
    }

    async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, DataError> {
        let symbol = validate_symbol(symbol)?;
        match self.find_file(symbol, ".info.json") {
            Some(path) => csv_loader::load_company_info(&path),
            None => Ok(CompanyInfo::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tickerlens-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const PRICES: &str = "\
Date,Open,High,Low,Close,Volume
2023-01-03,10,11,9,10,100
2024-06-03,11,12,10,11,100
2024-12-02,12,13,11,12,100
2025-01-02,13,14,12,13,100
";

    #[tokio::test]
    async fn test_load_history_applies_period() {
        let dir = fixture_dir("history");
        std::fs::write(dir.join("ACME.csv"), PRICES).unwrap();
        let provider = CsvDataProvider::new(&dir);

        let all = provider.load_history("ACME", LookbackPeriod::Max).await.unwrap();
        assert_eq!(all.len(), 4);

        let year = provider.load_history("acme", LookbackPeriod::OneYear).await.unwrap();
        assert_eq!(year.symbol(), "ACME");
        assert_eq!(year.len(), 3);
        assert_eq!(year.bars()[0].close, dec!(11));
    }

    #[tokio::test]
    async fn test_missing_symbol_is_not_found() {
        let dir = fixture_dir("missing");
        let provider = CsvDataProvider::new(&dir);
        assert!(matches!(
            provider.load_history("NOPE", LookbackPeriod::OneYear).await,
            Err(DataError::NotFound(_))
        ));
        assert!(matches!(
            provider.load_history("../etc", LookbackPeriod::OneYear).await,
            Err(DataError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_dates_are_rejected() {
        let dir = fixture_dir("dupes");
        std::fs::write(
            dir.join("DUP.csv"),
            "date,open,high,low,close\n2024-01-02,1,1,1,1\n2024-01-02,2,2,2,2\n",
        )
        .unwrap();
        let provider = CsvDataProvider::new(&dir);
        assert!(matches!(
            provider.load_history("DUP", LookbackPeriod::Max).await,
            Err(DataError::Series(_))
        ));
    }

    #[tokio::test]
    async fn test_company_info_optional() {
        let dir = fixture_dir("info");
        std::fs::write(dir.join("ACME.csv"), PRICES).unwrap();
        std::fs::write(
            dir.join("ACME.info.json"),
            r#"{"name": "Acme Corp", "sector": "Industrials", "trailing_eps": "4.2", "extra": 1}"#,
        )
        .unwrap();
        let provider = CsvDataProvider::new(&dir);

        let info = provider.company_info("ACME").await.unwrap();
        assert_eq!(info.name.as_deref(), Some("Acme Corp"));
        assert_eq!(info.trailing_eps, Some(dec!(4.2)));
        assert!(info.industry.is_none());

        let none = provider.company_info("OTHER").await.unwrap();
        assert!(none.is_empty());

        assert_eq!(provider.available_symbols().unwrap(), vec!["ACME".to_string()]);
    }
}
