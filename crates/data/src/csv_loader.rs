use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tickerlens_core::{Bar, CompanyInfo, DataError};

/// Load daily OHLCV bars from a CSV file.
///
/// Expected columns (case-insensitive, flexible ordering):
/// `date` (or `timestamp`, `datetime`), `open`, `high`, `low`, `close`, `volume`
///
/// Rows with a blank or `null` price field are skipped. The result is sorted
/// by date; duplicate dates are left in place for the caller to reject.
pub fn load_bars_from_csv(path: &Path) -> Result<Vec<Bar>, DataError> {
    let file = std::fs::File::open(path)?;
    load_bars_from_reader(file)
}

/// Same as [`load_bars_from_csv`], reading from any source.
pub fn load_bars_from_reader<R: Read>(source: R) -> Result<Vec<Bar>, DataError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let headers = reader
        .headers()
        .map_err(|e| DataError::ParseError(format!("Failed to read headers: {}", e)))?
        .clone();

    let col_map = resolve_bar_columns(&headers)?;

    let mut bars = Vec::new();
    let mut skipped = 0usize;
    for result in reader.records() {
        let record = result.map_err(|e| DataError::ParseError(format!("CSV record error: {}", e)))?;

        let prices = [col_map.open, col_map.high, col_map.low, col_map.close];
        if prices.iter().any(|&i| is_missing(record.get(i))) {
            skipped += 1;
            continue;
        }

        let date = record
            .get(col_map.date)
            .ok_or_else(|| DataError::ParseError("CSV row is missing its date field".into()))
            .and_then(parse_date)?;
        let open = parse_decimal(&record[col_map.open], "open")?;
        let high = parse_decimal(&record[col_map.high], "high")?;
        let low = parse_decimal(&record[col_map.low], "low")?;
        let close = parse_decimal(&record[col_map.close], "close")?;
        let volume = match col_map.volume.and_then(|i| record.get(i)) {
            Some(raw) if !is_missing(Some(raw)) => parse_decimal(raw, "volume")?,
            _ => Decimal::ZERO,
        };

        bars.push(Bar {
            date,
            open,
            high,
            low,
            close,
            volume,
        });
    }

    if skipped > 0 {
        tracing::debug!(skipped, "Skipped CSV rows with missing prices");
    }

    // Sort by date
    bars.sort_by_key(|b| b.date);
    Ok(bars)
}

/// Load a company profile from a JSON document. Unknown keys are ignored and
/// missing keys stay `None`.
pub fn load_company_info(path: &Path) -> Result<CompanyInfo, DataError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw)
        .map_err(|e| DataError::ParseError(format!("Invalid info file {}: {}", path.display(), e)))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct BarColumnMap {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

fn resolve_bar_columns(headers: &csv::StringRecord) -> Result<BarColumnMap, DataError> {
    let date = find_column(headers, &["date", "timestamp", "datetime", "time"])
        .ok_or_else(|| DataError::ParseError("No date column found".into()))?;
    let open = find_column(headers, &["open", "o"])
        .ok_or_else(|| DataError::ParseError("No open column found".into()))?;
    let high = find_column(headers, &["high", "h"])
        .ok_or_else(|| DataError::ParseError("No high column found".into()))?;
    let low = find_column(headers, &["low", "l"])
        .ok_or_else(|| DataError::ParseError("No low column found".into()))?;
    let close = find_column(headers, &["close", "c"])
        .ok_or_else(|| DataError::ParseError("No close column found".into()))?;
    let volume = find_column(headers, &["volume", "vol", "v"]);

    Ok(BarColumnMap {
        date,
        open,
        high,
        low,
        close,
        volume,
    })
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    for (i, header) in headers.iter().enumerate() {
        let h = header.trim().to_lowercase();
        for name in names {
            if h == *name {
                return Some(i);
            }
        }
    }
    None
}

fn is_missing(field: Option<&str>) -> bool {
    match field.map(str::trim) {
        None | Some("") => true,
        Some(s) => s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("nan"),
    }
}

fn parse_decimal(s: &str, field: &str) -> Result<Decimal, DataError> {
    let s = s.trim();
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .map_err(|e| DataError::ParseError(format!("Failed to parse {} '{}': {}", field, s, e)))
}

fn parse_date(s: &str) -> Result<NaiveDate, DataError> {
    let s = s.trim();

    // Date-only formats
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(date);
        }
    }

    // RFC 3339 / ISO 8601 with timezone: keep the exchange-local date
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    for fmt in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.date());
        }
    }

    // Try Unix timestamp (seconds)
    if let Ok(ts) = s.parse::<i64>() {
        if let Some(dt) = DateTime::from_timestamp(ts, 0) {
            return Ok(dt.date_naive());
        }
    }

    Err(DataError::ParseError(format!("Unable to parse date: '{}'", s)))
}
