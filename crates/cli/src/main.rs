use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tickerlens_core::{CompanyInfo, DataProvider, LookbackPeriod, ValuationMethod};
use tickerlens_data::{CachedDataProvider, CsvDataProvider, YahooDataProvider, DEFAULT_TTL};
use tickerlens_indicators::{assemble, AugmentedSeries, IndicatorFamily, IndicatorSet, IndicatorStatus};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "tickerlens")]
#[command(about = "Equity price history with SMA, RSI and MACD indicators, from the terminal or over HTTP")]
#[command(version)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone)]
struct SourceArgs {
    /// Directory holding {SYMBOL}.csv and optional {SYMBOL}.info.json files
    #[arg(long, env = "TICKERLENS_DATA_DIR", conflicts_with = "yahoo")]
    data_dir: Option<PathBuf>,

    /// Fetch from the Yahoo Finance chart endpoint instead of local files
    #[arg(long)]
    yahoo: bool,
}

#[derive(Args, Debug, Clone, Default)]
struct IndicatorArgs {
    /// TOML file with [[indicator]] tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// SMA windows, comma separated (e.g. "20,60")
    #[arg(long)]
    sma: Option<String>,

    /// RSI windows, comma separated (e.g. "14")
    #[arg(long)]
    rsi: Option<String>,

    /// MACD periods as fast,slow,signal (e.g. "12,26,9")
    #[arg(long)]
    macd: Option<String>,

    #[arg(long)]
    no_sma: bool,

    #[arg(long)]
    no_rsi: bool,

    #[arg(long)]
    no_macd: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute indicators for one symbol and print the latest rows
    Analyze {
        /// Ticker symbol (e.g. "AAPL", "005930.KS")
        #[arg(short, long)]
        symbol: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Lookback period: 3mo, 6mo, 1y, 2y, 5y, max
        #[arg(short, long, default_value = "1y")]
        period: LookbackPeriod,

        #[command(flatten)]
        indicators: IndicatorArgs,

        /// Number of trailing rows to print
        #[arg(long, default_value = "10")]
        rows: usize,

        /// Target multiple for the valuation estimates
        #[arg(long, default_value = "15")]
        multiple: Decimal,
    },

    /// Start the API server
    Serve {
        /// Bind address
        #[arg(short, long, default_value = "0.0.0.0:3000")]
        bind: String,

        #[command(flatten)]
        source: SourceArgs,

        /// Seconds a fetched history or profile stays cached
        #[arg(long, default_value_t = DEFAULT_TTL.as_secs())]
        cache_ttl_secs: u64,
    },

    /// List the supported lookback periods
    Periods,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Analyze {
            symbol,
            source,
            period,
            indicators,
            rows,
            multiple,
        } => {
            let provider = build_provider(&source)?;
            let set = build_indicator_set(&indicators)?;
            run_analysis(provider.as_ref(), &symbol, period, &set, rows, multiple).await?;
        }
        Commands::Serve {
            bind,
            source,
            cache_ttl_secs,
        } => {
            let inner = build_provider(&source)?;
            let ttl = Duration::from_secs(cache_ttl_secs);
            tracing::info!(ttl_secs = cache_ttl_secs, "Caching provider responses");
            let provider: Arc<dyn DataProvider> = Arc::new(CachedDataProvider::from_boxed(inner, ttl));
            tickerlens_api::start_server(provider, &bind).await?;
        }
        Commands::Periods => {
            println!("Available lookback periods:");
            for period in LookbackPeriod::ALL {
                println!("  {:<4} - {}", period.as_str(), period.label());
            }
        }
    }

    Ok(())
}

fn build_provider(source: &SourceArgs) -> Result<Box<dyn DataProvider>> {
    if source.yahoo {
        tracing::info!("Using Yahoo Finance chart endpoint");
        return Ok(Box::new(YahooDataProvider::new()?));
    }
    match &source.data_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "Using CSV data directory");
            Ok(Box::new(CsvDataProvider::new(dir)))
        }
        None => anyhow::bail!("No data source: pass --data-dir <DIR> or --yahoo"),
    }
}

/// Config file first, then per-family flags on top.
fn build_indicator_set(args: &IndicatorArgs) -> Result<IndicatorSet> {
    let mut set = match &args.config {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            toml::from_str::<IndicatorSet>(&raw)
                .with_context(|| format!("Invalid indicator config {}", path.display()))?
        }
        None => IndicatorSet::default(),
    };

    for (family, value, disabled) in [
        (IndicatorFamily::Sma, &args.sma, args.no_sma),
        (IndicatorFamily::Rsi, &args.rsi, args.no_rsi),
        (IndicatorFamily::Macd, &args.macd, args.no_macd),
    ] {
        if let Some(value) = value {
            set.apply_override(family, value)?;
        }
        if disabled {
            set.set_enabled(family, false);
        }
    }
    Ok(set)
}

async fn run_analysis(
    provider: &dyn DataProvider,
    symbol: &str,
    period: LookbackPeriod,
    set: &IndicatorSet,
    rows: usize,
    multiple: Decimal,
) -> Result<()> {
    tracing::info!(%symbol, %period, "Starting analysis");

    let prices = provider.load_history(symbol, period).await?;
    let augmented = assemble(&prices, set)?;
    let info = match provider.company_info(symbol).await {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(%symbol, error = %e, "Company info unavailable");
            CompanyInfo::default()
        }
    };

    let sep = "=".repeat(72);
    println!("\n{sep}");
    println!("  {} ({})", prices.symbol(), period.label());
    println!("{sep}");
    if let (Some(first), Some(last)) = (prices.first_date(), prices.last_date()) {
        println!("  Range:           {} → {} ({} bars)", first, last, prices.len());
    }
    print_company_info(&info);
    print_reports(&augmented);
    print_rows(&augmented, rows);
    print_valuation(&info, multiple);
    println!("{sep}\n");

    Ok(())
}

fn print_company_info(info: &CompanyInfo) {
    if info.is_empty() {
        println!("  Company info unavailable");
        return;
    }
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
    let num = |v: &Option<Decimal>| v.map(|d| d.round_dp(2).to_string()).unwrap_or_else(|| "-".to_string());
    println!("  Name:            {}", text(&info.name));
    println!("  Sector:          {}", text(&info.sector));
    println!("  Industry:        {}", text(&info.industry));
    println!("  Website:         {}", text(&info.website));
    println!(
        "  Employees:       {}",
        info.employees.map(|e| e.to_string()).unwrap_or_else(|| "-".to_string())
    );
    println!("  Price:           {} {}", num(&info.current_price), text(&info.currency));
    println!("  Market Cap:      {}", num(&info.market_cap));
    println!("  Trailing P/E:    {}", num(&info.trailing_pe));
    println!("  Trailing EPS:    {}", num(&info.trailing_eps));
    println!("  Price/Book:      {}", num(&info.price_to_book));
}

fn print_reports(series: &AugmentedSeries) {
    if series.reports().is_empty() {
        println!("  No indicators enabled");
        return;
    }
    println!("  Indicators:");
    for report in series.reports() {
        match &report.status {
            IndicatorStatus::Computed => println!("    {:<18} ok", report.label),
            IndicatorStatus::Unavailable(reason) => {
                println!("    {:<18} unavailable ({})", report.label, reason)
            }
        }
    }
}

fn format_cell(value: Option<Decimal>) -> String {
    value
        .map(|v| v.round_dp(2).to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_rows(series: &AugmentedSeries, rows: usize) {
    let bars = series.prices().bars();
    let start = bars.len().saturating_sub(rows);

    let mut header = format!("  {:<10} {:>10}", "date", "close");
    for col in series.columns() {
        header.push_str(&format!(" {:>18}", col.name()));
    }
    println!("\n{}", header);

    for (i, bar) in bars.iter().enumerate().skip(start) {
        let mut line = format!("  {:<10} {:>10}", bar.date, format_cell(Some(bar.close)));
        for col in series.columns() {
            line.push_str(&format!(" {:>18}", format_cell(col.values[i])));
        }
        println!("{}", line);
    }
    println!();
}

fn print_valuation(info: &CompanyInfo, multiple: Decimal) {
    for method in [ValuationMethod::Earnings, ValuationMethod::Book] {
        match tickerlens_core::estimate(info, method, multiple) {
            Some(est) => println!(
                "  Fair value ({:<8} x{}): {} (upside {}%)",
                method.to_string(),
                multiple,
                est.fair_value.round_dp(2),
                format_cell(est.upside_pct)
            ),
            None => println!(
                "  Fair value ({:<8} x{}): not available",
                method.to_string(),
                multiple
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickerlens_indicators::IndicatorKind;

    #[test]
    fn test_flags_override_defaults() {
        let args = IndicatorArgs {
            sma: Some("5".into()),
            no_rsi: true,
            ..Default::default()
        };
        let set = build_indicator_set(&args).unwrap();
        assert_eq!(
            set.enabled_kinds(IndicatorFamily::Sma),
            vec![IndicatorKind::Sma { window: 5 }]
        );
        assert!(!set.is_enabled(IndicatorFamily::Rsi));
        assert!(set.is_enabled(IndicatorFamily::Macd));
    }

    #[test]
    fn test_bad_macd_flag() {
        let args = IndicatorArgs {
            macd: Some("12,26".into()),
            ..Default::default()
        };
        assert!(build_indicator_set(&args).is_err());
    }

    #[test]
    fn test_format_cell() {
        assert_eq!(format_cell(None), "-");
        assert_eq!(format_cell(Some(Decimal::new(12346, 3))), "12.35");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "tickerlens", "analyze", "--symbol", "AAPL", "--yahoo", "--period", "6mo", "--no-macd",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze { period, source, indicators, .. } => {
                assert_eq!(period, LookbackPeriod::SixMonths);
                assert!(source.yahoo);
                assert!(indicators.no_macd);
            }
            _ => panic!("expected analyze"),
        }
    }
}
