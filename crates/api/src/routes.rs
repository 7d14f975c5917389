use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tickerlens_chart::{build_chart, ChartData};
use tickerlens_core::{valuation, CompanyInfo, LookbackPeriod, ValuationEstimate, ValuationMethod};
use tickerlens_indicators::{assemble, IndicatorFamily, IndicatorReport, IndicatorSet};

/// Target multiple used when the client does not pass one.
const DEFAULT_MULTIPLE: Decimal = dec!(15);

pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/periods", get(list_periods))
        .route("/info/{symbol}", get(company_info))
        .route("/analysis/{symbol}", get(analysis))
        .route("/valuation/{symbol}", get(valuation_estimate))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---------------------------------------------------------------------------
// Lookback periods
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct PeriodInfo {
    value: LookbackPeriod,
    label: &'static str,
}

async fn list_periods() -> impl IntoResponse {
    let periods: Vec<PeriodInfo> = LookbackPeriod::ALL
        .iter()
        .map(|p| PeriodInfo {
            value: *p,
            label: p.label(),
        })
        .collect();
    Json(periods)
}

// ---------------------------------------------------------------------------
// Company info
// ---------------------------------------------------------------------------

async fn company_info(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
) -> Result<Json<CompanyInfo>, ApiError> {
    Ok(Json(state.provider.company_info(&symbol).await?))
}

/// Info is decoration for an analysis; a failed lookup degrades to empty.
async fn info_or_empty(state: &AppState, symbol: &str) -> CompanyInfo {
    match state.provider.company_info(symbol).await {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(%symbol, error = %e, "Company info unavailable");
            CompanyInfo::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct AnalysisQuery {
    period: Option<String>,
    sma: Option<String>,
    rsi: Option<String>,
    macd: Option<String>,
}

impl AnalysisQuery {
    fn lookback(&self) -> Result<LookbackPeriod, ApiError> {
        match &self.period {
            Some(p) => Ok(p.parse::<LookbackPeriod>()?),
            None => Ok(LookbackPeriod::default()),
        }
    }

    fn indicator_set(&self) -> Result<IndicatorSet, ApiError> {
        let mut set = IndicatorSet::default();
        for (family, value) in [
            (IndicatorFamily::Sma, &self.sma),
            (IndicatorFamily::Rsi, &self.rsi),
            (IndicatorFamily::Macd, &self.macd),
        ] {
            if let Some(value) = value {
                set.apply_override(family, value)?;
            }
        }
        Ok(set)
    }
}

#[derive(Serialize)]
struct AnalysisResponse {
    symbol: String,
    period: LookbackPeriod,
    info: CompanyInfo,
    chart: ChartData,
    reports: Vec<IndicatorReport>,
}

async fn analysis(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<AnalysisQuery>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let period = query.lookback()?;
    let set = query.indicator_set()?;

    let prices = state.provider.load_history(&symbol, period).await?;
    let augmented = assemble(&prices, &set)?;
    let info = info_or_empty(&state, &symbol).await;

    tracing::info!(
        %symbol,
        %period,
        bars = augmented.len(),
        columns = augmented.columns().len(),
        "Analysis served"
    );

    Ok(Json(AnalysisResponse {
        symbol: prices.symbol().to_string(),
        period,
        info,
        chart: build_chart(&augmented, &set),
        reports: augmented.reports().to_vec(),
    }))
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ValuationQuery {
    method: Option<String>,
    multiple: Option<Decimal>,
}

#[derive(Serialize)]
struct ValuationResponse {
    symbol: String,
    method: ValuationMethod,
    multiple: Decimal,
    /// Null when the needed metric is missing or not positive.
    estimate: Option<ValuationEstimate>,
}

async fn valuation_estimate(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(query): Query<ValuationQuery>,
) -> Result<Json<ValuationResponse>, ApiError> {
    let method = match &query.method {
        Some(m) => m.parse::<ValuationMethod>().map_err(ApiError::BadRequest)?,
        None => ValuationMethod::Earnings,
    };
    let multiple = query.multiple.unwrap_or(DEFAULT_MULTIPLE);
    if multiple <= Decimal::ZERO {
        return Err(ApiError::BadRequest("Multiple must be positive".into()));
    }

    let info = state.provider.company_info(&symbol).await?;
    Ok(Json(ValuationResponse {
        symbol,
        method,
        multiple,
        estimate: valuation::estimate(&info, method, multiple),
    }))
}

#[cfg(test)]
mod tests {
    use crate::build_router;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tickerlens_core::{
        Bar, CompanyInfo, DataError, DataProvider, LookbackPeriod, PriceSeries, SeriesError,
    };
    use tower::ServiceExt;

    struct FixedProvider;

    #[async_trait]
    impl DataProvider for FixedProvider {
        async fn load_history(
            &self,
            symbol: &str,
            _period: LookbackPeriod,
        ) -> Result<PriceSeries, DataError> {
            match symbol {
                "ACME" => {
                    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
                    let bars = (0..40i64)
                        .map(|i| {
                            let close = Decimal::from(50 + (i * 7) % 11);
                            Bar {
                                date: start + chrono::Days::new(i as u64),
                                open: close,
                                high: close + dec!(1),
                                low: close - dec!(1),
                                close,
                                volume: dec!(1000),
                            }
                        })
                        .collect();
                    Ok(PriceSeries::new("ACME", bars)?)
                }
                "EMPTY" => Ok(PriceSeries::empty("EMPTY")),
                "BROKEN" => Err(SeriesError::DuplicateDate(
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                )
                .into()),
                _ => Err(DataError::NotFound(symbol.to_string())),
            }
        }

        async fn company_info(&self, symbol: &str) -> Result<CompanyInfo, DataError> {
            match symbol {
                "ACME" => Ok(CompanyInfo {
                    name: Some("Acme Corp".into()),
                    current_price: Some(dec!(100)),
                    trailing_eps: Some(dec!(5)),
                    ..Default::default()
                }),
                _ => Err(DataError::NotFound(symbol.to_string())),
            }
        }
    }

    async fn get(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = build_router(Arc::new(FixedProvider));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get("/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_periods() {
        let (status, body) = get("/api/periods").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 6);
        assert_eq!(body[2]["value"], "1y");
    }

    #[tokio::test]
    async fn test_analysis_defaults() {
        let (status, body) = get("/api/analysis/ACME").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "ACME");
        assert_eq!(body["period"], "1y");
        assert_eq!(body["info"]["name"], "Acme Corp");
        assert_eq!(body["chart"]["dates"].as_array().unwrap().len(), 40);
        assert_eq!(body["chart"]["price"]["overlays"].as_array().unwrap().len(), 2);
        assert_eq!(body["reports"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_analysis_overrides() {
        let (status, body) = get("/api/analysis/ACME?period=6mo&sma=5&rsi=none&macd=5,35,5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["period"], "6mo");
        assert_eq!(body["chart"]["price"]["overlays"][0]["name"], "sma_5");
        assert!(body["chart"]["oscillator"].is_null());
        assert_eq!(body["chart"]["macd"][0]["line"]["name"], "macd_5_35_5");
    }

    #[tokio::test]
    async fn test_analysis_error_statuses() {
        let (status, body) = get("/api/analysis/EMPTY").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("No price data"));

        let (status, _) = get("/api/analysis/NOPE").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get("/api/analysis/BROKEN").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = get("/api/analysis/ACME?period=7y").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get("/api/analysis/ACME?macd=12,26").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_analysis_huge_periods() {
        let (status, body) =
            get("/api/analysis/ACME?rsi=18446744073709551615&macd=1,18446744073709551615,9").await;
        assert_eq!(status, StatusCode::OK);
        let rsi = &body["chart"]["oscillator"]["lines"][0];
        assert_eq!(rsi["available"], false);
        assert_eq!(rsi["values"].as_array().unwrap().len(), 40);
        assert_eq!(body["chart"]["macd"][0]["line"]["values"].as_array().unwrap().len(), 40);

        let (status, body) = get("/api/valuation/ACME?multiple=79228162514264337593543950335").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["estimate"].is_null());
    }

    #[tokio::test]
    async fn test_valuation() {
        let (status, body) = get("/api/valuation/ACME?method=earnings&multiple=20").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estimate"]["fair_value"], "100");

        let (status, body) = get("/api/valuation/ACME?method=book").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["estimate"].is_null());

        let (status, _) = get("/api/valuation/ACME?multiple=-1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
