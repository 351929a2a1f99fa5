use chrono::{DateTime, NaiveDate};
use marketpulse_core::{AppConfig, CoreError, MonthKey, PriceApiError};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, error, warn};

const CHART_PATH: &str = "/v8/finance/chart";

#[derive(Debug, Clone, Deserialize)]
struct ChartEnvelope {
    chart: ChartPayload,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartPayload {
    #[serde(default)]
    result: Option<Vec<ChartSeries>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChartSeries {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Clone, Deserialize)]
struct Indicators {
    quote: Vec<QuoteBlock>,
}

#[derive(Debug, Clone, Deserialize)]
struct QuoteBlock {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Client for the historical stock price provider. Stateless and read-only.
#[derive(Debug)]
pub struct PriceClient {
    http_client: Client,
    base_url: String,
}

impl PriceClient {
    pub fn new(config: &AppConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(CoreError::Network)?;

        Ok(Self {
            http_client,
            base_url: config.price_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch daily closes for `[start_year-01-01, (end_year+1)-01-01)` and
    /// reduce them to one closing price per month (last trading day wins).
    ///
    /// An unknown symbol or an empty payload yields an empty series, not an
    /// error; callers substitute zeros for charting.
    pub async fn monthly_closes(
        &self,
        ticker: &str,
        start_year: i32,
        end_year: i32,
    ) -> Result<Vec<(MonthKey, f64)>, CoreError> {
        let (period1, period2) =
            year_range_epochs(start_year, end_year).ok_or_else(|| CoreError::InvalidInput {
                message: format!("invalid year range {start_year}..{end_year}"),
            })?;

        let url = format!("{}{}/{}", self.base_url, CHART_PATH, ticker);
        debug!("Fetching daily closes for {} over {}..={}", ticker, start_year, end_year);

        let response = match self
            .http_client
            .get(&url)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
            ])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                error!("Network error fetching prices for {}: {}", ticker, e);
                if e.is_timeout() {
                    return Err(CoreError::Price(PriceApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            warn!("Price provider does not know symbol {}", ticker);
            return Ok(Vec::new());
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(CoreError::Price(PriceApiError::RateLimitExceeded {
                retry_after: 60,
            }));
        }
        if !status.is_success() {
            return Err(CoreError::Price(PriceApiError::ServerError {
                status_code: status.as_u16(),
            }));
        }

        let envelope: ChartEnvelope = response.json().await.map_err(|e| {
            error!("Failed to parse price payload for {}: {}", ticker, e);
            CoreError::Price(PriceApiError::InvalidResponse {
                details: format!("failed to parse price payload for {ticker}"),
            })
        })?;

        if let Some(provider_error) = envelope.chart.error {
            warn!("Price provider reported error for {}: {}", ticker, provider_error);
            return Ok(Vec::new());
        }

        let Some(series) = envelope.chart.result.and_then(|mut r| {
            if r.is_empty() {
                None
            } else {
                Some(r.remove(0))
            }
        }) else {
            return Ok(Vec::new());
        };

        let Some(quote) = series.indicators.quote.first() else {
            return Ok(Vec::new());
        };

        Ok(reduce_monthly(&series.timestamp, &quote.close))
    }
}

/// Reduce parallel timestamp/close arrays to one close per calendar month.
/// Samples arrive in ascending time order, so the last valid sample of each
/// month wins. Missing closes are skipped.
fn reduce_monthly(timestamps: &[i64], closes: &[Option<f64>]) -> Vec<(MonthKey, f64)> {
    let mut by_month: BTreeMap<MonthKey, f64> = BTreeMap::new();

    for (ts, close) in timestamps.iter().zip(closes.iter()) {
        let Some(close) = close else { continue };
        let Some(moment) = DateTime::from_timestamp(*ts, 0) else {
            continue;
        };
        by_month.insert(MonthKey::from_date(moment.date_naive()), *close);
    }

    by_month.into_iter().collect()
}

fn year_range_epochs(start_year: i32, end_year: i32) -> Option<(i64, i64)> {
    let start = NaiveDate::from_ymd_opt(start_year, 1, 1)?
        .and_hms_opt(0, 0, 0)?
        .and_utc()
        .timestamp();
    let end = NaiveDate::from_ymd_opt(end_year.checked_add(1)?, 1, 1)?
        .and_hms_opt(0, 0, 0)?
        .and_utc()
        .timestamp();
    (start < end).then_some((start, end))
}
