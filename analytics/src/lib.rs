//! Sentiment aggregation and price merging for the dashboard charts.
//!
//! Posts are bucketed by calendar month, tallies summed per bucket, and the
//! resulting series merged with monthly closing prices into the chart input.

use marketpulse_core::{CoreError, ErrorExt, MonthKey, Post, SentimentTally};
use price_client::PriceClient;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// One month of merged chart input. `signed_magnitude` is the unscaled
/// bullish-minus-bearish ratio difference in `[-1, 1]`; any readability
/// scaling happens in the chart builders, not here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthPoint {
    pub month: MonthKey,
    pub signed_magnitude: f64,
    pub close: f64,
}

/// Bucket posts by calendar month, summing sentiment tallies per bucket.
pub fn monthly_sentiment(posts: &[Post]) -> BTreeMap<MonthKey, SentimentTally> {
    let mut buckets: BTreeMap<MonthKey, SentimentTally> = BTreeMap::new();
    for post in posts {
        *buckets.entry(post.month_key()).or_default() += post.sentiment;
    }
    buckets
}

/// Corpus-wide sentiment totals for the currently displayed result set.
pub fn overall_tally(posts: &[Post]) -> SentimentTally {
    let mut total = SentimentTally::default();
    for post in posts {
        total += post.sentiment;
    }
    total
}

/// Merge monthly sentiment with monthly closes over the union of month keys.
///
/// A month missing from one side is filled with zero for that side: absent
/// sentiment in a traded month means "no posts", absent price in a posted
/// month means "market closed or no data". Output is ordered by month.
pub fn merge_series(
    sentiment: &BTreeMap<MonthKey, SentimentTally>,
    prices: &[(MonthKey, f64)],
) -> Vec<MonthPoint> {
    let price_by_month: BTreeMap<MonthKey, f64> = prices.iter().copied().collect();

    let months: BTreeSet<MonthKey> = sentiment
        .keys()
        .copied()
        .chain(price_by_month.keys().copied())
        .collect();

    months
        .into_iter()
        .map(|month| {
            let signed_magnitude = sentiment
                .get(&month)
                .map(|tally| {
                    let (bullish, bearish) = tally.ratios();
                    bullish - bearish
                })
                .unwrap_or(0.0);
            let close = price_by_month.get(&month).copied().unwrap_or(0.0);
            MonthPoint {
                month,
                signed_magnitude,
                close,
            }
        })
        .collect()
}

/// Degrade a price fetch outcome to a usable series. Provider errors are
/// recovered locally as an empty series and logged; they never fail the
/// chart render.
pub fn recover_prices(
    outcome: Result<Vec<(MonthKey, f64)>, CoreError>,
    ticker: &str,
) -> Vec<(MonthKey, f64)> {
    match outcome {
        Ok(prices) => prices,
        Err(e) => {
            warn!(
                "Price fetch for {:?} failed, charting a zero price series: {}",
                ticker,
                e.user_friendly_message()
            );
            Vec::new()
        }
    }
}

/// Build the chart input series for the current result set: monthly
/// sentiment merged with monthly closes for `ticker` over the year range.
/// An empty ticker skips the price fetch entirely.
pub async fn sentiment_price_series(
    posts: &[Post],
    ticker: &str,
    start_year: i32,
    end_year: i32,
    prices: &PriceClient,
) -> Vec<MonthPoint> {
    let sentiment = monthly_sentiment(posts);

    let ticker = ticker.trim();
    let price_series = if ticker.is_empty() {
        Vec::new()
    } else {
        recover_prices(
            prices.monthly_closes(ticker, start_year, end_year).await,
            ticker,
        )
    };

    debug!(
        "Merging {} sentiment buckets with {} price months",
        sentiment.len(),
        price_series.len()
    );

    merge_series(&sentiment, &price_series)
}
