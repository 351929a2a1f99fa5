//! Chart builders: pure transforms from aggregated sentiment data to
//! renderable chart descriptions. No drawing happens here; the presentation
//! layer decides how to paint each description.

use analytics::MonthPoint;
use marketpulse_core::SentimentTally;
use serde::Serialize;

/// Visual multiplier applied to sentiment bars so they stay readable next to
/// the price line. Presentation-only; the underlying magnitudes keep their
/// `[-1, 1]` range.
pub const SENTIMENT_BAR_SCALE: f64 = 3.0;

pub const BULLISH_COLOR: &str = "green";
pub const NEUTRAL_COLOR: &str = "gray";
pub const BEARISH_COLOR: &str = "red";
pub const PRICE_COLOR: &str = "blue";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieSlice {
    pub label: String,
    pub value: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PieChart {
    pub slices: Vec<PieSlice>,
}

impl PieChart {
    /// Total of all slice values; the denominator for proportional display.
    pub fn total(&self) -> f64 {
        self.slices.iter().map(|s| s.value).sum()
    }
}

/// One bar of the diverging chart. Bars carry the scaled magnitude and are
/// split strictly by sign: a month is either bullish or bearish, never both.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPoint {
    pub month: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DivergingChart {
    /// Ordered month labels forming the shared x axis.
    pub months: Vec<String>,
    pub bullish: Vec<BarPoint>,
    pub bearish: Vec<BarPoint>,
    /// Closing price per month, aligned with `months`, on a secondary scale.
    pub price: Vec<f64>,
    pub price_label: String,
}

/// Sentiment mix of the displayed result set. Zero-count labels are omitted;
/// an all-zero tally yields a single placeholder slice so the chart renders
/// rather than erroring.
pub fn sentiment_pie(tally: &SentimentTally) -> PieChart {
    let mut slices = Vec::new();

    if tally.bullish > 0 {
        slices.push(PieSlice {
            label: "bullish".to_string(),
            value: tally.bullish as f64,
            color: BULLISH_COLOR.to_string(),
        });
    }
    if tally.neutral > 0 {
        slices.push(PieSlice {
            label: "neutral".to_string(),
            value: tally.neutral as f64,
            color: NEUTRAL_COLOR.to_string(),
        });
    }
    if tally.bearish > 0 {
        slices.push(PieSlice {
            label: "bearish".to_string(),
            value: tally.bearish as f64,
            color: BEARISH_COLOR.to_string(),
        });
    }

    if slices.is_empty() {
        slices.push(PieSlice {
            label: "No sentiments".to_string(),
            value: 1.0,
            color: NEUTRAL_COLOR.to_string(),
        });
    }

    PieChart { slices }
}

/// Diverging sentiment bars overlaid with a price line, from the merged
/// monthly series.
pub fn sentiment_price_chart(series: &[MonthPoint], ticker: &str) -> DivergingChart {
    let months: Vec<String> = series.iter().map(|p| p.month.to_string()).collect();
    let price: Vec<f64> = series.iter().map(|p| p.close).collect();

    let mut bullish = Vec::new();
    let mut bearish = Vec::new();
    for point in series {
        let scaled = point.signed_magnitude * SENTIMENT_BAR_SCALE;
        if point.signed_magnitude > 0.0 {
            bullish.push(BarPoint {
                month: point.month.to_string(),
                value: scaled,
            });
        } else if point.signed_magnitude < 0.0 {
            bearish.push(BarPoint {
                month: point.month.to_string(),
                value: scaled,
            });
        }
    }

    let price_label = if ticker.trim().is_empty() {
        "Stock Price".to_string()
    } else {
        format!("Stock Price ({})", ticker.trim())
    };

    DivergingChart {
        months,
        bullish,
        bearish,
        price,
        price_label,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketpulse_core::MonthKey;

    #[test]
    fn test_pie_omits_zero_labels() {
        let pie = sentiment_pie(&SentimentTally::new(3, 0, 1));
        let labels: Vec<&str> = pie.slices.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["bullish", "bearish"]);
        assert_eq!(pie.total(), 4.0);
    }

    #[test]
    fn test_pie_all_zero_yields_placeholder() {
        let pie = sentiment_pie(&SentimentTally::default());
        assert_eq!(pie.slices.len(), 1);
        assert_eq!(pie.slices[0].label, "No sentiments");
        assert_eq!(pie.slices[0].color, NEUTRAL_COLOR);
    }

    #[test]
    fn test_diverging_chart_splits_by_sign() {
        let series = vec![
            MonthPoint {
                month: MonthKey::new(2021, 1),
                signed_magnitude: 1.0,
                close: 100.0,
            },
            MonthPoint {
                month: MonthKey::new(2021, 2),
                signed_magnitude: -0.5,
                close: 110.0,
            },
            MonthPoint {
                month: MonthKey::new(2021, 3),
                signed_magnitude: 0.0,
                close: 120.0,
            },
        ];

        let chart = sentiment_price_chart(&series, "TSLA");
        assert_eq!(chart.months, vec!["2021-01", "2021-02", "2021-03"]);
        assert_eq!(chart.price, vec![100.0, 110.0, 120.0]);
        assert_eq!(chart.price_label, "Stock Price (TSLA)");

        assert_eq!(chart.bullish.len(), 1);
        assert_eq!(chart.bullish[0].value, 3.0);
        assert_eq!(chart.bearish.len(), 1);
        assert_eq!(chart.bearish[0].value, -1.5);
    }

    #[test]
    fn test_diverging_chart_empty_series() {
        let chart = sentiment_price_chart(&[], "");
        assert!(chart.months.is_empty());
        assert!(chart.bullish.is_empty());
        assert!(chart.bearish.is_empty());
        assert_eq!(chart.price_label, "Stock Price");
    }
}
