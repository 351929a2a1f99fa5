use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Sentiment label attached to a comment, precomputed upstream by the corpus
/// loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Bullish,
    Neutral,
    Bearish,
}

/// Per-post sentiment tallies. The stored counts come from the index and are
/// not revalidated against attached comment labels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentTally {
    pub bullish: u64,
    pub neutral: u64,
    pub bearish: u64,
}

impl SentimentTally {
    pub fn new(bullish: u64, neutral: u64, bearish: u64) -> Self {
        Self {
            bullish,
            neutral,
            bearish,
        }
    }

    pub fn total(&self) -> u64 {
        self.bullish + self.neutral + self.bearish
    }

    /// Bullish and bearish proportions over their combined count, with
    /// neutral excluded from the denominator. A tally with no bullish or
    /// bearish counts yields `(0.0, 0.0)` rather than NaN.
    pub fn ratios(&self) -> (f64, f64) {
        let polar = self.bullish + self.bearish;
        if polar == 0 {
            return (0.0, 0.0);
        }
        (
            self.bullish as f64 / polar as f64,
            self.bearish as f64 / polar as f64,
        )
    }
}

impl std::ops::AddAssign for SentimentTally {
    fn add_assign(&mut self, other: Self) {
        self.bullish += other.bullish;
        self.neutral += other.neutral;
        self.bearish += other.bearish;
    }
}

/// A post retrieved from the search index. `comments` stays empty until the
/// fan-out fetcher attaches the looked-up records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub title: String,
    pub text: String,
    pub date: NaiveDate,
    pub score: f64,
    pub url: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub num_comments: u32,
    pub tickers: Vec<String>,
    pub sentiment: SentimentTally,
    pub comment_ids: Vec<String>,
    pub comments: Vec<Comment>,
}

impl Post {
    pub fn month_key(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}

/// A comment record. `post_id` is a back-reference only; the post never owns
/// the comment document in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub text: String,
    pub score: f64,
    pub sentiment: Sentiment,
}

/// Calendar year-month aggregation key, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Sortable fields of the post result schema. Parsing rejects names that are
/// not part of the schema, so an unknown field can never reach the sort
/// stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Score,
    Comments,
    Date,
}

impl FromStr for SortKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "score" => Ok(SortKey::Score),
            "num_comments" | "comments" => Ok(SortKey::Comments),
            "date" | "year" => Ok(SortKey::Date),
            other => Err(CoreError::InvalidInput {
                message: format!("unknown sort field: {other}"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ratios_zero_denominator() {
        let tally = SentimentTally::new(0, 7, 0);
        assert_eq!(tally.ratios(), (0.0, 0.0));
    }

    #[test]
    fn test_ratios_polar_only() {
        let tally = SentimentTally::new(1, 1, 3);
        let (bullish, bearish) = tally.ratios();
        assert_eq!(bullish, 0.25);
        assert_eq!(bearish, 0.75);
    }

    #[test]
    fn test_month_key_ordering_and_display() {
        let january = MonthKey::new(2021, 1);
        let february = MonthKey::new(2021, 2);
        let next_year = MonthKey::new(2022, 1);
        assert!(january < february);
        assert!(february < next_year);
        assert_eq!(january.to_string(), "2021-01");
    }

    #[test]
    fn test_sort_key_rejects_unknown_field() {
        assert!(SortKey::from_str("score").is_ok());
        assert!(SortKey::from_str("upvote_ratio").is_err());
    }
}
