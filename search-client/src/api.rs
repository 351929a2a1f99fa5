use chrono::NaiveDate;
use marketpulse_core::{
    AppConfig, Comment, CoreError, Post, SearchApiError, Sentiment, SentimentTally,
};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

const POSTS_INDEX: &str = "posts";
const COMMENTS_INDEX: &str = "comments";

#[derive(Debug, Clone, Serialize)]
struct SearchRequest {
    q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    filter: Option<String>,
    limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchResponse<T> {
    hits: Vec<T>,
    #[serde(default, rename = "estimatedTotalHits")]
    estimated_total_hits: Option<u64>,
}

/// Post document as stored in the engine's posts index. Comma-joined list
/// fields mirror the corpus loader's flat metadata schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostDocument {
    pub id: String,
    pub title: String,
    pub text: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub score: f64,
    pub url: String,
    pub upvotes: i64,
    pub downvotes: i64,
    pub num_comments: u32,
    pub comment_ids: String,
    pub tickers: String,
    pub bullish_count: u64,
    pub neutral_count: u64,
    pub bearish_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentDocument {
    pub id: String,
    pub post_id: String,
    pub text: String,
    pub score: f64,
    pub sentiment: Sentiment,
}

fn split_joined(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

impl TryFrom<PostDocument> for Post {
    type Error = CoreError;

    fn try_from(doc: PostDocument) -> Result<Self, Self::Error> {
        let date = NaiveDate::from_ymd_opt(doc.year, doc.month, doc.day).ok_or_else(|| {
            CoreError::SearchApi(SearchApiError::InvalidResponse {
                details: format!(
                    "post {} carries invalid date {}-{}-{}",
                    doc.id, doc.year, doc.month, doc.day
                ),
            })
        })?;

        Ok(Post {
            id: doc.id,
            title: doc.title,
            text: doc.text,
            date,
            score: doc.score,
            url: doc.url,
            upvotes: doc.upvotes,
            downvotes: doc.downvotes,
            num_comments: doc.num_comments,
            tickers: split_joined(&doc.tickers),
            sentiment: SentimentTally::new(doc.bullish_count, doc.neutral_count, doc.bearish_count),
            comment_ids: split_joined(&doc.comment_ids),
            comments: Vec::new(),
        })
    }
}

impl From<CommentDocument> for Comment {
    fn from(doc: CommentDocument) -> Self {
        Self {
            id: doc.id,
            post_id: doc.post_id,
            text: doc.text,
            score: doc.score,
            sentiment: doc.sentiment,
        }
    }
}

/// Client for the keyword search engine's JSON API. Stateless and read-only,
/// safe to share across concurrent lookups.
#[derive(Debug)]
pub struct SearchClient {
    http_client: Client,
    base_url: String,
}

impl SearchClient {
    pub fn new(config: &AppConfig) -> Result<Self, CoreError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(CoreError::Network)?;

        Ok(Self {
            http_client,
            base_url: config.search_url.trim_end_matches('/').to_string(),
        })
    }

    /// Probe the engine's health endpoint. Run once at startup so an
    /// unreachable engine fails the process instead of the first search.
    pub async fn health_check(&self) -> Result<(), CoreError> {
        let url = format!("{}/health", self.base_url);
        let response = self.http_client.get(&url).send().await.map_err(|e| {
            error!("Search engine health check failed: {}", e);
            CoreError::SearchApi(SearchApiError::EngineUnreachable {
                endpoint: self.base_url.clone(),
            })
        })?;

        if response.status().is_success() {
            debug!("Search engine healthy at {}", self.base_url);
            Ok(())
        } else {
            Err(CoreError::SearchApi(SearchApiError::EngineUnreachable {
                endpoint: self.base_url.clone(),
            }))
        }
    }

    /// Query the posts index. An empty `query` means match-all within the
    /// year filter: it is passed through to the engine unchanged and the
    /// engine treats an empty keyword set as no keyword constraint.
    pub async fn query_posts(
        &self,
        query: &str,
        start_year: Option<i32>,
        end_year: Option<i32>,
        top_k: usize,
    ) -> Result<Vec<Post>, CoreError> {
        let request = SearchRequest {
            q: query.to_string(),
            filter: year_filter(start_year, end_year),
            limit: top_k,
        };

        let response = self.execute(POSTS_INDEX, &request).await?;
        let body: SearchResponse<PostDocument> = response.json().await.map_err(|e| {
            error!("Failed to parse posts search response: {}", e);
            CoreError::SearchApi(SearchApiError::InvalidResponse {
                details: "failed to parse posts search response".to_string(),
            })
        })?;

        info!(
            "Retrieved {} posts for query {:?} (estimated total: {:?})",
            body.hits.len(),
            query,
            body.estimated_total_hits
        );

        body.hits.into_iter().map(Post::try_from).collect()
    }

    /// Look up the comments of one post, capped at `cap` results, in the
    /// engine's native result order.
    pub async fn comments_for_post(
        &self,
        post_id: &str,
        cap: usize,
    ) -> Result<Vec<Comment>, CoreError> {
        let request = SearchRequest {
            q: String::new(),
            filter: Some(format!("post_id = \"{}\"", post_id)),
            limit: cap,
        };

        let response = self.execute(COMMENTS_INDEX, &request).await?;
        let body: SearchResponse<CommentDocument> = response.json().await.map_err(|e| {
            error!("Failed to parse comments response for post {}: {}", post_id, e);
            CoreError::SearchApi(SearchApiError::InvalidResponse {
                details: format!("failed to parse comments for post {}", post_id),
            })
        })?;

        debug!("Retrieved {} comments for post {}", body.hits.len(), post_id);
        Ok(body.hits.into_iter().map(Comment::from).collect())
    }

    async fn execute(
        &self,
        index: &str,
        request: &SearchRequest,
    ) -> Result<Response, CoreError> {
        let url = format!("{}/indexes/{}/search", self.base_url, index);
        debug!("Searching index {} with limit {}", index, request.limit);

        let response = match self.http_client.post(&url).json(request).send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error querying index {}: {}", index, e);
                if e.is_timeout() {
                    return Err(CoreError::SearchApi(SearchApiError::RequestTimeout));
                } else if e.is_connect() {
                    return Err(CoreError::SearchApi(SearchApiError::EngineUnreachable {
                        endpoint: self.base_url.clone(),
                    }));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        error!("Search request failed with status {} for index {}", status, index);
        match status {
            StatusCode::BAD_REQUEST => {
                let details = response.text().await.unwrap_or_default();
                Err(CoreError::SearchApi(SearchApiError::QuerySyntax { details }))
            }
            StatusCode::NOT_FOUND => Err(CoreError::SearchApi(SearchApiError::IndexNotFound {
                index: index.to_string(),
            })),
            StatusCode::TOO_MANY_REQUESTS => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                Err(CoreError::SearchApi(SearchApiError::RateLimitExceeded {
                    retry_after,
                }))
            }
            _ => Err(CoreError::SearchApi(SearchApiError::ServerError {
                status_code: status.as_u16(),
            })),
        }
    }
}

fn year_filter(start_year: Option<i32>, end_year: Option<i32>) -> Option<String> {
    match (start_year, end_year) {
        (Some(start), Some(end)) => Some(format!("year >= {} AND year <= {}", start, end)),
        (Some(start), None) => Some(format!("year >= {}", start)),
        (None, Some(end)) => Some(format!("year <= {}", end)),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_filter_forms() {
        assert_eq!(
            year_filter(Some(2021), Some(2023)).as_deref(),
            Some("year >= 2021 AND year <= 2023")
        );
        assert_eq!(year_filter(Some(2021), None).as_deref(), Some("year >= 2021"));
        assert_eq!(year_filter(None, None), None);
    }

    #[test]
    fn test_post_document_conversion() {
        let doc = PostDocument {
            id: "abc123".to_string(),
            title: "TSLA to the moon".to_string(),
            text: "calls printed".to_string(),
            year: 2021,
            month: 2,
            day: 14,
            score: 42.0,
            url: "https://example.com/abc123".to_string(),
            upvotes: 45,
            downvotes: 3,
            num_comments: 2,
            comment_ids: "c1,c2".to_string(),
            tickers: "TSLA, GME".to_string(),
            bullish_count: 2,
            neutral_count: 1,
            bearish_count: 0,
        };

        let post = Post::try_from(doc).unwrap();
        assert_eq!(post.date, NaiveDate::from_ymd_opt(2021, 2, 14).unwrap());
        assert_eq!(post.comment_ids, vec!["c1", "c2"]);
        assert_eq!(post.tickers, vec!["TSLA", "GME"]);
        assert_eq!(post.sentiment, SentimentTally::new(2, 1, 0));
        assert!(post.comments.is_empty());
    }

    #[test]
    fn test_post_document_invalid_date() {
        let doc = PostDocument {
            id: "bad".to_string(),
            title: String::new(),
            text: String::new(),
            year: 2021,
            month: 13,
            day: 1,
            score: 0.0,
            url: String::new(),
            upvotes: 0,
            downvotes: 0,
            num_comments: 0,
            comment_ids: String::new(),
            tickers: String::new(),
            bullish_count: 0,
            neutral_count: 0,
            bearish_count: 0,
        };

        assert!(Post::try_from(doc).is_err());
    }
}
