use crate::fanout::attach_comments_with;
use crate::sort::sort_posts;
use chrono::NaiveDate;
use marketpulse_core::{Comment, CoreError, Post, SearchApiError, Sentiment, SentimentTally, SortKey};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn fixture_post(id: &str, ymd: (i32, u32, u32), score: f64, num_comments: u32) -> Post {
    Post {
        id: id.to_string(),
        title: format!("post {id}"),
        text: String::new(),
        date: NaiveDate::from_ymd_opt(ymd.0, ymd.1, ymd.2).unwrap(),
        score,
        url: format!("https://example.com/{id}"),
        upvotes: 0,
        downvotes: 0,
        num_comments,
        tickers: vec!["TSLA".to_string()],
        sentiment: SentimentTally::default(),
        comment_ids: Vec::new(),
        comments: Vec::new(),
    }
}

fn fixture_comment(id: &str, post_id: &str, sentiment: Sentiment) -> Comment {
    Comment {
        id: id.to_string(),
        post_id: post_id.to_string(),
        text: String::new(),
        score: 1.0,
        sentiment,
    }
}

fn ids(posts: &[Post]) -> Vec<&str> {
    posts.iter().map(|p| p.id.as_str()).collect()
}

#[test]
fn test_sort_descending_is_reverse_of_ascending() {
    let mut posts = vec![
        fixture_post("a", (2021, 1, 1), 3.0, 5),
        fixture_post("b", (2021, 2, 1), 1.0, 9),
        fixture_post("c", (2021, 3, 1), 2.0, 7),
    ];

    assert!(sort_posts(&mut posts, SortKey::Score, true));
    assert_eq!(ids(&posts), vec!["b", "c", "a"]);

    assert!(sort_posts(&mut posts, SortKey::Score, false));
    assert_eq!(ids(&posts), vec!["a", "c", "b"]);
}

#[test]
fn test_sort_is_idempotent() {
    let mut posts = vec![
        fixture_post("a", (2021, 3, 1), 3.0, 5),
        fixture_post("b", (2021, 2, 1), 1.0, 9),
        fixture_post("c", (2021, 1, 1), 2.0, 7),
    ];

    sort_posts(&mut posts, SortKey::Date, false);
    let once = ids(&posts).join(",");
    sort_posts(&mut posts, SortKey::Date, false);
    assert_eq!(ids(&posts).join(","), once);
}

#[test]
fn test_sort_empty_list_is_noop() {
    let mut posts: Vec<Post> = Vec::new();
    assert!(!sort_posts(&mut posts, SortKey::Score, false));
}

#[test]
fn test_sort_ties_keep_original_order() {
    let mut posts = vec![
        fixture_post("first", (2021, 1, 1), 2.0, 5),
        fixture_post("second", (2021, 1, 2), 2.0, 5),
        fixture_post("third", (2021, 1, 3), 9.0, 5),
    ];

    sort_posts(&mut posts, SortKey::Score, false);
    assert_eq!(ids(&posts), vec!["third", "first", "second"]);
}

#[tokio::test]
async fn test_fanout_attaches_and_recounts_comments() {
    let posts = vec![fixture_post("p1", (2021, 1, 1), 1.0, 99)];

    let (posts, report) = attach_comments_with(posts, 4, |post_id: String| async move {
        Ok(vec![
            fixture_comment("c1", &post_id, Sentiment::Bullish),
            fixture_comment("c2", &post_id, Sentiment::Bullish),
            fixture_comment("c3", &post_id, Sentiment::Bearish),
        ])
    })
    .await;

    assert_eq!(report.attempted, 1);
    assert_eq!(report.failures, 0);

    let post = &posts[0];
    assert_eq!(post.comments.len(), 3);
    // The stored count is replaced by what the lookup actually returned.
    assert_eq!(post.num_comments, 3);

    let labelled = post
        .comments
        .iter()
        .filter(|c| {
            matches!(
                c.sentiment,
                Sentiment::Bullish | Sentiment::Neutral | Sentiment::Bearish
            )
        })
        .count();
    assert_eq!(labelled, post.comments.len());
}

#[tokio::test]
async fn test_fanout_isolates_per_post_failures() {
    let posts = vec![
        fixture_post("p1", (2021, 1, 1), 1.0, 2),
        fixture_post("p2", (2021, 1, 2), 1.0, 2),
        fixture_post("p3", (2021, 1, 3), 1.0, 2),
    ];

    let (posts, report) = attach_comments_with(posts, 4, |post_id: String| async move {
        if post_id == "p2" {
            Err(CoreError::SearchApi(SearchApiError::RequestTimeout))
        } else {
            Ok(vec![fixture_comment("c", &post_id, Sentiment::Neutral)])
        }
    })
    .await;

    assert_eq!(report.attempted, 3);
    assert_eq!(report.failures, 1);
    // Order survives the fan-out and the failing post keeps an empty list.
    assert_eq!(ids(&posts), vec!["p1", "p2", "p3"]);
    assert_eq!(posts[0].comments.len(), 1);
    assert!(posts[1].comments.is_empty());
    assert_eq!(posts[1].num_comments, 2);
    assert_eq!(posts[2].comments.len(), 1);
}

#[tokio::test]
async fn test_fanout_respects_worker_bound() {
    let posts: Vec<Post> = (0..16)
        .map(|i| fixture_post(&format!("p{i}"), (2021, 1, 1), 1.0, 0))
        .collect();

    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let (current_ref, peak_ref) = (Arc::clone(&current), Arc::clone(&peak));
    let (_, report) = attach_comments_with(posts, 2, move |_post_id: String| {
        let current = Arc::clone(&current_ref);
        let peak = Arc::clone(&peak_ref);
        async move {
            let now = current.fetch_add(1, Ordering::SeqCst) + 1;
            peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            current.fetch_sub(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    })
    .await;

    assert_eq!(report.failures, 0);
    assert!(peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn test_fanout_empty_input() {
    let (posts, report) =
        attach_comments_with(Vec::new(), 4, |_post_id: String| async move { Ok(Vec::new()) })
            .await;
    assert!(posts.is_empty());
    assert_eq!(report.attempted, 0);
    assert_eq!(report.failures, 0);
}
