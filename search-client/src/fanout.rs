use crate::api::SearchClient;
use futures::future::join_all;
use marketpulse_core::{config::COMMENT_FETCH_CAP, Comment, CoreError, Post};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, warn};

/// Outcome of one comment-attachment pass. A nonzero `failures` count means
/// that many posts carry an empty comment list instead of their lookups.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutReport {
    pub attempted: usize,
    pub failures: usize,
}

/// Attach each post's comments via one bounded-concurrency lookup per post.
///
/// Post order is preserved. A failing lookup is isolated to its post: the
/// post keeps an empty comment list and its stored comment count, and the
/// failure is tallied in the report instead of aborting the batch.
pub async fn attach_comments(
    client: Arc<SearchClient>,
    posts: Vec<Post>,
    workers: usize,
) -> (Vec<Post>, FanoutReport) {
    attach_comments_with(posts, workers, move |post_id| {
        let client = Arc::clone(&client);
        async move { client.comments_for_post(&post_id, COMMENT_FETCH_CAP).await }
    })
    .await
}

/// Fan-out core, generic over the lookup so tests can drive it with
/// fixtures. Concurrency is bounded by a semaphore sized to `workers`.
pub async fn attach_comments_with<F, Fut>(
    posts: Vec<Post>,
    workers: usize,
    fetch: F,
) -> (Vec<Post>, FanoutReport)
where
    F: Fn(String) -> Fut + Clone + Send + 'static,
    Fut: Future<Output = Result<Vec<Comment>, CoreError>> + Send + 'static,
{
    let attempted = posts.len();
    let semaphore = Arc::new(Semaphore::new(workers.max(1)));
    debug!(
        "Fanning out {} comment lookups across {} workers",
        attempted,
        workers.max(1)
    );

    let handles: Vec<_> = posts
        .into_iter()
        .map(|mut post| {
            let semaphore = Arc::clone(&semaphore);
            let fetch = fetch.clone();
            tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("fan-out semaphore closed");
                match fetch(post.id.clone()).await {
                    Ok(comments) => {
                        post.num_comments = comments.len() as u32;
                        post.comments = comments;
                        (post, false)
                    }
                    Err(e) => {
                        warn!("Comment lookup failed for post {}: {}", post.id, e);
                        post.comments = Vec::new();
                        (post, true)
                    }
                }
            })
        })
        .collect();

    let mut out = Vec::with_capacity(attempted);
    let mut failures = 0;
    for joined in join_all(handles).await {
        match joined {
            Ok((post, failed)) => {
                if failed {
                    failures += 1;
                }
                out.push(post);
            }
            Err(e) => {
                error!("Comment fan-out task panicked: {}", e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        warn!("{}/{} comment lookups failed", failures, attempted);
    }

    (out, FanoutReport { attempted, failures })
}
