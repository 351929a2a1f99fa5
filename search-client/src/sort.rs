use marketpulse_core::{Post, SortKey};
use std::cmp::Ordering;

/// Stable in-place sort of the result set by the chosen key.
///
/// Returns `false` without touching the list when there is nothing to sort.
/// Ties keep their original (engine relevance) order in both directions;
/// descending is expressed by flipping the comparator rather than reversing
/// the sorted list, so ties are never reordered. Scores use a total order
/// over `f64`, so a stray NaN cannot panic the sort.
pub fn sort_posts(posts: &mut [Post], key: SortKey, ascending: bool) -> bool {
    if posts.is_empty() {
        return false;
    }

    let cmp = |a: &Post, b: &Post| -> Ordering {
        match key {
            SortKey::Score => a.score.total_cmp(&b.score),
            SortKey::Comments => a.num_comments.cmp(&b.num_comments),
            SortKey::Date => a.date.cmp(&b.date),
        }
    };

    if ascending {
        posts.sort_by(cmp);
    } else {
        posts.sort_by(|a, b| cmp(b, a));
    }

    true
}
