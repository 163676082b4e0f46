use std::collections::HashMap;

use piggyback_common::Post;

/// Collapse rapid-fire thread fragments into single posts.
///
/// Posts are grouped by conversation (falling back to the post's own id),
/// timestamped members are sorted ascending, and each member within
/// `window_ms` of the current merge target is absorbed into it. The target
/// keeps its own timestamp, so the window is anchored at the first fragment
/// of a burst rather than sliding along the thread. Members without a
/// timestamp are appended unmerged after their group.
pub fn merge(posts: Vec<Post>, window_ms: i64) -> Vec<Post> {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<Post>> = HashMap::new();
    for post in posts {
        let key = group_key(&post);
        match groups.get_mut(&key) {
            Some(group) => group.push(post),
            None => {
                order.push(key.clone());
                groups.insert(key, vec![post]);
            }
        }
    }

    let mut merged_all = Vec::new();
    for key in &order {
        let group = groups.remove(key).unwrap_or_default();
        let (mut with_ts, without_ts): (Vec<Post>, Vec<Post>) =
            group.into_iter().partition(|p| p.timestamp_ms.is_some());
        with_ts.sort_by_key(|p| p.timestamp_ms);

        let mut merged: Vec<Post> = Vec::new();
        for post in with_ts {
            match merged.last_mut() {
                Some(target) if within_window(target, &post, window_ms) => {
                    absorb(target, post);
                }
                _ => merged.push(post),
            }
        }

        merged_all.extend(merged);
        merged_all.extend(without_ts);
    }
    merged_all
}

fn group_key(post: &Post) -> String {
    match post.conversation_id.as_deref() {
        Some(cid) if !cid.is_empty() => cid.to_string(),
        _ => post.id.clone(),
    }
}

fn within_window(target: &Post, next: &Post, window_ms: i64) -> bool {
    match (target.timestamp_ms, next.timestamp_ms) {
        (Some(anchor), Some(ts)) => ts - anchor <= window_ms,
        _ => false,
    }
}

/// Fold `fragment` into `target`: texts concatenate with a space, ids union
/// into a comma join, urls union into a space join. Unions skip a fragment
/// value already contained in the accumulated one, so re-merging is a no-op.
fn absorb(target: &mut Post, fragment: Post) {
    let text = format!("{} {}", target.text, fragment.text);
    target.text = text.trim().to_string();

    if !fragment.id.is_empty() && !target.id.contains(fragment.id.as_str()) {
        let joined = format!("{},{}", target.id, fragment.id);
        target.id = joined.trim_matches(',').to_string();
    }

    if let Some(url) = fragment.url.as_deref() {
        let existing = target.url.as_deref().unwrap_or("");
        if !url.is_empty() && !existing.contains(url) {
            let joined = format!("{existing} {url}");
            target.url = Some(joined.trim().to_string());
        }
    }
}
