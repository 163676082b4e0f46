use piggyback_common::Post;

/// A post is a reply when it belongs to a conversation other than its own,
/// or when an upstream reply marker survived normalization.
pub fn is_reply(post: &Post) -> bool {
    if let Some(conversation_id) = post.conversation_id.as_deref() {
        if !conversation_id.is_empty() && !post.id.is_empty() && conversation_id != post.id {
            return true;
        }
    }
    post.in_reply_to.as_deref().is_some_and(|m| !m.is_empty())
}

/// Only an explicit upstream flag marks a retweet. There is no reliable
/// text-shape heuristic for quote posts, so nothing else is inferred.
pub fn is_retweet(post: &Post) -> bool {
    post.is_retweet
}
