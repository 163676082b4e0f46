use std::collections::{HashMap, HashSet};

use piggyback_common::Post;

/// Post ids already present in the output worksheet.
///
/// Built once at run start from a single read and threaded through the run;
/// it is never refreshed mid-run. Composite ids produced by merging are
/// matched as whole strings.
#[derive(Debug, Default, Clone)]
pub struct DuplicateIndex {
    known: HashSet<String>,
}

impl DuplicateIndex {
    pub fn new(known: HashSet<String>) -> Self {
        Self { known }
    }

    /// Collect ids from header-keyed records. Rows without the id column,
    /// or with an empty cell, contribute nothing.
    pub fn from_records(records: &[HashMap<String, String>], id_column: &str) -> Self {
        let known = records
            .iter()
            .filter_map(|r| r.get(id_column))
            .filter(|id| !id.is_empty())
            .cloned()
            .collect();
        Self { known }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.known.contains(id)
    }

    pub fn len(&self) -> usize {
        self.known.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

/// Keep only posts whose id the index has not seen.
pub fn filter_new(posts: Vec<Post>, index: &DuplicateIndex) -> Vec<Post> {
    posts.into_iter().filter(|p| !index.contains(&p.id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use piggyback_common::Engagement;

    fn post(id: &str) -> Post {
        Post {
            id: id.to_string(),
            text: "text".to_string(),
            timestamp_ms: Some(0),
            conversation_id: None,
            in_reply_to: None,
            is_retweet: false,
            url: None,
            author_handle: None,
            engagement: Engagement::default(),
        }
    }

    fn records(rows: &[&[(&str, &str)]]) -> Vec<HashMap<String, String>> {
        rows.iter()
            .map(|pairs| {
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            })
            .collect()
    }

    #[test]
    fn known_ids_are_filtered_out() {
        let index = DuplicateIndex::from_records(
            &records(&[&[("post_id", "1")], &[("post_id", "3")]]),
            "post_id",
        );
        let fresh = filter_new(vec![post("1"), post("2"), post("3")], &index);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, "2");
    }

    #[test]
    fn empty_index_passes_everything_through() {
        let index = DuplicateIndex::default();
        let fresh = filter_new(vec![post("1"), post("2")], &index);
        assert_eq!(fresh.len(), 2);
    }

    #[test]
    fn missing_or_blank_id_cells_contribute_nothing() {
        let index = DuplicateIndex::from_records(
            &records(&[&[("other", "1")], &[("post_id", "")]]),
            "post_id",
        );
        assert!(index.is_empty());
    }

    #[test]
    fn composite_ids_match_as_whole_strings() {
        let index = DuplicateIndex::from_records(&records(&[&[("post_id", "1,2")]]), "post_id");
        assert!(index.contains("1,2"));
        // A bare member of the composite is a different id.
        let fresh = filter_new(vec![post("1"), post("1,2")], &index);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].id, "1");
    }

    #[test]
    fn filtering_is_pure() {
        let index = DuplicateIndex::from_records(&records(&[&[("post_id", "1")]]), "post_id");
        let posts = vec![post("1"), post("2")];
        let first = filter_new(posts.clone(), &index);
        let second = filter_new(posts, &index);
        assert_eq!(first, second);
        assert_eq!(index.len(), 1);
    }
}
