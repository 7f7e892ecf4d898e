//! Harvested records and their comment sets.

use serde::{Deserialize, Serialize};

use crate::config::COUNT_UNAVAILABLE;

/// One entry in the ranked feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    title: String,
    release_year: String,
    rank_metric: u64,
    detail_reference: String,
    comments: Option<CommentSet>,
}

impl Record {
    pub fn new(
        title: String,
        release_year: String,
        rank_metric: u64,
        detail_reference: String,
    ) -> Self {
        Self {
            title,
            release_year,
            rank_metric,
            detail_reference,
            comments: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Year label as shown, e.g. `"2024 · 한국"`. Not parsed.
    pub fn release_year(&self) -> &str {
        &self.release_year
    }

    /// Normalized audience count.
    pub fn rank_metric(&self) -> u64 {
        self.rank_metric
    }

    /// Locator of the entry's detail view. Never empty.
    pub fn detail_reference(&self) -> &str {
        &self.detail_reference
    }

    pub fn comments(&self) -> Option<&CommentSet> {
        self.comments.as_ref()
    }

    /// Attach the collected comments. Only the first call takes effect.
    pub fn attach_comments(&mut self, comments: CommentSet) -> bool {
        if self.comments.is_some() {
            tracing::debug!(title = %self.title, "comments already attached");
            return false;
        }
        self.comments = Some(comments);
        true
    }
}

/// Comments collected for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentSet {
    /// Total reported by the feed, or `"unavailable"`.
    pub total_count_label: String,
    /// Comment feed the items came from.
    pub source_reference: Option<String>,
    /// Discovery order; sanitized.
    pub items: Vec<String>,
}

impl CommentSet {
    /// A set for a record whose comment feed could not be read.
    pub fn unavailable(total_count_label: Option<String>) -> Self {
        Self {
            total_count_label: total_count_label.unwrap_or_else(|| COUNT_UNAVAILABLE.to_string()),
            source_reference: None,
            items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        Record::new(
            "파묘".to_string(),
            "2024 · 한국".to_string(),
            11000,
            "/ko-KR/contents/m5ZlmOe".to_string(),
        )
    }

    #[test]
    fn test_attach_comments_once() {
        let mut r = record();
        assert!(r.comments().is_none());
        assert!(r.attach_comments(CommentSet::unavailable(None)));
        assert!(!r.attach_comments(CommentSet {
            total_count_label: "3".to_string(),
            source_reference: None,
            items: vec!["x".to_string()],
        }));
        assert_eq!(r.comments().unwrap().total_count_label, COUNT_UNAVAILABLE);
    }

    #[test]
    fn test_record_accessors() {
        let r = record();
        assert_eq!(r.title(), "파묘");
        assert_eq!(r.release_year(), "2024 · 한국");
        assert_eq!(r.rank_metric(), 11000);
        assert_eq!(r.detail_reference(), "/ko-KR/contents/m5ZlmOe");
    }

    #[test]
    fn test_record_serialization_includes_comments() {
        let mut r = record();
        r.attach_comments(CommentSet {
            total_count_label: "1,204".to_string(),
            source_reference: Some("/ko-KR/contents/m5ZlmOe/comments".to_string()),
            items: vec!["재밌다".to_string()],
        });
        let json = serde_json::to_string(&r).unwrap();
        assert!(json.contains("\"rank_metric\":11000"));
        assert!(json.contains("재밌다"));
    }
}
