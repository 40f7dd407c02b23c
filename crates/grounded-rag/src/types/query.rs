//! Query request types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What to search for, optionally restricted to one source document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievalQuery {
    pub text: String,
    /// Exact, case-insensitive match against `Chunk::source`
    pub source_filter: Option<String>,
}

impl RetrievalQuery {
    /// Create a new unfiltered query
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_filter: None,
        }
    }

    /// Restrict to a single source. Blank filters are ignored.
    pub fn with_source(mut self, source: Option<&str>) -> Self {
        self.source_filter = source
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }
}

/// Query request accepted by the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// The question to answer
    pub question: String,

    /// Session whose memory is used for rewriting follow-ups
    #[serde(default)]
    pub session_id: Option<Uuid>,

    /// Restrict retrieval to one document (file name)
    #[serde(default)]
    pub source_filter: Option<String>,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            session_id: None,
            source_filter: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_filter_is_dropped() {
        let query = RetrievalQuery::new("what is X").with_source(Some("   "));
        assert_eq!(query.source_filter, None);

        let query = RetrievalQuery::new("what is X").with_source(Some(" a.pdf "));
        assert_eq!(query.source_filter.as_deref(), Some("a.pdf"));
    }
}
