use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::ModelId;

/// Threshold used when a search request does not set one.
pub const DEFAULT_THRESHOLD: f64 = 0.75;

/// Number of references requested when a search request does not set one.
pub const DEFAULT_MAX_RESULTS: usize = 10;

/// Library search issued from the search page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    pub domain: String,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            domain: domain.into(),
            threshold: DEFAULT_THRESHOLD,
            max_results: DEFAULT_MAX_RESULTS,
            tags: BTreeSet::new(),
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Library listing request.
///
/// `offset` only means something together with `limit`; see [`LibraryRequest::page`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryRequest {
    pub domain: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}

impl LibraryRequest {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            ..Default::default()
        }
    }

    pub fn with_tags(mut self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Effective `(limit, offset)` pair.
    ///
    /// Without a limit there is no pagination at all and any offset is dropped.
    /// With a limit the offset defaults to 0.
    pub fn page(&self) -> (Option<usize>, Option<usize>) {
        match self.limit {
            Some(limit) => (Some(limit), Some(self.offset.unwrap_or(0))),
            None => (None, None),
        }
    }

    /// The request as it takes part in cache keys, with pagination normalised.
    pub fn normalized(&self) -> Self {
        let (limit, offset) = self.page();
        Self {
            domain: self.domain.clone(),
            tags: self.tags.clone(),
            limit,
            offset,
        }
    }
}

/// Pairwise text comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompareRequest {
    pub text_a: String,
    pub text_b: String,
    pub domain: String,
    pub model_id: ModelId,
    #[serde(default)]
    pub detect_opposite_meaning: bool,
}

impl CompareRequest {
    pub fn new(
        text_a: impl Into<String>,
        text_b: impl Into<String>,
        domain: impl Into<String>,
        model_id: ModelId,
    ) -> Self {
        Self {
            text_a: text_a.into(),
            text_b: text_b.into(),
            domain: domain.into(),
            model_id,
            detect_opposite_meaning: false,
        }
    }

    pub fn with_opposite_meaning(mut self, detect: bool) -> Self {
        self.detect_opposite_meaning = detect;
        self
    }
}

/// Parameters of a single call to the domain's reference endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceQuery {
    /// Text uploaded as the input document.
    pub text: String,
    /// Optional text uploaded as the only document to compare against.
    pub reference_text: Option<String>,
    pub threshold: f64,
    pub max_references: usize,
    pub tags: BTreeSet<String>,
    /// Document type id scoping the call to a classifier.
    pub document_type: Option<String>,
}

/// Parameters of a library listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryQuery {
    pub tags: BTreeSet<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Joins tags the way the remote service expects them, or `None` for no filter.
pub fn join_tags(tags: &BTreeSet<String>) -> Option<String> {
    if tags.is_empty() {
        None
    } else {
        Some(tags.iter().map(String::as_str).collect::<Vec<_>>().join(","))
    }
}

const fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

const fn default_max_results() -> usize {
    DEFAULT_MAX_RESULTS
}
