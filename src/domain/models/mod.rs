use serde::{Deserialize, Serialize};

pub mod document;

pub use document::{
    ContentBlock, Document, DocumentSummary, DomainInfo, DomainSettings, Page, Paragraph,
    Reference,
};

/// Identifier of a similarity model on the remote service.
pub type ModelId = u32;

/// A library document flattened to plain text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub id: String,
    pub name: String,
    pub content: String,
}

/// A single library match for a search query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub document_id: String,
    pub doc_name: String,
    pub content: String,
    pub similarity: f64,
}

/// Search matches keyed by document id, in the order the service reported them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SearchResults {
    entries: Vec<SearchResult>,
}

impl SearchResults {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a result. An existing entry with the same id is replaced in place.
    pub fn insert(&mut self, result: SearchResult) {
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.document_id == result.document_id)
        {
            Some(slot) => *slot = result,
            None => self.entries.push(result),
        }
    }

    pub fn get(&self, document_id: &str) -> Option<&SearchResult> {
        self.entries.iter().find(|r| r.document_id == document_id)
    }

    pub fn contains(&self, document_id: &str) -> bool {
        self.get(document_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|r| r.document_id.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SearchResult> {
        self.entries.iter()
    }
}

impl IntoIterator for SearchResults {
    type Item = SearchResult;
    type IntoIter = std::vec::IntoIter<SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a SearchResults {
    type Item = &'a SearchResult;
    type IntoIter = std::slice::Iter<'a, SearchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Outcome of a pairwise text comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompareResult {
    pub similarity: f64,
    pub opposite_meaning: bool,
}

impl CompareResult {
    /// Similarity as an integer percentage.
    pub fn percent(&self) -> u32 {
        (self.similarity * 100.0).round().clamp(0.0, 100.0) as u32
    }

    pub fn verdict(&self) -> CompareVerdict {
        let percent = self.percent();
        if percent >= 70 {
            if self.opposite_meaning {
                CompareVerdict::SimilarButOpposite
            } else {
                CompareVerdict::Similar
            }
        } else if percent > 40 {
            CompareVerdict::Partial
        } else {
            CompareVerdict::NotSimilar
        }
    }
}

/// Coarse reading of a comparison score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareVerdict {
    Similar,
    SimilarButOpposite,
    Partial,
    NotSimilar,
}

impl CompareVerdict {
    pub fn describe(&self, percent: u32) -> String {
        match self {
            CompareVerdict::Similar | CompareVerdict::Partial => {
                format!("The texts are {percent}% similar.")
            }
            CompareVerdict::SimilarButOpposite => {
                format!("The texts are {percent}% similar but have an opposite meaning.")
            }
            CompareVerdict::NotSimilar => "The texts are not similar.".to_string(),
        }
    }
}

/// Resolution of a pre-computed clustering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    /// Few topics.
    #[default]
    Broad,
    /// Many topics; presented to users as "Detailed".
    Fine,
}

impl Granularity {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Granularity::Broad => "broad",
            Granularity::Fine => "fine",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Granularity::Broad => "Broad",
            Granularity::Fine => "Detailed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(id: &str, similarity: f64) -> SearchResult {
        SearchResult {
            document_id: id.into(),
            doc_name: format!("{id}.txt"),
            content: String::new(),
            similarity,
        }
    }

    #[test]
    fn test_search_results_keep_insertion_order() {
        let mut results = SearchResults::new();
        results.insert(result("d2", 0.8));
        results.insert(result("d1", 0.9));
        results.insert(result("d3", 0.7));

        let ids: Vec<&str> = results.ids().collect();
        assert_eq!(ids, vec!["d2", "d1", "d3"]);
    }

    #[test]
    fn test_search_results_duplicate_id_overwrites_in_place() {
        let mut results = SearchResults::new();
        results.insert(result("d1", 0.9));
        results.insert(result("d2", 0.8));
        results.insert(result("d1", 0.5));

        assert_eq!(results.len(), 2);
        assert_eq!(results.ids().next(), Some("d1"));
        assert_eq!(results.get("d1").unwrap().similarity, 0.5);
    }

    #[test]
    fn test_search_results_serialize_as_list() {
        let mut results = SearchResults::new();
        results.insert(result("d1", 0.9));
        let json = serde_json::to_value(&results).unwrap();
        assert!(json.is_array());
        assert_eq!(json[0]["document_id"], "d1");
    }

    #[test]
    fn test_compare_verdict_bands() {
        let verdict = |similarity, opposite_meaning| {
            CompareResult {
                similarity,
                opposite_meaning,
            }
            .verdict()
        };

        assert_eq!(verdict(0.92, false), CompareVerdict::Similar);
        assert_eq!(verdict(0.70, true), CompareVerdict::SimilarButOpposite);
        assert_eq!(verdict(0.55, true), CompareVerdict::Partial);
        assert_eq!(verdict(0.40, false), CompareVerdict::NotSimilar);
        assert_eq!(verdict(0.0, false), CompareVerdict::NotSimilar);
    }

    #[test]
    fn test_compare_percent_rounds() {
        let result = CompareResult {
            similarity: 0.876,
            opposite_meaning: false,
        };
        assert_eq!(result.percent(), 88);
        assert_eq!(
            result.verdict().describe(result.percent()),
            "The texts are 88% similar."
        );
    }

    #[test]
    fn test_granularity_names() {
        assert_eq!(Granularity::Broad.dir_name(), "broad");
        assert_eq!(Granularity::Fine.dir_name(), "fine");
        assert_eq!(Granularity::Fine.label(), "Detailed");
    }
}
