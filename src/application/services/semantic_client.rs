use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::cache::{decode, encode, CacheKey, CachedResult, ResultCache};
use crate::{
    application::dtos::{CompareRequest, LibraryQuery, LibraryRequest, ReferenceQuery, SearchRequest},
    domain::{
        CompareResult, Document, DocumentSummary, DomainError, DomainInfo, DomainSettings,
        LibraryEntry, ModelId, SearchResult, SearchResults,
    },
};

/// Document type id of the remote "opposite meaning" classifier.
pub const OPPOSITE_MEANING_DOCUMENT_TYPE: &str = "23d06b42-4a32-4531-b00e-640f538e2aee";

/// Threshold of a pairwise comparison: low enough that any match is reported.
const COMPARE_THRESHOLD: f64 = 0.01;

const OP_SEARCH: &str = "search";
const OP_LIBRARY: &str = "library";
const OP_COMPARE: &str = "compare";

/// Narrow view of the remote semantic-matching service.
pub trait SemanticApi: Send + Sync {
    fn list_domains(&self) -> Result<Vec<DomainInfo>, DomainError>;

    fn post_references(
        &self,
        domain: &str,
        query: &ReferenceQuery,
    ) -> Result<Document, DomainError>;

    fn get_document(&self, domain: &str, document_id: &str) -> Result<Document, DomainError>;

    fn list_reference_documents(
        &self,
        domain: &str,
        query: &LibraryQuery,
    ) -> Result<Vec<DocumentSummary>, DomainError>;

    fn patch_settings(
        &self,
        domain: &str,
        settings: &DomainSettings,
    ) -> Result<DomainSettings, DomainError>;
}

#[derive(Debug, Clone, Default)]
pub struct ClientConfig {
    /// Only domains whose name contains this substring are listed.
    pub domain_prefix: String,
}

impl ClientConfig {
    pub fn new(domain_prefix: impl Into<String>) -> Self {
        Self {
            domain_prefix: domain_prefix.into(),
        }
    }
}

/// Maps playground operations onto remote calls and flattens the responses.
pub struct SemanticServiceClient {
    api: Arc<dyn SemanticApi>,
    cache: Option<Arc<dyn ResultCache>>,
    config: ClientConfig,
}

impl SemanticServiceClient {
    pub fn new(api: Arc<dyn SemanticApi>, config: ClientConfig) -> Self {
        Self {
            api,
            cache: None,
            config,
        }
    }

    /// Memoize `search`, `list_library` and `compare` through `cache`.
    pub fn with_cache(mut self, cache: Arc<dyn ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Names of the domains matching the configured prefix, in remote order.
    pub fn list_domains(&self) -> Result<Vec<String>, DomainError> {
        let prefix = self.config.domain_prefix.as_str();
        let domains = self
            .api
            .list_domains()?
            .into_iter()
            .map(|domain| domain.name)
            .filter(|name| name.contains(prefix))
            .collect::<Vec<_>>();

        debug!(target: "playground::client", prefix, count = domains.len(), "listed domains");
        Ok(domains)
    }

    pub fn search(&self, request: &SearchRequest) -> Result<SearchResults, DomainError> {
        self.cached(OP_SEARCH, request, || self.fetch_search(request))
    }

    pub fn list_library(&self, request: &LibraryRequest) -> Result<Vec<LibraryEntry>, DomainError> {
        let request = request.normalized();
        self.cached(OP_LIBRARY, &request, || self.fetch_library(&request))
    }

    pub fn compare(&self, request: &CompareRequest) -> Result<CompareResult, DomainError> {
        self.cached(OP_COMPARE, request, || self.fetch_compare(request))
    }

    /// Sets the active similarity model of `domain` and returns the id the
    /// service reports as active afterwards.
    pub fn change_model(&self, domain: &str, model_id: ModelId) -> Result<ModelId, DomainError> {
        info!(target: "playground::client", domain, model_id, "changing similarity model");

        let settings = DomainSettings {
            similarity_model_id: Some(model_id.to_string()),
        };
        let confirmed = self.api.patch_settings(domain, &settings)?;
        let raw = confirmed.similarity_model_id.ok_or_else(|| {
            DomainError::malformed("settings response lacks similarityModelId")
        })?;
        let active = raw.trim().parse::<ModelId>().map_err(|err| {
            DomainError::malformed(format!("invalid similarityModelId '{raw}': {err}"))
        })?;

        if active != model_id {
            warn!(
                target: "playground::client",
                domain,
                requested = model_id,
                active,
                "service kept a different similarity model"
            );
        }

        Ok(active)
    }

    fn fetch_search(&self, request: &SearchRequest) -> Result<SearchResults, DomainError> {
        info!(
            target: "playground::client",
            domain = %request.domain,
            threshold = request.threshold,
            max_results = request.max_results,
            "executing library search"
        );

        let query = ReferenceQuery {
            text: request.query.clone(),
            reference_text: None,
            threshold: request.threshold,
            max_references: request.max_results,
            tags: request.tags.clone(),
            document_type: None,
        };
        let response = self.api.post_references(&request.domain, &query)?;

        let mut results = SearchResults::new();
        for reference in response.references() {
            if reference.similarity < request.threshold {
                debug!(
                    target: "playground::client",
                    document_id = %reference.document_id,
                    similarity = reference.similarity,
                    "skipping reference below threshold"
                );
                continue;
            }
            if results.len() >= request.max_results && !results.contains(&reference.document_id) {
                break;
            }

            let document = self.api.get_document(&request.domain, &reference.document_id)?;
            results.insert(SearchResult {
                document_id: reference.document_id.clone(),
                doc_name: document.name.clone(),
                content: document.text_content(),
                similarity: reference.similarity,
            });
        }

        debug!(target: "playground::client", matches = results.len(), "library search finished");
        Ok(results)
    }

    fn fetch_library(&self, request: &LibraryRequest) -> Result<Vec<LibraryEntry>, DomainError> {
        let (limit, offset) = request.page();
        info!(
            target: "playground::client",
            domain = %request.domain,
            ?limit,
            ?offset,
            "fetching library documents"
        );

        let query = LibraryQuery {
            tags: request.tags.clone(),
            limit,
            offset,
        };

        self.api
            .list_reference_documents(&request.domain, &query)?
            .into_iter()
            .map(|summary| {
                let document = self.api.get_document(&request.domain, &summary.id)?;
                Ok(LibraryEntry {
                    content: document.text_content(),
                    id: summary.id,
                    name: summary.name,
                })
            })
            .collect()
    }

    fn fetch_compare(&self, request: &CompareRequest) -> Result<CompareResult, DomainError> {
        info!(
            target: "playground::client",
            domain = %request.domain,
            model_id = request.model_id,
            opposite_meaning = request.detect_opposite_meaning,
            "executing string compare"
        );
        debug!(target: "playground::client", text_a = %request.text_a, text_b = %request.text_b, "compare inputs");

        let query = ReferenceQuery {
            text: request.text_a.clone(),
            reference_text: Some(request.text_b.clone()),
            threshold: COMPARE_THRESHOLD,
            max_references: 1,
            tags: BTreeSet::new(),
            document_type: request
                .detect_opposite_meaning
                .then(|| OPPOSITE_MEANING_DOCUMENT_TYPE.to_string()),
        };
        let response = self.api.post_references(&request.domain, &query)?;

        let Some(best) = response.references().first() else {
            return Ok(CompareResult::default());
        };

        let opposite_meaning = if request.detect_opposite_meaning {
            opposite_meaning_flag(&response)?
        } else {
            false
        };

        Ok(CompareResult {
            similarity: best.similarity,
            opposite_meaning,
        })
    }

    fn cached<R, T, F>(&self, operation: &str, request: &R, compute: F) -> Result<T, DomainError>
    where
        R: Serialize,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T, DomainError>,
    {
        let Some(cache) = &self.cache else {
            return compute();
        };

        let key = match CacheKey::for_request(operation, request) {
            Ok(key) => key,
            Err(err) => {
                warn!(target: "playground::cache", operation, error = %err, "cannot build cache key");
                return compute();
            }
        };

        match cache.get(&key) {
            Ok(Some(bytes)) => match decode::<CachedResult<T>>(&bytes) {
                Ok(entry) => {
                    debug!(
                        target: "playground::cache",
                        operation,
                        stored_at = %entry.stored_at,
                        "cache hit"
                    );
                    return Ok(entry.value);
                }
                Err(err) => {
                    warn!(target: "playground::cache", operation, error = %err, "ignoring unreadable cache entry");
                }
            },
            Ok(None) => debug!(target: "playground::cache", operation, "cache miss"),
            Err(err) => {
                warn!(target: "playground::cache", operation, error = %err, "cache lookup failed");
            }
        }

        let value = compute()?;

        let stored = encode(&CachedResult::new(&value)).and_then(|bytes| cache.put(&key, bytes));
        if let Err(err) = stored {
            warn!(target: "playground::cache", operation, error = %err, "failed to store result");
        }

        Ok(value)
    }
}

/// Reads the classifier verdict of a comparison: the first reference of the
/// first paragraph of the first content block of the first page.
fn opposite_meaning_flag(response: &Document) -> Result<bool, DomainError> {
    let paragraph = response.first_paragraph().ok_or_else(|| {
        DomainError::malformed("comparison response has no paragraph to read opposite meaning from")
    })?;
    let reference = paragraph
        .references
        .as_deref()
        .and_then(|refs| refs.first())
        .ok_or_else(|| {
            DomainError::malformed("first paragraph of comparison response carries no reference")
        })?;

    Ok(reference.has_opposite_meaning.unwrap_or(false))
}
