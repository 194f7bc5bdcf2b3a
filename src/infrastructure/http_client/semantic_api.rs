use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{handle_http_error, multipart::MultipartForm, normalize_base_url};
use crate::{
    application::dtos::{join_tags, LibraryQuery, ReferenceQuery},
    application::services::SemanticApi,
    domain::{Document, DocumentSummary, DomainError, DomainInfo, DomainSettings},
};

/// Name given to uploaded in-memory texts.
const UPLOAD_FILE_NAME: &str = "input.txt";

/// Envelope of the reference document listing.
#[derive(Debug, Deserialize)]
struct ReferenceDocumentPage {
    #[serde(default)]
    data: Vec<DocumentSummary>,
}

/// Authenticated session against the remote service.
pub struct HttpSemanticApi {
    base_url: String,
    api_key: Option<String>,
    agent: ureq::Agent,
}

impl HttpSemanticApi {
    pub fn new(server_url: &str, api_key: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();

        Self {
            base_url: normalize_base_url(server_url),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            agent,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the API endpoint URL
    fn api_url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    fn domain_url(&self, domain: &str, path: &str) -> String {
        self.api_url(&format!("domains/{}/{}", urlencoding::encode(domain), path))
    }

    fn library_url(&self, domain: &str, query: &LibraryQuery) -> String {
        let mut url = self.domain_url(domain, "referencedocuments");

        let mut params = Vec::new();
        if let Some(tags) = join_tags(&query.tags) {
            params.push(format!("tags={}", urlencoding::encode(&tags)));
        }
        if let Some(offset) = query.offset {
            params.push(format!("offset={offset}"));
        }
        if let Some(limit) = query.limit {
            params.push(format!("limit={limit}"));
        }

        if !params.is_empty() {
            url = format!("{}?{}", url, params.join("&"));
        }
        url
    }

    fn authorize(&self, request: ureq::Request) -> ureq::Request {
        let request = request.set("Accept", "application/json");
        match &self.api_key {
            Some(key) => request.set("Authorization", &format!("Bearer {key}")),
            None => request,
        }
    }

    fn read_json<T: DeserializeOwned>(response: ureq::Response, what: &str) -> Result<T, DomainError> {
        response
            .into_json::<T>()
            .map_err(|err| DomainError::malformed(format!("failed to parse {what}: {err}")))
    }

    fn reference_form(query: &ReferenceQuery) -> MultipartForm {
        let mut form = MultipartForm::new()
            .text_file("file", UPLOAD_FILE_NAME, &query.text)
            .text("similaritythreshold", &query.threshold.to_string())
            .text("maxreferences", &query.max_references.to_string());

        if let Some(reference_text) = &query.reference_text {
            form = form.text_file("referencedocument", UPLOAD_FILE_NAME, reference_text);
        }
        if let Some(tags) = join_tags(&query.tags) {
            form = form.text("tags", &tags);
        }
        if let Some(document_type) = &query.document_type {
            form = form.text("documenttype", document_type);
        }
        form
    }
}

impl SemanticApi for HttpSemanticApi {
    fn list_domains(&self) -> Result<Vec<DomainInfo>, DomainError> {
        let url = self.api_url("domains");

        let response = self
            .authorize(self.agent.get(&url))
            .call()
            .map_err(handle_http_error)?;

        Self::read_json(response, "domain list")
    }

    fn post_references(
        &self,
        domain: &str,
        query: &ReferenceQuery,
    ) -> Result<Document, DomainError> {
        let url = self.domain_url(domain, "references");
        let form = Self::reference_form(query);
        let content_type = form.content_type();
        let body = form.finish();

        debug!(target: "playground::http", %url, bytes = body.len(), "posting references");

        let response = self
            .authorize(self.agent.post(&url))
            .set("Content-Type", &content_type)
            .send_bytes(&body)
            .map_err(handle_http_error)?;

        Self::read_json(response, "reference response")
    }

    fn get_document(&self, domain: &str, document_id: &str) -> Result<Document, DomainError> {
        let url = self.domain_url(
            domain,
            &format!("referencedocuments/{}", urlencoding::encode(document_id)),
        );

        let response = self
            .authorize(self.agent.get(&url))
            .call()
            .map_err(handle_http_error)?;

        Self::read_json(response, "reference document")
    }

    fn list_reference_documents(
        &self,
        domain: &str,
        query: &LibraryQuery,
    ) -> Result<Vec<DocumentSummary>, DomainError> {
        let url = self.library_url(domain, query);

        let response = self
            .authorize(self.agent.get(&url))
            .call()
            .map_err(handle_http_error)?;

        let page: ReferenceDocumentPage = Self::read_json(response, "reference document list")?;
        Ok(page.data)
    }

    fn patch_settings(
        &self,
        domain: &str,
        settings: &DomainSettings,
    ) -> Result<DomainSettings, DomainError> {
        let url = self.domain_url(domain, "settings");

        let response = self
            .authorize(self.agent.request("PATCH", &url))
            .send_json(settings)
            .map_err(handle_http_error)?;

        Self::read_json(response, "domain settings")
    }
}
