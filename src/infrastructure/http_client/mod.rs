//! HTTP adapter for the remote semantic-matching service.
//!
//! Every playground operation ends up here as one or more blocking `ureq`
//! calls. Errors are mapped onto [`DomainError`] so the application layer never
//! sees transport types.

mod multipart;
mod semantic_api;

pub use semantic_api::HttpSemanticApi;

use serde::Deserialize;

use crate::domain::DomainError;

/// Default server used when nothing is configured.
pub const DEFAULT_SERVER_URL: &str = "http://localhost/tt-platform-server";

/// Error body some deployments send along with a failing status.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Strips trailing slashes so paths can be appended with `/`.
pub fn normalize_base_url(server_url: &str) -> String {
    server_url.trim().trim_end_matches('/').to_string()
}

/// Convert HTTP errors to domain errors.
pub fn handle_http_error(error: ureq::Error) -> DomainError {
    match error {
        ureq::Error::Status(code, response) => {
            let detail = response
                .into_json::<ErrorResponse>()
                .ok()
                .and_then(|body| body.message.or(body.error));
            match detail {
                Some(detail) => DomainError::remote(format!("HTTP {code}: {detail}")),
                None => DomainError::remote(format!("HTTP error: {code}")),
            }
        }
        ureq::Error::Transport(transport) => {
            DomainError::remote(format!("transport error: {transport}"))
        }
    }
}
