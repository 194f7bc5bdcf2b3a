use tracing::debug;

use super::SemanticServiceClient;
use crate::domain::{DomainError, ModelId};

/// Caller-held record of the similarity model last confirmed for one domain.
///
/// Switching the model is a remote, shared side effect; this keeps a page from
/// re-issuing the same switch on every interaction.
#[derive(Debug, Clone, Default)]
pub struct ModelSelection {
    domain: String,
    last_known: Option<ModelId>,
}

impl ModelSelection {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            last_known: None,
        }
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn last_known(&self) -> Option<ModelId> {
        self.last_known
    }

    /// Makes `requested` the active model unless it already is, returning the
    /// model the service confirmed.
    pub fn ensure(
        &mut self,
        client: &SemanticServiceClient,
        requested: ModelId,
    ) -> Result<ModelId, DomainError> {
        if self.last_known == Some(requested) {
            debug!(
                target: "playground::client",
                domain = %self.domain,
                model_id = requested,
                "model already active"
            );
            return Ok(requested);
        }

        let confirmed = client.change_model(&self.domain, requested)?;
        self.last_known = Some(confirmed);
        Ok(confirmed)
    }

    /// Drop the remembered model, e.g. after another client may have changed it.
    pub fn forget(&mut self) {
        self.last_known = None;
    }
}
