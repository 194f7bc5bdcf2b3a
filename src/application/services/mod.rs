//! Service layer orchestrating remote calls, result caching and caller-held state.

mod cache;
mod model_selection;
mod semantic_client;

pub use cache::{CacheKey, ResultCache};
pub use model_selection::ModelSelection;
pub use semantic_client::{
    ClientConfig, SemanticApi, SemanticServiceClient, OPPOSITE_MEANING_DOCUMENT_TYPE,
};
