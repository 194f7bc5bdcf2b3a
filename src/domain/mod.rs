//! Domain layer: records and errors shared by the playground client.

pub mod errors;
pub mod models;

pub use errors::DomainError;
pub use models::{
    CompareResult, CompareVerdict, Document, DocumentSummary, DomainInfo, DomainSettings,
    Granularity, LibraryEntry, ModelId, Reference, SearchResult, SearchResults,
};
