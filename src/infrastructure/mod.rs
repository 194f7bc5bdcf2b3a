//! Infrastructure layer wiring concrete adapters (HTTP, result caches, artifacts).

pub mod artifacts;
pub mod http_client;
pub mod storage;

pub use artifacts::{
    ArtifactSet, ClusterArtifacts, ClusterOverview, ClusteredRow, FigureKind, LibraryRow, TopicRow,
};
pub use http_client::HttpSemanticApi;
pub use storage::{MemoryResultCache, SledResultCache};
