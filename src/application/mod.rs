//! Application layer wiring DTOs and services for the playground.

pub mod dtos;
pub mod services;

pub use dtos::{CompareRequest, LibraryQuery, LibraryRequest, ReferenceQuery, SearchRequest};
pub use services::{ModelSelection, SemanticServiceClient};
