use bincode::Options;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::domain::DomainError;

/// Key of a memoized result: the operation name followed by the encoded request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Vec<u8>);

impl CacheKey {
    pub fn for_request<R: Serialize>(operation: &str, request: &R) -> Result<Self, DomainError> {
        let mut bytes = Vec::with_capacity(operation.len() + 64);
        bytes.extend_from_slice(operation.as_bytes());
        bytes.push(0);
        bytes.extend(encode(request)?);
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Storage for memoized client results.
///
/// Entries are written once and never evicted. Implementations must tolerate
/// concurrent readers and writers on different keys.
pub trait ResultCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Result<Option<Vec<u8>>, DomainError>;

    /// Stores `value` unless the key already holds an entry.
    fn put(&self, key: &CacheKey, value: Vec<u8>) -> Result<(), DomainError>;
}

/// Envelope persisted for every cached value.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct CachedResult<T> {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub stored_at: DateTime<Utc>,
    pub value: T,
}

impl<T> CachedResult<T> {
    pub fn new(value: T) -> Self {
        Self {
            stored_at: Utc::now(),
            value,
        }
    }
}

pub(crate) fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, DomainError> {
    bincode::options()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .serialize(value)
        .map_err(|err| DomainError::storage(format!("serialization error: {err}")))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, DomainError> {
    bincode::options()
        .with_fixint_encoding()
        .allow_trailing_bytes()
        .deserialize(bytes)
        .map_err(|err| DomainError::storage(format!("deserialization error: {err}")))
}
