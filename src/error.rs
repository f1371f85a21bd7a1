use crate::model::person::PersonType;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Caller-facing errors of the classification engine.
///
/// Schedule lookup failures and unparsable time fields are never surfaced
/// here; they resolve through fallback chains inside the resolver.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Raw identifier matches none of the known shapes
    #[error("unrecognized identifier format: {0}")]
    InvalidIdentifierFormat(String),

    /// Normalized identifier has no matching person row
    #[error("no {person_type} found for identifier {identifier}")]
    PersonNotFound {
        person_type: PersonType,
        identifier: String,
    },

    /// Storage failure with no safe fallback (wraps sqlx::Error)
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] sqlx::Error),
}
