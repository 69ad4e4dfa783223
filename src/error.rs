//! Error taxonomy shared by engines and store facades.

/// Result alias used across the storage layer.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by storage engines and the store facades.
///
/// `NotFound` covers absent keys and scans with zero matches. `Engine`
/// carries any failure reported by the underlying engine.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("key not found")]
    NotFound,
    #[error("engine failure: {0}")]
    Engine(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}
