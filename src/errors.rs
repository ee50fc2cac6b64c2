use thiserror::Error;

/// Errors from the persistence layer: the sled store, snapshot encoding,
/// and catalog files.
///
/// None of these are fatal to the engine. Callers log them and the
/// in-memory catalog stays authoritative in its last valid state; bad
/// lookups and wrong-state operations are handled as logged no-ops at
/// the call site rather than surfacing here.
#[derive(Debug, Error)]
pub enum QuestError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, catalog files, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when deserializing a snapshot with an unexpected schema version.
    #[error("snapshot schema mismatch: expected {expected}, got {found}")]
    SchemaMismatch { expected: u8, found: u8 },
}
