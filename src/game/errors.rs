use thiserror::Error;

/// Failures from the persistence collaborators.
///
/// None of these cross the engine's event boundary: the engine logs them and
/// keeps its in-memory state as the source of truth.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Player or team record failed to encode/decode.
    #[error("record encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    /// Creating the data directory failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    /// Stored record was written by an incompatible version of the game.
    #[error("{entity} record has schema v{found}, expected v{expected}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },
}
