use thiserror::Error;

use crate::coord::Coord;

/// Failure to import or export a versioned block/malla document.
///
/// Import never applies anything partially: on any of these the caller keeps
/// its previous in-memory state.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid JSON: {0}")]
    InvalidJson(String),
    #[error(
        "incompatible version: expected {expected}, found {}",
        .found.map_or_else(|| "none".to_string(), |v| v.to_string())
    )]
    IncompatibleVersion { expected: u32, found: Option<u64> },
    #[error("incomplete data: missing `{0}`")]
    IncompleteData(&'static str),
    #[error("malformed document: {0}")]
    Malformed(serde_json::Error),
    #[error("failed to serialize document: {0}")]
    Serialize(serde_json::Error),
}

/// Failures of the piece placement engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MallaError {
    #[error("no space left in the grid")]
    NoSpace,
    #[error("unknown piece: {0}")]
    UnknownPiece(String),
    #[error("piece {0} has no origin and cannot be turned back into a reference")]
    NoOrigin(String),
}

/// A grid resize that would orphan placed pieces.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResizeError {
    #[error("row {0} is occupied by a piece")]
    RowOccupied(u32),
    #[error("column {0} is occupied by a piece")]
    ColOccupied(u32),
    #[error("grid dimensions must be at least 1")]
    Empty,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("at least two cells are needed to combine")]
    TooFewCells,
    #[error("cannot combine: the selection contains two or more configured cells")]
    MultipleConfigured,
    #[error("cell {0} is outside the template")]
    OutOfRange(Coord),
}

/// Failures of the key-value persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage encoding error: {0}")]
    Encoding(#[from] bincode::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
}
