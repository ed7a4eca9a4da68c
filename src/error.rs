//! Error types for the chessladder engine.
//!
//! Every fallible engine operation returns an [`EngineResult`]. Failures
//! never leave a half-applied position behind: the caller still owns the
//! position it passed in.

use thiserror::Error;

use crate::types::Move;

/// Errors that can occur in the chess engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The move is not among the legal moves of the position.
    #[error("Invalid move {mv}: {reason}")]
    InvalidMove { mv: Move, reason: String },

    /// A move was requested on a position where the side to move has none.
    #[error("No legal move available")]
    NoLegalMove,

    /// A position breaks a board invariant (king count, pawn placement, ...).
    #[error("Malformed position: {0}")]
    MalformedPosition(String),

    /// Bot difficulty outside 1..=10.
    #[error("Invalid difficulty {0} (must be 1-10)")]
    InvalidDifficulty(u8),

    /// Text that could not be parsed as a square, move or FEN.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
