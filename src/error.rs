//! Error types for the rules engine and its text front end
//!
//! Rule operations themselves never fail (undo on an empty history is a
//! no-op, an exhausted search yields no move); errors only arise when
//! turning text into positions or moves.

use thiserror::Error;

/// Errors that can occur while parsing or constructing positions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChessError {
    /// Square text that is not "a1".."h8"
    #[error("invalid square: {0:?}")]
    InvalidSquare(String),

    /// Move text that is not coordinate notation ("e2e4", "e7e8q")
    #[error("invalid move text: {0:?}")]
    InvalidMoveText(String),

    /// Well-formed move text that matches no legal move
    #[error("illegal move in this position: {0}")]
    IllegalMove(String),

    /// A board diagram with the wrong shape or unknown characters
    #[error("invalid board diagram: {message}")]
    InvalidDiagram { message: String },

    /// Each side needs exactly one king
    #[error("position must contain exactly one {color} king, found {count}")]
    KingCount { color: crate::types::Color, count: usize },

    /// The side that just moved would still be in check
    #[error("side not to move ({color}) is in check")]
    OpponentInCheck { color: crate::types::Color },
}

/// Result type alias for engine operations
pub type ChessResult<T> = Result<T, ChessError>;
