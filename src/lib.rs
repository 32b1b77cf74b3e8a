//! NegamaxChess - chess rules engine and search
//!
//! - Mailbox 8×8 board with make/undo that restores positions exactly
//! - Pin-aware legal move generation (checks, pins, castling, en passant)
//! - Material plus piece-square evaluation
//! - Negamax search with alpha-beta pruning, split over worker threads
//! - Cancellable background search behind a UCI front end

pub mod types;
pub mod error;
pub mod board;
pub mod attacks;
pub mod game_state;
pub mod move_generator;
pub mod evaluation;
pub mod search;
pub mod parallel_search;
pub mod uci;
