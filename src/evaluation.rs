//! Position Evaluation Module
//!
//! Static evaluation in centipawns from white's point of view:
//! - Checkmate and stalemate
//! - Material balance
//! - Piece positioning (piece-square tables)

use crate::board::Board;
use crate::game_state::GameState;
use crate::move_generator::{MoveGenerator, Outcome};
use crate::types::*;

// ============================================================================
// PIECE VALUES
// ============================================================================

/// Indexed by [`PieceKind::index`].
pub const PIECE_VALUES: [i32; 6] = [
    100,  // PAWN
    300,  // KNIGHT
    300,  // BISHOP
    500,  // ROOK
    1000, // QUEEN
    0,    // KING
];

/// Score of a mated position, negative for the side that is mated.
pub const CHECKMATE_SCORE: i32 = 100_000;
pub const STALEMATE_SCORE: i32 = 0;

// ============================================================================
// PIECE-SQUARE TABLES
// ============================================================================
// Laid out from white's side: index [row][col] with row 0 = rank 8.
// Black reads the same table with the rows reversed.

type Table = [[i32; 8]; 8];

const KNIGHT_TABLE: Table = [
    [0, 10, 20, 20, 20, 20, 10, 0],
    [10, 30, 50, 50, 50, 50, 30, 10],
    [20, 50, 60, 65, 65, 60, 50, 20],
    [20, 55, 65, 70, 70, 65, 55, 20],
    [20, 50, 65, 70, 70, 65, 50, 20],
    [20, 55, 60, 65, 65, 60, 55, 20],
    [10, 30, 50, 55, 55, 50, 30, 10],
    [0, 10, 20, 20, 20, 20, 10, 0],
];

const BISHOP_TABLE: Table = [
    [0, 20, 20, 20, 20, 20, 20, 0],
    [20, 40, 40, 40, 40, 40, 40, 20],
    [20, 40, 50, 60, 60, 50, 40, 20],
    [20, 50, 50, 60, 60, 50, 50, 20],
    [20, 40, 60, 60, 60, 60, 40, 20],
    [20, 60, 60, 60, 60, 60, 60, 20],
    [20, 50, 40, 40, 40, 40, 50, 20],
    [0, 20, 20, 20, 20, 20, 20, 0],
];

const ROOK_TABLE: Table = [
    [25, 25, 25, 25, 25, 25, 25, 25],
    [50, 75, 75, 75, 75, 75, 75, 50],
    [0, 25, 25, 25, 25, 25, 25, 0],
    [0, 25, 25, 25, 25, 25, 25, 0],
    [0, 25, 25, 25, 25, 25, 25, 0],
    [0, 25, 25, 25, 25, 25, 25, 0],
    [0, 25, 25, 25, 25, 25, 25, 0],
    [25, 25, 25, 50, 50, 25, 25, 25],
];

const QUEEN_TABLE: Table = [
    [0, 20, 20, 30, 30, 20, 20, 0],
    [20, 40, 40, 40, 40, 40, 40, 20],
    [20, 40, 50, 50, 50, 50, 40, 20],
    [30, 40, 50, 50, 50, 50, 40, 30],
    [40, 40, 50, 50, 50, 50, 40, 30],
    [20, 50, 50, 50, 50, 50, 40, 20],
    [20, 40, 50, 40, 40, 40, 40, 20],
    [0, 20, 20, 30, 30, 20, 20, 0],
];

const PAWN_TABLE: Table = [
    [80, 80, 80, 80, 80, 80, 80, 80],
    [70, 70, 70, 70, 70, 70, 70, 70],
    [30, 30, 40, 50, 50, 40, 30, 30],
    [25, 25, 30, 45, 45, 30, 25, 25],
    [20, 20, 20, 40, 40, 20, 20, 20],
    [25, 15, 10, 20, 20, 10, 15, 25],
    [25, 30, 30, 0, 0, 30, 30, 25],
    [20, 20, 20, 20, 20, 20, 20, 20],
];

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Piece-square bonus for `piece` standing on `sq`.
fn square_bonus(piece: Piece, sq: Square) -> i32 {
    let table = match piece.kind {
        PieceKind::Pawn => &PAWN_TABLE,
        PieceKind::Knight => &KNIGHT_TABLE,
        PieceKind::Bishop => &BISHOP_TABLE,
        PieceKind::Rook => &ROOK_TABLE,
        PieceKind::Queen => &QUEEN_TABLE,
        PieceKind::King => return 0,
    };
    let row = match piece.color {
        Color::White => sq.row() as usize,
        Color::Black => 7 - sq.row() as usize,
    };
    table[row][sq.col() as usize]
}

/// Material balance only, white minus black.
pub fn score_material(board: &Board) -> i32 {
    board
        .occupied()
        .map(|(_, p)| p.color.sign() * PIECE_VALUES[p.kind.index()])
        .sum()
}

/// Material plus piece-square bonuses, white minus black. Ignores whether
/// the game is over.
pub fn score_board(board: &Board) -> i32 {
    board
        .occupied()
        .map(|(sq, p)| p.color.sign() * (PIECE_VALUES[p.kind.index()] + square_bonus(p, sq)))
        .sum()
}

// ============================================================================
// MAIN EVALUATION
// ============================================================================

/// Evaluate with the game outcome already known, sparing a second move
/// generation when the caller has the legal move list at hand.
pub fn evaluate_outcome(state: &GameState, outcome: Outcome) -> i32 {
    match outcome {
        Outcome::Checkmate => -state.side_to_move().sign() * CHECKMATE_SCORE,
        Outcome::Stalemate => STALEMATE_SCORE,
        Outcome::Ongoing => score_board(state.board()),
    }
}

/// Evaluate the position from white's perspective.
pub fn evaluate(state: &GameState) -> i32 {
    evaluate_outcome(state, MoveGenerator::new().outcome(state))
}
