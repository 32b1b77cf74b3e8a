//! Move Generator Module
//!
//! Pseudo-legal generation per piece kind, consulting the king-safety
//! analysis so pinned pieces never leave their pin line, followed by the
//! check-response filter that produces the final legal move list.

use crate::attacks::{self, along_pin, KingSafety};
use crate::board::{Board, Move};
use crate::game_state::GameState;
use crate::types::*;

const KING_STEPS: [Direction; 8] = QUEEN_DIRECTIONS;

/// Result of asking whether the game is over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Ongoing,
    Checkmate,
    Stalemate,
}

/// Move generator for chess positions
#[derive(Clone, Copy, Debug, Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        MoveGenerator
    }

    /// Every legal move for the side to move. Order is generation order,
    /// callers must not rely on it.
    pub fn generate_legal_moves(&self, state: &GameState) -> Vec<Move> {
        let color = state.side_to_move();
        let king = state.king_square(color);
        let safety = attacks::analyze(state.board(), color, king);
        let mut moves = Vec::with_capacity(48);

        if safety.is_double_check() {
            self.generate_king_moves(state.board(), king, color, &mut moves);
            return moves;
        }

        self.generate_pseudo_legal_moves(state, &safety, &mut moves);

        if let [check] = safety.checks.as_slice() {
            let valid = self.check_block_squares(state.board(), king, check);
            moves.retain(|mv| {
                mv.piece().kind == PieceKind::King
                    || valid.contains(&mv.to())
                    || (mv.is_en_passant()
                        && Square::new(mv.from().row(), mv.to().col()) == Some(check.square))
            });
        } else {
            self.generate_castle_moves(state, &safety, &mut moves);
        }

        moves
    }

    /// Pseudo-legal moves for every piece of the side to move, with pins
    /// already honoured. Castling is generated separately.
    pub fn generate_pseudo_legal_moves(&self, state: &GameState, safety: &KingSafety, moves: &mut Vec<Move>) {
        let board = state.board();
        let color = state.side_to_move();

        for (sq, piece) in board.pieces_of(color) {
            let pin = safety.pin_direction(sq);
            match piece.kind {
                PieceKind::Pawn => self.generate_pawn_moves(state, sq, piece, pin, moves),
                PieceKind::Knight => {
                    if pin.is_none() {
                        self.generate_knight_moves(board, sq, piece, moves);
                    }
                }
                PieceKind::Bishop => self.generate_sliding_moves(board, sq, piece, &BISHOP_DIRECTIONS, pin, moves),
                PieceKind::Rook => self.generate_sliding_moves(board, sq, piece, &ROOK_DIRECTIONS, pin, moves),
                PieceKind::Queen => self.generate_sliding_moves(board, sq, piece, &QUEEN_DIRECTIONS, pin, moves),
                PieceKind::King => self.generate_king_moves(board, sq, color, moves),
            }
        }
    }

    /// Squares a non-king move may land on to answer a single check.
    fn check_block_squares(&self, board: &Board, king: Square, check: &attacks::Check) -> Vec<Square> {
        let knight_check = board.get(check.square).map(|p| p.kind) == Some(PieceKind::Knight);
        if knight_check {
            return vec![check.square];
        }

        let mut squares = Vec::with_capacity(7);
        let mut current = king;
        while let Some(next) = current.offset(check.direction) {
            squares.push(next);
            if next == check.square {
                break;
            }
            current = next;
        }
        squares
    }

    fn generate_pawn_moves(&self, state: &GameState, sq: Square, piece: Piece, pin: Option<Direction>, moves: &mut Vec<Move>) {
        let board = state.board();
        let color = piece.color;
        let forward = color.forward();

        // Pushes
        if along_pin(pin, (forward, 0)) {
            if let Some(one) = sq.offset((forward, 0)).filter(|&to| board.is_empty(to)) {
                moves.push(Move::normal(sq, one, piece, None));
                if sq.row() == color.pawn_start_row() {
                    if let Some(two) = one.offset((forward, 0)).filter(|&to| board.is_empty(to)) {
                        moves.push(Move::normal(sq, two, piece, None));
                    }
                }
            }
        }

        // Captures
        for side in [-1, 1] {
            let dir = (forward, side);
            if !along_pin(pin, dir) {
                continue;
            }
            let Some(to) = sq.offset(dir) else {
                continue;
            };
            match board.get(to) {
                Some(target) if target.color != color => {
                    moves.push(Move::normal(sq, to, piece, Some(target)));
                }
                None if state.en_passant() == Some(to) => {
                    let mv = Move::en_passant(sq, to, piece);
                    if self.en_passant_keeps_king_safe(state, &mv) {
                        moves.push(mv);
                    }
                }
                _ => {}
            }
        }
    }

    /// An en-passant capture lifts two pawns off one rank at once, which the
    /// single-piece pin scan cannot see.
    fn en_passant_keeps_king_safe(&self, state: &GameState, mv: &Move) -> bool {
        let color = mv.piece().color;
        let mut board = state.board().clone();
        board.set(mv.from(), None);
        board.set(mv.to(), Some(mv.piece()));
        if let Some(victim) = Square::new(mv.from().row(), mv.to().col()) {
            board.set(victim, None);
        }
        !attacks::analyze(&board, color, state.king_square(color)).in_check
    }

    fn generate_knight_moves(&self, board: &Board, sq: Square, piece: Piece, moves: &mut Vec<Move>) {
        for &offset in &KNIGHT_OFFSETS {
            let Some(to) = sq.offset(offset) else {
                continue;
            };
            match board.get(to) {
                None => moves.push(Move::normal(sq, to, piece, None)),
                Some(target) if target.color != piece.color => {
                    moves.push(Move::normal(sq, to, piece, Some(target)))
                }
                Some(_) => {}
            }
        }
    }

    /// Generate moves for sliding pieces (bishop, rook, queen)
    fn generate_sliding_moves(
        &self,
        board: &Board,
        sq: Square,
        piece: Piece,
        directions: &[Direction],
        pin: Option<Direction>,
        moves: &mut Vec<Move>,
    ) {
        for &dir in directions {
            if !along_pin(pin, dir) {
                continue;
            }
            let mut current = sq;
            while let Some(next) = current.offset(dir) {
                match board.get(next) {
                    None => moves.push(Move::normal(sq, next, piece, None)),
                    Some(target) => {
                        if target.color != piece.color {
                            moves.push(Move::normal(sq, next, piece, Some(target)));
                        }
                        break;
                    }
                }
                current = next;
            }
        }
    }

    /// King steps, each re-analysed from the destination square.
    fn generate_king_moves(&self, board: &Board, sq: Square, color: Color, moves: &mut Vec<Move>) {
        let piece = Piece::new(color, PieceKind::King);
        for &dir in &KING_STEPS {
            let Some(to) = sq.offset(dir) else {
                continue;
            };
            let target = board.get(to);
            if target.is_some_and(|t| t.color == color) {
                continue;
            }
            if !attacks::analyze(board, color, to).in_check {
                moves.push(Move::normal(sq, to, piece, target));
            }
        }
    }

    /// Castling for the side to move; the caller guarantees it is not in check.
    fn generate_castle_moves(&self, state: &GameState, safety: &KingSafety, moves: &mut Vec<Move>) {
        if safety.in_check {
            return;
        }
        let board = state.board();
        let color = state.side_to_move();
        let rights = state.castling_rights();
        let king = state.king_square(color);
        let row = color.home_row();
        if king != Square::at(row, 4) {
            return;
        }
        let piece = Piece::new(color, PieceKind::King);
        let enemy = color.opposite();
        let rook = Some(Piece::new(color, PieceKind::Rook));

        if rights.kingside(color)
            && board.get(Square::at(row, 7)) == rook
            && all_empty(board, row, &[5, 6])
            && none_attacked(board, row, &[5, 6], enemy)
        {
            moves.push(Move::castle(king, Square::at(row, 6), piece));
        }
        if rights.queenside(color)
            && board.get(Square::at(row, 0)) == rook
            && all_empty(board, row, &[1, 2, 3])
            && none_attacked(board, row, &[3, 2], enemy)
        {
            moves.push(Move::castle(king, Square::at(row, 2), piece));
        }
    }

    /// Is the side to move currently in check?
    pub fn is_in_check(&self, state: &GameState) -> bool {
        state.in_check()
    }

    pub fn outcome(&self, state: &GameState) -> Outcome {
        if !self.generate_legal_moves(state).is_empty() {
            Outcome::Ongoing
        } else if state.in_check() {
            Outcome::Checkmate
        } else {
            Outcome::Stalemate
        }
    }

    pub fn is_checkmate(&self, state: &GameState) -> bool {
        self.outcome(state) == Outcome::Checkmate
    }

    pub fn is_stalemate(&self, state: &GameState) -> bool {
        self.outcome(state) == Outcome::Stalemate
    }

    /// Count leaf nodes of the legal move tree to `depth` plies.
    pub fn perft(&self, state: &mut GameState, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }
        let moves = self.generate_legal_moves(state);
        if depth == 1 {
            return moves.len() as u64;
        }

        let mut nodes = 0u64;
        for mv in moves {
            state.make_move(mv);
            nodes += self.perft(state, depth - 1);
            state.undo_move();
        }
        nodes
    }
}

fn all_empty(board: &Board, row: u8, cols: &[u8]) -> bool {
    cols.iter().all(|&c| board.is_empty(Square::at(row, c)))
}

fn none_attacked(board: &Board, row: u8, cols: &[u8], by: Color) -> bool {
    cols.iter().all(|&c| !attacks::is_square_attacked(board, Square::at(row, c), by))
}
