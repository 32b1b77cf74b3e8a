//! Game state: the board plus everything needed to make and undo moves.
//!
//! `make_move` and `undo_move` are the only mutators, and each one commits
//! or reverts a whole ply: board cells, king squares, castling rights,
//! en-passant target, side to move and history.

use crate::attacks;
use crate::board::{Board, Move, MoveFlag};
use crate::error::{ChessError, ChessResult};
use crate::types::*;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameState {
    board: Board,
    side_to_move: Color,
    history: Vec<Move>,
    /// Initial rights plus one snapshot per ply
    castling_history: Vec<CastlingRights>,
    castling_rights: CastlingRights,
    /// En-passant target in force before each ply
    en_passant_history: Vec<Option<Square>>,
    en_passant: Option<Square>,
    white_king: Square,
    black_king: Square,
}

impl GameState {
    /// Standard initial position, white to move, full castling rights.
    pub fn new_game() -> Self {
        let board = Board::new();
        GameState {
            board,
            side_to_move: Color::White,
            history: Vec::new(),
            castling_history: vec![CastlingRights::ALL],
            castling_rights: CastlingRights::ALL,
            en_passant_history: Vec::new(),
            en_passant: None,
            white_king: Square::at(7, 4),
            black_king: Square::at(0, 4),
        }
    }

    /// Build a state from an arbitrary board.
    ///
    /// Castling rights whose king or rook is not on its home square are
    /// dropped, and an en-passant target is kept only if it sits behind a
    /// pawn that could just have made a double push.
    pub fn from_position(
        board: Board,
        side_to_move: Color,
        castling_rights: CastlingRights,
        en_passant: Option<Square>,
    ) -> ChessResult<Self> {
        let white_king = single_king(&board, Color::White)?;
        let black_king = single_king(&board, Color::Black)?;

        let mut rights = castling_rights;
        for color in [Color::White, Color::Black] {
            let home = color.home_row();
            let king = if color == Color::White { white_king } else { black_king };
            let rook = Some(Piece::new(color, PieceKind::Rook));
            if king != Square::at(home, 4) {
                rights.clear(color);
            }
            if board.get(Square::at(home, 7)) != rook {
                rights.clear_kingside(color);
            }
            if board.get(Square::at(home, 0)) != rook {
                rights.clear_queenside(color);
            }
        }

        let en_passant = en_passant.filter(|target| {
            let mover = side_to_move.opposite();
            let expected_row = mover.pawn_start_row() as i8 + mover.forward();
            target.row() as i8 == expected_row
                && board.is_empty(*target)
                && target.offset((mover.forward(), 0)).and_then(|sq| board.get(sq))
                    == Some(Piece::new(mover, PieceKind::Pawn))
        });

        let state = GameState {
            board,
            side_to_move,
            history: Vec::new(),
            castling_history: vec![rights],
            castling_rights: rights,
            en_passant_history: Vec::new(),
            en_passant,
            white_king,
            black_king,
        };

        let waiting = side_to_move.opposite();
        if attacks::is_square_attacked(&state.board, state.king_square(waiting), side_to_move) {
            return Err(ChessError::OpponentInCheck { color: waiting });
        }
        Ok(state)
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[inline]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[inline]
    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn last_move(&self) -> Option<&Move> {
        self.history.last()
    }

    /// Castling rights after each ply, starting with the initial rights.
    pub fn castling_history(&self) -> &[CastlingRights] {
        &self.castling_history
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Square {
        match color {
            Color::White => self.white_king,
            Color::Black => self.black_king,
        }
    }

    /// Is the side to move currently in check?
    pub fn in_check(&self) -> bool {
        let color = self.side_to_move;
        attacks::analyze(&self.board, color, self.king_square(color)).in_check
    }

    /// Apply a move drawn from the current legal move list.
    pub fn make_move(&mut self, mv: Move) {
        let color = mv.piece().color;
        let from = mv.from();
        let to = mv.to();

        self.board.set(from, None);
        let placed = if mv.is_promotion() {
            Piece::new(color, PieceKind::Queen)
        } else {
            mv.piece()
        };
        self.board.set(to, Some(placed));

        match mv.flag() {
            MoveFlag::EnPassant => {
                if let Some(victim) = Square::new(from.row(), to.col()) {
                    self.board.set(victim, None);
                }
            }
            MoveFlag::Castle => {
                if let Some((rook_from, rook_to)) = castle_rook_squares(from, to) {
                    self.board.set(rook_from, None);
                    self.board.set(rook_to, Some(Piece::new(color, PieceKind::Rook)));
                }
            }
            MoveFlag::Normal => {}
        }

        if mv.piece().kind == PieceKind::King {
            match color {
                Color::White => self.white_king = to,
                Color::Black => self.black_king = to,
            }
        }

        self.en_passant_history.push(self.en_passant);
        self.en_passant = if mv.piece().kind == PieceKind::Pawn && from.row().abs_diff(to.row()) == 2 {
            Square::new((from.row() + to.row()) / 2, from.col())
        } else {
            None
        };

        let mut rights = self.castling_rights;
        if mv.piece().kind == PieceKind::King {
            rights.clear(color);
        }
        rights.clear_corner(from);
        rights.clear_corner(to);
        self.castling_rights = rights;
        self.castling_history.push(rights);

        self.history.push(mv);
        self.side_to_move = self.side_to_move.opposite();
    }

    /// Revert the last move. Returns `None` (and changes nothing) when the
    /// history is empty.
    pub fn undo_move(&mut self) -> Option<Move> {
        let mv = self.history.pop()?;
        let color = mv.piece().color;
        let from = mv.from();
        let to = mv.to();

        self.side_to_move = self.side_to_move.opposite();
        self.board.set(from, Some(mv.piece()));

        match mv.flag() {
            MoveFlag::EnPassant => {
                self.board.set(to, None);
                if let Some(victim) = Square::new(from.row(), to.col()) {
                    self.board.set(victim, mv.captured());
                }
            }
            MoveFlag::Castle => {
                self.board.set(to, None);
                if let Some((rook_from, rook_to)) = castle_rook_squares(from, to) {
                    self.board.set(rook_to, None);
                    self.board.set(rook_from, Some(Piece::new(color, PieceKind::Rook)));
                }
            }
            MoveFlag::Normal => self.board.set(to, mv.captured()),
        }

        if mv.piece().kind == PieceKind::King {
            match color {
                Color::White => self.white_king = from,
                Color::Black => self.black_king = from,
            }
        }

        self.castling_history.pop();
        if let Some(&rights) = self.castling_history.last() {
            self.castling_rights = rights;
        }
        self.en_passant = self.en_passant_history.pop().flatten();

        Some(mv)
    }
}

impl Default for GameState {
    fn default() -> Self {
        GameState::new_game()
    }
}

/// Rook origin and destination for a castling king move.
fn castle_rook_squares(king_from: Square, king_to: Square) -> Option<(Square, Square)> {
    let row = king_from.row();
    if king_to.col() > king_from.col() {
        Some((Square::new(row, 7)?, Square::new(row, king_to.col().checked_sub(1)?)?))
    } else {
        Some((Square::new(row, 0)?, Square::new(row, king_to.col() + 1)?))
    }
}

fn single_king(board: &Board, color: Color) -> ChessResult<Square> {
    match board.kings(color).as_slice() {
        [sq] => Ok(*sq),
        kings => Err(ChessError::KingCount { color, count: kings.len() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::move_generator::MoveGenerator;

    fn sq(name: &str) -> Square {
        Square::parse(name).unwrap()
    }

    fn find(state: &GameState, uci: &str) -> Move {
        MoveGenerator::new()
            .generate_legal_moves(state)
            .into_iter()
            .find(|m| m.to_uci() == uci)
            .unwrap_or_else(|| panic!("{} should be legal", uci))
    }

    #[test]
    fn new_game_invariants() {
        let state = GameState::new_game();
        assert_eq!(state.side_to_move(), Color::White);
        assert_eq!(state.castling_rights(), CastlingRights::ALL);
        assert_eq!(state.castling_history().len(), 1);
        assert!(state.history().is_empty());
        assert_eq!(state.king_square(Color::White), sq("e1"));
        assert_eq!(state.king_square(Color::Black), sq("e8"));
    }

    #[test]
    fn undo_on_empty_history_is_a_no_op() {
        let mut state = GameState::new_game();
        let before = state.clone();
        assert!(state.undo_move().is_none());
        assert_eq!(state, before);
    }

    #[test]
    fn double_push_sets_en_passant_target_and_next_move_clears_it() {
        let mut state = GameState::new_game();
        state.make_move(find(&state, "e2e4"));
        assert_eq!(state.en_passant(), Some(sq("e3")));
        assert_eq!(state.side_to_move(), Color::Black);
        state.make_move(find(&state, "g8f6"));
        assert_eq!(state.en_passant(), None);
        state.undo_move();
        assert_eq!(state.en_passant(), Some(sq("e3")));
        assert_eq!(state.castling_history().len(), state.history().len() + 1);
    }

    #[test]
    fn king_move_drops_both_rights_and_tracks_square() {
        let mut state = GameState::new_game();
        for uci in ["e2e4", "e7e5", "e1e2"] {
            state.make_move(find(&state, uci));
        }
        assert_eq!(state.king_square(Color::White), sq("e2"));
        assert!(!state.castling_rights().white_kingside);
        assert!(!state.castling_rights().white_queenside);
        assert!(state.castling_rights().black_kingside);
        state.undo_move();
        assert_eq!(state.king_square(Color::White), sq("e1"));
        assert_eq!(state.castling_rights(), CastlingRights::ALL);
    }

    #[test]
    fn capturing_a_home_rook_removes_that_right() {
        let board = Board::from_diagram(
            "r...k..r
             ........
             ........
             ........
             ........
             ........
             ........
             R...K..R",
        )
        .unwrap();
        let mut state = GameState::from_position(board, Color::White, CastlingRights::ALL, None).unwrap();
        state.make_move(find(&state, "h1h8"));
        let rights = state.castling_rights();
        assert!(!rights.black_kingside);
        assert!(!rights.white_kingside);
        assert!(rights.black_queenside && rights.white_queenside);
    }

    #[test]
    fn castling_moves_the_rook_and_undo_restores_it() {
        let board = Board::from_diagram(
            "r...k..r
             ........
             ........
             ........
             ........
             ........
             ........
             R...K..R",
        )
        .unwrap();
        let mut state = GameState::from_position(board, Color::White, CastlingRights::ALL, None).unwrap();
        let before = state.clone();

        state.make_move(find(&state, "e1c1"));
        let white_rook = Some(Piece::new(Color::White, PieceKind::Rook));
        assert_eq!(state.board().get(sq("d1")), white_rook);
        assert!(state.board().is_empty(sq("a1")));
        assert_eq!(state.king_square(Color::White), sq("c1"));

        state.make_move(find(&state, "e8g8"));
        assert_eq!(state.board().get(sq("f8")), Some(Piece::new(Color::Black, PieceKind::Rook)));
        assert!(state.board().is_empty(sq("h8")));

        state.undo_move();
        state.undo_move();
        assert_eq!(state, before);
    }

    #[test]
    fn promotion_always_makes_a_queen() {
        let board = Board::from_diagram(
            "....k...
             .P......
             ........
             ........
             ........
             ........
             ........
             ....K...",
        )
        .unwrap();
        let mut state = GameState::from_position(board, Color::White, CastlingRights::NONE, None).unwrap();
        let before = state.clone();
        state.make_move(find(&state, "b7b8q"));
        assert_eq!(state.board().get(sq("b8")), Some(Piece::new(Color::White, PieceKind::Queen)));
        state.undo_move();
        assert_eq!(state, before);
    }

    #[test]
    fn from_position_validates_kings_and_rights() {
        let no_black_king = Board::from_diagram(
            "........
             ........
             ........
             ........
             ........
             ........
             ........
             R...K..R",
        )
        .unwrap();
        assert_eq!(
            GameState::from_position(no_black_king, Color::White, CastlingRights::ALL, None),
            Err(ChessError::KingCount { color: Color::Black, count: 0 })
        );

        let rookless = Board::from_diagram(
            "....k...
             ........
             ........
             ........
             ........
             ........
             ........
             R...K...",
        )
        .unwrap();
        let state = GameState::from_position(rookless, Color::White, CastlingRights::ALL, None).unwrap();
        assert_eq!(state.castling_rights().to_string(), "Q");
    }

    #[test]
    fn from_position_rejects_side_not_to_move_in_check() {
        let board = Board::from_diagram(
            "....k...
             ........
             ........
             ........
             ........
             ........
             ........
             ....R..K",
        )
        .unwrap();
        assert_eq!(
            GameState::from_position(board, Color::White, CastlingRights::NONE, None),
            Err(ChessError::OpponentInCheck { color: Color::Black })
        );
    }
}
