//! Board representation and the move record.
//!
//! The board is a passive 8×8 grid; all game rules live in
//! [`crate::game_state`] and [`crate::move_generator`].

use std::fmt;

use crate::error::{ChessError, ChessResult};
use crate::types::*;

/// Back rank piece order from the a-file to the h-file.
const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// Special behaviour attached to a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MoveFlag {
    Normal,
    EnPassant,
    Castle,
}

/// A single ply. Only the move generator builds these, so every `Move`
/// handed to [`crate::game_state::GameState::make_move`] came from a
/// legal move list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    from: Square,
    to: Square,
    piece: Piece,
    captured: Option<Piece>,
    flag: MoveFlag,
}

impl Move {
    pub(crate) fn normal(from: Square, to: Square, piece: Piece, captured: Option<Piece>) -> Self {
        Move { from, to, piece, captured, flag: MoveFlag::Normal }
    }

    /// The captured pawn is synthesized; the landing square is empty.
    pub(crate) fn en_passant(from: Square, to: Square, piece: Piece) -> Self {
        Move {
            from,
            to,
            piece,
            captured: Some(Piece::new(piece.color.opposite(), PieceKind::Pawn)),
            flag: MoveFlag::EnPassant,
        }
    }

    pub(crate) fn castle(from: Square, to: Square, piece: Piece) -> Self {
        Move { from, to, piece, captured: None, flag: MoveFlag::Castle }
    }

    #[inline]
    pub fn from(&self) -> Square {
        self.from
    }

    #[inline]
    pub fn to(&self) -> Square {
        self.to
    }

    #[inline]
    pub fn piece(&self) -> Piece {
        self.piece
    }

    #[inline]
    pub fn captured(&self) -> Option<Piece> {
        self.captured
    }

    #[inline]
    pub fn flag(&self) -> MoveFlag {
        self.flag
    }

    pub fn is_capture(&self) -> bool {
        self.captured.is_some()
    }

    pub fn is_en_passant(&self) -> bool {
        self.flag == MoveFlag::EnPassant
    }

    pub fn is_castle(&self) -> bool {
        self.flag == MoveFlag::Castle
    }

    /// Pawn reaching the far row. Always promotes to a queen.
    pub fn is_promotion(&self) -> bool {
        self.piece.kind == PieceKind::Pawn && self.to.row() == self.piece.color.promotion_row()
    }

    /// Compact start/end key, `from.row*1000 + from.col*100 + to.row*10 + to.col`.
    pub fn id(&self) -> u16 {
        self.from.row() as u16 * 1000
            + self.from.col() as u16 * 100
            + self.to.row() as u16 * 10
            + self.to.col() as u16
    }

    /// Long notation: piece letter (none for pawns), origin, "x" on capture, target.
    pub fn notation(&self) -> String {
        let mut s = String::with_capacity(6);
        if self.piece.kind != PieceKind::Pawn {
            s.push(self.piece.kind.letter());
        }
        s.push_str(&self.from.name());
        if self.is_capture() {
            s.push('x');
        }
        s.push_str(&self.to.name());
        s
    }

    /// Coordinate notation for the UCI protocol (e.g. "e2e4", "e7e8q").
    pub fn to_uci(&self) -> String {
        let mut uci = format!("{}{}", self.from.name(), self.to.name());
        if self.is_promotion() {
            uci.push('q');
        }
        uci
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.notation())
    }
}

/// 8×8 grid of optional pieces, row-major, row 0 = rank 8.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
}

impl Board {
    /// Standard starting position
    pub fn new() -> Self {
        let mut board = Board::empty();
        for (col, &kind) in BACK_RANK.iter().enumerate() {
            board.squares[0][col] = Some(Piece::new(Color::Black, kind));
            board.squares[1][col] = Some(Piece::new(Color::Black, PieceKind::Pawn));
            board.squares[6][col] = Some(Piece::new(Color::White, PieceKind::Pawn));
            board.squares[7][col] = Some(Piece::new(Color::White, kind));
        }
        board
    }

    pub fn empty() -> Self {
        Board { squares: [[None; 8]; 8] }
    }

    /// Parse an 8-line diagram, top line first. `.` marks an empty cell and
    /// pieces use FEN letters; whitespace between cells is ignored.
    pub fn from_diagram(diagram: &str) -> ChessResult<Self> {
        let rows: Vec<&str> = diagram
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        if rows.len() != 8 {
            return Err(ChessError::InvalidDiagram {
                message: format!("expected 8 rows, found {}", rows.len()),
            });
        }

        let mut board = Board::empty();
        for (row, line) in rows.iter().enumerate() {
            let cells: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
            if cells.len() != 8 {
                return Err(ChessError::InvalidDiagram {
                    message: format!("row {} has {} cells", row, cells.len()),
                });
            }
            for (col, &c) in cells.iter().enumerate() {
                board.squares[row][col] = match c {
                    '.' => None,
                    _ => Some(Piece::from_char(c).ok_or_else(|| ChessError::InvalidDiagram {
                        message: format!("unknown piece {:?}", c),
                    })?),
                };
            }
        }
        Ok(board)
    }

    #[inline]
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.row() as usize][sq.col() as usize]
    }

    #[inline]
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.row() as usize][sq.col() as usize] = piece;
    }

    #[inline]
    pub fn is_empty(&self, sq: Square) -> bool {
        self.get(sq).is_none()
    }

    /// All occupied squares with their pieces, row-major.
    pub fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(move |sq| self.get(sq).map(|p| (sq, p)))
    }

    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.occupied().filter(move |(_, p)| p.color == color)
    }

    /// Squares holding a king of `color`.
    pub fn kings(&self, color: Color) -> Vec<Square> {
        let king = Piece::new(color, PieceKind::King);
        self.occupied()
            .filter(|&(_, p)| p == king)
            .map(|(sq, _)| sq)
            .collect()
    }

    /// Display the board as a string
    pub fn display(&self) -> String {
        let mut lines = Vec::with_capacity(18);
        lines.push("  +---+---+---+---+---+---+---+---+".to_string());
        for row in 0..8 {
            let mut line = format!("{} |", RANK_NAMES[row] as char);
            for col in 0..8 {
                match self.squares[row][col] {
                    Some(piece) => line.push_str(&format!(" {} |", piece.to_char())),
                    None => line.push_str("   |"),
                }
            }
            lines.push(line);
            lines.push("  +---+---+---+---+---+---+---+---+".to_string());
        }
        lines.push("    a   b   c   d   e   f   g   h".to_string());
        lines.join("\n")
    }
}

impl Default for Board {
    fn default() -> Self {
        Board::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        Square::parse(name).unwrap()
    }

    #[test]
    fn starting_board_layout() {
        let board = Board::new();
        assert_eq!(board.get(sq("e1")), Some(Piece::new(Color::White, PieceKind::King)));
        assert_eq!(board.get(sq("d8")), Some(Piece::new(Color::Black, PieceKind::Queen)));
        assert_eq!(board.get(sq("a7")), Some(Piece::new(Color::Black, PieceKind::Pawn)));
        assert!(board.is_empty(sq("e4")));
        assert_eq!(board.occupied().count(), 32);
        assert_eq!(board.kings(Color::White), vec![sq("e1")]);
    }

    #[test]
    fn diagram_matches_starting_board() {
        let board = Board::from_diagram(
            "rnbqkbnr
             pppppppp
             ........
             ........
             ........
             ........
             PPPPPPPP
             RNBQKBNR",
        )
        .unwrap();
        assert_eq!(board, Board::new());
    }

    #[test]
    fn diagram_errors_are_reported() {
        assert!(matches!(
            Board::from_diagram("........"),
            Err(ChessError::InvalidDiagram { .. })
        ));
        let bad_cell = "rnbqkbnr\npppppppp\n........\n...z....\n........\n........\nPPPPPPPP\nRNBQKBNR";
        assert!(Board::from_diagram(bad_cell).is_err());
    }

    #[test]
    fn notation_and_uci_text() {
        let knight = Piece::new(Color::White, PieceKind::Knight);
        let mv = Move::normal(sq("g1"), sq("f3"), knight, None);
        assert_eq!(mv.notation(), "Ng1f3");
        assert_eq!(mv.to_uci(), "g1f3");

        let pawn = Piece::new(Color::White, PieceKind::Pawn);
        let capture = Move::normal(sq("e4"), sq("d5"), pawn, Some(Piece::new(Color::Black, PieceKind::Pawn)));
        assert_eq!(capture.to_string(), "e4xd5");

        let promo = Move::normal(sq("b7"), sq("b8"), pawn, None);
        assert!(promo.is_promotion());
        assert_eq!(promo.to_uci(), "b7b8q");
    }

    #[test]
    fn en_passant_synthesizes_victim() {
        let pawn = Piece::new(Color::Black, PieceKind::Pawn);
        let mv = Move::en_passant(sq("d4"), sq("e3"), pawn);
        assert_eq!(mv.captured(), Some(Piece::new(Color::White, PieceKind::Pawn)));
        assert!(mv.is_capture() && mv.is_en_passant());
        assert_eq!(mv.id(), 4 * 1000 + 3 * 100 + 5 * 10 + 4);
    }
}
