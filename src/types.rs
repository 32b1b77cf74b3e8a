//! Core value types: colours, piece kinds, squares and castling rights.
//!
//! Squares use (row, col) coordinates. Row 0 is black's back rank (rank 8)
//! and col 0 is the a-file, so white pawns advance towards row 0.

use std::fmt;

use crate::error::{ChessError, ChessResult};

/// A step between two squares as (row delta, col delta).
pub type Direction = (i8, i8);

/// Orthogonal rays, listed before the diagonals.
pub const ROOK_DIRECTIONS: [Direction; 4] = [(-1, 0), (0, -1), (1, 0), (0, 1)];
pub const BISHOP_DIRECTIONS: [Direction; 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
pub const QUEEN_DIRECTIONS: [Direction; 8] = [
    (-1, 0), (0, -1), (1, 0), (0, 1),
    (-1, -1), (-1, 1), (1, -1), (1, 1),
];
pub const KNIGHT_OFFSETS: [Direction; 8] = [
    (-2, -1), (-2, 1), (-1, 2), (1, 2),
    (2, -1), (2, 1), (-1, -2), (1, -2),
];

/// File and rank names for algebraic notation
pub const FILE_NAMES: &[u8; 8] = b"abcdefgh";
pub const RANK_NAMES: &[u8; 8] = b"87654321";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[inline]
    pub fn opposite(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Row delta of a single pawn push.
    #[inline]
    pub fn forward(self) -> i8 {
        match self {
            Color::White => -1,
            Color::Black => 1,
        }
    }

    /// Row holding this colour's king and rooks at the start.
    #[inline]
    pub fn home_row(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    #[inline]
    pub fn pawn_start_row(self) -> u8 {
        match self {
            Color::White => 6,
            Color::Black => 1,
        }
    }

    #[inline]
    pub fn promotion_row(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// +1 for white, -1 for black; the negamax side multiplier.
    #[inline]
    pub fn sign(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Upper-case notation letter
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A coloured piece occupying a board cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Piece { color, kind }
    }

    /// Diagram character: upper case for white, lower case for black.
    pub fn to_char(self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::White => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }

    pub fn from_char(c: char) -> Option<Piece> {
        let color = if c.is_ascii_uppercase() { Color::White } else { Color::Black };
        let kind = match c.to_ascii_uppercase() {
            'P' => PieceKind::Pawn,
            'N' => PieceKind::Knight,
            'B' => PieceKind::Bishop,
            'R' => PieceKind::Rook,
            'Q' => PieceKind::Queen,
            'K' => PieceKind::King,
            _ => return None,
        };
        Some(Piece::new(color, kind))
    }
}

/// A board coordinate, always in range 0..8 on both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    row: u8,
    col: u8,
}

impl Square {
    pub fn new(row: u8, col: u8) -> Option<Square> {
        (row < 8 && col < 8).then_some(Square { row, col })
    }

    /// Constant constructor for fixed squares; panics when out of range.
    pub const fn at(row: u8, col: u8) -> Square {
        assert!(row < 8 && col < 8);
        Square { row, col }
    }

    #[inline]
    pub fn row(self) -> u8 {
        self.row
    }

    #[inline]
    pub fn col(self) -> u8 {
        self.col
    }

    /// The square `dir` away, or `None` when it falls off the board.
    #[inline]
    pub fn offset(self, dir: Direction) -> Option<Square> {
        let row = self.row as i8 + dir.0;
        let col = self.col as i8 + dir.1;
        if (0..8).contains(&row) && (0..8).contains(&col) {
            Some(Square { row: row as u8, col: col as u8 })
        } else {
            None
        }
    }

    /// Every square on the board, row-major.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|row| (0..8u8).map(move |col| Square { row, col }))
    }

    /// Algebraic name, e.g. "e4".
    pub fn name(self) -> String {
        format!(
            "{}{}",
            FILE_NAMES[self.col as usize] as char,
            RANK_NAMES[self.row as usize] as char
        )
    }

    /// Parse algebraic notation ("a1".."h8").
    pub fn parse(name: &str) -> ChessResult<Square> {
        let bytes = name.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidSquare(name.to_string()));
        }
        let col = match bytes[0] {
            b'a'..=b'h' => bytes[0] - b'a',
            _ => return Err(ChessError::InvalidSquare(name.to_string())),
        };
        let row = match bytes[1] {
            b'1'..=b'8' => b'8' - bytes[1],
            _ => return Err(ChessError::InvalidSquare(name.to_string())),
        };
        Ok(Square { row, col })
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// Per-side castling permissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_kingside: bool,
    pub white_queenside: bool,
    pub black_kingside: bool,
    pub black_queenside: bool,
}

impl CastlingRights {
    pub const ALL: CastlingRights = CastlingRights {
        white_kingside: true,
        white_queenside: true,
        black_kingside: true,
        black_queenside: true,
    };

    pub const NONE: CastlingRights = CastlingRights {
        white_kingside: false,
        white_queenside: false,
        black_kingside: false,
        black_queenside: false,
    };

    pub fn kingside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_kingside,
            Color::Black => self.black_kingside,
        }
    }

    pub fn queenside(&self, color: Color) -> bool {
        match color {
            Color::White => self.white_queenside,
            Color::Black => self.black_queenside,
        }
    }

    pub fn clear_kingside(&mut self, color: Color) {
        match color {
            Color::White => self.white_kingside = false,
            Color::Black => self.black_kingside = false,
        }
    }

    pub fn clear_queenside(&mut self, color: Color) {
        match color {
            Color::White => self.white_queenside = false,
            Color::Black => self.black_queenside = false,
        }
    }

    pub fn clear(&mut self, color: Color) {
        self.clear_kingside(color);
        self.clear_queenside(color);
    }

    /// Drop the right tied to a rook home corner, if `sq` is one.
    pub fn clear_corner(&mut self, sq: Square) {
        for color in [Color::White, Color::Black] {
            if sq.row() != color.home_row() {
                continue;
            }
            match sq.col() {
                0 => self.clear_queenside(color),
                7 => self.clear_kingside(color),
                _ => {}
            }
        }
    }
}

impl Default for CastlingRights {
    fn default() -> Self {
        CastlingRights::ALL
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == CastlingRights::NONE {
            return f.write_str("-");
        }
        if self.white_kingside { f.write_str("K")?; }
        if self.white_queenside { f.write_str("Q")?; }
        if self.black_kingside { f.write_str("k")?; }
        if self.black_queenside { f.write_str("q")?; }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_names_follow_row_orientation() {
        let a8 = Square::new(0, 0).unwrap();
        let h1 = Square::new(7, 7).unwrap();
        assert_eq!(a8.name(), "a8");
        assert_eq!(h1.name(), "h1");
        assert_eq!(Square::parse("e4").unwrap(), Square::new(4, 4).unwrap());
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(Square::parse("i1").is_err());
        assert!(Square::parse("a9").is_err());
        assert!(Square::parse("e").is_err());
        assert!(Square::parse("e44").is_err());
    }

    #[test]
    fn offset_stays_on_board() {
        let a1 = Square::parse("a1").unwrap();
        assert_eq!(a1.offset((1, 0)), None);
        assert_eq!(a1.offset((0, -1)), None);
        assert_eq!(a1.offset((-1, 1)), Some(Square::parse("b2").unwrap()));
    }

    #[test]
    fn clearing_a_corner_only_touches_that_side() {
        let mut rights = CastlingRights::ALL;
        rights.clear_corner(Square::parse("h8").unwrap());
        assert!(!rights.black_kingside);
        assert!(rights.black_queenside && rights.white_kingside && rights.white_queenside);
        rights.clear_corner(Square::parse("e4").unwrap());
        assert_eq!(rights.to_string(), "KQq");
    }

    #[test]
    fn piece_chars_round_trip_case() {
        let p = Piece::from_char('n').unwrap();
        assert_eq!(p, Piece::new(Color::Black, PieceKind::Knight));
        assert_eq!(p.to_char(), 'n');
        assert!(Piece::from_char('x').is_none());
    }
}
