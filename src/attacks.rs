//! King safety analysis: checks and absolute pins.
//!
//! [`analyze`] casts the eight queen rays outward from a king square and
//! probes the eight knight offsets. It is a pure function of the board, so
//! the generator can ask about hypothetical king squares (king moves,
//! castling transit squares) without touching the position.

use crate::board::Board;
use crate::types::*;

/// A friendly piece that may only move along `direction` (either sign).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pin {
    pub square: Square,
    pub direction: Direction,
}

/// An enemy piece giving check. For sliders and pawns `direction` is the
/// unit step from the king towards the checker; for knights it is the
/// knight offset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Check {
    pub square: Square,
    pub direction: Direction,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KingSafety {
    pub in_check: bool,
    pub pins: Vec<Pin>,
    pub checks: Vec<Check>,
}

impl KingSafety {
    /// Pin direction for the piece on `sq`, if it is pinned.
    pub fn pin_direction(&self, sq: Square) -> Option<Direction> {
        self.pins.iter().find(|p| p.square == sq).map(|p| p.direction)
    }

    pub fn is_double_check(&self) -> bool {
        self.checks.len() >= 2
    }
}

/// True when moving along `dir` keeps a piece with pin `pin` on its pin line.
#[inline]
pub fn along_pin(pin: Option<Direction>, dir: Direction) -> bool {
    match pin {
        None => true,
        Some(p) => p == dir || p == (-dir.0, -dir.1),
    }
}

/// Analyse the safety of a `color` king standing on `king`.
///
/// The real king of `color` is transparent to the rays, which lets callers
/// test a square the king has not moved to yet.
pub fn analyze(board: &Board, color: Color, king: Square) -> KingSafety {
    let enemy = color.opposite();
    let own_king = Piece::new(color, PieceKind::King);
    let mut safety = KingSafety::default();

    for (j, &dir) in QUEEN_DIRECTIONS.iter().enumerate() {
        let orthogonal = j < 4;
        let mut candidate: Option<Square> = None;
        let mut current = king;
        let mut distance = 0;

        while let Some(next) = current.offset(dir) {
            current = next;
            distance += 1;
            let Some(piece) = board.get(next) else {
                continue;
            };

            if piece.color == color {
                if piece == own_king {
                    continue;
                }
                if candidate.is_some() {
                    break;
                }
                candidate = Some(next);
                continue;
            }

            let attacks = match piece.kind {
                PieceKind::Rook => orthogonal,
                PieceKind::Bishop => !orthogonal,
                PieceKind::Queen => true,
                PieceKind::King => distance == 1,
                // an enemy pawn captures towards the king: it sits one row
                // behind the king from its own point of view
                PieceKind::Pawn => distance == 1 && !orthogonal && dir.0 == -enemy.forward(),
                PieceKind::Knight => false,
            };
            if attacks {
                match candidate {
                    None => {
                        safety.in_check = true;
                        safety.checks.push(Check { square: next, direction: dir });
                    }
                    Some(square) => safety.pins.push(Pin { square, direction: dir }),
                }
            }
            break;
        }
    }

    let enemy_knight = Piece::new(enemy, PieceKind::Knight);
    for &offset in &KNIGHT_OFFSETS {
        if let Some(sq) = king.offset(offset) {
            if board.get(sq) == Some(enemy_knight) {
                safety.in_check = true;
                safety.checks.push(Check { square: sq, direction: offset });
            }
        }
    }

    safety
}

/// Is `sq` attacked by any piece of colour `by`?
///
/// Pins found along the way are irrelevant here; only checks count.
pub fn is_square_attacked(board: &Board, sq: Square, by: Color) -> bool {
    analyze(board, by.opposite(), sq).in_check
}
