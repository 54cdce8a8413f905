use serde::Deserialize;

use crate::board::Piece;
use crate::rules::RulesEngine;
use crate::square::Square;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquareColor {
    Light,
    Dark,
}

/// Which side sits at the bottom of the rendered board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Perspective {
    #[default]
    White,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellDescriptor {
    pub square: Square,
    pub piece: Option<Piece>,
    pub color: SquareColor,
}

/// Projects a snapshot onto 64 cells in screen order: top row first,
/// left to right. From white's side that is a8..h8 down to a1..h1.
pub fn project<E: RulesEngine>(
    engine: &E,
    snapshot: &E::Snapshot,
    perspective: Perspective,
) -> Vec<CellDescriptor> {
    let mut cells = Vec::with_capacity(Square::COUNT);
    for row in 0..8u8 {
        for column in 0..8u8 {
            let (file, rank) = match perspective {
                Perspective::White => (column, 7 - row),
                Perspective::Black => (7 - column, row),
            };
            if let Some(square) = Square::new(file, rank) {
                cells.push(CellDescriptor {
                    square,
                    piece: engine.piece_at(snapshot, square),
                    color: if square.is_light() { SquareColor::Light } else { SquareColor::Dark },
                });
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{PieceKind, Side};
    use crate::rules::StandardRules;

    #[test]
    fn white_perspective_starts_at_a8() {
        let rules = StandardRules::new();
        let cells = project(&rules, &rules.initial_snapshot(), Perspective::White);
        assert_eq!(cells.len(), 64);
        assert_eq!(cells[0].square.to_string(), "a8");
        assert_eq!(cells[0].color, SquareColor::Light);
        assert_eq!(cells[0].piece, Some(Piece::new(PieceKind::Rook, Side::Black)));
        assert_eq!(cells[63].square.to_string(), "h1");
        assert_eq!(cells[63].color, SquareColor::Light);
        assert_eq!(cells[56].square.to_string(), "a1");
        assert_eq!(cells[56].color, SquareColor::Dark);
        assert_eq!(cells.iter().filter(|cell| cell.piece.is_some()).count(), 32);
    }

    #[test]
    fn black_perspective_starts_at_h1() {
        let rules = StandardRules::new();
        let cells = project(&rules, &rules.initial_snapshot(), Perspective::Black);
        assert_eq!(cells[0].square.to_string(), "h1");
        assert_eq!(cells[63].square.to_string(), "a8");
    }

    #[test]
    fn every_square_appears_once() {
        let rules = StandardRules::new();
        let mut squares: Vec<Square> = project(&rules, &rules.initial_snapshot(), Perspective::White)
            .iter()
            .map(|cell| cell.square)
            .collect();
        squares.sort();
        squares.dedup();
        assert_eq!(squares.len(), 64);
    }
}
