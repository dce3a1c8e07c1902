//! Pawn structure: penalties for doubled and isolated pawns.

use crate::chess::core::{Color, PieceKind};
use crate::chess::position::Position;

const DOUBLED_PAWN_PENALTY: i32 = 15;
const ISOLATED_PAWN_PENALTY: i32 = 15;

fn pawns_per_file(position: &Position, color: Color) -> [u32; 8] {
    let mut counts = [0u32; 8];
    for square in position.pieces(color, PieceKind::Pawn).iter() {
        counts[square.file() as usize] += 1;
    }
    counts
}

fn penalty(position: &Position, color: Color) -> i32 {
    let per_file = pawns_per_file(position, color);
    let mut total = 0;
    for file in 0..8usize {
        let count = per_file[file];
        if count == 0 {
            continue;
        }
        if count > 1 {
            total += DOUBLED_PAWN_PENALTY * i32::try_from(count - 1).expect("pawn count fits in i32");
        }
        let has_left_neighbor = file > 0 && per_file[file - 1] > 0;
        let has_right_neighbor = file < 7 && per_file[file + 1] > 0;
        if !has_left_neighbor && !has_right_neighbor {
            total += ISOLATED_PAWN_PENALTY * i32::try_from(count).expect("pawn count fits in i32");
        }
    }
    total
}

/// White's pawn structure score minus black's, in centipawns (a clean pawn
/// structure scores 0; doubled/isolated pawns are always a penalty).
#[must_use]
pub fn pawn_structure_score(position: &Position) -> i32 {
    penalty(position, Color::Black) - penalty(position, Color::White)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn starting_position_has_no_penalty() {
        assert_eq!(pawn_structure_score(&Position::starting()), 0);
    }

    #[test]
    fn doubled_pawns_are_penalized() {
        let doubled = Position::from_fen("4k3/8/8/8/4P3/8/4P3/4K3 w - - 0 1").unwrap();
        assert!(pawn_structure_score(&doubled) < 0);
    }

    #[test]
    fn isolated_pawn_is_penalized() {
        let position = Position::from_fen("4k3/8/8/8/8/8/P3P3/4K3 w - - 0 1").unwrap();
        assert!(pawn_structure_score(&position) < 0);
    }
}
