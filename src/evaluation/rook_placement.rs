//! Rook placement: rooks are worth more on the seventh rank (from their
//! owner's perspective, since they harass the opponent's pawns and king)
//! and on files with no pawns of either color (open files), where they are
//! unobstructed.

use crate::chess::core::{Color, PieceKind, Square};
use crate::chess::position::Position;

const SEVENTH_RANK_BONUS: i32 = 20;
const OPEN_FILE_BONUS: i32 = 15;

fn seventh_rank(color: Color) -> u8 {
    match color {
        Color::White => 6,
        Color::Black => 1,
    }
}

fn file_has_no_pawns(position: &Position, file: u8) -> bool {
    let on_file = |color: Color| {
        (0..8)
            .map(|rank| Square::new(file, rank))
            .any(|square| position.pieces(color, PieceKind::Pawn).is_set(square))
    };
    !on_file(Color::White) && !on_file(Color::Black)
}

fn contribution(position: &Position, color: Color) -> i32 {
    let mut score = 0;
    for square in position.pieces(color, PieceKind::Rook).iter() {
        if square.rank() == seventh_rank(color) {
            score += SEVENTH_RANK_BONUS;
        }
        if file_has_no_pawns(position, square.file()) {
            score += OPEN_FILE_BONUS;
        }
    }
    score
}

/// White's rook-placement score minus black's, in centipawns.
#[must_use]
pub fn rook_placement_score(position: &Position) -> i32 {
    contribution(position, Color::White) - contribution(position, Color::Black)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn starting_position_is_symmetric() {
        assert_eq!(rook_placement_score(&Position::starting()), 0);
    }

    #[test]
    fn rook_on_seventh_rank_is_rewarded() {
        let position = Position::from_fen("4k3/4R3/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(rook_placement_score(&position) >= SEVENTH_RANK_BONUS);
    }

    #[test]
    fn rook_on_open_file_is_rewarded() {
        let position = Position::from_fen("4k3/pppp1ppp/8/8/8/8/PPPP1PPP/4K1R1 w - - 0 1").unwrap();
        assert_eq!(rook_placement_score(&position), OPEN_FILE_BONUS);
    }
}
