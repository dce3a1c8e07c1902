//! King safety: a rough, piece-square-independent signal on top of the king
//! piece-square table — penalize a king wandering into the center of the
//! board, reward one still tucked behind a castled rook.

use crate::chess::core::{Color, Square};
use crate::chess::position::Position;

const WEIGHT: i32 = 20;

fn in_center(square: Square) -> bool {
    (2..=5).contains(&square.file()) && (2..=5).contains(&square.rank())
}

fn on_castled_square(square: Square, color: Color) -> bool {
    let home_rank = match color {
        Color::White => 0,
        Color::Black => 7,
    };
    square.rank() == home_rank && (square.file() == 2 || square.file() == 6)
}

fn contribution(position: &Position, color: Color) -> i32 {
    let king_square = position.king_square(color);
    let mut score = 0;
    if in_center(king_square) {
        score -= WEIGHT;
    }
    if on_castled_square(king_square, color) {
        score += WEIGHT;
    }
    score
}

/// White's king-safety score minus black's, in centipawns.
#[must_use]
pub fn king_safety_score(position: &Position) -> i32 {
    contribution(position, Color::White) - contribution(position, Color::Black)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn starting_position_is_symmetric() {
        assert_eq!(king_safety_score(&Position::starting()), 0);
    }

    #[test]
    fn castled_king_scores_higher_than_centralized_king() {
        let castled = Position::from_fen("4k3/8/8/8/8/8/8/5RK1 w - - 0 1").unwrap();
        let centralized = Position::from_fen("4k3/8/8/8/4K3/8/8/8 w - - 0 1").unwrap();
        assert!(king_safety_score(&castled) > king_safety_score(&centralized));
    }
}
