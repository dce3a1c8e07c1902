//! Bishop pair: a flat bonus for owning both bishops, since two bishops
//! cover both square colors and tend to be stronger than bishop+knight or
//! two knights in the endgame.

use crate::chess::core::{Color, PieceKind};
use crate::chess::position::Position;

const BISHOP_PAIR_BONUS: i32 = 30;

fn has_pair(position: &Position, color: Color) -> bool {
    position.pieces(color, PieceKind::Bishop).pop_count() >= 2
}

/// White's bishop-pair bonus minus black's, in centipawns.
#[must_use]
pub fn bishop_pair_score(position: &Position) -> i32 {
    let mut score = 0;
    if has_pair(position, Color::White) {
        score += BISHOP_PAIR_BONUS;
    }
    if has_pair(position, Color::Black) {
        score -= BISHOP_PAIR_BONUS;
    }
    score
}
