//! Attack-set generation: precomputed knight/king/pawn tables plus ray-walked
//! sliding attacks for bishops, rooks and queens.
//!
//! Sliding attacks are computed by walking each relevant direction one square
//! at a time and stopping at the first occupied square (inclusive, so the
//! blocker itself is part of the attack set — it may be a capture). This is
//! the ray-walking strategy the design notes call out explicitly, as opposed
//! to a magic-bitboard/PEXT lookup table: it is slower per query but there is
//! exactly one code path for "where can a slider attack from here", shared by
//! move generation and [`super::position::Position::is_square_attacked`], so
//! the two can never disagree the way the reference implementation's split
//! query/movegen logic once did (see DESIGN.md).

use lazy_static::lazy_static;

use super::bitboard::Bitboard;
use super::core::{Color, Square};

type Direction = (i8, i8);

const BISHOP_DIRECTIONS: [Direction; 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ROOK_DIRECTIONS: [Direction; 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const KNIGHT_OFFSETS: [Direction; 8] =
    [(1, 2), (2, 1), (2, -1), (1, -2), (-1, -2), (-2, -1), (-2, 1), (-1, 2)];
const KING_OFFSETS: [Direction; 8] =
    [(1, 0), (1, 1), (0, 1), (-1, 1), (-1, 0), (-1, -1), (0, -1), (1, -1)];

fn leaper_attacks(square: Square, offsets: &[Direction]) -> Bitboard {
    offsets
        .iter()
        .filter_map(|&(df, dr)| square.shifted(df, dr))
        .fold(Bitboard::EMPTY, |acc, s| acc | Bitboard::from_square(s))
}

fn pawn_attack_set(square: Square, color: Color) -> Bitboard {
    let forward = match color {
        Color::White => 1,
        Color::Black => -1,
    };
    leaper_attacks(square, &[(1, forward), (-1, forward)])
}

lazy_static! {
    static ref KNIGHT_ATTACKS: [Bitboard; 64] = {
        let mut table = [Bitboard::EMPTY; 64];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = leaper_attacks(Square::from_index(i as u8), &KNIGHT_OFFSETS);
        }
        table
    };
    static ref KING_ATTACKS: [Bitboard; 64] = {
        let mut table = [Bitboard::EMPTY; 64];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = leaper_attacks(Square::from_index(i as u8), &KING_OFFSETS);
        }
        table
    };
    static ref PAWN_ATTACKS: [[Bitboard; 64]; 2] = {
        let mut table = [[Bitboard::EMPTY; 64]; 2];
        for color in [Color::White, Color::Black] {
            for i in 0..64u8 {
                table[color.index()][i as usize] =
                    pawn_attack_set(Square::from_index(i), color);
            }
        }
        table
    };
}

#[must_use]
pub fn knight_attacks(square: Square) -> Bitboard {
    KNIGHT_ATTACKS[square.index() as usize]
}

#[must_use]
pub fn king_attacks(square: Square) -> Bitboard {
    KING_ATTACKS[square.index() as usize]
}

#[must_use]
pub fn pawn_attacks(color: Color, square: Square) -> Bitboard {
    PAWN_ATTACKS[color.index()][square.index() as usize]
}

fn ray_attacks(square: Square, directions: &[Direction], occupied: Bitboard) -> Bitboard {
    let mut attacks = Bitboard::EMPTY;
    for &(df, dr) in directions {
        let mut current = square;
        while let Some(next) = current.shifted(df, dr) {
            attacks |= Bitboard::from_square(next);
            if occupied.is_set(next) {
                break;
            }
            current = next;
        }
    }
    attacks
}

#[must_use]
pub fn bishop_attacks(square: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(square, &BISHOP_DIRECTIONS, occupied)
}

#[must_use]
pub fn rook_attacks(square: Square, occupied: Bitboard) -> Bitboard {
    ray_attacks(square, &ROOK_DIRECTIONS, occupied)
}

#[must_use]
pub fn queen_attacks(square: Square, occupied: Bitboard) -> Bitboard {
    bishop_attacks(square, occupied) | rook_attacks(square, occupied)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn knight_from_corner() {
        let attacks = knight_attacks(Square::A1);
        assert_eq!(attacks.pop_count(), 2);
        assert!(attacks.is_set(Square::B3));
        assert!(attacks.is_set(Square::C2));
    }

    #[test]
    fn king_from_center() {
        assert_eq!(king_attacks(Square::E4).pop_count(), 8);
    }

    #[test]
    fn pawn_attacks_direction() {
        let white = pawn_attacks(Color::White, Square::E4);
        assert!(white.is_set(Square::D5));
        assert!(white.is_set(Square::F5));
        let black = pawn_attacks(Color::Black, Square::E4);
        assert!(black.is_set(Square::D3));
        assert!(black.is_set(Square::F3));
    }

    #[test]
    fn rook_attacks_stop_at_blocker() {
        let occupied = Bitboard::from_squares(&[Square::E6]);
        let attacks = rook_attacks(Square::E4, occupied);
        assert!(attacks.is_set(Square::E5));
        assert!(attacks.is_set(Square::E6));
        assert!(!attacks.is_set(Square::E7));
        assert!(attacks.is_set(Square::A4));
        assert!(attacks.is_set(Square::H4));
    }

    #[test]
    fn bishop_attacks_empty_board() {
        let attacks = bishop_attacks(Square::D4, Bitboard::EMPTY);
        assert!(attacks.is_set(Square::A1));
        assert!(attacks.is_set(Square::H8));
        assert!(attacks.is_set(Square::A7));
        assert!(attacks.is_set(Square::G1));
    }
}
