//! Fundamental chess types: [`Color`], [`PieceKind`], [`Piece`] and
//! [`Square`]. These carry no board state of their own; [`crate::chess::position`]
//! builds on top of them.

use std::fmt;

use anyhow::{bail, Context};
use bitflags::bitflags;

/// Number of squares on the board.
pub const BOARD_SIZE: u8 = 64;

/// Which side is to move or owns a piece. Side-a ("white") pushes pawns
/// towards higher ranks; side-b ("black") towards lower ranks.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }

    /// Index into `[T; 2]` arrays keyed by color.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::White => "w",
            Self::Black => "b",
        })
    }
}

impl TryFrom<&str> for Color {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "w" => Ok(Self::White),
            "b" => Ok(Self::Black),
            other => bail!("expected side to move to be 'w' or 'b', got {other}"),
        }
    }
}

/// One of the six kinds of chess piece, independent of color.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [Self; 6] = [
        Self::Pawn,
        Self::Knight,
        Self::Bishop,
        Self::Rook,
        Self::Queen,
        Self::King,
    ];

    /// Index into `[T; 6]` arrays keyed by piece kind.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Pawn => 0,
            Self::Knight => 1,
            Self::Bishop => 2,
            Self::Rook => 3,
            Self::Queen => 4,
            Self::King => 5,
        }
    }

    /// Algebraic letter, uppercase (side is applied by the caller).
    #[must_use]
    pub const fn letter(self) -> char {
        match self {
            Self::Pawn => 'P',
            Self::Knight => 'N',
            Self::Bishop => 'B',
            Self::Rook => 'R',
            Self::Queen => 'Q',
            Self::King => 'K',
        }
    }

    #[must_use]
    pub const fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'P' => Some(Self::Pawn),
            'N' => Some(Self::Knight),
            'B' => Some(Self::Bishop),
            'R' => Some(Self::Rook),
            'Q' => Some(Self::Queen),
            'K' => Some(Self::King),
            _ => None,
        }
    }

    /// The four kinds a pawn may promote to, in the order the spec's move
    /// flag encoding assigns them (knight=0, bishop=1, rook=2, queen=3).
    pub const PROMOTION_KINDS: [Self; 4] = [Self::Knight, Self::Bishop, Self::Rook, Self::Queen];

    #[must_use]
    pub const fn promotion_index(self) -> Option<u16> {
        match self {
            Self::Knight => Some(0),
            Self::Bishop => Some(1),
            Self::Rook => Some(2),
            Self::Queen => Some(3),
            _ => None,
        }
    }
}

/// A piece and its owner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    #[must_use]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    /// Algebraic symbol: uppercase for white, lowercase for black.
    #[must_use]
    pub fn symbol(self) -> char {
        match self.color {
            Color::White => self.kind.letter(),
            Color::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }

    #[must_use]
    pub fn from_symbol(symbol: char) -> Option<Self> {
        let kind = PieceKind::from_letter(symbol)?;
        let color = if symbol.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        Some(Self::new(color, kind))
    }
}

/// A square, 0..=63, `index == rank * 8 + file`. File 0 is the `a`-file,
/// rank 0 is white's home rank.
///
/// Kept as a newtype around `u8` rather than a 64-variant enum: the spec
/// only requires squares to behave as small integers with file/rank
/// decomposition and algebraic formatting, and a newtype gets that without
/// resorting to `unsafe` transmutes to construct one of 64 enum variants.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Square(u8);

impl Square {
    #[must_use]
    pub const fn new(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8);
        Self(rank * 8 + file)
    }

    #[must_use]
    pub const fn from_index(index: u8) -> Self {
        debug_assert!(index < BOARD_SIZE);
        Self(index)
    }

    #[must_use]
    pub const fn try_from_index(index: u8) -> Option<Self> {
        if index < BOARD_SIZE {
            Some(Self(index))
        } else {
            None
        }
    }

    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn file(self) -> u8 {
        self.0 % 8
    }

    #[must_use]
    pub const fn rank(self) -> u8 {
        self.0 / 8
    }

    /// The square directly "behind" this one for `color`, i.e. one rank
    /// towards that color's own home rank. Used to find the pawn captured
    /// en passant.
    #[must_use]
    pub fn behind(self, color: Color) -> Option<Self> {
        match color {
            Color::White => self.shifted(0, -1),
            Color::Black => self.shifted(0, 1),
        }
    }

    /// Shift by `(df, dr)` files/ranks, returning `None` on going off-board.
    #[must_use]
    pub fn shifted(self, df: i8, dr: i8) -> Option<Self> {
        let file = i8::try_from(self.file()).ok()? + df;
        let rank = i8::try_from(self.rank()).ok()? + dr;
        if (0..8).contains(&file) && (0..8).contains(&rank) {
            #[allow(clippy::cast_sign_loss)]
            Some(Self::new(file as u8, rank as u8))
        } else {
            None
        }
    }

    pub const A1: Self = Self::new(0, 0);
    pub const B1: Self = Self::new(1, 0);
    pub const C1: Self = Self::new(2, 0);
    pub const D1: Self = Self::new(3, 0);
    pub const E1: Self = Self::new(4, 0);
    pub const F1: Self = Self::new(5, 0);
    pub const G1: Self = Self::new(6, 0);
    pub const H1: Self = Self::new(7, 0);
    pub const A2: Self = Self::new(0, 1);
    pub const B2: Self = Self::new(1, 1);
    pub const C2: Self = Self::new(2, 1);
    pub const D2: Self = Self::new(3, 1);
    pub const E2: Self = Self::new(4, 1);
    pub const F2: Self = Self::new(5, 1);
    pub const G2: Self = Self::new(6, 1);
    pub const H2: Self = Self::new(7, 1);
    pub const A3: Self = Self::new(0, 2);
    pub const B3: Self = Self::new(1, 2);
    pub const C3: Self = Self::new(2, 2);
    pub const D3: Self = Self::new(3, 2);
    pub const E3: Self = Self::new(4, 2);
    pub const F3: Self = Self::new(5, 2);
    pub const G3: Self = Self::new(6, 2);
    pub const H3: Self = Self::new(7, 2);
    pub const A4: Self = Self::new(0, 3);
    pub const B4: Self = Self::new(1, 3);
    pub const C4: Self = Self::new(2, 3);
    pub const D4: Self = Self::new(3, 3);
    pub const E4: Self = Self::new(4, 3);
    pub const F4: Self = Self::new(5, 3);
    pub const G4: Self = Self::new(6, 3);
    pub const H4: Self = Self::new(7, 3);
    pub const A5: Self = Self::new(0, 4);
    pub const B5: Self = Self::new(1, 4);
    pub const C5: Self = Self::new(2, 4);
    pub const D5: Self = Self::new(3, 4);
    pub const E5: Self = Self::new(4, 4);
    pub const F5: Self = Self::new(5, 4);
    pub const G5: Self = Self::new(6, 4);
    pub const H5: Self = Self::new(7, 4);
    pub const A6: Self = Self::new(0, 5);
    pub const B6: Self = Self::new(1, 5);
    pub const C6: Self = Self::new(2, 5);
    pub const D6: Self = Self::new(3, 5);
    pub const E6: Self = Self::new(4, 5);
    pub const F6: Self = Self::new(5, 5);
    pub const G6: Self = Self::new(6, 5);
    pub const H6: Self = Self::new(7, 5);
    pub const A7: Self = Self::new(0, 6);
    pub const B7: Self = Self::new(1, 6);
    pub const C7: Self = Self::new(2, 6);
    pub const D7: Self = Self::new(3, 6);
    pub const E7: Self = Self::new(4, 6);
    pub const F7: Self = Self::new(5, 6);
    pub const G7: Self = Self::new(6, 6);
    pub const H7: Self = Self::new(7, 6);
    pub const A8: Self = Self::new(0, 7);
    pub const B8: Self = Self::new(1, 7);
    pub const C8: Self = Self::new(2, 7);
    pub const D8: Self = Self::new(3, 7);
    pub const E8: Self = Self::new(4, 7);
    pub const F8: Self = Self::new(5, 7);
    pub const G8: Self = Self::new(6, 7);
    pub const H8: Self = Self::new(7, 7);

    /// King's home square for `color`.
    #[must_use]
    pub const fn king_home(color: Color) -> Self {
        match color {
            Color::White => Self::E1,
            Color::Black => Self::E8,
        }
    }

    pub fn iter_all() -> impl Iterator<Item = Self> {
        (0..BOARD_SIZE).map(Self)
    }

    /// Reflects the square across the board's horizontal midline (rank `r`
    /// becomes rank `7-r`). Used to mirror white-perspective piece-square
    /// tables for black.
    #[must_use]
    pub const fn mirror_vertical(self) -> Self {
        Self::new(self.file(), 7 - self.rank())
    }
}

impl fmt::Debug for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file()) as char;
        let rank = (b'1' + self.rank()) as char;
        write!(f, "{file}{rank}")
    }
}

impl TryFrom<&str> for Square {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let bytes = value.as_bytes();
        if bytes.len() != 2 {
            bail!("expected a two-character algebraic square, got {value}");
        }
        let file = bytes[0];
        let rank = bytes[1];
        if !(b'a'..=b'h').contains(&file) {
            bail!("expected file in a..h, got {}", bytes[0] as char);
        }
        if !(b'1'..=b'8').contains(&rank) {
            bail!("expected rank in 1..8, got {}", bytes[1] as char);
        }
        Ok(Self::new(file - b'a', rank - b'1'))
    }
}

bitflags! {
    /// Castling rights still available to either side. Monotone
    /// non-increasing over the course of a game (invariant I4).
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct CastlingRights: u8 {
        const WHITE_KINGSIDE  = 0b0001;
        const WHITE_QUEENSIDE = 0b0010;
        const BLACK_KINGSIDE  = 0b0100;
        const BLACK_QUEENSIDE = 0b1000;
    }
}

impl CastlingRights {
    #[must_use]
    pub const fn kingside(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_KINGSIDE,
            Color::Black => Self::BLACK_KINGSIDE,
        }
    }

    #[must_use]
    pub const fn queenside(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_QUEENSIDE,
            Color::Black => Self::BLACK_QUEENSIDE,
        }
    }

    #[must_use]
    pub const fn both(color: Color) -> Self {
        match color {
            Color::White => Self::WHITE_KINGSIDE.union(Self::WHITE_QUEENSIDE),
            Color::Black => Self::BLACK_KINGSIDE.union(Self::BLACK_QUEENSIDE),
        }
    }

    /// The rook's home square for `color` on the side (kingside/queenside)
    /// named by `side`, which must be exactly one of the four single-bit
    /// flags.
    #[must_use]
    pub const fn rook_square_for_side(color: Color, side: Self) -> Square {
        match (color, side.contains(Self::kingside(color))) {
            (Color::White, true) => Square::H1,
            (Color::White, false) => Square::A1,
            (Color::Black, true) => Square::H8,
            (Color::Black, false) => Square::A8,
        }
    }

    /// Which single-bit castling right (if any) a rook standing on `square`
    /// protects for `color`. Used both to drop a right when that rook moves
    /// and to drop it when the rook is captured on its home square.
    #[must_use]
    pub fn side_for_rook_square(color: Color, square: Square) -> Option<Self> {
        if square == Self::rook_square_for_side(color, Self::kingside(color)) {
            Some(Self::kingside(color))
        } else if square == Self::rook_square_for_side(color, Self::queenside(color)) {
            Some(Self::queenside(color))
        } else {
            None
        }
    }
}

impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("-");
        }
        if self.contains(Self::WHITE_KINGSIDE) {
            f.write_str("K")?;
        }
        if self.contains(Self::WHITE_QUEENSIDE) {
            f.write_str("Q")?;
        }
        if self.contains(Self::BLACK_KINGSIDE) {
            f.write_str("k")?;
        }
        if self.contains(Self::BLACK_QUEENSIDE) {
            f.write_str("q")?;
        }
        Ok(())
    }
}

impl TryFrom<&str> for CastlingRights {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        if value == "-" {
            return Ok(Self::empty());
        }
        let mut rights = Self::empty();
        for c in value.chars() {
            rights |= match c {
                'K' => Self::WHITE_KINGSIDE,
                'Q' => Self::WHITE_QUEENSIDE,
                'k' => Self::BLACK_KINGSIDE,
                'q' => Self::BLACK_QUEENSIDE,
                other => bail!("unexpected castling rights character: {other}"),
            };
        }
        Ok(rights)
    }
}

/// Parses a FEN/long-algebraic piece letter as found in a `position ...
/// moves ...` promotion suffix, e.g. the `q` in `e7e8q`.
pub fn promotion_from_letter(letter: char) -> anyhow::Result<PieceKind> {
    PieceKind::from_letter(letter)
        .filter(|kind| kind.promotion_index().is_some())
        .with_context(|| format!("{letter} is not a valid promotion piece"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn square_roundtrip() {
        for index in 0..BOARD_SIZE {
            let square = Square::from_index(index);
            let algebraic = square.to_string();
            assert_eq!(Square::try_from(algebraic.as_str()).unwrap(), square);
        }
    }

    #[test]
    fn square_display() {
        assert_eq!(Square::new(0, 0).to_string(), "a1");
        assert_eq!(Square::new(7, 7).to_string(), "h8");
        assert_eq!(Square::new(4, 3).to_string(), "e4");
    }

    #[test]
    fn shift_off_board_is_none() {
        assert_eq!(Square::new(0, 0).shifted(-1, 0), None);
        assert_eq!(Square::new(7, 7).shifted(1, 0), None);
        assert_eq!(Square::new(0, 7).shifted(0, 1), None);
        assert_eq!(Square::new(3, 3).shifted(1, 1), Some(Square::new(4, 4)));
    }

    #[test]
    fn castling_rights_fen() {
        assert_eq!(CastlingRights::try_from("KQkq").unwrap(), CastlingRights::all());
        assert_eq!(CastlingRights::try_from("-").unwrap(), CastlingRights::empty());
        assert_eq!(CastlingRights::all().to_string(), "KQkq");
        assert_eq!(CastlingRights::empty().to_string(), "-");
    }

    #[test]
    fn piece_symbol() {
        assert_eq!(Piece::new(Color::White, PieceKind::Knight).symbol(), 'N');
        assert_eq!(Piece::new(Color::Black, PieceKind::Knight).symbol(), 'n');
        assert_eq!(Piece::from_symbol('q'), Some(Piece::new(Color::Black, PieceKind::Queen)));
    }
}
