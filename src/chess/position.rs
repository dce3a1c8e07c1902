//! [`Position`] is the board representation: twelve piece bitboards, side to
//! move, castling rights, en-passant square and the two rule counters. FEN
//! parsing/emission, [`Position::make_move`] and attack queries live here;
//! move *generation* (which moves are available) lives in
//! [`super::movegen`].

use std::fmt;

use anyhow::{bail, Context};

use super::attacks;
use super::bitboard::Bitboard;
use super::core::{CastlingRights, Color, Piece, PieceKind, Square, BOARD_SIZE};
use super::moves::{Move, UciMove};
use super::{movegen, zobrist};

/// The board representation the rest of the engine operates on: twelve
/// piece bitboards plus the state needed to know whose move it is and what
/// is still legal (castling rights, en-passant target, rule counters).
///
/// Invariants upheld by construction and by every [`Position::make_move`]:
/// the twelve piece bitboards are pairwise disjoint (I1), the per-color
/// occupancy bitboards are exactly the union of that color's six piece
/// bitboards (I2), each side has exactly one king while a game is in
/// progress (I3), and castling rights only ever shrink (I4).
#[derive(Clone, PartialEq, Eq)]
pub struct Position {
    pieces: [[Bitboard; 6]; 2],
    occupied_by: [Bitboard; 2],
    side_to_move: Color,
    /// The square a pawn jumped over on its last double push, if any. Using
    /// `Option` instead of a sentinel square avoids the reference
    /// implementation's defect of overloading a1 as "no en passant" (§9).
    en_passant: Option<Square>,
    castling_rights: CastlingRights,
    halfmove_clock: u8,
    fullmove_number: u16,
    hash: zobrist::Key,
}

impl Position {
    /// The standard chess starting position.
    #[must_use]
    pub fn starting() -> Self {
        Self::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1")
            .expect("the starting position FEN is well-formed")
    }

    #[must_use]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[must_use]
    pub fn castling_rights(&self) -> CastlingRights {
        self.castling_rights
    }

    #[must_use]
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    #[must_use]
    pub fn halfmove_clock(&self) -> u8 {
        self.halfmove_clock
    }

    #[must_use]
    pub fn fullmove_number(&self) -> u16 {
        self.fullmove_number
    }

    #[must_use]
    pub fn hash(&self) -> zobrist::Key {
        self.hash
    }

    /// The bitboard of `kind` pieces belonging to `color`.
    #[must_use]
    pub(crate) fn pieces(&self, color: Color, kind: PieceKind) -> Bitboard {
        self.pieces[color.index()][kind.index()]
    }

    /// All squares occupied by `color`'s pieces.
    #[must_use]
    pub fn occupancy(&self, color: Color) -> Bitboard {
        self.occupied_by[color.index()]
    }

    /// All occupied squares, either color (I2: the union of every piece
    /// bitboard).
    #[must_use]
    pub fn occupied(&self) -> Bitboard {
        self.occupied_by[0] | self.occupied_by[1]
    }

    /// All unoccupied squares.
    #[must_use]
    pub fn empty(&self) -> Bitboard {
        !self.occupied()
    }

    #[must_use]
    pub fn piece_on(&self, square: Square) -> Option<Piece> {
        for color in [Color::White, Color::Black] {
            for kind in PieceKind::ALL {
                if self.pieces[color.index()][kind.index()].is_set(square) {
                    return Some(Piece::new(color, kind));
                }
            }
        }
        None
    }

    #[must_use]
    pub fn king_square(&self, color: Color) -> Square {
        self.pieces(color, PieceKind::King)
            .lsb()
            .expect("every in-progress position has exactly one king per side (I3)")
    }

    /// The set of `by_color` squares that attack `square`: pawns, knights,
    /// king and sliding pieces alike. This is the single attack query shared
    /// by legality checking and by castling-safety checks, so there is no
    /// way for it to disagree with move generation about what attacks what
    /// (the defect called out in the design notes: the reference
    /// implementation's `is_square_attacked` omitted sliding pieces
    /// entirely).
    #[must_use]
    pub fn attackers_to(&self, square: Square, by_color: Color) -> Bitboard {
        let occupied = self.occupied();
        let mut attackers = Bitboard::EMPTY;
        // A pawn attacks `square` iff `square` is in the attack set of a
        // pawn standing there for the *opposite* color, i.e. we look up our
        // own attack pattern from `square` and intersect with the actual
        // pawns.
        attackers |=
            attacks::pawn_attacks(by_color.opposite(), square) & self.pieces(by_color, PieceKind::Pawn);
        attackers |= attacks::knight_attacks(square) & self.pieces(by_color, PieceKind::Knight);
        attackers |= attacks::king_attacks(square) & self.pieces(by_color, PieceKind::King);
        let diagonal_attackers =
            self.pieces(by_color, PieceKind::Bishop) | self.pieces(by_color, PieceKind::Queen);
        attackers |= attacks::bishop_attacks(square, occupied) & diagonal_attackers;
        let orthogonal_attackers =
            self.pieces(by_color, PieceKind::Rook) | self.pieces(by_color, PieceKind::Queen);
        attackers |= attacks::rook_attacks(square, occupied) & orthogonal_attackers;
        attackers
    }

    #[must_use]
    pub fn is_square_attacked(&self, square: Square, by_color: Color) -> bool {
        !self.attackers_to(square, by_color).is_empty()
    }

    /// Whether the side to move's king is currently attacked.
    #[must_use]
    pub fn is_check(&self) -> bool {
        self.is_square_attacked(self.king_square(self.side_to_move), self.side_to_move.opposite())
    }

    /// Finds the legal move matching a parsed UCI from/to/promotion triple,
    /// or `None` if no legal move matches. The wire format does not encode
    /// whether a move is a capture, a double push or a castle, so recovering
    /// the real [`Move`] (with its flag) means matching against the actual
    /// legal move list rather than trusting the input — per the error
    /// handling design, an unmatched string is simply rejected rather than
    /// corrupting the board.
    #[must_use]
    pub fn find_legal_move(&self, candidate: UciMove) -> Option<Move> {
        movegen::generate_legal_moves(self)
            .into_iter()
            .find(|m| m.from() == candidate.from && m.to() == candidate.to && m.promotion() == candidate.promotion)
    }

    /// Mutates `self` in place to reflect playing `mv`. The caller is
    /// responsible for ensuring `mv` is legal in the current position;
    /// rollback (where needed, e.g. in search) is done by copying the
    /// position before calling this rather than by an `undo_move` (§9: this
    /// is an intentional simplification, not an oversight).
    pub fn make_move(&mut self, mv: Move) {
        let mover = self.side_to_move;
        let opponent = mover.opposite();
        let from = mv.from();
        let to = mv.to();

        let moved_kind = PieceKind::ALL
            .into_iter()
            .find(|&kind| self.pieces[mover.index()][kind.index()].is_set(from))
            .expect("make_move is only called with a move whose origin holds the mover's piece");

        self.pieces[mover.index()][moved_kind.index()].clear(from);

        let is_pawn_move = moved_kind == PieceKind::Pawn;
        let mut is_capture = false;

        if mv.is_en_passant() {
            is_capture = true;
            let captured_square = Square::new(to.file(), from.rank());
            self.pieces[opponent.index()][PieceKind::Pawn.index()].clear(captured_square);
        } else if mv.is_capture() {
            is_capture = true;
            let captured_kind = PieceKind::ALL
                .into_iter()
                .find(|&kind| self.pieces[opponent.index()][kind.index()].is_set(to))
                .expect("a capture move's destination holds an opponent piece");
            self.pieces[opponent.index()][captured_kind.index()].clear(to);
            if captured_kind == PieceKind::Rook {
                if let Some(side) = CastlingRights::side_for_rook_square(opponent, to) {
                    self.castling_rights -= side;
                }
            }
        }

        let placed_kind = mv.promotion().unwrap_or(moved_kind);
        self.pieces[mover.index()][placed_kind.index()].set(to);

        if mv.is_king_castle() || mv.is_queen_castle() {
            let rank = from.rank();
            let (rook_from, rook_to) = if mv.is_king_castle() {
                (Square::new(7, rank), Square::new(5, rank))
            } else {
                (Square::new(0, rank), Square::new(3, rank))
            };
            self.pieces[mover.index()][PieceKind::Rook.index()].clear(rook_from);
            self.pieces[mover.index()][PieceKind::Rook.index()].set(rook_to);
        }

        self.recompute_occupancy();

        self.en_passant = mv.is_double_pawn_push().then(|| {
            Square::new(from.file(), (from.rank() + to.rank()) / 2)
        });

        if moved_kind == PieceKind::King {
            self.castling_rights -= CastlingRights::both(mover);
        } else if moved_kind == PieceKind::Rook {
            if let Some(side) = CastlingRights::side_for_rook_square(mover, from) {
                self.castling_rights -= side;
            }
        }

        self.halfmove_clock = if is_pawn_move || is_capture { 0 } else { self.halfmove_clock + 1 };
        if mover == Color::Black {
            self.fullmove_number += 1;
        }

        self.side_to_move = opponent;
        self.hash = zobrist::hash(self);
    }

    /// Plays the "null move": passes the turn without moving a piece. Used
    /// only by null-move pruning in search, never reachable from a real
    /// position/move pair.
    #[must_use]
    pub fn make_null_move(&self) -> Self {
        let mut next = self.clone();
        next.en_passant = None;
        next.side_to_move = self.side_to_move.opposite();
        next.halfmove_clock += 1;
        next.hash = zobrist::hash(&next);
        next
    }

    fn recompute_occupancy(&mut self) {
        for color in [Color::White, Color::Black] {
            self.occupied_by[color.index()] =
                PieceKind::ALL.iter().fold(Bitboard::EMPTY, |acc, &kind| acc | self.pieces[color.index()][kind.index()]);
        }
    }

    /// Structural sanity check applied to freshly parsed FEN, per the error
    /// handling design: malformed external input is rejected at the
    /// boundary rather than producing a `Position` that silently violates
    /// the invariants in the data model.
    fn validate(&self) -> anyhow::Result<()> {
        for color in [Color::White, Color::Black] {
            let kings = self.pieces(color, PieceKind::King).pop_count();
            if kings != 1 {
                bail!("{color:?} has {kings} kings, expected exactly 1");
            }
            let pawns = self.pieces(color, PieceKind::Pawn).pop_count();
            if pawns > 8 {
                bail!("{color:?} has {pawns} pawns, expected at most 8");
            }
            let back_ranks = Bitboard::from_squares(
                &(0..8)
                    .flat_map(|file| [Square::new(file, 0), Square::new(file, 7)])
                    .collect::<Vec<_>>(),
            );
            if !(self.pieces(color, PieceKind::Pawn) & back_ranks).is_empty() {
                bail!("{color:?} has a pawn on the first or last rank");
            }
        }

        let attackers_of_mover = self.attackers_to(self.king_square(self.side_to_move), self.side_to_move.opposite());
        if attackers_of_mover.pop_count() > 2 {
            bail!("the side to move's king is attacked by more than two pieces simultaneously");
        }

        if let Some(ep) = self.en_passant {
            let pusher = self.side_to_move.opposite();
            let (expected_ep_rank, pushed_pawn_rank) = match pusher {
                Color::White => (2, 3),
                Color::Black => (5, 4),
            };
            if ep.rank() != expected_ep_rank {
                bail!("en passant square {ep} is not on the expected rank for {pusher:?}");
            }
            let pushed_pawn = Square::new(ep.file(), pushed_pawn_rank);
            if !self.pieces(pusher, PieceKind::Pawn).is_set(pushed_pawn) {
                bail!("en passant square {ep} does not correspond to a just-pushed pawn");
            }
        }

        for side in [CastlingRights::WHITE_KINGSIDE, CastlingRights::WHITE_QUEENSIDE, CastlingRights::BLACK_KINGSIDE, CastlingRights::BLACK_QUEENSIDE] {
            if !self.castling_rights.contains(side) {
                continue;
            }
            let color = if side.intersects(CastlingRights::both(Color::White)) { Color::White } else { Color::Black };
            if self.king_square(color) != Square::king_home(color) {
                bail!("castling right {side:?} is set but the king is not on its home square");
            }
            let rook_square = CastlingRights::rook_square_for_side(color, side);
            if !self.pieces(color, PieceKind::Rook).is_set(rook_square) {
                bail!("castling right {side:?} is set but there is no rook on {rook_square}");
            }
        }

        Ok(())
    }

    /// Parses a FEN or four-field EPD string (optionally prefixed with
    /// `fen `/`epd `), defaulting a missing halfmove clock/fullmove number
    /// to `0 1` when only the first four fields are present.
    pub fn from_fen(input: &str) -> anyhow::Result<Self> {
        let input = input.trim();
        let input = input.strip_prefix("fen ").or_else(|| input.strip_prefix("epd ")).unwrap_or(input);

        let fields: Vec<&str> = input.split_whitespace().collect();
        if fields.len() != 4 && fields.len() != 6 {
            bail!("expected 4 (EPD) or 6 (FEN) space-separated fields, got {}", fields.len());
        }

        let mut pieces = [[Bitboard::EMPTY; 6]; 2];
        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            bail!("piece placement must have 8 ranks separated by '/', got {}", ranks.len());
        }
        for (rank_from_top, rank_str) in ranks.iter().enumerate() {
            let rank = 7 - u8::try_from(rank_from_top).expect("rank index fits in u8");
            let mut file = 0u8;
            for symbol in rank_str.chars() {
                if let Some(empty_run) = symbol.to_digit(10) {
                    file += u8::try_from(empty_run).context("empty-run digit out of range")?;
                    continue;
                }
                if file >= 8 {
                    bail!("rank {rank_str} overflows the board width");
                }
                let piece = Piece::from_symbol(symbol).with_context(|| format!("unrecognized piece symbol {symbol}"))?;
                pieces[piece.color.index()][piece.kind.index()].set(Square::new(file, rank));
                file += 1;
            }
            if file != 8 {
                bail!("rank {rank_str} does not cover all 8 files");
            }
        }

        let side_to_move = Color::try_from(fields[1]).context("parsing side to move")?;
        let castling_rights = CastlingRights::try_from(fields[2]).context("parsing castling rights")?;
        let en_passant = match fields[3] {
            "-" => None,
            square => Some(Square::try_from(square).context("parsing en passant square")?),
        };
        let (halfmove_clock, fullmove_number) = if fields.len() == 6 {
            (
                fields[4].parse::<u8>().context("parsing halfmove clock")?,
                fields[5].parse::<u16>().context("parsing fullmove number")?,
            )
        } else {
            (0, 1)
        };

        let mut occupied_by = [Bitboard::EMPTY; 2];
        for color in [Color::White, Color::Black] {
            occupied_by[color.index()] =
                PieceKind::ALL.iter().fold(Bitboard::EMPTY, |acc, &kind| acc | pieces[color.index()][kind.index()]);
        }

        let mut position = Self {
            pieces,
            occupied_by,
            side_to_move,
            en_passant,
            castling_rights,
            halfmove_clock,
            fullmove_number,
            hash: 0,
        };
        position.hash = zobrist::hash(&position);
        position.validate().context("position failed structural validation")?;
        Ok(position)
    }

    #[must_use]
    pub fn to_fen(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            let mut empty_run = 0u8;
            for file in 0..8 {
                match self.piece_on(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty_run > 0 {
                            write!(f, "{empty_run}")?;
                            empty_run = 0;
                        }
                        write!(f, "{}", piece.symbol())?;
                    },
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                write!(f, "{empty_run}")?;
            }
            if rank > 0 {
                write!(f, "/")?;
            }
        }
        write!(f, " {} {}", self.side_to_move, self.castling_rights)?;
        match self.en_passant {
            Some(square) => write!(f, " {square}")?,
            None => write!(f, " -")?,
        }
        write!(f, " {} {}", self.halfmove_clock, self.fullmove_number)
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Position({self})")
    }
}

impl TryFrom<&str> for Position {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_fen(value)
    }
}

const _: () = assert!(BOARD_SIZE == 64);

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::super::moves::MoveFlag;
    use super::*;

    #[test]
    fn starting_position_fen_roundtrip() {
        let position = Position::starting();
        assert_eq!(position.to_fen(), "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1");
    }

    #[test]
    fn epd_form_defaults_clocks() {
        let position = Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq -").unwrap();
        assert_eq!(position.halfmove_clock(), 0);
        assert_eq!(position.fullmove_number(), 1);
    }

    #[test]
    fn rejects_missing_king() {
        assert!(Position::from_fen("8/8/8/8/8/8/8/K7 w - - 0 1").is_err());
    }

    #[test]
    fn rejects_malformed_rank() {
        assert!(Position::from_fen("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKB w KQkq - 0 1").is_err());
    }

    #[test]
    fn make_move_double_push_sets_en_passant() {
        let mut position = Position::starting();
        let mv = Move::new(Square::E2, Square::E4, MoveFlag::DoublePawnPush);
        position.make_move(mv);
        assert_eq!(position.en_passant(), Some(Square::E3));
        assert_eq!(position.side_to_move(), Color::Black);
    }

    #[test]
    fn make_move_quiet_clears_en_passant() {
        let mut position = Position::starting();
        position.make_move(Move::new(Square::E2, Square::E4, MoveFlag::DoublePawnPush));
        position.make_move(Move::new(Square::B8, Square::C6, MoveFlag::Quiet));
        assert_eq!(position.en_passant(), None);
    }

    #[test]
    fn en_passant_capture_removes_pawn() {
        // 1. e4 a6 2. e5 d5, then exd6 e.p.
        let mut position = Position::starting();
        position.make_move(Move::new(Square::E2, Square::E4, MoveFlag::DoublePawnPush));
        position.make_move(Move::new(Square::A7, Square::A6, MoveFlag::Quiet));
        position.make_move(Move::new(Square::E4, Square::E5, MoveFlag::Quiet));
        position.make_move(Move::new(Square::D7, Square::D5, MoveFlag::DoublePawnPush));
        assert_eq!(position.en_passant(), Some(Square::D6));
        position.make_move(Move::new(Square::E5, Square::D6, MoveFlag::EnPassant));
        assert!(position.piece_on(Square::D5).is_none());
        assert_eq!(position.piece_on(Square::D6), Some(Piece::new(Color::White, PieceKind::Pawn)));
    }

    #[test]
    fn king_move_clears_both_castling_rights() {
        let mut position = Position::starting();
        position.make_move(Move::new(Square::E2, Square::E4, MoveFlag::DoublePawnPush));
        position.make_move(Move::new(Square::E7, Square::E5, MoveFlag::DoublePawnPush));
        position.make_move(Move::new(Square::E1, Square::E2, MoveFlag::Quiet));
        assert!(!position.castling_rights().contains(CastlingRights::WHITE_KINGSIDE));
        assert!(!position.castling_rights().contains(CastlingRights::WHITE_QUEENSIDE));
        assert!(position.to_fen().contains("kq"));
        assert!(!position.to_fen().contains('K'));
        assert!(!position.to_fen().contains('Q'));
    }

    #[test]
    fn castling_moves_the_rook() {
        let mut position = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        position.make_move(Move::new(Square::E1, Square::G1, MoveFlag::KingCastle));
        assert_eq!(position.piece_on(Square::F1), Some(Piece::new(Color::White, PieceKind::Rook)));
        assert_eq!(position.piece_on(Square::G1), Some(Piece::new(Color::White, PieceKind::King)));
        assert!(position.piece_on(Square::H1).is_none());
    }

    #[test]
    fn is_check_detects_sliding_attacker() {
        let position = Position::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        assert!(!position.is_check());
        let check_position = Position::from_fen("R5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1").unwrap();
        assert!(check_position.is_check());
    }

    #[test]
    fn halfmove_clock_resets_on_pawn_move_and_capture() {
        let mut position = Position::starting();
        position.make_move(Move::new(Square::G1, Square::F3, MoveFlag::Quiet));
        assert_eq!(position.halfmove_clock(), 1);
        position.make_move(Move::new(Square::G8, Square::F6, MoveFlag::Quiet));
        assert_eq!(position.halfmove_clock(), 2);
        position.make_move(Move::new(Square::E2, Square::E4, MoveFlag::DoublePawnPush));
        assert_eq!(position.halfmove_clock(), 0);
    }
}
