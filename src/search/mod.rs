//! Iterative-deepening alpha-beta search over [`Position`]: negamax with a
//! transposition table, null-move pruning, shallow-depth futility/razoring,
//! a captures-only quiescence search and MVV-LVA/history move ordering.
//!
//! The search never mutates a position in place and rolls back; it clones
//! before every [`Position::make_move`], exactly like move-generation
//! legality checking does (see [`crate::chess::movegen`]). That costs more
//! copying than an incremental make/unmake pair but keeps the recursive
//! function trivially safe to reason about, which matters far more for a
//! search this size than the extra `memcpy`s do.

pub mod ordering;
pub mod time_control;
pub mod transposition;

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::chess::core::PieceKind;
use crate::chess::moves::Move;
use crate::chess::movegen::generate_legal_moves;
use crate::chess::position::Position;
use crate::chess::zobrist::Key;
use crate::evaluation::evaluate_relative;

use ordering::{order_moves, HistoryTable};
use time_control::TimeBudget;
use transposition::{Bound, TranspositionTable};

pub type Score = i32;

/// A checkmate score at the root; an actual mate found at ply `p` is
/// reported as `MATE - p`, so deeper mates score lower than shallower ones
/// and the search always prefers the fastest mate available.
pub const MATE: Score = 30_000;
pub const INFINITY: Score = 32_000;
pub const DRAW: Score = 0;

/// How many plies deep null-move pruning reduces the search by.
const NULL_MOVE_REDUCTION: i32 = 3;
const NULL_MOVE_MIN_DEPTH: i32 = 3;

const RAZOR_MAX_DEPTH: i32 = 2;
const RAZOR_MARGIN: Score = 300;

const FUTILITY_MAX_DEPTH: i32 = 3;
const FUTILITY_MARGIN_PER_PLY: Score = 150;

/// How often (in visited nodes) the search polls the clock/stop flag; a
/// system call on every node would dominate the search's own cost.
const STOP_CHECK_INTERVAL: u64 = 2048;

#[must_use]
pub fn mate_in(ply: u32) -> Score {
    MATE - i32::try_from(ply).unwrap_or(i32::MAX)
}

#[must_use]
pub fn mated_in(ply: u32) -> Score {
    -mate_in(ply)
}

/// True for a score at or beyond the magnitude only a forced mate can reach.
#[must_use]
pub fn is_mate_score(score: Score) -> bool {
    score.abs() >= transposition::MATE_THRESHOLD
}

/// Plies to mate (positive if the side to move delivers it, negative if it
/// is delivered against them), for UCI's `info score mate N`.
#[must_use]
pub fn mate_distance(score: Score) -> i32 {
    if score > 0 {
        (MATE - score + 1) / 2
    } else {
        -((MATE + score + 1) / 2)
    }
}

pub struct SearchLimits {
    pub max_depth: u8,
    pub budget: Option<TimeBudget>,
    pub nodes: Option<u64>,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self { max_depth: 64, budget: None, nodes: None }
    }
}

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub best_move: Move,
    pub score: Score,
    pub depth: u8,
    pub nodes: u64,
    pub elapsed: Duration,
    pub pv: Vec<Move>,
}

/// Runs iterative deepening from `position` until `limits` or `stop` says to
/// quit, using and updating `tt` across calls. `game_history` is the
/// sequence of position hashes from the start of the game up to (but not
/// including) `position`'s own hash, used for repetition detection.
#[must_use]
pub fn search(
    position: &Position,
    tt: &mut TranspositionTable,
    limits: &SearchLimits,
    stop: &AtomicBool,
    game_history: &[Key],
) -> SearchResult {
    search_with_progress(position, tt, limits, stop, game_history, |_| {})
}

/// Same as [`search`], but calls `on_depth` with the completed
/// [`SearchResult`] as soon as each iterative-deepening depth finishes,
/// rather than only once at the very end. The UCI layer uses this to emit
/// one `info depth ...` line per completed depth (§6) from a search running
/// on its own thread, instead of just the final depth's.
#[must_use]
pub fn search_with_progress(
    position: &Position,
    tt: &mut TranspositionTable,
    limits: &SearchLimits,
    stop: &AtomicBool,
    game_history: &[Key],
    mut on_depth: impl FnMut(&SearchResult),
) -> SearchResult {
    tt.new_generation();
    let mut engine = Search {
        tt,
        history: HistoryTable::new(),
        stop,
        start: Instant::now(),
        limits,
        nodes: 0,
        path: game_history.to_vec(),
        aborted: false,
        root_best_move: Move::NULL,
    };
    engine.iterative_deepening(position, &mut on_depth)
}

struct Search<'a> {
    tt: &'a mut TranspositionTable,
    history: HistoryTable,
    stop: &'a AtomicBool,
    start: Instant,
    limits: &'a SearchLimits,
    nodes: u64,
    /// Hashes of every position from the start of the game to the current
    /// search node, in order; used to detect repetition draws.
    path: Vec<Key>,
    aborted: bool,
    root_best_move: Move,
}

impl Search<'_> {
    fn iterative_deepening(&mut self, position: &Position, on_depth: &mut dyn FnMut(&SearchResult)) -> SearchResult {
        let legal = generate_legal_moves(position);
        let mut best = SearchResult {
            best_move: legal.first().copied().unwrap_or(Move::NULL),
            score: evaluate_relative(position),
            depth: 0,
            nodes: 0,
            elapsed: Duration::ZERO,
            pv: Vec::new(),
        };
        if legal.is_empty() {
            return best;
        }

        for depth in 1..=self.limits.max_depth {
            self.root_best_move = Move::NULL;
            let score = self.negamax(position, i32::from(depth), -INFINITY, INFINITY, 0);
            if self.aborted {
                break;
            }
            let best_move = if self.root_best_move.is_null() { best.best_move } else { self.root_best_move };
            best = SearchResult {
                best_move,
                score,
                depth,
                nodes: self.nodes,
                elapsed: self.start.elapsed(),
                pv: self.extract_pv(position, depth),
            };
            on_depth(&best);
            if self.should_stop_deepening() {
                break;
            }
        }
        best.nodes = self.nodes;
        best.elapsed = self.start.elapsed();
        best
    }

    fn extract_pv(&self, position: &Position, max_len: u8) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut current = position.clone();
        let mut seen = std::collections::HashSet::new();
        while pv.len() < max_len as usize && seen.insert(current.hash()) {
            let Some(entry) = self.tt.probe(current.hash(), 0) else { break };
            let mv = entry.best_move();
            if mv.is_null() || !generate_legal_moves(&current).contains(&mv) {
                break;
            }
            pv.push(mv);
            current.make_move(mv);
        }
        pv
    }

    fn should_stop_deepening(&self) -> bool {
        if let Some(budget) = &self.limits.budget {
            if self.start.elapsed() >= budget.soft {
                return true;
            }
        }
        if let Some(limit) = self.limits.nodes {
            if self.nodes >= limit {
                return true;
            }
        }
        false
    }

    fn should_abort(&mut self) -> bool {
        if self.nodes % STOP_CHECK_INTERVAL != 0 {
            return false;
        }
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }
        if let Some(budget) = &self.limits.budget {
            if self.start.elapsed() >= budget.hard {
                return true;
            }
        }
        if let Some(limit) = self.limits.nodes {
            if self.nodes >= limit {
                return true;
            }
        }
        false
    }

    fn is_draw(&self, position: &Position) -> bool {
        if position.halfmove_clock() >= 100 {
            return true;
        }
        let hash = position.hash();
        self.path.iter().rev().take(position.halfmove_clock() as usize).any(|&h| h == hash)
    }

    fn negamax(&mut self, position: &Position, mut depth: i32, mut alpha: Score, beta: Score, ply: u32) -> Score {
        self.nodes += 1;
        if self.should_abort() {
            self.aborted = true;
            return 0;
        }

        if ply > 0 && self.is_draw(position) {
            return DRAW;
        }

        let in_check = position.is_check();
        if in_check {
            depth += 1;
        }

        if depth <= 0 {
            return self.quiescence(position, alpha, beta, ply);
        }

        let hash = position.hash();
        let tt_entry = self.tt.probe(hash, ply);
        let tt_move = tt_entry.as_ref().map(|e| e.best_move());
        if let Some(entry) = &tt_entry {
            if i32::from(entry.depth()) >= depth {
                match entry.bound() {
                    Bound::Exact => return entry.score(),
                    Bound::Lower if entry.score() >= beta => return entry.score(),
                    Bound::Upper if entry.score() <= alpha => return entry.score(),
                    _ => {},
                }
            }
        }

        if !in_check
            && depth >= NULL_MOVE_MIN_DEPTH
            && beta.abs() < transposition::MATE_THRESHOLD
            && has_non_pawn_material(position)
        {
            let null_position = position.make_null_move();
            self.path.push(position.hash());
            let score =
                -self.negamax(&null_position, depth - 1 - NULL_MOVE_REDUCTION, -beta, -beta + 1, ply + 1);
            self.path.pop();
            if self.aborted {
                return 0;
            }
            if score >= beta {
                return beta;
            }
        }

        let static_eval = evaluate_relative(position);

        // Reverse futility pruning: the position is so far above beta by the
        // static eval alone that no child search at this shallow a depth is
        // going to bring it back down, so cut without generating moves.
        if !in_check
            && depth <= FUTILITY_MAX_DEPTH
            && beta.abs() < transposition::MATE_THRESHOLD
            && static_eval - FUTILITY_MARGIN_PER_PLY * depth >= beta
        {
            return beta;
        }

        if !in_check && depth <= RAZOR_MAX_DEPTH && static_eval + RAZOR_MARGIN * depth <= alpha {
            let score = self.quiescence(position, alpha, beta, ply);
            if score <= alpha {
                return score;
            }
        }

        let mut moves = generate_legal_moves(position);
        if moves.is_empty() {
            return if in_check { mated_in(ply) } else { DRAW };
        }
        order_moves(position, &mut moves, tt_move, &self.history);

        let futility_applies =
            !in_check && depth <= FUTILITY_MAX_DEPTH && static_eval + FUTILITY_MARGIN_PER_PLY * depth <= alpha;

        let mover = position.side_to_move();
        let mut best_score = -INFINITY;
        let mut best_move = moves[0];
        let mut bound = Bound::Upper;

        for (index, &mv) in moves.iter().enumerate() {
            let is_quiet = !mv.is_capture() && mv.promotion().is_none();
            if futility_applies && is_quiet && index > 0 {
                continue;
            }

            let mut next = position.clone();
            next.make_move(mv);
            self.path.push(position.hash());
            let score = -self.negamax(&next, depth - 1, -beta, -alpha, ply + 1);
            self.path.pop();

            if self.aborted {
                return 0;
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
                if ply == 0 {
                    self.root_best_move = mv;
                }
            }
            if score > alpha {
                alpha = score;
                bound = Bound::Exact;
            }
            if alpha >= beta {
                if is_quiet {
                    let moved_kind = position.piece_on(mv.from()).map_or(PieceKind::Pawn, |p| p.kind);
                    self.history.record_cutoff(mover, moved_kind, mv, depth);
                }
                bound = Bound::Lower;
                break;
            }
        }

        self.tt.store(hash, best_move, best_score, i8::try_from(depth.min(i32::from(i8::MAX))).unwrap_or(i8::MAX), bound, ply);
        best_score
    }

    fn quiescence(&mut self, position: &Position, mut alpha: Score, beta: Score, ply: u32) -> Score {
        self.nodes += 1;
        if self.should_abort() {
            self.aborted = true;
            return 0;
        }

        let stand_pat = evaluate_relative(position);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        let mut moves = generate_legal_moves(position);
        if moves.is_empty() {
            return if position.is_check() { mated_in(ply) } else { DRAW };
        }
        moves.retain(|mv| mv.is_capture() || mv.promotion().is_some());
        order_moves(position, &mut moves, None, &self.history);

        for &mv in &moves {
            let mut next = position.clone();
            next.make_move(mv);
            self.path.push(next.hash());
            let score = -self.quiescence(&next, -beta, -alpha, ply + 1);
            self.path.pop();

            if self.aborted {
                return 0;
            }

            if score >= beta {
                return beta;
            }
            if score > alpha {
                alpha = score;
            }
        }

        alpha
    }
}

fn has_non_pawn_material(position: &Position) -> bool {
    let mover = position.side_to_move();
    [PieceKind::Knight, PieceKind::Bishop, PieceKind::Rook, PieceKind::Queen]
        .into_iter()
        .any(|kind| !position.pieces(mover, kind).is_empty())
}
