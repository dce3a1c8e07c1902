//! Wires the bitboard/search core up behind the [Universal Chess Interface],
//! plus the opening-book lookup and the `go`/`stop` lifecycle the protocol
//! needs around a search that runs on its own thread.
//!
//! Command lines arrive over an [`mpsc`] channel rather than a direct
//! blocking read: a dedicated reader thread (or, in tests, a prepopulated
//! channel) is the only thing that ever calls `read_line`, so
//! [`Engine::next_command`] can poll that channel without blocking forever
//! while a search is outstanding. That lets the main loop notice a search
//! thread finishing on its own, not only when the next line of input
//! arrives — §4.6's "budget met → stopped → emit bestmove" transition has
//! to fire even when the GUI is silently waiting on `bestmove`, and §5
//! still requires `stop` to be observed while the search runs.
//!
//! [Universal Chess Interface]: https://www.chessprogramming.org/UCI

mod uci;

use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use log::{debug, info, warn};

use crate::book::OpeningBook;
use crate::chess::moves::UciMove;
use crate::chess::position::Position;
use crate::chess::zobrist::Key;
use crate::search::time_control::{self, GoParameters};
use crate::search::transposition::TranspositionTable;
use crate::search::{self, SearchLimits, SearchResult};
use uci::{Command, GoCommand};

/// `Hash` UCI option default, in megabytes.
const DEFAULT_HASH_MB: usize = 32;

/// How long [`Engine::next_command`] sleeps between polls of the command
/// channel while a search is outstanding. Short enough that `stop` feels
/// immediate, long enough not to spin the main thread.
const SEARCH_POLL_INTERVAL: Duration = Duration::from_millis(5);

/// A search running on its own thread: the flag used to cancel it, the
/// join handle for its final result, and the channel it reports each
/// completed depth's [`SearchResult`] on as the search progresses.
struct RunningSearch {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<SearchResult>,
    progress: Receiver<SearchResult>,
}

pub struct Engine<'a, W: Write> {
    position: Position,
    /// Hashes of every position played so far in the game, used by the
    /// search for repetition detection; does not include `position` itself.
    game_history: Vec<Key>,
    /// The move list exactly as given by the most recent `position ...
    /// moves ...` command, space-separated; the book is keyed by this
    /// literal string rather than anything reconstructed from it.
    move_history: String,
    tt: Arc<Mutex<TranspositionTable>>,
    book: OpeningBook,
    own_book: bool,
    /// Set by `debug on`/`debug off`; gates the extra `info string`
    /// diagnostics §6 calls for without affecting search behaviour.
    debug: bool,
    search: Option<RunningSearch>,
    /// Command lines, in order; fed by a reader thread in [`Self::new`] or
    /// directly in tests via [`Self::from_commands`].
    commands: Receiver<String>,
    out: &'a mut W,
}

impl<'a, W: Write> Engine<'a, W> {
    /// Talks UCI over the real process stdin: spawns a thread that blocks
    /// on `stdin().lines()` and forwards each line to the engine, so the
    /// main loop never itself blocks on stdin (see module docs).
    #[must_use]
    pub fn new(out: &'a mut W) -> Self {
        let (sender, commands) = mpsc::channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if sender.send(line).is_err() {
                    break;
                }
            }
        });
        Self::from_commands(commands, out)
    }

    /// Drives the engine from an already-open stream of command lines
    /// instead of stdin; the production path for any input source that
    /// isn't the real process stdin, and what the unit tests below use to
    /// script a fixed conversation.
    #[must_use]
    pub fn from_commands(commands: Receiver<String>, out: &'a mut W) -> Self {
        Self {
            position: Position::starting(),
            game_history: Vec::new(),
            move_history: String::new(),
            tt: Arc::new(Mutex::new(TranspositionTable::with_megabytes(DEFAULT_HASH_MB))),
            book: OpeningBook::load_or_empty(&PathBuf::from("book.txt")),
            own_book: true,
            debug: false,
            search: None,
            commands,
            out,
        }
    }

    /// Reads and dispatches commands until `quit` or end-of-input.
    pub fn uci_loop(&mut self) -> anyhow::Result<()> {
        while let Some(line) = self.next_command()? {
            if self.handle_line(&line)? {
                break;
            }
        }
        self.stop_search()?;
        Ok(())
    }

    /// Waits for the next command line. While a search is outstanding this
    /// also watches for the search thread finishing on its own (a
    /// self-terminating `go depth`/`movetime`/`nodes`) so its `info`/
    /// `bestmove` lines are emitted as soon as it completes rather than only
    /// once another command happens to arrive.
    fn next_command(&mut self) -> anyhow::Result<Option<String>> {
        loop {
            let (finished, pending) = match &self.search {
                Some(running) => (running.handle.is_finished(), drain_progress(&running.progress)),
                None => (false, Vec::new()),
            };

            if self.search.is_none() {
                return Ok(self.commands.recv().ok());
            }

            for result in pending {
                self.report_info(&result)?;
            }

            if finished {
                self.stop_search()?;
                continue;
            }

            match self.commands.try_recv() {
                Ok(line) => return Ok(Some(line)),
                Err(TryRecvError::Empty) => std::thread::sleep(SEARCH_POLL_INTERVAL),
                Err(TryRecvError::Disconnected) => return Ok(None),
            }
        }
    }

    /// Dispatches one already-read command line. Returns `true` if the
    /// engine should exit (`quit`).
    fn handle_line(&mut self, line: &str) -> anyhow::Result<bool> {
        match Command::parse(line) {
            Command::Uci => self.handshake()?,
            Command::IsReady => self.sync()?,
            Command::NewGame => self.new_game(),
            Command::SetPosition { fen, moves } => self.set_position(fen, &moves)?,
            Command::Go(go) => self.go(&go)?,
            Command::Stop => self.stop_search()?,
            Command::Quit => {
                self.stop_search()?;
                return Ok(true);
            },
            Command::SetOption { name, value } => self.set_option(&name, value.as_deref()),
            Command::Debug(on) => self.debug = on,
            Command::Unknown(command) => {
                writeln!(self.out, "info string unsupported command: {command}")?;
            },
        }
        Ok(false)
    }

    fn handshake(&mut self) -> anyhow::Result<()> {
        writeln!(self.out, "id name {} {}", crate::NAME, crate::VERSION)?;
        writeln!(self.out, "id author {}", crate::AUTHOR)?;
        writeln!(
            self.out,
            "option name Hash type spin default {DEFAULT_HASH_MB} min 1 max 4096"
        )?;
        writeln!(self.out, "option name OwnBook type check default true")?;
        writeln!(self.out, "uciok")?;
        Ok(())
    }

    fn sync(&mut self) -> anyhow::Result<()> {
        writeln!(self.out, "readyok")?;
        Ok(())
    }

    fn new_game(&mut self) {
        self.position = Position::starting();
        self.game_history.clear();
        self.move_history.clear();
        self.tt.lock().expect("tt mutex is never poisoned: the search thread never panics").clear();
    }

    /// Resets to the given root (start position or a FEN string) and
    /// replays `moves`, stopping at the first one that is not legal in the
    /// position it would apply to (§7: malformed input is rejected, never
    /// applied partially into a corrupt state beyond the last-good move).
    fn set_position(&mut self, fen: Option<String>, moves: &[String]) -> anyhow::Result<()> {
        let root = match fen {
            Some(fen) => match Position::from_fen(&fen) {
                Ok(position) => position,
                Err(err) => {
                    writeln!(self.out, "info string invalid fen: {err}")?;
                    return Ok(());
                },
            },
            None => Position::starting(),
        };

        let mut position = root;
        let mut history = Vec::with_capacity(moves.len());
        for token in moves {
            let Ok(candidate) = UciMove::parse(token) else {
                writeln!(self.out, "info string illegal move in position command: {token}")?;
                break;
            };
            let Some(legal_move) = position.find_legal_move(candidate) else {
                writeln!(self.out, "info string illegal move in position command: {token}")?;
                break;
            };
            history.push(position.hash());
            position.make_move(legal_move);
        }

        self.position = position;
        self.game_history = history;
        self.move_history = moves.join(" ");
        Ok(())
    }

    fn set_option(&mut self, name: &str, value: Option<&str>) {
        match name {
            "Hash" => match value.and_then(|v| v.parse::<usize>().ok()) {
                Some(megabytes) => {
                    self.tt
                        .lock()
                        .expect("tt mutex is never poisoned: the search thread never panics")
                        .resize_megabytes(megabytes);
                },
                None => warn!("setoption Hash requires an integer value, got {value:?}"),
            },
            "OwnBook" => {
                self.own_book = value.is_some_and(|v| v.eq_ignore_ascii_case("true"));
            },
            other => warn!("unsupported option: {other}"),
        }
    }

    fn go(&mut self, go: &GoCommand) -> anyhow::Result<()> {
        self.stop_search()?;

        if self.own_book && !self.book.is_empty() {
            if let Some(book_move) = self.book.best_move(&self.move_history) {
                if let Ok(candidate) = UciMove::parse(book_move) {
                    if let Some(legal_move) = self.position.find_legal_move(candidate) {
                        writeln!(self.out, "bestmove {legal_move}")?;
                        return Ok(());
                    }
                }
            }
        }

        let white_to_move = self.position.side_to_move() == crate::chess::core::Color::White;
        let params = GoParameters {
            depth: go.depth,
            movetime: go.movetime(),
            nodes: go.nodes,
            infinite: go.infinite,
            white_time: go.wtime(),
            black_time: go.btime(),
            white_increment: go.winc(),
            black_increment: go.binc(),
            moves_to_go: go.movestogo,
        };
        let budget = time_control::budget(&params, white_to_move);
        let limits = SearchLimits {
            max_depth: go.depth.unwrap_or(64),
            budget,
            nodes: go.nodes,
        };

        let stop = Arc::new(AtomicBool::new(false));
        let position = self.position.clone();
        let history = self.game_history.clone();
        let tt = Arc::clone(&self.tt);
        let thread_stop = Arc::clone(&stop);
        let (progress_tx, progress) = mpsc::channel();

        let handle = std::thread::spawn(move || {
            let mut tt = tt.lock().expect("tt mutex is never poisoned: the search thread never panics");
            search::search_with_progress(&position, &mut tt, &limits, &thread_stop, &history, |depth_result| {
                let _ = progress_tx.send(depth_result.clone());
            })
        });

        self.search = Some(RunningSearch { stop, handle, progress });
        Ok(())
    }

    /// Aborts any running search (a no-op if it had already finished on its
    /// own), joins its thread, and emits every `info` line it reported plus
    /// the final `bestmove`. A no-op if nothing is searching.
    fn stop_search(&mut self) -> anyhow::Result<()> {
        let Some(running) = self.search.take() else { return Ok(()) };
        running.stop.store(true, Ordering::Relaxed);
        for result in drain_progress(&running.progress) {
            self.report_info(&result)?;
        }
        let result = running
            .handle
            .join()
            .unwrap_or_else(|_| SearchResult {
                best_move: crate::chess::moves::Move::NULL,
                score: 0,
                depth: 0,
                nodes: 0,
                elapsed: std::time::Duration::ZERO,
                pv: Vec::new(),
            });
        // A last depth may have been reported in the gap between the drain
        // above and the join completing.
        for result in drain_progress(&running.progress) {
            self.report_info(&result)?;
        }
        self.emit_bestmove(&result)?;
        Ok(())
    }

    /// Emits the `info depth ...` line (and, under `debug on`, an extra
    /// `info string`) for one completed search depth. Called once per
    /// depth as the search progresses (§6: "`info ...` lines per completed
    /// depth"), not just once at the end.
    fn report_info(&mut self, result: &SearchResult) -> anyhow::Result<()> {
        let score = if search::is_mate_score(result.score) {
            format!("mate {}", search::mate_distance(result.score))
        } else {
            format!("cp {}", result.score)
        };
        let pv = result.pv.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
        writeln!(
            self.out,
            "info depth {} score {score} nodes {} time {} pv {pv}",
            result.depth,
            result.nodes,
            result.elapsed.as_millis()
        )?;
        info!("searched to depth {} in {:?}, {} nodes", result.depth, result.elapsed, result.nodes);
        if self.debug {
            debug!("pv: {pv}");
            writeln!(
                self.out,
                "info string debug nodes={} depth={} time={}ms",
                result.nodes,
                result.depth,
                result.elapsed.as_millis()
            )?;
        }
        Ok(())
    }

    /// Emits the terminal `bestmove` line for a finished search.
    fn emit_bestmove(&mut self, result: &SearchResult) -> anyhow::Result<()> {
        if result.best_move.is_null() {
            writeln!(self.out, "info string no legal moves")?;
            writeln!(self.out, "bestmove 0000")?;
        } else {
            writeln!(self.out, "bestmove {}", result.best_move)?;
        }
        Ok(())
    }
}

/// Drains every [`SearchResult`] currently queued on a running search's
/// progress channel without blocking.
fn drain_progress(progress: &Receiver<SearchResult>) -> Vec<SearchResult> {
    let mut pending = Vec::new();
    while let Ok(result) = progress.try_recv() {
        pending.push(result);
    }
    pending
}

/// Fixed positions and depth used by the `bench` subcommand: a small,
/// deterministic self-check that the engine still runs and searches after a
/// change, reporting total node count and nodes-per-second the way a
/// tournament manager's sanity check expects, independent of perft or the
/// unit/integration test suites.
const BENCH_DEPTH: u8 = 6;
const BENCH_POSITIONS: &[&str] = &[
    "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
    "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
    "r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1",
];

/// Runs a fixed search to [`BENCH_DEPTH`] on [`BENCH_POSITIONS`] and prints
/// the total node count and search speed.
pub fn bench() {
    let stop = AtomicBool::new(false);
    let limits = SearchLimits { max_depth: BENCH_DEPTH, budget: None, nodes: None };
    let mut total_nodes: u64 = 0;
    let started = std::time::Instant::now();

    for fen in BENCH_POSITIONS {
        let position = Position::from_fen(fen).unwrap_or_else(|err| panic!("bad bench fen {fen}: {err}"));
        let mut tt = TranspositionTable::with_megabytes(DEFAULT_HASH_MB);
        let result = search::search(&position, &mut tt, &limits, &stop, &[]);
        total_nodes += result.nodes;
    }

    let elapsed = started.elapsed();
    let nps = if elapsed.as_secs_f64() > 0.0 { (total_nodes as f64 / elapsed.as_secs_f64()) as u64 } else { 0 };
    println!("{total_nodes} nodes {nps} nps");
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    /// Builds an already-closed channel of command lines so `uci_loop` sees
    /// the whole script up front and then a clean end-of-input, just like a
    /// scripted conversation with no further commands after `quit`.
    fn run(script: &str) -> String {
        let (sender, commands) = mpsc::channel();
        for line in script.lines() {
            sender.send(line.to_string()).expect("receiver still alive");
        }
        drop(sender);
        let mut out = Vec::new();
        let mut engine = Engine::from_commands(commands, &mut out);
        engine.uci_loop().unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn handshake_identifies_the_engine_and_acks_readiness() {
        let output = run("uci\nisready\nquit\n");
        assert!(output.contains(&format!("id name {} {}", crate::NAME, crate::VERSION)));
        assert!(output.contains(&format!("id author {}", crate::AUTHOR)));
        assert!(output.contains("uciok"));
        assert!(output.contains("readyok"));
    }

    #[test]
    fn one_ply_search_from_startpos_picks_a_legal_opening_move() {
        let output = run("ucinewgame\nposition startpos\ngo depth 1\nquit\n");
        assert!(output.contains("bestmove"));
        let bestmove_line = output.lines().find(|l| l.starts_with("bestmove")).unwrap();
        let played = bestmove_line.split_whitespace().nth(1).unwrap();
        let position = Position::starting();
        let candidate = UciMove::parse(played).unwrap();
        assert!(position.find_legal_move(candidate).is_some());
    }

    #[test]
    fn illegal_move_in_position_command_is_rejected_without_corrupting_state() {
        let output = run("ucinewgame\nposition startpos moves e2e5\ngo depth 1\nquit\n");
        let bestmove_line = output.lines().find(|l| l.starts_with("bestmove")).unwrap();
        let played = bestmove_line.split_whitespace().nth(1).unwrap();
        let position = Position::starting();
        let candidate = UciMove::parse(played).unwrap();
        assert!(position.find_legal_move(candidate).is_some());
    }

    #[test]
    fn finds_mate_in_one() {
        let output = run(
            "position fen 6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1\ngo depth 4\nquit\n",
        );
        let bestmove_line = output.lines().find(|l| l.starts_with("bestmove")).unwrap();
        assert_eq!(bestmove_line.trim(), "bestmove a1a8");
    }

    #[test]
    fn setoption_hash_resizes_the_transposition_table() {
        let output = run("setoption name Hash value 1\nucinewgame\nposition startpos\ngo depth 1\nquit\n");
        assert!(output.contains("bestmove"));
    }

    #[test]
    fn unknown_command_is_reported_but_does_not_abort_the_loop() {
        let output = run("frobnicate\nisready\nquit\n");
        assert!(output.contains("info string unsupported command: frobnicate"));
        assert!(output.contains("readyok"));
    }

    #[test]
    fn debug_on_adds_extra_diagnostics_that_are_absent_by_default() {
        let without_debug = run("ucinewgame\nposition startpos\ngo depth 1\nquit\n");
        assert!(!without_debug.contains("info string debug"));

        let with_debug = run("debug on\nucinewgame\nposition startpos\ngo depth 1\nquit\n");
        assert!(with_debug.contains("info string debug"));
    }
}
