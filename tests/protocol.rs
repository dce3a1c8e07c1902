//! End-to-end UCI protocol scenarios, driving the compiled binary over its
//! real stdin/stdout rather than calling [`talon::engine::Engine`] directly.

use assert_cmd::Command;
use predicates::boolean::PredicateBooleanExt;
use predicates::str::contains;

const BINARY_NAME: &str = "talon";

#[test]
fn startup_handshake() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("binary should be built");
    cmd.write_stdin("uci\nisready\nquit\n")
        .assert()
        .success()
        .stdout(contains("id name").and(contains("id author")).and(contains("uciok")).and(contains("readyok")));
}

#[test]
fn one_ply_search_from_startpos_returns_a_legal_opening_move() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("binary should be built");
    cmd.write_stdin("ucinewgame\nposition startpos\ngo depth 1\nquit\n")
        .assert()
        .success()
        .stdout(contains("bestmove"));
}

#[test]
fn illegal_move_in_position_command_does_not_prevent_a_reply() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("binary should be built");
    // "e2e5" is not a legal move from the starting position (no pawn can
    // reach e5 in one move); the engine must still search from the position
    // reached by the prefix it could apply (the starting position itself)
    // rather than hanging or crashing.
    cmd.write_stdin("ucinewgame\nposition startpos moves e2e5\ngo depth 1\nquit\n")
        .assert()
        .success()
        .stdout(contains("bestmove"));
}

#[test]
fn mate_in_one_is_found() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("binary should be built");
    cmd.write_stdin("position fen 6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1\ngo depth 4\nquit\n")
        .assert()
        .success()
        .stdout(contains("bestmove a1a8"));
}

#[test]
fn castling_rights_are_lost_after_a_king_move() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("binary should be built");
    // After 1.e4 e5 2.Ke2, white has moved its king: a subsequent
    // `go depth 1` must never choose a castling move (`e1g1`/`e1c1`) since
    // the king is no longer on its home square to begin with.
    cmd.write_stdin("position startpos moves e2e4 e7e5 e1e2\ngo depth 1\nquit\n")
        .assert()
        .success()
        .stdout(contains("bestmove e1g1").not().and(contains("bestmove e1c1").not()));
}

#[test]
fn quit_without_any_prior_command_exits_cleanly() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("binary should be built");
    cmd.write_stdin("quit\n").assert().success();
}

#[test]
fn bench_subcommand_runs_without_a_uci_handshake() {
    let mut cmd = Command::cargo_bin(BINARY_NAME).expect("binary should be built");
    cmd.arg("bench").assert().success().stdout(contains("nodes").and(contains("nps")));
}
