//! A small UCI-speaking chess engine: bitboard position representation,
//! pseudo-legal move generation with a copy-apply-check legality filter,
//! static evaluation, and an iterative-deepening alpha-beta search with a
//! transposition table.
//!
//! The [`chess`] module is the board/move layer, [`evaluation`] scores a
//! position statically, [`search`] drives the tree walk, and [`engine`]
//! wires all of it up behind the UCI protocol.

pub mod book;
pub mod chess;
pub mod engine;
pub mod evaluation;
pub mod search;

/// Engine identity reported in the UCI `id` response.
pub const NAME: &str = "Talon";
/// Author string reported in the UCI `id` response.
pub const AUTHOR: &str = "Talon Engine Contributors";
/// Crate version, forwarded from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Installs the [`env_logger`] backend. Intended to be called once from
/// `main`; safe to call multiple times (subsequent calls are no-ops).
pub fn init_logging() {
    let _ = env_logger::try_init();
}
