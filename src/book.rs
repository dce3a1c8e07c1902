//! Opening book: a flat text file of `<moves> -> <bestmove> [# weight]`
//! lines, looked up by the exact sequence of moves played so far in long
//! algebraic notation, space-separated.
//!
//! Unlike the reference book format this engine's data model is drawn from,
//! where the first matching line wins, ties here are broken by the highest
//! `weight` value, so a curated book can list several replies to the same
//! position and let the strongest one win regardless of line order.

use std::collections::HashMap;
use std::path::Path;

use log::warn;

const DEFAULT_WEIGHT: u32 = 100;

struct Entry {
    best_move: String,
    weight: u32,
}

/// A loaded opening book, indexed by the exact move-history string that
/// reaches each entry's position.
#[derive(Default)]
pub struct OpeningBook {
    entries: HashMap<String, Entry>,
}

impl OpeningBook {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads a book from `path`. A missing or unreadable file is not fatal:
    /// it is logged and treated as an empty book, since a book is an
    /// optional strength aid, not a correctness requirement.
    #[must_use]
    pub fn load_or_empty(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents),
            Err(err) => {
                warn!("could not read opening book at {}: {err}", path.display());
                Self::empty()
            },
        }
    }

    fn parse(contents: &str) -> Self {
        let mut entries: HashMap<String, Entry> = HashMap::new();
        for line in contents.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((moves, rest)) = parse_line(trimmed) else { continue };
            match entries.entry(moves) {
                std::collections::hash_map::Entry::Vacant(slot) => {
                    slot.insert(rest);
                },
                std::collections::hash_map::Entry::Occupied(mut slot) => {
                    // Ties keep whichever entry appeared first in the file.
                    if rest.weight > slot.get().weight {
                        slot.insert(rest);
                    }
                },
            }
        }
        Self { entries }
    }

    /// The book move for the exact move-history string `played`
    /// (space-separated long algebraic moves, empty string for the
    /// starting position), if any.
    #[must_use]
    pub fn best_move(&self, played: &str) -> Option<&str> {
        self.entries.get(played).map(|entry| entry.best_move.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Parses one non-comment, non-blank line into `(moves, entry)`, or `None`
/// if it does not contain the `->` separator or has an empty best-move
/// field.
fn parse_line(line: &str) -> Option<(String, Entry)> {
    let (left, right) = line.split_once("->")?;
    let moves = left.trim().to_string();

    let right = right.trim_start();
    let best_move: String = right.chars().take_while(|&c| !c.is_whitespace() && c != '#').collect();
    if best_move.is_empty() {
        return None;
    }

    let weight = right
        .split_once('#')
        .and_then(|(_, after)| after.trim_start().split_whitespace().next())
        .and_then(|token| token.parse().ok())
        .unwrap_or(DEFAULT_WEIGHT);

    Some((moves, Entry { best_move, weight }))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_a_well_formed_line() {
        let (moves, entry) = parse_line("e2e4 e7e5 -> g1f3 # 200").unwrap();
        assert_eq!(moves, "e2e4 e7e5");
        assert_eq!(entry.best_move, "g1f3");
        assert_eq!(entry.weight, 200);
    }

    #[test]
    fn defaults_weight_when_absent() {
        let (_, entry) = parse_line("e2e4 -> e7e5").unwrap();
        assert_eq!(entry.weight, DEFAULT_WEIGHT);
    }

    #[test]
    fn rejects_lines_without_an_arrow() {
        assert!(parse_line("this is not a book line").is_none());
    }

    #[test]
    fn highest_weight_wins_on_duplicate_keys() {
        let book = OpeningBook::parse(
            "e2e4 -> e7e5 # 50\n\
             e2e4 -> c7c5 # 150\n\
             e2e4 -> e7e6 # 100\n",
        );
        assert_eq!(book.best_move("e2e4"), Some("c7c5"));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let book = OpeningBook::parse(
            "# a book\n\
             \n\
             e2e4 -> e7e5\n",
        );
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn missing_file_is_not_fatal() {
        let book = OpeningBook::load_or_empty(Path::new("/nonexistent/path/to/book.txt"));
        assert!(book.is_empty());
    }
}
