//! Parsing for the subset of the [Universal Chess Interface] this engine
//! speaks: `uci`, `isready`, `ucinewgame`, `position`, `go`, `stop`, `quit`
//! and `setoption`. Anything else becomes [`Command::Unknown`] rather than
//! an error — the protocol layer is explicitly allowed to ignore commands it
//! does not understand (§7 of the design: malformed or unrecognised input
//! must never corrupt engine state).
//!
//! [Universal Chess Interface]: https://www.chessprogramming.org/UCI

use std::time::Duration;

#[derive(Debug, PartialEq, Eq)]
pub(super) enum Command {
    Uci,
    IsReady,
    NewGame,
    SetPosition { fen: Option<String>, moves: Vec<String> },
    Go(GoCommand),
    Stop,
    Quit,
    SetOption { name: String, value: Option<String> },
    Debug(bool),
    Unknown(String),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(super) struct GoCommand {
    pub depth: Option<u8>,
    pub movetime: Option<u64>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u32>,
    pub nodes: Option<u64>,
    pub infinite: bool,
}

impl GoCommand {
    pub(super) fn wtime(&self) -> Option<Duration> {
        self.wtime.map(Duration::from_millis)
    }

    pub(super) fn btime(&self) -> Option<Duration> {
        self.btime.map(Duration::from_millis)
    }

    pub(super) fn winc(&self) -> Option<Duration> {
        self.winc.map(Duration::from_millis)
    }

    pub(super) fn binc(&self) -> Option<Duration> {
        self.binc.map(Duration::from_millis)
    }

    pub(super) fn movetime(&self) -> Option<Duration> {
        self.movetime.map(Duration::from_millis)
    }
}

impl Command {
    pub(super) fn parse(line: &str) -> Self {
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts.first().copied() {
            Some("uci") => Command::Uci,
            Some("isready") => Command::IsReady,
            Some("ucinewgame") => Command::NewGame,
            Some("position") => parse_position(&parts[1..]),
            Some("go") => Command::Go(parse_go(&parts[1..])),
            Some("stop") => Command::Stop,
            Some("quit") => Command::Quit,
            Some("setoption") => parse_setoption(&parts[1..]),
            Some("debug") => Command::Debug(parts.get(1).copied() != Some("off")),
            _ => Command::Unknown(line.trim().to_string()),
        }
    }
}

fn parse_position(parts: &[&str]) -> Command {
    let moves_at = parts.iter().position(|&p| p == "moves");
    let body = moves_at.map_or(parts, |index| &parts[..index]);

    let fen = match body.first().copied() {
        Some("startpos") => None,
        Some("fen") => Some(body[1..].join(" ")),
        _ => return Command::Unknown(parts.join(" ")),
    };

    let moves = moves_at
        .map(|index| parts[index + 1..].iter().map(|&m| m.to_string()).collect())
        .unwrap_or_default();

    Command::SetPosition { fen, moves }
}

fn parse_go(parts: &[&str]) -> GoCommand {
    let mut go = GoCommand::default();
    let mut tokens = parts.iter().peekable();
    while let Some(&token) = tokens.next() {
        match token {
            "depth" => go.depth = tokens.next().and_then(|v| v.parse().ok()),
            "movetime" => go.movetime = tokens.next().and_then(|v| v.parse().ok()),
            "wtime" => go.wtime = tokens.next().and_then(|v| v.parse().ok()),
            "btime" => go.btime = tokens.next().and_then(|v| v.parse().ok()),
            "winc" => go.winc = tokens.next().and_then(|v| v.parse().ok()),
            "binc" => go.binc = tokens.next().and_then(|v| v.parse().ok()),
            "movestogo" => go.movestogo = tokens.next().and_then(|v| v.parse().ok()),
            "nodes" => go.nodes = tokens.next().and_then(|v| v.parse().ok()),
            "infinite" => go.infinite = true,
            _ => {},
        }
    }
    go
}

fn parse_setoption(parts: &[&str]) -> Command {
    let Some(name_at) = parts.iter().position(|&p| p == "name") else {
        return Command::Unknown(parts.join(" "));
    };
    let value_at = parts.iter().position(|&p| p == "value");
    let name_end = value_at.unwrap_or(parts.len());
    if name_at + 1 >= name_end {
        return Command::Unknown(parts.join(" "));
    }
    let name = parts[name_at + 1..name_end].join(" ");
    let value = value_at.map(|index| parts[index + 1..].join(" "));
    Command::SetOption { name, value }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_uci_handshake_commands() {
        assert_eq!(Command::parse("uci"), Command::Uci);
        assert_eq!(Command::parse("isready"), Command::IsReady);
        assert_eq!(Command::parse("ucinewgame"), Command::NewGame);
        assert_eq!(Command::parse("stop"), Command::Stop);
        assert_eq!(Command::parse("quit"), Command::Quit);
    }

    #[test]
    fn parses_startpos_with_moves() {
        assert_eq!(
            Command::parse("position startpos moves e2e4 e7e5"),
            Command::SetPosition { fen: None, moves: vec!["e2e4".into(), "e7e5".into()] }
        );
    }

    #[test]
    fn parses_fen_without_moves() {
        let fen = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        assert_eq!(
            Command::parse(&format!("position fen {fen}")),
            Command::SetPosition { fen: Some(fen.to_string()), moves: vec![] }
        );
    }

    #[test]
    fn parses_go_with_mixed_parameters() {
        let go = parse_go(&"depth 6 wtime 60000 btime 50000 winc 1000 movestogo 20"
            .split_whitespace()
            .collect::<Vec<_>>());
        assert_eq!(go.depth, Some(6));
        assert_eq!(go.wtime, Some(60_000));
        assert_eq!(go.btime, Some(50_000));
        assert_eq!(go.winc, Some(1_000));
        assert_eq!(go.movestogo, Some(20));
        assert!(!go.infinite);
    }

    #[test]
    fn parses_go_infinite() {
        assert_eq!(Command::parse("go infinite"), Command::Go(GoCommand { infinite: true, ..Default::default() }));
    }

    #[test]
    fn parses_setoption_with_value() {
        assert_eq!(
            Command::parse("setoption name Hash value 128"),
            Command::SetOption { name: "Hash".to_string(), value: Some("128".to_string()) }
        );
    }

    #[test]
    fn parses_setoption_boolean_value() {
        assert_eq!(
            Command::parse("setoption name OwnBook value true"),
            Command::SetOption { name: "OwnBook".to_string(), value: Some("true".to_string()) }
        );
    }

    #[test]
    fn unknown_commands_are_preserved_verbatim() {
        assert_eq!(Command::parse("quack quack"), Command::Unknown("quack quack".to_string()));
    }

    #[test]
    fn parses_debug_on_and_off() {
        assert_eq!(Command::parse("debug on"), Command::Debug(true));
        assert_eq!(Command::parse("debug off"), Command::Debug(false));
        assert_eq!(Command::parse("debug"), Command::Debug(true));
    }
}
