//! Turning a UCI `go` command's time-related parameters into a time budget
//! the iterative-deepening loop can check cheaply and often.
//!
//! Two numbers come out of this: a soft budget (stop starting a new
//! iteration once it has elapsed) and a hard budget (abort mid-search, even
//! partway through a ply, once it has elapsed). The soft budget lets a
//! search that is comfortably ahead finish its current iteration instead of
//! being cut off arbitrarily; the hard budget is the one that actually
//! protects the clock.

use std::time::Duration;

/// A fixed cap on how many future moves a single time allocation plans for,
/// used when the UCI `go` command does not supply `movestogo`. Assuming the
/// game lasts forever would make every allocation tiny; a conventional
/// engine move count keeps allocations sane in the endgame.
const ASSUMED_MOVES_TO_GO: u32 = 40;

/// A safety margin subtracted from the hard budget so a move's overhead
/// (writing `bestmove`, flushing stdout) doesn't itself cause a time loss.
const MOVE_OVERHEAD: Duration = Duration::from_millis(50);

#[derive(Copy, Clone, Debug, Default)]
pub struct GoParameters {
    pub depth: Option<u8>,
    pub movetime: Option<Duration>,
    pub nodes: Option<u64>,
    pub infinite: bool,
    pub white_time: Option<Duration>,
    pub black_time: Option<Duration>,
    pub white_increment: Option<Duration>,
    pub black_increment: Option<Duration>,
    pub moves_to_go: Option<u32>,
}

#[derive(Copy, Clone, Debug)]
pub struct TimeBudget {
    pub soft: Duration,
    pub hard: Duration,
}

/// Computes the search's stopping criteria from a parsed `go` command and
/// which color is to move. A `None` result means "no time limit at all":
/// the search runs until `depth`/`nodes` (if given) or `stop` is received.
#[must_use]
pub fn budget(params: &GoParameters, side_to_move_is_white: bool) -> Option<TimeBudget> {
    if params.infinite {
        return None;
    }

    if let Some(movetime) = params.movetime {
        let hard = movetime.saturating_sub(MOVE_OVERHEAD).max(Duration::from_millis(1));
        return Some(TimeBudget { soft: hard, hard });
    }

    let remaining = if side_to_move_is_white { params.white_time } else { params.black_time };
    let increment = if side_to_move_is_white { params.white_increment } else { params.black_increment };

    let remaining = remaining?;
    let increment = increment.unwrap_or(Duration::ZERO);
    let moves_to_go = params.moves_to_go.unwrap_or(ASSUMED_MOVES_TO_GO).max(1);

    let allocation = remaining / moves_to_go + increment;
    let hard = allocation.min(remaining).saturating_sub(MOVE_OVERHEAD).max(Duration::from_millis(1));
    // The soft budget is a fraction of the hard one: most iterations finish
    // well under their allotted time, so stopping new-iteration starts
    // earlier leaves slack for the one iteration that runs long.
    let soft = Duration::from_secs_f64(hard.as_secs_f64() * 0.6).max(Duration::from_millis(1));

    Some(TimeBudget { soft, hard })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn infinite_search_has_no_budget() {
        let params = GoParameters { infinite: true, ..Default::default() };
        assert!(budget(&params, true).is_none());
    }

    #[test]
    fn no_time_information_has_no_budget() {
        let params = GoParameters::default();
        assert!(budget(&params, true).is_none());
    }

    #[test]
    fn fixed_movetime_is_used_directly() {
        let params = GoParameters { movetime: Some(Duration::from_secs(2)), ..Default::default() };
        let b = budget(&params, true).unwrap();
        assert_eq!(b.soft, b.hard);
        assert!(b.hard <= Duration::from_secs(2));
    }

    #[test]
    fn clock_based_budget_uses_movestogo() {
        let params = GoParameters {
            white_time: Some(Duration::from_secs(60)),
            moves_to_go: Some(20),
            ..Default::default()
        };
        let b = budget(&params, true).unwrap();
        assert!(b.hard < Duration::from_secs(4));
        assert!(b.soft < b.hard);
    }

    #[test]
    fn increment_is_added_to_the_allocation() {
        let without = budget(
            &GoParameters { white_time: Some(Duration::from_secs(60)), moves_to_go: Some(20), ..Default::default() },
            true,
        )
        .unwrap();
        let with = budget(
            &GoParameters {
                white_time: Some(Duration::from_secs(60)),
                white_increment: Some(Duration::from_secs(1)),
                moves_to_go: Some(20),
                ..Default::default()
            },
            true,
        )
        .unwrap();
        assert!(with.hard > without.hard);
    }

    #[test]
    fn never_allocates_more_than_remaining_time() {
        let params = GoParameters { white_time: Some(Duration::from_millis(500)), ..Default::default() };
        let b = budget(&params, true).unwrap();
        assert!(b.hard <= Duration::from_millis(500));
    }
}
