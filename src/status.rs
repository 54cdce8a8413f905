use std::fmt;

use crate::board::Side;
use crate::movegen::GameState;
use crate::rules::{DrawReason, Position, RulesEngine, StandardRules};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    InProgress,
    Check,
    Checkmate,
    Draw,
}

impl GameStatus {
    /// Finished games accept no more clicks.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Checkmate | GameStatus::Draw)
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let text = match self {
            GameStatus::InProgress => "in progress",
            GameStatus::Check => "check",
            GameStatus::Checkmate => "checkmate",
            GameStatus::Draw => "draw",
        };
        write!(f, "{}", text)
    }
}

/// Checkmate > Draw > Check > InProgress, see `RulesEngine::status`.
pub fn resolve<E: RulesEngine>(engine: &E, snapshot: &E::Snapshot) -> GameStatus {
    engine.status(snapshot)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub status: GameStatus,
    pub side_to_move: Side,
    pub winner: Option<Side>,
    pub draw_reason: Option<DrawReason>,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.status, self.winner, self.draw_reason) {
            (GameStatus::Checkmate, Some(winner), _) => write!(f, "checkmate, {} wins", winner),
            (GameStatus::Draw, _, Some(reason)) => write!(f, "draw by {:?}", reason),
            (status, _, _) => write!(f, "{}, {} to move", status, self.side_to_move),
        }
    }
}

/// Status plus who won or why the game was drawn.
pub fn describe(rules: &StandardRules, snapshot: &Position) -> StatusReport {
    let state = rules.game_state(snapshot);
    StatusReport {
        status: rules.status_of(snapshot, state),
        side_to_move: rules.side_to_move(snapshot),
        winner: match state {
            GameState::Checkmate(winner) => Some(winner),
            _ => None,
        },
        draw_reason: DrawReason::from_state(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(fen: &str) -> GameStatus {
        let rules = StandardRules::from_fen(fen).unwrap();
        resolve(&rules, &rules.initial_snapshot())
    }

    #[test]
    fn status_priorities() {
        assert_eq!(status_of(crate::board::START_FEN), GameStatus::InProgress);
        assert_eq!(status_of("4k3/8/8/8/8/8/8/R3K3 b - - 0 1"), GameStatus::InProgress);
        assert_eq!(status_of("4k3/8/8/8/8/8/8/4RK2 b - - 0 1"), GameStatus::Check);
        assert_eq!(status_of("k7/1Q6/2K5/8/8/8/8/8 b - - 0 1"), GameStatus::Checkmate);
        assert_eq!(status_of("8/8/8/8/8/1q6/2k5/K7 w - - 0 1"), GameStatus::Draw);
    }

    /// The predicate chain every engine gets by default.
    fn status_by_predicates(rules: &StandardRules, snapshot: &Position) -> GameStatus {
        if rules.is_checkmate(snapshot) {
            GameStatus::Checkmate
        } else if rules.is_draw(snapshot) {
            GameStatus::Draw
        } else if rules.is_in_check(snapshot) {
            GameStatus::Check
        } else {
            GameStatus::InProgress
        }
    }

    #[test]
    fn single_pass_status_agrees_with_the_predicates() {
        let positions = [
            crate::board::START_FEN,
            "4k3/8/8/8/8/8/8/4RK2 b - - 0 1",
            "k7/1Q6/2K5/8/8/8/8/8 b - - 0 1",
            "8/8/8/8/8/1q6/2k5/K7 w - - 0 1",
            "4k3/8/8/8/8/8/8/3K4 w - - 0 1",
            "4k3/8/8/8/8/8/8/4RK2 b - - 100 80",
            "4k3/8/8/8/8/8/8/R3K3 b - - 0 1",
        ];
        for fen in positions {
            let rules = StandardRules::from_fen(fen).unwrap();
            let snapshot = rules.initial_snapshot();
            let expected = status_by_predicates(&rules, &snapshot);
            assert_eq!(resolve(&rules, &snapshot), expected, "{}", fen);
            assert_eq!(describe(&rules, &snapshot).status, expected, "{}", fen);
            assert_eq!(rules.is_game_over(&snapshot), expected.is_terminal(), "{}", fen);
        }
    }

    #[test]
    fn terminal_statuses() {
        assert!(GameStatus::Checkmate.is_terminal());
        assert!(GameStatus::Draw.is_terminal());
        assert!(!GameStatus::Check.is_terminal());
        assert!(!GameStatus::InProgress.is_terminal());
    }

    #[test]
    fn report_names_the_winner() {
        let rules = StandardRules::from_fen("k7/1Q6/2K5/8/8/8/8/8 b - - 0 1").unwrap();
        let report = describe(&rules, &rules.initial_snapshot());
        assert_eq!(report.winner, Some(Side::White));
        assert_eq!(report.draw_reason, None);
        assert_eq!(report.to_string(), "checkmate, white wins");
    }

    #[test]
    fn report_names_the_draw_reason() {
        let rules = StandardRules::from_fen("4k3/8/8/8/8/8/8/3K4 w - - 0 1").unwrap();
        let report = describe(&rules, &rules.initial_snapshot());
        assert_eq!(report.status, GameStatus::Draw);
        assert_eq!(report.draw_reason, Some(DrawReason::InsufficientMaterial));
    }
}
