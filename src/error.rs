use thiserror::Error;

use crate::board::Side;
use crate::square::Square;

/// A proposed move the rules engine refused to apply.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("illegal move {from}{to}")]
pub struct IllegalMove {
    pub from: Square,
    pub to: Square,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SquareParseError {
    #[error("invalid square '{0}': expected a file and a rank such as 'e4'")]
    Format(String),

    #[error("invalid file '{0}'")]
    File(char),

    #[error("invalid rank '{0}'")]
    Rank(char),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("expected at least 4 space separated fields, got {0}")]
    FieldCount(usize),

    #[error("invalid piece placement: {0}")]
    Placement(String),

    #[error("invalid side to move '{0}'")]
    SideToMove(String),

    #[error("invalid castling field '{0}'")]
    Castling(String),

    #[error("invalid en passant square '{0}'")]
    EnPassant(String),

    #[error("invalid move counter '{0}'")]
    Counter(String),

    #[error("each side needs exactly one king")]
    MissingKing,

    #[error("{0} is in check but it is not their move")]
    OpponentInCheck(Side),
}
