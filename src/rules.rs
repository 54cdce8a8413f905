use std::collections::BTreeSet;

use crate::board::{Board, Piece, PieceKind, Side, START_FEN};
use crate::error::{FenError, IllegalMove};
use crate::movegen::{GameState, MoveGenerator};
use crate::notation;
use crate::square::Square;
use crate::status::GameStatus;

/// Result of a successful `RulesEngine::apply_move`.
#[derive(Debug, Clone)]
pub struct AppliedMove<S> {
    pub snapshot: S,
    /// Standard algebraic notation of the move, as played.
    pub notation: String,
    /// The piece a pawn actually promoted to, `None` for every other move.
    pub promotion: Option<PieceKind>,
}

/// Authoritative chess rules consumed by the session.
///
/// Snapshots are treated as immutable values: every method takes one by
/// reference and transitions hand back a new one.
pub trait RulesEngine {
    type Snapshot: Clone;

    fn initial_snapshot(&self) -> Self::Snapshot;

    fn side_to_move(&self, snapshot: &Self::Snapshot) -> Side;

    fn piece_at(&self, snapshot: &Self::Snapshot, square: Square) -> Option<Piece>;

    /// Empty when the square is empty, holds a piece of the side not to move,
    /// or the piece has nowhere to go.
    fn legal_destinations(&self, snapshot: &Self::Snapshot, square: Square) -> BTreeSet<Square>;

    /// `promotion` is only consulted when the move is a pawn reaching the last rank;
    /// `None` there means a queen.
    fn apply_move(
        &self,
        snapshot: &Self::Snapshot,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<AppliedMove<Self::Snapshot>, IllegalMove>;

    fn is_in_check(&self, snapshot: &Self::Snapshot) -> bool;

    fn is_checkmate(&self, snapshot: &Self::Snapshot) -> bool;

    fn is_draw(&self, snapshot: &Self::Snapshot) -> bool;

    fn is_game_over(&self, snapshot: &Self::Snapshot) -> bool {
        self.is_checkmate(snapshot) || self.is_draw(snapshot)
    }

    /// Checkmate > Draw > Check > InProgress. Engines that can classify a
    /// snapshot in a single pass should override this.
    fn status(&self, snapshot: &Self::Snapshot) -> GameStatus {
        if self.is_checkmate(snapshot) {
            GameStatus::Checkmate
        } else if self.is_draw(snapshot) {
            GameStatus::Draw
        } else if self.is_in_check(snapshot) {
            GameStatus::Check
        } else {
            GameStatus::InProgress
        }
    }

    /// Full-move number of the snapshot, starting at 1.
    fn move_number(&self, _snapshot: &Self::Snapshot) -> u32 {
        1
    }

    /// Rewinds exactly one ply. Callers must not invoke this on a snapshot with no plies.
    fn undo_last_ply(&self, snapshot: &Self::Snapshot) -> Self::Snapshot;

    /// Serialized form, equal for equal positions.
    fn fen(&self, snapshot: &Self::Snapshot) -> String;
}

/// A position plus the boards of every ply that led to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    board: Board,
    earlier: Vec<Board>,
}

impl Position {
    pub fn new(board: Board) -> Self {
        Self {
            board,
            earlier: Vec::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Plies played since this position's starting board.
    pub fn ply(&self) -> usize {
        self.earlier.len()
    }

    pub fn to_fen(&self) -> String {
        self.board.to_fen()
    }
}

/// Why a finished game was drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawReason {
    Stalemate,
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
}

impl DrawReason {
    pub(crate) fn from_state(state: GameState) -> Option<Self> {
        match state {
            GameState::Stalemate => Some(DrawReason::Stalemate),
            GameState::ThreefoldRepetition => Some(DrawReason::ThreefoldRepetition),
            GameState::FiftyMoveRule => Some(DrawReason::FiftyMoveRule),
            GameState::InsufficientMaterial => Some(DrawReason::InsufficientMaterial),
            GameState::Ongoing | GameState::Checkmate(_) => None,
        }
    }
}

/// Orthodox chess over the bitboard `Board`.
#[derive(Debug, Clone)]
pub struct StandardRules {
    start: Board,
    generator: MoveGenerator,
}

impl Default for StandardRules {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardRules {
    pub fn new() -> Self {
        Self {
            start: Board::new(),
            generator: MoveGenerator::new(),
        }
    }

    /// Rules whose initial snapshot is the given position.
    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        Ok(Self {
            start: Board::from_fen(fen)?,
            generator: MoveGenerator::new(),
        })
    }

    pub fn is_standard_start(&self) -> bool {
        self.start.to_fen() == START_FEN
    }

    pub fn game_state(&self, snapshot: &Position) -> GameState {
        self.generator.get_game_state(&snapshot.board, &snapshot.earlier)
    }

    pub fn draw_reason(&self, snapshot: &Position) -> Option<DrawReason> {
        DrawReason::from_state(self.game_state(snapshot))
    }

    /// Maps an already computed `state` of `snapshot` to a status. Only an
    /// ongoing game needs the extra check test.
    pub fn status_of(&self, snapshot: &Position, state: GameState) -> GameStatus {
        match state {
            GameState::Checkmate(_) => GameStatus::Checkmate,
            GameState::Ongoing if self.is_in_check(snapshot) => GameStatus::Check,
            GameState::Ongoing => GameStatus::InProgress,
            GameState::Stalemate
            | GameState::ThreefoldRepetition
            | GameState::FiftyMoveRule
            | GameState::InsufficientMaterial => GameStatus::Draw,
        }
    }
}

impl RulesEngine for StandardRules {
    type Snapshot = Position;

    fn initial_snapshot(&self) -> Position {
        Position::new(self.start.clone())
    }

    fn side_to_move(&self, snapshot: &Position) -> Side {
        snapshot.board.side_to_move
    }

    fn piece_at(&self, snapshot: &Position, square: Square) -> Option<Piece> {
        snapshot.board.piece_at(square)
    }

    fn legal_destinations(&self, snapshot: &Position, square: Square) -> BTreeSet<Square> {
        self.generator
            .moves_from(&snapshot.board, square)
            .into_iter()
            .map(|mv| mv.to)
            .collect()
    }

    fn apply_move(
        &self,
        snapshot: &Position,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<AppliedMove<Position>, IllegalMove> {
        let wanted = promotion.unwrap_or(PieceKind::Queen);
        let mv = self
            .generator
            .moves_from(&snapshot.board, from)
            .into_iter()
            .find(|mv| mv.to == to && mv.promotion.map_or(true, |kind| kind == wanted))
            .ok_or(IllegalMove { from, to })?;

        let notation = notation::san(&self.generator, &snapshot.board, &mv);

        let mut board = snapshot.board.clone();
        board.make_move(mv);
        let mut earlier = snapshot.earlier.clone();
        earlier.push(snapshot.board.clone());

        Ok(AppliedMove {
            snapshot: Position { board, earlier },
            notation,
            promotion: mv.promotion,
        })
    }

    fn is_in_check(&self, snapshot: &Position) -> bool {
        self.generator
            .is_king_in_check(&snapshot.board, snapshot.board.side_to_move)
    }

    fn is_checkmate(&self, snapshot: &Position) -> bool {
        matches!(self.game_state(snapshot), GameState::Checkmate(_))
    }

    fn is_draw(&self, snapshot: &Position) -> bool {
        self.draw_reason(snapshot).is_some()
    }

    fn is_game_over(&self, snapshot: &Position) -> bool {
        self.status(snapshot).is_terminal()
    }

    fn status(&self, snapshot: &Position) -> GameStatus {
        self.status_of(snapshot, self.game_state(snapshot))
    }

    fn move_number(&self, snapshot: &Position) -> u32 {
        u32::from(snapshot.board.fullmove_number)
    }

    fn undo_last_ply(&self, snapshot: &Position) -> Position {
        let mut earlier = snapshot.earlier.clone();
        match earlier.pop() {
            Some(board) => Position { board, earlier },
            None => snapshot.clone(),
        }
    }

    fn fen(&self, snapshot: &Position) -> String {
        snapshot.to_fen()
    }
}
