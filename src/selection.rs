use std::collections::BTreeSet;

use tracing::debug;

use crate::board::PieceKind;
use crate::rules::RulesEngine;
use crate::square::Square;

/// The selected square and its legal destinations.
///
/// `hints` is non-empty only while a side-to-move piece is selected, and is
/// always the engine's destination set at the moment of selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    pub selected: Option<Square>,
    pub hints: BTreeSet<Square>,
}

impl SelectionState {
    pub fn is_idle(&self) -> bool {
        self.selected.is_none()
    }

    pub fn is_hint(&self, square: Square) -> bool {
        self.hints.contains(&square)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

/// What a click did to the selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing happened.
    Ignored,
    Selected(Square),
    Reselected { from: Square, to: Square },
    Deselected(Square),
    Cancelled(Square),
    /// The click landed on a hint. The selection is already cleared.
    MoveRequested(MoveRequest),
}

impl Transition {
    /// True when `selected` or `hints` changed.
    pub fn changed_selection(&self) -> bool {
        !matches!(self, Transition::Ignored)
    }
}

#[derive(Debug, Clone)]
pub struct SelectionController {
    state: SelectionState,
    auto_promotion: PieceKind,
}

impl Default for SelectionController {
    fn default() -> Self {
        Self::new(PieceKind::Queen)
    }
}

impl SelectionController {
    pub fn new(auto_promotion: PieceKind) -> Self {
        Self {
            state: SelectionState::default(),
            auto_promotion,
        }
    }

    pub fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Back to idle. Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        let was_selected = self.state.selected.is_some();
        self.state = SelectionState::default();
        was_selected
    }

    pub fn click<E: RulesEngine>(&mut self, engine: &E, snapshot: &E::Snapshot, square: Square) -> Transition {
        let own_piece = engine
            .piece_at(snapshot, square)
            .map_or(false, |piece| piece.side == engine.side_to_move(snapshot));

        let Some(selected) = self.state.selected else {
            if own_piece {
                self.select(engine, snapshot, square);
                return Transition::Selected(square);
            }
            debug!(%square, "click ignored, nothing to select");
            return Transition::Ignored;
        };

        if square == selected {
            self.clear();
            return Transition::Deselected(square);
        }

        if self.state.hints.contains(&square) {
            self.clear();
            return Transition::MoveRequested(MoveRequest {
                from: selected,
                to: square,
                promotion: Some(self.auto_promotion),
            });
        }

        if own_piece {
            self.select(engine, snapshot, square);
            return Transition::Reselected { from: selected, to: square };
        }

        self.clear();
        Transition::Cancelled(selected)
    }

    fn select<E: RulesEngine>(&mut self, engine: &E, snapshot: &E::Snapshot, square: Square) {
        let hints = engine.legal_destinations(snapshot, square);
        debug!(%square, hints = hints.len(), "piece selected");
        self.state = SelectionState {
            selected: Some(square),
            hints,
        };
    }
}
