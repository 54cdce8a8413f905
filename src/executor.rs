use tracing::{debug, info};

use crate::board::PieceKind;
use crate::error::IllegalMove;
use crate::history::{HistoryTracker, LastMove, MoveRecord, Rewind};
use crate::rules::RulesEngine;
use crate::square::Square;

/// Owns the current snapshot and the last-move highlight.
#[derive(Debug, Clone)]
pub struct MoveExecutor<S> {
    snapshot: S,
    last_move: Option<LastMove>,
}

impl<S: Clone> MoveExecutor<S> {
    pub fn new(snapshot: S) -> Self {
        Self {
            snapshot,
            last_move: None,
        }
    }

    pub fn snapshot(&self) -> &S {
        &self.snapshot
    }

    pub fn last_move(&self) -> Option<LastMove> {
        self.last_move
    }

    /// Validates and applies a move against the current snapshot.
    ///
    /// On success the new snapshot, the last move and the history append are
    /// committed together. On rejection nothing changes.
    pub fn submit<E>(
        &mut self,
        engine: &E,
        history: &mut HistoryTracker,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<MoveRecord, IllegalMove>
    where
        E: RulesEngine<Snapshot = S>,
    {
        let applied = engine
            .apply_move(&self.snapshot, from, to, promotion.or(Some(PieceKind::Queen)))
            .map_err(|err| {
                debug!(%from, %to, "move rejected");
                err
            })?;

        let record = MoveRecord {
            from,
            to,
            promotion: applied.promotion,
            notation: applied.notation,
        };

        // Nothing below can fail.
        self.snapshot = applied.snapshot;
        self.last_move = Some(record.endpoints());
        history.append(record.clone());

        info!(notation = %record.notation, ply = history.len(), "move accepted");
        Ok(record)
    }

    /// Adopts the snapshot produced by an undo.
    pub fn rewind(&mut self, rewind: Rewind<S>) -> MoveRecord {
        self.snapshot = rewind.snapshot;
        self.last_move = rewind.last_move;
        rewind.undone
    }

    /// Full reset to a fresh snapshot with no highlight.
    pub fn reset(&mut self, snapshot: S) {
        self.snapshot = snapshot;
        self.last_move = None;
    }
}
