use std::fmt;

use tracing::info;

use crate::board::{PieceKind, Side};
use crate::rules::RulesEngine;
use crate::square::Square;

/// An accepted move. Never modified after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub notation: String,
}

impl MoveRecord {
    pub fn endpoints(&self) -> LastMove {
        LastMove {
            from: self.from,
            to: self.to,
        }
    }
}

/// Endpoints of the most recent accepted move, for highlighting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastMove {
    pub from: Square,
    pub to: Square,
}

/// Everything the executor needs to adopt after an undo.
#[derive(Debug, Clone)]
pub struct Rewind<S> {
    pub snapshot: S,
    pub last_move: Option<LastMove>,
    pub undone: MoveRecord,
}

/// One numbered line of the move list. `white` is `None` only for the
/// opening line of a game that started with black to move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovePair {
    pub number: u32,
    pub white: Option<String>,
    pub black: Option<String>,
}

impl fmt::Display for MovePair {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (&self.white, &self.black) {
            (Some(white), Some(black)) => write!(f, "{}. {} {}", self.number, white, black),
            (Some(white), None) => write!(f, "{}. {}", self.number, white),
            (None, Some(black)) => write!(f, "{}... {}", self.number, black),
            (None, None) => write!(f, "{}.", self.number),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistoryTracker {
    log: Vec<MoveRecord>,
    first_side: Side,
    first_number: u32,
}

impl Default for HistoryTracker {
    fn default() -> Self {
        Self::starting_at(Side::White, 1)
    }
}

impl HistoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log whose first record is `side`'s move number `number`.
    pub fn starting_at(side: Side, number: u32) -> Self {
        Self {
            log: Vec::new(),
            first_side: side,
            first_number: number.max(1),
        }
    }

    pub fn append(&mut self, record: MoveRecord) {
        self.log.push(record);
    }

    /// Pops the last record and rewinds `current` by one ply.
    /// `None` on an empty log; the engine is not consulted then.
    pub fn undo<E: RulesEngine>(&mut self, engine: &E, current: &E::Snapshot) -> Option<Rewind<E::Snapshot>> {
        let undone = self.log.pop()?;
        let snapshot = engine.undo_last_ply(current);
        info!(notation = %undone.notation, remaining = self.log.len(), "move undone");
        Some(Rewind {
            snapshot,
            last_move: self.last_move(),
            undone,
        })
    }

    pub fn clear(&mut self) {
        self.log.clear();
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn last(&self) -> Option<&MoveRecord> {
        self.log.last()
    }

    pub fn last_move(&self) -> Option<LastMove> {
        self.log.last().map(MoveRecord::endpoints)
    }

    /// The log grouped into numbered white/black lines, counted from the
    /// side and move number the game started at.
    pub fn move_pairs(&self) -> Vec<MovePair> {
        let notation = |record: &MoveRecord| record.notation.clone();
        let lead_len = match self.first_side {
            Side::White => 0,
            Side::Black => self.log.len().min(1),
        };
        let (lead, rest) = self.log.split_at(lead_len);

        let lead = lead.first().map(|record| MovePair {
            number: self.first_number,
            white: None,
            black: Some(notation(record)),
        });
        let next_number = self.first_number + lead_len as u32;

        lead.into_iter()
            .chain(rest.chunks(2).zip(next_number..).map(|(chunk, number)| MovePair {
                number,
                white: chunk.first().map(notation),
                black: chunk.get(1).map(notation),
            }))
            .collect()
    }
}
