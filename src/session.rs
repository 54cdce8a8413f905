use std::fmt;

use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::{FenError, IllegalMove};
use crate::executor::MoveExecutor;
use crate::history::{HistoryTracker, LastMove, MoveRecord};
use crate::projector::{self, CellDescriptor, Perspective};
use crate::rules::{RulesEngine, StandardRules};
use crate::selection::{SelectionController, SelectionState, Transition};
use crate::square::Square;
use crate::status::{self, GameStatus, StatusReport};

/// Published after every observable state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SelectionChanged,
    MoveApplied(MoveRecord),
    MoveUndone(MoveRecord),
    Reset,
}

pub type Observer = Box<dyn FnMut(&SessionEvent) + Send>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The game is over; clicks are refused until `reset`.
    Rejected,
    /// Selection-only transition, including ignored clicks.
    Selection(Transition),
    Moved(MoveRecord),
    Illegal(IllegalMove),
}

/// One game: the rules engine plus the selection, move, history and status
/// state driven by clicks. Independent sessions share nothing.
pub struct GameSession<E: RulesEngine = StandardRules> {
    engine: E,
    selection: SelectionController,
    executor: MoveExecutor<E::Snapshot>,
    history: HistoryTracker,
    status: GameStatus,
    perspective: Perspective,
    observers: Vec<Observer>,
    revision: u64,
}

impl GameSession<StandardRules> {
    /// A session with the configured start position and promotion piece.
    pub fn from_config(config: &SessionConfig) -> Result<Self, FenError> {
        let rules = match &config.start_fen {
            Some(fen) => StandardRules::from_fen(fen)?,
            None => StandardRules::new(),
        };
        let mut session = Self::new(rules);
        session.selection = SelectionController::new(config.auto_promotion);
        session.perspective = config.perspective;
        Ok(session)
    }

    pub fn report(&self) -> StatusReport {
        status::describe(&self.engine, self.executor.snapshot())
    }
}

impl<E: RulesEngine> GameSession<E> {
    pub fn new(engine: E) -> Self {
        let snapshot = engine.initial_snapshot();
        let status = status::resolve(&engine, &snapshot);
        let history = HistoryTracker::starting_at(engine.side_to_move(&snapshot), engine.move_number(&snapshot));
        Self {
            engine,
            selection: SelectionController::default(),
            executor: MoveExecutor::new(snapshot),
            history,
            status,
            perspective: Perspective::White,
            observers: Vec::new(),
            revision: 0,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn snapshot(&self) -> &E::Snapshot {
        self.executor.snapshot()
    }

    pub fn selection(&self) -> &SelectionState {
        self.selection.state()
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn history(&self) -> &HistoryTracker {
        &self.history
    }

    pub fn last_move(&self) -> Option<LastMove> {
        self.executor.last_move()
    }

    pub fn fen(&self) -> String {
        self.engine.fen(self.executor.snapshot())
    }

    pub fn perspective(&self) -> Perspective {
        self.perspective
    }

    pub fn set_perspective(&mut self, perspective: Perspective) {
        self.perspective = perspective;
    }

    /// Bumped once per published event.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Cell descriptors of the current snapshot, in screen order.
    pub fn cells(&self) -> Vec<CellDescriptor> {
        projector::project(&self.engine, self.executor.snapshot(), self.perspective)
    }

    pub fn subscribe(&mut self, observer: Observer) {
        self.observers.push(observer);
    }

    pub fn handle_square_click(&mut self, square: Square) -> ClickOutcome {
        if self.status.is_terminal() {
            if self.selection.clear() {
                self.notify(SessionEvent::SelectionChanged);
            }
            debug!(%square, status = %self.status, "click rejected, game is over");
            return ClickOutcome::Rejected;
        }

        let transition = self.selection.click(&self.engine, self.executor.snapshot(), square);
        match transition {
            Transition::MoveRequested(request) => {
                let submitted = self.executor.submit(
                    &self.engine,
                    &mut self.history,
                    request.from,
                    request.to,
                    request.promotion,
                );
                self.notify(SessionEvent::SelectionChanged);
                match submitted {
                    Ok(record) => {
                        self.refresh_status();
                        self.notify(SessionEvent::MoveApplied(record.clone()));
                        ClickOutcome::Moved(record)
                    }
                    Err(illegal) => ClickOutcome::Illegal(illegal),
                }
            }
            transition => {
                if transition.changed_selection() {
                    self.notify(SessionEvent::SelectionChanged);
                }
                ClickOutcome::Selection(transition)
            }
        }
    }

    /// Takes back the last move. `false`, with nothing changed, when there is none.
    pub fn undo(&mut self) -> bool {
        let Some(rewind) = self.history.undo(&self.engine, self.executor.snapshot()) else {
            return false;
        };
        let undone = self.executor.rewind(rewind);
        if self.selection.clear() {
            self.notify(SessionEvent::SelectionChanged);
        }
        self.refresh_status();
        self.notify(SessionEvent::MoveUndone(undone));
        true
    }

    /// Back to the engine's initial snapshot with an empty history.
    pub fn reset(&mut self) {
        self.executor.reset(self.engine.initial_snapshot());
        self.history.clear();
        self.selection.clear();
        self.refresh_status();
        info!("session reset");
        self.notify(SessionEvent::Reset);
    }

    fn refresh_status(&mut self) {
        let status = status::resolve(&self.engine, self.executor.snapshot());
        if status.is_terminal() && !self.status.is_terminal() {
            info!(%status, plies = self.history.len(), "game over");
        }
        self.status = status;
    }

    fn notify(&mut self, event: SessionEvent) {
        self.revision += 1;
        for observer in self.observers.iter_mut() {
            observer(&event);
        }
    }
}

impl<E> fmt::Debug for GameSession<E>
where
    E: RulesEngine + fmt::Debug,
    E::Snapshot: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("GameSession")
            .field("engine", &self.engine)
            .field("selection", self.selection.state())
            .field("snapshot", self.executor.snapshot())
            .field("history", &self.history.records())
            .field("status", &self.status)
            .field("observers", &self.observers.len())
            .field("revision", &self.revision)
            .finish()
    }
}
