pub mod board;
pub mod config;
pub mod console;
pub mod error;
pub mod executor;
pub mod history;
pub mod movegen;
pub mod notation;
pub mod projector;
pub mod rules;
pub mod selection;
pub mod session;
pub mod square;
pub mod status;

pub use board::{Piece, PieceKind, Side};
pub use error::IllegalMove;
pub use rules::{RulesEngine, StandardRules};
pub use session::{ClickOutcome, GameSession};
pub use square::Square;
pub use status::GameStatus;
