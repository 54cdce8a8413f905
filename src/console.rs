use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};

use crate::error::SquareParseError;
use crate::projector::Perspective;
use crate::session::{ClickOutcome, GameSession};
use crate::selection::Transition;
use crate::square::Square;

const USAGE: &str = "commands: <square> (e.g. e2) | undo | reset | board | history | status | fen | quit\n";

/// Line-oriented front end: every square typed is a click on the board.
pub struct ConsoleHandler {
    session: GameSession,
}

impl ConsoleHandler {
    pub fn new(session: GameSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &GameSession {
        &self.session
    }

    pub fn run(&mut self) -> Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        let mut reader = stdin.lock();
        let mut line = String::new();

        write!(stdout, "{}{}", self.render_board(), USAGE)?;
        stdout.flush()?;

        while reader.read_line(&mut line).context("failed to read from stdin")? > 0 {
            let command = line.trim();
            if command == "quit" {
                break;
            }
            let response = self.handle_command(command)?;
            write!(stdout, "{}", response)?;
            stdout.flush()?;
            line.clear();
        }
        Ok(())
    }

    pub fn handle_command(&mut self, command: &str) -> Result<String> {
        let command = command.trim();
        match command {
            "" | "quit" => Ok(String::new()),
            "undo" => Ok(if self.session.undo() {
                self.render_board()
            } else {
                "nothing to undo\n".to_string()
            }),
            "reset" => {
                self.session.reset();
                Ok(self.render_board())
            }
            "board" => Ok(self.render_board()),
            "history" => Ok(self.render_history()),
            "status" => Ok(format!("{}\n", self.session.report())),
            "fen" => Ok(format!("{}\n", self.session.fen())),
            text => match text.parse::<Square>() {
                Ok(square) => Ok(self.click(square)),
                Err(SquareParseError::Format(_)) => Ok(USAGE.to_string()),
                Err(err) => Ok(format!("{}\n", err)),
            },
        }
    }

    fn click(&mut self, square: Square) -> String {
        match self.session.handle_square_click(square) {
            ClickOutcome::Rejected => format!("game over: {}\n", self.session.report()),
            ClickOutcome::Selection(Transition::Ignored) => format!("nothing to select on {}\n", square),
            ClickOutcome::Selection(_) => self.render_board(),
            ClickOutcome::Moved(record) => {
                format!("{}{}\n{}\n", self.render_board(), record.notation, self.session.report())
            }
            ClickOutcome::Illegal(illegal) => format!("{}\n{}", illegal, self.render_board()),
        }
    }

    /// Text board; `*` marks the selection, `+` its hints, `^` the last move.
    pub fn render_board(&self) -> String {
        let selection = self.session.selection();
        let last_move = self.session.last_move();
        let cells = self.session.cells();

        let mut out = String::new();
        for row in cells.chunks(8) {
            if let Some(first) = row.first() {
                out.push(first.square.rank_char());
                out.push(' ');
            }
            for cell in row {
                let marker = if selection.selected == Some(cell.square) {
                    '*'
                } else if selection.is_hint(cell.square) {
                    '+'
                } else if last_move.map_or(false, |m| m.from == cell.square || m.to == cell.square) {
                    '^'
                } else {
                    ' '
                };
                out.push(marker);
                out.push(cell.piece.map_or('.', |piece| piece.fen_char()));
            }
            out.push('\n');
        }

        out.push_str("  ");
        let files: Vec<char> = match self.session.perspective() {
            Perspective::White => ('a'..='h').collect(),
            Perspective::Black => ('a'..='h').rev().collect(),
        };
        for file in files {
            out.push(' ');
            out.push(file);
        }
        out.push('\n');
        out
    }

    fn render_history(&self) -> String {
        let pairs = self.session.history().move_pairs();
        if pairs.is_empty() {
            return "no moves yet\n".to_string();
        }
        pairs.iter().map(|pair| format!("{}\n", pair)).collect()
    }
}
