use std::fmt;

use serde::Deserialize;

use crate::error::FenError;
use crate::movegen::{Move, MoveGenerator};
use crate::square::Square;

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

// Castling right bits: KQkq.
pub const WHITE_KINGSIDE: u8 = 0b0001;
pub const WHITE_QUEENSIDE: u8 = 0b0010;
pub const BLACK_KINGSIDE: u8 = 0b0100;
pub const BLACK_QUEENSIDE: u8 = 0b1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::Pawn,
        PieceKind::Knight,
        PieceKind::Bishop,
        PieceKind::Rook,
        PieceKind::Queen,
        PieceKind::King,
    ];

    /// Bitboard slot in `Board::white_pieces` / `Board::black_pieces`.
    pub fn index(self) -> usize {
        match self {
            PieceKind::Pawn => 0,
            PieceKind::Knight => 1,
            PieceKind::Bishop => 2,
            PieceKind::Rook => 3,
            PieceKind::Queen => 4,
            PieceKind::King => 5,
        }
    }

    /// Upper case letter; pawns use 'P' here even though SAN omits them.
    pub fn letter(self) -> char {
        match self {
            PieceKind::Pawn => 'P',
            PieceKind::Knight => 'N',
            PieceKind::Bishop => 'B',
            PieceKind::Rook => 'R',
            PieceKind::Queen => 'Q',
            PieceKind::King => 'K',
        }
    }

    fn from_letter(letter: char) -> Option<PieceKind> {
        match letter.to_ascii_uppercase() {
            'P' => Some(PieceKind::Pawn),
            'N' => Some(PieceKind::Knight),
            'B' => Some(PieceKind::Bishop),
            'R' => Some(PieceKind::Rook),
            'Q' => Some(PieceKind::Queen),
            'K' => Some(PieceKind::King),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(&self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::White => write!(f, "white"),
            Side::Black => write!(f, "black"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub side: Side,
}

impl Piece {
    pub fn new(kind: PieceKind, side: Side) -> Self {
        Self { kind, side }
    }

    /// FEN letter: upper case for white, lower case for black.
    pub fn fen_char(&self) -> char {
        match self.side {
            Side::White => self.kind.letter(),
            Side::Black => self.kind.letter().to_ascii_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    pub white_pieces: [u64; 6], // Pawn, Knight, Bishop, Rook, Queen, King
    pub black_pieces: [u64; 6], // Pawn, Knight, Bishop, Rook, Queen, King
    pub side_to_move: Side,
    pub castling_rights: u8, // 4 bits: KQkq
    pub en_passant_square: Option<Square>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            white_pieces: [
                0x000000000000FF00, // Pawns
                0x0000000000000042, // Knights
                0x0000000000000024, // Bishops
                0x0000000000000081, // Rooks
                0x0000000000000008, // Queen
                0x0000000000000010, // King
            ],
            black_pieces: [
                0x00FF000000000000, // Pawns
                0x4200000000000000, // Knights
                0x2400000000000000, // Bishops
                0x8100000000000000, // Rooks
                0x0800000000000000, // Queen
                0x1000000000000000, // King
            ],
            side_to_move: Side::White,
            castling_rights: 0b1111,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// A board with no pieces, white to move and no castling rights.
    pub fn empty() -> Self {
        Self {
            white_pieces: [0; 6],
            black_pieces: [0; 6],
            side_to_move: Side::White,
            castling_rights: 0,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    pub fn pieces(&self, side: Side) -> &[u64; 6] {
        match side {
            Side::White => &self.white_pieces,
            Side::Black => &self.black_pieces,
        }
    }

    fn pieces_mut(&mut self, side: Side) -> &mut [u64; 6] {
        match side {
            Side::White => &mut self.white_pieces,
            Side::Black => &mut self.black_pieces,
        }
    }

    pub fn occupancy(&self, side: Side) -> u64 {
        self.pieces(side).iter().fold(0, |acc, &bb| acc | bb)
    }

    pub fn occupied(&self) -> u64 {
        self.occupancy(Side::White) | self.occupancy(Side::Black)
    }

    pub fn put(&mut self, square: Square, piece: Piece) {
        self.clear(square);
        self.pieces_mut(piece.side)[piece.kind.index()] |= square.mask();
    }

    pub fn clear(&mut self, square: Square) {
        let mask = !square.mask();
        for bb in self.white_pieces.iter_mut().chain(self.black_pieces.iter_mut()) {
            *bb &= mask;
        }
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        let mask = square.mask();
        for side in [Side::White, Side::Black] {
            for kind in PieceKind::ALL {
                if self.pieces(side)[kind.index()] & mask != 0 {
                    return Some(Piece::new(kind, side));
                }
            }
        }
        None
    }

    pub fn king_square(&self, side: Side) -> Option<Square> {
        Square::iter_mask(self.pieces(side)[PieceKind::King.index()]).next()
    }

    /// Applies a move produced by the move generator. No legality check.
    pub fn make_move(&mut self, mv: Move) {
        let us = self.side_to_move;
        let them = us.opposite();

        self.pieces_mut(us)[mv.piece.index()] &= !mv.from.mask();

        if let Some(captured) = mv.captured_piece {
            let captured_square = if mv.is_en_passant {
                // The captured pawn sits beside the mover, behind the target square.
                Square::new(mv.to.file(), mv.from.rank()).unwrap_or(mv.to)
            } else {
                mv.to
            };
            self.pieces_mut(them)[captured.index()] &= !captured_square.mask();

            // Losing a rook on its home square loses that castling right.
            if captured == PieceKind::Rook {
                self.castling_rights &= !rook_home_right(captured_square);
            }
        }

        let placed = mv.promotion.unwrap_or(mv.piece);
        self.pieces_mut(us)[placed.index()] |= mv.to.mask();

        if mv.is_castling {
            if let (Some(rook_from), Some(rook_to)) = (mv.castling_rook_from, mv.castling_rook_to) {
                let rooks = &mut self.pieces_mut(us)[PieceKind::Rook.index()];
                *rooks &= !rook_from.mask();
                *rooks |= rook_to.mask();
            }
        }

        match mv.piece {
            PieceKind::King => {
                self.castling_rights &= match us {
                    Side::White => !(WHITE_KINGSIDE | WHITE_QUEENSIDE),
                    Side::Black => !(BLACK_KINGSIDE | BLACK_QUEENSIDE),
                };
            }
            PieceKind::Rook => self.castling_rights &= !rook_home_right(mv.from),
            _ => {}
        }

        self.en_passant_square = if mv.piece == PieceKind::Pawn && mv.from.rank().abs_diff(mv.to.rank()) == 2 {
            Square::new(mv.from.file(), (mv.from.rank() + mv.to.rank()) / 2)
        } else {
            None
        };

        if mv.piece == PieceKind::Pawn || mv.captured_piece.is_some() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if us == Side::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }

        self.side_to_move = them;
    }

    pub fn from_fen(fen: &str) -> Result<Self, FenError> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 {
            return Err(FenError::FieldCount(fields.len()));
        }

        let mut board = Board::empty();

        let ranks: Vec<&str> = fields[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(FenError::Placement(format!("expected 8 ranks, got {}", ranks.len())));
        }
        for (row, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - row as u8;
            let mut file = 0u8;
            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(FenError::Placement(format!("bad empty run '{}'", c)));
                    }
                    file += skip as u8;
                } else {
                    let kind = PieceKind::from_letter(c)
                        .ok_or_else(|| FenError::Placement(format!("unknown piece '{}'", c)))?;
                    let side = if c.is_ascii_uppercase() { Side::White } else { Side::Black };
                    let square = Square::new(file, rank)
                        .ok_or_else(|| FenError::Placement(format!("rank {} overflows", rank + 1)))?;
                    board.put(square, Piece::new(kind, side));
                    file += 1;
                }
                if file > 8 {
                    return Err(FenError::Placement(format!("rank {} overflows", rank + 1)));
                }
            }
            if file != 8 {
                return Err(FenError::Placement(format!("rank {} has {} files", rank + 1, file)));
            }
        }

        board.side_to_move = match fields[1] {
            "w" => Side::White,
            "b" => Side::Black,
            other => return Err(FenError::SideToMove(other.to_string())),
        };

        if fields[2] != "-" {
            for c in fields[2].chars() {
                board.castling_rights |= match c {
                    'K' => WHITE_KINGSIDE,
                    'Q' => WHITE_QUEENSIDE,
                    'k' => BLACK_KINGSIDE,
                    'q' => BLACK_QUEENSIDE,
                    _ => return Err(FenError::Castling(fields[2].to_string())),
                };
            }
        }

        board.en_passant_square = match fields[3] {
            "-" => None,
            text => Some(text.parse().map_err(|_| FenError::EnPassant(text.to_string()))?),
        };

        if let Some(text) = fields.get(4) {
            board.halfmove_clock = text.parse().map_err(|_| FenError::Counter(text.to_string()))?;
        }
        if let Some(text) = fields.get(5) {
            board.fullmove_number = text.parse().map_err(|_| FenError::Counter(text.to_string()))?;
        }

        for side in [Side::White, Side::Black] {
            if board.pieces(side)[PieceKind::King.index()].count_ones() != 1 {
                return Err(FenError::MissingKing);
            }
        }

        let waiting = board.side_to_move.opposite();
        if MoveGenerator::new().is_king_in_check(&board, waiting) {
            return Err(FenError::OpponentInCheck(waiting));
        }

        Ok(board)
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match Square::new(file, rank).and_then(|sq| self.piece_at(sq)) {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Side::White => 'w',
            Side::Black => 'b',
        });

        fen.push(' ');
        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            for (bit, c) in [
                (WHITE_KINGSIDE, 'K'),
                (WHITE_QUEENSIDE, 'Q'),
                (BLACK_KINGSIDE, 'k'),
                (BLACK_QUEENSIDE, 'q'),
            ] {
                if self.castling_rights & bit != 0 {
                    fen.push(c);
                }
            }
        }

        fen.push(' ');
        match self.en_passant_square {
            Some(square) => fen.push_str(&square.to_string()),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }
}

fn rook_home_right(square: Square) -> u8 {
    match square.index() {
        0 => WHITE_QUEENSIDE,
        7 => WHITE_KINGSIDE,
        56 => BLACK_QUEENSIDE,
        63 => BLACK_KINGSIDE,
        _ => 0,
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for rank in (0..8).rev() {
            for file in 0..8 {
                let c = Square::new(file, rank)
                    .and_then(|sq| self.piece_at(sq))
                    .map_or('.', |piece| piece.fen_char());
                result.push(c);
                if file < 7 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        write!(f, "{}", result)
    }
}
