//! Standard algebraic notation for moves produced by the move generator.

use crate::board::{Board, PieceKind};
use crate::movegen::{Move, MoveGenerator};

/// SAN for a legal `mv` played from `board`, including the `+`/`#` suffix.
pub fn san(generator: &MoveGenerator, board: &Board, mv: &Move) -> String {
    let mut text = String::new();

    if mv.is_castling {
        text.push_str(if mv.to.file() > mv.from.file() { "O-O" } else { "O-O-O" });
    } else if mv.piece == PieceKind::Pawn {
        if mv.is_capture() {
            text.push(mv.from.file_char());
            text.push('x');
        }
        text.push_str(&mv.to.to_string());
        if let Some(promotion) = mv.promotion {
            text.push('=');
            text.push(promotion.letter());
        }
    } else {
        text.push(mv.piece.letter());
        text.push_str(&disambiguation(generator, board, mv));
        if mv.is_capture() {
            text.push('x');
        }
        text.push_str(&mv.to.to_string());
    }

    let mut after = board.clone();
    after.make_move(*mv);
    if generator.is_king_in_check(&after, after.side_to_move) {
        if generator.generate_moves(&after).is_empty() {
            text.push('#');
        } else {
            text.push('+');
        }
    }

    text
}

fn disambiguation(generator: &MoveGenerator, board: &Board, mv: &Move) -> String {
    let rivals: Vec<Move> = generator
        .generate_moves(board)
        .into_iter()
        .filter(|other| other.piece == mv.piece && other.to == mv.to && other.from != mv.from)
        .collect();

    if rivals.is_empty() {
        return String::new();
    }
    if rivals.iter().all(|other| other.from.file() != mv.from.file()) {
        return mv.from.file_char().to_string();
    }
    if rivals.iter().all(|other| other.from.rank() != mv.from.rank()) {
        return mv.from.rank_char().to_string();
    }
    mv.from.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::square::Square;

    fn san_of(fen: &str, from: &str, to: &str, promotion: Option<PieceKind>) -> String {
        let board = Board::from_fen(fen).unwrap();
        let generator = MoveGenerator::new();
        let from: Square = from.parse().unwrap();
        let to: Square = to.parse().unwrap();
        let mv = generator
            .moves_from(&board, from)
            .into_iter()
            .find(|mv| mv.to == to && mv.promotion == promotion)
            .unwrap();
        san(&generator, &board, &mv)
    }

    #[test]
    fn quiet_moves() {
        let start = crate::board::START_FEN;
        assert_eq!(san_of(start, "e2", "e4", None), "e4");
        assert_eq!(san_of(start, "g1", "f3", None), "Nf3");
    }

    #[test]
    fn captures() {
        let fen = "rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2";
        assert_eq!(san_of(fen, "e4", "d5", None), "exd5");
        let fen = "4k3/8/8/3p4/8/8/8/3RK3 w - - 0 1";
        assert_eq!(san_of(fen, "d1", "d5", None), "Rxd5");
    }

    #[test]
    fn castling() {
        let fen = "r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1";
        assert_eq!(san_of(fen, "e1", "g1", None), "O-O");
        assert_eq!(san_of(fen, "e1", "c1", None), "O-O-O");
    }

    #[test]
    fn promotion_with_check() {
        let fen = "4k3/P7/8/8/8/8/8/4K3 w - - 0 1";
        assert_eq!(san_of(fen, "a7", "a8", Some(PieceKind::Queen)), "a8=Q+");
        assert_eq!(san_of(fen, "a7", "a8", Some(PieceKind::Knight)), "a8=N");
    }

    #[test]
    fn disambiguates_by_file_then_rank() {
        // Knights on b1 and f1 both reach d2.
        let fen = "4k3/8/8/8/8/8/8/1N2KN2 w - - 0 1";
        assert_eq!(san_of(fen, "b1", "d2", None), "Nbd2");
        // Rooks on a1 and a5 both reach a3.
        let fen = "4k3/8/8/R7/8/8/8/R3K3 w - - 0 1";
        assert_eq!(san_of(fen, "a1", "a3", None), "R1a3");
    }

    #[test]
    fn mate_suffix() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq g3 0 2";
        assert_eq!(san_of(fen, "d8", "h4", None), "Qh4#");
    }
}
