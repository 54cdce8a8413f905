use crate::board::{
    Board, PieceKind, Side, BLACK_KINGSIDE, BLACK_QUEENSIDE, WHITE_KINGSIDE, WHITE_QUEENSIDE,
};
use crate::square::Square;

const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (1, 2), (2, 1), (2, -1), (1, -2),
    (-1, -2), (-2, -1), (-2, 1), (-1, 2),
];

const KING_OFFSETS: [(i8, i8); 8] = [
    (0, 1), (1, 1), (1, 0), (1, -1),
    (0, -1), (-1, -1), (-1, 0), (-1, 1),
];

const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

const PROMOTIONS: [PieceKind; 4] = [
    PieceKind::Queen,
    PieceKind::Rook,
    PieceKind::Bishop,
    PieceKind::Knight,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub piece: PieceKind,
    pub captured_piece: Option<PieceKind>,
    pub promotion: Option<PieceKind>,
    pub is_en_passant: bool,
    pub is_castling: bool,
    pub castling_rook_from: Option<Square>,
    pub castling_rook_to: Option<Square>,
}

impl Move {
    pub fn new(from: Square, to: Square, piece: PieceKind) -> Self {
        Self {
            from,
            to,
            piece,
            captured_piece: None,
            promotion: None,
            is_en_passant: false,
            is_castling: false,
            castling_rook_from: None,
            castling_rook_to: None,
        }
    }

    pub fn new_en_passant(from: Square, to: Square) -> Self {
        Self {
            captured_piece: Some(PieceKind::Pawn),
            is_en_passant: true,
            ..Self::new(from, to, PieceKind::Pawn)
        }
    }

    /// The king's move; the rook hop is carried alongside.
    pub fn new_castling(from: Square, to: Square, rook_from: Square, rook_to: Square) -> Self {
        Self {
            is_castling: true,
            castling_rook_from: Some(rook_from),
            castling_rook_to: Some(rook_to),
            ..Self::new(from, to, PieceKind::King)
        }
    }

    pub fn new_promotion(from: Square, to: Square, captured: Option<PieceKind>, promotion: PieceKind) -> Self {
        Self {
            captured_piece: captured,
            promotion: Some(promotion),
            ..Self::new(from, to, PieceKind::Pawn)
        }
    }

    pub fn is_capture(&self) -> bool {
        self.captured_piece.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    Ongoing,
    Checkmate(Side), // winner
    Stalemate,
    ThreefoldRepetition,
    FiftyMoveRule,
    InsufficientMaterial,
}

/// Stateless legal move generator over `Board`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        Self
    }

    fn sliding_attacks(&self, square: Square, occupied: u64, directions: &[(i8, i8)]) -> u64 {
        let mut attacks = 0u64;
        for &(df, dr) in directions {
            let mut current = square;
            while let Some(target) = current.offset(df, dr) {
                attacks |= target.mask();
                if occupied & target.mask() != 0 {
                    break;
                }
                current = target;
            }
        }
        attacks
    }

    fn step_attacks(&self, square: Square, offsets: &[(i8, i8)]) -> u64 {
        offsets
            .iter()
            .filter_map(|&(df, dr)| square.offset(df, dr))
            .fold(0, |acc, target| acc | target.mask())
    }

    fn get_bishop_attacks(&self, square: Square, occupied: u64) -> u64 {
        self.sliding_attacks(square, occupied, &DIAGONALS)
    }

    fn get_rook_attacks(&self, square: Square, occupied: u64) -> u64 {
        self.sliding_attacks(square, occupied, &ORTHOGONALS)
    }

    pub fn is_square_under_attack(&self, board: &Board, square: Square, attacker: Side) -> bool {
        let attackers = board.pieces(attacker);
        let occupied = board.occupied();

        // A pawn attacks diagonally forward, so look one rank behind the target.
        let pawn_rank_delta = match attacker {
            Side::White => -1,
            Side::Black => 1,
        };
        let pawn_sources = [square.offset(-1, pawn_rank_delta), square.offset(1, pawn_rank_delta)];
        if pawn_sources
            .iter()
            .flatten()
            .any(|source| attackers[PieceKind::Pawn.index()] & source.mask() != 0)
        {
            return true;
        }

        if self.step_attacks(square, &KNIGHT_OFFSETS) & attackers[PieceKind::Knight.index()] != 0 {
            return true;
        }
        if self.step_attacks(square, &KING_OFFSETS) & attackers[PieceKind::King.index()] != 0 {
            return true;
        }

        let queens = attackers[PieceKind::Queen.index()];
        let diagonal_sliders = attackers[PieceKind::Bishop.index()] | queens;
        if self.get_bishop_attacks(square, occupied) & diagonal_sliders != 0 {
            return true;
        }
        let straight_sliders = attackers[PieceKind::Rook.index()] | queens;
        self.get_rook_attacks(square, occupied) & straight_sliders != 0
    }

    pub fn is_king_in_check(&self, board: &Board, side: Side) -> bool {
        match board.king_square(side) {
            Some(king) => self.is_square_under_attack(board, king, side.opposite()),
            None => false,
        }
    }

    /// All legal moves for the side to move.
    pub fn generate_moves(&self, board: &Board) -> Vec<Move> {
        let us = board.side_to_move;
        let mut pseudo = Vec::new();
        for from in Square::iter_mask(board.occupancy(us)) {
            self.pseudo_moves_from(board, from, &mut pseudo);
        }
        self.retain_legal(board, pseudo)
    }

    /// Legal moves of the piece on `from`; empty unless it belongs to the side to move.
    pub fn moves_from(&self, board: &Board, from: Square) -> Vec<Move> {
        let mut pseudo = Vec::new();
        self.pseudo_moves_from(board, from, &mut pseudo);
        self.retain_legal(board, pseudo)
    }

    pub fn is_move_valid(&self, board: &Board, mv: &Move) -> bool {
        self.moves_from(board, mv.from).contains(mv)
    }

    fn retain_legal(&self, board: &Board, moves: Vec<Move>) -> Vec<Move> {
        let us = board.side_to_move;
        moves
            .into_iter()
            .filter(|mv| {
                // Make the move and check if the king is in check
                let mut board_copy = board.clone();
                board_copy.make_move(*mv);
                !self.is_king_in_check(&board_copy, us)
            })
            .collect()
    }

    fn pseudo_moves_from(&self, board: &Board, from: Square, moves: &mut Vec<Move>) {
        let us = board.side_to_move;
        let piece = match board.piece_at(from) {
            Some(piece) if piece.side == us => piece,
            _ => return,
        };
        let own = board.occupancy(us);
        let occupied = board.occupied();

        let targets = match piece.kind {
            PieceKind::Pawn => {
                self.pawn_moves(board, from, moves);
                return;
            }
            PieceKind::Knight => self.step_attacks(from, &KNIGHT_OFFSETS),
            PieceKind::Bishop => self.get_bishop_attacks(from, occupied),
            PieceKind::Rook => self.get_rook_attacks(from, occupied),
            PieceKind::Queen => {
                self.get_bishop_attacks(from, occupied) | self.get_rook_attacks(from, occupied)
            }
            PieceKind::King => {
                self.castling_moves(board, from, moves);
                self.step_attacks(from, &KING_OFFSETS)
            }
        };

        for to in Square::iter_mask(targets & !own) {
            let mut mv = Move::new(from, to, piece.kind);
            mv.captured_piece = board.piece_at(to).map(|p| p.kind);
            moves.push(mv);
        }
    }

    fn pawn_moves(&self, board: &Board, from: Square, moves: &mut Vec<Move>) {
        let us = board.side_to_move;
        let (forward, start_rank, last_rank) = match us {
            Side::White => (1i8, 1u8, 7u8),
            Side::Black => (-1i8, 6u8, 0u8),
        };
        let occupied = board.occupied();
        let enemies = board.occupancy(us.opposite());

        let mut push = |to: Square, captured: Option<PieceKind>| {
            if to.rank() == last_rank {
                for promotion in PROMOTIONS {
                    moves.push(Move::new_promotion(from, to, captured, promotion));
                }
            } else {
                let mut mv = Move::new(from, to, PieceKind::Pawn);
                mv.captured_piece = captured;
                moves.push(mv);
            }
        };

        // Single and double push
        if let Some(one) = from.offset(0, forward) {
            if occupied & one.mask() == 0 {
                push(one, None);
                if from.rank() == start_rank {
                    if let Some(two) = one.offset(0, forward) {
                        if occupied & two.mask() == 0 {
                            push(two, None);
                        }
                    }
                }
            }
        }

        // Captures
        for df in [-1, 1] {
            if let Some(to) = from.offset(df, forward) {
                if enemies & to.mask() != 0 {
                    push(to, board.piece_at(to).map(|p| p.kind));
                }
            }
        }

        // En passant
        if let Some(ep) = board.en_passant_square {
            let adjacent = from.offset(-1, forward) == Some(ep) || from.offset(1, forward) == Some(ep);
            let victim = Square::new(ep.file(), from.rank());
            let victim_present = victim.map_or(false, |sq| {
                board.pieces(us.opposite())[PieceKind::Pawn.index()] & sq.mask() != 0
            });
            if adjacent && victim_present {
                moves.push(Move::new_en_passant(from, ep));
            }
        }
    }

    fn castling_moves(&self, board: &Board, from: Square, moves: &mut Vec<Move>) {
        let us = board.side_to_move;
        let them = us.opposite();
        let (home, kingside, queenside) = match us {
            Side::White => (0u8, WHITE_KINGSIDE, WHITE_QUEENSIDE),
            Side::Black => (7u8, BLACK_KINGSIDE, BLACK_QUEENSIDE),
        };
        if Square::new(4, home) != Some(from) {
            return;
        }
        let occupied = board.occupied();
        let rooks = board.pieces(us)[PieceKind::Rook.index()];
        let at = |file: u8| Square::new(file, home);

        // (right, rook file, king target file, rook target file, files that must be empty, files the king crosses)
        let options: [(u8, u8, u8, u8, &[u8], &[u8]); 2] = [
            (kingside, 7, 6, 5, &[5, 6], &[4, 5, 6]),
            (queenside, 0, 2, 3, &[1, 2, 3], &[4, 3, 2]),
        ];

        for (right, rook_file, king_to, rook_to, empty, crossed) in options {
            if board.castling_rights & right == 0 {
                continue;
            }
            let (Some(rook_from), Some(king_target), Some(rook_target)) = (at(rook_file), at(king_to), at(rook_to))
            else {
                continue;
            };
            if rooks & rook_from.mask() == 0 {
                continue;
            }
            let path_clear = empty
                .iter()
                .filter_map(|&file| at(file))
                .all(|sq| occupied & sq.mask() == 0);
            let path_safe = crossed
                .iter()
                .filter_map(|&file| at(file))
                .all(|sq| !self.is_square_under_attack(board, sq, them));
            if path_clear && path_safe {
                moves.push(Move::new_castling(from, king_target, rook_from, rook_target));
            }
        }
    }

    /// Classifies `board`; `earlier` holds the positions of every previous ply, oldest first.
    pub fn get_game_state(&self, board: &Board, earlier: &[Board]) -> GameState {
        let moves = self.generate_moves(board);
        if moves.is_empty() {
            return if self.is_king_in_check(board, board.side_to_move) {
                // Checkmate - the side to move is in check and has no legal moves
                GameState::Checkmate(board.side_to_move.opposite())
            } else {
                GameState::Stalemate
            };
        }

        if self.is_insufficient_material(board) {
            return GameState::InsufficientMaterial;
        }

        // Fifty moves per side
        if board.halfmove_clock >= 100 {
            return GameState::FiftyMoveRule;
        }

        if self.is_threefold_repetition(board, earlier) {
            return GameState::ThreefoldRepetition;
        }

        GameState::Ongoing
    }

    fn is_threefold_repetition(&self, board: &Board, earlier: &[Board]) -> bool {
        let current = RepetitionKey::of(self, board);
        let occurrences = 1 + earlier
            .iter()
            .filter(|past| RepetitionKey::of(self, past) == current)
            .count();
        occurrences >= 3
    }

    fn is_insufficient_material(&self, board: &Board) -> bool {
        let heavy = |side: Side| {
            let pieces = board.pieces(side);
            pieces[PieceKind::Pawn.index()]
                | pieces[PieceKind::Rook.index()]
                | pieces[PieceKind::Queen.index()]
        };
        if heavy(Side::White) | heavy(Side::Black) != 0 {
            return false;
        }

        let knights = |side: Side| board.pieces(side)[PieceKind::Knight.index()];
        let bishops = |side: Side| board.pieces(side)[PieceKind::Bishop.index()];
        let minors = (knights(Side::White) | bishops(Side::White) | knights(Side::Black) | bishops(Side::Black))
            .count_ones();

        // King vs King, or a single minor piece
        if minors <= 1 {
            return true;
        }

        // Only bishops, all on the same square color
        if knights(Side::White) | knights(Side::Black) == 0 {
            let all_bishops = bishops(Side::White) | bishops(Side::Black);
            let mut colors = Square::iter_mask(all_bishops).map(|sq| sq.is_light());
            if let Some(first) = colors.next() {
                return colors.all(|light| light == first);
            }
        }

        false
    }
}

/// What makes two positions "the same" for repetition purposes.
///
/// The en-passant square only counts while a legal en-passant capture exists.
#[derive(Debug, PartialEq, Eq)]
struct RepetitionKey {
    white_pieces: [u64; 6],
    black_pieces: [u64; 6],
    side_to_move: Side,
    castling_rights: u8,
    en_passant_square: Option<Square>,
}

impl RepetitionKey {
    fn of(generator: &MoveGenerator, board: &Board) -> Self {
        let en_passant_square = board.en_passant_square.filter(|&ep| {
            generator
                .generate_moves(board)
                .iter()
                .any(|mv| mv.is_en_passant && mv.to == ep)
        });
        Self {
            white_pieces: board.white_pieces,
            black_pieces: board.black_pieces,
            side_to_move: board.side_to_move,
            castling_rights: board.castling_rights,
            en_passant_square,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(name: &str) -> Square {
        name.parse().unwrap()
    }

    fn perft(board: &Board, generator: &MoveGenerator, depth: u32) -> u64 {
        if depth == 0 {
            return 1;
        }

        let moves = generator.generate_moves(board);
        if depth == 1 {
            return moves.len() as u64;
        }

        let mut nodes = 0;
        for mv in moves {
            let mut new_board = board.clone();
            new_board.make_move(mv);
            nodes += perft(&new_board, generator, depth - 1);
        }
        nodes
    }

    #[test]
    fn test_perft_initial_position() {
        let board = Board::new();
        let generator = MoveGenerator::new();
        assert_eq!(perft(&board, &generator, 1), 20);
        assert_eq!(perft(&board, &generator, 2), 400);
        assert_eq!(perft(&board, &generator, 3), 8902);
    }

    #[test]
    fn test_perft_kiwipete() {
        // Exercises castling, en passant and promotions together.
        let board =
            Board::from_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1").unwrap();
        let generator = MoveGenerator::new();
        assert_eq!(perft(&board, &generator, 1), 48);
        assert_eq!(perft(&board, &generator, 2), 2039);
    }

    #[test]
    fn test_pawn_attacks_point_forward() {
        let generator = MoveGenerator::new();
        let board = Board::from_fen("4k3/8/8/8/8/8/4P3/K7 w - - 0 1").unwrap();
        assert!(generator.is_square_under_attack(&board, sq("d3"), Side::White));
        assert!(generator.is_square_under_attack(&board, sq("f3"), Side::White));
        assert!(!generator.is_square_under_attack(&board, sq("d1"), Side::White));
        assert!(!generator.is_square_under_attack(&board, sq("e3"), Side::White));
    }

    #[test]
    fn test_castling() {
        let board = Board::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let generator = MoveGenerator::new();
        let moves = generator.moves_from(&board, sq("e1"));
        assert!(moves.iter().any(|mv| mv.is_castling && mv.to == sq("g1")));
        assert!(moves.iter().any(|mv| mv.is_castling && mv.to == sq("c1")));
    }

    #[test]
    fn test_no_castling_through_check() {
        // The black rook on f8 covers f1.
        let board = Board::from_fen("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let generator = MoveGenerator::new();
        let moves = generator.moves_from(&board, sq("e1"));
        assert!(!moves.iter().any(|mv| mv.is_castling && mv.to == sq("g1")));
        assert!(moves.iter().any(|mv| mv.is_castling && mv.to == sq("c1")));
    }

    #[test]
    fn test_en_passant() {
        let board = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let generator = MoveGenerator::new();
        let moves = generator.moves_from(&board, sq("e5"));
        assert!(moves.iter().any(|mv| mv.is_en_passant && mv.to == sq("d6")));
    }

    #[test]
    fn test_promotion() {
        let board = Board::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let generator = MoveGenerator::new();
        let promotions = generator
            .moves_from(&board, sq("a7"))
            .iter()
            .filter(|mv| mv.promotion.is_some())
            .count();
        // Queen, Rook, Bishop, Knight
        assert_eq!(promotions, 4);
    }

    #[test]
    fn test_pinned_piece_has_no_moves() {
        // The e2 knight is pinned against the king by the e8 rook.
        let board = Board::from_fen("k3r3/8/8/8/8/8/4N3/4K3 w - - 0 1").unwrap();
        let generator = MoveGenerator::new();
        assert!(generator.moves_from(&board, sq("e2")).is_empty());
    }

    #[test]
    fn test_moves_from_opponent_square_is_empty() {
        let generator = MoveGenerator::new();
        assert!(generator.moves_from(&Board::new(), sq("e7")).is_empty());
        assert!(generator.moves_from(&Board::new(), sq("e4")).is_empty());
    }

    #[test]
    fn test_checkmate() {
        let board = Board::from_fen("k7/1Q6/2K5/8/8/8/8/8 b - - 0 1").unwrap();
        let generator = MoveGenerator::new();
        assert!(generator.generate_moves(&board).is_empty());
        assert_eq!(generator.get_game_state(&board, &[]), GameState::Checkmate(Side::White));
    }

    #[test]
    fn test_stalemate() {
        let board = Board::from_fen("8/8/8/8/8/1q6/2k5/K7 w - - 0 1").unwrap();
        let generator = MoveGenerator::new();
        assert!(!generator.is_king_in_check(&board, Side::White));
        assert_eq!(generator.get_game_state(&board, &[]), GameState::Stalemate);
    }

    #[test]
    fn test_insufficient_material() {
        let generator = MoveGenerator::new();
        let bare_kings = Board::from_fen("4k3/8/8/8/8/8/8/3K4 w - - 0 1").unwrap();
        assert_eq!(generator.get_game_state(&bare_kings, &[]), GameState::InsufficientMaterial);

        let king_and_bishop = Board::from_fen("4k3/8/8/8/8/8/8/2BK4 w - - 0 1").unwrap();
        assert_eq!(generator.get_game_state(&king_and_bishop, &[]), GameState::InsufficientMaterial);

        let two_knights = Board::from_fen("4k3/8/8/8/8/8/8/1NNK4 w - - 0 1").unwrap();
        assert_eq!(generator.get_game_state(&two_knights, &[]), GameState::Ongoing);

        let king_and_pawn = Board::from_fen("4k3/8/8/8/8/8/4P3/3K4 w - - 0 1").unwrap();
        assert_eq!(generator.get_game_state(&king_and_pawn, &[]), GameState::Ongoing);
    }

    #[test]
    fn test_fifty_move_rule() {
        let generator = MoveGenerator::new();
        let mut board = Board::new();
        board.halfmove_clock = 99;
        assert_eq!(generator.get_game_state(&board, &[]), GameState::Ongoing);
        board.halfmove_clock = 100;
        assert_eq!(generator.get_game_state(&board, &[]), GameState::FiftyMoveRule);
    }

    #[test]
    fn test_threefold_repetition() {
        let generator = MoveGenerator::new();
        let mut board = Board::new();
        let mut earlier = Vec::new();
        let shuffle = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
        for _ in 0..2 {
            for (from, to) in shuffle {
                earlier.push(board.clone());
                board.make_move(Move::new(sq(from), sq(to), PieceKind::Knight));
            }
        }
        assert_eq!(earlier.len(), 8);
        assert_eq!(generator.get_game_state(&board, &earlier), GameState::ThreefoldRepetition);
        assert_eq!(generator.get_game_state(&board, &earlier[..4]), GameState::Ongoing);
    }

    fn play(board: &mut Board, earlier: &mut Vec<Board>, generator: &MoveGenerator, from: &str, to: &str) {
        let mv = generator
            .moves_from(board, sq(from))
            .into_iter()
            .find(|mv| mv.to == sq(to))
            .unwrap();
        earlier.push(board.clone());
        board.make_move(mv);
    }

    #[test]
    fn test_repetition_ignores_an_uncapturable_en_passant_square() {
        let generator = MoveGenerator::new();
        let mut board = Board::new();
        let mut earlier = Vec::new();
        for (from, to) in [("e2", "e4"), ("e7", "e5")] {
            play(&mut board, &mut earlier, &generator, from, to);
        }
        assert_eq!(board.en_passant_square, Some(sq("e6")));

        let shuffle = [("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8")];
        for (from, to) in shuffle {
            play(&mut board, &mut earlier, &generator, from, to);
        }
        assert_eq!(generator.get_game_state(&board, &earlier), GameState::Ongoing);
        for (from, to) in shuffle {
            play(&mut board, &mut earlier, &generator, from, to);
        }
        assert_eq!(board.to_fen(), "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 8 6");
        assert_eq!(generator.get_game_state(&board, &earlier), GameState::ThreefoldRepetition);
    }

    #[test]
    fn test_repetition_keeps_a_capturable_en_passant_square() {
        let generator = MoveGenerator::new();
        let with_ep = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1").unwrap();
        let without_ep = Board::from_fen("4k3/8/8/3pP3/8/8/8/4K3 w - - 0 1").unwrap();
        assert_ne!(RepetitionKey::of(&generator, &with_ep), RepetitionKey::of(&generator, &without_ep));

        let stray_ep = Board::from_fen("4k3/8/8/3p4/8/8/4P3/4K3 w - d6 0 1").unwrap();
        let plain = Board::from_fen("4k3/8/8/3p4/8/8/4P3/4K3 w - - 0 1").unwrap();
        assert_eq!(RepetitionKey::of(&generator, &stray_ep), RepetitionKey::of(&generator, &plain));
    }
}
