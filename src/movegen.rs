//! Move generation and validation.
//!
//! This module implements complete legal move generation. It handles:
//!
//! - Piece movement patterns (King, Queen, Rook, Bishop, Knight, Pawn)
//! - Castling (kingside and queenside, with all conditions)
//! - En passant captures
//! - Pawn promotion
//! - Check detection and prevention (no move may leave own king in check)
//! - Insufficient-material detection

use crate::error::{EngineError, EngineResult};
use crate::position::Position;
use crate::types::*;

// ---------------------------------------------------------------------------
// Movement rules per piece kind
// ---------------------------------------------------------------------------

const ROOK_DIRS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const BISHOP_DIRS: [(i8, i8); 4] = [(-1, -1), (-1, 1), (1, -1), (1, 1)];
const QUEEN_DIRS: [(i8, i8); 8] = [
    (-1, 0), (1, 0), (0, -1), (0, 1),
    (-1, -1), (-1, 1), (1, -1), (1, 1),
];
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1), (-2, 1), (-1, -2), (-1, 2),
    (1, -2), (1, 2), (2, -1), (2, 1),
];

/// How a piece kind moves.
#[derive(Debug, Clone, Copy)]
pub enum Movement {
    /// Jumps to each offset once (knight, king).
    Steps(&'static [(i8, i8)]),
    /// Slides along each direction until blocked (bishop, rook, queen).
    Slides(&'static [(i8, i8)]),
    /// Pushes forward, captures diagonally.
    Pawn,
}

impl PieceKind {
    /// Movement rule of this kind. Castling is handled on top of the king's
    /// steps by the generator.
    pub fn movement(self) -> Movement {
        match self {
            PieceKind::King => Movement::Steps(&QUEEN_DIRS),
            PieceKind::Knight => Movement::Steps(&KNIGHT_OFFSETS),
            PieceKind::Queen => Movement::Slides(&QUEEN_DIRS),
            PieceKind::Rook => Movement::Slides(&ROOK_DIRS),
            PieceKind::Bishop => Movement::Slides(&BISHOP_DIRS),
            PieceKind::Pawn => Movement::Pawn,
        }
    }
}

// ---------------------------------------------------------------------------
// Attack detection
// ---------------------------------------------------------------------------

/// Returns `true` if the given square is attacked by any piece of `attacker_color`.
///
/// This is used for:
/// - Check detection (is the king attacked?)
/// - Castling validation (king must not pass through or land on attacked squares)
///
/// Pins are ignored: a pinned piece still attacks.
pub fn is_square_attacked(board: &Board, sq: Square, attacker_color: Color) -> bool {
    let attacker_is = |from: Square, kinds: &[PieceKind]| {
        matches!(board.get(from), Some(p) if p.color == attacker_color && kinds.contains(&p.kind))
    };

    for &(df, dr) in &KNIGHT_OFFSETS {
        if let Some(from) = sq.offset(df, dr)
            && attacker_is(from, &[PieceKind::Knight])
        {
            return true;
        }
    }

    for &(df, dr) in &QUEEN_DIRS {
        if let Some(from) = sq.offset(df, dr)
            && attacker_is(from, &[PieceKind::King])
        {
            return true;
        }
    }

    // The attacking pawn is below (for white) or above (for black) the target
    let pawn_dir = attacker_color.pawn_direction();
    for df in [-1i8, 1] {
        if let Some(from) = sq.offset(df, -pawn_dir)
            && attacker_is(from, &[PieceKind::Pawn])
        {
            return true;
        }
    }

    let rays: [(&[(i8, i8)], [PieceKind; 2]); 2] = [
        (&BISHOP_DIRS[..], [PieceKind::Bishop, PieceKind::Queen]),
        (&ROOK_DIRS[..], [PieceKind::Rook, PieceKind::Queen]),
    ];
    for (dirs, sliders) in rays {
        for &(df, dr) in dirs {
            let mut cur = sq;
            while let Some(next) = cur.offset(df, dr) {
                if board.get(next).is_some() {
                    if attacker_is(next, &sliders) {
                        return true;
                    }
                    break; // blocked by another piece
                }
                cur = next;
            }
        }
    }

    false
}

/// Returns `true` if the king of the given color is currently in check.
pub fn is_in_check(board: &Board, color: Color) -> bool {
    match board.find_king(color) {
        Some(king_sq) => is_square_attacked(board, king_sq, color.opponent()),
        // Only reachable for hand-built boards; positions are validated
        None => false,
    }
}

// ---------------------------------------------------------------------------
// Pseudo-legal move generation (before check filtering)
// ---------------------------------------------------------------------------

/// Generates the pseudo-legal moves of the piece standing on `from`.
///
/// "Pseudo-legal" means the moves follow piece movement rules but may leave
/// the own king in check. Returns an empty list for an empty square or a
/// piece that does not belong to the side to move.
pub fn pseudo_legal_moves(pos: &Position, from: Square) -> Vec<Move> {
    let mut moves = Vec::with_capacity(28);
    if let Some(piece) = pos.board.get(from)
        && piece.color == pos.turn
    {
        push_piece_moves(pos, from, piece, &mut moves);
    }
    moves
}

/// Generates all pseudo-legal moves for the side to move.
fn generate_pseudo_legal_moves(pos: &Position) -> Vec<Move> {
    let mut moves = Vec::with_capacity(64);
    for (from, piece) in pos.pieces(pos.turn) {
        push_piece_moves(pos, from, piece, &mut moves);
    }
    moves
}

fn push_piece_moves(pos: &Position, from: Square, piece: Piece, moves: &mut Vec<Move>) {
    match piece.kind.movement() {
        Movement::Steps(offsets) => {
            generate_step_moves(&pos.board, from, piece.color, offsets, moves);
            if piece.kind == PieceKind::King {
                generate_castling_moves(pos, from, moves);
            }
        }
        Movement::Slides(directions) => {
            generate_sliding_moves(&pos.board, from, piece.color, directions, moves)
        }
        Movement::Pawn => generate_pawn_moves(&pos.board, from, piece.color, pos.en_passant, moves),
    }
}

/// Generates sliding piece moves (rook, bishop, queen).
fn generate_sliding_moves(
    board: &Board,
    from: Square,
    color: Color,
    directions: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in directions {
        let mut cur = from;
        while let Some(to) = cur.offset(df, dr) {
            match board.get(to) {
                None => {
                    moves.push(Move::simple(from, to));
                    cur = to;
                }
                Some(target) => {
                    if target.color != color {
                        moves.push(Move::capture(from, to));
                    }
                    break; // first occupied square ends the ray
                }
            }
        }
    }
}

/// Generates single-step moves (knight, king without castling).
fn generate_step_moves(
    board: &Board,
    from: Square,
    color: Color,
    offsets: &[(i8, i8)],
    moves: &mut Vec<Move>,
) {
    for &(df, dr) in offsets {
        if let Some(to) = from.offset(df, dr) {
            match board.get(to) {
                None => moves.push(Move::simple(from, to)),
                Some(target) if target.color != color => moves.push(Move::capture(from, to)),
                Some(_) => {}
            }
        }
    }
}

/// Generates castling moves for a king standing on `from`.
fn generate_castling_moves(pos: &Position, from: Square, moves: &mut Vec<Move>) {
    let board = &pos.board;
    let color = pos.turn;
    let rights = pos.castling.for_color(color);
    let rank = color.back_rank();
    let enemy = color.opponent();

    // Only attempt castling if king is on its starting square
    if from != Square::new(4, rank) || !(rights.kingside || rights.queenside) {
        return;
    }

    // King must not be in check to castle
    if is_square_attacked(board, from, enemy) {
        return;
    }

    let rook_home = |file: u8| {
        board.get(Square::new(file, rank)) == Some(Piece::new(PieceKind::Rook, color))
    };
    let empty = |files: &[u8]| files.iter().all(|f| board.get(Square::new(*f, rank)).is_none());
    let safe = |files: &[u8]| {
        files
            .iter()
            .all(|f| !is_square_attacked(board, Square::new(*f, rank), enemy))
    };

    if rights.kingside && rook_home(7) && empty(&[5, 6]) && safe(&[5, 6]) {
        moves.push(Move {
            castle: Some(CastleSide::Kingside),
            ..Move::simple(from, Square::new(6, rank))
        });
    }

    // b1/b8 must be empty but need not be safe; only the king's path d, c
    if rights.queenside && rook_home(0) && empty(&[1, 2, 3]) && safe(&[3, 2]) {
        moves.push(Move {
            castle: Some(CastleSide::Queenside),
            ..Move::simple(from, Square::new(2, rank))
        });
    }
}

/// Generates pawn moves (forward, captures, en passant, promotion).
fn generate_pawn_moves(
    board: &Board,
    from: Square,
    color: Color,
    en_passant: Option<Square>,
    moves: &mut Vec<Move>,
) {
    let dir = color.pawn_direction();
    let promo_rank = color.promotion_rank();

    // Reaching the last rank must promote: one move per promotion kind
    let mut add_move = |mv: Move| {
        if mv.to.rank == promo_rank {
            for kind in PieceKind::PROMOTIONS {
                moves.push(Move {
                    promotion: Some(kind),
                    ..mv
                });
            }
        } else {
            moves.push(mv);
        }
    };

    if let Some(one_ahead) = from.offset(0, dir)
        && board.get(one_ahead).is_none()
    {
        add_move(Move::simple(from, one_ahead));

        if from.rank == color.pawn_start_rank()
            && let Some(two_ahead) = from.offset(0, dir * 2)
            && board.get(two_ahead).is_none()
        {
            add_move(Move::simple(from, two_ahead));
        }
    }

    for df in [-1i8, 1] {
        if let Some(to) = from.offset(df, dir) {
            match board.get(to) {
                Some(target) if target.color != color => add_move(Move::capture(from, to)),
                None if en_passant == Some(to) => add_move(Move {
                    en_passant: true,
                    ..Move::capture(from, to)
                }),
                _ => {}
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Legal move generation (with check filtering)
// ---------------------------------------------------------------------------

/// Generates all legal moves for the side to move.
///
/// A legal move is a pseudo-legal move that does not leave or place
/// the own king in check.
pub fn legal_moves(pos: &Position) -> Vec<Move> {
    generate_pseudo_legal_moves(pos)
        .into_iter()
        .filter(|mv| !leaves_king_in_check(&pos.board, mv, pos.turn))
        .collect()
}

/// `true` if the side to move has at least one legal move.
pub fn has_legal_move(pos: &Position) -> bool {
    generate_pseudo_legal_moves(pos)
        .iter()
        .any(|mv| !leaves_king_in_check(&pos.board, mv, pos.turn))
}

fn leaves_king_in_check(board: &Board, mv: &Move, color: Color) -> bool {
    let mut test_board = board.clone();
    apply_move_to_board(&mut test_board, mv, color);
    is_in_check(&test_board, color)
}

/// Applies a move to a board (mutating it). Used for testing legality
/// and for building the successor position.
///
/// This handles:
/// - Normal moves and captures
/// - Castling (moves both king and rook)
/// - En passant (removes the captured pawn)
/// - Promotion (replaces pawn with promoted piece)
///
/// The move must come from the generator; an empty origin square is a
/// no-op.
pub fn apply_move_to_board(board: &mut Board, mv: &Move, color: Color) {
    let Some(piece) = board.get(mv.from) else {
        return;
    };

    board.set(mv.from, None);

    if let Some(side) = mv.castle {
        let rank = mv.from.rank;
        let (rook_from, rook_to) = match side {
            CastleSide::Kingside => (7, 5),
            CastleSide::Queenside => (0, 3),
        };
        let rook = board.get(Square::new(rook_from, rank));
        board.set(Square::new(rook_from, rank), None);
        board.set(Square::new(rook_to, rank), rook);
    }

    // The captured pawn sits behind the target square
    if mv.en_passant {
        board.set(Square::new(mv.to.file, mv.from.rank), None);
    }

    let placed_piece = match mv.promotion {
        Some(kind) => Piece::new(kind, color),
        None => piece,
    };
    board.set(mv.to, Some(placed_piece));
}

// ---------------------------------------------------------------------------
// Insufficient material detection (dead position)
// ---------------------------------------------------------------------------

/// Checks if the position has insufficient material for checkmate:
/// - K vs K
/// - K+B vs K
/// - K+N vs K
/// - K+B vs K+B (both bishops on same color squares)
pub fn is_insufficient_material(board: &Board) -> bool {
    let others: Vec<(Square, Piece)> = board
        .occupied()
        .filter(|(_, p)| p.kind != PieceKind::King)
        .collect();

    match others.as_slice() {
        [] => true,
        [(_, p)] => matches!(p.kind, PieceKind::Bishop | PieceKind::Knight),
        [(sa, a), (sb, b)] => {
            a.kind == PieceKind::Bishop
                && b.kind == PieceKind::Bishop
                && a.color != b.color
                && sa.is_dark() == sb.is_dark()
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Move matching
// ---------------------------------------------------------------------------

/// Finds the legal move with the same from/to/promotion as `requested`.
///
/// Returns the generated move (with its flags filled in) or an
/// `InvalidMove` error that explains why the request was rejected.
pub fn find_matching_legal_move(pos: &Position, requested: &Move) -> EngineResult<Move> {
    let invalid = |reason: String| EngineError::InvalidMove {
        mv: *requested,
        reason,
    };

    match pos.board.get(requested.from) {
        None => return Err(invalid(format!("no piece on {}", requested.from))),
        Some(piece) if piece.color != pos.turn => {
            return Err(invalid(format!(
                "piece on {} belongs to {}, but it is {}'s turn",
                requested.from, piece.color, pos.turn
            )));
        }
        Some(_) => {}
    }

    let legal = legal_moves(pos);
    if let Some(found) = legal.iter().find(|m| m.same_coordinates(requested)) {
        return Ok(*found);
    }

    let available: Vec<String> = legal
        .iter()
        .filter(|m| m.from == requested.from)
        .map(|m| m.to_string())
        .collect();
    if available.is_empty() {
        Err(invalid(format!("{} has no legal moves", requested.from)))
    } else {
        Err(invalid(format!(
            "legal moves from {}: {}",
            requested.from,
            available.join(", ")
        )))
    }
}

// ---------------------------------------------------------------------------
// Perft
// ---------------------------------------------------------------------------

/// Counts leaf nodes of the legal move tree to `depth` plies.
pub fn perft(pos: &Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = legal_moves(pos);
    if depth == 1 {
        return moves.len() as u64;
    }
    moves
        .iter()
        .map(|mv| perft(&crate::game::play_unchecked(pos, mv), depth - 1))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::apply_uci;

    fn sq(s: &str) -> Square {
        Square::from_algebraic(s).unwrap()
    }

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    #[test]
    fn test_starting_position_has_20_moves() {
        let moves = legal_moves(&Position::new_game());
        assert_eq!(moves.len(), 20, "White should have 20 legal moves in starting position");
    }

    #[test]
    fn test_starting_position_not_in_check() {
        let board = Board::starting_position();
        assert!(!is_in_check(&board, Color::White));
        assert!(!is_in_check(&board, Color::Black));
    }

    #[test]
    fn test_perft_start_position() {
        let start = Position::new_game();
        assert_eq!(perft(&start, 1), 20);
        assert_eq!(perft(&start, 2), 400);
        assert_eq!(perft(&start, 3), 8902);
    }

    #[test]
    fn test_perft_kiwipete() {
        let kiwipete =
            pos("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        assert_eq!(perft(&kiwipete, 1), 48);
        assert_eq!(perft(&kiwipete, 2), 2039);
    }

    #[test]
    fn test_perft_endgame_and_promotions() {
        let endgame = pos("8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1");
        assert_eq!(perft(&endgame, 3), 2812);

        let promotions =
            pos("r3k2r/Pppp1ppp/1b3nbN/nP6/BBP1P3/q4N2/Pp1P2PP/R2Q1RK1 w kq - 0 1");
        assert_eq!(perft(&promotions, 1), 6);
        assert_eq!(perft(&promotions, 2), 264);
    }

    #[test]
    fn test_pseudo_legal_moves_per_square() {
        let start = Position::new_game();
        assert_eq!(pseudo_legal_moves(&start, sq("g1")).len(), 2);
        assert_eq!(pseudo_legal_moves(&start, sq("e2")).len(), 2);
        assert!(pseudo_legal_moves(&start, sq("d1")).is_empty());
        // Black piece while White is to move
        assert!(pseudo_legal_moves(&start, sq("g8")).is_empty());
        assert!(pseudo_legal_moves(&start, sq("e4")).is_empty());
    }

    #[test]
    fn test_sliders_stop_at_first_occupied_square() {
        // Rook a1, own pawn a4, enemy knight d1
        let p = pos("4k3/8/8/8/P7/8/8/R2n2K1 w - - 0 1");
        let rook: Vec<String> = pseudo_legal_moves(&p, sq("a1"))
            .iter()
            .map(|m| m.to.to_algebraic())
            .collect();
        assert!(rook.contains(&"a3".to_string()));
        assert!(!rook.contains(&"a4".to_string()), "own piece blocks");
        assert!(!rook.contains(&"a5".to_string()));
        assert!(rook.contains(&"d1".to_string()), "enemy piece is captured");
        assert!(!rook.contains(&"e1".to_string()), "nothing beyond the capture");

        let bishop = pos("4k3/8/8/3p4/8/1B6/8/4K3 w - - 0 1");
        let targets: Vec<Move> = pseudo_legal_moves(&bishop, sq("b3"));
        let d5 = targets.iter().find(|m| m.to == sq("d5")).unwrap();
        assert!(d5.capture);
        assert!(!targets.iter().any(|m| m.to == sq("e6")));
    }

    #[test]
    fn test_pawn_double_push_needs_both_squares_empty() {
        let blocked = pos("4k3/8/8/8/4n3/8/4P3/4K3 w - - 0 1");
        let moves = pseudo_legal_moves(&blocked, sq("e2"));
        assert_eq!(moves.len(), 1);
        assert_eq!(moves[0].to, sq("e3"));

        let blocked_near = pos("4k3/8/8/8/8/4n3/4P3/4K3 w - - 0 1");
        assert!(pseudo_legal_moves(&blocked_near, sq("e2")).is_empty());
    }

    #[test]
    fn test_promotion_enumerates_four_kinds() {
        let p = pos("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let moves = legal_moves(&p);
        let pushes: Vec<_> = moves.iter().filter(|m| m.to == sq("a8")).collect();
        let captures: Vec<_> = moves.iter().filter(|m| m.to == sq("b8")).collect();
        assert_eq!(pushes.len(), 4);
        assert_eq!(captures.len(), 4);
        assert!(captures.iter().all(|m| m.capture));
        for kind in PieceKind::PROMOTIONS {
            assert!(pushes.iter().any(|m| m.promotion == Some(kind)));
        }
    }

    #[test]
    fn test_en_passant_move_generated() {
        let p = pos("4k3/8/8/3pP3/8/8/8/4K3 w - d6 0 1");
        let moves = legal_moves(&p);
        let ep_moves: Vec<_> = moves.iter().filter(|m| m.en_passant).collect();
        assert_eq!(ep_moves.len(), 1, "Should have exactly one en passant move");
        assert_eq!(ep_moves[0].from, sq("e5"));
        assert_eq!(ep_moves[0].to, sq("d6"));
        assert!(ep_moves[0].capture);
    }

    #[test]
    fn test_en_passant_exposing_king_is_illegal() {
        // Capturing en passant would open the fifth rank to the rook
        let p = pos("8/8/8/K2pP2r/8/8/8/7k w - d6 0 1");
        assert!(!legal_moves(&p).iter().any(|m| m.en_passant));
    }

    #[test]
    fn test_castling_available_in_clear_position() {
        let p = pos("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let castling_moves: Vec<_> = legal_moves(&p)
            .into_iter()
            .filter(|m| m.castle.is_some())
            .collect();
        assert_eq!(castling_moves.len(), 2, "Should have both kingside and queenside castling");
    }

    #[test]
    fn test_castling_blocked_by_check_and_attacked_path() {
        // In check from the e-file rook
        let in_check = pos("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        assert!(!legal_moves(&in_check).iter().any(|m| m.castle.is_some()));

        // f1 attacked: no kingside, queenside fine
        let f_attacked = pos("5rk1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let castles: Vec<_> = legal_moves(&f_attacked)
            .into_iter()
            .filter_map(|m| m.castle)
            .collect();
        assert_eq!(castles, vec![CastleSide::Queenside]);

        // b1 attacked does not prevent queenside castling
        let b_attacked = pos("1r4k1/8/8/8/8/8/8/R3K3 w Q - 0 1");
        assert!(legal_moves(&b_attacked).iter().any(|m| m.castle == Some(CastleSide::Queenside)));

        // A piece between king and rook
        let blocked = pos("4k3/8/8/8/8/8/8/RN2K2R w KQ - 0 1");
        let castles: Vec<_> = legal_moves(&blocked)
            .into_iter()
            .filter_map(|m| m.castle)
            .collect();
        assert_eq!(castles, vec![CastleSide::Kingside]);
    }

    #[test]
    fn test_castling_removed_after_king_returns() {
        let mut p = pos("4k3/p7/8/8/8/8/8/R3K2R w KQ - 0 1");
        for uci in ["e1f1", "a7a6", "f1e1", "a6a5"] {
            p = apply_uci(&p, uci).unwrap();
        }
        assert_eq!(p.piece_at(sq("e1")).map(|x| x.kind), Some(PieceKind::King));
        assert!(!legal_moves(&p).iter().any(|m| m.castle.is_some()));
    }

    #[test]
    fn test_castling_removed_after_rook_returns() {
        let mut p = pos("4k3/p7/8/8/8/8/8/R3K2R w KQ - 0 1");
        for uci in ["h1h2", "a7a6", "h2h1", "a6a5"] {
            p = apply_uci(&p, uci).unwrap();
        }
        let castles: Vec<_> = legal_moves(&p).into_iter().filter_map(|m| m.castle).collect();
        assert_eq!(castles, vec![CastleSide::Queenside]);
    }

    #[test]
    fn test_pinned_piece_cannot_leave_line() {
        let p = pos("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1");
        assert!(!pseudo_legal_moves(&p, sq("e2")).is_empty());
        assert!(!legal_moves(&p).iter().any(|m| m.from == sq("e2")));
    }

    #[test]
    fn test_no_legal_move_leaves_king_in_check() {
        let positions = [
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
            "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
            "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8",
        ];
        for fen in positions {
            let p = pos(fen);
            for mv in legal_moves(&p) {
                let next = crate::game::play_unchecked(&p, &mv);
                assert!(!is_in_check(&next.board, p.turn), "{} leaves king in check", mv);
            }
        }
    }

    #[test]
    fn test_insufficient_material_k_vs_k() {
        assert!(is_insufficient_material(&pos("4k3/8/8/8/8/8/8/4K3 w - - 0 1").board));
    }

    #[test]
    fn test_insufficient_material_kb_vs_k() {
        assert!(is_insufficient_material(&pos("4k3/8/8/8/8/2B5/8/4K3 w - - 0 1").board));
        assert!(is_insufficient_material(&pos("4k3/8/8/8/8/2n5/8/4K3 w - - 0 1").board));
    }

    #[test]
    fn test_insufficient_material_same_color_bishops() {
        // c1 and f8 are both dark squares
        assert!(is_insufficient_material(&pos("4kb2/8/8/8/8/8/8/2B1K3 w - - 0 1").board));
        // c1 dark, c8 light
        assert!(!is_insufficient_material(&pos("2b1k3/8/8/8/8/8/8/2B1K3 w - - 0 1").board));
    }

    #[test]
    fn test_not_insufficient_with_rook_or_pawn() {
        assert!(!is_insufficient_material(&pos("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").board));
        assert!(!is_insufficient_material(&pos("4k3/8/8/8/8/8/P7/4K3 w - - 0 1").board));
    }

    #[test]
    fn test_matching_rejects_wrong_side_and_empty_square() {
        let start = Position::new_game();
        let err = find_matching_legal_move(&start, &Move::from_coordinates("e7e5").unwrap());
        assert!(matches!(err, Err(EngineError::InvalidMove { .. })));
        let err = find_matching_legal_move(&start, &Move::from_coordinates("e4e5").unwrap());
        assert!(matches!(err, Err(EngineError::InvalidMove { .. })));

        let found = find_matching_legal_move(&start, &Move::from_coordinates("g1f3").unwrap());
        assert_eq!(found.unwrap().to, sq("f3"));
    }
}
