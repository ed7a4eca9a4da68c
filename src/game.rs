//! Game state transitions and position classification.
//!
//! [`apply_move`] is the only way a new [`Position`] comes into existence
//! after the initial setup. It validates the move against the legal move
//! list and then builds the successor in one step: occupancy, castling
//! rights, en passant target, clocks, side to move and repetition history.
//! [`classify`] reports check, mate and the automatic draws.

use crate::error::{EngineError, EngineResult};
use crate::movegen;
use crate::position::Position;
use crate::types::*;

/// Half-moves without a pawn move or capture after which the game is drawn.
pub const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Occurrences of the same position that draw the game.
pub const REPETITION_LIMIT: usize = 3;

/// Applies a legal move and returns the resulting position.
///
/// The move is matched against [`movegen::legal_moves`] by from, to and
/// promotion, so a bare coordinate move is accepted. Fails with
/// [`EngineError::InvalidMove`] otherwise; `pos` is never modified.
pub fn apply_move(pos: &Position, mv: Move) -> EngineResult<Position> {
    let legal = movegen::find_matching_legal_move(pos, &mv)?;
    Ok(play_unchecked(pos, &legal))
}

/// Parses coordinate notation (`e2e4`, `e7e8q`) and applies the move.
pub fn apply_uci(pos: &Position, text: &str) -> EngineResult<Position> {
    let mv = Move::from_coordinates(text)
        .ok_or_else(|| EngineError::Parse(format!("invalid move text '{}'", text)))?;
    apply_move(pos, mv)
}

/// Builds the successor position for a move taken from the legal move list.
///
/// No legality check is done here; search and perft call it with moves they
/// generated themselves.
pub(crate) fn play_unchecked(pos: &Position, mv: &Move) -> Position {
    let mut next = pos.clone();
    let mover = pos.turn;

    let is_pawn_move = matches!(pos.board.get(mv.from), Some(p) if p.kind == PieceKind::Pawn);
    let is_capture = mv.capture || pos.board.get(mv.to).is_some();

    movegen::apply_move_to_board(&mut next.board, mv, mover);

    // King move loses both rights; rook leaving or being captured on its
    // corner loses that side's right.
    if matches!(pos.board.get(mv.from), Some(p) if p.kind == PieceKind::King) {
        *next.castling.for_color_mut(mover) = SideCastlingRights::NONE;
    }
    next.castling.clear_rook_square(mv.from);
    next.castling.clear_rook_square(mv.to);

    next.en_passant = None;
    if is_pawn_move && mv.from.rank.abs_diff(mv.to.rank) == 2 {
        let ep_rank = (mv.from.rank as i8 + mover.pawn_direction()) as u8;
        next.en_passant = Some(Square::new(mv.from.file, ep_rank));
    }

    if is_pawn_move || is_capture {
        next.halfmove_clock = 0;
        // Earlier positions can never recur after an irreversible move
        next.history.clear();
    } else {
        next.halfmove_clock += 1;
        next.history.push(pos.repetition_key());
    }

    next.turn = mover.opponent();
    if next.turn == Color::White {
        next.fullmove_number += 1;
    }

    next
}

/// Classifies a position for the side to move.
///
/// Checkmate and stalemate take precedence over the draw rules; a position
/// that is both mate and, say, a fifty-move draw is reported as mate.
pub fn classify(pos: &Position) -> GameStatus {
    let in_check = movegen::is_in_check(&pos.board, pos.turn);

    if !movegen::has_legal_move(pos) {
        return if in_check {
            GameStatus::Checkmate
        } else {
            GameStatus::Stalemate
        };
    }

    if movegen::is_insufficient_material(&pos.board) {
        return GameStatus::DrawByInsufficientMaterial;
    }
    if pos.halfmove_clock >= FIFTY_MOVE_HALFMOVES {
        return GameStatus::DrawByFiftyMove;
    }
    if pos.repetition_count() >= REPETITION_LIMIT {
        return GameStatus::DrawByRepetition;
    }

    if in_check {
        GameStatus::Check
    } else {
        GameStatus::Ongoing
    }
}
