//! Static position evaluation.
//!
//! Scores are in centipawns and positive when White is better. The weights
//! live in an explicit [`EvalWeights`] value that callers pass in, so two
//! searches with different weights can run side by side.
//!
//! Every positional term is bounded well below the value of a pawn, which
//! keeps the evaluation monotonic in material: gaining a piece with
//! everything else unchanged never lowers the score of the side that
//! gained it.

use serde::{Deserialize, Serialize};

use crate::game::FIFTY_MOVE_HALFMOVES;
use crate::movegen::{self, Movement};
use crate::position::Position;
use crate::types::*;

/// Score of a side that has been checkmated, from its own point of view
/// negated. Any mate score dominates every material or positional term.
pub const MATE_SCORE: i32 = 30_000;

/// Mate scores closer to zero than this are still mates (adjusted by ply).
pub const MATE_THRESHOLD: i32 = MATE_SCORE - 1_000;

const CENTER: [(u8, u8); 4] = [(3, 3), (4, 3), (3, 4), (4, 4)];

/// Evaluation weights. Missing fields in a JSON file take the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalWeights {
    pub pawn: i32,
    pub knight: i32,
    pub bishop: i32,
    pub rook: i32,
    pub queen: i32,

    /// Bonus for a piece on d4/e4/d5/e5; half of it on the ring around.
    pub center: i32,
    /// Bonus per reachable square of knights, bishops, rooks and queens.
    pub mobility: i32,
    /// Bonus per own pawn directly in front of a castled-side king.
    pub king_shield: i32,
    /// Penalty when the king's file has no own pawn while the enemy queen
    /// is on the board.
    pub king_open_file: i32,
    /// Penalty per extra pawn on a file.
    pub doubled_pawn: i32,
    /// Penalty per pawn with no own pawn on either neighbouring file.
    pub isolated_pawn: i32,
    /// Bonus per rank advanced for a pawn no enemy pawn can stop.
    pub passed_pawn: i32,
}

impl Default for EvalWeights {
    fn default() -> Self {
        Self {
            pawn: 100,
            knight: 300,
            bishop: 300,
            rook: 500,
            queen: 900,
            center: 10,
            mobility: 2,
            king_shield: 8,
            king_open_file: 15,
            doubled_pawn: 12,
            isolated_pawn: 10,
            passed_pawn: 5,
        }
    }
}

impl EvalWeights {
    /// Material and center occupancy only.
    pub fn basic(self) -> Self {
        Self {
            mobility: 0,
            ..self.standard()
        }
    }

    /// Material, center and mobility.
    pub fn standard(self) -> Self {
        Self {
            king_shield: 0,
            king_open_file: 0,
            doubled_pawn: 0,
            isolated_pawn: 0,
            passed_pawn: 0,
            ..self
        }
    }

    /// Material value of a piece kind. The king has none.
    pub fn piece_value(&self, kind: PieceKind) -> i32 {
        match kind {
            PieceKind::Pawn => self.pawn,
            PieceKind::Knight => self.knight,
            PieceKind::Bishop => self.bishop,
            PieceKind::Rook => self.rook,
            PieceKind::Queen => self.queen,
            PieceKind::King => 0,
        }
    }
}

/// Evaluates a position, positive favouring White.
///
/// Terminal positions are recognised: checkmate gives `±MATE_SCORE`,
/// stalemate and automatic draws give 0.
pub fn evaluate(pos: &Position, weights: &EvalWeights) -> i32 {
    if !movegen::has_legal_move(pos) {
        return if movegen::is_in_check(&pos.board, pos.turn) {
            -pos.turn.sign() * MATE_SCORE
        } else {
            0
        };
    }
    if is_drawn(pos) {
        return 0;
    }
    static_eval(pos, weights)
}

/// Evaluation from the point of view of the side to move.
pub fn evaluate_relative(pos: &Position, weights: &EvalWeights) -> i32 {
    pos.turn.sign() * evaluate(pos, weights)
}

/// Draw rules the evaluation treats as a dead score. Threefold is left to
/// the caller; inside a search a single repetition already counts.
pub(crate) fn is_drawn(pos: &Position) -> bool {
    pos.halfmove_clock >= FIFTY_MOVE_HALFMOVES || movegen::is_insufficient_material(&pos.board)
}

/// Material plus positional terms, without looking for mate or draws.
pub(crate) fn static_eval(pos: &Position, weights: &EvalWeights) -> i32 {
    let board = &pos.board;
    let mut score = 0;

    for (sq, piece) in board.occupied() {
        let mut value = weights.piece_value(piece.kind);
        if piece.kind != PieceKind::King {
            value += center_bonus(sq, weights);
        }
        if weights.mobility != 0 {
            value += weights.mobility * mobility(board, sq, piece) as i32;
        }
        score += piece.color.sign() * value;
    }

    if weights.king_shield != 0 || weights.king_open_file != 0 {
        score += king_safety(board, Color::White, weights) - king_safety(board, Color::Black, weights);
    }
    if weights.doubled_pawn != 0 || weights.isolated_pawn != 0 || weights.passed_pawn != 0 {
        score += pawn_structure(board, Color::White, weights)
            - pawn_structure(board, Color::Black, weights);
    }

    score
}

fn center_bonus(sq: Square, weights: &EvalWeights) -> i32 {
    if CENTER.contains(&(sq.file, sq.rank)) {
        weights.center
    } else if (2..=5).contains(&sq.file) && (2..=5).contains(&sq.rank) {
        weights.center / 2
    } else {
        0
    }
}

/// Squares a knight or slider can move to (empty or enemy-occupied).
/// Pawns and kings are not counted.
fn mobility(board: &Board, from: Square, piece: Piece) -> usize {
    let reachable = |to: Square| board.get(to).is_none_or(|p| p.color != piece.color);
    match piece.kind {
        PieceKind::Pawn | PieceKind::King => 0,
        kind => match kind.movement() {
            Movement::Steps(offsets) => offsets
                .iter()
                .filter_map(|&(df, dr)| from.offset(df, dr))
                .filter(|to| reachable(*to))
                .count(),
            Movement::Slides(directions) => {
                let mut count = 0;
                for &(df, dr) in directions {
                    let mut cur = from;
                    while let Some(to) = cur.offset(df, dr) {
                        match board.get(to) {
                            None => count += 1,
                            Some(p) => {
                                if p.color != piece.color {
                                    count += 1;
                                }
                                break;
                            }
                        }
                        cur = to;
                    }
                }
                count
            }
            Movement::Pawn => 0,
        },
    }
}

fn king_safety(board: &Board, color: Color, weights: &EvalWeights) -> i32 {
    // Only matters while the enemy still has a queen
    if board.count(PieceKind::Queen, color.opponent()) == 0 {
        return 0;
    }
    let Some(king) = board.find_king(color) else {
        return 0;
    };
    let own_pawn = Piece::new(PieceKind::Pawn, color);
    let mut score = 0;

    if king.rank == color.back_rank() && king.file != 3 && king.file != 4 {
        let shield = (-1..=1i8)
            .filter_map(|df| king.offset(df, color.pawn_direction()))
            .filter(|sq| board.get(*sq) == Some(own_pawn))
            .count();
        score += weights.king_shield * shield as i32;
    }

    let file_has_pawn = (0..8).any(|rank| board.get(Square::new(king.file, rank)) == Some(own_pawn));
    if !file_has_pawn {
        score -= weights.king_open_file;
    }
    score
}

fn pawn_structure(board: &Board, color: Color, weights: &EvalWeights) -> i32 {
    let mut own_files = [0i32; 8];
    let mut pawns = Vec::with_capacity(8);
    for (sq, piece) in board.occupied() {
        if piece.kind == PieceKind::Pawn && piece.color == color {
            own_files[sq.file as usize] += 1;
            pawns.push(sq);
        }
    }

    let mut score = 0;
    for count in own_files {
        if count > 1 {
            score -= weights.doubled_pawn * (count - 1);
        }
    }

    let enemy_pawn = Piece::new(PieceKind::Pawn, color.opponent());
    for sq in pawns {
        let file = sq.file as usize;
        let left = file > 0 && own_files[file - 1] > 0;
        let right = file < 7 && own_files[file + 1] > 0;
        if !left && !right {
            score -= weights.isolated_pawn;
        }

        // Passed: no enemy pawn ahead on this or a neighbouring file
        let blocked = board.occupied().any(|(other, p)| {
            p == enemy_pawn
                && other.file.abs_diff(sq.file) <= 1
                && match color {
                    Color::White => other.rank > sq.rank,
                    Color::Black => other.rank < sq.rank,
                }
        });
        if !blocked {
            let advanced = sq.rank.abs_diff(color.pawn_start_rank()) as i32;
            score += weights.passed_pawn * advanced;
        }
    }
    score
}
