//! The `Position` value: board, side to move, rights and counters.
//!
//! A position is created once with [`Position::new_game`] (or imported from
//! FEN) and afterwards only produced by [`crate::game::apply_move`]. All the
//! queries here are pure.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::error::{EngineError, EngineResult};
use crate::movegen;
use crate::types::*;

/// A complete chess position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Piece placement.
    pub board: Board,

    /// Side to move.
    pub turn: Color,

    /// Castling rights.
    pub castling: CastlingRights,

    /// En passant target square (if a pawn just advanced two squares).
    pub en_passant: Option<Square>,

    /// Half-move clock for the 50-move rule.
    pub halfmove_clock: u32,

    /// Full-move number (starts at 1, incremented after Black moves).
    pub fullmove_number: u32,

    /// Repetition keys of earlier positions, back to the last pawn move or
    /// capture. The current position is not included.
    pub(crate) history: Vec<u64>,
}

impl Default for Position {
    fn default() -> Self {
        Self::new_game()
    }
}

impl Position {
    /// The standard initial setup.
    pub fn new_game() -> Self {
        Self {
            board: Board::starting_position(),
            turn: Color::White,
            castling: CastlingRights::default(),
            en_passant: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            history: Vec::new(),
        }
    }

    /// Returns the piece on `sq`, if any.
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board.get(sq)
    }

    /// Enumerates all pieces of `color` with their squares.
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.board.occupied().filter(move |(_, p)| p.color == color)
    }

    /// Square of the king of `color`.
    pub fn king_square(&self, color: Color) -> EngineResult<Square> {
        self.board
            .find_king(color)
            .ok_or_else(|| EngineError::MalformedPosition(format!("no {} king", color)))
    }

    /// Hash of everything that makes two positions "the same" for the
    /// repetition rule: placement, side to move, castling, en passant.
    pub fn repetition_key(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.board.hash(&mut hasher);
        self.turn.hash(&mut hasher);
        self.castling.hash(&mut hasher);
        self.en_passant.hash(&mut hasher);
        hasher.finish()
    }

    /// How many times the current position has occurred, itself included.
    pub fn repetition_count(&self) -> usize {
        let key = self.repetition_key();
        1 + self.history.iter().filter(|k| **k == key).count()
    }

    /// Checks the board invariants: one king per side, no pawns on the
    /// first or last rank, the side that just moved not left in check, and
    /// an en-passant square that a double push could have produced.
    pub fn validate(&self) -> EngineResult<()> {
        for color in [Color::White, Color::Black] {
            let kings = self.board.count(PieceKind::King, color);
            if kings != 1 {
                return Err(EngineError::MalformedPosition(format!(
                    "{} has {} kings",
                    color, kings
                )));
            }
        }
        let misplaced_pawn = self.board.occupied().any(|(sq, p)| {
            p.kind == PieceKind::Pawn && (sq.rank == 0 || sq.rank == 7)
        });
        if misplaced_pawn {
            return Err(EngineError::MalformedPosition(
                "pawn on the first or last rank".to_string(),
            ));
        }

        let waiting = self.turn.opponent();
        let waiting_king = self.king_square(waiting)?;
        if movegen::is_square_attacked(&self.board, waiting_king, self.turn) {
            return Err(EngineError::MalformedPosition(format!(
                "{} is in check but it is {}'s move",
                waiting, self.turn
            )));
        }

        if let Some(ep) = self.en_passant {
            self.validate_en_passant(ep)?;
        }
        Ok(())
    }

    /// The target square sits behind an enemy pawn that just made a double
    /// push: rank 6 with White to move, rank 3 with Black to move.
    fn validate_en_passant(&self, ep: Square) -> EngineResult<()> {
        let pusher = self.turn.opponent();
        let expected_rank = match self.turn {
            Color::White => 5,
            Color::Black => 2,
        };
        let pawn_square = ep.offset(0, pusher.pawn_direction());
        let origin = ep.offset(0, -pusher.pawn_direction());
        let plausible = ep.rank == expected_rank
            && self.board.get(ep).is_none()
            && origin.is_some_and(|sq| self.board.get(sq).is_none())
            && pawn_square.and_then(|sq| self.board.get(sq))
                == Some(Piece::new(PieceKind::Pawn, pusher));
        if plausible {
            Ok(())
        } else {
            Err(EngineError::MalformedPosition(format!(
                "en passant square {} does not follow a double pawn push",
                ep
            )))
        }
    }

    /// Imports a position from Forsyth-Edwards Notation.
    ///
    /// The clock fields are optional and default to `0 1`.
    pub fn from_fen(fen: &str) -> EngineResult<Self> {
        let fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 4 || fields.len() > 6 {
            return Err(EngineError::Parse(format!(
                "FEN needs 4 to 6 fields, found {}",
                fields.len()
            )));
        }

        let board = Board::from_fen_placement(fields[0]).map_err(EngineError::Parse)?;
        let turn = match fields[1] {
            "w" => Color::White,
            "b" => Color::Black,
            other => return Err(EngineError::Parse(format!("invalid side to move '{}'", other))),
        };
        let castling = CastlingRights::from_fen(fields[2])
            .ok_or_else(|| EngineError::Parse(format!("invalid castling field '{}'", fields[2])))?;
        let en_passant = match fields[3] {
            "-" => None,
            s => Some(
                Square::from_algebraic(s)
                    .ok_or_else(|| EngineError::Parse(format!("invalid en passant square '{}'", s)))?,
            ),
        };
        let parse_counter = |idx: usize, default: u32| -> EngineResult<u32> {
            match fields.get(idx) {
                Some(s) => s
                    .parse()
                    .map_err(|_| EngineError::Parse(format!("invalid counter '{}'", s))),
                None => Ok(default),
            }
        };

        let mut position = Position {
            board,
            turn,
            castling,
            en_passant,
            halfmove_clock: parse_counter(4, 0)?,
            fullmove_number: parse_counter(5, 1)?.max(1),
            history: Vec::new(),
        };
        position.validate()?;
        position.sanitize_castling();
        Ok(position)
    }

    /// Exports the position as FEN.
    pub fn to_fen(&self) -> String {
        format!(
            "{} {} {} {} {} {}",
            self.board.to_fen_placement(),
            match self.turn {
                Color::White => 'w',
                Color::Black => 'b',
            },
            self.castling.to_fen(),
            self.en_passant
                .map(|sq| sq.to_algebraic())
                .unwrap_or_else(|| "-".to_string()),
            self.halfmove_clock,
            self.fullmove_number
        )
    }

    /// Drops castling rights whose king or rook is not on its home square.
    fn sanitize_castling(&mut self) {
        for color in [Color::White, Color::Black] {
            let rank = color.back_rank();
            let has = |file: u8, kind: PieceKind| {
                self.board.get(Square::new(file, rank)) == Some(Piece::new(kind, color))
            };
            let king_home = has(4, PieceKind::King);
            let kingside_rook = has(7, PieceKind::Rook);
            let queenside_rook = has(0, PieceKind::Rook);
            let rights = self.castling.for_color_mut(color);
            rights.kingside &= king_home && kingside_rook;
            rights.queenside &= king_home && queenside_rook;
        }
    }
}
