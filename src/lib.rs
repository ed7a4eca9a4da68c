//! # chessladder
//!
//! A chess rules engine with a ladder of ten computer opponents.
//!
//! The engine is a set of pure functions over an immutable [`Position`]:
//!
//! ```
//! use chessladder::{apply_move, choose_move, legal_moves, new_game};
//!
//! let start = new_game();
//! assert_eq!(legal_moves(&start).len(), 20);
//!
//! let reply = choose_move(&start, 1).unwrap();
//! let next = apply_move(&start, reply).unwrap();
//! assert_eq!(legal_moves(&next).len(), 20);
//! ```
//!
//! Everything else (persistence, transport, rendering, picking a level) is
//! left to the caller. The binary in `main.rs` is one such caller.

pub mod arena;
pub mod bot;
pub mod error;
pub mod eval;
pub mod game;
pub mod movegen;
pub mod position;
pub mod search;
pub mod terminal;
pub mod types;

pub use bot::{Bot, BotProfile, Difficulty, choose_move};
pub use error::{EngineError, EngineResult};
pub use eval::{EvalWeights, evaluate};
pub use game::{apply_move, classify};
pub use movegen::legal_moves;
pub use position::Position;
pub use search::{SearchBudget, SearchSettings};
pub use types::{Color, GameStatus, Move, MoveJson, Piece, PieceKind, Square};

/// The standard initial position.
pub fn new_game() -> Position {
    Position::new_game()
}
