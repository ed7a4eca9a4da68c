//! Core value types for the chessladder engine.
//!
//! This module defines the small, copyable building blocks everything else
//! is made of: colors, piece kinds, squares, castling rights, the 64-square
//! board, moves and the game status classification. All of them are plain
//! values; a `Position` (see [`crate::position`]) combines them into a full
//! game state.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Piece & Color
// ---------------------------------------------------------------------------

/// Represents the color (side) of a chess piece or player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    /// The White side (starts on ranks 1–2).
    White,
    /// The Black side (starts on ranks 7–8).
    Black,
}

impl Color {
    /// Returns the opposite color.
    pub fn opponent(self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Returns the home rank index (0-based) for pawns of this color.
    /// White pawns start on rank 2 (index 1), Black on rank 7 (index 6).
    pub fn pawn_start_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Returns the promotion rank index (0-based).
    /// White promotes on rank 8 (index 7), Black on rank 1 (index 0).
    pub fn promotion_rank(self) -> u8 {
        match self {
            Color::White => 7,
            Color::Black => 0,
        }
    }

    /// Returns the direction pawns move: +1 for White, -1 for Black.
    pub fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Returns the rank index the king and rooks start on.
    pub fn back_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// `+1` for White, `-1` for Black. Turns a White-positive score into
    /// a score from this side's point of view.
    pub fn sign(self) -> i32 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "white"),
            Color::Black => write!(f, "black"),
        }
    }
}

/// Represents a chess piece type (without color information).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    /// The four kinds a pawn may promote to, strongest first.
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    /// Lowercase letter used in coordinate notation and FEN.
    pub fn letter(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Pawn => 'p',
        }
    }

    /// Parses a piece letter in either case.
    pub fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'k' => Some(PieceKind::King),
            'q' => Some(PieceKind::Queen),
            'r' => Some(PieceKind::Rook),
            'b' => Some(PieceKind::Bishop),
            'n' => Some(PieceKind::Knight),
            'p' => Some(PieceKind::Pawn),
            _ => None,
        }
    }
}

/// A chess piece with both kind and color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
}

impl Piece {
    /// Creates a new piece.
    pub fn new(kind: PieceKind, color: Color) -> Self {
        Self { kind, color }
    }

    /// Converts the piece to its FEN character representation.
    /// Uppercase for White, lowercase for Black.
    pub fn to_fen_char(self) -> char {
        let c = self.kind.letter();
        match self.color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }

    /// Parses a FEN character into a `Piece`.
    /// Returns `None` if the character is not a valid piece symbol.
    pub fn from_fen_char(c: char) -> Option<Self> {
        let color = if c.is_ascii_uppercase() {
            Color::White
        } else {
            Color::Black
        };
        PieceKind::from_letter(c).map(|kind| Piece { kind, color })
    }
}

// ---------------------------------------------------------------------------
// Square
// ---------------------------------------------------------------------------

/// Represents a square on the chessboard using 0-based file and rank indices.
///
/// - `file`: 0 (a) to 7 (h)
/// - `rank`: 0 (rank 1) to 7 (rank 8)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    pub file: u8,
    pub rank: u8,
}

impl Square {
    /// Creates a new square from 0-based file and rank.
    pub fn new(file: u8, rank: u8) -> Self {
        debug_assert!(file < 8 && rank < 8, "Square out of bounds");
        Self { file, rank }
    }

    /// Parses an algebraic notation string (e.g. "e4") into a `Square`.
    /// Returns `None` for invalid input.
    pub fn from_algebraic(s: &str) -> Option<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return None;
        }
        let file = bytes[0].wrapping_sub(b'a');
        let rank = bytes[1].wrapping_sub(b'1');
        if file < 8 && rank < 8 {
            Some(Square { file, rank })
        } else {
            None
        }
    }

    /// Converts the square to its algebraic notation string (e.g. "e4").
    pub fn to_algebraic(self) -> String {
        format!("{}{}", (b'a' + self.file) as char, self.rank + 1)
    }

    /// Returns a new square offset by `(df, dr)`, or `None` if out of bounds.
    pub fn offset(self, df: i8, dr: i8) -> Option<Square> {
        let f = self.file as i8 + df;
        let r = self.rank as i8 + dr;
        if (0..8).contains(&f) && (0..8).contains(&r) {
            Some(Square::new(f as u8, r as u8))
        } else {
            None
        }
    }

    /// Returns a flat index (0..63) for the square.
    pub fn index(self) -> usize {
        (self.rank as usize) * 8 + self.file as usize
    }

    /// Inverse of [`Square::index`].
    pub fn from_index(index: usize) -> Self {
        debug_assert!(index < 64);
        Square::new((index % 8) as u8, (index / 8) as u8)
    }

    /// Iterates over all 64 squares, a1 first, h8 last.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..64).map(Square::from_index)
    }

    /// `true` for dark squares (a1 is dark).
    pub fn is_dark(self) -> bool {
        (self.file + self.rank) % 2 == 0
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_algebraic())
    }
}

// ---------------------------------------------------------------------------
// Castling Rights
// ---------------------------------------------------------------------------

/// Castling rights for one side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SideCastlingRights {
    /// Whether kingside castling (short castling) is still available.
    pub kingside: bool,
    /// Whether queenside castling (long castling) is still available.
    pub queenside: bool,
}

impl Default for SideCastlingRights {
    fn default() -> Self {
        Self {
            kingside: true,
            queenside: true,
        }
    }
}

impl SideCastlingRights {
    pub const NONE: SideCastlingRights = SideCastlingRights {
        kingside: false,
        queenside: false,
    };
}

/// Castling rights for both sides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white: SideCastlingRights,
    pub black: SideCastlingRights,
}

impl CastlingRights {
    /// No castling for either side.
    pub const NONE: CastlingRights = CastlingRights {
        white: SideCastlingRights::NONE,
        black: SideCastlingRights::NONE,
    };

    /// Returns the castling rights for the given color.
    pub fn for_color(&self, color: Color) -> &SideCastlingRights {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }

    /// Returns a mutable reference to the castling rights for the given color.
    pub fn for_color_mut(&mut self, color: Color) -> &mut SideCastlingRights {
        match color {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        }
    }

    /// Generates the FEN castling string (e.g. "KQkq" or "-").
    pub fn to_fen(&self) -> String {
        let mut s = String::new();
        if self.white.kingside {
            s.push('K');
        }
        if self.white.queenside {
            s.push('Q');
        }
        if self.black.kingside {
            s.push('k');
        }
        if self.black.queenside {
            s.push('q');
        }
        if s.is_empty() {
            "-".to_string()
        } else {
            s
        }
    }

    /// Parses the FEN castling field.
    pub fn from_fen(field: &str) -> Option<Self> {
        let mut rights = CastlingRights::NONE;
        if field == "-" {
            return Some(rights);
        }
        for c in field.chars() {
            match c {
                'K' => rights.white.kingside = true,
                'Q' => rights.white.queenside = true,
                'k' => rights.black.kingside = true,
                'q' => rights.black.queenside = true,
                _ => return None,
            }
        }
        Some(rights)
    }

    /// Clears any right that depends on a rook standing on `sq`.
    ///
    /// Called for both the origin and the destination of every move, so a
    /// rook that leaves its corner, or is captured there, loses its right.
    pub fn clear_rook_square(&mut self, sq: Square) {
        match (sq.file, sq.rank) {
            (7, 0) => self.white.kingside = false,
            (0, 0) => self.white.queenside = false,
            (7, 7) => self.black.kingside = false,
            (0, 7) => self.black.queenside = false,
            _ => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Board
// ---------------------------------------------------------------------------

/// Represents the chess board as a flat 64-element array.
///
/// Each element is `Option<Piece>`; `None` is an empty square.
/// Index mapping: `rank * 8 + file` (both 0-based).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    pub squares: [Option<Piece>; 64],
}

impl Default for Board {
    /// Returns an empty board.
    fn default() -> Self {
        Self {
            squares: [None; 64],
        }
    }
}

impl Board {
    /// Returns the piece at the given square, if any.
    pub fn get(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.index()]
    }

    /// Sets (or clears) the piece at the given square.
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.index()] = piece;
    }

    /// Creates the standard starting position.
    pub fn starting_position() -> Self {
        let mut board = Board::default();
        let back_rank = [
            PieceKind::Rook,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Queen,
            PieceKind::King,
            PieceKind::Bishop,
            PieceKind::Knight,
            PieceKind::Rook,
        ];

        for color in [Color::White, Color::Black] {
            for (file, kind) in back_rank.iter().enumerate() {
                board.set(
                    Square::new(file as u8, color.back_rank()),
                    Some(Piece::new(*kind, color)),
                );
                board.set(
                    Square::new(file as u8, color.pawn_start_rank()),
                    Some(Piece::new(PieceKind::Pawn, color)),
                );
            }
        }

        board
    }

    /// Iterates over every occupied square.
    pub fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.squares
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|piece| (Square::from_index(i), piece)))
    }

    /// Finds the king square for the given color.
    /// Returns `None` if the king is not on the board.
    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.occupied()
            .find(|(_, p)| p.kind == PieceKind::King && p.color == color)
            .map(|(sq, _)| sq)
    }

    /// Counts the pieces of one kind and color.
    pub fn count(&self, kind: PieceKind, color: Color) -> usize {
        self.squares
            .iter()
            .flatten()
            .filter(|p| p.kind == kind && p.color == color)
            .count()
    }

    /// FEN piece-placement field (rank 8 first).
    pub fn to_fen_placement(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut empty_count = 0;
            for file in 0..8u8 {
                match self.get(Square::new(file, rank)) {
                    Some(piece) => {
                        if empty_count > 0 {
                            fen.push_str(&empty_count.to_string());
                            empty_count = 0;
                        }
                        fen.push(piece.to_fen_char());
                    }
                    None => empty_count += 1,
                }
            }
            if empty_count > 0 {
                fen.push_str(&empty_count.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }
        fen
    }

    /// Parses the FEN piece-placement field.
    pub fn from_fen_placement(field: &str) -> Result<Self, String> {
        let rows: Vec<&str> = field.split('/').collect();
        if rows.len() != 8 {
            return Err(format!("expected 8 ranks, found {}", rows.len()));
        }
        let mut board = Board::default();
        for (i, row) in rows.iter().enumerate() {
            let rank = 7 - i as u8;
            let mut file = 0u8;
            for c in row.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if skip == 0 || u32::from(file) + skip > 8 {
                        return Err(format!("bad empty-square count '{}' on rank {}", c, rank + 1));
                    }
                    file += skip as u8;
                } else {
                    let piece = Piece::from_fen_char(c)
                        .ok_or_else(|| format!("invalid piece symbol '{}'", c))?;
                    if file >= 8 {
                        return Err(format!("rank {} is too long", rank + 1));
                    }
                    board.set(Square::new(file, rank), Some(piece));
                    file += 1;
                }
            }
            if file != 8 {
                return Err(format!("rank {} does not cover 8 files", rank + 1));
            }
        }
        Ok(board)
    }
}

// ---------------------------------------------------------------------------
// Moves
// ---------------------------------------------------------------------------

/// Which rook a castling move uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CastleSide {
    Kingside,
    Queenside,
}

/// A chess move as produced by the move generator.
///
/// The flags are filled in by generation; a move typed in by a user only
/// needs `from`, `to` and `promotion` and is matched against the legal set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    /// Something is taken (including en passant).
    pub capture: bool,
    pub en_passant: bool,
    pub castle: Option<CastleSide>,
}

impl Move {
    /// Creates a quiet move with no flags set.
    pub fn simple(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            capture: false,
            en_passant: false,
            castle: None,
        }
    }

    /// Creates a capture.
    pub fn capture(from: Square, to: Square) -> Self {
        Self {
            capture: true,
            ..Self::simple(from, to)
        }
    }

    /// Same from/to/promotion, ignoring the flags.
    pub fn same_coordinates(&self, other: &Move) -> bool {
        self.from == other.from && self.to == other.to && self.promotion == other.promotion
    }

    /// Parses coordinate notation: `e2e4`, `e7e8q`.
    pub fn from_coordinates(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.len() < 4 || s.len() > 5 || !s.is_ascii() {
            return None;
        }
        let from = Square::from_algebraic(&s[0..2])?;
        let to = Square::from_algebraic(&s[2..4])?;
        let promotion = match s[4..].chars().next() {
            Some(c) => match PieceKind::from_letter(c)? {
                PieceKind::King | PieceKind::Pawn => return None,
                kind => Some(kind),
            },
            None => None,
        };
        Some(Move {
            promotion,
            ..Move::simple(from, to)
        })
    }

    /// Converts this move to the collaborator wire format.
    pub fn to_json(&self) -> MoveJson {
        MoveJson {
            from: self.from.to_algebraic(),
            to: self.to.to_algebraic(),
            promotion: self.promotion,
        }
    }

    /// Parses a `MoveJson`. Flags are left unset and resolved when the move
    /// is matched against the legal moves of a position.
    pub fn from_json(mj: &MoveJson) -> Result<Self, String> {
        let from = Square::from_algebraic(&mj.from)
            .ok_or_else(|| format!("Invalid from square: {}", mj.from))?;
        let to = Square::from_algebraic(&mj.to)
            .ok_or_else(|| format!("Invalid to square: {}", mj.to))?;
        if matches!(mj.promotion, Some(PieceKind::King | PieceKind::Pawn)) {
            return Err(format!("Invalid promotion piece: {:?}", mj.promotion));
        }
        Ok(Move {
            promotion: mj.promotion,
            ..Move::simple(from, to)
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", promo.letter())?;
        }
        Ok(())
    }
}

/// Wire form of a move for collaborators (API, persistence, UI).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveJson {
    /// Starting square (e.g. "e2").
    pub from: String,
    /// Target square (e.g. "e4").
    pub to: String,
    /// Promotion piece kind, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<PieceKind>,
}

// ---------------------------------------------------------------------------
// Game status
// ---------------------------------------------------------------------------

/// Classification of a position for the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Ongoing,
    Check,
    Checkmate,
    Stalemate,
    DrawByRepetition,
    DrawByFiftyMove,
    DrawByInsufficientMaterial,
}

impl GameStatus {
    /// `true` once no further moves may be played.
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::Ongoing | GameStatus::Check)
    }

    pub fn is_draw(self) -> bool {
        matches!(
            self,
            GameStatus::Stalemate
                | GameStatus::DrawByRepetition
                | GameStatus::DrawByFiftyMove
                | GameStatus::DrawByInsufficientMaterial
        )
    }

    /// The winning color, given the side to move in the classified position.
    pub fn winner(self, side_to_move: Color) -> Option<Color> {
        match self {
            GameStatus::Checkmate => Some(side_to_move.opponent()),
            _ => None,
        }
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Ongoing => write!(f, "Ongoing"),
            GameStatus::Check => write!(f, "Check"),
            GameStatus::Checkmate => write!(f, "Checkmate"),
            GameStatus::Stalemate => write!(f, "Stalemate"),
            GameStatus::DrawByRepetition => write!(f, "Draw by threefold repetition"),
            GameStatus::DrawByFiftyMove => write!(f, "Draw by 50-move rule"),
            GameStatus::DrawByInsufficientMaterial => write!(f, "Draw by insufficient material"),
        }
    }
}
