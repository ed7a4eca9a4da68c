//! The ten-level bot ladder.
//!
//! Levels 1 and 2 play random moves, 3 and 4 look one ply ahead, and 5 to
//! 10 run the negamax search with more features switched on at each step.
//! A [`Bot`] owns its random number generator, so a seeded bot replays the
//! same game move for move.

use std::fmt;
use std::time::Duration;

use log::debug;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::eval::{self, EvalWeights};
use crate::game::play_unchecked;
use crate::movegen;
use crate::position::Position;
use crate::search::{self, SearchBudget, SearchSettings};
use crate::types::*;

/// A bot strength between 1 and 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MIN: Difficulty = Difficulty(1);
    pub const MAX: Difficulty = Difficulty(10);

    pub fn new(level: u8) -> EngineResult<Self> {
        if (1..=10).contains(&level) {
            Ok(Self(level))
        } else {
            Err(EngineError::InvalidDifficulty(level))
        }
    }

    pub fn level(self) -> u8 {
        self.0
    }

    /// Every difficulty, weakest first.
    pub fn all() -> impl Iterator<Item = Difficulty> {
        (1..=10).map(Difficulty)
    }

    /// Name and description shown to players.
    pub fn profile(self) -> BotProfile {
        let (name, description) = match self.0 {
            1 => ("Rookie", "Just learning the rules"),
            2 => ("Beginner", "Makes basic moves"),
            3 => ("Apprentice", "Understands basic tactics"),
            4 => ("Student", "Knows opening principles"),
            5 => ("Club Player", "Decent tactical vision"),
            6 => ("Tournament Player", "Strong positional play"),
            7 => ("Expert", "Advanced tactical skills"),
            8 => ("Master", "Deep strategic understanding"),
            9 => ("Grandmaster", "World-class chess mind"),
            _ => ("Chess Engine", "Near-perfect play"),
        };
        BotProfile {
            name: name.to_string(),
            difficulty: self,
            description: description.to_string(),
        }
    }

    /// How this level picks its moves.
    pub fn strategy(self) -> Strategy {
        match self.0 {
            1 => Strategy::Random,
            2 => Strategy::CautiousRandom,
            3 => Strategy::Greedy {
                margin: 30,
                hanging_penalty: false,
            },
            4 => Strategy::Greedy {
                margin: 10,
                hanging_penalty: true,
            },
            level => Strategy::Search(search_settings(level)),
        }
    }

    /// Evaluation terms this level knows about.
    pub fn weights(self, base: EvalWeights) -> EvalWeights {
        match self.0 {
            1..=3 => base.basic(),
            4..=6 => base.standard(),
            _ => base,
        }
    }

    /// Resource limit used when the caller does not set one.
    pub fn default_budget(self) -> SearchBudget {
        match self.0 {
            9 | 10 => SearchBudget::unlimited().with_time(Duration::from_secs(10)),
            7 | 8 => SearchBudget::unlimited().with_time(Duration::from_secs(5)),
            _ => SearchBudget::unlimited(),
        }
    }
}

impl TryFrom<u8> for Difficulty {
    type Error = EngineError;

    fn try_from(level: u8) -> EngineResult<Self> {
        Self::new(level)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> u8 {
        d.0
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Public description of a bot, as listed by the `bots` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotProfile {
    pub name: String,
    pub difficulty: Difficulty,
    pub description: String,
}

/// Move selection strategy of a difficulty level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Uniformly random legal move.
    Random,
    /// Random, but avoids moves that leave the moved piece en prise.
    CautiousRandom,
    /// Best one-ply evaluation; ties within `margin` centipawns are broken
    /// at random. With `hanging_penalty` a move that leaves the moved piece
    /// en prise loses that piece's value.
    Greedy { margin: i32, hanging_penalty: bool },
    /// Negamax search.
    Search(SearchSettings),
}

fn search_settings(level: u8) -> SearchSettings {
    let base = SearchSettings::default();
    match level {
        5 => SearchSettings {
            depth: 2,
            move_ordering: false,
            ..base
        },
        6 => SearchSettings {
            depth: 3,
            move_ordering: false,
            ..base
        },
        7 => SearchSettings { depth: 3, ..base },
        8 => SearchSettings { depth: 4, ..base },
        9 => SearchSettings {
            depth: 4,
            quiescence: true,
            ..base
        },
        _ => SearchSettings {
            depth: 4,
            quiescence: true,
            quiescence_checks: true,
            ..base
        },
    }
}

/// A computer opponent at a fixed difficulty.
#[derive(Debug, Clone)]
pub struct Bot {
    difficulty: Difficulty,
    weights: EvalWeights,
    budget: SearchBudget,
    threads: Option<usize>,
    rng: StdRng,
}

impl Bot {
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_rng(difficulty, StdRng::from_rng(&mut rand::rng()))
    }

    /// A bot whose random choices are reproducible.
    pub fn seeded(difficulty: Difficulty, seed: u64) -> Self {
        Self::with_rng(difficulty, StdRng::seed_from_u64(seed))
    }

    fn with_rng(difficulty: Difficulty, rng: StdRng) -> Self {
        Self {
            difficulty,
            weights: EvalWeights::default(),
            budget: difficulty.default_budget(),
            threads: None,
            rng,
        }
    }

    /// Replaces the base evaluation weights. The level still decides which
    /// terms are used.
    pub fn with_weights(mut self, weights: EvalWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_budget(mut self, budget: SearchBudget) -> Self {
        self.budget = budget;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn profile(&self) -> BotProfile {
        self.difficulty.profile()
    }

    /// Picks a move for the side to move.
    ///
    /// Fails with [`EngineError::NoLegalMove`] if there is none.
    pub fn choose_move(&mut self, pos: &Position) -> EngineResult<Move> {
        let moves = movegen::legal_moves(pos);
        if moves.is_empty() {
            return Err(EngineError::NoLegalMove);
        }
        let weights = self.difficulty.weights(self.weights);

        let chosen = match self.difficulty.strategy() {
            Strategy::Random => moves.choose(&mut self.rng).copied(),
            Strategy::CautiousRandom => {
                let safe: Vec<Move> = moves
                    .iter()
                    .copied()
                    .filter(|mv| !hangs_moved_piece(pos, mv))
                    .collect();
                let pool = if safe.is_empty() { &moves } else { &safe };
                pool.choose(&mut self.rng).copied()
            }
            Strategy::Greedy {
                margin,
                hanging_penalty,
            } => {
                let scored: Vec<(Move, i32)> = moves
                    .iter()
                    .map(|mv| {
                        let mut score = one_ply_score(pos, mv, &weights);
                        if hanging_penalty && hangs_moved_piece(pos, mv) {
                            score -= moved_piece_value(pos, mv);
                        }
                        (*mv, score)
                    })
                    .collect();
                let best = scored.iter().map(|&(_, s)| s).max().unwrap_or(0);
                let near_best: Vec<Move> = scored
                    .into_iter()
                    .filter(|&(_, s)| s >= best - margin)
                    .map(|(mv, _)| mv)
                    .collect();
                near_best.choose(&mut self.rng).copied()
            }
            Strategy::Search(mut settings) => {
                if let Some(threads) = self.threads {
                    settings.threads = threads;
                }
                // Equal moves are decided by root order
                let mut root_moves = moves;
                root_moves.shuffle(&mut self.rng);
                let outcome =
                    search::search_moves(pos, root_moves, &settings, &weights, self.budget);
                debug!(
                    "level {} searched depth {} ({} nodes) score {}",
                    self.difficulty, outcome.depth_reached, outcome.nodes, outcome.score
                );
                outcome.best_move
            }
        };

        chosen.ok_or(EngineError::NoLegalMove)
    }
}

/// One-shot move choice at `level` with a fresh random generator.
pub fn choose_move(pos: &Position, level: u8) -> EngineResult<Move> {
    Bot::new(Difficulty::new(level)?).choose_move(pos)
}

/// Score of the position after `mv`, for the side making it.
fn one_ply_score(pos: &Position, mv: &Move, weights: &EvalWeights) -> i32 {
    let child = play_unchecked(pos, mv);
    pos.turn.sign() * eval::evaluate(&child, weights)
}

/// Material value of the piece standing on the target square after `mv`.
fn moved_piece_value(pos: &Position, mv: &Move) -> i32 {
    let kind = match (mv.promotion, pos.board.get(mv.from)) {
        (Some(promoted), _) => promoted,
        (None, Some(piece)) => piece.kind,
        (None, None) => return 0,
    };
    EvalWeights::default().piece_value(kind)
}

/// The moved piece can be taken on its new square and nobody defends it,
/// or it can be taken by something cheaper.
fn hangs_moved_piece(pos: &Position, mv: &Move) -> bool {
    let child = play_unchecked(pos, mv);
    let Some(moved) = child.board.get(mv.to) else {
        return false;
    };
    if moved.kind == PieceKind::King {
        return false;
    }
    let attackers: Vec<PieceKind> = movegen::legal_moves(&child)
        .iter()
        .filter(|reply| reply.to == mv.to)
        .filter_map(|reply| child.board.get(reply.from).map(|p| p.kind))
        .collect();
    if attackers.is_empty() {
        return false;
    }
    let weights = EvalWeights::default();
    let cheapest = attackers
        .iter()
        .map(|k| weights.piece_value(*k))
        .min()
        .unwrap_or(0);
    let defended = movegen::is_square_attacked(&child.board, mv.to, pos.turn);
    !defended || cheapest < weights.piece_value(moved.kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn bot(level: u8, seed: u64) -> Bot {
        Bot::seeded(Difficulty::new(level).unwrap(), seed).with_threads(1)
    }

    #[test]
    fn test_difficulty_bounds() {
        assert!(Difficulty::new(1).is_ok());
        assert!(Difficulty::new(10).is_ok());
        assert_eq!(Difficulty::new(0), Err(EngineError::InvalidDifficulty(0)));
        assert_eq!(
            Difficulty::try_from(11),
            Err(EngineError::InvalidDifficulty(11))
        );
        assert_eq!(Difficulty::all().count(), 10);
    }

    #[test]
    fn test_roster_names() {
        assert_eq!(Difficulty::MIN.profile().name, "Rookie");
        assert_eq!(Difficulty::MAX.profile().name, "Chess Engine");
        let json = serde_json::to_string(&Difficulty::new(5).unwrap().profile()).unwrap();
        assert!(json.contains("\"difficulty\":5"));
        assert!(json.contains("Club Player"));
    }

    #[test]
    fn test_strategy_ladder() {
        let strategy = |l| Difficulty::new(l).unwrap().strategy();
        assert_eq!(strategy(1), Strategy::Random);
        assert_eq!(strategy(2), Strategy::CautiousRandom);
        assert!(matches!(strategy(3), Strategy::Greedy { .. }));
        match strategy(5) {
            Strategy::Search(s) => {
                assert_eq!(s.depth, 2);
                assert!(s.alpha_beta);
                assert!(!s.move_ordering);
            }
            other => panic!("unexpected {:?}", other),
        }
        match strategy(10) {
            Strategy::Search(s) => {
                assert_eq!(s.depth, 4);
                assert!(s.quiescence);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_each_search_level_adds_something() {
        let base = EvalWeights::default();
        let config = |l: u8| {
            let d = Difficulty::new(l).unwrap();
            (d.strategy(), d.weights(base))
        };
        for level in 5..10 {
            assert_ne!(config(level), config(level + 1), "levels {} and {}", level, level + 1);
        }
        // Level 7 keeps level 6's depth but evaluates king safety and pawns
        assert_eq!(config(7).1, base);
        assert_ne!(config(6).1, base);
    }

    #[test]
    fn test_every_level_returns_a_legal_move() {
        let p = pos("4k3/8/3p4/8/4P3/8/3N4/4K3 w - - 0 1");
        let legal = movegen::legal_moves(&p);
        for level in 1..=10 {
            let mv = bot(level, 7).choose_move(&p).unwrap();
            assert!(legal.contains(&mv), "level {} played {}", level, mv);
        }
    }

    #[test]
    fn test_no_legal_move_error() {
        let mated = pos("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        for level in [1, 4, 7] {
            assert_eq!(bot(level, 1).choose_move(&mated), Err(EngineError::NoLegalMove));
        }
        let stalemate = pos("k7/2Q5/1K6/8/8/8/8/8 b - - 0 1");
        assert_eq!(choose_move(&stalemate, 3), Err(EngineError::NoLegalMove));
    }

    #[test]
    fn test_invalid_level_rejected() {
        assert_eq!(
            choose_move(&Position::new_game(), 0),
            Err(EngineError::InvalidDifficulty(0))
        );
    }

    #[test]
    fn test_search_levels_find_mate_in_one() {
        let p = pos("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1");
        for level in 5..=10 {
            assert_eq!(bot(level, 3).choose_move(&p).unwrap().to_string(), "a1a8");
        }
    }

    #[test]
    fn test_deep_levels_find_mate_in_two() {
        let p = pos("2r3k1/5ppp/8/8/8/8/3R4/3R2K1 w - - 0 1");
        for level in [6, 8, 10] {
            assert_eq!(bot(level, 3).choose_move(&p).unwrap().to_string(), "d2d8");
        }
    }

    #[test]
    fn test_greedy_takes_the_queen() {
        let p = pos("4k3/8/8/3q4/8/8/8/3QK3 w - - 0 1");
        for level in [3, 4] {
            for seed in 0..5 {
                assert_eq!(bot(level, seed).choose_move(&p).unwrap().to_string(), "d1d5");
            }
        }
    }

    #[test]
    fn test_level_four_sees_the_recapture() {
        // Qxd5 wins a pawn but the e6 pawn takes the queen back
        let p = pos("4k3/8/4p3/3p4/8/8/8/3QK3 w - - 0 1");
        for seed in 0..5 {
            assert_eq!(bot(3, seed).choose_move(&p).unwrap().to_string(), "d1d5");
            assert_ne!(bot(4, seed).choose_move(&p).unwrap().to_string(), "d1d5");
        }
    }

    #[test]
    fn test_cautious_random_avoids_hanging_the_queen() {
        // Qb1 walks onto the rook's file with no defender
        let p = pos("1r2k3/8/8/8/8/8/8/Q3K3 w - - 0 1");
        let hanging = Move::from_coordinates("a1b1").unwrap();
        for seed in 0..20 {
            let mv = bot(2, seed).choose_move(&p).unwrap();
            assert!(!mv.same_coordinates(&hanging));
        }
        assert!(hangs_moved_piece(&p, &movegen::find_matching_legal_move(&p, &hanging).unwrap()));
    }

    #[test]
    fn test_search_levels_vary_between_equal_moves() {
        // Ra8 and Rb8 both mate at once
        let p = pos("7k/6pp/8/8/8/8/1R6/R5K1 w - - 0 1");
        for level in [5, 8, 10] {
            let picks: Vec<String> = (0..16)
                .map(|seed| bot(level, seed).choose_move(&p).unwrap().to_string())
                .collect();
            assert!(picks.iter().all(|m| m == "a1a8" || m == "b2b8"), "{:?}", picks);
            assert!(picks.iter().any(|m| m == "a1a8"), "level {}: {:?}", level, picks);
            assert!(picks.iter().any(|m| m == "b2b8"), "level {}: {:?}", level, picks);
        }

        let again: Vec<Move> = (0..2).map(|_| bot(8, 5).choose_move(&p).unwrap()).collect();
        assert_eq!(again[0], again[1]);
    }

    #[test]
    fn test_seeded_bots_are_reproducible() {
        let start = Position::new_game();
        let a: Vec<Move> = {
            let mut b = bot(1, 42);
            (0..5).map(|_| b.choose_move(&start).unwrap()).collect()
        };
        let b: Vec<Move> = {
            let mut b = bot(1, 42);
            (0..5).map(|_| b.choose_move(&start).unwrap()).collect()
        };
        assert_eq!(a, b);
    }
}
