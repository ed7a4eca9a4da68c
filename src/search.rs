//! Negamax search with alpha-beta pruning, iterative deepening and
//! quiescence.
//!
//! Root moves are split round-robin over a small pool of scoped threads.
//! Every worker owns the positions it derives; the only shared state is the
//! root position (read-only) and a [`SearchControl`] holding the stop flag
//! and node counter. A [`SearchBudget`] is checked on every node; when it
//! runs out the search falls back to the deepest completed iteration.

use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::eval::{self, EvalWeights, MATE_SCORE};
use crate::game::play_unchecked;
use crate::movegen;
use crate::position::Position;
use crate::types::*;

const INFINITY: i32 = MATE_SCORE + 1;

/// Search features and limits. Missing fields in JSON take the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Nominal depth in plies.
    pub depth: u8,
    /// Prune with an alpha-beta window. Without it every node is searched
    /// with the full window (plain negamax).
    pub alpha_beta: bool,
    /// Captures (MVV-LVA), promotions and checks first.
    pub move_ordering: bool,
    /// Resolve captures at the horizon instead of stopping cold.
    pub quiescence: bool,
    /// Also try quiet checking moves at the first quiescence ply.
    pub quiescence_checks: bool,
    /// Maximum extra plies spent in quiescence.
    pub quiescence_depth: u8,
    /// Root worker threads.
    pub threads: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            depth: 3,
            alpha_beta: true,
            move_ordering: true,
            quiescence: false,
            quiescence_checks: false,
            quiescence_depth: 6,
            threads: default_threads(),
        }
    }
}

/// Available parallelism, capped at 4.
pub fn default_threads() -> usize {
    thread::available_parallelism()
        .map(|n| n.get().min(4))
        .unwrap_or(1)
}

/// Caller-supplied resource limits. Both are optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchBudget {
    pub time_limit: Option<Duration>,
    pub max_nodes: Option<u64>,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn with_time(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_nodes(mut self, nodes: u64) -> Self {
        self.max_nodes = Some(nodes);
        self
    }
}

/// Result of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOutcome {
    /// `None` only when the side to move has no legal move.
    pub best_move: Option<Move>,
    /// Score of `best_move` for the side to move.
    pub score: i32,
    /// Deepest fully completed iteration (0 if none finished).
    pub depth_reached: u8,
    pub nodes: u64,
    /// The budget ran out before the nominal depth was completed.
    pub aborted: bool,
}

/// Stop flag and node accounting shared by all workers.
#[derive(Debug)]
pub struct SearchControl {
    stop: AtomicBool,
    nodes: AtomicU64,
    deadline: Option<Instant>,
    max_nodes: Option<u64>,
}

impl SearchControl {
    pub fn new(budget: SearchBudget) -> Self {
        Self {
            stop: AtomicBool::new(false),
            nodes: AtomicU64::new(0),
            deadline: budget.time_limit.map(|limit| Instant::now() + limit),
            max_nodes: budget.max_nodes,
        }
    }

    #[inline]
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    /// Counts one node and returns true if the search must stop.
    #[inline]
    fn visit(&self) -> bool {
        if self.should_stop() {
            return true;
        }
        let visited = self.nodes.fetch_add(1, Ordering::Relaxed) + 1;
        let over_nodes = self.max_nodes.is_some_and(|limit| visited > limit);
        let over_time = self.deadline.is_some_and(|deadline| Instant::now() >= deadline);
        if over_nodes || over_time {
            self.request_stop();
            return true;
        }
        false
    }
}

/// Searches `pos` and returns the best move for the side to move.
pub fn search(
    pos: &Position,
    settings: &SearchSettings,
    weights: &EvalWeights,
    budget: SearchBudget,
) -> SearchOutcome {
    search_moves(pos, movegen::legal_moves(pos), settings, weights, budget)
}

/// Like [`search`], with the root moves supplied in the caller's order.
///
/// `root_moves` must be the legal moves of `pos`. Ties, both in move
/// ordering and in score, go to the move listed first, so shuffling the
/// list picks at random among equally good moves.
pub fn search_moves(
    pos: &Position,
    root_moves: Vec<Move>,
    settings: &SearchSettings,
    weights: &EvalWeights,
    budget: SearchBudget,
) -> SearchOutcome {
    let control = SearchControl::new(budget);
    Searcher {
        settings,
        weights,
        control: &control,
    }
    .run(pos, root_moves)
}

struct Searcher<'a> {
    settings: &'a SearchSettings,
    weights: &'a EvalWeights,
    control: &'a SearchControl,
}

/// Root results of one iteration: `(order index, move, score)`.
type RootResults = Vec<(usize, Move, i32)>;

impl Searcher<'_> {
    fn run(&self, pos: &Position, mut root_moves: Vec<Move>) -> SearchOutcome {
        if root_moves.is_empty() {
            let score = if movegen::is_in_check(&pos.board, pos.turn) {
                -MATE_SCORE
            } else {
                0
            };
            return SearchOutcome {
                best_move: None,
                score,
                depth_reached: 0,
                nodes: 0,
                aborted: false,
            };
        }
        if self.settings.move_ordering {
            order_moves(pos, &mut root_moves);
        }

        let max_depth = self.settings.depth.max(1);
        let mut completed: Option<(u8, RootResults)> = None;
        let mut partial: RootResults = Vec::new();

        for depth in 1..=max_depth {
            let (results, finished) = self.search_root(pos, &root_moves, depth);
            if !finished {
                partial = results;
                break;
            }

            let mut ranked = results;
            ranked.sort_by_key(|&(idx, _, score)| (Reverse(score), idx));
            if let Some(&(_, mv, score)) = ranked.first() {
                debug!(
                    "depth {} best {} score {} nodes {}",
                    depth,
                    mv,
                    score,
                    self.control.nodes()
                );
            }
            // Best moves of this iteration are tried first in the next one
            root_moves = ranked.iter().map(|&(_, mv, _)| mv).collect();
            let reindexed = ranked
                .into_iter()
                .enumerate()
                .map(|(idx, (_, mv, score))| (idx, mv, score))
                .collect();
            completed = Some((depth, reindexed));

            // A forced mate will not change with more depth
            if let Some((_, results)) = &completed
                && results.first().is_some_and(|r| r.2.abs() >= eval::MATE_THRESHOLD)
            {
                break;
            }
        }

        let nodes = self.control.nodes();
        let aborted = self.control.should_stop();

        match completed {
            Some((depth, results)) => {
                let (_, best, score) = results[0];
                SearchOutcome {
                    best_move: Some(best),
                    score,
                    depth_reached: depth,
                    nodes,
                    aborted,
                }
            }
            None => {
                warn!(
                    "search budget expired before depth 1 completed ({} of {} root moves scored)",
                    partial.len(),
                    root_moves.len()
                );
                partial.sort_by_key(|&(idx, _, score)| (Reverse(score), idx));
                let (best, score) = match partial.first() {
                    Some(&(_, mv, score)) => (mv, score),
                    None => (root_moves[0], 0),
                };
                SearchOutcome {
                    best_move: Some(best),
                    score,
                    depth_reached: 0,
                    nodes,
                    aborted: true,
                }
            }
        }
    }

    /// Scores every root move at `depth`. Returns the scored moves and
    /// whether the iteration finished.
    fn search_root(&self, pos: &Position, moves: &[Move], depth: u8) -> (RootResults, bool) {
        let threads = self.settings.threads.clamp(1, moves.len());
        if threads == 1 {
            return self.root_worker(pos, moves, depth, 0, 1);
        }

        thread::scope(|scope| {
            let handles: Vec<_> = (0..threads)
                .map(|worker| scope.spawn(move || self.root_worker(pos, moves, depth, worker, threads)))
                .collect();

            let mut results = Vec::with_capacity(moves.len());
            let mut finished = true;
            for handle in handles {
                match handle.join() {
                    Ok((part, done)) => {
                        results.extend(part);
                        finished &= done;
                    }
                    Err(payload) => std::panic::resume_unwind(payload),
                }
            }
            (results, finished)
        })
    }

    /// Searches the root moves `worker, worker + stride, ...` with a
    /// worker-local alpha.
    fn root_worker(
        &self,
        pos: &Position,
        moves: &[Move],
        depth: u8,
        worker: usize,
        stride: usize,
    ) -> (RootResults, bool) {
        let mut results = Vec::new();
        let mut alpha = -INFINITY;

        for (idx, mv) in moves.iter().enumerate().skip(worker).step_by(stride) {
            let child = play_unchecked(pos, mv);
            let window_alpha = if self.settings.alpha_beta { alpha } else { -INFINITY };
            let Some(child_score) = self.negamax(&child, depth - 1, 1, -INFINITY, -window_alpha) else {
                return (results, false);
            };
            let score = -child_score;
            trace!("depth {} move {} score {}", depth, mv, score);
            alpha = alpha.max(score);
            results.push((idx, *mv, score));
        }
        (results, true)
    }

    /// Score for the side to move, or `None` when the budget ran out.
    fn negamax(&self, pos: &Position, depth: u8, ply: i32, mut alpha: i32, beta: i32) -> Option<i32> {
        if self.control.visit() {
            return None;
        }

        let mut moves = movegen::legal_moves(pos);
        if moves.is_empty() {
            return Some(if movegen::is_in_check(&pos.board, pos.turn) {
                -MATE_SCORE + ply
            } else {
                0
            });
        }
        if eval::is_drawn(pos) || pos.repetition_count() >= 2 {
            return Some(0);
        }
        if depth == 0 {
            return if self.settings.quiescence {
                self.quiesce(pos, ply, 0, alpha, beta)
            } else {
                Some(pos.turn.sign() * eval::static_eval(pos, self.weights))
            };
        }

        if self.settings.move_ordering {
            order_moves(pos, &mut moves);
        }

        let mut best = -INFINITY;
        for mv in &moves {
            let child = play_unchecked(pos, mv);
            let score = -self.negamax(&child, depth - 1, ply + 1, -beta, -alpha)?;
            best = best.max(score);
            if self.settings.alpha_beta {
                alpha = alpha.max(score);
                if alpha >= beta {
                    break;
                }
            }
        }
        Some(best)
    }

    /// Captures and promotions until the position is quiet. In check every
    /// evasion is searched and standing pat is not allowed.
    fn quiesce(&self, pos: &Position, ply: i32, qdepth: u8, mut alpha: i32, beta: i32) -> Option<i32> {
        if self.control.visit() {
            return None;
        }

        let in_check = movegen::is_in_check(&pos.board, pos.turn);
        let moves = movegen::legal_moves(pos);
        if moves.is_empty() {
            return Some(if in_check { -MATE_SCORE + ply } else { 0 });
        }
        if eval::is_drawn(pos) {
            return Some(0);
        }

        let stand_pat = pos.turn.sign() * eval::static_eval(pos, self.weights);
        if qdepth >= self.settings.quiescence_depth {
            return Some(stand_pat);
        }

        let mut best = -INFINITY;
        if !in_check {
            if stand_pat >= beta {
                return Some(stand_pat);
            }
            best = stand_pat;
            alpha = alpha.max(stand_pat);
        }

        let try_checks = self.settings.quiescence_checks && qdepth == 0;
        let mut candidates: Vec<Move> = moves
            .into_iter()
            .filter(|mv| {
                in_check
                    || mv.capture
                    || mv.promotion.is_some()
                    || (try_checks && gives_check(pos, mv))
            })
            .collect();
        order_moves(pos, &mut candidates);

        for mv in &candidates {
            let child = play_unchecked(pos, mv);
            let score = -self.quiesce(&child, ply + 1, qdepth + 1, -beta, -alpha)?;
            best = best.max(score);
            alpha = alpha.max(score);
            if alpha >= beta {
                break;
            }
        }
        Some(best)
    }
}

/// `true` if playing `mv` puts the opponent in check.
pub fn gives_check(pos: &Position, mv: &Move) -> bool {
    let mut board = pos.board.clone();
    movegen::apply_move_to_board(&mut board, mv, pos.turn);
    movegen::is_in_check(&board, pos.turn.opponent())
}

/// Sorts moves best-first: captures by most valuable victim then least
/// valuable attacker, promotions, checks, then the rest in generation
/// order.
pub fn order_moves(pos: &Position, moves: &mut [Move]) {
    moves.sort_by_cached_key(|mv| Reverse(ordering_score(pos, mv)));
}

fn ordering_score(pos: &Position, mv: &Move) -> i32 {
    let mut score = 0;
    if mv.capture {
        let victim = if mv.en_passant {
            PieceKind::Pawn
        } else {
            pos.board.get(mv.to).map_or(PieceKind::Pawn, |p| p.kind)
        };
        let attacker = pos.board.get(mv.from).map_or(PieceKind::Pawn, |p| p.kind);
        score += 10_000 + 10 * rank_of(victim) - rank_of(attacker);
    }
    if let Some(kind) = mv.promotion {
        score += 8_000 + rank_of(kind);
    }
    if gives_check(pos, mv) {
        score += 5_000;
    }
    score
}

fn rank_of(kind: PieceKind) -> i32 {
    match kind {
        PieceKind::Pawn => 1,
        PieceKind::Knight => 2,
        PieceKind::Bishop => 3,
        PieceKind::Rook => 4,
        PieceKind::Queen => 5,
        PieceKind::King => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(fen: &str) -> Position {
        Position::from_fen(fen).unwrap()
    }

    fn settings(depth: u8) -> SearchSettings {
        SearchSettings {
            depth,
            threads: 1,
            ..SearchSettings::default()
        }
    }

    fn best(fen: &str, settings: &SearchSettings) -> SearchOutcome {
        search(&pos(fen), settings, &EvalWeights::default(), SearchBudget::unlimited())
    }

    #[test]
    fn test_finds_mate_in_one() {
        // Back-rank mate: Ra1-a8
        let out = best("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1", &settings(2));
        assert_eq!(out.best_move.unwrap().to_string(), "a1a8");
        assert_eq!(out.score, MATE_SCORE - 1);
    }

    #[test]
    fn test_finds_mate_in_two() {
        // 1. Rd8+ Rxd8 2. Rxd8#
        let out = best("2r3k1/5ppp/8/8/8/8/3R4/3R2K1 w - - 0 1", &settings(3));
        assert_eq!(out.best_move.unwrap().to_string(), "d2d8");
        assert_eq!(out.score, MATE_SCORE - 3);
    }

    #[test]
    fn test_prefers_faster_mate() {
        // Both rooks mate eventually; only Ra8 mates at once
        let out = best("6k1/5ppp/8/8/8/8/1R6/R5K1 w - - 0 1", &settings(3));
        assert_eq!(out.score, MATE_SCORE - 1);
    }

    #[test]
    fn test_captures_hanging_queen() {
        let out = best("4k3/8/8/3q4/8/8/8/3QK3 w - - 0 1", &settings(2));
        assert_eq!(out.best_move.unwrap().to_string(), "d1d5");
    }

    #[test]
    fn test_no_legal_move_gives_none() {
        let mated = pos("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3");
        let out = search(&mated, &settings(2), &EvalWeights::default(), SearchBudget::unlimited());
        assert!(out.best_move.is_none());
        assert_eq!(out.score, -MATE_SCORE);
    }

    #[test]
    fn test_alpha_beta_matches_plain_negamax() {
        let fen = "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3";
        let plain = SearchSettings {
            alpha_beta: false,
            move_ordering: false,
            ..settings(2)
        };
        let pruned = settings(2);
        let a = best(fen, &plain);
        let b = best(fen, &pruned);
        assert_eq!(a.score, b.score);
        assert!(b.nodes < a.nodes);
    }

    #[test]
    fn test_threaded_search_agrees_with_single_thread() {
        let fen = "r1bqkb1r/pppp1ppp/2n2n2/4p2Q/2B1P3/8/PPPP1PPP/RNB1K1NR w KQkq - 4 4";
        let single = best(fen, &settings(2));
        let multi = best(
            fen,
            &SearchSettings {
                threads: 4,
                ..settings(2)
            },
        );
        assert_eq!(single.best_move, multi.best_move);
        assert_eq!(single.score, multi.score);
        // Scholar's mate is on the board
        assert_eq!(single.best_move.unwrap().to_string(), "h5f7");
    }

    #[test]
    fn test_quiescence_sees_recapture() {
        // Rxd5 wins a pawn but loses the rook to the c6 pawn
        let fen = "4k3/8/2p5/3p4/8/8/8/3RK3 w - - 0 1";
        let with_q = SearchSettings {
            quiescence: true,
            ..settings(1)
        };
        let out = best(fen, &with_q);
        assert_ne!(out.best_move.unwrap().to_string(), "d1d5");
    }

    #[test]
    fn test_node_budget_aborts_with_a_legal_move() {
        let start = Position::new_game();
        let out = search(
            &start,
            &settings(6),
            &EvalWeights::default(),
            SearchBudget::unlimited().with_nodes(500),
        );
        assert!(out.aborted);
        assert!(out.depth_reached < 6);
        let mv = out.best_move.unwrap();
        assert!(movegen::legal_moves(&start).contains(&mv));
    }

    #[test]
    fn test_budget_of_one_node_still_returns_a_move() {
        let start = Position::new_game();
        let out = search(
            &start,
            &settings(3),
            &EvalWeights::default(),
            SearchBudget::unlimited().with_nodes(1),
        );
        assert!(out.aborted);
        assert_eq!(out.depth_reached, 0);
        assert!(out.best_move.is_some());
    }

    #[test]
    fn test_root_order_breaks_score_ties() {
        // Ra8 and Rb8 both mate at once
        let p = pos("7k/6pp/8/8/8/8/1R6/R5K1 w - - 0 1");
        let weights = EvalWeights::default();
        let mut moves = movegen::legal_moves(&p);
        let forward = search_moves(&p, moves.clone(), &settings(2), &weights, SearchBudget::unlimited());
        moves.reverse();
        let backward = search_moves(&p, moves, &settings(2), &weights, SearchBudget::unlimited());

        assert_eq!(forward.score, MATE_SCORE - 1);
        assert_eq!(backward.score, MATE_SCORE - 1);
        let picks = [forward.best_move.unwrap().to_string(), backward.best_move.unwrap().to_string()];
        assert_ne!(picks[0], picks[1]);
        assert!(picks.iter().all(|m| m == "a1a8" || m == "b2b8"));
    }

    #[test]
    fn test_ordering_puts_best_capture_first() {
        let p = pos("4k3/8/8/3q1r2/4P3/8/8/4K3 w - - 0 1");
        let mut moves = movegen::legal_moves(&p);
        order_moves(&p, &mut moves);
        assert_eq!(moves[0].to_string(), "e4d5");
        assert_eq!(moves[1].to_string(), "e4f5");
    }

    #[test]
    fn test_settings_from_partial_json() {
        let s: SearchSettings = serde_json::from_str(r#"{"depth": 5, "quiescence": true}"#).unwrap();
        assert_eq!(s.depth, 5);
        assert!(s.quiescence);
        assert!(s.alpha_beta);
        assert!(s.threads >= 1);
    }
}
