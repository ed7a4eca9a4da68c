//! Bot-versus-bot matches.
//!
//! Games are played with the same `apply_move` path a human move takes, so
//! a match doubles as an end-to-end check of the rules and the ladder.

use std::time::{Duration, Instant};

use log::{debug, info};
use serde::Serialize;

use crate::bot::{Bot, Difficulty};
use crate::error::{EngineError, EngineResult};
use crate::eval::EvalWeights;
use crate::game::{apply_move, classify};
use crate::position::Position;
use crate::types::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchOutcome {
    WhiteWinCheckmate,
    BlackWinCheckmate,
    DrawStalemate,
    DrawRepetition,
    DrawFiftyMove,
    DrawInsufficientMaterial,
    /// Ply cap reached with one side ahead by at least the adjudication
    /// margin in material.
    WhiteWinAdjudicated,
    BlackWinAdjudicated,
    DrawMaxPlies,
}

impl MatchOutcome {
    pub fn winner(self) -> Option<Color> {
        match self {
            Self::WhiteWinCheckmate | Self::WhiteWinAdjudicated => Some(Color::White),
            Self::BlackWinCheckmate | Self::BlackWinAdjudicated => Some(Color::Black),
            _ => None,
        }
    }

    /// Maps a terminal status to an outcome; `None` while the game goes on.
    fn from_status(status: GameStatus, side_to_move: Color) -> Option<Self> {
        Some(match status {
            GameStatus::Ongoing | GameStatus::Check => return None,
            GameStatus::Checkmate => match side_to_move {
                Color::White => Self::BlackWinCheckmate,
                Color::Black => Self::WhiteWinCheckmate,
            },
            GameStatus::Stalemate => Self::DrawStalemate,
            GameStatus::DrawByRepetition => Self::DrawRepetition,
            GameStatus::DrawByFiftyMove => Self::DrawFiftyMove,
            GameStatus::DrawByInsufficientMaterial => Self::DrawInsufficientMaterial,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MatchConfig {
    pub max_plies: u16,
    /// Material lead (centipawns) that wins a game stopped at the ply cap.
    pub adjudication_margin: i32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_plies: 200,
            adjudication_margin: 300,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchResult {
    pub outcome: MatchOutcome,
    pub final_position: Position,
    pub moves: Vec<Move>,
    pub white_time: Duration,
    pub black_time: Duration,
}

/// Plays one game from `start` until it ends or hits the ply cap.
pub fn play_match(
    white: &mut Bot,
    black: &mut Bot,
    start: Position,
    config: &MatchConfig,
) -> EngineResult<MatchResult> {
    let mut pos = start;
    let mut moves = Vec::new();
    let mut white_time = Duration::ZERO;
    let mut black_time = Duration::ZERO;

    for _ in 0..config.max_plies {
        if let Some(outcome) = MatchOutcome::from_status(classify(&pos), pos.turn) {
            return Ok(MatchResult {
                outcome,
                final_position: pos,
                moves,
                white_time,
                black_time,
            });
        }

        let started = Instant::now();
        let mv = match pos.turn {
            Color::White => white.choose_move(&pos)?,
            Color::Black => black.choose_move(&pos)?,
        };
        match pos.turn {
            Color::White => white_time += started.elapsed(),
            Color::Black => black_time += started.elapsed(),
        }

        pos = apply_move(&pos, mv)?;
        moves.push(mv);
    }

    let outcome = MatchOutcome::from_status(classify(&pos), pos.turn)
        .unwrap_or_else(|| adjudicate(&pos, config.adjudication_margin));
    Ok(MatchResult {
        outcome,
        final_position: pos,
        moves,
        white_time,
        black_time,
    })
}

fn adjudicate(pos: &Position, margin: i32) -> MatchOutcome {
    let weights = EvalWeights::default();
    let balance: i32 = pos
        .board
        .occupied()
        .map(|(_, p)| p.color.sign() * weights.piece_value(p.kind))
        .sum();
    if balance >= margin {
        MatchOutcome::WhiteWinAdjudicated
    } else if balance <= -margin {
        MatchOutcome::BlackWinAdjudicated
    } else {
        MatchOutcome::DrawMaxPlies
    }
}

#[derive(Debug, Clone)]
pub struct SeriesConfig {
    pub games: u16,
    pub base_seed: u64,
    pub per_game: MatchConfig,
    pub weights: EvalWeights,
    /// Worker threads for searching bots; `None` keeps their default.
    pub threads: Option<usize>,
}

impl Default for SeriesConfig {
    fn default() -> Self {
        Self {
            games: 4,
            base_seed: 0,
            per_game: MatchConfig::default(),
            weights: EvalWeights::default(),
            threads: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SeriesStats {
    pub games: u16,
    pub player1_wins: u16,
    pub player2_wins: u16,
    pub draws: u16,
    pub outcomes: Vec<MatchOutcome>,
    pub plies: u32,
}

impl SeriesStats {
    pub fn report(&self) -> String {
        format!(
            "games={} player1_wins={} player2_wins={} draws={} avg_plies={:.1}",
            self.games,
            self.player1_wins,
            self.player2_wins,
            self.draws,
            if self.games == 0 {
                0.0
            } else {
                f64::from(self.plies) / f64::from(self.games)
            }
        )
    }

    /// Points of player 1 minus points of player 2, in half points.
    pub fn balance(&self) -> i32 {
        2 * (i32::from(self.player1_wins) - i32::from(self.player2_wins))
    }
}

/// Plays `config.games` games between two levels, player 1 taking White in
/// the even-numbered games. Seeds are derived from `base_seed`.
pub fn run_series(
    player1: Difficulty,
    player2: Difficulty,
    config: &SeriesConfig,
) -> EngineResult<SeriesStats> {
    if config.games == 0 {
        return Err(EngineError::Parse("a series needs at least one game".to_string()));
    }
    let make_bot = |level: Difficulty, seed: u64| {
        let bot = Bot::seeded(level, seed).with_weights(config.weights);
        match config.threads {
            Some(threads) => bot.with_threads(threads),
            None => bot,
        }
    };

    let mut stats = SeriesStats {
        games: config.games,
        ..SeriesStats::default()
    };

    for i in 0..config.games {
        let seed = config.base_seed.wrapping_add(u64::from(i));
        let mut bot1 = make_bot(player1, seed);
        let mut bot2 = make_bot(player2, seed ^ 0xA5A5_5A5A_0123_4567);
        let player1_is_white = i % 2 == 0;

        let result = if player1_is_white {
            play_match(&mut bot1, &mut bot2, Position::new_game(), &config.per_game)?
        } else {
            play_match(&mut bot2, &mut bot1, Position::new_game(), &config.per_game)?
        };

        match result.outcome.winner() {
            Some(color) if (color == Color::White) == player1_is_white => stats.player1_wins += 1,
            Some(_) => stats.player2_wins += 1,
            None => stats.draws += 1,
        }
        stats.plies += result.moves.len() as u32;
        stats.outcomes.push(result.outcome);

        debug!(
            "game {} moves: {}",
            i + 1,
            result
                .moves
                .iter()
                .map(|m| m.to_string())
                .collect::<Vec<_>>()
                .join(" ")
        );
        info!(
            "game {}/{} seed={} white={} black={} result={:?} plies={}",
            i + 1,
            config.games,
            seed,
            if player1_is_white { player1 } else { player2 },
            if player1_is_white { player2 } else { player1 },
            result.outcome,
            result.moves.len()
        );
    }

    info!("series {} vs {}: {}", player1, player2, stats.report());
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(l: u8) -> Difficulty {
        Difficulty::new(l).unwrap()
    }

    #[test]
    fn test_match_ends_in_mate() {
        let start = Position::from_fen("6k1/5ppp/8/8/8/8/8/R5K1 w - - 0 1").unwrap();
        let mut white = Bot::seeded(level(5), 1).with_threads(1);
        let mut black = Bot::seeded(level(1), 1);
        let result = play_match(&mut white, &mut black, start, &MatchConfig::default()).unwrap();
        assert_eq!(result.outcome, MatchOutcome::WhiteWinCheckmate);
        assert_eq!(result.moves.len(), 1);
        assert_eq!(result.outcome.winner(), Some(Color::White));
    }

    #[test]
    fn test_ply_cap_and_adjudication() {
        let mut white = Bot::seeded(level(1), 3);
        let mut black = Bot::seeded(level(1), 4);
        let config = MatchConfig {
            max_plies: 10,
            ..MatchConfig::default()
        };
        let result = play_match(&mut white, &mut black, Position::new_game(), &config).unwrap();
        assert!(result.moves.len() <= 10);

        // A bare king against a queen is adjudicated at the cap
        let lopsided = Position::from_fen("4k3/8/8/8/8/8/8/3QK3 w - - 0 1").unwrap();
        assert_eq!(adjudicate(&lopsided, 300), MatchOutcome::WhiteWinAdjudicated);
        let level_game = Position::new_game();
        assert_eq!(adjudicate(&level_game, 300), MatchOutcome::DrawMaxPlies);
    }

    #[test]
    fn test_insufficient_material_ends_the_game() {
        let start = Position::from_fen("4k3/8/8/8/8/8/8/3NK3 w - - 0 1").unwrap();
        let mut white = Bot::seeded(level(3), 1);
        let mut black = Bot::seeded(level(3), 2);
        let result = play_match(&mut white, &mut black, start, &MatchConfig::default()).unwrap();
        assert_eq!(result.outcome, MatchOutcome::DrawInsufficientMaterial);
        assert!(result.moves.is_empty());
    }

    #[test]
    fn test_searching_bot_beats_random_bot() {
        let config = SeriesConfig {
            games: 2,
            base_seed: 11,
            per_game: MatchConfig {
                max_plies: 80,
                ..MatchConfig::default()
            },
            threads: Some(1),
            ..SeriesConfig::default()
        };
        let stats = run_series(level(5), level(1), &config).unwrap();
        assert_eq!(stats.outcomes.len(), 2);
        assert_eq!(stats.player1_wins + stats.player2_wins + stats.draws, 2);
        assert!(stats.balance() >= 0, "{}", stats.report());
    }

    fn adjacent_series(stronger: u8, games: u16, max_plies: u16) -> SeriesStats {
        let config = SeriesConfig {
            games,
            base_seed: 2024,
            per_game: MatchConfig {
                max_plies,
                ..MatchConfig::default()
            },
            threads: Some(1),
            ..SeriesConfig::default()
        };
        run_series(level(stronger), level(stronger - 1), &config).unwrap()
    }

    #[test]
    fn test_each_cheap_level_holds_its_own_against_the_one_below() {
        for stronger in 2..=5 {
            let stats = adjacent_series(stronger, 6, 60);
            assert_eq!(stats.outcomes.len(), 6);
            assert!(
                stats.balance() >= 0,
                "level {} vs {}: {}",
                stronger,
                stronger - 1,
                stats.report()
            );
        }
    }

    #[test]
    fn test_deeper_search_level_holds_its_own() {
        let stats = adjacent_series(6, 2, 30);
        assert!(stats.balance() >= 0, "level 6 vs 5: {}", stats.report());
    }

    #[test]
    fn test_search_levels_vary_across_seeds() {
        let config = MatchConfig {
            max_plies: 8,
            ..MatchConfig::default()
        };
        let games: Vec<Vec<Move>> = (0..4)
            .map(|seed| {
                let mut white = Bot::seeded(level(5), seed).with_threads(1);
                let mut black = Bot::seeded(level(5), seed + 100).with_threads(1);
                play_match(&mut white, &mut black, Position::new_game(), &config)
                    .unwrap()
                    .moves
            })
            .collect();
        assert!(games.windows(2).any(|pair| pair[0] != pair[1]));
    }

    #[test]
    fn test_empty_series_rejected() {
        let config = SeriesConfig {
            games: 0,
            ..SeriesConfig::default()
        };
        assert!(run_series(level(1), level(2), &config).is_err());
    }
}
