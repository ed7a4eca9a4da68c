//! # chessladder
//!
//! Command-line front end for the chessladder engine.
//!
//! ```bash
//! # Play White against the level 5 bot
//! chessladder play --difficulty 5
//!
//! # List the bot roster as JSON
//! chessladder bots --json
//!
//! # Ten games between level 7 and level 3
//! chessladder match --white 7 --black 3 --games 10
//!
//! # Count leaf nodes of the move tree
//! chessladder perft --depth 4
//! ```

use std::fs;
use std::path::Path;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;

use chessladder::arena::{self, MatchConfig, SeriesConfig};
use chessladder::movegen::perft;
use chessladder::{Bot, Color, Difficulty, EvalWeights, Position, terminal};

/// chessladder: a chess engine with ten bot levels.
#[derive(Parser, Debug)]
#[command(name = "chessladder")]
#[command(about = "Chess rules engine with a ten-level bot ladder")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Color {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a game in the terminal against a bot.
    Play {
        /// Bot level, 1 (random) to 10 (strongest).
        #[arg(short, long, default_value_t = 3)]
        difficulty: u8,

        /// Your color.
        #[arg(short, long, value_enum, default_value_t = Side::White)]
        color: Side,

        /// JSON file overriding evaluation weights.
        #[arg(long)]
        weights: Option<String>,

        /// Search worker threads.
        #[arg(long)]
        threads: Option<usize>,
    },

    /// List the bot roster.
    Bots {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Play a series of bot-versus-bot games.
    Match {
        /// Level of player 1 (White in the first game).
        #[arg(long)]
        white: u8,

        /// Level of player 2.
        #[arg(long)]
        black: u8,

        #[arg(short, long, default_value_t = 4)]
        games: u16,

        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Ply cap per game; games reaching it are adjudicated on material.
        #[arg(long, default_value_t = 200)]
        max_plies: u16,

        #[arg(long)]
        weights: Option<String>,

        #[arg(long)]
        threads: Option<usize>,
    },

    /// Count the leaf nodes of the legal move tree.
    Perft {
        #[arg(short, long)]
        depth: u32,

        /// Start position (defaults to the initial setup).
        #[arg(long)]
        fen: Option<String>,
    },
}

fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            difficulty,
            color,
            weights,
            threads,
        } => {
            let level = Difficulty::new(difficulty).map_err(std::io::Error::other)?;
            let mut bot = Bot::new(level).with_weights(load_weights(weights.as_deref())?);
            if let Some(threads) = threads {
                bot = bot.with_threads(threads);
            }
            terminal::run_terminal_game(color.into(), bot)
        }
        Commands::Bots { json } => {
            let roster: Vec<_> = Difficulty::all().map(Difficulty::profile).collect();
            if json {
                let text = serde_json::to_string_pretty(&roster).map_err(std::io::Error::other)?;
                println!("{}", text);
            } else {
                for profile in roster {
                    println!(
                        "{:>2}  {:<18} {}",
                        profile.difficulty.level(),
                        profile.name.bold(),
                        profile.description
                    );
                }
            }
            Ok(())
        }
        Commands::Match {
            white,
            black,
            games,
            seed,
            max_plies,
            weights,
            threads,
        } => {
            let player1 = Difficulty::new(white).map_err(std::io::Error::other)?;
            let player2 = Difficulty::new(black).map_err(std::io::Error::other)?;
            let config = SeriesConfig {
                games,
                base_seed: seed,
                per_game: MatchConfig {
                    max_plies,
                    ..MatchConfig::default()
                },
                weights: load_weights(weights.as_deref())?,
                threads,
            };
            let stats = arena::run_series(player1, player2, &config).map_err(std::io::Error::other)?;
            println!("{}", stats.report());
            Ok(())
        }
        Commands::Perft { depth, fen } => {
            let pos = match fen {
                Some(fen) => Position::from_fen(&fen).map_err(std::io::Error::other)?,
                None => Position::new_game(),
            };
            let started = Instant::now();
            let nodes = perft(&pos, depth);
            let elapsed = started.elapsed();
            println!(
                "perft({}) = {}  [{:.3}s, {:.0} nps]",
                depth,
                nodes,
                elapsed.as_secs_f64(),
                nodes as f64 / elapsed.as_secs_f64().max(1e-9)
            );
            Ok(())
        }
    }
}

/// Reads evaluation weights from a JSON file; missing fields keep their
/// defaults.
fn load_weights(path: Option<&str>) -> std::io::Result<EvalWeights> {
    let Some(path) = path else {
        return Ok(EvalWeights::default());
    };
    let text = fs::read_to_string(Path::new(path))?;
    let weights = serde_json::from_str(&text).map_err(std::io::Error::other)?;
    log::info!("Loaded evaluation weights from {}", path);
    Ok(weights)
}
