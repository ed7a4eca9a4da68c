//! Terminal interface: play against one of the ladder bots.
//!
//! - Colored board display, flipped when the human plays Black
//! - Coordinate move input (`e2e4`, `e7e8q`)
//! - Status line with check, castling rights and clocks

use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};

use crate::bot::Bot;
use crate::game::{apply_move, classify};
use crate::movegen;
use crate::position::Position;
use crate::types::*;

/// Renders the board with colors and piece letters.
///
/// With `flipped` the board is shown from Black's side (rank 1 at top).
pub fn print_board(pos: &Position, flipped: bool) {
    let ranks: Vec<u8> = if flipped { (0..8).collect() } else { (0..8).rev().collect() };
    let files: Vec<u8> = if flipped { (0..8).rev().collect() } else { (0..8).collect() };

    println!();
    println!("  +---+---+---+---+---+---+---+---+");
    for &rank in &ranks {
        print!("{} ", rank + 1);
        for &file in &files {
            let sq = Square::new(file, rank);
            let piece_str = match pos.piece_at(sq) {
                Some(piece) => {
                    let symbol = piece.to_fen_char().to_string();
                    if piece.color == Color::White {
                        symbol.white().bold().to_string()
                    } else {
                        symbol.blue().bold().to_string()
                    }
                }
                None if sq.is_dark() => "·".dimmed().to_string(),
                None => " ".to_string(),
            };
            print!("| {} ", piece_str);
        }
        println!("|");
        println!("  +---+---+---+---+---+---+---+---+");
    }
    let labels: Vec<String> = files
        .iter()
        .map(|f| ((b'a' + f) as char).to_string())
        .collect();
    println!("    {}", labels.join("   "));
    println!();
}

/// One-line summary of whose move it is and what state the game is in.
pub fn status_line(pos: &Position) -> String {
    let status = classify(pos);
    let mut line = format!("Move {}, {} to play", pos.fullmove_number, pos.turn);
    if status != GameStatus::Ongoing {
        line.push_str(&format!(" ({})", status));
    }
    line.push_str(&format!(
        "  castling {}  halfmove clock {}",
        pos.castling.to_fen(),
        pos.halfmove_clock
    ));
    if let Some(ep) = pos.en_passant {
        line.push_str(&format!("  en passant {}", ep));
    }
    line
}

fn print_status(pos: &Position) {
    let line = status_line(pos);
    if movegen::is_in_check(&pos.board, pos.turn) {
        println!("{}", line.red().bold());
    } else {
        println!("{}", line);
    }
    println!();
}

fn print_help() {
    println!("{}", "Commands:".yellow().bold());
    println!("  {}      - make a move (e7e8q promotes)", "e2e4".green());
    println!("  {}     - list legal moves", "moves".green());
    println!("  {}     - show the board", "board".green());
    println!("  {}   - list the moves played", "history".green());
    println!("  {}       - print the position as FEN", "fen".green());
    println!("  {}      - print the position as JSON", "json".green());
    println!("  {}    - give up the game", "resign".green());
    println!("  {}      - show this help", "help".green());
    println!("  {}      - leave", "quit".green());
    println!();
}

fn print_history(history: &[Move]) {
    if history.is_empty() {
        println!("No moves yet.");
        return;
    }
    println!("{}", "Moves:".yellow().bold());
    for (i, pair) in history.chunks(2).enumerate() {
        let black = pair.get(1).map(|m| m.to_string()).unwrap_or_default();
        println!("  {}. {} {}", i + 1, pair[0], black);
    }
    println!();
}

/// PGN-style result tag; `*` while the game is still open.
fn result_text(status: GameStatus, side_to_move: Color) -> &'static str {
    if status.is_draw() {
        return "1/2-1/2";
    }
    match status.winner(side_to_move) {
        Some(Color::White) => "1-0",
        Some(Color::Black) => "0-1",
        None => "*",
    }
}

fn print_result(pos: &Position) {
    let status = classify(pos);
    let result = result_text(status, pos.turn);
    println!();
    println!("{}", "═══════════════════════════════════".yellow());
    println!("  {} {}", "Game over:".yellow().bold(), status);
    println!("  Result: {}", result.green().bold());
    println!("{}", "═══════════════════════════════════".yellow());
    println!();
}

/// JSON snapshot printed by the `json` command.
#[derive(Debug, Serialize)]
struct PositionSnapshot {
    fen: String,
    turn: Color,
    status: GameStatus,
    legal_moves: Vec<MoveJson>,
}

impl PositionSnapshot {
    fn of(pos: &Position) -> Self {
        Self {
            fen: pos.to_fen(),
            turn: pos.turn,
            status: classify(pos),
            legal_moves: movegen::legal_moves(pos).iter().map(Move::to_json).collect(),
        }
    }
}

/// Runs an interactive game between the user (playing `human`) and `bot`.
pub fn run_terminal_game(human: Color, mut bot: Bot) -> io::Result<()> {
    let profile = bot.profile();
    println!();
    println!("{}", "╔═══════════════════════════════════════╗".cyan());
    println!("{}", "║            chessladder                ║".cyan());
    println!("{}", "╚═══════════════════════════════════════╝".cyan());
    println!(
        "You play {} against {} (level {}): {}",
        human,
        profile.name.bold(),
        profile.difficulty,
        profile.description
    );
    println!();

    let flipped = human == Color::Black;
    let mut pos = Position::new_game();
    let mut history: Vec<Move> = Vec::new();

    print_help();
    print_board(&pos, flipped);
    print_status(&pos);

    loop {
        if classify(&pos).is_terminal() {
            print_result(&pos);
            return Ok(());
        }

        if pos.turn != human {
            let mv = bot.choose_move(&pos).map_err(io::Error::other)?;
            pos = apply_move(&pos, mv).map_err(io::Error::other)?;
            history.push(mv);
            println!("{} plays {}", profile.name.blue().bold(), mv.to_string().green());
            print_board(&pos, flipped);
            print_status(&pos);
            continue;
        }

        print!("{} > ", human.to_string().bold());
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            return Ok(());
        }
        let input = input.trim().to_lowercase();
        if input.is_empty() {
            continue;
        }

        match input.as_str() {
            "quit" | "exit" | "q" => {
                println!("Goodbye.");
                return Ok(());
            }
            "help" | "h" | "?" => print_help(),
            "board" | "b" => {
                print_board(&pos, flipped);
                print_status(&pos);
            }
            "moves" | "m" => {
                let moves = movegen::legal_moves(&pos);
                println!("{} ({})", "Legal moves".yellow().bold(), moves.len());
                for (i, mv) in moves.iter().enumerate() {
                    if i > 0 && i % 8 == 0 {
                        println!();
                    }
                    print!("  {}", mv.to_string().green());
                }
                println!();
                println!();
            }
            "history" => print_history(&history),
            "fen" => println!("{}", pos.to_fen()),
            "json" | "j" => {
                let snapshot = serde_json::to_string_pretty(&PositionSnapshot::of(&pos))
                    .map_err(io::Error::other)?;
                println!("{}", snapshot);
                println!();
            }
            "resign" | "r" => {
                println!("{} resigns. {} wins.", human, human.opponent());
                return Ok(());
            }
            _ => match parse_move_input(&input) {
                Some(mv) => match apply_move(&pos, mv) {
                    Ok(next) => {
                        history.push(mv);
                        pos = next;
                        print_board(&pos, flipped);
                        print_status(&pos);
                    }
                    Err(e) => println!("{}: {}", "Illegal move".red().bold(), e),
                },
                None => println!(
                    "Unknown command '{}'. Type {} for a list of commands.",
                    input,
                    "help".green()
                ),
            },
        }
    }
}

/// Parses a move typed by the user.
///
/// Accepts `e2e4`, `e7e8q` (promotion letter in either case) and `e2 e4`.
fn parse_move_input(input: &str) -> Option<Move> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    Move::from_coordinates(&compact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_move_normal() {
        let m = parse_move_input("e2e4").unwrap();
        assert_eq!(m.from.to_algebraic(), "e2");
        assert_eq!(m.to.to_algebraic(), "e4");
        assert_eq!(m.promotion, None);
    }

    #[test]
    fn test_parse_move_promotion() {
        let m = parse_move_input("e7e8Q").unwrap();
        assert_eq!(m.to.to_algebraic(), "e8");
        assert_eq!(m.promotion, Some(PieceKind::Queen));
    }

    #[test]
    fn test_parse_move_with_space() {
        let m = parse_move_input("e2 e4").unwrap();
        assert_eq!(m.from.to_algebraic(), "e2");
        assert_eq!(m.to.to_algebraic(), "e4");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(parse_move_input("abc").is_none());
        assert!(parse_move_input("z9z9").is_none());
        assert!(parse_move_input("e2e4x").is_none());
        assert!(parse_move_input("e7e8k").is_none());
    }

    #[test]
    fn test_status_line() {
        let start = Position::new_game();
        let line = status_line(&start);
        assert!(line.starts_with("Move 1, white to play"));
        assert!(line.contains("castling KQkq"));

        let mated =
            Position::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        assert!(status_line(&mated).contains("(Checkmate)"));
    }

    #[test]
    fn test_result_text() {
        assert_eq!(result_text(GameStatus::Checkmate, Color::White), "0-1");
        assert_eq!(result_text(GameStatus::Checkmate, Color::Black), "1-0");
        assert_eq!(result_text(GameStatus::DrawByFiftyMove, Color::White), "1/2-1/2");
        assert_eq!(result_text(GameStatus::Stalemate, Color::Black), "1/2-1/2");
        assert_eq!(result_text(GameStatus::Check, Color::White), "*");
    }

    #[test]
    fn test_snapshot_lists_legal_moves() {
        let snapshot = PositionSnapshot::of(&Position::new_game());
        assert_eq!(snapshot.legal_moves.len(), 20);
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains("\"status\":\"ongoing\""));
        assert!(json.contains("\"turn\":\"white\""));
    }
}
