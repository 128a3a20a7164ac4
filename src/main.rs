use std::io::{self, BufRead, Write};
use std::time::Duration;

use chess_rules::config::AppConfig;
use chess_rules::engine::{
    ChessError, Color, Game, GameClock, GameStatus, PieceType, RepetitionTracker, Square,
};

/// One line of user input.
enum Command {
    Move {
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    },
    Promote(PieceType),
    Undo,
    Moves,
    Board,
    New,
    Quit,
    Help,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim().to_ascii_lowercase();
    match line.as_str() {
        "undo" | "z" => return Ok(Command::Undo),
        "moves" => return Ok(Command::Moves),
        "board" => return Ok(Command::Board),
        "new" => return Ok(Command::New),
        "quit" | "exit" => return Ok(Command::Quit),
        "help" | "?" => return Ok(Command::Help),
        _ => {}
    }

    let mut chars = line.chars();
    if line.len() == 1
        && let Some((_, kind)) = chars.next().and_then(PieceType::from_char)
    {
        return Ok(Command::Promote(kind));
    }

    if !line.is_ascii() || !(4..=5).contains(&line.len()) {
        return Err(format!("unrecognised command '{line}' (try 'help')"));
    }
    let square = |s: &str| {
        Square::from_algebraic(s).ok_or_else(|| format!("'{s}' is not a square"))
    };
    let from = square(&line[0..2])?;
    let to = square(&line[2..4])?;
    let promotion = match line[4..].chars().next() {
        Some(c) => Some(
            PieceType::from_char(c)
                .map(|(_, kind)| kind)
                .ok_or_else(|| format!("'{c}' is not a piece"))?,
        ),
        None => None,
    };
    Ok(Command::Move {
        from,
        to,
        promotion,
    })
}

struct Session {
    config: AppConfig,
    game: Game,
    repetition: RepetitionTracker,
    clock: GameClock,
}

impl Session {
    fn new(config: AppConfig) -> Self {
        let mut clock = config.clock();
        clock.start_turn(Color::White);
        Session {
            game: Game::with_seat(config.seat()),
            repetition: config.repetition_tracker(),
            clock,
            config,
        }
    }

    fn play(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceType>,
    ) -> Result<(), ChessError> {
        let mv = self.game.try_move(from, to)?;
        // The game rejects a piece suffix on a move that does not promote.
        let mv = match promotion {
            Some(kind) => mv.promoting_to(kind),
            None => mv,
        };
        self.game.apply_move(mv)?;
        if self.game.pending_promotion().is_none() {
            self.ply_done();
        }
        Ok(())
    }

    fn promote(&mut self, kind: PieceType) -> Result<(), ChessError> {
        let square = self
            .game
            .pending_promotion()
            .ok_or(ChessError::NoPendingPromotion)?;
        self.game.resolve_promotion(square, kind)?;
        self.ply_done();
        Ok(())
    }

    fn ply_done(&mut self) {
        self.repetition.observe(&self.game);
        self.clock.start_turn(self.game.side_to_move());
    }

    fn undo(&mut self) -> bool {
        let undone = self.game.undo_last_move().is_some();
        if undone {
            self.repetition.reset();
        }
        undone
    }

    fn restart(&mut self) {
        *self = Session::new(self.config.clone());
    }

    fn time_up(&self) -> bool {
        self.config.show_timer && self.clock.is_time_up(self.game.side_to_move())
    }

    /// Flag fall or a repeated board ends play; undo and new still work.
    fn is_over(&self) -> bool {
        self.time_up() || self.repetition.is_repeated()
    }

    fn render(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out, "{}", self.game.board_string())?;
        if self.config.show_timer {
            let [white, black] = self.clock.times(self.game.side_to_move());
            writeln!(out, "white {}  black {}", format_clock(white), format_clock(black))?;
        }
        for color in [Color::White, Color::Black] {
            let taken: String = self
                .game
                .captured(color)
                .iter()
                .map(|p| p.to_char())
                .collect();
            if !taken.is_empty() {
                writeln!(out, "{color} lost: {taken}")?;
            }
        }
        writeln!(out, "{}", self.outcome())
    }

    fn outcome(&self) -> String {
        if self.time_up() {
            return format!("{} wins on time", !self.game.side_to_move());
        }
        match self.game.status() {
            GameStatus::Checkmate => format!("checkmate, {} wins", !self.game.side_to_move()),
            GameStatus::Stalemate => "stalemate".to_string(),
            GameStatus::AwaitingPromotion => "choose a promotion piece: q, r, b or n".to_string(),
            _ if self.repetition.is_repeated() => "draw by repetition".to_string(),
            GameStatus::Draw(reason) => format!("draw available: {}", reason.as_str()),
            GameStatus::Check => format!("{} to move, in check", self.game.side_to_move()),
            GameStatus::Active => format!("{} to move", self.game.side_to_move()),
        }
    }
}

fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

const HELP: &str = "commands: e2e4 | e7e8q | q/r/b/n (finish a promotion) | undo | moves | board | new | quit";

fn main() -> io::Result<()> {
    // Initialize tracing (structured logging).
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chess_rules=info".into()),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!(
        "chess-rules v{} starting ({} min, {})",
        env!("CARGO_PKG_VERSION"),
        config.timer_minutes,
        config.timer_mode
    );

    let mut session = Session::new(config);
    let stdin = io::stdin();
    let mut out = io::stdout().lock();
    session.render(&mut out)?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(msg) => {
                writeln!(out, "{msg}")?;
                continue;
            }
        };

        let result = match command {
            Command::Quit => break,
            Command::Help => {
                writeln!(out, "{HELP}")?;
                continue;
            }
            Command::Board => Ok(()),
            Command::New => {
                session.restart();
                Ok(())
            }
            Command::Undo => {
                if !session.undo() {
                    writeln!(out, "nothing to undo")?;
                }
                Ok(())
            }
            Command::Moves => {
                match session.game.legal_moves() {
                    Ok(moves) => {
                        let list: Vec<String> = moves.iter().map(|m| m.to_string()).collect();
                        writeln!(out, "{} legal: {}", list.len(), list.join(" "))?;
                    }
                    Err(e) => writeln!(out, "{e}")?,
                }
                continue;
            }
            Command::Move { .. } | Command::Promote(_) if session.is_over() => {
                writeln!(out, "{}", session.outcome())?;
                continue;
            }
            Command::Move {
                from,
                to,
                promotion,
            } => session.play(from, to, promotion),
            Command::Promote(kind) => session.promote(kind),
        };

        match result {
            Ok(()) => session.render(&mut out)?,
            Err(e) => writeln!(out, "{e}")?,
        }
    }
    Ok(())
}
