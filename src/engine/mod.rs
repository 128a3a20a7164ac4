pub mod attacks;
pub mod board;
pub mod builder;
pub mod clock;
pub mod game;
pub mod movegen;
pub mod repetition;
pub mod types;
pub mod zobrist;

pub use board::{Board, Position, UndoInfo};
pub use builder::PositionBuilder;
pub use clock::{ClockMode, GameClock};
pub use game::{Game, MoveRecord};
pub use movegen::{legal_moves, legal_moves_from, perft};
pub use repetition::RepetitionTracker;
pub use types::*;
