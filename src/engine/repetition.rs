//! Coarse, caller-driven repetition check.
//!
//! Every `window` plies the board signature is compared with the one taken a
//! window earlier. A match flags a repeated position. This is a heuristic
//! that ignores side to move, castling rights and en passant; `Game` keeps a
//! proper occurrence count for threefold repetition.

use tracing::info;

use crate::engine::game::Game;

pub const DEFAULT_WINDOW: usize = 4;

#[derive(Clone, Debug)]
pub struct RepetitionTracker {
    window: usize,
    plies: usize,
    previous: Option<String>,
    repeated: bool,
}

impl RepetitionTracker {
    /// A window of zero is treated as one.
    pub fn new(window: usize) -> Self {
        RepetitionTracker {
            window: window.max(1),
            plies: 0,
            previous: None,
            repeated: false,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    /// Count one completed ply of `game`. Returns whether a repetition is
    /// currently flagged.
    pub fn observe(&mut self, game: &Game) -> bool {
        self.plies += 1;
        if self.plies < self.window {
            return self.repeated;
        }
        self.plies = 0;
        self.record(game.board_signature())
    }

    /// Compare a window-boundary signature against the previous one.
    pub fn record(&mut self, signature: String) -> bool {
        self.repeated = self.previous.as_deref() == Some(signature.as_str());
        if self.repeated {
            info!(window = self.window, "board repeated across window");
        } else {
            self.previous = Some(signature);
        }
        self.repeated
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    /// Forget everything, e.g. after an undo or a new game.
    pub fn reset(&mut self) {
        *self = Self::new(self.window);
    }
}

impl Default for RepetitionTracker {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW)
    }
}
