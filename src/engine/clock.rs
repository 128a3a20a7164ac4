//! Per-player chess clock.
//!
//! The clock does not watch the board. The caller starts each turn, and the
//! time since the previous start is charged to the side that just moved.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::engine::types::Color;

/// Whether the clock counts each side's budget down or its usage up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClockMode {
    #[default]
    Countdown,
    Stopwatch,
}

impl ClockMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ClockMode::Countdown => "countdown",
            ClockMode::Stopwatch => "stopwatch",
        }
    }
}

impl fmt::Display for ClockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClockMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "countdown" => Ok(ClockMode::Countdown),
            "stopwatch" => Ok(ClockMode::Stopwatch),
            other => Err(format!("unknown clock mode '{other}'")),
        }
    }
}

#[derive(Clone, Debug)]
pub struct GameClock {
    mode: ClockMode,
    /// Banked time per colour, indexed by `Color::index`.
    banked: [Duration; 2],
    turn_started: Option<Instant>,
}

impl GameClock {
    /// A clock with `per_player` on each side in countdown mode, or zero
    /// usage in stopwatch mode.
    pub fn new(per_player: Duration, mode: ClockMode) -> Self {
        let initial = match mode {
            ClockMode::Countdown => per_player,
            ClockMode::Stopwatch => Duration::ZERO,
        };
        GameClock {
            mode,
            banked: [initial; 2],
            turn_started: None,
        }
    }

    pub fn from_minutes(minutes: u64, mode: ClockMode) -> Self {
        Self::new(Duration::from_secs(minutes.saturating_mul(60)), mode)
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    /// Has any turn been started yet?
    pub fn is_running(&self) -> bool {
        self.turn_started.is_some()
    }

    /// Begin `side_to_move`'s turn at `now`, charging the elapsed time to the
    /// opponent who just finished moving.
    pub fn start_turn_at(&mut self, side_to_move: Color, now: Instant) {
        if let Some(started) = self.turn_started {
            let elapsed = now.saturating_duration_since(started);
            let mover = (!side_to_move).index();
            self.banked[mover] = self.charge(self.banked[mover], elapsed);
        }
        self.turn_started = Some(now);
    }

    pub fn start_turn(&mut self, side_to_move: Color) {
        self.start_turn_at(side_to_move, Instant::now());
    }

    /// `[white, black]` times at `now`, counting the running turn against
    /// `side_to_move`.
    pub fn times_at(&self, side_to_move: Color, now: Instant) -> [Duration; 2] {
        let mut times = self.banked;
        if let Some(started) = self.turn_started {
            let elapsed = now.saturating_duration_since(started);
            let i = side_to_move.index();
            times[i] = self.charge(times[i], elapsed);
        }
        times
    }

    pub fn times(&self, side_to_move: Color) -> [Duration; 2] {
        self.times_at(side_to_move, Instant::now())
    }

    /// Time shown for `color` at `now`.
    pub fn remaining_at(&self, color: Color, side_to_move: Color, now: Instant) -> Duration {
        self.times_at(side_to_move, now)[color.index()]
    }

    /// A flag has fallen. Never true for a stopwatch.
    pub fn is_time_up_at(&self, side_to_move: Color, now: Instant) -> bool {
        match self.mode {
            ClockMode::Stopwatch => false,
            ClockMode::Countdown => self
                .times_at(side_to_move, now)
                .iter()
                .any(|t| t.is_zero()),
        }
    }

    pub fn is_time_up(&self, side_to_move: Color) -> bool {
        self.is_time_up_at(side_to_move, Instant::now())
    }

    fn charge(&self, banked: Duration, elapsed: Duration) -> Duration {
        match self.mode {
            ClockMode::Countdown => banked.saturating_sub(elapsed),
            ClockMode::Stopwatch => banked + elapsed,
        }
    }
}
