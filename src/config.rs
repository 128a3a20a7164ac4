use crate::engine::clock::{ClockMode, GameClock};
use crate::engine::repetition::{DEFAULT_WINDOW, RepetitionTracker};
use crate::engine::types::Color;

/// Longest accepted clock budget: one day.
pub const MAX_TIMER_MINUTES: u64 = 24 * 60;

/// Game configuration parsed from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Minutes on each player's clock.
    pub timer_minutes: u64,
    pub timer_mode: ClockMode,
    /// Whether the clock is shown and enforced.
    pub show_timer: bool,
    /// Seat the local player on the black side.
    pub play_as_black: bool,
    /// Plies between coarse repetition checks.
    pub repetition_window: usize,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = AppConfig::default();
        AppConfig {
            timer_minutes: lookup("CHESS_TIMER_MINUTES")
                .and_then(|v| v.parse().ok())
                .filter(|m| (1..=MAX_TIMER_MINUTES).contains(m))
                .unwrap_or(defaults.timer_minutes),
            timer_mode: lookup("CHESS_TIMER_MODE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.timer_mode),
            show_timer: lookup("CHESS_SHOW_TIMER")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.show_timer),
            play_as_black: lookup("CHESS_PLAY_AS_BLACK")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(defaults.play_as_black),
            repetition_window: lookup("CHESS_REPETITION_WINDOW")
                .and_then(|v| v.parse().ok())
                .filter(|&w| w > 0)
                .unwrap_or(defaults.repetition_window),
        }
    }

    /// Colour at the bottom of the board.
    pub fn seat(&self) -> Color {
        if self.play_as_black {
            Color::Black
        } else {
            Color::White
        }
    }

    pub fn clock(&self) -> GameClock {
        GameClock::from_minutes(self.timer_minutes, self.timer_mode)
    }

    pub fn repetition_tracker(&self) -> RepetitionTracker {
        RepetitionTracker::new(self.repetition_window)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            timer_minutes: 10,
            timer_mode: ClockMode::Countdown,
            show_timer: true,
            play_as_black: false,
            repetition_window: DEFAULT_WINDOW,
        }
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_config() {
        let config = AppConfig::default();
        assert_eq!(config.timer_minutes, 10);
        assert_eq!(config.timer_mode, ClockMode::Countdown);
        assert!(config.show_timer);
        assert!(!config.play_as_black);
        assert_eq!(config.repetition_window, 4);
        assert_eq!(config.seat(), Color::White);
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(AppConfig::from_lookup(|_| None), AppConfig::default());
    }

    #[test]
    fn overrides_are_read() {
        let config = AppConfig::from_lookup(lookup(&[
            ("CHESS_TIMER_MINUTES", "3"),
            ("CHESS_TIMER_MODE", "stopwatch"),
            ("CHESS_SHOW_TIMER", "off"),
            ("CHESS_PLAY_AS_BLACK", "true"),
            ("CHESS_REPETITION_WINDOW", "6"),
        ]));
        assert_eq!(config.timer_minutes, 3);
        assert_eq!(config.timer_mode, ClockMode::Stopwatch);
        assert!(!config.show_timer);
        assert_eq!(config.seat(), Color::Black);
        assert_eq!(config.repetition_tracker().window(), 6);
        assert_eq!(config.clock().mode(), ClockMode::Stopwatch);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("CHESS_TIMER_MINUTES", "ten"),
            ("CHESS_TIMER_MODE", "sundial"),
            ("CHESS_SHOW_TIMER", "maybe"),
            ("CHESS_REPETITION_WINDOW", "0"),
        ]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn out_of_range_minutes_fall_back() {
        for minutes in [u64::MAX.to_string(), (MAX_TIMER_MINUTES + 1).to_string()] {
            let config = AppConfig::from_lookup(lookup(&[("CHESS_TIMER_MINUTES", minutes.as_str())]));
            assert_eq!(config.timer_minutes, 10);
            assert!(!config.clock().is_time_up(Color::White));
        }
        let max = MAX_TIMER_MINUTES.to_string();
        let config = AppConfig::from_lookup(lookup(&[("CHESS_TIMER_MINUTES", max.as_str())]));
        assert_eq!(config.timer_minutes, MAX_TIMER_MINUTES);
    }
}
