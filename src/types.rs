use crate::codec::{encode_move, Frame};
use crate::constants::DEFAULT_DURATION_MS;
use strum_macros::{Display, EnumIter, EnumString};

/// Keywords that end an interactive session, matched case-insensitively.
#[derive(Debug, EnumIter, EnumString, Display, Clone, Copy, Eq, PartialEq)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExitKeyword {
    Quit,
    Exit,
    Q,
}

impl ExitKeyword {
    pub fn matches(line: &str) -> bool {
        line.trim().parse::<ExitKeyword>().is_ok()
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct MoveCommand {
    pub id: u16,
    pub pulse: u32,
    pub duration: u32,
}

impl MoveCommand {
    pub fn frame(&self) -> Frame {
        encode_move(self.id as u32, self.pulse, self.duration)
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct SetDefaultCommand {
    pub value: u32,
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PassthroughCommand {
    /// Wire payload, `#...!`.
    pub payload: String,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("default duration must be positive, got {0}")]
pub struct InvalidDefault(pub i64);

#[derive(Debug, Clone)]
pub struct SessionState {
    default_duration: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        SessionState {
            default_duration: DEFAULT_DURATION_MS,
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a custom default; a zero value falls back to the built-in one.
    pub fn with_default(default_duration: u32) -> Self {
        if default_duration == 0 {
            return Self::default();
        }
        SessionState { default_duration }
    }

    pub fn default_duration(&self) -> u32 {
        self.default_duration
    }

    pub fn set_default(&mut self, value: i64) -> Result<u32, InvalidDefault> {
        if value <= 0 {
            return Err(InvalidDefault(value));
        }
        self.default_duration = u32::try_from(value).unwrap_or(u32::MAX);
        Ok(self.default_duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn session_starts_at_one_second() {
        assert_eq!(SessionState::new().default_duration(), 1000);
        assert_eq!(SessionState::with_default(0).default_duration(), 1000);
        assert_eq!(SessionState::with_default(250).default_duration(), 250);
    }

    #[test]
    fn set_default_accepts_positive_only() {
        let mut state = SessionState::new();
        assert_eq!(state.set_default(500), Ok(500));
        assert_eq!(state.default_duration(), 500);

        assert_eq!(state.set_default(0), Err(InvalidDefault(0)));
        assert_eq!(state.set_default(-5), Err(InvalidDefault(-5)));
        assert_eq!(state.default_duration(), 500);
    }

    #[test]
    fn set_default_saturates_large_values() {
        let mut state = SessionState::new();
        assert_eq!(state.set_default(i64::MAX), Ok(u32::MAX));
    }

    #[test]
    fn exit_keywords_ignore_case() {
        for line in ["q", "Q", "exit", "Exit", "QUIT", "  quit  "] {
            assert!(ExitKeyword::matches(line), "{line} should exit");
        }
        for line in ["", "quitting", "0,1500", "e"] {
            assert!(!ExitKeyword::matches(line), "{line} should not exit");
        }
        let names: Vec<String> = ExitKeyword::iter().map(|k| k.to_string()).collect();
        assert_eq!(names, ["quit", "exit", "q"]);
    }

    #[test]
    fn move_command_renders_frame() {
        let cmd = MoveCommand { id: 2, pulse: 1800, duration: 500 };
        assert_eq!(cmd.frame().as_str(), "#002P1800T0500!");
    }
}
