use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecoveryState {
    #[default]
    Idle,
    Running,
    Failed,
    Done,
}

impl RecoveryState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecoveryState::Idle => "idle",
            RecoveryState::Running => "running",
            RecoveryState::Failed => "failed",
            RecoveryState::Done => "done",
        }
    }
}

impl fmt::Display for RecoveryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_strings() {
        assert_eq!(RecoveryState::Idle.to_string(), "idle");
        assert_eq!(RecoveryState::Running.to_string(), "running");
        assert_eq!(RecoveryState::Failed.to_string(), "failed");
        assert_eq!(RecoveryState::Done.to_string(), "done");
    }
}
