//! Observable console state owned by one session

use crate::activity::ActivityLog;
use crate::config::SessionConfig;
use crate::status_board::StatusBoard;

/// Everything the message router is allowed to mutate
#[derive(Debug, Clone)]
pub struct ConsoleState {
    pub board: StatusBoard,
    pub activity: ActivityLog,
    /// A run was started and its final output has not arrived yet
    pub run_active: bool,
}

impl ConsoleState {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            board: StatusBoard::new(config.agents.iter().cloned(), config.summary_budget),
            activity: ActivityLog::new(config.activity_capacity),
            run_active: false,
        }
    }

    pub fn start_enabled(&self) -> bool {
        !self.run_active
    }
}
