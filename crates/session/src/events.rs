//! Observable changes published by a session to its renderer.

use maestro_protocol::FinalOutput;

use crate::activity::ActivityEntry;
use crate::catalog::CatalogSnapshot;
use crate::status_board::AgentStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warn,
    Error,
}

/// System-level message for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn warn(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warn,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Which primary view the console shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    Console,
    Projects,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleEvent {
    Connection {
        open: bool,
    },
    Notice(Notice),
    AgentUpdated {
        agent: String,
        status: AgentStatus,
    },
    BoardReset,
    Activity(ActivityEntry),
    FinalOutput(FinalOutput),
    RunControl {
        start_enabled: bool,
    },
    ProjectBound {
        project_id: String,
    },
    GuidanceSent {
        project_id: String,
        text: String,
    },
    Catalog(CatalogSnapshot),
    ViewChanged(View),
    ConfirmDelete {
        id: String,
        name: Option<String>,
    },
}
