//! Per-agent status state machine
//!
//! The board tracks a fixed set of agents declared at construction.
//! Log events for any other agent name are ignored. All transitions are
//! pure and synchronous so they can be tested without a connection.

use maestro_protocol::{LogEvent, StatusKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const IDLE_SUMMARY: &str = "Idle";
const ELLIPSIS: &str = "...";

/// How an agent is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualState {
    Idle,
    Active,
    Waiting,
    Error,
}

impl VisualState {
    /// The transition table: the incoming status alone decides the next state.
    pub fn from_status(status: StatusKind) -> Self {
        match status {
            StatusKind::Error => VisualState::Error,
            StatusKind::Waiting => VisualState::Waiting,
            StatusKind::Complete => VisualState::Idle,
            StatusKind::Active => VisualState::Active,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentStatus {
    pub visual_state: VisualState,
    pub action_summary: String,
}

impl AgentStatus {
    pub fn idle() -> Self {
        Self {
            visual_state: VisualState::Idle,
            action_summary: IDLE_SUMMARY.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSlot {
    pub name: String,
    pub status: AgentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBoard {
    slots: Vec<AgentSlot>,
    summary_budget: usize,
}

impl StatusBoard {
    /// Build a board for `agents`, all idle. Duplicate names collapse.
    pub fn new<I, S>(agents: I, summary_budget: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut slots: Vec<AgentSlot> = Vec::new();
        for name in agents {
            let name = name.into();
            if slots.iter().any(|slot| slot.name == name) {
                continue;
            }
            slots.push(AgentSlot {
                name,
                status: AgentStatus::idle(),
            });
        }
        Self {
            slots,
            summary_budget,
        }
    }

    pub fn slots(&self) -> &[AgentSlot] {
        &self.slots
    }

    pub fn get(&self, agent: &str) -> Option<&AgentStatus> {
        self.slots
            .iter()
            .find(|slot| slot.name == agent)
            .map(|slot| &slot.status)
    }

    pub fn is_known(&self, agent: &str) -> bool {
        self.get(agent).is_some()
    }

    /// Apply a log event. Returns the agent's new status, or `None` when the
    /// agent is not on the board.
    pub fn apply(&mut self, event: &LogEvent) -> Option<&AgentStatus> {
        let budget = self.summary_budget;
        let Some(slot) = self.slots.iter_mut().find(|slot| slot.name == event.agent) else {
            debug!(
                component = "status_board",
                event = "status_board.unknown_agent",
                agent = %event.agent,
                "Dropping event for agent outside the board"
            );
            return None;
        };

        slot.status = AgentStatus {
            visual_state: VisualState::from_status(event.status_kind()),
            action_summary: truncate_summary(&event.text, budget),
        };
        Some(&slot.status)
    }

    /// Force every agent back to idle. Idempotent.
    pub fn reset_all(&mut self) {
        for slot in &mut self.slots {
            slot.status = AgentStatus::idle();
        }
    }

    pub fn all_idle(&self) -> bool {
        self.slots
            .iter()
            .all(|slot| slot.status == AgentStatus::idle())
    }
}

/// Keep the first `budget` characters, marking the cut with an ellipsis.
pub fn truncate_summary(text: &str, budget: usize) -> String {
    if text.chars().count() <= budget {
        return text.to_string();
    }
    let kept: String = text.chars().take(budget).collect();
    format!("{kept}{ELLIPSIS}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> StatusBoard {
        StatusBoard::new(["Orchestrator", "Developer", "Research"], 20)
    }

    fn event(agent: &str, text: &str, status: Option<&str>) -> LogEvent {
        LogEvent::new(agent, text, status)
    }

    #[test]
    fn starts_idle() {
        let board = board();
        assert_eq!(board.slots().len(), 3);
        assert!(board.all_idle());
        assert_eq!(board.get("Developer"), Some(&AgentStatus::idle()));
    }

    #[test]
    fn transition_table_is_exhaustive() {
        let cases = [
            (Some("error"), VisualState::Error),
            (Some("waiting"), VisualState::Waiting),
            (Some("complete"), VisualState::Idle),
            (Some("active"), VisualState::Active),
            (Some("running"), VisualState::Active),
            (Some("done"), VisualState::Active),
            (None, VisualState::Active),
        ];
        for (status, expected) in cases {
            let mut board = board();
            let applied = board
                .apply(&event("Research", "Looking things up", status))
                .cloned()
                .expect("known agent");
            assert_eq!(applied.visual_state, expected, "status {status:?}");
        }
    }

    #[test]
    fn log_event_sets_developer_active() {
        let mut board = board();
        board.apply(&event("Developer", "Writing main.py", Some("active")));
        assert_eq!(
            board.get("Developer"),
            Some(&AgentStatus {
                visual_state: VisualState::Active,
                action_summary: "Writing main.py".into(),
            })
        );
    }

    #[test]
    fn long_summaries_are_truncated_with_ellipsis() {
        let mut board = board();
        let status = board
            .apply(&event(
                "Developer",
                "Executing Task 3/7: implement the parser",
                None,
            ))
            .cloned()
            .expect("known agent");
        assert_eq!(status.action_summary, "Executing Task 3/7: ...");
        assert_eq!(truncate_summary("exactly twenty chars", 20), "exactly twenty chars");
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        assert_eq!(truncate_summary("ééééé", 3), "ééé...");
        assert_eq!(truncate_summary("ééé", 3), "ééé");
    }

    #[test]
    fn unknown_agents_change_nothing() {
        let mut board = board();
        board.apply(&event("Developer", "Writing main.py", None));
        let before = board.clone();

        assert!(board.apply(&event("System", "Error: boom", Some("error"))).is_none());
        assert!(board.apply(&event("Worker", "Task 1", None)).is_none());

        assert_eq!(board, before);
        assert!(!board.is_known("System"));
    }

    #[test]
    fn reset_all_is_idempotent() {
        let mut board = board();
        board.apply(&event("Developer", "Writing main.py", None));
        board.apply(&event("Research", "Stuck", Some("error")));

        board.reset_all();
        let once = board.clone();
        board.reset_all();

        assert_eq!(board, once);
        assert!(board.all_idle());
    }

    #[test]
    fn duplicate_agent_names_collapse() {
        let board = StatusBoard::new(["Developer", "Developer"], 20);
        assert_eq!(board.slots().len(), 1);
    }
}
