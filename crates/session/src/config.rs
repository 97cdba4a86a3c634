//! Session tuning knobs.
//!
//! Every field has a default so a partial `console.toml` deserializes cleanly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backoff::Backoff;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_SUMMARY_BUDGET: usize = 20;
pub const DEFAULT_ACTIVITY_CAPACITY: usize = 500;

/// Agent roles declared by the orchestration server.
pub const DEFAULT_AGENTS: &[&str] = &[
    "Orchestrator",
    "Research",
    "Developer",
    "UI/UX Designer",
    "QA Tester",
    "Security",
    "Documentation",
    "Refiner",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Base URL of the collaborator HTTP API
    pub server_url: String,
    /// Event stream URL; derived from `server_url` when unset
    pub stream_url: Option<String>,
    /// Known agent names, in display order
    pub agents: Vec<String>,
    pub reconnect_base_ms: u64,
    pub reconnect_max_ms: u64,
    pub connect_timeout_secs: u64,
    /// Maximum characters of an agent's action summary
    pub summary_budget: usize,
    /// Activity entries kept before the oldest are evicted
    pub activity_capacity: usize,
    pub pull_poll_interval_secs: u64,
    pub pull_poll_ceiling_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            stream_url: None,
            agents: DEFAULT_AGENTS.iter().map(|a| a.to_string()).collect(),
            reconnect_base_ms: 3_000,
            reconnect_max_ms: 30_000,
            connect_timeout_secs: 10,
            summary_budget: DEFAULT_SUMMARY_BUDGET,
            activity_capacity: DEFAULT_ACTIVITY_CAPACITY,
            pull_poll_interval_secs: 5,
            pull_poll_ceiling_secs: 300,
        }
    }
}

impl SessionConfig {
    pub fn backoff(&self) -> Backoff {
        Backoff::new(
            Duration::from_millis(self.reconnect_base_ms),
            Duration::from_millis(self.reconnect_max_ms),
        )
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn pull_poll_interval(&self) -> Duration {
        Duration::from_secs(self.pull_poll_interval_secs)
    }

    pub fn pull_poll_ceiling(&self) -> Duration {
        Duration::from_secs(self.pull_poll_ceiling_secs)
    }

    /// Stream URL: the explicit setting, or the server URL with a `ws`
    /// scheme and the `/ws` path.
    pub fn resolved_stream_url(&self) -> String {
        if let Some(url) = self
            .stream_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
        {
            return url.to_string();
        }

        let base = self.server_url.trim().trim_end_matches('/');
        let swapped = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            format!("ws://{base}")
        };
        format!("{swapped}/ws")
    }
}
