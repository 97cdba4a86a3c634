//! Session and state-synchronization core of the Maestro console.
//!
//! One [`session::SessionHandle`] per console: it keeps a WebSocket to the
//! orchestration server alive, folds inbound frames into the agent status
//! board and activity log, carries operator guidance back, and caches the
//! project catalog from the collaborator HTTP API.

pub mod activity;
pub mod api;
pub mod backoff;
pub mod catalog;
pub mod config;
pub mod connection;
pub mod error;
pub mod events;
pub mod guidance;
pub mod poll;
pub mod router;
pub mod session;
pub mod session_command;
pub mod state;
pub mod status_board;

pub use api::ApiClient;
pub use config::SessionConfig;
pub use error::{ApiError, ConnectionError, GuidanceRejection, RunRejection};
pub use events::{ConsoleEvent, Notice, NoticeLevel, View};
pub use session::{SessionExit, SessionHandle, SessionSnapshot};
pub use session_command::SessionCommand;
