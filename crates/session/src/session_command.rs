//! Commands sent to a session actor from the console frontend.

/// A command that can be sent to a session actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Steer the bound project
    Guidance { text: String },

    /// `POST /start` and bind the returned project
    StartRun {
        objective: String,
        project_name: Option<String>,
    },

    /// Switch to the catalog view and refresh it
    ShowProjects,
    ShowConsole,

    OpenProject { id: String },

    /// First half of a delete; the frontend answers with `ConfirmDelete`
    RequestDelete { id: String },
    ConfirmDelete { confirmed: bool },

    /// Start a model download and poll until it is listed
    PullModel { model: String },

    /// Reset every agent to idle
    ClearBoard,

    /// Cancel timers and polls, close the stream, stop the actor
    Teardown,
}
