//! Operator steering messages
//!
//! Guidance is fire-and-forget: once a frame is handed to an open
//! connection nothing tracks its delivery.

use maestro_protocol::ClientMessage;
use tracing::{debug, warn};

use crate::error::GuidanceRejection;

/// Something that can carry outbound frames
pub trait FrameSink {
    fn is_open(&self) -> bool;

    /// Queue a frame. Dropped silently when not open.
    fn send_frame(&mut self, frame: &ClientMessage);
}

#[derive(Debug, Default, Clone)]
pub struct GuidanceChannel {
    draft: String,
    bound_project: Option<String>,
}

impl GuidanceChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, project_id: impl Into<String>) {
        self.bound_project = Some(project_id.into());
    }

    pub fn unbind(&mut self) {
        self.bound_project = None;
    }

    pub fn bound_project(&self) -> Option<&str> {
        self.bound_project.as_deref()
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Send the current draft. On success the draft is cleared and the sent
    /// frame is returned; on rejection the draft is kept and nothing is sent.
    pub fn submit(&mut self, sink: &mut impl FrameSink) -> Result<ClientMessage, GuidanceRejection> {
        let text = self.draft.trim();
        if text.is_empty() {
            return Err(GuidanceRejection::Empty);
        }
        if !sink.is_open() {
            warn!(
                component = "guidance",
                event = "guidance.rejected",
                reason = "not_connected",
                "Guidance not sent"
            );
            return Err(GuidanceRejection::NotConnected);
        }
        let Some(project_id) = self.bound_project.as_deref() else {
            warn!(
                component = "guidance",
                event = "guidance.rejected",
                reason = "no_project",
                "Guidance not sent"
            );
            return Err(GuidanceRejection::NoProject);
        };

        let frame = ClientMessage::guidance(project_id, text);
        sink.send_frame(&frame);
        self.draft.clear();
        debug!(
            component = "guidance",
            event = "guidance.sent",
            project_id = %project_id,
            "Guidance sent"
        );
        Ok(frame)
    }
}
