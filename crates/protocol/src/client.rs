//! Console → Server frames

use serde::{Deserialize, Serialize};

/// Frames sent from the console to the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Operator steering text for a running project
    Guidance {
        #[serde(rename = "projectId")]
        project_id: String,
        text: String,
    },
}

impl ClientMessage {
    pub fn guidance(project_id: impl Into<String>, text: impl Into<String>) -> Self {
        ClientMessage::Guidance {
            project_id: project_id.into(),
            text: text.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ClientMessage;

    #[test]
    fn serializes_guidance_with_camel_case_project_id() {
        let msg = ClientMessage::guidance("p1", "go faster");
        let json = serde_json::to_value(&msg).expect("serialize guidance");
        assert_eq!(
            json,
            serde_json::json!({"type": "guidance", "projectId": "p1", "text": "go faster"})
        );
    }

    #[test]
    fn deserializes_guidance_sent_by_other_clients() {
        let json = r#"{"type":"guidance","projectId":"p2","text":"use sqlite"}"#;
        let parsed: ClientMessage = serde_json::from_str(json).expect("parse guidance");
        assert_eq!(parsed, ClientMessage::guidance("p2", "use sqlite"));
    }
}
