//! Server → Console frames

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::StatusKind;

/// Messages broadcast by the server over the event stream.
///
/// Frames with a `type` this console does not know decode to `Unknown`
/// so newer servers never break older consoles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Log(LogEvent),
    FinalOutput(FinalOutput),
    #[serde(other)]
    Unknown,
}

/// One line of agent activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub agent: String,
    pub text: String,
    /// Raw status word; see [`LogEvent::status_kind`]. Non-string values
    /// are kept as their JSON text rather than failing the frame.
    #[serde(
        default,
        deserialize_with = "lenient_status",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<String>,
}

fn lenient_status<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(word)) => Some(word),
        Some(other) => Some(other.to_string()),
    })
}

impl LogEvent {
    pub fn new(agent: impl Into<String>, text: impl Into<String>, status: Option<&str>) -> Self {
        Self {
            agent: agent.into(),
            text: text.into(),
            status: status.map(str::to_string),
        }
    }

    pub fn status_kind(&self) -> StatusKind {
        StatusKind::from_wire(self.status.as_deref())
    }
}

/// Terminal artifact of one orchestration run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalOutput {
    pub text: String,
    #[serde(
        rename = "outputPath",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub output_path: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_log_with_status() {
        let json = r#"{"type":"log","agent":"Developer","text":"Writing main.py","status":"active"}"#;
        let parsed: ServerMessage = serde_json::from_str(json).expect("parse log");
        match parsed {
            ServerMessage::Log(event) => {
                assert_eq!(event.agent, "Developer");
                assert_eq!(event.text, "Writing main.py");
                assert_eq!(event.status_kind(), StatusKind::Active);
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn log_ignores_extra_server_fields() {
        let json = r#"{"type":"log","projectId":"p1","agent":"System","text":"Error: boom","status":"error"}"#;
        let parsed: ServerMessage = serde_json::from_str(json).expect("parse log");
        match parsed {
            ServerMessage::Log(event) => assert_eq!(event.status_kind(), StatusKind::Error),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn non_string_status_still_decodes_as_active() {
        for json in [
            r#"{"type":"log","agent":"Tester","text":"step","status":1}"#,
            r#"{"type":"log","agent":"Tester","text":"step","status":{"code":"error"}}"#,
            r#"{"type":"log","agent":"Tester","text":"step","status":null}"#,
        ] {
            let parsed: ServerMessage = serde_json::from_str(json).expect("parse log");
            match parsed {
                ServerMessage::Log(event) => {
                    assert_eq!(event.text, "step");
                    assert_eq!(event.status_kind(), StatusKind::Active);
                }
                other => panic!("unexpected variant: {:?}", other),
            }
        }
    }

    #[test]
    fn deserializes_final_output_with_and_without_path() {
        let with_path = r#"{"type":"final_output","text":"Done","outputPath":"/out"}"#;
        let parsed: ServerMessage = serde_json::from_str(with_path).expect("parse final output");
        assert_eq!(
            parsed,
            ServerMessage::FinalOutput(FinalOutput {
                text: "Done".into(),
                output_path: Some("/out".into()),
            })
        );

        let without_path = r#"{"type":"final_output","projectId":"p1","text":"Done"}"#;
        let parsed: ServerMessage =
            serde_json::from_str(without_path).expect("parse final output without path");
        match parsed {
            ServerMessage::FinalOutput(output) => assert!(output.output_path.is_none()),
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn unknown_type_decodes_to_unknown() {
        let json = r#"{"type":"heartbeat","seq":4}"#;
        let parsed: ServerMessage = serde_json::from_str(json).expect("parse unknown");
        assert_eq!(parsed, ServerMessage::Unknown);
    }

    #[test]
    fn missing_type_is_a_decode_error() {
        let json = r#"{"agent":"Developer","text":"hi"}"#;
        assert!(serde_json::from_str::<ServerMessage>(json).is_err());
    }
}
