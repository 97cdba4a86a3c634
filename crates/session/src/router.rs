//! Inbound frame dispatch
//!
//! `dispatch` is a pure function of (state, frame): it mutates the console
//! state and describes what changed as `ConsoleEvent`s for the caller to
//! publish. No IO happens here.

use maestro_protocol::{FinalOutput, LogEvent, ServerMessage};
use tracing::debug;

use crate::events::ConsoleEvent;
use crate::state::ConsoleState;

pub fn dispatch(state: &mut ConsoleState, message: ServerMessage) -> Vec<ConsoleEvent> {
    match message {
        ServerMessage::Log(event) => apply_log(state, event),
        ServerMessage::FinalOutput(output) => apply_final_output(state, output),
        ServerMessage::Unknown => {
            debug!(
                component = "router",
                event = "router.unknown_type",
                "Ignoring frame with unknown type"
            );
            Vec::new()
        }
    }
}

fn apply_log(state: &mut ConsoleState, event: LogEvent) -> Vec<ConsoleEvent> {
    let mut effects = Vec::with_capacity(2);

    if let Some(status) = state.board.apply(&event) {
        effects.push(ConsoleEvent::AgentUpdated {
            agent: event.agent.clone(),
            status: status.clone(),
        });
    }

    let entry = state.activity.record(&event).clone();
    effects.push(ConsoleEvent::Activity(entry));
    effects
}

fn apply_final_output(state: &mut ConsoleState, output: FinalOutput) -> Vec<ConsoleEvent> {
    let mut effects = vec![ConsoleEvent::FinalOutput(output)];
    effects.extend(clear(state));
    effects
}

/// Operator-requested reset. Re-enables start even when the run's final
/// output never arrived.
pub fn clear(state: &mut ConsoleState) -> Vec<ConsoleEvent> {
    state.board.reset_all();
    state.run_active = false;
    vec![
        ConsoleEvent::BoardReset,
        ConsoleEvent::RunControl {
            start_enabled: true,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use crate::status_board::{AgentStatus, VisualState};

    fn test_state() -> ConsoleState {
        ConsoleState::new(&SessionConfig::default())
    }

    fn decode(json: &str) -> ServerMessage {
        serde_json::from_str(json).expect("valid frame")
    }

    #[test]
    fn log_frame_updates_board_and_activity() {
        let mut state = test_state();
        let effects = dispatch(
            &mut state,
            decode(r#"{"type":"log","agent":"Developer","text":"Writing main.py","status":"active"}"#),
        );

        let expected = AgentStatus {
            visual_state: VisualState::Active,
            action_summary: "Writing main.py".into(),
        };
        assert_eq!(state.board.get("Developer"), Some(&expected));
        assert_eq!(effects.len(), 2);
        assert_eq!(
            effects[0],
            ConsoleEvent::AgentUpdated {
                agent: "Developer".into(),
                status: expected,
            }
        );
        assert!(matches!(effects[1], ConsoleEvent::Activity(ref e) if e.seq == 1));
    }

    #[test]
    fn unknown_agent_is_logged_but_not_tracked() {
        let mut state = test_state();
        let effects = dispatch(
            &mut state,
            decode(r#"{"type":"log","agent":"System","text":"Error: boom","status":"error"}"#),
        );

        assert!(state.board.all_idle());
        assert_eq!(state.activity.len(), 1);
        assert!(matches!(effects.as_slice(), [ConsoleEvent::Activity(_)]));
    }

    #[test]
    fn final_output_resets_board_and_enables_start() {
        let mut state = test_state();
        state.run_active = true;
        dispatch(
            &mut state,
            decode(r#"{"type":"log","agent":"Developer","text":"Writing main.py"}"#),
        );
        dispatch(
            &mut state,
            decode(r#"{"type":"log","agent":"Refiner","text":"Refining","status":"waiting"}"#),
        );

        let effects = dispatch(
            &mut state,
            decode(r#"{"type":"final_output","text":"Done","outputPath":"/out"}"#),
        );

        assert!(state.board.all_idle());
        for slot in state.board.slots() {
            assert_eq!(slot.status, AgentStatus::idle());
        }
        assert!(state.start_enabled());
        assert_eq!(
            effects[0],
            ConsoleEvent::FinalOutput(FinalOutput {
                text: "Done".into(),
                output_path: Some("/out".into()),
            })
        );
        assert!(effects.contains(&ConsoleEvent::BoardReset));
        assert!(effects.contains(&ConsoleEvent::RunControl {
            start_enabled: true
        }));
    }

    #[test]
    fn clear_after_failed_run_enables_start() {
        let mut state = test_state();
        state.run_active = true;
        dispatch(
            &mut state,
            decode(r#"{"type":"log","agent":"System","text":"Error: boom","status":"error"}"#),
        );
        assert!(!state.start_enabled());

        let effects = clear(&mut state);

        assert!(state.start_enabled());
        assert!(state.board.all_idle());
        assert_eq!(
            effects,
            vec![
                ConsoleEvent::BoardReset,
                ConsoleEvent::RunControl {
                    start_enabled: true
                },
            ]
        );
    }

    #[test]
    fn unknown_frame_type_is_a_no_op() {
        let mut state = test_state();
        let effects = dispatch(&mut state, decode(r#"{"type":"progress","pct":40}"#));
        assert!(effects.is_empty());
        assert!(state.activity.is_empty());
        assert!(state.board.all_idle());
    }

    #[test]
    fn activity_preserves_arrival_order() {
        let mut state = test_state();
        for text in ["first", "second", "third"] {
            dispatch(
                &mut state,
                ServerMessage::Log(LogEvent::new("Research", text, None)),
            );
        }
        let texts: Vec<&str> = state.activity.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["third", "second", "first"]);
    }
}
