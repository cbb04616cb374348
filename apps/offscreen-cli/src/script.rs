use anyhow::Context;
use offscreen_input::NativeEvent;
use serde::Deserialize;
use std::path::Path;

/// One step of an input replay script.
#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScriptStep {
    Resize { width: u32, height: u32 },
    Move { left: i32, top: i32 },
    Event(NativeEvent),
    Wait { ms: u64 },
    /// Drop the proxy early; later steps still fire on the host and go nowhere.
    Dispose,
}

#[derive(Debug, Deserialize)]
pub struct Script {
    pub steps: Vec<ScriptStep>,
}

/// Drag, zoom, hover, and a touch tap over a resizing element.
const BUILTIN: &str = r#"
steps:
  - step: event
    type: pointerdown
    time_stamp: 10
    position: { client_x: 150, client_y: 75 }
    button: 0
    buttons: 1
    pointer: { pointer_id: 1, pointer_type: mouse, is_primary: true }
  - step: event
    type: pointermove
    time_stamp: 26
    position: { client_x: 190, client_y: 60 }
    button: -1
    buttons: 1
    pointer: { pointer_id: 1, pointer_type: mouse, is_primary: true }
  - step: event
    type: pointerup
    time_stamp: 42
    position: { client_x: 190, client_y: 60 }
    button: 0
    buttons: 0
    pointer: { pointer_id: 1, pointer_type: mouse, is_primary: true }
  - step: wait
    ms: 20
  - step: event
    type: wheel
    time_stamp: 60
    position: { client_x: 150, client_y: 75 }
    wheel: { y: -120 }
  - step: event
    type: mousemove
    time_stamp: 80
    position: { client_x: 75, client_y: 40 }
    extra: { target: "canvas#c" }
  - step: resize
    width: 640
    height: 360
  - step: move
    left: 8
    top: 8
  - step: wait
    ms: 20
  - step: event
    type: touchstart
    time_stamp: 120
    touches: [{ identifier: 0, clientX: 320, clientY: 180 }]
    changed_touches: [{ identifier: 0, clientX: 320, clientY: 180 }]
  - step: event
    type: touchend
    time_stamp: 140
    touches: []
    changed_touches: [{ identifier: 0, clientX: 320, clientY: 180 }]
  - step: event
    type: keydown
    time_stamp: 160
    key: ArrowLeft
    code: ArrowLeft
  - step: wait
    ms: 20
"#;

impl Script {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("invalid input script")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&text)
    }

    pub fn builtin() -> anyhow::Result<Self> {
        Self::parse(BUILTIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use offscreen_protocol::EventKind;

    #[test]
    fn builtin_script_parses() {
        let script = Script::builtin().unwrap();
        assert_eq!(script.steps.len(), 13);
        let kinds: Vec<EventKind> = script
            .steps
            .iter()
            .filter_map(|s| match s {
                ScriptStep::Event(e) => Some(e.kind),
                _ => None,
            })
            .collect();
        assert_eq!(kinds.first(), Some(&EventKind::PointerDown));
        assert!(kinds.contains(&EventKind::TouchStart));
    }

    #[test]
    fn event_step_carries_native_fields() {
        let script = Script::parse(
            r#"
steps:
  - step: event
    type: wheel
    time_stamp: 5
    wheel: { y: 3 }
    extra: { target: "div" }
  - step: resize
    width: 10
    height: 20
  - step: dispose
"#,
        )
        .unwrap();
        let ScriptStep::Event(e) = &script.steps[0] else {
            panic!("expected event step");
        };
        assert_eq!(e.kind, EventKind::Wheel);
        assert_eq!(e.wheel.map(|w| w.y), Some(3.0));
        assert_eq!(e.extra.get("target").map(String::as_str), Some("div"));
        assert!(matches!(
            script.steps[1],
            ScriptStep::Resize {
                width: 10,
                height: 20
            }
        ));
        assert!(matches!(script.steps[2], ScriptStep::Dispose));
    }

    #[test]
    fn step_without_time_stamp_serializes_without_one() {
        let script = Script::parse(
            "steps:\n  - step: event\n    type: mousemove\n    position: { client_x: 1, client_y: 2 }\n",
        )
        .unwrap();
        let ScriptStep::Event(e) = &script.steps[0] else {
            panic!("expected event step");
        };
        assert_eq!(e.time_stamp, None);
        let record = offscreen_input::serialize(e);
        assert_eq!(record.time_stamp, None);
        assert_eq!(record.client_x, Some(1.0));
    }

    #[test]
    fn unknown_event_kind_is_rejected() {
        let err = Script::parse("steps:\n  - step: event\n    type: mouse\n").unwrap_err();
        assert!(err.to_string().contains("invalid input script"));
    }
}
