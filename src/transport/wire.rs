//! Wire envelope for the relay channel
//!
//! Every frame is a JSON text message `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::input::InputState;

/// Sender -> hub
pub const EVENT_INPUT: &str = "input";
/// Hub -> every other peer
pub const EVENT_MOBILE_INPUT: &str = "mobile-input";

/// Protocol-level decode failures
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("frame is not a valid envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    #[error("unexpected event '{0}'")]
    UnexpectedEvent(String),

    #[error("payload is not an input state: {0}")]
    Payload(#[source] serde_json::Error),
}

/// Generic frame envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event: String,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Envelope)
    }

    pub fn to_text(&self) -> String {
        // Value and String fields cannot fail to serialize
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Encode a sender's snapshot as an `input` frame
pub fn encode_input(state: &InputState) -> Result<String, ProtocolError> {
    let data = serde_json::to_value(state).map_err(ProtocolError::Payload)?;
    Ok(Envelope {
        event: EVENT_INPUT.to_string(),
        data,
    }
    .to_text())
}

/// Re-wrap an `input` payload, unchanged, as a `mobile-input` frame
pub fn relay_frame(data: Value) -> String {
    Envelope {
        event: EVENT_MOBILE_INPUT.to_string(),
        data,
    }
    .to_text()
}

/// Decode a `mobile-input` frame into a state mirror
pub fn decode_mobile_input(text: &str) -> Result<InputState, ProtocolError> {
    let envelope = Envelope::parse(text)?;
    if envelope.event != EVENT_MOBILE_INPUT {
        return Err(ProtocolError::UnexpectedEvent(envelope.event));
    }
    serde_json::from_value(envelope.data).map_err(ProtocolError::Payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{StickId, StickVector};
    use serde_json::json;

    #[test]
    fn test_encode_input_envelope() {
        let mut state = InputState::new();
        state.set_stick(StickId::Left, StickVector::new(0.5, 0.0));

        let frame: Value = serde_json::from_str(&encode_input(&state).unwrap()).unwrap();
        assert_eq!(frame["event"], "input");
        assert_eq!(frame["data"]["ls"]["x"], 0.5);
        assert_eq!(frame["data"]["buttons"], json!({}));
    }

    #[test]
    fn test_relay_keeps_payload_verbatim() {
        let payload = json!({"ls": {"x": 0.5, "y": 0}, "rs": {"x": 0, "y": 0}, "buttons": {}, "extra": [1, 2]});
        let frame = Envelope::parse(&relay_frame(payload.clone())).unwrap();
        assert_eq!(frame.event, EVENT_MOBILE_INPUT);
        assert_eq!(frame.data, payload);
    }

    #[test]
    fn test_decode_mobile_input() {
        let text = r#"{"event":"mobile-input","data":{"ls":{"x":0.5,"y":0},"rs":{"x":0,"y":0},"buttons":{"a":true}}}"#;
        let state = decode_mobile_input(text).unwrap();
        assert_eq!(state.left_stick.x, 0.5);
        assert!(state.is_pressed("a"));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode_mobile_input("not json"), Err(ProtocolError::Envelope(_))));
        assert!(matches!(
            decode_mobile_input(r#"{"event":"input","data":{}}"#),
            Err(ProtocolError::UnexpectedEvent(_))
        ));
        assert!(matches!(
            decode_mobile_input(r#"{"event":"mobile-input","data":{"ls":"left"}}"#),
            Err(ProtocolError::Payload(_))
        ));
    }
}
