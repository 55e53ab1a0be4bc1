//! Drawing event schema and inbound payload checks.
//!
//! Payloads are checked against [`DrawingEvent`] but never rewritten: the
//! relay forwards the original text so fields beyond the schema survive.

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::InboundError;

/// Stroke colour used when a client omits `color`.
pub const DEFAULT_COLOR: &str = "#000000";

/// Stroke width used when a client omits `lineWidth`.
pub const DEFAULT_LINE_WIDTH: i64 = 2;

/// A validated drawing action as sent by canvas clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawingEvent {
    /// Action kind, e.g. `draw`, `clear` or `move`.
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(deserialize_with = "lenient_f64")]
    pub x: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub y: f64,

    /// Previous pointer position for stroke continuation.
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub prev_x: Option<f64>,
    #[serde(default, deserialize_with = "lenient_opt_f64")]
    pub prev_y: Option<f64>,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default = "default_line_width", deserialize_with = "lenient_i64")]
    pub line_width: i64,

    /// Client clock at emission time.
    #[serde(deserialize_with = "lenient_f64")]
    pub timestamp: f64,
}

fn default_color() -> String {
    DEFAULT_COLOR.to_string()
}

fn default_line_width() -> i64 {
    DEFAULT_LINE_WIDTH
}

// Clients built on form inputs send coordinates as numeric strings, so
// numbers may arrive either as JSON numbers or as strings that parse.

fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    number_from(&value)
        .ok_or_else(|| de::Error::custom(format!("expected a number, got {value}")))
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    number_from(&value)
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("expected a number or null, got {value}")))
}

/// Integers, whole-valued floats and strings holding either.
fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let whole = match &value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(whole_number)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
        }
        _ => None,
    };
    whole.ok_or_else(|| de::Error::custom(format!("expected an integer, got {value}")))
}

fn whole_number(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

/// Known event kinds. Anything else is a client extension and still relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Draw,
    Clear,
    Move,
    Extension,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draw => "draw",
            Self::Clear => "clear",
            Self::Move => "move",
            Self::Extension => "extension",
        }
    }
}

impl DrawingEvent {
    /// Classifies the `type` field.
    pub fn kind(&self) -> EventKind {
        match self.kind.as_str() {
            "draw" => EventKind::Draw,
            "clear" => EventKind::Clear,
            "move" => EventKind::Move,
            _ => EventKind::Extension,
        }
    }

    /// True when the event continues a stroke from a previous point.
    pub fn is_continuation(&self) -> bool {
        self.prev_x.is_some() && self.prev_y.is_some()
    }
}

/// Parses a raw frame as generic JSON.
pub fn parse(raw: &str) -> Result<Value, InboundError> {
    serde_json::from_str(raw).map_err(InboundError::Malformed)
}

/// Parses a raw frame and checks it against the drawing event schema.
pub fn validate(raw: &str) -> Result<DrawingEvent, InboundError> {
    let value = parse(raw)?;
    // Structs would otherwise also deserialize from positional arrays.
    if !value.is_object() {
        return Err(InboundError::Schema("expected a JSON object".to_string()));
    }
    DrawingEvent::deserialize(value).map_err(|e| InboundError::Schema(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_full_event() {
        let event = validate(
            r##"{"type":"draw","x":10,"y":20.5,"prevX":8,"prevY":19,"color":"#ff0000","lineWidth":4,"timestamp":1700000000000}"##,
        )
        .unwrap();

        assert_eq!(event.kind(), EventKind::Draw);
        assert_eq!(event.x, 10.0);
        assert_eq!(event.y, 20.5);
        assert!(event.is_continuation());
        assert_eq!(event.color, "#ff0000");
        assert_eq!(event.line_width, 4);
    }

    #[test]
    fn test_validate_applies_defaults() {
        let event = validate(r#"{"type":"move","x":1,"y":2,"timestamp":3}"#).unwrap();

        assert_eq!(event.color, DEFAULT_COLOR);
        assert_eq!(event.line_width, DEFAULT_LINE_WIDTH);
        assert!(event.prev_x.is_none());
        assert!(!event.is_continuation());
    }

    #[test]
    fn test_validate_null_prev_point() {
        let event =
            validate(r#"{"type":"draw","x":1,"y":2,"prevX":null,"prevY":null,"timestamp":3}"#)
                .unwrap();
        assert!(event.prev_x.is_none());
    }

    #[test]
    fn test_validate_accepts_extension_kind_and_extra_fields() {
        let event = validate(r#"{"type":"erase","x":1,"y":2,"timestamp":3,"tool":"eraser"}"#)
            .unwrap();
        assert_eq!(event.kind(), EventKind::Extension);
    }

    #[test]
    fn test_validate_rejects_non_json() {
        let err = validate("not json").unwrap_err();
        assert!(matches!(err, InboundError::Malformed(_)));
    }

    #[test]
    fn test_validate_rejects_missing_timestamp() {
        let err = validate(r#"{"type":"draw","x":1,"y":2}"#).unwrap_err();
        assert!(matches!(err, InboundError::Schema(_)));
    }

    #[test]
    fn test_validate_rejects_wrong_types() {
        let err = validate(r#"{"type":"draw","x":"left","y":2,"timestamp":3}"#).unwrap_err();
        assert!(matches!(err, InboundError::Schema(_)));

        let err =
            validate(r#"{"type":"draw","x":1,"y":2,"lineWidth":2.5,"timestamp":3}"#).unwrap_err();
        assert!(matches!(err, InboundError::Schema(_)));
    }

    #[test]
    fn test_validate_accepts_numeric_strings() {
        let event = validate(
            r#"{"type":"draw","x":"10","y":" 2.5 ","prevX":"9","prevY":1,"lineWidth":"4","timestamp":"1700000000000"}"#,
        )
        .unwrap();

        assert_eq!(event.x, 10.0);
        assert_eq!(event.y, 2.5);
        assert_eq!(event.prev_x, Some(9.0));
        assert_eq!(event.line_width, 4);
        assert_eq!(event.timestamp, 1_700_000_000_000.0);
    }

    #[test]
    fn test_validate_accepts_whole_float_line_width() {
        let event = validate(r#"{"type":"draw","x":1,"y":2,"lineWidth":2.0,"timestamp":3}"#)
            .unwrap();
        assert_eq!(event.line_width, 2);

        let event = validate(r#"{"type":"draw","x":1,"y":2,"lineWidth":"6.0","timestamp":3}"#)
            .unwrap();
        assert_eq!(event.line_width, 6);
    }

    #[test]
    fn test_validate_rejects_non_numeric_values() {
        for raw in [
            r#"{"type":"draw","x":1,"y":2,"timestamp":"soon"}"#,
            r#"{"type":"draw","x":1,"y":2,"prevX":"left","timestamp":3}"#,
            r#"{"type":"draw","x":true,"y":2,"timestamp":3}"#,
            r#"{"type":"draw","x":1,"y":2,"lineWidth":"2.5","timestamp":3}"#,
            r#"{"type":"draw","x":1,"y":2,"lineWidth":null,"timestamp":3}"#,
        ] {
            let err = validate(raw).unwrap_err();
            assert!(matches!(err, InboundError::Schema(_)), "accepted {raw}");
        }
    }

    #[test]
    fn test_validate_rejects_non_object() {
        let err = validate(r#"["draw",1,2,null,null,"red",2,3]"#).unwrap_err();
        assert!(matches!(err, InboundError::Schema(_)));
    }

    #[test]
    fn test_parse_accepts_any_json() {
        assert!(parse("[1,2,3]").is_ok());
        assert!(parse("{}").is_ok());
        assert!(parse("{").is_err());
    }
}
