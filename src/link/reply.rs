use serde_json::Value;

/// A classified reply line from the robot.
///
/// The firmware speaks several dialects over one wire: JSON documents
/// for structured queries, `ACK ...`/`ERR ...` for plain commands, and
/// free text from older builds. Classification never fails; an
/// unrecognized line is simply [`Reply::Unknown`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// The line parsed as JSON; passed through to callers untouched.
    Json(Value),
    /// Plain-text acknowledgement.
    Ack(String),
    /// Plain-text failure report.
    Err(String),
    /// Anything else the firmware printed.
    Unknown(String),
}

impl Reply {
    pub fn classify(raw: &str) -> Self {
        if let Ok(value) = serde_json::from_str::<Value>(raw) {
            return Reply::Json(value);
        }

        if raw.starts_with("ACK") {
            Reply::Ack(raw.to_string())
        } else if raw.starts_with("ERR") {
            Reply::Err(raw.to_string())
        } else {
            Reply::Unknown(raw.to_string())
        }
    }
}
