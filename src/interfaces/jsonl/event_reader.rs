use crate::domain::event::VerificationEvent;
use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;
use std::io::{BufRead, BufReader, Read};

#[derive(Debug, Deserialize)]
struct WireEvent {
    event: String,
    #[serde(default)]
    payload: Option<Value>,
}

/// Reads verification events, one JSON object per line.
///
/// Each line has the form `{"event": "PAYMENT_DATA_CODE_GOOD", "payload": {"type": "sms"}}`.
/// Blank lines are skipped.
pub struct EventReader<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> EventReader<R> {
    /// Creates a new `EventReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        Self {
            reader: BufReader::new(source),
        }
    }

    /// Returns an iterator that lazily reads and decodes events.
    pub fn events(self) -> impl Iterator<Item = Result<VerificationEvent>> {
        self.reader
            .lines()
            .filter(|line| !matches!(line, Ok(text) if text.trim().is_empty()))
            .map(|line| -> Result<VerificationEvent> {
                let wire: WireEvent = serde_json::from_str(&line?)?;
                VerificationEvent::from_wire(&wire.event, wire.payload.as_ref())
            })
    }
}
