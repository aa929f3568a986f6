//! Control-channel message codec.
//!
//! External controllers talk to the network process over a line-oriented
//! channel of slash-delimited ASCII frames:
//!
//! ```text
//! <id>/<ack>/<kind>/<code>/00/00/00/00[/<payload>...]/-1
//! ```
//!
//! Four reserved `00` fields pad the header to a fixed width and the `-1`
//! terminator marks the frame end; both are enforced on parse so a truncated
//! frame never half-decodes. Payload tokens are free-form strings owned by
//! the message kind.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

fn field<T: FromStr>(token: &str, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| Error::Control(format!("invalid {what} '{token}'")))
}

// ============================================================================
// MessageKind
// ============================================================================

/// Wire-level message families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Clock synchronization between controller and network process.
    Sync,
    /// Trip lifecycle commands (add, reroute, cancel).
    TripControl,
    /// Trip progress reports back to the controller.
    TripInfo,
}

impl MessageKind {
    pub fn code(self) -> i32 {
        match self {
            MessageKind::Sync => 1000,
            MessageKind::TripControl => 1001,
            MessageKind::TripInfo => 1002,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1000 => Some(MessageKind::Sync),
            1001 => Some(MessageKind::TripControl),
            1002 => Some(MessageKind::TripInfo),
            _ => None,
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MessageKind::Sync => "sync",
            MessageKind::TripControl => "trip-control",
            MessageKind::TripInfo => "trip-info",
        })
    }
}

// ============================================================================
// ControlMessage
// ============================================================================

/// One decoded control frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlMessage {
    /// Sender-assigned message id, echoed in acknowledgements.
    pub id: i64,
    /// Id of the message this one acknowledges, 0 for none.
    pub ack: i64,
    pub kind: MessageKind,
    /// Command code within the kind; meaning is up to the peer protocol.
    pub code: i32,
    pub payload: Vec<String>,
}

impl ControlMessage {
    pub fn new(id: i64, kind: MessageKind, code: i32) -> Self {
        Self { id, ack: 0, kind, code, payload: Vec::new() }
    }

    pub fn with_ack(mut self, ack: i64) -> Self {
        self.ack = ack;
        self
    }

    pub fn with_payload(mut self, payload: Vec<String>) -> Self {
        self.payload = payload;
        self
    }

    /// Render the frame, reserved fields and terminator included.
    pub fn encode(&self) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(9 + self.payload.len());
        parts.push(self.id.to_string());
        parts.push(self.ack.to_string());
        parts.push(self.kind.code().to_string());
        parts.push(self.code.to_string());
        for _ in 0..4 {
            parts.push("00".to_owned());
        }
        parts.extend(self.payload.iter().cloned());
        parts.push("-1".to_owned());
        parts.join("/")
    }

    /// Decode one frame. Surrounding whitespace (trailing newline from the
    /// channel) is tolerated; structural problems are not.
    pub fn parse(frame: &str) -> Result<Self> {
        let tokens: Vec<&str> = frame.trim().split('/').collect();
        if tokens.len() < 9 {
            return Err(Error::Control(format!(
                "frame has {} fields, expected at least 9",
                tokens.len()
            )));
        }
        if tokens[tokens.len() - 1] != "-1" {
            return Err(Error::Control(format!(
                "frame not terminated with -1 (got '{}')",
                tokens[tokens.len() - 1]
            )));
        }
        for (i, t) in tokens[4..8].iter().enumerate() {
            if *t != "00" {
                return Err(Error::Control(format!(
                    "reserved field {} is '{t}', expected '00'",
                    i + 5
                )));
            }
        }

        let id = field(tokens[0], "message id")?;
        let ack = field(tokens[1], "ack id")?;
        let kind_code: i32 = field(tokens[2], "message kind")?;
        let kind = MessageKind::from_code(kind_code)
            .ok_or_else(|| Error::Control(format!("unknown message kind {kind_code}")))?;
        let code = field(tokens[3], "command code")?;
        let payload = tokens[8..tokens.len() - 1]
            .iter()
            .map(|s| (*s).to_owned())
            .collect();

        Ok(Self { id, ack, kind, code, payload })
    }
}

impl fmt::Display for ControlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {} code={} ({} payload fields)", self.id, self.kind, self.code, self.payload.len())
    }
}

// ============================================================================
// AddTripPayload
// ============================================================================

/// Payload of a trip-control frame that injects a routed trip.
///
/// Token layout: `tripId origin destination startTime linkCount link...`,
/// with the link count guarding against truncated link lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddTripPayload {
    pub trip_id: i64,
    pub origin: i64,
    pub destination: i64,
    /// Departure time, seconds from simulation start.
    pub start_time: f64,
    /// Vendor link ids of the assigned route, in travel order.
    pub link_ids: Vec<i64>,
}

impl AddTripPayload {
    pub fn to_tokens(&self) -> Vec<String> {
        let mut tokens = vec![
            self.trip_id.to_string(),
            self.origin.to_string(),
            self.destination.to_string(),
            self.start_time.to_string(),
            self.link_ids.len().to_string(),
        ];
        tokens.extend(self.link_ids.iter().map(|id| id.to_string()));
        tokens
    }

    pub fn from_tokens(tokens: &[String]) -> Result<Self> {
        if tokens.len() < 5 {
            return Err(Error::Control(format!(
                "trip payload has {} fields, expected at least 5",
                tokens.len()
            )));
        }
        let trip_id = field(&tokens[0], "trip id")?;
        let origin = field(&tokens[1], "origin node")?;
        let destination = field(&tokens[2], "destination node")?;
        let start_time = field(&tokens[3], "start time")?;
        let count: usize = field(&tokens[4], "link count")?;
        if tokens.len() != 5 + count {
            return Err(Error::Control(format!(
                "trip payload announces {count} links but carries {}",
                tokens.len() - 5
            )));
        }
        let link_ids = tokens[5..]
            .iter()
            .map(|t| field(t, "link id"))
            .collect::<Result<Vec<i64>>>()?;

        Ok(Self { trip_id, origin, destination, start_time, link_ids })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_fixed_frame() {
        let msg = ControlMessage::new(42, MessageKind::Sync, 7);
        assert_eq!(msg.encode(), "42/0/1000/7/00/00/00/00/-1");

        let with_payload = ControlMessage::new(43, MessageKind::TripControl, 1)
            .with_ack(42)
            .with_payload(vec!["9".into(), "3".into()]);
        assert_eq!(with_payload.encode(), "43/42/1001/1/00/00/00/00/9/3/-1");
    }

    #[test]
    fn test_parse_round_trip() {
        let original = ControlMessage::new(7, MessageKind::TripInfo, 12)
            .with_payload(vec!["a".into(), "b".into(), "c".into()]);
        let decoded = ControlMessage::parse(&original.encode()).unwrap();
        assert_eq!(decoded, original);

        // Trailing newline from the channel is fine
        let decoded = ControlMessage::parse("1/0/1000/0/00/00/00/00/-1\n").unwrap();
        assert_eq!(decoded.kind, MessageKind::Sync);
        assert!(decoded.payload.is_empty());
    }

    #[test]
    fn test_parse_rejects_structural_damage() {
        // Too short
        assert!(ControlMessage::parse("1/0/1000/0/-1").is_err());
        // Missing terminator
        assert!(ControlMessage::parse("1/0/1000/0/00/00/00/00/5").is_err());
        // Corrupted reserved field
        assert!(ControlMessage::parse("1/0/1000/0/00/01/00/00/-1").is_err());
        // Unknown kind
        assert!(ControlMessage::parse("1/0/9999/0/00/00/00/00/-1").is_err());
        // Non-numeric id
        assert!(ControlMessage::parse("x/0/1000/0/00/00/00/00/-1").is_err());
    }

    #[test]
    fn test_trip_payload_round_trip() {
        let trip = AddTripPayload {
            trip_id: 901,
            origin: 1,
            destination: 4,
            start_time: 30.5,
            link_ids: vec![10, 11, 13],
        };
        let msg = ControlMessage::new(5, MessageKind::TripControl, 1)
            .with_payload(trip.to_tokens());
        let decoded = ControlMessage::parse(&msg.encode()).unwrap();
        let got = AddTripPayload::from_tokens(&decoded.payload).unwrap();
        assert_eq!(got, trip);
    }

    #[test]
    fn test_trip_payload_count_guard() {
        let short = vec!["1".to_owned(), "2".to_owned(), "3".to_owned()];
        assert!(AddTripPayload::from_tokens(&short).is_err());

        // Announces 3 links, carries 2
        let lying: Vec<String> = ["9", "1", "4", "0.0", "3", "10", "11"]
            .iter()
            .map(|s| (*s).to_owned())
            .collect();
        assert!(AddTripPayload::from_tokens(&lying).is_err());

        // No links at all is a valid trip
        let bare: Vec<String> = ["9", "1", "4", "0.0", "0"]
            .iter()
            .map(|s| (*s).to_owned())
            .collect();
        let trip = AddTripPayload::from_tokens(&bare).unwrap();
        assert!(trip.link_ids.is_empty());
    }
}
