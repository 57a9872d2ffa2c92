//! Server-Sent Events framing.
//!
//! [`FrameDecoder`] turns a chunked `text/event-stream` body into complete
//! `data:` payloads; [`parse_frame`] decodes one payload into an event.
//! Keep-alive comments and fields other than `data` are dropped.

use tracker_types::ObjectEvent;

use crate::error::MirrorError;

/// Decode one `data:` payload into an [`ObjectEvent`].
///
/// # Errors
///
/// Returns [`MirrorError::EmptyFrame`] for a blank payload, or
/// [`MirrorError::Malformed`] if it is not a valid event.
pub fn parse_frame(payload: &str) -> Result<ObjectEvent, MirrorError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(MirrorError::EmptyFrame);
    }
    Ok(serde_json::from_str(payload)?)
}

/// Incremental splitter for a `text/event-stream` body.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    /// Create an empty decoder.
    pub const fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Feed one body chunk and return every payload it completes.
    ///
    /// Chunks may split frames, lines, or UTF-8 sequences anywhere.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer
            .extend(chunk.iter().copied().filter(|byte| *byte != b'\r'));

        let mut payloads = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|pair| pair == b"\n\n") {
            let rest = self.buffer.split_off(end.saturating_add(2));
            let frame = std::mem::replace(&mut self.buffer, rest);
            if let Some(payload) = data_payload(&String::from_utf8_lossy(&frame)) {
                payloads.push(payload);
            }
        }
        payloads
    }

    /// Bytes held back waiting for the end of a frame.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Discard any partial frame, e.g. after a reconnect.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

fn data_payload(frame: &str) -> Option<String> {
    let lines: Vec<&str> = frame
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|value| value.strip_prefix(' ').unwrap_or(value))
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use tracker_types::{Action, ObjectId};

    use super::*;

    const REMOVE_FRAME: &str = "data: {\"type\":\"REMOVE\",\"data\":{\"id\":4}}\n\n";

    #[test]
    fn parses_remove_payload() {
        let event = parse_frame(r#"{"type":"REMOVE","data":{"id":4}}"#).unwrap();
        assert_eq!(event.action(), Action::Remove);
        assert_eq!(event.object_id(), ObjectId(4));
    }

    #[test]
    fn parses_update_payload() {
        let payload = r#"{"type":"UPDATE","data":{"id":2,"velocity":0.5,
            "position":{"lat":50.1,"lng":15.2},"direction":{"x":0.1,"y":-0.3}}}"#;
        let event = parse_frame(payload).unwrap();
        let ObjectEvent::ObjectUpdated(object) = event else {
            panic!("expected an update");
        };
        assert_eq!(object.id, ObjectId(2));
    }

    #[test]
    fn blank_and_garbage_payloads_are_errors() {
        assert!(matches!(parse_frame("  "), Err(MirrorError::EmptyFrame)));
        assert!(matches!(
            parse_frame(r#"{"type":"TELEPORT","data":{}}"#),
            Err(MirrorError::Malformed { .. })
        ));
    }

    #[test]
    fn decodes_whole_frames() {
        let mut decoder = FrameDecoder::new();
        let payloads = decoder.push(REMOVE_FRAME.repeat(2).as_bytes());
        assert_eq!(payloads.len(), 2);
        assert_eq!(decoder.buffered(), 0);
        parse_frame(payloads.first().unwrap()).unwrap();
    }

    #[test]
    fn reassembles_split_frames() {
        let mut decoder = FrameDecoder::new();
        let (head, tail) = REMOVE_FRAME.split_at(17);
        assert!(decoder.push(head.as_bytes()).is_empty());
        assert!(decoder.buffered() > 0);
        let payloads = decoder.push(tail.as_bytes());
        assert_eq!(payloads, vec![r#"{"type":"REMOVE","data":{"id":4}}"#.to_owned()]);
    }

    #[test]
    fn skips_keep_alive_comments_and_crlf() {
        let mut decoder = FrameDecoder::new();
        let body = ":\n\nevent: message\r\ndata: {\"type\":\"REMOVE\",\"data\":{\"id\":1}}\r\n\r\n";
        let payloads = decoder.push(body.as_bytes());
        assert_eq!(payloads.len(), 1);
        assert_eq!(parse_frame(payloads.first().unwrap()).unwrap().object_id(), ObjectId(1));
    }

    #[test]
    fn clear_drops_partial_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.push(b"data: {\"type\"");
        decoder.clear();
        assert_eq!(decoder.buffered(), 0);
        assert_eq!(decoder.push(REMOVE_FRAME.as_bytes()).len(), 1);
    }
}
