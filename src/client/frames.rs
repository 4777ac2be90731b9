//! Incremental SSE frame decoder.
//!
//! Chunks arriving off the wire do not align with frame boundaries, so the
//! decoder buffers bytes and emits a frame each time a blank line completes
//! one. Comment lines (keep-alives) and the `id:`/`retry:` fields are
//! consumed and dropped; only `event:` and `data:` contribute to frames.

use crate::ports::StreamFrame;

/// Event name used when a frame carries no `event:` field.
const DEFAULT_EVENT: &str = "message";

/// Stateful decoder; feed it raw chunks, collect completed frames.
#[derive(Debug, Default)]
pub struct SseFrameDecoder {
    buffer: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseFrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes one chunk, returning every frame it completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamFrame> {
        self.buffer.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(frame) = self.take_frame() {
                    frames.push(frame);
                }
                continue;
            }
            if line.starts_with(':') {
                // Comment frame (keep-alive).
                continue;
            }

            let (field, value) = match line.split_once(':') {
                Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
                None => (line, ""),
            };
            match field {
                "event" => self.event = Some(value.to_string()),
                "data" => self.data.push(value.to_string()),
                // id: and retry: are not used by this client.
                _ => {}
            }
        }
        frames
    }

    /// Completes the frame under construction, if it carries any data.
    ///
    /// A blank line with no accumulated `data:` lines dispatches nothing,
    /// per the SSE processing model.
    fn take_frame(&mut self) -> Option<StreamFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        Some(StreamFrame {
            event: event.unwrap_or_else(|| DEFAULT_EVENT.to_string()),
            data: self.data.drain(..).collect::<Vec<_>>().join("\n"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_one_complete_frame() {
        let mut decoder = SseFrameDecoder::new();
        let frames = decoder.feed(b"event: horses:created\ndata: {\"id\":1}\n\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "horses:created");
        assert_eq!(frames[0].data, r#"{"id":1}"#);
    }

    #[test]
    fn reassembles_frame_split_across_chunks() {
        let mut decoder = SseFrameDecoder::new();
        assert!(decoder.feed(b"event: tasks:comp").is_empty());
        assert!(decoder.feed(b"leted\ndata: {\"id\"").is_empty());
        let frames = decoder.feed(b":7}\n\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "tasks:completed");
        assert_eq!(frames[0].data, r#"{"id":7}"#);
    }

    #[test]
    fn decodes_multiple_frames_from_one_chunk() {
        let mut decoder = SseFrameDecoder::new();
        let frames = decoder.feed(b"event: a\ndata: 1\n\nevent: b\ndata: 2\n\n");

        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].event, "a");
        assert_eq!(frames[1].event, "b");
    }

    #[test]
    fn comment_lines_are_dropped() {
        let mut decoder = SseFrameDecoder::new();
        let frames = decoder.feed(b": keep-alive\n\nevent: a\ndata: 1\n\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "a");
    }

    #[test]
    fn multiline_data_joins_with_newline() {
        let mut decoder = SseFrameDecoder::new();
        let frames = decoder.feed(b"data: first\ndata: second\n\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "first\nsecond");
    }

    #[test]
    fn missing_event_field_defaults_to_message() {
        let mut decoder = SseFrameDecoder::new();
        let frames = decoder.feed(b"data: 1\n\n");

        assert_eq!(frames[0].event, "message");
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let mut decoder = SseFrameDecoder::new();
        let frames = decoder.feed(b"event: a\r\ndata: 1\r\n\r\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].event, "a");
        assert_eq!(frames[0].data, "1");
    }

    #[test]
    fn event_without_data_dispatches_nothing() {
        let mut decoder = SseFrameDecoder::new();
        let frames = decoder.feed(b"event: a\n\n");
        assert!(frames.is_empty());
    }

    #[test]
    fn id_and_retry_fields_are_ignored() {
        let mut decoder = SseFrameDecoder::new();
        let frames = decoder.feed(b"id: 3\nretry: 1000\ndata: 1\n\n");

        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].data, "1");
    }
}
