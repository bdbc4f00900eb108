//! Byte-level server-sent-event framing.
//!
//! Lines are split on raw `\n` bytes before any UTF-8 decoding, so a multi-byte character
//! divided between two network reads is reassembled intact.
//!
//! ```rust
//! use tprovider::SseFrameBuffer;
//!
//! let mut buffer = SseFrameBuffer::new();
//! assert!(buffer.push(b"event: ping\ndata: {\"a\"").is_empty());
//! assert_eq!(buffer.push(b":1}\n\n"), vec!["{\"a\":1}".to_string()]);
//! assert_eq!(buffer.push(b"data: tail"), Vec::<String>::new());
//! assert_eq!(buffer.finish(), Some("tail".to_string()));
//! ```

#[derive(Debug, Default, Clone)]
pub struct SseFrameBuffer {
    pending: Vec<u8>,
    /// Bytes of `pending` already known to hold no newline.
    scanned: usize,
}

impl SseFrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a chunk and returns the `data:` payloads of every line it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(chunk);

        let mut payloads = Vec::new();
        let mut line_start = 0;
        while let Some(offset) = self.pending[self.scanned..]
            .iter()
            .position(|byte| *byte == b'\n')
        {
            let newline_index = self.scanned + offset;
            if let Some(payload) = data_payload(&self.pending[line_start..=newline_index]) {
                payloads.push(payload);
            }
            line_start = newline_index + 1;
            self.scanned = line_start;
        }

        self.pending.drain(..line_start);
        self.scanned = self.pending.len();
        payloads
    }

    /// Flushes an unterminated final line once the stream has ended.
    pub fn finish(&mut self) -> Option<String> {
        let line = std::mem::take(&mut self.pending);
        self.scanned = 0;
        data_payload(&line)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn data_payload(line: &[u8]) -> Option<String> {
    let line = String::from_utf8_lossy(line);
    let line = line.trim_end_matches(['\n', '\r']);
    let payload = line.strip_prefix("data:")?.trim();

    if payload.is_empty() {
        None
    } else {
        Some(payload.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ignores_comments_event_lines_and_blank_data() {
        let mut buffer = SseFrameBuffer::new();
        let payloads = buffer.push(b": keep-alive\nevent: message_start\ndata:\ndata:   \n\n");

        assert!(payloads.is_empty());
        assert!(!buffer.has_pending());
    }

    #[test]
    fn accepts_data_without_space_and_crlf_endings() {
        let mut buffer = SseFrameBuffer::new();
        let payloads = buffer.push(b"data:{\"x\":1}\r\ndata: {\"y\":2}\r\n\r\n");

        assert_eq!(payloads, vec!["{\"x\":1}", "{\"y\":2}"]);
    }

    #[test]
    fn reassembles_multibyte_characters_split_across_reads() {
        let frame = "data: {\"t\":\"caf\u{e9} \u{1f600}\"}\n".as_bytes();
        let split_at = frame.len() - 4;
        let mut buffer = SseFrameBuffer::new();

        assert!(buffer.push(&frame[..split_at]).is_empty());
        let payloads = buffer.push(&frame[split_at..]);

        assert_eq!(payloads, vec!["{\"t\":\"caf\u{e9} \u{1f600}\"}".to_string()]);
    }

    #[test]
    fn finish_on_empty_buffer_yields_nothing() {
        let mut buffer = SseFrameBuffer::new();
        assert_eq!(buffer.finish(), None);

        buffer.push(b"event: done");
        assert_eq!(buffer.finish(), None);
    }

    #[test]
    fn long_frame_fed_byte_by_byte_only_rescans_new_bytes() {
        let body = "x".repeat(64 * 1024);
        let frame = format!("data: {body}\n\ndata: next\n");
        let mut buffer = SseFrameBuffer::new();
        let mut payloads = Vec::new();

        for byte in frame.as_bytes() {
            payloads.extend(buffer.push(std::slice::from_ref(byte)));
            assert_eq!(buffer.scanned, buffer.pending.len());
        }

        assert_eq!(payloads, vec![body, "next".to_string()]);
        assert!(!buffer.has_pending());
    }

    #[test]
    fn several_lines_in_one_chunk_keep_the_unterminated_tail() {
        let mut buffer = SseFrameBuffer::new();
        let payloads = buffer.push(b"data: one\ndata: two\ndata: thr");

        assert_eq!(payloads, vec!["one", "two"]);
        assert_eq!(buffer.push(b"ee\n"), vec!["three"]);
        assert!(!buffer.has_pending());
    }
}
