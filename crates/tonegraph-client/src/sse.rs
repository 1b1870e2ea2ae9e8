//! Incremental decoder for the `text/event-stream` graph update feed.

use tonegraph_graph::Graph;

use crate::error::ClientError;

/// Longest line accepted before the decoder gives up on it.
pub const MAX_LINE_BYTES: usize = 8 * 1024 * 1024;

/// Decodes graph snapshots from a server-sent event stream.
///
/// Bytes may arrive split anywhere, including inside a UTF-8 sequence. Each
/// event's `data:` lines are joined with `\n` and parsed as a graph once the
/// blank line ending the event arrives. Comment lines and fields other than
/// `data` are ignored.
///
/// A line longer than the line limit is reported once as malformed along
/// with the event it belongs to, and skipped up to its newline.
#[derive(Debug)]
pub struct SseDecoder {
    pending: Vec<u8>,
    data: Vec<String>,
    max_line: usize,
    skipping: bool,
}

impl Default for SseDecoder {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            data: Vec::new(),
            max_line: MAX_LINE_BYTES,
            skipping: false,
        }
    }
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_line(mut self, max_line: usize) -> Self {
        self.max_line = max_line;
        self
    }

    /// Feeds `chunk` and returns the events it completed, in order.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<Graph, ClientError>> {
        let mut events = Vec::new();
        // The tail of a skipped line is dropped without buffering it.
        let chunk = if self.skipping {
            match chunk.iter().position(|&byte| byte == b'\n') {
                Some(newline) => {
                    self.skipping = false;
                    &chunk[newline + 1..]
                }
                None => return events,
            }
        } else {
            chunk
        };
        self.pending.extend_from_slice(chunk);

        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&byte| byte == b'\n') {
            let newline = start + offset;
            let mut end = newline;
            if end > start && self.pending[end - 1] == b'\r' {
                end -= 1;
            }
            let line = &self.pending[start..end];
            let event = if line.len() > self.max_line {
                Some(self.oversized_line())
            } else {
                process_line(&mut self.data, line)
            };
            events.extend(event);
            start = newline + 1;
        }
        self.pending.drain(..start);

        if self.pending.len() > self.max_line {
            self.pending.clear();
            self.skipping = true;
            events.push(self.oversized_line());
        }
        events
    }

    /// Drops a trailing event that was never terminated by a blank line.
    pub fn finish(&mut self) {
        if !self.data.is_empty() || !self.pending.is_empty() {
            tracing::debug!("discarding unterminated graph update");
        }
        self.pending.clear();
        self.data.clear();
        self.skipping = false;
    }

    fn oversized_line(&mut self) -> Result<Graph, ClientError> {
        tracing::warn!(max_line = self.max_line, "graph update line too long");
        self.data.clear();
        Err(ClientError::malformed(format!(
            "event line exceeds {} bytes",
            self.max_line
        )))
    }
}

fn process_line(data: &mut Vec<String>, line: &[u8]) -> Option<Result<Graph, ClientError>> {
    if line.is_empty() {
        return dispatch(data);
    }
    if line[0] == b':' {
        return None;
    }
    let line = match std::str::from_utf8(line) {
        Ok(line) => line,
        Err(err) => {
            data.clear();
            return Some(Err(ClientError::malformed(err)));
        }
    };
    let (field, value) = match line.split_once(':') {
        Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
        None => (line, ""),
    };
    if field == "data" {
        data.push(value.to_string());
    }
    None
}

fn dispatch(data: &mut Vec<String>) -> Option<Result<Graph, ClientError>> {
    if data.is_empty() {
        return None;
    }
    let payload = data.join("\n");
    data.clear();
    Some(Graph::from_json(&payload).map_err(ClientError::malformed))
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRAPH: &str = r#"{"name":"g","sample_rate":48000,"nodes":[],"inputs":[],"outputs":[]}"#;

    #[test]
    fn decodes_events_split_across_chunks() {
        let stream = format!(": keep-alive\nevent: graph\ndata: {GRAPH}\n\n");
        let (head, tail) = stream.as_bytes().split_at(25);
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(head).is_empty());
        let events = decoder.push(tail);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().name, "g");
    }

    #[test]
    fn joins_multi_line_data_and_tolerates_crlf() {
        let stream = "data: {\"name\":\"multi\",\r\ndata: \"sample_rate\":44100,\"nodes\":[],\r\ndata:\"inputs\":[],\"outputs\":[]}\r\n\r\n";
        let mut decoder = SseDecoder::new();
        let events = decoder.push(stream.as_bytes());
        let graph = events.into_iter().next().unwrap().unwrap();
        assert_eq!(graph.name, "multi");
        assert_eq!(graph.sample_rate, 44_100);
    }

    #[test]
    fn bad_payload_is_malformed_and_stream_continues() {
        let stream = format!("data: {{not json\n\ndata: {GRAPH}\n\n");
        let mut decoder = SseDecoder::new();
        let events = decoder.push(stream.as_bytes());
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Err(ClientError::MalformedUpdate { .. })));
        assert!(events[1].is_ok());
    }

    #[test]
    fn blank_lines_without_data_dispatch_nothing() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.push(b"\n\nid: 7\n\n").is_empty());
    }

    #[test]
    fn finish_drops_unterminated_event() {
        let mut decoder = SseDecoder::new();
        decoder.push(format!("data: {GRAPH}\n").as_bytes());
        decoder.finish();
        assert!(decoder.push(b"\n").is_empty());
    }

    #[test]
    fn overlong_line_is_malformed_and_decoding_resumes() {
        let mut decoder = SseDecoder::new().with_max_line(100);
        let flood = format!("data: {}", "x".repeat(150));
        let events = decoder.push(flood.as_bytes());
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], Err(ClientError::MalformedUpdate { .. })));

        assert!(decoder.push("y".repeat(500).as_bytes()).is_empty());
        assert!(decoder.push(b"yyy\n\n").is_empty());

        let events = decoder.push(format!("data: {GRAPH}\n\n").as_bytes());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_ref().unwrap().name, "g");
    }

    #[test]
    fn overlong_terminated_line_drops_its_event() {
        let mut decoder = SseDecoder::new().with_max_line(100);
        let stream = format!("data: {GRAPH}\ndata: {}\n\ndata: {GRAPH}\n\n", "z".repeat(120));
        let events = decoder.push(stream.as_bytes());
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], Err(ClientError::MalformedUpdate { .. })));
        assert_eq!(events[1].as_ref().unwrap().name, "g");
    }
}
