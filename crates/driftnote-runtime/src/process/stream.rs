//! Child-process output decoding (non-UTF8-safe line streaming).
//!
//! Service processes can emit non-UTF8 bytes on stdout/stderr, and chunks
//! arrive split at arbitrary byte boundaries. `LineBuffer` accumulates raw
//! chunks, emits every complete line immediately, and retains the trailing
//! partial line until more data arrives or the stream ends.

use driftnote_core::{LogEntry, LogLevel, ServiceKind, ServiceLogSink};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::debug;

/// Incremental decoder from byte chunks into discrete text lines.
#[derive(Debug, Default)]
pub struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { buf: Vec::new() }
    }

    /// Append a chunk and return every line completed by it, in order.
    ///
    /// Lines are lossy UTF-8 decoded with the trailing `\n` (and `\r`)
    /// stripped. The final incomplete fragment stays buffered.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buf.drain(..=pos).collect();
            line.pop(); // the '\n'
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).to_string());
        }
        lines
    }

    /// Flush the retained fragment at end of stream, if non-empty.
    #[must_use]
    pub fn finish(self) -> Option<String> {
        if self.buf.is_empty() {
            None
        } else {
            Some(String::from_utf8_lossy(&self.buf).to_string())
        }
    }

    /// True when no partial line is buffered.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Spawn a background task decoding one child stream into log entries.
///
/// Each complete line is forwarded to the sink as it arrives; a non-empty
/// trailing fragment is flushed when the stream closes. The task exits on
/// EOF or read error.
pub fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    service: ServiceKind,
    level: LogLevel,
    sink: Arc<dyn ServiceLogSink>,
) {
    tokio::spawn(async move {
        let mut reader = stream;
        let mut lines = LineBuffer::new();
        let mut chunk = [0u8; 2048];

        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break, // EOF
                Ok(n) => {
                    for line in lines.push(&chunk[..n]) {
                        sink.append(service, LogEntry::new(level, line));
                    }
                }
                Err(e) => {
                    debug!(%service, error = %e, "log stream reader exiting due to read error");
                    return;
                }
            }
        }

        if let Some(rest) = lines.finish() {
            sink.append(service, LogEntry::new(level, rest));
        }
        debug!(%service, "log stream reader task exiting");
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn reassembles_lines_across_chunks() {
        let mut buf = LineBuffer::new();
        let mut lines = Vec::new();
        for chunk in [&b"al"[..], &b"pha\nbe"[..], &b"ta\n"[..]] {
            lines.extend(buf.push(chunk));
        }
        assert_eq!(lines, vec!["alpha".to_string(), "beta".to_string()]);
        assert!(buf.is_empty());
        assert_eq!(buf.finish(), None);
    }

    #[test]
    fn retains_trailing_fragment_until_finish() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"complete\npart"), vec!["complete".to_string()]);
        assert!(!buf.is_empty());
        assert_eq!(buf.finish(), Some("part".to_string()));
    }

    #[test]
    fn strips_crlf_endings() {
        let mut buf = LineBuffer::new();
        assert_eq!(
            buf.push(b"one\r\ntwo\r\n"),
            vec!["one".to_string(), "two".to_string()]
        );
    }

    #[test]
    fn preserves_empty_logical_lines() {
        // Consecutive newlines are real (empty) lines; the streamer must
        // not swallow them, callers decide whether to filter.
        let mut buf = LineBuffer::new();
        assert_eq!(
            buf.push(b"a\n\nb\n"),
            vec!["a".to_string(), String::new(), "b".to_string()]
        );
    }

    #[test]
    fn empty_line_split_across_chunks() {
        let mut buf = LineBuffer::new();
        assert_eq!(buf.push(b"a\n"), vec!["a".to_string()]);
        assert_eq!(buf.push(b"\n"), vec![String::new()]);
    }

    #[test]
    fn lossy_decodes_invalid_utf8() {
        let mut buf = LineBuffer::new();
        let lines = buf.push(b"ok \xff\xfe bytes\n");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("ok "));
        assert!(lines[0].ends_with(" bytes"));
    }

    struct CollectSink {
        entries: Mutex<Vec<(ServiceKind, LogEntry)>>,
    }

    impl ServiceLogSink for CollectSink {
        fn append(&self, service: ServiceKind, entry: LogEntry) {
            self.entries.lock().unwrap().push((service, entry));
        }
    }

    #[tokio::test]
    async fn reader_flushes_trailing_fragment_at_eof() {
        let sink = Arc::new(CollectSink {
            entries: Mutex::new(Vec::new()),
        });
        let (mut tx, rx) = tokio::io::duplex(64);
        spawn_stream_reader(rx, ServiceKind::Backend, LogLevel::Info, sink.clone());

        use tokio::io::AsyncWriteExt;
        tx.write_all(b"hello\nwor").await.unwrap();
        tx.write_all(b"ld").await.unwrap();
        drop(tx); // EOF

        // Give the reader task a moment to drain
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;

        let entries = sink.entries.lock().unwrap();
        let messages: Vec<&str> = entries.iter().map(|(_, e)| e.message.as_str()).collect();
        assert_eq!(messages, vec!["hello", "world"]);
        assert!(entries.iter().all(|(s, _)| *s == ServiceKind::Backend));
    }
}
