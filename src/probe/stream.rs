//! Merged line stream over the probe's output pipes.
//!
//! Each pipe gets a background task that splits it into lines and forwards
//! them into one channel, so stdout and stderr arrive interleaved in the
//! order they were read.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, trace, warn};

/// Lines buffered between the reader tasks and the consumer.
const CHANNEL_CAPACITY: usize = 256;

/// Longest line forwarded; the rest of a longer line is discarded.
pub const MAX_LINE_BYTES: usize = 4096;

/// A boxed pipe, so stdout and stderr can share one stream.
pub type Pipe = Box<dyn AsyncRead + Unpin + Send>;

/// Result of a non-blocking read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinePoll {
    /// A line, without its line terminator.
    Line(String),
    /// Nothing buffered right now.
    Pending,
    /// Every pipe has closed and the buffer is empty.
    Closed,
}

/// Lines read from one or more async readers.
///
/// Invalid UTF-8 is replaced rather than treated as an error, and read
/// errors end that pipe only. The stream ends once all pipes have ended.
///
/// ```
/// use std::io::Cursor;
/// use pingstats::probe::LineStream;
///
/// # tokio_test::block_on(async {
/// let mut lines = LineStream::spawn(Cursor::new(b"one\ntwo\n".to_vec()));
/// assert_eq!(lines.next_line().await.as_deref(), Some("one"));
/// assert_eq!(lines.next_line().await.as_deref(), Some("two"));
/// assert_eq!(lines.next_line().await, None);
/// # });
/// ```
#[derive(Debug)]
pub struct LineStream {
    receiver: mpsc::Receiver<String>,
}

impl LineStream {
    /// Read lines from a single reader.
    pub fn spawn<R>(reader: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        Self::merge(vec![Box::new(reader)])
    }

    /// Read lines from several readers into one stream.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn merge(pipes: Vec<Pipe>) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        for (index, pipe) in pipes.into_iter().enumerate() {
            tokio::spawn(forward(pipe, tx.clone(), index));
        }
        Self { receiver: rx }
    }

    /// Wait for the next line. `None` once the stream has ended.
    pub async fn next_line(&mut self) -> Option<String> {
        self.receiver.recv().await
    }

    /// Take the next line if one is already buffered.
    pub fn try_next_line(&mut self) -> LinePoll {
        match self.receiver.try_recv() {
            Ok(line) => LinePoll::Line(line),
            Err(mpsc::error::TryRecvError::Empty) => LinePoll::Pending,
            Err(mpsc::error::TryRecvError::Disconnected) => LinePoll::Closed,
        }
    }
}

async fn forward(pipe: Pipe, tx: mpsc::Sender<String>, index: usize) {
    let mut reader = BufReader::new(pipe);
    let mut buf = Vec::new();
    let mut discarding = false;

    loop {
        buf.clear();
        let read = (&mut reader)
            .take(MAX_LINE_BYTES as u64)
            .read_until(b'\n', &mut buf)
            .await;
        match read {
            Ok(0) => {
                trace!(pipe = index, "pipe closed");
                break;
            }
            Ok(n) => {
                let complete = buf.last() == Some(&b'\n');
                if discarding {
                    discarding = !complete;
                    continue;
                }
                if !complete && n == MAX_LINE_BYTES {
                    debug!(pipe = index, limit = MAX_LINE_BYTES, "line too long, truncated");
                    discarding = true;
                }
                let line = String::from_utf8_lossy(&buf);
                let line = line.trim_end_matches(['\r', '\n']).to_string();
                if tx.send(line).await.is_err() {
                    // Consumer dropped
                    break;
                }
            }
            Err(e) => {
                warn!(pipe = index, error = %e, "read error on probe output");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::time::Duration;

    #[tokio::test]
    async fn splits_lines_and_strips_terminators() {
        let mut lines = LineStream::spawn(Cursor::new(b"a\r\nb\nlast".to_vec()));
        assert_eq!(lines.next_line().await.as_deref(), Some("a"));
        assert_eq!(lines.next_line().await.as_deref(), Some("b"));
        assert_eq!(lines.next_line().await.as_deref(), Some("last"));
        assert_eq!(lines.next_line().await, None);
    }

    #[tokio::test]
    async fn long_lines_are_truncated() {
        let mut input = vec![b'x'; MAX_LINE_BYTES * 2 + 10];
        input.extend_from_slice(b"\nnext\n");
        let mut lines = LineStream::spawn(Cursor::new(input));

        let first = lines.next_line().await.unwrap();
        assert_eq!(first.len(), MAX_LINE_BYTES);
        assert_eq!(lines.next_line().await.as_deref(), Some("next"));
        assert_eq!(lines.next_line().await, None);
    }

    #[tokio::test]
    async fn invalid_utf8_is_replaced() {
        let mut lines = LineStream::spawn(Cursor::new(b"ok \xff\xfe here\n".to_vec()));
        let line = lines.next_line().await.unwrap();
        assert!(line.starts_with("ok "));
        assert!(line.ends_with(" here"));
        assert!(line.contains('\u{FFFD}'));
    }

    #[tokio::test]
    async fn merges_pipes_and_closes_after_all() {
        let mut lines = LineStream::merge(vec![
            Box::new(Cursor::new(b"out 1\nout 2\n".to_vec())),
            Box::new(Cursor::new(b"err 1\n".to_vec())),
        ]);

        let mut seen = Vec::new();
        while let Some(line) = lines.next_line().await {
            seen.push(line);
        }
        seen.sort();
        assert_eq!(seen, vec!["err 1", "out 1", "out 2"]);
    }

    #[tokio::test]
    async fn try_next_line_reports_closed() {
        let mut lines = LineStream::spawn(Cursor::new(b"x\n".to_vec()));
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(lines.try_next_line(), LinePoll::Line("x".to_string()));
        assert_eq!(lines.try_next_line(), LinePoll::Closed);
    }

    #[tokio::test]
    async fn try_next_line_pending_while_open() {
        let (_writer, reader) = tokio::io::duplex(64);
        let mut lines = LineStream::spawn(reader);
        assert_eq!(lines.try_next_line(), LinePoll::Pending);
    }
}
