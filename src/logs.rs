use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;

/// A single formatted log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub line: String,
}

/// Bounded FIFO of log lines for front ends that poll instead of subscribe.
///
/// When full, the oldest lines are dropped.
#[derive(Debug)]
pub struct LogQueue {
    entries: Mutex<VecDeque<LogEntry>>,
    capacity: usize,
}

impl LogQueue {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
        }
    }

    pub fn push<S: Into<String>>(&self, line: S) {
        let mut entries = self.entries.lock();
        entries.push_back(LogEntry {
            timestamp: Utc::now(),
            line: line.into(),
        });
        while entries.len() > self.capacity {
            entries.pop_front();
        }
    }

    pub fn pop(&self) -> Option<LogEntry> {
        self.entries.lock().pop_front()
    }

    /// Take every queued line, oldest first
    pub fn drain(&self) -> Vec<LogEntry> {
        self.entries.lock().drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// `MakeWriter` that feeds formatted tracing output into a [`LogQueue`]
#[derive(Debug, Clone)]
pub struct LogQueueMakeWriter {
    queue: Arc<LogQueue>,
}

impl LogQueueMakeWriter {
    pub fn new(queue: Arc<LogQueue>) -> Self {
        Self { queue }
    }
}

impl<'a> MakeWriter<'a> for LogQueueMakeWriter {
    type Writer = LogQueueWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LogQueueWriter::new(Arc::clone(&self.queue))
    }
}

/// Line-buffering writer; every complete non-empty line becomes a queue entry
#[derive(Debug)]
pub struct LogQueueWriter {
    queue: Arc<LogQueue>,
    buffer: Vec<u8>,
}

impl LogQueueWriter {
    pub fn new(queue: Arc<LogQueue>) -> Self {
        Self {
            queue,
            buffer: Vec::new(),
        }
    }

    fn push_line(&self, bytes: &[u8]) {
        let line = String::from_utf8_lossy(bytes);
        let line = line.trim_end();
        if !line.is_empty() {
            self.queue.push(line);
        }
    }
}

impl Write for LogQueueWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.push_line(&line);
        }

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            let line = std::mem::take(&mut self.buffer);
            self.push_line(&line);
        }
        Ok(())
    }
}

impl Drop for LogQueueWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_drops_oldest_when_full() {
        let queue = LogQueue::new(3);
        for i in 0..5 {
            queue.push(format!("line {}", i));
        }

        assert_eq!(queue.len(), 3);
        let lines: Vec<String> = queue.drain().into_iter().map(|e| e.line).collect();
        assert_eq!(lines, vec!["line 2", "line 3", "line 4"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_pop_is_fifo() {
        let queue = LogQueue::new(10);
        queue.push("first");
        queue.push("second");

        assert_eq!(queue.pop().unwrap().line, "first");
        assert_eq!(queue.pop().unwrap().line, "second");
        assert!(queue.pop().is_none());
    }

    #[test]
    fn test_writer_splits_lines_and_skips_blank() {
        let queue = Arc::new(LogQueue::new(10));
        let mut writer = LogQueueWriter::new(Arc::clone(&queue));

        writer.write_all(b"alpha\n\nbeta").unwrap();
        assert_eq!(queue.len(), 1);

        writer.write_all(b" gamma\n").unwrap();
        let lines: Vec<String> = queue.drain().into_iter().map(|e| e.line).collect();
        assert_eq!(lines, vec!["alpha", "beta gamma"]);
    }

    #[test]
    fn test_writer_flushes_partial_line_on_drop() {
        let queue = Arc::new(LogQueue::new(10));
        {
            let mut writer = LogQueueWriter::new(Arc::clone(&queue));
            writer.write_all(b"no newline").unwrap();
        }
        assert_eq!(queue.pop().unwrap().line, "no newline");
    }

    #[test]
    fn test_tracing_output_reaches_queue() {
        let queue = Arc::new(LogQueue::new(10));
        let subscriber = tracing_subscriber::fmt()
            .with_writer(LogQueueMakeWriter::new(Arc::clone(&queue)))
            .with_ansi(false)
            .with_target(false)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("tunnel heartbeat");
        });

        let entry = queue.pop().unwrap();
        assert!(entry.line.contains("tunnel heartbeat"));
    }
}
