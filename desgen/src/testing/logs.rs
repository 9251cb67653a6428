//! Captures `tracing` output for assertions.

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::fmt::MakeWriter;

/// In-memory sink for JSON-formatted log lines.
///
/// Attach it to a future with `tracing::instrument::WithSubscriber`, then
/// inspect the recorded events.
#[derive(Debug, Clone, Default)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Creates an empty capture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a subscriber writing every event as JSON into this capture.
    #[must_use]
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(Level::TRACE)
            .with_ansi(false)
            .json()
            .finish()
    }

    /// Returns the `fields` object of every event whose message is `message`.
    #[must_use]
    pub fn events_with_message(&self, message: &str) -> Vec<serde_json::Value> {
        let raw = String::from_utf8_lossy(&self.buf.lock()).into_owned();
        raw.lines()
            .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
            .filter_map(|event| event.get("fields").cloned())
            .filter(|fields| fields["message"] == message)
            .collect()
    }
}

/// Writer handed out per event by [`CapturedLogs`].
#[derive(Debug)]
pub struct CapturedWriter {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CapturedWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.lock().extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CapturedWriter {
            buf: Arc::clone(&self.buf),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::instrument::WithSubscriber;

    #[tokio::test]
    async fn test_captures_structured_fields() {
        let logs = CapturedLogs::new();
        async {
            tracing::info!(stage = "strategy", attempt = 2_u32, "Stage completed");
            tracing::debug!("unrelated");
        }
        .with_subscriber(logs.subscriber())
        .await;

        let events = logs.events_with_message("Stage completed");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0]["stage"], "strategy");
        assert_eq!(events[0]["attempt"], 2);
    }
}
