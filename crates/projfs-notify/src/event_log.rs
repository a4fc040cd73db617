//! Diagnostic records emitted by notification handlers.
//!
//! Every delivered event produces one record. A record renders to the
//! human-readable lines below; sinks decide where they go.
//!
//! ```text
//! NotifyPreRenameCallback [a/b.txt] [a/c.txt]
//!   Notification triggered by [explorer.exe 4242]
//! ```

use parking_lot::Mutex;

use crate::context::EventContext;
use crate::error::NotifyError;
use crate::slot::CallbackSlot;

/// Tracing target for event lines.
pub const EVENT_TARGET: &str = "projfs_notify::events";

/// One diagnostic record for a delivered event.
#[derive(Debug, Clone, Copy)]
pub struct EventRecord<'a> {
    /// Slot the event was delivered on.
    pub slot: CallbackSlot,
    /// Event data.
    pub event: &'a EventContext<'a>,
}

impl<'a> EventRecord<'a> {
    /// Create a record for `event` delivered on `slot`.
    pub fn new(slot: CallbackSlot, event: &'a EventContext<'a>) -> Self {
        Self { slot, event }
    }

    /// Line naming the callback and the affected path(s).
    pub fn path_line(&self) -> String {
        if self.slot.has_destination() {
            format!(
                "{} [{}] [{}]",
                self.slot.callback_name(),
                self.event.relative_path,
                self.event.destination_path.unwrap_or_default()
            )
        } else {
            format!(
                "{} [{}]",
                self.slot.callback_name(),
                self.event.relative_path
            )
        }
    }

    /// Line with the modified/deleted pair, for the combined close slot only.
    pub fn close_line(&self) -> Option<String> {
        (self.slot == CallbackSlot::FileHandleClosedModifiedOrDeleted).then(|| {
            format!(
                "  Modified: {}, Deleted: {}",
                self.event.file_modified, self.event.file_deleted
            )
        })
    }

    /// Line identifying the triggering process.
    pub fn process_line(&self) -> String {
        format!(
            "  Notification triggered by [{} {}]",
            self.event.triggering_process_image, self.event.triggering_process_id
        )
    }

    /// All lines of the record, in output order.
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = Vec::with_capacity(3);
        lines.push(self.path_line());
        lines.extend(self.close_line());
        lines.push(self.process_line());
        lines
    }
}

/// Destination for event records.
///
/// Called concurrently from engine threads; implementations must be
/// thread-safe and must not block.
pub trait EventSink: Send + Sync {
    /// Record one event.
    fn record(&self, record: &EventRecord<'_>) -> Result<(), NotifyError>;
}

/// Sink writing event lines through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, record: &EventRecord<'_>) -> Result<(), NotifyError> {
        let slot: &'static str = record.slot.label();
        let path: &str = record.event.relative_path;
        let pid: u32 = record.event.triggering_process_id;

        for line in record.lines() {
            tracing::info!(target: EVENT_TARGET, slot, path, pid, "{}", line);
        }
        Ok(())
    }
}

/// Event captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedEvent {
    /// Slot the event was delivered on.
    pub slot: CallbackSlot,
    /// Rendered lines.
    pub lines: Vec<String>,
}

/// Sink keeping rendered records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<CapturedEvent>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of captured events in arrival order.
    pub fn events(&self) -> Vec<CapturedEvent> {
        self.events.lock().clone()
    }

    /// All captured lines, flattened.
    pub fn lines(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .flat_map(|e| e.lines.iter().cloned())
            .collect()
    }

    /// Number of captured events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no events were captured.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn record(&self, record: &EventRecord<'_>) -> Result<(), NotifyError> {
        self.events.lock().push(CapturedEvent {
            slot: record.slot,
            lines: record.lines(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_path_lines() {
        let event = EventContext::new("a/b.txt", 123, "proc.exe");
        let record = EventRecord::new(CallbackSlot::FileOpened, &event);

        assert_eq!(
            record.lines(),
            vec![
                "NotifyFileOpenedCallback [a/b.txt]".to_string(),
                "  Notification triggered by [proc.exe 123]".to_string(),
            ]
        );
    }

    #[test]
    fn test_destination_lines() {
        let event = EventContext::new("a", 7, "mv.exe").with_destination("b");
        let record = EventRecord::new(CallbackSlot::PreRename, &event);

        assert_eq!(record.path_line(), "NotifyPreRenameCallback [a] [b]");
        assert!(record.close_line().is_none());
    }

    #[test]
    fn test_close_lines() {
        let event = EventContext::new("doc.txt", 9, "word.exe").with_close_flags(true, false);
        let record = EventRecord::new(CallbackSlot::FileHandleClosedModifiedOrDeleted, &event);

        let lines: Vec<String> = record.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "NotifyFileHandleClosedFileModifiedOrDeletedCallback [doc.txt]"
        );
        assert_eq!(lines[1], "  Modified: true, Deleted: false");
        assert_eq!(lines[2], "  Notification triggered by [word.exe 9]");
    }

    #[test]
    fn test_memory_sink_captures() {
        let sink = MemorySink::new();
        let event = EventContext::new("x", 1, "p.exe");
        sink.record(&EventRecord::new(CallbackSlot::PreDelete, &event))
            .unwrap();

        assert_eq!(sink.len(), 1);
        assert_eq!(sink.events()[0].slot, CallbackSlot::PreDelete);
        assert_eq!(sink.lines()[0], "NotifyPreDeleteCallback [x]");
    }

    #[test]
    fn test_tracing_sink_never_fails() {
        let event = EventContext::new("x", 1, "p.exe");
        let record = EventRecord::new(CallbackSlot::HardlinkCreated, &event);
        assert!(TracingSink.record(&record).is_ok());
    }
}
