//! Notification dispatch for ProjFS virtualization providers.
//!
//! Decides, from a provider's notification mappings, which event
//! categories the virtualization engine must report, registers a handler
//! for exactly those, and implements the handler contract: one log record
//! per event, allow/deny for pre-operation events, and an optional test
//! signal per delivered event.
//!
//! # Architecture
//!
//! ```text
//! Engine (ProjFS)  ──► CallbackTable (one slot per category, fault guard)
//!                          │
//!                          ▼
//!                  ReferenceHandler ──► EventSink (tracing)
//!                          │         ──► DecisionPolicy (gating slots)
//!                          ▼
//!                  ProviderSignal (TestSignal in test mode)
//!
//! NotificationDispatcher: mappings ─► NotificationRegistry ─► active slots
//! ```
//!
//! The core is platform independent. The `projfs` module, available on
//! Windows only, routes the native ProjFS notification callback into a
//! [`CallbackTable`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use projfs_notify::{
//!     CallbackTable, EventCategory, NotificationDispatcher, NotificationMapping, TestSignal,
//! };
//!
//! let signal = Arc::new(TestSignal::new(true));
//! let mut table = CallbackTable::new();
//! let mappings = [NotificationMapping::with_categories(
//!     "",
//!     [EventCategory::FileOpened, EventCategory::PreDelete],
//! )];
//!
//! let _dispatcher = NotificationDispatcher::new(signal.clone(), true, &mut table, &mappings);
//!
//! let (allowed, _mask) = table.notify_file_opened("a/b.txt", false, 123, "proc.exe").unwrap();
//! assert!(allowed);
//! assert!(signal.wait_for("FileOpened", Duration::from_secs(1)));
//! ```

mod category;
mod context;
mod dispatcher;
mod engine;
mod error;
mod event_log;
mod handler;
mod mapping;
mod options;
mod policy;
mod registry;
mod signal;
mod slot;
mod stats;

#[cfg(target_os = "windows")]
pub mod projfs;

pub use category::{CategorySet, EventCategory, MaskOverride};
pub use context::EventContext;
pub use dispatcher::NotificationDispatcher;
pub use engine::CallbackTable;
pub use error::NotifyError;
pub use event_log::{CapturedEvent, EventRecord, EventSink, MemorySink, TracingSink, EVENT_TARGET};
pub use handler::{deliver, Delivery, HandlerResult, NotificationHandler, ReferenceHandler};
pub use mapping::NotificationMapping;
pub use options::NotifyOptions;
pub use policy::{AllowAll, Decision, DecisionPolicy};
pub use registry::{active_categories, NotificationRegistry, RegistrationSurface};
pub use signal::{ProviderSignal, TestSignal};
pub use slot::{CallbackSlot, HandlerShape};
pub use stats::{DeliveryStats, DeliveryStatsSnapshot, SlotStats};
