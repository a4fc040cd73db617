//! Notification handlers and the engine-boundary fault guard.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crate::category::MaskOverride;
use crate::context::EventContext;
use crate::error::NotifyError;
use crate::event_log::{EventRecord, EventSink};
use crate::policy::{Decision, DecisionPolicy};
use crate::signal::ProviderSignal;
use crate::slot::{CallbackSlot, HandlerShape};

/// Result a handler reports back to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandlerResult {
    /// Decision for gating slots, `None` for audit slots.
    pub decision: Option<Decision>,
    /// Requested change to the path's notification categories.
    pub mask_override: MaskOverride,
}

impl HandlerResult {
    /// Result of a gating handler.
    pub fn gate(decision: Decision) -> Self {
        Self {
            decision: Some(decision),
            mask_override: MaskOverride::KeepExisting,
        }
    }

    /// Result of an audit handler.
    pub fn audit() -> Self {
        Self {
            decision: None,
            mask_override: MaskOverride::KeepExisting,
        }
    }

    /// Safe default for `slot`: allow for gating slots, plain completion otherwise.
    pub fn fallback(slot: CallbackSlot) -> Self {
        match slot.shape() {
            HandlerShape::Gating => Self::gate(Decision::Allow),
            HandlerShape::Audit => Self::audit(),
        }
    }

    /// Whether the operation may proceed. Audit results always allow.
    pub fn allowed(&self) -> bool {
        self.decision.map_or(true, Decision::is_allowed)
    }
}

/// Per-slot notification handler.
///
/// Invoked concurrently from engine threads. Implementations must not
/// block and must not keep state between calls.
pub trait NotificationHandler: Send + Sync {
    /// Slot this handler serves.
    fn slot(&self) -> CallbackSlot;

    /// Process one event.
    fn handle(&self, event: &EventContext<'_>) -> Result<HandlerResult, NotifyError>;
}

/// Outcome of one delivery across the engine boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delivery {
    /// Result handed back to the engine.
    pub result: HandlerResult,
    /// Whether a fault was contained and the fallback used.
    pub contained_fault: bool,
}

/// Invoke `handler`, containing any error or panic.
///
/// On fault the error is logged and [`HandlerResult::fallback`] returned.
pub fn deliver(handler: &dyn NotificationHandler, event: &EventContext<'_>) -> Delivery {
    let slot: CallbackSlot = handler.slot();

    let outcome: Result<HandlerResult, NotifyError> =
        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(event))) {
            Ok(result) => result,
            Err(_) => Err(NotifyError::HandlerPanicked(slot.callback_name())),
        };

    match outcome {
        Ok(result) => Delivery {
            result,
            contained_fault: false,
        },
        Err(e) => {
            tracing::error!(
                "{} failed for [{}]: {}; using default",
                slot.callback_name(),
                event.relative_path,
                e
            );
            Delivery {
                result: HandlerResult::fallback(slot),
                contained_fault: true,
            }
        }
    }
}

/// Handler implementing the reference contract.
///
/// Logs the event, raises the slot's test signal in test mode, and
/// consults the decision policy for gating slots. The mask override is
/// always [`MaskOverride::KeepExisting`].
pub struct ReferenceHandler {
    slot: CallbackSlot,
    test_mode: bool,
    provider: Arc<dyn ProviderSignal>,
    sink: Arc<dyn EventSink>,
    policy: Arc<dyn DecisionPolicy>,
}

impl ReferenceHandler {
    /// Create a handler.
    ///
    /// # Arguments
    /// * `slot` - Slot served
    /// * `test_mode` - Whether to raise test signals
    /// * `provider` - Provider receiving test signals
    /// * `sink` - Event record destination
    /// * `policy` - Decision policy for gating slots
    pub fn new(
        slot: CallbackSlot,
        test_mode: bool,
        provider: Arc<dyn ProviderSignal>,
        sink: Arc<dyn EventSink>,
        policy: Arc<dyn DecisionPolicy>,
    ) -> Self {
        Self {
            slot,
            test_mode,
            provider,
            sink,
            policy,
        }
    }

    /// Whether this handler raises test signals.
    pub fn test_mode(&self) -> bool {
        self.test_mode
    }
}

impl NotificationHandler for ReferenceHandler {
    fn slot(&self) -> CallbackSlot {
        self.slot
    }

    fn handle(&self, event: &EventContext<'_>) -> Result<HandlerResult, NotifyError> {
        self.sink.record(&EventRecord::new(self.slot, event))?;

        if self.test_mode {
            self.provider.signal_if_test_mode(self.slot.label());
        }

        match self.slot.shape() {
            HandlerShape::Gating => {
                let decision: Decision = self.policy.decide(self.slot, event)?;
                Ok(HandlerResult::gate(decision))
            }
            HandlerShape::Audit => Ok(HandlerResult::audit()),
        }
    }
}
