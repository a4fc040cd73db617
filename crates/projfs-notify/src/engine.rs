//! In-process callback table standing in for the engine's slot surface.
//!
//! The table holds at most one handler per [`CallbackSlot`]. Unassigned
//! slots are never invoked, mirroring an engine that skips the provider
//! for categories it did not register. The typed `notify_*` entry points
//! carry the engine's per-category call signatures.

use std::sync::Arc;

use crate::category::MaskOverride;
use crate::context::EventContext;
use crate::handler::{deliver, Delivery, HandlerResult, NotificationHandler};
use crate::registry::RegistrationSurface;
use crate::slot::CallbackSlot;
use crate::stats::{DeliveryStats, DeliveryStatsSnapshot};

/// Slot table with fault-contained invocation.
pub struct CallbackTable {
    slots: [Option<Arc<dyn NotificationHandler>>; CallbackSlot::COUNT],
    stats: DeliveryStats,
}

impl CallbackTable {
    /// Create a table with every slot empty.
    pub fn new() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
            stats: DeliveryStats::new(),
        }
    }

    /// Whether `slot` has a handler.
    pub fn is_registered(&self, slot: CallbackSlot) -> bool {
        self.slots[slot.index()].is_some()
    }

    /// Slots with a handler, in slot order.
    pub fn registered_slots(&self) -> Vec<CallbackSlot> {
        CallbackSlot::ALL
            .into_iter()
            .filter(|slot| self.is_registered(*slot))
            .collect()
    }

    /// Deliver `event` to the handler on `slot`.
    ///
    /// # Returns
    /// `None` if the slot has no handler, otherwise the handler's result
    /// (or the slot's fallback if the handler faulted).
    pub fn invoke(&self, slot: CallbackSlot, event: &EventContext<'_>) -> Option<HandlerResult> {
        let handler: &Arc<dyn NotificationHandler> = self.slots[slot.index()].as_ref()?;
        let delivery: Delivery = deliver(handler.as_ref(), event);
        self.stats.record(slot, delivery.contained_fault);
        Some(delivery.result)
    }

    /// Snapshot of delivery counters.
    pub fn stats(&self) -> DeliveryStatsSnapshot {
        self.stats.snapshot()
    }

    /// File opened. Gating, reports a mask override.
    pub fn notify_file_opened(
        &self,
        relative_path: &str,
        is_directory: bool,
        triggering_process_id: u32,
        triggering_process_image: &str,
    ) -> Option<(bool, MaskOverride)> {
        let event =
            EventContext::new(relative_path, triggering_process_id, triggering_process_image)
                .directory(is_directory);
        self.invoke(CallbackSlot::FileOpened, &event)
            .map(|r| (r.allowed(), r.mask_override))
    }

    /// New file created. Audit, reports a mask override.
    pub fn notify_new_file_created(
        &self,
        relative_path: &str,
        is_directory: bool,
        triggering_process_id: u32,
        triggering_process_image: &str,
    ) -> Option<MaskOverride> {
        let event =
            EventContext::new(relative_path, triggering_process_id, triggering_process_image)
                .directory(is_directory);
        self.invoke(CallbackSlot::NewFileCreated, &event)
            .map(|r| r.mask_override)
    }

    /// File overwritten. Audit, reports a mask override.
    pub fn notify_file_overwritten(
        &self,
        relative_path: &str,
        is_directory: bool,
        triggering_process_id: u32,
        triggering_process_image: &str,
    ) -> Option<MaskOverride> {
        let event =
            EventContext::new(relative_path, triggering_process_id, triggering_process_image)
                .directory(is_directory);
        self.invoke(CallbackSlot::FileOverwritten, &event)
            .map(|r| r.mask_override)
    }

    /// About to delete. Gating.
    pub fn notify_pre_delete(
        &self,
        relative_path: &str,
        is_directory: bool,
        triggering_process_id: u32,
        triggering_process_image: &str,
    ) -> Option<bool> {
        let event =
            EventContext::new(relative_path, triggering_process_id, triggering_process_image)
                .directory(is_directory);
        self.invoke(CallbackSlot::PreDelete, &event)
            .map(|r| r.allowed())
    }

    /// About to rename. Gating.
    pub fn notify_pre_rename(
        &self,
        relative_path: &str,
        destination_path: &str,
        triggering_process_id: u32,
        triggering_process_image: &str,
    ) -> Option<bool> {
        let event =
            EventContext::new(relative_path, triggering_process_id, triggering_process_image)
                .with_destination(destination_path);
        self.invoke(CallbackSlot::PreRename, &event)
            .map(|r| r.allowed())
    }

    /// About to create a hard link. Gating.
    pub fn notify_pre_create_hardlink(
        &self,
        relative_path: &str,
        destination_path: &str,
        triggering_process_id: u32,
        triggering_process_image: &str,
    ) -> Option<bool> {
        let event =
            EventContext::new(relative_path, triggering_process_id, triggering_process_image)
                .with_destination(destination_path);
        self.invoke(CallbackSlot::PreCreateHardlink, &event)
            .map(|r| r.allowed())
    }

    /// Renamed. Audit, reports a mask override.
    pub fn notify_file_renamed(
        &self,
        relative_path: &str,
        destination_path: &str,
        is_directory: bool,
        triggering_process_id: u32,
        triggering_process_image: &str,
    ) -> Option<MaskOverride> {
        let event =
            EventContext::new(relative_path, triggering_process_id, triggering_process_image)
                .with_destination(destination_path)
                .directory(is_directory);
        self.invoke(CallbackSlot::FileRenamed, &event)
            .map(|r| r.mask_override)
    }

    /// Hard link created. Audit.
    ///
    /// # Returns
    /// Whether a handler was invoked.
    pub fn notify_hardlink_created(
        &self,
        relative_path: &str,
        destination_path: &str,
        triggering_process_id: u32,
        triggering_process_image: &str,
    ) -> bool {
        let event =
            EventContext::new(relative_path, triggering_process_id, triggering_process_image)
                .with_destination(destination_path);
        self.invoke(CallbackSlot::HardlinkCreated, &event).is_some()
    }

    /// Handle closed without modification. Audit.
    ///
    /// # Returns
    /// Whether a handler was invoked.
    pub fn notify_file_handle_closed_no_modification(
        &self,
        relative_path: &str,
        is_directory: bool,
        triggering_process_id: u32,
        triggering_process_image: &str,
    ) -> bool {
        let event =
            EventContext::new(relative_path, triggering_process_id, triggering_process_image)
                .directory(is_directory);
        self.invoke(CallbackSlot::FileHandleClosedNoModification, &event)
            .is_some()
    }

    /// Handle closed after modification or deletion. Audit.
    ///
    /// # Returns
    /// Whether a handler was invoked.
    pub fn notify_file_handle_closed_modified_or_deleted(
        &self,
        relative_path: &str,
        is_directory: bool,
        is_file_modified: bool,
        is_file_deleted: bool,
        triggering_process_id: u32,
        triggering_process_image: &str,
    ) -> bool {
        let event =
            EventContext::new(relative_path, triggering_process_id, triggering_process_image)
                .directory(is_directory)
                .with_close_flags(is_file_modified, is_file_deleted);
        self.invoke(CallbackSlot::FileHandleClosedModifiedOrDeleted, &event)
            .is_some()
    }

    /// Placeholder about to be converted to a full file. Gating.
    pub fn notify_file_pre_convert_to_full(
        &self,
        relative_path: &str,
        triggering_process_id: u32,
        triggering_process_image: &str,
    ) -> Option<bool> {
        let event =
            EventContext::new(relative_path, triggering_process_id, triggering_process_image);
        self.invoke(CallbackSlot::FilePreConvertToFull, &event)
            .map(|r| r.allowed())
    }
}

impl Default for CallbackTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistrationSurface for CallbackTable {
    fn assign(&mut self, slot: CallbackSlot, handler: Arc<dyn NotificationHandler>) {
        if self.slots[slot.index()].replace(handler).is_some() {
            tracing::warn!("Callback slot {} reassigned", slot);
        }
    }
}
