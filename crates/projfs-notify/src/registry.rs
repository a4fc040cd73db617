//! Active category computation and selective slot registration.

use std::sync::Arc;

use crate::category::CategorySet;
use crate::handler::NotificationHandler;
use crate::mapping::NotificationMapping;
use crate::slot::CallbackSlot;

/// Engine side of registration: one assignable callback per slot.
pub trait RegistrationSurface {
    /// Assign `handler` to `slot`.
    fn assign(&mut self, slot: CallbackSlot, handler: Arc<dyn NotificationHandler>);
}

/// Union of every mapping's categories.
///
/// # Arguments
/// * `mappings` - Mappings in any order
///
/// # Returns
/// Active category set (empty for no mappings).
pub fn active_categories(mappings: &[NotificationMapping]) -> CategorySet {
    mappings
        .iter()
        .fold(CategorySet::empty(), |acc, m| acc | m.categories)
}

/// Mapping set reduced to the slots the engine must call.
///
/// Computed once per provider session and immutable afterwards.
#[derive(Debug, Clone)]
pub struct NotificationRegistry {
    mappings: Vec<NotificationMapping>,
    active: CategorySet,
    test_mode: bool,
}

impl NotificationRegistry {
    /// Build a registry.
    ///
    /// # Arguments
    /// * `mappings` - Notification mappings supplied by the provider
    /// * `test_mode` - Forwarded to every handler; does not affect registration
    pub fn new(mappings: &[NotificationMapping], test_mode: bool) -> Self {
        Self {
            mappings: mappings.to_vec(),
            active: active_categories(mappings),
            test_mode,
        }
    }

    /// Union of all mapping categories.
    pub fn active_categories(&self) -> CategorySet {
        self.active
    }

    /// Mappings the registry was built from.
    pub fn mappings(&self) -> &[NotificationMapping] {
        &self.mappings
    }

    /// Test mode handed to handlers.
    pub fn test_mode(&self) -> bool {
        self.test_mode
    }

    /// Whether the engine must call `slot`.
    ///
    /// The combined close slot is active if either close category is.
    pub fn is_slot_active(&self, slot: CallbackSlot) -> bool {
        self.active.intersects(slot.categories())
    }

    /// Active slots in registration order.
    pub fn active_slots(&self) -> Vec<CallbackSlot> {
        CallbackSlot::ALL
            .into_iter()
            .filter(|slot| self.is_slot_active(*slot))
            .collect()
    }

    /// Assign a handler to every active slot; inactive slots stay untouched.
    ///
    /// # Arguments
    /// * `surface` - Engine registration surface
    /// * `make_handler` - Builds the handler for a slot, given the test mode
    ///
    /// # Returns
    /// Slots that were assigned.
    pub fn register<F>(
        &self,
        surface: &mut dyn RegistrationSurface,
        mut make_handler: F,
    ) -> Vec<CallbackSlot>
    where
        F: FnMut(CallbackSlot, bool) -> Arc<dyn NotificationHandler>,
    {
        let slots: Vec<CallbackSlot> = self.active_slots();

        for slot in &slots {
            surface.assign(*slot, make_handler(*slot, self.test_mode));
        }

        tracing::debug!(
            "Registered {} notification callbacks for categories {:?}",
            slots.len(),
            self.active
        );

        slots
    }
}
