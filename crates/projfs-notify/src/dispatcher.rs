//! Provider-session construction of notification handlers.

use std::sync::Arc;

use crate::category::CategorySet;
use crate::event_log::{EventSink, TracingSink};
use crate::handler::{NotificationHandler, ReferenceHandler};
use crate::mapping::NotificationMapping;
use crate::options::NotifyOptions;
use crate::policy::{AllowAll, DecisionPolicy};
use crate::registry::{NotificationRegistry, RegistrationSurface};
use crate::signal::ProviderSignal;
use crate::slot::CallbackSlot;

/// Notification side of one provider session.
///
/// Registers a handler for every active slot at construction. Dropping the
/// dispatcher ends the session and releases test-signal waiters.
pub struct NotificationDispatcher {
    registry: NotificationRegistry,
    registered: Vec<CallbackSlot>,
    provider: Arc<dyn ProviderSignal>,
}

impl NotificationDispatcher {
    /// Build the registry and register reference handlers with `engine`.
    ///
    /// # Arguments
    /// * `provider` - Provider receiving test signals
    /// * `test_mode` - Whether handlers raise test signals
    /// * `engine` - Engine registration surface
    /// * `mappings` - Notification mappings
    pub fn new(
        provider: Arc<dyn ProviderSignal>,
        test_mode: bool,
        engine: &mut dyn RegistrationSurface,
        mappings: &[NotificationMapping],
    ) -> Self {
        Self::with_parts(
            provider,
            test_mode,
            engine,
            mappings,
            Arc::new(TracingSink),
            Arc::new(AllowAll),
        )
    }

    /// Like [`NotificationDispatcher::new`] with a custom sink and policy.
    ///
    /// # Arguments
    /// * `provider` - Provider receiving test signals
    /// * `test_mode` - Whether handlers raise test signals
    /// * `engine` - Engine registration surface
    /// * `mappings` - Notification mappings
    /// * `sink` - Event record destination
    /// * `policy` - Decision policy for gating slots
    pub fn with_parts(
        provider: Arc<dyn ProviderSignal>,
        test_mode: bool,
        engine: &mut dyn RegistrationSurface,
        mappings: &[NotificationMapping],
        sink: Arc<dyn EventSink>,
        policy: Arc<dyn DecisionPolicy>,
    ) -> Self {
        let registry = NotificationRegistry::new(mappings, test_mode);

        let registered: Vec<CallbackSlot> =
            registry.register(engine, |slot: CallbackSlot, test_mode: bool| {
                let handler: Arc<dyn NotificationHandler> = Arc::new(ReferenceHandler::new(
                    slot,
                    test_mode,
                    provider.clone(),
                    sink.clone(),
                    policy.clone(),
                ));
                handler
            });

        tracing::info!(
            "Notification dispatch ready: {} callbacks registered (test mode: {})",
            registered.len(),
            test_mode
        );

        Self {
            registry,
            registered,
            provider,
        }
    }

    /// Build from options.
    ///
    /// # Arguments
    /// * `options` - Dispatch options
    /// * `provider` - Provider receiving test signals
    /// * `engine` - Engine registration surface
    pub fn from_options(
        options: &NotifyOptions,
        provider: Arc<dyn ProviderSignal>,
        engine: &mut dyn RegistrationSurface,
    ) -> Self {
        Self::new(provider, options.test_mode, engine, &options.mappings)
    }

    /// Union of all mapping categories.
    pub fn active_categories(&self) -> CategorySet {
        self.registry.active_categories()
    }

    /// Slots registered at construction.
    pub fn registered_slots(&self) -> &[CallbackSlot] {
        &self.registered
    }

    /// Whether handlers raise test signals.
    pub fn test_mode(&self) -> bool {
        self.registry.test_mode()
    }

    /// Registry the session was built from.
    pub fn registry(&self) -> &NotificationRegistry {
        &self.registry
    }
}

impl Drop for NotificationDispatcher {
    fn drop(&mut self) {
        self.provider.release_waiters();
    }
}
