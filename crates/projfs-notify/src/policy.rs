//! Allow/deny policy for gating callbacks.

use crate::context::EventContext;
use crate::error::NotifyError;
use crate::slot::CallbackSlot;

/// Outcome of a gating callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Decision {
    /// Let the operation proceed.
    #[default]
    Allow,
    /// Fail the operation.
    Deny,
}

impl Decision {
    /// Boolean form the engine expects (allow = true).
    pub fn is_allowed(self) -> bool {
        self == Decision::Allow
    }
}

impl From<bool> for Decision {
    fn from(allow: bool) -> Self {
        if allow {
            Decision::Allow
        } else {
            Decision::Deny
        }
    }
}

/// Decides gating callbacks.
///
/// Consulted only for [`crate::slot::HandlerShape::Gating`] slots.
pub trait DecisionPolicy: Send + Sync {
    /// Decide whether the operation described by `event` may proceed.
    fn decide(
        &self,
        slot: CallbackSlot,
        event: &EventContext<'_>,
    ) -> Result<Decision, NotifyError>;
}

/// Policy allowing every operation.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl DecisionPolicy for AllowAll {
    fn decide(
        &self,
        _slot: CallbackSlot,
        _event: &EventContext<'_>,
    ) -> Result<Decision, NotifyError> {
        Ok(Decision::Allow)
    }
}
