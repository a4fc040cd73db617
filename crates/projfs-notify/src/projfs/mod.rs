//! Native ProjFS bridge.
//!
//! Routes the single ProjFS notification callback to the per-slot
//! [`crate::CallbackTable`] and converts mappings into the structures
//! `PrjStartVirtualizing` expects.

mod notification;
mod wstr;

pub use notification::{
    build_notification_mappings, native_mask, notification_cb, slot_for_notification,
    NativeMappings,
};
