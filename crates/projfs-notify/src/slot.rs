//! Engine callback slots.
//!
//! The engine exposes one assignable slot per category, except the two
//! close-with-change categories which are delivered through one combined
//! slot.

use std::fmt;

use crate::category::{CategorySet, EventCategory};

/// Whether a handler can affect the operation it is notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerShape {
    /// Returns an allow/deny decision.
    Gating,
    /// Observes only (fire-and-forget).
    Audit,
}

/// One assignable callback slot on the engine's registration surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallbackSlot {
    FileOpened,
    NewFileCreated,
    FileOverwritten,
    PreDelete,
    PreRename,
    PreCreateHardlink,
    FileRenamed,
    HardlinkCreated,
    FileHandleClosedNoModification,
    /// Combined slot for `FileHandleClosedModified` and `FileHandleClosedDeleted`.
    FileHandleClosedModifiedOrDeleted,
    FilePreConvertToFull,
}

impl CallbackSlot {
    /// Number of engine slots.
    pub const COUNT: usize = 11;

    /// Every slot in registration order.
    pub const ALL: [CallbackSlot; CallbackSlot::COUNT] = [
        CallbackSlot::FileOpened,
        CallbackSlot::NewFileCreated,
        CallbackSlot::FileOverwritten,
        CallbackSlot::PreDelete,
        CallbackSlot::PreRename,
        CallbackSlot::PreCreateHardlink,
        CallbackSlot::FileRenamed,
        CallbackSlot::HardlinkCreated,
        CallbackSlot::FileHandleClosedNoModification,
        CallbackSlot::FileHandleClosedModifiedOrDeleted,
        CallbackSlot::FilePreConvertToFull,
    ];

    /// Slot that delivers `category`.
    pub fn for_category(category: EventCategory) -> Self {
        match category {
            EventCategory::FileOpened => CallbackSlot::FileOpened,
            EventCategory::NewFileCreated => CallbackSlot::NewFileCreated,
            EventCategory::FileOverwritten => CallbackSlot::FileOverwritten,
            EventCategory::PreDelete => CallbackSlot::PreDelete,
            EventCategory::PreRename => CallbackSlot::PreRename,
            EventCategory::PreCreateHardlink => CallbackSlot::PreCreateHardlink,
            EventCategory::FileRenamed => CallbackSlot::FileRenamed,
            EventCategory::HardlinkCreated => CallbackSlot::HardlinkCreated,
            EventCategory::FileHandleClosedNoModification => {
                CallbackSlot::FileHandleClosedNoModification
            }
            EventCategory::FileHandleClosedModified | EventCategory::FileHandleClosedDeleted => {
                CallbackSlot::FileHandleClosedModifiedOrDeleted
            }
            EventCategory::FilePreConvertToFull => CallbackSlot::FilePreConvertToFull,
        }
    }

    /// Categories whose presence activates this slot.
    pub fn categories(self) -> CategorySet {
        match self {
            CallbackSlot::FileOpened => CategorySet::FILE_OPENED,
            CallbackSlot::NewFileCreated => CategorySet::NEW_FILE_CREATED,
            CallbackSlot::FileOverwritten => CategorySet::FILE_OVERWRITTEN,
            CallbackSlot::PreDelete => CategorySet::PRE_DELETE,
            CallbackSlot::PreRename => CategorySet::PRE_RENAME,
            CallbackSlot::PreCreateHardlink => CategorySet::PRE_CREATE_HARDLINK,
            CallbackSlot::FileRenamed => CategorySet::FILE_RENAMED,
            CallbackSlot::HardlinkCreated => CategorySet::HARDLINK_CREATED,
            CallbackSlot::FileHandleClosedNoModification => {
                CategorySet::FILE_HANDLE_CLOSED_NO_MODIFICATION
            }
            CallbackSlot::FileHandleClosedModifiedOrDeleted => {
                CategorySet::CLOSED_MODIFIED_OR_DELETED
            }
            CallbackSlot::FilePreConvertToFull => CategorySet::FILE_PRE_CONVERT_TO_FULL,
        }
    }

    /// Handler shape for this slot.
    pub fn shape(self) -> HandlerShape {
        match self {
            CallbackSlot::FileOpened
            | CallbackSlot::PreDelete
            | CallbackSlot::PreRename
            | CallbackSlot::PreCreateHardlink
            | CallbackSlot::FilePreConvertToFull => HandlerShape::Gating,
            _ => HandlerShape::Audit,
        }
    }

    /// Whether the engine reads a mask override back from this slot.
    pub fn reports_mask(self) -> bool {
        matches!(
            self,
            CallbackSlot::FileOpened
                | CallbackSlot::NewFileCreated
                | CallbackSlot::FileOverwritten
                | CallbackSlot::FileRenamed
        )
    }

    /// Whether events on this slot carry a destination path.
    pub fn has_destination(self) -> bool {
        matches!(
            self,
            CallbackSlot::PreRename
                | CallbackSlot::PreCreateHardlink
                | CallbackSlot::FileRenamed
                | CallbackSlot::HardlinkCreated
        )
    }

    /// Event name used in log lines and test signals.
    pub fn label(self) -> &'static str {
        match self {
            CallbackSlot::FileOpened => "FileOpened",
            CallbackSlot::NewFileCreated => "NewFileCreated",
            CallbackSlot::FileOverwritten => "FileOverwritten",
            CallbackSlot::PreDelete => "PreDelete",
            CallbackSlot::PreRename => "PreRename",
            CallbackSlot::PreCreateHardlink => "PreCreateHardlink",
            CallbackSlot::FileRenamed => "FileRenamed",
            CallbackSlot::HardlinkCreated => "HardlinkCreated",
            CallbackSlot::FileHandleClosedNoModification => "FileHandleClosedNoModification",
            CallbackSlot::FileHandleClosedModifiedOrDeleted => {
                "FileHandleClosedFileModifiedOrDeleted"
            }
            CallbackSlot::FilePreConvertToFull => "FilePreConvertToFull",
        }
    }

    /// Callback name as it appears at the start of the first log line.
    pub fn callback_name(self) -> &'static str {
        match self {
            CallbackSlot::FileOpened => "NotifyFileOpenedCallback",
            CallbackSlot::NewFileCreated => "NotifyNewFileCreatedCallback",
            CallbackSlot::FileOverwritten => "NotifyFileOverwrittenCallback",
            CallbackSlot::PreDelete => "NotifyPreDeleteCallback",
            CallbackSlot::PreRename => "NotifyPreRenameCallback",
            CallbackSlot::PreCreateHardlink => "NotifyPreCreateHardlinkCallback",
            CallbackSlot::FileRenamed => "NotifyFileRenamedCallback",
            CallbackSlot::HardlinkCreated => "NotifyHardlinkCreatedCallback",
            CallbackSlot::FileHandleClosedNoModification => {
                "NotifyFileHandleClosedNoModificationCallback"
            }
            CallbackSlot::FileHandleClosedModifiedOrDeleted => {
                "NotifyFileHandleClosedFileModifiedOrDeletedCallback"
            }
            CallbackSlot::FilePreConvertToFull => "NotifyFilePreConvertToFullCallback",
        }
    }

    /// Position of this slot in [`CallbackSlot::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for CallbackSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_matches_all_order() {
        for (i, slot) in CallbackSlot::ALL.into_iter().enumerate() {
            assert_eq!(slot.index(), i);
        }
    }

    #[test]
    fn test_close_pair_shares_slot() {
        assert_eq!(
            CallbackSlot::for_category(EventCategory::FileHandleClosedModified),
            CallbackSlot::FileHandleClosedModifiedOrDeleted
        );
        assert_eq!(
            CallbackSlot::for_category(EventCategory::FileHandleClosedDeleted),
            CallbackSlot::FileHandleClosedModifiedOrDeleted
        );
    }

    #[test]
    fn test_slot_categories_cover_every_category_once() {
        let mut seen = CategorySet::empty();
        for slot in CallbackSlot::ALL {
            assert!(!seen.intersects(slot.categories()));
            seen |= slot.categories();
        }
        assert_eq!(seen, CategorySet::all());
    }

    #[test]
    fn test_for_category_agrees_with_categories() {
        for category in EventCategory::ALL {
            assert!(CallbackSlot::for_category(category)
                .categories()
                .has(category));
        }
    }

    #[test]
    fn test_shapes() {
        let gating: Vec<CallbackSlot> = CallbackSlot::ALL
            .into_iter()
            .filter(|s| s.shape() == HandlerShape::Gating)
            .collect();
        assert_eq!(
            gating,
            vec![
                CallbackSlot::FileOpened,
                CallbackSlot::PreDelete,
                CallbackSlot::PreRename,
                CallbackSlot::PreCreateHardlink,
                CallbackSlot::FilePreConvertToFull,
            ]
        );
    }

    #[test]
    fn test_callback_name_wraps_label() {
        for slot in CallbackSlot::ALL {
            assert_eq!(slot.callback_name(), format!("Notify{}Callback", slot.label()));
        }
    }
}
