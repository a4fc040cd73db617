//! Notification categories, category sets and mask overrides.
//!
//! `CategorySet` bit positions follow the ProjFS `PRJ_NOTIFY_TYPES` values,
//! so the native adapter converts a set with a single `bits()` call.

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::NotifyError;

/// A kind of filesystem notification the virtualization engine can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventCategory {
    /// A handle was opened on a file or directory.
    FileOpened,
    /// A new file or directory was created.
    NewFileCreated,
    /// An existing file was superseded or overwritten.
    FileOverwritten,
    /// A file or directory is about to be deleted (can veto).
    PreDelete,
    /// A file or directory is about to be renamed (can veto).
    PreRename,
    /// A hard link is about to be created (can veto).
    PreCreateHardlink,
    /// A file or directory was renamed.
    FileRenamed,
    /// A hard link was created.
    HardlinkCreated,
    /// A handle was closed without modification.
    FileHandleClosedNoModification,
    /// A handle was closed and the file had been modified.
    FileHandleClosedModified,
    /// A handle was closed and the file was deleted.
    FileHandleClosedDeleted,
    /// A placeholder is about to be converted to a full file (can veto).
    FilePreConvertToFull,
}

impl EventCategory {
    /// Every registrable category, in ProjFS bit order.
    pub const ALL: [EventCategory; 12] = [
        EventCategory::FileOpened,
        EventCategory::NewFileCreated,
        EventCategory::FileOverwritten,
        EventCategory::PreDelete,
        EventCategory::PreRename,
        EventCategory::PreCreateHardlink,
        EventCategory::FileRenamed,
        EventCategory::HardlinkCreated,
        EventCategory::FileHandleClosedNoModification,
        EventCategory::FileHandleClosedModified,
        EventCategory::FileHandleClosedDeleted,
        EventCategory::FilePreConvertToFull,
    ];

    /// Category name as used in configuration.
    pub fn name(self) -> &'static str {
        match self {
            EventCategory::FileOpened => "FileOpened",
            EventCategory::NewFileCreated => "NewFileCreated",
            EventCategory::FileOverwritten => "FileOverwritten",
            EventCategory::PreDelete => "PreDelete",
            EventCategory::PreRename => "PreRename",
            EventCategory::PreCreateHardlink => "PreCreateHardlink",
            EventCategory::FileRenamed => "FileRenamed",
            EventCategory::HardlinkCreated => "HardlinkCreated",
            EventCategory::FileHandleClosedNoModification => "FileHandleClosedNoModification",
            EventCategory::FileHandleClosedModified => "FileHandleClosedModified",
            EventCategory::FileHandleClosedDeleted => "FileHandleClosedDeleted",
            EventCategory::FilePreConvertToFull => "FilePreConvertToFull",
        }
    }

    /// Single-member set containing this category.
    pub fn as_set(self) -> CategorySet {
        match self {
            EventCategory::FileOpened => CategorySet::FILE_OPENED,
            EventCategory::NewFileCreated => CategorySet::NEW_FILE_CREATED,
            EventCategory::FileOverwritten => CategorySet::FILE_OVERWRITTEN,
            EventCategory::PreDelete => CategorySet::PRE_DELETE,
            EventCategory::PreRename => CategorySet::PRE_RENAME,
            EventCategory::PreCreateHardlink => CategorySet::PRE_CREATE_HARDLINK,
            EventCategory::FileRenamed => CategorySet::FILE_RENAMED,
            EventCategory::HardlinkCreated => CategorySet::HARDLINK_CREATED,
            EventCategory::FileHandleClosedNoModification => {
                CategorySet::FILE_HANDLE_CLOSED_NO_MODIFICATION
            }
            EventCategory::FileHandleClosedModified => CategorySet::FILE_HANDLE_CLOSED_MODIFIED,
            EventCategory::FileHandleClosedDeleted => CategorySet::FILE_HANDLE_CLOSED_DELETED,
            EventCategory::FilePreConvertToFull => CategorySet::FILE_PRE_CONVERT_TO_FULL,
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventCategory {
    type Err = NotifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventCategory::ALL
            .into_iter()
            .find(|c| c.name() == s)
            .ok_or_else(|| NotifyError::UnknownCategory(s.to_string()))
    }
}

bitflags! {
    /// Set of notification categories.
    ///
    /// The empty set doubles as the "no notifications" result value.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CategorySet: u32 {
        const FILE_OPENED = 0x0000_0002;
        const NEW_FILE_CREATED = 0x0000_0004;
        const FILE_OVERWRITTEN = 0x0000_0008;
        const PRE_DELETE = 0x0000_0010;
        const PRE_RENAME = 0x0000_0020;
        const PRE_CREATE_HARDLINK = 0x0000_0040;
        const FILE_RENAMED = 0x0000_0080;
        const HARDLINK_CREATED = 0x0000_0100;
        const FILE_HANDLE_CLOSED_NO_MODIFICATION = 0x0000_0200;
        const FILE_HANDLE_CLOSED_MODIFIED = 0x0000_0400;
        const FILE_HANDLE_CLOSED_DELETED = 0x0000_0800;
        const FILE_PRE_CONVERT_TO_FULL = 0x0000_1000;
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        CategorySet::empty()
    }
}

impl CategorySet {
    /// Both close-with-change categories, which share one engine slot.
    pub const CLOSED_MODIFIED_OR_DELETED: CategorySet = CategorySet::FILE_HANDLE_CLOSED_MODIFIED
        .union(CategorySet::FILE_HANDLE_CLOSED_DELETED);

    /// Check whether `category` is a member.
    pub fn has(self, category: EventCategory) -> bool {
        self.contains(category.as_set())
    }

    /// Add `category` to the set.
    pub fn add(&mut self, category: EventCategory) {
        self.insert(category.as_set());
    }

    /// Iterate members in ProjFS bit order.
    pub fn categories(self) -> impl Iterator<Item = EventCategory> {
        EventCategory::ALL
            .into_iter()
            .filter(move |c| self.has(*c))
    }

    /// Categories a writable provider tracks to detect local changes.
    pub fn for_writable() -> Self {
        CategorySet::NEW_FILE_CREATED
            | CategorySet::FILE_RENAMED
            | CategorySet::CLOSED_MODIFIED_OR_DELETED
    }
}

impl From<EventCategory> for CategorySet {
    fn from(category: EventCategory) -> Self {
        category.as_set()
    }
}

impl FromIterator<EventCategory> for CategorySet {
    fn from_iter<I: IntoIterator<Item = EventCategory>>(iter: I) -> Self {
        iter.into_iter()
            .fold(CategorySet::empty(), |acc, c| acc | c.as_set())
    }
}

/// Handler request to change which categories are reported for a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaskOverride {
    /// Keep the categories registered for the path (no change).
    #[default]
    KeepExisting,
    /// Replace the categories reported for the path.
    Override(CategorySet),
}
