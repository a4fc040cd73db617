//! ProjFS notification callback and mapping conversion.

use windows::core::{HRESULT, PCWSTR};
use windows::Win32::Foundation::{BOOLEAN, ERROR_ACCESS_DENIED, S_OK};
use windows::Win32::Storage::ProjectedFileSystem::{
    PRJ_CALLBACK_DATA, PRJ_NOTIFICATION, PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_FILE_DELETED,
    PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_FILE_MODIFIED,
    PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_NO_MODIFICATION, PRJ_NOTIFICATION_FILE_OPENED,
    PRJ_NOTIFICATION_FILE_OVERWRITTEN, PRJ_NOTIFICATION_FILE_PRE_CONVERT_TO_FULL,
    PRJ_NOTIFICATION_FILE_RENAMED, PRJ_NOTIFICATION_HARDLINK_CREATED, PRJ_NOTIFICATION_MAPPING,
    PRJ_NOTIFICATION_NEW_FILE_CREATED, PRJ_NOTIFICATION_PARAMETERS, PRJ_NOTIFICATION_PRE_DELETE,
    PRJ_NOTIFICATION_PRE_RENAME, PRJ_NOTIFICATION_PRE_SET_HARDLINK, PRJ_NOTIFY_TYPES,
    PRJ_NOTIFY_USE_EXISTING_MASK,
};

use crate::category::MaskOverride;
use crate::context::EventContext;
use crate::engine::CallbackTable;
use crate::handler::HandlerResult;
use crate::mapping::NotificationMapping;
use crate::projfs::wstr::{pcwstr_to_string, string_to_wide};
use crate::slot::CallbackSlot;

/// Slot delivering a native notification.
///
/// Both close-with-change notifications map to the combined slot.
pub fn slot_for_notification(notification: PRJ_NOTIFICATION) -> Option<CallbackSlot> {
    match notification {
        PRJ_NOTIFICATION_FILE_OPENED => Some(CallbackSlot::FileOpened),
        PRJ_NOTIFICATION_NEW_FILE_CREATED => Some(CallbackSlot::NewFileCreated),
        PRJ_NOTIFICATION_FILE_OVERWRITTEN => Some(CallbackSlot::FileOverwritten),
        PRJ_NOTIFICATION_PRE_DELETE => Some(CallbackSlot::PreDelete),
        PRJ_NOTIFICATION_PRE_RENAME => Some(CallbackSlot::PreRename),
        PRJ_NOTIFICATION_PRE_SET_HARDLINK => Some(CallbackSlot::PreCreateHardlink),
        PRJ_NOTIFICATION_FILE_RENAMED => Some(CallbackSlot::FileRenamed),
        PRJ_NOTIFICATION_HARDLINK_CREATED => Some(CallbackSlot::HardlinkCreated),
        PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_NO_MODIFICATION => {
            Some(CallbackSlot::FileHandleClosedNoModification)
        }
        PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_FILE_MODIFIED
        | PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_FILE_DELETED => {
            Some(CallbackSlot::FileHandleClosedModifiedOrDeleted)
        }
        PRJ_NOTIFICATION_FILE_PRE_CONVERT_TO_FULL => Some(CallbackSlot::FilePreConvertToFull),
        _ => None,
    }
}

/// Native form of a mask override.
pub fn native_mask(mask: MaskOverride) -> PRJ_NOTIFY_TYPES {
    match mask {
        MaskOverride::KeepExisting => PRJ_NOTIFY_USE_EXISTING_MASK,
        MaskOverride::Override(set) => PRJ_NOTIFY_TYPES(set.bits()),
    }
}

/// Notification mappings plus the wide strings their roots point into.
pub struct NativeMappings {
    /// Backing storage for `NotificationRoot`; must outlive `mappings`.
    _roots: Vec<Vec<u16>>,
    mappings: Vec<PRJ_NOTIFICATION_MAPPING>,
}

impl NativeMappings {
    /// Mappings for `PRJ_STARTVIRTUALIZING_OPTIONS::NotificationMappings`.
    pub fn as_mut_slice(&mut self) -> &mut [PRJ_NOTIFICATION_MAPPING] {
        &mut self.mappings
    }

    /// Number of mappings.
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Whether there are no mappings.
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// Build native notification mappings.
///
/// # Arguments
/// * `mappings` - Notification mappings, passed through in order
///
/// # Returns
/// Owned native mappings.
pub fn build_notification_mappings(mappings: &[NotificationMapping]) -> NativeMappings {
    let roots: Vec<Vec<u16>> = mappings
        .iter()
        .map(|m| string_to_wide(&m.path_pattern))
        .collect();

    // Inner buffers are heap allocated; moving `roots` keeps these pointers valid.
    let native: Vec<PRJ_NOTIFICATION_MAPPING> = mappings
        .iter()
        .zip(&roots)
        .map(|(mapping, root)| PRJ_NOTIFICATION_MAPPING {
            NotificationBitMask: PRJ_NOTIFY_TYPES(mapping.categories.bits()),
            NotificationRoot: PCWSTR::from_raw(root.as_ptr()),
        })
        .collect();

    NativeMappings {
        _roots: roots,
        mappings: native,
    }
}

/// Modified/deleted flags for a close notification.
unsafe fn close_flags(
    notification: PRJ_NOTIFICATION,
    operation_parameters: *const PRJ_NOTIFICATION_PARAMETERS,
) -> (bool, bool) {
    match notification {
        PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_FILE_MODIFIED => (true, false),
        PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_FILE_DELETED => {
            let modified: bool = !operation_parameters.is_null()
                && (*operation_parameters)
                    .FileDeletedOnHandleClose
                    .IsFileModified
                    .as_bool();
            (modified, true)
        }
        _ => (false, false),
    }
}

/// Write the handler's mask override into the notification parameters.
unsafe fn write_mask(
    notification: PRJ_NOTIFICATION,
    operation_parameters: *mut PRJ_NOTIFICATION_PARAMETERS,
    mask: MaskOverride,
) {
    if operation_parameters.is_null() {
        return;
    }

    let native: PRJ_NOTIFY_TYPES = native_mask(mask);
    if notification == PRJ_NOTIFICATION_FILE_RENAMED {
        (*operation_parameters).FileRenamed.NotificationMask = native;
    } else {
        (*operation_parameters).PostCreate.NotificationMask = native;
    }
}

/// Notification callback.
///
/// The instance context must be a `CallbackTable` that outlives the
/// virtualization instance. Never fails an operation except on an
/// explicit deny.
pub unsafe extern "system" fn notification_cb(
    callback_data: *const PRJ_CALLBACK_DATA,
    is_directory: BOOLEAN,
    notification: PRJ_NOTIFICATION,
    destination_file_name: PCWSTR,
    operation_parameters: *mut PRJ_NOTIFICATION_PARAMETERS,
) -> HRESULT {
    let table: &CallbackTable = &*((*callback_data).InstanceContext as *const CallbackTable);

    let slot: CallbackSlot = match slot_for_notification(notification) {
        Some(slot) if table.is_registered(slot) => slot,
        _ => return S_OK,
    };

    let relative_path: String = pcwstr_to_string((*callback_data).FilePathName);
    let process_image: String = pcwstr_to_string((*callback_data).TriggeringProcessImageFileName);
    let destination: Option<String> = if slot.has_destination() {
        Some(pcwstr_to_string(destination_file_name))
    } else {
        None
    };

    let mut event = EventContext::new(
        &relative_path,
        (*callback_data).TriggeringProcessId,
        &process_image,
    )
    .directory(is_directory.as_bool());
    if let Some(dest) = destination.as_deref() {
        event = event.with_destination(dest);
    }
    if slot == CallbackSlot::FileHandleClosedModifiedOrDeleted {
        let (modified, deleted) = close_flags(notification, operation_parameters);
        event = event.with_close_flags(modified, deleted);
    }

    let result: HandlerResult = match table.invoke(slot, &event) {
        Some(result) => result,
        None => return S_OK,
    };

    if slot.reports_mask() {
        write_mask(notification, operation_parameters, result.mask_override);
    }

    if result.allowed() {
        S_OK
    } else {
        HRESULT::from(ERROR_ACCESS_DENIED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::c_void;
    use std::sync::Arc;

    use crate::category::{CategorySet, EventCategory};
    use crate::dispatcher::NotificationDispatcher;
    use crate::event_log::MemorySink;
    use crate::policy::AllowAll;
    use crate::signal::TestSignal;
    use windows::Win32::Storage::ProjectedFileSystem::{
        PRJ_NOTIFY_FILE_HANDLE_CLOSED_FILE_DELETED, PRJ_NOTIFY_FILE_OPENED, PRJ_NOTIFY_PRE_DELETE,
        PRJ_NOTIFY_PRE_SET_HARDLINK,
    };

    #[test]
    fn test_slot_for_notification() {
        assert_eq!(
            slot_for_notification(PRJ_NOTIFICATION_PRE_SET_HARDLINK),
            Some(CallbackSlot::PreCreateHardlink)
        );
        assert_eq!(
            slot_for_notification(PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_FILE_MODIFIED),
            Some(CallbackSlot::FileHandleClosedModifiedOrDeleted)
        );
        assert_eq!(
            slot_for_notification(PRJ_NOTIFICATION_FILE_HANDLE_CLOSED_FILE_DELETED),
            Some(CallbackSlot::FileHandleClosedModifiedOrDeleted)
        );
    }

    #[test]
    fn test_category_bits_match_native() {
        assert_eq!(CategorySet::FILE_OPENED.bits(), PRJ_NOTIFY_FILE_OPENED.0);
        assert_eq!(CategorySet::PRE_DELETE.bits(), PRJ_NOTIFY_PRE_DELETE.0);
        assert_eq!(
            CategorySet::PRE_CREATE_HARDLINK.bits(),
            PRJ_NOTIFY_PRE_SET_HARDLINK.0
        );
        assert_eq!(
            CategorySet::FILE_HANDLE_CLOSED_DELETED.bits(),
            PRJ_NOTIFY_FILE_HANDLE_CLOSED_FILE_DELETED.0
        );
    }

    #[test]
    fn test_native_mask() {
        assert_eq!(
            native_mask(MaskOverride::KeepExisting),
            PRJ_NOTIFY_USE_EXISTING_MASK
        );
        assert_eq!(
            native_mask(MaskOverride::Override(CategorySet::empty())).0,
            0
        );
    }

    #[test]
    fn test_build_notification_mappings() {
        let mut native = build_notification_mappings(&[
            NotificationMapping::root(CategorySet::for_writable()),
            NotificationMapping::with_categories("logs", [EventCategory::PreDelete]),
        ]);

        assert_eq!(native.len(), 2);
        let slice = native.as_mut_slice();
        assert_eq!(
            slice[0].NotificationBitMask.0,
            CategorySet::for_writable().bits()
        );
        let root: String = unsafe { pcwstr_to_string(slice[1].NotificationRoot) };
        assert_eq!(root, "logs");
    }

    #[test]
    fn test_build_notification_mappings_empty() {
        assert!(build_notification_mappings(&[]).is_empty());
    }

    #[test]
    fn test_callback_delivers_unpaired_surrogate_paths() {
        let signal = Arc::new(TestSignal::new(true));
        let sink = Arc::new(MemorySink::new());
        let mut table = CallbackTable::new();
        let _dispatcher = NotificationDispatcher::with_parts(
            signal.clone(),
            true,
            &mut table,
            &[NotificationMapping::root(
                CategorySet::PRE_DELETE | CategorySet::PRE_RENAME,
            )],
            sink.clone(),
            Arc::new(AllowAll),
        );

        // Unpaired high surrogates inside otherwise valid names.
        let path: [u16; 4] = [0x61, 0xD800, 0x62, 0];
        let dest: [u16; 4] = [0x63, 0xDBFF, 0x64, 0];
        let image: Vec<u16> = string_to_wide("del.exe");

        let data = PRJ_CALLBACK_DATA {
            FilePathName: PCWSTR::from_raw(path.as_ptr()),
            TriggeringProcessId: 9,
            TriggeringProcessImageFileName: PCWSTR::from_raw(image.as_ptr()),
            InstanceContext: &table as *const CallbackTable as *mut c_void,
            ..Default::default()
        };

        let delete_hr: HRESULT = unsafe {
            notification_cb(
                &data,
                BOOLEAN(0),
                PRJ_NOTIFICATION_PRE_DELETE,
                PCWSTR::null(),
                std::ptr::null_mut(),
            )
        };
        let rename_hr: HRESULT = unsafe {
            notification_cb(
                &data,
                BOOLEAN(0),
                PRJ_NOTIFICATION_PRE_RENAME,
                PCWSTR::from_raw(dest.as_ptr()),
                std::ptr::null_mut(),
            )
        };

        assert_eq!(delete_hr, S_OK);
        assert_eq!(rename_hr, S_OK);
        assert!(signal.wait_for("PreDelete", std::time::Duration::from_millis(50)));
        assert!(signal.wait_for("PreRename", std::time::Duration::from_millis(50)));

        let lines: Vec<String> = sink.lines();
        assert_eq!(lines[0], "NotifyPreDeleteCallback [a?b]");
        assert_eq!(lines[1], "  Notification triggered by [del.exe 9]");
        assert_eq!(lines[2], "NotifyPreRenameCallback [a?b] [c?d]");
    }
}
