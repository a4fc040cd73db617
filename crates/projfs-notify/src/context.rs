//! Per-invocation event data.

/// Data the engine passes with one notification.
///
/// Borrowed from the engine's buffers and valid only for the duration of
/// the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventContext<'a> {
    /// Path relative to the virtualization root.
    pub relative_path: &'a str,
    /// Destination path for rename and hard link events.
    pub destination_path: Option<&'a str>,
    /// Whether the path names a directory.
    pub is_directory: bool,
    /// Id of the process that triggered the notification.
    pub triggering_process_id: u32,
    /// Image file name of the triggering process.
    pub triggering_process_image: &'a str,
    /// Close events: the file had been modified.
    pub file_modified: bool,
    /// Close events: the file was deleted.
    pub file_deleted: bool,
}

impl<'a> EventContext<'a> {
    /// Create a context for a file event.
    ///
    /// # Arguments
    /// * `relative_path` - Path relative to the virtualization root
    /// * `triggering_process_id` - Id of the triggering process
    /// * `triggering_process_image` - Image file name of the triggering process
    pub fn new(
        relative_path: &'a str,
        triggering_process_id: u32,
        triggering_process_image: &'a str,
    ) -> Self {
        Self {
            relative_path,
            destination_path: None,
            is_directory: false,
            triggering_process_id,
            triggering_process_image,
            file_modified: false,
            file_deleted: false,
        }
    }

    /// Set the destination path.
    pub fn with_destination(mut self, destination_path: &'a str) -> Self {
        self.destination_path = Some(destination_path);
        self
    }

    /// Set the directory flag.
    pub fn directory(mut self, is_directory: bool) -> Self {
        self.is_directory = is_directory;
        self
    }

    /// Set the close-event flags.
    pub fn with_close_flags(mut self, file_modified: bool, file_deleted: bool) -> Self {
        self.file_modified = file_modified;
        self.file_deleted = file_deleted;
        self
    }
}
