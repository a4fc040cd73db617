//! Integration tests for notification registration and dispatch.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use projfs_notify::{
    active_categories, CallbackSlot, CallbackTable, CategorySet, EventCategory, EventContext,
    EventRecord, EventSink, MaskOverride, MemorySink, NotificationDispatcher, NotificationMapping,
    NotifyError, TestSignal,
};

const SHORT: Duration = Duration::from_millis(50);

/// Build a session over `mappings` with a capturing sink.
fn session(
    mappings: &[NotificationMapping],
    test_mode: bool,
) -> (CallbackTable, Arc<TestSignal>, Arc<MemorySink>, NotificationDispatcher) {
    let signal = Arc::new(TestSignal::new(test_mode));
    let sink = Arc::new(MemorySink::new());
    let mut table = CallbackTable::new();

    let dispatcher = NotificationDispatcher::with_parts(
        signal.clone(),
        test_mode,
        &mut table,
        mappings,
        sink.clone(),
        Arc::new(projfs_notify::AllowAll),
    );

    (table, signal, sink, dispatcher)
}

fn all_categories() -> Vec<NotificationMapping> {
    vec![NotificationMapping::root(CategorySet::all())]
}

#[test]
fn test_file_opened_scenario() {
    let mappings = [NotificationMapping::with_categories(
        "*",
        [EventCategory::FileOpened, EventCategory::PreDelete],
    )];
    let (table, signal, sink, _dispatcher) = session(&mappings, true);

    assert_eq!(
        table.registered_slots(),
        vec![CallbackSlot::FileOpened, CallbackSlot::PreDelete]
    );

    let result = table.notify_file_opened("/a/b.txt", false, 123, "proc.exe");
    assert_eq!(result, Some((true, MaskOverride::KeepExisting)));
    assert!(signal.wait_for("FileOpened", SHORT));
    assert_eq!(
        sink.lines(),
        vec![
            "NotifyFileOpenedCallback [/a/b.txt]".to_string(),
            "  Notification triggered by [proc.exe 123]".to_string(),
        ]
    );
}

#[test]
fn test_close_pair_registers_one_combined_slot() {
    let mappings = [
        NotificationMapping::root(CategorySet::FILE_HANDLE_CLOSED_MODIFIED),
        NotificationMapping::root(CategorySet::FILE_HANDLE_CLOSED_DELETED),
    ];
    let (table, _signal, _sink, dispatcher) = session(&mappings, false);

    assert_eq!(
        table.registered_slots(),
        vec![CallbackSlot::FileHandleClosedModifiedOrDeleted]
    );
    assert_eq!(dispatcher.registered_slots().len(), 1);
}

#[test]
fn test_either_close_category_activates_combined_slot() {
    for category in [
        EventCategory::FileHandleClosedModified,
        EventCategory::FileHandleClosedDeleted,
    ] {
        let (table, _signal, _sink, _dispatcher) =
            session(&[NotificationMapping::root(category.into())], false);
        assert!(table.is_registered(CallbackSlot::FileHandleClosedModifiedOrDeleted));
    }
}

#[test]
fn test_empty_mappings_register_nothing() {
    let (table, signal, sink, dispatcher) = session(&[], true);

    assert!(dispatcher.active_categories().is_empty());
    assert!(table.registered_slots().is_empty());
    assert_eq!(table.notify_pre_delete("a", false, 1, "p.exe"), None);
    assert!(!table.notify_file_handle_closed_modified_or_deleted(
        "a", false, true, false, 1, "p.exe"
    ));
    assert!(sink.is_empty());
    assert_eq!(signal.pending("PreDelete"), 0);
}

#[test]
fn test_pre_rename_waiter_registered_before_call() {
    let mappings = [NotificationMapping::root(CategorySet::PRE_RENAME)];
    let (table, signal, sink, _dispatcher) = session(&mappings, true);

    let waiter_signal = signal.clone();
    let waiter = thread::spawn(move || waiter_signal.wait_for("PreRename", Duration::from_secs(5)));
    thread::sleep(Duration::from_millis(20));

    assert_eq!(table.notify_pre_rename("/a", "/b", 7, "mv.exe"), Some(true));
    assert!(waiter.join().unwrap());
    assert_eq!(sink.lines()[0], "NotifyPreRenameCallback [/a] [/b]");
}

#[test]
fn test_registration_is_idempotent() {
    let mappings = vec![
        NotificationMapping::root(CategorySet::PRE_DELETE),
        NotificationMapping::new("src", CategorySet::FILE_RENAMED | CategorySet::HARDLINK_CREATED),
    ];

    let (first, _s1, _k1, d1) = session(&mappings, false);
    let (second, _s2, _k2, d2) = session(&mappings, true);

    assert_eq!(d1.active_categories(), d2.active_categories());
    assert_eq!(d1.active_categories(), active_categories(&mappings));
    assert_eq!(first.registered_slots(), second.registered_slots());
}

#[test]
fn test_slot_registered_iff_category_active() {
    let mappings = [NotificationMapping::root(
        CategorySet::NEW_FILE_CREATED | CategorySet::FILE_PRE_CONVERT_TO_FULL,
    )];
    let (table, _signal, _sink, dispatcher) = session(&mappings, false);

    for slot in CallbackSlot::ALL {
        assert_eq!(
            table.is_registered(slot),
            dispatcher.active_categories().intersects(slot.categories()),
            "slot {}",
            slot
        );
    }
}

#[test]
fn test_every_slot_signals_its_label_once() {
    let (table, signal, _sink, _dispatcher) = session(&all_categories(), true);

    table.notify_file_opened("f", false, 1, "p.exe");
    table.notify_new_file_created("f", false, 1, "p.exe");
    table.notify_file_overwritten("f", false, 1, "p.exe");
    table.notify_pre_delete("f", false, 1, "p.exe");
    table.notify_pre_rename("f", "g", 1, "p.exe");
    table.notify_pre_create_hardlink("f", "g", 1, "p.exe");
    table.notify_file_renamed("f", "g", false, 1, "p.exe");
    table.notify_hardlink_created("f", "g", 1, "p.exe");
    table.notify_file_handle_closed_no_modification("f", false, 1, "p.exe");
    table.notify_file_handle_closed_modified_or_deleted("f", false, true, true, 1, "p.exe");
    table.notify_file_pre_convert_to_full("f", 1, "p.exe");

    for slot in CallbackSlot::ALL {
        assert_eq!(signal.pending(slot.label()), 1, "slot {}", slot);
        assert!(signal.wait_for(slot.label(), SHORT));
        assert!(!signal.wait_for(slot.label(), Duration::from_millis(1)));
    }
    assert_eq!(table.stats().total_delivered(), CallbackSlot::COUNT as u64);
}

#[test]
fn test_no_signal_outside_test_mode() {
    let (table, signal, sink, _dispatcher) = session(&all_categories(), false);

    table.notify_file_opened("f", false, 1, "p.exe");
    table.notify_file_handle_closed_modified_or_deleted("f", false, false, true, 1, "p.exe");

    assert_eq!(sink.len(), 2);
    for slot in CallbackSlot::ALL {
        assert_eq!(signal.pending(slot.label()), 0);
    }
    assert!(!signal.wait_for("FileOpened", SHORT));
}

#[test]
fn test_gating_slots_allow_and_keep_mask() {
    let (table, _signal, _sink, _dispatcher) = session(&all_categories(), false);

    assert_eq!(
        table.notify_file_opened("f", true, 1, "p.exe"),
        Some((true, MaskOverride::KeepExisting))
    );
    assert_eq!(table.notify_pre_delete("f", false, 1, "p.exe"), Some(true));
    assert_eq!(table.notify_pre_rename("f", "g", 1, "p.exe"), Some(true));
    assert_eq!(table.notify_pre_create_hardlink("f", "g", 1, "p.exe"), Some(true));
    assert_eq!(table.notify_file_pre_convert_to_full("f", 1, "p.exe"), Some(true));

    assert_eq!(
        table.notify_new_file_created("f", false, 1, "p.exe"),
        Some(MaskOverride::KeepExisting)
    );
    assert_eq!(
        table.notify_file_overwritten("f", false, 1, "p.exe"),
        Some(MaskOverride::KeepExisting)
    );
    assert_eq!(
        table.notify_file_renamed("f", "g", false, 1, "p.exe"),
        Some(MaskOverride::KeepExisting)
    );
}

#[test]
fn test_close_record_includes_flags() {
    let (table, signal, sink, _dispatcher) = session(&all_categories(), true);

    assert!(table.notify_file_handle_closed_modified_or_deleted(
        "doc.txt", false, true, false, 42, "word.exe"
    ));

    assert_eq!(
        sink.lines(),
        vec![
            "NotifyFileHandleClosedFileModifiedOrDeletedCallback [doc.txt]".to_string(),
            "  Modified: true, Deleted: false".to_string(),
            "  Notification triggered by [word.exe 42]".to_string(),
        ]
    );
    assert!(signal.wait_for("FileHandleClosedFileModifiedOrDeleted", SHORT));
}

struct BrokenSink;

impl EventSink for BrokenSink {
    fn record(&self, _record: &EventRecord<'_>) -> Result<(), NotifyError> {
        Err(NotifyError::Sink("log pipe closed".to_string()))
    }
}

#[test]
fn test_sink_fault_never_denies() {
    let signal = Arc::new(TestSignal::new(true));
    let mut table = CallbackTable::new();
    let _dispatcher = NotificationDispatcher::with_parts(
        signal,
        true,
        &mut table,
        &all_categories(),
        Arc::new(BrokenSink),
        Arc::new(projfs_notify::AllowAll),
    );

    assert_eq!(table.notify_pre_delete("f", false, 1, "p.exe"), Some(true));
    assert!(table.notify_hardlink_created("f", "g", 1, "p.exe"));

    let stats = table.stats();
    assert_eq!(stats.total_delivered(), 2);
    assert_eq!(stats.total_faults(), 2);
}

#[test]
fn test_concurrent_delivery() {
    let (table, signal, sink, _dispatcher) = session(&all_categories(), true);
    let table = Arc::new(table);

    let workers: Vec<_> = (0..4u32)
        .map(|worker| {
            let table = table.clone();
            thread::spawn(move || {
                for i in 0..50u32 {
                    let path = format!("w{}/f{}", worker, i);
                    let event = EventContext::new(&path, worker, "p.exe");
                    assert!(table
                        .invoke(CallbackSlot::PreDelete, &event)
                        .unwrap()
                        .allowed());
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(sink.len(), 200);
    assert_eq!(signal.pending("PreDelete"), 200);
    assert_eq!(table.stats().for_slot(CallbackSlot::PreDelete).delivered, 200);
}
