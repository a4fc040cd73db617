//! Example: register notification handlers and replay a few events.
//!
//! Loads dispatch options from a TOML file (or uses every category on the
//! whole root), registers handlers into an in-process callback table, and
//! plays the events an editor save would produce.
//!
//! Usage:
//!   cargo run --example notify_demo -- [options.toml]

use std::path::PathBuf;
use std::sync::Arc;

use projfs_notify::{
    CallbackSlot, CallbackTable, CategorySet, NotificationDispatcher, NotificationMapping,
    NotifyOptions, TestSignal,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let options: NotifyOptions = match std::env::args().nth(1) {
        Some(path) => NotifyOptions::load(&PathBuf::from(path))?,
        None => NotifyOptions::default()
            .with_test_mode(true)
            .with_mapping(NotificationMapping::root(CategorySet::all())),
    };

    let signal = Arc::new(TestSignal::from_options(&options));
    let mut table = CallbackTable::new();
    let dispatcher = NotificationDispatcher::from_options(&options, signal.clone(), &mut table);

    println!(
        "Registered {} callbacks: {:?}",
        dispatcher.registered_slots().len(),
        dispatcher.registered_slots()
    );

    let pid: u32 = std::process::id();
    let image: &str = "notepad.exe";

    table.notify_file_opened("docs/readme.txt", false, pid, image);
    table.notify_new_file_created("docs/readme.txt~", false, pid, image);
    table.notify_file_handle_closed_modified_or_deleted(
        "docs/readme.txt~",
        false,
        true,
        false,
        pid,
        image,
    );
    table.notify_pre_rename("docs/readme.txt~", "docs/readme.txt", pid, image);
    table.notify_file_renamed("docs/readme.txt~", "docs/readme.txt", false, pid, image);

    if signal.is_test_mode() && table.is_registered(CallbackSlot::FileRenamed) {
        let renamed: bool = signal.wait("FileRenamed");
        println!("FileRenamed signal observed: {}", renamed);
    }

    println!("{}", table.stats().display_grid());

    Ok(())
}
