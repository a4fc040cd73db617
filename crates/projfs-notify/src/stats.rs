//! Delivery statistics for the callback table.
//!
//! Counters live in the table, not in handlers, so handlers stay stateless.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use crate::slot::CallbackSlot;

/// Counters for one slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SlotStats {
    /// Events delivered to the slot's handler.
    pub delivered: u64,
    /// Deliveries where a fault was contained.
    pub faults: u64,
}

/// Snapshot of delivery statistics.
#[derive(Debug, Clone, Default)]
pub struct DeliveryStatsSnapshot {
    /// Per-slot counters, paired with their slot, in slot order.
    pub slots: Vec<(CallbackSlot, SlotStats)>,
    /// Time since the table was created.
    pub uptime_secs: u64,
}

impl DeliveryStatsSnapshot {
    /// Counters for `slot`.
    pub fn for_slot(&self, slot: CallbackSlot) -> SlotStats {
        self.slots
            .iter()
            .find(|(s, _)| *s == slot)
            .map(|(_, stats)| *stats)
            .unwrap_or_default()
    }

    /// Total events delivered.
    pub fn total_delivered(&self) -> u64 {
        self.slots.iter().map(|(_, s)| s.delivered).sum()
    }

    /// Total contained faults.
    pub fn total_faults(&self) -> u64 {
        self.slots.iter().map(|(_, s)| s.faults).sum()
    }

    /// Format stats as a display grid.
    ///
    /// # Returns
    /// Multi-line string with one row per slot that saw traffic.
    pub fn display_grid(&self) -> String {
        let mut lines: Vec<String> = Vec::new();

        lines.push("╔══════════════════════════════════════════════════════════╗".to_string());
        lines.push("║                  Notification Statistics                 ║".to_string());
        lines.push("╠══════════════════════════════════════════════════════════╣".to_string());
        lines.push(format!("║ Uptime: {:>44} sec ║", self.uptime_secs));
        lines.push("╠══════════════════════════════════════════════════════════╣".to_string());
        lines.push(format!(
            "║ {:<38} {:>8} {:>8} ║",
            "Callback", "Events", "Faults"
        ));

        for (slot, stats) in &self.slots {
            if stats.delivered == 0 {
                continue;
            }
            lines.push(format!(
                "║ {:<38} {:>8} {:>8} ║",
                slot.label(),
                stats.delivered,
                stats.faults
            ));
        }

        lines.push("╠══════════════════════════════════════════════════════════╣".to_string());
        lines.push(format!(
            "║ {:<38} {:>8} {:>8} ║",
            "Total",
            self.total_delivered(),
            self.total_faults()
        ));
        lines.push("╚══════════════════════════════════════════════════════════╝".to_string());

        lines.join("\n")
    }
}

/// Thread-safe per-slot delivery counters.
#[derive(Debug)]
pub struct DeliveryStats {
    delivered: [AtomicU64; CallbackSlot::COUNT],
    faults: [AtomicU64; CallbackSlot::COUNT],
    start_time: Instant,
}

impl DeliveryStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self {
            delivered: std::array::from_fn(|_| AtomicU64::new(0)),
            faults: std::array::from_fn(|_| AtomicU64::new(0)),
            start_time: Instant::now(),
        }
    }

    /// Count one delivery on `slot`.
    pub fn record(&self, slot: CallbackSlot, contained_fault: bool) {
        self.delivered[slot.index()].fetch_add(1, Ordering::Relaxed);
        if contained_fault {
            self.faults[slot.index()].fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Collect current counters.
    pub fn snapshot(&self) -> DeliveryStatsSnapshot {
        let slots: Vec<(CallbackSlot, SlotStats)> = CallbackSlot::ALL
            .into_iter()
            .map(|slot| {
                let stats = SlotStats {
                    delivered: self.delivered[slot.index()].load(Ordering::Relaxed),
                    faults: self.faults[slot.index()].load(Ordering::Relaxed),
                };
                (slot, stats)
            })
            .collect();

        DeliveryStatsSnapshot {
            slots,
            uptime_secs: self.start_time.elapsed().as_secs(),
        }
    }
}

impl Default for DeliveryStats {
    fn default() -> Self {
        Self::new()
    }
}
