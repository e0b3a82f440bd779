//! Process memory introspection.
//!
//! The line renderer queries a fresh snapshot on every line when memory
//! output is enabled. Figures come from [`sysinfo`]: the resident set stands
//! in for heap used, the virtual size for heap total.

use std::sync::Mutex;

use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// Memory figures in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemorySnapshot {
    pub heap_used: u64,
    pub heap_total: u64,
    pub rss: u64,
}

/// Source of memory snapshots.
pub trait MemoryProbe: Send {
    fn snapshot(&self) -> MemorySnapshot;
}

/// Reads the current process's memory figures from the operating system.
///
/// Keeps one [`System`] around and refreshes only this process's memory on
/// each snapshot.
pub struct ProcessMemory {
    pid: Option<Pid>,
    system: Mutex<System>,
}

impl ProcessMemory {
    pub fn new() -> Self {
        Self {
            pid: sysinfo::get_current_pid().ok(),
            system: Mutex::new(System::new()),
        }
    }
}

impl Default for ProcessMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessMemory {
    fn snapshot(&self) -> MemorySnapshot {
        let Some(pid) = self.pid else {
            return MemorySnapshot::default();
        };
        let mut system = self
            .system
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );
        system
            .process(pid)
            .map(|process| snapshot_of(process.memory(), process.virtual_memory()))
            .unwrap_or_default()
    }
}

/// Map resident and virtual sizes onto the rendered figures.
pub fn snapshot_of(resident: u64, virtual_size: u64) -> MemorySnapshot {
    MemorySnapshot {
        heap_used: resident,
        heap_total: virtual_size.max(resident),
        rss: resident,
    }
}

/// Bytes as MiB with two decimals (`12.34`).
#[allow(clippy::cast_precision_loss)]
pub fn mib(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / 1024.0 / 1024.0)
}
