//! Process memory probe.

#![allow(missing_docs)]

#[cfg(target_os = "linux")]
use std::fs;

const BYTES_PER_MIB: u64 = 1024 * 1024;

/// Source of the "memory in use" figure shown in the metrics panel.
///
/// Probes report `None` when the host cannot tell; the panel then shows `N/A`.
pub trait MemoryProbe: Send {
    fn used_bytes(&self) -> Option<u64>;

    /// Used memory in whole MiB, rounded to nearest.
    fn used_mb(&self) -> Option<u64> {
        self.used_bytes().map(bytes_to_mb)
    }
}

/// Resident set size of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessMemory;

impl MemoryProbe for ProcessMemory {
    fn used_bytes(&self) -> Option<u64> {
        read_rss_bytes()
    }
}

/// Probe for hosts without a memory figure.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMemory;

impl MemoryProbe for NoMemory {
    fn used_bytes(&self) -> Option<u64> {
        None
    }
}

/// Fixed reading, handy for tests and benchmarks.
#[derive(Debug, Clone, Copy)]
pub struct FixedMemory(pub u64);

impl MemoryProbe for FixedMemory {
    fn used_bytes(&self) -> Option<u64> {
        Some(self.0)
    }
}

#[must_use]
pub const fn bytes_to_mb(bytes: u64) -> u64 {
    (bytes + BYTES_PER_MIB / 2) / BYTES_PER_MIB
}

// ──────────────────── RSS reading ────────────────────

fn read_rss_bytes() -> Option<u64> {
    #[cfg(target_os = "linux")]
    {
        let status = fs::read_to_string("/proc/self/status").ok()?;
        parse_vm_rss(&status)
    }
    #[cfg(not(target_os = "linux"))]
    {
        None
    }
}

/// Extract `VmRSS` (reported in kB) from a `/proc/<pid>/status` body.
fn parse_vm_rss(status: &str) -> Option<u64> {
    status
        .lines()
        .find(|line| line.starts_with("VmRSS:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|kb| kb.parse::<u64>().ok())
        .map(|kb| kb * 1024)
}
