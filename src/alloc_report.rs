//! Allocation accounting, reported the way the original program's
//! `print_memory_usage` does: an allocation count plus a byte total broken
//! into a human-readable unit, and a header-overhead estimate.
//!
//! The source wraps `malloc` with a hand-rolled header that stores each
//! block's size ahead of the returned pointer so `free` can tally bytes
//! back out. `GlobalAlloc` gives the same hook point without needing to
//! hand-roll the header: `System` already carries whatever bookkeeping the
//! platform allocator needs, so this just counts on top of it with atomics.

use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicI64, Ordering};

/// Bytes of accounting overhead the original's per-block header cost
/// (`HEADER_SIZE (sizeof(size_t))` in `memory.c`): one `size_t` per live
/// allocation, stored ahead of the block so `free` could recover its size.
/// `System` needs no such header, but the report line is kept meaningful by
/// charging the same per-allocation cost here.
const HEADER_BYTES_PER_ALLOCATION: u64 = std::mem::size_of::<usize>() as u64;

static LIVE_ALLOCATIONS: AtomicI64 = AtomicI64::new(0);
static LIVE_BYTES: AtomicI64 = AtomicI64::new(0);

/// A counting wrapper around the system allocator. Install with
/// `#[global_allocator]`.
pub struct CountingAllocator;

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = System.alloc(layout);
        if !ptr.is_null() {
            LIVE_ALLOCATIONS.fetch_add(1, Ordering::Relaxed);
            LIVE_BYTES.fetch_add(layout.size() as i64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout);
        LIVE_ALLOCATIONS.fetch_sub(1, Ordering::Relaxed);
        LIVE_BYTES.fetch_sub(layout.size() as i64, Ordering::Relaxed);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = System.realloc(ptr, layout, new_size);
        if !new_ptr.is_null() {
            LIVE_BYTES.fetch_add(new_size as i64 - layout.size() as i64, Ordering::Relaxed);
        }
        new_ptr
    }
}

/// A snapshot of current allocator counters, formatted the way
/// `print_memory_usage` lays its report out.
pub struct MemoryReport {
    pub live_allocations: i64,
    pub live_bytes: i64,
    pub header_bytes: u64,
}

impl MemoryReport {
    pub fn capture() -> MemoryReport {
        MemoryReport {
            live_allocations: LIVE_ALLOCATIONS.load(Ordering::Relaxed),
            live_bytes: LIVE_BYTES.load(Ordering::Relaxed),
            header_bytes: HEADER_BYTES_PER_ALLOCATION
                * LIVE_ALLOCATIONS.load(Ordering::Relaxed).max(0) as u64,
        }
    }
}

/// Mirrors `format_ext_and_get_size` in `memory.c`: checked largest unit
/// first, each threshold strict (`size > GIB`, not `>=`), so an exact power
/// of 1024 stays in the smaller unit.
fn human_bytes(bytes: u64) -> String {
    const KIB: f64 = 1024.0;
    const MIB: f64 = KIB * 1024.0;
    const GIB: f64 = MIB * 1024.0;

    let size = bytes as f64;
    let (value, unit) = if size > GIB {
        (size / GIB, "GiB")
    } else if size > MIB {
        (size / MIB, "MiB")
    } else if size > KIB {
        (size / KIB, "KiB")
    } else {
        (size, "B")
    };
    format!("{value:.4} {unit}")
}

/// Emit the four-line report spec.md's external-interfaces section
/// describes, via `log::info!` so it honors the same severity filtering as
/// everything else.
pub fn log_memory_report() {
    let report = MemoryReport::capture();
    log::info!("Allocation count: {}", report.live_allocations);
    log::info!("Allocation size: {}", human_bytes(report.live_bytes.max(0) as u64));
    log::info!("Memory used for the header: {}", human_bytes(report.header_bytes));
    log::info!(
        "Total memory used: {}",
        human_bytes(report.live_bytes.max(0) as u64 + report.header_bytes)
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_bytes_picks_unit() {
        assert_eq!(human_bytes(0), "0.0000 B");
        assert_eq!(human_bytes(512), "512.0000 B");
        // Exact powers of 1024 use the strict `>` threshold from the
        // original, so they stay in the smaller unit.
        assert_eq!(human_bytes(1024), "1024.0000 B");
        assert_eq!(human_bytes(2048), "2.0000 KiB");
    }

    #[test]
    fn report_tracks_live_allocations() {
        let before = MemoryReport::capture();
        let v: Vec<u8> = Vec::with_capacity(4096);
        let after = MemoryReport::capture();
        assert!(after.live_bytes >= before.live_bytes);
        drop(v);
    }
}
