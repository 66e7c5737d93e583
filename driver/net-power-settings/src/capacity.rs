//! Device-wide wake pattern capacity

use core::sync::atomic::{AtomicU32, Ordering};

use scopeguard::ScopeGuard;

use crate::Adapter;

/// How many wake patterns a device accepts if it doesn't say otherwise
pub const DEFAULT_MAX_WAKE_PATTERNS: u32 = 32;

/// Counts the wake patterns outstanding across every adapter of a device.
///
/// Meant to be embedded in the device context and used to implement
/// [`Adapter::try_acquire_wake_pattern_slot`] and
/// [`Adapter::release_wake_pattern_slot`].
#[derive(Debug)]
pub struct WakePatternSlots {
    count: AtomicU32,
    max: u32,
}

impl WakePatternSlots {
    /// Creates a counter that allows up to `max` outstanding wake patterns
    pub const fn new(max: u32) -> Self {
        Self {
            count: AtomicU32::new(0),
            max,
        }
    }

    /// Takes a slot if there are any left
    pub fn try_acquire(&self) -> bool {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                (count < self.max).then_some(count + 1)
            })
            .is_ok()
    }

    /// Gives back a slot
    pub fn release(&self) {
        let released = self
            .count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                count.checked_sub(1)
            });

        debug_assert!(released.is_ok(), "released more wake pattern slots than were taken");
    }

    /// Number of slots currently taken
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

impl Default for WakePatternSlots {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WAKE_PATTERNS)
    }
}

/// Takes one of the device's wake pattern slots, giving it back when the
/// guard is dropped.
///
/// Disarm the guard with [`ScopeGuard::into_inner`] once the slot belongs to
/// a committed wake pattern.
pub(crate) fn reserve_wake_pattern_slot<'a, A: Adapter>(
    adapter: &'a A,
) -> Option<ScopeGuard<&'a A, impl FnOnce(&'a A)>> {
    if !adapter.try_acquire_wake_pattern_slot() {
        return None;
    }

    Some(scopeguard::guard(adapter, |adapter| {
        adapter.release_wake_pattern_slot()
    }))
}
