//! What the power settings object needs from the adapter that owns it

use alloc::sync::Arc;

/// The adapter (and by extension the device) a [`NetPowerSettings`] belongs to.
///
/// [`NetPowerSettings`]: crate::NetPowerSettings
pub trait Adapter {
    /// Takes one of the device's wake pattern slots.
    ///
    /// Returns `false` without side effects if every slot is in use.
    fn try_acquire_wake_pattern_slot(&self) -> bool;

    /// Gives back a slot taken by [`Adapter::try_acquire_wake_pattern_slot`]
    fn release_wake_pattern_slot(&self);

    /// Whether the device is in the middle of a power transition, during which
    /// the power settings may always be read.
    fn is_device_in_power_transition(&self) -> bool;
}

impl<T: Adapter + ?Sized> Adapter for &T {
    fn try_acquire_wake_pattern_slot(&self) -> bool {
        T::try_acquire_wake_pattern_slot(self)
    }

    fn release_wake_pattern_slot(&self) {
        T::release_wake_pattern_slot(self)
    }

    fn is_device_in_power_transition(&self) -> bool {
        T::is_device_in_power_transition(self)
    }
}

impl<T: Adapter + ?Sized> Adapter for Arc<T> {
    fn try_acquire_wake_pattern_slot(&self) -> bool {
        T::try_acquire_wake_pattern_slot(self)
    }

    fn release_wake_pattern_slot(&self) {
        T::release_wake_pattern_slot(self)
    }

    fn is_device_in_power_transition(&self) -> bool {
        T::is_device_in_power_transition(self)
    }
}
