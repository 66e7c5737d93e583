//! The per-adapter power settings object

use core::cell::Cell;

use log::{debug, error, info, warn};
use scopeguard::ScopeGuard;

use crate::{
    callback::{run_preview, AccessWindow, Verdict},
    capacity::reserve_wake_pattern_slot,
    entry_list::{EntryList, ListEntry},
    params::{MediaSpecificWakeUpEvents, ProtocolOffloadFlags, WakeUpFlags, WolPatternFlags},
    Adapter, Error, NdisStatus, ObjectPhase, PmParameters, PowerEntry, PowerEntryType,
    PowerSettingsConfig, ProtocolOffload, ProtocolOffloadType, WakePattern, WolPacketType,
};

/// The wake patterns, protocol offloads, and power management parameters of
/// one adapter.
///
/// All mutation goes through `&mut self`, and preview callbacks only ever get
/// a shared reference, so the settings can't change while a callback is
/// looking at them.
pub struct NetPowerSettings<A: Adapter> {
    adapter: A,
    config: PowerSettingsConfig<A>,
    wake_patterns: EntryList<WakePattern>,
    protocol_offloads: EntryList<ProtocolOffload>,
    parameters: PmParameters,
    access_window: Cell<AccessWindow>,
    phase: ObjectPhase,
}

impl<A: Adapter> NetPowerSettings<A> {
    /// Creates the power settings for `adapter`, with no entries and all
    /// parameters cleared.
    pub fn new(adapter: A, config: PowerSettingsConfig<A>) -> Self {
        debug!("creating power settings: {config:?}");

        Self {
            adapter,
            config,
            wake_patterns: EntryList::new(),
            protocol_offloads: EntryList::new(),
            parameters: PmParameters::default(),
            access_window: Cell::new(AccessWindow::Closed),
            phase: ObjectPhase::Constructing,
        }
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn phase(&self) -> ObjectPhase {
        self.phase
    }

    /// Marks the adapter as initialized, after which the cleanup and destroy
    /// callbacks will run on teardown.
    pub fn adapter_init_complete(&mut self) {
        debug_assert_eq!(
            self.phase,
            ObjectPhase::Constructing,
            "adapter initialization can only complete once"
        );

        debug!("power settings ready");
        self.phase = ObjectPhase::Ready;
    }

    /// Adds the wake pattern in `raw`, the buffer of an add wake pattern
    /// request.
    ///
    /// The pattern takes up one of the device's wake pattern slots until it
    /// is removed.
    pub fn add_wake_pattern(&mut self, raw: &[u8]) -> Result<(), Error> {
        self.assert_access_window_closed();

        let Some(slot) = reserve_wake_pattern_slot(&self.adapter) else {
            info!("no wake pattern slots left on the device");
            return Err(Error::WakePatternListFull);
        };

        let mut pattern = WakePattern::from_raw(raw)
            .inspect_err(|err| error!("rejecting wake pattern: {err}"))?;
        self.wake_patterns
            .reserve_one()
            .inspect_err(|err| error!("no room for wake pattern: {err}"))?;
        pattern.refresh_enabled(&self.parameters);

        if let Some(preview) = self.config.evt_preview_wake_pattern {
            let settings = &*self;
            let verdict = run_preview(
                &settings.access_window,
                NdisStatus::PM_WOL_PATTERN_LIST_FULL,
                || preview(&settings.adapter, settings, pattern.packet_type(), &pattern),
            );

            if verdict == Verdict::Reject {
                info!(
                    "driver refused wake pattern {:#x}, list is full",
                    pattern.pattern_id()
                );
                pattern.discard();
                return Err(Error::WakePatternListFull);
            }
        }

        debug!(
            "adding {:?} wake pattern {:#x} (enabled: {})",
            pattern.packet_type(),
            pattern.pattern_id(),
            pattern.is_enabled()
        );
        self.wake_patterns.insert(pattern);
        ScopeGuard::into_inner(slot);

        Ok(())
    }

    /// Adds the protocol offload in `raw`, the buffer of an add protocol
    /// offload request.
    pub fn add_protocol_offload(&mut self, raw: &[u8]) -> Result<(), Error> {
        self.assert_access_window_closed();

        let mut offload = ProtocolOffload::from_raw(raw)
            .inspect_err(|err| error!("rejecting protocol offload: {err}"))?;
        self.protocol_offloads
            .reserve_one()
            .inspect_err(|err| error!("no room for protocol offload: {err}"))?;
        offload.refresh_enabled(&self.parameters);

        if let Some(preview) = self.config.evt_preview_protocol_offload {
            let settings = &*self;
            let verdict = run_preview(
                &settings.access_window,
                NdisStatus::PM_PROTOCOL_OFFLOAD_LIST_FULL,
                || preview(&settings.adapter, settings, offload.offload_type(), &offload),
            );

            if verdict == Verdict::Reject {
                info!(
                    "driver refused protocol offload {:#x}, list is full",
                    offload.offload_id()
                );
                offload.discard();
                return Err(Error::ProtocolOffloadListFull);
            }
        }

        debug!(
            "adding {:?} protocol offload {:#x} (enabled: {})",
            offload.offload_type(),
            offload.offload_id(),
            offload.is_enabled()
        );
        self.protocol_offloads.insert(offload);

        Ok(())
    }

    /// Removes the wake pattern with the identifier `id`, giving its slot
    /// back to the device.
    ///
    /// Fails with [`Error::NotFound`] if there's no such pattern, including
    /// when there are no wake patterns at all.
    pub fn remove_wake_pattern(&mut self, id: u32) -> Result<(), Error> {
        self.assert_access_window_closed();

        let found = if self.wake_patterns.is_empty() {
            None
        } else {
            self.wake_patterns.remove_by_id(id)
        };
        let Some(pattern) = found else {
            warn!("no wake pattern with id {id:#x} to remove");
            return Err(Error::NotFound(PowerEntryType::WakePattern, id));
        };

        debug!("removing wake pattern {id:#x}");
        pattern.discard();
        self.adapter.release_wake_pattern_slot();

        Ok(())
    }

    /// Removes the protocol offload with the identifier `id`
    ///
    /// Fails with [`Error::NotFound`] if there's no such offload.
    pub fn remove_protocol_offload(&mut self, id: u32) -> Result<(), Error> {
        self.assert_access_window_closed();

        let found = if self.protocol_offloads.is_empty() {
            None
        } else {
            self.protocol_offloads.remove_by_id(id)
        };
        let Some(offload) = found else {
            warn!("no protocol offload with id {id:#x} to remove");
            return Err(Error::NotFound(PowerEntryType::ProtocolOffload, id));
        };

        debug!("removing protocol offload {id:#x}");
        offload.discard();

        Ok(())
    }

    /// Replaces the power management parameters, updating which entries are
    /// enabled.
    ///
    /// Entries are only revisited if the enable mask of their category changed.
    pub fn set_parameters(&mut self, parameters: PmParameters) {
        self.assert_access_window_closed();

        let changes = parameters.changes_from(&self.parameters);

        if changes.wake_patterns {
            self.wake_patterns.refresh_enabled(&parameters);
        }
        if changes.protocol_offloads {
            self.protocol_offloads.refresh_enabled(&parameters);
        }

        self.parameters = parameters;
    }

    pub fn parameters(&self) -> &PmParameters {
        &self.parameters
    }

    pub fn enabled_wake_patterns(&self) -> WolPatternFlags {
        self.parameters.enabled_wake_patterns
    }

    pub fn enabled_protocol_offloads(&self) -> ProtocolOffloadFlags {
        self.parameters.enabled_protocol_offloads
    }

    pub fn wake_up_flags(&self) -> WakeUpFlags {
        self.parameters.wake_up_flags
    }

    pub fn media_specific_wake_up_events(&self) -> MediaSpecificWakeUpEvents {
        self.parameters.media_specific_wake_up_events
    }

    /// Gets the `index`-th entry of `entry_type`
    pub fn entry_at(&self, entry_type: PowerEntryType, index: usize) -> Option<PowerEntry<'_>> {
        match entry_type {
            PowerEntryType::WakePattern => self.wake_pattern_at(index).map(PowerEntry::WakePattern),
            PowerEntryType::ProtocolOffload => self
                .protocol_offload_at(index)
                .map(PowerEntry::ProtocolOffload),
        }
    }

    pub fn wake_pattern_at(&self, index: usize) -> Option<&WakePattern> {
        self.wake_patterns.get(index)
    }

    pub fn protocol_offload_at(&self, index: usize) -> Option<&ProtocolOffload> {
        self.protocol_offloads.get(index)
    }

    pub fn wake_patterns(&self) -> impl ExactSizeIterator<Item = &WakePattern> + '_ {
        self.wake_patterns.iter()
    }

    pub fn protocol_offloads(&self) -> impl ExactSizeIterator<Item = &ProtocolOffload> + '_ {
        self.protocol_offloads.iter()
    }

    pub fn entry_count(&self, entry_type: PowerEntryType) -> usize {
        match entry_type {
            PowerEntryType::WakePattern => self.wake_patterns.len(),
            PowerEntryType::ProtocolOffload => self.protocol_offloads.len(),
        }
    }

    pub fn wake_pattern_count_for_type(&self, ty: WolPacketType) -> usize {
        self.wake_patterns.count_by_kind(ty)
    }

    pub fn protocol_offload_count_for_type(&self, ty: ProtocolOffloadType) -> usize {
        self.protocol_offloads.count_by_kind(ty)
    }

    /// Whether the driver may currently read the power settings: either from
    /// inside a preview callback, or while the device is changing power state.
    pub fn are_power_settings_accessible(&self) -> bool {
        self.access_window.get() == AccessWindow::Open
            || self.adapter.is_device_in_power_transition()
    }

    fn assert_access_window_closed(&self) {
        debug_assert_eq!(
            self.access_window.get(),
            AccessWindow::Closed,
            "power settings changed while a preview callback is running"
        );
    }
}

impl<A: Adapter> Drop for NetPowerSettings<A> {
    fn drop(&mut self) {
        let run_callbacks = self.phase.runs_object_callbacks();
        self.phase = ObjectPhase::Destroying;

        if run_callbacks {
            if let Some(cleanup) = self.config.evt_cleanup_callback {
                cleanup(self);
            }
            if let Some(destroy) = self.config.evt_destroy_callback {
                destroy(self);
            }
        } else {
            debug!("adapter never finished initializing, skipping cleanup and destroy callbacks");
        }

        if !self.wake_patterns.is_empty() {
            debug!(
                "releasing {} outstanding wake pattern slots",
                self.wake_patterns.len()
            );
        }
        for _pattern in self.wake_patterns.drain() {
            self.adapter.release_wake_pattern_slot();
        }
        self.protocol_offloads.drain().for_each(drop);
    }
}

impl<A: Adapter> core::fmt::Debug for NetPowerSettings<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NetPowerSettings")
            .field("wake_patterns", &self.wake_patterns.len())
            .field("protocol_offloads", &self.protocol_offloads.len())
            .field("parameters", &self.parameters)
            .field("access_window", &self.access_window.get())
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}
