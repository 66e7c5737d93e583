//! Wake-on-LAN patterns and protocol offloads of a network adapter
//!
//! A [`NetPowerSettings`] keeps the power management state NDIS hands to an
//! adapter through the `OID_PM_*` requests, and lets the driver preview (and
//! refuse) new entries before they're committed.
#![no_std]
#![deny(unsafe_op_in_unsafe_fn, clippy::multiple_unsafe_ops_per_block)]

extern crate alloc;

// During tests, allow importing std
#[cfg(test)]
extern crate std;

mod adapter;
mod callback;
mod capacity;
mod config;
mod entry;
mod entry_list;
mod lifecycle;
pub mod ndis;
pub mod params;
mod registry;
mod status;

pub use adapter::Adapter;
pub use capacity::{WakePatternSlots, DEFAULT_MAX_WAKE_PATTERNS};
pub use config::{
    EvtObjectCallback, EvtPreviewProtocolOffload, EvtPreviewWakePattern, PowerSettingsConfig,
};
pub use entry::{
    BitmapPattern, PowerEntry, PowerEntryType, ProtocolOffload, ProtocolOffloadType, WakePattern,
    WolPacketType,
};
pub use lifecycle::ObjectPhase;
pub use params::PmParameters;
pub use registry::NetPowerSettings;
pub use status::{Error, NdisStatus};

#[cfg(test)]
pub(crate) mod test {
    use core::cell::{Cell, RefCell};
    use std::vec::Vec;

    use bytemuck::Zeroable;

    use crate::{
        ndis::{
            NdisObjectHeader, NdisPmProtocolOffload, NdisPmWolPattern, WolBitmapPattern,
            NDIS_OBJECT_TYPE_DEFAULT, NDIS_PM_PROTOCOL_OFFLOAD_REVISION_2,
            NDIS_PM_WOL_PATTERN_REVISION_2, NDIS_SIZEOF_NDIS_PM_PROTOCOL_OFFLOAD_REVISION_2,
            NDIS_SIZEOF_NDIS_PM_WOL_PATTERN_REVISION_2,
        },
        params::{ProtocolOffloadFlags, WolPatternFlags},
        Adapter, NdisStatus, NetPowerSettings, PmParameters, PowerEntryType, PowerSettingsConfig,
        ProtocolOffload, ProtocolOffloadType, WakePattern, WakePatternSlots, WolPacketType,
    };

    fn wol_descriptor(ty: WolPacketType, id: u32) -> NdisPmWolPattern {
        let mut descriptor = NdisPmWolPattern::zeroed();
        descriptor.header = NdisObjectHeader::new(
            NDIS_OBJECT_TYPE_DEFAULT,
            NDIS_PM_WOL_PATTERN_REVISION_2,
            NDIS_SIZEOF_NDIS_PM_WOL_PATTERN_REVISION_2,
        );
        descriptor.wol_packet_type = ty.to_raw();
        descriptor.pattern_id = id;
        descriptor.priority = 1;

        let name = "test".encode_utf16().collect::<Vec<_>>();
        descriptor.friendly_name.string[..name.len()].copy_from_slice(&name);
        descriptor.friendly_name.length = (name.len() * 2) as u16;

        descriptor
    }

    /// Builds a wake pattern request buffer without any trailing data
    pub(crate) fn wol_pattern(ty: WolPacketType, id: u32) -> Vec<u8> {
        bytemuck::bytes_of(&wol_descriptor(ty, id)).to_vec()
    }

    /// Builds a bitmap wake pattern request buffer, with the mask and pattern
    /// right after the descriptor
    pub(crate) fn bitmap_pattern(id: u32, mask: &[u8], pattern: &[u8]) -> Vec<u8> {
        let mut descriptor = wol_descriptor(WolPacketType::BitmapPattern, id);
        let mask_offset = core::mem::size_of::<NdisPmWolPattern>() as u32;
        descriptor.set_bitmap_pattern(WolBitmapPattern {
            mask_offset,
            mask_size: mask.len() as u32,
            pattern_offset: mask_offset + mask.len() as u32,
            pattern_size: pattern.len() as u32,
        });

        let mut raw = bytemuck::bytes_of(&descriptor).to_vec();
        raw.extend_from_slice(mask);
        raw.extend_from_slice(pattern);
        raw
    }

    /// Builds a protocol offload request buffer
    pub(crate) fn protocol_offload(ty: ProtocolOffloadType, id: u32) -> Vec<u8> {
        let mut descriptor = NdisPmProtocolOffload::zeroed();
        descriptor.header = NdisObjectHeader::new(
            NDIS_OBJECT_TYPE_DEFAULT,
            NDIS_PM_PROTOCOL_OFFLOAD_REVISION_2,
            NDIS_SIZEOF_NDIS_PM_PROTOCOL_OFFLOAD_REVISION_2,
        );
        descriptor.protocol_offload_type = ty.to_raw();
        descriptor.protocol_offload_id = id;

        bytemuck::bytes_of(&descriptor).to_vec()
    }

    pub(crate) fn params(
        wake_patterns: WolPatternFlags,
        protocol_offloads: ProtocolOffloadFlags,
    ) -> PmParameters {
        PmParameters {
            enabled_wake_patterns: wake_patterns,
            enabled_protocol_offloads: protocol_offloads,
            ..Default::default()
        }
    }

    /// An adapter that records what the driver callbacks saw
    pub(crate) struct TestAdapter {
        pub slots: WakePatternSlots,
        pub in_power_transition: Cell<bool>,
        /// Status returned from the preview callbacks
        pub preview_status: Cell<NdisStatus>,
        pub previews: Cell<usize>,
        pub previewed_id: Cell<Option<u32>>,
        pub count_in_preview: Cell<Option<usize>>,
        pub accessible_in_preview: Cell<Option<bool>>,
        pub events: RefCell<Vec<&'static str>>,
    }

    impl TestAdapter {
        pub(crate) fn new() -> Self {
            Self::with_max_wake_patterns(crate::DEFAULT_MAX_WAKE_PATTERNS)
        }

        pub(crate) fn with_max_wake_patterns(max: u32) -> Self {
            Self {
                slots: WakePatternSlots::new(max),
                in_power_transition: Cell::new(false),
                preview_status: Cell::new(NdisStatus::SUCCESS),
                previews: Cell::new(0),
                previewed_id: Cell::new(None),
                count_in_preview: Cell::new(None),
                accessible_in_preview: Cell::new(None),
                events: RefCell::new(Vec::new()),
            }
        }
    }

    impl Adapter for TestAdapter {
        fn try_acquire_wake_pattern_slot(&self) -> bool {
            self.slots.try_acquire()
        }

        fn release_wake_pattern_slot(&self) {
            self.slots.release()
        }

        fn is_device_in_power_transition(&self) -> bool {
            self.in_power_transition.get()
        }
    }

    type TestSettings<'a> = NetPowerSettings<&'a TestAdapter>;

    fn record_preview(
        adapter: &TestAdapter,
        settings: &TestSettings<'_>,
        entry_type: PowerEntryType,
        id: u32,
    ) -> NdisStatus {
        adapter.previews.set(adapter.previews.get() + 1);
        adapter.previewed_id.set(Some(id));
        adapter
            .count_in_preview
            .set(Some(settings.entry_count(entry_type)));
        adapter
            .accessible_in_preview
            .set(Some(settings.are_power_settings_accessible()));

        adapter.preview_status.get()
    }

    fn preview_wake_pattern(
        adapter: &&TestAdapter,
        settings: &TestSettings<'_>,
        _ty: WolPacketType,
        pattern: &WakePattern,
    ) -> NdisStatus {
        record_preview(
            adapter,
            settings,
            PowerEntryType::WakePattern,
            pattern.pattern_id(),
        )
    }

    fn preview_protocol_offload(
        adapter: &&TestAdapter,
        settings: &TestSettings<'_>,
        _ty: ProtocolOffloadType,
        offload: &ProtocolOffload,
    ) -> NdisStatus {
        record_preview(
            adapter,
            settings,
            PowerEntryType::ProtocolOffload,
            offload.offload_id(),
        )
    }

    fn cleanup(settings: &TestSettings<'_>) {
        settings.adapter().events.borrow_mut().push("cleanup");
    }

    fn destroy(settings: &TestSettings<'_>) {
        settings.adapter().events.borrow_mut().push("destroy");
    }

    /// A config with every callback recording into the [`TestAdapter`]
    pub(crate) fn recording_config<'a>() -> PowerSettingsConfig<&'a TestAdapter> {
        PowerSettingsConfig {
            evt_preview_wake_pattern: Some(preview_wake_pattern),
            evt_preview_protocol_offload: Some(preview_protocol_offload),
            evt_cleanup_callback: Some(cleanup),
            evt_destroy_callback: Some(destroy),
        }
    }
}
