//! Driver callbacks for a [`NetPowerSettings`] object

use crate::{
    Adapter, NdisStatus, NetPowerSettings, ProtocolOffload, ProtocolOffloadType, WakePattern,
    WolPacketType,
};

/// Called before a wake pattern is added, while the power settings are
/// accessible.
///
/// Returning [`NdisStatus::PM_WOL_PATTERN_LIST_FULL`] refuses the pattern,
/// any other status accepts it.
pub type EvtPreviewWakePattern<A> =
    fn(&A, &NetPowerSettings<A>, WolPacketType, &WakePattern) -> NdisStatus;

/// Called before a protocol offload is added, while the power settings are
/// accessible.
///
/// Returning [`NdisStatus::PM_PROTOCOL_OFFLOAD_LIST_FULL`] refuses the
/// offload, any other status accepts it.
pub type EvtPreviewProtocolOffload<A> =
    fn(&A, &NetPowerSettings<A>, ProtocolOffloadType, &ProtocolOffload) -> NdisStatus;

/// Called while the object is being torn down
pub type EvtObjectCallback<A> = fn(&NetPowerSettings<A>);

/// Optional callbacks, in the style of a WDF object config.
///
/// The cleanup and destroy callbacks only run if the adapter finished
/// initializing.
pub struct PowerSettingsConfig<A: Adapter> {
    pub evt_preview_wake_pattern: Option<EvtPreviewWakePattern<A>>,
    pub evt_preview_protocol_offload: Option<EvtPreviewProtocolOffload<A>>,
    pub evt_cleanup_callback: Option<EvtObjectCallback<A>>,
    pub evt_destroy_callback: Option<EvtObjectCallback<A>>,
}

impl<A: Adapter> PowerSettingsConfig<A> {
    /// A config without any callbacks
    pub const fn new() -> Self {
        Self {
            evt_preview_wake_pattern: None,
            evt_preview_protocol_offload: None,
            evt_cleanup_callback: None,
            evt_destroy_callback: None,
        }
    }
}

impl<A: Adapter> Default for PowerSettingsConfig<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Adapter> Clone for PowerSettingsConfig<A> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: Adapter> Copy for PowerSettingsConfig<A> {}

impl<A: Adapter> core::fmt::Debug for PowerSettingsConfig<A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PowerSettingsConfig")
            .field(
                "evt_preview_wake_pattern",
                &self.evt_preview_wake_pattern.is_some(),
            )
            .field(
                "evt_preview_protocol_offload",
                &self.evt_preview_protocol_offload.is_some(),
            )
            .field("evt_cleanup_callback", &self.evt_cleanup_callback.is_some())
            .field("evt_destroy_callback", &self.evt_destroy_callback.is_some())
            .finish()
    }
}
