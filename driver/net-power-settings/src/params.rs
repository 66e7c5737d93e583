//! Power management parameters, as set by `OID_PM_PARAMETERS`

use crate::{
    entry::{ProtocolOffloadType, WolPacketType},
    ndis::NdisPmParameters,
};

bitflags::bitflags! {
    /// `NDIS_PM_WOL_*_ENABLED`
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WolPatternFlags: u32 {
        const BITMAP_PATTERN = 0x0000_0001;
        const MAGIC_PACKET = 0x0000_0002;
        const IPV4_TCP_SYN = 0x0000_0004;
        const IPV6_TCP_SYN = 0x0000_0008;
        const IPV4_DEST_ADDR_WILDCARD = 0x0000_0200;
        const IPV6_DEST_ADDR_WILDCARD = 0x0000_0800;
        const EAPOL_REQUEST_ID_MESSAGE = 0x0001_0000;
    }
}

bitflags::bitflags! {
    /// `NDIS_PM_PROTOCOL_OFFLOAD_*_ENABLED`
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ProtocolOffloadFlags: u32 {
        const ARP = 0x0000_0001;
        const NS = 0x0000_0002;
        const DOT11_RSN_REKEY = 0x0000_0080;
    }
}

bitflags::bitflags! {
    /// `NDIS_PM_WAKE_ON_*_ENABLED` and `NDIS_PM_SELECTIVE_SUSPEND_ENABLED`
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WakeUpFlags: u32 {
        const MEDIA_CONNECT = 0x0000_0001;
        const MEDIA_DISCONNECT = 0x0000_0002;
        const SELECTIVE_SUSPEND = 0x0000_0010;
    }
}

bitflags::bitflags! {
    /// `NDIS_WLAN_WAKE_ON_*_ENABLED`
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MediaSpecificWakeUpEvents: u32 {
        const NLO_DISCOVERY = 0x0000_0001;
        const AP_ASSOCIATION_LOST = 0x0000_0002;
        const GTK_HANDSHAKE_ERROR = 0x0000_0004;
        const FOUR_WAY_HANDSHAKE_REQUEST = 0x0000_0008;
    }
}

impl WolPacketType {
    /// The bit in [`PmParameters::enabled_wake_patterns`] that enables this
    /// packet type
    pub const fn enable_flag(self) -> WolPatternFlags {
        match self {
            WolPacketType::BitmapPattern => WolPatternFlags::BITMAP_PATTERN,
            WolPacketType::MagicPacket => WolPatternFlags::MAGIC_PACKET,
            WolPacketType::Ipv4TcpSyn => WolPatternFlags::IPV4_TCP_SYN,
            WolPacketType::Ipv6TcpSyn => WolPatternFlags::IPV6_TCP_SYN,
            WolPacketType::EapolRequestIdMessage => WolPatternFlags::EAPOL_REQUEST_ID_MESSAGE,
        }
    }
}

impl ProtocolOffloadType {
    /// The bit in [`PmParameters::enabled_protocol_offloads`] that enables
    /// this offload type
    pub const fn enable_flag(self) -> ProtocolOffloadFlags {
        match self {
            ProtocolOffloadType::Ipv4Arp => ProtocolOffloadFlags::ARP,
            ProtocolOffloadType::Ipv6Ns => ProtocolOffloadFlags::NS,
            ProtocolOffloadType::Dot11RsnRekey => ProtocolOffloadFlags::DOT11_RSN_REKEY,
        }
    }
}

/// A snapshot of the power management parameters.
///
/// Bits without a named flag are kept as-is.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PmParameters {
    pub enabled_wake_patterns: WolPatternFlags,
    pub enabled_protocol_offloads: ProtocolOffloadFlags,
    pub wake_up_flags: WakeUpFlags,
    pub media_specific_wake_up_events: MediaSpecificWakeUpEvents,
}

impl PmParameters {
    pub fn is_wake_pattern_enabled(&self, ty: WolPacketType) -> bool {
        self.enabled_wake_patterns.contains(ty.enable_flag())
    }

    pub fn is_protocol_offload_enabled(&self, ty: ProtocolOffloadType) -> bool {
        self.enabled_protocol_offloads.contains(ty.enable_flag())
    }

    /// Which entry categories need their enabled flags recomputed when moving
    /// from `old` to `self`
    pub fn changes_from(&self, old: &PmParameters) -> ParameterChanges {
        ParameterChanges {
            wake_patterns: self.enabled_wake_patterns != old.enabled_wake_patterns,
            protocol_offloads: self.enabled_protocol_offloads != old.enabled_protocol_offloads,
        }
    }
}

impl From<&NdisPmParameters> for PmParameters {
    fn from(raw: &NdisPmParameters) -> Self {
        Self {
            enabled_wake_patterns: WolPatternFlags::from_bits_retain(
                raw.enabled_wol_packet_patterns,
            ),
            enabled_protocol_offloads: ProtocolOffloadFlags::from_bits_retain(
                raw.enabled_protocol_offloads,
            ),
            wake_up_flags: WakeUpFlags::from_bits_retain(raw.wake_up_flags),
            media_specific_wake_up_events: MediaSpecificWakeUpEvents::from_bits_retain(
                raw.media_specific_wake_up_events,
            ),
        }
    }
}

/// Categories whose enable mask changed
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParameterChanges {
    pub wake_patterns: bool,
    pub protocol_offloads: bool,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn enable_flags_match_ndis_bits() {
        let wol = [
            (WolPacketType::BitmapPattern, 0x1),
            (WolPacketType::MagicPacket, 0x2),
            (WolPacketType::Ipv4TcpSyn, 0x4),
            (WolPacketType::Ipv6TcpSyn, 0x8),
            (WolPacketType::EapolRequestIdMessage, 0x1_0000),
        ];
        for (ty, bit) in wol {
            assert_eq!(ty.enable_flag().bits(), bit, "{ty:?}");
        }

        let offloads = [
            (ProtocolOffloadType::Ipv4Arp, 0x1),
            (ProtocolOffloadType::Ipv6Ns, 0x2),
            (ProtocolOffloadType::Dot11RsnRekey, 0x80),
        ];
        for (ty, bit) in offloads {
            assert_eq!(ty.enable_flag().bits(), bit, "{ty:?}");
        }
    }

    #[test]
    fn unknown_bits_are_retained() {
        let raw = NdisPmParameters {
            enabled_wol_packet_patterns: 0x8000_0002,
            enabled_protocol_offloads: 0x100,
            wake_up_flags: 0x13,
            media_specific_wake_up_events: 0xF0,
            ..Default::default()
        };

        let parameters = PmParameters::from(&raw);

        assert_eq!(parameters.enabled_wake_patterns.bits(), 0x8000_0002);
        assert_eq!(parameters.enabled_protocol_offloads.bits(), 0x100);
        assert_eq!(parameters.wake_up_flags.bits(), 0x13);
        assert_eq!(parameters.media_specific_wake_up_events.bits(), 0xF0);
        assert!(parameters.is_wake_pattern_enabled(WolPacketType::MagicPacket));
        assert!(!parameters.is_wake_pattern_enabled(WolPacketType::BitmapPattern));
        assert!(!parameters.is_protocol_offload_enabled(ProtocolOffloadType::Ipv4Arp));
    }

    #[test]
    fn changes_only_track_enable_masks() {
        let old = PmParameters::default();
        let mut new = old;
        new.wake_up_flags = WakeUpFlags::MEDIA_CONNECT;

        assert_eq!(new.changes_from(&old), ParameterChanges::default());

        new.enabled_protocol_offloads = ProtocolOffloadFlags::NS;
        assert_eq!(
            new.changes_from(&old),
            ParameterChanges {
                wake_patterns: false,
                protocol_offloads: true,
            }
        );
    }
}
