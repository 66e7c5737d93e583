//! Raw NDIS power management descriptors, laid out the same way as they are in
//! OID request buffers.
//!
//! These only mirror the parts of `ntddndis.h` that the power settings object
//! needs to look at. Parameter unions are kept opaque, apart from the bitmap
//! pattern which determines how much trailing data a wake pattern has.

use bytemuck_derive::{Pod, Zeroable};
use static_assertions::const_assert_eq;

/// Maximum length (in UTF-16 code units) of a [`NdisPmCountedString`], not
/// including the nul terminator.
pub const NDIS_PM_MAX_STRING_SIZE: usize = 64;

pub const NDIS_OBJECT_TYPE_DEFAULT: u8 = 0x80;

pub const NDIS_PM_WOL_PATTERN_REVISION_2: u8 = 2;
pub const NDIS_PM_PROTOCOL_OFFLOAD_REVISION_2: u8 = 2;
pub const NDIS_PM_PARAMETERS_REVISION_2: u8 = 2;

pub const NDIS_SIZEOF_NDIS_PM_WOL_PATTERN_REVISION_2: u16 =
    core::mem::size_of::<NdisPmWolPattern>() as u16;
pub const NDIS_SIZEOF_NDIS_PM_PROTOCOL_OFFLOAD_REVISION_2: u16 =
    core::mem::size_of::<NdisPmProtocolOffload>() as u16;
pub const NDIS_SIZEOF_NDIS_PM_PARAMETERS_REVISION_2: u16 =
    core::mem::size_of::<NdisPmParameters>() as u16;

/// `NDIS_OBJECT_HEADER`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Zeroable, Pod)]
#[repr(C)]
pub struct NdisObjectHeader {
    pub ty: u8,
    pub revision: u8,
    pub size: u16,
}

impl NdisObjectHeader {
    pub const fn new(ty: u8, revision: u8, size: u16) -> Self {
        Self { ty, revision, size }
    }
}

/// `NDIS_PM_COUNTED_STRING`
#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
pub struct NdisPmCountedString {
    /// Length of `string` in bytes, not including the nul terminator
    pub length: u16,
    pub string: [u16; NDIS_PM_MAX_STRING_SIZE + 1],
}

impl NdisPmCountedString {
    /// The used portion of the string
    ///
    /// Lengths past the end of the buffer are clamped.
    pub fn as_slice(&self) -> &[u16] {
        let len = usize::from(self.length / 2).min(NDIS_PM_MAX_STRING_SIZE);
        &self.string[..len]
    }
}

/// `NDIS_PM_WOL_PATTERN`
#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
pub struct NdisPmWolPattern {
    pub header: NdisObjectHeader,
    pub flags: u32,
    pub priority: u32,
    /// A `NDIS_PM_WOL_PACKET` value
    pub wol_packet_type: u32,
    pub friendly_name: NdisPmCountedString,
    pub pattern_id: u32,
    pub next_wol_pattern_offset: u32,
    /// The `WoLPattern` union.
    ///
    /// Only interpreted for bitmap patterns, see [`NdisPmWolPattern::bitmap_pattern`].
    pub wol_pattern: [u32; 10],
}

const_assert_eq!(core::mem::size_of::<NdisPmWolPattern>(), 196);
const_assert_eq!(core::mem::offset_of!(NdisPmWolPattern, pattern_id), 148);

impl NdisPmWolPattern {
    /// Interprets the `WoLPattern` union as a `WoLBitMapPattern`
    pub fn bitmap_pattern(&self) -> WolBitmapPattern {
        let [mask_offset, mask_size, pattern_offset, pattern_size, ..] = self.wol_pattern;

        WolBitmapPattern {
            mask_offset,
            mask_size,
            pattern_offset,
            pattern_size,
        }
    }

    pub fn set_bitmap_pattern(&mut self, bitmap: WolBitmapPattern) {
        self.wol_pattern[..4].copy_from_slice(&[
            bitmap.mask_offset,
            bitmap.mask_size,
            bitmap.pattern_offset,
            bitmap.pattern_size,
        ]);
    }
}

/// The `WoLBitMapPattern` member of the `NDIS_PM_WOL_PATTERN` parameter union.
///
/// Offsets are relative to the start of the [`NdisPmWolPattern`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WolBitmapPattern {
    pub mask_offset: u32,
    pub mask_size: u32,
    pub pattern_offset: u32,
    pub pattern_size: u32,
}

/// `NDIS_PM_PROTOCOL_OFFLOAD`
#[derive(Debug, Clone, Copy, Zeroable, Pod)]
#[repr(C)]
pub struct NdisPmProtocolOffload {
    pub header: NdisObjectHeader,
    pub flags: u32,
    pub priority: u32,
    /// A `NDIS_PM_PROTOCOL_OFFLOAD_TYPE` value
    pub protocol_offload_type: u32,
    pub protocol_offload_id: u32,
    pub next_protocol_offload_offset: u32,
    /// The `ProtocolOffloadParameters` union, which is 8-byte aligned because
    /// of the RSN rekey replay counter.
    pub protocol_offload_parameters: [u64; 10],
}

const_assert_eq!(core::mem::size_of::<NdisPmProtocolOffload>(), 104);
const_assert_eq!(
    core::mem::offset_of!(NdisPmProtocolOffload, protocol_offload_id),
    16
);

/// `NDIS_PM_PARAMETERS`
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Zeroable, Pod)]
#[repr(C)]
pub struct NdisPmParameters {
    pub header: NdisObjectHeader,
    pub enabled_wol_packet_patterns: u32,
    pub enabled_protocol_offloads: u32,
    pub wake_up_flags: u32,
    pub media_specific_wake_up_events: u32,
}
