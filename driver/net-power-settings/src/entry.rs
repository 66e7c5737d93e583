//! Wake pattern and protocol offload entries
//!
//! An entry owns a copy of the descriptor NDIS handed us, so that nothing
//! (including a driver that held on to a pointer from a preview callback) can
//! observe the caller's OID buffer after the request completes.

use alloc::vec::Vec;
use core::mem::size_of;

use crate::{
    entry_list::ListEntry,
    ndis::{NdisPmCountedString, NdisPmProtocolOffload, NdisPmWolPattern, WolBitmapPattern},
    params::PmParameters,
    Error,
};

/// Written over discarded entries so that stale references to them are
/// easier to spot.
pub(crate) const POISON_BYTE: u8 = 0xC0;

/// Which list an entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerEntryType {
    WakePattern,
    ProtocolOffload,
}

/// `NDIS_PM_WOL_PACKET`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum WolPacketType {
    BitmapPattern = 1,
    MagicPacket = 2,
    Ipv4TcpSyn = 3,
    Ipv6TcpSyn = 4,
    EapolRequestIdMessage = 5,
}

impl WolPacketType {
    pub const fn to_raw(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for WolPacketType {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => WolPacketType::BitmapPattern,
            2 => WolPacketType::MagicPacket,
            3 => WolPacketType::Ipv4TcpSyn,
            4 => WolPacketType::Ipv6TcpSyn,
            5 => WolPacketType::EapolRequestIdMessage,
            _ => return Err(Error::UnknownWolPacketType(value)),
        })
    }
}

/// `NDIS_PM_PROTOCOL_OFFLOAD_TYPE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ProtocolOffloadType {
    Ipv4Arp = 1,
    Ipv6Ns = 2,
    Dot11RsnRekey = 3,
}

impl ProtocolOffloadType {
    pub const fn to_raw(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ProtocolOffloadType {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Ok(match value {
            1 => ProtocolOffloadType::Ipv4Arp,
            2 => ProtocolOffloadType::Ipv6Ns,
            3 => ProtocolOffloadType::Dot11RsnRekey,
            _ => return Err(Error::UnknownProtocolOffloadType(value)),
        })
    }
}

/// A wake-on-LAN pattern, together with any trailing bitmap mask and pattern
/// bytes.
///
/// The descriptor is stored as the raw bytes NDIS supplied, and fields are
/// read out of it on demand.
#[derive(Debug)]
pub struct WakePattern {
    packet_type: WolPacketType,
    enabled: bool,
    /// Invariant: at least `size_of::<NdisPmWolPattern>()` bytes long
    bytes: Vec<u8>,
}

impl WakePattern {
    const DESCRIPTOR_SIZE: usize = size_of::<NdisPmWolPattern>();

    /// Copies a wake pattern out of `raw`, which is the `InformationBuffer`
    /// of an add wake pattern request.
    ///
    /// Bitmap patterns also copy the mask and pattern bytes that follow the
    /// descriptor, so `raw` must be long enough to contain them.
    pub(crate) fn from_raw(raw: &[u8]) -> Result<Self, Error> {
        let descriptor = raw
            .get(..Self::DESCRIPTOR_SIZE)
            .ok_or(Error::InvalidBufferLength {
                required: Self::DESCRIPTOR_SIZE,
                actual: raw.len(),
            })?;
        let descriptor: NdisPmWolPattern = bytemuck::pod_read_unaligned(descriptor);
        let packet_type = WolPacketType::try_from(descriptor.wol_packet_type)?;

        let trailing = match packet_type {
            WolPacketType::BitmapPattern => bitmap_trailing_size(&descriptor.bitmap_pattern())?,
            _ => 0,
        };
        let size = Self::DESCRIPTOR_SIZE
            .checked_add(trailing)
            .ok_or(Error::SizeOverflow)?;

        Ok(Self {
            packet_type,
            enabled: false,
            bytes: copy_entry_bytes(raw, size)?,
        })
    }

    pub fn packet_type(&self) -> WolPacketType {
        self.packet_type
    }

    /// Identifier NDIS assigned to the pattern, unique among the adapter's
    /// wake patterns.
    pub fn pattern_id(&self) -> u32 {
        self.descriptor().pattern_id
    }

    pub fn priority(&self) -> u32 {
        self.descriptor().priority
    }

    pub fn flags(&self) -> u32 {
        self.descriptor().flags
    }

    pub fn friendly_name(&self) -> NdisPmCountedString {
        self.descriptor().friendly_name
    }

    /// Whether the current power management parameters enable this pattern's
    /// packet type.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Size of the whole entry, including any trailing bitmap data
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// A copy of the fixed-size descriptor
    pub fn descriptor(&self) -> NdisPmWolPattern {
        bytemuck::pod_read_unaligned(&self.bytes[..Self::DESCRIPTOR_SIZE])
    }

    /// The mask and pattern bytes of a bitmap pattern, or `None` for any
    /// other packet type.
    pub fn bitmap(&self) -> Option<BitmapPattern<'_>> {
        if self.packet_type != WolPacketType::BitmapPattern {
            return None;
        }

        let bitmap = self.descriptor().bitmap_pattern();

        Some(BitmapPattern {
            mask: self.slice_at(bitmap.mask_offset, bitmap.mask_size)?,
            pattern: self.slice_at(bitmap.pattern_offset, bitmap.pattern_size)?,
        })
    }

    /// The descriptor and any trailing data, exactly as they were copied
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn slice_at(&self, offset: u32, len: u32) -> Option<&[u8]> {
        let start = usize::try_from(offset).ok()?;
        let end = start.checked_add(usize::try_from(len).ok()?)?;
        self.bytes.get(start..end)
    }

    /// Poisons and frees the entry
    pub(crate) fn discard(mut self) {
        poison(&mut self.bytes);
    }
}

impl ListEntry for WakePattern {
    type Kind = WolPacketType;

    fn id(&self) -> u32 {
        self.pattern_id()
    }

    fn kind(&self) -> Self::Kind {
        self.packet_type
    }

    fn refresh_enabled(&mut self, parameters: &PmParameters) {
        self.enabled = parameters.is_wake_pattern_enabled(self.packet_type);
    }
}

/// Mask and pattern bytes of a [`WolPacketType::BitmapPattern`] wake pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapPattern<'a> {
    pub mask: &'a [u8],
    pub pattern: &'a [u8],
}

/// A protocol the adapter should answer on the host's behalf while asleep.
#[derive(Debug)]
pub struct ProtocolOffload {
    offload_type: ProtocolOffloadType,
    enabled: bool,
    /// Invariant: exactly `size_of::<NdisPmProtocolOffload>()` bytes long
    bytes: Vec<u8>,
}

impl ProtocolOffload {
    const DESCRIPTOR_SIZE: usize = size_of::<NdisPmProtocolOffload>();

    /// Copies a protocol offload out of `raw`, which is the
    /// `InformationBuffer` of an add protocol offload request.
    pub(crate) fn from_raw(raw: &[u8]) -> Result<Self, Error> {
        let descriptor = raw
            .get(..Self::DESCRIPTOR_SIZE)
            .ok_or(Error::InvalidBufferLength {
                required: Self::DESCRIPTOR_SIZE,
                actual: raw.len(),
            })?;
        let descriptor: NdisPmProtocolOffload = bytemuck::pod_read_unaligned(descriptor);
        let offload_type = ProtocolOffloadType::try_from(descriptor.protocol_offload_type)?;

        Ok(Self {
            offload_type,
            enabled: false,
            bytes: copy_entry_bytes(raw, Self::DESCRIPTOR_SIZE)?,
        })
    }

    pub fn offload_type(&self) -> ProtocolOffloadType {
        self.offload_type
    }

    /// Identifier NDIS assigned to the offload, unique among the adapter's
    /// protocol offloads.
    pub fn offload_id(&self) -> u32 {
        self.descriptor().protocol_offload_id
    }

    pub fn priority(&self) -> u32 {
        self.descriptor().priority
    }

    pub fn flags(&self) -> u32 {
        self.descriptor().flags
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn descriptor(&self) -> NdisPmProtocolOffload {
        bytemuck::pod_read_unaligned(&self.bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Poisons and frees the entry
    pub(crate) fn discard(mut self) {
        poison(&mut self.bytes);
    }
}

impl ListEntry for ProtocolOffload {
    type Kind = ProtocolOffloadType;

    fn id(&self) -> u32 {
        self.offload_id()
    }

    fn kind(&self) -> Self::Kind {
        self.offload_type
    }

    fn refresh_enabled(&mut self, parameters: &PmParameters) {
        self.enabled = parameters.is_protocol_offload_enabled(self.offload_type);
    }
}

/// A borrowed entry from either list
#[derive(Debug, Clone, Copy)]
pub enum PowerEntry<'a> {
    WakePattern(&'a WakePattern),
    ProtocolOffload(&'a ProtocolOffload),
}

impl<'a> PowerEntry<'a> {
    pub fn entry_type(&self) -> PowerEntryType {
        match self {
            PowerEntry::WakePattern(_) => PowerEntryType::WakePattern,
            PowerEntry::ProtocolOffload(_) => PowerEntryType::ProtocolOffload,
        }
    }

    pub fn id(&self) -> u32 {
        match self {
            PowerEntry::WakePattern(pattern) => pattern.pattern_id(),
            PowerEntry::ProtocolOffload(offload) => offload.offload_id(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        match self {
            PowerEntry::WakePattern(pattern) => pattern.is_enabled(),
            PowerEntry::ProtocolOffload(offload) => offload.is_enabled(),
        }
    }

    pub fn size(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        match *self {
            PowerEntry::WakePattern(pattern) => pattern.as_bytes(),
            PowerEntry::ProtocolOffload(offload) => offload.as_bytes(),
        }
    }

    pub fn as_wake_pattern(&self) -> Option<&'a WakePattern> {
        match *self {
            PowerEntry::WakePattern(pattern) => Some(pattern),
            PowerEntry::ProtocolOffload(_) => None,
        }
    }

    pub fn as_protocol_offload(&self) -> Option<&'a ProtocolOffload> {
        match *self {
            PowerEntry::WakePattern(_) => None,
            PowerEntry::ProtocolOffload(offload) => Some(offload),
        }
    }
}

/// How many bytes of mask and pattern data follow a bitmap pattern's
/// descriptor.
///
/// Mask and pattern may overlap the descriptor itself, in which case there is
/// no trailing data.
fn bitmap_trailing_size(bitmap: &WolBitmapPattern) -> Result<usize, Error> {
    let mask_end = bitmap
        .mask_offset
        .checked_add(bitmap.mask_size)
        .ok_or(Error::SizeOverflow)?;
    let pattern_end = bitmap
        .pattern_offset
        .checked_add(bitmap.pattern_size)
        .ok_or(Error::SizeOverflow)?;
    let end = usize::try_from(mask_end.max(pattern_end)).map_err(|_| Error::SizeOverflow)?;

    Ok(end.saturating_sub(size_of::<NdisPmWolPattern>()))
}

/// Copies the first `size` bytes of `raw` into a new allocation
fn copy_entry_bytes(raw: &[u8], size: usize) -> Result<Vec<u8>, Error> {
    let Some(source) = raw.get(..size) else {
        return Err(Error::InvalidBufferLength {
            required: size,
            actual: raw.len(),
        });
    };

    let mut bytes = Vec::new();
    bytes.try_reserve_exact(size)?;
    bytes.extend_from_slice(source);

    Ok(bytes)
}

fn poison(bytes: &mut [u8]) {
    for byte in bytes.iter_mut() {
        // SAFETY: `byte` comes from a `&mut u8`, so it's valid for writes.
        //
        // Volatile so that the write isn't elided just because the allocation
        // is freed right after.
        unsafe { core::ptr::write_volatile(byte, POISON_BYTE) };
    }
}
