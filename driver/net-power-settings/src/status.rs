//! Status codes returned to NDIS, and the errors that produce them

use alloc::collections::TryReserveError;

use crate::entry::PowerEntryType;

/// An `NDIS_STATUS` (which shares its encoding with `NTSTATUS`)
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NdisStatus(pub u32);

impl NdisStatus {
    pub const SUCCESS: Self = Self(0x0000_0000);
    pub const UNSUCCESSFUL: Self = Self(0xC000_0001);
    /// `NDIS_STATUS_RESOURCES`, which is the same value as `STATUS_INSUFFICIENT_RESOURCES`
    pub const RESOURCES: Self = Self(0xC000_009A);
    pub const NOT_FOUND: Self = Self(0xC000_0225);
    pub const PM_WOL_PATTERN_LIST_FULL: Self = Self(0xC023_2003);
    pub const PM_PROTOCOL_OFFLOAD_LIST_FULL: Self = Self(0xC023_2004);

    /// Equivalent of `NT_SUCCESS`
    pub const fn is_success(self) -> bool {
        (self.0 as i32) >= 0
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }
}

impl From<Result<(), Error>> for NdisStatus {
    fn from(value: Result<(), Error>) -> Self {
        match value {
            Ok(()) => NdisStatus::SUCCESS,
            Err(err) => err.into(),
        }
    }
}

/// Everything that can go wrong while changing the power settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Either the device is out of wake pattern slots, or the driver refused
    /// the pattern.
    #[error("wake pattern list is full")]
    WakePatternListFull,
    /// The driver refused the protocol offload
    #[error("protocol offload list is full")]
    ProtocolOffloadListFull,
    #[error("insufficient resources to store the power entry")]
    InsufficientResources,
    #[error("buffer of {actual} bytes is too small for a {required} byte power entry")]
    InvalidBufferLength { required: usize, actual: usize },
    #[error("power entry size overflowed")]
    SizeOverflow,
    #[error("unrecognized wake pattern type {0}")]
    UnknownWolPacketType(u32),
    #[error("unrecognized protocol offload type {0}")]
    UnknownProtocolOffloadType(u32),
    #[error("no {0:?} entry with id {1:#x}")]
    NotFound(PowerEntryType, u32),
}

impl Error {
    /// The status reported back to NDIS for this error.
    ///
    /// Malformed entries can't be told apart from a failed allocation by NDIS,
    /// so they're all reported as `NDIS_STATUS_RESOURCES`.
    pub const fn status(self) -> NdisStatus {
        match self {
            Error::WakePatternListFull => NdisStatus::PM_WOL_PATTERN_LIST_FULL,
            Error::ProtocolOffloadListFull => NdisStatus::PM_PROTOCOL_OFFLOAD_LIST_FULL,
            Error::InsufficientResources
            | Error::InvalidBufferLength { .. }
            | Error::SizeOverflow
            | Error::UnknownWolPacketType(_)
            | Error::UnknownProtocolOffloadType(_) => NdisStatus::RESOURCES,
            Error::NotFound(..) => NdisStatus::NOT_FOUND,
        }
    }

    /// The list full error for entries of type `entry_type`
    pub const fn list_full(entry_type: PowerEntryType) -> Self {
        match entry_type {
            PowerEntryType::WakePattern => Error::WakePatternListFull,
            PowerEntryType::ProtocolOffload => Error::ProtocolOffloadListFull,
        }
    }
}

impl From<Error> for NdisStatus {
    fn from(value: Error) -> Self {
        value.status()
    }
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Self {
        Error::InsufficientResources
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn success_follows_severity_bits() {
        assert!(NdisStatus::SUCCESS.is_success());
        assert!(NdisStatus(0x0000_0103).is_success());
        assert!(!NdisStatus::RESOURCES.is_success());
        assert!(!NdisStatus::PM_WOL_PATTERN_LIST_FULL.is_success());
    }

    #[test]
    fn malformed_entries_report_resources() {
        let errors = [
            Error::InsufficientResources,
            Error::InvalidBufferLength {
                required: 196,
                actual: 4,
            },
            Error::SizeOverflow,
            Error::UnknownWolPacketType(0),
            Error::UnknownProtocolOffloadType(9),
        ];

        for err in errors {
            assert_eq!(NdisStatus::from(err), NdisStatus::RESOURCES, "{err}");
        }
    }

    #[test]
    fn list_full_is_per_category() {
        assert_eq!(
            NdisStatus::from(Err(Error::list_full(PowerEntryType::WakePattern))),
            NdisStatus::PM_WOL_PATTERN_LIST_FULL
        );
        assert_eq!(
            NdisStatus::from(Err(Error::list_full(PowerEntryType::ProtocolOffload))),
            NdisStatus::PM_PROTOCOL_OFFLOAD_LIST_FULL
        );
        assert_eq!(NdisStatus::from(Ok(())), NdisStatus::SUCCESS);
    }
}
