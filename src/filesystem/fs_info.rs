//! FSInfo sector structure.
//!
//! The FSInfo sector caches the count of free clusters and a hint of where to look for the next
//! free cluster. Both values are advisory and may be stale.

use binread::{BinRead, BinReaderExt};
use getset::Getters;
use log::warn;
use std::io;

use super::fat_error::FATError;
use crate::constants::{FSI_LEAD_SIG, FSI_STRUC_SIG, FSI_TRAIL_SIG, FSI_UNKNOWN};
use crate::utils;

/// FSInfo sector of a FAT32 volume.
#[derive(BinRead, Debug, Getters)]
#[br(little)]
pub struct FsInfo {
    /// Lead signature (0x41615252)
    #[get = "pub"]
    lead_sig: u32,
    #[br(count = 480)]
    _reserved_1: Vec<u8>,
    /// Structure signature (0x61417272)
    #[get = "pub"]
    struc_sig: u32,
    /// Last known count of free clusters (0xFFFFFFFF if unknown)
    free_count: u32,
    /// Hint of the first free cluster (0xFFFFFFFF if unknown)
    nxt_free: u32,
    _reserved_2: [u8; 12],
    /// Trail signature (0xAA550000)
    #[get = "pub"]
    trail_sig: u32,
}

impl FsInfo {
    /// Reads and validates the FSInfo sector.
    ///
    /// # Parameters
    /// - `reader`: The volume
    /// - `sector`: The sector number of the FSInfo structure (`BPB_FSInfo`)
    /// - `sector_size`: The size of each sector in bytes
    ///
    /// # Errors
    /// - `FATError::InvalidFsInfo` if one of the three signatures is wrong
    /// - `FATError::ShortRead` or `FATError::IOError` if the sector cannot be read
    pub fn from<T: io::Read + io::Seek>(
        reader: &mut T,
        sector: u16,
        sector_size: usize,
    ) -> Result<FsInfo, FATError> {
        let buf = utils::read_sector(reader, sector.into(), sector_size)?;

        let mut reader = io::Cursor::new(buf);
        let fs_info: FsInfo = reader.read_le()?;

        fs_info.validate()
    }

    fn validate(self) -> Result<Self, FATError> {
        if self.lead_sig != FSI_LEAD_SIG {
            return Err(FATError::InvalidFsInfo(format!(
                "lead signature 0x{:08X}, expected 0x{FSI_LEAD_SIG:08X}",
                self.lead_sig
            )));
        }
        if self.struc_sig != FSI_STRUC_SIG {
            return Err(FATError::InvalidFsInfo(format!(
                "structure signature 0x{:08X}, expected 0x{FSI_STRUC_SIG:08X}",
                self.struc_sig
            )));
        }
        if self.trail_sig != FSI_TRAIL_SIG {
            return Err(FATError::InvalidFsInfo(format!(
                "trail signature 0x{:08X}, expected 0x{FSI_TRAIL_SIG:08X}",
                self.trail_sig
            )));
        }

        if self.free_count == FSI_UNKNOWN {
            warn!("FSInfo does not know the count of free clusters");
        }

        Ok(self)
    }

    /// Returns the last known count of free clusters, `None` if unknown.
    pub fn free_clusters(&self) -> Option<u32> {
        (self.free_count != FSI_UNKNOWN).then_some(self.free_count)
    }

    /// Returns the hint of the next free cluster, `None` if unknown.
    pub fn next_free(&self) -> Option<u32> {
        (self.nxt_free != FSI_UNKNOWN).then_some(self.nxt_free)
    }
}
