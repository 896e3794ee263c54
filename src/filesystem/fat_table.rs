//! Access to the File Allocation Table.
//!
//! Every lookup reads the 4-byte entry of a single cluster from the first FAT copy. The table is
//! never cached, so two lookups of the same cluster always see the bytes on the volume.

use getset::CopyGetters;
use log::trace;
use std::io;

use super::bpb::Bpb;
use super::fat_error::FATError;
use crate::constants::{
    FAT_ENTRY_0, FAT_ENTRY_1, FAT_ENTRY_SIZE, FAT32_ENTRY_MASK, FIRST_DATA_CLUSTER,
};
use crate::utils;

/// Location of the first FAT copy on the volume.
#[derive(Debug, Clone, Copy, CopyGetters)]
pub struct FatTable {
    /// Byte offset of the first FAT copy
    #[get_copy = "pub"]
    start: u64,
    /// Size of one FAT copy in bytes
    #[get_copy = "pub"]
    size: u64,
    /// Count of data clusters on the volume
    #[get_copy = "pub"]
    cluster_count: u32,
}

impl FatTable {
    /// Locates the first FAT copy described by `bpb`.
    pub fn new(bpb: &Bpb) -> Result<Self, FATError> {
        let bytes_per_sec = *bpb.bytes_per_sec() as u64;

        Ok(FatTable {
            start: *bpb.rsvd_sec_cnt() as u64 * bytes_per_sec,
            size: bpb.fat_sz() as u64 * bytes_per_sec,
            cluster_count: bpb.cluster_count()?,
        })
    }

    /// Returns the highest valid cluster number.
    pub fn max_cluster(&self) -> u32 {
        self.cluster_count.saturating_add(FIRST_DATA_CLUSTER - 1)
    }

    /// Returns the absolute byte offset of the FAT entry of `cluster`.
    ///
    /// # Errors
    /// - `FATError::InvalidCluster` if the entry lies beyond the end of the FAT
    pub fn entry_offset(&self, cluster: u32) -> Result<u64, FATError> {
        let rel = cluster as u64 * FAT_ENTRY_SIZE;
        if rel + FAT_ENTRY_SIZE > self.size {
            return Err(FATError::InvalidCluster(cluster));
        }
        Ok(self.start + rel)
    }

    /// Reads the raw FAT entry of `cluster`, reserved bits included.
    pub fn read_entry<T: io::Read + io::Seek>(
        &self,
        reader: &mut T,
        cluster: u32,
    ) -> Result<u32, FATError> {
        let offset = self.entry_offset(cluster)?;
        let buf = utils::read_at(reader, offset, FAT_ENTRY_SIZE as usize)?;
        let entry = utils::u32_at(&buf, 0).ok_or(FATError::ShortRead {
            offset,
            expected: FAT_ENTRY_SIZE as usize,
            read: buf.len(),
        })?;

        trace!("FAT[{cluster}] = 0x{entry:08X}");
        Ok(entry)
    }

    /// Reads the FAT entry of `cluster` with its 4 reserved bits cleared.
    pub fn next_cluster<T: io::Read + io::Seek>(
        &self,
        reader: &mut T,
        cluster: u32,
    ) -> Result<u32, FATError> {
        Ok(self.read_entry(reader, cluster)? & FAT32_ENTRY_MASK)
    }

    /// Checks the two reserved entries at the start of the FAT.
    ///
    /// Entry 0 must hold 0x0FFFFFF8 and entry 1 0xFFFFFFFF, ignoring the reserved bits.
    ///
    /// # Errors
    /// - `FATError::InvalidFATSignature` if either entry differs
    pub fn check_signature<T: io::Read + io::Seek>(&self, reader: &mut T) -> Result<(), FATError> {
        let entry_0 = self.read_entry(reader, 0)?;
        let entry_1 = self.read_entry(reader, 1)?;

        if entry_0 & FAT32_ENTRY_MASK != FAT_ENTRY_0 & FAT32_ENTRY_MASK
            || entry_1 & FAT32_ENTRY_MASK != FAT_ENTRY_1 & FAT32_ENTRY_MASK
        {
            return Err(FATError::InvalidFATSignature { entry_0, entry_1 });
        }

        Ok(())
    }
}
