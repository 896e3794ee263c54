//! Cluster to sector arithmetic of the data region.

use getset::CopyGetters;

use super::bpb::Bpb;
use super::fat_error::FATError;
use crate::constants::FIRST_DATA_CLUSTER;

/// Geometry of the data region of a FAT32 volume.
#[derive(Debug, Clone, Copy, CopyGetters)]
pub struct DataRegion {
    /// First sector of cluster 2
    #[get_copy = "pub"]
    first_data_sector: u32,
    #[get_copy = "pub"]
    sec_per_clus: u32,
    #[get_copy = "pub"]
    bytes_per_sec: u32,
    /// Count of data clusters
    #[get_copy = "pub"]
    cluster_count: u32,
}

impl DataRegion {
    pub fn new(bpb: &Bpb) -> Result<Self, FATError> {
        Ok(DataRegion {
            first_data_sector: bpb.first_data_sector(),
            sec_per_clus: *bpb.sec_per_clus() as u32,
            bytes_per_sec: *bpb.bytes_per_sec() as u32,
            cluster_count: bpb.cluster_count()?,
        })
    }

    /// Returns the size of a cluster in bytes.
    pub fn cluster_size(&self) -> usize {
        self.sec_per_clus as usize * self.bytes_per_sec as usize
    }

    /// Converts a cluster number to its first sector.
    ///
    /// `first_data_sector + (cluster - 2) * sec_per_clus`
    ///
    /// # Errors
    /// - `FATError::InvalidCluster` if `cluster` is reserved (0 or 1) or past the last cluster
    pub fn clus_to_sector(&self, cluster: u32) -> Result<u64, FATError> {
        if cluster < FIRST_DATA_CLUSTER || cluster - FIRST_DATA_CLUSTER >= self.cluster_count {
            return Err(FATError::InvalidCluster(cluster));
        }

        Ok(self.first_data_sector as u64
            + (cluster - FIRST_DATA_CLUSTER) as u64 * self.sec_per_clus as u64)
    }

    /// Returns the byte offset of the first byte of `cluster`.
    pub fn cluster_offset(&self, cluster: u32) -> Result<u64, FATError> {
        Ok(self.clus_to_sector(cluster)? * self.bytes_per_sec as u64)
    }
}
