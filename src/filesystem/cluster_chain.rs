//! Cluster chain walking.
//!
//! A chain starts at the first cluster recorded in a directory entry (or `BPB_RootClus`) and
//! follows the FAT until an end-of-chain marker.

use log::debug;
use std::collections::HashSet;
use std::io;

use super::fat_error::FATError;
use super::fat_table::FatTable;
use crate::constants::{BAD_CLUSTER, END_OF_CHAIN, FIRST_DATA_CLUSTER};

/// Lazy iterator over the clusters of a chain.
///
/// Yields the start cluster first, then one cluster per FAT lookup. The walk ends at the first
/// masked entry >= 0x0FFFFFF8. Errors are yielded once, after which the iterator is exhausted.
pub struct ClusterChain<'a, T: io::Read + io::Seek> {
    reader: &'a mut T,
    fat: FatTable,
    start: u32,
    next: Option<u32>,
    visited: HashSet<u32>,
}

impl<'a, T: io::Read + io::Seek> ClusterChain<'a, T> {
    pub fn new(reader: &'a mut T, fat: FatTable, start: u32) -> Self {
        ClusterChain {
            reader,
            fat,
            start,
            next: Some(start),
            visited: HashSet::new(),
        }
    }

    /// Gives access to the volume between two steps of the walk.
    pub fn reader(&mut self) -> &mut T {
        &mut *self.reader
    }

    fn step(&mut self, cluster: u32) -> Result<u32, FATError> {
        if cluster < FIRST_DATA_CLUSTER || cluster > self.fat.max_cluster() {
            return Err(FATError::InvalidCluster(cluster));
        }
        // Clusters are distinct and within [2, max_cluster], so a chain never exceeds the
        // count of data clusters.
        if !self.visited.insert(cluster) {
            return Err(FATError::CyclicChain(cluster));
        }

        let entry = self.fat.next_cluster(&mut *self.reader, cluster)?;
        if entry >= END_OF_CHAIN {
            debug!(
                "Chain from cluster {} ends after {} clusters",
                self.start,
                self.visited.len()
            );
            self.next = None;
        } else if entry == BAD_CLUSTER {
            return Err(FATError::BadCluster(cluster));
        } else {
            self.next = Some(entry);
        }

        Ok(cluster)
    }
}

impl<T: io::Read + io::Seek> Iterator for ClusterChain<'_, T> {
    type Item = Result<u32, FATError>;

    fn next(&mut self) -> Option<Self::Item> {
        let cluster = self.next.take()?;

        match self.step(cluster) {
            Ok(cluster) => Some(Ok(cluster)),
            Err(err) => {
                self.next = None;
                Some(Err(err))
            }
        }
    }
}
