//! Enum for the different FAT types (FAT12, FAT16, FAT32).
//!
//! The type of a volume is derived from its count of data clusters only, never from the
//! file system type label of the boot sector.

use std::fmt;

/// Represents the different types of FAT filesystems.
///
/// Only FAT32 volumes can be navigated. FAT12 and FAT16 are detected so they can be reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FATType {
    FAT12,
    FAT16,
    FAT32,
}

impl FATType {
    /// Classifies a volume from its count of data clusters.
    ///
    /// - `FAT12` if cluster count < 4085
    /// - `FAT16` if cluster count < 65525
    /// - `FAT32` otherwise
    pub fn from_cluster_count(cluster_count: u32) -> Self {
        if cluster_count < 4085 {
            FATType::FAT12
        } else if cluster_count < 65525 {
            FATType::FAT16
        } else {
            FATType::FAT32
        }
    }
}

impl fmt::Display for FATType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FATType::FAT12 => "FAT12",
            FATType::FAT16 => "FAT16",
            FATType::FAT32 => "FAT32",
        };
        write!(f, "{s}")
    }
}
