//! On-disk constants of a FAT32 volume.

/// The size of the boot sector in bytes.
pub const BOOT_SECTOR_SIZE: usize = 512;

/// Boot sector signature found at offsets 510 and 511.
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// The size of a directory entry in bytes.
pub const DIR_ENTRY_SIZE: usize = 32;

/// The size of a FAT32 entry in bytes.
pub const FAT_ENTRY_SIZE: u64 = 4;

/// Only the low 28 bits of a FAT32 entry are significant.
pub const FAT32_ENTRY_MASK: u32 = 0x0FFF_FFFF;

/// Any masked FAT entry at or above this value ends a chain.
pub const END_OF_CHAIN: u32 = 0x0FFF_FFF8;

/// FAT entry value of a cluster marked as bad.
pub const BAD_CLUSTER: u32 = 0x0FFF_FFF7;

/// Expected value of FAT entry 0 (after masking).
pub const FAT_ENTRY_0: u32 = 0x0FFF_FFF8;

/// Expected value of FAT entry 1.
pub const FAT_ENTRY_1: u32 = 0xFFFF_FFFF;

/// The first cluster of the data region.
pub const FIRST_DATA_CLUSTER: u32 = 2;

/// FSInfo lead signature.
pub const FSI_LEAD_SIG: u32 = 0x4161_5252;

/// FSInfo structure signature.
pub const FSI_STRUC_SIG: u32 = 0x6141_7272;

/// FSInfo trail signature.
pub const FSI_TRAIL_SIG: u32 = 0xAA55_0000;

/// Free cluster count value meaning "unknown".
pub const FSI_UNKNOWN: u32 = 0xFFFF_FFFF;
