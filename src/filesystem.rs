//! This module provides the structures to read a FAT32 volume.
//!
//! It parses the boot sector and the FSInfo sector, walks cluster chains through the FAT and
//! decodes directory entries.
pub mod bpb;
pub mod cluster_chain;
pub mod data_region;
pub mod dir_entry;
pub mod fat;
pub mod fat_error;
pub mod fat_table;
pub mod fat_type;
pub mod fs_info;
pub mod state;

#[cfg(test)]
mod test_image;
