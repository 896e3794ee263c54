//!
//! FAT Explorer: A library and CLI for navigating FAT32 volume images.
//!
//! This crate provides tools for:
//! - Parsing and validating the boot sector, the FAT and the FSInfo sector
//! - Walking cluster chains and listing directories
//! - Reading and retrieving files
//! - Handling user commands of the interactive shell
//!
//! The volume is only ever read. Writing is not supported.
//!
//! # Re-exports
//! - [`FATVol`]: FAT volume session
//! - [`FATError`]: Error type of every volume operation
//! - [`DirEntry`]: Decoded directory entry
//! - [`SessionState`]: Bring-up states of a session

pub mod commands;
pub mod constants;
pub mod filesystem;
pub mod traits;
pub mod utils;

/// Directory entry (see [`filesystem::dir_entry::DirEntry`]).
pub use crate::filesystem::dir_entry::DirEntry;
/// FAT volume session (see [`filesystem::fat::FATVol`]).
pub use crate::filesystem::fat::FATVol;
/// Error type (see [`filesystem::fat_error::FATError`]).
pub use crate::filesystem::fat_error::FATError;
/// Session states (see [`filesystem::state::SessionState`]).
pub use crate::filesystem::state::SessionState;
