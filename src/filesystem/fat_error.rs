//! Error types for FAT32 volume decoding and navigation.
//!
//! Errors raised while bringing a session up (boot sector, FAT signature, FSInfo) are fatal to
//! the session. Lookup errors raised while navigating (`NotFound`) leave the session usable.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use super::fat_type::FATType;

/// Errors that can occur while reading a FAT32 volume.
#[derive(Error, Debug)]
pub enum FATError {
    /// Fewer bytes were returned than requested.
    #[error("Short read at offset {offset}: {read} of {expected} bytes")]
    ShortRead {
        offset: u64,
        expected: usize,
        read: usize,
    },

    /// The boot sector could not be read or is malformed.
    #[error("Invalid boot sector: {0}")]
    InvalidBootSector(String),

    /// The volume is FAT12 or FAT16.
    #[error("Unsupported FAT type: `{0}`")]
    UnsupportedFATType(FATType),

    /// The two reserved entries at the start of the FAT hold unexpected values.
    #[error("Invalid FAT signature: entry 0 = 0x{entry_0:08X}, entry 1 = 0x{entry_1:08X}")]
    InvalidFATSignature { entry_0: u32, entry_1: u32 },

    /// One of the three FSInfo signatures is wrong.
    #[error("Invalid FSInfo sector: {0}")]
    InvalidFsInfo(String),

    /// A cluster number outside of the data region was encountered.
    #[error("Invalid cluster number: {0}")]
    InvalidCluster(u32),

    /// A chain links to a cluster marked as bad.
    #[error("Cluster {0} is linked to a bad cluster")]
    BadCluster(u32),

    /// A chain visits the same cluster twice.
    #[error("Cyclic cluster chain: cluster {0} visited twice")]
    CyclicChain(u32),

    /// The cluster chain of a file cannot hold its recorded size.
    #[error("Truncated file: {needed} bytes recorded but only {available} bytes allocated")]
    TruncatedFile { needed: u64, available: u64 },

    /// No entry with that name exists in the directory.
    #[error("`{0}` not found")]
    NotFound(String),

    /// File content was requested for a directory.
    #[error("`{0}` is a directory")]
    IsADirectory(String),

    /// An on-disk name cannot be used as a host file name.
    #[error("`{0}` is not a valid file name")]
    InvalidName(String),

    /// The destination file already exists.
    #[error("`{}` already exists", .0.display())]
    AlreadyExists(PathBuf),

    /// Underlying I/O errors.
    #[error("IO Error: `{0}`")]
    IOError(io::Error),

    /// Parsing error occured during structure initialization
    #[error("BinRead Error: `{0}`")]
    BinReadError(binread::Error),
}

/// Converts standard I/O errors into FATError.
impl From<io::Error> for FATError {
    fn from(err: io::Error) -> Self {
        FATError::IOError(err)
    }
}

/// Converts BinRead errors into FATError.
impl From<binread::Error> for FATError {
    fn from(err: binread::Error) -> Self {
        FATError::BinReadError(err)
    }
}
