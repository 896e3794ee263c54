//! FAT directory entry structure and parsing.
//!
//! This module implements the FAT directory entry structure which contains metadata
//! about files and directories stored in the filesystem. Each directory entry is 32 bytes
//! and contains information such as filename, attributes, timestamps, and cluster allocation.
//!
//! Long file name entries are recognised so they can be skipped, but they are not decoded.

use binread::{BinRead, BinReaderExt};
use getset::Getters;
use log::trace;
use std::fmt;
use std::io;

use super::fat_error::FATError;

pub const ATTR_READ_ONLY: u8 = 0x01;
pub const ATTR_HIDDEN: u8 = 0x02;
pub const ATTR_SYSTEM: u8 = 0x04;
pub const ATTR_VOLUME_ID: u8 = 0x08;
pub const ATTR_DIRECTORY: u8 = 0x10;
pub const ATTR_ARCHIVE: u8 = 0x20;
pub const ATTR_LONG_NAME: u8 = ATTR_READ_ONLY | ATTR_HIDDEN | ATTR_SYSTEM | ATTR_VOLUME_ID;
const ATTR_LONG_NAME_MASK: u8 = ATTR_LONG_NAME | ATTR_DIRECTORY | ATTR_ARCHIVE;

/// First name byte of the slot following the last entry of a directory.
const END_OF_DIR_MARKER: u8 = 0x00;
/// First name byte of a deleted entry.
const DELETED_MARKER: u8 = 0xE5;

/// FAT directory entry structure.
///
/// Each directory entry is exactly 32 bytes and contains metadata about a file or directory.
///
/// # Notes
/// - Timestamp fields are prefixed with underscore as they're not currently used
/// - The name field uses the legacy 8.3 format with space padding
#[derive(BinRead, Debug, Clone, PartialEq, Eq, Getters)]
#[br(little)]
pub struct DirEntry {
    /// Filename in 8.3 format (8 characters for name, 3 for extension)
    #[get = "pub"]
    name: [u8; 11],
    /// File attributes byte
    #[get = "pub"]
    attr: u8,
    /// NT reserved (unused)
    _n_t_res: u8,
    /// Creation time in 10ms units
    _crt_time_tenth: u8,
    /// Creation time
    _crt_time: u16,
    /// Creation date
    _crt_date: u16,
    /// Last access date
    _lst_acc_date: u16,
    /// High 16 bits of first cluster number
    fst_clus_hi: u16,
    /// Last write time
    _wrt_time: u16,
    /// Last write date
    _wrt_date: u16,
    /// Low 16 bits of first cluster number
    fst_clus_lo: u16,
    /// File size in bytes (0 for directories)
    #[get = "pub"]
    file_size: u32,
}

/// What a 32-byte directory slot holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirSlot {
    /// No entry is stored in this slot or any later one.
    End,
    /// A deleted entry or a long file name fragment.
    Skip,
    /// The volume label of the root directory.
    VolumeLabel(String),
    /// A file or a directory.
    Entry(DirEntry),
}

impl DirEntry {
    /// Creates a directory entry from a byte slice.
    ///
    /// # Errors
    /// - `FATError::BinReadError` if the slice holds fewer than 32 bytes
    pub fn from_slice(buf: &[u8]) -> Result<Self, FATError> {
        let mut reader = io::Cursor::new(buf);
        reader.read_le().map_err(FATError::from)
    }

    /// Decodes a 32-byte directory slot.
    ///
    /// # Returns
    /// - `DirSlot::End` if the first name byte is 0x00
    /// - `DirSlot::Skip` for deleted entries (0xE5) and long file name entries
    /// - `DirSlot::VolumeLabel` for the volume label entry
    /// - `DirSlot::Entry` for files and directories
    pub fn decode(buf: &[u8]) -> Result<DirSlot, FATError> {
        let entry = Self::from_slice(buf)?;

        let slot = match entry.name[0] {
            END_OF_DIR_MARKER => DirSlot::End,
            DELETED_MARKER => DirSlot::Skip,
            _ if entry.attr & ATTR_LONG_NAME_MASK == ATTR_LONG_NAME => DirSlot::Skip,
            _ if entry.attr & ATTR_VOLUME_ID != 0 => {
                DirSlot::VolumeLabel(String::from_utf8_lossy(&entry.name).trim_end().to_string())
            }
            _ => DirSlot::Entry(entry),
        };

        trace!("Decoded directory slot: {slot:?}");
        Ok(slot)
    }

    /// Returns the name of the entry.
    ///
    /// The base name and the extension are stripped of their padding independently. A file name
    /// joins them with a `.` when the extension is not empty. A directory name never carries the
    /// separator.
    pub fn short_name(&self) -> String {
        let base = String::from_utf8_lossy(&self.name[0..8]);
        let ext = String::from_utf8_lossy(&self.name[8..11]);
        let (base, ext) = (base.trim_end_matches(' '), ext.trim_end_matches(' '));

        if ext.is_empty() {
            base.to_string()
        } else if self.is_dir() {
            format!("{base}{ext}")
        } else {
            format!("{base}.{ext}")
        }
    }

    /// Returns the name of the entry for use as a single host path component.
    ///
    /// # Errors
    /// - `FATError::InvalidName` if the name is empty, `.`, `..`, or holds a path separator or NUL
    pub fn host_file_name(&self) -> Result<String, FATError> {
        let name = self.short_name();
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(['/', '\\', '\0'])
        {
            return Err(FATError::InvalidName(name));
        }
        Ok(name)
    }

    /// Checks if `name` designates this entry, ignoring ASCII case.
    pub fn same_name(&self, name: &str) -> bool {
        self.short_name().eq_ignore_ascii_case(name)
    }

    /// Returns the complete first cluster number for this entry.
    ///
    /// Combines `fst_clus_hi` and `fst_clus_lo` to form the complete cluster number:
    /// `(fst_clus_hi << 16) | fst_clus_lo`
    pub fn cluster_number(&self) -> u32 {
        ((self.fst_clus_hi as u32) << 16) | self.fst_clus_lo as u32
    }

    /// Checks if the directory attribute bit (0x10) is set.
    pub fn is_dir(&self) -> bool {
        self.attr & ATTR_DIRECTORY != 0
    }

    /// Checks if the entry is the `.` or `..` entry of a subdirectory.
    pub fn is_dot_entry(&self) -> bool {
        self.is_dir() && self.name[0] == b'.'
    }
}

impl fmt::Display for DirEntry {
    /// Formats the directory entry as a listing line.
    ///
    /// - `FILENAME.EXT        1234` for files
    /// - `<DIRNAME>` for directories
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_dir() {
            write!(f, "<{}>", self.short_name())
        } else {
            write!(f, "{:<14}{:>12}", self.short_name(), self.file_size)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::test_image::dir_entry_bytes;

    fn entry(raw: &[u8; 32]) -> DirEntry {
        match DirEntry::decode(raw).unwrap() {
            DirSlot::Entry(entry) => entry,
            other => panic!("expected an entry, got {other:?}"),
        }
    }

    #[test]
    fn decodes_file_entry() {
        let raw = dir_entry_bytes(b"FILE    TXT", ATTR_ARCHIVE, 0x0001_0003, 10);
        let entry = entry(&raw);

        assert_eq!(entry.name(), b"FILE    TXT");
        assert_eq!(*entry.attr(), ATTR_ARCHIVE);
        assert_eq!(entry.cluster_number(), 0x0001_0003);
        assert_eq!(*entry.file_size(), 10);
        assert_eq!(entry.short_name(), "FILE.TXT");
        assert!(!entry.is_dir());
    }

    #[test]
    fn names_are_trimmed_independently() {
        let raw = dir_entry_bytes(b"A       B  ", ATTR_ARCHIVE, 3, 1);
        assert_eq!(entry(&raw).short_name(), "A.B");

        let raw = dir_entry_bytes(b"README     ", ATTR_ARCHIVE, 3, 1);
        assert_eq!(entry(&raw).short_name(), "README");

        let raw = dir_entry_bytes(b"LONGNAMEEXT", ATTR_ARCHIVE, 3, 1);
        assert_eq!(entry(&raw).short_name(), "LONGNAME.EXT");
    }

    #[test]
    fn directory_names_never_carry_a_dot() {
        let raw = dir_entry_bytes(b"DOCS       ", ATTR_DIRECTORY, 5, 0);
        assert_eq!(entry(&raw).short_name(), "DOCS");

        let raw = dir_entry_bytes(b"PHOTOS  OLD", ATTR_DIRECTORY, 5, 0);
        assert_eq!(entry(&raw).short_name(), "PHOTOSOLD");

        let raw = dir_entry_bytes(b"..         ", ATTR_DIRECTORY, 0, 0);
        let dotdot = entry(&raw);
        assert_eq!(dotdot.short_name(), "..");
        assert!(dotdot.is_dot_entry());
    }

    #[test]
    fn sentinels() {
        let mut raw = dir_entry_bytes(b"FILE    TXT", ATTR_ARCHIVE, 3, 10);
        raw[0] = 0x00;
        assert_eq!(DirEntry::decode(&raw).unwrap(), DirSlot::End);

        raw[0] = 0xE5;
        assert_eq!(DirEntry::decode(&raw).unwrap(), DirSlot::Skip);

        let lfn = dir_entry_bytes(b"Ab\0c\0d\0e\0f\0", ATTR_LONG_NAME, 0, 0);
        assert_eq!(DirEntry::decode(&lfn).unwrap(), DirSlot::Skip);

        let label = dir_entry_bytes(b"MY DISK    ", ATTR_VOLUME_ID | ATTR_ARCHIVE, 0, 0);
        assert_eq!(
            DirEntry::decode(&label).unwrap(),
            DirSlot::VolumeLabel(String::from("MY DISK"))
        );
    }

    #[test]
    fn name_comparison_ignores_case() {
        let raw = dir_entry_bytes(b"FILE    TXT", ATTR_ARCHIVE, 3, 10);
        let entry = entry(&raw);
        assert!(entry.same_name("file.txt"));
        assert!(entry.same_name("FILE.TXT"));
        assert!(!entry.same_name("FILE"));
        assert!(!entry.same_name("FILE.TX"));
    }

    #[test]
    fn host_file_name_rejects_path_components() {
        let plain = entry(&dir_entry_bytes(b"FILE    TXT", ATTR_ARCHIVE, 3, 10));
        assert_eq!(plain.host_file_name().unwrap(), "FILE.TXT");

        for name in [b"../PWN  TXT", b"/TMP/ABSTXT", b"A\\B     TXT", b"NUL\0    TXT"] {
            let raw = dir_entry_bytes(name, ATTR_ARCHIVE, 3, 10);
            assert!(matches!(
                entry(&raw).host_file_name(),
                Err(FATError::InvalidName(_))
            ));
        }

        let dotdot = entry(&dir_entry_bytes(b"..         ", ATTR_DIRECTORY, 0, 0));
        assert!(matches!(dotdot.host_file_name(), Err(FATError::InvalidName(_))));
    }

    #[test]
    fn short_slice_is_an_error() {
        let raw = dir_entry_bytes(b"FILE    TXT", ATTR_ARCHIVE, 3, 10);
        assert!(matches!(
            DirEntry::decode(&raw[..20]),
            Err(FATError::BinReadError(_))
        ));
    }

    #[test]
    fn display_marks_directories() {
        let dir = entry(&dir_entry_bytes(b"DOCS       ", ATTR_DIRECTORY, 5, 0));
        assert_eq!(dir.to_string(), "<DOCS>");

        let file = entry(&dir_entry_bytes(b"FILE    TXT", ATTR_ARCHIVE, 3, 10));
        assert!(file.to_string().starts_with("FILE.TXT"));
        assert!(file.to_string().ends_with("10"));
    }
}
