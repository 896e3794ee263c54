//! FAT Bpb structure.
//!
//! This module implements:
//! - BIOS Parameter Block (Bpb) parsing and validation
//! - FAT type detection (FAT12/16/32)
//! - The derived geometry of the volume (first data sector, count of clusters)

use binread::{BinRead, BinReaderExt};
use getset::Getters;
use std::fmt;
use std::io;

use super::fat_error::FATError;
use super::fat_type::FATType;
use crate::constants::{BOOT_SECTOR_SIZE, BOOT_SIGNATURE};
use crate::utils;

/// BIOS Parameter Block structure for FAT filesystems.
///
/// The Bpb contains essential information about the filesystem layout and properties.
/// This implementation follows Microsoft's FAT32 specification.
#[derive(BinRead, Debug, Getters)]
#[br(little)]
pub struct Bpb {
    /// Jump instruction to boot code (must be 0xEB ?? 0x90 or 0xE9 ?? ??)
    jmp: [u8; 3],
    /// OEM identifier (e.g., "MSWIN4.1")
    oem_name: [u8; 8],
    /// Number of bytes per sector (512, 1024, 2048, or 4096)
    #[get = "pub"]
    bytes_per_sec: u16,
    /// Number of sectors per cluster (power of 2: 1, 2, 4, 8, 16, 32, 64, or 128)
    #[get = "pub"]
    sec_per_clus: u8,
    /// Number of reserved sectors from start of volume
    #[get = "pub"]
    rsvd_sec_cnt: u16,
    /// Number of FAT copies (typically 2 for redundancy)
    #[get = "pub"]
    num_fat: u8,
    /// Maximum number of root directory entries (0 for FAT32)
    root_ent_cnt: u16,
    /// Total sectors for volumes < 32MB (0 for FAT32)
    tot_sec_16: u16,
    /// Media descriptor (0xF8 for fixed disk)
    #[get = "pub"]
    media: u8,
    /// Sectors per FAT for FAT12/FAT16 (0 for FAT32)
    fat_sz_16: u16,
    /// Sectors per track
    sec_per_trk: u16,
    /// Number of heads
    num_heads: u16,
    /// Number of hidden sectors preceding the partition
    hidd_sec: u32,
    /// Total sectors for volumes >= 32MB
    #[get = "pub"]
    tot_sec_32: u32,

    // FAT32-specific fields
    /// Sectors per FAT
    #[get = "pub"]
    fat_sz_32: u32,
    /// FAT flags (mirroring, active FAT)
    ext_flags: u16,
    /// Filesystem version (minor, major)
    fs_ver: [u8; 2],
    /// First cluster of root directory (typically 2)
    #[get = "pub"]
    root_clus: u32,
    /// Sector number of FSINFO structure
    #[get = "pub"]
    fs_info: u16,
    /// Sector number of backup boot sector
    bk_boot_sec: u16,
    /// Reserved for future expansion
    _reserved: [u8; 12],
    /// Drive number (0x80 for hard disk)
    drv_num: u8,
    /// Reserved (used by Windows NT)
    _reserved_1: u8,
    /// Extended boot signature (0x29)
    boot_sig: u8,
    /// Volume serial number
    #[get = "pub"]
    vol_id: u32,
    /// Volume label (11 bytes)
    vol_lab: [u8; 11],
    /// Filesystem type label ("FAT32   ")
    fil_sys_type: [u8; 8],

    /// Boot code
    #[br(count = 420)]
    _boot_code: Vec<u8>,
    /// Boot sector signature (0x55 0xAA)
    sig: [u8; 2],
}

impl Bpb {
    /// Reads the Bpb from the first sector of a volume.
    ///
    /// # Parameters
    /// - `reader`: The volume
    /// - `validate`: Whether to perform the additional sanity checks on the Bpb fields
    ///
    /// # Returns
    /// - `Ok(Bpb)`: The parsed Bpb, signature checked
    /// - `Err(FATError)`: If reading or validation fails
    ///
    /// # Errors
    /// - `FATError::InvalidBootSector` if fewer than 512 bytes can be read, if the signature is
    ///   not 0x55AA, or if a field fails validation
    /// - `FATError::IOError` if reading from the volume fails
    pub fn from<T: io::Read + io::Seek>(reader: &mut T, validate: bool) -> Result<Bpb, FATError> {
        let buf = match utils::read_sector(reader, 0, BOOT_SECTOR_SIZE) {
            Ok(buf) => buf,
            Err(FATError::ShortRead { read, expected, .. }) => {
                return Err(FATError::InvalidBootSector(format!(
                    "read {read} of {expected} bytes"
                )));
            }
            Err(err) => return Err(err),
        };

        let mut reader = io::Cursor::new(buf);
        let bpb: Bpb = reader.read_le()?;

        bpb.check_signature()?;
        bpb.check_geometry()?;

        if validate { bpb.validate() } else { Ok(bpb) }
    }

    /// Checks the boot sector signature (0x55 0xAA).
    fn check_signature(&self) -> Result<(), FATError> {
        if self.sig != BOOT_SIGNATURE {
            return Err(FATError::InvalidBootSector(format!(
                "signature 0x{:02X}{:02X}, expected 0x55AA",
                self.sig[0], self.sig[1]
            )));
        }
        Ok(())
    }

    /// Rejects the fields every computation divides by.
    fn check_geometry(&self) -> Result<(), FATError> {
        if self.bytes_per_sec == 0 {
            return Err(FATError::InvalidBootSector(String::from(
                "BPB_BytsPerSec is 0",
            )));
        }
        if self.sec_per_clus == 0 {
            return Err(FATError::InvalidBootSector(String::from(
                "BPB_SecPerClus is 0",
            )));
        }
        Ok(())
    }

    /// Performs the sanity checks that a well-formed volume passes.
    ///
    /// # Errors
    /// - `FATError::InvalidBootSector` describing the first field that fails
    fn validate(self) -> Result<Self, FATError> {
        if !((self.jmp[0] == 0xEB && self.jmp[2] == 0x90) || self.jmp[0] == 0xE9) {
            return Err(FATError::InvalidBootSector(format!(
                "invalid jump instruction 0x{:02X}{:02X}{:02X}",
                self.jmp[0], self.jmp[1], self.jmp[2],
            )));
        }

        const VALID_BYTES_PER_SEC: [u16; 4] = [512, 1024, 2048, 4096];
        if !VALID_BYTES_PER_SEC.contains(&self.bytes_per_sec) {
            return Err(FATError::InvalidBootSector(format!(
                "invalid count of bytes per sector: {}",
                self.bytes_per_sec
            )));
        }

        if !self.sec_per_clus.is_power_of_two() {
            return Err(FATError::InvalidBootSector(format!(
                "invalid number of sectors per cluster: {}",
                self.sec_per_clus
            )));
        }

        if self.cluster_size() > 32 * 1024 {
            return Err(FATError::InvalidBootSector(format!(
                "invalid cluster size: {}",
                self.cluster_size()
            )));
        }

        if self.rsvd_sec_cnt == 0 {
            return Err(FATError::InvalidBootSector(String::from(
                "BPB_RsvdSecCnt should be greater than 0",
            )));
        }

        if self.num_fat == 0 {
            return Err(FATError::InvalidBootSector(String::from(
                "BPB_NumFATs should be greater than 0",
            )));
        }

        if self.root_ent_cnt != 0 {
            return Err(FATError::InvalidBootSector(format!(
                "BPB_RootEntCnt should be 0 for a FAT32 volume, found {}",
                self.root_ent_cnt
            )));
        }

        if self.root_clus < 2 {
            return Err(FATError::InvalidBootSector(format!(
                "BPB_RootClus should be at least 2, found {}",
                self.root_clus
            )));
        }

        Ok(self)
    }

    /// Checks that the 32-bit size fields are the authoritative ones.
    ///
    /// # Errors
    /// - `FATError::InvalidBootSector` if `BPB_TotSec16` or `BPB_FATSz16` is not 0, or if the
    ///   matching 32-bit field is 0
    pub fn check_fat32_fields(&self) -> Result<(), FATError> {
        if self.tot_sec_16 != 0 {
            return Err(FATError::InvalidBootSector(String::from(
                "BPB_TotSec16 should be 0 for a FAT32 volume",
            )));
        }
        if self.fat_sz_16 != 0 {
            return Err(FATError::InvalidBootSector(String::from(
                "BPB_FATSz16 should be 0 for a FAT32 volume",
            )));
        }
        if self.tot_sec_32 == 0 {
            return Err(FATError::InvalidBootSector(String::from(
                "BPB_TotSec32 should be greater than 0 for a FAT32 volume",
            )));
        }
        if self.fat_sz_32 == 0 {
            return Err(FATError::InvalidBootSector(String::from(
                "BPB_FATSz32 should be greater than 0 for a FAT32 volume",
            )));
        }
        Ok(())
    }

    /// Returns the sectors per FAT (`BPB_FATSz32`).
    pub fn fat_sz(&self) -> u32 {
        self.fat_sz_32
    }

    /// Returns the total count of sectors (`BPB_TotSec32`).
    pub fn tot_sec(&self) -> u32 {
        self.tot_sec_32
    }

    /// Returns the size of a cluster in bytes.
    pub fn cluster_size(&self) -> u32 {
        self.bytes_per_sec as u32 * self.sec_per_clus as u32
    }

    /// Returns the first sector of the data region: `rsvd_sec_cnt + num_fat * fat_sz`.
    pub fn first_data_sector(&self) -> u32 {
        self.rsvd_sec_cnt as u32 + self.num_fat as u32 * self.fat_sz()
    }

    /// Determines the number of clusters in the data region.
    ///
    /// # Errors
    /// - `FATError::InvalidBootSector` if the reserved and FAT regions do not fit in the volume
    pub fn cluster_count(&self) -> Result<u32, FATError> {
        let data_sec = self
            .tot_sec()
            .checked_sub(self.first_data_sector())
            .ok_or_else(|| {
                FATError::InvalidBootSector(format!(
                    "{} total sectors cannot hold a data region starting at sector {}",
                    self.tot_sec(),
                    self.first_data_sector()
                ))
            })?;

        Ok(data_sec / self.sec_per_clus as u32)
    }

    /// Determines the FAT type based on the number of clusters in the data region.
    pub fn fat_type(&self) -> Result<FATType, FATError> {
        Ok(FATType::from_cluster_count(self.cluster_count()?))
    }

    /// Returns the OEM identifier.
    pub fn oem(&self) -> String {
        String::from_utf8_lossy(&self.oem_name).trim_end().to_string()
    }

    /// Returns the volume label stored in the boot sector.
    pub fn label(&self) -> String {
        String::from_utf8_lossy(&self.vol_lab).trim_end().to_string()
    }

    /// Returns the file system type label (informative only).
    pub fn fs_type_label(&self) -> String {
        String::from_utf8_lossy(&self.fil_sys_type).trim_end().to_string()
    }

    /// Returns whether every FAT copy is kept in sync (bit 7 of `BPB_ExtFlags` clear).
    pub fn fat_mirrored(&self) -> bool {
        self.ext_flags & 0x80 == 0
    }

    /// Returns the total size of the volume in bytes.
    pub fn volume_size(&self) -> u64 {
        self.bytes_per_sec as u64 * self.tot_sec() as u64
    }
}

/// Implements the Display trait for Bpb
impl fmt::Display for Bpb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let media = match self.media {
            0xF8 => " (fixed)",
            0xF0 => " (removable)",
            _ => "",
        };

        writeln!(f, "---- Device Info ----")?;
        writeln!(f, "{:<24}{}", "OEM Name:", self.oem())?;
        writeln!(f, "{:<24}{}", "Label:", self.label())?;
        writeln!(f, "{:<24}{}", "File System Type:", self.fs_type_label())?;
        writeln!(f, "{:<24}0x{:02X}{}", "Media Type:", self.media, media)?;
        writeln!(f, "{:<24}{} bytes", "Size:", self.volume_size())?;
        writeln!(f, "{:<24}0x{:02X}", "Drive Number:", self.drv_num)?;
        writeln!(f, "{:<24}0x{:08X}", "Volume Serial:", self.vol_id)?;
        writeln!(f)?;

        writeln!(f, "--- Geometry ---")?;
        writeln!(f, "{:<24}{}", "Bytes per Sector:", self.bytes_per_sec)?;
        writeln!(f, "{:<24}{}", "Sectors per Cluster:", self.sec_per_clus)?;
        writeln!(f, "{:<24}{}", "Total Sectors:", self.tot_sec())?;
        writeln!(f, "{:<24}{}", "Sectors per Track:", self.sec_per_trk)?;
        writeln!(f, "{:<24}{}", "Heads:", self.num_heads)?;
        writeln!(f, "{:<24}{}", "Hidden Sectors:", self.hidd_sec)?;
        writeln!(f)?;

        writeln!(f, "--- FS Info ---")?;
        writeln!(f, "{:<24}{}:{}", "Version:", self.fs_ver[1], self.fs_ver[0])?;
        writeln!(f, "{:<24}{}", "Reserved Sectors:", self.rsvd_sec_cnt)?;
        writeln!(f, "{:<24}{}", "Number of FATs:", self.num_fat)?;
        writeln!(f, "{:<24}{}", "FAT Size:", self.fat_sz())?;
        writeln!(
            f,
            "{:<24}{}",
            "Mirrored FAT:",
            if self.fat_mirrored() { "yes" } else { "no" }
        )?;
        writeln!(f, "{:<24}{}", "Root Cluster:", self.root_clus)?;
        writeln!(f, "{:<24}{}", "FSInfo Sector:", self.fs_info)?;
        writeln!(f, "{:<24}{}", "Backup Boot Sector:", self.bk_boot_sec)?;
        write!(f, "{:<24}0x{:02X}", "Boot Signature:", self.boot_sig)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::test_image::ImageBuilder;
    use std::io::Cursor;

    #[test]
    fn parses_fields_at_their_offsets() {
        let image = ImageBuilder::default().build();
        let bpb = Bpb::from(&mut Cursor::new(image), true).unwrap();

        assert_eq!(*bpb.bytes_per_sec(), 512);
        assert_eq!(*bpb.sec_per_clus(), 8);
        assert_eq!(*bpb.rsvd_sec_cnt(), 32);
        assert_eq!(*bpb.num_fat(), 2);
        assert_eq!(*bpb.fat_sz_32(), 4);
        assert_eq!(*bpb.root_clus(), 2);
        assert_eq!(*bpb.fs_info(), 1);
        assert_eq!(*bpb.media(), 0xF8);
        assert_eq!(bpb.oem(), "MSWIN4.1");
        assert_eq!(bpb.label(), "TESTVOL");
        assert_eq!(bpb.fs_type_label(), "FAT32");
        assert!(bpb.fat_mirrored());
    }

    #[test]
    fn derives_geometry() {
        let image = ImageBuilder::default().build();
        let bpb = Bpb::from(&mut Cursor::new(image), true).unwrap();

        assert_eq!(bpb.first_data_sector(), 32 + 2 * 4);
        assert_eq!(bpb.cluster_size(), 4096);
        assert_eq!(bpb.cluster_count().unwrap(), 65525);
        assert_eq!(bpb.fat_type().unwrap(), FATType::FAT32);
        bpb.check_fat32_fields().unwrap();
    }

    #[test]
    fn geometry_ignores_16_bit_fields() {
        let mut image = ImageBuilder::default().build();
        image[17..19].copy_from_slice(&512u16.to_le_bytes());
        image[19..21].copy_from_slice(&1000u16.to_le_bytes());
        image[22..24].copy_from_slice(&9u16.to_le_bytes());
        let bpb = Bpb::from(&mut Cursor::new(image), false).unwrap();

        assert_eq!(bpb.first_data_sector(), 40);
        assert_eq!(bpb.tot_sec(), 40 + 65525 * 8);
        assert_eq!(bpb.fat_sz(), 4);
        assert_eq!(bpb.fat_type().unwrap(), FATType::FAT32);
    }

    #[test]
    fn small_volume_classifies_as_fat12() {
        let image = ImageBuilder {
            tot_sec_32: 128,
            ..ImageBuilder::default()
        }
        .build();
        let bpb = Bpb::from(&mut Cursor::new(image), true).unwrap();

        assert_eq!(bpb.cluster_count().unwrap(), (128 - 40) / 8);
        assert_eq!(bpb.fat_type().unwrap(), FATType::FAT12);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut image = ImageBuilder::default().build();
        image[511] = 0x00;
        assert!(matches!(
            Bpb::from(&mut Cursor::new(image), false),
            Err(FATError::InvalidBootSector(_))
        ));
    }

    #[test]
    fn rejects_short_boot_sector() {
        let image = ImageBuilder::default().build();
        let truncated = image[..300].to_vec();
        assert!(matches!(
            Bpb::from(&mut Cursor::new(truncated), false),
            Err(FATError::InvalidBootSector(_))
        ));
    }

    #[test]
    fn rejects_non_zero_16_bit_fields() {
        let mut image = ImageBuilder::default().build();
        image[19..21].copy_from_slice(&100u16.to_le_bytes());
        let bpb = Bpb::from(&mut Cursor::new(image), false).unwrap();
        assert!(matches!(
            bpb.check_fat32_fields(),
            Err(FATError::InvalidBootSector(_))
        ));
    }

    #[test]
    fn strict_validation_can_be_skipped() {
        let mut image = ImageBuilder::default().build();
        image[0] = 0x00;
        assert!(matches!(
            Bpb::from(&mut Cursor::new(image.clone()), true),
            Err(FATError::InvalidBootSector(_))
        ));
        assert!(Bpb::from(&mut Cursor::new(image), false).is_ok());
    }

    #[test]
    fn zero_sectors_per_cluster_is_always_rejected() {
        let mut image = ImageBuilder::default().build();
        image[13] = 0;
        assert!(matches!(
            Bpb::from(&mut Cursor::new(image), false),
            Err(FATError::InvalidBootSector(_))
        ));
    }

    #[test]
    fn underflowing_data_region_is_reported() {
        let image = ImageBuilder {
            tot_sec_32: 10,
            ..ImageBuilder::default()
        }
        .build();
        let bpb = Bpb::from(&mut Cursor::new(image), false).unwrap();
        assert!(matches!(
            bpb.cluster_count(),
            Err(FATError::InvalidBootSector(_))
        ));
    }

    #[test]
    fn info_report_lists_device_and_geometry() {
        let image = ImageBuilder::default().build();
        let bpb = Bpb::from(&mut Cursor::new(image), true).unwrap();
        let report = bpb.to_string();

        assert!(report.contains("OEM Name:"));
        assert!(report.contains("MSWIN4.1"));
        assert!(report.contains("0xF8 (fixed)"));
        assert!(report.contains("Sectors per Cluster:"));
        assert!(report.contains("Mirrored FAT:"));
    }
}
