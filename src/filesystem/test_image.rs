//! Synthetic FAT32 volumes for the unit tests.
//!
//! The default geometry is 512-byte sectors, 8 sectors per cluster, 32 reserved sectors and two
//! FATs of 4 sectors each, in a 64 KiB image. `BPB_TotSec32` claims enough sectors for the volume
//! to classify as FAT32; only the first 64 KiB are ever read.

use crate::constants::{FSI_LEAD_SIG, FSI_STRUC_SIG, FSI_TRAIL_SIG};

/// Total sectors of the smallest FAT32 volume with the default geometry.
pub const FAT32_TOT_SEC: u32 = 40 + 65525 * 8;

/// End-of-chain value written by the tests.
pub const EOC: u32 = 0x0FFF_FFFF;

pub struct ImageBuilder {
    pub bytes_per_sec: u16,
    pub sec_per_clus: u8,
    pub rsvd_sec_cnt: u16,
    pub num_fat: u8,
    pub fat_sz_32: u32,
    pub tot_sec_32: u32,
    pub root_clus: u32,
    pub free_count: u32,
    pub image_len: usize,
}

impl Default for ImageBuilder {
    fn default() -> Self {
        ImageBuilder {
            bytes_per_sec: 512,
            sec_per_clus: 8,
            rsvd_sec_cnt: 32,
            num_fat: 2,
            fat_sz_32: 4,
            tot_sec_32: FAT32_TOT_SEC,
            root_clus: 2,
            free_count: 100,
            image_len: 64 * 1024,
        }
    }
}

impl ImageBuilder {
    /// Builds an image with a boot sector, an FSInfo sector, the two reserved FAT entries of every
    /// FAT copy and an empty root directory.
    pub fn build(&self) -> Vec<u8> {
        let mut image = vec![0u8; self.image_len];

        let bs = &mut image[0..512];
        bs[0..3].copy_from_slice(&[0xEB, 0x58, 0x90]);
        bs[3..11].copy_from_slice(b"MSWIN4.1");
        bs[11..13].copy_from_slice(&self.bytes_per_sec.to_le_bytes());
        bs[13] = self.sec_per_clus;
        bs[14..16].copy_from_slice(&self.rsvd_sec_cnt.to_le_bytes());
        bs[16] = self.num_fat;
        bs[21] = 0xF8;
        bs[24..26].copy_from_slice(&32u16.to_le_bytes());
        bs[26..28].copy_from_slice(&64u16.to_le_bytes());
        bs[32..36].copy_from_slice(&self.tot_sec_32.to_le_bytes());
        bs[36..40].copy_from_slice(&self.fat_sz_32.to_le_bytes());
        bs[44..48].copy_from_slice(&self.root_clus.to_le_bytes());
        bs[48..50].copy_from_slice(&1u16.to_le_bytes());
        bs[50..52].copy_from_slice(&6u16.to_le_bytes());
        bs[64] = 0x80;
        bs[66] = 0x29;
        bs[67..71].copy_from_slice(&0x1234_ABCDu32.to_le_bytes());
        bs[71..82].copy_from_slice(b"TESTVOL    ");
        bs[82..90].copy_from_slice(b"FAT32   ");
        bs[510] = 0x55;
        bs[511] = 0xAA;

        let fsi_start = self.bytes_per_sec as usize;
        let fsi = &mut image[fsi_start..fsi_start + 512];
        fsi[0..4].copy_from_slice(&FSI_LEAD_SIG.to_le_bytes());
        fsi[484..488].copy_from_slice(&FSI_STRUC_SIG.to_le_bytes());
        fsi[488..492].copy_from_slice(&self.free_count.to_le_bytes());
        fsi[492..496].copy_from_slice(&4u32.to_le_bytes());
        fsi[508..512].copy_from_slice(&FSI_TRAIL_SIG.to_le_bytes());

        self.set_fat_entry(&mut image, 0, 0x0FFF_FFF8);
        self.set_fat_entry(&mut image, 1, 0xFFFF_FFFF);
        self.set_fat_entry(&mut image, self.root_clus, EOC);

        image
    }

    /// Writes `value` in the entry of `cluster` of every FAT copy.
    pub fn set_fat_entry(&self, image: &mut [u8], cluster: u32, value: u32) {
        let fat_bytes = self.fat_sz_32 as usize * self.bytes_per_sec as usize;
        let fat_start = self.rsvd_sec_cnt as usize * self.bytes_per_sec as usize;

        for i in 0..self.num_fat as usize {
            let off = fat_start + i * fat_bytes + cluster as usize * 4;
            image[off..off + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    /// Links `clusters` into a chain terminated by an end-of-chain marker.
    pub fn set_chain(&self, image: &mut [u8], clusters: &[u32]) {
        for pair in clusters.windows(2) {
            self.set_fat_entry(image, pair[0], pair[1]);
        }
        if let Some(last) = clusters.last() {
            self.set_fat_entry(image, *last, EOC);
        }
    }

    pub fn cluster_size(&self) -> usize {
        self.bytes_per_sec as usize * self.sec_per_clus as usize
    }

    /// Returns the byte offset of the first byte of `cluster`.
    pub fn cluster_offset(&self, cluster: u32) -> usize {
        let first_data_sector =
            self.rsvd_sec_cnt as usize + self.num_fat as usize * self.fat_sz_32 as usize;
        (first_data_sector + (cluster as usize - 2) * self.sec_per_clus as usize)
            * self.bytes_per_sec as usize
    }

    /// Writes `data` at the start of `cluster`.
    pub fn write_cluster(&self, image: &mut [u8], cluster: u32, data: &[u8]) {
        let off = self.cluster_offset(cluster);
        image[off..off + data.len()].copy_from_slice(data);
    }

    /// Writes a raw 32-byte record in slot `slot` of the directory cluster `cluster`.
    pub fn write_dir_entry(&self, image: &mut [u8], cluster: u32, slot: usize, raw: &[u8; 32]) {
        let off = self.cluster_offset(cluster) + slot * 32;
        image[off..off + 32].copy_from_slice(raw);
    }
}

/// Encodes a short directory entry.
pub fn dir_entry_bytes(name: &[u8; 11], attr: u8, cluster: u32, size: u32) -> [u8; 32] {
    let mut raw = [0u8; 32];
    raw[0..11].copy_from_slice(name);
    raw[11] = attr;
    raw[20..22].copy_from_slice(&((cluster >> 16) as u16).to_le_bytes());
    raw[26..28].copy_from_slice(&(cluster as u16).to_le_bytes());
    raw[28..32].copy_from_slice(&size.to_le_bytes());
    raw
}
