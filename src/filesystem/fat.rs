//! FAT volume structure and operations.
//!
//! This module implements the core functions to interact with a FAT32 volume, including:
//! - Bringing a session up (boot sector, FAT signature, FSInfo)
//! - Listing directory entries
//! - Resolving subdirectories and files by name
//! - Reading file contents across their cluster chain
//! - Displaying the volume layout

use getset::Getters;
use log::{debug, info};
use std::fmt::Write as FmtWrite;
use std::io;
use std::path::{Path, PathBuf};

use super::bpb::Bpb;
use super::cluster_chain::ClusterChain;
use super::data_region::DataRegion;
use super::dir_entry::{DirEntry, DirSlot};
use super::fat_error::FATError;
use super::fat_table::FatTable;
use super::fat_type::FATType;
use super::fs_info::FsInfo;
use super::state::SessionState;
use crate::constants::DIR_ENTRY_SIZE;
use crate::traits::LayoutDisplay;
use crate::utils::{read_at, write_new_file};

/// Structure for a FAT32 volume session.
///
/// The volume is any seekable reader. Pass `&mut File` to keep ownership of the handle.
#[derive(Getters)]
pub struct FATVol<T: io::Read + io::Seek> {
    #[get = "pub"]
    bpb: Bpb,
    #[get = "pub"]
    fs_info: FsInfo,
    #[get = "pub"]
    fat: FatTable,
    #[get = "pub"]
    region: DataRegion,
    reader: T,
}

impl<T: io::Read + io::Seek> FATVol<T> {
    /// Reads and validates the volume metadata.
    ///
    /// # Parameters
    /// - `reader`: The volume
    /// - `validate`: Whether to perform the additional sanity checks on the Bpb
    ///
    /// # Returns
    /// - `Ok(FATVol)`: A session ready for directory operations
    /// - `Err(FATError)`: The first validation failure; the session is unusable
    ///
    /// # Errors
    /// - `FATError::InvalidBootSector` if the boot sector is short or malformed
    /// - `FATError::UnsupportedFATType` if the volume is FAT12 or FAT16
    /// - `FATError::InvalidFATSignature` if the reserved FAT entries are wrong
    /// - `FATError::InvalidFsInfo` if an FSInfo signature is wrong
    pub fn open(reader: T, validate: bool) -> Result<FATVol<T>, FATError> {
        Self::open_with_state(reader, validate, &mut SessionState::default())
    }

    /// Same as [`FATVol::open`], tracking the bring-up in `state`.
    ///
    /// `state` ends as `SessionState::Ready` on success and `SessionState::Failed` otherwise.
    pub fn open_with_state(
        mut reader: T,
        validate: bool,
        state: &mut SessionState,
    ) -> Result<FATVol<T>, FATError> {
        *state = SessionState::Unloaded;

        match Self::bring_up(&mut reader, validate, state) {
            Ok((bpb, fat, region, fs_info)) => {
                state.advance(SessionState::Ready);
                info!(
                    "Opened FAT32 volume: {} clusters of {} bytes",
                    region.cluster_count(),
                    region.cluster_size()
                );

                Ok(Self {
                    bpb,
                    fs_info,
                    fat,
                    region,
                    reader,
                })
            }
            Err(err) => {
                debug!("Bring-up stopped at state `{state}`: {err}");
                state.advance(SessionState::Failed);
                Err(err)
            }
        }
    }

    /// Runs the bring-up checks, leaving `state` at the last step passed.
    fn bring_up(
        reader: &mut T,
        validate: bool,
        state: &mut SessionState,
    ) -> Result<(Bpb, FatTable, DataRegion, FsInfo), FATError> {
        let bpb = Bpb::from(reader, validate)?;
        state.advance(SessionState::BootLoaded);

        let fat_type = bpb.fat_type()?;
        state.advance(SessionState::Classified(fat_type));
        if fat_type != FATType::FAT32 {
            return Err(FATError::UnsupportedFATType(fat_type));
        }
        bpb.check_fat32_fields()?;

        let fat = FatTable::new(&bpb)?;
        fat.check_signature(reader)?;
        state.advance(SessionState::FatValidated);

        let fs_info = FsInfo::from(reader, *bpb.fs_info(), *bpb.bytes_per_sec() as usize)?;
        state.advance(SessionState::FsInfoValidated);

        let region = DataRegion::new(&bpb)?;
        Ok((bpb, fat, region, fs_info))
    }

    /// Returns the first cluster of the root directory.
    pub fn root_cluster(&self) -> u32 {
        *self.bpb.root_clus()
    }

    /// Converts a cluster number to its corresponding sector number.
    pub fn clus_to_sector(&self, cluster: u32) -> Result<u64, FATError> {
        self.region.clus_to_sector(cluster)
    }

    /// Returns the size of a cluster in bytes.
    pub fn cluster_size(&self) -> u32 {
        self.region.cluster_size() as u32
    }

    /// Returns the free space recorded in the FSInfo sector, `None` if unknown.
    pub fn free_bytes(&self) -> Option<u64> {
        self.fs_info
            .free_clusters()
            .map(|count| count as u64 * self.cluster_size() as u64)
    }

    /// Walks the cluster chain starting at `start`.
    pub fn chain_of(&mut self, start: u32) -> ClusterChain<'_, T> {
        ClusterChain::new(&mut self.reader, self.fat, start)
    }

    /// Reads the content of a single cluster.
    pub fn read_cluster(&mut self, cluster: u32) -> Result<Vec<u8>, FATError> {
        let offset = self.region.cluster_offset(cluster)?;
        read_at(&mut self.reader, offset, self.region.cluster_size())
    }

    /// Iterates over the slots of the directory starting at `first_cluster`.
    ///
    /// The iteration stops at the first end-of-directory slot, even in the middle of a cluster.
    pub fn dir_slots(&mut self, first_cluster: u32) -> DirSlots<'_, T> {
        let region = self.region;
        DirSlots {
            chain: self.chain_of(first_cluster),
            region,
            cluster: Vec::new(),
            pos: 0,
            done: false,
        }
    }

    /// Iterates over the files and directories of the directory starting at `first_cluster`.
    pub fn dir_entries(
        &mut self,
        first_cluster: u32,
    ) -> impl Iterator<Item = Result<DirEntry, FATError>> + '_ {
        self.dir_slots(first_cluster)
            .filter_map(|slot| match slot {
                Ok(DirSlot::Entry(entry)) => Some(Ok(entry)),
                Ok(_) => None,
                Err(err) => Some(Err(err)),
            })
    }

    /// Lists the files and directories of the directory starting at `first_cluster`.
    pub fn list_dir(&mut self, first_cluster: u32) -> Result<Vec<DirEntry>, FATError> {
        self.dir_entries(first_cluster).collect()
    }

    /// Returns the volume label of the root directory, or the one of the boot sector.
    pub fn volume_label(&mut self) -> Result<String, FATError> {
        let root = self.root_cluster();
        for slot in self.dir_slots(root) {
            if let DirSlot::VolumeLabel(label) = slot? {
                return Ok(label);
            }
        }

        Ok(self.bpb.label())
    }

    /// Resolves the subdirectory `name` of the directory starting at `dir_cluster`.
    ///
    /// `..` always resolves to the root directory and `.` to `dir_cluster` itself.
    ///
    /// # Returns
    /// - The first cluster of the subdirectory
    ///
    /// # Errors
    /// - `FATError::NotFound` if no subdirectory has that name
    pub fn resolve_child(&mut self, dir_cluster: u32, name: &str) -> Result<u32, FATError> {
        match name {
            ".." => return Ok(self.root_cluster()),
            "." => return Ok(dir_cluster),
            _ => {}
        }

        for entry in self.dir_entries(dir_cluster) {
            let entry = entry?;
            if entry.is_dir() && entry.same_name(name) {
                return Ok(entry.cluster_number());
            }
        }

        Err(FATError::NotFound(name.to_string()))
    }

    /// Finds the entry of the file `name` in the directory starting at `dir_cluster`.
    ///
    /// # Errors
    /// - `FATError::NotFound` if no entry has that name
    /// - `FATError::IsADirectory` if the entry is a directory
    pub fn find_file(&mut self, dir_cluster: u32, name: &str) -> Result<DirEntry, FATError> {
        for entry in self.dir_entries(dir_cluster) {
            let entry = entry?;
            if entry.same_name(name) {
                if entry.is_dir() {
                    return Err(FATError::IsADirectory(entry.short_name()));
                }
                return Ok(entry);
            }
        }

        Err(FATError::NotFound(name.to_string()))
    }

    /// Reads the content of a file.
    ///
    /// Clusters are read in chain order. Runs of consecutive cluster numbers are read at once.
    ///
    /// # Returns
    /// - Exactly `file_size` bytes
    ///
    /// # Errors
    /// - `FATError::IsADirectory` if `entry` is a directory
    /// - `FATError::TruncatedFile` if the chain is too short for `file_size`
    /// - Any chain walking or read error
    pub fn read_file(&mut self, entry: &DirEntry) -> Result<Vec<u8>, FATError> {
        if entry.is_dir() {
            return Err(FATError::IsADirectory(entry.short_name()));
        }

        let size = *entry.file_size() as u64;
        if size == 0 {
            return Ok(Vec::new());
        }

        let clusters: Vec<u32> = self
            .chain_of(entry.cluster_number())
            .collect::<Result<_, _>>()?;
        let cluster_size = self.region.cluster_size() as u64;
        let available = clusters.len() as u64 * cluster_size;
        if available < size {
            return Err(FATError::TruncatedFile {
                needed: size,
                available,
            });
        }

        let mut data = Vec::with_capacity(size as usize);
        for (first, count) in contiguous_runs(&clusters) {
            let remaining = size - data.len() as u64;
            if remaining == 0 {
                break;
            }

            let len = remaining.min(count as u64 * cluster_size);
            let offset = self.region.cluster_offset(first)?;
            data.extend(read_at(&mut self.reader, offset, len as usize)?);
        }

        debug!(
            "Read {} bytes of `{}` from {} clusters",
            data.len(),
            entry.short_name(),
            clusters.len()
        );
        Ok(data)
    }

    /// Copies the file `name` of the directory starting at `dir_cluster` into `dest_dir`.
    ///
    /// The destination is created, never overwritten.
    ///
    /// # Returns
    /// - The path of the new file and the count of bytes written
    ///
    /// # Errors
    /// - `FATError::InvalidName` if the on-disk name is not a plain file name
    /// - `FATError::AlreadyExists` if the destination file exists
    /// - Any error of [`FATVol::find_file`] and [`FATVol::read_file`]
    pub fn retrieve(
        &mut self,
        dir_cluster: u32,
        name: &str,
        dest_dir: &Path,
    ) -> Result<(PathBuf, usize), FATError> {
        let entry = self.find_file(dir_cluster, name)?;
        let path = dest_dir.join(entry.host_file_name()?);
        if path.exists() {
            return Err(FATError::AlreadyExists(path));
        }

        let data = self.read_file(&entry)?;
        write_new_file(&path, &data)?;

        Ok((path, data.len()))
    }

    /// Returns the starting sector of the first FAT.
    fn fat_start(&self) -> u64 {
        *self.bpb.rsvd_sec_cnt() as u64
    }

    /// Returns the ending sector of the data region.
    fn data_end(&self) -> u64 {
        self.region.first_data_sector() as u64
            + self.region.cluster_count() as u64 * self.region.sec_per_clus() as u64
    }
}

/// Groups a cluster chain into runs of consecutive cluster numbers.
///
/// Returns the first cluster and the length of each run, in chain order.
fn contiguous_runs(clusters: &[u32]) -> Vec<(u32, u32)> {
    let mut runs: Vec<(u32, u32)> = Vec::new();

    for &cluster in clusters {
        match runs.last_mut() {
            Some((first, count)) if first.checked_add(*count) == Some(cluster) => *count += 1,
            _ => runs.push((cluster, 1)),
        }
    }

    runs
}

/// Lazy iterator over the slots of a directory.
///
/// Yields deleted entries, long name fragments and labels as well as files and directories.
/// Nothing is yielded after the end-of-directory slot or after an error.
pub struct DirSlots<'a, T: io::Read + io::Seek> {
    chain: ClusterChain<'a, T>,
    region: DataRegion,
    cluster: Vec<u8>,
    pos: usize,
    done: bool,
}

impl<T: io::Read + io::Seek> DirSlots<'_, T> {
    fn load_next_cluster(&mut self) -> Result<bool, FATError> {
        let cluster = match self.chain.next() {
            Some(cluster) => cluster?,
            None => return Ok(false),
        };

        let offset = self.region.cluster_offset(cluster)?;
        self.cluster = read_at(self.chain.reader(), offset, self.region.cluster_size())?;
        self.pos = 0;
        Ok(true)
    }
}

impl<T: io::Read + io::Seek> Iterator for DirSlots<'_, T> {
    type Item = Result<DirSlot, FATError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            if self.pos + DIR_ENTRY_SIZE > self.cluster.len() {
                match self.load_next_cluster() {
                    Ok(true) => continue,
                    Ok(false) => self.done = true,
                    Err(err) => {
                        self.done = true;
                        return Some(Err(err));
                    }
                }
                continue;
            }

            let raw = &self.cluster[self.pos..self.pos + DIR_ENTRY_SIZE];
            self.pos += DIR_ENTRY_SIZE;

            match DirEntry::decode(raw) {
                Ok(DirSlot::End) => self.done = true,
                Ok(slot) => return Some(Ok(slot)),
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }

        None
    }
}

/// Implements the LayoutDisplay trait for FATVol
impl<T: io::Read + io::Seek> LayoutDisplay for FATVol<T> {
    fn display_layout(&self, indent: u8) -> Result<String, std::fmt::Error> {
        let mut out = String::from("");
        let indent = " ".repeat(indent.into());

        writeln!(out, "{}┌{:─^55}┐", indent, " FAT32 Volume Layout ")?;
        writeln!(
            out,
            "{}├{:^12}┬{:^12}┬{:^12}┬{:^16}┤",
            indent, "Region", "Start", "End", "Description"
        )?;
        writeln!(
            out,
            "{}├{:─<12}┼{:─<12}┼{:─<12}┼{:─<16}┤",
            indent, "", "", "", ""
        )?;

        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent,
            "Reserved",
            0,
            self.fat_start(),
            "Boot + Reserved"
        )?;
        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent,
            "FSInfo",
            self.bpb.fs_info(),
            *self.bpb.fs_info() as u64 + 1,
            "Free Cluster Hint"
        )?;
        for i in 0..*self.bpb.num_fat() {
            let fat_i_start = self.fat_start() + i as u64 * self.bpb.fat_sz() as u64;
            let fat_i_end = fat_i_start + self.bpb.fat_sz() as u64;
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent,
                format!("FAT #{i}"),
                fat_i_start,
                fat_i_end,
                "FAT Tables"
            )?;
        }
        writeln!(
            out,
            "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
            indent,
            "Data",
            self.region.first_data_sector(),
            self.data_end(),
            "Cluster Data"
        )?;
        if self.data_end() < self.bpb.tot_sec() as u64 {
            writeln!(
                out,
                "{}│{:<12}│{:<12}│{:<12}│{:<16}│",
                indent,
                "",
                self.data_end(),
                self.bpb.tot_sec(),
                "Volume Slack"
            )?;
        }

        writeln!(
            out,
            "{}└{:─<12}┴{:─<12}┴{:─<12}┴{:─<16}┘",
            indent, "", "", "", ""
        )?;

        Ok(out)
    }
}
