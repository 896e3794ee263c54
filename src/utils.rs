use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::filesystem::fat_error::FATError;

/// Reads `len` bytes starting at byte `offset` of the volume.
///
/// # Arguments
///
/// - `reader`: The volume to read from.
/// - `offset`: The absolute byte offset of the first byte to read.
/// - `len`: The number of bytes to read.
///
/// # Errors
///
/// Returns `FATError::ShortRead` if the volume ends before `len` bytes could be read, and
/// `FATError::IOError` if seeking or reading fails.
pub fn read_at<T: Read + Seek>(
    reader: &mut T,
    offset: u64,
    len: usize,
) -> Result<Vec<u8>, FATError> {
    let mut buffer = vec![0; len];
    reader.seek(SeekFrom::Start(offset))?;

    let mut filled = 0;
    while filled < len {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }

    if filled < len {
        return Err(FATError::ShortRead {
            offset,
            expected: len,
            read: filled,
        });
    }

    Ok(buffer)
}

/// Reads a specific sector of the volume.
///
/// # Arguments
///
/// - `reader`: The volume to read from.
/// - `sector`: The sector number to read.
/// - `sector_size`: The size in bytes of a sector.
pub fn read_sector<T: Read + Seek>(
    reader: &mut T,
    sector: u64,
    sector_size: usize,
) -> Result<Vec<u8>, FATError> {
    read_at(reader, sector * sector_size as u64, sector_size)
}

/// Creates `path` and writes `data` into it.
///
/// The file is never overwritten: if `path` already exists, `FATError::AlreadyExists` is
/// returned and nothing is written.
pub fn write_new_file(path: &Path, data: &[u8]) -> Result<(), FATError> {
    let mut file = match File::options().write(true).create_new(true).open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            return Err(FATError::AlreadyExists(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };

    file.write_all(data)?;
    file.flush()?;
    Ok(())
}

/// Extracts a little-endian 32-bit unsigned integer from a buffer at a given offset.
///
/// Returns `None` if the buffer holds fewer than 4 bytes from `offset`.
pub fn u32_at(buffer: &[u8], offset: usize) -> Option<u32> {
    let bytes = buffer.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}
