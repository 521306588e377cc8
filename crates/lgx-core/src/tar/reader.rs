//! USTAR decoder.
//!
//! A streaming pass over a 512-aligned buffer. Checksums are validated for
//! every non-zero block; octal fields are parsed leniently (leading spaces or
//! NULs, stop at the first non-octal byte). Entry types other than regular
//! files and directories are dropped, with their data blocks skipped so the
//! scan stays aligned.
//!
//! End-of-archive handling is lenient: the canonical terminator is two
//! consecutive zero blocks, but a lone zero block is skipped and an archive
//! that simply ends at a block boundary is accepted.

use crate::error::{Error, Result};

use super::{
    header_checksum, is_zero_block, TarEntry, BLOCK_SIZE, NAME_SIZE, OFF_CHKSUM, OFF_GID,
    OFF_LINKNAME, OFF_MODE, OFF_MTIME, OFF_NAME, OFF_PREFIX, OFF_SIZE, OFF_TYPEFLAG, OFF_UID,
    PREFIX_SIZE,
};

/// Header metadata for one entry, without file contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryInfo {
    pub path: String,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub mtime: u64,
    /// Raw typeflag byte from the header.
    pub type_flag: u8,
    /// Link target for symlink/hardlink headers.
    pub link_target: Option<String>,
}

impl EntryInfo {
    pub fn is_directory(&self) -> bool {
        self.type_flag == b'5'
    }

    pub fn is_regular_file(&self) -> bool {
        self.type_flag == b'0' || self.type_flag == 0
    }

    pub fn is_symlink(&self) -> bool {
        self.type_flag == b'2'
    }

    pub fn is_hardlink(&self) -> bool {
        self.type_flag == b'1'
    }
}

/// Lenient octal parse: skip leading spaces and NULs, accumulate octal
/// digits, stop at the first other byte.
fn read_octal(field: &[u8]) -> u64 {
    let mut i = 0;
    while i < field.len() && (field[i] == b' ' || field[i] == 0) {
        i += 1;
    }
    let mut value: u64 = 0;
    while i < field.len() && (b'0'..=b'7').contains(&field[i]) {
        value = value * 8 + u64::from(field[i] - b'0');
        i += 1;
    }
    value
}

fn verify_checksum(header: &[u8]) -> bool {
    let stored = read_octal(&header[OFF_CHKSUM..OFF_CHKSUM + 8]) as u32;
    stored == header_checksum(header)
}

/// NUL-terminated string out of a fixed header field.
fn field_string(field: &[u8]) -> String {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    String::from_utf8_lossy(&field[..end]).into_owned()
}

fn parse_header(header: &[u8]) -> EntryInfo {
    let name = field_string(&header[OFF_NAME..OFF_NAME + NAME_SIZE]);
    let prefix = field_string(&header[OFF_PREFIX..OFF_PREFIX + PREFIX_SIZE]);
    let path = if prefix.is_empty() {
        name
    } else {
        format!("{prefix}/{name}")
    };

    let type_flag = header[OFF_TYPEFLAG];
    let link_target = if type_flag == b'1' || type_flag == b'2' {
        Some(field_string(&header[OFF_LINKNAME..OFF_LINKNAME + 100]))
    } else {
        None
    };

    EntryInfo {
        path,
        mode: read_octal(&header[OFF_MODE..OFF_MODE + 8]) as u32,
        uid: read_octal(&header[OFF_UID..OFF_UID + 8]) as u32,
        gid: read_octal(&header[OFF_GID..OFF_GID + 8]) as u32,
        size: read_octal(&header[OFF_SIZE..OFF_SIZE + 12]),
        mtime: read_octal(&header[OFF_MTIME..OFF_MTIME + 12]),
        type_flag,
        link_target,
    }
}

/// Stateful block scan over the archive buffer.
struct Scanner<'a> {
    tar: &'a [u8],
    offset: usize,
    zero_blocks: u8,
}

impl<'a> Scanner<'a> {
    fn new(tar: &'a [u8]) -> Self {
        Self {
            tar,
            offset: 0,
            zero_blocks: 0,
        }
    }

    /// Advance to the next validated header.
    fn next_header(&mut self) -> Result<Option<EntryInfo>> {
        while self.offset < self.tar.len() {
            if self.tar.len() - self.offset < BLOCK_SIZE {
                return Err(Error::InvalidArchive(format!(
                    "incomplete header at offset {}",
                    self.offset
                )));
            }
            let block = &self.tar[self.offset..self.offset + BLOCK_SIZE];

            if is_zero_block(block) {
                self.zero_blocks += 1;
                self.offset += BLOCK_SIZE;
                if self.zero_blocks >= 2 {
                    return Ok(None);
                }
                continue;
            }
            self.zero_blocks = 0;

            if !verify_checksum(block) {
                return Err(Error::InvalidArchive(format!(
                    "invalid checksum at offset {}",
                    self.offset
                )));
            }

            let info = parse_header(block);
            self.offset += BLOCK_SIZE;
            return Ok(Some(info));
        }
        Ok(None)
    }

    /// Copy out the file data for `info`, leaving the scan block-aligned.
    fn take_data(&mut self, info: &EntryInfo) -> Result<Vec<u8>> {
        if info.size == 0 {
            return Ok(Vec::new());
        }
        if info.size > (self.tar.len() - self.offset) as u64 {
            return Err(Error::InvalidArchive(format!(
                "incomplete file data for {}",
                info.path
            )));
        }
        let size = info.size as usize;
        let data = self.tar[self.offset..self.offset + size].to_vec();
        self.skip_data(info)?;
        Ok(data)
    }

    /// Advance over the padded data blocks for `info` without copying.
    fn skip_data(&mut self, info: &EntryInfo) -> Result<()> {
        if info.size == 0 {
            return Ok(());
        }
        if info.size > (self.tar.len() - self.offset) as u64 {
            return Err(Error::InvalidArchive(format!(
                "incomplete file data for {}",
                info.path
            )));
        }
        let blocks = (info.size as usize).div_ceil(BLOCK_SIZE);
        // Truncated padding after complete data is tolerated.
        self.offset = (self.offset + blocks * BLOCK_SIZE).min(self.tar.len());
        Ok(())
    }
}

/// Decode `tar` into package entries.
///
/// Regular files and directories become [`TarEntry`] values; every other
/// entry type is dropped after its data blocks are skipped.
///
/// # Errors
///
/// [`Error::InvalidArchive`] on a checksum mismatch, a header cut short, or
/// file data truncated mid-entry.
pub fn read(tar: &[u8]) -> Result<Vec<TarEntry>> {
    let mut scanner = Scanner::new(tar);
    let mut entries = Vec::new();

    while let Some(info) = scanner.next_header()? {
        if info.is_directory() {
            entries.push(TarEntry::directory(info.path));
        } else if info.is_regular_file() {
            let data = scanner.take_data(&info)?;
            entries.push(TarEntry {
                path: info.path,
                is_directory: false,
                data,
            });
        } else {
            log::debug!(
                "dropping unsupported tar entry (typeflag {:?}): {}",
                char::from(info.type_flag),
                info.path
            );
            scanner.skip_data(&info)?;
        }
    }

    Ok(entries)
}

/// Scan header metadata only, for diagnostics. All entry types are reported,
/// including those [`read`] drops; no file data is materialized.
pub fn read_entry_info(tar: &[u8]) -> Result<Vec<EntryInfo>> {
    let mut scanner = Scanner::new(tar);
    let mut infos = Vec::new();

    while let Some(info) = scanner.next_header()? {
        if !info.is_directory() {
            scanner.skip_data(&info)?;
        }
        infos.push(info);
    }

    Ok(infos)
}

/// Find the regular file at `path` and return its bytes.
///
/// Both the search path and entry paths are compared with leading and
/// trailing slashes stripped.
pub fn read_file(tar: &[u8], path: &str) -> Result<Vec<u8>> {
    let search = path.trim_matches('/');
    let mut scanner = Scanner::new(tar);

    while let Some(info) = scanner.next_header()? {
        if info.is_regular_file() && info.path.trim_matches('/') == search {
            return scanner.take_data(&info);
        }
        if !info.is_directory() {
            scanner.skip_data(&info)?;
        }
    }

    Err(Error::InvalidArchive(format!(
        "file not found in archive: {path}"
    )))
}

/// Advisory probe: does the buffer start with a plausible tar header?
///
/// Checks only the first header's checksum; never used on the
/// correctness-critical decode path.
pub fn is_valid_tar(tar: &[u8]) -> bool {
    tar.len() >= BLOCK_SIZE && verify_checksum(&tar[..BLOCK_SIZE])
}
