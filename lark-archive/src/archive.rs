//! The archive engine: open, create, add, update, delete, extract, test,
//! list, save, close.
//!
//! All mutations are applied to the in-memory entry list; the on-disk file
//! changes only during [`Archive::save`], which writes a complete new image
//! and replaces the target atomically via a sibling temp file. Entries not
//! touched since the archive was opened are carried over by range-copying
//! their payload bytes from the previously opened file.

use crate::entry::Entry;
use crate::format::{
    self, parse_directory, DirectoryRecord, Header, DIRECTORY_MIN_SIZE, DIRECTORY_SCAN_FAST,
    DIRECTORY_SCAN_LIMIT, HEADER_SIZE, MAX_EXPANSION_RATIO, MAX_NAME_BYTES,
};
use crate::listing::{EntryCheck, IntegrityReport, Listing};
use lark_core::crc::Crc32;
use lark_core::{filetime, LarkError, Level, Method, Result};
use log::{debug, warn};
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Copy granularity for payload range-copies during save.
const COPY_CHUNK: usize = 64 * 1024;

/// An archive instance bound to one container file.
///
/// The engine is single-threaded; callers needing parallelism operate on
/// disjoint instances. Exactly one writer may target a given file at a
/// time.
#[derive(Debug)]
pub struct Archive {
    path: PathBuf,
    header: Header,
    entries: Vec<Entry>,
    /// Read handle to the file the entries were parsed from.
    backing: Option<File>,
    modified: bool,
}

impl Archive {
    /// Open an existing archive: read the header, locate and parse the
    /// central directory, and validate every invariant.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                LarkError::ArchiveNotFound { path: path.clone() }
            } else {
                e.into()
            }
        })?;
        let file_len = file.metadata()?.len();
        if file_len < (HEADER_SIZE + DIRECTORY_MIN_SIZE) as u64 {
            return Err(LarkError::ArchiveTooSmall { size: file_len });
        }

        let mut header_buf = [0u8; HEADER_SIZE];
        file.read_exact(&mut header_buf)?;
        let header = Header::parse(&header_buf)?;

        let (directory_offset, records) = locate_directory(&mut file, file_len)?;
        debug!(
            "directory at offset {} with {} records",
            directory_offset,
            records.len()
        );

        let mut entries = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            let method = validate_record(index, &record, directory_offset)?;
            entries.push(Entry::from_record(record, method));
        }
        check_disjoint(&entries)?;

        if header.file_count as usize != entries.len() {
            // The directory count is authoritative on read
            warn!(
                "header declares {} entries, directory holds {}",
                header.file_count,
                entries.len()
            );
        }

        Ok(Self {
            path,
            header,
            entries,
            backing: Some(file),
            modified: false,
        })
    }

    /// Create a new, empty archive bound to `path`. Nothing is written
    /// until [`Archive::save`].
    pub fn create(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            header: Header::new(Level::DEFAULT.value() as u32),
            entries: Vec::new(),
            backing: None,
            modified: true,
        }
    }

    /// The path this archive is bound to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Whether in-memory state differs from the file.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Find the first entry matching `name` case-insensitively.
    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.matches_name(name))
    }

    /// Compress `data` and append it as a new entry.
    ///
    /// The file on disk is untouched until [`Archive::save`].
    pub fn add(
        &mut self,
        name: &str,
        data: &[u8],
        method: Method,
        level: Level,
        mtime: i64,
    ) -> Result<()> {
        self.add_with_attributes(name, data, method, level, mtime, 0)
    }

    /// [`Archive::add`] with opaque source attribute bits. Attributes are
    /// held in memory for the session; the directory does not persist them.
    pub fn add_with_attributes(
        &mut self,
        name: &str,
        data: &[u8],
        method: Method,
        level: Level,
        mtime: i64,
        attributes: u32,
    ) -> Result<()> {
        let name_bytes = name.as_bytes();
        if name_bytes.is_empty() || name_bytes.len() > MAX_NAME_BYTES {
            return Err(LarkError::InvalidFileName {
                length: name_bytes.len(),
            });
        }

        let crc32 = Crc32::compute(data);
        let codec = lark_codecs::for_method(method, level);
        let compressed = codec.compress(data)?;
        if compressed.len() as u64 > u32::MAX as u64 {
            return Err(LarkError::InvalidSizes {
                index: self.entries.len(),
                original: data.len() as i64,
                compressed: u32::MAX,
            });
        }

        let original = data.len() as i64;
        let stored = compressed.len() as u32;
        if expansion_ratio(original, stored) > MAX_EXPANSION_RATIO {
            return Err(LarkError::InvalidSizes {
                index: self.entries.len(),
                original,
                compressed: stored,
            });
        }

        debug!(
            "add \"{}\": {} -> {} bytes via {}",
            name, original, stored, method
        );
        self.entries.push(Entry::pending(
            name_bytes.to_vec(),
            original,
            stored,
            crc32,
            mtime,
            method,
            level,
            attributes,
            compressed,
        ));
        self.modified = true;
        Ok(())
    }

    /// Replace an entry by name: delete the first case-insensitive match if
    /// present, then add the new content at the end.
    pub fn update(
        &mut self,
        name: &str,
        data: &[u8],
        method: Method,
        level: Level,
        mtime: i64,
    ) -> Result<()> {
        self.delete(name);
        self.add(name, data, method, level, mtime)
    }

    /// Remove the first entry matching `name` case-insensitively.
    ///
    /// Returns whether an entry was removed; an absent name is not an
    /// error.
    pub fn delete(&mut self, name: &str) -> bool {
        match self.entries.iter().position(|e| e.matches_name(name)) {
            Some(index) => {
                self.entries.remove(index);
                self.modified = true;
                true
            }
            None => false,
        }
    }

    /// Extract an entry into `sink`, verifying its CRC-32.
    ///
    /// The decompressed bytes are written to the sink **before** the CRC is
    /// checked, so on mismatch the sink holds the corrupt image for
    /// comparison and the error reports both CRC values.
    pub fn extract(&mut self, name: &str, sink: &mut dyn Write) -> Result<u64> {
        let index = self
            .entries
            .iter()
            .position(|e| e.matches_name(name))
            .ok_or_else(|| LarkError::file_not_found(name))?;
        self.extract_index(index, sink)
    }

    fn extract_index(&mut self, index: usize, sink: &mut dyn Write) -> Result<u64> {
        let compressed = self.read_payload(index)?;
        let entry = &self.entries[index];
        let codec = lark_codecs::for_method(entry.method, entry.level);
        let decoded = codec.decompress(&compressed, entry.original_size as usize)?;

        sink.write_all(&decoded)?;

        let computed = Crc32::compute(&decoded);
        if computed != entry.crc32 {
            return Err(LarkError::crc_mismatch(entry.crc32, computed));
        }
        Ok(decoded.len() as u64)
    }

    /// Fetch an entry's stored bytes, from memory for pending entries or
    /// from the backing file otherwise.
    fn read_payload(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = &self.entries[index];
        if let Some(data) = &entry.data {
            return Ok(data.clone());
        }

        let offset = entry.offset as u64;
        let size = entry.compressed_size as usize;
        let name = entry.name().into_owned();
        let file = self
            .backing
            .as_mut()
            .ok_or(LarkError::NoCompressedData { name })?;

        // Bounds-check against the current file length; the file may have
        // been truncated behind our back.
        let file_len = file.metadata()?.len();
        if offset + size as u64 > file_len {
            return Err(LarkError::InvalidFileOffset { index });
        }

        file.seek(SeekFrom::Start(offset))?;
        let mut payload = vec![0u8; size];
        file.read_exact(&mut payload)?;
        Ok(payload)
    }

    /// Run the extract pipeline for every entry against a null sink.
    pub fn test_integrity(&mut self) -> IntegrityReport {
        let mut checks = Vec::with_capacity(self.entries.len());
        for index in 0..self.entries.len() {
            let name = self.entries[index].name().into_owned();
            let result = self.extract_index(index, &mut io::sink()).map(|_| ());
            checks.push(EntryCheck { name, result });
        }
        IntegrityReport { checks }
    }

    /// Snapshot the current entry list with ratios and per-method
    /// aggregates. Pure view of in-memory state; no I/O.
    pub fn list(&self) -> Listing {
        Listing::from_entries(&self.entries)
    }

    /// Persist the archive.
    ///
    /// A new image is written either directly to the target (no file
    /// exists yet) or to `<target>.tmp`, which then replaces the target.
    /// Payload offsets are assigned in entry order starting right after
    /// the header; entries without in-memory data are range-copied from
    /// the previously opened file. The read handle is released before the
    /// rename, and a failed save deletes its partial output.
    pub fn save(&mut self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(LarkError::ArchiveNameNotSet);
        }

        let use_temp = self.path.exists();
        let out_path = if use_temp {
            temp_path(&self.path)
        } else {
            self.path.clone()
        };

        self.header.file_count = self.entries.len() as u32;
        self.header.last_update_time = filetime::now();

        let mut source = self.backing.take();
        let outcome = self.write_image(&out_path, &mut source);
        drop(source);

        let offsets = match outcome {
            Ok(offsets) => offsets,
            Err(e) => {
                let _ = fs::remove_file(&out_path);
                self.backing = File::open(&self.path).ok();
                return Err(e);
            }
        };

        if use_temp {
            if fs::remove_file(&self.path).is_err() {
                let _ = fs::remove_file(&out_path);
                self.backing = File::open(&self.path).ok();
                return Err(LarkError::ArchiveNotFound {
                    path: self.path.clone(),
                });
            }
            if let Err(e) = fs::rename(&out_path, &self.path) {
                let _ = fs::remove_file(&out_path);
                return Err(e.into());
            }
        }

        for (entry, offset) in self.entries.iter_mut().zip(&offsets) {
            entry.offset = *offset;
            entry.data = None;
        }
        self.backing = Some(File::open(&self.path)?);
        self.modified = false;
        debug!(
            "saved {} entries to {}",
            self.entries.len(),
            self.path.display()
        );
        Ok(())
    }

    fn write_image(&self, out_path: &Path, source: &mut Option<File>) -> Result<Vec<i64>> {
        let mut writer = BufWriter::new(File::create(out_path)?);
        writer.write_all(&self.header.to_bytes())?;

        let mut position = HEADER_SIZE as i64;
        let mut offsets = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            offsets.push(position);
            match &entry.data {
                Some(data) => writer.write_all(data)?,
                None => {
                    let source = source.as_mut().ok_or_else(|| LarkError::NoCompressedData {
                        name: entry.name().into_owned(),
                    })?;
                    copy_range(
                        source,
                        entry.offset as u64,
                        entry.compressed_size as u64,
                        &mut writer,
                    )?;
                }
            }
            position += entry.compressed_size as i64;
        }

        writer.write_all(&format::write_directory(&self.entries, &offsets))?;
        writer.flush()?;
        Ok(offsets)
    }

    /// Save if modified, then release all resources.
    pub fn close(mut self) -> Result<()> {
        if self.modified {
            self.save()?;
        }
        Ok(())
    }
}

fn expansion_ratio(original: i64, compressed: u32) -> i64 {
    original / (compressed as i64).max(1)
}

fn temp_path(target: &Path) -> PathBuf {
    let mut name = target.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

fn copy_range(source: &mut File, offset: u64, size: u64, writer: &mut impl Write) -> Result<()> {
    source.seek(SeekFrom::Start(offset))?;
    let mut buf = [0u8; COPY_CHUNK];
    let mut remaining = size;
    while remaining > 0 {
        let want = remaining.min(COPY_CHUNK as u64) as usize;
        let got = source.read(&mut buf[..want])?;
        if got == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "archive payload truncated during copy",
            )
            .into());
        }
        writer.write_all(&buf[..got])?;
        remaining -= got as u64;
    }
    Ok(())
}

/// Locate and parse the central directory.
///
/// The last 4 KiB are scanned first; failing that, the scan widens to a
/// byte-wise backward pass over the last 64 KiB, never reaching before the
/// header. A signature hit only counts if the directory parses cleanly all
/// the way to EOF.
fn locate_directory(file: &mut File, file_len: u64) -> Result<(u64, Vec<DirectoryRecord>)> {
    let scan_len = (file_len - HEADER_SIZE as u64).min(DIRECTORY_SCAN_LIMIT) as usize;
    let tail_start = file_len - scan_len as u64;
    file.seek(SeekFrom::Start(tail_start))?;
    let mut tail = vec![0u8; scan_len];
    file.read_exact(&mut tail)?;

    let last_candidate = scan_len - DIRECTORY_MIN_SIZE;
    let fast_floor = scan_len.saturating_sub(DIRECTORY_SCAN_FAST as usize);

    let try_at = |at: usize| -> Option<Vec<DirectoryRecord>> {
        let signature = u32::from_le_bytes([tail[at], tail[at + 1], tail[at + 2], tail[at + 3]]);
        if signature != format::DIRECTORY_SIGNATURE
            && signature != format::DIRECTORY_SIGNATURE_LEGACY
        {
            return None;
        }
        parse_directory(&tail[at..]).ok()
    };

    for at in (fast_floor..=last_candidate).rev() {
        if let Some(records) = try_at(at) {
            return Ok((tail_start + at as u64, records));
        }
    }
    for at in (0..fast_floor).rev() {
        if let Some(records) = try_at(at) {
            return Ok((tail_start + at as u64, records));
        }
    }
    Err(LarkError::DirectoryNotFound)
}

/// Validate a directory record against the container invariants, returning
/// the decoded method. Errors are localised to the entry index.
fn validate_record(index: usize, record: &DirectoryRecord, directory_offset: u64) -> Result<Method> {
    let method = Method::from_tag(record.method).ok_or(LarkError::InvalidCompressionMethod {
        method: record.method,
    })?;

    let name_len = record.name.len();
    if name_len == 0 || name_len > MAX_NAME_BYTES {
        return Err(LarkError::InvalidFileName { length: name_len });
    }
    if record.original_size < 0 {
        return Err(LarkError::InvalidSizes {
            index,
            original: record.original_size,
            compressed: record.compressed_size,
        });
    }
    if record.offset < HEADER_SIZE as i64
        || record.offset as u64 + record.compressed_size as u64 > directory_offset
    {
        return Err(LarkError::InvalidFileOffset { index });
    }
    if expansion_ratio(record.original_size, record.compressed_size) > MAX_EXPANSION_RATIO {
        return Err(LarkError::InvalidSizes {
            index,
            original: record.original_size,
            compressed: record.compressed_size,
        });
    }
    Ok(method)
}

/// Reject archives whose payload ranges overlap.
fn check_disjoint(entries: &[Entry]) -> Result<()> {
    let mut ranges: Vec<(i64, i64, usize)> = entries
        .iter()
        .enumerate()
        .map(|(index, e)| (e.offset, e.offset + e.compressed_size as i64, index))
        .collect();
    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        let (_, prev_end, _) = pair[0];
        let (next_start, _, next_index) = pair[1];
        if next_start < prev_end {
            return Err(LarkError::InvalidFileOffset { index: next_index });
        }
    }
    Ok(())
}
