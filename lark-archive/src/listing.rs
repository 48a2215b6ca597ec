//! Listing snapshots and integrity reports.
//!
//! Both types are plain data derived from engine state: producing a
//! [`Listing`] performs no I/O, and an [`IntegrityReport`] collects the
//! per-entry outcome of running the extract pipeline against a null sink.

use crate::entry::Entry;
use lark_core::{LarkError, Level, Method};

/// A snapshot view of one entry.
#[derive(Debug, Clone)]
pub struct EntryInfo {
    /// Display name (lossy for non-UTF-8 stored names).
    pub name: String,
    /// Uncompressed size.
    pub original_size: i64,
    /// Stored size.
    pub compressed_size: u32,
    /// compressed/original ratio.
    pub ratio: f64,
    /// Compression method.
    pub method: Method,
    /// Compression level.
    pub level: Level,
    /// Modification time as FILETIME.
    pub mtime: i64,
    /// CRC-32 of the uncompressed bytes.
    pub crc32: u32,
}

/// Aggregate figures for one compression method.
#[derive(Debug, Clone)]
pub struct MethodTotals {
    /// The method.
    pub method: Method,
    /// Number of entries using it.
    pub entries: usize,
    /// Sum of uncompressed sizes.
    pub original_bytes: i64,
    /// Sum of stored sizes.
    pub compressed_bytes: u64,
}

/// A snapshot of the whole archive: per-entry rows plus per-method and
/// overall aggregates, in insertion order.
#[derive(Debug, Clone)]
pub struct Listing {
    /// Per-entry rows.
    pub entries: Vec<EntryInfo>,
    /// Per-method aggregates, in method tag order, methods in use only.
    pub totals: Vec<MethodTotals>,
    /// Sum of uncompressed sizes.
    pub total_original: i64,
    /// Sum of stored sizes.
    pub total_compressed: u64,
}

impl Listing {
    pub(crate) fn from_entries(entries: &[Entry]) -> Self {
        let rows: Vec<EntryInfo> = entries
            .iter()
            .map(|e| EntryInfo {
                name: e.name().into_owned(),
                original_size: e.original_size,
                compressed_size: e.compressed_size,
                ratio: e.ratio(),
                method: e.method,
                level: e.level,
                mtime: e.mtime,
                crc32: e.crc32,
            })
            .collect();

        let mut totals: Vec<MethodTotals> = Vec::new();
        for method in Method::ALL {
            let mut agg = MethodTotals {
                method,
                entries: 0,
                original_bytes: 0,
                compressed_bytes: 0,
            };
            for entry in entries.iter().filter(|e| e.method == method) {
                agg.entries += 1;
                agg.original_bytes += entry.original_size;
                agg.compressed_bytes += entry.compressed_size as u64;
            }
            if agg.entries > 0 {
                totals.push(agg);
            }
        }

        Self {
            total_original: rows.iter().map(|r| r.original_size).sum(),
            total_compressed: rows.iter().map(|r| r.compressed_size as u64).sum(),
            entries: rows,
            totals,
        }
    }

    /// Overall compressed/original ratio (1.0 for an empty archive).
    pub fn overall_ratio(&self) -> f64 {
        if self.total_original <= 0 {
            1.0
        } else {
            self.total_compressed as f64 / self.total_original as f64
        }
    }

    /// Number of entries in the snapshot.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of testing a single entry.
#[derive(Debug)]
pub struct EntryCheck {
    /// Display name of the entry.
    pub name: String,
    /// `Ok` if the entry extracted and its CRC matched.
    pub result: Result<(), LarkError>,
}

/// Per-entry results of an integrity test.
#[derive(Debug)]
pub struct IntegrityReport {
    /// One check per entry, in directory order.
    pub checks: Vec<EntryCheck>,
}

impl IntegrityReport {
    /// Aggregate pass/fail.
    pub fn all_ok(&self) -> bool {
        self.checks.iter().all(|c| c.result.is_ok())
    }

    /// Number of failing entries.
    pub fn failure_count(&self) -> usize {
        self.checks.iter().filter(|c| c.result.is_err()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, method: Method, original: i64, compressed: u32) -> Entry {
        Entry::pending(
            name.as_bytes().to_vec(),
            original,
            compressed,
            0,
            0,
            method,
            Level::DEFAULT,
            0,
            vec![0; compressed as usize],
        )
    }

    #[test]
    fn test_listing_aggregates() {
        let entries = vec![
            entry("a", Method::Store, 100, 100),
            entry("b", Method::Deflate, 1000, 300),
            entry("c", Method::Deflate, 500, 200),
        ];
        let listing = Listing::from_entries(&entries);
        assert_eq!(listing.len(), 3);
        assert_eq!(listing.total_original, 1600);
        assert_eq!(listing.total_compressed, 600);

        assert_eq!(listing.totals.len(), 2);
        let deflate = listing
            .totals
            .iter()
            .find(|t| t.method == Method::Deflate)
            .unwrap();
        assert_eq!(deflate.entries, 2);
        assert_eq!(deflate.original_bytes, 1500);
        assert_eq!(deflate.compressed_bytes, 500);
    }

    #[test]
    fn test_empty_listing() {
        let listing = Listing::from_entries(&[]);
        assert!(listing.is_empty());
        assert!(listing.totals.is_empty());
        assert_eq!(listing.overall_ratio(), 1.0);
    }

    #[test]
    fn test_integrity_report_aggregation() {
        let report = IntegrityReport {
            checks: vec![
                EntryCheck {
                    name: "ok".into(),
                    result: Ok(()),
                },
                EntryCheck {
                    name: "bad".into(),
                    result: Err(LarkError::crc_mismatch(1, 2)),
                },
            ],
        };
        assert!(!report.all_ok());
        assert_eq!(report.failure_count(), 1);
    }
}
