//! # Lark Archive
//!
//! The lark container: named byte streams stored in a single file, each
//! independently compressed and CRC-checked, catalogued by a central
//! directory at the tail so entries can be listed, extracted, deleted or
//! replaced without touching the rest.
//!
//! ```text
//! ┌──────────────┬─────────────────────────────┬───────────────────┐
//! │ header (60 B)│ payloads, insertion order   │ central directory │
//! └──────────────┴─────────────────────────────┴───────────────────┘
//! ```
//!
//! The [`Archive`] engine exposes the whole lifecycle: open with full
//! validation, in-memory add/update/delete, bounded extraction with CRC
//! verification, integrity testing, listing, and a transactional save that
//! replaces the target atomically through a sibling temp file.
//!
//! ## Example
//!
//! ```no_run
//! use lark_archive::Archive;
//! use lark_core::{filetime, Level, Method};
//!
//! let mut archive = Archive::create("backup.ark");
//! archive.add(
//!     "hello.txt",
//!     b"Hello, World!\n",
//!     Method::Deflate,
//!     Level::new(5),
//!     filetime::now(),
//! )?;
//! archive.save()?;
//!
//! let mut archive = Archive::open("backup.ark")?;
//! let mut out = Vec::new();
//! archive.extract("hello.txt", &mut out)?;
//! assert_eq!(out, b"Hello, World!\n");
//! # Ok::<(), lark_core::LarkError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod archive;
mod entry;
pub mod format;
mod listing;

pub use archive::Archive;
pub use entry::Entry;
pub use listing::{EntryCheck, EntryInfo, IntegrityReport, Listing, MethodTotals};
