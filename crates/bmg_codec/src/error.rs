//! Error types for the codec crate.

use thiserror::Error;

/// Result type for codec operations.
pub type BmgResult<T> = Result<T, BmgError>;

/// Errors that can occur while parsing, planning or building a container.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BmgError {
    /// The file does not start with the expected magic.
    #[error("unsupported file header (expected MESG magic)")]
    UnsupportedHeader,

    /// A mandatory section tag was not found anywhere in the buffer.
    #[error("section {tag} not found")]
    SectionNotFound {
        /// The four-character ASCII tag that was searched for.
        tag: String,
    },

    /// A fixed-width read would cross the end of the buffer.
    #[error("read beyond buffer at offset {offset:#x}")]
    OutOfBounds {
        /// Absolute byte offset of the attempted read.
        offset: usize,
    },

    /// An entry-table row extends past the end of the buffer.
    #[error("entry #{index} read out of bounds; file may be corrupt")]
    EntryOutOfBounds {
        /// Index of the offending row in the entry table.
        index: usize,
    },

    /// Entries aliasing one pool segment no longer agree on its content.
    #[error(
        "entries {entries:?} share pool offset {offset:#06x}; keep their text identical"
    )]
    SharedSegmentConflict {
        /// Indices of every entry referencing the segment.
        entries: Vec<usize>,
        /// Pool-relative offset of the shared segment.
        offset: u32,
    },

    /// An edit referenced an entry or index string that does not exist.
    #[error("no {kind} at {key}")]
    UnknownTarget {
        /// What was looked up ("entry" or "index string").
        kind: &'static str,
        /// The index or offset used for the lookup.
        key: String,
    },
}

impl BmgError {
    /// Create a section-not-found error from a tag.
    pub fn section_not_found(tag: [u8; 4]) -> Self {
        Self::SectionNotFound {
            tag: String::from_utf8_lossy(&tag).into_owned(),
        }
    }
}
