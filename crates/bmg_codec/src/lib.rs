//! # BMG Codec
//!
//! Parser, editor and rebuilder for MESG binary message containers.
//!
//! A container holds a fixed-size entry table (`INF1`), a shared
//! UTF-16LE string pool (`DAT1`) and an optional index table (`MID1`)
//! that addresses the pool either by byte offset or by opaque
//! identifier. This crate parses a container into an editable model,
//! lets callers replace message text, and rebuilds a valid file with
//! every offset field, size field and index pointer fixed up.
//!
//! Parsing an untouched file and rebuilding it reproduces the input
//! byte for byte.
//!
//! ## Usage
//!
//! ```
//! use bmg_codec::{decode_string, encode_string, Diagnostics, MAX_STRING_UNITS};
//!
//! let bytes = encode_string("Press [WAIT] to continue", false);
//! let mut diags = Diagnostics::new();
//! let decoded = decode_string(&bytes, 0, bytes.len(), MAX_STRING_UNITS, &mut diags);
//! assert_eq!(decoded.text, "Press [WAIT] to continue");
//! assert!(diags.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod diagnostics;
pub mod error;
pub mod layout;
pub mod model;
pub mod parser;
mod reader;
pub mod text;
pub mod token;

#[cfg(test)]
mod testutil;

pub use builder::{build, build_with_layout, BuildOutcome};
pub use diagnostics::{Diagnostic, Diagnostics, Severity};
pub use error::{BmgError, BmgResult};
pub use layout::{plan, Chunk, Layout};
pub use model::{
    BmgFile, Entry, IndexGrid, IndexRef, IndexTable, Segment, SegmentKind, TextRecord,
};
pub use parser::{parse, ParseOutcome};
pub use text::{decode_string, encode_string, DecodedString, MAX_STRING_UNITS};
