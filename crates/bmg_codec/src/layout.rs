//! Repack planner for the string pool.
//!
//! Editing never moves bytes in place. Instead the planner turns the
//! segment arena into an ordered list of output chunks, re-encoding
//! only what changed, and produces the offset remap every downstream
//! fixup (entry offset fields, index pointers) is driven by.

use std::collections::BTreeMap;

use crate::error::{BmgError, BmgResult};
use crate::model::{BmgFile, IndexTable, SegmentKind};
use crate::text;

/// One contiguous run of the planned pool.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Pool-relative offset the bytes came from.
    pub original_offset: u32,
    /// Pool-relative offset the bytes will land at.
    pub new_offset: u32,
    /// Output bytes, re-encoded when the backing text changed.
    pub bytes: Vec<u8>,
}

/// A planned pool layout.
#[derive(Debug, Clone)]
pub struct Layout {
    /// Output chunks in pool order.
    pub chunks: Vec<Chunk>,
    /// Total chunk bytes, before alignment padding.
    pub data_size: usize,
    /// Zero bytes appended to keep the next section 4-byte aligned.
    pub padding: usize,
    /// Original offset to new offset, one entry per chunk.
    pub remap: BTreeMap<u32, u32>,
    /// Planned offset field value for each entry, in table order.
    pub entry_offsets: Vec<u32>,
}

/// Plan the output pool for the file's current text.
///
/// Fails with [`BmgError::SharedSegmentConflict`] when entries sharing
/// one pool string have been edited to disagree.
pub fn plan(file: &BmgFile) -> BmgResult<Layout> {
    let mut pending: Vec<(u32, Vec<u8>)> = Vec::with_capacity(file.segments.len());
    for segment in &file.segments {
        let bytes = if !segment.entry_indices.is_empty() {
            let canonical = &file.entries[segment.entry_indices[0]];
            let mismatch = segment.entry_indices.iter().any(|&i| {
                let entry = &file.entries[i];
                entry.text() != canonical.text() || entry.leading_null() != canonical.leading_null()
            });
            if mismatch {
                return Err(BmgError::SharedSegmentConflict {
                    entries: segment.entry_indices.clone(),
                    offset: segment.original_offset,
                });
            }
            if segment.entry_indices.iter().any(|&i| file.entries[i].is_dirty()) {
                text::encode_string(canonical.text(), canonical.leading_null())
            } else {
                segment.bytes.clone()
            }
        } else if matches!(segment.kind, SegmentKind::Index | SegmentKind::IndexId)
            && segment.is_dirty()
        {
            text::encode_string(segment.text(), segment.leading_null())
        } else {
            segment.bytes.clone()
        };
        pending.push((segment.original_offset, bytes));
    }

    // Id-mode indexes address strings by position in the pool, not by
    // pointer, so every segment has to stay at its original offset.
    // Gaps opened by shrunk neighbours are filled with zero bytes.
    let preserve_offsets = matches!(file.index_table, IndexTable::Ids(_))
        && file.segments.iter().any(|s| s.kind == SegmentKind::IndexId);

    let mut chunks: Vec<Chunk> = Vec::with_capacity(pending.len());
    if preserve_offsets {
        let mut cursor = 0u32;
        for (original_offset, bytes) in pending {
            if original_offset > cursor {
                chunks.push(Chunk {
                    original_offset: cursor,
                    new_offset: 0,
                    bytes: vec![0u8; (original_offset - cursor) as usize],
                });
                cursor = original_offset;
            }
            cursor += bytes.len() as u32;
            chunks.push(Chunk {
                original_offset,
                new_offset: 0,
                bytes,
            });
        }
    } else {
        chunks.extend(pending.into_iter().map(|(original_offset, bytes)| Chunk {
            original_offset,
            new_offset: 0,
            bytes,
        }));
    }

    let mut remap = BTreeMap::new();
    let mut cursor = 0u32;
    for chunk in &mut chunks {
        chunk.new_offset = cursor;
        remap.insert(chunk.original_offset, chunk.new_offset);
        cursor += chunk.bytes.len() as u32;
    }

    let data_size = cursor as usize;
    let padding = (4 - data_size % 4) % 4;
    let entry_offsets = file
        .entries
        .iter()
        .map(|entry| remap.get(&entry.offset).copied().unwrap_or(entry.offset))
        .collect();

    Ok(Layout {
        chunks,
        data_size,
        padding,
        remap,
        entry_offsets,
    })
}
