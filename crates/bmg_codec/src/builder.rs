//! Output assembly.
//!
//! The output is the original bytes with the pool replaced wholesale:
//! everything before the pool content is copied verbatim, the planned
//! chunks and alignment padding follow, and the trailing index section
//! (when present) is appended from its exact original position. The
//! headers and offset fields touched by the move are then patched in
//! place.

use crate::diagnostics::Diagnostics;
use crate::error::BmgResult;
use crate::layout::{self, Layout};
use crate::model::{BmgFile, IndexTable};
use crate::reader::put_u32;

/// A rebuilt container plus the diagnostics collected while patching.
#[derive(Debug)]
pub struct BuildOutcome {
    /// The rebuilt file.
    pub bytes: Vec<u8>,
    /// Offset field written for each entry, in table order.
    pub entry_offsets: Vec<u32>,
    /// Recoverable degradations hit while patching.
    pub diagnostics: Diagnostics,
}

/// Plan the layout for the file's current text and rebuild it.
pub fn build(file: &BmgFile) -> BmgResult<BuildOutcome> {
    let layout = layout::plan(file)?;
    build_with_layout(file, &layout)
}

/// Rebuild the file against an already planned layout.
pub fn build_with_layout(file: &BmgFile, layout: &Layout) -> BmgResult<BuildOutcome> {
    let mut diags = Diagnostics::new();
    let raw = file.raw();
    let before = &raw[..file.pool_base];
    let after_start = file.index_offset.unwrap_or(raw.len());
    let after = &raw[after_start..];

    let mut out =
        Vec::with_capacity(before.len() + layout.data_size + layout.padding + after.len());
    out.extend_from_slice(before);
    for chunk in &layout.chunks {
        out.extend_from_slice(&chunk.bytes);
    }
    out.resize(out.len() + layout.padding, 0);
    let new_index_offset = out.len();
    out.extend_from_slice(after);

    // The declared pool size counts its own 8-byte section header, so
    // the following section starts that far inside the declared span.
    let declared_pool = (layout.data_size + layout.padding + 8) as u32;
    put_u32(&mut out, file.pool_offset + 4, declared_pool)?;
    let total = out.len() as u32;
    put_u32(&mut out, 8, total)?;

    for (entry, &offset) in file.entries.iter().zip(&layout.entry_offsets) {
        let row = file.entry_start + entry.index * file.entry_size as usize;
        put_u32(&mut out, row + file.entry_size as usize - 4, offset)?;
    }

    // Pointer-mode index cells address the pool by byte offset, so a
    // moved pool means rewriting every cell at the section's new home.
    if file.index_offset.is_some() {
        if let IndexTable::Pointers(grid) = &file.index_table {
            let data_start = new_index_offset + 16;
            for (row, values) in grid.rows.iter().enumerate() {
                let row_base = data_start + row * grid.row_stride as usize;
                for (column, &value) in values.iter().enumerate() {
                    if value == 0 {
                        continue;
                    }
                    let cell = row_base + column * 4;
                    let flags = value & 1;
                    let offset = value & !1;
                    match layout.remap.get(&offset) {
                        Some(&new_offset) => put_u32(&mut out, cell, new_offset | flags)?,
                        None => {
                            diags.warn(
                                format!("index table row {row} column {column}"),
                                format!("pointer {value:#06x} has no remapped target; kept as-is"),
                            );
                            put_u32(&mut out, cell, value)?;
                        }
                    }
                }
            }
        }
    }

    Ok(BuildOutcome {
        bytes: out,
        entry_offsets: layout.entry_offsets.clone(),
        diagnostics: diags,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser;
    use crate::reader::get_u32;
    use crate::testutil::fixture;

    #[test]
    fn untouched_file_rebuilds_byte_identical() {
        for with_index in [false, true] {
            let bytes = fixture(with_index);
            let file = parser::parse(&bytes).unwrap().file;
            let outcome = build(&file).unwrap();
            assert!(outcome.diagnostics.is_empty());
            assert_eq!(outcome.bytes, bytes, "with_index={with_index}");
        }
    }

    #[test]
    fn edited_entry_survives_a_rebuild() {
        let mut file = parser::parse(&fixture(true)).unwrap().file;
        file.set_entry_text(1, "Yolo").unwrap();
        let outcome = build(&file).unwrap();
        assert!(outcome.diagnostics.is_empty());
        assert_eq!(outcome.entry_offsets, vec![0, 6]);

        let reparsed = parser::parse(&outcome.bytes).unwrap().file;
        assert_eq!(reparsed.entries[1].text(), "Yolo");
        assert!(reparsed.entries[1].leading_null());
        assert_eq!(reparsed.entries[0].text(), "Hi");
        assert!(!reparsed.is_dirty());

        // Size fields track the grown pool.
        let total = get_u32(&outcome.bytes, 8).unwrap();
        assert_eq!(total as usize, outcome.bytes.len());
        let declared_pool = get_u32(&outcome.bytes, reparsed.pool_offset + 4).unwrap();
        // "Yolo" with its leading null replaces 8 bytes with 12.
        assert_eq!(declared_pool, 24 + 4 + 8);
    }

    #[test]
    fn index_pointers_follow_their_strings() {
        let mut file = parser::parse(&fixture(true)).unwrap().file;
        // Growing the second entry pushes the indexed string forward.
        file.set_entry_text(1, "Yodel").unwrap();
        let outcome = build(&file).unwrap();

        let reparsed = parser::parse(&outcome.bytes).unwrap().file;
        let indexed: Vec<_> = reparsed.index_strings().collect();
        assert_eq!(indexed.len(), 1);
        assert_eq!(indexed[0].text(), "Hey");
        // "Yodel" plus its leading null is 14 bytes, up from 8.
        assert_eq!(indexed[0].original_offset, 20);
        // The flag bit rides along on the rewritten cell.
        assert_eq!(indexed[0].index_refs[0].flags, 1);
    }

    #[test]
    fn editing_an_index_string_round_trips() {
        let mut file = parser::parse(&fixture(true)).unwrap().file;
        let offset = file.index_strings().next().unwrap().original_offset;
        file.set_index_text(offset, "Hello!").unwrap();
        let outcome = build(&file).unwrap();

        let reparsed = parser::parse(&outcome.bytes).unwrap().file;
        let indexed: Vec<_> = reparsed.index_strings().collect();
        assert_eq!(indexed[0].text(), "Hello!");
        assert_eq!(reparsed.entries[0].text(), "Hi");
        assert_eq!(reparsed.entries[1].text(), "Yo");
    }

    #[test]
    fn unmapped_pointer_is_preserved_with_a_warning() {
        let mut file = parser::parse(&fixture(true)).unwrap().file;
        // Point the cell into the middle of a string, an offset no
        // segment starts at.
        if let IndexTable::Pointers(grid) = &mut file.index_table {
            grid.rows[0][0] = 2 | 1;
        }
        let outcome = build(&file).unwrap();
        assert_eq!(outcome.diagnostics.len(), 1);

        let mid = file.index_offset.unwrap();
        // Pool length did not change, so the section did not move.
        let cell = get_u32(&outcome.bytes, mid + 16).unwrap();
        assert_eq!(cell, 2 | 1);
    }
}
