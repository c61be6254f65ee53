//! Parsed container model and the edit surface.
//!
//! Entries and index cells never own string bytes directly: every
//! decoded run lives in exactly one [`Segment`] keyed by its original
//! pool offset, and referencing entries hold indices into that arena.
//! "Dirty" is always derived by comparing the current text record with
//! the one captured at parse time.

use crate::error::{BmgError, BmgResult};
use crate::text;

/// Text plus its leading-null flag, the unit of editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    /// Display text with control codes as bracket tokens.
    pub text: String,
    /// Whether the encoded form starts with a null unit.
    pub leading_null: bool,
}

/// One row of the entry table.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Position in the entry table.
    pub index: usize,
    /// Message identifier (first u16 of the row, when present).
    pub message_id: u16,
    /// Group identifier (second u16 of the row, when present).
    pub group_id: u16,
    /// First attribute word.
    pub attr1: u16,
    /// Second attribute word.
    pub attr2: u16,
    /// Raw u16 words between the fixed header and the offset field.
    pub extra_fields: Vec<u16>,
    /// Raw bytes of everything before the trailing offset field.
    pub attribute_bytes: Vec<u8>,
    /// Pool-relative offset of this entry's string.
    pub offset: u32,
    pub(crate) original: TextRecord,
    pub(crate) current: TextRecord,
    pub(crate) original_byte_len: usize,
}

impl Entry {
    /// Composite key `group_id << 16 | message_id`.
    pub fn composite_id(&self) -> u32 {
        (u32::from(self.group_id) << 16) | u32::from(self.message_id)
    }

    /// Current display text.
    pub fn text(&self) -> &str {
        &self.current.text
    }

    /// Current leading-null flag.
    pub fn leading_null(&self) -> bool {
        self.current.leading_null
    }

    /// Text as read at parse time.
    pub fn original_text(&self) -> &str {
        &self.original.text
    }

    /// Leading-null flag as read at parse time.
    pub fn original_leading_null(&self) -> bool {
        self.original.leading_null
    }

    /// Whether the entry differs from its parse-time state.
    pub fn is_dirty(&self) -> bool {
        self.current != self.original
    }

    /// Encoded size in bytes of the current text.
    pub fn byte_len(&self) -> usize {
        if self.is_dirty() {
            text::encode_string(&self.current.text, self.current.leading_null).len()
        } else {
            self.original_byte_len
        }
    }
}

/// How a pool segment is referenced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// Referenced by at least one entry-table row.
    Entry,
    /// Referenced only by pointer-mode index cells.
    Index,
    /// Recovered by the id-mode scan.
    IndexId,
    /// Unreferenced gap or tail bytes, carried for byte fidelity.
    Filler,
}

/// One index-table cell resolving into the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRef {
    /// Row of the cell.
    pub row: usize,
    /// Column of the cell.
    pub column: usize,
    /// Flag bits masked off the raw cell value (pointer mode only).
    pub flags: u32,
    /// The raw cell value as read.
    pub raw: u32,
}

/// A de-duplicated slice of the string pool.
#[derive(Debug, Clone)]
pub struct Segment {
    /// Pool-relative offset the segment was read from.
    pub original_offset: u32,
    /// Original encoded bytes.
    pub bytes: Vec<u8>,
    /// How the segment is referenced.
    pub kind: SegmentKind,
    /// Indices of entries whose offset resolves here.
    pub entry_indices: Vec<usize>,
    /// Index-table cells that resolve here.
    pub index_refs: Vec<IndexRef>,
    pub(crate) original: TextRecord,
    pub(crate) current: TextRecord,
}

impl Segment {
    /// Current display text.
    pub fn text(&self) -> &str {
        &self.current.text
    }

    /// Current leading-null flag.
    pub fn leading_null(&self) -> bool {
        self.current.leading_null
    }

    /// Whether the segment's own text was edited. Entry-referenced
    /// segments are driven by their entries instead.
    pub fn is_dirty(&self) -> bool {
        self.current != self.original
    }
}

/// Header fields of the optional index section.
#[derive(Debug, Clone)]
pub struct IndexGrid {
    /// Declared entry count from the section header.
    pub declared_count: u16,
    /// Row stride in bytes.
    pub row_stride: u16,
    /// Reserved header word, preserved verbatim.
    pub reserved: u32,
    /// Cells per row (`row_stride / 4`, at least one).
    pub columns: usize,
    /// All cell values, row-major. Rows that read out of bounds are
    /// dropped at parse time.
    pub rows: Vec<Vec<u32>>,
}

/// The index table in its inferred interpretation.
#[derive(Debug, Clone)]
pub enum IndexTable {
    /// No index section, or one without usable rows.
    Absent,
    /// Cells are flag-bit-masked byte offsets into the pool.
    Pointers(IndexGrid),
    /// Cells are opaque numeric identifiers.
    Ids(IndexGrid),
}

impl IndexTable {
    /// Whether no usable index table was found.
    pub fn is_absent(&self) -> bool {
        matches!(self, IndexTable::Absent)
    }

    /// The underlying grid, when present.
    pub fn grid(&self) -> Option<&IndexGrid> {
        match self {
            IndexTable::Absent => None,
            IndexTable::Pointers(grid) | IndexTable::Ids(grid) => Some(grid),
        }
    }
}

/// A parsed message container.
///
/// Holds the raw input (needed to reproduce untouched regions
/// byte-for-byte), the entry table, the segment arena covering the
/// whole pool, and the index table in its inferred mode.
#[derive(Debug, Clone)]
pub struct BmgFile {
    pub(crate) raw: Vec<u8>,
    /// Magic plus format sub-tag (bytes 0..8).
    pub format_tag: [u8; 8],
    /// File size as declared at offset 8.
    pub declared_file_size: u32,
    /// Section count as declared at offset 12.
    pub section_count: u32,
    /// Encoding marker at offset 16.
    pub encoding: u8,
    /// Absolute offset of the entry-table section tag.
    pub entry_table_offset: usize,
    /// Declared size of the entry-table section.
    pub entry_table_size: u32,
    /// Absolute offset of the first entry row.
    pub(crate) entry_start: usize,
    /// Size of one entry row in bytes.
    pub entry_size: u16,
    /// Absolute offset of the pool section tag.
    pub pool_offset: usize,
    /// Absolute offset of the pool content (tag + size header skipped).
    pub pool_base: usize,
    /// Declared size of the pool section, header included.
    pub pool_declared_size: u32,
    /// Effective pool content size used for segmentation.
    pub pool_actual_size: usize,
    /// Absolute offset of the index section tag, when present.
    pub index_offset: Option<usize>,
    /// Entry-table rows in table order.
    pub entries: Vec<Entry>,
    /// Full pool partition, ascending by original offset.
    pub segments: Vec<Segment>,
    /// The index table in its inferred mode.
    pub index_table: IndexTable,
}

impl BmgFile {
    /// The raw input bytes the file was parsed from.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Whether any entry or index string differs from its parse-time
    /// state.
    pub fn is_dirty(&self) -> bool {
        self.entries.iter().any(Entry::is_dirty) || self.segments.iter().any(Segment::is_dirty)
    }

    /// Replace an entry's display text.
    pub fn set_entry_text(&mut self, index: usize, text: impl Into<String>) -> BmgResult<()> {
        let entry = self.entry_mut(index)?;
        entry.current.text = text.into();
        Ok(())
    }

    /// Replace an entry's leading-null flag.
    pub fn set_entry_leading_null(&mut self, index: usize, leading_null: bool) -> BmgResult<()> {
        let entry = self.entry_mut(index)?;
        entry.current.leading_null = leading_null;
        Ok(())
    }

    /// Restore an entry to its parse-time text and flag.
    pub fn revert_entry(&mut self, index: usize) -> BmgResult<()> {
        let entry = self.entry_mut(index)?;
        entry.current = entry.original.clone();
        Ok(())
    }

    /// Segments that carry index-referenced strings.
    pub fn index_strings(&self) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(|s| matches!(s.kind, SegmentKind::Index | SegmentKind::IndexId))
    }

    /// Replace the text of an index-referenced string, addressed by its
    /// original pool offset.
    pub fn set_index_text(&mut self, offset: u32, text: impl Into<String>) -> BmgResult<()> {
        let segment = self.index_segment_mut(offset)?;
        segment.current.text = text.into();
        Ok(())
    }

    /// Replace the leading-null flag of an index-referenced string.
    pub fn set_index_leading_null(&mut self, offset: u32, leading_null: bool) -> BmgResult<()> {
        let segment = self.index_segment_mut(offset)?;
        segment.current.leading_null = leading_null;
        Ok(())
    }

    /// Restore an index-referenced string to its parse-time state.
    pub fn revert_index_text(&mut self, offset: u32) -> BmgResult<()> {
        let segment = self.index_segment_mut(offset)?;
        segment.current = segment.original.clone();
        Ok(())
    }

    /// The segment covering `offset`, if one starts exactly there.
    pub fn segment_at(&self, offset: u32) -> Option<&Segment> {
        self.segments
            .iter()
            .find(|s| s.original_offset == offset)
    }

    fn entry_mut(&mut self, index: usize) -> BmgResult<&mut Entry> {
        self.entries.get_mut(index).ok_or(BmgError::UnknownTarget {
            kind: "entry",
            key: index.to_string(),
        })
    }

    fn index_segment_mut(&mut self, offset: u32) -> BmgResult<&mut Segment> {
        self.segments
            .iter_mut()
            .find(|s| {
                s.original_offset == offset
                    && matches!(s.kind, SegmentKind::Index | SegmentKind::IndexId)
            })
            .ok_or(BmgError::UnknownTarget {
                kind: "index string",
                key: format!("{offset:#06x}"),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str) -> TextRecord {
        TextRecord {
            text: text.to_string(),
            leading_null: false,
        }
    }

    #[test]
    fn dirty_is_derived_not_stored() {
        let mut entry = Entry {
            index: 0,
            message_id: 1,
            group_id: 2,
            attr1: 0,
            attr2: 0,
            extra_fields: vec![],
            attribute_bytes: vec![],
            offset: 0,
            original: record("old"),
            current: record("old"),
            original_byte_len: 8,
        };
        assert!(!entry.is_dirty());
        assert_eq!(entry.byte_len(), 8);

        entry.current.text = "new!".to_string();
        assert!(entry.is_dirty());
        // "new!" + terminator, two bytes per unit.
        assert_eq!(entry.byte_len(), 10);

        entry.current = entry.original.clone();
        assert!(!entry.is_dirty());
    }

    #[test]
    fn composite_id_packs_group_high() {
        let entry = Entry {
            index: 0,
            message_id: 0x0203,
            group_id: 0x0001,
            attr1: 0,
            attr2: 0,
            extra_fields: vec![],
            attribute_bytes: vec![],
            offset: 0,
            original: record(""),
            current: record(""),
            original_byte_len: 2,
        };
        assert_eq!(entry.composite_id(), 0x0001_0203);
    }
}
