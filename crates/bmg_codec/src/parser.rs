//! Container parser: header, entry table, pool segmentation, index
//! inference.
//!
//! Parsing is strict about structure (magic, mandatory sections, entry
//! rows inside the buffer) and lenient about content: truncated
//! strings, short index rows and foreign encodings degrade with a
//! diagnostic instead of failing the whole file.

use std::collections::{BTreeMap, HashSet};

use crate::diagnostics::Diagnostics;
use crate::error::{BmgError, BmgResult};
use crate::model::{
    BmgFile, Entry, IndexGrid, IndexRef, IndexTable, Segment, SegmentKind, TextRecord,
};
use crate::reader::{find_section, get_u16, get_u32};
use crate::text::{self, MAX_STRING_UNITS};

/// Section tag of the mandatory entry table.
pub const ENTRY_TABLE_TAG: [u8; 4] = *b"INF1";
/// Section tag of the mandatory string pool.
pub const POOL_TAG: [u8; 4] = *b"DAT1";
/// Section tag of the optional index table.
pub const INDEX_TAG: [u8; 4] = *b"MID1";
/// Encoding marker for UTF-16LE, the only encoding the codec decodes.
pub const ENCODING_UTF16_LE: u8 = 0x01;

/// A parsed file plus everything the parser had to work around.
#[derive(Debug)]
pub struct ParseOutcome {
    /// The parsed container.
    pub file: BmgFile,
    /// Recoverable degradations hit while parsing.
    pub diagnostics: Diagnostics,
}

/// In-progress pool segment, keyed by pool-relative offset.
#[derive(Default)]
struct SegmentBuild {
    kind: Option<SegmentKind>,
    entry_indices: Vec<usize>,
    index_refs: Vec<IndexRef>,
    data: Option<(Vec<u8>, TextRecord)>,
}

impl SegmentBuild {
    fn claim(&mut self, bytes: Vec<u8>, record: TextRecord) {
        if self.data.is_none() {
            self.data = Some((bytes, record));
        }
    }
}

/// Parse a container from raw bytes.
pub fn parse(bytes: &[u8]) -> BmgResult<ParseOutcome> {
    let mut diags = Diagnostics::new();
    let data = bytes;

    if data.len() < 4 || data[0..4] != *b"MESG" {
        return Err(BmgError::UnsupportedHeader);
    }
    let declared_file_size = get_u32(data, 8)?;
    let section_count = get_u32(data, 12)?;
    let encoding = *data.get(16).ok_or(BmgError::OutOfBounds { offset: 16 })?;
    let mut format_tag = [0u8; 8];
    format_tag.copy_from_slice(&data[0..8]);

    if encoding != ENCODING_UTF16_LE {
        diags.warn(
            "header",
            format!("encoding marker {encoding:#04x} is not UTF-16LE; text may decode incorrectly"),
        );
    }

    let entry_table_offset = find_section(data, ENTRY_TABLE_TAG)
        .ok_or_else(|| BmgError::section_not_found(ENTRY_TABLE_TAG))?;
    let pool_offset =
        find_section(data, POOL_TAG).ok_or_else(|| BmgError::section_not_found(POOL_TAG))?;
    let index_offset = find_section(data, INDEX_TAG);
    let index_size = match index_offset {
        Some(offset) => get_u32(data, offset + 4).unwrap_or(0),
        None => 0,
    };

    let entry_table_size = get_u32(data, entry_table_offset + 4)?;
    let entry_count = get_u16(data, entry_table_offset + 8)? as usize;
    let entry_size = get_u16(data, entry_table_offset + 10)?;
    if entry_count > 0 && entry_size < 4 {
        // A row must at least hold its trailing offset field.
        return Err(BmgError::OutOfBounds {
            offset: entry_table_offset + 10,
        });
    }
    let used_bytes = entry_count * entry_size as usize;
    let header_bytes = (entry_table_size as usize).saturating_sub(8 + used_bytes);
    let entry_start = entry_table_offset + 8 + header_bytes;

    let pool_declared_size = get_u32(data, pool_offset + 4)?;
    let pool_base = pool_offset + 8;
    let pool_actual_size = match index_offset {
        // The declared size routinely disagrees with reality; trust the
        // next section boundary when there is one, the buffer otherwise.
        Some(mid) => (pool_declared_size as usize).min(mid.saturating_sub(pool_base)),
        None => (pool_declared_size as usize).max(data.len().saturating_sub(pool_base)),
    };

    let mut segment_map: BTreeMap<u32, SegmentBuild> = BTreeMap::new();

    let mut entries = Vec::with_capacity(entry_count);
    for index in 0..entry_count {
        let base = entry_start + index * entry_size as usize;
        let row_end = base + entry_size as usize;
        if row_end > data.len() {
            return Err(BmgError::EntryOutOfBounds { index });
        }
        let message_id = if entry_size >= 2 { get_u16(data, base)? } else { 0 };
        let group_id = if entry_size >= 4 { get_u16(data, base + 2)? } else { 0 };
        let attr1 = if entry_size >= 6 { get_u16(data, base + 4)? } else { 0 };
        let attr2 = if entry_size >= 8 { get_u16(data, base + 6)? } else { 0 };
        let offset_field = base + entry_size as usize - 4;
        let offset = get_u32(data, offset_field)?;
        let attribute_bytes = data[base..offset_field].to_vec();
        let mut extra_fields = Vec::new();
        let mut pos = 8usize;
        while pos < entry_size as usize - 4 {
            extra_fields.push(get_u16(data, base + pos)?);
            pos += 2;
        }

        let abs = pool_base + offset as usize;
        let decoded = text::decode_string(data, abs, data.len(), MAX_STRING_UNITS, &mut diags);
        let end = (abs + decoded.byte_len).min(data.len());
        let original_bytes = if abs < end { data[abs..end].to_vec() } else { Vec::new() };
        let record = TextRecord {
            text: decoded.text,
            leading_null: decoded.leading_null,
        };

        let segment = segment_map.entry(offset).or_default();
        segment.kind = Some(SegmentKind::Entry);
        segment.entry_indices.push(index);
        segment.claim(original_bytes, record.clone());

        entries.push(Entry {
            index,
            message_id,
            group_id,
            attr1,
            attr2,
            extra_fields,
            attribute_bytes,
            offset,
            original: record.clone(),
            current: record,
            original_byte_len: decoded.byte_len,
        });
    }

    let mut index_table = IndexTable::Absent;
    let mut id_cells: Vec<(usize, usize, u32)> = Vec::new();

    if let Some(mid_offset) = index_offset {
        if index_size > 0 {
            let mid_base = mid_offset + 8;
            let declared_count = get_u16(data, mid_base)?;
            let row_stride = get_u16(data, mid_base + 2)?;
            let reserved = get_u32(data, mid_base + 4)?;
            let columns = if row_stride > 0 {
                (row_stride as usize / 4).max(1)
            } else {
                0
            };
            // The declared size counts the tag, size word and the
            // count/stride/reserved sub-header, like every section.
            let data_bytes = (index_size as usize).saturating_sub(16);
            let row_count = if columns > 0 { data_bytes / row_stride as usize } else { 0 };

            if row_count > 0 && columns > 0 {
                let data_start = mid_base + 8;
                let mut rows: Vec<Vec<u32>> = Vec::with_capacity(row_count);
                let mut pointer_candidates = 0usize;
                let mut pointer_invalid = 0usize;

                for row in 0..row_count {
                    let row_base = data_start + row * row_stride as usize;
                    if row_base + row_stride as usize > data.len() {
                        diags.warn(
                            format!("index table row {row}"),
                            "row reads out of bounds; remaining rows dropped",
                        );
                        break;
                    }
                    let mut values = Vec::with_capacity(columns);
                    for column in 0..columns {
                        let value = get_u32(data, row_base + column * 4)?;
                        if value != 0 {
                            pointer_candidates += 1;
                            if pool_base + (value & !1) as usize >= data.len() {
                                pointer_invalid += 1;
                            }
                        }
                        values.push(value);
                    }
                    rows.push(values);
                }

                let pointer_mode = pointer_candidates > 0 && pointer_invalid == 0;
                if pointer_mode {
                    for (row, values) in rows.iter().enumerate() {
                        for (column, &value) in values.iter().enumerate() {
                            if value == 0 {
                                continue;
                            }
                            let offset = value & !1;
                            let flags = value & 1;
                            let segment = segment_map.entry(offset).or_default();
                            if segment.kind != Some(SegmentKind::Entry) {
                                segment.kind = Some(SegmentKind::Index);
                            }
                            segment.index_refs.push(IndexRef {
                                row,
                                column,
                                flags,
                                raw: value,
                            });
                            if segment.data.is_none() {
                                let abs = pool_base + offset as usize;
                                let decoded = text::decode_string(
                                    data,
                                    abs,
                                    data.len(),
                                    MAX_STRING_UNITS,
                                    &mut diags,
                                );
                                let end = (abs + decoded.byte_len).min(data.len());
                                let bytes =
                                    if abs < end { data[abs..end].to_vec() } else { Vec::new() };
                                segment.claim(
                                    bytes,
                                    TextRecord {
                                        text: decoded.text,
                                        leading_null: decoded.leading_null,
                                    },
                                );
                            }
                        }
                    }
                    index_table = IndexTable::Pointers(IndexGrid {
                        declared_count,
                        row_stride,
                        reserved,
                        columns,
                        rows,
                    });
                } else if declared_count > 0 {
                    let total = (declared_count as usize).min(rows.len() * columns);
                    'cells: for (row, values) in rows.iter().enumerate() {
                        for (column, &value) in values.iter().enumerate() {
                            if row * columns + column >= total {
                                break 'cells;
                            }
                            if value != 0 {
                                id_cells.push((row, column, value));
                            }
                        }
                    }
                    index_table = IndexTable::Ids(IndexGrid {
                        declared_count,
                        row_stride,
                        reserved,
                        columns,
                        rows,
                    });
                }
            }
        }
    }

    if matches!(index_table, IndexTable::Ids(_)) && !id_cells.is_empty() {
        recover_id_strings(
            data,
            pool_base,
            pool_actual_size,
            &entries,
            &id_cells,
            &mut segment_map,
            &mut diags,
        );
    }

    let segments = partition_pool(data, pool_base, pool_actual_size, segment_map);

    let file = BmgFile {
        raw: data.to_vec(),
        format_tag,
        declared_file_size,
        section_count,
        encoding,
        entry_table_offset,
        entry_table_size,
        entry_start,
        entry_size,
        pool_offset,
        pool_base,
        pool_declared_size,
        pool_actual_size,
        index_offset,
        entries,
        segments,
        index_table,
    };

    Ok(ParseOutcome {
        file,
        diagnostics: diags,
    })
}

/// Id-mode recovery: the index gives identifiers, not pointers, so the
/// strings it refers to are found by walking the pool past everything
/// the entry table already claims. Each recovered string is paired with
/// the next non-zero cell in row-major order.
fn recover_id_strings(
    data: &[u8],
    pool_base: usize,
    pool_actual_size: usize,
    entries: &[Entry],
    id_cells: &[(usize, usize, u32)],
    segment_map: &mut BTreeMap<u32, SegmentBuild>,
    diags: &mut Diagnostics,
) {
    let used_offsets: HashSet<u32> = entries.iter().map(|e| e.offset).collect();
    let mut scan = 0usize;
    let mut next_cell = 0usize;

    while scan < pool_actual_size && next_cell < id_cells.len() {
        let abs = pool_base + scan;
        if abs >= data.len() {
            break;
        }

        if used_offsets.contains(&(scan as u32)) {
            let mut scratch = Diagnostics::new();
            let info = text::decode_string(data, abs, data.len(), MAX_STRING_UNITS, &mut scratch);
            scan += info.byte_len.max(2);
            continue;
        }

        if abs + 1 < data.len() && data[abs] == 0 && data[abs + 1] == 0 {
            scan += 2;
            continue;
        }

        let mut scratch = Diagnostics::new();
        let info = text::decode_string(data, abs, data.len(), MAX_STRING_UNITS, &mut scratch);
        if info.byte_len > 2 && !info.text.trim().is_empty() {
            let (row, column, id) = id_cells[next_cell];
            let end = (abs + info.byte_len).min(data.len());
            let segment = segment_map.entry(scan as u32).or_default();
            if segment.kind != Some(SegmentKind::Entry) {
                segment.kind = Some(SegmentKind::IndexId);
            }
            segment.index_refs.push(IndexRef {
                row,
                column,
                flags: 0,
                raw: id,
            });
            segment.claim(
                data[abs..end].to_vec(),
                TextRecord {
                    text: info.text,
                    leading_null: info.leading_null,
                },
            );
            diags.extend(scratch);
            next_cell += 1;
        }
        scan += info.byte_len.max(2);
    }
}

/// Turn the claimed segments into a full partition of the pool,
/// synthesizing filler segments for gaps and the unclaimed tail.
fn partition_pool(
    data: &[u8],
    pool_base: usize,
    pool_actual_size: usize,
    segment_map: BTreeMap<u32, SegmentBuild>,
) -> Vec<Segment> {
    let filler = |start: usize, end: usize| -> Option<Segment> {
        let abs_start = (pool_base + start).min(data.len());
        let abs_end = (pool_base + end).min(data.len());
        if abs_end <= abs_start {
            return None;
        }
        Some(Segment {
            original_offset: start as u32,
            bytes: data[abs_start..abs_end].to_vec(),
            kind: SegmentKind::Filler,
            entry_indices: Vec::new(),
            index_refs: Vec::new(),
            original: TextRecord {
                text: String::new(),
                leading_null: false,
            },
            current: TextRecord {
                text: String::new(),
                leading_null: false,
            },
        })
    };

    let mut segments = Vec::new();
    let mut cursor = 0usize;
    for (offset, build) in segment_map {
        let Some((bytes, record)) = build.data else {
            continue;
        };
        let start = offset as usize;
        if start > cursor {
            segments.extend(filler(cursor, start));
        }
        let len = bytes.len();
        segments.push(Segment {
            original_offset: offset,
            bytes,
            kind: build.kind.unwrap_or(SegmentKind::Filler),
            entry_indices: build.entry_indices,
            index_refs: build.index_refs,
            original: record.clone(),
            current: record,
        });
        cursor = start + len;
    }
    if cursor < pool_actual_size {
        segments.extend(filler(cursor, pool_actual_size));
    }
    segments
}
