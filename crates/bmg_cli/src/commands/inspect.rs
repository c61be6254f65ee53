//! Inspect command implementation.

use bmg_codec::{parse, IndexTable, SegmentKind};
use serde::Serialize;
use std::path::Path;

/// Container inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Input path.
    pub file: String,
    /// Magic plus format sub-tag, lossily decoded.
    pub format_tag: String,
    /// File size declared in the header.
    pub declared_file_size: u32,
    /// File size on disk.
    pub actual_file_size: usize,
    /// Section count declared in the header.
    pub section_count: u32,
    /// Encoding marker byte.
    pub encoding: u8,
    /// Number of entry-table rows.
    pub entry_count: usize,
    /// Size of one entry row in bytes.
    pub entry_size: u16,
    /// Pool size declared in the section header.
    pub pool_declared_size: u32,
    /// Pool size actually used for segmentation.
    pub pool_actual_size: usize,
    /// Total pool segments.
    pub segment_count: usize,
    /// Segments nothing references.
    pub filler_segments: usize,
    /// Index table interpretation (none, pointers, ids).
    pub index_mode: String,
    /// Strings reachable only through the index table.
    pub index_string_count: usize,
    /// Diagnostics collected while parsing.
    pub warnings: usize,
    /// Per-entry listing (if requested).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<EntryLine>>,
}

/// One entry in the detailed listing.
#[derive(Debug, Serialize)]
pub struct EntryLine {
    /// Position in the entry table.
    pub index: usize,
    /// Message identifier.
    pub message_id: u16,
    /// Group identifier.
    pub group_id: u16,
    /// Combined `group << 16 | message` key.
    pub composite_id: u32,
    /// Pool-relative string offset.
    pub offset: u32,
    /// Whether the string starts with a null unit.
    pub leading_null: bool,
    /// Display text.
    pub text: String,
}

/// Runs the inspect command.
pub fn run(path: &Path, show_entries: bool, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let outcome = parse(&bytes)?;
    let file = &outcome.file;

    let index_mode = match &file.index_table {
        IndexTable::Absent => "none",
        IndexTable::Pointers(_) => "pointers",
        IndexTable::Ids(_) => "ids",
    };

    let result = InspectResult {
        file: path.display().to_string(),
        format_tag: String::from_utf8_lossy(&file.format_tag).into_owned(),
        declared_file_size: file.declared_file_size,
        actual_file_size: bytes.len(),
        section_count: file.section_count,
        encoding: file.encoding,
        entry_count: file.entries.len(),
        entry_size: file.entry_size,
        pool_declared_size: file.pool_declared_size,
        pool_actual_size: file.pool_actual_size,
        segment_count: file.segments.len(),
        filler_segments: file
            .segments
            .iter()
            .filter(|s| s.kind == SegmentKind::Filler)
            .count(),
        index_mode: index_mode.to_string(),
        index_string_count: file.index_strings().count(),
        warnings: outcome.diagnostics.len(),
        entries: show_entries.then(|| {
            file.entries
                .iter()
                .map(|entry| EntryLine {
                    index: entry.index,
                    message_id: entry.message_id,
                    group_id: entry.group_id,
                    composite_id: entry.composite_id(),
                    offset: entry.offset,
                    leading_null: entry.leading_null(),
                    text: entry.text().to_string(),
                })
                .collect()
        }),
    };

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result, &outcome);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult, outcome: &bmg_codec::ParseOutcome) {
    println!("BMG Container Inspection");
    println!("========================");
    println!();
    println!("File: {}", result.file);
    println!();
    println!("Header:");
    println!("  Format tag:    {}", result.format_tag);
    println!(
        "  File size:     {} declared / {} actual",
        result.declared_file_size, result.actual_file_size
    );
    println!("  Sections:      {}", result.section_count);
    println!("  Encoding:      {:#04x}", result.encoding);
    println!();
    println!("Entry table:");
    println!("  Entries:       {}", result.entry_count);
    println!("  Entry size:    {} bytes", result.entry_size);
    println!();
    println!("String pool:");
    println!(
        "  Size:          {} declared / {} used",
        result.pool_declared_size, result.pool_actual_size
    );
    println!(
        "  Segments:      {} ({} filler)",
        result.segment_count, result.filler_segments
    );
    println!();
    println!("Index table:");
    println!("  Mode:          {}", result.index_mode);
    println!("  Strings:       {}", result.index_string_count);

    if !outcome.diagnostics.is_empty() {
        println!();
        println!("Warnings:");
        for diag in outcome.diagnostics.iter() {
            println!("  [{}] {}", diag.context, diag.message);
        }
    }

    if let Some(entries) = &result.entries {
        println!();
        println!("Entries:");
        for line in entries {
            let null_mark = if line.leading_null { "*" } else { " " };
            println!(
                "  #{:<4} id {:#010x} @{:#06x}{} {}",
                line.index,
                line.composite_id,
                line.offset,
                null_mark,
                line.text.replace('\n', "\\n")
            );
        }
    }
}
