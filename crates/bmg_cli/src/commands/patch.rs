//! Patch command implementation.

use super::export::Payload;
use bmg_codec::{build, parse};
use std::path::Path;

/// Runs the patch command: apply JSON edits to a container and write
/// the rebuilt file.
pub fn run(input: &Path, edits: &Path, output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(input)?;
    let mut file = parse(&bytes)?.file;

    let payload: Payload = serde_json::from_slice(&std::fs::read(edits)?)?;
    let mut applied = 0usize;

    for record in payload.entries {
        if let Some(text) = record.text {
            file.set_entry_text(record.index, text)?;
            applied += 1;
        }
        if let Some(leading_null) = record.leading_null {
            file.set_entry_leading_null(record.index, leading_null)?;
        }
    }
    for record in payload.index_strings {
        if let Some(text) = record.text {
            file.set_index_text(record.offset, text)?;
            applied += 1;
        }
        if let Some(leading_null) = record.leading_null {
            file.set_index_leading_null(record.offset, leading_null)?;
        }
    }

    let outcome = build(&file)?;
    for diag in outcome.diagnostics.iter() {
        println!("build: [{}] {}", diag.context, diag.message);
    }

    std::fs::write(output, &outcome.bytes)?;
    println!(
        "Wrote {} ({} bytes, {} strings patched)",
        output.display(),
        outcome.bytes.len(),
        applied
    );

    Ok(())
}
