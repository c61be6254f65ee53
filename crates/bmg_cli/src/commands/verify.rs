//! Verify command implementation.

use bmg_codec::{build, parse, Diagnostic};
use std::path::Path;

/// Runs the verify command: an edit-free parse and rebuild. Succeeds
/// only when the rebuilt container is byte-identical to the input.
pub fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;

    let parsed = parse(&bytes)?;
    print_diagnostics("parse", parsed.diagnostics.iter());

    let built = build(&parsed.file)?;
    print_diagnostics("build", built.diagnostics.iter());

    if built.bytes == bytes {
        println!(
            "OK: {} rebuilds byte-identical ({} bytes, {} entries, {} index strings)",
            path.display(),
            bytes.len(),
            parsed.file.entries.len(),
            parsed.file.index_strings().count()
        );
        return Ok(());
    }

    let first_diff = bytes
        .iter()
        .zip(&built.bytes)
        .position(|(a, b)| a != b)
        .unwrap_or_else(|| bytes.len().min(built.bytes.len()));
    Err(format!(
        "rebuild differs from input: {} bytes in, {} bytes out, first difference at offset {:#x}",
        bytes.len(),
        built.bytes.len(),
        first_diff
    )
    .into())
}

fn print_diagnostics<'a>(stage: &str, diags: impl Iterator<Item = &'a Diagnostic>) {
    for diag in diags {
        println!("{stage}: [{}] {}", diag.context, diag.message);
    }
}
