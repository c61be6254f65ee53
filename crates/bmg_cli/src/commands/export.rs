//! Export command implementation, plus the JSON interchange shape
//! shared with `patch`.

use bmg_codec::parse;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The export/patch interchange document. On export every field is
/// populated; on patch, omitted fields leave the target unchanged.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Payload {
    /// Entry-table strings, addressed by table index.
    #[serde(default)]
    pub entries: Vec<EntryRecord>,
    /// Index-referenced strings, addressed by original pool offset.
    #[serde(default)]
    pub index_strings: Vec<IndexRecord>,
}

/// One entry-table string.
#[derive(Debug, Serialize, Deserialize)]
pub struct EntryRecord {
    /// Position in the entry table.
    pub index: usize,
    /// Message identifier, informational on patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<u16>,
    /// Group identifier, informational on patch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<u16>,
    /// Display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Leading-null flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leading_null: Option<bool>,
}

/// One index-referenced string.
#[derive(Debug, Serialize, Deserialize)]
pub struct IndexRecord {
    /// Pool offset the string was parsed from.
    pub offset: u32,
    /// Display text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Leading-null flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leading_null: Option<bool>,
}

/// Runs the export command.
pub fn run(path: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path)?;
    let file = parse(&bytes)?.file;

    let payload = Payload {
        entries: file
            .entries
            .iter()
            .map(|entry| EntryRecord {
                index: entry.index,
                message_id: Some(entry.message_id),
                group_id: Some(entry.group_id),
                text: Some(entry.text().to_string()),
                leading_null: Some(entry.leading_null()),
            })
            .collect(),
        index_strings: file
            .index_strings()
            .map(|segment| IndexRecord {
                offset: segment.original_offset,
                text: Some(segment.text().to_string()),
                leading_null: Some(segment.leading_null()),
            })
            .collect(),
    };

    let json = serde_json::to_string_pretty(&payload)?;
    match output {
        Some(out) => {
            std::fs::write(out, json)?;
            println!(
                "Exported {} entries and {} index strings to {}",
                payload.entries.len(),
                payload.index_strings.len(),
                out.display()
            );
        }
        None => println!("{json}"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_payload_accepts_sparse_records() {
        let payload: Payload = serde_json::from_str(
            r#"{"entries": [{"index": 3, "text": "hello"}]}"#,
        )
        .unwrap();
        assert_eq!(payload.entries.len(), 1);
        assert_eq!(payload.entries[0].index, 3);
        assert_eq!(payload.entries[0].text.as_deref(), Some("hello"));
        assert_eq!(payload.entries[0].leading_null, None);
        assert!(payload.index_strings.is_empty());
    }
}
