use std::path::Path;

use canform::{ReaderOptions, read_raw_fields};

use crate::cli::OutputFormat;
use crate::shared::{load_extractor, read_file};

/// Dump the raw (path, value) pairs a document carries, before any alias
/// resolution. The debugging companion to `extract`: this is what new alias
/// tables are written against.
pub fn run(file: &Path, tables_dir: Option<&Path>, format: OutputFormat) -> Result<(), i32> {
    let extractor = load_extractor(tables_dir)?;
    let bytes = read_file(file)?;
    let options = ReaderOptions {
        skip_subtrees: extractor.registry().skip_subtrees(),
    };
    let raw = read_raw_fields(&bytes, &options).map_err(|e| {
        eprintln!("Error: {e}");
        1
    })?;

    let map: serde_json::Map<String, serde_json::Value> = raw
        .iter()
        .map(|(path, value)| {
            (
                path.to_string(),
                serde_json::Value::String(value.as_str().to_string()),
            )
        })
        .collect();
    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(&map),
        OutputFormat::Pretty => serde_json::to_string_pretty(&map),
    }
    .map_err(|e| {
        eprintln!("Error serializing fields: {e}");
        1
    })?;
    println!("{rendered}");
    Ok(())
}
