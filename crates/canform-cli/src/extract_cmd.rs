use std::path::Path;

use canform::FormKind;

use crate::cli::OutputFormat;
use crate::shared::{load_extractor, read_file};

pub fn run(
    file: &Path,
    form: Option<FormKind>,
    tables_dir: Option<&Path>,
    format: OutputFormat,
    strict: bool,
) -> Result<(), i32> {
    let extractor = load_extractor(tables_dir)?;
    let bytes = read_file(file)?;
    let record = extractor.extract(&bytes, form).map_err(|e| {
        eprintln!("Error: {e}");
        1
    })?;

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(&record),
        OutputFormat::Pretty => serde_json::to_string_pretty(&record),
    }
    .map_err(|e| {
        eprintln!("Error serializing record: {e}");
        1
    })?;
    println!("{rendered}");

    if strict && !record.errors.is_empty() {
        eprintln!(
            "{} field error(s) in {}",
            record.errors.len(),
            file.display()
        );
        return Err(2);
    }
    Ok(())
}
