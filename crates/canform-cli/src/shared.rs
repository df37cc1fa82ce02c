use std::path::Path;

use canform::Extractor;

/// Build the extractor from a tables directory, or the builtin tables when
/// no directory is given. Errors are printed and mapped to exit code 1.
pub fn load_extractor(tables_dir: Option<&Path>) -> Result<Extractor, i32> {
    let result = match tables_dir {
        Some(dir) => canform::tables::registry_from_dir(dir).and_then(Extractor::new),
        None => Extractor::builtin(),
    };
    result.map_err(|e| {
        eprintln!("Error loading alias tables: {e}");
        1
    })
}

pub fn read_file(path: &Path) -> Result<Vec<u8>, i32> {
    std::fs::read(path).map_err(|e| {
        eprintln!("Error reading {}: {e}", path.display());
        1
    })
}
