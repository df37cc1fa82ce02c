use std::path::Path;

use crate::shared::load_extractor;

/// List the loaded alias tables in declaration (recency) order.
pub fn run(tables_dir: Option<&Path>) -> Result<(), i32> {
    let extractor = load_extractor(tables_dir)?;
    for table in extractor.registry().tables() {
        println!(
            "{} {} ({} rules, {} groups)",
            table.form.as_str(),
            table.revision,
            table.rules.len(),
            table.groups.len()
        );
    }
    Ok(())
}
