//! Loading alias tables from JSON.
//!
//! Tables are plain data: supporting a new form revision means shipping a
//! new JSON file, not changing pipeline code. The builtin registry embeds
//! the tables for the supported form revisions; deployments tracking newer
//! revisions can load a directory of table files instead.

use std::path::Path;

use canform_core::{AliasRegistry, AliasTable, ExtractError};

const IMM5257E_06_2022: &str = include_str!("../config/imm5257e_06-2022.json");
const IMM5257E_10_2023: &str = include_str!("../config/imm5257e_10-2023.json");
const IMM5645E_09_2022: &str = include_str!("../config/imm5645e_09-2022.json");

/// Parse one alias table from JSON. Consistency checks run when the table
/// is pushed into a registry, not here.
pub fn table_from_json(json: &str) -> Result<AliasTable, ExtractError> {
    serde_json::from_str(json).map_err(|e| ExtractError::Config(format!("alias table JSON: {e}")))
}

/// The registry of builtin alias tables, oldest revision first.
pub fn builtin_registry() -> Result<AliasRegistry, ExtractError> {
    let mut registry = AliasRegistry::new();
    for json in [IMM5257E_06_2022, IMM5257E_10_2023, IMM5645E_09_2022] {
        registry.push(table_from_json(json)?)?;
    }
    Ok(registry)
}

/// Load every `.json` table file in a directory into a registry.
///
/// Files are loaded in lexicographic filename order, which doubles as the
/// registry's declaration (recency) order; name newer revisions so they
/// sort later.
pub fn registry_from_dir(dir: &Path) -> Result<AliasRegistry, ExtractError> {
    let read = |e: std::io::Error| ExtractError::Config(format!("{}: {e}", dir.display()));
    let mut paths: Vec<_> = std::fs::read_dir(dir)
        .map_err(read)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(read)?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut registry = AliasRegistry::new();
    for path in paths {
        let json = std::fs::read_to_string(&path)
            .map_err(|e| ExtractError::Config(format!("{}: {e}", path.display())))?;
        let table = table_from_json(&json)
            .map_err(|e| ExtractError::Config(format!("{}: {e}", path.display())))?;
        registry.push(table)?;
    }
    if registry.is_empty() {
        return Err(ExtractError::Config(format!(
            "no alias table files found in {}",
            dir.display()
        )));
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canform_core::{FormKind, GapPolicy};

    #[test]
    fn builtin_tables_validate() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.tables().len(), 3);
    }

    #[test]
    fn builtin_revisions_in_recency_order() {
        let registry = builtin_registry().unwrap();
        let revisions: Vec<(FormKind, &str)> = registry
            .tables()
            .iter()
            .map(|t| (t.form, t.revision.as_str()))
            .collect();
        assert_eq!(
            revisions,
            vec![
                (FormKind::Imm5257e, "06-2022"),
                (FormKind::Imm5257e, "10-2023"),
                (FormKind::Imm5645e, "09-2022"),
            ]
        );
    }

    #[test]
    fn family_form_groups_preserve_gaps() {
        let registry = builtin_registry().unwrap();
        let table = registry
            .tables()
            .iter()
            .find(|t| t.form == FormKind::Imm5645e)
            .unwrap();
        assert_eq!(table.groups["children"].gap_policy, GapPolicy::Preserve);
        assert_eq!(table.groups["siblings"].gap_policy, GapPolicy::Preserve);
    }

    #[test]
    fn visa_form_skips_lov_ballast() {
        let registry = builtin_registry().unwrap();
        assert_eq!(registry.skip_subtrees(), vec!["LOVFile".to_string()]);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = table_from_json("{ not json").unwrap_err();
        assert!(matches!(err, ExtractError::Config(_)));
    }
}
