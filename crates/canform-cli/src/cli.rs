use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Extract canonical fields from Canadian visa-application PDF forms.
#[derive(Debug, Parser)]
#[command(name = "canform", about, version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Extract a canonical record from a filled form
    Extract {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Form kind, when known in advance (skips marker detection)
        #[arg(long, value_enum)]
        form: Option<FormArg>,

        /// Directory of alias-table JSON files (default: builtin tables)
        #[arg(long, value_name = "DIR")]
        tables: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Exit with status 2 when the record carries any field error
        #[arg(long)]
        strict: bool,
    },

    /// Dump the raw field paths and values a document carries
    Fields {
        /// Path to the PDF file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Directory of alias-table JSON files (default: builtin tables)
        #[arg(long, value_name = "DIR")]
        tables: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// List the loaded alias tables
    Tables {
        /// Directory of alias-table JSON files (default: builtin tables)
        #[arg(long, value_name = "DIR")]
        tables: Option<PathBuf>,
    },
}

/// Output format for extraction results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Compact JSON, one document per line
    Json,
    /// Pretty-printed JSON
    Pretty,
}

/// Form kind for CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormArg {
    /// IMM 5257E — application for a temporary resident visa
    Imm5257e,
    /// IMM 5645E — family information
    Imm5645e,
}

impl FormArg {
    /// Convert to the core library's `FormKind` enum.
    pub fn to_form_kind(self) -> canform::FormKind {
        match self {
            FormArg::Imm5257e => canform::FormKind::Imm5257e,
            FormArg::Imm5645e => canform::FormKind::Imm5645e,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn parse_extract_subcommand_with_file() {
        let cli = Cli::parse_from(["canform", "extract", "form.pdf"]);
        match cli.command {
            Commands::Extract {
                ref file,
                form,
                strict,
                ..
            } => {
                assert_eq!(file, &PathBuf::from("form.pdf"));
                assert!(form.is_none());
                assert!(!strict);
            }
            _ => panic!("expected Extract subcommand"),
        }
    }

    #[test]
    fn parse_extract_with_form_and_strict() {
        let cli = Cli::parse_from([
            "canform", "extract", "form.pdf", "--form", "imm5645e", "--strict",
        ]);
        match cli.command {
            Commands::Extract { form, strict, .. } => {
                assert_eq!(form, Some(FormArg::Imm5645e));
                assert!(strict);
            }
            _ => panic!("expected Extract subcommand"),
        }
    }

    #[test]
    fn parse_extract_with_pretty_format() {
        let cli = Cli::parse_from(["canform", "extract", "form.pdf", "--format", "pretty"]);
        match cli.command {
            Commands::Extract { format, .. } => {
                assert_eq!(format, OutputFormat::Pretty);
            }
            _ => panic!("expected Extract subcommand"),
        }
    }

    #[test]
    fn parse_fields_subcommand() {
        let cli = Cli::parse_from(["canform", "fields", "form.pdf"]);
        match cli.command {
            Commands::Fields { ref file, .. } => {
                assert_eq!(file, &PathBuf::from("form.pdf"));
            }
            _ => panic!("expected Fields subcommand"),
        }
    }

    #[test]
    fn parse_tables_with_dir() {
        let cli = Cli::parse_from(["canform", "tables", "--tables", "conf/"]);
        match cli.command {
            Commands::Tables { ref tables } => {
                assert_eq!(tables.as_deref(), Some(std::path::Path::new("conf/")));
            }
            _ => panic!("expected Tables subcommand"),
        }
    }

    #[test]
    fn form_arg_converts_to_form_kind() {
        assert_eq!(
            FormArg::Imm5257e.to_form_kind(),
            canform::FormKind::Imm5257e
        );
        assert_eq!(
            FormArg::Imm5645e.to_form_kind(),
            canform::FormKind::Imm5645e
        );
    }
}
