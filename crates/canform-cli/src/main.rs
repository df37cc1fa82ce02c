mod cli;
mod extract_cmd;
mod fields_cmd;
mod shared;
mod tables_cmd;

use clap::Parser;
use cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        cli::Commands::Extract {
            ref file,
            form,
            ref tables,
            format,
            strict,
        } => extract_cmd::run(
            file,
            form.map(cli::FormArg::to_form_kind),
            tables.as_deref(),
            format,
            strict,
        ),
        cli::Commands::Fields {
            ref file,
            ref tables,
            format,
        } => fields_cmd::run(file, tables.as_deref(), format),
        cli::Commands::Tables { ref tables } => tables_cmd::run(tables.as_deref()),
    };

    if let Err(code) = result {
        std::process::exit(code);
    }
}
