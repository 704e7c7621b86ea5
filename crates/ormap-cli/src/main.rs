//! ORMAP Command-Line Tool
//!
//! Generates SQL from a JSON model: object queries, batch DML, templates,
//! commit order and schema diffs.

mod commands;
mod executor;
mod formatter;

use clap::Parser;
use commands::Command;
use formatter::OutputFormat;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// ORMAP Command-Line Tool
#[derive(Parser, Debug)]
#[command(name = "ormap")]
#[command(version, about = "Generate SQL from an ORMAP model")]
pub struct Args {
    /// Output format
    #[arg(long, global = true, default_value = "table", value_enum)]
    pub format: OutputFormat,

    /// Translator configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

fn main() {
    // Logs go to stderr so JSON output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ormap=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let formatter = formatter::create_formatter(args.format);

    match executor::execute(args.command, args.config.as_deref(), &*formatter) {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from([
            "ormap", "sort", "--model", "art.json", "--delete", "--format", "json", "-w", "ARTIST=3",
        ])
        .unwrap();
        assert_eq!(args.format, OutputFormat::Json);
        match args.command {
            Command::Sort(sort) => {
                assert!(sort.delete);
                assert_eq!(sort.weights, vec![("ARTIST".to_string(), 3)]);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_template_named_and_positional_conflict() {
        let result = Args::try_parse_from([
            "ormap", "template", "--text", "#bind($a)", "--param", "a=1", "--arg", "2",
        ]);
        assert!(result.is_err());
    }
}
