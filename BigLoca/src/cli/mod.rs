//! BigLoca CLI - command-line interface for BigFile localization tools

pub mod commands;
pub mod progress;

use clap::Parser;
use commands::Commands;
use tracing::Level;

#[derive(Parser)]
#[command(name = "bigloca", version)]
#[command(about = "BigLoca: localized text extraction for BigFile archives", long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Run the BigLoca CLI
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else if cli.command.is_quiet() {
        Level::WARN
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    cli.command.execute()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_token_limit_help_names_multi_key_list() {
        let cli = Cli::command();
        for name in ["extract", "decode"] {
            let command = cli.find_subcommand(name).unwrap();
            let arg = command
                .get_arguments()
                .find(|arg| arg.get_id() == "token_limit")
                .unwrap();
            let help = arg.get_help().unwrap().to_string();
            assert!(help.contains("multi-key list"), "{name}: {help}");
        }
    }

    #[test]
    fn test_parse_extract_flags() {
        let cli = Cli::try_parse_from([
            "bigloca", "extract", "game", "--format", "tsv", "--strict", "--token-limit", "128",
        ])
        .unwrap();
        match cli.command {
            Commands::Extract {
                format,
                strict,
                token_limit,
                ..
            } => {
                assert_eq!(format, "tsv");
                assert!(strict);
                assert_eq!(token_limit, 128);
            }
            _ => panic!("expected extract"),
        }
    }
}
