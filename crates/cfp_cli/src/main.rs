//! Command line entry point for the CFP catalog.
//!
//! Usage: `cfp_cli <db-path> [index|kinds|version] [--log-dir <abs-dir>] [--log-level <level>]`

use cfp_core::{default_log_level, CallKind};
use clap::{Parser, Subcommand};
use log::info;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "cfp_cli")]
#[command(about = "Inspect a CFP catalog database")]
struct Cli {
    /// Path of the SQLite catalog
    db_path: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,

    /// Absolute directory for rolling log files; logging stays off without it
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[arg(long, global = true, default_value_t = default_log_level().to_string())]
    log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Print mandatory deadlines grouped by call target kind (default)
    Index,
    /// Print the call target kinds
    Kinds,
    /// Print the core library version
    Version,
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = &cli.log_dir {
        cfp_core::init_logging(&cli.log_level, log_dir)?;
    }
    let command = cli.command.unwrap_or(Command::Index);
    info!("event=cli_run module=cli status=start command={command:?}");

    match command {
        Command::Version => println!("cfp_core version={}", cfp_core::core_version()),
        Command::Kinds => {
            let kinds: Vec<_> = CallKind::ALL
                .iter()
                .map(|kind| {
                    serde_json::json!({
                        "kind": kind,
                        "table": kind.table(),
                        "verbose_name": kind.verbose_name(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&kinds)?);
        }
        Command::Index => {
            let conn = cfp_core::open_db(&cli.db_path)?;
            let index = cfp_core::deadline_index_service(&conn)?.index()?;
            println!("{}", serde_json::to_string_pretty(&index)?);
        }
    }

    info!("event=cli_run module=cli status=ok command={command:?}");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;
    use std::path::Path;

    #[test]
    fn index_is_the_default_command() {
        let cli = Cli::try_parse_from(["cfp_cli", "catalog.db"]).unwrap();
        assert_eq!(cli.db_path, Path::new("catalog.db"));
        assert_eq!(cli.command, None);
        assert_eq!(cli.log_level, cfp_core::default_log_level());
        assert!(cli.log_dir.is_none());
    }

    #[test]
    fn flags_and_command_parse_in_any_order() {
        let cli = Cli::try_parse_from([
            "cfp_cli",
            "--log-level",
            "warn",
            "catalog.db",
            "kinds",
            "--log-dir",
            "/tmp/cfp-logs",
        ])
        .unwrap();
        assert_eq!(cli.command, Some(Command::Kinds));
        assert_eq!(cli.log_level, "warn");
        assert_eq!(cli.log_dir.as_deref(), Some("/tmp/cfp-logs"));
    }

    #[test]
    fn missing_db_path_and_unknown_commands_fail() {
        assert!(Cli::try_parse_from(["cfp_cli"]).is_err());
        assert!(Cli::try_parse_from(["cfp_cli", "catalog.db", "export"]).is_err());
        assert!(Cli::try_parse_from(["cfp_cli", "catalog.db", "--log-dir"]).is_err());
    }
}
