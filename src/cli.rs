use std::path::{Path, PathBuf};

mod config;
mod history;
mod parse;
mod report;
mod terminal;

use clap::ArgAction;
use config::Config;
use history::History;
use parse::Parse;
use report::Report;

#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Cli {
    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// The configuration file
    #[arg(short, long, default_value = "reqlog.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        Self::setup_logging(self.verbose);
        self.command.run(&self.config)
    }

    fn setup_logging(verbosity: u8) {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

        let level = match verbosity {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        };

        let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

        // The report goes to stdout, so diagnostics must not.
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_thread_names(false)
            .with_line_number(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[derive(Debug, clap::Subcommand)]
pub enum Command {
    /// Reconcile the current revision with the baseline and print the
    /// changelog
    Report(Report),

    /// List the requirement rows of a revision directory
    ///
    /// Reads documents only; neither git nor the issue tracker is consulted.
    Parse(Parse),

    /// Explain the history attributed to one requirement
    History(History),

    /// Show or modify configuration settings
    Config(Config),
}

impl Command {
    fn run(self, config_path: &Path) -> anyhow::Result<()> {
        let config = load_config(config_path)?;

        match self {
            Self::Report(command) => command.run(&config)?,
            Self::Parse(command) => command.run(&config)?,
            Self::History(command) => command.run(&config)?,
            Self::Config(command) => command.run(config, config_path)?,
        }
        Ok(())
    }
}

fn load_config(path: &Path) -> anyhow::Result<reqlog::Config> {
    reqlog::Config::load_or_default(path).map_err(|e| anyhow::anyhow!("{e}"))
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[test]
    fn report_arguments() {
        let cli = Cli::try_parse_from([
            "reqlog",
            "-vv",
            "report",
            "4.0/en",
            "old/4.0.3/en",
            "--repo",
            "asvs",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, PathBuf::from("reqlog.toml"));
        assert!(matches!(cli.command, Command::Report(_)));
    }

    #[test]
    fn history_rejects_malformed_identifiers() {
        assert!(Cli::try_parse_from(["reqlog", "history", "doc.md", "1.2"]).is_err());
        assert!(Cli::try_parse_from(["reqlog", "history", "doc.md", "1.2.3"]).is_ok());
    }

    #[test]
    fn config_path_is_global() {
        let cli = Cli::try_parse_from(["reqlog", "config", "--config", "other.toml"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("other.toml"));
    }
}
