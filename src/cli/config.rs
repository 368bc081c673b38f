use std::path::Path;

use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct Config {
    #[command(subcommand)]
    command: Option<ConfigCommand>,
}

#[derive(Debug, clap::Subcommand)]
enum ConfigCommand {
    /// Show the effective configuration (default)
    Show,

    /// Never attribute an issue to any requirement
    Ignore {
        /// The issue number
        issue: u64,
    },

    /// Set the minimum number of digits in an issue reference
    Digits {
        /// The minimum number of digits
        digits: usize,
    },
}

impl Config {
    #[instrument(skip(config))]
    pub fn run(self, mut config: reqlog::Config, path: &Path) -> anyhow::Result<()> {
        match self.command.unwrap_or(ConfigCommand::Show) {
            ConfigCommand::Show => {
                let source = if path.exists() {
                    path.display().to_string()
                } else {
                    "defaults".to_string()
                };
                println!("{}", format!("# Configuration from {source}").dim());
                print!("{}", config.to_toml().map_err(|e| anyhow::anyhow!("{e}"))?);
                return Ok(());
            }
            ConfigCommand::Ignore { issue } => {
                if !config.ignore_issue(issue) {
                    println!("{}", format!("Issue #{issue} is already ignored").warning());
                    return Ok(());
                }
                println!("{}", format!("Ignoring issue #{issue}").success());
            }
            ConfigCommand::Digits { digits } => {
                config.set_min_reference_digits(digits);
                println!(
                    "{}",
                    format!("Issue references need at least {digits} digits").success()
                );
            }
        }

        config.save(path).map_err(|e| anyhow::anyhow!("{e}"))?;
        Ok(())
    }
}
