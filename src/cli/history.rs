use std::path::PathBuf;

use anyhow::Context as _;
use reqlog::{CommitInfo, CommitRef, Document, GitCli, HistoryLocator, RequirementId, RowParser};
use tracing::instrument;

use super::terminal::Colorize;

#[derive(Debug, clap::Parser)]
pub struct History {
    /// The document containing the requirement
    file: PathBuf,

    /// The requirement identifier, e.g. 1.2.3
    id: RequirementId,

    /// The git repository holding the document
    #[arg(long, default_value = ".")]
    repo: PathBuf,
}

impl History {
    #[instrument(skip(config))]
    pub fn run(self, config: &reqlog::Config) -> anyhow::Result<()> {
        let git = GitCli::open(&self.repo)?;
        let mut locator = HistoryLocator::new(&git, &config.baseline, &config.mainline);

        let commits = locator.locate(self.id, &self.file)?;

        println!(
            "{}",
            format!("History of {} in {}", self.id, locator.range()).info()
        );
        if commits.is_empty() {
            println!("  {}", "No relevant commits".warning());
        }
        for commit in &commits {
            println!("  {}", describe(commit));
            if let Some(merge) = locator.resolve_merge(commit.hash())? {
                println!("    {}", format!("merged by {}", short(&merge)).dim());
            }
        }

        let parser = RowParser::new(config.annotation_marker.clone());
        let document = Document::load(&self.file, &parser)?;
        let row = document
            .requirements()
            .iter()
            .find(|requirement| requirement.id() == self.id)
            .and_then(|requirement| requirement.position())
            .with_context(|| format!("{} has no row for {}", self.file.display(), self.id))?;

        match locator.last_touched(&self.file, row.line)? {
            Some(commit) => println!("Row {} last touched by {}", row.line, describe(&commit)),
            None => println!("Row {} is not committed", row.line),
        }

        Ok(())
    }
}

fn short(hash: &str) -> &str {
    hash.get(..10).unwrap_or(hash)
}

fn describe(commit: &CommitRef) -> String {
    let date = commit
        .time()
        .map(|time| format!(" ({})", time.format("%Y-%m-%d")))
        .unwrap_or_default();
    format!("{} {}{}", short(commit.hash()).success(), commit.summary(), date.dim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_shortened() {
        assert_eq!(short("0123456789abcdef"), "0123456789");
        assert_eq!(short("abc"), "abc");
    }
}
