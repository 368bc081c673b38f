use std::path::PathBuf;

use reqlog::{Document, Requirement, RevisionDirectory, RowParser};
use tracing::instrument;

use super::terminal::{self, Colorize};

#[derive(Debug, clap::Parser)]
pub struct Parse {
    /// The revision directory to read
    dir: PathBuf,
}

impl Parse {
    #[instrument(skip(config))]
    pub fn run(self, config: &reqlog::Config) -> anyhow::Result<()> {
        let directory = RevisionDirectory::new(&self.dir, &config.file_pattern)?;
        let parser = RowParser::new(config.annotation_marker.clone());
        let width = terminal::terminal_width().map(usize::from);

        let mut total = 0;
        for relative in directory.documents()? {
            let document = Document::load(&directory.resolve(&relative), &parser)?;
            println!("{}", relative.display().to_string().info());
            for requirement in document.requirements() {
                println!("{}", line(requirement, width));
            }
            total += document.requirements().len();
        }

        println!("{}", format!("{total} requirements").dim());
        Ok(())
    }
}

fn line(requirement: &Requirement, width: Option<usize>) -> String {
    let level = requirement
        .level()
        .map_or_else(|| "-".to_string(), |level| format!("L{level}"));
    let tag = requirement
        .tag()
        .map(|tag| format!(" {tag}"))
        .unwrap_or_default();

    let id = requirement.id().to_string();
    let head = format!("  {id:<10} {level:<3}{tag}");
    let description = requirement.description();

    match width {
        Some(width) if width < terminal::NARROW => head.chars().take(width).collect(),
        Some(width) => {
            let room = width.saturating_sub(head.chars().count() + 1);
            format!("{head} {}", truncate(description, room).dim())
        }
        None => format!("{head} {description}"),
    }
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut kept: String = text.chars().take(max.saturating_sub(1)).collect();
    kept.push('…');
    kept
}
