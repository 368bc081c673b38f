use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressIterator as _, ProgressStyle};
use reqlog::{
    GitCli, GitHub, Reconciler, RevisionDirectory,
    reconcile::build_index,
    report::Format,
    storage::pair_documents,
};
use tracing::instrument;

#[derive(Debug, clap::Parser)]
pub struct Report {
    /// The current revision's document directory
    current: PathBuf,

    /// The baseline revision's document directory
    baseline: PathBuf,

    /// The git repository holding the current revision
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// The output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Markdown,
    Json,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Markdown => Self::Markdown,
            OutputFormat::Json => Self::Json,
        }
    }
}

impl Report {
    #[instrument(skip(config))]
    pub fn run(self, config: &reqlog::Config) -> anyhow::Result<()> {
        let tracker = GitHub::from_config(&config.tracker)?;
        let git = GitCli::open(&self.repo)?;

        let current = RevisionDirectory::new(&self.current, &config.file_pattern)?;
        let baseline = RevisionDirectory::new(&self.baseline, &config.file_pattern)?;
        let pairs = pair_documents(&current, &baseline)?;
        if pairs.is_empty() {
            tracing::warn!(
                "No documents matching {} in {}",
                config.file_pattern,
                self.current.display()
            );
        }

        let index = build_index(&tracker, config.tracker.include_closed)?;
        tracing::info!("Indexed {} issues", index.len());

        let mut reconciler = Reconciler::new(&git, &tracker, index, config)?;

        let progress = ProgressBar::new(pairs.len() as u64).with_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} documents")?
                .progress_chars("=> "),
        );
        let requirements = reconciler.run(pairs.iter().progress_with(progress.clone()))?;
        progress.finish_and_clear();

        let rendered = Format::from(self.format).render(&requirements)?;
        print!("{rendered}");

        Ok(())
    }
}
