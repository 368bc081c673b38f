//! `reqlog`: build a requirement changelog from two document revisions.

use clap::Parser as _;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
