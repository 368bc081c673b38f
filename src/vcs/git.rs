use std::{
    ffi::{OsStr, OsString},
    num::NonZeroUsize,
    path::{Path, PathBuf},
    process::{Command, Output},
};

use chrono::{DateTime, FixedOffset};
use tracing::instrument;

use super::{CommitId, MainlineCommit, RevRange, VcsError, VersionControl};
use crate::domain::CommitInfo;

/// A repository accessed through the `git` executable.
#[derive(Debug, Clone)]
pub struct GitCli {
    root: PathBuf,
}

/// Commit metadata as reported by `git show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GitCommit {
    hash: String,
    time: DateTime<FixedOffset>,
    message: String,
}

impl CommitInfo for GitCommit {
    fn hash(&self) -> &str {
        &self.hash
    }

    fn message(&self) -> &str {
        &self.message
    }

    fn time(&self) -> Option<DateTime<FixedOffset>> {
        Some(self.time)
    }
}

impl GitCli {
    /// Open the repository containing `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` is not inside a git work tree.
    pub fn open(path: &Path) -> Result<Self, VcsError> {
        let args = [OsString::from("rev-parse"), OsString::from("--show-toplevel")];
        let output = Command::new("git").args(&args).current_dir(path).output()?;

        let root = checked_stdout(&args, &output)?;
        let root = PathBuf::from(root.trim()).canonicalize()?;
        tracing::debug!("Opened git repository at {}", root.display());

        Ok(Self { root })
    }

    /// The root of the work tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn output<I, S>(&self, args: I) -> Result<(Vec<OsString>, Output), VcsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        tracing::trace!("git {}", display_args(&args));

        let output = Command::new("git")
            .args(&args)
            .current_dir(&self.root)
            .output()?;
        Ok((args, output))
    }

    fn run<I, S>(&self, args: I) -> Result<String, VcsError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let (args, output) = self.output(args)?;
        checked_stdout(&args, &output)
    }

    /// Fail with [`VcsError::UnknownRevision`] unless `rev` names a commit.
    fn verify(&self, rev: &str) -> Result<(), VcsError> {
        let object = format!("{rev}^{{commit}}");
        let (_, output) = self.output(["rev-parse", "--verify", "--quiet", object.as_str()])?;
        if output.status.success() {
            Ok(())
        } else {
            Err(VcsError::UnknownRevision(rev.to_string()))
        }
    }

    /// Express `path` relative to the repository root, with `/` separators.
    fn relative(&self, path: &Path) -> Result<String, VcsError> {
        let outside = || VcsError::OutsideRepository {
            path: path.to_path_buf(),
            root: self.root.clone(),
        };

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };
        let absolute = absolute.canonicalize().map_err(|_| outside())?;
        let relative = absolute.strip_prefix(&self.root).map_err(|_| outside())?;

        let segments: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()
            .ok_or_else(outside)?;
        Ok(segments.join("/"))
    }
}

fn display_args(args: &[OsString]) -> String {
    args.iter()
        .map(|a| a.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ")
}

fn checked_stdout(args: &[OsString], output: &Output) -> Result<String, VcsError> {
    if !output.status.success() {
        return Err(VcsError::Command {
            command: display_args(args),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    String::from_utf8(output.stdout.clone()).map_err(|_| VcsError::Output {
        command: display_args(args),
        detail: "output is not valid UTF-8".to_string(),
    })
}

fn lines(output: &str) -> Vec<CommitId> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect()
}

impl VersionControl for GitCli {
    type Commit = GitCommit;

    #[instrument(level = "trace", skip(self))]
    fn blame(
        &self,
        rev: &str,
        path: &Path,
        line: NonZeroUsize,
    ) -> Result<Option<CommitId>, VcsError> {
        let relative = self.relative(path)?;
        self.verify(rev)?;
        let range = format!("{line},{line}");
        let (_, output) = self.output([
            "blame",
            "--porcelain",
            "-L",
            range.as_str(),
            rev,
            "--",
            relative.as_str(),
        ])?;

        // A missing file or line is not an error, there is simply no author.
        if !output.status.success() {
            return Ok(None);
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .split_whitespace()
            .next()
            .map(ToString::to_string))
    }

    #[instrument(level = "trace", skip(self))]
    fn search_log(
        &self,
        needle: &str,
        range: &RevRange,
        path: &Path,
    ) -> Result<Vec<CommitId>, VcsError> {
        let relative = self.relative(path)?;
        let pattern = format!("-G{}", regex::escape(needle));
        let range = range.to_string();
        let output = self.run([
            "log",
            "--format=%H",
            pattern.as_str(),
            range.as_str(),
            "--",
            relative.as_str(),
        ])?;
        Ok(lines(&output))
    }

    #[instrument(level = "debug", skip(self))]
    fn first_parent_chain(&self, range: &RevRange) -> Result<Vec<MainlineCommit>, VcsError> {
        let range = range.to_string();
        let output = self.run(["rev-list", "--first-parent", "--parents", range.as_str()])?;

        Ok(output
            .lines()
            .filter_map(|line| {
                let mut hashes = line.split_whitespace().map(ToString::to_string);
                let id = hashes.next()?;
                Some(MainlineCommit {
                    id,
                    parents: hashes.collect(),
                })
            })
            .collect())
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, VcsError> {
        let (args, output) = self.output(["merge-base", "--is-ancestor", ancestor, descendant])?;

        match output.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(VcsError::Command {
                command: display_args(&args),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }),
        }
    }

    #[instrument(level = "trace", skip(self))]
    fn commit(&self, id: &str) -> Result<GitCommit, VcsError> {
        let output = self.run(["show", "-s", "--format=%H%x00%cI%x00%B", id])?;

        let malformed = |detail: &str| VcsError::Output {
            command: format!("show {id}"),
            detail: detail.to_string(),
        };

        let mut fields = output.splitn(3, '\0');
        let (Some(hash), Some(time), Some(message)) = (fields.next(), fields.next(), fields.next())
        else {
            return Err(malformed("expected hash, date and message"));
        };

        let time = DateTime::parse_from_rfc3339(time.trim())
            .map_err(|e| malformed(&format!("invalid commit date: {e}")))?;

        Ok(GitCommit {
            hash: hash.trim().to_string(),
            time,
            message: message.trim_end().to_string(),
        })
    }

    fn contains_path(&self, rev: &str, path: &Path) -> Result<bool, VcsError> {
        let relative = self.relative(path)?;
        self.verify(rev)?;
        let object = format!("{rev}:{relative}");
        let (_, output) = self.output(["cat-file", "-e", object.as_str()])?;
        Ok(output.status.success())
    }
}
