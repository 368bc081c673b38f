//! An in-memory repository for exercising history resolution without git.

use std::{
    collections::HashMap,
    num::NonZeroUsize,
    path::{Path, PathBuf},
};

use petgraph::{algo::has_path_connecting, graphmap::DiGraphMap};

use super::{CommitId, MainlineCommit, RevRange, VcsError, VersionControl};
use crate::domain::CommitRef;

#[derive(Debug)]
struct Node {
    hash: String,
    message: String,
    parents: Vec<usize>,
    patches: Vec<(PathBuf, String)>,
}

/// A commit graph built by hand. Edges point from child to parent.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    nodes: Vec<Node>,
    by_hash: HashMap<String, usize>,
    refs: HashMap<String, String>,
    graph: DiGraphMap<usize, ()>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a commit whose patch to each path adds or removes `text`.
    pub fn record(&mut self, hash: &str, message: &str, parents: &[&str], patches: &[(&str, &str)]) {
        let index = self.nodes.len();
        let parents: Vec<usize> = parents.iter().map(|p| self.by_hash[*p]).collect();

        self.graph.add_node(index);
        for &parent in &parents {
            self.graph.add_edge(index, parent, ());
        }

        self.nodes.push(Node {
            hash: hash.to_string(),
            message: message.to_string(),
            parents,
            patches: patches
                .iter()
                .map(|(path, text)| (PathBuf::from(path), (*text).to_string()))
                .collect(),
        });
        self.by_hash.insert(hash.to_string(), index);
    }

    /// Point a branch or tag at a commit.
    pub fn set_ref(&mut self, name: &str, hash: &str) {
        self.refs.insert(name.to_string(), hash.to_string());
    }

    fn resolve(&self, rev: &str) -> Result<usize, VcsError> {
        let hash = self.refs.get(rev).map_or(rev, String::as_str);
        self.by_hash
            .get(hash)
            .copied()
            .ok_or_else(|| VcsError::UnknownRevision(rev.to_string()))
    }

    fn reaches(&self, descendant: usize, ancestor: usize) -> bool {
        descendant == ancestor || has_path_connecting(&self.graph, descendant, ancestor, None)
    }

    fn in_range(&self, range: &RevRange) -> Result<Vec<usize>, VcsError> {
        let since = self.resolve(&range.since)?;
        let until = self.resolve(&range.until)?;
        Ok((0..self.nodes.len())
            .rev()
            .filter(|&i| self.reaches(until, i) && !self.reaches(since, i))
            .collect())
    }
}

impl VersionControl for MemoryRepository {
    type Commit = CommitRef;

    fn blame(
        &self,
        rev: &str,
        path: &Path,
        _line: NonZeroUsize,
    ) -> Result<Option<CommitId>, VcsError> {
        let tip = self.resolve(rev)?;
        Ok((0..self.nodes.len())
            .rev()
            .filter(|&i| self.reaches(tip, i))
            .find(|&i| self.nodes[i].patches.iter().any(|(p, _)| p == path))
            .map(|i| self.nodes[i].hash.clone()))
    }

    fn search_log(
        &self,
        needle: &str,
        range: &RevRange,
        path: &Path,
    ) -> Result<Vec<CommitId>, VcsError> {
        Ok(self
            .in_range(range)?
            .into_iter()
            .filter(|&i| {
                self.nodes[i]
                    .patches
                    .iter()
                    .any(|(p, text)| p == path && text.contains(needle))
            })
            .map(|i| self.nodes[i].hash.clone())
            .collect())
    }

    fn first_parent_chain(&self, range: &RevRange) -> Result<Vec<MainlineCommit>, VcsError> {
        let since = self.resolve(&range.since)?;
        let mut current = Some(self.resolve(&range.until)?);
        let mut chain = Vec::new();

        while let Some(index) = current.filter(|&i| !self.reaches(since, i)) {
            let node = &self.nodes[index];
            chain.push(MainlineCommit {
                id: node.hash.clone(),
                parents: node.parents.iter().map(|&p| self.nodes[p].hash.clone()).collect(),
            });
            current = node.parents.first().copied();
        }

        Ok(chain)
    }

    fn is_ancestor(&self, ancestor: &str, descendant: &str) -> Result<bool, VcsError> {
        Ok(self.reaches(self.resolve(descendant)?, self.resolve(ancestor)?))
    }

    fn commit(&self, id: &str) -> Result<CommitRef, VcsError> {
        let node = &self.nodes[self.resolve(id)?];
        Ok(CommitRef::new(node.hash.clone(), node.message.clone()))
    }

    fn contains_path(&self, rev: &str, path: &Path) -> Result<bool, VcsError> {
        let tip = self.resolve(rev)?;
        Ok((0..self.nodes.len())
            .filter(|&i| self.reaches(tip, i))
            .any(|i| self.nodes[i].patches.iter().any(|(p, _)| p == path)))
    }
}
