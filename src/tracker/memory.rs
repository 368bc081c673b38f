//! An in-memory tracker for exercising issue linking without the network.

use std::{cell::Cell, collections::HashSet};

use super::{IssueTracker, TrackerError};
use crate::domain::{IssueInfo, IssueRef};

#[derive(Debug, Default)]
pub struct MemoryTracker {
    issues: Vec<IssueRef>,
    closed: HashSet<u64>,
    lookups: Cell<usize>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(mut self, number: u64, title: &str) -> Self {
        self.issues.push(IssueRef::new(
            number,
            title,
            format!("https://tracker.test/issues/{number}"),
        ));
        self
    }

    pub fn closed(mut self, number: u64, title: &str) -> Self {
        self.closed.insert(number);
        self.open(number, title)
    }

    /// How many single-issue lookups have been made.
    pub fn lookups(&self) -> usize {
        self.lookups.get()
    }
}

impl IssueTracker for MemoryTracker {
    type Issue = IssueRef;

    fn issues(&self, include_closed: bool) -> Result<Vec<IssueRef>, TrackerError> {
        Ok(self
            .issues
            .iter()
            .filter(|issue| include_closed || !self.closed.contains(&issue.number()))
            .cloned()
            .collect())
    }

    fn issue(&self, number: u64) -> Result<Option<IssueRef>, TrackerError> {
        self.lookups.set(self.lookups.get() + 1);
        Ok(self.issues.iter().find(|issue| issue.number() == number).cloned())
    }
}
