use std::{fmt, num::NonZeroU32, str::FromStr};

use serde::{Deserialize, Serialize};

/// The number of dot-separated segments in a [`RequirementId`].
pub const SEGMENTS: usize = 3;

/// The identifier of a requirement row, e.g. `1.2.3`.
///
/// Format:
/// `{CHAPTER}.{SECTION}.{ITEM}`, where every segment is a positive integer
/// written without leading zeros.
///
/// Identifiers order numerically segment by segment, so `1.2.10` sorts after
/// `1.2.9`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequirementId([NonZeroU32; SEGMENTS]);

impl RequirementId {
    /// Create an identifier from pre-validated segments.
    #[must_use]
    pub const fn new(chapter: NonZeroU32, section: NonZeroU32, item: NonZeroU32) -> Self {
        Self([chapter, section, item])
    }

    /// Returns the numeric segments in order.
    #[must_use]
    pub const fn segments(&self) -> [NonZeroU32; SEGMENTS] {
        self.0
    }

    /// Returns the bolded marker text that introduces this requirement's row
    /// in a source document.
    ///
    /// ```
    /// use reqlog::RequirementId;
    ///
    /// let id: RequirementId = "1.2.3".parse().unwrap();
    /// assert_eq!(id.marker(), "**1.2.3**");
    /// ```
    #[must_use]
    pub fn marker(&self) -> String {
        format!("**{self}**")
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [chapter, section, item] = self.0;
        write!(f, "{chapter}.{section}.{item}")
    }
}

/// Errors that can occur when parsing a [`RequirementId`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// The identifier does not have exactly three dot-separated segments.
    #[error("Invalid requirement id '{0}': expected three dot-separated segments")]
    Syntax(String),

    /// A segment is not a positive integer without leading zeros.
    #[error("Invalid segment in requirement id '{0}': expected a positive integer, got '{1}'")]
    Segment(String, String),
}

fn parse_segment(id: &str, segment: &str) -> Result<NonZeroU32, Error> {
    let invalid = || Error::Segment(id.to_string(), segment.to_string());

    if segment.is_empty()
        || segment.starts_with('0')
        || !segment.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(invalid());
    }

    segment
        .parse::<u32>()
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or_else(invalid)
}

impl FromStr for RequirementId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        let [chapter, section, item] = parts.as_slice() else {
            return Err(Error::Syntax(s.to_string()));
        };

        Ok(Self::new(
            parse_segment(s, chapter)?,
            parse_segment(s, section)?,
            parse_segment(s, item)?,
        ))
    }
}

impl TryFrom<&str> for RequirementId {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::from_str(value)
    }
}

impl Serialize for RequirementId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RequirementId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
