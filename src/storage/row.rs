//! Requirement rows in markdown tables.
//!
//! A requirement row looks like
//!
//! ```text
//! | **1.2.3** | [MODIFIED] Verify that ... ([C6](https://...)) | ✓ | ✓ | ✓ |
//! ```
//!
//! The first column is the bolded identifier, the second an optional
//! bracketed tag followed by the description, and the last three mark the
//! compliance level. Columns after the fifth are ignored.

use std::sync::LazyLock;

use regex::Regex;

use crate::domain::{Level, Position, Requirement, RequirementId, Tag};

static ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\|\s*\*\*([1-9][0-9]*\.[1-9][0-9]*\.[1-9][0-9]*)\*\*\s*\|\s*(\[[^\]]*\])?([^|]*)\|([^|]*)\|([^|]*)\|([^|]*)\|",
    )
    .expect("pattern is valid")
});

/// Turns markdown table lines into [`Requirement`]s.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowParser {
    annotation_marker: String,
}

impl RowParser {
    /// Create a parser that strips description annotations starting at
    /// `annotation_marker`. An empty marker strips nothing.
    #[must_use]
    pub fn new(annotation_marker: impl Into<String>) -> Self {
        Self {
            annotation_marker: annotation_marker.into(),
        }
    }

    /// Parse one line.
    ///
    /// Returns `None` if the line is not a requirement row. Most lines of a
    /// document are not, so this is not an error.
    #[must_use]
    pub fn parse(&self, line: &str, position: Position) -> Option<Requirement> {
        let captures = ROW.captures(line)?;

        let id: RequirementId = captures.get(1)?.as_str().parse().ok()?;
        let tag = captures
            .get(2)
            .and_then(|raw| Tag::from_bracketed(raw.as_str()));
        let description = self.clean_description(captures.get(3)?.as_str());
        let level = Level::from_columns(
            captures.get(4)?.as_str(),
            captures.get(5)?.as_str(),
            captures.get(6)?.as_str(),
        );

        Some(Requirement::new(
            id,
            tag,
            description,
            level,
            Some(position),
        ))
    }

    /// Truncate a description at the annotation marker and trim it.
    #[must_use]
    pub fn clean_description(&self, description: &str) -> String {
        let kept = if self.annotation_marker.is_empty() {
            description
        } else {
            description
                .find(&self.annotation_marker)
                .map_or(description, |at| &description[..at])
        };
        kept.trim().to_string()
    }
}

impl Default for RowParser {
    fn default() -> Self {
        Self::new("([")
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use test_case::test_case;

    use super::*;
    use crate::domain::TagKind;

    fn position() -> Position {
        Position::new("0x10-V1-Architecture.md", NonZeroUsize::new(7).unwrap())
    }

    fn parse(line: &str) -> Option<Requirement> {
        RowParser::default().parse(line, position())
    }

    #[test]
    fn parses_full_row() {
        let line = "| **1.2.3** | [MODIFIED, MOVED FROM 1.4.1] Verify the use of unique accounts. ([C3](https://example.org/c3)) | ✓ | ✓ | ✓ | 250 |";

        let requirement = parse(line).unwrap();

        assert_eq!(requirement.id().to_string(), "1.2.3");
        assert_eq!(
            requirement.tag().unwrap().text(),
            "MODIFIED, MOVED FROM 1.4.1"
        );
        assert_eq!(requirement.tag_kind(), TagKind::Moved);
        assert_eq!(
            requirement.description(),
            "Verify the use of unique accounts."
        );
        assert_eq!(requirement.level(), Some(Level::One));
        assert_eq!(requirement.position(), Some(&position()));
        assert!(requirement.commits().is_empty());
        assert!(requirement.issues().is_empty());
    }

    #[test]
    fn untagged_row() {
        let requirement = parse("| **2.1.10** | Verify passwords are long. | | ✓ | ✓ |").unwrap();

        assert!(requirement.tag().is_none());
        assert_eq!(requirement.tag_kind(), TagKind::Untagged);
        assert_eq!(requirement.description(), "Verify passwords are long.");
        assert_eq!(requirement.level(), Some(Level::Two));
    }

    #[test_case("| **1.1.1** | x | ✓ | | |", Some(Level::One); "first column")]
    #[test_case("| **1.1.1** | x | | ✓ | |", Some(Level::Two); "second column")]
    #[test_case("| **1.1.1** | x | | | ✓ |", Some(Level::Three); "third column")]
    #[test_case("| **1.1.1** | x | | ✓ | ✓ |", Some(Level::Two); "lowest wins")]
    #[test_case("| **1.1.1** | [DELETED] x | | | |", None; "no level")]
    fn level_is_derived_from_columns(line: &str, expected: Option<Level>) {
        assert_eq!(parse(line).unwrap().level(), expected);
    }

    #[test_case("| # | Description | L1 | L2 | L3 |"; "header")]
    #[test_case("| :---: | :--- | :---: | :---: | :---: |"; "separator")]
    #[test_case("| **1.2** | x | ✓ | | |"; "too few segments")]
    #[test_case("| **a.b.c** | x | ✓ | | |"; "non numeric")]
    #[test_case("| **01.2.3** | x | ✓ | | |"; "leading zero")]
    #[test_case("| **1.2.3.4** | x | ✓ | | |"; "too many segments")]
    #[test_case("| **1.2.3** | x | ✓ |"; "too few columns")]
    #[test_case("Some prose mentioning **1.2.3** in passing."; "prose")]
    #[test_case(""; "empty line")]
    fn non_rows_are_skipped(line: &str) {
        assert!(parse(line).is_none());
    }

    #[test]
    fn parsing_is_idempotent() {
        let line = "| **5.3.4** | [ADDED] Verify output encoding. | | ✓ | ✓ |";
        assert_eq!(parse(line), parse(line));
    }

    #[test]
    fn empty_brackets_are_no_tag() {
        let requirement = parse("| **1.1.1** | [] Verify things | ✓ | | |").unwrap();
        assert!(requirement.tag().is_none());
        assert_eq!(requirement.description(), "Verify things");
    }

    #[test]
    fn custom_annotation_marker() {
        let parser = RowParser::new("{{");
        assert_eq!(parser.clean_description(" keep {{ drop }} "), "keep");
        assert_eq!(parser.clean_description(" keep ([C1]) "), "keep ([C1])");

        let no_marker = RowParser::new("");
        assert_eq!(no_marker.clean_description(" all of it "), "all of it");
    }
}
