use std::fmt;

use non_empty_string::NonEmptyString;
use serde::Serialize;

/// How a requirement changed since the prior revision of the document.
///
/// Decided once, when the row is parsed, from the raw tag text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TagKind {
    /// The requirement is new in this revision.
    Added,
    /// The requirement was moved from another section.
    Moved,
    /// The requirement was split out of, or into, other requirements.
    Split,
    /// The requirement was removed.
    Removed,
    /// The requirement's compliance level changed.
    LevelChanged,
    /// The requirement carries some other change note.
    Edited,
    /// The requirement carries no tag.
    Untagged,
}

impl TagKind {
    /// Classify raw tag text.
    ///
    /// Matching is case-insensitive and checked in a fixed order, so a tag
    /// reading `ADDED, MOVED FROM 1.2.3` is [`TagKind::Added`].
    #[must_use]
    pub fn classify(text: &str) -> Self {
        let upper = text.to_uppercase();
        if upper.contains("ADDED") {
            Self::Added
        } else if upper.contains("DELETED") || upper.contains("REMOVED") {
            Self::Removed
        } else if upper.contains("SPLIT") {
            Self::Split
        } else if upper.contains("MOVED") {
            Self::Moved
        } else if upper.contains("LEVEL") {
            Self::LevelChanged
        } else {
            Self::Edited
        }
    }

    /// The status glyph shown for this kind of change in the report.
    #[must_use]
    pub const fn glyph(self) -> &'static str {
        match self {
            Self::Added => "🆕",
            Self::Moved => "🔀",
            Self::Split => "✂️",
            Self::Removed => "🗑️",
            Self::LevelChanged => "📶",
            Self::Edited => "📝",
            Self::Untagged => "",
        }
    }
}

/// The change note attached to a requirement row, e.g. `[MODIFIED, SPLIT]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    text: NonEmptyString,
    kind: TagKind,
}

impl Tag {
    /// Build a tag from the text between the brackets.
    ///
    /// Surrounding whitespace is trimmed. Returns `None` for blank text, which
    /// is treated the same as no tag at all.
    #[must_use]
    pub fn new(text: &str) -> Option<Self> {
        let text = NonEmptyString::new(text.trim().to_string()).ok()?;
        let kind = TagKind::classify(text.as_str());
        Some(Self { text, kind })
    }

    /// Parse a bracketed tag such as `[ADDED]`.
    ///
    /// Returns `None` if the text is not bracketed or the brackets are empty.
    #[must_use]
    pub fn from_bracketed(raw: &str) -> Option<Self> {
        let inner = raw.trim().strip_prefix('[')?.strip_suffix(']')?;
        Self::new(inner)
    }

    /// The tag text, without brackets.
    #[must_use]
    pub fn text(&self) -> &str {
        self.text.as_str()
    }

    /// The change category of this tag.
    #[must_use]
    pub const fn kind(&self) -> TagKind {
        self.kind
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.text)
    }
}

impl Serialize for Tag {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("ADDED", TagKind::Added)]
    #[test_case("added", TagKind::Added; "lowercase")]
    #[test_case("MODIFIED, ADDED", TagKind::Added; "added wins over modified")]
    #[test_case("DELETED", TagKind::Removed)]
    #[test_case("REMOVED, MERGED TO 1.2.3", TagKind::Removed)]
    #[test_case("SPLIT FROM 2.1.1", TagKind::Split)]
    #[test_case("MOVED FROM 5.3.4", TagKind::Moved)]
    #[test_case("LEVEL L1 > L2", TagKind::LevelChanged)]
    #[test_case("MODIFIED", TagKind::Edited)]
    #[test_case("GRAMMAR", TagKind::Edited; "unknown text is edited")]
    fn classification(text: &str, expected: TagKind) {
        assert_eq!(TagKind::classify(text), expected);
    }

    #[test]
    fn bracketed_tag_is_trimmed() {
        let tag = Tag::from_bracketed("[ MOVED FROM 1.1.1 ]").unwrap();
        assert_eq!(tag.text(), "MOVED FROM 1.1.1");
        assert_eq!(tag.kind(), TagKind::Moved);
        assert_eq!(tag.to_string(), "[MOVED FROM 1.1.1]");
    }

    #[test_case("[]"; "empty brackets")]
    #[test_case("[   ]"; "blank brackets")]
    #[test_case("ADDED"; "no brackets")]
    fn blank_or_unbracketed_is_no_tag(raw: &str) {
        assert!(Tag::from_bracketed(raw).is_none());
    }

    #[test]
    fn every_tagged_kind_has_a_glyph() {
        for kind in [
            TagKind::Added,
            TagKind::Moved,
            TagKind::Split,
            TagKind::Removed,
            TagKind::LevelChanged,
            TagKind::Edited,
        ] {
            assert!(!kind.glyph().is_empty(), "{kind:?} has no glyph");
        }
        assert!(TagKind::Untagged.glyph().is_empty());
    }
}
