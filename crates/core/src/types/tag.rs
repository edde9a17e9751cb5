use crate::impl_case_insensitive_deserialize;
use serde::{Serialize, Serializer};
use std::fmt;

/// Language tag carried by a fragment's opening marker (`<?py`, `<?cpp`, ...).
///
/// The set is closed: adding a language means adding a variant here and a
/// built-in recipe for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tag {
    Python,
    JavaScript,
    Php,
    Css,
    CSharp,
    Cpp,
}

impl_case_insensitive_deserialize!(
    Tag,
    Python => "py",
    JavaScript => "js",
    Php => "php",
    Css => "css",
    CSharp => "cs",
    Cpp => "cpp"
);

impl Tag {
    /// Every tag, in the order tag groups are processed and aggregated.
    pub const ALL: [Tag; 6] = [
        Tag::Python,
        Tag::JavaScript,
        Tag::Php,
        Tag::Css,
        Tag::CSharp,
        Tag::Cpp,
    ];

    /// The name written right after `<?` in a document.
    pub fn marker(self) -> &'static str {
        match self {
            Tag::Python => "py",
            Tag::JavaScript => "js",
            Tag::Php => "php",
            Tag::Css => "css",
            Tag::CSharp => "cs",
            Tag::Cpp => "cpp",
        }
    }

    pub fn from_marker(marker: &str) -> Option<Tag> {
        Tag::ALL.into_iter().find(|tag| tag.marker() == marker)
    }

    /// Position of this tag's group in the aggregated output.
    pub fn group_index(self) -> usize {
        Tag::ALL
            .iter()
            .position(|tag| *tag == self)
            .unwrap_or(Tag::ALL.len())
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.marker())
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_lookup() {
        for tag in Tag::ALL {
            assert_eq!(Tag::from_marker(tag.marker()), Some(tag));
        }
        assert_eq!(Tag::from_marker("rb"), None);
    }

    #[test]
    fn test_group_order_is_declaration_order() {
        assert_eq!(Tag::Python.group_index(), 0);
        assert_eq!(Tag::Css.group_index(), 3);
        assert_eq!(Tag::Cpp.group_index(), 5);
    }

    #[test]
    fn test_case_insensitive_deserialize() {
        let tag: Tag = serde_json::from_str("\"CPP\"").unwrap();
        assert_eq!(tag, Tag::Cpp);
        assert!(serde_json::from_str::<Tag>("\"ruby\"").is_err());
        assert_eq!(serde_json::to_string(&Tag::CSharp).unwrap(), "\"cs\"");
    }
}
