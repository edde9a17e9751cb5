use serde::{Deserialize, Serialize};

use super::tag::Tag;

/// Where a fragment's opening marker sits in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset of the `<?` that opens the fragment
    pub offset: usize,
    /// 1-based line number
    pub line: u32,
    /// 1-based column, counted in characters
    pub column: u32,
}

impl Position {
    /// Resolve a byte offset within `source` into a line/column position.
    pub fn locate(source: &str, offset: usize) -> Self {
        let before = &source[..offset];
        let line = before.matches('\n').count() as u32 + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() as u32 + 1;
        Self {
            offset,
            line,
            column,
        }
    }
}

/// A tagged code fragment lifted out of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub tag: Tag,
    /// Fragment body with leading and trailing whitespace trimmed
    pub code: String,
    pub position: Position,
    /// Index of this fragment in document order
    pub ordinal: usize,
}

impl Segment {
    pub fn label(&self) -> String {
        format!(
            "{} fragment #{} (line {})",
            self.tag, self.ordinal, self.position.line
        )
    }
}

/// An opening marker that never found its closing `?>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnterminatedFragment {
    pub tag: Tag,
    pub position: Position,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_first_line() {
        let pos = Position::locate("<?py print(1)?>", 0);
        assert_eq!((pos.line, pos.column), (1, 1));
    }

    #[test]
    fn test_locate_after_newlines() {
        let source = "intro\nmore text <?js x ?>";
        let offset = source.find("<?").unwrap();
        let pos = Position::locate(source, offset);
        assert_eq!(pos.offset, offset);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 11);
    }
}
