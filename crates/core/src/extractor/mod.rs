//! Locates tagged fragments (`<?py ... ?>`, `<?cpp ... ?>`, ...) in a document.

use regex::Regex;
use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    error::{Error, Result},
    types::{Position, Segment, Tag, UnterminatedFragment},
};

pub const CLOSING_MARKER: &str = "?>";

/// Fragments found in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Extraction {
    /// Well-formed fragments, in document order
    pub segments: Vec<Segment>,
    pub unterminated: Vec<UnterminatedFragment>,
}

impl Extraction {
    /// Segments grouped by tag in [`Tag::ALL`] order, document order within a group.
    pub fn grouped(&self) -> Vec<Segment> {
        let mut segments = self.segments.clone();
        // stable: keeps document order inside each group
        segments.sort_by_key(|segment| segment.tag.group_index());
        segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Fragment pattern for one tag.
struct TagPattern {
    tag: Tag,
    fragment: Regex,
    /// Longer markers starting with this tag's marker (`css` for `cs`)
    shadowed_by: Vec<&'static str>,
}

impl TagPattern {
    fn new(tag: Tag) -> Result<Self> {
        let marker = tag.marker();
        let fragment = Regex::new(&format!(r"(?s)<\?{}(.*?)\?>", regex::escape(marker)))
            .map_err(|e| Error::PatternError(e.to_string()))?;
        let shadowed_by = Tag::ALL
            .iter()
            .map(|other| other.marker())
            .filter(|other| other.len() > marker.len() && other.starts_with(marker))
            .collect();
        Ok(Self {
            tag,
            fragment,
            shadowed_by,
        })
    }

    /// Whether the opener at `start` actually belongs to a longer marker.
    fn is_shadowed(&self, document: &str, start: usize) -> bool {
        let after_open = &document[start + 2..];
        self.shadowed_by
            .iter()
            .any(|longer| after_open.starts_with(longer))
    }
}

pub struct SegmentExtractor {
    patterns: Vec<TagPattern>,
    opener: Regex,
}

impl SegmentExtractor {
    pub fn new() -> Result<Self> {
        let patterns = Tag::ALL
            .into_iter()
            .map(TagPattern::new)
            .collect::<Result<Vec<_>>>()?;

        // Longest marker first so `<?css` is never read as `<?cs` + "s...".
        let mut markers: Vec<&str> = Tag::ALL.iter().map(|tag| tag.marker()).collect();
        markers.sort_by_key(|marker| std::cmp::Reverse(marker.len()));
        let opener = Regex::new(&format!(r"<\?({})", markers.join("|")))
            .map_err(|e| Error::PatternError(e.to_string()))?;

        Ok(Self { patterns, opener })
    }

    /// Scan `document` and return its fragments in document order.
    ///
    /// Each tag is matched on its own, leftmost and non-greedy: a fragment
    /// ends at the first `?>` after its opening marker. Tags do not hide each
    /// other, so in `<?py a <?js b ?>` the python fragment's code is
    /// `a <?js b` and the javascript fragment's code is `b`.
    pub fn scan(&self, document: &str) -> Extraction {
        let mut extraction = Extraction::default();

        for pattern in &self.patterns {
            let mut from = 0;
            while let Some(captures) = pattern.fragment.captures_at(document, from) {
                let (Some(whole), Some(body)) = (captures.get(0), captures.get(1)) else {
                    break;
                };
                if pattern.is_shadowed(document, whole.start()) {
                    // retry just past this opener; a shorter fragment may start inside it
                    from = whole.start() + 2;
                    continue;
                }

                let segment = Segment {
                    tag: pattern.tag,
                    code: body.as_str().trim().to_string(),
                    position: Position::locate(document, whole.start()),
                    ordinal: 0,
                };
                trace!("Found {} fragment at line {}", segment.tag, segment.position.line);
                extraction.segments.push(segment);
                from = whole.end();
            }
        }

        extraction.segments.sort_by_key(|segment| segment.position.offset);
        for (ordinal, segment) in extraction.segments.iter_mut().enumerate() {
            segment.ordinal = ordinal;
        }

        // Openers after the last closing marker have nothing to close them.
        let tail_start = document
            .rfind(CLOSING_MARKER)
            .map_or(0, |close| close + CLOSING_MARKER.len());
        for opener in self.opener.captures_iter(&document[tail_start..]) {
            let (Some(whole), Some(marker)) = (opener.get(0), opener.get(1)) else {
                continue;
            };
            if let Some(tag) = Tag::from_marker(marker.as_str()) {
                extraction.unterminated.push(UnterminatedFragment {
                    tag,
                    position: Position::locate(document, tail_start + whole.start()),
                });
            }
        }

        debug!(
            "Extracted {} fragment(s), {} unterminated",
            extraction.segments.len(),
            extraction.unterminated.len()
        );
        extraction
    }

    /// Fragments grouped by tag, in the order the engine processes them.
    pub fn extract(&self, document: &str) -> Vec<Segment> {
        self.scan(document).grouped()
    }
}

/// One-shot convenience over [`SegmentExtractor::extract`].
pub fn extract(document: &str) -> Result<Vec<Segment>> {
    Ok(SegmentExtractor::new()?.extract(document))
}
