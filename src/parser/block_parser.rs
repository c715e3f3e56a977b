use crate::error::Result;
use regex::Regex;
use std::ops::Range;

pub const START_MARKER: &str = "--- START OF FILE: ";
pub const END_MARKER: &str = "--- END OF FILE: ";
const MARKER_TAIL: &str = " ---";
const OPENING_TAIL: &str = " ---\n\n";
const CLOSING_HEAD: &str = "\n\n--- END OF FILE: ";

/// One delimited file block, borrowed from the combined document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileBlock<'a> {
    /// Path token exactly as it appears between the markers.
    pub raw_path: &'a str,
    pub content: &'a str,
    /// Byte range of the whole block, START marker through END marker.
    pub span: Range<usize>,
}

impl<'a> FileBlock<'a> {
    pub fn relative_path(&self) -> &'a str {
        self.raw_path.trim()
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

pub struct BlockParser {
    start_pattern: Regex,
}

impl BlockParser {
    pub fn new() -> Result<Self> {
        let start_pattern = Regex::new(&regex::escape(START_MARKER))?;
        Ok(Self { start_pattern })
    }

    /// Lazily scans `document` for blocks, left to right, without overlap.
    pub fn blocks<'p, 'a>(&'p self, document: &'a str) -> Blocks<'p, 'a> {
        Blocks::new(&self.start_pattern, document)
    }
}

/// Iterator over the blocks of a document.
///
/// A START marker opens a block; the path token is the shortest text that
/// is followed by ` ---` and a blank line *and* for which a matching
/// `--- END OF FILE: <path> ---` exists later on. The content is everything
/// up to the first such END marker, minus the blank-line padding on both
/// sides. A START marker that never closes yields nothing and scanning
/// moves on to the next START marker.
pub struct Blocks<'p, 'a> {
    start_pattern: &'p Regex,
    document: &'a str,
    position: usize,
    openings: Vec<usize>,
    closings: Vec<usize>,
}

impl<'p, 'a> Blocks<'p, 'a> {
    fn new(start_pattern: &'p Regex, document: &'a str) -> Self {
        let openings = document
            .match_indices(OPENING_TAIL)
            .map(|(index, _)| index)
            .collect();
        let closings = document
            .match_indices(CLOSING_HEAD)
            .map(|(index, _)| index)
            .collect();

        Self {
            start_pattern,
            document,
            position: 0,
            openings,
            closings,
        }
    }

    fn match_at(&self, block_start: usize, path_start: usize) -> Option<FileBlock<'a>> {
        let document = self.document;
        let first_opening = self.openings.partition_point(|&index| index < path_start);

        for &path_end in &self.openings[first_opening..] {
            let raw_path = &document[path_start..path_end];
            let content_start = path_end + OPENING_TAIL.len();

            if let Some(content_end) = self.find_closing(content_start, raw_path) {
                let block_end = content_end + CLOSING_HEAD.len() + raw_path.len() + MARKER_TAIL.len();
                return Some(FileBlock {
                    raw_path,
                    content: &document[content_start..content_end],
                    span: block_start..block_end,
                });
            }
        }

        None
    }

    fn find_closing(&self, from: usize, raw_path: &str) -> Option<usize> {
        let first_closing = self.closings.partition_point(|&index| index < from);

        self.closings[first_closing..].iter().copied().find(|&index| {
            let after_head = &self.document[index + CLOSING_HEAD.len()..];
            after_head
                .strip_prefix(raw_path)
                .is_some_and(|rest| rest.starts_with(MARKER_TAIL))
        })
    }
}

impl<'p, 'a> Iterator for Blocks<'p, 'a> {
    type Item = FileBlock<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.position < self.document.len() {
            let start = self.start_pattern.find_at(self.document, self.position)?;

            if let Some(block) = self.match_at(start.start(), start.end()) {
                log::trace!(
                    "matched block '{}' at bytes {:?}",
                    block.relative_path(),
                    block.span
                );
                self.position = block.span.end;
                return Some(block);
            }

            log::debug!("unterminated block at byte {}", start.start());
            // The marker starts with an ASCII '-', so +1 stays on a char boundary.
            self.position = start.start() + 1;
        }

        None
    }
}

/// Converts `\r\n` and lone `\r` line endings to `\n`.
pub fn normalize_newlines(text: String) -> String {
    if !text.contains('\r') {
        return text;
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Serializes `(path, content)` pairs into the combined-document format.
pub fn render_document<P, C>(files: &[(P, C)]) -> String
where
    P: AsRef<str>,
    C: AsRef<str>,
{
    let mut document = String::new();

    for (path, content) in files {
        let path = path.as_ref();
        document.push_str(START_MARKER);
        document.push_str(path);
        document.push_str(OPENING_TAIL);
        document.push_str(content.as_ref());
        document.push_str(CLOSING_HEAD);
        document.push_str(path);
        document.push_str(MARKER_TAIL);
        document.push_str("\n\n");
    }

    document
}
