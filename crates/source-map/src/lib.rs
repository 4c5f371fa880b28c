//! Offset tracking and position mapping for vue-class-rs.
//!
//! Synthetic documents are built from pieces copied out of the original
//! component file plus generated glue. Every copied piece keeps its length,
//! so a mapping is just a pair of start offsets and a shared length. This
//! crate provides the span/line primitives, the [`OffsetMap`] that records
//! those pairs, the [`CodeBuilder`] that produces text and map together, and
//! the [`PositionMapper`] used to translate editor positions.

use std::ops::Range;

/// A span in the source code, representing a half-open range [start, end).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span {
    /// Start offset (inclusive)
    pub start: u32,
    /// End offset (exclusive)
    pub end: u32,
}

impl Span {
    /// Create a new span from start and end offsets.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create an empty span at the given offset.
    #[inline]
    pub const fn empty(offset: u32) -> Self {
        Self {
            start: offset,
            end: offset,
        }
    }

    /// Get the length of the span.
    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Check if the span is empty.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Check if this span contains another span.
    #[inline]
    pub const fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Check if this span contains an offset.
    #[inline]
    pub const fn contains_offset(&self, offset: u32) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Shift both ends by `delta`.
    #[inline]
    pub const fn shift(self, delta: u32) -> Span {
        Span::new(self.start + delta, self.end + delta)
    }

    /// Merge two spans into one that covers both.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Convert to a Range<usize>.
    #[inline]
    pub fn to_range(self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Slice `text` with this span, if it lies on char boundaries.
    pub fn slice(self, text: &str) -> Option<&str> {
        text.get(self.to_range())
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Span::new(range.start as u32, range.end as u32)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.to_range()
    }
}

/// A line index for converting between byte offsets and line/column positions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offsets of the start of each line.
    line_starts: Vec<u32>,
    /// Total length of the source.
    len: u32,
}

impl LineIndex {
    /// Create a new line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self {
            line_starts,
            len: text.len() as u32,
        }
    }

    /// Get the line and column for a byte offset.
    /// Line and column are 0-indexed. Offsets past the end clamp to the end.
    pub fn line_col(&self, offset: u32) -> LineCol {
        let offset = offset.min(self.len);
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        LineCol {
            line: line as u32,
            col: offset - line_start,
        }
    }

    /// Get the byte offset for a line and column.
    /// Returns None if the position is out of bounds.
    pub fn offset(&self, line_col: LineCol) -> Option<u32> {
        let line_start = *self.line_starts.get(line_col.line as usize)?;
        let offset = line_start + line_col.col;
        let line_end = self.line_end(line_col.line)?;
        if offset <= line_end && offset <= self.len {
            Some(offset)
        } else {
            None
        }
    }

    /// Get the number of lines.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Total length of the indexed text.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Whether the indexed text is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the start offset of a line.
    pub fn line_start(&self, line: u32) -> Option<u32> {
        self.line_starts.get(line as usize).copied()
    }

    /// Get the end offset of a line (exclusive, including newline if present).
    pub fn line_end(&self, line: u32) -> Option<u32> {
        let line_idx = line as usize;
        if line_idx + 1 < self.line_starts.len() {
            Some(self.line_starts[line_idx + 1])
        } else if line_idx < self.line_starts.len() {
            Some(self.len)
        } else {
            None
        }
    }
}

/// A line and column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineCol {
    /// 0-indexed line number.
    pub line: u32,
    /// 0-indexed column (byte offset within line).
    pub col: u32,
}

impl LineCol {
    /// Create a new line/column position.
    #[inline]
    pub const fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Convert to 1-indexed for display.
    #[inline]
    pub const fn to_display(self) -> (u32, u32) {
        (self.line + 1, self.col + 1)
    }
}

/// One length-preserving correspondence between synthetic and original text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MappedSpan {
    /// Offset in the synthetic document.
    pub synthetic: u32,
    /// Offset in the original document.
    pub original: u32,
    /// Length shared by both sides.
    pub len: u32,
}

impl MappedSpan {
    /// Create a new mapped span.
    pub const fn new(synthetic: u32, original: u32, len: u32) -> Self {
        Self {
            synthetic,
            original,
            len,
        }
    }

    /// The synthetic side as a span.
    pub const fn synthetic_span(&self) -> Span {
        Span::new(self.synthetic, self.synthetic + self.len)
    }

    /// The original side as a span.
    pub const fn original_span(&self) -> Span {
        Span::new(self.original, self.original + self.len)
    }
}

/// Ordered, non-overlapping list of mapped spans.
///
/// Spans always ascend on the synthetic side. Maps built with
/// [`OffsetMap::push`] also ascend on the original side; composed documents
/// may move a region (the compiled template) ahead of text that precedes it
/// in the file, so lookups from the original side go through an index
/// sorted by original offset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OffsetMap {
    spans: Vec<MappedSpan>,
    /// Indices into `spans`, sorted by original offset.
    by_original: Vec<usize>,
}

impl OffsetMap {
    /// Create a new empty offset map.
    pub fn new() -> Self {
        Self::default()
    }

    /// A map that sends every offset of `span` to itself.
    pub fn identity(span: Span) -> Self {
        let mut map = Self::new();
        map.push(span.start, span.start, span.len());
        map
    }

    /// Append a span. Returns `false` (and records nothing) when the span
    /// would overlap or precede the last span on either side.
    pub fn push(&mut self, synthetic: u32, original: u32, len: u32) -> bool {
        if len == 0 {
            return true;
        }
        if let Some(last) = self.spans.last() {
            if original < last.original + last.len {
                return false;
            }
        }
        self.insert(synthetic, original, len)
    }

    /// Append a span that follows every existing span on the synthetic side
    /// but may land anywhere on the original side. Returns `false` when it
    /// would overlap an existing span on either side.
    pub fn insert(&mut self, synthetic: u32, original: u32, len: u32) -> bool {
        if len == 0 {
            return true;
        }
        let pos = self
            .by_original
            .partition_point(|&i| self.spans[i].original < original);
        if let Some(last) = self.spans.last() {
            if synthetic < last.synthetic + last.len {
                return false;
            }
        }
        if pos > 0 {
            let before = &self.spans[self.by_original[pos - 1]];
            if before.original + before.len > original {
                return false;
            }
        }
        if let Some(&after) = self.by_original.get(pos) {
            if self.spans[after].original < original + len {
                return false;
            }
        }

        if let Some(last) = self.spans.last_mut() {
            if synthetic == last.synthetic + last.len && original == last.original + last.len {
                last.len += len;
                return true;
            }
        }
        self.spans.push(MappedSpan::new(synthetic, original, len));
        self.by_original.insert(pos, self.spans.len() - 1);
        true
    }

    /// Append every span of `other` moved by `delta` on the synthetic side.
    /// Spans that would overlap existing ones are dropped.
    pub fn append_shifted(&mut self, other: &OffsetMap, delta: u32) {
        for span in &other.spans {
            self.insert(span.synthetic + delta, span.original, span.len);
        }
    }

    /// Get all spans, in synthetic order.
    pub fn spans(&self) -> &[MappedSpan] {
        &self.spans
    }

    /// Check if the map has no spans.
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Get the number of spans.
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    /// Whether the spans also ascend on the original side. Always true for
    /// maps built with `push` alone.
    pub fn is_monotonic(&self) -> bool {
        self.spans.windows(2).all(|pair| {
            pair[0].synthetic + pair[0].len <= pair[1].synthetic
                && pair[0].original + pair[0].len <= pair[1].original
        })
    }

    fn find_synthetic(&self, offset: u32) -> Option<&MappedSpan> {
        let idx = self
            .spans
            .partition_point(|s| s.synthetic + s.len <= offset);
        self.spans
            .get(idx)
            .filter(|s| s.synthetic <= offset && offset < s.synthetic + s.len)
    }

    fn find_original(&self, offset: u32) -> Option<&MappedSpan> {
        let idx = self.by_original.partition_point(|&i| {
            let s = &self.spans[i];
            s.original + s.len <= offset
        });
        self.by_original
            .get(idx)
            .map(|&i| &self.spans[i])
            .filter(|s| s.original <= offset && offset < s.original + s.len)
    }

    /// Map a synthetic offset to the original document.
    pub fn to_original(&self, synthetic: u32) -> Option<u32> {
        self.find_synthetic(synthetic)
            .map(|s| s.original + (synthetic - s.synthetic))
    }

    /// Map an original offset into the synthetic document.
    pub fn to_synthetic(&self, original: u32) -> Option<u32> {
        self.find_original(original)
            .map(|s| s.synthetic + (original - s.original))
    }

    /// Map an exclusive end offset from the synthetic side.
    fn end_to_original(&self, synthetic_end: u32) -> Option<u32> {
        let idx = self
            .spans
            .partition_point(|s| s.synthetic + s.len < synthetic_end);
        self.spans
            .get(idx)
            .filter(|s| s.synthetic < synthetic_end && synthetic_end <= s.synthetic + s.len)
            .map(|s| s.original + (synthetic_end - s.synthetic))
    }

    /// Map an exclusive end offset from the original side.
    fn end_to_synthetic(&self, original_end: u32) -> Option<u32> {
        let idx = self.by_original.partition_point(|&i| {
            let s = &self.spans[i];
            s.original + s.len < original_end
        });
        self.by_original
            .get(idx)
            .map(|&i| &self.spans[i])
            .filter(|s| s.original < original_end && original_end <= s.original + s.len)
            .map(|s| s.synthetic + (original_end - s.original))
    }

    /// Map a synthetic range. Both ends must be mapped.
    pub fn to_original_span(&self, span: Span) -> Option<Span> {
        let start = self.to_original(span.start)?;
        if span.is_empty() {
            return Some(Span::empty(start));
        }
        let end = self.end_to_original(span.end)?;
        (start <= end).then_some(Span::new(start, end))
    }

    /// Map the mapped part of a synthetic range, from its first mapped byte
    /// to the end of its last one. `None` when no byte of the range is
    /// mapped.
    pub fn clamp_to_original(&self, span: Span) -> Option<Span> {
        if span.is_empty() {
            return self.to_original(span.start).map(Span::empty);
        }
        let first = self
            .spans
            .partition_point(|s| s.synthetic + s.len <= span.start);
        let mut pieces = self.spans[first..]
            .iter()
            .take_while(|s| s.synthetic < span.end)
            .map(|s| {
                let start = span.start.max(s.synthetic) - s.synthetic;
                let end = span.end.min(s.synthetic + s.len) - s.synthetic;
                Span::new(s.original + start, s.original + end)
            });
        let head = pieces.next()?;
        let tail = pieces.last().unwrap_or(head);
        // Pieces moved ahead of earlier text keep only the first one.
        Some(if head.start <= tail.end {
            Span::new(head.start, tail.end)
        } else {
            head
        })
    }

    /// Map an original range. Both ends must be mapped.
    pub fn to_synthetic_span(&self, span: Span) -> Option<Span> {
        let start = self.to_synthetic(span.start)?;
        if span.is_empty() {
            return Some(Span::empty(start));
        }
        let end = self.end_to_synthetic(span.end)?;
        (start <= end).then_some(Span::new(start, end))
    }
}

/// Builder for generating code together with its offset map.
#[derive(Debug, Default)]
pub struct CodeBuilder {
    /// The generated code.
    code: String,
    /// The offset map.
    map: OffsetMap,
}

impl CodeBuilder {
    /// Create a new code builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the current offset in the generated code.
    pub fn offset(&self) -> u32 {
        self.code.len() as u32
    }

    /// Append code without mapping.
    pub fn push_str(&mut self, code: &str) {
        self.code.push_str(code);
    }

    /// Append a character without mapping.
    pub fn push(&mut self, c: char) {
        self.code.push(c);
    }

    /// Append text copied from the original document at `original_offset`.
    ///
    /// The text is always appended; the mapping is only recorded when it
    /// keeps the map ascending. Returns whether the text ended up mapped.
    pub fn push_mapped(&mut self, code: &str, original_offset: u32) -> bool {
        let synthetic = self.offset();
        self.code.push_str(code);
        self.map.push(synthetic, original_offset, code.len() as u32)
    }

    /// Append text copied from `original_offset` that may sit before earlier
    /// mapped text in the original document. See [`OffsetMap::insert`].
    pub fn push_region(&mut self, code: &str, original_offset: u32) -> bool {
        let synthetic = self.offset();
        self.code.push_str(code);
        self.map.insert(synthetic, original_offset, code.len() as u32)
    }

    /// Append `len` bytes of whitespace mirroring `source`, keeping line breaks.
    pub fn push_blank(&mut self, source: &str) {
        for c in source.chars() {
            match c {
                '\n' | '\r' => self.code.push(c),
                // One space per byte, so every later offset stays in place.
                _ => self.code.extend(std::iter::repeat(' ').take(c.len_utf8())),
            }
        }
    }

    /// Append an already built fragment, shifting its map into place.
    pub fn push_fragment(&mut self, code: &str, map: &OffsetMap) {
        let delta = self.offset();
        self.code.push_str(code);
        self.map.append_shifted(map, delta);
    }

    /// Append a newline.
    pub fn newline(&mut self) {
        self.code.push('\n');
    }

    /// Get the generated code.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Get the offset map.
    pub fn map(&self) -> &OffsetMap {
        &self.map
    }

    /// Consume the builder and return the code and offset map.
    pub fn finish(self) -> (String, OffsetMap) {
        (self.code, self.map)
    }
}

/// Translates line/column positions between an original document and its
/// synthetic counterpart.
#[derive(Debug, Clone, Copy)]
pub struct PositionMapper<'a> {
    map: &'a OffsetMap,
    original: &'a LineIndex,
    synthetic: &'a LineIndex,
}

impl<'a> PositionMapper<'a> {
    /// Create a mapper over a map and the line indexes of both documents.
    pub fn new(map: &'a OffsetMap, original: &'a LineIndex, synthetic: &'a LineIndex) -> Self {
        Self {
            map,
            original,
            synthetic,
        }
    }

    /// Original position to synthetic position.
    pub fn to_synthetic(&self, position: LineCol) -> Option<LineCol> {
        let offset = self.original.offset(position)?;
        self.map
            .to_synthetic(offset)
            .map(|o| self.synthetic.line_col(o))
    }

    /// Synthetic position to original position.
    pub fn to_original(&self, position: LineCol) -> Option<LineCol> {
        let offset = self.synthetic.offset(position)?;
        self.map.to_original(offset).map(|o| self.original.line_col(o))
    }

    /// Synthetic range to the original range covered by its mapped part,
    /// as line/column pairs.
    pub fn clamp_to_original(&self, start: LineCol, end: LineCol) -> Option<(LineCol, LineCol)> {
        let start = self.synthetic.offset(start)?;
        let end = self.synthetic.offset(end)?;
        if start > end {
            return None;
        }
        let mapped = self.map.clamp_to_original(Span::new(start, end))?;
        Some((
            self.original.line_col(mapped.start),
            self.original.line_col(mapped.end),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_span() {
        let span = Span::new(10, 20);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
        assert!(span.contains_offset(15));
        assert!(!span.contains_offset(5));
        assert!(!span.contains_offset(20));
        assert_eq!(span.shift(5), Span::new(15, 25));
    }

    #[test]
    fn test_line_index() {
        let text = "hello\nworld\nfoo";
        let index = LineIndex::new(text);

        assert_eq!(index.line_count(), 3);
        assert_eq!(index.line_col(0), LineCol::new(0, 0));
        assert_eq!(index.line_col(5), LineCol::new(0, 5));
        assert_eq!(index.line_col(6), LineCol::new(1, 0));
        assert_eq!(index.line_col(11), LineCol::new(1, 5));
        assert_eq!(index.line_col(12), LineCol::new(2, 0));

        assert_eq!(index.offset(LineCol::new(0, 0)), Some(0));
        assert_eq!(index.offset(LineCol::new(1, 0)), Some(6));
        assert_eq!(index.offset(LineCol::new(2, 3)), Some(15));
        assert_eq!(index.offset(LineCol::new(2, 4)), None);
        assert_eq!(index.offset(LineCol::new(3, 0)), None);
    }

    #[test]
    fn test_offset_map_lookup() {
        let mut map = OffsetMap::new();
        assert!(map.push(0, 100, 10));
        assert!(map.push(20, 200, 10));

        assert_eq!(map.to_original(5), Some(105));
        assert_eq!(map.to_original(25), Some(205));
        assert_eq!(map.to_original(15), None);
        assert_eq!(map.to_original(30), None);

        assert_eq!(map.to_synthetic(105), Some(5));
        assert_eq!(map.to_synthetic(150), None);
        assert_eq!(map.to_synthetic(209), Some(29));
    }

    #[test]
    fn test_offset_map_rejects_reordering() {
        let mut map = OffsetMap::new();
        assert!(map.push(10, 50, 5));
        // Overlaps on the original side.
        assert!(!map.push(20, 52, 3));
        // Precedes on the synthetic side.
        assert!(!map.push(12, 80, 3));
        assert_eq!(map.len(), 1);
        assert!(map.is_monotonic());
    }

    #[test]
    fn test_insert_allows_original_reordering() {
        // Script prefix, then a template region that sits earlier in the file.
        let mut map = OffsetMap::new();
        assert!(map.push(0, 100, 20));
        assert!(map.insert(30, 10, 5));
        assert!(map.insert(40, 120, 10));
        // Overlaps the template region on the original side.
        assert!(!map.insert(60, 12, 2));
        assert!(!map.is_monotonic());

        assert_eq!(map.to_synthetic(12), Some(32));
        assert_eq!(map.to_synthetic(105), Some(5));
        assert_eq!(map.to_synthetic(125), Some(45));
        assert_eq!(map.to_original(33), Some(13));
        assert_eq!(map.to_synthetic_span(Span::new(10, 15)), Some(Span::new(30, 35)));
    }

    #[test]
    fn test_offset_map_merges_contiguous_spans() {
        let mut map = OffsetMap::new();
        map.push(0, 10, 4);
        map.push(4, 14, 6);
        assert_eq!(map.spans(), &[MappedSpan::new(0, 10, 10)]);
    }

    #[test]
    fn test_round_trip_inside_mapped_spans() {
        let mut map = OffsetMap::new();
        map.push(3, 40, 7);
        map.push(30, 60, 2);
        map.push(41, 90, 12);
        for span in map.spans().to_vec() {
            for p in span.original..span.original + span.len {
                let synthetic = map.to_synthetic(p).unwrap();
                assert_eq!(map.to_original(synthetic), Some(p));
            }
        }
        // Unmapped on both sides.
        assert_eq!(map.to_synthetic(47), None);
        assert_eq!(map.to_original(10), None);
    }

    #[test]
    fn test_span_mapping_uses_exclusive_end() {
        let mut map = OffsetMap::new();
        map.push(10, 0, 5);
        assert_eq!(map.to_original_span(Span::new(10, 15)), Some(Span::new(0, 5)));
        assert_eq!(map.to_original_span(Span::new(12, 12)), Some(Span::new(2, 2)));
        assert_eq!(map.to_original_span(Span::new(12, 16)), None);
        assert_eq!(map.to_synthetic_span(Span::new(1, 5)), Some(Span::new(11, 15)));
    }

    #[test]
    fn test_clamp_keeps_mapped_part_of_range() {
        let mut map = OffsetMap::new();
        // `this.` is generated; `$refs.box` is copied from offset 40.
        map.push(5, 40, 9);
        map.push(20, 60, 3);
        assert_eq!(map.to_original_span(Span::new(0, 14)), None);
        assert_eq!(map.clamp_to_original(Span::new(0, 14)), Some(Span::new(40, 49)));
        assert_eq!(map.clamp_to_original(Span::new(7, 22)), Some(Span::new(42, 62)));
        assert_eq!(map.clamp_to_original(Span::new(14, 20)), None);
        assert_eq!(map.clamp_to_original(Span::new(6, 6)), Some(Span::new(41, 41)));
    }

    #[test]
    fn test_code_builder() {
        let mut builder = CodeBuilder::new();
        builder.push_str("(");
        assert!(builder.push_mapped("value", 50));
        builder.push_str(");");
        // Behind the previous mapping, so it stays unmapped.
        assert!(!builder.push_mapped("x", 10));

        let (code, map) = builder.finish();
        assert_eq!(code, "(value);x");
        assert_eq!(map.to_original(1), Some(50));
        assert_eq!(map.to_original(8), None);
    }

    #[test]
    fn test_push_blank_keeps_length_and_lines() {
        let mut builder = CodeBuilder::new();
        let source = "<a>\r\n é</a>";
        builder.push_blank(source);
        assert_eq!(builder.code().len(), source.len());
        assert_eq!(builder.code().matches('\n').count(), 1);
        assert!(builder.code().starts_with("   \r\n"));

        let mut builder = CodeBuilder::new();
        let source = "é\nx";
        builder.push_blank(source);
        assert_eq!(builder.code(), "  \n ");
        assert_eq!(builder.code().find('\n'), source.find('\n'));
    }

    #[test]
    fn test_position_mapper() {
        let original = "<template>{{ x }}</template>";
        let synthetic = "let a;\n(x);";
        let mut map = OffsetMap::new();
        map.push(8, 13, 1);
        let original_index = LineIndex::new(original);
        let synthetic_index = LineIndex::new(synthetic);
        let mapper = PositionMapper::new(&map, &original_index, &synthetic_index);

        assert_eq!(mapper.to_synthetic(LineCol::new(0, 13)), Some(LineCol::new(1, 1)));
        assert_eq!(mapper.to_original(LineCol::new(1, 1)), Some(LineCol::new(0, 13)));
        assert_eq!(mapper.to_original(LineCol::new(0, 2)), None);
        assert_eq!(
            mapper.clamp_to_original(LineCol::new(1, 0), LineCol::new(1, 4)),
            Some((LineCol::new(0, 13), LineCol::new(0, 14)))
        );
        assert_eq!(mapper.clamp_to_original(LineCol::new(0, 0), LineCol::new(0, 6)), None);
    }
}
