//! Line scanning for the block parser.
//!
//! [`LineCursor`] tracks the column of a single physical line so that tab
//! stops (every four columns) are honoured when container prefixes consume
//! part of a tab.

/// Find the end of the line starting at `start`, returning
/// `(content_end, next_line_start)`. Handles `\n`, `\r\n` and `\r`.
pub fn line_bounds(input: &[u8], start: usize) -> (usize, usize) {
    match memchr::memchr2(b'\n', b'\r', &input[start..]) {
        Some(rel) => {
            let end = start + rel;
            if input[end] == b'\r' && input.get(end + 1) == Some(&b'\n') {
                (end, end + 2)
            } else {
                (end, end + 1)
            }
        }
        None => (input.len(), input.len()),
    }
}

/// Column-aware cursor over one physical line.
#[derive(Clone, Copy, Debug)]
pub struct LineCursor<'a> {
    input: &'a [u8],
    /// Absolute offset of the first byte after the line content.
    pub end: usize,
    /// Absolute byte offset of the cursor.
    pub offset: usize,
    /// Column of the cursor, with tabs expanded.
    pub column: usize,
    /// The cursor sits inside a tab whose leading columns were consumed.
    pub partially_consumed_tab: bool,
    pub next_nonspace: usize,
    pub next_nonspace_column: usize,
    /// Columns between the cursor and the next non-space byte.
    pub indent: usize,
    /// Only whitespace remains.
    pub blank: bool,
}

impl<'a> LineCursor<'a> {
    pub fn new(input: &'a [u8], start: usize, end: usize) -> Self {
        let mut line = Self {
            input,
            end,
            offset: start,
            column: 0,
            partially_consumed_tab: false,
            next_nonspace: start,
            next_nonspace_column: 0,
            indent: 0,
            blank: true,
        };
        line.find_next_nonspace();
        line
    }

    /// Byte at an absolute offset, `None` past the line end.
    #[inline]
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        if pos < self.end { Some(self.input[pos]) } else { None }
    }

    /// Byte at the next non-space position.
    #[inline]
    pub fn peek_nonspace(&self) -> Option<u8> {
        self.byte_at(self.next_nonspace)
    }

    /// Bytes from the next non-space position to the end of the line.
    #[inline]
    pub fn rest_from_nonspace(&self) -> &'a [u8] {
        &self.input[self.next_nonspace.min(self.end)..self.end]
    }

    /// Bytes from the cursor to the end of the line.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.input[self.offset.min(self.end)..self.end]
    }

    pub fn find_next_nonspace(&mut self) {
        let mut i = self.offset;
        let mut cols = self.column;
        while i < self.end {
            match self.input[i] {
                b' ' => {
                    i += 1;
                    cols += 1;
                }
                b'\t' => {
                    i += 1;
                    cols += 4 - (cols % 4);
                }
                _ => break,
            }
        }
        self.blank = i >= self.end;
        self.next_nonspace = i;
        self.next_nonspace_column = cols;
        self.indent = cols - self.column;
    }

    /// Advance `count` bytes, or `count` columns when `columns` is set (a tab
    /// may then be consumed partially).
    pub fn advance_offset(&mut self, mut count: usize, columns: bool) {
        while count > 0 && self.offset < self.end {
            if self.input[self.offset] == b'\t' {
                let chars_to_tab = 4 - (self.column % 4);
                if columns {
                    self.partially_consumed_tab = chars_to_tab > count;
                    let chars_to_advance = chars_to_tab.min(count);
                    self.column += chars_to_advance;
                    if !self.partially_consumed_tab {
                        self.offset += 1;
                    }
                    count -= chars_to_advance;
                } else {
                    self.partially_consumed_tab = false;
                    self.column += chars_to_tab;
                    self.offset += 1;
                    count -= 1;
                }
            } else {
                self.partially_consumed_tab = false;
                self.offset += 1;
                self.column += 1;
                count -= 1;
            }
        }
        self.find_next_nonspace();
    }

    pub fn advance_next_nonspace(&mut self) {
        self.offset = self.next_nonspace;
        self.column = self.next_nonspace_column;
        self.partially_consumed_tab = false;
        self.find_next_nonspace();
    }

    /// Move back to a previously observed position.
    pub fn reset_to(&mut self, offset: usize, column: usize) {
        self.offset = offset;
        self.column = column;
        self.partially_consumed_tab = false;
        self.find_next_nonspace();
    }

    /// Virtual spaces still owed by a partially consumed tab.
    #[inline]
    pub fn pending_tab_columns(&self) -> usize {
        if self.partially_consumed_tab {
            4 - (self.column % 4)
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_bounds() {
        assert_eq!(line_bounds(b"ab\ncd", 0), (2, 3));
        assert_eq!(line_bounds(b"ab\r\ncd", 0), (2, 4));
        assert_eq!(line_bounds(b"ab\rcd", 0), (2, 3));
        assert_eq!(line_bounds(b"ab\ncd", 3), (5, 5));
    }

    #[test]
    fn test_line_cursor_indent_with_tab() {
        let input = b"  \tfoo";
        let line = LineCursor::new(input, 0, input.len());
        assert_eq!(line.indent, 4);
        assert_eq!(line.next_nonspace, 3);
        assert!(!line.blank);
    }

    #[test]
    fn test_line_cursor_partial_tab() {
        let input = b">\t\tfoo";
        let mut line = LineCursor::new(input, 0, input.len());
        line.advance_offset(1, false);
        // Block quote marker consumes one column of the following tab.
        line.advance_offset(1, true);
        assert!(line.partially_consumed_tab);
        assert_eq!(line.pending_tab_columns(), 2);
        assert_eq!(line.indent, 6);
    }

    #[test]
    fn test_line_cursor_blank() {
        let input = b"   \t";
        let line = LineCursor::new(input, 0, input.len());
        assert!(line.blank);
    }
}
