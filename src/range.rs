//! Compact range representation for zero-copy text references.
//!
//! Offsets are `u32`, so a single inline buffer or document is limited to 4GB.

/// Half-open byte range into a buffer.
///
/// # Example
/// ```
/// use wikimark::Range;
///
/// let text = "Hello, World!";
/// let range = Range::new(7, 12);
/// assert_eq!(range.slice_str(text), Some("World"));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Hash)]
pub struct Range {
    pub start: u32,
    pub end: u32,
}

const _: () = assert!(std::mem::size_of::<Range>() == 8);

impl Range {
    /// Create a new range.
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create a range from usize values.
    #[inline]
    pub fn from_usize(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        debug_assert!(end <= u32::MAX as usize);
        Self {
            start: start as u32,
            end: end as u32,
        }
    }

    /// Create an empty range at a position.
    #[inline]
    pub const fn empty_at(pos: u32) -> Self {
        Self { start: pos, end: pos }
    }

    /// Byte slice this range refers to.
    #[inline]
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        &input[self.start as usize..self.end as usize]
    }

    /// String slice this range refers to, `None` when out of bounds or not on
    /// a char boundary.
    #[inline]
    pub fn slice_str<'a>(&self, input: &'a str) -> Option<&'a str> {
        input.get(self.start as usize..self.end as usize)
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end - self.start
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    #[inline]
    pub const fn start_usize(&self) -> usize {
        self.start as usize
    }

    #[inline]
    pub const fn end_usize(&self) -> usize {
        self.end as usize
    }

    /// Check if this range contains a position.
    #[inline]
    pub const fn contains(&self, pos: u32) -> bool {
        pos >= self.start && pos < self.end
    }
}

impl From<std::ops::Range<usize>> for Range {
    #[inline]
    fn from(r: std::ops::Range<usize>) -> Self {
        Self::from_usize(r.start, r.end)
    }
}

impl From<Range> for std::ops::Range<usize> {
    #[inline]
    fn from(r: Range) -> Self {
        r.start_usize()..r.end_usize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_size() {
        assert_eq!(std::mem::size_of::<Range>(), 8);
    }

    #[test]
    fn test_range_empty() {
        let r = Range::empty_at(5);
        assert_eq!(r.len(), 0);
        assert!(r.is_empty());
    }

    #[test]
    fn test_slice_str_rejects_split_char() {
        let text = "é!";
        assert_eq!(Range::new(0, 2).slice_str(text), Some("é"));
        assert_eq!(Range::new(1, 3).slice_str(text), None);
        assert_eq!(Range::new(0, 10).slice_str(text), None);
    }

    #[test]
    fn test_range_contains() {
        let r = Range::new(10, 20);
        assert!(!r.contains(9));
        assert!(r.contains(10));
        assert!(!r.contains(20));
    }

    #[test]
    fn test_range_conversions() {
        let r: Range = (10usize..20usize).into();
        assert_eq!(r, Range::new(10, 20));
        let std_range: std::ops::Range<usize> = r.into();
        assert_eq!(std_range, 10..20);
    }
}
