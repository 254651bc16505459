use std::ops::Range;

/// An ordered set of indices that an evaluation targets.
///
/// Either a contiguous range or a borrowed slice of strictly increasing
/// indices. Masks are cheap to copy and never own their indices.
///
/// Unsafe code relies on every index occurring once and on
/// [`min_array_size`](Self::min_array_size) bounding all of them, so masks
/// can only be built through checked constructors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexMask<'a> {
    repr: MaskRepr<'a>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MaskRepr<'a> {
    Range { start: usize, len: usize },
    Indices(&'a [usize]),
}

impl Default for IndexMask<'_> {
    fn default() -> Self {
        IndexMask::from_len(0)
    }
}

impl<'a> IndexMask<'a> {
    pub fn from_range(range: Range<usize>) -> Self {
        Self {
            repr: MaskRepr::Range {
                start: range.start,
                len: range.end.saturating_sub(range.start),
            },
        }
    }
    pub fn from_len(len: usize) -> Self {
        Self::from_range(0..len)
    }

    /// Panics unless `indices` is strictly increasing.
    pub fn from_indices(indices: &'a [usize]) -> Self {
        match Self::try_from_indices(indices) {
            Some(mask) => mask,
            None => panic!("index mask indices must be strictly increasing"),
        }
    }

    /// Returns `None` unless `indices` is strictly increasing.
    pub fn try_from_indices(indices: &'a [usize]) -> Option<Self> {
        if !indices.windows(2).all(|w| w[0] < w[1]) {
            return None;
        }
        // SAFETY: checked above
        Some(unsafe { Self::from_indices_unchecked(indices) })
    }

    /// # Safety
    /// `indices` must be strictly increasing.
    pub unsafe fn from_indices_unchecked(indices: &'a [usize]) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        Self {
            repr: MaskRepr::Indices(indices),
        }
    }

    pub fn len(&self) -> usize {
        match self.repr {
            MaskRepr::Range { len, .. } => len,
            MaskRepr::Indices(indices) => indices.len(),
        }
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
    /// Smallest array length that covers every index in the mask.
    pub fn min_array_size(&self) -> usize {
        match self.repr {
            MaskRepr::Range { len: 0, .. } => 0,
            MaskRepr::Range { start, len } => start + len,
            MaskRepr::Indices(indices) => {
                indices.last().map(|last| last + 1).unwrap_or(0)
            }
        }
    }
    pub fn as_range(&self) -> Option<Range<usize>> {
        match self.repr {
            MaskRepr::Range { start, len } => Some(start..start + len),
            MaskRepr::Indices(_) => None,
        }
    }
    pub fn as_indices(&self) -> Option<&'a [usize]> {
        match self.repr {
            MaskRepr::Range { .. } => None,
            MaskRepr::Indices(indices) => Some(indices),
        }
    }
    pub fn get(&self, n: usize) -> usize {
        match self.repr {
            MaskRepr::Range { start, len } => {
                assert!(n < len, "index mask position out of bounds");
                start + n
            }
            MaskRepr::Indices(indices) => indices[n],
        }
    }
    pub fn contains(&self, index: usize) -> bool {
        match self.repr {
            MaskRepr::Range { start, len } => {
                index >= start && index < start + len
            }
            MaskRepr::Indices(indices) => indices.binary_search(&index).is_ok(),
        }
    }
    /// Whether the mask is exactly `0..len`.
    pub fn covers_prefix(&self, len: usize) -> bool {
        // with strictly increasing indices this leaves no gaps
        self.len() == len && self.min_array_size() == len
    }
    pub fn iter(&self) -> IndexMaskIter<'a> {
        match self.repr {
            MaskRepr::Range { start, len } => {
                IndexMaskIter::Range(start..start + len)
            }
            MaskRepr::Indices(indices) => {
                IndexMaskIter::Indices(indices.iter())
            }
        }
    }
}

impl<'a> IntoIterator for IndexMask<'a> {
    type Item = usize;
    type IntoIter = IndexMaskIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> From<&'a [usize]> for IndexMask<'a> {
    fn from(indices: &'a [usize]) -> Self {
        IndexMask::from_indices(indices)
    }
}

impl From<Range<usize>> for IndexMask<'_> {
    fn from(range: Range<usize>) -> Self {
        IndexMask::from_range(range)
    }
}

#[derive(Clone)]
pub enum IndexMaskIter<'a> {
    Range(Range<usize>),
    Indices(std::slice::Iter<'a, usize>),
}

impl Iterator for IndexMaskIter<'_> {
    type Item = usize;

    #[inline]
    fn next(&mut self) -> Option<usize> {
        match self {
            IndexMaskIter::Range(range) => range.next(),
            IndexMaskIter::Indices(iter) => iter.next().copied(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            IndexMaskIter::Range(range) => range.size_hint(),
            IndexMaskIter::Indices(iter) => iter.size_hint(),
        }
    }
}

impl ExactSizeIterator for IndexMaskIter<'_> {}
