//! Strongly-typed identifiers and the [`EntityRange`] type.

use std::fmt;
use std::ops::Range;

/// Identifies a time-integration cluster within a scheduler.
///
/// Clusters are registered with the cluster set and assigned sequential
/// IDs. `ClusterId(n)` is the n-th cluster added.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(pub u32);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ClusterId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Index of a cooperating process in the distributed runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Rank(pub u32);

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Rank {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// A half-open range `[first, first + len)` of entity indices.
///
/// Clusters refer to the shared entity storage through ranges; the
/// storage itself is owned by the data layer. Ranges owned by the
/// members of one cluster set must be pairwise disjoint.
///
/// # Examples
///
/// ```
/// use cadence_core::EntityRange;
///
/// let a = EntityRange::new(0, 10);
/// let b = EntityRange::new(10, 5);
/// assert!(!a.overlaps(&b));
/// assert_eq!(b.end(), 15);
/// assert!(b.contains(12));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityRange {
    /// First entity index in the range.
    pub first: usize,
    /// Number of entities in the range.
    pub len: usize,
}

impl EntityRange {
    /// Create a range of `len` entities starting at `first`.
    pub const fn new(first: usize, len: usize) -> Self {
        Self { first, len }
    }

    /// One past the last entity index.
    pub const fn end(&self) -> usize {
        self.first + self.len
    }

    /// Whether the range covers zero entities.
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Whether `entity` lies inside the range.
    pub const fn contains(&self, entity: usize) -> bool {
        entity >= self.first && entity < self.end()
    }

    /// Whether the two ranges share at least one entity.
    ///
    /// Empty ranges never overlap anything.
    pub const fn overlaps(&self, other: &EntityRange) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.first < other.end()
            && other.first < self.end()
    }

    /// The range as a `std::ops::Range` of indices.
    pub const fn indices(&self) -> Range<usize> {
        self.first..self.end()
    }
}

impl fmt::Display for EntityRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.first, self.end())
    }
}

impl From<Range<usize>> for EntityRange {
    fn from(r: Range<usize>) -> Self {
        Self {
            first: r.start,
            len: r.end.saturating_sub(r.start),
        }
    }
}
