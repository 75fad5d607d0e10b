//! Closed item id intervals and disjoint interval sets.
//!
//! [`ItemIdRange`] is the closed interval `[lower, upper]` used both for a
//! namespace's allowed space and for resolved reservations. [`RangeSet`] is the
//! normalized union of such intervals: sorted, non-overlapping and
//! non-adjacent. Each member range is identified by its index, which stays
//! stable for the lifetime of the set and is what the allocation loop compares
//! when it checks whether it has returned to an exclusion block it already
//! visited.

use core::{fmt, ops::RangeInclusive};

/// A closed, non-empty interval of item ids.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemIdRange {
    lower: u64,
    upper: u64,
}

impl ItemIdRange {
    /// Creates `[lower, upper]`.
    ///
    /// # Panics
    /// Panics if `lower > upper`. Use [`Self::try_new`] for untrusted input.
    pub const fn new(lower: u64, upper: u64) -> Self {
        assert!(lower <= upper, "lower bound must not exceed upper bound");
        Self { lower, upper }
    }

    /// Creates `[lower, upper]`, or `None` if the interval would be empty.
    pub const fn try_new(lower: u64, upper: u64) -> Option<Self> {
        if lower <= upper {
            Some(Self { lower, upper })
        } else {
            None
        }
    }

    pub const fn lower(&self) -> u64 {
        self.lower
    }

    pub const fn upper(&self) -> u64 {
        self.upper
    }

    pub const fn contains(&self, value: u64) -> bool {
        self.lower <= value && value <= self.upper
    }

    /// Returns `value` if it lies in this range, otherwise the lower bound.
    pub const fn snap_to_lower(&self, value: u64) -> u64 {
        if self.contains(value) {
            value
        } else {
            self.lower
        }
    }

    /// Number of values in the range. Saturates for `[0, u64::MAX]`.
    pub const fn len(&self) -> u64 {
        (self.upper - self.lower).saturating_add(1)
    }

    /// Always `false`; a closed range holds at least one value.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// `true` if the two ranges overlap or touch end to end.
    const fn is_connected(&self, other: &Self) -> bool {
        self.lower <= other.upper.saturating_add(1) && other.lower <= self.upper.saturating_add(1)
    }
}

impl fmt::Display for ItemIdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.lower, self.upper)
    }
}

impl From<ItemIdRange> for RangeInclusive<u64> {
    fn from(range: ItemIdRange) -> Self {
        range.lower..=range.upper
    }
}

/// A normalized union of closed item id ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<ItemIdRange>,
}

impl RangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of disjoint ranges in the set.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The member range containing `value` together with its index.
    pub fn find(&self, value: u64) -> Option<(usize, ItemIdRange)> {
        let index = self.ranges.partition_point(|range| range.upper < value);
        self.ranges
            .get(index)
            .filter(|range| range.contains(value))
            .map(|&range| (index, range))
    }

    /// Index of the member range containing `value`, if any.
    pub fn index_of(&self, value: u64) -> Option<usize> {
        self.find(value).map(|(index, _)| index)
    }

    pub fn contains(&self, value: u64) -> bool {
        self.index_of(value).is_some()
    }

    /// The member range containing `value`, if any.
    pub fn range_containing(&self, value: u64) -> Option<ItemIdRange> {
        self.find(value).map(|(_, range)| range)
    }

    pub fn get(&self, index: usize) -> Option<ItemIdRange> {
        self.ranges.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = ItemIdRange> + '_ {
        self.ranges.iter().copied()
    }

    /// `true` if every value of `range` is covered by the set.
    pub fn encloses(&self, range: ItemIdRange) -> bool {
        self.range_containing(range.lower)
            .is_some_and(|member| member.upper >= range.upper)
    }
}

impl FromIterator<ItemIdRange> for RangeSet {
    fn from_iter<I: IntoIterator<Item = ItemIdRange>>(iter: I) -> Self {
        let mut sorted: Vec<ItemIdRange> = iter.into_iter().collect();
        sorted.sort_unstable();

        let mut ranges: Vec<ItemIdRange> = Vec::with_capacity(sorted.len());
        for range in sorted {
            match ranges.last_mut() {
                Some(last) if last.is_connected(&range) => {
                    last.upper = last.upper.max(range.upper);
                }
                _ => ranges.push(range),
            }
        }

        Self { ranges }
    }
}

impl fmt::Display for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, range) in self.ranges.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{range}")?;
        }
        f.write_str("}")
    }
}
