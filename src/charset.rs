//! Immutable sets of code points stored as sorted disjoint intervals.
//!
//! A [`CharSet`] is the transition label of the automaton graph and the
//! primitive the elimination engine unions and compares. Every set carries
//! the `maximum` of its alphabet (inclusive upper bound); binary operations
//! between sets with different maxima are domain errors rather than silent
//! truncation.
//!
//! Normal form, maintained by every operation:
//! - ranges sorted by ascending `min`
//! - disjoint and non-adjacent (`r.max + 1 < next.min`)
//! - every range inside `[0, maximum]`

use std::cmp::Ordering;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::ConvertError;

/// Maximum Unicode code point, the usual `maximum` for Unicode alphabets.
pub const UNICODE_MAXIMUM: u32 = 0x10FFFF;

/// A closed interval `[min, max]` of code points.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharRange {
    pub min: u32,
    pub max: u32,
}

impl CharRange {
    /// A single-codepoint range.
    #[inline]
    pub fn single(c: u32) -> Self {
        Self { min: c, max: c }
    }

    #[inline]
    pub fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    #[inline]
    fn check(self, maximum: u32) -> Result<(), ConvertError> {
        if self.min > self.max || self.max > maximum {
            return Err(ConvertError::RangeOutOfBounds {
                min: self.min,
                max: self.max,
                maximum,
            });
        }
        Ok(())
    }
}

/// An immutable set of code points in `[0, maximum]`.
///
/// Range storage is shared (`Arc`), so cloning a set is cheap and the
/// interned empty/universal sets alias a single allocation.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CharSet {
    maximum: u32,
    ranges: Arc<[CharRange]>,
}

fn empty_ranges() -> Arc<[CharRange]> {
    static EMPTY: OnceLock<Arc<[CharRange]>> = OnceLock::new();
    EMPTY.get_or_init(|| Arc::from(Vec::new())).clone()
}

fn all_ranges(maximum: u32) -> Arc<[CharRange]> {
    static CACHE: OnceLock<Mutex<FxHashMap<u32, Arc<[CharRange]>>>> = OnceLock::new();
    let cache = CACHE.get_or_init(|| Mutex::new(FxHashMap::default()));
    cache
        .lock()
        .entry(maximum)
        .or_insert_with(|| Arc::from(vec![CharRange::new(0, maximum)]))
        .clone()
}

/// Fuse overlapping and adjacent ranges in a list sorted by `min`.
fn coalesce(sorted: SmallVec<[CharRange; 8]>) -> Vec<CharRange> {
    let mut out: Vec<CharRange> = Vec::with_capacity(sorted.len());
    for r in sorted {
        match out.last_mut() {
            // `last.max + 1 >= r.min` means touching or overlapping
            Some(last) if r.min <= last.max.saturating_add(1) => {
                if r.max > last.max {
                    last.max = r.max;
                }
            }
            _ => out.push(r),
        }
    }
    out
}

impl CharSet {
    /// The empty set over `[0, maximum]`. Interned.
    pub fn empty(maximum: u32) -> Self {
        Self {
            maximum,
            ranges: empty_ranges(),
        }
    }

    /// The universal set over `[0, maximum]`. Interned per `maximum`.
    pub fn all(maximum: u32) -> Self {
        Self {
            maximum,
            ranges: all_ranges(maximum),
        }
    }

    /// Build a set from arbitrary ranges, validating, sorting and fusing.
    pub fn from_ranges<I>(maximum: u32, ranges: I) -> Result<Self, ConvertError>
    where
        I: IntoIterator<Item = CharRange>,
    {
        let mut collected: SmallVec<[CharRange; 8]> = SmallVec::new();
        for r in ranges {
            r.check(maximum)?;
            collected.push(r);
        }
        collected.sort_unstable();
        Ok(Self {
            maximum,
            ranges: Arc::from(coalesce(collected)),
        })
    }

    /// A set holding exactly one code point.
    pub fn single(maximum: u32, c: u32) -> Result<Self, ConvertError> {
        Self::from_ranges(maximum, [CharRange::single(c)])
    }

    /// A set holding the given characters.
    pub fn from_chars<I>(maximum: u32, chars: I) -> Result<Self, ConvertError>
    where
        I: IntoIterator<Item = char>,
    {
        Self::from_ranges(maximum, chars.into_iter().map(|c| CharRange::single(c as u32)))
    }

    #[inline]
    pub fn maximum(&self) -> u32 {
        self.maximum
    }

    #[inline]
    pub fn ranges(&self) -> &[CharRange] {
        &self.ranges
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// True if the set covers all of `[0, maximum]`.
    pub fn is_all(&self) -> bool {
        self.ranges.len() == 1 && self.ranges[0].min == 0 && self.ranges[0].max == self.maximum
    }

    /// Number of code points in the set.
    pub fn len(&self) -> u64 {
        self.ranges
            .iter()
            .map(|r| u64::from(r.max - r.min) + 1)
            .sum()
    }

    #[inline]
    fn require_same_maximum(&self, other: &CharSet) -> Result<(), ConvertError> {
        if self.maximum != other.maximum {
            return Err(ConvertError::DomainMismatch {
                left: self.maximum,
                right: other.maximum,
            });
        }
        Ok(())
    }

    /// The complement within `[0, maximum]`.
    ///
    /// One linear sweep emitting the gap before each range and the trailing
    /// gap after the last one.
    pub fn negate(&self) -> CharSet {
        let mut out: Vec<CharRange> = Vec::with_capacity(self.ranges.len() + 1);
        let mut low = 0u32;
        for r in self.ranges.iter() {
            if r.min > low {
                out.push(CharRange::new(low, r.min - 1));
            }
            // r.max == maximum leaves no trailing gap
            match r.max.checked_add(1) {
                Some(next) => low = next,
                None => {
                    return CharSet {
                        maximum: self.maximum,
                        ranges: Arc::from(out),
                    }
                }
            }
        }
        if low <= self.maximum {
            out.push(CharRange::new(low, self.maximum));
        }
        CharSet {
            maximum: self.maximum,
            ranges: Arc::from(out),
        }
    }

    /// Union of two sets with equal `maximum`.
    ///
    /// Linear merge of the two sorted lists followed by the fuse pass.
    pub fn union(&self, other: &CharSet) -> Result<CharSet, ConvertError> {
        self.require_same_maximum(other)?;
        if other.is_empty() {
            return Ok(self.clone());
        }
        if self.is_empty() {
            return Ok(other.clone());
        }
        let mut merged: SmallVec<[CharRange; 8]> =
            SmallVec::with_capacity(self.ranges.len() + other.ranges.len());
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            if self.ranges[i].min <= other.ranges[j].min {
                merged.push(self.ranges[i]);
                i += 1;
            } else {
                merged.push(other.ranges[j]);
                j += 1;
            }
        }
        merged.extend_from_slice(&self.ranges[i..]);
        merged.extend_from_slice(&other.ranges[j..]);
        Ok(CharSet {
            maximum: self.maximum,
            ranges: Arc::from(coalesce(merged)),
        })
    }

    /// Union with foreign ranges (validated individually): collect, sort,
    /// fuse.
    pub fn union_ranges<I>(&self, ranges: I) -> Result<CharSet, ConvertError>
    where
        I: IntoIterator<Item = CharRange>,
    {
        let mut collected: SmallVec<[CharRange; 8]> = SmallVec::new();
        collected.extend_from_slice(&self.ranges);
        for r in ranges {
            r.check(self.maximum)?;
            collected.push(r);
        }
        collected.sort_unstable();
        Ok(CharSet {
            maximum: self.maximum,
            ranges: Arc::from(coalesce(collected)),
        })
    }

    /// Intersection, by two-pointer sweep over the sorted lists.
    pub fn intersect(&self, other: &CharSet) -> Result<CharSet, ConvertError> {
        self.require_same_maximum(other)?;
        let mut out: Vec<CharRange> = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let a = self.ranges[i];
            let b = other.ranges[j];
            let lo = a.min.max(b.min);
            let hi = a.max.min(b.max);
            if lo <= hi {
                out.push(CharRange::new(lo, hi));
            }
            if a.max < b.max {
                i += 1;
            } else {
                j += 1;
            }
        }
        Ok(CharSet {
            maximum: self.maximum,
            ranges: Arc::from(out),
        })
    }

    /// Set difference `self \ other`, by two-pointer sweep.
    pub fn without(&self, other: &CharSet) -> Result<CharSet, ConvertError> {
        self.require_same_maximum(other)?;
        let mut out: Vec<CharRange> = Vec::new();
        let mut j = 0;
        for &a in self.ranges.iter() {
            let mut head = a;
            loop {
                // skip subtrahend ranges entirely below the current head
                while j < other.ranges.len() && other.ranges[j].max < head.min {
                    j += 1;
                }
                match other.ranges.get(j) {
                    Some(&b) if b.min <= head.max => {
                        if b.min > head.min {
                            out.push(CharRange::new(head.min, b.min - 1));
                        }
                        if b.max < head.max {
                            head = CharRange::new(b.max + 1, head.max);
                        } else {
                            break;
                        }
                    }
                    _ => {
                        out.push(head);
                        break;
                    }
                }
            }
        }
        Ok(CharSet {
            maximum: self.maximum,
            ranges: Arc::from(out),
        })
    }

    /// Membership test, O(log n) over the range list.
    pub fn has(&self, c: u32) -> bool {
        self.ranges
            .binary_search_by(|r| {
                if c < r.min {
                    Ordering::Greater
                } else if c > r.max {
                    Ordering::Less
                } else {
                    Ordering::Equal
                }
            })
            .is_ok()
    }

    /// True if every code point of `other` is in `self`.
    ///
    /// Linear sweep; bails out as soon as an `other` range is not fully
    /// covered by a single range of `self`.
    pub fn is_superset_of(&self, other: &CharSet) -> Result<bool, ConvertError> {
        self.require_same_maximum(other)?;
        let mut i = 0;
        for &b in other.ranges.iter() {
            while i < self.ranges.len() && self.ranges[i].max < b.min {
                i += 1;
            }
            match self.ranges.get(i) {
                Some(&a) if a.min <= b.min && b.max <= a.max => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    pub fn is_subset_of(&self, other: &CharSet) -> Result<bool, ConvertError> {
        other.is_superset_of(self)
    }

    pub fn is_disjoint_with(&self, other: &CharSet) -> Result<bool, ConvertError> {
        Ok(self.common_character(other)?.is_none())
    }

    /// Some code point contained in both sets, if any. The witness is the
    /// lower bound of the first overlap found by the sweep.
    pub fn common_character(&self, other: &CharSet) -> Result<Option<u32>, ConvertError> {
        self.require_same_maximum(other)?;
        let (mut i, mut j) = (0, 0);
        while i < self.ranges.len() && j < other.ranges.len() {
            let a = self.ranges[i];
            let b = other.ranges[j];
            if a.min.max(b.min) <= a.max.min(b.max) {
                return Ok(Some(a.min.max(b.min)));
            }
            if a.max < b.max {
                i += 1;
            } else {
                j += 1;
            }
        }
        Ok(None)
    }

    /// Some code point of `self` inside `range`, if any. Binary search.
    pub fn common_character_in_range(&self, range: CharRange) -> Option<u32> {
        let idx = self
            .ranges
            .partition_point(|r| r.max < range.min);
        match self.ranges.get(idx) {
            Some(&r) if r.min <= range.max => Some(r.min.max(range.min)),
            _ => None,
        }
    }

    /// Comparison key used by the total order: the smallest member.
    fn first_member(&self) -> Option<u32> {
        self.ranges.first().map(|r| r.min)
    }
}

impl PartialOrd for CharSet {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CharSet {
    /// Total order: `maximum`, then empty before non-empty, then smallest
    /// member, then range count, then lexicographic on `(min, max)` pairs.
    fn cmp(&self, other: &Self) -> Ordering {
        self.maximum
            .cmp(&other.maximum)
            .then_with(|| match (self.first_member(), other.first_member()) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(&b),
            })
            .then_with(|| self.ranges.len().cmp(&other.ranges.len()))
            .then_with(|| self.ranges.iter().cmp(other.ranges.iter()))
    }
}

/// Ordering used by the graph builder to emit edges deterministically:
/// non-empty sets first, then lexicographically over the range lists by
/// `min`, then `max`, then list length.
pub(crate) fn builder_order(a: &CharSet, b: &CharSet) -> Ordering {
    a.is_empty()
        .cmp(&b.is_empty())
        .then_with(|| {
            for (ra, rb) in a.ranges().iter().zip(b.ranges().iter()) {
                let c = ra.min.cmp(&rb.min).then(ra.max.cmp(&rb.max));
                if c != Ordering::Equal {
                    return c;
                }
            }
            a.ranges().len().cmp(&b.ranges().len())
        })
}
