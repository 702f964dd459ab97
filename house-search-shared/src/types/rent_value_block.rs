//! Named value ranges ("buckets") for price and area filters.

use serde::Serialize;

/// A named `(min, max)` range selected by a bucket key.
///
/// A bound that is zero or negative leaves that side of the range open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RentValueBlock {
    pub key: &'static str,
    pub min: i32,
    pub max: i32,
}

impl RentValueBlock {
    /// The bucket that adds no filter at all.
    pub const ALL: RentValueBlock = RentValueBlock::new("*", -1, -1);

    pub const PRICE_BLOCKS: [RentValueBlock; 3] = [
        RentValueBlock::new("*-1000", -1, 1000),
        RentValueBlock::new("1000-3000", 1000, 3000),
        RentValueBlock::new("3000-*", 3000, -1),
    ];

    pub const AREA_BLOCKS: [RentValueBlock; 3] = [
        RentValueBlock::new("*-30", -1, 30),
        RentValueBlock::new("30-50", 30, 50),
        RentValueBlock::new("50-*", 50, -1),
    ];

    pub const fn new(key: &'static str, min: i32, max: i32) -> Self {
        Self { key, min, max }
    }

    /// Resolve a price bucket key. Unknown or missing keys resolve to [`Self::ALL`].
    pub fn match_price(key: Option<&str>) -> Self {
        Self::lookup(&Self::PRICE_BLOCKS, key)
    }

    /// Resolve an area bucket key. Unknown or missing keys resolve to [`Self::ALL`].
    pub fn match_area(key: Option<&str>) -> Self {
        Self::lookup(&Self::AREA_BLOCKS, key)
    }

    fn lookup(blocks: &[RentValueBlock], key: Option<&str>) -> Self {
        key.and_then(|k| blocks.iter().find(|b| b.key == k).copied())
            .unwrap_or(Self::ALL)
    }

    pub fn is_all(&self) -> bool {
        self.lower_bound().is_none() && self.upper_bound().is_none()
    }

    pub fn lower_bound(&self) -> Option<i32> {
        (self.min > 0).then_some(self.min)
    }

    pub fn upper_bound(&self) -> Option<i32> {
        (self.max > 0).then_some(self.max)
    }

    /// Whether a value passes this bucket's range filter. Both bounds are inclusive.
    pub fn contains(&self, value: i32) -> bool {
        self.lower_bound().map_or(true, |min| value >= min)
            && self.upper_bound().map_or(true, |max| value <= max)
    }
}
