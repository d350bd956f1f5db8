//! Ordered threshold → value tables.
//!
//! Every stepped rule in the game (implant points by reputation, battle
//! base by age) is a [`TierTable`]: a list of `(from, value)` pairs sorted
//! by `from`. A lookup returns the value of the last tier whose `from` is
//! at or below the input. Inputs below the first tier clamp to the first
//! tier's value, so the lowest bracket also covers negative input.
//!
//! ```
//! use nightcity_logic::tiers::TierTable;
//!
//! let table = TierTable::from_pairs(&[(i32::MIN, 7), (20, 8), (30, 9)]).unwrap();
//! assert_eq!(table.lookup(-5), 7);
//! assert_eq!(table.lookup(19), 7);
//! assert_eq!(table.lookup(20), 8);
//! assert_eq!(table.lookup(1000), 9);
//! ```

use serde::{Deserialize, Serialize};

/// One step of a tier table: inputs `>= from` map to `value`
/// until the next tier starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub from: i32,
    pub value: i32,
}

/// Problem found while building a table.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TierError {
    #[error("tier table is empty")]
    Empty,
    #[error("tier starting at {from} is not above the previous tier at {previous}")]
    Unsorted { previous: i32, from: i32 },
}

/// Sorted, non-empty list of tiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Tier>", into = "Vec<Tier>")]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    pub fn new(tiers: Vec<Tier>) -> Result<Self, TierError> {
        if tiers.is_empty() {
            return Err(TierError::Empty);
        }
        for pair in tiers.windows(2) {
            if pair[1].from <= pair[0].from {
                return Err(TierError::Unsorted {
                    previous: pair[0].from,
                    from: pair[1].from,
                });
            }
        }
        Ok(Self { tiers })
    }

    pub fn from_pairs(pairs: &[(i32, i32)]) -> Result<Self, TierError> {
        Self::new(
            pairs
                .iter()
                .map(|&(from, value)| Tier { from, value })
                .collect(),
        )
    }

    /// Build from pairs already known to be sorted (built-in tables).
    pub(crate) fn from_sorted_pairs(pairs: &[(i32, i32)]) -> Self {
        debug_assert!(!pairs.is_empty());
        debug_assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0));
        Self {
            tiers: pairs
                .iter()
                .map(|&(from, value)| Tier { from, value })
                .collect(),
        }
    }

    /// Value for `input`.
    pub fn lookup(&self, input: i32) -> i32 {
        let idx = self.tiers.partition_point(|t| t.from <= input);
        // idx == 0 means the input is below the first tier: clamp to it.
        self.tiers[idx.saturating_sub(1)].value
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    /// Inputs at which the looked-up value changes (every `from` after the first).
    pub fn boundaries(&self) -> impl Iterator<Item = i32> + '_ {
        self.tiers.iter().skip(1).map(|t| t.from)
    }

    /// True when values never decrease as the input grows.
    pub fn is_non_decreasing(&self) -> bool {
        self.tiers.windows(2).all(|w| w[1].value >= w[0].value)
    }
}

impl TryFrom<Vec<Tier>> for TierTable {
    type Error = TierError;

    fn try_from(tiers: Vec<Tier>) -> Result<Self, Self::Error> {
        Self::new(tiers)
    }
}

impl From<TierTable> for Vec<Tier> {
    fn from(table: TierTable) -> Self {
        table.tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TierTable {
        TierTable::from_pairs(&[(i32::MIN, 0), (90, 1), (120, 2)]).unwrap()
    }

    #[test]
    fn lookup_half_open_brackets() {
        let t = table();
        assert_eq!(t.lookup(89), 0);
        assert_eq!(t.lookup(90), 1);
        assert_eq!(t.lookup(119), 1);
        assert_eq!(t.lookup(120), 2);
        assert_eq!(t.lookup(i32::MAX), 2);
    }

    #[test]
    fn below_first_tier_clamps() {
        let t = TierTable::from_pairs(&[(0, 13), (26, 15)]).unwrap();
        assert_eq!(t.lookup(-100), 13);
    }

    #[test]
    fn rejects_empty_table() {
        assert_eq!(TierTable::new(Vec::new()), Err(TierError::Empty));
    }

    #[test]
    fn rejects_unsorted_table() {
        let err = TierTable::from_pairs(&[(0, 1), (10, 2), (10, 3)]).unwrap_err();
        assert_eq!(
            err,
            TierError::Unsorted {
                previous: 10,
                from: 10
            }
        );
    }

    #[test]
    fn boundaries_skip_first_tier() {
        let b: Vec<i32> = table().boundaries().collect();
        assert_eq!(b, vec![90, 120]);
    }

    #[test]
    fn deserialize_validates_order() {
        let bad = r#"[{"from": 5, "value": 1}, {"from": 1, "value": 2}]"#;
        assert!(serde_json::from_str::<TierTable>(bad).is_err());
        let good = r#"[{"from": 1, "value": 1}, {"from": 5, "value": 2}]"#;
        let t: TierTable = serde_json::from_str(good).unwrap();
        assert_eq!(t.lookup(6), 2);
    }
}
