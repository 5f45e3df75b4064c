//! Priority tiers for queued work and worker threads.
//!
//! The same five-step ladder is used in two places: to order entries in the
//! work queue (higher tier dequeued first) and as the bookkeeping value for a
//! worker thread's OS-level scheduling priority.

use std::fmt;

/// A closed, totally ordered set of five scheduling classes.
///
/// Tiers map to indices `0..=4`; a numerically higher index always wins.
/// `Ord` follows the discriminant, so `Priority::Highest > Priority::Lowest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Priority {
    /// Lowest scheduling class.
    Lowest = 0,
    /// Below the default class.
    BelowNormal = 1,
    /// Default class for submitted work and new workers.
    Normal = 2,
    /// Above the default class.
    AboveNormal = 3,
    /// Highest scheduling class.
    Highest = 4,
}

/// All tiers in ascending order. Index `i` holds the tier with index `i`.
pub const ALL_TIERS: [Priority; 5] = [
    Priority::Lowest,
    Priority::BelowNormal,
    Priority::Normal,
    Priority::AboveNormal,
    Priority::Highest,
];

impl Priority {
    /// Numeric index of this tier (0 = Lowest .. 4 = Highest).
    pub fn as_index(self) -> u8 {
        self as u8
    }

    /// Tier for a numeric index, saturating at `Highest` for out-of-range
    /// values.
    pub fn from_index(index: u8) -> Self {
        match index {
            0 => Priority::Lowest,
            1 => Priority::BelowNormal,
            2 => Priority::Normal,
            3 => Priority::AboveNormal,
            _ => Priority::Highest,
        }
    }

    /// One step up the ladder, saturating at `Highest`.
    pub fn promote(self) -> Self {
        Self::from_index(self.as_index().saturating_add(1))
    }

    /// One step down the ladder, saturating at `Lowest`.
    pub fn demote(self) -> Self {
        Self::from_index(self.as_index().saturating_sub(1))
    }

    /// Unix nice value for this tier. Lower nice means more CPU share.
    /// Promotion past `Normal` needs privileges on most systems; callers
    /// treat application as best-effort.
    pub fn nice_value(self) -> i32 {
        match self {
            Priority::Lowest => 10,
            Priority::BelowNormal => 5,
            Priority::Normal => 0,
            Priority::AboveNormal => -5,
            Priority::Highest => -10,
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Normal
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::Lowest => "lowest",
            Priority::BelowNormal => "below-normal",
            Priority::Normal => "normal",
            Priority::AboveNormal => "above-normal",
            Priority::Highest => "highest",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(Priority::Highest > Priority::AboveNormal);
        assert!(Priority::AboveNormal > Priority::Normal);
        assert!(Priority::Normal > Priority::BelowNormal);
        assert!(Priority::BelowNormal > Priority::Lowest);
    }

    #[test]
    fn test_index_round_trip() {
        for tier in ALL_TIERS {
            assert_eq!(Priority::from_index(tier.as_index()), tier);
        }
        // Out-of-range indices saturate at the top.
        assert_eq!(Priority::from_index(200), Priority::Highest);
    }

    #[test]
    fn test_promote_demote_saturate() {
        assert_eq!(Priority::Lowest.promote(), Priority::BelowNormal);
        assert_eq!(Priority::Highest.promote(), Priority::Highest);
        assert_eq!(Priority::Normal.demote(), Priority::BelowNormal);
        assert_eq!(Priority::Lowest.demote(), Priority::Lowest);
    }

    #[test]
    fn test_nice_values_are_monotonic() {
        let mut prev = i32::MAX;
        for tier in ALL_TIERS {
            assert!(tier.nice_value() < prev);
            prev = tier.nice_value();
        }
    }
}
