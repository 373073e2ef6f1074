use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a cached selection result: the trade date plus the selector's
/// class name.
///
/// Parameter values are deliberately not part of the key. Two runs of the
/// same selector on the same date with different parameters collide, and the
/// cached entry wins; callers who change parameters must bypass the cache to
/// see the new output. Folding a parameter digest into the key would fix the
/// collision at the cost of invalidating every persisted entry, so the
/// narrow key is kept for now.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    // Field order matters: derived `Ord` sorts by date first, then name.
    pub trade_date: NaiveDate,
    pub selector: String,
}

impl CacheKey {
    pub fn new(trade_date: NaiveDate, selector: impl Into<String>) -> Self {
        Self {
            trade_date,
            selector: selector.into(),
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.trade_date, self.selector)
    }
}
