// SPDX-License-Identifier: MIT OR Apache-2.0

use std::cmp::Ordering;

use versions::Versioning;

/// compares two version strings.
/// returns Ordering::Less if v1 < v2 (update available).
pub fn compare(v1: &str, v2: &str) -> Ordering {
    match (Versioning::new(v1.trim()), Versioning::new(v2.trim())) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

/// returns true if `available` is strictly newer than `installed`.
pub fn is_update_available(installed: &str, available: &str) -> bool {
    compare(installed, available) == Ordering::Less
}
