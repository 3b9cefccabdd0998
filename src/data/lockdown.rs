//! Built-in lockdown-date hints.
//!
//! These are pre-filled suggestions only, always overridable by the caller.
//! An unknown region simply has no hint, which downstream code treats as
//! "no lockdown": the deliberate worst-case default.

use chrono::NaiveDate;

/// Known full-lockdown (or stay-at-home order) start dates, 2020.
const LOCKDOWN_HINTS: &[(&str, (i32, u32, u32))] = &[
    // Countries.
    ("China", (2020, 1, 23)),
    ("Italy", (2020, 3, 9)),
    ("Spain", (2020, 3, 14)),
    ("France", (2020, 3, 17)),
    ("Austria", (2020, 3, 16)),
    ("Belgium", (2020, 3, 18)),
    ("Germany", (2020, 3, 22)),
    ("United Kingdom", (2020, 3, 23)),
    ("India", (2020, 3, 24)),
    ("Vietnam", (2020, 4, 1)),
    // US states.
    ("California", (2020, 3, 19)),
    ("Illinois", (2020, 3, 21)),
    ("New Jersey", (2020, 3, 21)),
    ("New York", (2020, 3, 22)),
    ("Washington", (2020, 3, 23)),
    ("Michigan", (2020, 3, 24)),
];

/// Suggested lockdown date for a region, if we know one.
pub fn lockdown_hint(region: &str) -> Option<NaiveDate> {
    LOCKDOWN_HINTS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(region))
        .and_then(|&(_, (y, m, d))| NaiveDate::from_ymd_opt(y, m, d))
}
