//! Completion streaks for daily goals.

use chrono::{Days, NaiveDate};

/// Number of consecutive calendar days, ending at `today`, that have a
/// completion.
///
/// Days are walked newest first: the i-th newest completion must fall on
/// `today - i`, and the walk stops at the first mismatch. A goal not completed
/// today therefore has a streak of zero.
pub fn streak(completions: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u32 {
    let mut days: Vec<NaiveDate> = completions.into_iter().collect();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let mut streak = 0;

    for (offset, day) in days.into_iter().enumerate() {
        let expected = today.checked_sub_days(Days::new(offset as u64));

        if expected != Some(day) {
            break;
        }

        streak += 1;
    }

    streak
}

/// Whether any completion falls on `today`.
pub fn completed_today(completions: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> bool {
    completions.into_iter().any(|day| day == today)
}
