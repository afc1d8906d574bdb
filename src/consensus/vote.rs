//! Majority voting over normalized observations
//!
//! Candidates are tallied by their trimmed lowercase form. The winner is the
//! form with the strictly highest count; ties go to whichever form was seen
//! first, and the first original spelling of that form is what gets returned.

use std::collections::HashMap;

use super::filter::normalize;

/// Outcome of a tally over one candidate list
#[derive(Debug, Clone, PartialEq)]
pub struct Tally {
    /// First-seen original spelling of the winning form
    pub winner: String,
    /// Occurrences of the winning form
    pub winner_count: u64,
    /// Candidates considered
    pub total: u64,
    /// Number of distinct normalized forms
    pub distinct: usize,
}

impl Tally {
    /// `winner_count / total`
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.winner_count as f64 / self.total as f64
        }
    }
}

/// Tally candidates, returning `None` when there are none
pub fn tally<I, S>(candidates: I) -> Option<Tally>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    // normalized form -> (first-seen original, count, first-seen order)
    let mut counts: HashMap<String, (String, u64, usize)> = HashMap::new();
    let mut total = 0u64;

    for candidate in candidates {
        let original = candidate.as_ref();
        let order = counts.len();
        let entry = counts
            .entry(normalize(original))
            .or_insert_with(|| (original.trim().to_string(), 0, order));
        entry.1 += 1;
        total += 1;
    }

    let distinct = counts.len();
    let (winner, winner_count, _) = counts
        .into_values()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.2.cmp(&a.2)))?;

    Some(Tally {
        winner,
        winner_count,
        total,
        distinct,
    })
}
