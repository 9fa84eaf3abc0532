//! Year-group planning.
//!
//! Pure partitioning of the configured calendar range into contiguous
//! year groups; no I/O and no failure modes.

/// One consolidation unit: a labelled range of calendar years.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct YearGroup {
    /// Range label, e.g. `1985-1989`.
    pub name: String,
    /// Member years, ascending and contiguous.
    pub years: Vec<i32>,
}

impl YearGroup {
    fn new(years: Vec<i32>) -> Self {
        // Callers guarantee a non-empty, ascending slice.
        let first = years.first().copied().unwrap_or_default();
        let last = years.last().copied().unwrap_or_default();
        Self {
            name: format!("{}-{}", first, last),
            years,
        }
    }

    /// Comma-separated member years, for log lines and error markers.
    pub fn years_label(&self) -> String {
        self.years
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Partition `[first_year, last_year]` into groups of `group_width` years.
///
/// Groups cover the whole range without gaps or overlaps; the final group
/// may be shorter than `group_width`. A width of 0 is treated as 1.
pub fn plan_groups(first_year: i32, last_year: i32, group_width: usize) -> Vec<YearGroup> {
    let width = group_width.max(1) as i32;
    let mut groups = Vec::new();

    let mut start = first_year;
    while start <= last_year {
        let end = (start + width - 1).min(last_year);
        groups.push(YearGroup::new((start..=end).collect()));
        start = end + 1;
    }

    groups
}
