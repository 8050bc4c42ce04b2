//! Compares two histories sharing a common prefix, splitting each into
//! the shared prefix and its divergent tail.

/// The result of comparing two histories: the longest shared prefix and
/// each side's divergent tail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Differences {
    pub common: Vec<String>,
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
}

/// Computes the common prefix and divergent tails of two histories.
pub struct Comparator;

impl Comparator {
    /// Compute `{common, primary, secondary}` for histories `a` and `b`:
    /// `common` is the longest line-equal prefix, `primary = a[common.len()..]`,
    /// `secondary = b[common.len()..]`.
    pub fn calculate_differences(a: &[String], b: &[String]) -> Differences {
        let mut shared = 0;
        while shared < a.len() && shared < b.len() && a[shared] == b[shared] {
            shared += 1;
        }

        return Differences {
            common: a[..shared].to_vec(),
            primary: a[shared..].to_vec(),
            secondary: b[shared..].to_vec(),
        };
    }

    /// Whether the two histories diverge at all past their common prefix.
    pub fn archives_differ(diff: &Differences) -> bool {
        return !diff.primary.is_empty() || !diff.secondary.is_empty();
    }
}
