//! Produces a merged history from two divergent histories sharing a
//! common prefix, stripping destructive commands from both tails when
//! both sides diverged.

use crate::archive::Archive;
use crate::command::CommandCodec;
use crate::comparator::{Comparator, Differences};
use crate::config::Config;
use crate::error::Error;

/// Merges divergent histories into a single replayable history.
pub struct Merger;

impl Merger {
    /// Given the comparator output for a local ("primary") and remote
    /// ("secondary") history, build the merged history: if both tails are
    /// non-empty, destructive commands are stripped from both before
    /// recombining as `common ++ secondary_kept ++ primary_kept` — remote
    /// changes are treated as older than the user's current local edits.
    pub fn merge_histories(diff: &Differences) -> Vec<String> {
        let both_diverged = !diff.primary.is_empty() && !diff.secondary.is_empty();

        let (primary_kept, secondary_kept) = if both_diverged {
            (Self::strip_destructive(&diff.primary), Self::strip_destructive(&diff.secondary))
        } else {
            (diff.primary.clone(), diff.secondary.clone())
        };

        let mut merged = diff.common.clone();
        merged.extend(secondary_kept);
        merged.extend(primary_kept);
        return merged;
    }

    fn strip_destructive(lines: &[String]) -> Vec<String> {
        return lines
            .iter()
            .filter(|line| match CommandCodec::decode(line) {
                Ok(cmd) => !cmd.is_destructive(),
                Err(_) => true,
            })
            .cloned()
            .collect();
    }

    /// Compare `local` and `remote`, merge, and replay into a fresh
    /// archive that should replace the caller's current local archive.
    pub fn merge(local: &Archive, remote: &[String], config: Config) -> Result<Archive, Error> {
        let diff = Comparator::calculate_differences(&local.history(), remote);
        let merged = Self::merge_histories(&diff);
        return Archive::create_from_history(merged, config);
    }
}
