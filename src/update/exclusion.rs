// src/update/exclusion.rs

use std::fmt;

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::errors::{RepairKitError, Result};

/// Immutable set of package ids to skip during one update run.
///
/// Each entry is a case-insensitive glob matched against the *whole*
/// package id, so an entry without glob metacharacters is an exact match:
///
/// - `"Discord.Discord"` excludes only `Discord.Discord`.
/// - `"Mozilla.*"` excludes `Mozilla.Firefox` and `Mozilla.Thunderbird`.
/// - `"Firefox"` does **not** exclude `Mozilla.Firefox`.
#[derive(Clone)]
pub struct ExclusionSet {
    patterns: Vec<String>,
    set: GlobSet,
}

impl fmt::Debug for ExclusionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusionSet")
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::empty()
    }
}

/// Package ids split by an [`ExclusionSet`], each side in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub excluded: Vec<String>,
    pub remaining: Vec<String>,
}

impl ExclusionSet {
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();

        for pat in patterns {
            let pat = pat.as_ref().trim();
            if pat.is_empty() {
                continue;
            }
            let glob = GlobBuilder::new(pat)
                .case_insensitive(true)
                .build()
                .map_err(|e| {
                    RepairKitError::InvalidPattern(format!("exclusion '{pat}': {e}"))
                })?;
            builder.add(glob);
            kept.push(pat.to_string());
        }

        let set = builder
            .build()
            .map_err(|e| RepairKitError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            patterns: kept,
            set,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_excluded(&self, id: &str) -> bool {
        !self.is_empty() && self.set.is_match(id.trim())
    }

    pub fn partition(&self, ids: &[String]) -> Partition {
        let (excluded, remaining) = ids.iter().cloned().partition(|id| self.is_excluded(id));
        Partition {
            excluded,
            remaining,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn plain_entries_match_exactly_ignoring_case() {
        let set = ExclusionSet::new(["Discord.Discord"]).unwrap();
        assert!(set.is_excluded("Discord.Discord"));
        assert!(set.is_excluded("discord.discord"));
        assert!(!set.is_excluded("Discord.Discord.Canary"));
        assert!(!set.is_excluded("Discord"));
    }

    #[test]
    fn globs_match_whole_ids() {
        let set = ExclusionSet::new(["Mozilla.*", "Firefox"]).unwrap();
        assert!(set.is_excluded("Mozilla.Firefox"));
        assert!(!set.is_excluded("Firefox.Nightly"));
        assert!(set.is_excluded("Firefox"));
    }

    #[test]
    fn blank_entries_are_ignored() {
        let set = ExclusionSet::new(["", "   "]).unwrap();
        assert!(set.is_empty());
        assert!(!set.is_excluded(""));
    }

    #[test]
    fn partition_keeps_order() {
        let set = ExclusionSet::new(["B"]).unwrap();
        let p = set.partition(&ids(&["A", "B", "C"]));
        assert_eq!(p.excluded, ids(&["B"]));
        assert_eq!(p.remaining, ids(&["A", "C"]));
    }

    #[test]
    fn invalid_glob_is_rejected() {
        let err = ExclusionSet::new(["Foo[".to_string()]);
        assert!(matches!(err, Err(RepairKitError::InvalidPattern(_))));
    }
}
