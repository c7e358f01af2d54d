use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Which end of the load order overrides the other for a shared key.
///
/// Files are loaded in descending lexicographic order of their names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriorityRule {
    /// The last file loaded (lexicographically smallest name) wins
    #[default]
    LastLoadedWins,

    /// The first file loaded (lexicographically greatest name) wins
    FirstLoadedWins,
}

impl PriorityRule {
    /// Compare two file names by priority; `Greater` means `a` overrides `b`
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            PriorityRule::LastLoadedWins => b.cmp(a),
            PriorityRule::FirstLoadedWins => a.cmp(b),
        }
    }
}

impl fmt::Display for PriorityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriorityRule::LastLoadedWins => f.write_str("last-loaded-wins"),
            PriorityRule::FirstLoadedWins => f.write_str("first-loaded-wins"),
        }
    }
}

/// Sort file names into load order (descending lexicographic)
pub fn load_order<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| b.as_ref().cmp(a.as_ref()));
}

/// Group indices of `names` into priority tiers, highest priority first.
///
/// Names that compare equal share a tier.
pub fn priority_tiers<S: AsRef<str>>(names: &[S], rule: PriorityRule) -> Vec<Vec<usize>> {
    let mut indices: Vec<usize> = (0..names.len()).collect();
    indices.sort_by(|&a, &b| rule.compare(names[b].as_ref(), names[a].as_ref()));

    let mut tiers: Vec<Vec<usize>> = Vec::new();
    for idx in indices {
        match tiers.last_mut() {
            Some(tier) if names[tier[0]].as_ref() == names[idx].as_ref() => tier.push(idx),
            _ => tiers.push(vec![idx]),
        }
    }
    tiers
}
