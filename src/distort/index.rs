use std::collections::HashMap;

use super::rules::ConfusionRule;

/// Confusion rules grouped by source string, for longest-match-first lookup.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    groups: HashMap<String, Vec<ConfusionRule>>,
    max_len: usize,
}

/// A successful lookup: the competing rules for the matched source and the
/// number of characters it covers.
#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    pub candidates: &'a [ConfusionRule],
    pub len: usize,
}

impl RuleIndex {
    /// Group rules by source, keeping declaration order within each group.
    pub fn build(rules: &[ConfusionRule]) -> Self {
        let mut groups: HashMap<String, Vec<ConfusionRule>> = HashMap::new();
        let mut max_len = 1;
        for rule in rules {
            max_len = max_len.max(rule.source_len());
            groups.entry(rule.source.clone()).or_default().push(rule.clone());
        }
        Self { groups, max_len }
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Longest source length in characters (1 for an empty index).
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Try windows from `min(max_len, remaining)` down to 1 starting at
    /// `position`; the first window with candidates wins.
    pub fn lookup(&self, text: &[char], position: usize) -> Option<Match<'_>> {
        let remaining = text.len().saturating_sub(position);
        let mut window = self.max_len.min(remaining);
        let mut key = String::new();
        while window > 0 {
            key.clear();
            key.extend(&text[position..position + window]);
            if let Some(candidates) = self.groups.get(&key) {
                if !candidates.is_empty() {
                    return Some(Match { candidates, len: window });
                }
            }
            window -= 1;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distort::rules::load_rules;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn empty_index_matches_nothing() {
        let index = RuleIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.max_len(), 1);
        assert!(index.lookup(&chars("abc"), 0).is_none());
    }

    #[test]
    fn longest_match_wins() {
        let rules = load_rules(&[("r", "n", 0.5), ("rn", "m", 1.0)]).unwrap();
        let index = RuleIndex::build(&rules);
        assert_eq!(index.max_len(), 2);

        let text = chars("rnr");
        let m = index.lookup(&text, 0).unwrap();
        assert_eq!(m.len, 2);
        assert_eq!(m.candidates[0].target, "m");

        // Only one character left: falls back to the single-char rule.
        let m = index.lookup(&text, 2).unwrap();
        assert_eq!(m.len, 1);
        assert_eq!(m.candidates[0].target, "n");
    }

    #[test]
    fn competing_targets_keep_declaration_order() {
        let rules = load_rules(&[("1", "l", 0.8), ("0", "O", 0.8), ("1", "I", 0.6)]).unwrap();
        let index = RuleIndex::build(&rules);
        let m = index.lookup(&chars("1"), 0).unwrap();
        let targets: Vec<&str> = m.candidates.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(targets, ["l", "I"]);
    }

    #[test]
    fn no_match_mid_text() {
        let rules = load_rules(&[("rn", "m", 1.0)]).unwrap();
        let index = RuleIndex::build(&rules);
        assert!(index.lookup(&chars("arb"), 1).is_none());
        assert!(index.lookup(&chars("ab"), 5).is_none());
    }

    #[test]
    fn multibyte_sources() {
        let rules = load_rules(&[("ר", "ד", 1.0)]).unwrap();
        let index = RuleIndex::build(&rules);
        let m = index.lookup(&chars("שרה"), 1).unwrap();
        assert_eq!(m.len, 1);
        assert_eq!(m.candidates[0].target, "ד");
    }
}
