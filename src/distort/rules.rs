use crate::error::LocaleError;

/// One OCR misreading possibility: `source` is read as `target`.
///
/// Several rules may share a source; the OCR engine picks among them with
/// probability proportional to `weight`. An empty target models deletion
/// (e.g. diacritic or vowel-point stripping).
#[derive(Debug, Clone, PartialEq)]
pub struct ConfusionRule {
    pub source: String,
    pub target: String,
    pub weight: f64,
}

impl ConfusionRule {
    /// Validated constructor. Empty sources and non-positive or non-finite
    /// weights are configuration errors.
    pub fn new(source: &str, target: &str, weight: f64) -> Result<Self, LocaleError> {
        let invalid = |reason: &str| LocaleError::InvalidRule {
            source_text: source.to_string(),
            target: target.to_string(),
            reason: reason.to_string(),
        };
        if source.is_empty() {
            return Err(invalid("source must not be empty"));
        }
        if !weight.is_finite() || weight <= 0.0 {
            return Err(invalid(&format!("weight must be positive, got {weight}")));
        }
        Ok(Self {
            source: source.to_string(),
            target: target.to_string(),
            weight,
        })
    }

    /// Length of the source in characters.
    pub fn source_len(&self) -> usize {
        self.source.chars().count()
    }
}

/// Validate a static `(source, target, weight)` table into rules.
pub fn load_rules(table: &[(&str, &str, f64)]) -> Result<Vec<ConfusionRule>, LocaleError> {
    table
        .iter()
        .map(|&(source, target, weight)| ConfusionRule::new(source, target, weight))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_empty_target() {
        let rule = ConfusionRule::new("\u{05B7}", "", 1.0).unwrap();
        assert!(rule.target.is_empty());
        assert_eq!(rule.source_len(), 1);
    }

    #[test]
    fn rejects_empty_source() {
        let err = ConfusionRule::new("", "x", 1.0).unwrap_err();
        assert!(err.to_string().contains("source must not be empty"));
    }

    #[test]
    fn rejects_non_positive_weight() {
        assert!(ConfusionRule::new("a", "b", 0.0).is_err());
        assert!(ConfusionRule::new("a", "b", -1.0).is_err());
        assert!(ConfusionRule::new("a", "b", f64::NAN).is_err());
    }

    #[test]
    fn load_rules_fails_on_first_bad_entry() {
        let table = [("rn", "m", 1.0), ("x", "y", 0.0)];
        assert!(matches!(
            load_rules(&table),
            Err(LocaleError::InvalidRule { .. })
        ));
        let ok = load_rules(&[("rn", "m", 1.0), ("r", "n", 0.5)]).unwrap();
        assert_eq!(ok.len(), 2);
    }

    #[test]
    fn multi_char_source_len_counts_chars() {
        let rule = ConfusionRule::new("ñn", "m", 1.0).unwrap();
        assert_eq!(rule.source_len(), 2);
    }
}
