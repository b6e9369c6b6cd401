//! Collapses duplicate contributions that land on the same chart cell.
//!
//! Highlight values model a cross-filtered subset of a row, so a highlighted
//! contribution replaces the base value instead of adding to it.

use indexmap::IndexMap;
use std::hash::Hash;

/// `(group, series, x)` key used by the categorical transformers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CompositeKey {
    pub group: String,
    pub series: String,
    pub x: String,
}

impl CompositeKey {
    pub fn new(group: impl Into<String>, series: impl Into<String>, x: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            series: series.into(),
            x: x.into(),
        }
    }
}

/// One row's effective contribution after applying its highlight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    pub value: f64,
    pub highlighted: bool,
}

/// A zero highlight against a non-zero base means "not part of the selection"
/// rather than "selected, and the selected share is zero".
pub fn is_zero_suppressed(base: Option<f64>, highlight: Option<f64>) -> bool {
    matches!(
        (base, highlight),
        (Some(b), Some(h)) if h == 0.0 && b.is_finite() && b != 0.0
    )
}

/// Resolve a row's value: a finite highlight overrides the base, otherwise the
/// base is used. Neither finite yields NaN.
pub fn resolve_contribution(base: Option<f64>, highlight: Option<f64>) -> Contribution {
    let highlight = highlight.filter(|h| h.is_finite());
    match highlight {
        Some(h) if !is_zero_suppressed(base, Some(h)) => Contribution { value: h, highlighted: true },
        _ => Contribution {
            value: base.filter(|b| b.is_finite()).unwrap_or(f64::NAN),
            highlighted: false,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accumulated {
    pub value: f64,
    pub highlighted: bool,
    pub contributions: usize,
}

/// Insertion-ordered accumulator keyed by any hashable composite key.
#[derive(Debug, Clone)]
pub struct Accumulator<K> {
    entries: IndexMap<K, Accumulated>,
}

impl<K> Default for Accumulator<K> {
    fn default() -> Self {
        Self { entries: IndexMap::new() }
    }
}

impl<K: Hash + Eq> Accumulator<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one row's `(base, highlight)` under `key`.
    pub fn add(&mut self, key: K, base: Option<f64>, highlight: Option<f64>) {
        let incoming = resolve_contribution(base, highlight);
        match self.entries.get_mut(&key) {
            None => {
                self.entries.insert(
                    key,
                    Accumulated {
                        value: incoming.value,
                        highlighted: incoming.highlighted,
                        contributions: 1,
                    },
                );
            }
            Some(entry) => {
                entry.contributions += 1;
                if incoming.highlighted && !entry.highlighted {
                    entry.value = incoming.value;
                    entry.highlighted = true;
                } else if incoming.highlighted == entry.highlighted {
                    entry.value = merge_values(entry.value, incoming.value);
                }
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&Accumulated> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &Accumulated)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (K, Accumulated)> {
        self.entries.into_iter()
    }
}

fn merge_values(current: f64, incoming: f64) -> f64 {
    match (current.is_finite(), incoming.is_finite()) {
        (true, true) => current + incoming,
        (false, true) => incoming,
        _ => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(x: &str) -> CompositeKey {
        CompositeKey::new("All", "Sales", x)
    }

    #[test]
    fn test_highlight_overrides_base() {
        let c = resolve_contribution(Some(10.0), Some(4.0));
        assert_eq!(c, Contribution { value: 4.0, highlighted: true });
    }

    #[test]
    fn test_zero_highlight_suppressed() {
        assert!(is_zero_suppressed(Some(10.0), Some(0.0)));
        assert!(!is_zero_suppressed(Some(0.0), Some(0.0)));
        assert!(!is_zero_suppressed(None, Some(0.0)));

        let c = resolve_contribution(Some(10.0), Some(0.0));
        assert_eq!(c, Contribution { value: 10.0, highlighted: false });

        let c = resolve_contribution(Some(0.0), Some(0.0));
        assert_eq!(c, Contribution { value: 0.0, highlighted: true });
    }

    #[test]
    fn test_missing_both_is_nan() {
        let c = resolve_contribution(None, None);
        assert!(c.value.is_nan());
        assert!(!c.highlighted);
        assert!(resolve_contribution(Some(f64::INFINITY), None).value.is_nan());
    }

    #[test]
    fn test_duplicate_base_values_sum() {
        let mut acc = Accumulator::new();
        acc.add(key("Jan"), Some(2.0), None);
        acc.add(key("Jan"), Some(3.0), None);
        let entry = acc.get(&key("Jan")).unwrap();
        assert_eq!(entry.value, 5.0);
        assert_eq!(entry.contributions, 2);
        assert_eq!(acc.len(), 1);
    }

    #[test]
    fn test_highlighted_contribution_wins() {
        let mut acc = Accumulator::new();
        acc.add(key("Jan"), Some(10.0), None);
        acc.add(key("Jan"), Some(20.0), Some(7.0));
        assert_eq!(acc.get(&key("Jan")).unwrap().value, 7.0);

        // order does not matter
        let mut acc = Accumulator::new();
        acc.add(key("Jan"), Some(20.0), Some(7.0));
        acc.add(key("Jan"), Some(10.0), None);
        let entry = acc.get(&key("Jan")).unwrap();
        assert_eq!(entry.value, 7.0);
        assert!(entry.highlighted);
    }

    #[test]
    fn test_multi_row_highlights() {
        let mut acc = Accumulator::new();
        acc.add(key("Jan"), Some(10.0), Some(1.0));
        acc.add(key("Jan"), Some(10.0), Some(2.0));
        acc.add(key("Feb"), Some(5.0), None);
        acc.add(key("Feb"), Some(6.0), None);
        assert_eq!(acc.get(&key("Jan")).unwrap().value, 3.0);
        assert_eq!(acc.get(&key("Feb")).unwrap().value, 11.0);
    }

    #[test]
    fn test_nan_filled_not_resummed() {
        let mut acc = Accumulator::new();
        acc.add(key("Jan"), None, None);
        assert!(acc.get(&key("Jan")).unwrap().value.is_nan());
        acc.add(key("Jan"), Some(4.0), None);
        assert_eq!(acc.get(&key("Jan")).unwrap().value, 4.0);
        acc.add(key("Jan"), None, None);
        assert_eq!(acc.get(&key("Jan")).unwrap().value, 4.0);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut acc = Accumulator::new();
        for x in ["c", "a", "b", "a"] {
            acc.add(key(x), Some(1.0), None);
        }
        let order: Vec<String> = acc.iter().map(|(k, _)| k.x.clone()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }
}
