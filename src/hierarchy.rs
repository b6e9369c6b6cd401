//! Nested axis headers built from flattened leaf label paths.
//!
//! The builder never re-sorts: callers hand it leaves whose shared prefixes
//! are already contiguous (see `coerce::compare_key_paths`).

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;
use tracing::warn;

/// Key carried by synthetic total leaves. Regular leaf keys are JSON-encoded
/// paths and always start with `[`, so they can never collide with it.
pub const TOTAL_KEY: &str = "__total__";

/// A contiguous run of leaves sharing one label prefix at a level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub level: usize,
    pub start_leaf_index: usize,
    /// Inclusive
    pub end_leaf_index: usize,
    pub label: String,
    pub key: String,
}

impl Span {
    pub fn len(&self) -> usize {
        self.end_leaf_index - self.start_leaf_index + 1
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisHierarchy {
    pub depth: usize,
    pub leaf_keys: Vec<String>,
    pub leaf_paths: Vec<Vec<String>>,
    pub spans_by_level: Vec<Vec<Span>>,
    pub key_to_path: IndexMap<String, Vec<String>>,
}

/// Where a synthetic total leaf is spliced in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Leading,
    Trailing,
}

/// Structurally collision-free key for a label path.
pub fn encode_path<S: AsRef<str>>(path: &[S]) -> String {
    let parts: Vec<&str> = path.iter().map(|p| p.as_ref()).collect();
    serde_json::to_string(&parts).unwrap_or_default()
}

fn label_at(path: &[String], level: usize) -> &str {
    path.get(level).map(|s| s.as_str()).unwrap_or("")
}

fn prefix_of(path: &[String], level: usize) -> Vec<&str> {
    (0..=level).map(|l| label_at(path, l)).collect()
}

/// Build spans for every level from parallel leaf keys and paths.
///
/// Leaves shorter than the hierarchy depth carry an empty label on the
/// levels they lack, so every level still partitions all leaves.
pub fn build_axis_hierarchy(leaf_keys: Vec<String>, leaf_paths: Vec<Vec<String>>) -> AxisHierarchy {
    let mut leaf_keys = leaf_keys;
    let mut leaf_paths = leaf_paths;
    if leaf_keys.len() != leaf_paths.len() {
        warn!(
            keys = leaf_keys.len(),
            paths = leaf_paths.len(),
            "axis leaf keys and paths differ in length, truncating"
        );
        let n = leaf_keys.len().min(leaf_paths.len());
        leaf_keys.truncate(n);
        leaf_paths.truncate(n);
    }

    let depth = leaf_paths.iter().map(|p| p.len()).max().unwrap_or(0);
    let mut spans_by_level = Vec::with_capacity(depth);
    let mut contiguous = true;

    for level in 0..depth {
        let mut spans: Vec<Span> = Vec::new();
        let mut seen: HashSet<Vec<&str>> = HashSet::new();
        let mut running: Option<(Vec<&str>, bool)> = None;

        for (idx, path) in leaf_paths.iter().enumerate() {
            let prefix = prefix_of(path, level);
            // the total leaf always gets its own span, whatever its label
            let is_total = leaf_keys[idx] == TOTAL_KEY;
            let continues = running
                .as_ref()
                .is_some_and(|(prev, prev_total)| *prev == prefix && !prev_total && !is_total);
            if continues {
                if let Some(span) = spans.last_mut() {
                    span.end_leaf_index = idx;
                }
                continue;
            }
            if !is_total && !seen.insert(prefix.clone()) {
                contiguous = false;
            }
            spans.push(Span {
                level,
                start_leaf_index: idx,
                end_leaf_index: idx,
                label: label_at(path, level).to_string(),
                key: if is_total { TOTAL_KEY.to_string() } else { encode_path(&prefix) },
            });
            running = Some((prefix, is_total));
        }
        spans_by_level.push(spans);
    }

    if !contiguous {
        warn!("axis leaves are not grouped by prefix; repeated header spans emitted");
    }

    let key_to_path = leaf_keys
        .iter()
        .cloned()
        .zip(leaf_paths.iter().cloned())
        .collect();

    AxisHierarchy {
        depth,
        leaf_keys,
        leaf_paths,
        spans_by_level,
        key_to_path,
    }
}

impl AxisHierarchy {
    pub fn leaf_count(&self) -> usize {
        self.leaf_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.leaf_keys.is_empty()
    }

    pub fn leaf_index(&self, key: &str) -> Option<usize> {
        self.leaf_keys.iter().position(|k| k == key)
    }

    pub fn spans_at(&self, level: usize) -> &[Span] {
        self.spans_by_level.get(level).map(|s| s.as_slice()).unwrap_or(&[])
    }

    pub fn has_total(&self) -> bool {
        self.key_to_path.contains_key(TOTAL_KEY)
    }

    /// Rebuild with a synthetic total leaf at one edge. The total's path
    /// repeats `label` on every level so it spans the full header height.
    pub fn with_total_leaf(&self, label: &str, edge: Edge) -> AxisHierarchy {
        let total_path = vec![label.to_string(); self.depth.max(1)];
        let mut keys = self.leaf_keys.clone();
        let mut paths = self.leaf_paths.clone();
        match edge {
            Edge::Leading => {
                keys.insert(0, TOTAL_KEY.to_string());
                paths.insert(0, total_path);
            }
            Edge::Trailing => {
                keys.push(TOTAL_KEY.to_string());
                paths.push(total_path);
            }
        }
        build_axis_hierarchy(keys, paths)
    }
}
