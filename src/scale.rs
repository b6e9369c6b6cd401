use serde::Serialize;

/// Value domain over finite values. Infinite and NaN inputs are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

impl Default for ValueRange {
    fn default() -> Self {
        Self {
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl ValueRange {
    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut range = Self::default();
        for v in values {
            range.include(v);
        }
        range
    }

    pub fn include(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if value < self.min {
            self.min = value;
        }
        if value > self.max {
            self.max = value;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min > self.max
    }

    /// `(min, max)`, or `(0, 0)` when nothing finite was seen
    pub fn bounds(&self) -> (f64, f64) {
        if self.is_empty() {
            (0.0, 0.0)
        } else {
            (self.min, self.max)
        }
    }
}

/// Union of several ranges (e.g. one per group).
pub fn merge_ranges<'a, I>(iter: I) -> ValueRange
where
    I: IntoIterator<Item = &'a ValueRange>,
{
    let mut global = ValueRange::default();
    for local in iter {
        if local.is_empty() {
            continue;
        }
        global.include(local.min);
        global.include(local.max);
    }
    global
}
