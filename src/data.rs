use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::io::Read;

// =============================================================================
// Cells
// =============================================================================

/// A raw cell as supplied by the host.
///
/// Native date instances travel as `{"$date": <epoch ms>}` so they can be told
/// apart from plain numbers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    Date(DateCell),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateCell {
    #[serde(rename = "$date")]
    pub ms: f64,
}

impl CellValue {
    pub fn text(s: impl Into<String>) -> Self {
        CellValue::Text(s.into())
    }

    pub fn date_ms(ms: f64) -> Self {
        CellValue::Date(DateCell { ms })
    }

    /// Null, or a string with nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the cell. Numeric strings count; dates and booleans do not.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

// =============================================================================
// Column metadata
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Host-declared value type flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueType {
    pub temporal: bool,
    pub numeric: bool,
    pub text: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ColumnMeta {
    pub display_name: String,
    pub query_name: Option<String>,
    pub roles: HashMap<String, bool>,
    pub format: Option<String>,
    pub is_measure: bool,
    #[serde(rename = "type")]
    pub value_type: Option<ValueType>,
    pub sort: Option<SortDirection>,
    pub group_name: Option<String>,
}

impl ColumnMeta {
    pub fn named(display_name: &str) -> Self {
        Self {
            display_name: display_name.to_string(),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.roles.insert(role.to_string(), true);
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.get(role).copied().unwrap_or(false)
    }

    pub fn is_temporal(&self) -> bool {
        self.value_type.as_ref().map(|t| t.temporal).unwrap_or(false)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewMetadata {
    pub columns: Vec<ColumnMeta>,
}

// =============================================================================
// Categorical view
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryColumn {
    pub source: ColumnMeta,
    pub values: Vec<CellValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueColumn {
    pub source: ColumnMeta,
    pub values: Vec<CellValue>,
    pub highlights: Option<Vec<CellValue>>,
}

impl ValueColumn {
    pub fn value_at(&self, row: usize) -> Option<f64> {
        self.values.get(row).and_then(CellValue::as_number)
    }

    /// `None` when the host sent no highlights or this row's highlight is null.
    pub fn highlight_at(&self, row: usize) -> Option<f64> {
        self.highlights
            .as_ref()
            .and_then(|h| h.get(row))
            .and_then(CellValue::as_number)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoricalView {
    pub categories: Vec<CategoryColumn>,
    pub values: Vec<ValueColumn>,
}

impl CategoricalView {
    pub fn row_count(&self) -> usize {
        let cats = self.categories.iter().map(|c| c.values.len());
        let vals = self.values.iter().map(|v| v.values.len());
        cats.chain(vals).max().unwrap_or(0)
    }

    pub fn category_value(&self, column: usize, row: usize) -> &CellValue {
        static NULL: CellValue = CellValue::Null;
        self.categories
            .get(column)
            .and_then(|c| c.values.get(row))
            .unwrap_or(&NULL)
    }

    pub fn category_sources(&self) -> Vec<&ColumnMeta> {
        self.categories.iter().map(|c| &c.source).collect()
    }

    pub fn value_sources(&self) -> Vec<&ColumnMeta> {
        self.values.iter().map(|v| &v.source).collect()
    }
}

// =============================================================================
// Matrix view
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LevelValue {
    pub value: CellValue,
    pub level_source_index: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixCell {
    pub value: CellValue,
    pub highlight: Option<CellValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatrixNode {
    pub level: Option<usize>,
    pub level_values: Vec<LevelValue>,
    pub is_subtotal: bool,
    pub children: Vec<MatrixNode>,
    pub values: BTreeMap<usize, MatrixCell>,
}

impl MatrixNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixLevel {
    pub sources: Vec<ColumnMeta>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatrixHierarchy {
    pub root: MatrixNode,
    pub levels: Vec<MatrixLevel>,
}

impl MatrixHierarchy {
    /// Source metadata for one level value of a node.
    pub fn source_of(&self, node: &MatrixNode, value: &LevelValue) -> Option<&ColumnMeta> {
        let level = node.level?;
        self.levels.get(level)?.sources.get(value.level_source_index)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatrixView {
    pub rows: MatrixHierarchy,
    pub columns: MatrixHierarchy,
    pub value_sources: Vec<ColumnMeta>,
}

// =============================================================================
// Data view
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataView {
    pub metadata: ViewMetadata,
    pub categorical: Option<CategoricalView>,
    pub matrix: Option<MatrixView>,
}

/// The recognized payload shapes. Anything else is `Empty`.
#[derive(Debug, Clone, Copy)]
pub enum ViewShape<'a> {
    Matrix(&'a MatrixView),
    Categorical(&'a CategoricalView),
    Empty,
}

impl DataView {
    /// Classify the payload, preferring the matrix mapping when both are usable.
    /// Transformers that only read categorical data use [`Self::categorical_shape`].
    pub fn shape(&self) -> ViewShape<'_> {
        if let Some(matrix) = self.matrix_shape() {
            return ViewShape::Matrix(matrix);
        }
        match self.categorical_shape() {
            Some(categorical) => ViewShape::Categorical(categorical),
            None => ViewShape::Empty,
        }
    }

    pub fn matrix_shape(&self) -> Option<&MatrixView> {
        self.matrix
            .as_ref()
            .filter(|m| !m.rows.root.children.is_empty() && !m.value_sources.is_empty())
    }

    pub fn categorical_shape(&self) -> Option<&CategoricalView> {
        self.categorical.as_ref().filter(|c| {
            let has_columns = !c.categories.is_empty() || !c.values.is_empty();
            has_columns && c.row_count() > 0
        })
    }

    /// Create a DataView from the host's JSON payload
    pub fn from_json(value: &Value) -> Result<Self> {
        if !value.is_object() {
            return Err(anyhow!("Data view must be a JSON object"));
        }
        serde_json::from_value(value.clone()).context("Malformed data view payload")
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input).context("Data view is not valid JSON")?;
        Self::from_json(&value)
    }

    /// Create a categorical DataView from CSV text.
    ///
    /// Columns whose non-empty cells all parse as numbers become value columns,
    /// the rest become category columns. No roles are attached.
    pub fn from_csv<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .context("Failed to read CSV headers")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for (line, record) in rdr.records().enumerate() {
            let record = record.with_context(|| format!("Failed to read CSV record {}", line + 1))?;
            for (idx, column) in columns.iter_mut().enumerate() {
                column.push(record.get(idx).unwrap_or("").to_string());
            }
        }

        let mut categorical = CategoricalView::default();
        for (header, raw) in headers.iter().zip(columns) {
            let non_empty: Vec<&String> = raw.iter().filter(|s| !s.is_empty()).collect();
            let numeric = !non_empty.is_empty() && non_empty.iter().all(|s| s.parse::<f64>().is_ok());

            let mut source = ColumnMeta::named(header);
            source.query_name = Some(header.clone());

            if numeric {
                source.is_measure = true;
                let values = raw
                    .iter()
                    .map(|s| s.parse::<f64>().map(CellValue::Number).unwrap_or(CellValue::Null))
                    .collect();
                categorical.values.push(ValueColumn { source, values, highlights: None });
            } else {
                let values = raw
                    .into_iter()
                    .map(|s| if s.is_empty() { CellValue::Null } else { CellValue::Text(s) })
                    .collect();
                categorical.categories.push(CategoryColumn { source, values });
            }
        }

        Ok(Self {
            metadata: ViewMetadata {
                columns: categorical
                    .categories
                    .iter()
                    .map(|c| c.source.clone())
                    .chain(categorical.values.iter().map(|v| v.source.clone()))
                    .collect(),
            },
            categorical: Some(categorical),
            matrix: None,
        })
    }
}
