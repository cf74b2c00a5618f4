//! Scalar kinds inferred for tabular columns.

use serde_json::{Number, Value};

use crate::types::index_mapping::FieldMapping;

/// The scalar kind of a column, inferred from every cell it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// Every cell is a 64-bit integer.
    Integer,
    /// Every cell is a finite floating point number.
    Float,
    /// Anything else, including columns with missing cells.
    Text,
}

impl ColumnKind {
    /// Infer the kind of a column from its cells.
    ///
    /// Missing cells are expected as empty strings. A single empty cell makes the column
    /// textual, as does an empty column.
    pub fn infer<'a, I>(cells: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut kind = None;

        for cell in cells {
            let cell = cell.trim();
            if cell.is_empty() {
                return ColumnKind::Text;
            }

            let cell_kind = if cell.parse::<i64>().is_ok() {
                ColumnKind::Integer
            } else if cell.parse::<f64>().map(f64::is_finite).unwrap_or(false) {
                ColumnKind::Float
            } else {
                return ColumnKind::Text;
            };

            kind = Some(match (kind, cell_kind) {
                (None, k) => k,
                (Some(ColumnKind::Integer), ColumnKind::Integer) => ColumnKind::Integer,
                _ => ColumnKind::Float,
            });
        }

        kind.unwrap_or(ColumnKind::Text)
    }

    /// The index mapping used for a column of this kind.
    pub fn field_mapping(&self) -> FieldMapping {
        match self {
            ColumnKind::Integer => FieldMapping::Long,
            ColumnKind::Float => FieldMapping::Float,
            ColumnKind::Text => FieldMapping::Text,
        }
    }

    /// Convert a raw cell into a JSON value of this kind.
    ///
    /// Cells that do not parse fall back to their string form.
    pub fn typed_value(&self, cell: &str) -> Value {
        let trimmed = cell.trim();
        match self {
            ColumnKind::Integer => trimmed
                .parse::<i64>()
                .map(Value::from)
                .unwrap_or_else(|_| Value::String(cell.to_string())),
            ColumnKind::Float => trimmed
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(cell.to_string())),
            ColumnKind::Text => Value::String(cell.to_string()),
        }
    }
}
