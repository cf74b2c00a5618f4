//! Column kinds inferred for a dataset.

use leads_indexer_shared::ColumnKind;

use super::Dataset;

/// The inferred kind of every column of a dataset, in column order.
///
/// Built once per run and used both for the index mapping and for typing row values, so
/// the two always agree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatasetSchema {
    columns: Vec<(String, ColumnKind)>,
}

impl DatasetSchema {
    /// Infer the kind of every column of `dataset`.
    pub fn infer(dataset: &Dataset) -> Self {
        let columns = dataset
            .columns()
            .iter()
            .enumerate()
            .map(|(position, name)| {
                let kind = ColumnKind::infer(dataset.cells(position));
                (name.clone(), kind)
            })
            .collect();

        Self { columns }
    }

    /// Build a schema from explicit column kinds.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnKind)>,
        S: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, kind)| (name.into(), kind))
                .collect(),
        }
    }

    /// Kind of the column named `name`.
    pub fn kind_of(&self, name: &str) -> Option<ColumnKind> {
        self.columns
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, kind)| *kind)
    }

    /// Columns and kinds, in column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.columns.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
