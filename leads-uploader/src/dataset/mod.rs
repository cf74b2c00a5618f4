//! Dataset module for the uploader.
//!
//! Loads a CSV lead list into memory and turns its rows into [`LeadDocument`]s.

mod cnpj;
mod schema;

pub use cnpj::format_cnpj;
pub use schema::DatasetSchema;

use std::collections::HashSet;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use csv::ReaderBuilder;
use leads_indexer_shared::{LeadDocument, CNPJ_FIELD, COMPANY_NAME_FIELD, STATUS_FIELD};
use tracing::{debug, instrument};

use crate::errors::UploadError;
use crate::mapping::skips_empty;

/// Cell values read as missing. Missing cells become empty strings.
pub const NA_VALUES: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A CSV lead list held in memory.
///
/// Every row has exactly one cell per column; short rows are padded with empty cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Dataset {
    /// Read a dataset from a CSV file with a header row.
    ///
    /// # Returns
    ///
    /// * `Ok(Dataset)` - The parsed dataset
    /// * `Err(UploadError::FileNotFound)` - If `path` does not exist
    /// * `Err(UploadError::CsvError)` - If the file cannot be read or parsed
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => UploadError::file_not_found(path),
            _ => UploadError::csv(format!("Failed to open {}: {}", path.display(), e)),
        })?;

        let dataset = Self::from_reader(file)?;
        debug!(
            columns = dataset.columns.len(),
            rows = dataset.rows.len(),
            "Dataset loaded"
        );
        Ok(dataset)
    }

    /// Read a dataset from CSV data with a header row.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, UploadError> {
        let mut csv_reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns = column_names(csv_reader.headers()?.iter());

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            if record.len() > columns.len() {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                return Err(UploadError::csv(format!(
                    "Line {} has {} fields, expected {}",
                    line,
                    record.len(),
                    columns.len()
                )));
            }

            let mut row: Vec<String> = record.iter().map(normalize_cell).collect();
            row.resize(columns.len(), String::new());
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }

    /// Column names, in file order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Position of the column named `name`.
    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Position of a column the upload cannot do without.
    pub fn require_column(&self, name: &str) -> Result<usize, UploadError> {
        self.column_position(name)
            .ok_or_else(|| UploadError::missing_column(name))
    }

    /// Cells of the column at `position`, one per row.
    pub fn cells(&self, position: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .filter_map(move |row| row.get(position).map(String::as_str))
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Turn every row into a lead document tagged with `company_name`.
    ///
    /// The CNPJ is zero padded, a non-empty `status` cell replaces the default status, and
    /// every other column is typed with `schema`.
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<LeadDocument>)` - One document per row, in file order
    /// * `Err(UploadError::MissingColumn)` - If the dataset has no `cnpj` column
    pub fn to_documents(
        &self,
        schema: &DatasetSchema,
        company_name: &str,
    ) -> Result<Vec<LeadDocument>, UploadError> {
        let cnpj_position = self.require_column(CNPJ_FIELD)?;
        let status_position = self.column_position(STATUS_FIELD);

        let documents = self
            .rows
            .iter()
            .map(|row| {
                let mut document = LeadDocument::new(format_cnpj(&row[cnpj_position]), company_name);

                if let Some(status) = status_position
                    .map(|position| row[position].trim())
                    .filter(|status| !status.is_empty())
                {
                    document = document.with_status(status);
                }

                for ((name, kind), cell) in schema.iter().zip(row) {
                    if matches!(name, CNPJ_FIELD | STATUS_FIELD | COMPANY_NAME_FIELD) {
                        continue;
                    }
                    if cell.trim().is_empty() && skips_empty(name) {
                        continue;
                    }
                    document
                        .attributes
                        .insert(name.to_string(), kind.typed_value(cell));
                }

                document
            })
            .collect();

        Ok(documents)
    }
}

fn normalize_cell(cell: &str) -> String {
    if NA_VALUES.contains(&cell.trim()) {
        String::new()
    } else {
        cell.to_string()
    }
}

/// Name blank headers after their position and suffix repeated ones (`name`, `name.1`).
fn column_names<'a>(headers: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for (position, header) in headers.enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", position)
        } else {
            header.to_string()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }

        seen.insert(name.clone());
        names.push(name);
    }

    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use leads_indexer_shared::ColumnKind;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn dataset(csv: &str) -> Dataset {
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "cnpj,name").unwrap();
        writeln!(file, "111,Acme").unwrap();

        let dataset = Dataset::from_path(file.path()).unwrap();
        assert_eq!(dataset.columns(), ["cnpj", "name"]);
        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_missing_file() {
        let result = Dataset::from_path(Path::new("/nonexistent/leads.csv"));
        assert!(matches!(result, Err(UploadError::FileNotFound(_))));
    }

    #[test]
    fn test_na_values_become_empty() {
        let dataset = dataset("cnpj,city\n111,NaN\n222, null \n333,N/A\n444,Recife\n");
        let cities: Vec<&str> = dataset.cells(1).collect();
        assert_eq!(cities, ["", "", "", "Recife"]);
    }

    #[test]
    fn test_short_rows_are_padded() {
        let dataset = dataset("cnpj,name,city\n111,Acme\n");
        let row: Vec<&str> = (0..3).flat_map(|p| dataset.cells(p)).collect();
        assert_eq!(row, ["111", "Acme", ""]);
    }

    #[test]
    fn test_long_rows_are_rejected() {
        let result = Dataset::from_reader("cnpj,name\n111,Acme,extra\n".as_bytes());
        assert!(matches!(result, Err(UploadError::CsvError(_))));
    }

    #[test]
    fn test_column_names_are_made_unique() {
        let dataset = dataset("cnpj,name,name,,name\n1,a,b,c,d\n");
        assert_eq!(
            dataset.columns(),
            ["cnpj", "name", "name.1", "Unnamed: 3", "name.2"]
        );
    }

    #[test]
    fn test_to_documents() {
        let dataset = dataset(
            "cnpj,name,employees,status,date_sent\n\
             111,Acme,12,,2024-01-01\n\
             12345678000195,Beta,7,CONTACTED,\n",
        );
        let schema = DatasetSchema::infer(&dataset);
        assert_eq!(schema.kind_of("employees"), Some(ColumnKind::Integer));

        let documents = dataset.to_documents(&schema, "Acme Corp").unwrap();
        assert_eq!(documents.len(), 2);

        assert_eq!(documents[0].cnpj, "00000000000111");
        assert_eq!(documents[0].status, "PENDING");
        assert_eq!(documents[0].company_name, "Acme Corp");
        assert_eq!(documents[0].attributes["employees"], json!(12));
        assert_eq!(documents[0].attributes["date_sent"], json!("2024-01-01"));
        assert!(!documents[0].attributes.contains_key("cnpj"));

        assert_eq!(documents[1].cnpj, "12345678000195");
        assert_eq!(documents[1].status, "CONTACTED");
        assert!(!documents[1].attributes.contains_key("date_sent"));
        assert_eq!(documents[1].attributes["name"], json!("Beta"));
    }

    #[test]
    fn test_to_documents_requires_cnpj() {
        let dataset = dataset("name\nAcme\n");
        let schema = DatasetSchema::infer(&dataset);
        let result = dataset.to_documents(&schema, "Acme");
        assert!(matches!(result, Err(UploadError::MissingColumn(ref c)) if c == "cnpj"));
    }
}
