use crate::utils::error::{PvGenError, Result};
use serde::Serialize;

/// Numeric table indexed by timestamp (rows) and location (columns).
///
/// Cells are stored row-major. A missing value is `f64::NAN`.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    index: Vec<String>,
    columns: Vec<String>,
    values: Vec<f64>,
}

impl Table {
    pub fn new(index: Vec<String>, columns: Vec<String>, values: Vec<f64>) -> Result<Self> {
        let expected = index.len() * columns.len();
        if values.len() != expected {
            return Err(PvGenError::ValidationError {
                message: format!(
                    "table with {} rows and {} columns needs {} cells, got {}",
                    index.len(),
                    columns.len(),
                    expected,
                    values.len()
                ),
            });
        }

        Ok(Self {
            index,
            columns,
            values,
        })
    }

    /// Builds a table from row vectors; every row must have one value per column.
    pub fn from_rows<I, C>(index: I, columns: C, rows: Vec<Vec<f64>>) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let index: Vec<String> = index.into_iter().map(Into::into).collect();
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();

        if rows.len() != index.len() {
            return Err(PvGenError::ValidationError {
                message: format!("{} row labels for {} rows", index.len(), rows.len()),
            });
        }

        let mut values = Vec::with_capacity(index.len() * columns.len());
        for (label, row) in index.iter().zip(&rows) {
            if row.len() != columns.len() {
                return Err(PvGenError::ValidationError {
                    message: format!(
                        "row '{}' has {} values, expected {}",
                        label,
                        row.len(),
                        columns.len()
                    ),
                });
            }
            values.extend_from_slice(row);
        }

        Self::new(index, columns, values)
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.index.len(), self.columns.len())
    }

    pub fn index(&self) -> &[String] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        if row >= self.index.len() || column >= self.columns.len() {
            return None;
        }
        self.values.get(row * self.columns.len() + column).copied()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &[f64])> + '_ {
        // chunks() panics on zero, and a table without columns has no cells anyway
        let width = self.columns.len().max(1);
        self.index
            .iter()
            .map(String::as_str)
            .zip(self.values.chunks(width).chain(std::iter::repeat(&[][..])))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Same labels, new cell values. Used by transforms that keep the shape.
    pub(crate) fn with_values(&self, values: Vec<f64>) -> Result<Self> {
        Self::new(self.index.clone(), self.columns.clone(), values)
    }
}

/// The aligned pair of input tables handed from extract to transform.
#[derive(Debug, Clone)]
pub struct WeatherTables {
    pub temperature: Table,
    pub irradiance: Table,
    pub source_files: usize,
}

/// How many cells the measurement filter blanked and how many outputs ended up missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterSummary {
    pub masked_temperature: usize,
    pub masked_irradiance: usize,
    pub missing_output: usize,
}

#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub power: Table,
    pub summary: FilterSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_builds_row_major_table() {
        let table = Table::from_rows(
            ["t0", "t1"],
            ["Berlin", "Munich"],
            vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        )
        .unwrap();

        assert_eq!(table.shape(), (2, 2));
        assert_eq!(table.values(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(table.get(1, 0), Some(3.0));
        assert_eq!(table.get(2, 0), None);
        assert_eq!(table.get(1, 1), Some(4.0));
        assert_eq!(table.get(0, 2), None);
    }

    #[test]
    fn test_ragged_rows_are_rejected() {
        let result = Table::from_rows(["t0", "t1"], ["a", "b"], vec![vec![1.0, 2.0], vec![3.0]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cell_count_must_match_shape() {
        let result = Table::new(
            vec!["t0".to_string()],
            vec!["a".to_string(), "b".to_string()],
            vec![1.0],
        );
        assert!(matches!(result, Err(PvGenError::ValidationError { .. })));
    }

    #[test]
    fn test_rows_iterates_labels_with_values() {
        let table = Table::from_rows(["t0", "t1"], ["a"], vec![vec![1.0], vec![f64::NAN]]).unwrap();
        let rows: Vec<(&str, usize)> = table.rows().map(|(t, v)| (t, v.len())).collect();
        assert_eq!(rows, vec![("t0", 1), ("t1", 1)]);
        assert_eq!(table.values().iter().filter(|v| v.is_nan()).count(), 1);
    }

    #[test]
    fn test_rows_without_columns() {
        let table = Table::from_rows(["t0"], Vec::<String>::new(), vec![vec![]]).unwrap();
        assert_eq!(table.shape(), (1, 0));
        assert_eq!(table.rows().count(), 1);
    }
}
