//! Column-ordered tabular data for surrogate training and prediction.
//!
//! A [`Frame`] holds named columns of equal length, each either numeric or
//! categorical. Feature tables are realized configurations plus an integer
//! `epoch` column; label tables carry one numeric column per performance
//! metric, row-aligned 1:1 with the features.

use crate::core::error::{Result, SurrogateError};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Values of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ColumnData {
    /// Numeric values
    Float(Vec<f64>),
    /// Categorical values
    Str(Vec<String>),
}

impl ColumnData {
    /// Number of rows in the column.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float(v) => v.len(),
            ColumnData::Str(v) => v.len(),
        }
    }

    /// Whether the column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_rows(&self, indices: &[usize]) -> ColumnData {
        match self {
            ColumnData::Float(v) => {
                ColumnData::Float(indices.iter().map(|&i| v[i]).collect())
            }
            ColumnData::Str(v) => {
                ColumnData::Str(indices.iter().map(|&i| v[i].clone()).collect())
            }
        }
    }
}

/// A named column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within a frame
    pub name: String,
    /// Column values
    pub data: ColumnData,
}

/// An ordered collection of equally sized named columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from columns, validating lengths and name uniqueness.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let mut frame = Frame::new();
        for column in columns {
            frame.push_column(column)?;
        }
        Ok(frame)
    }

    /// Append a column, validating its length against existing columns.
    pub fn push_column(&mut self, column: Column) -> Result<()> {
        if self.columns.iter().any(|c| c.name == column.name) {
            return Err(SurrogateError::dataset(format!(
                "duplicate column name '{}'",
                column.name
            )));
        }
        if let Some(first) = self.columns.first() {
            if first.data.len() != column.data.len() {
                return Err(SurrogateError::dimension_mismatch(
                    format!("{} rows", first.data.len()),
                    format!("{} rows in column '{}'", column.data.len(), column.name),
                ));
            }
        }
        self.columns.push(column);
        Ok(())
    }

    /// Append a numeric column.
    pub fn push_float<S: Into<String>>(&mut self, name: S, values: Vec<f64>) -> Result<()> {
        self.push_column(Column {
            name: name.into(),
            data: ColumnData::Float(values),
        })
    }

    /// Append a categorical column.
    pub fn push_str<S: Into<String>>(&mut self, name: S, values: Vec<String>) -> Result<()> {
        self.push_column(Column {
            name: name.into(),
            data: ColumnData::Str(values),
        })
    }

    /// Number of rows (0 for a frame with no columns).
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Column names, in frame order.
    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// All columns, in frame order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Borrow a numeric column's values.
    pub fn float_column(&self, name: &str) -> Result<&[f64]> {
        match self.column(name) {
            Some(Column {
                data: ColumnData::Float(values),
                ..
            }) => Ok(values),
            Some(_) => Err(SurrogateError::dataset(format!(
                "column '{}' is not numeric",
                name
            ))),
            None => Err(SurrogateError::dataset(format!("missing column '{}'", name))),
        }
    }

    /// Borrow a categorical column's values.
    pub fn str_column(&self, name: &str) -> Result<&[String]> {
        match self.column(name) {
            Some(Column {
                data: ColumnData::Str(values),
                ..
            }) => Ok(values),
            Some(_) => Err(SurrogateError::dataset(format!(
                "column '{}' is not categorical",
                name
            ))),
            None => Err(SurrogateError::dataset(format!("missing column '{}'", name))),
        }
    }

    /// Reorder and filter columns to the given header order.
    ///
    /// This is how a stored column order is enforced on later inputs: the
    /// result carries exactly the requested columns in the requested order,
    /// and a missing column is an error. Extra input columns are dropped.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Frame> {
        let mut columns = Vec::with_capacity(names.len());
        for name in names {
            let name = name.as_ref();
            let column = self.column(name).ok_or_else(|| {
                SurrogateError::dataset(format!("missing column '{}'", name))
            })?;
            columns.push(column.clone());
        }
        Frame::from_columns(columns)
    }

    /// Copy out the rows at the given positions, preserving column order.
    pub fn take_rows(&self, indices: &[usize]) -> Frame {
        Frame {
            columns: self
                .columns
                .iter()
                .map(|c| Column {
                    name: c.name.clone(),
                    data: c.data.take_rows(indices),
                })
                .collect(),
        }
    }

    /// Convert an all-numeric frame to a row-major matrix.
    pub fn to_array(&self) -> Result<Array2<f64>> {
        let nrows = self.num_rows();
        let ncols = self.num_columns();
        let mut out = Array2::zeros((nrows, ncols));
        for (j, column) in self.columns.iter().enumerate() {
            match &column.data {
                ColumnData::Float(values) => {
                    for (i, &v) in values.iter().enumerate() {
                        out[[i, j]] = v;
                    }
                }
                ColumnData::Str(_) => {
                    return Err(SurrogateError::dataset(format!(
                        "column '{}' is categorical; cannot convert frame to a numeric matrix",
                        column.name
                    )));
                }
            }
        }
        Ok(out)
    }

    /// Build an all-numeric frame from a matrix and column names.
    pub fn from_array<S: AsRef<str>>(names: &[S], values: &Array2<f64>) -> Result<Frame> {
        if names.len() != values.ncols() {
            return Err(SurrogateError::dimension_mismatch(
                format!("{} columns", names.len()),
                format!("{} matrix columns", values.ncols()),
            ));
        }
        let mut frame = Frame::new();
        for (j, name) in names.iter().enumerate() {
            frame.push_float(name.as_ref(), values.column(j).to_vec())?;
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_frame() -> Frame {
        let mut frame = Frame::new();
        frame
            .push_str(
                "activation",
                vec!["relu".into(), "mish".into(), "relu".into()],
            )
            .unwrap();
        frame.push_float("width", vec![4.0, 8.0, 16.0]).unwrap();
        frame.push_float("epoch", vec![1.0, 2.0, 3.0]).unwrap();
        frame
    }

    #[test]
    fn test_shape_and_names() {
        let frame = toy_frame();
        assert_eq!(frame.num_rows(), 3);
        assert_eq!(frame.num_columns(), 3);
        assert_eq!(frame.names(), vec!["activation", "width", "epoch"]);
    }

    #[test]
    fn test_push_rejects_mismatched_lengths() {
        let mut frame = toy_frame();
        let result = frame.push_float("bad", vec![1.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_push_rejects_duplicate_names() {
        let mut frame = toy_frame();
        let result = frame.push_float("width", vec![1.0, 2.0, 3.0]);
        assert!(result.is_err());
    }

    #[test]
    fn test_select_reorders_and_drops() {
        let frame = toy_frame();
        let selected = frame.select(&["epoch", "activation"]).unwrap();
        assert_eq!(selected.names(), vec!["epoch", "activation"]);
        assert_eq!(selected.num_rows(), 3);

        assert!(frame.select(&["missing"]).is_err());
    }

    #[test]
    fn test_take_rows() {
        let frame = toy_frame();
        let subset = frame.take_rows(&[2, 0]);
        assert_eq!(subset.num_rows(), 2);
        assert_eq!(subset.float_column("width").unwrap(), &[16.0, 4.0]);
        assert_eq!(
            subset.str_column("activation").unwrap(),
            &["relu".to_string(), "relu".to_string()]
        );
    }

    #[test]
    fn test_to_array_rejects_categorical() {
        let frame = toy_frame();
        assert!(frame.to_array().is_err());

        let numeric = frame.select(&["width", "epoch"]).unwrap();
        let matrix = numeric.to_array().unwrap();
        assert_eq!(matrix.shape(), &[3, 2]);
        assert_eq!(matrix[[1, 0]], 8.0);
    }

    #[test]
    fn test_array_round_trip() {
        let frame = toy_frame().select(&["width", "epoch"]).unwrap();
        let matrix = frame.to_array().unwrap();
        let back = Frame::from_array(&["width", "epoch"], &matrix).unwrap();
        assert_eq!(frame, back);
    }
}
