//! One-hot encoding of categorical configuration columns.
//!
//! The encoder is built from the configuration-space schema rather than
//! learned from data: the schema already enumerates every admissible choice,
//! so the encoded layout is fixed before any data is seen. Binary
//! categoricals collapse to a single indicator column.

use crate::config::{ConfigurationSpace, Domain};
use crate::core::error::{Result, SurrogateError};
use crate::dataset::frame::{ColumnData, Frame};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct EncodedColumn {
    name: String,
    categories: Vec<String>,
    /// Binary categoricals keep only the indicator for the second category
    drop_first: bool,
}

impl EncodedColumn {
    fn width(&self) -> usize {
        if self.drop_first {
            1
        } else {
            self.categories.len()
        }
    }
}

/// One-hot encoder over the categorical columns of a configuration space;
/// all other columns pass through unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneHotEncoder {
    encoded: Vec<EncodedColumn>,
}

impl OneHotEncoder {
    /// Build an encoder from the categorical hyperparameters of a space.
    pub fn from_space(space: &ConfigurationSpace) -> Self {
        let encoded = space
            .hyperparameters()
            .iter()
            .filter_map(|p| match &p.domain {
                Domain::Categorical { choices } => Some(EncodedColumn {
                    name: p.name.clone(),
                    categories: choices.clone(),
                    drop_first: choices.len() == 2,
                }),
                _ => None,
            })
            .collect();
        OneHotEncoder { encoded }
    }

    /// Names of the columns this encoder expands.
    pub fn encoded_names(&self) -> Vec<&str> {
        self.encoded.iter().map(|c| c.name.as_str()).collect()
    }

    /// Encode a feature frame into a numeric matrix.
    ///
    /// Output layout: the one-hot blocks in schema order, then every
    /// remaining (numeric) frame column in frame order. An unknown category
    /// or a categorical column absent from the schema is an error.
    pub fn encode(&self, frame: &Frame) -> Result<Array2<f64>> {
        let nrows = frame.num_rows();
        let passthrough: Vec<&str> = frame
            .columns()
            .iter()
            .filter(|c| !self.encoded.iter().any(|e| e.name == c.name))
            .map(|c| c.name.as_str())
            .collect();

        for name in &passthrough {
            if let Some(column) = frame.column(name) {
                if matches!(column.data, ColumnData::Str(_)) {
                    return Err(SurrogateError::feature_processing(format!(
                        "categorical column '{}' is not declared in the configuration space",
                        name
                    )));
                }
            }
        }

        let width: usize = self.encoded.iter().map(|c| c.width()).sum::<usize>()
            + passthrough.len();
        let mut out = Array2::zeros((nrows, width));

        let mut offset = 0;
        for spec in &self.encoded {
            let values = frame.str_column(&spec.name)?;
            for (row, value) in values.iter().enumerate() {
                let idx = spec
                    .categories
                    .iter()
                    .position(|c| c == value)
                    .ok_or_else(|| {
                        SurrogateError::feature_processing(format!(
                            "unknown category '{}' in column '{}'",
                            value, spec.name
                        ))
                    })?;
                if spec.drop_first {
                    if idx == 1 {
                        out[[row, offset]] = 1.0;
                    }
                } else {
                    out[[row, offset + idx]] = 1.0;
                }
            }
            offset += spec.width();
        }

        for name in passthrough {
            let values = frame.float_column(name)?;
            for (row, &value) in values.iter().enumerate() {
                out[[row, offset]] = value;
            }
            offset += 1;
        }

        Ok(out)
    }
}
