//! Configuration-space schema for surrogate inputs.
//!
//! A [`ConfigurationSpace`] describes what each model configuration looks
//! like: an ordered list of named hyperparameters, each with a value domain.
//! The declaration order is significant: it fixes the column layout of
//! sampled configurations and drives the one-hot encoding of categorical
//! parameters in the preprocessing pipeline.

use crate::core::error::{Result, SurrogateError};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Value domain of a single hyperparameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Domain {
    /// A finite set of named choices
    Categorical {
        /// Admissible values, in declaration order
        choices: Vec<String>,
    },
    /// Integers in `[lower, upper]` inclusive
    Integer {
        /// Lower bound (inclusive)
        lower: i64,
        /// Upper bound (inclusive)
        upper: i64,
    },
    /// Reals in `[lower, upper)`, optionally sampled on a log scale
    Float {
        /// Lower bound (inclusive)
        lower: f64,
        /// Upper bound (exclusive)
        upper: f64,
        /// Sample uniformly in log space instead of linear space
        log: bool,
    },
    /// A fixed value
    Constant {
        /// The constant value
        value: f64,
    },
}

impl Domain {
    /// Draw one value from this domain.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> ParamValue {
        match self {
            Domain::Categorical { choices } => {
                let idx = rng.gen_range(0..choices.len());
                ParamValue::Str(choices[idx].clone())
            }
            Domain::Integer { lower, upper } => {
                ParamValue::Float(rng.gen_range(*lower..=*upper) as f64)
            }
            Domain::Float { lower, upper, log } => {
                let value = if *log {
                    let (lo, hi) = (lower.ln(), upper.ln());
                    (rng.gen::<f64>() * (hi - lo) + lo).exp()
                } else {
                    rng.gen::<f64>() * (upper - lower) + lower
                };
                ParamValue::Float(value)
            }
            Domain::Constant { value } => ParamValue::Float(*value),
        }
    }

    fn validate(&self, name: &str) -> Result<()> {
        match self {
            Domain::Categorical { choices } => {
                if choices.is_empty() {
                    return Err(SurrogateError::invalid_parameter(
                        name,
                        "[]",
                        "categorical domain must have at least one choice",
                    ));
                }
            }
            Domain::Integer { lower, upper } => {
                if lower > upper {
                    return Err(SurrogateError::invalid_parameter(
                        name,
                        format!("[{}, {}]", lower, upper),
                        "integer domain lower bound exceeds upper bound",
                    ));
                }
            }
            Domain::Float { lower, upper, log } => {
                if lower >= upper {
                    return Err(SurrogateError::invalid_parameter(
                        name,
                        format!("[{}, {})", lower, upper),
                        "float domain lower bound must be below upper bound",
                    ));
                }
                if *log && *lower <= 0.0 {
                    return Err(SurrogateError::invalid_parameter(
                        name,
                        lower.to_string(),
                        "log-scale domain requires a positive lower bound",
                    ));
                }
            }
            Domain::Constant { .. } => {}
        }
        Ok(())
    }
}

/// A realized hyperparameter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ParamValue {
    /// Numeric value (integer domains are realized as floats)
    Float(f64),
    /// Categorical value
    Str(String),
}

/// A named hyperparameter with its value domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperparameter {
    /// Parameter name, unique within the space
    pub name: String,
    /// Value domain
    pub domain: Domain,
}

/// Ordered schema of the configurations a surrogate is trained on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConfigurationSpace {
    hyperparameters: Vec<Hyperparameter>,
}

impl ConfigurationSpace {
    /// Create an empty configuration space.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hyperparameter to the space (builder style).
    pub fn add<S: Into<String>>(mut self, name: S, domain: Domain) -> Self {
        self.hyperparameters.push(Hyperparameter {
            name: name.into(),
            domain,
        });
        self
    }

    /// Validate the schema: unique names, well-formed domains.
    pub fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for param in &self.hyperparameters {
            if !seen.insert(param.name.as_str()) {
                return Err(SurrogateError::config(format!(
                    "duplicate hyperparameter name '{}'",
                    param.name
                )));
            }
            param.domain.validate(&param.name)?;
        }
        Ok(())
    }

    /// All hyperparameters, in declaration order.
    pub fn hyperparameters(&self) -> &[Hyperparameter] {
        &self.hyperparameters
    }

    /// Names of all hyperparameters, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.hyperparameters.iter().map(|p| p.name.as_str()).collect()
    }

    /// Names of the categorical hyperparameters, in declaration order.
    ///
    /// These are the columns the preprocessing pipeline one-hot encodes.
    pub fn categorical_names(&self) -> Vec<&str> {
        self.hyperparameters
            .iter()
            .filter(|p| matches!(p.domain, Domain::Categorical { .. }))
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Look up a hyperparameter by name.
    pub fn get(&self, name: &str) -> Option<&Hyperparameter> {
        self.hyperparameters.iter().find(|p| p.name == name)
    }

    /// Number of hyperparameters in the space.
    pub fn len(&self) -> usize {
        self.hyperparameters.len()
    }

    /// Whether the space declares no hyperparameters.
    pub fn is_empty(&self) -> bool {
        self.hyperparameters.is_empty()
    }

    /// Sample one configuration, one value per declared hyperparameter.
    pub fn sample_configuration<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<ParamValue> {
        self.hyperparameters
            .iter()
            .map(|p| p.domain.sample(rng))
            .collect()
    }
}
