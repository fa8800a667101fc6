use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::expression::eval_angle;
use crate::foundation::error::{CollatzError, CollatzResult};

/// An angle as written by the user: a plain number of radians or expression text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AngleSpec {
    /// Radians.
    Radians(f64),
    /// Arithmetic text evaluated by [`eval_angle`].
    Expr(String),
}

impl AngleSpec {
    /// Resolve to radians.
    pub fn radians(&self) -> CollatzResult<f64> {
        match self {
            Self::Radians(v) if v.is_finite() => Ok(*v),
            Self::Radians(v) => Err(CollatzError::validation(format!(
                "angle must be finite, got {v}"
            ))),
            Self::Expr(src) => eval_angle(src)
                .map_err(|e| CollatzError::expression(format!("invalid angle '{src}': {e}"))),
        }
    }
}

impl FromStr for AngleSpec {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<f64>() {
            Ok(v) => Self::Radians(v),
            Err(_) => Self::Expr(s.to_owned()),
        })
    }
}

impl fmt::Display for AngleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Radians(v) => write!(f, "{v}"),
            Self::Expr(s) => f.write_str(s),
        }
    }
}
