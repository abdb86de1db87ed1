use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A discount or tax: either a fixed amount or a percentage of some base amount.
///
/// The textual form follows the session format: `"10%"` is a percentage, anything else
/// that parses as a number (`"5"`, `"2.5"`) is a fixed amount.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    Fixed(f64),
    Percent(f64),
}

#[derive(Debug, Error)]
pub enum AdjustmentError {
    #[error("Invalid adjustment value: '{value}'")]
    Invalid { value: String },
}

impl Adjustment {
    /// Read an adjustment out of a stored attribute value.
    ///
    /// `null` means "not set". Numbers are fixed amounts and strings go through `FromStr`.
    pub fn from_value(value: &Value) -> Result<Option<Self>, AdjustmentError> {
        match value {
            Value::Null => Ok(None),
            Value::Number(number) => number
                .as_f64()
                .map(|amount| Some(Adjustment::Fixed(amount)))
                .ok_or_else(|| AdjustmentError::Invalid {
                    value: number.to_string(),
                }),
            Value::String(text) => text.parse().map(Some),
            other => Err(AdjustmentError::Invalid {
                value: other.to_string(),
            }),
        }
    }

    /// Resolve to an amount, taking percentages of `base`.
    pub fn resolve(&self, base: f64) -> f64 {
        match self {
            Adjustment::Fixed(amount) => *amount,
            Adjustment::Percent(percent) => base * percent / 100.0,
        }
    }

    pub fn is_percent(&self) -> bool {
        matches!(self, Adjustment::Percent(_))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Adjustment::Fixed(amount) => serde_json::json!(amount),
            Adjustment::Percent(_) => Value::String(self.to_string()),
        }
    }
}

impl FromStr for Adjustment {
    type Err = AdjustmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let invalid = || AdjustmentError::Invalid {
            value: s.to_string(),
        };

        match trimmed.strip_suffix('%') {
            Some(percent) => percent
                .trim()
                .parse::<f64>()
                .map(Adjustment::Percent)
                .map_err(|_| invalid()),
            None => trimmed
                .parse::<f64>()
                .map(Adjustment::Fixed)
                .map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for Adjustment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Adjustment::Fixed(amount) => write!(f, "{}", amount),
            Adjustment::Percent(percent) => write!(f, "{}%", percent),
        }
    }
}
