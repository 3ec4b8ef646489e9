use serde::Deserialize;
use utoipa::IntoParams;

use crate::errors::{Error, Result};

/// Query parameters for the sum page
#[derive(Debug, Deserialize, IntoParams)]
pub struct AddQuery {
    /// First operand
    pub a: Option<String>,
    /// Second operand
    pub b: Option<String>,
}

impl AddQuery {
    /// Parse both operands, naming the first one that is missing or not a number.
    pub fn operands(&self) -> Result<(f64, f64)> {
        Ok((parse_operand("a", self.a.as_deref())?, parse_operand("b", self.b.as_deref())?))
    }
}

fn parse_operand(name: &str, raw: Option<&str>) -> Result<f64> {
    raw.map(str::trim)
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| !v.is_nan())
        .ok_or_else(|| Error::BadRequest {
            message: format!("{name} is not a number"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(a: Option<&str>, b: Option<&str>) -> AddQuery {
        AddQuery {
            a: a.map(String::from),
            b: b.map(String::from),
        }
    }

    #[test]
    fn test_parses_operands() {
        assert_eq!(query(Some("1"), Some(" 2.5 ")).operands().unwrap(), (1.0, 2.5));
        assert_eq!(query(Some("-3"), Some("1e2")).operands().unwrap(), (-3.0, 100.0));
    }

    #[test]
    fn test_names_bad_operand() {
        let err = query(Some("x"), Some("2")).operands().unwrap_err();
        assert_eq!(err.user_message(), "a is not a number");

        let err = query(Some("1"), None).operands().unwrap_err();
        assert_eq!(err.user_message(), "b is not a number");

        let err = query(Some("NaN"), Some("1")).operands().unwrap_err();
        assert_eq!(err.user_message(), "a is not a number");
    }
}
