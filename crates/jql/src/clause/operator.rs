//! Comparison operators for terminal and history clauses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClauseError;

/// Operators that relate a clause name to its operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `=`
    #[serde(rename = "=")]
    Equals,
    /// `!=`
    #[serde(rename = "!=")]
    NotEquals,
    /// `~`
    #[serde(rename = "~")]
    Like,
    /// `!~`
    #[serde(rename = "!~")]
    NotLike,
    /// `<`
    #[serde(rename = "<")]
    LessThan,
    /// `>`
    #[serde(rename = ">")]
    GreaterThan,
    /// `<=`
    #[serde(rename = "<=")]
    LessThanEquals,
    /// `>=`
    #[serde(rename = ">=")]
    GreaterThanEquals,
    /// `IN`
    #[serde(rename = "IN", alias = "in")]
    In,
    /// `NOT IN`
    #[serde(rename = "NOT IN", alias = "not in")]
    NotIn,
    /// `IS`
    #[serde(rename = "IS", alias = "is")]
    Is,
    /// `IS NOT`
    #[serde(rename = "IS NOT", alias = "is not")]
    IsNot,
    /// `WAS`
    #[serde(rename = "WAS", alias = "was")]
    Was,
    /// `WAS NOT`
    #[serde(rename = "WAS NOT", alias = "was not")]
    WasNot,
    /// `WAS IN`
    #[serde(rename = "WAS IN", alias = "was in")]
    WasIn,
    /// `WAS NOT IN`
    #[serde(rename = "WAS NOT IN", alias = "was not in")]
    WasNotIn,
    /// `CHANGED`
    #[serde(rename = "CHANGED", alias = "changed")]
    Changed,
}

impl Operator {
    /// Returns the text form used in rendered queries.
    pub fn display(&self) -> &'static str {
        match self {
            Operator::Equals => "=",
            Operator::NotEquals => "!=",
            Operator::Like => "~",
            Operator::NotLike => "!~",
            Operator::LessThan => "<",
            Operator::GreaterThan => ">",
            Operator::LessThanEquals => "<=",
            Operator::GreaterThanEquals => ">=",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Is => "IS",
            Operator::IsNot => "IS NOT",
            Operator::Was => "WAS",
            Operator::WasNot => "WAS NOT",
            Operator::WasIn => "WAS IN",
            Operator::WasNotIn => "WAS NOT IN",
            Operator::Changed => "CHANGED",
        }
    }

    /// Returns `true` for `=` and `IN`.
    pub fn is_positive_equality(&self) -> bool {
        matches!(self, Operator::Equals | Operator::In)
    }

    /// Returns `true` for `!=` and `NOT IN`.
    pub fn is_negative_equality(&self) -> bool {
        matches!(self, Operator::NotEquals | Operator::NotIn)
    }

    /// Returns `true` for `<`, `>`, `<=` and `>=`.
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            Operator::LessThan
                | Operator::GreaterThan
                | Operator::LessThanEquals
                | Operator::GreaterThanEquals
        )
    }

    /// Returns `true` for operators that expect a list operand.
    pub fn is_list_operator(&self) -> bool {
        matches!(
            self,
            Operator::In | Operator::NotIn | Operator::WasIn | Operator::WasNotIn
        )
    }

    /// Returns `true` for operators only valid on history clauses.
    pub fn is_history(&self) -> bool {
        matches!(
            self,
            Operator::Was
                | Operator::WasNot
                | Operator::WasIn
                | Operator::WasNotIn
                | Operator::Changed
        )
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display())
    }
}

impl FromStr for Operator {
    type Err = ClauseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_lowercase().as_str() {
            "=" => Ok(Operator::Equals),
            "!=" => Ok(Operator::NotEquals),
            "~" => Ok(Operator::Like),
            "!~" => Ok(Operator::NotLike),
            "<" => Ok(Operator::LessThan),
            ">" => Ok(Operator::GreaterThan),
            "<=" => Ok(Operator::LessThanEquals),
            ">=" => Ok(Operator::GreaterThanEquals),
            "in" => Ok(Operator::In),
            "not in" => Ok(Operator::NotIn),
            "is" => Ok(Operator::Is),
            "is not" => Ok(Operator::IsNot),
            "was" => Ok(Operator::Was),
            "was not" => Ok(Operator::WasNot),
            "was in" => Ok(Operator::WasIn),
            "was not in" => Ok(Operator::WasNotIn),
            "changed" => Ok(Operator::Changed),
            _ => Err(ClauseError::UnknownOperator {
                operator: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_parse() {
        assert_eq!("=".parse::<Operator>().unwrap(), Operator::Equals);
        assert_eq!("not   IN".parse::<Operator>().unwrap(), Operator::NotIn);
        assert_eq!("Was Not In".parse::<Operator>().unwrap(), Operator::WasNotIn);
        assert!("==".parse::<Operator>().is_err());
    }

    #[test]
    fn test_unknown_operator_error() {
        let err = "is  maybe".parse::<Operator>().unwrap_err();
        assert_eq!(
            err,
            ClauseError::UnknownOperator {
                operator: "is  maybe".to_string()
            }
        );
        assert_eq!(err.to_string(), "unknown operator 'is  maybe'");
    }

    #[test]
    fn test_operator_classification() {
        assert!(Operator::Equals.is_positive_equality());
        assert!(Operator::In.is_positive_equality());
        assert!(Operator::NotIn.is_negative_equality());
        assert!(Operator::GreaterThanEquals.is_relational());
        assert!(!Operator::Like.is_relational());
        assert!(Operator::WasIn.is_list_operator());
        assert!(Operator::Changed.is_history());
        assert!(!Operator::Is.is_history());
    }

    #[test]
    fn test_operator_serde_uses_display_form() {
        let json = serde_json::to_string(&Operator::NotIn).unwrap();
        assert_eq!(json, "\"NOT IN\"");
        let op: Operator = serde_json::from_str("\"<=\"").unwrap();
        assert_eq!(op, Operator::LessThanEquals);
    }
}
