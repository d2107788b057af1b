//! Resolved literal values.
//!
//! A [`Literal`] is what an operand evaluates to. It keeps a copy of the
//! operand that produced it so sanitizers can rebuild an operand with the same
//! provenance.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::operand::{EMPTY_OPERAND_DISPLAY, Operand};

/// Payload of a literal. Exactly one kind is ever set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LiteralValue {
    /// A string value.
    String(String),
    /// An integer value.
    Int(i64),
    /// No value.
    Empty,
}

/// A concrete value produced by resolving an operand.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    source: Operand,
    value: LiteralValue,
}

impl Literal {
    /// Creates a string literal.
    pub fn string(source: Operand, value: impl Into<String>) -> Self {
        Self {
            source,
            value: LiteralValue::String(value.into()),
        }
    }

    /// Creates an integer literal.
    pub fn int(source: Operand, value: i64) -> Self {
        Self {
            source,
            value: LiteralValue::Int(value),
        }
    }

    /// Creates an empty literal.
    pub fn empty(source: Operand) -> Self {
        Self {
            source,
            value: LiteralValue::Empty,
        }
    }

    /// Returns the operand that produced this literal.
    pub fn source(&self) -> &Operand {
        &self.source
    }

    /// Returns the payload.
    pub fn value(&self) -> &LiteralValue {
        &self.value
    }

    /// Returns the string payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match &self.value {
            LiteralValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match &self.value {
            LiteralValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns `true` if this literal carries no value.
    pub fn is_empty(&self) -> bool {
        matches!(self.value, LiteralValue::Empty)
    }

    /// Returns the value as a lookup string, or `None` for empty literals.
    pub fn lookup_key(&self) -> Option<String> {
        match &self.value {
            LiteralValue::String(s) => Some(s.clone()),
            LiteralValue::Int(n) => Some(n.to_string()),
            LiteralValue::Empty => None,
        }
    }

    /// Converts this literal back into a single-valued operand.
    pub fn to_operand(&self) -> Operand {
        match &self.value {
            LiteralValue::String(s) => Operand::string(s.clone()),
            LiteralValue::Int(n) => Operand::int(*n),
            LiteralValue::Empty => Operand::Empty,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            LiteralValue::String(s) => f.write_str(s),
            LiteralValue::Int(n) => write!(f, "{}", n),
            LiteralValue::Empty => f.write_str(EMPTY_OPERAND_DISPLAY),
        }
    }
}
