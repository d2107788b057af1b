//! Operands: the right-hand side of a terminal clause.
//!
//! An [`Operand`] is one of four variants:
//!
//! - [`Operand::Empty`] - the value is not set (`EMPTY`)
//! - [`Operand::Single`] - exactly one string or integer
//! - [`Operand::Multi`] - a non-empty, ordered list of operands
//! - [`Operand::Function`] - a named function call with string arguments
//!
//! Function names compare case-insensitively; everything else compares
//! exactly. Operands are values: create them per query and drop them after.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::error::ClauseError;
use crate::text::{encode_string_value, quote};

/// Display form of [`Operand::Empty`].
pub const EMPTY_OPERAND_DISPLAY: &str = "EMPTY";

/// The right-hand side of a terminal clause comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operand {
    /// The value is not set.
    Empty,
    /// A single string or integer value.
    Single(SingleValue),
    /// An ordered list of operands.
    Multi(MultiValueOperand),
    /// A function call resolved through the function registry.
    Function(FunctionOperand),
}

/// Payload of a single-value operand. Exactly one kind is ever present.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingleValue {
    /// A string value.
    String(String),
    /// An integer value.
    Int(i64),
}

impl Operand {
    /// Creates a single string operand.
    pub fn string(value: impl Into<String>) -> Self {
        Operand::Single(SingleValue::String(value.into()))
    }

    /// Creates a single integer operand.
    pub fn int(value: i64) -> Self {
        Operand::Single(SingleValue::Int(value))
    }

    /// Creates a multi-value operand.
    ///
    /// Fails if `values` is empty.
    pub fn multi(values: Vec<Operand>) -> Result<Self, ClauseError> {
        MultiValueOperand::new(values).map(Operand::Multi)
    }

    /// Creates a function operand.
    pub fn function<I, S>(name: impl Into<String>, args: I) -> Result<Self, ClauseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        FunctionOperand::new(name, args).map(Operand::Function)
    }

    /// Returns `true` for [`Operand::Empty`].
    pub fn is_empty_variant(&self) -> bool {
        matches!(self, Operand::Empty)
    }

    /// Returns `true` for [`Operand::Multi`].
    pub fn is_multi(&self) -> bool {
        matches!(self, Operand::Multi(_))
    }

    /// Returns `true` for [`Operand::Function`].
    pub fn is_function(&self) -> bool {
        matches!(self, Operand::Function(_))
    }

    /// Returns the canonical text form used when rendering clauses.
    ///
    /// Strings are always quoted; integers are bare; lists render as
    /// `(a, b)`; functions as `name(arg1, arg2)`.
    pub fn display_string(&self) -> String {
        match self {
            Operand::Empty => EMPTY_OPERAND_DISPLAY.to_string(),
            Operand::Single(value) => value.display_string(),
            Operand::Multi(multi) => multi.display_string(),
            Operand::Function(function) => function.display_string(),
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

impl SingleValue {
    /// Returns the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SingleValue::String(s) => Some(s),
            SingleValue::Int(_) => None,
        }
    }

    /// Returns the integer payload, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            SingleValue::String(_) => None,
            SingleValue::Int(n) => Some(*n),
        }
    }

    fn display_string(&self) -> String {
        match self {
            SingleValue::String(s) => quote(s),
            SingleValue::Int(n) => n.to_string(),
        }
    }
}

/// A non-empty, ordered list of operands. May nest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Operand>", into = "Vec<Operand>")]
pub struct MultiValueOperand {
    values: Vec<Operand>,
}

impl MultiValueOperand {
    /// Creates a list operand. Fails if `values` is empty.
    pub fn new(values: Vec<Operand>) -> Result<Self, ClauseError> {
        if values.is_empty() {
            return Err(ClauseError::EmptyMultiValue);
        }
        Ok(Self { values })
    }

    /// Creates a list of single string operands.
    pub fn from_strings<I, S>(values: I) -> Result<Self, ClauseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(values.into_iter().map(Operand::string).collect())
    }

    /// Creates a list of single integer operands.
    pub fn from_ints<I>(values: I) -> Result<Self, ClauseError>
    where
        I: IntoIterator<Item = i64>,
    {
        Self::new(values.into_iter().map(Operand::int).collect())
    }

    /// Returns the contained operands in order.
    pub fn values(&self) -> &[Operand] {
        &self.values
    }

    /// Returns the number of direct children.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; a list operand cannot be empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Rebuilds the list from the transformed items, keeping its length.
    pub fn map<F: FnMut(&Operand) -> Operand>(&self, f: F) -> Self {
        Self {
            values: self.values.iter().map(f).collect(),
        }
    }

    fn display_string(&self) -> String {
        let parts: Vec<String> = self.values.iter().map(Operand::display_string).collect();
        format!("({})", parts.join(", "))
    }
}

impl TryFrom<Vec<Operand>> for MultiValueOperand {
    type Error = ClauseError;

    fn try_from(values: Vec<Operand>) -> Result<Self, Self::Error> {
        Self::new(values)
    }
}

impl From<MultiValueOperand> for Vec<Operand> {
    fn from(multi: MultiValueOperand) -> Self {
        multi.values
    }
}

/// A function call operand, such as `currentUser()` or `membersOf("admins")`.
///
/// Equality and hashing ignore the case of the name but respect the exact
/// argument sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "FunctionOperandDef")]
pub struct FunctionOperand {
    name: String,
    args: Vec<String>,
}

#[derive(Deserialize)]
struct FunctionOperandDef {
    name: String,
    #[serde(default)]
    args: Vec<String>,
}

impl TryFrom<FunctionOperandDef> for FunctionOperand {
    type Error = ClauseError;

    fn try_from(def: FunctionOperandDef) -> Result<Self, Self::Error> {
        Self::new(def.name, def.args)
    }
}

impl FunctionOperand {
    /// Creates a function operand.
    ///
    /// Fails if the name is blank or any argument is empty.
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Result<Self, ClauseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ClauseError::EmptyFunctionName);
        }

        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        if let Some(index) = args.iter().position(|a| a.is_empty()) {
            return Err(ClauseError::EmptyFunctionArgument {
                function: name,
                index,
            });
        }

        Ok(Self { name, args })
    }

    /// Returns the function name as written.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the arguments in order.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns a copy of this operand with different arguments.
    pub fn with_args<I, S>(&self, args: I) -> Result<Self, ClauseError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(self.name.clone(), args)
    }

    fn display_string(&self) -> String {
        let args: Vec<String> = self.args.iter().map(|a| encode_string_value(a)).collect();
        format!("{}({})", self.name, args.join(", "))
    }
}

impl PartialEq for FunctionOperand {
    fn eq(&self, other: &Self) -> bool {
        self.name.eq_ignore_ascii_case(&other.name) && self.args == other.args
    }
}

impl Eq for FunctionOperand {}

impl Hash for FunctionOperand {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.to_ascii_lowercase().hash(state);
        self.args.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_function_equality_ignores_name_case() {
        let upper = FunctionOperand::new("NAME", Vec::<String>::new()).unwrap();
        let lower = FunctionOperand::new("name", Vec::<String>::new()).unwrap();
        assert_eq!(upper, lower);

        let mut set = HashSet::new();
        set.insert(Operand::Function(upper));
        assert!(set.contains(&Operand::Function(lower)));
    }

    #[test]
    fn test_function_equality_respects_args() {
        let with_arg = FunctionOperand::new("name", ["a"]).unwrap();
        let without = FunctionOperand::new("name", Vec::<String>::new()).unwrap();
        assert_ne!(with_arg, without);

        let ab = FunctionOperand::new("f", ["a", "b"]).unwrap();
        let ba = FunctionOperand::new("f", ["b", "a"]).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_function_rejects_empty_parts() {
        assert_eq!(
            FunctionOperand::new(" ", Vec::<String>::new()).unwrap_err(),
            ClauseError::EmptyFunctionName
        );
        assert!(matches!(
            FunctionOperand::new("f", ["a", ""]),
            Err(ClauseError::EmptyFunctionArgument { index: 1, .. })
        ));
    }

    #[test]
    fn test_multi_requires_values() {
        assert_eq!(
            MultiValueOperand::new(vec![]).unwrap_err(),
            ClauseError::EmptyMultiValue
        );
        let multi = MultiValueOperand::from_strings(["a", "b"]).unwrap();
        assert_eq!(multi.len(), 2);
    }

    #[test]
    fn test_multi_equality_is_ordered() {
        let ab = Operand::multi(vec![Operand::string("a"), Operand::string("b")]).unwrap();
        let ba = Operand::multi(vec![Operand::string("b"), Operand::string("a")]).unwrap();
        assert_ne!(ab, ba);
    }

    #[test]
    fn test_single_equality_by_payload() {
        assert_eq!(Operand::string("1"), Operand::string("1"));
        assert_ne!(Operand::string("1"), Operand::int(1));
    }

    #[test]
    fn test_display_strings() {
        assert_eq!(Operand::Empty.display_string(), "EMPTY");
        assert_eq!(Operand::string("laptop").display_string(), "\"laptop\"");
        assert_eq!(Operand::int(42).display_string(), "42");

        let multi = Operand::multi(vec![Operand::string("a"), Operand::int(2)]).unwrap();
        assert_eq!(multi.display_string(), "(\"a\", 2)");

        let function = Operand::function("membersOf", ["asset admins"]).unwrap();
        assert_eq!(function.display_string(), "membersOf(\"asset admins\")");

        let function = Operand::function("currentUser", Vec::<String>::new()).unwrap();
        assert_eq!(function.display_string(), "currentUser()");
    }

    #[test]
    fn test_serde_enforces_invariants() {
        let ok: Operand = serde_json::from_str(r#"{"multi":[{"single":{"int":1}}]}"#).unwrap();
        assert!(ok.is_multi());

        let empty_multi = serde_json::from_str::<Operand>(r#"{"multi":[]}"#);
        assert!(empty_multi.is_err());

        let bad_function =
            serde_json::from_str::<Operand>(r#"{"function":{"name":"","args":[]}}"#);
        assert!(bad_function.is_err());
    }
}
