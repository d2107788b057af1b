//! Simple search form values and their conversion to clause trees.
//!
//! ```
//! use helios_jql::form::{FieldValue, FieldValuesHolder};
//!
//! let mut values = FieldValuesHolder::new();
//! values.insert("status", FieldValue::List(vec!["active".into(), "repair".into()]));
//! values.insert("owner", FieldValue::Text("kim".into()));
//! assert_eq!(values.len(), 2);
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clause::{Clause, Operator, TerminalClause};
use crate::error::{QueryError, QueryResult};
use crate::operand::{MultiValueOperand, Operand};
use crate::registry::SearchHandlerRegistry;

/// The value entered for one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// A single text value.
    Text(String),
    /// Several selected values.
    List(Vec<String>),
    /// An entity id.
    Id(i64),
    /// Nothing entered.
    None,
}

/// Form values keyed by field id, iterated in field id order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldValuesHolder {
    values: BTreeMap<String, FieldValue>,
}

impl FieldValuesHolder {
    /// Creates an empty holder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value of a field, returning the previous one.
    pub fn insert(&mut self, field_id: impl Into<String>, value: FieldValue) -> Option<FieldValue> {
        self.values.insert(field_id.into(), value)
    }

    /// Returns the value of a field.
    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.values.get(field_id)
    }

    /// Iterates over `(field id, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns the number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns `true` if no fields are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Builds a clause tree from form values using registry clause names.
#[derive(Debug)]
pub struct FormQueryBuilder<'a> {
    registry: &'a SearchHandlerRegistry,
}

impl<'a> FormQueryBuilder<'a> {
    /// Creates a builder over a built registry.
    pub fn new(registry: &'a SearchHandlerRegistry) -> Self {
        Self { registry }
    }

    /// Converts `values` into a clause.
    ///
    /// Returns `Ok(None)` when no field carries a value, a bare terminal for
    /// a single field and an `AND` otherwise. Empty text and empty lists
    /// count as no value.
    pub fn build(&self, values: &FieldValuesHolder) -> QueryResult<Option<Clause>> {
        let mut terminals: Vec<Clause> = Vec::new();

        for (field_id, value) in values.iter() {
            let Some((operator, operand)) = Self::operator_and_operand(value)? else {
                continue;
            };
            let names = self.registry.get_jql_clause_names(field_id);
            let Some(names) = names.first() else {
                return Err(QueryError::UnknownField {
                    field_id: field_id.to_string(),
                });
            };
            let clause = TerminalClause::new(names.primary_name(), operator, operand)?;
            terminals.push(Clause::Terminal(clause));
        }

        debug!(terminals = terminals.len(), "Built clause from form values");
        match terminals.len() {
            0 => Ok(None),
            1 => Ok(terminals.pop()),
            _ => Ok(Some(Clause::and(terminals)?)),
        }
    }

    fn operator_and_operand(value: &FieldValue) -> QueryResult<Option<(Operator, Operand)>> {
        Ok(match value {
            FieldValue::Text(text) if text.trim().is_empty() => None,
            FieldValue::Text(text) => Some((Operator::Equals, Operand::string(text.clone()))),
            FieldValue::List(items) if items.is_empty() => None,
            FieldValue::List(items) => Some((
                Operator::In,
                Operand::Multi(MultiValueOperand::from_strings(items.iter().cloned())?),
            )),
            FieldValue::Id(id) => Some((Operator::Equals, Operand::int(*id))),
            FieldValue::None => None,
        })
    }
}
