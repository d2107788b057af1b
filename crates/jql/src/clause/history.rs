//! Predicates attached to `WAS` and `CHANGED` clauses.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ClauseError;
use crate::operand::Operand;

/// Operators usable inside a history predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PredicateOperator {
    /// Change happened after the operand.
    After,
    /// Change happened before the operand.
    Before,
    /// Change happened within the operand range.
    During,
    /// Change happened on the operand date.
    On,
    /// Change was made by the operand user.
    By,
    /// Value changed from the operand.
    From,
    /// Value changed to the operand.
    To,
}

impl PredicateOperator {
    /// Returns the text form used in rendered queries.
    pub fn display(&self) -> &'static str {
        match self {
            PredicateOperator::After => "AFTER",
            PredicateOperator::Before => "BEFORE",
            PredicateOperator::During => "DURING",
            PredicateOperator::On => "ON",
            PredicateOperator::By => "BY",
            PredicateOperator::From => "FROM",
            PredicateOperator::To => "TO",
        }
    }
}

/// A qualifier on a history clause, e.g. `AFTER "2024-01-01" BY "kim"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryPredicate {
    /// A single operator/operand pair.
    Terminal {
        /// The predicate operator.
        operator: PredicateOperator,
        /// The predicate operand.
        operand: Operand,
    },
    /// All predicates must hold.
    And(PredicateConjunction),
}

/// One or more history predicates that must all hold.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<HistoryPredicate>", into = "Vec<HistoryPredicate>")]
pub struct PredicateConjunction {
    predicates: Vec<HistoryPredicate>,
}

impl PredicateConjunction {
    /// Creates a conjunction. Fails if `predicates` is empty.
    pub fn new(predicates: Vec<HistoryPredicate>) -> Result<Self, ClauseError> {
        if predicates.is_empty() {
            return Err(ClauseError::EmptyPredicate);
        }
        Ok(Self { predicates })
    }

    /// Returns the predicates in order.
    pub fn predicates(&self) -> &[HistoryPredicate] {
        &self.predicates
    }
}

impl TryFrom<Vec<HistoryPredicate>> for PredicateConjunction {
    type Error = ClauseError;

    fn try_from(predicates: Vec<HistoryPredicate>) -> Result<Self, Self::Error> {
        Self::new(predicates)
    }
}

impl From<PredicateConjunction> for Vec<HistoryPredicate> {
    fn from(conjunction: PredicateConjunction) -> Self {
        conjunction.predicates
    }
}

impl HistoryPredicate {
    /// Creates a single predicate.
    pub fn terminal(operator: PredicateOperator, operand: Operand) -> Self {
        HistoryPredicate::Terminal { operator, operand }
    }

    /// Creates a conjunction of predicates. Fails if `predicates` is empty.
    pub fn and(predicates: Vec<HistoryPredicate>) -> Result<Self, ClauseError> {
        PredicateConjunction::new(predicates).map(HistoryPredicate::And)
    }

    /// Returns the canonical text form.
    pub fn display_string(&self) -> String {
        match self {
            HistoryPredicate::Terminal { operator, operand } => {
                format!("{} {}", operator.display(), operand.display_string())
            }
            HistoryPredicate::And(conjunction) => conjunction
                .predicates()
                .iter()
                .map(HistoryPredicate::display_string)
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

impl fmt::Display for HistoryPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}
