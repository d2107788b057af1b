//! The boolean clause tree.
//!
//! A query is a tree of [`Clause`] values:
//!
//! - [`Clause::And`] / [`Clause::Or`] - one or more children
//! - [`Clause::Not`] - exactly one child
//! - [`Clause::Terminal`] - `name operator operand`, optionally with a
//!   [`Property`] path for entity-property clauses
//! - [`Clause::Was`] / [`Clause::Changed`] - history clauses, kept in the
//!   tree and rendered but not resolved
//!
//! Consumers walk the tree through [`ClauseVisitor`], whose six methods are
//! dispatched by an exhaustive `match` in [`Clause::accept`].
//!
//! # Example
//!
//! ```
//! use helios_jql::clause::{Clause, Operator};
//! use helios_jql::operand::Operand;
//!
//! let query = Clause::and(vec![
//!     Clause::terminal("status", Operator::Equals, Operand::string("active"))?,
//!     Clause::or(vec![
//!         Clause::terminal("owner", Operator::Equals, Operand::string("kim"))?,
//!         Clause::terminal("owner", Operator::Is, Operand::Empty)?,
//!     ])?,
//! ])?;
//!
//! assert_eq!(
//!     query.to_string(),
//!     "{status = \"active\"} AND ( {owner = \"kim\"} OR {owner IS EMPTY} )"
//! );
//! # Ok::<(), helios_jql::error::ClauseError>(())
//! ```

pub mod history;
pub mod operator;
pub mod render;
pub mod visitor;

use serde::{Deserialize, Serialize};

use crate::error::ClauseError;
use crate::operand::Operand;

pub use history::{HistoryPredicate, PredicateConjunction, PredicateOperator};
pub use operator::Operator;
pub use render::ClauseRenderer;
pub use visitor::ClauseVisitor;

/// Binding strength of each clause kind, used to decide parenthesization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClausePrecedence {
    /// OR binds loosest.
    Or = 0,
    /// AND.
    And = 1,
    /// NOT.
    Not = 2,
    /// Terminal and history clauses bind tightest.
    Terminal = 3,
}

/// A node in the boolean query tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Clause {
    /// All children must match.
    And(AndClause),
    /// At least one child must match.
    Or(OrClause),
    /// The child must not match.
    Not(NotClause),
    /// A single comparison.
    Terminal(TerminalClause),
    /// A historical value comparison.
    Was(WasClause),
    /// A historical change test.
    Changed(ChangedClause),
}

impl Clause {
    /// Creates an AND clause. Fails if `clauses` is empty.
    pub fn and(clauses: Vec<Clause>) -> Result<Self, ClauseError> {
        AndClause::new(clauses).map(Clause::And)
    }

    /// Creates an OR clause. Fails if `clauses` is empty.
    pub fn or(clauses: Vec<Clause>) -> Result<Self, ClauseError> {
        OrClause::new(clauses).map(Clause::Or)
    }

    /// Creates a NOT clause.
    pub fn not(clause: Clause) -> Self {
        Clause::Not(NotClause::new(clause))
    }

    /// Creates a terminal clause. Fails if `name` is empty.
    pub fn terminal(
        name: impl Into<String>,
        operator: Operator,
        operand: Operand,
    ) -> Result<Self, ClauseError> {
        TerminalClause::new(name, operator, operand).map(Clause::Terminal)
    }

    /// Dispatches to the visitor method for this variant.
    pub fn accept<V: ClauseVisitor>(&self, visitor: &mut V) -> V::Output {
        match self {
            Clause::And(clause) => visitor.visit_and(clause),
            Clause::Or(clause) => visitor.visit_or(clause),
            Clause::Not(clause) => visitor.visit_not(clause),
            Clause::Terminal(clause) => visitor.visit_terminal(clause),
            Clause::Was(clause) => visitor.visit_was(clause),
            Clause::Changed(clause) => visitor.visit_changed(clause),
        }
    }

    /// Returns the precedence of this clause kind.
    pub fn precedence(&self) -> ClausePrecedence {
        match self {
            Clause::Or(_) => ClausePrecedence::Or,
            Clause::And(_) => ClausePrecedence::And,
            Clause::Not(_) => ClausePrecedence::Not,
            Clause::Terminal(_) | Clause::Was(_) | Clause::Changed(_) => {
                ClausePrecedence::Terminal
            }
        }
    }

    /// Returns the clause name for terminal and history clauses.
    pub fn name(&self) -> Option<&str> {
        match self {
            Clause::Terminal(clause) => Some(clause.name()),
            Clause::Was(clause) => Some(clause.name()),
            Clause::Changed(clause) => Some(clause.name()),
            Clause::And(_) | Clause::Or(_) | Clause::Not(_) => None,
        }
    }

    /// Returns the direct children of this clause.
    pub fn children(&self) -> &[Clause] {
        match self {
            Clause::And(clause) => clause.clauses(),
            Clause::Or(clause) => clause.clauses(),
            Clause::Not(clause) => std::slice::from_ref(clause.sub_clause()),
            Clause::Terminal(_) | Clause::Was(_) | Clause::Changed(_) => &[],
        }
    }
}

/// Conjunction of one or more clauses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Clause>", into = "Vec<Clause>")]
pub struct AndClause {
    clauses: Vec<Clause>,
}

impl AndClause {
    /// Creates an AND clause. Fails if `clauses` is empty.
    pub fn new(clauses: Vec<Clause>) -> Result<Self, ClauseError> {
        if clauses.is_empty() {
            return Err(ClauseError::NoChildren { kind: "AND" });
        }
        Ok(Self { clauses })
    }

    /// Returns the children in order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Rebuilds the junction from the transformed children.
    pub fn map<F: FnMut(&Clause) -> Clause>(&self, f: F) -> Self {
        Self {
            clauses: self.clauses.iter().map(f).collect(),
        }
    }
}

impl TryFrom<Vec<Clause>> for AndClause {
    type Error = ClauseError;

    fn try_from(clauses: Vec<Clause>) -> Result<Self, Self::Error> {
        Self::new(clauses)
    }
}

impl From<AndClause> for Vec<Clause> {
    fn from(clause: AndClause) -> Self {
        clause.clauses
    }
}

/// Disjunction of one or more clauses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Clause>", into = "Vec<Clause>")]
pub struct OrClause {
    clauses: Vec<Clause>,
}

impl OrClause {
    /// Creates an OR clause. Fails if `clauses` is empty.
    pub fn new(clauses: Vec<Clause>) -> Result<Self, ClauseError> {
        if clauses.is_empty() {
            return Err(ClauseError::NoChildren { kind: "OR" });
        }
        Ok(Self { clauses })
    }

    /// Returns the children in order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Rebuilds the junction from the transformed children.
    pub fn map<F: FnMut(&Clause) -> Clause>(&self, f: F) -> Self {
        Self {
            clauses: self.clauses.iter().map(f).collect(),
        }
    }
}

impl TryFrom<Vec<Clause>> for OrClause {
    type Error = ClauseError;

    fn try_from(clauses: Vec<Clause>) -> Result<Self, Self::Error> {
        Self::new(clauses)
    }
}

impl From<OrClause> for Vec<Clause> {
    fn from(clause: OrClause) -> Self {
        clause.clauses
    }
}

/// Negation of a single clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotClause {
    clause: Box<Clause>,
}

impl NotClause {
    /// Creates a NOT clause.
    pub fn new(clause: Clause) -> Self {
        Self {
            clause: Box::new(clause),
        }
    }

    /// Returns the negated clause.
    pub fn sub_clause(&self) -> &Clause {
        &self.clause
    }

    /// Negates the transformed child.
    pub fn map<F: FnOnce(&Clause) -> Clause>(&self, f: F) -> Self {
        Self::new(f(&self.clause))
    }
}

/// An entity-property path: `name[key1.key2].ref1.ref2`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Property {
    keys: Vec<String>,
    #[serde(default)]
    object_references: Vec<String>,
}

impl Property {
    /// Creates a property path.
    pub fn new<K, R, S, T>(keys: K, object_references: R) -> Self
    where
        K: IntoIterator<Item = S>,
        R: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            keys: keys.into_iter().map(Into::into).collect(),
            object_references: object_references.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the property keys.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Returns the object reference path.
    pub fn object_references(&self) -> &[String] {
        &self.object_references
    }

    /// Returns the keys joined with `.`.
    pub fn keys_as_string(&self) -> String {
        self.keys.join(".")
    }

    /// Returns the object references joined with `.`.
    pub fn object_references_as_string(&self) -> String {
        self.object_references.join(".")
    }
}

/// A single `name operator operand` comparison.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "TerminalClauseDef")]
pub struct TerminalClause {
    name: String,
    operator: Operator,
    operand: Operand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    property: Option<Property>,
}

#[derive(Deserialize)]
struct TerminalClauseDef {
    name: String,
    operator: Operator,
    operand: Operand,
    #[serde(default)]
    property: Option<Property>,
}

impl TryFrom<TerminalClauseDef> for TerminalClause {
    type Error = ClauseError;

    fn try_from(def: TerminalClauseDef) -> Result<Self, Self::Error> {
        let clause = Self::new(def.name, def.operator, def.operand)?;
        Ok(match def.property {
            Some(property) => clause.with_property(property),
            None => clause,
        })
    }
}

impl TerminalClause {
    /// Creates a terminal clause. Fails if `name` is empty.
    pub fn new(
        name: impl Into<String>,
        operator: Operator,
        operand: Operand,
    ) -> Result<Self, ClauseError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ClauseError::EmptyName);
        }
        Ok(Self {
            name,
            operator,
            operand,
            property: None,
        })
    }

    /// Attaches a property path.
    pub fn with_property(mut self, property: Property) -> Self {
        self.property = Some(property);
        self
    }

    /// Returns a copy with a different operand.
    pub fn with_operand(&self, operand: Operand) -> Self {
        Self {
            operand,
            ..self.clone()
        }
    }

    /// Returns a copy with a different operator and operand.
    pub fn with_operator_and_operand(&self, operator: Operator, operand: Operand) -> Self {
        Self {
            operator,
            operand,
            ..self.clone()
        }
    }

    /// Returns the clause name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the operand.
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Returns the property path, if any.
    pub fn property(&self) -> Option<&Property> {
        self.property.as_ref()
    }
}

impl From<TerminalClause> for Clause {
    fn from(clause: TerminalClause) -> Self {
        Clause::Terminal(clause)
    }
}

/// A `name WAS operand [predicate]` history clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "WasClauseDef")]
pub struct WasClause {
    name: String,
    operator: Operator,
    operand: Operand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    predicate: Option<HistoryPredicate>,
}

#[derive(Deserialize)]
struct WasClauseDef {
    name: String,
    operator: Operator,
    operand: Operand,
    #[serde(default)]
    predicate: Option<HistoryPredicate>,
}

impl TryFrom<WasClauseDef> for WasClause {
    type Error = ClauseError;

    fn try_from(def: WasClauseDef) -> Result<Self, Self::Error> {
        Self::new(def.name, def.operator, def.operand, def.predicate)
    }
}

impl WasClause {
    /// Creates a history value clause. Fails if `name` is empty.
    pub fn new(
        name: impl Into<String>,
        operator: Operator,
        operand: Operand,
        predicate: Option<HistoryPredicate>,
    ) -> Result<Self, ClauseError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ClauseError::EmptyName);
        }
        Ok(Self {
            name,
            operator,
            operand,
            predicate,
        })
    }

    /// Returns the clause name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the operator.
    pub fn operator(&self) -> Operator {
        self.operator
    }

    /// Returns the operand.
    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// Returns the history predicate, if any.
    pub fn predicate(&self) -> Option<&HistoryPredicate> {
        self.predicate.as_ref()
    }
}

/// A `name CHANGED [predicate]` history clause.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "ChangedClauseDef")]
pub struct ChangedClause {
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    predicate: Option<HistoryPredicate>,
}

#[derive(Deserialize)]
struct ChangedClauseDef {
    name: String,
    #[serde(default)]
    predicate: Option<HistoryPredicate>,
}

impl TryFrom<ChangedClauseDef> for ChangedClause {
    type Error = ClauseError;

    fn try_from(def: ChangedClauseDef) -> Result<Self, Self::Error> {
        Self::new(def.name, def.predicate)
    }
}

impl ChangedClause {
    /// Creates a history change clause. Fails if `name` is empty.
    pub fn new(
        name: impl Into<String>,
        predicate: Option<HistoryPredicate>,
    ) -> Result<Self, ClauseError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ClauseError::EmptyName);
        }
        Ok(Self { name, predicate })
    }

    /// Returns the clause name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Always [`Operator::Changed`].
    pub fn operator(&self) -> Operator {
        Operator::Changed
    }

    /// Returns the history predicate, if any.
    pub fn predicate(&self) -> Option<&HistoryPredicate> {
        self.predicate.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn term(name: &str, value: i64) -> Clause {
        Clause::terminal(name, Operator::Equals, Operand::int(value)).unwrap()
    }

    #[test]
    fn test_junctions_require_children() {
        assert_eq!(
            Clause::and(vec![]).unwrap_err(),
            ClauseError::NoChildren { kind: "AND" }
        );
        assert_eq!(
            Clause::or(vec![]).unwrap_err(),
            ClauseError::NoChildren { kind: "OR" }
        );
    }

    #[test]
    fn test_single_child_junctions() {
        let and = Clause::and(vec![term("a", 1)]).unwrap();
        assert_eq!(and.children().len(), 1);
        let or = Clause::or(vec![term("a", 1)]).unwrap();
        assert_eq!(or.children().len(), 1);
    }

    #[test]
    fn test_terminal_requires_name() {
        assert_eq!(
            TerminalClause::new("", Operator::Equals, Operand::Empty).unwrap_err(),
            ClauseError::EmptyName
        );
        assert_eq!(
            ChangedClause::new("", None).unwrap_err(),
            ClauseError::EmptyName
        );
    }

    #[test]
    fn test_precedence_order() {
        assert!(ClausePrecedence::Terminal > ClausePrecedence::Not);
        assert!(ClausePrecedence::Not > ClausePrecedence::And);
        assert!(ClausePrecedence::And > ClausePrecedence::Or);

        let was = Clause::Was(
            WasClause::new("status", Operator::Was, Operand::string("lost"), None).unwrap(),
        );
        assert_eq!(was.precedence(), ClausePrecedence::Terminal);
    }

    #[test]
    fn test_names_and_children() {
        let not = Clause::not(term("a", 1));
        assert_eq!(not.name(), None);
        assert_eq!(not.children()[0].name(), Some("a"));
    }

    #[test]
    fn test_serde_round_trip_and_invariants() {
        let clause = Clause::and(vec![
            term("a", 1),
            Clause::not(
                Clause::terminal("b", Operator::In, Operand::multi(vec![Operand::string("x")]).unwrap())
                    .unwrap(),
            ),
        ])
        .unwrap();
        let json = serde_json::to_string(&clause).unwrap();
        let back: Clause = serde_json::from_str(&json).unwrap();
        assert_eq!(back, clause);

        assert!(serde_json::from_str::<Clause>(r#"{"and":[]}"#).is_err());
        assert!(
            serde_json::from_str::<Clause>(
                r#"{"terminal":{"name":"","operator":"=","operand":"empty"}}"#
            )
            .is_err()
        );
    }
}
