//! Clause handlers: the binding between JQL clause names and their
//! validation and sanitization behaviour.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::clause::{Operator, TerminalClause};
use crate::context::User;
use crate::message::MessageSet;
use crate::sanitize::{ClausePermissionSanitizer, NoOpClauseSanitizer};

/// The primary name and aliases a clause answers to.
///
/// Names keep their original spelling for display; comparisons ignore case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClauseNames {
    primary: String,
    names: Vec<String>,
}

impl ClauseNames {
    /// Creates clause names with only a primary name.
    pub fn new(primary: impl Into<String>) -> Self {
        let primary = primary.into();
        Self {
            names: vec![primary.clone()],
            primary,
        }
    }

    /// Adds aliases, skipping any that duplicate an existing name ignoring case.
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for alias in aliases {
            let alias = alias.into();
            if !self.contains(&alias) {
                self.names.push(alias);
            }
        }
        self
    }

    /// Returns the primary name.
    pub fn primary_name(&self) -> &str {
        &self.primary
    }

    /// Returns every name, primary first.
    pub fn jql_field_names(&self) -> &[String] {
        &self.names
    }

    /// Returns every name lower-cased, primary first.
    pub fn lowercase_names(&self) -> Vec<String> {
        self.names.iter().map(|n| n.to_lowercase()).collect()
    }

    /// Returns `true` if `name` matches any name, ignoring case.
    pub fn contains(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.names.iter().any(|n| n.to_lowercase() == name)
    }
}

impl fmt::Display for ClauseNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.names.join(", "))
    }
}

/// Validates the values and operator of a terminal clause.
pub trait ClauseValidator: Send + Sync {
    /// Returns any problems with `clause`. Never fails.
    fn validate(&self, user: Option<&User>, clause: &TerminalClause) -> MessageSet;
}

/// A validator that accepts every clause.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpClauseValidator;

impl ClauseValidator for NoOpClauseValidator {
    fn validate(&self, _user: Option<&User>, _clause: &TerminalClause) -> MessageSet {
        MessageSet::new()
    }
}

/// Rejects operators outside a fixed set.
#[derive(Debug, Clone)]
pub struct SupportedOperatorsValidator {
    supported: HashSet<Operator>,
}

impl SupportedOperatorsValidator {
    /// Creates a validator accepting only `operators`.
    pub fn new<I: IntoIterator<Item = Operator>>(operators: I) -> Self {
        Self {
            supported: operators.into_iter().collect(),
        }
    }

    /// Equality and list operators plus `IS`/`IS NOT`.
    pub fn equality() -> Self {
        Self::new([
            Operator::Equals,
            Operator::NotEquals,
            Operator::In,
            Operator::NotIn,
            Operator::Is,
            Operator::IsNot,
        ])
    }

    /// Equality operators plus the relational ones.
    pub fn equality_and_relational() -> Self {
        let mut validator = Self::equality();
        validator.supported.extend([
            Operator::LessThan,
            Operator::GreaterThan,
            Operator::LessThanEquals,
            Operator::GreaterThanEquals,
        ]);
        validator
    }

    /// `~`, `!~`, `IS` and `IS NOT`, for free-text fields.
    pub fn text() -> Self {
        Self::new([Operator::Like, Operator::NotLike, Operator::Is, Operator::IsNot])
    }

    /// Returns `true` if `operator` is accepted.
    pub fn supports(&self, operator: Operator) -> bool {
        self.supported.contains(&operator)
    }
}

impl ClauseValidator for SupportedOperatorsValidator {
    fn validate(&self, _user: Option<&User>, clause: &TerminalClause) -> MessageSet {
        if self.supports(clause.operator()) {
            MessageSet::new()
        } else {
            MessageSet::with_error(format!(
                "The operator '{}' is not supported by the '{}' field.",
                clause.operator(),
                clause.name()
            ))
        }
    }
}

/// Validation and permission sanitization for a set of clause names.
pub struct ClauseHandler {
    names: ClauseNames,
    field_id: Option<String>,
    validator: Arc<dyn ClauseValidator>,
    sanitizer: Arc<dyn ClausePermissionSanitizer>,
}

impl ClauseHandler {
    /// Creates a handler that accepts every value and sanitizes nothing.
    pub fn new(names: ClauseNames) -> Self {
        Self {
            names,
            field_id: None,
            validator: Arc::new(NoOpClauseValidator),
            sanitizer: Arc::new(NoOpClauseSanitizer),
        }
    }

    /// Sets the field this handler searches.
    pub fn with_field_id(mut self, field_id: impl Into<String>) -> Self {
        self.field_id = Some(field_id.into());
        self
    }

    /// Sets the clause validator.
    pub fn with_validator(mut self, validator: Arc<dyn ClauseValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Sets the permission sanitizer.
    pub fn with_sanitizer(mut self, sanitizer: Arc<dyn ClausePermissionSanitizer>) -> Self {
        self.sanitizer = sanitizer;
        self
    }

    /// Returns the clause names.
    pub fn names(&self) -> &ClauseNames {
        &self.names
    }

    /// Returns the backing field id, if any.
    pub fn field_id(&self) -> Option<&str> {
        self.field_id.as_deref()
    }

    /// Returns the clause validator.
    pub fn validator(&self) -> &dyn ClauseValidator {
        self.validator.as_ref()
    }

    /// Returns the permission sanitizer.
    pub fn sanitizer(&self) -> &dyn ClausePermissionSanitizer {
        self.sanitizer.as_ref()
    }
}

impl fmt::Debug for ClauseHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClauseHandler")
            .field("names", &self.names)
            .field("field_id", &self.field_id)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::Operand;

    #[test]
    fn test_clause_names_case_insensitive() {
        let names = ClauseNames::new("catalog").with_aliases(["cat", "CATALOG", "Cat"]);
        assert_eq!(names.primary_name(), "catalog");
        assert_eq!(names.jql_field_names().len(), 2);
        assert!(names.contains("CAT"));
        assert_eq!(names.lowercase_names(), vec!["catalog", "cat"]);
        assert_eq!(names.to_string(), "catalog, cat");
    }

    /// Lookups and alias deduplication fold case the same way as registry keys.
    #[test]
    fn test_clause_names_non_ascii_case() {
        let names = ClauseNames::new("Émetteur").with_aliases(["ÉMETTEUR", "émetteur", "Straße"]);
        assert_eq!(names.jql_field_names(), ["Émetteur", "Straße"]);
        assert!(names.contains("éMETTEUR"));
        assert!(names.contains("STRAßE"));
        for lowered in names.lowercase_names() {
            assert!(names.contains(&lowered));
        }
    }

    #[test]
    fn test_supported_operators_validator() {
        let validator = SupportedOperatorsValidator::equality();
        let ok = TerminalClause::new("status", Operator::In, Operand::Empty).unwrap();
        assert!(validator.validate(None, &ok).is_empty());

        let bad = TerminalClause::new("status", Operator::GreaterThan, Operand::int(1)).unwrap();
        let messages = validator.validate(None, &bad);
        assert!(messages.errors()[0].contains("'>'"));

        assert!(SupportedOperatorsValidator::equality_and_relational().supports(Operator::LessThan));
        assert!(SupportedOperatorsValidator::text().supports(Operator::Like));
    }

    #[test]
    fn test_handler_defaults() {
        let handler = ClauseHandler::new(ClauseNames::new("sku")).with_field_id("sku");
        assert_eq!(handler.field_id(), Some("sku"));
        let clause = TerminalClause::new("sku", Operator::Equals, Operand::string("X1")).unwrap();
        assert!(handler.validator().validate(None, &clause).is_empty());
        assert_eq!(
            handler.sanitizer().sanitize(None, &clause),
            crate::clause::Clause::Terminal(clause)
        );
    }
}
