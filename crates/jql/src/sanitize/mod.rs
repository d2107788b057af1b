//! Permission sanitization of clause trees.
//!
//! [`ClauseSanitizer`] rewrites a clause tree so that values the requester
//! may not see are replaced by opaque equivalents. Junctions and negations
//! are rebuilt with the same shape; each terminal is handed to the
//! [`ClausePermissionSanitizer`] of every handler registered for its name.
//! History clauses pass through unchanged.
//!
//! When a sanitizer turns a single value into a list, the operator is
//! rewritten by [`reconcile_operand_change`]:
//!
//! | Original operator | Result |
//! |-------------------|--------|
//! | `=`, `IN` | `IN` |
//! | `!=`, `NOT IN` | `NOT IN` |
//! | `<`, `>`, `<=`, `>=` | `OR` of one terminal per value |
//!
//! The relational decomposition compares each value on its own and is an
//! approximation of the original comparison, not an equivalent.

pub mod literal;

use tracing::warn;

use crate::clause::{
    AndClause, ChangedClause, Clause, ClauseVisitor, NotClause, Operator, OrClause,
    TerminalClause, WasClause,
};
use crate::context::User;
use crate::operand::Operand;
use crate::registry::SearchHandlerRegistry;
use crate::resolver::{OperandResolver, QueryCache};

pub use literal::{
    EntityLiteralSanitizer, EntityLiteralSanitizerBuilder, EntityNameResolver, IndexInfoResolver,
    LiteralCardinality, LiteralClauseSanitizer, LiteralSanitizeResult, LiteralSanitizer,
    PermissionCheck,
};

/// Hides values of one terminal clause from a requester.
pub trait ClausePermissionSanitizer: Send + Sync {
    /// Returns `clause` rewritten for `user`. Never fails.
    fn sanitize(&self, user: Option<&User>, clause: &TerminalClause) -> Clause;
}

/// A sanitizer that returns every clause unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoOpClauseSanitizer;

impl ClausePermissionSanitizer for NoOpClauseSanitizer {
    fn sanitize(&self, _user: Option<&User>, clause: &TerminalClause) -> Clause {
        Clause::Terminal(clause.clone())
    }
}

/// Walks a clause tree applying the registered permission sanitizers.
pub struct ClauseSanitizer<'a> {
    registry: &'a SearchHandlerRegistry,
    resolver: &'a OperandResolver,
    cache: Option<&'a QueryCache>,
}

impl<'a> ClauseSanitizer<'a> {
    /// Creates a sanitizer over a built registry.
    pub fn new(registry: &'a SearchHandlerRegistry, resolver: &'a OperandResolver) -> Self {
        Self {
            registry,
            resolver,
            cache: None,
        }
    }

    /// Memoizes whole-tree results in `cache`.
    pub fn with_cache(mut self, cache: &'a QueryCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Returns `clause` with every value hidden from `user` replaced.
    pub fn sanitize(&self, user: Option<&User>, clause: &Clause) -> Clause {
        if let Some(cached) = self.cache.and_then(|cache| cache.get_sanitized(user, clause)) {
            return cached;
        }
        let sanitized = clause.accept(&mut SanitizingVisitor {
            sanitizer: self,
            user,
        });
        if let Some(cache) = self.cache {
            cache.set_sanitized(user, clause, sanitized.clone());
        }
        sanitized
    }

    fn sanitize_terminal(&self, user: Option<&User>, clause: &TerminalClause) -> Clause {
        let handlers = self.registry.get_clause_handler_for_user(user, clause.name());
        if handlers.is_empty() {
            return Clause::Terminal(clause.clone());
        }

        let rewritten = clause.with_operand(self.sanitize_operand(user, clause.operand()));

        let mut results: Vec<Clause> = Vec::with_capacity(handlers.len());
        for handler in &handlers {
            let result = handler.sanitizer().sanitize(user, &rewritten);
            if !results.contains(&result) {
                results.push(result);
            }
        }

        if results.len() == 1 {
            return results.remove(0);
        }
        OrClause::new(results)
            .map(Clause::Or)
            .unwrap_or(Clause::Terminal(rewritten))
    }

    /// Sanitizes function arguments at any depth. Never changes arity.
    fn sanitize_operand(&self, user: Option<&User>, operand: &Operand) -> Operand {
        match operand {
            Operand::Function(function) => {
                Operand::Function(self.resolver.sanitize_function_operand(user, function))
            }
            Operand::Multi(multi) => {
                Operand::Multi(multi.map(|item| self.sanitize_operand(user, item)))
            }
            Operand::Empty | Operand::Single(_) => operand.clone(),
        }
    }
}

impl std::fmt::Debug for ClauseSanitizer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClauseSanitizer")
            .field("cached", &self.cache.is_some())
            .finish_non_exhaustive()
    }
}

struct SanitizingVisitor<'s, 'a> {
    sanitizer: &'s ClauseSanitizer<'a>,
    user: Option<&'s User>,
}

impl ClauseVisitor for SanitizingVisitor<'_, '_> {
    type Output = Clause;

    fn visit_and(&mut self, clause: &AndClause) -> Clause {
        Clause::And(clause.map(|child| child.accept(&mut *self)))
    }

    fn visit_or(&mut self, clause: &OrClause) -> Clause {
        Clause::Or(clause.map(|child| child.accept(&mut *self)))
    }

    fn visit_not(&mut self, clause: &NotClause) -> Clause {
        Clause::Not(clause.map(|child| child.accept(&mut *self)))
    }

    fn visit_terminal(&mut self, clause: &TerminalClause) -> Clause {
        self.sanitizer.sanitize_terminal(self.user, clause)
    }

    fn visit_was(&mut self, clause: &WasClause) -> Clause {
        Clause::Was(clause.clone())
    }

    fn visit_changed(&mut self, clause: &ChangedClause) -> Clause {
        Clause::Changed(clause.clone())
    }
}

/// Rebuilds `clause` around a sanitized operand, fixing up the operator when
/// a single value became a list.
///
/// Operators that cannot take a list (for example `~`) leave the original
/// clause in place and log a warning.
pub fn reconcile_operand_change(clause: &TerminalClause, operand: Operand) -> Clause {
    let list = match (clause.operand(), &operand) {
        (Operand::Single(_) | Operand::Empty, Operand::Multi(list)) => list,
        _ => return Clause::Terminal(clause.with_operand(operand)),
    };

    let operator = clause.operator();
    if operator.is_positive_equality() {
        return Clause::Terminal(clause.with_operator_and_operand(Operator::In, operand));
    }
    if operator.is_negative_equality() {
        return Clause::Terminal(clause.with_operator_and_operand(Operator::NotIn, operand));
    }
    if operator.is_relational() {
        let terminals: Vec<Clause> = list
            .values()
            .iter()
            .map(|value| Clause::Terminal(clause.with_operand(value.clone())))
            .collect();
        return match OrClause::new(terminals) {
            Ok(or) => Clause::Or(or),
            Err(_) => Clause::Terminal(clause.clone()),
        };
    }

    warn!(
        clause_name = %clause.name(),
        operator = %operator,
        "Cannot apply a list of sanitized values to this operator, keeping the original clause"
    );
    Clause::Terminal(clause.clone())
}
