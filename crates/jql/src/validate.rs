//! Whole-tree query validation.

use crate::clause::{
    AndClause, ChangedClause, Clause, ClauseVisitor, NotClause, OrClause, TerminalClause,
    WasClause,
};
use crate::context::User;
use crate::message::MessageSet;
use crate::registry::SearchHandlerRegistry;
use crate::resolver::OperandResolver;

/// Validates every terminal of a clause tree against the registry.
///
/// A terminal with no registered handler produces a "does not exist" error;
/// otherwise each handler's validator and the operand validation are merged.
/// History clauses are only checked for a registered name.
#[derive(Debug)]
pub struct QueryValidator<'a> {
    registry: &'a SearchHandlerRegistry,
    resolver: &'a OperandResolver,
}

impl<'a> QueryValidator<'a> {
    /// Creates a validator over a built registry.
    pub fn new(registry: &'a SearchHandlerRegistry, resolver: &'a OperandResolver) -> Self {
        Self { registry, resolver }
    }

    /// Validates `clause` for `user`.
    pub fn validate(&self, user: Option<&User>, clause: &Clause) -> MessageSet {
        let mut visitor = ValidatingVisitor {
            validator: self,
            user,
            messages: MessageSet::new(),
        };
        clause.accept(&mut visitor);
        visitor.messages
    }

    fn validate_terminal(&self, user: Option<&User>, clause: &TerminalClause) -> MessageSet {
        let handlers = self.registry.get_clause_handler_for_user(user, clause.name());
        if handlers.is_empty() {
            return MessageSet::with_error(unknown_field(clause.name()));
        }

        let mut messages = MessageSet::new();
        for handler in &handlers {
            messages.add_message_set(&handler.validator().validate(user, clause));
        }
        messages.add_message_set(&self.resolver.validate(user, clause.operand(), clause));
        messages
    }

    fn validate_name(&self, user: Option<&User>, name: &str) -> MessageSet {
        if self.registry.get_clause_handler_for_user(user, name).is_empty() {
            MessageSet::with_error(unknown_field(name))
        } else {
            MessageSet::new()
        }
    }
}

fn unknown_field(name: &str) -> String {
    format!(
        "Field '{}' does not exist or you do not have permission to view it.",
        name
    )
}

struct ValidatingVisitor<'v, 'a> {
    validator: &'v QueryValidator<'a>,
    user: Option<&'v User>,
    messages: MessageSet,
}

impl ValidatingVisitor<'_, '_> {
    fn visit_children(&mut self, children: &[Clause]) {
        for child in children {
            child.accept(self);
        }
    }
}

impl ClauseVisitor for ValidatingVisitor<'_, '_> {
    type Output = ();

    fn visit_and(&mut self, clause: &AndClause) {
        self.visit_children(clause.clauses());
    }

    fn visit_or(&mut self, clause: &OrClause) {
        self.visit_children(clause.clauses());
    }

    fn visit_not(&mut self, clause: &NotClause) {
        clause.sub_clause().accept(self);
    }

    fn visit_terminal(&mut self, clause: &TerminalClause) {
        let messages = self.validator.validate_terminal(self.user, clause);
        self.messages.add_message_set(&messages);
    }

    fn visit_was(&mut self, clause: &WasClause) {
        let messages = self.validator.validate_name(self.user, clause.name());
        self.messages.add_message_set(&messages);
    }

    fn visit_changed(&mut self, clause: &ChangedClause) {
        let messages = self.validator.validate_name(self.user, clause.name());
        self.messages.add_message_set(&messages);
    }
}
