//! Operand resolution.
//!
//! [`OperandResolver`] expands an [`Operand`] into the ordered list of
//! [`Literal`] values it stands for:
//!
//! | Operand | Literals |
//! |---------|----------|
//! | `Empty` | one empty literal |
//! | `Single` | one literal with the same payload |
//! | `Multi` | each item resolved in order and concatenated (fully flattened) |
//! | `Function` | delegated to the registered [`FunctionHandler`]; unknown functions yield nothing |
//!
//! Validation follows the same dispatch and returns a [`MessageSet`].

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::clause::{Clause, TerminalClause};
use crate::context::{QueryContext, User};
use crate::literal::Literal;
use crate::message::MessageSet;
use crate::operand::{FunctionOperand, Operand, SingleValue};

/// A query function such as `currentUser()` or `membersOf("group")`.
pub trait FunctionHandler: Send + Sync {
    /// Returns the function name. Lookups ignore case.
    fn name(&self) -> &str;

    /// Evaluates the function into literals.
    fn resolve(
        &self,
        context: &QueryContext,
        operand: &FunctionOperand,
        clause: &TerminalClause,
    ) -> Vec<Literal>;

    /// Validates the function call.
    fn validate(
        &self,
        user: Option<&User>,
        operand: &FunctionOperand,
        clause: &TerminalClause,
    ) -> MessageSet;

    /// Returns `true` if the function produces a list of values.
    fn is_list(&self) -> bool {
        false
    }

    /// Minimum number of arguments the function accepts.
    fn min_args(&self) -> usize {
        0
    }

    /// Rewrites arguments the user is not permitted to see.
    fn sanitize_operand(&self, _user: Option<&User>, operand: &FunctionOperand) -> FunctionOperand {
        operand.clone()
    }
}

/// Case-insensitive lookup of query functions.
pub trait FunctionRegistry: Send + Sync {
    /// Returns the handler registered under `name`, ignoring case.
    fn resolve(&self, name: &str) -> Option<Arc<dyn FunctionHandler>>;
}

/// A [`FunctionRegistry`] backed by a map.
#[derive(Default)]
pub struct InMemoryFunctionRegistry {
    handlers: HashMap<String, Arc<dyn FunctionHandler>>,
}

impl InMemoryFunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler under its lower-cased name, replacing any previous one.
    pub fn register(&mut self, handler: Arc<dyn FunctionHandler>) {
        self.handlers
            .insert(handler.name().to_lowercase(), handler);
    }

    /// Builder-style variant of [`register`](Self::register).
    pub fn with_handler(mut self, handler: Arc<dyn FunctionHandler>) -> Self {
        self.register(handler);
        self
    }

    /// Returns the number of registered functions.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns `true` if no functions are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl FunctionRegistry for InMemoryFunctionRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn FunctionHandler>> {
        self.handlers.get(&name.to_lowercase()).cloned()
    }
}

impl std::fmt::Debug for InMemoryFunctionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryFunctionRegistry")
            .field("functions", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

type LiteralKey = (QueryContext, Operand, TerminalClause);
type ClauseKey = (Option<User>, Clause);

/// Memo of values computed during one query evaluation.
///
/// A cache belongs to exactly one evaluation and is not shared across
/// threads; drop it when the evaluation finishes.
#[derive(Debug, Default)]
pub struct QueryCache {
    literals: RefCell<HashMap<LiteralKey, Vec<Literal>>>,
    sanitized: RefCell<HashMap<ClauseKey, Clause>>,
}

impl QueryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns previously resolved literals.
    pub fn get_literals(
        &self,
        context: &QueryContext,
        operand: &Operand,
        clause: &TerminalClause,
    ) -> Option<Vec<Literal>> {
        self.literals
            .borrow()
            .get(&(context.clone(), operand.clone(), clause.clone()))
            .cloned()
    }

    /// Stores resolved literals.
    pub fn set_literals(
        &self,
        context: &QueryContext,
        operand: &Operand,
        clause: &TerminalClause,
        literals: Vec<Literal>,
    ) {
        self.literals
            .borrow_mut()
            .insert((context.clone(), operand.clone(), clause.clone()), literals);
    }

    /// Returns a previously sanitized clause.
    pub fn get_sanitized(&self, user: Option<&User>, clause: &Clause) -> Option<Clause> {
        self.sanitized
            .borrow()
            .get(&(user.cloned(), clause.clone()))
            .cloned()
    }

    /// Stores a sanitized clause.
    pub fn set_sanitized(&self, user: Option<&User>, clause: &Clause, sanitized: Clause) {
        self.sanitized
            .borrow_mut()
            .insert((user.cloned(), clause.clone()), sanitized);
    }

    /// Returns the number of cached literal lists.
    pub fn literal_entries(&self) -> usize {
        self.literals.borrow().len()
    }
}

/// Expands operands into literals and validates them.
#[derive(Clone)]
pub struct OperandResolver {
    functions: Arc<dyn FunctionRegistry>,
}

impl OperandResolver {
    /// Creates a resolver backed by the given function registry.
    pub fn new(functions: Arc<dyn FunctionRegistry>) -> Self {
        Self { functions }
    }

    /// Returns the handler for a function name, if registered.
    pub fn function_handler(&self, name: &str) -> Option<Arc<dyn FunctionHandler>> {
        self.functions.resolve(name)
    }

    /// Resolves `operand` into an ordered list of literals.
    pub fn resolve(
        &self,
        context: &QueryContext,
        operand: &Operand,
        clause: &TerminalClause,
    ) -> Vec<Literal> {
        match operand {
            Operand::Empty => vec![Literal::empty(operand.clone())],
            Operand::Single(SingleValue::String(s)) => {
                vec![Literal::string(operand.clone(), s.clone())]
            }
            Operand::Single(SingleValue::Int(n)) => vec![Literal::int(operand.clone(), *n)],
            Operand::Multi(multi) => multi
                .values()
                .iter()
                .flat_map(|item| self.resolve(context, item, clause))
                .collect(),
            Operand::Function(function) => match self.functions.resolve(function.name()) {
                Some(handler) => handler.resolve(context, function, clause),
                None => {
                    debug!(
                        function = %function.name(),
                        clause_name = %clause.name(),
                        "Unknown function, resolving to no values"
                    );
                    Vec::new()
                }
            },
        }
    }

    /// Resolves through a per-evaluation cache.
    pub fn resolve_cached(
        &self,
        cache: &QueryCache,
        context: &QueryContext,
        operand: &Operand,
        clause: &TerminalClause,
    ) -> Vec<Literal> {
        if let Some(literals) = cache.get_literals(context, operand, clause) {
            return literals;
        }
        let literals = self.resolve(context, operand, clause);
        cache.set_literals(context, operand, clause, literals.clone());
        literals
    }

    /// Returns the only literal of a non-list operand.
    ///
    /// Returns `None` for list operands and for operands that resolve to
    /// anything other than exactly one literal.
    pub fn get_single_value(
        &self,
        context: &QueryContext,
        operand: &Operand,
        clause: &TerminalClause,
    ) -> Option<Literal> {
        if self.is_list_operand(operand) {
            return None;
        }
        let mut literals = self.resolve(context, operand, clause);
        if literals.len() == 1 { literals.pop() } else { None }
    }

    /// Validates `operand` for use in `clause`.
    ///
    /// Empty and single operands are always valid. Lists collect the messages
    /// of their items. Functions are checked against their minimum argument
    /// count and then delegate to their handler; an unknown function produces
    /// an error message.
    pub fn validate(
        &self,
        user: Option<&User>,
        operand: &Operand,
        clause: &TerminalClause,
    ) -> MessageSet {
        match operand {
            Operand::Empty | Operand::Single(_) => MessageSet::new(),
            Operand::Multi(multi) => {
                let mut messages = MessageSet::new();
                for item in multi.values() {
                    messages.add_message_set(&self.validate(user, item, clause));
                }
                messages
            }
            Operand::Function(function) => match self.functions.resolve(function.name()) {
                Some(handler) if function.args().len() < handler.min_args() => {
                    MessageSet::with_error(format!(
                        "Function '{}' expected at least {} argument(s) but received {}.",
                        function.name(),
                        handler.min_args(),
                        function.args().len()
                    ))
                }
                Some(handler) => handler.validate(user, function, clause),
                None => MessageSet::with_error(format!(
                    "Unable to find JQL function '{}'.",
                    function.name()
                )),
            },
        }
    }

    /// Returns `true` if the operand denotes a list of values.
    pub fn is_list_operand(&self, operand: &Operand) -> bool {
        match operand {
            Operand::Multi(_) => true,
            Operand::Function(function) => self
                .functions
                .resolve(function.name())
                .map(|handler| handler.is_list())
                .unwrap_or(false),
            Operand::Empty | Operand::Single(_) => false,
        }
    }

    /// Returns `true` if the operand denotes "no value".
    pub fn is_empty_operand(&self, operand: &Operand) -> bool {
        matches!(operand, Operand::Empty)
    }

    /// Returns `true` if the operand is a function call.
    pub fn is_function_operand(&self, operand: &Operand) -> bool {
        matches!(operand, Operand::Function(_))
    }

    /// Returns `true` unless the operand names an unregistered function.
    pub fn is_valid_operand(&self, operand: &Operand) -> bool {
        match operand {
            Operand::Function(function) => self.functions.resolve(function.name()).is_some(),
            Operand::Multi(multi) => multi.values().iter().all(|v| self.is_valid_operand(v)),
            Operand::Empty | Operand::Single(_) => true,
        }
    }

    /// Lets the registered handler hide function arguments from `user`.
    ///
    /// Unknown functions are returned unchanged.
    pub fn sanitize_function_operand(
        &self,
        user: Option<&User>,
        operand: &FunctionOperand,
    ) -> FunctionOperand {
        match self.functions.resolve(operand.name()) {
            Some(handler) => handler.sanitize_operand(user, operand),
            None => operand.clone(),
        }
    }
}

impl std::fmt::Debug for OperandResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperandResolver").finish_non_exhaustive()
    }
}
