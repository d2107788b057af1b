//! Helios JQL Structured Query Engine
//!
//! This crate provides the clause model, operand resolution, search handler
//! registry and permission sanitization behind structured (JQL-style) search
//! of an asset catalog. Query text parsing and the physical search index are
//! supplied by callers through narrow traits.
//!
//! # Architecture
//!
//! - [`clause`] - And/Or/Not/Terminal/Was/Changed clause tree, visitor and renderer
//! - [`operand`] / [`literal`] - operands and the literals they resolve to
//! - [`text`] - bare-token rules, escaping and decoding
//! - [`resolver`] - operand resolution through a function registry
//! - [`registry`] - build-once index of clause names to handlers and searchers
//! - [`sanitize`] - permission sanitization of clause trees
//! - [`validate`] - whole-tree validation into a [`MessageSet`](message::MessageSet)
//! - [`collect`] - simple-form fit collectors
//! - [`form`] - form values to clause trees
//! - [`config`] - registry and binary configuration
//! - [`error`] - error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//!
//! use helios_jql::clause::{Clause, Operator};
//! use helios_jql::context::QueryContext;
//! use helios_jql::operand::Operand;
//! use helios_jql::resolver::{InMemoryFunctionRegistry, OperandResolver};
//!
//! let clause = Clause::and(vec![
//!     Clause::terminal("catalog", Operator::Equals, Operand::string("Hardware"))?,
//!     Clause::terminal(
//!         "status",
//!         Operator::In,
//!         Operand::multi(vec![Operand::string("active"), Operand::string("repair")])?,
//!     )?,
//! ])?;
//! assert_eq!(
//!     clause.to_string(),
//!     "{catalog = \"Hardware\"} AND {status IN (\"active\", \"repair\")}"
//! );
//!
//! let resolver = OperandResolver::new(Arc::new(InMemoryFunctionRegistry::new()));
//! let Clause::And(and) = &clause else { unreachable!() };
//! let Clause::Terminal(status) = &and.clauses()[1] else { unreachable!() };
//! let literals = resolver.resolve(&QueryContext::anonymous(), status.operand(), status);
//! assert_eq!(literals.len(), 2);
//! # Ok::<(), helios_jql::error::ClauseError>(())
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod clause;
pub mod collect;
pub mod config;
pub mod context;
pub mod error;
pub mod form;
pub mod literal;
pub mod message;
pub mod operand;
pub mod registry;
pub mod resolver;
pub mod sanitize;
pub mod text;
pub mod validate;

// Re-export commonly used types at crate root
pub use clause::{Clause, ClauseRenderer, ClauseVisitor, Operator, TerminalClause};
pub use context::{QueryContext, User};
pub use error::{QueryError, QueryResult};
pub use literal::Literal;
pub use message::MessageSet;
pub use operand::Operand;
pub use registry::{SearchHandlerManager, SearchHandlerRegistry};
pub use resolver::{OperandResolver, QueryCache};
pub use sanitize::ClauseSanitizer;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name.
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` takes precedence; otherwise this crate logs at `level`.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("helios_jql={}", level)));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
