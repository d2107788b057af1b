//! Clause tree traversal.

use super::{AndClause, ChangedClause, NotClause, OrClause, TerminalClause, WasClause};

/// A consumer of the clause tree with one method per clause variant.
///
/// Call [`Clause::accept`](super::Clause::accept) to dispatch. Implementations
/// decide themselves whether and how to recurse into children.
pub trait ClauseVisitor {
    /// Value produced for each visited clause.
    type Output;

    /// Visits an AND clause.
    fn visit_and(&mut self, clause: &AndClause) -> Self::Output;

    /// Visits an OR clause.
    fn visit_or(&mut self, clause: &OrClause) -> Self::Output;

    /// Visits a NOT clause.
    fn visit_not(&mut self, clause: &NotClause) -> Self::Output;

    /// Visits a terminal clause.
    fn visit_terminal(&mut self, clause: &TerminalClause) -> Self::Output;

    /// Visits a WAS history clause.
    fn visit_was(&mut self, clause: &WasClause) -> Self::Output;

    /// Visits a CHANGED history clause.
    fn visit_changed(&mut self, clause: &ChangedClause) -> Self::Output;
}
