//! Canonical text rendering of clause trees.
//!
//! A child is wrapped in `( ... )` only when it binds looser than its parent,
//! so `AND` inside `OR` stays bare while `OR` inside `AND` is parenthesized.
//!
//! ```text
//! {a = 1} AND {b = 2} AND NOT {c = 3} AND ( {d = 4} OR {e = 5} )
//! {a = 1} OR {b = 2} OR NOT {c = 3} OR {d = 4} AND {e = 5}
//! NOT ( {d = 4} AND {e = 5} )
//! ```

use std::fmt;

use super::{
    AndClause, ChangedClause, Clause, ClausePrecedence, ClauseVisitor, NotClause, OrClause,
    TerminalClause, WasClause,
};
use crate::text::encode_field_name;

/// Renders a clause tree to its canonical text form.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClauseRenderer;

impl ClauseRenderer {
    /// Renders `clause` to text.
    pub fn render(clause: &Clause) -> String {
        clause.accept(&mut ClauseRenderer)
    }

    fn render_child(&mut self, parent: ClausePrecedence, child: &Clause) -> String {
        let text = child.accept(self);
        if child.precedence() < parent {
            format!("( {} )", text)
        } else {
            text
        }
    }

    fn render_junction(
        &mut self,
        parent: ClausePrecedence,
        children: &[Clause],
        separator: &str,
    ) -> String {
        children
            .iter()
            .map(|child| self.render_child(parent, child))
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl ClauseVisitor for ClauseRenderer {
    type Output = String;

    fn visit_and(&mut self, clause: &AndClause) -> String {
        self.render_junction(ClausePrecedence::And, clause.clauses(), " AND ")
    }

    fn visit_or(&mut self, clause: &OrClause) -> String {
        self.render_junction(ClausePrecedence::Or, clause.clauses(), " OR ")
    }

    fn visit_not(&mut self, clause: &NotClause) -> String {
        format!(
            "NOT {}",
            self.render_child(ClausePrecedence::Not, clause.sub_clause())
        )
    }

    fn visit_terminal(&mut self, clause: &TerminalClause) -> String {
        let mut out = String::from("{");
        out.push_str(&encode_field_name(clause.name()));
        if let Some(property) = clause.property() {
            out.push('[');
            out.push_str(&property.keys_as_string());
            out.push(']');
            if !property.object_references().is_empty() {
                out.push('.');
                out.push_str(&property.object_references_as_string());
            }
        }
        out.push(' ');
        out.push_str(clause.operator().display());
        out.push(' ');
        out.push_str(&clause.operand().display_string());
        out.push('}');
        out
    }

    fn visit_was(&mut self, clause: &WasClause) -> String {
        let mut out = format!(
            "{{{} {} {}",
            encode_field_name(clause.name()),
            clause.operator().display(),
            clause.operand().display_string()
        );
        if let Some(predicate) = clause.predicate() {
            out.push(' ');
            out.push_str(&predicate.display_string());
        }
        out.push('}');
        out
    }

    fn visit_changed(&mut self, clause: &ChangedClause) -> String {
        let mut out = format!(
            "{{{} {}",
            encode_field_name(clause.name()),
            clause.operator().display()
        );
        if let Some(predicate) = clause.predicate() {
            out.push(' ');
            out.push_str(&predicate.display_string());
        }
        out.push('}');
        out
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&ClauseRenderer::render(self))
    }
}
