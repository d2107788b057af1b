//! Read-only clause collectors used to decide whether a query fits the
//! simple search form.
//!
//! [`NamedClauseCollector`] finds matching terminals anywhere in the tree.
//! [`SimpleNavigatorCollector`] also records whether each match sits on a
//! pure `AND` path from the root; a match under `NOT` or `OR` makes the
//! result invalid for one-field-per-row display.

use std::collections::HashSet;

use crate::clause::{
    AndClause, ChangedClause, Clause, ClauseVisitor, NotClause, OrClause, TerminalClause,
    WasClause,
};

fn lowercase_set<I, S>(names: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| n.as_ref().to_lowercase())
        .collect()
}

/// Collects every terminal whose name is in a case-insensitive set.
#[derive(Debug, Clone)]
pub struct NamedClauseCollector {
    names: HashSet<String>,
    matches: Vec<TerminalClause>,
}

impl NamedClauseCollector {
    /// Creates a collector for the given clause names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: lowercase_set(names),
            matches: Vec::new(),
        }
    }

    /// Walks `clause` and returns the matching terminals in tree order.
    pub fn collect(mut self, clause: &Clause) -> Vec<TerminalClause> {
        clause.accept(&mut self);
        self.matches
    }

    fn visit_children(&mut self, children: &[Clause]) {
        for child in children {
            child.accept(self);
        }
    }
}

impl ClauseVisitor for NamedClauseCollector {
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
        if self.names.contains(&clause.name().to_lowercase()) {
            self.matches.push(clause.clone());
        }
    }

    fn visit_was(&mut self, _clause: &WasClause) {}

    fn visit_changed(&mut self, _clause: &ChangedClause) {}
}

/// Result of [`SimpleNavigatorCollector::collect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorCollection {
    /// Matching terminals in tree order.
    pub clauses: Vec<TerminalClause>,
    /// `false` if any match sits under a `NOT` or `OR`.
    pub valid: bool,
}

/// Collects matching terminals and tracks whether they are form-representable.
#[derive(Debug, Clone)]
pub struct SimpleNavigatorCollector {
    names: HashSet<String>,
    matches: Vec<TerminalClause>,
    valid_path: bool,
    valid: bool,
}

impl SimpleNavigatorCollector {
    /// Creates a collector for the given clause names.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: lowercase_set(names),
            matches: Vec::new(),
            valid_path: true,
            valid: true,
        }
    }

    /// Walks `clause` and returns the matches with their validity.
    pub fn collect(mut self, clause: &Clause) -> NavigatorCollection {
        clause.accept(&mut self);
        NavigatorCollection {
            clauses: self.matches,
            valid: self.valid,
        }
    }

    /// Visits `children` with the path marked invalid, then restores it.
    fn visit_invalid_subtree(&mut self, children: &[Clause]) {
        let previous = self.valid_path;
        self.valid_path = false;
        for child in children {
            child.accept(self);
        }
        self.valid_path = previous;
    }
}

impl ClauseVisitor for SimpleNavigatorCollector {
    type Output = ();

    fn visit_and(&mut self, clause: &AndClause) {
        for child in clause.clauses() {
            child.accept(self);
        }
    }

    fn visit_or(&mut self, clause: &OrClause) {
        self.visit_invalid_subtree(clause.clauses());
    }

    fn visit_not(&mut self, clause: &NotClause) {
        self.visit_invalid_subtree(std::slice::from_ref(clause.sub_clause()));
    }

    fn visit_terminal(&mut self, clause: &TerminalClause) {
        if self.names.contains(&clause.name().to_lowercase()) {
            self.matches.push(clause.clone());
            if !self.valid_path {
                self.valid = false;
            }
        }
    }

    fn visit_was(&mut self, _clause: &WasClause) {}

    fn visit_changed(&mut self, _clause: &ChangedClause) {}
}
