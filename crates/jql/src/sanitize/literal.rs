//! Literal-level sanitization.
//!
//! A [`LiteralSanitizer`] swaps the readable form of an entity (a name, key
//! or SKU) for its numeric id when the requester cannot view that entity.
//! [`LiteralClauseSanitizer`] applies one to a terminal clause and rebuilds
//! the operand, rewriting the operator if a single value became a list.
//!
//! Two cardinality policies exist:
//!
//! - [`LiteralCardinality::OneToOne`]: a value maps to at most one id, so the
//!   number of literals never grows (catalogs).
//! - [`LiteralCardinality::OneToMany`]: a value may map to several ids, e.g. a
//!   SKU shared by several assets, so one literal can expand into many.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::debug;

use super::{ClausePermissionSanitizer, reconcile_operand_change};
use crate::clause::{Clause, TerminalClause};
use crate::context::{QueryContext, User};
use crate::error::SanitizeError;
use crate::literal::Literal;
use crate::operand::{MultiValueOperand, Operand};
use crate::resolver::OperandResolver;

/// How many ids one readable value may map to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralCardinality {
    /// At most one id per value.
    OneToOne,
    /// Any number of ids per value.
    OneToMany,
}

/// Output of [`LiteralSanitizer::sanitize_literals`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralSanitizeResult {
    /// `true` if any literal was replaced.
    pub modified: bool,
    /// The sanitized literals, or the input when unmodified.
    pub literals: Vec<Literal>,
}

impl LiteralSanitizeResult {
    /// A result that leaves `literals` untouched.
    pub fn unmodified(literals: &[Literal]) -> Self {
        Self {
            modified: false,
            literals: literals.to_vec(),
        }
    }
}

/// Replaces literals naming entities the requester cannot view.
pub trait LiteralSanitizer: Send + Sync {
    /// Sanitizes `literals` for `user`.
    fn sanitize_literals(&self, user: Option<&User>, literals: &[Literal]) -> LiteralSanitizeResult;

    /// Returns the cardinality policy of this sanitizer.
    fn cardinality(&self) -> LiteralCardinality;
}

/// Looks up entities by id.
pub trait EntityNameResolver<E>: Send + Sync {
    /// Returns the entity with `id`, if it exists.
    fn get(&self, id: i64) -> Option<E>;
}

/// Maps a readable value or id to the id strings stored in the search index.
pub trait IndexInfoResolver: Send + Sync {
    /// Returns the indexed id strings for `name_or_id`.
    fn get_indexed_values(&self, name_or_id: &str) -> Vec<String>;
}

/// Decides whether a user may view an entity.
pub trait PermissionCheck<E>: Send + Sync {
    /// Returns `true` if `user` may view `entity`.
    fn can_view(&self, user: Option<&User>, entity: &E) -> bool;
}

/// A [`LiteralSanitizer`] backed by entity, index and permission lookups.
pub struct EntityLiteralSanitizer<E> {
    name: String,
    cardinality: LiteralCardinality,
    entities: Arc<dyn EntityNameResolver<E>>,
    index: Arc<dyn IndexInfoResolver>,
    permissions: Arc<dyn PermissionCheck<E>>,
}

impl<E> EntityLiteralSanitizer<E> {
    /// Starts a builder with the given name and cardinality.
    pub fn builder(
        name: impl Into<String>,
        cardinality: LiteralCardinality,
    ) -> EntityLiteralSanitizerBuilder<E> {
        EntityLiteralSanitizerBuilder {
            name: name.into(),
            cardinality,
            entities: None,
            index: None,
            permissions: None,
            _entity: PhantomData,
        }
    }

    /// Builder for assets, where one SKU may match several assets.
    pub fn asset_builder() -> EntityLiteralSanitizerBuilder<E> {
        Self::builder("asset", LiteralCardinality::OneToMany)
    }

    /// Builder for catalogs, where names and keys are unique.
    pub fn catalog_builder() -> EntityLiteralSanitizerBuilder<E> {
        Self::builder("catalog", LiteralCardinality::OneToOne)
    }

    /// Returns the sanitizer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ids to substitute for `literal`, or `None` to keep it.
    fn replacement_ids(&self, user: Option<&User>, literal: &Literal) -> Option<Vec<i64>> {
        let key = literal.lookup_key()?;

        let mut ids: Vec<i64> = Vec::new();
        for value in self.index.get_indexed_values(&key) {
            match value.parse::<i64>() {
                Ok(id) if !ids.contains(&id) => ids.push(id),
                Ok(_) => {}
                Err(_) => debug!(
                    sanitizer = %self.name,
                    value = %value,
                    "Ignoring non-numeric indexed value"
                ),
            }
        }
        if self.cardinality == LiteralCardinality::OneToOne {
            ids.truncate(1);
        }

        let entities: Vec<(i64, E)> = ids
            .into_iter()
            .filter_map(|id| self.entities.get(id).map(|entity| (id, entity)))
            .collect();
        if entities.is_empty() {
            return None;
        }
        if entities
            .iter()
            .all(|(_, entity)| self.permissions.can_view(user, entity))
        {
            return None;
        }

        let ids: Vec<i64> = entities.into_iter().map(|(id, _)| id).collect();
        if ids.len() == 1 && literal.as_int() == Some(ids[0]) {
            return None;
        }
        Some(ids)
    }
}

impl<E> LiteralSanitizer for EntityLiteralSanitizer<E>
where
    E: Send + Sync,
{
    fn sanitize_literals(&self, user: Option<&User>, literals: &[Literal]) -> LiteralSanitizeResult {
        let mut modified = false;
        let mut sanitized: Vec<Literal> = Vec::with_capacity(literals.len());

        for literal in literals {
            match self.replacement_ids(user, literal) {
                Some(ids) => {
                    modified = true;
                    for id in ids {
                        push_unique(&mut sanitized, Literal::int(literal.source().clone(), id));
                    }
                }
                None => push_unique(&mut sanitized, literal.clone()),
            }
        }

        if !modified {
            return LiteralSanitizeResult::unmodified(literals);
        }
        debug!(
            sanitizer = %self.name,
            before = literals.len(),
            after = sanitized.len(),
            "Replaced literals hidden from the requester"
        );
        LiteralSanitizeResult {
            modified,
            literals: sanitized,
        }
    }

    fn cardinality(&self) -> LiteralCardinality {
        self.cardinality
    }
}

impl<E> fmt::Debug for EntityLiteralSanitizer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityLiteralSanitizer")
            .field("name", &self.name)
            .field("cardinality", &self.cardinality)
            .finish_non_exhaustive()
    }
}

/// Builder for [`EntityLiteralSanitizer`]. Every collaborator is required.
pub struct EntityLiteralSanitizerBuilder<E> {
    name: String,
    cardinality: LiteralCardinality,
    entities: Option<Arc<dyn EntityNameResolver<E>>>,
    index: Option<Arc<dyn IndexInfoResolver>>,
    permissions: Option<Arc<dyn PermissionCheck<E>>>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> EntityLiteralSanitizerBuilder<E> {
    /// Sets the entity lookup.
    pub fn entity_resolver(mut self, resolver: Arc<dyn EntityNameResolver<E>>) -> Self {
        self.entities = Some(resolver);
        self
    }

    /// Sets the index lookup.
    pub fn index_resolver(mut self, resolver: Arc<dyn IndexInfoResolver>) -> Self {
        self.index = Some(resolver);
        self
    }

    /// Sets the permission check.
    pub fn permission_check(mut self, check: Arc<dyn PermissionCheck<E>>) -> Self {
        self.permissions = Some(check);
        self
    }

    /// Builds the sanitizer, failing if a collaborator is missing.
    pub fn build(self) -> Result<EntityLiteralSanitizer<E>, SanitizeError> {
        let missing = |collaborator: &'static str| SanitizeError::MissingCollaborator {
            sanitizer: self.name.clone(),
            collaborator,
        };
        let entities = self.entities.clone().ok_or_else(|| missing("entity resolver"))?;
        let index = self.index.clone().ok_or_else(|| missing("index resolver"))?;
        let permissions = self
            .permissions
            .clone()
            .ok_or_else(|| missing("permission check"))?;

        Ok(EntityLiteralSanitizer {
            name: self.name,
            cardinality: self.cardinality,
            entities,
            index,
            permissions,
        })
    }
}

/// A [`ClausePermissionSanitizer`] that sanitizes a clause's resolved literals.
pub struct LiteralClauseSanitizer {
    resolver: OperandResolver,
    literals: Arc<dyn LiteralSanitizer>,
}

impl LiteralClauseSanitizer {
    /// Creates a clause sanitizer around a literal sanitizer.
    pub fn new(resolver: OperandResolver, literals: Arc<dyn LiteralSanitizer>) -> Self {
        Self { resolver, literals }
    }

    /// Returns the sanitized operand, or `None` if nothing changed.
    ///
    /// List items are sanitized one by one so that untouched items keep
    /// their original form; an item that expands splices its values into
    /// the list. Functions and `EMPTY` are left alone.
    fn sanitize_operand(
        &self,
        context: &QueryContext,
        operand: &Operand,
        clause: &TerminalClause,
    ) -> Option<Operand> {
        match operand {
            Operand::Single(_) => {
                let literals = self.resolver.resolve(context, operand, clause);
                let result = self.literals.sanitize_literals(context.user(), &literals);
                if result.modified {
                    operand_from_literals(&result.literals)
                } else {
                    None
                }
            }
            Operand::Multi(multi) => {
                let mut changed = false;
                let mut items: Vec<Operand> = Vec::with_capacity(multi.len());
                for item in multi.values() {
                    match self.sanitize_operand(context, item, clause) {
                        Some(Operand::Multi(expanded)) if !item.is_multi() => {
                            changed = true;
                            items.extend(expanded.values().iter().cloned());
                        }
                        Some(replacement) => {
                            changed = true;
                            items.push(replacement);
                        }
                        None => items.push(item.clone()),
                    }
                }
                if !changed {
                    return None;
                }
                MultiValueOperand::new(items).ok().map(Operand::Multi)
            }
            Operand::Empty | Operand::Function(_) => None,
        }
    }
}

impl ClausePermissionSanitizer for LiteralClauseSanitizer {
    fn sanitize(&self, user: Option<&User>, clause: &TerminalClause) -> Clause {
        let context = QueryContext::new(user.cloned());
        match self.sanitize_operand(&context, clause.operand(), clause) {
            Some(operand) => reconcile_operand_change(clause, operand),
            None => Clause::Terminal(clause.clone()),
        }
    }
}

impl fmt::Debug for LiteralClauseSanitizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiteralClauseSanitizer")
            .field("cardinality", &self.literals.cardinality())
            .finish_non_exhaustive()
    }
}

fn operand_from_literals(literals: &[Literal]) -> Option<Operand> {
    match literals {
        [] => None,
        [single] => Some(single.to_operand()),
        many => MultiValueOperand::new(many.iter().map(Literal::to_operand).collect())
            .ok()
            .map(Operand::Multi),
    }
}

fn push_unique(literals: &mut Vec<Literal>, literal: Literal) {
    if !literals.contains(&literal) {
        literals.push(literal);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::clause::Operator;
    use crate::resolver::InMemoryFunctionRegistry;

    #[derive(Debug, Clone, PartialEq)]
    struct Catalog {
        restricted: bool,
    }

    struct Catalogs(HashMap<i64, Catalog>);

    impl EntityNameResolver<Catalog> for Catalogs {
        fn get(&self, id: i64) -> Option<Catalog> {
            self.0.get(&id).cloned()
        }
    }

    struct Index(HashMap<String, Vec<String>>);

    impl IndexInfoResolver for Index {
        fn get_indexed_values(&self, name_or_id: &str) -> Vec<String> {
            if name_or_id.parse::<i64>().is_ok() {
                return vec![name_or_id.to_string()];
            }
            self.0.get(&name_or_id.to_lowercase()).cloned().unwrap_or_default()
        }
    }

    struct Restricted;

    impl PermissionCheck<Catalog> for Restricted {
        fn can_view(&self, _user: Option<&User>, entity: &Catalog) -> bool {
            !entity.restricted
        }
    }

    fn catalogs() -> Arc<Catalogs> {
        Arc::new(Catalogs(HashMap::from([
            (1, Catalog { restricted: false }),
            (2, Catalog { restricted: true }),
            (3, Catalog { restricted: true }),
        ])))
    }

    fn index() -> Arc<Index> {
        Arc::new(Index(HashMap::from([
            ("hardware".to_string(), vec!["1".to_string()]),
            ("secret".to_string(), vec!["2".to_string(), "3".to_string()]),
        ])))
    }

    fn sanitizer(cardinality: LiteralCardinality) -> EntityLiteralSanitizer<Catalog> {
        EntityLiteralSanitizer::builder("catalog", cardinality)
            .entity_resolver(catalogs())
            .index_resolver(index())
            .permission_check(Arc::new(Restricted))
            .build()
            .unwrap()
    }

    fn literal(value: &str) -> Literal {
        Literal::string(Operand::string(value), value)
    }

    #[test]
    fn test_visible_literals_are_untouched() {
        let result =
            sanitizer(LiteralCardinality::OneToOne).sanitize_literals(None, &[literal("hardware")]);
        assert!(!result.modified);
        assert_eq!(result.literals, vec![literal("hardware")]);
    }

    #[test]
    fn test_unknown_literals_are_untouched() {
        let result =
            sanitizer(LiteralCardinality::OneToMany).sanitize_literals(None, &[literal("nothing")]);
        assert!(!result.modified);
    }

    #[test]
    fn test_one_to_one_keeps_cardinality() {
        let s = sanitizer(LiteralCardinality::OneToOne);
        assert_eq!(s.cardinality(), LiteralCardinality::OneToOne);
        let result = s.sanitize_literals(None, &[literal("secret")]);
        assert!(result.modified);
        assert_eq!(result.literals.len(), 1);
        assert_eq!(result.literals[0].as_int(), Some(2));
    }

    #[test]
    fn test_one_to_many_expands() {
        let result =
            sanitizer(LiteralCardinality::OneToMany).sanitize_literals(None, &[literal("secret")]);
        assert!(result.modified);
        let ids: Vec<i64> = result.literals.iter().filter_map(Literal::as_int).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn test_results_are_deduplicated() {
        let source = Operand::string("secret");
        let literals = vec![
            Literal::string(source.clone(), "secret"),
            Literal::string(source, "secret"),
        ];
        let result = sanitizer(LiteralCardinality::OneToMany).sanitize_literals(None, &literals);
        assert_eq!(result.literals.len(), 2);
    }

    #[test]
    fn test_id_literal_for_hidden_entity_is_unchanged() {
        let id = Literal::int(Operand::int(2), 2);
        let result = sanitizer(LiteralCardinality::OneToOne).sanitize_literals(None, &[id]);
        assert!(!result.modified);
    }

    #[test]
    fn test_missing_collaborator() {
        let err = EntityLiteralSanitizer::<Catalog>::catalog_builder()
            .entity_resolver(catalogs())
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SanitizeError::MissingCollaborator {
                sanitizer: "catalog".to_string(),
                collaborator: "index resolver",
            }
        );
    }

    #[test]
    fn test_clause_sanitizer_rewrites_operator() {
        let resolver = OperandResolver::new(Arc::new(InMemoryFunctionRegistry::new()));
        let clause_sanitizer = LiteralClauseSanitizer::new(
            resolver,
            Arc::new(sanitizer(LiteralCardinality::OneToMany)),
        );

        let clause = TerminalClause::new("catalog", Operator::Equals, Operand::string("secret")).unwrap();
        assert_eq!(
            clause_sanitizer.sanitize(None, &clause).to_string(),
            "{catalog IN (2, 3)}"
        );

        let clause = TerminalClause::new(
            "catalog",
            Operator::In,
            Operand::multi(vec![Operand::string("hardware"), Operand::string("secret")]).unwrap(),
        )
        .unwrap();
        assert_eq!(
            clause_sanitizer.sanitize(None, &clause).to_string(),
            "{catalog IN (\"hardware\", 2, 3)}"
        );

        let clause = TerminalClause::new("catalog", Operator::Equals, Operand::string("hardware")).unwrap();
        assert_eq!(clause_sanitizer.sanitize(None, &clause), Clause::Terminal(clause));
    }
}
