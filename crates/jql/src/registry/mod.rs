//! Search handler registry.
//!
//! The registry maps JQL clause names to the [`ClauseHandler`]s,
//! searchers and field ids that serve them. It is built once from a
//! [`FieldRegistrationSource`] and is read-only afterwards; every lookup is
//! infallible and returns an empty collection for unknown names.
//!
//! # Build Order
//!
//! 1. System fields
//! 2. The free-text search handler
//! 3. System clause handlers with no field
//! 4. Custom fields
//!
//! Clause names are compared ignoring case and stored lower-cased. Two
//! system registrations claiming the same name abort the build with
//! [`RegistryError::DuplicateSystemClause`]. A custom registration claiming
//! a system name is dropped for that name and logged.
//!
//! Use [`SearchHandlerManager`] to share one built registry across threads.

pub mod handler;
pub mod manager;
pub mod registration;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::context::User;
use crate::error::RegistryError;

pub use handler::{
    ClauseHandler, ClauseNames, ClauseValidator, NoOpClauseValidator, SupportedOperatorsValidator,
};
pub use manager::SearchHandlerManager;
pub use registration::{
    BasicSearcher, FieldRegistrationSource, IndexContributor, SearchHandlerRegistration, Searcher,
    SearcherGroupType, SearcherInformation, SearcherRegistration,
};

/// A display group and its searchers in priority order.
#[derive(Clone)]
pub struct SearcherGroup {
    group_type: SearcherGroupType,
    searchers: Vec<Arc<dyn Searcher>>,
}

impl SearcherGroup {
    /// Returns the group type.
    pub fn group_type(&self) -> SearcherGroupType {
        self.group_type
    }

    /// Returns the searchers in priority order.
    pub fn searchers(&self) -> &[Arc<dyn Searcher>] {
        &self.searchers
    }

    /// Returns the searcher ids in priority order.
    pub fn searcher_ids(&self) -> Vec<&str> {
        self.searchers
            .iter()
            .map(|s| s.information().id.as_str())
            .collect()
    }
}

impl std::fmt::Debug for SearcherGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearcherGroup")
            .field("group_type", &self.group_type)
            .field("searchers", &self.searcher_ids())
            .finish()
    }
}

/// Immutable indices from clause names to handlers, searchers and fields.
pub struct SearchHandlerRegistry {
    /// Handlers indexed by lower-cased clause name.
    handlers_by_name: HashMap<String, Vec<Arc<ClauseHandler>>>,

    /// Searcher registrations indexed by lower-cased clause name.
    searchers_by_name: HashMap<String, Vec<Arc<SearcherRegistration>>>,

    /// Searchers indexed by searcher id.
    searchers_by_id: HashMap<String, Arc<dyn Searcher>>,

    /// Searchers in discovery order.
    searchers: Vec<Arc<dyn Searcher>>,

    /// Field ids indexed by lower-cased clause name.
    field_ids_by_name: HashMap<String, BTreeSet<String>>,

    /// Clause names indexed by field id.
    names_by_field_id: HashMap<String, Vec<ClauseNames>>,

    /// Lower-cased clause names claimed by system registrations.
    system_names: BTreeSet<String>,

    /// Searcher groups in display order.
    groups: Vec<SearcherGroup>,

    index_contributors: Vec<Arc<dyn IndexContributor>>,
}

impl SearchHandlerRegistry {
    /// Builds the registry from `source`, ordering searchers per `config`.
    pub fn build(
        source: &dyn FieldRegistrationSource,
        config: &RegistryConfig,
    ) -> Result<Self, RegistryError> {
        let mut builder = RegistryBuilder::default();

        for registration in source.system_fields() {
            builder.process(&registration, true)?;
        }
        if let Some(registration) = source.text_search_handler() {
            builder.process(&registration, true)?;
        }
        for registration in source.system_clause_handlers() {
            builder.process(&registration, true)?;
        }
        for registration in source.custom_fields() {
            builder.process(&registration, false)?;
        }

        Ok(builder.finish(config))
    }

    /// Returns the handlers registered for `clause_name`, ignoring case.
    pub fn get_clause_handler(&self, clause_name: &str) -> Vec<Arc<ClauseHandler>> {
        self.handlers_by_name
            .get(&clause_name.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the handlers `user` may use for `clause_name`.
    ///
    /// Currently the same as [`get_clause_handler`](Self::get_clause_handler).
    pub fn get_clause_handler_for_user(
        &self,
        _user: Option<&User>,
        clause_name: &str,
    ) -> Vec<Arc<ClauseHandler>> {
        self.get_clause_handler(clause_name)
    }

    /// Returns the searchers backing `clause_name`.
    pub fn get_searchers_by_clause_name(
        &self,
        _user: Option<&User>,
        clause_name: &str,
    ) -> Vec<Arc<dyn Searcher>> {
        self.searchers_by_name
            .get(&clause_name.to_lowercase())
            .map(|registrations| {
                registrations
                    .iter()
                    .map(|r| Arc::clone(r.searcher()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the ids of the fields searched by `clause_name`, sorted.
    pub fn get_field_ids(&self, clause_name: &str) -> Vec<String> {
        self.field_ids_by_name
            .get(&clause_name.to_lowercase())
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns the clause names registered for a field.
    pub fn get_jql_clause_names(&self, field_id: &str) -> Vec<ClauseNames> {
        self.names_by_field_id
            .get(field_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns the clause names `user` has at least one handler for.
    pub fn get_visible_jql_clause_names(&self, user: Option<&User>) -> Vec<ClauseNames> {
        let mut names: Vec<ClauseNames> = Vec::new();
        for name in self.sorted_clause_names() {
            for handler in self.get_clause_handler_for_user(user, name) {
                if !names.contains(handler.names()) {
                    names.push(handler.names().clone());
                }
            }
        }
        names
    }

    /// Returns the clause names of every registered handler.
    pub fn get_jql_clause_names_all(&self) -> Vec<ClauseNames> {
        let mut names: Vec<ClauseNames> = Vec::new();
        for name in self.sorted_clause_names() {
            for handler in &self.handlers_by_name[name] {
                if !names.contains(handler.names()) {
                    names.push(handler.names().clone());
                }
            }
        }
        names
    }

    /// Returns the searcher with the given id.
    pub fn get_searcher(&self, searcher_id: &str) -> Option<Arc<dyn Searcher>> {
        self.searchers_by_id.get(searcher_id).cloned()
    }

    /// Returns every searcher in discovery order.
    pub fn get_all_searchers(&self) -> Vec<Arc<dyn Searcher>> {
        self.searchers.clone()
    }

    /// Returns the searcher groups in display order.
    pub fn get_searcher_groups(&self) -> &[SearcherGroup] {
        &self.groups
    }

    /// Returns every index contributor in registration order.
    pub fn index_contributors(&self) -> &[Arc<dyn IndexContributor>] {
        &self.index_contributors
    }

    /// Returns `true` if a system registration owns `clause_name`.
    pub fn is_system_clause(&self, clause_name: &str) -> bool {
        self.system_names.contains(&clause_name.to_lowercase())
    }

    fn sorted_clause_names(&self) -> Vec<&String> {
        let mut names: Vec<&String> = self.handlers_by_name.keys().collect();
        names.sort();
        names
    }
}

impl std::fmt::Debug for SearchHandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchHandlerRegistry")
            .field("clause_names", &self.sorted_clause_names())
            .field("searchers", &self.searchers_by_id.len())
            .field("groups", &self.groups)
            .finish()
    }
}

/// Mutable state used while building a [`SearchHandlerRegistry`].
#[derive(Default)]
struct RegistryBuilder {
    handlers_by_name: HashMap<String, Vec<Arc<ClauseHandler>>>,
    searchers_by_name: HashMap<String, Vec<Arc<SearcherRegistration>>>,
    searchers_by_id: HashMap<String, Arc<dyn Searcher>>,
    searchers: Vec<Arc<dyn Searcher>>,
    field_ids_by_name: HashMap<String, BTreeSet<String>>,
    names_by_field_id: HashMap<String, Vec<ClauseNames>>,
    /// Lower-cased name to the system handler that claimed it.
    system_claims: HashMap<String, Arc<ClauseHandler>>,
    index_contributors: Vec<Arc<dyn IndexContributor>>,
}

impl RegistryBuilder {
    fn process(
        &mut self,
        registration: &SearchHandlerRegistration,
        system: bool,
    ) -> Result<(), RegistryError> {
        self.index_contributors
            .extend(registration.index_contributors.iter().cloned());

        if let Some(searcher_registration) = &registration.searcher {
            for handler in searcher_registration.clause_handlers() {
                let field_id = handler.field_id().or(registration.field_id.as_deref());
                self.register_handler(handler, field_id, Some(searcher_registration), system)?;
            }
            self.register_searcher(searcher_registration.searcher());
        }

        for handler in &registration.clause_handlers {
            let field_id = handler.field_id().or(registration.field_id.as_deref());
            self.register_handler(handler, field_id, None, system)?;
        }

        Ok(())
    }

    fn register_handler(
        &mut self,
        handler: &Arc<ClauseHandler>,
        field_id: Option<&str>,
        searcher: Option<&Arc<SearcherRegistration>>,
        system: bool,
    ) -> Result<(), RegistryError> {
        let mut kept_any = false;

        for name in dedup(handler.names().lowercase_names()) {
            if let Some(owner) = self.system_claims.get(&name) {
                if !Arc::ptr_eq(owner, handler) {
                    if system {
                        return Err(RegistryError::DuplicateSystemClause {
                            clause_name: name,
                            existing: owner.names().primary_name().to_string(),
                            new: handler.names().primary_name().to_string(),
                        });
                    }
                    warn!(
                        clause_name = %name,
                        system_clause = %owner.names().primary_name(),
                        custom_clause = %handler.names().primary_name(),
                        "Custom clause conflicts with a system clause name, dropping it"
                    );
                    continue;
                }
            } else if system {
                self.system_claims.insert(name.clone(), Arc::clone(handler));
            }

            push_unique_arc(
                self.handlers_by_name.entry(name.clone()).or_default(),
                handler,
            );
            if let Some(searcher) = searcher {
                push_unique_arc(
                    self.searchers_by_name.entry(name.clone()).or_default(),
                    searcher,
                );
            }
            if let Some(field_id) = field_id {
                self.field_ids_by_name
                    .entry(name.clone())
                    .or_default()
                    .insert(field_id.to_string());
            }
            kept_any = true;
        }

        if kept_any {
            if let Some(field_id) = field_id {
                let names = self.names_by_field_id.entry(field_id.to_string()).or_default();
                if !names.contains(handler.names()) {
                    names.push(handler.names().clone());
                }
            }
            debug!(
                clause = %handler.names().primary_name(),
                system,
                "Registered clause handler"
            );
        }

        Ok(())
    }

    fn register_searcher(&mut self, searcher: &Arc<dyn Searcher>) {
        let id = searcher.information().id.clone();
        if self.searchers_by_id.contains_key(&id) {
            return;
        }
        self.searchers_by_id.insert(id, Arc::clone(searcher));
        self.searchers.push(Arc::clone(searcher));
    }

    fn finish(self, config: &RegistryConfig) -> SearchHandlerRegistry {
        let mut buckets: BTreeMap<SearcherGroupType, Vec<Arc<dyn Searcher>>> = SearcherGroupType::all()
            .into_iter()
            .map(|group| (group, Vec::new()))
            .collect();
        for searcher in &self.searchers {
            buckets
                .entry(searcher.information().group)
                .or_default()
                .push(Arc::clone(searcher));
        }

        // Stable sort keeps discovery order among unlisted searchers.
        let groups = buckets
            .into_iter()
            .map(|(group_type, mut searchers)| {
                searchers.sort_by_key(|s| {
                    config
                        .priority(group_type, &s.information().id)
                        .unwrap_or(usize::MAX)
                });
                SearcherGroup {
                    group_type,
                    searchers,
                }
            })
            .collect();

        SearchHandlerRegistry {
            handlers_by_name: self.handlers_by_name,
            searchers_by_name: self.searchers_by_name,
            searchers_by_id: self.searchers_by_id,
            searchers: self.searchers,
            field_ids_by_name: self.field_ids_by_name,
            names_by_field_id: self.names_by_field_id,
            system_names: self.system_claims.into_keys().collect(),
            groups,
            index_contributors: self.index_contributors,
        }
    }
}

fn dedup(names: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(names.len());
    for name in names {
        if !out.contains(&name) {
            out.push(name);
        }
    }
    out
}

fn push_unique_arc<T: ?Sized>(items: &mut Vec<Arc<T>>, item: &Arc<T>) {
    if !items.iter().any(|existing| Arc::ptr_eq(existing, item)) {
        items.push(Arc::clone(item));
    }
}
