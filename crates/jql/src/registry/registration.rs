//! Field registrations fed into the search handler registry.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::handler::ClauseHandler;
use crate::context::User;

/// The UI group a searcher is displayed under.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum SearcherGroupType {
    /// Free-text searching.
    Text,
    /// Catalog and category scoping.
    Context,
    /// Vendor, manufacturer and SKU details.
    Catalog,
    /// Lifecycle fields of an individual asset.
    Asset,
    /// Date fields.
    Date,
    /// Custom fields.
    #[default]
    Custom,
}

impl SearcherGroupType {
    /// Returns every group in display order.
    pub fn all() -> [SearcherGroupType; 6] {
        [
            SearcherGroupType::Text,
            SearcherGroupType::Context,
            SearcherGroupType::Catalog,
            SearcherGroupType::Asset,
            SearcherGroupType::Date,
            SearcherGroupType::Custom,
        ]
    }

    /// Returns the lowercase group key.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearcherGroupType::Text => "text",
            SearcherGroupType::Context => "context",
            SearcherGroupType::Catalog => "catalog",
            SearcherGroupType::Asset => "asset",
            SearcherGroupType::Date => "date",
            SearcherGroupType::Custom => "custom",
        }
    }
}

impl fmt::Display for SearcherGroupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive data about a searcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearcherInformation {
    /// Unique searcher id.
    pub id: String,
    /// Message key of the searcher's label.
    pub name_key: String,
    /// Field the searcher belongs to, if any.
    pub field_id: Option<String>,
    /// Display group.
    pub group: SearcherGroupType,
}

impl SearcherInformation {
    /// Creates searcher information in the given group.
    pub fn new(
        id: impl Into<String>,
        name_key: impl Into<String>,
        group: SearcherGroupType,
    ) -> Self {
        Self {
            id: id.into(),
            name_key: name_key.into(),
            field_id: None,
            group,
        }
    }

    /// Sets the backing field id.
    pub fn with_field_id(mut self, field_id: impl Into<String>) -> Self {
        self.field_id = Some(field_id.into());
        self
    }
}

/// A form-side searcher for one field.
pub trait Searcher: Send + Sync {
    /// Returns the searcher's descriptive data.
    fn information(&self) -> &SearcherInformation;

    /// Returns `true` if the searcher should be shown to `user`.
    fn is_shown(&self, _user: Option<&User>) -> bool {
        true
    }
}

/// A [`Searcher`] that carries only its information and is always shown.
#[derive(Debug, Clone)]
pub struct BasicSearcher {
    information: SearcherInformation,
}

impl BasicSearcher {
    /// Creates a searcher from its information.
    pub fn new(information: SearcherInformation) -> Self {
        Self { information }
    }
}

impl Searcher for BasicSearcher {
    fn information(&self) -> &SearcherInformation {
        &self.information
    }
}

/// Contributes a field's values to the search index.
pub trait IndexContributor: Send + Sync {
    /// Returns the contributor id.
    fn id(&self) -> &str;
}

/// A searcher together with the clause handlers it owns.
pub struct SearcherRegistration {
    searcher: Arc<dyn Searcher>,
    clause_handlers: Vec<Arc<ClauseHandler>>,
}

impl SearcherRegistration {
    /// Creates a searcher registration.
    pub fn new(searcher: Arc<dyn Searcher>, clause_handlers: Vec<Arc<ClauseHandler>>) -> Self {
        Self {
            searcher,
            clause_handlers,
        }
    }

    /// Returns the searcher.
    pub fn searcher(&self) -> &Arc<dyn Searcher> {
        &self.searcher
    }

    /// Returns the clause handlers.
    pub fn clause_handlers(&self) -> &[Arc<ClauseHandler>] {
        &self.clause_handlers
    }
}

impl fmt::Debug for SearcherRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearcherRegistration")
            .field("searcher", &self.searcher.information().id)
            .field("clause_handlers", &self.clause_handlers)
            .finish()
    }
}

/// Everything a field contributes to search.
#[derive(Default)]
pub struct SearchHandlerRegistration {
    /// Field the registration belongs to, if any.
    pub field_id: Option<String>,
    /// Index contributors.
    pub index_contributors: Vec<Arc<dyn IndexContributor>>,
    /// The form searcher and its clause handlers.
    pub searcher: Option<Arc<SearcherRegistration>>,
    /// Clause handlers with no searcher.
    pub clause_handlers: Vec<Arc<ClauseHandler>>,
}

impl SearchHandlerRegistration {
    /// Creates an empty registration for a field.
    pub fn for_field(field_id: impl Into<String>) -> Self {
        Self {
            field_id: Some(field_id.into()),
            ..Self::default()
        }
    }

    /// Creates a registration holding only clause handlers.
    pub fn clauses_only(clause_handlers: Vec<Arc<ClauseHandler>>) -> Self {
        Self {
            clause_handlers,
            ..Self::default()
        }
    }

    /// Sets the searcher registration.
    pub fn with_searcher(mut self, registration: SearcherRegistration) -> Self {
        self.searcher = Some(Arc::new(registration));
        self
    }

    /// Adds a clause handler with no searcher.
    pub fn with_clause_handler(mut self, handler: ClauseHandler) -> Self {
        self.clause_handlers.push(Arc::new(handler));
        self
    }

    /// Adds an index contributor.
    pub fn with_index_contributor(mut self, contributor: Arc<dyn IndexContributor>) -> Self {
        self.index_contributors.push(contributor);
        self
    }
}

impl fmt::Debug for SearchHandlerRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchHandlerRegistration")
            .field("field_id", &self.field_id)
            .field("index_contributors", &self.index_contributors.len())
            .field("searcher", &self.searcher)
            .field("clause_handlers", &self.clause_handlers)
            .finish()
    }
}

/// Supplies the registrations the registry is built from.
///
/// Sources are read in a fixed order: system fields, the text search
/// handler, standalone system clause handlers and finally custom fields.
/// Everything before custom fields counts as system.
pub trait FieldRegistrationSource: Send + Sync {
    /// Registrations for built-in fields.
    fn system_fields(&self) -> Vec<SearchHandlerRegistration>;

    /// The free-text search registration, if configured.
    fn text_search_handler(&self) -> Option<SearchHandlerRegistration> {
        None
    }

    /// Built-in clause handlers with no field.
    fn system_clause_handlers(&self) -> Vec<SearchHandlerRegistration> {
        Vec::new()
    }

    /// Registrations for custom fields.
    fn custom_fields(&self) -> Vec<SearchHandlerRegistration> {
        Vec::new()
    }
}
