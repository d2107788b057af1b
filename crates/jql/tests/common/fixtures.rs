//! Test fixtures: users, catalog entities, functions and field registrations.

use std::collections::HashMap;
use std::sync::Arc;

use helios_jql::clause::TerminalClause;
use helios_jql::context::{QueryContext, User};
use helios_jql::literal::Literal;
use helios_jql::message::MessageSet;
use helios_jql::operand::{FunctionOperand, Operand};
use helios_jql::registry::{
    BasicSearcher, ClauseHandler, ClauseNames, FieldRegistrationSource, IndexContributor,
    SearchHandlerRegistration, Searcher, SearcherGroupType, SearcherInformation,
    SearcherRegistration, SupportedOperatorsValidator,
};
use helios_jql::resolver::{FunctionHandler, InMemoryFunctionRegistry, OperandResolver};
use helios_jql::sanitize::{
    EntityLiteralSanitizer, EntityNameResolver, IndexInfoResolver, LiteralClauseSanitizer,
    PermissionCheck,
};

// ============================================================================
// Users
// ============================================================================

pub fn admin() -> User {
    User::new("admin").with_display_name("Administrator")
}

pub fn viewer() -> User {
    User::new("viewer")
}

// ============================================================================
// Entities
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    pub id: i64,
    pub name: String,
    pub restricted: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: i64,
    pub sku: String,
    pub restricted: bool,
}

/// Catalogs: Hardware (10, open), Finance (20, restricted).
pub struct CatalogStore {
    catalogs: HashMap<i64, Catalog>,
}

impl CatalogStore {
    pub fn new() -> Self {
        let catalogs = [
            Catalog {
                id: 10,
                name: "Hardware".to_string(),
                restricted: false,
            },
            Catalog {
                id: 20,
                name: "Finance".to_string(),
                restricted: true,
            },
        ];
        Self {
            catalogs: catalogs.into_iter().map(|c| (c.id, c)).collect(),
        }
    }
}

impl EntityNameResolver<Catalog> for CatalogStore {
    fn get(&self, id: i64) -> Option<Catalog> {
        self.catalogs.get(&id).cloned()
    }
}

impl IndexInfoResolver for CatalogStore {
    fn get_indexed_values(&self, name_or_id: &str) -> Vec<String> {
        if let Ok(id) = name_or_id.parse::<i64>() {
            return vec![id.to_string()];
        }
        let mut ids: Vec<i64> = self
            .catalogs
            .values()
            .filter(|c| c.name.eq_ignore_ascii_case(name_or_id))
            .map(|c| c.id)
            .collect();
        ids.sort();
        ids.into_iter().map(|id| id.to_string()).collect()
    }
}

/// Assets: SKU "LT-100" is shared by 101 (open), 102 and 103 (restricted);
/// "SRV-9" is 201 (restricted); "DSK-1" is 301 (open).
pub struct AssetStore {
    assets: Vec<Asset>,
}

impl AssetStore {
    pub fn new() -> Self {
        let asset = |id, sku: &str, restricted| Asset {
            id,
            sku: sku.to_string(),
            restricted,
        };
        Self {
            assets: vec![
                asset(101, "LT-100", false),
                asset(102, "LT-100", true),
                asset(103, "LT-100", true),
                asset(201, "SRV-9", true),
                asset(301, "DSK-1", false),
            ],
        }
    }
}

impl EntityNameResolver<Asset> for AssetStore {
    fn get(&self, id: i64) -> Option<Asset> {
        self.assets.iter().find(|a| a.id == id).cloned()
    }
}

impl IndexInfoResolver for AssetStore {
    fn get_indexed_values(&self, name_or_id: &str) -> Vec<String> {
        if let Ok(id) = name_or_id.parse::<i64>() {
            return vec![id.to_string()];
        }
        self.assets
            .iter()
            .filter(|a| a.sku.eq_ignore_ascii_case(name_or_id))
            .map(|a| a.id.to_string())
            .collect()
    }
}

/// Only the admin may view restricted entities.
pub struct RestrictedCheck;

impl PermissionCheck<Catalog> for RestrictedCheck {
    fn can_view(&self, user: Option<&User>, entity: &Catalog) -> bool {
        !entity.restricted || user.map(User::key) == Some("admin")
    }
}

impl PermissionCheck<Asset> for RestrictedCheck {
    fn can_view(&self, user: Option<&User>, entity: &Asset) -> bool {
        !entity.restricted || user.map(User::key) == Some("admin")
    }
}

// ============================================================================
// Functions
// ============================================================================

/// `currentUser()`: the requester's key, or nothing when anonymous.
pub struct CurrentUserFunction;

impl FunctionHandler for CurrentUserFunction {
    fn name(&self) -> &str {
        "currentUser"
    }

    fn resolve(
        &self,
        context: &QueryContext,
        operand: &FunctionOperand,
        _clause: &TerminalClause,
    ) -> Vec<Literal> {
        context
            .user()
            .map(|user| vec![Literal::string(Operand::Function(operand.clone()), user.key())])
            .unwrap_or_default()
    }

    fn validate(
        &self,
        user: Option<&User>,
        operand: &FunctionOperand,
        _clause: &TerminalClause,
    ) -> MessageSet {
        let mut messages = MessageSet::new();
        if !operand.args().is_empty() {
            messages.add_error("Function 'currentUser' does not take arguments.");
        }
        if user.is_none() {
            messages.add_warning("Function 'currentUser' matches nothing for anonymous users.");
        }
        messages
    }
}

/// `membersOf(group)`: the members of a group. Group names are replaced by
/// their ids for anyone but the admin.
pub struct MembersOfFunction {
    groups: HashMap<String, (String, Vec<String>)>,
}

impl MembersOfFunction {
    pub fn new() -> Self {
        let mut groups = HashMap::new();
        groups.insert(
            "asset-admins".to_string(),
            ("9001".to_string(), vec!["admin".to_string(), "kim".to_string()]),
        );
        groups.insert(
            "auditors".to_string(),
            ("9002".to_string(), vec!["lee".to_string()]),
        );
        Self { groups }
    }
}

impl FunctionHandler for MembersOfFunction {
    fn name(&self) -> &str {
        "membersOf"
    }

    fn resolve(
        &self,
        _context: &QueryContext,
        operand: &FunctionOperand,
        _clause: &TerminalClause,
    ) -> Vec<Literal> {
        let source = Operand::Function(operand.clone());
        operand
            .args()
            .iter()
            .filter_map(|group| self.groups.get(&group.to_lowercase()))
            .flat_map(|(_, members)| members.iter())
            .map(|member| Literal::string(source.clone(), member.clone()))
            .collect()
    }

    fn validate(
        &self,
        _user: Option<&User>,
        operand: &FunctionOperand,
        _clause: &TerminalClause,
    ) -> MessageSet {
        let mut messages = MessageSet::new();
        for group in operand.args() {
            if !self.groups.contains_key(&group.to_lowercase()) {
                messages.add_error(format!("Group '{}' does not exist.", group));
            }
        }
        messages
    }

    fn is_list(&self) -> bool {
        true
    }

    fn min_args(&self) -> usize {
        1
    }

    fn sanitize_operand(&self, user: Option<&User>, operand: &FunctionOperand) -> FunctionOperand {
        if user.map(User::key) == Some("admin") {
            return operand.clone();
        }
        let args: Vec<String> = operand
            .args()
            .iter()
            .map(|group| {
                self.groups
                    .get(&group.to_lowercase())
                    .map(|(id, _)| id.clone())
                    .unwrap_or_else(|| group.clone())
            })
            .collect();
        operand.with_args(args).unwrap_or_else(|_| operand.clone())
    }
}

pub fn function_registry() -> Arc<InMemoryFunctionRegistry> {
    Arc::new(
        InMemoryFunctionRegistry::new()
            .with_handler(Arc::new(CurrentUserFunction))
            .with_handler(Arc::new(MembersOfFunction::new())),
    )
}

pub fn operand_resolver() -> OperandResolver {
    OperandResolver::new(function_registry())
}

// ============================================================================
// Field registrations
// ============================================================================

pub struct NamedContributor(pub &'static str);

impl IndexContributor for NamedContributor {
    fn id(&self) -> &str {
        self.0
    }
}

fn searcher(id: &str, group: SearcherGroupType) -> Arc<dyn Searcher> {
    Arc::new(BasicSearcher::new(
        SearcherInformation::new(id, format!("asset.searcher.{}", id), group).with_field_id(id),
    ))
}

fn field(
    id: &'static str,
    group: SearcherGroupType,
    handler: ClauseHandler,
) -> SearchHandlerRegistration {
    SearchHandlerRegistration::for_field(id)
        .with_index_contributor(Arc::new(NamedContributor(id)))
        .with_searcher(SearcherRegistration::new(
            searcher(id, group),
            vec![Arc::new(handler)],
        ))
}

/// A custom field declared by a test.
#[derive(Debug, Clone)]
pub struct CustomField {
    pub field_id: &'static str,
    pub names: Vec<&'static str>,
}

/// The asset catalog's searchable fields.
///
/// System fields, in discovery order: `sku`, `date`-group `acquired`,
/// `status`, `owner`, `catalog`, `location` and the free-text `text` field,
/// plus a field-less `key` clause handler.
pub struct AssetFieldSource {
    pub resolver: OperandResolver,
    pub custom: Vec<CustomField>,
    pub duplicate_system_status: bool,
}

impl AssetFieldSource {
    pub fn new() -> Self {
        Self {
            resolver: operand_resolver(),
            custom: Vec::new(),
            duplicate_system_status: false,
        }
    }

    pub fn with_custom(mut self, field_id: &'static str, names: &[&'static str]) -> Self {
        self.custom.push(CustomField {
            field_id,
            names: names.to_vec(),
        });
        self
    }

    fn catalog_sanitizer(&self) -> Arc<LiteralClauseSanitizer> {
        let literals = EntityLiteralSanitizer::<Catalog>::catalog_builder()
            .entity_resolver(Arc::new(CatalogStore::new()))
            .index_resolver(Arc::new(CatalogStore::new()))
            .permission_check(Arc::new(RestrictedCheck))
            .build()
            .expect("catalog sanitizer is fully configured");
        Arc::new(LiteralClauseSanitizer::new(self.resolver.clone(), Arc::new(literals)))
    }

    fn asset_sanitizer(&self) -> Arc<LiteralClauseSanitizer> {
        let literals = EntityLiteralSanitizer::<Asset>::asset_builder()
            .entity_resolver(Arc::new(AssetStore::new()))
            .index_resolver(Arc::new(AssetStore::new()))
            .permission_check(Arc::new(RestrictedCheck))
            .build()
            .expect("asset sanitizer is fully configured");
        Arc::new(LiteralClauseSanitizer::new(self.resolver.clone(), Arc::new(literals)))
    }
}

impl FieldRegistrationSource for AssetFieldSource {
    fn system_fields(&self) -> Vec<SearchHandlerRegistration> {
        let equality = || Arc::new(SupportedOperatorsValidator::equality());
        let relational = || Arc::new(SupportedOperatorsValidator::equality_and_relational());

        let mut fields = vec![
            field(
                "sku",
                SearcherGroupType::Catalog,
                ClauseHandler::new(ClauseNames::new("sku").with_aliases(["assetSku"]))
                    .with_field_id("sku")
                    .with_validator(relational())
                    .with_sanitizer(self.asset_sanitizer()),
            ),
            field(
                "acquired",
                SearcherGroupType::Date,
                ClauseHandler::new(ClauseNames::new("acquired").with_aliases(["acquiredDate"]))
                    .with_field_id("acquired")
                    .with_validator(relational()),
            ),
            field(
                "status",
                SearcherGroupType::Asset,
                ClauseHandler::new(ClauseNames::new("status"))
                    .with_field_id("status")
                    .with_validator(equality()),
            ),
            field(
                "owner",
                SearcherGroupType::Asset,
                ClauseHandler::new(ClauseNames::new("owner").with_aliases(["assignedTo"]))
                    .with_field_id("owner")
                    .with_validator(equality()),
            ),
            field(
                "catalog",
                SearcherGroupType::Context,
                ClauseHandler::new(ClauseNames::new("catalog").with_aliases(["cat"]))
                    .with_field_id("catalog")
                    .with_validator(equality())
                    .with_sanitizer(self.catalog_sanitizer()),
            ),
            field(
                "location",
                SearcherGroupType::Asset,
                ClauseHandler::new(ClauseNames::new("location"))
                    .with_field_id("location")
                    .with_validator(equality()),
            ),
        ];

        if self.duplicate_system_status {
            fields.push(
                SearchHandlerRegistration::for_field("lifecycle").with_clause_handler(
                    ClauseHandler::new(ClauseNames::new("lifecycle").with_aliases(["STATUS"]))
                        .with_field_id("lifecycle"),
                ),
            );
        }
        fields
    }

    fn text_search_handler(&self) -> Option<SearchHandlerRegistration> {
        Some(field(
            "text",
            SearcherGroupType::Text,
            ClauseHandler::new(ClauseNames::new("text"))
                .with_validator(Arc::new(SupportedOperatorsValidator::text())),
        ))
    }

    fn system_clause_handlers(&self) -> Vec<SearchHandlerRegistration> {
        vec![SearchHandlerRegistration::clauses_only(vec![Arc::new(
            ClauseHandler::new(ClauseNames::new("key").with_aliases(["assetKey"]))
                .with_validator(Arc::new(SupportedOperatorsValidator::equality_and_relational())),
        )])]
    }

    fn custom_fields(&self) -> Vec<SearchHandlerRegistration> {
        self.custom
            .iter()
            .map(|custom| {
                let names = ClauseNames::new(custom.names[0])
                    .with_aliases(custom.names[1..].iter().copied());
                field(
                    custom.field_id,
                    SearcherGroupType::Custom,
                    ClauseHandler::new(names).with_field_id(custom.field_id),
                )
            })
            .collect()
    }
}
