//! Fetch plan construction from client attribute paths.
//!
//! Every requested path is walked against the [`AssociationRegistry`] on its
//! own. A path that does not resolve fails the whole request; it is never
//! dropped, because the loader and the mapper must agree on what was loaded.
//! [`AttributeSelection`] is the only place where the fetch plan and the
//! matching [`MappingOptions`] are derived, both from one validated set.

use std::collections::BTreeSet;

use serde_json::json;

use super::attribute_path::{AttributePath, AttributePathError, parse_attribute_list};
use super::{AssociationRegistry, CollectionStrategy, EntityKind, Error, MappingOptions};

/// Path resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchPlanError {
    #[error("invalid attribute path '{path}': '{segment}' is not an association of {entity}")]
    InvalidAttributePath {
        path: String,
        segment: String,
        entity: EntityKind,
    },
    #[error("invalid attribute path '{path}': {entity}.{segment} does not allow sub-paths")]
    SubPathNotAllowed {
        path: String,
        segment: String,
        entity: EntityKind,
    },
    #[error(transparent)]
    Syntax(#[from] AttributePathError),
}

impl From<FetchPlanError> for Error {
    fn from(value: FetchPlanError) -> Self {
        let details = match &value {
            FetchPlanError::InvalidAttributePath {
                path,
                segment,
                entity,
            } => json!({
                "reason": "invalid_attribute_path",
                "path": path,
                "segment": segment,
                "entity": entity,
            }),
            FetchPlanError::SubPathNotAllowed {
                path,
                segment,
                entity,
            } => json!({
                "reason": "sub_path_not_allowed",
                "path": path,
                "segment": segment,
                "entity": entity,
            }),
            FetchPlanError::Syntax(_) => json!({ "reason": "malformed_attribute_path" }),
        };
        Error::invalid_request(value.to_string()).with_details(details)
    }
}

/// Validated set of association paths to load eagerly for one root.
///
/// Paths are kept exactly as requested: `addresses.user` does not add an
/// `addresses` entry, loaders use [`FetchPlan::touches`] for prefixes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    root: EntityKind,
    paths: BTreeSet<String>,
}

impl FetchPlan {
    /// Plan loading scalar fields only.
    pub fn empty(root: EntityKind) -> Self {
        Self {
            root,
            paths: BTreeSet::new(),
        }
    }

    pub fn root(&self) -> EntityKind {
        self.root
    }

    pub fn paths(&self) -> &BTreeSet<String> {
        &self.paths
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Whether `path` was requested verbatim.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Whether `path` must be loaded, either verbatim or as the prefix of a
    /// longer requested path.
    pub fn touches(&self, path: &str) -> bool {
        self.contains(path)
            || self.paths.iter().any(|requested| {
                requested
                    .strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with('.'))
            })
    }
}

/// Stateless validator turning attribute paths into a [`FetchPlan`].
///
/// # Examples
/// ```
/// use user_service::domain::{AssociationRegistry, AttributePath, EntityKind, FetchPlanBuilder};
///
/// let registry = AssociationRegistry::standard().expect("valid registry");
/// let builder = FetchPlanBuilder::new(&registry);
/// let path = AttributePath::parse("addresses.user").expect("valid syntax");
/// let plan = builder.build(EntityKind::User, &[path]).expect("resolvable");
/// assert!(plan.contains("addresses.user"));
/// assert!(!plan.contains("addresses"));
/// assert!(plan.touches("addresses"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FetchPlanBuilder<'a> {
    registry: &'a AssociationRegistry,
}

impl<'a> FetchPlanBuilder<'a> {
    pub fn new(registry: &'a AssociationRegistry) -> Self {
        Self { registry }
    }

    /// Validate each path from `root` and collect them.
    pub fn build(&self, root: EntityKind, paths: &[AttributePath]) -> Result<FetchPlan, FetchPlanError> {
        let mut plan = FetchPlan::empty(root);
        for path in paths {
            self.walk(root, path)?;
            plan.paths.insert(path.as_str().to_owned());
        }
        Ok(plan)
    }

    fn walk(&self, root: EntityKind, path: &AttributePath) -> Result<(), FetchPlanError> {
        let mut current = root;
        // Previous segment, the entity declaring it, and whether it may be continued.
        let mut previous: Option<(&str, EntityKind, bool)> = None;
        for segment in path.segments() {
            if let Some((parent, owner, false)) = previous {
                return Err(FetchPlanError::SubPathNotAllowed {
                    path: path.to_string(),
                    segment: parent.to_owned(),
                    entity: owner,
                });
            }
            let descriptor = self.registry.describe(current, segment).map_err(|_| {
                FetchPlanError::InvalidAttributePath {
                    path: path.to_string(),
                    segment: segment.to_owned(),
                    entity: current,
                }
            })?;
            previous = Some((segment, current, descriptor.allows_sub_paths));
            current = descriptor.target;
        }
        Ok(())
    }
}

/// A validated attribute selection for one request.
///
/// # Examples
/// ```
/// use user_service::domain::{AssociationRegistry, AttributeSelection, EntityKind};
///
/// let registry = AssociationRegistry::standard().expect("valid registry");
/// let selection = AttributeSelection::resolve(&registry, EntityKind::User, Some("contacts"))
///     .expect("resolvable");
/// let options = selection.mapping_options(true);
/// assert!(selection.fetch_plan().contains("contacts"));
/// assert!(options.includes_path("contacts"));
/// assert!(options.include_audit());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeSelection {
    plan: FetchPlan,
}

impl AttributeSelection {
    /// Parse and validate the raw `attributes` value.
    pub fn resolve(
        registry: &AssociationRegistry,
        root: EntityKind,
        raw: Option<&str>,
    ) -> Result<Self, FetchPlanError> {
        let paths = parse_attribute_list(raw)?;
        Self::from_paths(registry, root, &paths)
    }

    /// Validate already parsed paths.
    pub fn from_paths(
        registry: &AssociationRegistry,
        root: EntityKind,
        paths: &[AttributePath],
    ) -> Result<Self, FetchPlanError> {
        let plan = FetchPlanBuilder::new(registry).build(root, paths)?;
        Ok(Self { plan })
    }

    /// Selection with no associations.
    pub fn basic(root: EntityKind) -> Self {
        Self {
            plan: FetchPlan::empty(root),
        }
    }

    pub fn fetch_plan(&self) -> &FetchPlan {
        &self.plan
    }

    /// Mapping options built from the same validated paths as the plan.
    pub fn mapping_options(&self, include_audit: bool) -> MappingOptions {
        self.mapping_options_with(include_audit, CollectionStrategy::default())
    }

    /// Variant of [`AttributeSelection::mapping_options`] carrying a write
    /// strategy.
    pub fn mapping_options_with(
        &self,
        include_audit: bool,
        strategy: CollectionStrategy,
    ) -> MappingOptions {
        MappingOptions::builder()
            .root(self.plan.root())
            .paths(self.plan.paths().iter().cloned())
            .include_audit(include_audit)
            .collection_strategy(strategy)
            .build()
    }
}
