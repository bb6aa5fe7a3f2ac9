//! Per-request options controlling DTO shape.
//!
//! [`MappingOptions`] answers "is this included?" for one conversion call
//! tree. The default is minimal: scalar fields only, no associations, no
//! audit block.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::attribute_path::SEGMENT_SEPARATOR;
use super::EntityKind;

/// How nested collections in a write payload are reconciled with the stored
/// children.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStrategy {
    /// Update children matched by id and attach the unmatched new ones.
    #[default]
    Merge,
    /// Drop every existing child and attach the payload's children.
    Replace,
    /// Leave stored children untouched.
    Ignore,
}

/// Error returned when parsing an unknown strategy name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown collection strategy '{0}', expected merge, replace, or ignore")]
pub struct UnknownCollectionStrategy(pub String);

impl FromStr for CollectionStrategy {
    type Err = UnknownCollectionStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "merge" => Ok(Self::Merge),
            "replace" => Ok(Self::Replace),
            "ignore" => Ok(Self::Ignore),
            _ => Err(UnknownCollectionStrategy(s.to_owned())),
        }
    }
}

impl fmt::Display for CollectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Merge => "merge",
            Self::Replace => "replace",
            Self::Ignore => "ignore",
        })
    }
}

/// Immutable inclusion rules for one DTO conversion.
///
/// ## Invariants
/// - With no requested paths, no association is included.
/// - A requested path implies each of its dot-prefixes.
///
/// # Examples
/// ```
/// use user_service::domain::{EntityKind, MappingOptions};
///
/// let options = MappingOptions::builder()
///     .root(EntityKind::User)
///     .paths(["addresses.user"])
///     .build();
/// assert!(options.includes_path("addresses"));
/// assert!(options.includes_path("addresses.user"));
/// assert!(!options.includes_path("contacts"));
///
/// let basic = MappingOptions::basic();
/// assert!(basic.includes_field("firstName"));
/// assert!(!basic.includes_field("addresses"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingOptions {
    requested: BTreeSet<String>,
    include_audit: bool,
    root: Option<EntityKind>,
    collection_strategy: CollectionStrategy,
}

impl MappingOptions {
    /// Scalars only, no audit.
    pub fn basic() -> Self {
        Self::default()
    }

    /// Start building options.
    pub fn builder() -> MappingOptionsBuilder {
        MappingOptionsBuilder::default()
    }

    /// Whether a field named relative to the root is part of the output.
    ///
    /// Scalars are always included. Dotted names and associations defer to
    /// [`MappingOptions::includes_path`], so they are excluded by default.
    pub fn includes_field(&self, name: &str) -> bool {
        if name.contains(SEGMENT_SEPARATOR) {
            return self.includes_path(name);
        }
        if self.is_scalar(name) {
            return true;
        }
        self.includes_path(name)
    }

    /// Whether `path` was requested verbatim or is a strict dot-prefix of a
    /// requested path.
    pub fn includes_path(&self, path: &str) -> bool {
        self.requested.contains(path)
            || self.requested.iter().any(|requested| {
                requested
                    .strip_prefix(path)
                    .is_some_and(|rest| rest.starts_with(SEGMENT_SEPARATOR))
            })
    }

    /// Whether audit metadata should be emitted.
    pub fn include_audit(&self) -> bool {
        self.include_audit
    }

    /// The validated requested paths.
    pub fn requested_paths(&self) -> &BTreeSet<String> {
        &self.requested
    }

    /// Root entity kind, when known.
    pub fn root(&self) -> Option<EntityKind> {
        self.root
    }

    /// Strategy applied to nested collections on writes.
    pub fn collection_strategy(&self) -> CollectionStrategy {
        self.collection_strategy
    }

    /// Scope rooted at the top-level entity.
    pub fn scope(&self) -> MappingScope<'_> {
        MappingScope {
            options: self,
            prefix: String::new(),
        }
    }

    fn is_scalar(&self, name: &str) -> bool {
        match self.root {
            Some(root) => root.is_scalar(name),
            None => EntityKind::ALL.iter().any(|kind| kind.is_scalar(name)),
        }
    }
}

/// Builder for [`MappingOptions`].
#[derive(Debug, Default)]
pub struct MappingOptionsBuilder {
    options: MappingOptions,
}

impl MappingOptionsBuilder {
    /// Requested attribute paths. Callers pass paths that already passed fetch
    /// plan validation.
    #[must_use]
    pub fn paths<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.requested = paths.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn include_audit(mut self, include_audit: bool) -> Self {
        self.options.include_audit = include_audit;
        self
    }

    #[must_use]
    pub fn root(mut self, root: EntityKind) -> Self {
        self.options.root = Some(root);
        self
    }

    #[must_use]
    pub fn collection_strategy(mut self, strategy: CollectionStrategy) -> Self {
        self.options.collection_strategy = strategy;
        self
    }

    pub fn build(self) -> MappingOptions {
        self.options
    }
}

/// Options viewed from a nested position in the object graph.
///
/// A mapper converting the addresses nested under a user holds the scope
/// `addresses`, so asking it about `user` consults `addresses.user`.
#[derive(Debug, Clone)]
pub struct MappingScope<'a> {
    options: &'a MappingOptions,
    prefix: String,
}

impl<'a> MappingScope<'a> {
    /// Whether the association `field` below this scope is included.
    pub fn includes(&self, field: &str) -> bool {
        self.options.includes_path(&self.qualify(field))
    }

    /// Descend into `field`.
    pub fn nested(&self, field: &str) -> Self {
        Self {
            options: self.options,
            prefix: self.qualify(field),
        }
    }

    /// Whether audit metadata should be emitted.
    pub fn include_audit(&self) -> bool {
        self.options.include_audit()
    }

    /// Dotted path of this scope; empty at the root.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Underlying options.
    pub fn options(&self) -> &'a MappingOptions {
        self.options
    }

    fn qualify(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_owned()
        } else {
            format!("{}{SEGMENT_SEPARATOR}{field}", self.prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn with_paths(paths: &[&str]) -> MappingOptions {
        MappingOptions::builder()
            .root(EntityKind::User)
            .paths(paths.iter().copied())
            .build()
    }

    #[rstest]
    #[case("addresses")]
    #[case("contacts")]
    #[case("addresses.user")]
    #[case("")]
    fn default_options_include_no_path(#[case] path: &str) {
        assert!(!MappingOptions::basic().includes_path(path));
    }

    #[rstest]
    #[case(EntityKind::User)]
    #[case(EntityKind::Address)]
    #[case(EntityKind::Contact)]
    fn default_options_include_every_scalar(#[case] kind: EntityKind) {
        let options = MappingOptions::builder().root(kind).build();
        for field in kind.scalar_fields() {
            assert!(options.includes_field(field), "{kind}.{field}");
        }
    }

    #[rstest]
    #[case("addresses")]
    #[case("addresses.user")]
    fn default_options_exclude_associations_as_fields(#[case] name: &str) {
        let options = MappingOptions::builder().root(EntityKind::User).build();
        assert!(!options.includes_field(name));
    }

    #[test]
    fn nested_request_implies_prefix_but_not_reverse() {
        let nested = with_paths(&["addresses.user"]);
        assert!(nested.includes_path("addresses"));

        let shallow = with_paths(&["addresses"]);
        assert!(!shallow.includes_path("addresses.user"));
    }

    #[test]
    fn prefix_match_respects_segment_boundaries() {
        let options = with_paths(&["addressesArchive"]);
        assert!(!options.includes_path("addresses"));
    }

    #[test]
    fn explicit_paths_keep_scalars_included() {
        let options = with_paths(&["contacts"]);
        assert!(options.includes_field("firstName"));
        assert!(options.includes_field("contacts"));
        assert!(!options.includes_field("addresses"));
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn include_audit_is_returned_verbatim(#[case] flag: bool) {
        let options = MappingOptions::builder().include_audit(flag).build();
        assert_eq!(options.include_audit(), flag);
    }

    #[test]
    fn scope_qualifies_nested_fields() {
        let options = with_paths(&["addresses.user"]);
        let addresses = options.scope().nested("addresses");
        assert_eq!(addresses.prefix(), "addresses");
        assert!(addresses.includes("user"));

        let contacts = options.scope().nested("contacts");
        assert!(!contacts.includes("user"));
    }

    #[rstest]
    #[case("merge", CollectionStrategy::Merge)]
    #[case(" REPLACE ", CollectionStrategy::Replace)]
    #[case("ignore", CollectionStrategy::Ignore)]
    fn strategies_parse_case_insensitively(
        #[case] raw: &str,
        #[case] expected: CollectionStrategy,
    ) {
        assert_eq!(raw.parse::<CollectionStrategy>(), Ok(expected));
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!("append".parse::<CollectionStrategy>().is_err());
    }
}
