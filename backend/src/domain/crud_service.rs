//! Generic CRUD orchestration shared by every resource.
//!
//! [`CrudService`] resolves the attribute selection before touching storage,
//! loads through the fetch-plan-aware repository, and maps with options built
//! from the same selection. It also owns audit stamping, event publication,
//! and a service-scoped entity cache.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use mockable::Clock;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, warn};

use super::mapper::EntityMapper;
use super::ports::{EntityRepository, EventPublisher, ReadRequest, RepositoryError};
use super::{
    AssociationRegistry, AttributePath, AttributeSelection, Audit, CollectionStrategy, Entity,
    EntityId, EntityKind, Error, FetchPlan, Record,
};

/// Default actor recorded in audit metadata.
pub const DEFAULT_AUDITOR: &str = "system";

/// Collaborators and settings shared by every service.
#[derive(Clone)]
pub struct ServiceContext {
    registry: Arc<AssociationRegistry>,
    events: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
    auditor: String,
    collection_strategy: CollectionStrategy,
    entity_cache: bool,
    generation: Arc<StoreGeneration>,
}

impl ServiceContext {
    pub fn new(
        registry: Arc<AssociationRegistry>,
        events: Arc<dyn EventPublisher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            events,
            clock,
            auditor: DEFAULT_AUDITOR.to_owned(),
            collection_strategy: CollectionStrategy::default(),
            entity_cache: true,
            generation: Arc::new(StoreGeneration::default()),
        }
    }

    #[must_use]
    pub fn with_auditor(mut self, auditor: impl Into<String>) -> Self {
        self.auditor = auditor.into();
        self
    }

    #[must_use]
    pub fn with_collection_strategy(mut self, strategy: CollectionStrategy) -> Self {
        self.collection_strategy = strategy;
        self
    }

    #[must_use]
    pub fn with_entity_cache(mut self, enabled: bool) -> Self {
        self.entity_cache = enabled;
        self
    }

    pub fn registry(&self) -> &Arc<AssociationRegistry> {
        &self.registry
    }

    pub fn collection_strategy(&self) -> CollectionStrategy {
        self.collection_strategy
    }

    /// Write counter shared by every service built from this context.
    pub fn generation(&self) -> &Arc<StoreGeneration> {
        &self.generation
    }

    /// Stamp creation metadata on a new record.
    pub fn stamp_created(&self, record: &mut Record) {
        record.audit = Some(Audit::created(self.clock.utc(), self.auditor.as_str()));
    }

    /// Stamp modification metadata, creating the block if it is missing.
    pub fn stamp_modified(&self, record: &mut Record) {
        let now = self.clock.utc();
        match record.audit.as_mut() {
            Some(audit) => audit.touch(now, self.auditor.as_str()),
            None => record.audit = Some(Audit::created(now, self.auditor.as_str())),
        }
    }
}

/// Monotonic counter bumped after every write through any service.
///
/// Writes on one resource can change rows another resource caches (a user
/// delete removes its addresses, a user merge patches them), so every cache
/// tags its entries with the generation they were read at.
#[derive(Debug, Default)]
pub struct StoreGeneration(AtomicU64);

impl StoreGeneration {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn advance(&self) -> u64 {
        self.0.fetch_add(1, Ordering::AcqRel) + 1
    }
}

/// Scalar-only entity cache keyed by id.
///
/// Entries are served only while no write has happened since they were read.
/// Plan-driven loads bypass it.
pub struct EntityCache<E> {
    enabled: bool,
    generation: Arc<StoreGeneration>,
    entries: Mutex<HashMap<EntityId, (u64, E)>>,
}

impl<E: Clone> EntityCache<E> {
    pub fn new(enabled: bool, generation: Arc<StoreGeneration>) -> Self {
        Self {
            enabled,
            generation,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Generation to pass to [`EntityCache::put`] for a read starting now.
    pub fn observe(&self) -> u64 {
        self.generation.current()
    }

    pub fn get(&self, id: EntityId) -> Option<E> {
        if !self.enabled {
            return None;
        }
        let current = self.generation.current();
        match self.entries.lock() {
            Ok(mut entries) => match entries.get(&id) {
                Some((tag, entity)) if *tag == current => Some(entity.clone()),
                Some(_) => {
                    entries.remove(&id);
                    None
                }
                None => None,
            },
            Err(_) => {
                warn!(%id, "entity cache poisoned; treating as miss");
                None
            }
        }
    }

    /// Store `entity` read at generation `observed`; stale reads are dropped.
    pub fn put(&self, id: EntityId, entity: E, observed: u64) {
        if !self.enabled {
            return;
        }
        match self.entries.lock() {
            Ok(mut entries) => {
                if observed == self.generation.current() {
                    entries.insert(id, (observed, entity));
                }
            }
            Err(_) => warn!(%id, "entity cache poisoned; skipping store"),
        }
    }

    pub fn invalidate(&self, id: EntityId) {
        match self.entries.lock() {
            Ok(mut entries) => {
                entries.remove(&id);
            }
            Err(_) => warn!(%id, "entity cache poisoned; skipping invalidation"),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Event topic prefix per entity kind.
pub const fn topic_root(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::User => "users",
        EntityKind::Address => "addresses",
        EntityKind::Contact => "contacts",
    }
}

/// Map repository failures onto domain errors.
pub fn map_repository_error(error: RepositoryError) -> Error {
    match error {
        RepositoryError::Connection { message } => {
            warn!(%message, "repository unavailable");
            Error::service_unavailable("storage is temporarily unavailable")
        }
        RepositoryError::Query { message } => {
            error!(%message, "repository query failed");
            Error::internal(format!("repository query failed: {message}"))
        }
        RepositoryError::Conflict { message } => {
            debug!(%message, "repository conflict");
            Error::conflict(message)
        }
    }
}

/// Generic CRUD orchestration over one repository and mapper.
pub struct CrudService<R, M>
where
    R: EntityRepository,
{
    repository: Arc<R>,
    mapper: M,
    context: ServiceContext,
    cache: EntityCache<R::Entity>,
}

impl<R, M> CrudService<R, M>
where
    R: EntityRepository,
    M: EntityMapper<Entity = R::Entity>,
    M::Dto: Serialize,
{
    pub fn new(repository: Arc<R>, mapper: M, context: ServiceContext) -> Self {
        let cache = EntityCache::new(context.entity_cache, Arc::clone(&context.generation));
        Self {
            repository,
            mapper,
            context,
            cache,
        }
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn context(&self) -> &ServiceContext {
        &self.context
    }

    pub fn cache(&self) -> &EntityCache<R::Entity> {
        &self.cache
    }

    fn kind() -> EntityKind {
        <R::Entity as Entity>::KIND
    }

    /// Validate the raw attribute list for this root.
    pub fn selection(&self, attributes: Option<&str>) -> Result<AttributeSelection, Error> {
        AttributeSelection::resolve(&self.context.registry, Self::kind(), attributes)
            .map_err(Error::from)
    }

    /// Plan for a fixed set of association paths.
    pub fn plan_for(&self, root: EntityKind, paths: &[&str]) -> Result<FetchPlan, Error> {
        let parsed = paths
            .iter()
            .map(|path| AttributePath::parse(path))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| Error::from(super::FetchPlanError::from(err)))?;
        AttributeSelection::from_paths(&self.context.registry, root, &parsed)
            .map(|selection| selection.fetch_plan().clone())
            .map_err(Error::from)
    }

    /// Load `id` per `plan` or fail with not found.
    pub async fn load(&self, id: EntityId, plan: &FetchPlan) -> Result<R::Entity, Error> {
        if plan.is_empty() {
            if let Some(hit) = self.cache.get(id) {
                return Ok(hit);
            }
        }
        let observed = self.cache.observe();
        let found = if plan.is_empty() {
            self.repository.find_by_id(id).await
        } else {
            self.repository.find_by_id_with_plan(id, plan).await
        }
        .map_err(map_repository_error)?;
        let entity = found.ok_or_else(|| not_found(Self::kind(), id))?;
        if plan.is_empty() {
            self.cache.put(id, entity.clone(), observed);
        }
        Ok(entity)
    }

    pub async fn find_by_id(&self, id: EntityId, request: &ReadRequest) -> Result<M::Dto, Error> {
        let selection = self.selection(request.attributes.as_deref())?;
        let entity = self.load(id, selection.fetch_plan()).await?;
        let options = selection
            .mapping_options_with(request.include_audit, self.context.collection_strategy);
        self.mapper
            .to_dto_with_options(&entity, &options)
            .map_err(Error::from)
    }

    pub async fn find_all(&self, request: &ReadRequest) -> Result<Vec<M::Dto>, Error> {
        let selection = self.selection(request.attributes.as_deref())?;
        let plan = selection.fetch_plan();
        let entities = if plan.is_empty() {
            self.repository.find_all().await
        } else {
            self.repository.find_all_with_plan(plan).await
        }
        .map_err(map_repository_error)?;
        let options = selection
            .mapping_options_with(request.include_audit, self.context.collection_strategy);
        self.mapper
            .to_dto_list(&entities, &options)
            .map_err(Error::from)
    }

    /// Persist `entity`, staling every cached copy across services.
    pub async fn persist(&self, entity: R::Entity) -> Result<R::Entity, Error> {
        let id = entity.id();
        if let Some(id) = id {
            self.cache.invalidate(id);
        }
        let saved = self.repository.save(entity).await;
        self.context.generation.advance();
        if let Some(id) = id {
            self.cache.invalidate(id);
        }
        saved.map_err(map_repository_error)
    }

    /// Delete `id`, failing with not found when nothing was removed.
    pub async fn remove(&self, id: EntityId) -> Result<(), Error> {
        self.cache.invalidate(id);
        let deleted = self.repository.delete_by_id(id).await;
        self.context.generation.advance();
        self.cache.invalidate(id);
        if deleted.map_err(map_repository_error)? {
            Ok(())
        } else {
            Err(not_found(Self::kind(), id))
        }
    }

    /// Publish `<resource>.<action>`; failures are logged, never returned.
    pub async fn publish(&self, action: &str, payload: Value) {
        let topic = format!("{}.{action}", topic_root(Self::kind()));
        if let Err(error) = self.context.events.publish(&topic, payload).await {
            warn!(%topic, %error, "event publication failed");
        }
    }

    /// Publish a DTO payload.
    pub async fn publish_dto(&self, action: &str, dto: &M::Dto) {
        match serde_json::to_value(dto) {
            Ok(payload) => self.publish(action, payload).await,
            Err(error) => warn!(%error, "event payload could not be encoded"),
        }
    }
}

/// Not-found error naming the kind and id.
pub fn not_found(kind: EntityKind, id: EntityId) -> Error {
    Error::not_found(format!("{kind} not found with id: {id}"))
}
