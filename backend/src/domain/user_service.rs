//! User resource orchestration.
//!
//! Creates hash the password before anything is stored and cascade nested
//! addresses and contacts. Updates patch the profile and reconcile nested
//! collections under the configured [`CollectionStrategy`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::{debug, error, info};

use super::crud_service::{CrudService, ServiceContext};
use super::mapper::{EntityMapper, PatchedChildren, UserMapper};
use super::ports::{EntityRepository, PasswordHashError, PasswordHasher, ReadRequest, ResourceService};
use super::validation::{Intent, validate_user};
use super::{CollectionStrategy, Entity, EntityId, Error, FetchPlan, OwnedByUser, User, UserDto};

/// CRUD for users and their nested children.
pub struct UserService<R>
where
    R: EntityRepository<Entity = User>,
{
    crud: CrudService<R, UserMapper>,
    hasher: Arc<dyn PasswordHasher>,
}

impl<R> UserService<R>
where
    R: EntityRepository<Entity = User>,
{
    pub fn new(repository: Arc<R>, hasher: Arc<dyn PasswordHasher>, context: ServiceContext) -> Self {
        let mapper = UserMapper::new(Arc::clone(context.registry()));
        Self {
            crud: CrudService::new(repository, mapper, context),
            hasher,
        }
    }

    /// Plan that loads the collections an update payload will reconcile.
    fn update_plan(&self, dto: &UserDto) -> Result<FetchPlan, Error> {
        let strategy = self.crud.context().collection_strategy();
        let mut paths = Vec::new();
        if strategy != CollectionStrategy::Ignore {
            if dto.addresses.is_some() {
                paths.push("addresses");
            }
            if dto.contacts.is_some() {
                paths.push("contacts");
            }
        }
        self.crud.plan_for(User::KIND, &paths)
    }

    fn stamp_children(&self, user: &mut User, patched: &PatchedChildren) {
        stamp_owned::<super::Address>(self.crud.context(), user, &patched.addresses);
        stamp_owned::<super::Contact>(self.crud.context(), user, &patched.contacts);
    }
}

/// Stamp new children as created and patched ones as modified.
fn stamp_owned<C: OwnedByUser>(context: &ServiceContext, user: &mut User, patched: &[EntityId]) {
    let Ok(children) = C::siblings_mut(user) else {
        return;
    };
    for child in children {
        match child.id() {
            None => context.stamp_created(child.record_mut()),
            Some(id) if patched.contains(&id) => context.stamp_modified(child.record_mut()),
            Some(_) => {}
        }
    }
}

fn map_hash_error(error: PasswordHashError) -> Error {
    error!(%error, "password hashing failed");
    Error::internal("password could not be processed")
}

#[async_trait]
impl<R> ResourceService<UserDto> for UserService<R>
where
    R: EntityRepository<Entity = User> + 'static,
{
    async fn find_by_id(&self, id: EntityId, request: &ReadRequest) -> Result<UserDto, Error> {
        self.crud.find_by_id(id, request).await
    }

    async fn find_all(&self, request: &ReadRequest) -> Result<Vec<UserDto>, Error> {
        self.crud.find_all(request).await
    }

    async fn save(&self, mut dto: UserDto) -> Result<UserDto, Error> {
        validate_user(&dto, Intent::Create)?;
        let password = dto
            .take_password()
            .ok_or_else(|| Error::invalid_request("password is required"))?;
        let mapper = self.crud.mapper();
        let mut user = mapper.to_entity(&dto)?;
        user.set_password_hash(self.hasher.hash(password.as_str()).map_err(map_hash_error)?);

        let context = self.crud.context();
        let patched = mapper.apply_collections(&dto, &mut user, context.collection_strategy())?;
        context.stamp_created(user.record_mut());
        self.stamp_children(&mut user, &patched);

        let saved = self.crud.persist(user).await?;
        let out = mapper.to_dto(&saved);
        info!(id = ?out.record.id, "user created");
        self.crud.publish_dto("created", &out).await;
        Ok(out)
    }

    async fn update(&self, id: EntityId, mut dto: UserDto) -> Result<UserDto, Error> {
        validate_user(&dto, Intent::Update)?;
        if dto.take_password().is_some() {
            debug!(%id, "password ignored on user update");
        }
        let plan = self.update_plan(&dto)?;
        let mut user = self.crud.load(id, &plan).await?;

        let mapper = self.crud.mapper();
        let context = self.crud.context();
        mapper.partial_update(&dto, &mut user);
        let patched = mapper.apply_collections(&dto, &mut user, context.collection_strategy())?;
        context.stamp_modified(user.record_mut());
        self.stamp_children(&mut user, &patched);

        let saved = self.crud.persist(user).await?;
        let out = mapper.to_dto(&saved);
        info!(%id, "user updated");
        self.crud.publish_dto("updated", &out).await;
        Ok(out)
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<(), Error> {
        self.crud.remove(id).await?;
        info!(%id, "user deleted");
        self.crud.publish("deleted", json!({ "id": id })).await;
        Ok(())
    }
}

#[cfg(test)]
mod tests;
