//! Repository ports over a shared [`MemoryStore`].

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{EntityRepository, OwnedEntityRepository, RepositoryError};
use crate::domain::{Address, Contact, EntityId, FetchPlan, User};

use super::store::{MemoryStore, StoredChild};

/// In-memory user repository.
#[derive(Debug, Clone)]
pub struct MemoryUserRepository {
    store: Arc<MemoryStore>,
}

impl MemoryUserRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }

    fn load(&self, ids: Option<EntityId>, plan: Option<&FetchPlan>) -> Result<Vec<User>, RepositoryError> {
        let addresses = plan.is_some_and(|plan| plan.touches("addresses"));
        let contacts = plan.is_some_and(|plan| plan.touches("contacts"));
        self.store.read(|tables| {
            let ids = match ids {
                Some(id) => vec![id],
                None => tables.user_ids(),
            };
            ids.into_iter()
                .filter_map(|id| tables.load_user(id, addresses, contacts))
                .collect()
        })
    }
}

#[async_trait]
impl EntityRepository for MemoryUserRepository {
    type Entity = User;

    async fn find_by_id(&self, id: EntityId) -> Result<Option<User>, RepositoryError> {
        Ok(self.load(Some(id), None)?.into_iter().next())
    }

    async fn find_by_id_with_plan(
        &self,
        id: EntityId,
        plan: &FetchPlan,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.load(Some(id), Some(plan))?.into_iter().next())
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        self.load(None, None)
    }

    async fn find_all_with_plan(&self, plan: &FetchPlan) -> Result<Vec<User>, RepositoryError> {
        self.load(None, Some(plan))
    }

    async fn save(&self, user: User) -> Result<User, RepositoryError> {
        let addresses = user.address_association().is_loaded();
        let contacts = user.contact_association().is_loaded();
        let id = self.store.write(|tables| tables.write_user(&user))?;
        self.store
            .read(|tables| tables.load_user(id, addresses, contacts))?
            .ok_or_else(|| RepositoryError::query("saved user vanished before reload"))
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RepositoryError> {
        self.store.write(|tables| Ok(tables.delete_user(id)))
    }

    async fn exists_by_id(&self, id: EntityId) -> Result<bool, RepositoryError> {
        self.store.read(|tables| tables.user_exists(id))
    }
}

/// In-memory repository for one user-owned child kind.
#[derive(Debug)]
pub struct MemoryOwnedRepository<C> {
    store: Arc<MemoryStore>,
    kind: PhantomData<fn() -> C>,
}

pub type MemoryAddressRepository = MemoryOwnedRepository<Address>;
pub type MemoryContactRepository = MemoryOwnedRepository<Contact>;

impl<C> MemoryOwnedRepository<C> {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            store,
            kind: PhantomData,
        }
    }
}

impl<C> Clone for MemoryOwnedRepository<C> {
    fn clone(&self) -> Self {
        Self::new(Arc::clone(&self.store))
    }
}

#[async_trait]
impl<C: StoredChild> EntityRepository for MemoryOwnedRepository<C> {
    type Entity = C;

    async fn find_by_id(&self, id: EntityId) -> Result<Option<C>, RepositoryError> {
        self.store
            .read(|tables| tables.load_children::<C>(None, |row, _| row == id).pop())
    }

    async fn find_by_id_with_plan(
        &self,
        id: EntityId,
        plan: &FetchPlan,
    ) -> Result<Option<C>, RepositoryError> {
        self.store
            .read(|tables| tables.load_children::<C>(Some(plan), |row, _| row == id).pop())
    }

    async fn find_all(&self) -> Result<Vec<C>, RepositoryError> {
        self.store
            .read(|tables| tables.load_children::<C>(None, |_, _| true))
    }

    async fn find_all_with_plan(&self, plan: &FetchPlan) -> Result<Vec<C>, RepositoryError> {
        self.store
            .read(|tables| tables.load_children::<C>(Some(plan), |_, _| true))
    }

    async fn save(&self, mut child: C) -> Result<C, RepositoryError> {
        let id = self.store.write(|tables| tables.write_child(&child))?;
        child.record_mut().id = Some(id);
        Ok(child)
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RepositoryError> {
        self.store.write(|tables| Ok(tables.delete_child::<C>(id)))
    }

    async fn exists_by_id(&self, id: EntityId) -> Result<bool, RepositoryError> {
        self.store.read(|tables| tables.child_exists::<C>(id))
    }
}

#[async_trait]
impl<C: StoredChild> OwnedEntityRepository for MemoryOwnedRepository<C> {
    async fn find_by_user_id(
        &self,
        user_id: EntityId,
        plan: &FetchPlan,
    ) -> Result<Vec<C>, RepositoryError> {
        self.store.read(|tables| {
            tables.load_children::<C>(Some(plan), |_, owner| owner == Some(user_id))
        })
    }
}

#[cfg(test)]
mod tests;
