//! Driven ports for entity persistence.
//!
//! Adapters return entities whose associations are resolved exactly as far as
//! the supplied [`FetchPlan`] asks, and leave everything else unresolved. A
//! plan is executed with a bounded number of queries regardless of how many
//! roots are returned.

use async_trait::async_trait;

use crate::domain::{Entity, EntityId, FetchPlan};

use super::define_port_error;

define_port_error! {
    /// Errors raised by repository adapters.
    pub enum RepositoryError {
        /// Connection could not be established or was lost.
        Connection { message: String } => "repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "repository query failed: {message}",
        /// A uniqueness constraint rejected the write.
        Conflict { message: String } => "repository conflict: {message}",
    }
}

/// CRUD persistence for one entity kind.
#[cfg_attr(test, mockall::automock(type Entity = crate::domain::User;))]
#[async_trait]
pub trait EntityRepository: Send + Sync {
    type Entity: Entity;

    /// Scalars only; associations unresolved.
    async fn find_by_id(&self, id: EntityId) -> Result<Option<Self::Entity>, RepositoryError>;

    async fn find_by_id_with_plan(
        &self,
        id: EntityId,
        plan: &FetchPlan,
    ) -> Result<Option<Self::Entity>, RepositoryError>;

    /// Every row ordered by id; associations unresolved.
    async fn find_all(&self) -> Result<Vec<Self::Entity>, RepositoryError>;

    async fn find_all_with_plan(
        &self,
        plan: &FetchPlan,
    ) -> Result<Vec<Self::Entity>, RepositoryError>;

    /// Insert or update, returning the stored state with its id assigned.
    ///
    /// Loaded child collections are synchronised as part of the same write;
    /// unresolved ones are left alone.
    async fn save(&self, entity: Self::Entity) -> Result<Self::Entity, RepositoryError>;

    /// Returns `false` when nothing was deleted.
    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RepositoryError>;

    async fn exists_by_id(&self, id: EntityId) -> Result<bool, RepositoryError>;
}

/// Persistence for entities owned by a user.
#[async_trait]
pub trait OwnedEntityRepository: EntityRepository {
    /// Children of `user_id` ordered by id, loaded per `plan`.
    async fn find_by_user_id(
        &self,
        user_id: EntityId,
        plan: &FetchPlan,
    ) -> Result<Vec<Self::Entity>, RepositoryError>;
}
