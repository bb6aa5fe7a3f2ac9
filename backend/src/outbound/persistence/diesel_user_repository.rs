//! PostgreSQL-backed user repository.
//!
//! Saving a user with loaded collections synchronises them in the same
//! transaction: new children are inserted, known ones updated, and rows no
//! longer present in the collection are deleted.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{EntityRepository, RepositoryError};
use crate::domain::{Entity, EntityId, FetchPlan, User};

use super::diesel_loaders::{CollectionLoad, resolve_collections};
use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AddressValues, ContactValues, UserRow, UserValues};
use super::pool::DbPool;
use super::schema::{addresses, contacts, users};

/// Diesel-backed implementation of the user [`EntityRepository`].
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn load_users(
    conn: &mut AsyncPgConnection,
    id: Option<EntityId>,
    load: CollectionLoad,
) -> Result<Vec<User>, RepositoryError> {
    let rows: Vec<UserRow> = match id {
        Some(id) => {
            users::table
                .find(id.get())
                .select(UserRow::as_select())
                .load(conn)
                .await
        }
        None => {
            users::table
                .order_by(users::id)
                .select(UserRow::as_select())
                .load(conn)
                .await
        }
    }
    .map_err(map_diesel_error)?;
    let mut found: Vec<User> = rows.into_iter().map(UserRow::into_entity).collect();
    if !found.is_empty() {
        resolve_collections(conn, &mut found, load).await?;
    }
    Ok(found)
}

/// Write the user row and synchronise its loaded collections.
async fn write_aggregate(
    conn: &mut AsyncPgConnection,
    user: &User,
) -> Result<i64, diesel::result::Error> {
    let values = UserValues::from(user);
    let id = match user.id() {
        Some(id) => {
            let updated = diesel::update(users::table.find(id.get()))
                .set(&values)
                .execute(conn)
                .await?;
            if updated == 0 {
                return Err(diesel::result::Error::NotFound);
            }
            id.get()
        }
        None => {
            diesel::insert_into(users::table)
                .values(&values)
                .returning(users::id)
                .get_result(conn)
                .await?
        }
    };

    if let Ok(children) = user.addresses() {
        let mut kept = Vec::with_capacity(children.len());
        for address in children {
            let values = AddressValues {
                user_id: Some(id),
                ..AddressValues::from(address)
            };
            match address.id() {
                Some(child) => {
                    diesel::update(addresses::table.find(child.get()))
                        .set(&values)
                        .execute(conn)
                        .await?;
                    kept.push(child.get());
                }
                None => kept.push(
                    diesel::insert_into(addresses::table)
                        .values(&values)
                        .returning(addresses::id)
                        .get_result(conn)
                        .await?,
                ),
            }
        }
        let orphans = diesel::delete(
            addresses::table
                .filter(addresses::user_id.eq(id))
                .filter(addresses::id.ne_all(kept)),
        )
        .execute(conn)
        .await?;
        debug!(user_id = id, orphans, "addresses synchronised");
    }

    if let Ok(children) = user.contacts() {
        let mut kept = Vec::with_capacity(children.len());
        for contact in children {
            let values = ContactValues {
                user_id: Some(id),
                ..ContactValues::from(contact)
            };
            match contact.id() {
                Some(child) => {
                    diesel::update(contacts::table.find(child.get()))
                        .set(&values)
                        .execute(conn)
                        .await?;
                    kept.push(child.get());
                }
                None => kept.push(
                    diesel::insert_into(contacts::table)
                        .values(&values)
                        .returning(contacts::id)
                        .get_result(conn)
                        .await?,
                ),
            }
        }
        let orphans = diesel::delete(
            contacts::table
                .filter(contacts::user_id.eq(id))
                .filter(contacts::id.ne_all(kept)),
        )
        .execute(conn)
        .await?;
        debug!(user_id = id, orphans, "contacts synchronised");
    }

    Ok(id)
}

#[async_trait]
impl EntityRepository for DieselUserRepository {
    type Entity = User;

    async fn find_by_id(&self, id: EntityId) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let found = load_users(&mut conn, Some(id), CollectionLoad::default()).await?;
        Ok(found.into_iter().next())
    }

    async fn find_by_id_with_plan(
        &self,
        id: EntityId,
        plan: &FetchPlan,
    ) -> Result<Option<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let found = load_users(&mut conn, Some(id), CollectionLoad::for_plan(plan)).await?;
        Ok(found.into_iter().next())
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        load_users(&mut conn, None, CollectionLoad::default()).await
    }

    async fn find_all_with_plan(&self, plan: &FetchPlan) -> Result<Vec<User>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        load_users(&mut conn, None, CollectionLoad::for_plan(plan)).await
    }

    async fn save(&self, user: User) -> Result<User, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let reload = CollectionLoad::mirroring(&user);
        let aggregate = &user;
        let id = conn
            .transaction(|conn| async move { write_aggregate(conn, aggregate).await }.scope_boxed())
            .await
            .map_err(map_diesel_error)?;

        load_users(&mut conn, Some(EntityId::new(id)), reload)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::query("saved user vanished before reload"))
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        // Addresses and contacts go with it through ON DELETE CASCADE.
        let deleted = diesel::delete(users::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn exists_by_id(&self, id: EntityId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(users::table.find(id.get())))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}
