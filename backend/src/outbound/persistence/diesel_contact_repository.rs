//! PostgreSQL-backed contact repository.
//!
//! Email and phone number carry unique indexes; a duplicate surfaces as
//! [`RepositoryError::Conflict`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{EntityRepository, OwnedEntityRepository, RepositoryError};
use crate::domain::{Contact, Entity, EntityId, FetchPlan};

use super::diesel_loaders::resolve_owners;
use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{ContactRow, ContactValues};
use super::pool::DbPool;
use super::schema::contacts;

/// Diesel-backed implementation of the contact repository ports.
#[derive(Clone)]
pub struct DieselContactRepository {
    pool: DbPool,
}

impl DieselContactRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn finish(
    conn: &mut AsyncPgConnection,
    rows: Vec<ContactRow>,
    plan: Option<&FetchPlan>,
) -> Result<Vec<Contact>, RepositoryError> {
    let mut found = rows
        .into_iter()
        .map(ContactRow::into_entity)
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(plan) = plan {
        resolve_owners(conn, &mut found, plan).await?;
    }
    Ok(found)
}

impl DieselContactRepository {
    async fn load_one(
        &self,
        id: EntityId,
        plan: Option<&FetchPlan>,
    ) -> Result<Option<Contact>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ContactRow> = contacts::table
            .find(id.get())
            .select(ContactRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(finish(&mut conn, rows, plan).await?.into_iter().next())
    }

    async fn load_all(&self, plan: Option<&FetchPlan>) -> Result<Vec<Contact>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ContactRow> = contacts::table
            .order_by(contacts::id)
            .select(ContactRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        finish(&mut conn, rows, plan).await
    }
}

#[async_trait]
impl EntityRepository for DieselContactRepository {
    type Entity = Contact;

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Contact>, RepositoryError> {
        self.load_one(id, None).await
    }

    async fn find_by_id_with_plan(
        &self,
        id: EntityId,
        plan: &FetchPlan,
    ) -> Result<Option<Contact>, RepositoryError> {
        self.load_one(id, Some(plan)).await
    }

    async fn find_all(&self) -> Result<Vec<Contact>, RepositoryError> {
        self.load_all(None).await
    }

    async fn find_all_with_plan(&self, plan: &FetchPlan) -> Result<Vec<Contact>, RepositoryError> {
        self.load_all(Some(plan)).await
    }

    async fn save(&self, mut contact: Contact) -> Result<Contact, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let values = ContactValues::from(&contact);
        let id: i64 = match contact.id() {
            Some(id) => {
                let updated = diesel::update(contacts::table.find(id.get()))
                    .set(&values)
                    .execute(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                if updated == 0 {
                    return Err(RepositoryError::query("record not found"));
                }
                id.get()
            }
            None => diesel::insert_into(contacts::table)
                .values(&values)
                .returning(contacts::id)
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?,
        };
        contact.record_mut().id = Some(EntityId::new(id));
        Ok(contact)
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(contacts::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn exists_by_id(&self, id: EntityId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(contacts::table.find(id.get())))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl OwnedEntityRepository for DieselContactRepository {
    async fn find_by_user_id(
        &self,
        user_id: EntityId,
        plan: &FetchPlan,
    ) -> Result<Vec<Contact>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ContactRow> = contacts::table
            .filter(contacts::user_id.eq(user_id.get()))
            .order_by(contacts::id)
            .select(ContactRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        finish(&mut conn, rows, Some(plan)).await
    }
}
