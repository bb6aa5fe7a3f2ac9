//! PostgreSQL-backed address repository.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{EntityRepository, OwnedEntityRepository, RepositoryError};
use crate::domain::{Address, Entity, EntityId, FetchPlan};

use super::diesel_loaders::resolve_owners;
use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AddressRow, AddressValues};
use super::pool::DbPool;
use super::schema::addresses;

/// Diesel-backed implementation of the address repository ports.
#[derive(Clone)]
pub struct DieselAddressRepository {
    pool: DbPool,
}

impl DieselAddressRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

async fn finish(
    conn: &mut AsyncPgConnection,
    rows: Vec<AddressRow>,
    plan: Option<&FetchPlan>,
) -> Result<Vec<Address>, RepositoryError> {
    let mut found = rows
        .into_iter()
        .map(AddressRow::into_entity)
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(plan) = plan {
        resolve_owners(conn, &mut found, plan).await?;
    }
    Ok(found)
}

impl DieselAddressRepository {
    async fn load_one(
        &self,
        id: EntityId,
        plan: Option<&FetchPlan>,
    ) -> Result<Option<Address>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AddressRow> = addresses::table
            .find(id.get())
            .select(AddressRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(finish(&mut conn, rows, plan).await?.into_iter().next())
    }

    async fn load_all(&self, plan: Option<&FetchPlan>) -> Result<Vec<Address>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AddressRow> = addresses::table
            .order_by(addresses::id)
            .select(AddressRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        finish(&mut conn, rows, plan).await
    }
}

#[async_trait]
impl EntityRepository for DieselAddressRepository {
    type Entity = Address;

    async fn find_by_id(&self, id: EntityId) -> Result<Option<Address>, RepositoryError> {
        self.load_one(id, None).await
    }

    async fn find_by_id_with_plan(
        &self,
        id: EntityId,
        plan: &FetchPlan,
    ) -> Result<Option<Address>, RepositoryError> {
        self.load_one(id, Some(plan)).await
    }

    async fn find_all(&self) -> Result<Vec<Address>, RepositoryError> {
        self.load_all(None).await
    }

    async fn find_all_with_plan(&self, plan: &FetchPlan) -> Result<Vec<Address>, RepositoryError> {
        self.load_all(Some(plan)).await
    }

    async fn save(&self, mut address: Address) -> Result<Address, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let values = AddressValues::from(&address);
        let id: i64 = match address.id() {
            Some(id) => {
                let updated = diesel::update(addresses::table.find(id.get()))
                    .set(&values)
                    .execute(&mut conn)
                    .await
                    .map_err(map_diesel_error)?;
                if updated == 0 {
                    return Err(RepositoryError::query("record not found"));
                }
                id.get()
            }
            None => diesel::insert_into(addresses::table)
                .values(&values)
                .returning(addresses::id)
                .get_result(&mut conn)
                .await
                .map_err(map_diesel_error)?,
        };
        address.record_mut().id = Some(EntityId::new(id));
        Ok(address)
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(addresses::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn exists_by_id(&self, id: EntityId) -> Result<bool, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::select(diesel::dsl::exists(addresses::table.find(id.get())))
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl OwnedEntityRepository for DieselAddressRepository {
    async fn find_by_user_id(
        &self,
        user_id: EntityId,
        plan: &FetchPlan,
    ) -> Result<Vec<Address>, RepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AddressRow> = addresses::table
            .filter(addresses::user_id.eq(user_id.get()))
            .order_by(addresses::id)
            .select(AddressRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        finish(&mut conn, rows, Some(plan)).await
    }
}
