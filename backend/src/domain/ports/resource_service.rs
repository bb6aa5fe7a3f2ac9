//! Driving ports exposing entity resources to inbound adapters.

use async_trait::async_trait;

use crate::domain::{EntityId, Error};

/// Read parameters shared by the find operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReadRequest {
    /// Emit the audit block.
    pub include_audit: bool,
    /// Raw comma-separated attribute paths, validated by the service.
    pub attributes: Option<String>,
}

impl ReadRequest {
    pub fn new(include_audit: bool, attributes: Option<String>) -> Self {
        Self {
            include_audit,
            attributes,
        }
    }
}

/// CRUD use-cases for one resource, expressed in DTOs.
#[async_trait]
pub trait ResourceService<D>: Send + Sync
where
    D: Send + 'static,
{
    async fn find_by_id(&self, id: EntityId, request: &ReadRequest) -> Result<D, Error>;

    async fn find_all(&self, request: &ReadRequest) -> Result<Vec<D>, Error>;

    /// Create from a validated payload; returns the basic shape.
    async fn save(&self, dto: D) -> Result<D, Error>;

    /// Patch the record with `id`; returns the basic shape.
    async fn update(&self, id: EntityId, dto: D) -> Result<D, Error>;

    async fn delete_by_id(&self, id: EntityId) -> Result<(), Error>;
}

/// Resources owned by a user.
#[async_trait]
pub trait OwnedResourceService<D>: ResourceService<D>
where
    D: Send + 'static,
{
    async fn find_by_user_id(&self, user_id: EntityId, include_audit: bool)
    -> Result<Vec<D>, Error>;
}
