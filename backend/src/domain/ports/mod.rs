//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod entity_repository;
mod event_publisher;
mod password_hasher;
mod resource_service;

#[cfg(test)]
pub use entity_repository::MockEntityRepository;
pub use entity_repository::{EntityRepository, OwnedEntityRepository, RepositoryError};
#[cfg(test)]
pub use event_publisher::MockEventPublisher;
pub use event_publisher::{EventPublishError, EventPublisher, FixtureEventPublisher};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHashError, PasswordHasher};
pub use resource_service::{OwnedResourceService, ReadRequest, ResourceService};
