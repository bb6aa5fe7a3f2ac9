//! Builders wiring repositories and services into the HTTP state.

use std::sync::Arc;

use actix_web::web;
use mockable::DefaultClock;
use tracing::info;

use user_service::domain::ports::{EntityRepository, OwnedEntityRepository};
use user_service::domain::{
    Address, AssociationRegistry, Contact, OwnedEntityService, RegistryError, ServiceContext,
    User, UserService,
};
use user_service::inbound::http::HttpState;
use user_service::outbound::events::TracingEventPublisher;
use user_service::outbound::memory::{
    MemoryAddressRepository, MemoryContactRepository, MemoryStore, MemoryUserRepository,
};
use user_service::outbound::persistence::{
    DieselAddressRepository, DieselContactRepository, DieselUserRepository,
};
use user_service::outbound::security::Sha256PasswordHasher;

use super::ServerConfig;

/// Build the shared service context from the server configuration.
fn build_context(config: &ServerConfig) -> Result<ServiceContext, RegistryError> {
    let registry = Arc::new(AssociationRegistry::standard()?);
    Ok(
        ServiceContext::new(registry, Arc::new(TracingEventPublisher), Arc::new(DefaultClock))
            .with_auditor(config.auditor.clone())
            .with_collection_strategy(config.collection_strategy)
            .with_entity_cache(config.entity_cache),
    )
}

/// Wrap the three repositories in their services.
fn build_services<U, A, C>(
    users: Arc<U>,
    addresses: Arc<A>,
    contacts: Arc<C>,
    context: &ServiceContext,
) -> HttpState
where
    U: EntityRepository<Entity = User> + 'static,
    A: OwnedEntityRepository<Entity = Address> + 'static,
    C: OwnedEntityRepository<Entity = Contact> + 'static,
{
    let user_service = UserService::new(
        Arc::clone(&users),
        Arc::new(Sha256PasswordHasher::new()),
        context.clone(),
    );
    let address_service =
        OwnedEntityService::addresses(addresses, Arc::clone(&users), context.clone());
    let contact_service = OwnedEntityService::contacts(contacts, users, context.clone());
    HttpState::new(
        Arc::new(user_service),
        Arc::new(address_service),
        Arc::new(contact_service),
    )
}

/// Build the HTTP state, backed by PostgreSQL when a pool is configured and
/// by the in-memory store otherwise.
///
/// # Errors
/// Returns [`std::io::Error`] when the association registry is malformed.
pub fn build_http_state(config: &ServerConfig) -> std::io::Result<web::Data<HttpState>> {
    let context = build_context(config)
        .map_err(|err| std::io::Error::other(format!("association registry invalid: {err}")))?;

    let state = match &config.db_pool {
        Some(pool) => {
            info!("using PostgreSQL repositories");
            build_services(
                Arc::new(DieselUserRepository::new(pool.clone())),
                Arc::new(DieselAddressRepository::new(pool.clone())),
                Arc::new(DieselContactRepository::new(pool.clone())),
                &context,
            )
        }
        None => {
            info!("no database configured; using in-memory repositories");
            let store = Arc::new(MemoryStore::new());
            build_services(
                Arc::new(MemoryUserRepository::new(Arc::clone(&store))),
                Arc::new(MemoryAddressRepository::new(Arc::clone(&store))),
                Arc::new(MemoryContactRepository::new(store)),
                &context,
            )
        }
    };
    Ok(web::Data::new(state))
}
