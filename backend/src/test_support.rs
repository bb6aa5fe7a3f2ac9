//! Test utilities for the user service crate.
//!
//! This module provides shared helpers for both unit tests (in `src/`) and
//! integration tests (in `tests/`). It is only compiled when running tests
//! or with the `test-support` feature.

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::ports::{EntityRepository, EventPublisher, FixtureEventPublisher};
use crate::domain::{
    AssociationRegistry, CollectionStrategy, OwnedEntityService, ServiceContext, User,
    UserService,
};
use crate::inbound::http::HttpState;
use crate::outbound::memory::{MemoryAddressRepository, MemoryContactRepository, MemoryStore};
use crate::outbound::security::Sha256PasswordHasher;

/// Instant every fixture clock starts at.
pub fn fixture_timestamp() -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).single() {
        Some(at) => at,
        None => panic!("fixture timestamp is ambiguous"),
    }
}

/// Clock that only moves when told to.
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    pub fn advance_seconds(&self, seconds: i64) {
        *self.lock_clock() += TimeDelta::seconds(seconds);
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(_) => panic!("clock mutex"),
        }
    }
}

impl Default for MutableClock {
    fn default() -> Self {
        Self::new(fixture_timestamp())
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// The standard registry behind an `Arc`.
pub fn standard_registry() -> Arc<AssociationRegistry> {
    match AssociationRegistry::standard() {
        Ok(registry) => Arc::new(registry),
        Err(error) => panic!("standard registry is invalid: {error}"),
    }
}

/// Service context with the standard registry and a fixed clock.
pub fn service_context(
    events: Arc<dyn EventPublisher>,
    strategy: CollectionStrategy,
) -> ServiceContext {
    ServiceContext::new(standard_registry(), events, Arc::new(MutableClock::default()))
        .with_auditor("tester")
        .with_collection_strategy(strategy)
}

/// HTTP state over a fresh in-memory store.
///
/// `users` is the user repository the services read through, so tests can
/// wrap the store's repository to observe calls.
pub fn memory_http_state<U>(
    store: &Arc<MemoryStore>,
    users: Arc<U>,
    strategy: CollectionStrategy,
) -> HttpState
where
    U: EntityRepository<Entity = User> + 'static,
{
    let context = service_context(Arc::new(FixtureEventPublisher::default()), strategy);
    let addresses = Arc::new(MemoryAddressRepository::new(Arc::clone(store)));
    let contacts = Arc::new(MemoryContactRepository::new(Arc::clone(store)));
    HttpState::new(
        Arc::new(UserService::new(
            Arc::clone(&users),
            Arc::new(Sha256PasswordHasher::new()),
            context.clone(),
        )),
        Arc::new(OwnedEntityService::addresses(addresses, Arc::clone(&users), context.clone())),
        Arc::new(OwnedEntityService::contacts(contacts, users, context)),
    )
}
