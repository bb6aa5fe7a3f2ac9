//! Shared fixtures for the HTTP scenario tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use async_trait::async_trait;
use serde_json::{Value, json};

use user_service::Trace;
use user_service::domain::ports::{EntityRepository, RepositoryError};
use user_service::domain::{CollectionStrategy, EntityId, FetchPlan, User};
use user_service::inbound::http;
use user_service::outbound::memory::{MemoryStore, MemoryUserRepository};
use user_service::test_support::memory_http_state;

/// User repository that counts every call before delegating to the store.
pub struct CountingUserRepository {
    inner: MemoryUserRepository,
    calls: AtomicUsize,
}

impl CountingUserRepository {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self {
            inner: MemoryUserRepository::new(store),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn touch(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntityRepository for CountingUserRepository {
    type Entity = User;

    async fn find_by_id(&self, id: EntityId) -> Result<Option<User>, RepositoryError> {
        self.touch();
        self.inner.find_by_id(id).await
    }

    async fn find_by_id_with_plan(
        &self,
        id: EntityId,
        plan: &FetchPlan,
    ) -> Result<Option<User>, RepositoryError> {
        self.touch();
        self.inner.find_by_id_with_plan(id, plan).await
    }

    async fn find_all(&self) -> Result<Vec<User>, RepositoryError> {
        self.touch();
        self.inner.find_all().await
    }

    async fn find_all_with_plan(&self, plan: &FetchPlan) -> Result<Vec<User>, RepositoryError> {
        self.touch();
        self.inner.find_all_with_plan(plan).await
    }

    async fn save(&self, entity: User) -> Result<User, RepositoryError> {
        self.touch();
        self.inner.save(entity).await
    }

    async fn delete_by_id(&self, id: EntityId) -> Result<bool, RepositoryError> {
        self.touch();
        self.inner.delete_by_id(id).await
    }

    async fn exists_by_id(&self, id: EntityId) -> Result<bool, RepositoryError> {
        self.touch();
        self.inner.exists_by_id(id).await
    }
}

/// Services over one in-memory store, with the user repository observable.
pub struct Harness {
    pub state: web::Data<http::HttpState>,
    pub users: Arc<CountingUserRepository>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_strategy(CollectionStrategy::Merge)
    }

    pub fn with_strategy(strategy: CollectionStrategy) -> Self {
        let store = Arc::new(MemoryStore::new());
        let users = Arc::new(CountingUserRepository::new(Arc::clone(&store)));
        let state = web::Data::new(memory_http_state(&store, Arc::clone(&users), strategy));
        Self { state, users }
    }

    pub fn app(
        &self,
    ) -> App<
        impl ServiceFactory<
            ServiceRequest,
            Config = (),
            Response = ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        > + use<>,
    > {
        App::new()
            .app_data(self.state.clone())
            .wrap(Trace)
            .configure(http::configure)
    }
}

/// Create payload for a user with `addresses` local addresses and
/// `contacts` email contacts.
pub fn user_payload(username: &str, addresses: usize, contacts: usize) -> Value {
    let addresses: Vec<Value> = (0..addresses)
        .map(|n| {
            json!({
                "type": "LOCAL",
                "street": format!("{n} High Street"),
                "postZipCode": "SW1A 1AA",
                "city": "London",
                "country": "United Kingdom"
            })
        })
        .collect();
    let contacts: Vec<Value> = (0..contacts)
        .map(|n| {
            json!({
                "contactType": "PERSONAL",
                "email": format!("{username}.{n}@example.com")
            })
        })
        .collect();
    json!({
        "username": username,
        "password": "correct horse",
        "firstName": "Ada",
        "lastName": "Lovelace",
        "birthDay": "1990-12-10",
        "addresses": addresses,
        "contacts": contacts
    })
}
