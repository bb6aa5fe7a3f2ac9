//! Regression coverage for user creation, update, and deletion.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{FixtureEventPublisher, MockEntityRepository, MockPasswordHasher};
use crate::domain::{
    AddressDto, AddressType, ContactDetails, ContactDto, ContactType, ErrorCode, OwnerLink,
    Record, RecordDto, UserProfile,
};
use crate::test_support::service_context;

fn stored_user(id: i64) -> User {
    User::from_storage(
        Record::persisted(EntityId::new(id), None),
        "ada".to_owned(),
        Some("stored-hash".to_owned()),
        UserProfile::default(),
    )
}

fn stored_contact(id: i64, user_id: i64) -> crate::domain::Contact {
    crate::domain::Contact::from_storage(
        Record::persisted(EntityId::new(id), None),
        ContactDetails {
            contact_type: ContactType::Personal,
            phone_number: None,
            email: Some(format!("c{id}@example.com")),
        },
        OwnerLink::stored(Some(EntityId::new(user_id))),
    )
}

fn new_address() -> AddressDto {
    AddressDto {
        address_type: Some(AddressType::International),
        street: Some("1 Rue de Rivoli".to_owned()),
        post_zip_code: Some("75001".to_owned()),
        city: Some("Paris".to_owned()),
        country: Some("FR".to_owned()),
        ..AddressDto::default()
    }
}

fn create_payload() -> UserDto {
    UserDto {
        username: Some("ada".to_owned()),
        password: Some("correct horse".to_owned()),
        first_name: Some("Ada".to_owned()),
        addresses: Some(vec![new_address()]),
        ..UserDto::default()
    }
}

#[fixture]
fn hasher() -> MockPasswordHasher {
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .returning(|plaintext| Ok(format!("hashed:{}", plaintext.len())));
    hasher
}

#[fixture]
fn events() -> Arc<FixtureEventPublisher> {
    Arc::new(FixtureEventPublisher::default())
}

fn service(
    repository: MockEntityRepository,
    hasher: MockPasswordHasher,
    events: Arc<FixtureEventPublisher>,
    strategy: CollectionStrategy,
) -> UserService<MockEntityRepository> {
    UserService::new(
        Arc::new(repository),
        Arc::new(hasher),
        service_context(events, strategy),
    )
}

#[rstest]
#[tokio::test]
async fn create_hashes_password_and_cascades_children(
    hasher: MockPasswordHasher,
    events: Arc<FixtureEventPublisher>,
) {
    let mut repository = MockEntityRepository::new();
    repository
        .expect_save()
        .withf(|user| {
            let stamped_children = user
                .addresses()
                .map(|children| children.len() == 1 && children[0].record().audit.is_some())
                .unwrap_or(false);
            user.password_hash() == Some("hashed:13")
                && user.record().audit.is_some()
                && stamped_children
        })
        .times(1)
        .returning(|mut user| {
            user.assign_id(EntityId::new(11));
            Ok(user)
        });
    let users = service(repository, hasher, Arc::clone(&events), CollectionStrategy::Merge);

    let dto = users.save(create_payload()).await.expect("user created");

    assert_eq!(dto.record.id, Some(EntityId::new(11)));
    assert!(dto.password.is_none());
    assert!(dto.record.audit.is_none());
    assert_eq!(dto.addresses, Some(Vec::new()));
    assert_eq!(events.topics(), ["users.created"]);
}

#[rstest]
#[tokio::test]
async fn invalid_create_touches_nothing(events: Arc<FixtureEventPublisher>) {
    let payload = UserDto {
        username: Some("   ".to_owned()),
        ..UserDto::default()
    };
    let users = service(
        MockEntityRepository::new(),
        MockPasswordHasher::new(),
        Arc::clone(&events),
        CollectionStrategy::Merge,
    );

    let err = users.save(payload).await.expect_err("blank username");

    assert_eq!(err.code(), ErrorCode::ValidationFailed);
    assert!(err.field_errors().contains_key("username"));
    assert!(err.field_errors().contains_key("password"));
    assert!(events.topics().is_empty());
}

#[rstest]
#[tokio::test]
async fn update_loads_only_the_collections_it_reconciles(
    hasher: MockPasswordHasher,
    events: Arc<FixtureEventPublisher>,
) {
    let mut repository = MockEntityRepository::new();
    repository
        .expect_find_by_id_with_plan()
        .withf(|_, plan| plan.contains("contacts") && !plan.touches("addresses"))
        .times(1)
        .returning(|id, _| {
            let mut user = stored_user(id.get());
            user.resolve_contacts(vec![stored_contact(30, id.get())]);
            Ok(Some(user))
        });
    repository
        .expect_save()
        .withf(|user| {
            user.contacts()
                .map(|contacts| {
                    contacts.len() == 1
                        && contacts[0].details.email.as_deref() == Some("new@example.com")
                        && contacts[0].record().audit.is_some()
                })
                .unwrap_or(false)
        })
        .times(1)
        .returning(Ok);
    let users = service(repository, hasher, Arc::clone(&events), CollectionStrategy::Merge);
    let patch = UserDto {
        last_name: Some("Byron".to_owned()),
        contacts: Some(vec![ContactDto {
            record: RecordDto {
                id: Some(EntityId::new(30)),
                audit: None,
            },
            email: Some("new@example.com".to_owned()),
            ..ContactDto::default()
        }]),
        ..UserDto::default()
    };

    let dto = users.update(EntityId::new(3), patch).await.expect("updated");

    assert_eq!(dto.last_name.as_deref(), Some("Byron"));
    assert_eq!(dto.username.as_deref(), Some("ada"));
    assert_eq!(events.topics(), ["users.updated"]);
}

#[rstest]
#[tokio::test]
async fn ignore_strategy_leaves_collections_unloaded(
    hasher: MockPasswordHasher,
    events: Arc<FixtureEventPublisher>,
) {
    let mut repository = MockEntityRepository::new();
    repository
        .expect_find_by_id()
        .times(1)
        .returning(|id| Ok(Some(stored_user(id.get()))));
    repository
        .expect_save()
        .withf(|user| !user.contact_association().is_loaded())
        .times(1)
        .returning(Ok);
    let users = service(repository, hasher, events, CollectionStrategy::Ignore);
    let patch = UserDto {
        contacts: Some(Vec::new()),
        ..UserDto::default()
    };

    users.update(EntityId::new(3), patch).await.expect("updated");
}

#[rstest]
#[tokio::test]
async fn password_is_never_changed_by_update(events: Arc<FixtureEventPublisher>) {
    let mut repository = MockEntityRepository::new();
    repository
        .expect_find_by_id()
        .returning(|id| Ok(Some(stored_user(id.get()))));
    repository
        .expect_save()
        .withf(|user| user.password_hash() == Some("stored-hash"))
        .times(1)
        .returning(Ok);
    // No hashing expectations: hashing on update panics.
    let users = service(
        repository,
        MockPasswordHasher::new(),
        events,
        CollectionStrategy::Merge,
    );
    let patch = UserDto {
        password: Some("new secret".to_owned()),
        ..UserDto::default()
    };

    users.update(EntityId::new(1), patch).await.expect("updated");
}

#[rstest]
#[tokio::test]
async fn deleting_a_missing_user_publishes_nothing(
    hasher: MockPasswordHasher,
    events: Arc<FixtureEventPublisher>,
) {
    let mut repository = MockEntityRepository::new();
    repository.expect_delete_by_id().times(1).returning(|_| Ok(false));
    let users = service(repository, hasher, Arc::clone(&events), CollectionStrategy::Merge);

    let err = users.delete_by_id(EntityId::new(9)).await.expect_err("missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(events.topics().is_empty());
}
