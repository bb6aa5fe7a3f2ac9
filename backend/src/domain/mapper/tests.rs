//! Regression coverage for entity and DTO conversion.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::{
    Address, AddressDetails, AddressDto, AddressType, AssociationRegistry, Audit,
    CollectionStrategy, Contact, ContactDetails, ContactDto, ContactType, EntityId, OwnedByUser,
    OwnerLink, User, UserDto, UserProfile,
};

#[fixture]
fn registry() -> Arc<AssociationRegistry> {
    Arc::new(AssociationRegistry::standard().expect("valid registry"))
}

fn audit() -> Audit {
    let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().expect("valid date");
    Audit::created(at, "seed")
}

fn stored_user(id: i64) -> User {
    User::from_storage(
        Record::persisted(EntityId::new(id), Some(audit())),
        "ada".to_owned(),
        Some("hash".to_owned()),
        UserProfile {
            first_name: Some("Ada".to_owned()),
            last_name: Some("Lovelace".to_owned()),
            birth_day: NaiveDate::from_ymd_opt(1815, 12, 10),
        },
    )
}

fn stored_address(id: i64, user_id: i64) -> Address {
    Address::from_storage(
        Record::persisted(EntityId::new(id), Some(audit())),
        AddressDetails {
            address_type: AddressType::Local,
            street: format!("{id} Analytical Way"),
            post_zip_code: "W1".to_owned(),
            province: None,
            city: "London".to_owned(),
            country: "UK".to_owned(),
        },
        OwnerLink::stored(Some(EntityId::new(user_id))),
    )
}

fn stored_contact(id: i64, user_id: i64) -> Contact {
    Contact::from_storage(
        Record::persisted(EntityId::new(id), None),
        ContactDetails {
            contact_type: ContactType::Personal,
            phone_number: None,
            email: Some(format!("c{id}@example.com")),
        },
        OwnerLink::stored(Some(EntityId::new(user_id))),
    )
}

fn options(paths: &[&str], include_audit: bool) -> MappingOptions {
    MappingOptions::builder()
        .root(EntityKind::User)
        .paths(paths.iter().copied())
        .include_audit(include_audit)
        .build()
}

#[rstest]
fn basic_mapping_has_scalars_only(registry: Arc<AssociationRegistry>) {
    let mapper = UserMapper::new(registry);
    let dto = mapper.to_dto(&stored_user(1));

    assert_eq!(dto.record.id, Some(EntityId::new(1)));
    assert_eq!(dto.username.as_deref(), Some("ada"));
    assert!(dto.password.is_none());
    assert!(dto.record.audit.is_none());
    assert_eq!(dto.addresses, Some(Vec::new()));
    assert_eq!(dto.contacts, Some(Vec::new()));
}

#[rstest]
fn requested_collection_is_populated_and_others_are_empty(registry: Arc<AssociationRegistry>) {
    let mapper = UserMapper::new(registry);
    let mut user = stored_user(1);
    user.resolve_addresses(vec![stored_address(10, 1), stored_address(11, 1)]);

    let dto = mapper
        .to_dto_with_options(&user, &options(&["addresses"], false))
        .expect("addresses loaded");

    assert_eq!(dto.addresses.as_ref().map(Vec::len), Some(2));
    assert_eq!(dto.contacts, Some(Vec::new()));
    let first = dto.addresses.as_ref().and_then(|a| a.first()).expect("one address");
    assert_eq!(first.user_id, Some(EntityId::new(1)));
    assert!(first.user.is_none());
}

#[rstest]
fn nested_reference_path_adds_user_summary(registry: Arc<AssociationRegistry>) {
    let mapper = UserMapper::new(registry);
    let mut user = stored_user(4);
    user.resolve_addresses(vec![stored_address(10, 4)]);

    let dto = mapper
        .to_dto_with_options(&user, &options(&["addresses.user"], false))
        .expect("addresses loaded");

    let summary = dto
        .addresses
        .as_ref()
        .and_then(|a| a.first())
        .and_then(|a| a.user.clone())
        .expect("summary present");
    assert_eq!(summary.id, Some(EntityId::new(4)));
    assert_eq!(summary.username, "ada");
}

#[rstest]
fn unresolved_requested_association_fails(registry: Arc<AssociationRegistry>) {
    let mapper = UserMapper::new(registry);
    let err = mapper
        .to_dto_with_options(&stored_user(1), &options(&["contacts"], false))
        .expect_err("contacts were not loaded");
    assert!(matches!(err, MappingError::Unresolved(_)));
}

#[rstest]
fn unrequested_unresolved_association_is_not_read(registry: Arc<AssociationRegistry>) {
    let mapper = UserMapper::new(registry);
    let dto = mapper
        .to_dto_with_options(&stored_user(1), &options(&[], true))
        .expect("nothing requested");
    assert_eq!(dto.addresses, Some(Vec::new()));
}

#[rstest]
#[case(true)]
#[case(false)]
fn audit_follows_flag_and_id_survives(registry: Arc<AssociationRegistry>, #[case] include: bool) {
    let mapper = AddressMapper::new(registry);
    let address = stored_address(42, 1);
    let scoped = MappingOptions::builder()
        .root(EntityKind::Address)
        .include_audit(include)
        .build();

    let dto = mapper.to_dto_with_options(&address, &scoped).expect("no associations");

    assert_eq!(dto.record.id, Some(EntityId::new(42)));
    assert_eq!(dto.record.audit.is_some(), include);
}

#[rstest]
fn address_reference_requires_loaded_user(registry: Arc<AssociationRegistry>) {
    let mapper = AddressMapper::new(registry);
    let scoped = MappingOptions::builder()
        .root(EntityKind::Address)
        .paths(["user"])
        .build();
    let mut address = stored_address(3, 9);

    assert!(mapper.to_dto_with_options(&address, &scoped).is_err());

    address.owner_mut().resolve(Some(crate::domain::UserRef {
        id: Some(EntityId::new(9)),
        username: "grace".to_owned(),
    }));
    let dto = mapper.to_dto_with_options(&address, &scoped).expect("user loaded");
    assert_eq!(dto.user.map(|u| u.username), Some("grace".to_owned()));
}

#[rstest]
fn partial_update_skips_nulls_and_system_fields(registry: Arc<AssociationRegistry>) {
    let mapper = UserMapper::new(registry);
    let mut user = stored_user(1);
    let before = user.clone();
    let dto = UserDto {
        record: RecordDto {
            id: Some(EntityId::new(99)),
            audit: None,
        },
        username: Some("mallory".to_owned()),
        password: Some("new-password".to_owned()),
        last_name: Some("Byron".to_owned()),
        ..UserDto::default()
    };

    mapper.partial_update(&dto, &mut user);

    assert_eq!(user.profile.last_name.as_deref(), Some("Byron"));
    assert_eq!(user.profile.first_name, before.profile.first_name);
    assert_eq!(user.profile.birth_day, before.profile.birth_day);
    assert_eq!(user.id(), Some(EntityId::new(1)));
    assert_eq!(user.username(), "ada");
    assert_eq!(user.password_hash(), Some("hash"));
    assert_eq!(user.record().audit, before.record().audit);
}

#[rstest]
fn partial_update_of_address_keeps_owner(registry: Arc<AssociationRegistry>) {
    let mapper = AddressMapper::new(registry);
    let mut address = stored_address(5, 2);
    let dto = AddressDto {
        city: Some("Paris".to_owned()),
        province: Some("IDF".to_owned()),
        user_id: Some(EntityId::new(77)),
        ..AddressDto::default()
    };

    mapper.partial_update(&dto, &mut address);

    assert_eq!(address.details.city, "Paris");
    assert_eq!(address.details.province.as_deref(), Some("IDF"));
    assert_eq!(address.details.street, "5 Analytical Way");
    assert_eq!(address.user_id(), Some(EntityId::new(2)));
}

#[rstest]
fn to_entity_never_wires_associations(registry: Arc<AssociationRegistry>) {
    let mapper = UserMapper::new(registry);
    let dto = UserDto {
        record: RecordDto {
            id: Some(EntityId::new(3)),
            audit: None,
        },
        username: Some("grace".to_owned()),
        addresses: Some(vec![AddressDto::default()]),
        ..UserDto::default()
    };

    let user = mapper.to_entity(&dto).expect("username present");

    assert_eq!(user.id(), None);
    assert!(user.addresses().expect("new user").is_empty());
    assert!(user.contacts().expect("new user").is_empty());
}

#[rstest]
fn to_entity_reports_missing_required_field(registry: Arc<AssociationRegistry>) {
    let mapper = ContactMapper::new(registry);
    let err = mapper.to_entity(&ContactDto::default()).expect_err("type missing");
    assert_eq!(
        err,
        MappingError::MissingField {
            entity: EntityKind::Contact,
            field: "contactType",
        }
    );
}

fn nested_contact(id: Option<i64>, email: &str) -> ContactDto {
    ContactDto {
        record: RecordDto {
            id: id.map(EntityId::new),
            audit: None,
        },
        contact_type: Some(ContactType::Work),
        email: Some(email.to_owned()),
        ..ContactDto::default()
    }
}

#[rstest]
fn merge_patches_matches_and_attaches_new_children(registry: Arc<AssociationRegistry>) {
    let mapper = UserMapper::new(registry);
    let mut user = stored_user(1);
    user.resolve_contacts(vec![stored_contact(20, 1), stored_contact(21, 1)]);
    let dto = UserDto {
        contacts: Some(vec![
            nested_contact(Some(20), "patched@example.com"),
            nested_contact(None, "new@example.com"),
        ]),
        ..UserDto::default()
    };

    let patched = mapper
        .apply_collections(&dto, &mut user, CollectionStrategy::Merge)
        .expect("contacts loaded");

    assert_eq!(patched.contacts, [EntityId::new(20)]);
    assert!(patched.addresses.is_empty());
    let contacts = user.contacts().expect("loaded");
    assert_eq!(contacts.len(), 3);
    assert_eq!(contacts[0].details.email.as_deref(), Some("patched@example.com"));
    assert!(contacts.iter().all(|c| c.user_id() == Some(EntityId::new(1))));
}

#[rstest]
fn replace_detaches_existing_children(registry: Arc<AssociationRegistry>) {
    let mapper = UserMapper::new(registry);
    let mut user = stored_user(1);
    user.resolve_contacts(vec![stored_contact(20, 1)]);
    let dto = UserDto {
        contacts: Some(vec![nested_contact(None, "only@example.com")]),
        ..UserDto::default()
    };

    mapper
        .apply_collections(&dto, &mut user, CollectionStrategy::Replace)
        .expect("contacts loaded");

    let contacts = user.contacts().expect("loaded");
    assert_eq!(contacts.len(), 1);
    assert!(contacts[0].id().is_none());
}

#[rstest]
fn ignore_and_absent_payloads_leave_children_alone(registry: Arc<AssociationRegistry>) {
    let mapper = UserMapper::new(registry);
    let mut user = stored_user(1);
    user.resolve_contacts(vec![stored_contact(20, 1)]);
    let with_payload = UserDto {
        contacts: Some(Vec::new()),
        ..UserDto::default()
    };

    mapper
        .apply_collections(&with_payload, &mut user, CollectionStrategy::Ignore)
        .expect("ignored");
    mapper
        .apply_collections(&UserDto::default(), &mut user, CollectionStrategy::Replace)
        .expect("absent collections skip strategy");

    assert_eq!(user.contacts().expect("loaded").len(), 1);
}
