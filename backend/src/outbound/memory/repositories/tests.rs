//! Regression coverage for the in-memory repositories.

use std::sync::Arc;

use rstest::{fixture, rstest};

use super::*;
use crate::domain::{
    AddressDetails, AddressType, AttributePath, ContactDetails, ContactType, EntityKind,
    FetchPlanBuilder, OwnedByUser,
};
use crate::domain::record::Entity;
use crate::test_support::standard_registry;

struct Repos {
    users: MemoryUserRepository,
    addresses: MemoryAddressRepository,
    contacts: MemoryContactRepository,
}

#[fixture]
fn repos() -> Repos {
    let store = Arc::new(MemoryStore::new());
    Repos {
        users: MemoryUserRepository::new(Arc::clone(&store)),
        addresses: MemoryAddressRepository::new(Arc::clone(&store)),
        contacts: MemoryContactRepository::new(store),
    }
}

fn plan(root: EntityKind, paths: &[&str]) -> FetchPlan {
    let registry = standard_registry();
    let parsed: Vec<_> = paths
        .iter()
        .map(|path| AttributePath::parse(path).expect("valid path"))
        .collect();
    FetchPlanBuilder::new(&registry)
        .build(root, &parsed)
        .expect("resolvable plan")
}

fn address(street: &str) -> Address {
    Address::new(AddressDetails {
        address_type: AddressType::Local,
        street: street.to_owned(),
        post_zip_code: "12345".to_owned(),
        province: None,
        city: "Springfield".to_owned(),
        country: "US".to_owned(),
    })
}

fn contact(email: &str) -> Contact {
    Contact::new(ContactDetails {
        contact_type: ContactType::Personal,
        phone_number: None,
        email: Some(email.to_owned()),
    })
}

async fn saved_user(repos: &Repos, username: &str, streets: &[&str], emails: &[&str]) -> User {
    let mut user = User::new(username);
    for street in streets {
        user.add_address(address(street)).expect("new user collections are loaded");
    }
    for email in emails {
        user.add_contact(contact(email)).expect("new user collections are loaded");
    }
    repos.users.save(user).await.expect("user saved")
}

#[rstest]
#[tokio::test]
async fn saving_a_user_cascades_children(repos: Repos) {
    let user = saved_user(&repos, "ada", &["1 Main St", "2 Main St"], &["ada@example.com"]).await;
    let id = user.id().expect("id assigned");

    let addresses = user.addresses().expect("loaded on save");
    assert_eq!(addresses.len(), 2);
    assert!(addresses.iter().all(|a| a.id().is_some() && a.user_id() == Some(id)));
    assert_eq!(repos.contacts.find_all().await.expect("listed").len(), 1);
}

#[rstest]
#[tokio::test]
async fn scalar_reads_leave_collections_unresolved(repos: Repos) {
    let user = saved_user(&repos, "ada", &["1 Main St"], &[]).await;

    let found = repos
        .users
        .find_by_id(user.id().expect("id"))
        .await
        .expect("read")
        .expect("present");

    assert!(found.addresses().is_err());
    assert!(found.contacts().is_err());
}

#[rstest]
#[tokio::test]
async fn plans_resolve_only_what_they_touch(repos: Repos) {
    let user = saved_user(&repos, "ada", &["1 Main St", "2 Main St"], &["ada@example.com"]).await;

    let found = repos
        .users
        .find_by_id_with_plan(user.id().expect("id"), &plan(EntityKind::User, &["addresses"]))
        .await
        .expect("read")
        .expect("present");

    assert_eq!(found.addresses().expect("requested").len(), 2);
    assert!(found.contacts().is_err());
}

#[rstest]
#[tokio::test]
async fn child_reads_resolve_the_owner_on_request(repos: Repos) {
    let user = saved_user(&repos, "ada", &["1 Main St"], &[]).await;
    let user_id = user.id().expect("id");

    let plain = repos
        .addresses
        .find_by_user_id(user_id, &FetchPlan::empty(EntityKind::Address))
        .await
        .expect("listed");
    let with_owner = repos
        .addresses
        .find_all_with_plan(&plan(EntityKind::Address, &["user"]))
        .await
        .expect("listed");

    assert!(!plain[0].owner().user().is_loaded());
    let owner = with_owner[0].owner().user().get().cloned().flatten();
    assert_eq!(owner.map(|o| o.username), Some("ada".to_owned()));
}

#[rstest]
#[tokio::test]
async fn dropping_a_child_from_the_collection_deletes_it(repos: Repos) {
    let user = saved_user(&repos, "ada", &["1 Main St", "2 Main St"], &[]).await;
    let mut user = user;
    let first = user.addresses().expect("loaded")[0].id().expect("id");
    user.remove_address(first).expect("loaded");

    repos.users.save(user).await.expect("saved");

    assert!(!repos.addresses.exists_by_id(first).await.expect("checked"));
    assert_eq!(repos.addresses.find_all().await.expect("listed").len(), 1);
}

#[rstest]
#[tokio::test]
async fn deleting_a_user_removes_owned_rows(repos: Repos) {
    let user = saved_user(&repos, "ada", &["1 Main St"], &["ada@example.com"]).await;

    assert!(repos.users.delete_by_id(user.id().expect("id")).await.expect("deleted"));

    assert!(repos.addresses.find_all().await.expect("listed").is_empty());
    assert!(repos.contacts.find_all().await.expect("listed").is_empty());
    assert!(!repos.users.delete_by_id(user.id().expect("id")).await.expect("second delete"));
}

#[rstest]
#[tokio::test]
async fn duplicate_emails_conflict_and_roll_back(repos: Repos) {
    saved_user(&repos, "ada", &[], &["shared@example.com"]).await;
    let mut second = User::new("grace");
    second.add_address(address("3 Main St")).expect("loaded");
    second.add_contact(contact("shared@example.com")).expect("loaded");

    let err = repos.users.save(second).await.expect_err("duplicate email");

    assert!(matches!(err, RepositoryError::Conflict { .. }));
    assert_eq!(repos.users.find_all().await.expect("listed").len(), 1);
    assert!(repos.addresses.find_all().await.expect("listed").is_empty());
}

#[rstest]
#[tokio::test]
async fn duplicate_usernames_conflict(repos: Repos) {
    saved_user(&repos, "ada", &[], &[]).await;

    let err = repos.users.save(User::new("ada")).await.expect_err("taken");

    assert_eq!(
        err,
        RepositoryError::conflict("duplicate value violates users_username_key")
    );
}
