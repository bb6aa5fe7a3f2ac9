//! Batched association loading shared by the Diesel repositories.
//!
//! Each requested association costs one `IN (...)` query for the whole result
//! set, so a plan runs in a bounded number of round trips however many roots
//! were returned.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::RepositoryError;
use crate::domain::{Address, Contact, Entity, EntityId, FetchPlan, OwnedByUser, User, UserRef};

use super::error_mapping::map_diesel_error;
use super::models::{AddressRow, ContactRow};
use super::schema::{addresses, contacts, users};

/// Which user collections to resolve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct CollectionLoad {
    pub addresses: bool,
    pub contacts: bool,
}

impl CollectionLoad {
    pub fn for_plan(plan: &FetchPlan) -> Self {
        Self {
            addresses: plan.touches("addresses"),
            contacts: plan.touches("contacts"),
        }
    }

    /// Reload whatever the caller had loaded before a write.
    pub fn mirroring(user: &User) -> Self {
        Self {
            addresses: user.address_association().is_loaded(),
            contacts: user.contact_association().is_loaded(),
        }
    }
}

fn user_ids(users: &[User]) -> Vec<i64> {
    users.iter().filter_map(Entity::id).map(EntityId::get).collect()
}

fn group_by_owner<C: OwnedByUser>(children: Vec<C>) -> BTreeMap<EntityId, Vec<C>> {
    let mut grouped: BTreeMap<EntityId, Vec<C>> = BTreeMap::new();
    for child in children {
        if let Some(owner) = child.user_id() {
            grouped.entry(owner).or_default().push(child);
        }
    }
    grouped
}

/// Resolve the requested collections on every user in `users`.
pub(crate) async fn resolve_collections(
    conn: &mut AsyncPgConnection,
    users: &mut [User],
    load: CollectionLoad,
) -> Result<(), RepositoryError> {
    let ids = user_ids(users);

    if load.addresses {
        let rows: Vec<AddressRow> = addresses::table
            .filter(addresses::user_id.eq_any(ids.clone()))
            .order_by(addresses::id)
            .select(AddressRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)?;
        let children = rows
            .into_iter()
            .map(AddressRow::into_entity)
            .collect::<Result<Vec<Address>, _>>()?;
        let mut grouped = group_by_owner(children);
        for user in users.iter_mut() {
            let owned = user.id().and_then(|id| grouped.remove(&id));
            user.resolve_addresses(owned.unwrap_or_default());
        }
    }

    if load.contacts {
        let rows: Vec<ContactRow> = contacts::table
            .filter(contacts::user_id.eq_any(ids))
            .order_by(contacts::id)
            .select(ContactRow::as_select())
            .load(conn)
            .await
            .map_err(map_diesel_error)?;
        let children = rows
            .into_iter()
            .map(ContactRow::into_entity)
            .collect::<Result<Vec<Contact>, _>>()?;
        let mut grouped = group_by_owner(children);
        for user in users.iter_mut() {
            let owned = user.id().and_then(|id| grouped.remove(&id));
            user.resolve_contacts(owned.unwrap_or_default());
        }
    }

    Ok(())
}

/// Resolve the `user` reference of every child when the plan asks for it.
pub(crate) async fn resolve_owners<C: OwnedByUser>(
    conn: &mut AsyncPgConnection,
    children: &mut [C],
    plan: &FetchPlan,
) -> Result<(), RepositoryError> {
    if !plan.touches("user") {
        return Ok(());
    }
    let ids: BTreeSet<i64> = children
        .iter()
        .filter_map(OwnedByUser::user_id)
        .map(EntityId::get)
        .collect();
    let owners: HashMap<i64, UserRef> = users::table
        .filter(users::id.eq_any(ids.into_iter().collect::<Vec<_>>()))
        .select((users::id, users::username))
        .load::<(i64, String)>(conn)
        .await
        .map_err(map_diesel_error)?
        .into_iter()
        .map(|(id, username)| {
            (
                id,
                UserRef {
                    id: Some(EntityId::new(id)),
                    username,
                },
            )
        })
        .collect();
    for child in children.iter_mut() {
        let owner = child
            .user_id()
            .and_then(|id| owners.get(&id.get()).cloned());
        child.owner_mut().resolve(owner);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    //! Regression coverage for plan-to-load translation.
    use rstest::rstest;

    use super::*;
    use crate::domain::{AttributePath, EntityKind, FetchPlanBuilder};
    use crate::test_support::standard_registry;

    fn plan(paths: &[&str]) -> FetchPlan {
        let registry = standard_registry();
        let parsed: Vec<_> = paths
            .iter()
            .map(|path| AttributePath::parse(path).expect("valid path"))
            .collect();
        FetchPlanBuilder::new(&registry)
            .build(EntityKind::User, &parsed)
            .expect("resolvable plan")
    }

    #[rstest]
    #[case(&[], CollectionLoad::default())]
    #[case(&["addresses"], CollectionLoad { addresses: true, contacts: false })]
    #[case(&["contacts.user"], CollectionLoad { addresses: false, contacts: true })]
    #[case(&["addresses", "contacts"], CollectionLoad { addresses: true, contacts: true })]
    fn plans_select_the_collections_to_load(
        #[case] paths: &[&str],
        #[case] expected: CollectionLoad,
    ) {
        assert_eq!(CollectionLoad::for_plan(&plan(paths)), expected);
    }

    #[rstest]
    fn writes_reload_what_was_loaded() {
        let user = User::new("ada");
        assert_eq!(
            CollectionLoad::mirroring(&user),
            CollectionLoad {
                addresses: true,
                contacts: true
            }
        );
    }
}
