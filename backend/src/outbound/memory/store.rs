//! Process-local tables shared by the in-memory repositories.
//!
//! Every write runs against a copy of the tables and only replaces them once
//! foreign keys and unique constraints hold, so a failed save leaves nothing
//! behind.

use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use crate::domain::ports::RepositoryError;
use crate::domain::{
    Address, AddressDetails, Contact, ContactDetails, Entity, EntityId, FetchPlan, OwnedByUser,
    OwnerLink, Record, User, UserProfile, UserRef,
};

#[derive(Debug, Clone)]
pub struct UserRow {
    record: Record,
    username: String,
    password_hash: Option<String>,
    profile: UserProfile,
}

impl UserRow {
    fn from_entity(user: &User, id: EntityId) -> Self {
        Self {
            record: Record::persisted(id, user.record().audit.clone()),
            username: user.username().to_owned(),
            password_hash: user.password_hash().map(str::to_owned),
            profile: user.profile.clone(),
        }
    }

    fn to_entity(&self) -> User {
        User::from_storage(
            self.record.clone(),
            self.username.clone(),
            self.password_hash.clone(),
            self.profile.clone(),
        )
    }

    fn to_ref(&self) -> UserRef {
        UserRef {
            id: self.record.id,
            username: self.username.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChildRow<D> {
    record: Record,
    details: D,
    user_id: Option<EntityId>,
}

/// Child entity kinds stored in their own table.
pub trait StoredChild: OwnedByUser {
    type Details: Clone + Send + Sync;

    fn table(tables: &Tables) -> &BTreeMap<EntityId, ChildRow<Self::Details>>;

    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<EntityId, ChildRow<Self::Details>>;

    fn details(&self) -> &Self::Details;

    fn from_row(row: &ChildRow<Self::Details>) -> Self;
}

impl StoredChild for Address {
    type Details = AddressDetails;

    fn table(tables: &Tables) -> &BTreeMap<EntityId, ChildRow<AddressDetails>> {
        &tables.addresses
    }

    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<EntityId, ChildRow<AddressDetails>> {
        &mut tables.addresses
    }

    fn details(&self) -> &AddressDetails {
        &self.details
    }

    fn from_row(row: &ChildRow<AddressDetails>) -> Self {
        Address::from_storage(
            row.record.clone(),
            row.details.clone(),
            OwnerLink::stored(row.user_id),
        )
    }
}

impl StoredChild for Contact {
    type Details = ContactDetails;

    fn table(tables: &Tables) -> &BTreeMap<EntityId, ChildRow<ContactDetails>> {
        &tables.contacts
    }

    fn table_mut(tables: &mut Tables) -> &mut BTreeMap<EntityId, ChildRow<ContactDetails>> {
        &mut tables.contacts
    }

    fn details(&self) -> &ContactDetails {
        &self.details
    }

    fn from_row(row: &ChildRow<ContactDetails>) -> Self {
        Contact::from_storage(
            row.record.clone(),
            row.details.clone(),
            OwnerLink::stored(row.user_id),
        )
    }
}

/// The three tables plus their id sequence.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    last_id: i64,
    users: BTreeMap<EntityId, UserRow>,
    addresses: BTreeMap<EntityId, ChildRow<AddressDetails>>,
    contacts: BTreeMap<EntityId, ChildRow<ContactDetails>>,
}

impl Tables {
    fn allocate_id(&mut self) -> EntityId {
        self.last_id += 1;
        EntityId::new(self.last_id)
    }

    pub(super) fn user_exists(&self, id: EntityId) -> bool {
        self.users.contains_key(&id)
    }

    pub(super) fn user_ids(&self) -> Vec<EntityId> {
        self.users.keys().copied().collect()
    }

    /// User `id` with the collections the plan touches resolved.
    pub(super) fn load_user(&self, id: EntityId, addresses: bool, contacts: bool) -> Option<User> {
        let mut user = self.users.get(&id)?.to_entity();
        if addresses {
            user.resolve_addresses(self.children_of::<Address>(id));
        }
        if contacts {
            user.resolve_contacts(self.children_of::<Contact>(id));
        }
        Some(user)
    }

    fn children_of<C: StoredChild>(&self, user_id: EntityId) -> Vec<C> {
        C::table(self)
            .values()
            .filter(|row| row.user_id == Some(user_id))
            .map(C::from_row)
            .collect()
    }

    /// Children whose ids pass `keep`, ordered by id, resolved per `plan`.
    pub(super) fn load_children<C: StoredChild>(
        &self,
        plan: Option<&FetchPlan>,
        keep: impl Fn(EntityId, Option<EntityId>) -> bool,
    ) -> Vec<C> {
        let resolve_owner = plan.is_some_and(|plan| plan.touches("user"));
        C::table(self)
            .iter()
            .filter(|(id, row)| keep(**id, row.user_id))
            .map(|(_, row)| {
                let mut child = C::from_row(row);
                if resolve_owner {
                    let owner = row
                        .user_id
                        .and_then(|id| self.users.get(&id))
                        .map(UserRow::to_ref);
                    child.owner_mut().resolve(owner);
                }
                child
            })
            .collect()
    }

    /// Insert or replace `user`, synchronising its loaded collections.
    pub(super) fn write_user(&mut self, user: &User) -> Result<EntityId, RepositoryError> {
        let id = match user.id() {
            Some(id) if self.users.contains_key(&id) => id,
            Some(_) => return Err(RepositoryError::query("record not found")),
            None => self.allocate_id(),
        };
        self.users.insert(id, UserRow::from_entity(user, id));
        if let Ok(addresses) = user.addresses() {
            self.sync_children(id, addresses);
        }
        if let Ok(contacts) = user.contacts() {
            self.sync_children(id, contacts);
        }
        Ok(id)
    }

    fn sync_children<C: StoredChild>(&mut self, user_id: EntityId, children: &[C]) {
        let mut kept = HashSet::with_capacity(children.len());
        for child in children {
            let id = child.id().unwrap_or_else(|| self.allocate_id());
            kept.insert(id);
            let row = ChildRow {
                record: Record::persisted(id, child.record().audit.clone()),
                details: child.details().clone(),
                user_id: Some(user_id),
            };
            C::table_mut(self).insert(id, row);
        }
        C::table_mut(self).retain(|id, row| row.user_id != Some(user_id) || kept.contains(id));
    }

    /// Insert or replace one child row, returning its id.
    pub(super) fn write_child<C: StoredChild>(&mut self, child: &C) -> Result<EntityId, RepositoryError> {
        let id = match child.id() {
            Some(id) if C::table(self).contains_key(&id) => id,
            Some(_) => return Err(RepositoryError::query("record not found")),
            None => self.allocate_id(),
        };
        let row = ChildRow {
            record: Record::persisted(id, child.record().audit.clone()),
            details: child.details().clone(),
            user_id: child.user_id(),
        };
        C::table_mut(self).insert(id, row);
        Ok(id)
    }

    pub(super) fn delete_user(&mut self, id: EntityId) -> bool {
        if self.users.remove(&id).is_none() {
            return false;
        }
        self.addresses.retain(|_, row| row.user_id != Some(id));
        self.contacts.retain(|_, row| row.user_id != Some(id));
        true
    }

    pub(super) fn delete_child<C: StoredChild>(&mut self, id: EntityId) -> bool {
        C::table_mut(self).remove(&id).is_some()
    }

    pub(super) fn child_exists<C: StoredChild>(&self, id: EntityId) -> bool {
        C::table(self).contains_key(&id)
    }

    /// The constraints the database schema enforces.
    fn check_constraints(&self) -> Result<(), RepositoryError> {
        let mut usernames = HashSet::new();
        if !self.users.values().all(|row| usernames.insert(row.username.as_str())) {
            return Err(RepositoryError::conflict(
                "duplicate value violates users_username_key",
            ));
        }

        let dangling = self
            .addresses
            .values()
            .filter_map(|row| row.user_id)
            .chain(self.contacts.values().filter_map(|row| row.user_id))
            .any(|owner| !self.users.contains_key(&owner));
        if dangling {
            return Err(RepositoryError::query("foreign key violation"));
        }

        let mut emails = HashSet::new();
        let mut phones = HashSet::new();
        for row in self.contacts.values() {
            if row.details.email.as_deref().is_some_and(|email| !emails.insert(email)) {
                return Err(RepositoryError::conflict(
                    "duplicate value violates contacts_email_key",
                ));
            }
            if row
                .details
                .phone_number
                .as_deref()
                .is_some_and(|phone| !phones.insert(phone))
            {
                return Err(RepositoryError::conflict(
                    "duplicate value violates contacts_phone_number_key",
                ));
            }
        }
        Ok(())
    }
}

/// Shared, lock-guarded tables.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

fn poisoned() -> RepositoryError {
    RepositoryError::connection("memory store lock poisoned")
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub(super) fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, RepositoryError> {
        let tables = self.tables.read().map_err(|_| poisoned())?;
        Ok(f(&tables))
    }

    /// Apply `f` atomically; the change is discarded when `f` or a
    /// constraint check fails.
    pub(super) fn write<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut tables = self.tables.write().map_err(|_| poisoned())?;
        let mut staged = tables.clone();
        let result = f(&mut staged)?;
        staged.check_constraints()?;
        *tables = staged;
        Ok(result)
    }
}
