//! User aggregate and the owner side of its address and contact collections.
//!
//! `User` is the inverse side of both relationships. Every add or remove goes
//! through it so the child's `user_id` and loaded user reference always match
//! the collection it sits in.

use chrono::NaiveDate;

use super::{
    Address, Association, Contact, Entity, EntityId, EntityKind, Record, UnresolvedAssociation,
};

/// Mutable personal details.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserProfile {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_day: Option<NaiveDate>,
}

/// Identity view of a user held by its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRef {
    pub id: Option<EntityId>,
    pub username: String,
}

/// Owning-side link from a child entity to its user.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnerLink {
    user_id: Option<EntityId>,
    user: Association<Option<UserRef>>,
}

impl OwnerLink {
    /// Link of a child that has not been attached to anyone.
    pub fn detached() -> Self {
        Self {
            user_id: None,
            user: Association::Loaded(None),
        }
    }

    /// Link as read from storage: foreign key known, reference not loaded.
    pub fn stored(user_id: Option<EntityId>) -> Self {
        Self {
            user_id,
            user: Association::Unresolved,
        }
    }

    pub fn user_id(&self) -> Option<EntityId> {
        self.user_id
    }

    pub fn user(&self) -> &Association<Option<UserRef>> {
        &self.user
    }

    /// Resolve the reference after loading it; the foreign key follows it.
    pub fn resolve(&mut self, user: Option<UserRef>) {
        if let Some(found) = &user {
            self.user_id = found.id;
        }
        self.user = Association::Loaded(user);
    }

    fn link(&mut self, owner: UserRef) {
        self.user_id = owner.id;
        self.user = Association::Loaded(Some(owner));
    }

    fn unlink(&mut self) {
        self.user_id = None;
        self.user = Association::Loaded(None);
    }

    fn rebind(&mut self, id: EntityId) {
        self.user_id = Some(id);
        if let Association::Loaded(Some(owner)) = &mut self.user {
            owner.id = Some(id);
        }
    }
}

/// Child entity owned by a [`User`] through an [`OwnerLink`].
pub trait OwnedByUser: Entity {
    /// Name of the user's collection holding this kind.
    const COLLECTION: &'static str;

    fn owner(&self) -> &OwnerLink;

    fn owner_mut(&mut self) -> &mut OwnerLink;

    /// Attach `self` to `user`, linking both sides.
    fn attach_to(self, user: &mut User) -> Result<(), UnresolvedAssociation>;

    /// Detach the child with `id` from `user`, unlinking both sides.
    fn detach_from(user: &mut User, id: EntityId) -> Result<Option<Self>, UnresolvedAssociation>;

    /// Detach every child of this kind from `user`.
    fn detach_all(user: &mut User) -> Result<Vec<Self>, UnresolvedAssociation>;

    /// The loaded collection of this kind on `user`.
    fn siblings(user: &User) -> Result<&[Self], UnresolvedAssociation>;

    /// Mutable access to the loaded collection; membership changes go
    /// through [`OwnedByUser::attach_to`] and [`OwnedByUser::detach_from`].
    fn siblings_mut(user: &mut User) -> Result<&mut [Self], UnresolvedAssociation>;

    fn user_id(&self) -> Option<EntityId> {
        self.owner().user_id()
    }
}

/// Registered account with its owned addresses and contacts.
///
/// # Examples
/// ```
/// use user_service::domain::{Address, AddressDetails, AddressType, EntityId, OwnedByUser, User};
///
/// let mut user = User::new("ada");
/// user.assign_id(EntityId::new(1));
/// let address = Address::new(AddressDetails {
///     address_type: AddressType::Local,
///     street: "1 Main St".into(),
///     post_zip_code: "12345".into(),
///     province: None,
///     city: "Springfield".into(),
///     country: "US".into(),
/// });
/// user.add_address(address).expect("collection loaded");
/// let stored = &user.addresses().expect("loaded")[0];
/// assert_eq!(stored.user_id(), Some(EntityId::new(1)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    record: Record,
    username: String,
    password_hash: Option<String>,
    pub profile: UserProfile,
    addresses: Association<Vec<Address>>,
    contacts: Association<Vec<Contact>>,
}

impl User {
    /// A new, unsaved user. Its collections are known to be empty.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            record: Record::default(),
            username: username.into(),
            password_hash: None,
            profile: UserProfile::default(),
            addresses: Association::Loaded(Vec::new()),
            contacts: Association::Loaded(Vec::new()),
        }
    }

    /// A user read from storage; collections start unresolved.
    pub fn from_storage(
        record: Record,
        username: String,
        password_hash: Option<String>,
        profile: UserProfile,
    ) -> Self {
        Self {
            record,
            username,
            password_hash,
            profile,
            addresses: Association::Unresolved,
            contacts: Association::Unresolved,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn set_password_hash(&mut self, hash: String) {
        self.password_hash = Some(hash);
    }

    /// Identity view handed to children.
    pub fn as_ref_view(&self) -> UserRef {
        UserRef {
            id: self.record.id,
            username: self.username.clone(),
        }
    }

    /// Set the storage id and propagate it to every loaded child.
    pub fn assign_id(&mut self, id: EntityId) {
        self.record.id = Some(id);
        if let Association::Loaded(addresses) = &mut self.addresses {
            for address in addresses {
                address.owner_mut().rebind(id);
            }
        }
        if let Association::Loaded(contacts) = &mut self.contacts {
            for contact in contacts {
                contact.owner_mut().rebind(id);
            }
        }
    }

    pub fn addresses(&self) -> Result<&[Address], UnresolvedAssociation> {
        self.addresses
            .require(EntityKind::User, "addresses")
            .map(Vec::as_slice)
    }

    fn addresses_mut(&mut self) -> Result<&mut Vec<Address>, UnresolvedAssociation> {
        self.addresses.require_mut(EntityKind::User, "addresses")
    }

    pub fn address_association(&self) -> &Association<Vec<Address>> {
        &self.addresses
    }

    /// Install the loaded address collection, linking each child to `self`.
    pub fn resolve_addresses(&mut self, mut addresses: Vec<Address>) {
        let owner = self.as_ref_view();
        for address in &mut addresses {
            address.owner_mut().link(owner.clone());
        }
        self.addresses = Association::Loaded(addresses);
    }

    /// Attach `address`, pointing it at this user.
    pub fn add_address(&mut self, mut address: Address) -> Result<(), UnresolvedAssociation> {
        let owner = self.as_ref_view();
        let addresses = self.addresses.require_mut(EntityKind::User, "addresses")?;
        address.owner_mut().link(owner);
        addresses.push(address);
        Ok(())
    }

    /// Detach the address with `id`, clearing its user reference.
    pub fn remove_address(&mut self, id: EntityId) -> Result<Option<Address>, UnresolvedAssociation> {
        let addresses = self.addresses.require_mut(EntityKind::User, "addresses")?;
        Ok(take_child(addresses, id))
    }

    /// Detach every address.
    pub fn clear_addresses(&mut self) -> Result<Vec<Address>, UnresolvedAssociation> {
        let addresses = self.addresses.require_mut(EntityKind::User, "addresses")?;
        Ok(drain_children(addresses))
    }

    pub fn contacts(&self) -> Result<&[Contact], UnresolvedAssociation> {
        self.contacts
            .require(EntityKind::User, "contacts")
            .map(Vec::as_slice)
    }

    fn contacts_mut(&mut self) -> Result<&mut Vec<Contact>, UnresolvedAssociation> {
        self.contacts.require_mut(EntityKind::User, "contacts")
    }

    pub fn contact_association(&self) -> &Association<Vec<Contact>> {
        &self.contacts
    }

    /// Install the loaded contact collection, linking each child to `self`.
    pub fn resolve_contacts(&mut self, mut contacts: Vec<Contact>) {
        let owner = self.as_ref_view();
        for contact in &mut contacts {
            contact.owner_mut().link(owner.clone());
        }
        self.contacts = Association::Loaded(contacts);
    }

    /// Attach `contact`, pointing it at this user.
    pub fn add_contact(&mut self, mut contact: Contact) -> Result<(), UnresolvedAssociation> {
        let owner = self.as_ref_view();
        let contacts = self.contacts.require_mut(EntityKind::User, "contacts")?;
        contact.owner_mut().link(owner);
        contacts.push(contact);
        Ok(())
    }

    /// Detach the contact with `id`, clearing its user reference.
    pub fn remove_contact(&mut self, id: EntityId) -> Result<Option<Contact>, UnresolvedAssociation> {
        let contacts = self.contacts.require_mut(EntityKind::User, "contacts")?;
        Ok(take_child(contacts, id))
    }

    /// Detach every contact.
    pub fn clear_contacts(&mut self) -> Result<Vec<Contact>, UnresolvedAssociation> {
        let contacts = self.contacts.require_mut(EntityKind::User, "contacts")?;
        Ok(drain_children(contacts))
    }
}

fn take_child<C: OwnedByUser>(children: &mut Vec<C>, id: EntityId) -> Option<C> {
    let position = children.iter().position(|child| child.id() == Some(id))?;
    let mut child = children.remove(position);
    child.owner_mut().unlink();
    Some(child)
}

fn drain_children<C: OwnedByUser>(children: &mut Vec<C>) -> Vec<C> {
    children
        .drain(..)
        .map(|mut child| {
            child.owner_mut().unlink();
            child
        })
        .collect()
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}

impl OwnedByUser for Address {
    const COLLECTION: &'static str = "addresses";

    fn owner(&self) -> &OwnerLink {
        &self.owner
    }

    fn owner_mut(&mut self) -> &mut OwnerLink {
        &mut self.owner
    }

    fn attach_to(self, user: &mut User) -> Result<(), UnresolvedAssociation> {
        user.add_address(self)
    }

    fn detach_from(user: &mut User, id: EntityId) -> Result<Option<Self>, UnresolvedAssociation> {
        user.remove_address(id)
    }

    fn detach_all(user: &mut User) -> Result<Vec<Self>, UnresolvedAssociation> {
        user.clear_addresses()
    }

    fn siblings(user: &User) -> Result<&[Self], UnresolvedAssociation> {
        user.addresses()
    }

    fn siblings_mut(user: &mut User) -> Result<&mut [Self], UnresolvedAssociation> {
        user.addresses_mut().map(Vec::as_mut_slice)
    }
}

impl OwnedByUser for Contact {
    const COLLECTION: &'static str = "contacts";

    fn owner(&self) -> &OwnerLink {
        &self.owner
    }

    fn owner_mut(&mut self) -> &mut OwnerLink {
        &mut self.owner
    }

    fn attach_to(self, user: &mut User) -> Result<(), UnresolvedAssociation> {
        user.add_contact(self)
    }

    fn detach_from(user: &mut User, id: EntityId) -> Result<Option<Self>, UnresolvedAssociation> {
        user.remove_contact(id)
    }

    fn detach_all(user: &mut User) -> Result<Vec<Self>, UnresolvedAssociation> {
        user.clear_contacts()
    }

    fn siblings(user: &User) -> Result<&[Self], UnresolvedAssociation> {
        user.contacts()
    }

    fn siblings_mut(user: &mut User) -> Result<&mut [Self], UnresolvedAssociation> {
        user.contacts_mut().map(Vec::as_mut_slice)
    }
}
