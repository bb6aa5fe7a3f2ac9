//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Each table has a `*Row` for reads and a
//! `*Values` struct used for both inserts and full-row updates.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use crate::domain::ports::RepositoryError;
use crate::domain::{
    Address, AddressDetails, Audit, Contact, ContactDetails, Entity, EntityId, OwnedByUser, OwnerLink,
    Record, User, UserProfile,
};

use super::schema::{addresses, contacts, users};

/// Audit columns shared by every table.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct AuditColumns<'a> {
    pub created_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    pub created_by: Option<&'a str>,
    pub modified_by: Option<&'a str>,
}

impl<'a> AuditColumns<'a> {
    pub fn from_record(record: &'a Record) -> Self {
        record
            .audit
            .as_ref()
            .map(|audit| Self {
                created_date: Some(audit.created_date),
                modified_date: Some(audit.modified_date),
                created_by: Some(audit.created_by.as_str()),
                modified_by: Some(audit.modified_by.as_str()),
            })
            .unwrap_or_default()
    }
}

/// Rebuild a record; a partially populated audit block reads as absent.
fn record_from_columns(
    id: i64,
    created_date: Option<DateTime<Utc>>,
    modified_date: Option<DateTime<Utc>>,
    created_by: Option<String>,
    modified_by: Option<String>,
) -> Record {
    let audit = match (created_date, modified_date, created_by, modified_by) {
        (Some(created_date), Some(modified_date), Some(created_by), Some(modified_by)) => {
            Some(Audit {
                created_date,
                modified_date,
                created_by,
                modified_by,
            })
        }
        _ => None,
    };
    Record::persisted(EntityId::new(id), audit)
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i64,
    pub username: String,
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_day: Option<NaiveDate>,
    pub created_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub modified_by: Option<String>,
}

impl UserRow {
    /// Scalar user; both collections unresolved.
    pub fn into_entity(self) -> User {
        let record = record_from_columns(
            self.id,
            self.created_date,
            self.modified_date,
            self.created_by,
            self.modified_by,
        );
        User::from_storage(
            record,
            self.username,
            self.password,
            UserProfile {
                first_name: self.first_name,
                last_name: self.last_name,
                birth_day: self.birth_day,
            },
        )
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserValues<'a> {
    pub username: &'a str,
    pub password: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub birth_day: Option<NaiveDate>,
    pub created_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    pub created_by: Option<&'a str>,
    pub modified_by: Option<&'a str>,
}

impl<'a> From<&'a User> for UserValues<'a> {
    fn from(user: &'a User) -> Self {
        let audit = AuditColumns::from_record(user.record());
        Self {
            username: user.username(),
            password: user.password_hash(),
            first_name: user.profile.first_name.as_deref(),
            last_name: user.profile.last_name.as_deref(),
            birth_day: user.profile.birth_day,
            created_date: audit.created_date,
            modified_date: audit.modified_date,
            created_by: audit.created_by,
            modified_by: audit.modified_by,
        }
    }
}

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = addresses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AddressRow {
    pub id: i64,
    pub address_type: String,
    pub street: String,
    pub post_zip_code: String,
    pub province: Option<String>,
    pub city: String,
    pub country: String,
    pub user_id: Option<i64>,
    pub created_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub modified_by: Option<String>,
}

impl AddressRow {
    /// Scalar address with its user reference unresolved.
    pub fn into_entity(self) -> Result<Address, RepositoryError> {
        let address_type = self
            .address_type
            .parse()
            .map_err(|err: crate::domain::UnknownAddressType| {
                RepositoryError::query(err.to_string())
            })?;
        let record = record_from_columns(
            self.id,
            self.created_date,
            self.modified_date,
            self.created_by,
            self.modified_by,
        );
        Ok(Address::from_storage(
            record,
            AddressDetails {
                address_type,
                street: self.street,
                post_zip_code: self.post_zip_code,
                province: self.province,
                city: self.city,
                country: self.country,
            },
            OwnerLink::stored(self.user_id.map(EntityId::new)),
        ))
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = addresses)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct AddressValues<'a> {
    pub address_type: &'static str,
    pub street: &'a str,
    pub post_zip_code: &'a str,
    pub province: Option<&'a str>,
    pub city: &'a str,
    pub country: &'a str,
    pub user_id: Option<i64>,
    pub created_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    pub created_by: Option<&'a str>,
    pub modified_by: Option<&'a str>,
}

impl<'a> From<&'a Address> for AddressValues<'a> {
    fn from(address: &'a Address) -> Self {
        let audit = AuditColumns::from_record(address.record());
        let details = &address.details;
        Self {
            address_type: details.address_type.as_str(),
            street: &details.street,
            post_zip_code: &details.post_zip_code,
            province: details.province.as_deref(),
            city: &details.city,
            country: &details.country,
            user_id: address.user_id().map(EntityId::get),
            created_date: audit.created_date,
            modified_date: audit.modified_date,
            created_by: audit.created_by,
            modified_by: audit.modified_by,
        }
    }
}

// ---------------------------------------------------------------------------
// Contacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = contacts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ContactRow {
    pub id: i64,
    pub contact_type: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub user_id: Option<i64>,
    pub created_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub modified_by: Option<String>,
}

impl ContactRow {
    /// Scalar contact with its user reference unresolved.
    pub fn into_entity(self) -> Result<Contact, RepositoryError> {
        let contact_type = self
            .contact_type
            .parse()
            .map_err(|err: crate::domain::UnknownContactType| {
                RepositoryError::query(err.to_string())
            })?;
        let record = record_from_columns(
            self.id,
            self.created_date,
            self.modified_date,
            self.created_by,
            self.modified_by,
        );
        Ok(Contact::from_storage(
            record,
            ContactDetails {
                contact_type,
                phone_number: self.phone_number,
                email: self.email,
            },
            OwnerLink::stored(self.user_id.map(EntityId::new)),
        ))
    }
}

#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = contacts)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ContactValues<'a> {
    pub contact_type: &'static str,
    pub phone_number: Option<&'a str>,
    pub email: Option<&'a str>,
    pub user_id: Option<i64>,
    pub created_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    pub created_by: Option<&'a str>,
    pub modified_by: Option<&'a str>,
}

impl<'a> From<&'a Contact> for ContactValues<'a> {
    fn from(contact: &'a Contact) -> Self {
        let audit = AuditColumns::from_record(contact.record());
        let details = &contact.details;
        Self {
            contact_type: details.contact_type.as_str(),
            phone_number: details.phone_number.as_deref(),
            email: details.email.as_deref(),
            user_id: contact.user_id().map(EntityId::get),
            created_date: audit.created_date,
            modified_date: audit.modified_date,
            created_by: audit.created_by,
            modified_by: audit.modified_by,
        }
    }
}
