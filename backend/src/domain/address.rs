//! Postal address owned by a user.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Entity, EntityKind, OwnerLink, Record};

/// Whether the address is domestic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AddressType {
    Local,
    International,
}

impl AddressType {
    /// Stored and serialized form.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::International => "INTERNATIONAL",
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised address type text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown address type '{0}'")]
pub struct UnknownAddressType(pub String);

impl FromStr for AddressType {
    type Err = UnknownAddressType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOCAL" => Ok(Self::Local),
            "INTERNATIONAL" => Ok(Self::International),
            other => Err(UnknownAddressType(other.to_owned())),
        }
    }
}

/// Scalar address fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressDetails {
    pub address_type: AddressType,
    pub street: String,
    pub post_zip_code: String,
    pub province: Option<String>,
    pub city: String,
    pub country: String,
}

/// Address entity; the owning side of the user relationship.
#[derive(Debug, Clone, PartialEq)]
pub struct Address {
    record: Record,
    pub details: AddressDetails,
    pub(crate) owner: OwnerLink,
}

impl Address {
    /// Unsaved address attached to nobody.
    pub fn new(details: AddressDetails) -> Self {
        Self {
            record: Record::default(),
            details,
            owner: OwnerLink::detached(),
        }
    }

    /// Address read from storage with its foreign key.
    pub fn from_storage(record: Record, details: AddressDetails, owner: OwnerLink) -> Self {
        Self {
            record,
            details,
            owner,
        }
    }
}

impl Entity for Address {
    const KIND: EntityKind = EntityKind::Address;

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
