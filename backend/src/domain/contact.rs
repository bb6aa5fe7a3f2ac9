//! Phone and email contact owned by a user.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{Entity, EntityKind, OwnerLink, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContactType {
    Personal,
    Work,
}

impl ContactType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Personal => "PERSONAL",
            Self::Work => "WORK",
        }
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown contact type '{0}'")]
pub struct UnknownContactType(pub String);

impl FromStr for ContactType {
    type Err = UnknownContactType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PERSONAL" => Ok(Self::Personal),
            "WORK" => Ok(Self::Work),
            other => Err(UnknownContactType(other.to_owned())),
        }
    }
}

/// Scalar contact fields. Phone number and email are each unique across
/// contacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDetails {
    pub contact_type: ContactType,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Contact {
    record: Record,
    pub details: ContactDetails,
    pub(crate) owner: OwnerLink,
}

impl Contact {
    pub fn new(details: ContactDetails) -> Self {
        Self {
            record: Record::default(),
            details,
            owner: OwnerLink::detached(),
        }
    }

    pub fn from_storage(record: Record, details: ContactDetails, owner: OwnerLink) -> Self {
        Self {
            record,
            details,
            owner,
        }
    }
}

impl Entity for Contact {
    const KIND: EntityKind = EntityKind::Contact;

    fn record(&self) -> &Record {
        &self.record
    }

    fn record_mut(&mut self) -> &mut Record {
        &mut self.record
    }
}
