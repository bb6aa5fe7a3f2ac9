//! Transfer shapes for users, addresses, and contacts.
//!
//! Every DTO embeds a [`RecordDto`] (identity plus optional audit block).
//! Parent references are id-only, with an optional summary when the client
//! asked for the reference path. The password is accepted on input and never
//! serialized.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::{AddressType, Audit, ContactType, EntityId};

/// Audit metadata as exposed to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditDto {
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
    pub created_by: String,
    pub modified_by: String,
}

impl From<&Audit> for AuditDto {
    fn from(value: &Audit) -> Self {
        Self {
            created_date: value.created_date,
            modified_date: value.modified_date,
            created_by: value.created_by.clone(),
            modified_by: value.modified_by.clone(),
        }
    }
}

/// Identity and audit block shared by every DTO.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordDto {
    #[serde(default)]
    #[schema(value_type = Option<i64>, example = 1)]
    pub id: Option<EntityId>,
    #[serde(default)]
    pub audit: Option<AuditDto>,
}

impl RecordDto {
    /// Clear every base field except the id.
    pub fn strip_audit(&mut self) {
        let id = self.id;
        *self = Self::default();
        self.id = id;
    }
}

/// Identity summary of the owning user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserSummaryDto {
    #[schema(value_type = Option<i64>)]
    pub id: Option<EntityId>,
    pub username: String,
}

/// User transfer shape.
///
/// `addresses` and `contacts` are always emitted as arrays on output and are
/// empty unless the matching attribute path was requested. On input, an
/// absent collection means "leave the stored children alone".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    #[serde(flatten)]
    pub record: RecordDto,
    #[serde(default)]
    #[schema(example = "ada")]
    pub username: Option<String>,
    #[serde(default, skip_serializing)]
    #[schema(write_only)]
    pub password: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub birth_day: Option<NaiveDate>,
    #[serde(default)]
    pub addresses: Option<Vec<AddressDto>>,
    #[serde(default)]
    pub contacts: Option<Vec<ContactDto>>,
}

impl UserDto {
    /// Take the plaintext password, leaving `None` behind. The returned
    /// buffer is wiped when dropped.
    pub fn take_password(&mut self) -> Option<Zeroizing<String>> {
        self.password.take().map(Zeroizing::new)
    }
}

/// Address transfer shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressDto {
    #[serde(flatten)]
    pub record: RecordDto,
    #[serde(rename = "type", default)]
    pub address_type: Option<AddressType>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub post_zip_code: Option<String>,
    #[serde(default)]
    pub province: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub user_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummaryDto>,
}

/// Contact transfer shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactDto {
    #[serde(flatten)]
    pub record: RecordDto,
    #[serde(default)]
    pub contact_type: Option<ContactType>,
    #[serde(default)]
    #[schema(example = "+44 20 7946 0958")]
    pub phone_number: Option<String>,
    #[serde(default)]
    #[schema(example = "ada@example.com")]
    pub email: Option<String>,
    #[serde(default)]
    #[schema(value_type = Option<i64>)]
    pub user_id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserSummaryDto>,
}
