//! Field-level validation of write payloads.
//!
//! Violations are collected per field so a client sees every problem at once.
//! Field names use the wire spelling; nested children are reported as
//! `addresses[0].street`.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use super::{AddressDto, ContactDto, Error, UserDto};

pub const USERNAME_MAX: usize = 50;
pub const NAME_MAX: usize = 50;
pub const STREET_MAX: usize = 100;
pub const POST_ZIP_CODE_MAX: usize = 20;
pub const REGION_MAX: usize = 50;
pub const PHONE_NUMBER_MAX: usize = 30;
pub const EMAIL_MAX: usize = 50;

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
static PHONE_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        // Length is enforced separately.
        Regex::new(r"^\+?[0-9 ()\-]{4,}$")
            .unwrap_or_else(|error| panic!("phone regex failed to compile: {error}"))
    })
}

/// Whether a payload creates a record or patches an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Create,
    Update,
}

/// Where a child payload sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Submitted to its own resource; must name its user on create.
    TopLevel,
    /// Nested inside a user payload; the user is implied.
    Nested,
}

/// Collected per-field violations.
#[derive(Debug, Default)]
struct FieldErrors {
    prefix: String,
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    fn nested(&self, prefix: String) -> Self {
        Self {
            prefix,
            errors: BTreeMap::new(),
        }
    }

    fn add(&mut self, field: &str, message: impl Into<String>) {
        let key = if self.prefix.is_empty() {
            field.to_owned()
        } else {
            format!("{}.{field}", self.prefix)
        };
        self.errors.entry(key).or_insert_with(|| message.into());
    }

    fn absorb(&mut self, other: Self) {
        for (field, message) in other.errors {
            self.errors.entry(field).or_insert(message);
        }
    }

    /// Required on create; whenever present it must be non-blank and within `max`.
    fn mandatory_text(&mut self, field: &str, value: Option<&str>, max: usize, intent: Intent) {
        match value {
            None if intent == Intent::Create => self.add(field, format!("{field} is required")),
            Some(text) if text.trim().is_empty() => {
                self.add(field, format!("{field} must not be blank"));
            }
            other => self.optional_text(field, other, max),
        }
    }

    fn optional_text(&mut self, field: &str, value: Option<&str>, max: usize) {
        if value.is_some_and(|text| text.chars().count() > max) {
            self.add(field, format!("{field} cannot exceed {max} characters"));
        }
    }

    fn present<T>(&mut self, field: &str, value: Option<&T>) {
        if value.is_none() {
            self.add(field, format!("{field} is required"));
        }
    }

    fn into_result(self) -> Result<(), Error> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(self.errors))
        }
    }
}

/// Validate a user payload, including nested children.
pub fn validate_user(dto: &UserDto, intent: Intent) -> Result<(), Error> {
    let mut errors = FieldErrors::default();
    check_user(&mut errors, dto, intent);
    errors.into_result()
}

/// Validate an address submitted to the address resource.
pub fn validate_address(dto: &AddressDto, intent: Intent) -> Result<(), Error> {
    let mut errors = FieldErrors::default();
    check_address(&mut errors, dto, intent, Placement::TopLevel);
    errors.into_result()
}

/// Validate a contact submitted to the contact resource.
pub fn validate_contact(dto: &ContactDto, intent: Intent) -> Result<(), Error> {
    let mut errors = FieldErrors::default();
    check_contact(&mut errors, dto, intent, Placement::TopLevel);
    errors.into_result()
}

fn check_user(errors: &mut FieldErrors, dto: &UserDto, intent: Intent) {
    errors.mandatory_text("username", dto.username.as_deref(), USERNAME_MAX, intent);
    if intent == Intent::Create {
        errors.mandatory_text("password", dto.password.as_deref(), usize::MAX, intent);
    }
    errors.optional_text("firstName", dto.first_name.as_deref(), NAME_MAX);
    errors.optional_text("lastName", dto.last_name.as_deref(), NAME_MAX);

    for (index, address) in dto.addresses.iter().flatten().enumerate() {
        let mut nested = errors.nested(format!("addresses[{index}]"));
        check_address(&mut nested, address, nested_intent(address.record.id), Placement::Nested);
        errors.absorb(nested);
    }
    for (index, contact) in dto.contacts.iter().flatten().enumerate() {
        let mut nested = errors.nested(format!("contacts[{index}]"));
        check_contact(&mut nested, contact, nested_intent(contact.record.id), Placement::Nested);
        errors.absorb(nested);
    }
}

/// Nested children carrying an id patch an existing child.
fn nested_intent<T>(id: Option<T>) -> Intent {
    if id.is_some() {
        Intent::Update
    } else {
        Intent::Create
    }
}

fn check_address(errors: &mut FieldErrors, dto: &AddressDto, intent: Intent, placement: Placement) {
    let creating = intent == Intent::Create;
    if creating {
        errors.present("type", dto.address_type.as_ref());
    }
    errors.mandatory_text("street", dto.street.as_deref(), STREET_MAX, intent);
    errors.mandatory_text("postZipCode", dto.post_zip_code.as_deref(), POST_ZIP_CODE_MAX, intent);
    errors.optional_text("province", dto.province.as_deref(), REGION_MAX);
    errors.mandatory_text("city", dto.city.as_deref(), REGION_MAX, intent);
    errors.mandatory_text("country", dto.country.as_deref(), REGION_MAX, intent);
    if creating && placement == Placement::TopLevel {
        errors.present("userId", dto.user_id.as_ref());
    }
}

fn check_contact(errors: &mut FieldErrors, dto: &ContactDto, intent: Intent, placement: Placement) {
    let creating = intent == Intent::Create;
    if creating {
        errors.present("contactType", dto.contact_type.as_ref());
        if dto.phone_number.is_none() && dto.email.is_none() {
            errors.add("phoneNumber", "either phoneNumber or email is required");
        }
    }
    if let Some(phone) = dto.phone_number.as_deref() {
        if phone.chars().count() > PHONE_NUMBER_MAX {
            errors.add(
                "phoneNumber",
                format!("phoneNumber cannot exceed {PHONE_NUMBER_MAX} characters"),
            );
        } else if !phone_regex().is_match(phone) {
            errors.add("phoneNumber", "phoneNumber must be a valid phone number");
        }
    }
    if let Some(email) = dto.email.as_deref() {
        if email.chars().count() > EMAIL_MAX {
            errors.add("email", format!("email cannot exceed {EMAIL_MAX} characters"));
        } else if !email_regex().is_match(email) {
            errors.add("email", "email must be a well-formed email address");
        }
    }
    if creating && placement == Placement::TopLevel {
        errors.present("userId", dto.user_id.as_ref());
    }
}
