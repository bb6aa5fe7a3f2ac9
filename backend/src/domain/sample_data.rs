//! Deterministic sample users for local development.
//!
//! Seeding goes through the user resource service, so passwords are hashed,
//! audit blocks are stamped, and nested children are attached exactly as
//! they would be for an API client.

use chrono::NaiveDate;
use tracing::{info, warn};

use super::ports::{ReadRequest, ResourceService};
use super::{AddressDto, AddressType, ContactDto, ContactType, Error, ErrorCode, UserDto};

/// One sample person and where they live.
struct Seed {
    first: &'static str,
    last: &'static str,
    street: &'static str,
    city: &'static str,
    province: &'static str,
    zip: &'static str,
    phone: &'static str,
}

const fn seed(
    first: &'static str,
    last: &'static str,
    street: &'static str,
    city: &'static str,
    province: &'static str,
    zip: &'static str,
    phone: &'static str,
) -> Seed {
    Seed {
        first,
        last,
        street,
        city,
        province,
        zip,
        phone,
    }
}

const SEEDS: [Seed; 10] = [
    seed("John", "Smith", "123 Main St", "New York", "NY", "10001", "212-555-1234"),
    seed("Jane", "Johnson", "456 Elm Ave", "Los Angeles", "CA", "90001", "213-555-2345"),
    seed("Michael", "Williams", "789 Oak Blvd", "Chicago", "IL", "60601", "312-555-3456"),
    seed("Emily", "Brown", "101 Pine Lane", "Houston", "TX", "77001", "713-555-4567"),
    seed("David", "Jones", "202 Maple Dr", "Phoenix", "AZ", "85001", "602-555-5678"),
    seed("Sarah", "Garcia", "303 Cedar Ct", "Philadelphia", "PA", "19101", "215-555-6789"),
    seed("Robert", "Miller", "404 Birch Rd", "San Antonio", "TX", "78201", "210-555-7890"),
    seed("Maria", "Davis", "505 Willow Way", "San Diego", "CA", "92101", "619-555-8901"),
    seed("Daniel", "Rodriguez", "606 Spruce St", "Dallas", "TX", "75201", "214-555-9012"),
    seed("Olivia", "Martinez", "707 Cherry Ave", "San Jose", "CA", "95101", "408-555-0123"),
];

/// Number of users [`sample_users`] produces.
pub const SAMPLE_USER_COUNT: usize = SEEDS.len();

/// Ten create payloads with one to three addresses and one or two contacts.
pub fn sample_users() -> Vec<UserDto> {
    SEEDS
        .iter()
        .enumerate()
        .map(|(index, person)| sample_user(index, person))
        .collect()
}

fn sample_user(index: usize, person: &Seed) -> UserDto {
    let offset = u32::try_from(index).unwrap_or_default();
    UserDto {
        username: Some(format!(
            "{}.{}",
            person.first.to_lowercase(),
            person.last.to_lowercase()
        )),
        password: Some(format!("password{}", index + 1)),
        first_name: Some(person.first.to_owned()),
        last_name: Some(person.last.to_owned()),
        birth_day: NaiveDate::from_ymd_opt(
            1980 + i32::try_from(index).unwrap_or_default(),
            offset % 12 + 1,
            offset % 28 + 1,
        ),
        addresses: Some((0..index % 3 + 1).map(|n| sample_address(person, n)).collect()),
        contacts: Some((0..index % 2 + 1).map(|n| sample_contact(person, n)).collect()),
        ..UserDto::default()
    }
}

fn sample_address(person: &Seed, n: usize) -> AddressDto {
    let street = if n == 0 {
        person.street.to_owned()
    } else {
        format!("{}, Suite {}", person.street, n * 100)
    };
    AddressDto {
        address_type: Some(if n == 0 {
            AddressType::Local
        } else {
            AddressType::International
        }),
        street: Some(street),
        post_zip_code: Some(person.zip.to_owned()),
        province: Some(person.province.to_owned()),
        city: Some(person.city.to_owned()),
        country: Some("USA".to_owned()),
        ..AddressDto::default()
    }
}

fn sample_contact(person: &Seed, n: usize) -> ContactDto {
    let work = n > 0;
    let email = format!(
        "{}.{}{}@example.com",
        person.first.to_lowercase(),
        person.last.to_lowercase(),
        if work { ".work" } else { "" }
    );
    let phone = format!("{}{}", person.phone, if work { "0" } else { "" });
    ContactDto {
        contact_type: Some(if work {
            ContactType::Work
        } else {
            ContactType::Personal
        }),
        phone_number: Some(phone),
        email: Some(email),
        ..ContactDto::default()
    }
}

/// Seed the sample users when no user exists yet.
///
/// Returns the number of users created. Conflicts are logged and skipped.
pub async fn seed_sample_data(users: &dyn ResourceService<UserDto>) -> Result<usize, Error> {
    if !users.find_all(&ReadRequest::default()).await?.is_empty() {
        info!("user store already populated; sample data skipped");
        return Ok(0);
    }

    let mut created = 0;
    let mut first_id = None;
    for payload in sample_users() {
        let username = payload.username.clone().unwrap_or_default();
        match users.save(payload).await {
            Ok(user) => {
                created += 1;
                first_id = first_id.or(user.record.id);
                info!(%username, "sample user created");
            }
            Err(error) if error.code() == ErrorCode::Conflict => {
                warn!(%username, error = %error, "sample user conflicts with stored data; skipped");
            }
            Err(error) => return Err(error),
        }
    }

    if let Some(id) = first_id {
        let check = ReadRequest::new(true, Some("addresses,contacts".to_owned()));
        if let Err(error) = users.find_by_id(id, &check).await {
            warn!(%id, error = %error, "could not read back sample data");
        }
    }
    info!(created, "sample data loaded");
    Ok(created)
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use std::collections::HashSet;

    use super::*;
    use crate::domain::validation::{Intent, validate_user};

    #[test]
    fn every_sample_user_passes_create_validation() {
        for user in sample_users() {
            validate_user(&user, Intent::Create).expect("sample data is valid");
        }
    }

    #[test]
    fn child_counts_follow_the_index() {
        let users = sample_users();
        let addresses: Vec<_> = users
            .iter()
            .map(|u| u.addresses.as_ref().map_or(0, Vec::len))
            .collect();
        let contacts: Vec<_> = users
            .iter()
            .map(|u| u.contacts.as_ref().map_or(0, Vec::len))
            .collect();

        assert_eq!(users.len(), SAMPLE_USER_COUNT);
        assert_eq!(addresses, [1, 2, 3, 1, 2, 3, 1, 2, 3, 1]);
        assert_eq!(contacts, [1, 2, 1, 2, 1, 2, 1, 2, 1, 2]);
    }

    #[test]
    fn unique_contact_fields_do_not_collide() {
        let contacts: Vec<_> = sample_users()
            .into_iter()
            .flat_map(|u| u.contacts.unwrap_or_default())
            .collect();
        let emails: HashSet<_> = contacts.iter().filter_map(|c| c.email.clone()).collect();
        let phones: HashSet<_> = contacts.iter().filter_map(|c| c.phone_number.clone()).collect();

        assert_eq!(emails.len(), contacts.len());
        assert_eq!(phones.len(), contacts.len());
    }
}
