//! In-memory adapters for the entity repository ports.
//!
//! Used when no database URL is configured and by the HTTP scenario tests.
//! The store mirrors the PostgreSQL schema: user deletes cascade, and
//! usernames, contact emails and contact phone numbers are unique.

mod repositories;
mod store;

pub use repositories::{
    MemoryAddressRepository, MemoryContactRepository, MemoryOwnedRepository, MemoryUserRepository,
};
pub use store::MemoryStore;
