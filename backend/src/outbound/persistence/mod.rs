//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories implement the domain's entity repository ports on top of
//! `diesel-async` with `bb8` connection pooling. Row structs (`models.rs`)
//! and schema definitions (`schema.rs`) stay private to this module; only
//! domain entities cross the boundary.
//!
//! # Example
//!
//! ```ignore
//! use user_service::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let config = PoolConfig::new("postgres://localhost/users");
//! let pool = DbPool::new(config).await?;
//! let repo = DieselUserRepository::new(pool);
//! ```

mod diesel_address_repository;
mod diesel_contact_repository;
mod diesel_loaders;
mod diesel_user_repository;
mod error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_address_repository::DieselAddressRepository;
pub use diesel_contact_repository::DieselContactRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
