//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{OwnedResourceService, ResourceService};
use crate::domain::{AddressDto, ContactDto, UserDto};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub users: Arc<dyn ResourceService<UserDto>>,
    pub addresses: Arc<dyn OwnedResourceService<AddressDto>>,
    pub contacts: Arc<dyn OwnedResourceService<ContactDto>>,
}

impl HttpState {
    pub fn new(
        users: Arc<dyn ResourceService<UserDto>>,
        addresses: Arc<dyn OwnedResourceService<AddressDto>>,
        contacts: Arc<dyn OwnedResourceService<ContactDto>>,
    ) -> Self {
        Self {
            users,
            addresses,
            contacts,
        }
    }
}
