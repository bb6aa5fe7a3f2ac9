//! Domain primitives, aggregates, and services.
//!
//! Purpose: model users with their owned addresses and contacts, and the
//! machinery that decides which parts of that graph a request loads and
//! returns. Inbound adapters speak [`ports::ResourceService`]; outbound
//! adapters implement [`ports::EntityRepository`].
//!
//! Public surface:
//! - Error: protocol-agnostic failure with a code and optional field errors.
//! - AttributePath / FetchPlan / MappingOptions: the attribute selection
//!   pipeline.
//! - User, Address, Contact: the aggregate and its children.
//! - UserService / AddressService / ContactService: CRUD orchestration.

pub mod address;
pub mod associations;
pub mod attribute_path;
pub mod contact;
pub mod crud_service;
pub mod dto;
pub mod error;
pub mod fetch_plan;
pub mod mapper;
pub mod mapping_options;
pub mod owned_service;
pub mod ports;
pub mod record;
pub mod sample_data;
pub mod trace_id;
pub mod user;
pub mod user_service;
pub mod validation;

pub use self::address::{Address, AddressDetails, AddressType, UnknownAddressType};
pub use self::associations::{
    AssociationDescriptor, AssociationRegistry, AssociationRegistryBuilder, EntityKind,
    RegistryError, UnknownAssociation,
};
pub use self::attribute_path::{AttributePath, AttributePathError, parse_attribute_list};
pub use self::contact::{Contact, ContactDetails, ContactType, UnknownContactType};
pub use self::crud_service::{CrudService, EntityCache, ServiceContext, StoreGeneration};
pub use self::dto::{AddressDto, AuditDto, ContactDto, RecordDto, UserDto, UserSummaryDto};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::fetch_plan::{AttributeSelection, FetchPlan, FetchPlanBuilder, FetchPlanError};
pub use self::mapper::{
    AddressMapper, ContactMapper, EntityMapper, MappingError, PatchedChildren, UserMapper,
};
pub use self::mapping_options::{
    CollectionStrategy, MappingOptions, MappingOptionsBuilder, MappingScope,
    UnknownCollectionStrategy,
};
pub use self::owned_service::{AddressService, ContactService, OwnedEntityService, OwnedPayload};
pub use self::record::{Association, Audit, Entity, EntityId, Record, UnresolvedAssociation};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{OwnedByUser, OwnerLink, User, UserProfile, UserRef};
pub use self::user_service::UserService;
pub use self::validation::Intent;

