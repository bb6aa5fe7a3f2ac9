//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every handler for users, addresses, contacts, and health
//! - **Schemas**: the resource DTOs, their enums, and the error envelope
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use utoipa::OpenApi;

use crate::domain::{
    AddressDto, AddressType, AuditDto, ContactDto, ContactType, RecordDto, UserDto,
    UserSummaryDto,
};
use crate::inbound::http::ErrorBody;

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "User service API",
        description = "CRUD for users, their addresses, and their contacts. Read \
            operations accept `attributes` to select nested associations and \
            `withAudit` to include audit metadata."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::update_user,
        crate::inbound::http::users::delete_user,
        crate::inbound::http::addresses::list_addresses,
        crate::inbound::http::addresses::get_address,
        crate::inbound::http::addresses::list_addresses_by_user,
        crate::inbound::http::addresses::create_address,
        crate::inbound::http::addresses::update_address,
        crate::inbound::http::addresses::delete_address,
        crate::inbound::http::contacts::list_contacts,
        crate::inbound::http::contacts::get_contact,
        crate::inbound::http::contacts::list_contacts_by_user,
        crate::inbound::http::contacts::create_contact,
        crate::inbound::http::contacts::update_contact,
        crate::inbound::http::contacts::delete_contact,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        UserDto,
        AddressDto,
        ContactDto,
        RecordDto,
        AuditDto,
        UserSummaryDto,
        AddressType,
        ContactType,
        ErrorBody,
    )),
    tags(
        (name = "users", description = "Users and their nested collections"),
        (name = "addresses", description = "Addresses owned by users"),
        (name = "contacts", description = "Contacts owned by users"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the registered paths and schema structure.

    use rstest::rstest;
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    use super::*;

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/users")]
    #[case("/api/users/{id}")]
    #[case("/api/addresses")]
    #[case("/api/addresses/{id}")]
    #[case("/api/addresses/user/{userId}")]
    #[case("/api/contacts")]
    #[case("/api/contacts/{id}")]
    #[case("/api/contacts/user/{userId}")]
    fn resource_paths_are_documented(#[case] path: &str) {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    #[case("UserDto")]
    #[case("AddressDto")]
    #[case("ContactDto")]
    #[case("AuditDto")]
    #[case("AddressType")]
    #[case("ContactType")]
    fn resource_schemas_are_registered(#[case] name: &str) {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        assert!(schemas.contains_key(name), "missing schema {name}");
    }

    #[test]
    fn error_body_schema_has_envelope_fields() {
        let doc = ApiDoc::openapi();
        let schemas = &doc.components.as_ref().expect("components").schemas;
        let error_schema = schemas.get("ErrorBody").expect("ErrorBody schema");

        for field in ["timestamp", "status", "error", "message", "path", "errors"] {
            assert_object_schema_has_field(error_schema, field);
        }
    }
}
