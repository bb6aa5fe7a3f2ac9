//! Contact resource handlers.
//!
//! Every contact belongs to exactly one user; `userId` is required on create
//! and moves the contact to another user on update. Email addresses and
//! phone numbers are unique across all contacts, so writes may answer `409`.

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::{ContactDto, EntityId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::query::{AuditParams, ReadParams};
use crate::inbound::http::state::HttpState;

#[utoipa::path(
    get,
    path = "/api/contacts",
    params(ReadParams),
    responses(
        (status = 200, description = "Contacts ordered by id", body = [ContactDto]),
        (status = 400, description = "Unknown attribute path", body = ErrorBody)
    ),
    tags = ["contacts"],
    operation_id = "listContacts"
)]
#[get("")]
pub async fn list_contacts(
    state: web::Data<HttpState>,
    params: web::Query<ReadParams>,
) -> ApiResult<web::Json<Vec<ContactDto>>> {
    let found = state.contacts.find_all(&params.into_inner().into()).await?;
    Ok(web::Json(found))
}

#[utoipa::path(
    get,
    path = "/api/contacts/{id}",
    params(("id" = i64, Path, description = "Contact id"), ReadParams),
    responses(
        (status = 200, description = "Contact", body = ContactDto),
        (status = 400, description = "Unknown attribute path", body = ErrorBody),
        (status = 404, description = "No such contact", body = ErrorBody)
    ),
    tags = ["contacts"],
    operation_id = "getContact"
)]
#[get("/{id}")]
pub async fn get_contact(
    state: web::Data<HttpState>,
    id: web::Path<i64>,
    params: web::Query<ReadParams>,
) -> ApiResult<web::Json<ContactDto>> {
    let found = state
        .contacts
        .find_by_id(EntityId::new(id.into_inner()), &params.into_inner().into())
        .await?;
    Ok(web::Json(found))
}

/// Contacts owned by one user. An unknown user yields an empty array.
#[utoipa::path(
    get,
    path = "/api/contacts/user/{userId}",
    params(("userId" = i64, Path, description = "Owning user id"), AuditParams),
    responses(
        (status = 200, description = "Contacts of the user", body = [ContactDto])
    ),
    tags = ["contacts"],
    operation_id = "listContactsByUser"
)]
#[get("/user/{user_id}")]
pub async fn list_contacts_by_user(
    state: web::Data<HttpState>,
    user_id: web::Path<i64>,
    params: web::Query<AuditParams>,
) -> ApiResult<web::Json<Vec<ContactDto>>> {
    let found = state
        .contacts
        .find_by_user_id(EntityId::new(user_id.into_inner()), params.include_audit())
        .await?;
    Ok(web::Json(found))
}

#[utoipa::path(
    post,
    path = "/api/contacts",
    request_body = ContactDto,
    responses(
        (status = 201, description = "Created", body = ContactDto),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Owning user not found", body = ErrorBody),
        (status = 409, description = "Email or phone number already taken", body = ErrorBody)
    ),
    tags = ["contacts"],
    operation_id = "createContact"
)]
#[post("")]
pub async fn create_contact(
    state: web::Data<HttpState>,
    payload: web::Json<ContactDto>,
) -> ApiResult<HttpResponse> {
    let created = state.contacts.save(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/api/contacts/{id}",
    params(("id" = i64, Path, description = "Contact id")),
    request_body = ContactDto,
    responses(
        (status = 200, description = "Updated", body = ContactDto),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Contact or new owner not found", body = ErrorBody),
        (status = 409, description = "Email or phone number already taken", body = ErrorBody)
    ),
    tags = ["contacts"],
    operation_id = "updateContact"
)]
#[put("/{id}")]
pub async fn update_contact(
    state: web::Data<HttpState>,
    id: web::Path<i64>,
    payload: web::Json<ContactDto>,
) -> ApiResult<web::Json<ContactDto>> {
    let updated = state
        .contacts
        .update(EntityId::new(id.into_inner()), payload.into_inner())
        .await?;
    Ok(web::Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/contacts/{id}",
    params(("id" = i64, Path, description = "Contact id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such contact", body = ErrorBody)
    ),
    tags = ["contacts"],
    operation_id = "deleteContact"
)]
#[delete("/{id}")]
pub async fn delete_contact(
    state: web::Data<HttpState>,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state.contacts.delete_by_id(EntityId::new(id.into_inner())).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register the contact handlers on a `/api/contacts` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/contacts")
            .service(list_contacts)
            .service(create_contact)
            .service(list_contacts_by_user)
            .service(get_contact)
            .service(update_contact)
            .service(delete_contact),
    );
}
