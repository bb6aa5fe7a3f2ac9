//! Address resource handlers.
//!
//! Every address belongs to exactly one user; `userId` is required on create
//! and moves the address to another user on update.

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::{AddressDto, EntityId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::query::{AuditParams, ReadParams};
use crate::inbound::http::state::HttpState;

#[utoipa::path(
    get,
    path = "/api/addresses",
    params(ReadParams),
    responses(
        (status = 200, description = "Addresses ordered by id", body = [AddressDto]),
        (status = 400, description = "Unknown attribute path", body = ErrorBody)
    ),
    tags = ["addresses"],
    operation_id = "listAddresses"
)]
#[get("")]
pub async fn list_addresses(
    state: web::Data<HttpState>,
    params: web::Query<ReadParams>,
) -> ApiResult<web::Json<Vec<AddressDto>>> {
    let found = state.addresses.find_all(&params.into_inner().into()).await?;
    Ok(web::Json(found))
}

#[utoipa::path(
    get,
    path = "/api/addresses/{id}",
    params(("id" = i64, Path, description = "Address id"), ReadParams),
    responses(
        (status = 200, description = "Address", body = AddressDto),
        (status = 400, description = "Unknown attribute path", body = ErrorBody),
        (status = 404, description = "No such address", body = ErrorBody)
    ),
    tags = ["addresses"],
    operation_id = "getAddress"
)]
#[get("/{id}")]
pub async fn get_address(
    state: web::Data<HttpState>,
    id: web::Path<i64>,
    params: web::Query<ReadParams>,
) -> ApiResult<web::Json<AddressDto>> {
    let found = state
        .addresses
        .find_by_id(EntityId::new(id.into_inner()), &params.into_inner().into())
        .await?;
    Ok(web::Json(found))
}

/// Addresses owned by one user. An unknown user yields an empty array.
#[utoipa::path(
    get,
    path = "/api/addresses/user/{userId}",
    params(("userId" = i64, Path, description = "Owning user id"), AuditParams),
    responses(
        (status = 200, description = "Addresses of the user", body = [AddressDto])
    ),
    tags = ["addresses"],
    operation_id = "listAddressesByUser"
)]
#[get("/user/{user_id}")]
pub async fn list_addresses_by_user(
    state: web::Data<HttpState>,
    user_id: web::Path<i64>,
    params: web::Query<AuditParams>,
) -> ApiResult<web::Json<Vec<AddressDto>>> {
    let found = state
        .addresses
        .find_by_user_id(EntityId::new(user_id.into_inner()), params.include_audit())
        .await?;
    Ok(web::Json(found))
}

#[utoipa::path(
    post,
    path = "/api/addresses",
    request_body = AddressDto,
    responses(
        (status = 201, description = "Created", body = AddressDto),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Owning user not found", body = ErrorBody)
    ),
    tags = ["addresses"],
    operation_id = "createAddress"
)]
#[post("")]
pub async fn create_address(
    state: web::Data<HttpState>,
    payload: web::Json<AddressDto>,
) -> ApiResult<HttpResponse> {
    let created = state.addresses.save(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

#[utoipa::path(
    put,
    path = "/api/addresses/{id}",
    params(("id" = i64, Path, description = "Address id")),
    request_body = AddressDto,
    responses(
        (status = 200, description = "Updated", body = AddressDto),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Address or new owner not found", body = ErrorBody)
    ),
    tags = ["addresses"],
    operation_id = "updateAddress"
)]
#[put("/{id}")]
pub async fn update_address(
    state: web::Data<HttpState>,
    id: web::Path<i64>,
    payload: web::Json<AddressDto>,
) -> ApiResult<web::Json<AddressDto>> {
    let updated = state
        .addresses
        .update(EntityId::new(id.into_inner()), payload.into_inner())
        .await?;
    Ok(web::Json(updated))
}

#[utoipa::path(
    delete,
    path = "/api/addresses/{id}",
    params(("id" = i64, Path, description = "Address id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such address", body = ErrorBody)
    ),
    tags = ["addresses"],
    operation_id = "deleteAddress"
)]
#[delete("/{id}")]
pub async fn delete_address(
    state: web::Data<HttpState>,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state.addresses.delete_by_id(EntityId::new(id.into_inner())).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register the address handlers on a `/api/addresses` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/addresses")
            .service(list_addresses)
            .service(create_address)
            .service(list_addresses_by_user)
            .service(get_address)
            .service(update_address)
            .service(delete_address),
    );
}
