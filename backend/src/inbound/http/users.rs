//! User resource handlers.
//!
//! ```text
//! GET    /api/users?withAudit=true&attributes=addresses,contacts
//! GET    /api/users/{id}
//! POST   /api/users
//! PUT    /api/users/{id}
//! DELETE /api/users/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::{EntityId, UserDto};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::ErrorBody;
use crate::inbound::http::query::ReadParams;
use crate::inbound::http::state::HttpState;

/// List users, loading the requested associations.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use user_service::inbound::http::users::list_users;
///
/// let app = App::new().service(web::scope("/api/users").service(list_users));
/// ```
#[utoipa::path(
    get,
    path = "/api/users",
    params(ReadParams),
    responses(
        (status = 200, description = "Users ordered by id", body = [UserDto]),
        (status = 400, description = "Unknown attribute path", body = ErrorBody),
        (status = 500, description = "Internal server error", body = ErrorBody)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("")]
pub async fn list_users(
    state: web::Data<HttpState>,
    params: web::Query<ReadParams>,
) -> ApiResult<web::Json<Vec<UserDto>>> {
    let users = state.users.find_all(&params.into_inner().into()).await?;
    Ok(web::Json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id"), ReadParams),
    responses(
        (status = 200, description = "User", body = UserDto),
        (status = 400, description = "Unknown attribute path", body = ErrorBody),
        (status = 404, description = "No such user", body = ErrorBody)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    id: web::Path<i64>,
    params: web::Query<ReadParams>,
) -> ApiResult<web::Json<UserDto>> {
    let user = state
        .users
        .find_by_id(EntityId::new(id.into_inner()), &params.into_inner().into())
        .await?;
    Ok(web::Json(user))
}

/// Create a user together with any nested addresses and contacts.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserDto,
    responses(
        (status = 201, description = "Created", body = UserDto),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 409, description = "Unique value already taken", body = ErrorBody)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("")]
pub async fn create_user(
    state: web::Data<HttpState>,
    payload: web::Json<UserDto>,
) -> ApiResult<HttpResponse> {
    let created = state.users.save(payload.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

/// Patch a user. Absent fields keep their stored values.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserDto,
    responses(
        (status = 200, description = "Updated", body = UserDto),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "No such user", body = ErrorBody),
        (status = 409, description = "Unique value already taken", body = ErrorBody)
    ),
    tags = ["users"],
    operation_id = "updateUser"
)]
#[put("/{id}")]
pub async fn update_user(
    state: web::Data<HttpState>,
    id: web::Path<i64>,
    payload: web::Json<UserDto>,
) -> ApiResult<web::Json<UserDto>> {
    let updated = state
        .users
        .update(EntityId::new(id.into_inner()), payload.into_inner())
        .await?;
    Ok(web::Json(updated))
}

/// Delete a user and, with it, every owned address and contact.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "No such user", body = ErrorBody)
    ),
    tags = ["users"],
    operation_id = "deleteUser"
)]
#[delete("/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    id: web::Path<i64>,
) -> ApiResult<HttpResponse> {
    state.users.delete_by_id(EntityId::new(id.into_inner())).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Register the user handlers on a `/api/users` scope.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/users")
            .service(list_users)
            .service(create_user)
            .service(get_user)
            .service(update_user)
            .service(delete_user),
    );
}
