use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    errors::ServiceError,
    handlers::common::MessageResponse,
    services::users::{NewUsersCount, UserResponse, UserUpdate},
    AppState,
};

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn list_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ServiceError> {
    Ok(Json(state.services.users.list_users().await?))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, ServiceError> {
    Ok(Json(state.services.users.get_user(id).await?))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User id")),
    request_body = UserUpdate,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 404, description = "User not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserResponse>, ServiceError> {
    Ok(Json(state.services.users.update_user(id, payload).await?))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    params(("id" = i32, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 500, description = "User still owns orders or database failure", body = crate::errors::ErrorResponse),
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageResponse>, ServiceError> {
    state.services.users.delete_user(id).await?;
    Ok(Json(MessageResponse::new("Usuario eliminado correctamente")))
}

#[utoipa::path(
    get,
    path = "/users/users_ultimo_mes",
    tag = "users",
    responses(
        (status = 200, description = "Users created in the last month", body = [NewUsersCount]),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    )
)]
pub async fn users_last_month(
    State(state): State<AppState>,
) -> Result<Json<Vec<NewUsersCount>>, ServiceError> {
    let count = state.services.users.users_last_month().await?;
    Ok(Json(vec![count]))
}
