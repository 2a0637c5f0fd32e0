use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, ErrorBody, ValidationErrorBody, error_chain},
    models::{MessageResponse, UpdateUserRequest, UserResponse, UsersListResponse},
    policy::{Action, can_act},
    validation::{UserIdParams, parse_update_body},
};
use axum::{
    Extension, Json,
    body::Bytes,
    extract::State,
};

// --- Handlers ---

/// fetch_all_users
///
/// Lists every user. Authentication is enforced by the `authenticate` route layer;
/// there is no role check here.
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "All users", body = UsersListResponse),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal error", body = ErrorBody)
    )
)]
pub async fn fetch_all_users(State(state): State<AppState>) -> ApiResult<Json<UsersListResponse>> {
    tracing::info!("Getting users...");

    let users = state.repo.list_users().await.map_err(|e| {
        tracing::error!(error = %error_chain(&e), "Error fetching users");
        ApiError::Internal(e)
    })?;

    Ok(Json(UsersListResponse {
        message: "Successfully retrieved users".to_string(),
        count: users.len(),
        users,
    }))
}

/// get_user_by_id
///
/// Fetches one user. A malformed id is answered with 400 before the repository is touched.
#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(UserIdParams),
    responses(
        (status = 200, description = "Found", body = UserResponse),
        (status = 400, description = "Malformed id", body = ValidationErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn get_user_by_id(
    State(state): State<AppState>,
    params: UserIdParams,
) -> ApiResult<Json<UserResponse>> {
    let id = params.user_id()?;

    tracing::info!("Getting user with ID: {}", id);

    let user = state.repo.get_user(id).await.map_err(|e| {
        tracing::error!(error = %error_chain(&e), user_id = id, "Error fetching user by ID");
        ApiError::from(e)
    })?;

    Ok(Json(UserResponse {
        message: "Successfully retrieved user".to_string(),
        user,
    }))
}

/// update_user
///
/// Applies a partial update. The checks run in a fixed order and the first failure
/// is the response: id, body, principal, ownership, role change.
///
/// The body is taken as raw bytes so that a malformed payload is reported as a
/// validation failure after the id check, not rejected by the `Json` extractor.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(UserIdParams),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 400, description = "Malformed id or body", body = ValidationErrorBody),
        (status = 401, description = "No principal", body = ErrorBody),
        (status = 403, description = "Not self/admin, or role change by non-admin", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    principal: Option<Extension<AuthUser>>,
    params: UserIdParams,
    body: Bytes,
) -> ApiResult<Json<UserResponse>> {
    let id = params.user_id()?;
    let changes = parse_update_body(&body)?;

    can_act(
        principal.as_ref().map(|Extension(user)| user),
        id,
        Action::Update {
            changes_role: changes.changes_role(),
        },
    )?;

    tracing::info!("Updating user with ID: {}", id);

    let user = state.repo.update_user(id, changes).await.map_err(|e| {
        tracing::error!(error = %error_chain(&e), user_id = id, "Error updating user");
        ApiError::from(e)
    })?;

    Ok(Json(UserResponse {
        message: "User updated successfully".to_string(),
        user,
    }))
}

/// delete_user
///
/// Deletes a user. Users may delete their own account; admins may delete any account.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(UserIdParams),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 400, description = "Malformed id", body = ValidationErrorBody),
        (status = 401, description = "No principal", body = ErrorBody),
        (status = 403, description = "Not self/admin", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    principal: Option<Extension<AuthUser>>,
    params: UserIdParams,
) -> ApiResult<Json<MessageResponse>> {
    let id = params.user_id()?;

    can_act(
        principal.as_ref().map(|Extension(user)| user),
        id,
        Action::Delete,
    )?;

    tracing::info!("Deleting user with ID: {}", id);

    state.repo.delete_user(id).await.map_err(|e| {
        tracing::error!(error = %error_chain(&e), user_id = id, "Error deleting user");
        ApiError::from(e)
    })?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
