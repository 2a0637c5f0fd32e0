use crate::{AppState, auth::authenticate, handlers};
use axum::{Router, middleware, routing::get};

/// Users Router Module
///
/// Serves `/api/users`. The whole router sits behind the `authenticate` layer,
/// which attaches the `AuthUser` principal the handlers authorize against.
/// Ownership and role rules are evaluated inside `update_user` and `delete_user`.
pub fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // GET /api/users
        // Lists every user with a count. The trailing-slash form is accepted too.
        .route("/api/users", get(handlers::fetch_all_users))
        .route("/api/users/", get(handlers::fetch_all_users))
        // GET/PUT/DELETE /api/users/{id}
        // Read is open to any authenticated user; update and delete are self-or-admin.
        .route(
            "/api/users/{id}",
            get(handlers::get_user_by_id)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(state, authenticate))
}
