use axum::{Router, extract::State, http::StatusCode, routing::get};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use gatekeep_core::health::{healthz, readiness};
use gatekeep_core::middleware::{propagate_request_id_layer, request_id_layer};

use crate::handlers::{
    permission::{
        create_permission, delete_permission, get_permission, get_permissions, update_permission,
    },
    role::{create_role, delete_role, get_role, get_roles, update_role},
    user::{create_user, delete_user, get_user, get_users, update_user},
};
use crate::state::AppState;

async fn readyz(State(state): State<AppState>) -> StatusCode {
    readiness(state.db.ping().await)
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Roles
        .route("/roles", get(get_roles).post(create_role))
        .route(
            "/roles/{id}",
            get(get_role).patch(update_role).delete(delete_role),
        )
        // Permissions
        .route("/permissions", get(get_permissions).post(create_permission))
        .route(
            "/permissions/{id}",
            get(get_permission)
                .patch(update_permission)
                .delete(delete_permission),
        )
        // Users
        .route("/users", get(get_users).post(create_user))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .layer(
            ServiceBuilder::new()
                .layer(request_id_layer())
                .layer(TraceLayer::new_for_http())
                .layer(propagate_request_id_layer()),
        )
        .with_state(state)
}
