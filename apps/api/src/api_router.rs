mod cors;


use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{MethodRouter, delete, get, patch, post, put};
use hectara_core::AppError;
use hectara_domain::{PermissionAction, PermissionKey, ResourceType};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::{self, PermissionGuard};
use crate::state::AppState;

use self::cors::build_cors_layer;

/// Wraps a method router so it only runs when the caller holds `resource_type:action`.
fn guarded(
    state: &AppState,
    resource_type: ResourceType,
    action: PermissionAction,
    method_router: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    method_router.route_layer(from_fn_with_state(
        PermissionGuard {
            state: state.clone(),
            key: PermissionKey::new(resource_type, action),
        },
        middleware::require_permission,
    ))
}

pub fn build_router(app_state: AppState, frontend_url: &str) -> Result<Router, AppError> {
    use PermissionAction::{Create, Delete, Edit, View};
    use ResourceType::Role;

    let state = &app_state;

    let protected_routes = Router::new()
        .route(
            "/api/permissions",
            guarded(state, Role, View, get(handlers::permissions::list_permissions_handler)).merge(
                guarded(
                    state,
                    Role,
                    Create,
                    post(handlers::permissions::register_permission_handler),
                ),
            ),
        )
        .route(
            "/api/permissions/{permission_id}/description",
            guarded(
                state,
                Role,
                Edit,
                put(handlers::permissions::update_permission_description_handler),
            ),
        )
        .route(
            "/api/permissions/check",
            post(handlers::permissions::check_permission_handler),
        )
        .route(
            "/api/me/permissions",
            get(handlers::permissions::my_permissions_handler),
        )
        .route(
            "/api/roles",
            guarded(state, Role, View, get(handlers::roles::list_roles_handler)).merge(guarded(
                state,
                Role,
                Create,
                post(handlers::roles::create_role_handler),
            )),
        )
        .route(
            "/api/roles/{role_id}",
            guarded(state, Role, View, get(handlers::roles::get_role_handler))
                .merge(guarded(
                    state,
                    Role,
                    Edit,
                    patch(handlers::roles::update_role_handler),
                ))
                .merge(guarded(
                    state,
                    Role,
                    Delete,
                    delete(handlers::roles::delete_role_handler),
                )),
        )
        .route(
            "/api/roles/{role_id}/stats",
            guarded(state, Role, View, get(handlers::roles::role_stats_handler)),
        )
        .route(
            "/api/roles/{role_id}/permissions",
            guarded(
                state,
                Role,
                View,
                get(handlers::role_permissions::list_custom_role_permissions_handler),
            )
            .merge(guarded(
                state,
                Role,
                Edit,
                put(handlers::role_permissions::replace_custom_role_permissions_handler),
            )),
        )
        .route(
            "/api/system-roles/{role}/permissions",
            guarded(
                state,
                Role,
                View,
                get(handlers::role_permissions::list_system_role_permissions_handler),
            )
            .merge(guarded(
                state,
                Role,
                Edit,
                put(handlers::role_permissions::replace_system_role_permissions_handler),
            )),
        )
        .route_layer(from_fn(middleware::require_identity));

    Ok(Router::new()
        .route("/health", get(handlers::health::health_handler))
        .merge(protected_routes)
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer(frontend_url)?)
        .with_state(app_state))
}
