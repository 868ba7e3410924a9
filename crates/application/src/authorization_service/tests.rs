use hectara_core::{AppError, CustomRoleId, RoleRef, SystemRole, TenantId, UserIdentity};
use hectara_domain::{CustomRole, GrantScope};

use crate::{GrantRepository, PermissionResolutionCache};
use crate::test_support::{Harness, admin_actor, field_edit, field_view, invoice_view};

const ORG_ADMIN: RoleRef = RoleRef::System(SystemRole::OrgAdmin);

#[tokio::test]
async fn global_grant_applies_to_every_tenant() {
    let harness = Harness::new().await;
    let field_view_id = harness.store.permission_id(field_view()).await;
    harness
        .store
        .grant(ORG_ADMIN, field_view_id, GrantScope::Global)
        .await;

    for _ in 0..3 {
        let granted = harness
            .authorization
            .has_permission(ORG_ADMIN, "FIELD", "VIEW", TenantId::new())
            .await;
        assert!(matches!(granted, Ok(true)));
    }
}

#[tokio::test]
async fn unknown_capability_fails_closed() {
    let harness = Harness::new().await;

    let unknown_tags = harness
        .authorization
        .has_permission(ORG_ADMIN, "NO_SUCH_TYPE", "NO_SUCH_ACTION", TenantId::new())
        .await;
    // Known pair that was never registered in the catalog.
    let unregistered = harness
        .authorization
        .has_permission(ORG_ADMIN, "HARVEST", "DELETE", TenantId::new())
        .await;

    assert!(matches!(unknown_tags, Ok(false)));
    assert!(matches!(unregistered, Ok(false)));
}

#[tokio::test]
async fn tenant_grant_does_not_leak_to_other_tenants() {
    let harness = Harness::new().await;
    let acme = TenantId::new();
    let other = TenantId::new();
    let invoice_view_id = harness.store.permission_id(invoice_view()).await;
    harness
        .store
        .grant(ORG_ADMIN, invoice_view_id, GrantScope::Tenant(acme))
        .await;

    let in_acme = harness
        .authorization
        .has_permission_for_key(ORG_ADMIN, invoice_view(), acme)
        .await;
    let in_other = harness
        .authorization
        .has_permission_for_key(ORG_ADMIN, invoice_view(), other)
        .await;

    assert!(matches!(in_acme, Ok(true)));
    assert!(matches!(in_other, Ok(false)));
}

#[tokio::test]
async fn tenant_customization_never_shadows_global_grant() {
    let harness = Harness::new().await;
    let acme = TenantId::new();
    let field_view_id = harness.store.permission_id(field_view()).await;
    let field_edit_id = harness.store.permission_id(field_edit()).await;
    harness
        .store
        .grant(ORG_ADMIN, field_view_id, GrantScope::Global)
        .await;

    let replaced = harness
        .lifecycle
        .update_role_permissions(
            &admin_actor(),
            SystemRole::OrgAdmin,
            GrantScope::Tenant(acme),
            &[field_edit_id],
        )
        .await;
    assert!(replaced.is_ok());

    let view = harness
        .authorization
        .has_permission(ORG_ADMIN, "FIELD", "VIEW", acme)
        .await;
    let edit = harness
        .authorization
        .has_permission(ORG_ADMIN, "FIELD", "EDIT", acme)
        .await;

    assert!(matches!(view, Ok(true)));
    assert!(matches!(edit, Ok(true)));
}

#[tokio::test]
async fn cached_resolution_skips_grant_store() {
    let harness = Harness::new().await;
    let tenant_id = TenantId::new();

    for _ in 0..3 {
        let result = harness
            .authorization
            .has_permission(ORG_ADMIN, "FIELD", "VIEW", tenant_id)
            .await;
        assert!(matches!(result, Ok(false)));
    }

    assert_eq!(harness.store.grant_reads(), 1);
}

#[tokio::test]
async fn replace_invalidates_cached_resolution() {
    let harness = Harness::new().await;
    let acme = TenantId::new();
    let field_view_id = harness.store.permission_id(field_view()).await;

    let before = harness
        .authorization
        .has_permission(ORG_ADMIN, "FIELD", "VIEW", acme)
        .await;
    assert!(matches!(before, Ok(false)));

    let replaced = harness
        .lifecycle
        .update_role_permissions(
            &admin_actor(),
            SystemRole::OrgAdmin,
            GrantScope::Global,
            &[field_view_id],
        )
        .await;
    assert!(replaced.is_ok());

    let after = harness
        .authorization
        .has_permission(ORG_ADMIN, "FIELD", "VIEW", acme)
        .await;
    assert!(matches!(after, Ok(true)));
}

#[tokio::test]
async fn resolution_racing_an_invalidation_is_not_cached() {
    let harness = Harness::new().await;
    let acme = TenantId::new();
    let user = RoleRef::System(SystemRole::User);
    let field_view_id = harness.store.permission_id(field_view()).await;
    harness
        .store
        .grant(user, field_view_id, GrantScope::Global)
        .await;

    // A grant replacement commits and invalidates while the resolver is loading.
    let cache = harness.cache.clone();
    harness
        .store
        .after_next_grant_read(move || cache.clear_role(SystemRole::User));

    let during = harness
        .authorization
        .has_permission(user, "FIELD", "VIEW", acme)
        .await;
    assert!(matches!(during, Ok(true)));
    assert!(harness.cache.get(SystemRole::User, acme).is_none());

    let replaced = harness
        .store
        .replace_grants(user, GrantScope::Global, &[])
        .await;
    assert!(replaced.is_ok());

    let after = harness
        .authorization
        .has_permission(user, "FIELD", "VIEW", acme)
        .await;
    assert!(matches!(after, Ok(false)));
    assert_eq!(harness.store.grant_reads(), 2);

    let cached = harness
        .authorization
        .has_permission(user, "FIELD", "VIEW", acme)
        .await;
    assert!(matches!(cached, Ok(false)));
    assert_eq!(harness.store.grant_reads(), 2);
}

#[tokio::test]
async fn custom_roles_bypass_cache() {
    let harness = Harness::new().await;
    let tenant_id = TenantId::new();
    let role = CustomRole::new("AUDITOR", "Auditor", None).unwrap_or_else(|_| unreachable!());
    let role_ref = RoleRef::Custom(role.id());
    harness.store.insert_role(role).await;

    for _ in 0..2 {
        let result = harness
            .authorization
            .has_permission(role_ref, "INVOICE", "VIEW", tenant_id)
            .await;
        assert!(matches!(result, Ok(false)));
    }
    assert_eq!(harness.store.grant_reads(), 2);

    let invoice_view_id = harness.store.permission_id(invoice_view()).await;
    harness
        .store
        .grant(role_ref, invoice_view_id, GrantScope::Global)
        .await;

    let granted = harness
        .authorization
        .has_permission(role_ref, "INVOICE", "VIEW", tenant_id)
        .await;
    assert!(matches!(granted, Ok(true)));
}

#[tokio::test]
async fn store_outage_is_not_a_denial() {
    let harness = Harness::new().await;
    harness.store.set_grant_store_down(true);

    let result = harness
        .authorization
        .has_permission(ORG_ADMIN, "FIELD", "VIEW", TenantId::new())
        .await;

    assert!(matches!(result, Err(AppError::ResolutionUnavailable(_))));
}

#[tokio::test]
async fn require_permission_maps_denial_to_forbidden() {
    let harness = Harness::new().await;
    let identity = UserIdentity::new(
        "bob",
        RoleRef::Custom(CustomRoleId::new()),
        TenantId::new(),
    );

    let result = harness
        .authorization
        .require_permission(&identity, field_view())
        .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn effective_permissions_lists_union_of_scopes() {
    let harness = Harness::new().await;
    let acme = TenantId::new();
    let field_view_id = harness.store.permission_id(field_view()).await;
    let invoice_view_id = harness.store.permission_id(invoice_view()).await;
    harness
        .store
        .grant(ORG_ADMIN, field_view_id, GrantScope::Global)
        .await;
    harness
        .store
        .grant(ORG_ADMIN, invoice_view_id, GrantScope::Tenant(acme))
        .await;

    let keys = harness
        .authorization
        .effective_permissions(ORG_ADMIN, acme)
        .await
        .unwrap_or_default();

    assert_eq!(keys, vec![field_view(), invoice_view()]);
}

#[tokio::test]
async fn check_permission_accepts_system_role_tag() {
    let harness = Harness::new().await;
    let field_view_id = harness.store.permission_id(field_view()).await;
    harness
        .store
        .grant(
            RoleRef::System(SystemRole::User),
            field_view_id,
            GrantScope::Global,
        )
        .await;

    let result = harness
        .authorization
        .check_permission(SystemRole::User, "FIELD", "VIEW", TenantId::new())
        .await;

    assert!(matches!(result, Ok(true)));
}
