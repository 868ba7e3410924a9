use hectara_application::{
    CustomRoleRepository, GrantRepository, PermissionCatalogRepository, UserDirectory,
};
use hectara_core::{AppError, RoleRef, SystemRole, TenantId};
use hectara_domain::{
    CustomRole, GrantQuery, GrantScope, Permission, PermissionAction, PermissionId, PermissionKey,
    ResourceType, RoleGrant,
};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::{PostgresCustomRoleRepository, PostgresPermissionCatalogRepository, PostgresUserDirectory};

use super::PostgresGrantRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres grant tests: {error}");
    }

    Some(pool)
}

async fn ensure_permission(pool: &PgPool, key: PermissionKey) -> PermissionId {
    let catalog = PostgresPermissionCatalogRepository::new(pool.clone());
    let permission = Permission::new(key, key.default_description())
        .unwrap_or_else(|error| panic!("invalid permission: {error}"));

    match catalog.insert_permission(permission.clone()).await {
        Ok(()) => permission.id(),
        Err(AppError::DuplicatePermission { .. }) => catalog
            .find_permission_by_key(key)
            .await
            .ok()
            .flatten()
            .map(|stored| stored.id())
            .unwrap_or_else(|| panic!("permission '{key}' vanished")),
        Err(error) => panic!("failed to insert permission: {error}"),
    }
}

async fn insert_role(pool: &PgPool) -> CustomRole {
    let name = format!("PG_TEST_{}", Uuid::new_v4().simple()).to_uppercase();
    let role = CustomRole::new(name, "Postgres test role", None)
        .unwrap_or_else(|error| panic!("invalid role: {error}"));

    let inserted = PostgresCustomRoleRepository::new(pool.clone())
        .insert_custom_role(role.clone())
        .await;
    assert!(inserted.is_ok());

    role
}

#[tokio::test]
async fn replace_touches_only_the_requested_tenant() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool.clone());
    let role = RoleRef::System(SystemRole::OrgAdmin);
    let acme = TenantId::new();
    let other = TenantId::new();
    let field_view = ensure_permission(&pool, PermissionKey::new(ResourceType::Field, PermissionAction::View)).await;
    let field_edit = ensure_permission(&pool, PermissionKey::new(ResourceType::Field, PermissionAction::Edit)).await;

    let seeded_other = repository
        .replace_grants(role, GrantScope::Tenant(other), &[field_view])
        .await;
    assert!(seeded_other.is_ok());

    let first = repository
        .replace_grants(role, GrantScope::Tenant(acme), &[field_view, field_edit])
        .await;
    assert!(matches!(first, Ok(grants) if grants.len() == 2));

    let second = repository
        .replace_grants(role, GrantScope::Tenant(acme), &[field_edit])
        .await;
    assert!(second.is_ok());

    let acme_grants = repository
        .find_grants(role, GrantQuery::EffectiveFor(acme))
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|grant| grant.scope == GrantScope::Tenant(acme))
        .map(|grant| grant.permission_id)
        .collect::<Vec<_>>();
    assert_eq!(acme_grants, vec![field_edit]);

    let other_grants = repository
        .find_grants(role, GrantQuery::EffectiveFor(other))
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|grant| grant.scope == GrantScope::Tenant(other))
        .map(|grant| grant.permission_id)
        .collect::<Vec<_>>();
    assert_eq!(other_grants, vec![field_view]);

    let cleared = repository
        .replace_grants(role, GrantScope::Tenant(acme), &[])
        .await;
    let cleared_other = repository
        .replace_grants(role, GrantScope::Tenant(other), &[])
        .await;
    assert!(cleared.is_ok() && cleared_other.is_ok());
}

#[tokio::test]
async fn unknown_permission_rolls_back_replacement() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool.clone());
    let role = insert_role(&pool).await;
    let role_ref = RoleRef::Custom(role.id());
    let crop_view = ensure_permission(&pool, PermissionKey::new(ResourceType::Crop, PermissionAction::View)).await;

    let baseline = repository
        .replace_grants(role_ref, GrantScope::Global, &[crop_view])
        .await;
    assert!(baseline.is_ok());

    let result = repository
        .replace_grants(role_ref, GrantScope::Global, &[PermissionId::new()])
        .await;
    assert!(matches!(result, Err(AppError::UnknownPermission(_))));

    let grants = repository
        .find_grants(role_ref, GrantQuery::GlobalOnly)
        .await
        .unwrap_or_default();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].permission_id, crop_view);
}

#[tokio::test]
async fn deleting_custom_role_cascades_grants() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool.clone());
    let roles = PostgresCustomRoleRepository::new(pool.clone());
    let role = insert_role(&pool).await;
    let role_ref = RoleRef::Custom(role.id());
    let report_view = ensure_permission(&pool, PermissionKey::new(ResourceType::Report, PermissionAction::View)).await;

    let global = repository
        .replace_grants(role_ref, GrantScope::Global, &[report_view])
        .await;
    let scoped = repository
        .replace_grants(role_ref, GrantScope::Tenant(TenantId::new()), &[report_view])
        .await;
    assert!(global.is_ok() && scoped.is_ok());

    assert!(roles.delete_custom_role(role.id()).await.is_ok());

    let remaining = repository
        .find_grants(role_ref, GrantQuery::AllScopes)
        .await
        .unwrap_or_default();
    assert!(remaining.is_empty());
    assert!(matches!(roles.find_custom_role(role.id()).await, Ok(None)));
}

#[tokio::test]
async fn assigned_user_blocks_role_row_deletion() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let roles = PostgresCustomRoleRepository::new(pool.clone());
    let directory = PostgresUserDirectory::new(pool.clone());
    let role = insert_role(&pool).await;

    let insert_user = sqlx::query(
        r#"
            INSERT INTO users (id, tenant_id, subject, custom_role_id)
            VALUES ($1, $2, $3, $4)
            "#,
    )
    .bind(Uuid::new_v4())
    .bind(TenantId::new().as_uuid())
    .bind("field-scout")
    .bind(role.id().as_uuid())
    .execute(&pool)
    .await;
    assert!(insert_user.is_ok());

    assert!(matches!(directory.count_users_with_role(role.id()).await, Ok(1)));

    let result = roles.delete_custom_role(role.id()).await;
    assert!(matches!(result, Err(AppError::Conflict(_))));
    assert!(matches!(roles.find_custom_role(role.id()).await, Ok(Some(_))));
}

#[tokio::test]
async fn concurrent_replacements_leave_exactly_one_requested_set() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let first_repository = PostgresGrantRepository::new(pool.clone());
    let second_repository = PostgresGrantRepository::new(pool.clone());
    let role = RoleRef::System(SystemRole::User);
    let field_view = ensure_permission(&pool, PermissionKey::new(ResourceType::Field, PermissionAction::View)).await;
    let farm_view = ensure_permission(&pool, PermissionKey::new(ResourceType::Farm, PermissionAction::View)).await;

    for _ in 0..5 {
        let tenant = GrantScope::Tenant(TenantId::new());

        let first_requested = [field_view];
        let second_requested = [farm_view];
        let (first, second) = tokio::join!(
            first_repository.replace_grants(role, tenant, &first_requested),
            second_repository.replace_grants(role, tenant, &second_requested),
        );
        let (Ok(first), Ok(second)) = (first, second) else {
            panic!("concurrent replacements must both succeed");
        };

        let mut stored = first_repository
            .find_grants(role, GrantQuery::AllScopes)
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|grant| grant.scope == tenant)
            .map(|grant| (grant.id, grant.permission_id))
            .collect::<Vec<_>>();
        stored.sort_by_key(|(id, _)| id.as_uuid());

        let as_rows = |grants: &[RoleGrant]| {
            grants
                .iter()
                .map(|grant| (grant.id, grant.permission_id))
                .collect::<Vec<_>>()
        };
        assert!(stored == as_rows(&first) || stored == as_rows(&second));
        assert_eq!(stored.len(), 1);

        let cleared = first_repository.replace_grants(role, tenant, &[]).await;
        assert!(cleared.is_ok());
    }
}

#[tokio::test]
async fn delete_grants_for_role_removes_every_scope() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let repository = PostgresGrantRepository::new(pool.clone());
    let role = insert_role(&pool).await;
    let role_ref = RoleRef::Custom(role.id());
    let harvest_view = ensure_permission(&pool, PermissionKey::new(ResourceType::Harvest, PermissionAction::View)).await;

    let global = repository
        .replace_grants(role_ref, GrantScope::Global, &[harvest_view])
        .await;
    let scoped = repository
        .replace_grants(role_ref, GrantScope::Tenant(TenantId::new()), &[harvest_view])
        .await;
    assert!(global.is_ok() && scoped.is_ok());

    let removed = repository.delete_grants_for_role(role.id()).await;
    assert!(matches!(removed, Ok(2)));

    let remaining = repository
        .find_grants(role_ref, GrantQuery::AllScopes)
        .await
        .unwrap_or_default();
    assert!(remaining.is_empty());
    assert!(matches!(
        PostgresCustomRoleRepository::new(pool.clone())
            .find_custom_role(role.id())
            .await,
        Ok(Some(_))
    ));
}
