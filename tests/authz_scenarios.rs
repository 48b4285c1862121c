mod common;

use anyhow::Result;
use chrono::NaiveDate;
use votegate::authz::permissions as p;
use votegate::authz::{policy, Guard, Target};
use votegate::errors::AppError;
use votegate::models::campaign::CampaignCreateRequest;
use votegate::models::role::{RoleCreateRequest, RoleUpdateRequest};

use common::{fixture, insert_role, insert_user};

fn role_request(list_id: Option<uuid::Uuid>, level: i64) -> RoleCreateRequest {
    RoleCreateRequest {
        name: format!("level-{}-{}", level, uuid::Uuid::new_v4().simple()),
        color: None,
        level,
        list_id,
        permission_ids: Vec::new(),
    }
}

fn campaign(list_id: uuid::Uuid, start: u32, end: u32) -> CampaignCreateRequest {
    CampaignCreateRequest {
        name: format!("Campaign {}-{}", start, end),
        list_id,
        description: None,
        start_date: NaiveDate::from_ymd_opt(2026, 3, start).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2026, 3, end).unwrap(),
    }
}

#[tokio::test]
async fn org_level_authority_bounds_role_creation() -> Result<()> {
    let fx = fixture().await?;
    let role = insert_role(&fx.pool, fx.org_id, None, 5, &[p::CREATE_ROLE_ORGANIZATION]).await?;
    let a = insert_user(&fx.pool, fx.org_id, &[role], &[]).await?;
    let roles = &fx.services.roles;

    let created = roles.create(a, role_request(Some(fx.list_x), 3)).await?;
    assert_eq!(created.list_id, Some(fx.list_x));
    assert_eq!(created.level, 3);

    let err = roles.create(a, role_request(Some(fx.list_x), 5)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    let err = roles.create(a, role_request(None, 5)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    let org_role = roles.create(a, role_request(None, 4)).await?;
    assert!(org_role.is_org_level());
    Ok(())
}

#[tokio::test]
async fn list_bound_permission_only_reaches_its_list() -> Result<()> {
    let fx = fixture().await?;
    let role = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 2, &[p::CREATE_CAMPAIGN_LIST]).await?;
    let b = insert_user(&fx.pool, fx.org_id, &[role], &[fx.list_x]).await?;
    let campaigns = &fx.services.campaigns;

    let err = campaigns.create(b, campaign(fx.list_y, 1, 10)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    let created = campaigns.create(b, campaign(fx.list_x, 1, 10)).await?;
    assert_eq!(created.list_id, fx.list_x);

    let err = campaigns.create(b, campaign(fx.list_x, 4, 4)).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn foreign_roles_are_not_found_for_any_permission_set() -> Result<()> {
    let fx = fixture().await?;
    let other = common::bootstrap(&fx.services, "LIC0002").await?;
    let foreign_role = insert_role(&fx.pool, other.org_id, None, 1, &[]).await?;
    let roles = &fx.services.roles;

    // The local administrator holds every permission at level 100.
    let err = roles.get(fx.admin_id, foreign_role).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");

    let err = roles
        .update(
            fx.admin_id,
            foreign_role,
            RoleUpdateRequest {
                name: Some("hijacked".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");

    let err = roles.delete(fx.admin_id, foreign_role).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");

    // Indistinguishable from an id that does not exist at all.
    let missing = roles.get(fx.admin_id, uuid::Uuid::new_v4()).await.unwrap_err();
    assert_eq!(err.to_string(), missing.to_string());

    let still_there = common::count(
        &fx.pool,
        &format!("SELECT COUNT(*) FROM roles WHERE id = '{}' AND name LIKE 'role-%'", foreign_role),
    )
    .await?;
    assert_eq!(still_there, 1);
    Ok(())
}

#[tokio::test]
async fn deleted_actors_are_not_found() -> Result<()> {
    let fx = fixture().await?;
    let role = insert_role(&fx.pool, fx.org_id, None, 10, &[p::VIEW_ALL_ROLE_ORGANIZATION]).await?;
    let user = insert_user(&fx.pool, fx.org_id, &[role], &[]).await?;

    assert!(fx.services.roles.list_visible(user, None).await.is_ok());
    fx.services.users.delete(fx.admin_id, user).await?;

    let err = fx.services.roles.list_visible(user, None).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn gate_reads_current_grants_without_caching() -> Result<()> {
    let fx = fixture().await?;
    let role = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 3, &[p::UPDATE_LIST_LIST]).await?;
    let user = insert_user(&fx.pool, fx.org_id, &[role], &[fx.list_x]).await?;
    let guard = || Guard::new(Target::List(fx.list_x), policy::UPDATE_LIST);

    assert!(fx.engine.authorize(user, guard()).await.is_ok());

    sqlx::query("DELETE FROM role_permissions WHERE role_id = ?")
        .bind(role.to_string())
        .execute(&fx.pool)
        .await?;

    let err = fx.engine.authorize(user, guard()).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn shared_list_grants_reach_members_only() -> Result<()> {
    let fx = fixture().await?;
    let manager_role = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 5, &[p::VIEW_ALL_USER_LIST]).await?;
    let manager = insert_user(&fx.pool, fx.org_id, &[manager_role], &[fx.list_x]).await?;
    let member_x = insert_user(&fx.pool, fx.org_id, &[], &[fx.list_x]).await?;
    let member_y = insert_user(&fx.pool, fx.org_id, &[], &[fx.list_y]).await?;

    let oracle = fx.engine.oracle();
    assert!(oracle.check_shared_lists(manager, member_x, p::VIEW_ALL_USER_LIST).await?);
    assert!(!oracle.check_shared_lists(manager, member_y, p::VIEW_ALL_USER_LIST).await?);

    assert!(fx.services.users.get(manager, Some(member_x)).await.is_ok());
    let err = fx.services.users.get(manager, Some(member_y)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn resolver_combines_list_and_org_levels() -> Result<()> {
    let fx = fixture().await?;
    let org_role = insert_role(&fx.pool, fx.org_id, None, 4, &[]).await?;
    let list_role = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 7, &[]).await?;
    let user = insert_user(&fx.pool, fx.org_id, &[org_role, list_role], &[fx.list_x]).await?;

    let hierarchy = fx.engine.hierarchy();
    assert_eq!(hierarchy.max_level_in_org(user, fx.org_id).await?, 4);
    assert_eq!(hierarchy.max_level_in_list(user, fx.list_x).await?, 7);
    assert_eq!(hierarchy.max_level_in_list(user, fx.list_y).await?, 0);
    assert_eq!(
        hierarchy
            .authority(user, votegate::authz::Scope::List(fx.list_y))
            .await?,
        4
    );
    Ok(())
}
