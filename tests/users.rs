mod common;

use anyhow::Result;
use uuid::Uuid;
use votegate::authz::permissions as p;
use votegate::errors::AppError;
use votegate::models::user::{ChangePasswordRequest, UserCreateRequest, UserUpdateRequest};

use common::{count, fixture, insert_role, insert_user, PASSWORD};

fn new_user(email: &str, role_ids: Vec<Uuid>, list_ids: Vec<Uuid>) -> UserCreateRequest {
    UserCreateRequest {
        name: "Grace".to_string(),
        surname: "Hopper".to_string(),
        email: email.to_string(),
        password: PASSWORD.to_string(),
        role_ids,
        list_ids,
    }
}

#[tokio::test]
async fn org_wide_creator_places_users_anywhere() -> Result<()> {
    let fx = fixture().await?;
    let member_role = insert_role(&fx.pool, fx.org_id, Some(fx.list_y), 1, &[]).await?;

    let created = fx
        .services
        .users
        .create(
            fx.admin_id,
            new_user(" Grace@Example.com ", vec![member_role], vec![fx.list_x, fx.list_y]),
        )
        .await?;
    assert_eq!(created.user.email, "grace@example.com");
    assert!(created.user.must_change_password);
    assert_eq!(created.role_ids, vec![member_role]);
    assert_eq!(created.list_ids.len(), 2);

    let err = fx
        .services
        .users
        .create(fx.admin_id, new_user("grace@example.com", vec![], vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    let err = fx
        .services
        .users
        .create(fx.admin_id, new_user("ghost@example.com", vec![], vec![Uuid::new_v4()]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn list_bound_creator_is_confined_to_one_list() -> Result<()> {
    let fx = fixture().await?;
    let creator_role = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 4, &[p::CREATE_USER_FOR_LIST]).await?;
    let creator = insert_user(&fx.pool, fx.org_id, &[creator_role], &[fx.list_x]).await?;
    let helper = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 2, &[]).await?;
    let boss = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 4, &[]).await?;
    let users = &fx.services.users;

    let err = users
        .create(creator, new_user("a@example.com", vec![], vec![fx.list_x, fx.list_y]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");

    let err = users
        .create(creator, new_user("b@example.com", vec![], vec![fx.list_y]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    let err = users
        .create(creator, new_user("c@example.com", vec![helper, boss], vec![fx.list_x]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    assert_eq!(
        count(&fx.pool, "SELECT COUNT(*) FROM users WHERE email = 'c@example.com'").await?,
        0
    );

    let created = users
        .create(creator, new_user("c@example.com", vec![helper], vec![fx.list_x]))
        .await?;
    assert_eq!(created.list_ids, vec![fx.list_x]);
    Ok(())
}

#[tokio::test]
async fn batch_creation_is_all_or_nothing() -> Result<()> {
    let fx = fixture().await?;
    let users = &fx.services.users;
    let before = count(&fx.pool, "SELECT COUNT(*) FROM users").await?;

    let err = users
        .create_batch(
            fx.admin_id,
            vec![new_user("x@example.com", vec![], vec![]), new_user("X@example.com", vec![], vec![])],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)), "{err:?}");

    let err = users
        .create_batch(
            fx.admin_id,
            vec![
                new_user("y@example.com", vec![], vec![]),
                new_user("z@example.com", vec![Uuid::new_v4()], vec![]),
            ],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
    assert_eq!(count(&fx.pool, "SELECT COUNT(*) FROM users").await?, before);

    let created = users
        .create_batch(
            fx.admin_id,
            vec![new_user("y@example.com", vec![], vec![]), new_user("z@example.com", vec![], vec![])],
        )
        .await?;
    assert_eq!(created.len(), 2);
    Ok(())
}

#[tokio::test]
async fn users_may_edit_themselves_but_not_manage_themselves() -> Result<()> {
    let fx = fixture().await?;
    let user = insert_user(&fx.pool, fx.org_id, &[], &[]).await?;
    let users = &fx.services.users;

    let updated = users
        .update(
            user,
            UserUpdateRequest {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(updated.user.name, "Renamed");
    assert!(updated.temporary_password.is_none());

    let err = users
        .update(
            user,
            UserUpdateRequest {
                reset_password: true,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    let err = users
        .update(
            user,
            UserUpdateRequest {
                add_lists: vec![fx.list_x],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn reset_password_hands_out_a_working_temporary_password() -> Result<()> {
    let fx = fixture().await?;
    let user = insert_user(&fx.pool, fx.org_id, &[], &[]).await?;
    let email = fx.services.users.detail(user).await?.user.email;

    let response = fx
        .services
        .users
        .update(
            fx.admin_id,
            UserUpdateRequest {
                id: Some(user),
                reset_password: true,
                ..Default::default()
            },
        )
        .await?;
    let temporary = response.temporary_password.expect("temporary password");
    assert!(response.user.must_change_password);

    let err = fx
        .services
        .users
        .authenticate(&fx.org_code, &email, PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Unauthorized(_)), "{err:?}");
    fx.services.users.authenticate(&fx.org_code, &email, &temporary).await?;

    fx.services
        .users
        .change_password(
            user,
            ChangePasswordRequest {
                current_password: temporary.clone(),
                new_password: "brand-new-secret".to_string(),
            },
        )
        .await?;
    let logged_in = fx
        .services
        .users
        .authenticate("lic0001", &email, "brand-new-secret")
        .await?;
    assert!(!logged_in.must_change_password);

    let err = fx
        .services
        .users
        .change_password(
            user,
            ChangePasswordRequest {
                current_password: temporary,
                new_password: "another-secret".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn leaving_a_list_drops_its_roles() -> Result<()> {
    let fx = fixture().await?;
    let x_role = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 1, &[]).await?;
    let org_role = insert_role(&fx.pool, fx.org_id, None, 1, &[]).await?;
    let user = insert_user(&fx.pool, fx.org_id, &[x_role, org_role], &[fx.list_x]).await?;

    fx.services
        .users
        .update(
            fx.admin_id,
            UserUpdateRequest {
                id: Some(user),
                add_lists: vec![fx.list_y],
                remove_lists: vec![fx.list_x],
                ..Default::default()
            },
        )
        .await?;

    let detail = fx.services.users.detail(user).await?;
    assert_eq!(detail.list_ids, vec![fx.list_y]);
    assert_eq!(detail.role_ids, vec![org_role]);
    Ok(())
}

#[tokio::test]
async fn soft_deleted_users_vanish_and_free_their_email() -> Result<()> {
    let fx = fixture().await?;
    let created = fx
        .services
        .users
        .create(fx.admin_id, new_user("leaver@example.com", vec![], vec![]))
        .await?;
    let id = created.user.id;

    let err = fx.services.users.delete(fx.admin_id, fx.admin_id).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");

    fx.services.users.delete(fx.admin_id, id).await?;
    let err = fx.services.users.get(fx.admin_id, Some(id)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
    assert_eq!(
        count(&fx.pool, &format!("SELECT COUNT(*) FROM users WHERE id = '{}'", id)).await?,
        1
    );

    fx.services
        .users
        .create(fx.admin_id, new_user("leaver@example.com", vec![], vec![]))
        .await?;

    let listed = fx.services.users.list_visible(fx.admin_id, None).await?;
    assert!(listed.iter().all(|u| u.id != id));
    Ok(())
}

#[tokio::test]
async fn list_members_are_listed_per_list() -> Result<()> {
    let fx = fixture().await?;
    let viewer_role = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 2, &[p::VIEW_ALL_USER_LIST]).await?;
    let viewer = insert_user(&fx.pool, fx.org_id, &[viewer_role], &[fx.list_x]).await?;
    let member = insert_user(&fx.pool, fx.org_id, &[], &[fx.list_x]).await?;
    insert_user(&fx.pool, fx.org_id, &[], &[fx.list_y]).await?;

    let listed = fx.services.users.list_visible(viewer, Some(fx.list_x)).await?;
    let ids: Vec<Uuid> = listed.iter().map(|u| u.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&viewer) && ids.contains(&member));

    let err = fx.services.users.list_visible(viewer, Some(fx.list_y)).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    let err = fx.services.users.list_visible(viewer, None).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn list_managers_cannot_manage_users_above_them() -> Result<()> {
    let fx = fixture().await?;
    let manager_role = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 3, &[p::UPDATE_USER_LIST]).await?;
    let manager = insert_user(&fx.pool, fx.org_id, &[manager_role], &[fx.list_x]).await?;
    let junior_role = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 2, &[]).await?;
    let junior = insert_user(&fx.pool, fx.org_id, &[junior_role], &[fx.list_x]).await?;
    sqlx::query("INSERT INTO user_lists (user_id, list_id) VALUES (?, ?)")
        .bind(fx.admin_id.to_string())
        .bind(fx.list_x.to_string())
        .execute(&fx.pool)
        .await?;
    let users = &fx.services.users;

    let err = users
        .update(
            manager,
            UserUpdateRequest {
                id: Some(fx.admin_id),
                reset_password: true,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    users
        .authenticate(&fx.org_code, "admin@lic0001.example", PASSWORD)
        .await?;

    let err = users
        .update(
            manager,
            UserUpdateRequest {
                id: Some(fx.admin_id),
                email: Some("taken-over@example.com".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    assert_eq!(users.detail(fx.admin_id).await?.user.email, "admin@lic0001.example");

    let response = users
        .update(
            manager,
            UserUpdateRequest {
                id: Some(junior),
                reset_password: true,
                ..Default::default()
            },
        )
        .await?;
    assert!(response.temporary_password.is_some());
    Ok(())
}

#[tokio::test]
async fn removing_a_list_cannot_strip_higher_roles() -> Result<()> {
    let fx = fixture().await?;
    let manager_role = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 3, &[p::UPDATE_USER_LIST]).await?;
    let manager = insert_user(&fx.pool, fx.org_id, &[manager_role], &[fx.list_x]).await?;
    let senior_role = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 5, &[]).await?;
    let senior = insert_user(&fx.pool, fx.org_id, &[senior_role], &[fx.list_x]).await?;
    let helper_role = insert_role(&fx.pool, fx.org_id, Some(fx.list_x), 1, &[]).await?;
    let helper = insert_user(&fx.pool, fx.org_id, &[helper_role], &[fx.list_x]).await?;
    let users = &fx.services.users;

    let err = users
        .update(
            manager,
            UserUpdateRequest {
                id: Some(senior),
                remove_lists: vec![fx.list_x],
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    let detail = users.detail(senior).await?;
    assert_eq!(detail.role_ids, vec![senior_role]);
    assert_eq!(detail.list_ids, vec![fx.list_x]);

    users
        .update(
            manager,
            UserUpdateRequest {
                id: Some(helper),
                remove_lists: vec![fx.list_x],
                ..Default::default()
            },
        )
        .await?;
    let detail = users.detail(helper).await?;
    assert!(detail.role_ids.is_empty());
    assert!(detail.list_ids.is_empty());
    Ok(())
}

#[tokio::test]
async fn deleting_users_needs_authority_above_them() -> Result<()> {
    let fx = fixture().await?;
    let deleter_role = insert_role(&fx.pool, fx.org_id, None, 5, &[p::DELETE_USER_ORGANIZATION]).await?;
    let deleter = insert_user(&fx.pool, fx.org_id, &[deleter_role], &[]).await?;
    let peer = insert_user(&fx.pool, fx.org_id, &[deleter_role], &[]).await?;
    let low_role = insert_role(&fx.pool, fx.org_id, None, 1, &[]).await?;
    let low = insert_user(&fx.pool, fx.org_id, &[low_role], &[]).await?;
    let users = &fx.services.users;

    let err = users.delete(deleter, fx.admin_id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    let err = users.delete(deleter, peer).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");

    let err = users.delete_batch(deleter, &[low, fx.admin_id]).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)), "{err:?}");
    assert!(users.detail(low).await.is_ok());
    assert!(users.detail(fx.admin_id).await.is_ok());

    users.delete(deleter, low).await?;
    let err = users.detail(low).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)), "{err:?}");
    Ok(())
}

#[tokio::test]
async fn list_roles_require_membership_of_their_list() -> Result<()> {
    let fx = fixture().await?;
    let y_role = insert_role(&fx.pool, fx.org_id, Some(fx.list_y), 1, &[]).await?;

    let err = fx
        .services
        .users
        .create(fx.admin_id, new_user("stray@example.com", vec![y_role], vec![fx.list_x]))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");
    assert_eq!(
        count(&fx.pool, "SELECT COUNT(*) FROM users WHERE email = 'stray@example.com'").await?,
        0
    );

    let created = fx
        .services
        .users
        .create(fx.admin_id, new_user("stray@example.com", vec![y_role], vec![fx.list_y]))
        .await?;
    assert_eq!(created.role_ids, vec![y_role]);
    Ok(())
}
