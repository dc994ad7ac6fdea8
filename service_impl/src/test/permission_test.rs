use mockall::predicate::eq;
use service::permission::Authentication;
use service::PermissionService;

use crate::permission::PermissionServiceImpl;
use crate::test::error_test::*;
use crate::user_service::{UserServiceDev, DEV_USER};

fn build_service(
    grant: bool,
    privilege: &'static str,
) -> PermissionServiceImpl<dao::MockPermissionDao, service::user_service::MockUserService> {
    let mut permission_dao = dao::MockPermissionDao::new();
    permission_dao
        .expect_has_privilege()
        .with(eq("TESTUSER"), eq(privilege))
        .returning(move |_, _| Ok(grant));

    let mut user_service = service::user_service::MockUserService::new();
    user_service
        .expect_current_user()
        .returning(|_| Ok("TESTUSER".into()));

    PermissionServiceImpl::new(permission_dao.into(), user_service.into())
}

#[tokio::test]
async fn test_check_permission() {
    let permission_service = build_service(true, "hello");
    let result = permission_service.check_permission("hello", ().auth()).await;
    result.expect("Expected successful authorization");
}

#[tokio::test]
async fn test_check_permission_denied() {
    let permission_service = build_service(false, "hello");
    let result = permission_service.check_permission("hello", ().auth()).await;
    test_forbidden(&result);
}

#[tokio::test]
async fn test_check_permission_full_authentication_skips_dao() {
    // No expectations registered, the dao must never be consulted.
    let permission_dao = dao::MockPermissionDao::new();
    let user_service = service::user_service::MockUserService::new();
    let permission_service =
        PermissionServiceImpl::new(permission_dao.into(), user_service.into());

    let result = permission_service
        .check_permission("hello", Authentication::Full)
        .await;
    result.expect("Expected full authentication to pass");
}

#[tokio::test]
async fn test_user_service_dev() {
    use service::user_service::UserService;
    let user_service = UserServiceDev;
    assert_eq!(
        DEV_USER,
        user_service.current_user(()).await.unwrap().as_ref()
    );
}
