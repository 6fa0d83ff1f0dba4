use crate::context::RequestContext;
use crate::error::{ApplicationError, ErrorKind};
use crate::services::tests::Fixture;
use crate::services::{RegisterUserRequest, UpdateProfileRequest};
use domain::DomainError;

#[tokio::test]
async fn test_register_user() {
    let fixture = Fixture::new();
    let user = fixture.register("alice").await;

    assert_eq!(user.login.as_str(), "alice");
    assert_eq!(user.name, "ALICE");
    assert!(user.image.is_none());
    assert!(user.meta.is_empty());
    assert_eq!(fixture.services.users.find_user("alice").await, Some(user));
}

#[tokio::test]
async fn test_register_duplicate_login_fails() {
    let fixture = Fixture::new();
    fixture.register("alice").await;

    let err = fixture
        .services
        .users
        .register(RegisterUserRequest {
            login: "alice".into(),
            password: "other".into(),
            name: "Impostor".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AlreadyExists);
    let users = fixture.services.users.list_users().await;
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].name, "ALICE");
}

#[tokio::test]
async fn test_register_blank_login_fails() {
    let fixture = Fixture::new();
    let err = fixture
        .services
        .users
        .register(RegisterUserRequest {
            login: "   ".into(),
            password: "pw".into(),
            name: "Nobody".into(),
        })
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert_eq!(fixture.services.directory.user_count(), 0);
}

#[tokio::test]
async fn test_list_users_keeps_registration_order() {
    let fixture = Fixture::new();
    for login in ["carol", "alice", "bob"] {
        fixture.register(login).await;
    }

    let logins: Vec<_> = fixture
        .services
        .users
        .list_users()
        .await
        .into_iter()
        .map(|user| user.login.as_str().to_string())
        .collect();
    assert_eq!(logins, vec!["carol", "alice", "bob"]);
}

#[tokio::test]
async fn test_update_profile_requires_user() {
    let fixture = Fixture::new();
    let err = fixture
        .services
        .users
        .update_profile(
            &RequestContext::anonymous(),
            UpdateProfileRequest {
                name: Some("x".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, ApplicationError::Unauthorized);
}

#[tokio::test]
async fn test_update_profile_writes_fields() {
    let fixture = Fixture::new();
    fixture.register("alice").await;
    let ctx = fixture.ctx("alice");

    let user = fixture
        .services
        .users
        .update_profile(
            &ctx,
            UpdateProfileRequest {
                image: Some("aGVsbG8=".into()),
                name: Some("Alice".into()),
            },
        )
        .await
        .unwrap();

    assert_eq!(user.name, "Alice");
    assert_eq!(user.image.as_deref(), Some("aGVsbG8="));

    // 只改名时头像保持不变
    let user = fixture
        .services
        .users
        .update_profile(
            &ctx,
            UpdateProfileRequest {
                image: None,
                name: Some("Al".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(user.name, "Al");
    assert_eq!(user.image.as_deref(), Some("aGVsbG8="));
}

#[tokio::test]
async fn test_invalid_image_leaves_profile_unchanged() {
    let fixture = Fixture::new();
    fixture.register("alice").await;
    let ctx = fixture.ctx("alice");

    let err = fixture
        .services
        .users
        .update_profile(
            &ctx,
            UpdateProfileRequest {
                image: Some("not base64!".into()),
                name: Some("Renamed".into()),
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::InvalidEncoding { .. })
    ));
    let user = fixture.services.users.find_user("alice").await.unwrap();
    assert_eq!(user.name, "ALICE");
    assert!(user.image.is_none());
}

#[tokio::test]
async fn test_user_meta_latest_value_wins() {
    let fixture = Fixture::new();
    fixture.register("alice").await;
    let ctx = fixture.ctx("alice");
    let users = &fixture.services.users;

    users.upsert_user_meta(&ctx, "theme", "dark").await.unwrap();
    users.upsert_user_meta(&ctx, "lang", "zh").await.unwrap();
    let user = users.upsert_user_meta(&ctx, "theme", "light").await.unwrap();

    assert_eq!(user.meta.get("theme"), Some("light"));
    assert_eq!(user.meta.get("lang"), Some("zh"));
    // 旧值仍然保留在列表中
    assert_eq!(user.meta.len(), 3);
    assert_eq!(user.meta.entries()[0].value, "dark");

    let err = users
        .upsert_user_meta(&RequestContext::anonymous(), "theme", "x")
        .await
        .unwrap_err();
    assert_eq!(err, ApplicationError::Unauthorized);
}

#[tokio::test]
async fn test_context_for_unknown_login_is_anonymous() {
    let fixture = Fixture::new();
    fixture.register("alice").await;

    assert!(fixture.services.users.context_for(Some("ghost")).login().is_none());
    assert!(fixture.services.users.context_for(None).login().is_none());
    assert_eq!(
        fixture
            .services
            .users
            .context_for(Some("alice"))
            .login()
            .map(|login| login.as_str()),
        Some("alice")
    );
}
