//! User repository and first-run bootstrap.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use timebill_core::auth::{AuthError, NewUser, Role, UserDirectory, UserPatch};
use timebill_shared::types::{CategoryId, UserId};
use timebill_db::{CollectionStore, RepositoryError, Repositories, bootstrap};
use timebill_shared::FixedClock;
use timebill_shared::config::BootstrapConfig;

fn repositories() -> Repositories {
    let store = CollectionStore::memory().expect("memory store");
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 2, 9, 12, 0, 0).unwrap(),
    ));
    Repositories::new(store, clock)
}

fn admin_config(password: Option<&str>) -> BootstrapConfig {
    BootstrapConfig {
        admin_username: "admin".to_string(),
        admin_email: "admin@timebill.local".to_string(),
        admin_password: password.map(str::to_string),
    }
}

#[tokio::test]
async fn test_bootstrap_creates_admin_once() {
    let repos = repositories();

    let admin = bootstrap(&repos, &admin_config(Some("change-me-now")))
        .await
        .unwrap()
        .expect("admin should be created");
    assert_eq!(admin.role, Role::Admin);

    // Second run finds an existing user and creates nothing.
    let again = bootstrap(&repos, &admin_config(Some("change-me-now")))
        .await
        .unwrap();
    assert!(again.is_none());
    assert_eq!(repos.users.list().await.unwrap().len(), 1);

    let book = repos.ledger.read().await.unwrap();
    assert!(book.category(CategoryId::GENERAL).is_ok());
}

#[tokio::test]
async fn test_bootstrap_without_password_creates_nobody() {
    let repos = repositories();
    let created = bootstrap(&repos, &admin_config(None)).await.unwrap();
    assert!(created.is_none());
    assert!(repos.users.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_authenticate_by_username_or_email() {
    let repos = repositories();
    bootstrap(&repos, &admin_config(Some("change-me-now")))
        .await
        .unwrap();

    let by_name = repos
        .users
        .mutate(|users, now| UserDirectory::authenticate(users, "ADMIN", "change-me-now", now))
        .await
        .unwrap();
    assert!(by_name.last_login_at.is_some());

    let by_email = repos
        .users
        .mutate(|users, now| {
            UserDirectory::authenticate(users, "admin@timebill.local", "change-me-now", now)
        })
        .await;
    assert!(by_email.is_ok());

    let wrong = repos
        .users
        .mutate(|users, now| UserDirectory::authenticate(users, "admin", "nope-nope", now))
        .await;
    assert!(matches!(
        wrong,
        Err(RepositoryError::Auth(AuthError::InvalidCredentials))
    ));

    // last_login_at was persisted by the successful mutation.
    let stored = repos.users.find(by_name.id).await.unwrap();
    assert!(stored.last_login_at.is_some());
}

#[tokio::test]
async fn test_deactivated_user_cannot_log_in() {
    let repos = repositories();
    bootstrap(&repos, &admin_config(Some("change-me-now")))
        .await
        .unwrap();
    let member = repos
        .users
        .mutate(|users, now| {
            UserDirectory::create(
                users,
                NewUser {
                    username: "maria".to_string(),
                    email: "maria@timebill.local".to_string(),
                    password: "s3cret-pass".to_string(),
                    full_name: None,
                    role: None,
                },
                now,
            )
        })
        .await
        .unwrap();
    assert_eq!(member.role, Role::Collaborator);

    repos
        .users
        .mutate(|users, now| {
            UserDirectory::update(
                users,
                member.id,
                UserPatch {
                    is_active: Some(false),
                    ..UserPatch::default()
                },
                now,
            )
        })
        .await
        .unwrap();

    let login = repos
        .users
        .mutate(|users, now| UserDirectory::authenticate(users, "maria", "s3cret-pass", now))
        .await;
    assert!(matches!(login, Err(RepositoryError::Auth(AuthError::Inactive))));
}

#[tokio::test]
async fn test_find_unknown_user() {
    let repos = repositories();
    let missing = repos
        .users
        .find(UserId::new(42))
        .await;
    assert!(matches!(
        missing,
        Err(RepositoryError::Auth(AuthError::NotFound(_)))
    ));
}
