//! Integration tests for the users vertical slice
//!
//! Tests account operations including:
//! - Registration with storage-assigned ids
//! - Login verification and session state
//! - Full-record updates and physical deletes
//! - Email uniqueness and credential hashing


use calmwave_core::{CatalogError, Outcome, Secret, UserId};
use calmwave_storage::{CredentialHasher, Session, UserRepository};
use std::time::Instant;
use test_helpers::*;

#[tokio::test]
async fn test_register_then_list_includes_new_record() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    let existing = users
        .register(&new_user("bruno", "bruno@example.com", "pw1"))
        .await
        .unwrap();
    let before: Vec<UserId> = users.list().await.unwrap().iter().map(|u| u.id).collect();

    let payload = new_user("alice", "alice@example.com", "pw2").with_developer_type(3);
    let id = users.register(&payload).await.expect("Failed to register user");

    assert!(!before.contains(&id), "id must be freshly assigned");
    assert_ne!(id, existing);

    let listed = users.list().await.unwrap();
    assert_eq!(listed.len(), before.len() + 1);

    let matching: Vec<_> = listed.iter().filter(|u| u.id == id).collect();
    assert_eq!(matching.len(), 1);

    let alice = matching[0];
    assert_eq!(alice.username, "alice");
    assert_eq!(alice.full_name, "alice Example");
    assert_eq!(alice.phone, "555-0100");
    assert_eq!(alice.email, "alice@example.com");
    assert_eq!(alice.developer_type, 3);
}

#[tokio::test]
async fn test_deleted_ids_are_not_reused() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    let first = users
        .register(&new_user("carla", "carla@example.com", "pw"))
        .await
        .unwrap();
    users.delete(first).await.unwrap();

    let second = users
        .register(&new_user("carla", "carla@example.com", "pw"))
        .await
        .unwrap();

    assert!(second > first);
}

#[tokio::test]
async fn test_credentials_are_stored_hashed() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    let id = users
        .register(&new_user("dora", "dora@example.com", "plain-secret"))
        .await
        .unwrap();

    let stored = stored_credential(test_db.pool(), id).await;
    assert_ne!(stored, "plain-secret");
    assert!(stored.starts_with("$2b$"));
}

#[tokio::test]
async fn test_login_with_matching_credential_loads_session() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    let id = users
        .register(&new_user("eva", "eva@example.com", "correct horse").with_developer_type(1))
        .await
        .unwrap();

    let mut session = Session::new();
    let signed_in = session
        .sign_in(&users, "eva@example.com", &Secret::new("correct horse"))
        .await
        .unwrap();

    assert_eq!(signed_in, Some(id));

    let current = session.current().expect("session should hold the user");
    let stored = users.get(id).await.unwrap().unwrap();
    assert_eq!(current, &stored);
    assert_eq!(current.developer_type, 1);
}

#[tokio::test]
async fn test_login_miss_does_not_touch_session() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    users
        .register(&new_user("fabio", "fabio@example.com", "pw"))
        .await
        .unwrap();

    let mut session = Session::new();
    session
        .sign_in(&users, "fabio@example.com", &Secret::new("pw"))
        .await
        .unwrap();
    let before = session.current().cloned();

    // Wrong credential
    let wrong = session
        .sign_in(&users, "fabio@example.com", &Secret::new("nope"))
        .await
        .unwrap();
    assert_eq!(wrong, None);

    // Unknown email
    let unknown = session
        .sign_in(&users, "ghost@example.com", &Secret::new("pw"))
        .await
        .unwrap();
    assert_eq!(unknown, None);

    assert_eq!(session.current().cloned(), before);

    // A fresh session stays empty
    let mut empty = Session::new();
    empty
        .sign_in(&users, "ghost@example.com", &Secret::new("pw"))
        .await
        .unwrap();
    assert!(!empty.is_signed_in());
}

#[tokio::test]
async fn test_login_error_does_not_touch_session() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    users
        .register(&new_user("gil", "gil@example.com", "pw"))
        .await
        .unwrap();

    let mut session = Session::new();
    session
        .sign_in(&users, "gil@example.com", &Secret::new("pw"))
        .await
        .unwrap();
    let before = session.current().cloned();
    assert!(before.is_some());

    test_db.manager.close().await;

    let err = session
        .sign_in(&users, "gil@example.com", &Secret::new("pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Connection(_)), "got {err:?}");
    assert_eq!(session.current().cloned(), before);
}

#[tokio::test]
async fn test_empty_legacy_credential_never_matches() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    sqlx::query(
        "INSERT INTO desenvolvedores (nome_usuario, nome_completo, telefone, email, senha)
         VALUES ('blank', 'Blank User', '0', 'blank@example.com', '')",
    )
    .execute(test_db.pool())
    .await
    .unwrap();

    assert!(users
        .verify_login("blank@example.com", &Secret::new(""))
        .await
        .unwrap()
        .is_none());
    assert!(users
        .verify_login("blank@example.com", &Secret::new("anything"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_unknown_email_costs_a_hash() {
    let test_db = TestDb::new().await;
    // A cost high enough that one bcrypt round dwarfs the lookup
    let users = UserRepository::new(test_db.manager.clone(), CredentialHasher::new(10));

    users
        .register(&new_user("hana", "hana@example.com", "pw"))
        .await
        .unwrap();

    let started = Instant::now();
    assert!(users
        .verify_login("hana@example.com", &Secret::new("wrong"))
        .await
        .unwrap()
        .is_none());
    let known = started.elapsed();

    let started = Instant::now();
    assert!(users
        .verify_login("nobody@example.com", &Secret::new("wrong"))
        .await
        .unwrap()
        .is_none());
    let unknown = started.elapsed();

    assert!(
        unknown * 4 >= known,
        "unknown email took {unknown:?}, known email took {known:?}"
    );
}

#[tokio::test]
async fn test_login_upgrades_cleartext_rows() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    // Row written the way the legacy application stored credentials
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO desenvolvedores (nome_usuario, nome_completo, telefone, email, senha)
         VALUES ('legacy', 'Legacy User', '0', 'legacy@example.com', '1234')
         RETURNING id_dev",
    )
    .fetch_one(test_db.pool())
    .await
    .unwrap();
    let id = UserId::new(id);

    let user = users
        .verify_login("legacy@example.com", &Secret::new("1234"))
        .await
        .unwrap()
        .expect("cleartext credential should still verify");
    assert_eq!(user.id, id);

    let stored = stored_credential(test_db.pool(), id).await;
    assert!(stored.starts_with("$2b$"), "credential should be rehashed");

    // Still verifies after the upgrade
    assert!(users
        .verify_login("legacy@example.com", &Secret::new("1234"))
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_update_overwrites_every_field() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    let id = users
        .register(&new_user("gil", "gil@example.com", "old"))
        .await
        .unwrap();

    let replacement = calmwave_core::NewUser::new("gilberto", "Gilberto Gil", "555-0199", "gg@example.com")
        .with_credential("new")
        .with_developer_type(2);

    let outcome = users.update(id, &replacement).await.unwrap();
    assert_eq!(outcome, Outcome::Success);

    let stored = users.get(id).await.unwrap().unwrap();
    assert_eq!(stored.id, id);
    assert_eq!(stored.username, "gilberto");
    assert_eq!(stored.full_name, "Gilberto Gil");
    assert_eq!(stored.phone, "555-0199");
    assert_eq!(stored.email, "gg@example.com");
    assert_eq!(stored.developer_type, 2);

    assert!(users
        .verify_login("gg@example.com", &Secret::new("new"))
        .await
        .unwrap()
        .is_some());
    assert!(users
        .verify_login("gg@example.com", &Secret::new("old"))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_update_missing_id_reports_not_found() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    let id = users
        .register(&new_user("hugo", "hugo@example.com", "pw"))
        .await
        .unwrap();
    let before = users.list().await.unwrap();

    let outcome = users
        .update(UserId::new(id.get() + 100), &new_user("x", "x@example.com", "pw"))
        .await
        .unwrap();

    assert_eq!(outcome, Outcome::NotFound);
    assert_eq!(users.list().await.unwrap(), before);
}

#[tokio::test]
async fn test_delete_then_read_is_not_found() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    let id = users
        .register(&new_user("iris", "iris@example.com", "pw"))
        .await
        .unwrap();

    assert_eq!(users.delete(id).await.unwrap(), Outcome::Success);
    assert!(users.get(id).await.unwrap().is_none());

    // Deleting again is not a crash, and is distinguishable from success
    assert_eq!(users.delete(id).await.unwrap(), Outcome::NotFound);
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    users
        .register(&new_user("jo", "shared@example.com", "pw"))
        .await
        .unwrap();
    let other = users
        .register(&new_user("ju", "other@example.com", "pw"))
        .await
        .unwrap();

    let err = users
        .register(&new_user("jo2", "shared@example.com", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Duplicate(_)), "got {err:?}");

    // Updating onto a taken email is rejected the same way
    let err = users
        .update(other, &new_user("ju", "shared@example.com", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Duplicate(_)), "got {err:?}");

    assert_eq!(users.list().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_invalid_registration_is_rejected() {
    let test_db = TestDb::new().await;
    let users = test_db.users();

    let err = users
        .register(&new_user("kim", "not-an-email", "pw"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidInput(_)));

    let err = users
        .register(&new_user("kim", "kim@example.com", ""))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidInput(_)));

    assert!(users.list().await.unwrap().is_empty());
}
