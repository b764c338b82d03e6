//! Credential resolution and authentication checks

mod common;

use coach_core::{CredentialResolver, Error, User};

use common::{setup, user};

#[test]
fn test_user_authentication() {
    let (client, _) = setup();
    assert!(user(&client, "user123", "test123").authenticated().unwrap());
    assert!(!user(&client, "user123", "wrong").authenticated().unwrap());
    assert!(!user(&client, "ghost", "test123").authenticated().unwrap());
}

#[test]
fn test_resolve_skips_invalid_candidate() {
    let (client, _) = setup();
    let invalid = user(&client, "user123", "wrong");
    let valid = user(&client, "user321", "test321");

    let resolved = CredentialResolver::new(&client)
        .resolve(&[&invalid, &valid])
        .unwrap();
    assert_eq!(resolved.username(), "user321");
}

#[test]
fn test_resolve_prefers_first_valid_candidate() {
    let (client, service) = setup();
    let first = user(&client, "user123", "test123");
    let second = user(&client, "user321", "test321");
    let before = service.request_count();

    let resolved = CredentialResolver::new(&client)
        .resolve(&[&first, &second])
        .unwrap();
    assert_eq!(resolved.username(), "user123");
    assert_eq!(service.request_count(), before + 1);
}

#[test]
fn test_resolve_without_valid_candidate() {
    let (client, _) = setup();
    let first = user(&client, "user123", "wrong");
    let second = user(&client, "user321", "wrong");

    match CredentialResolver::new(&client).resolve(&[&first, &second]) {
        Err(Error::Unauthorized { user: Some(rejected) }) => {
            assert_eq!(rejected.username(), "user321")
        }
        other => panic!("expected Unauthorized, got {:?}", other),
    }
}

#[test]
fn test_resolve_without_password_makes_no_request() {
    let (client, service) = setup();
    let anonymous = User::new(&client, "user123");
    let before = service.request_count();

    let err = CredentialResolver::new(&client)
        .resolve(&[&anonymous])
        .unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(service.request_count(), before);
}

#[test]
fn test_resolve_or_last_falls_back_to_second() {
    let (client, _) = setup();
    let first = user(&client, "user123", "wrong");
    let second = user(&client, "user321", "wrong");

    let resolved = CredentialResolver::new(&client)
        .resolve_or_last(&[&first, &second])
        .unwrap();
    assert_eq!(resolved.username(), "user321");
}

#[test]
fn test_credentials_never_logged_in_debug() {
    let (client, _) = setup();
    let debug = format!("{:?}", user(&client, "user123", "test123").credential());
    assert!(debug.contains("user123"));
    assert!(!debug.contains("test123"));
}
