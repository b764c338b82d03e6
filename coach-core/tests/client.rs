//! Convenience getters and transport behavior of the client

mod common;

use coach_core::{Client, Config, Error, Resource, SportKind, SubscriptionOwner};

use common::{fixed_status_client, setup, user};

#[test]
fn test_get_sport() {
    let (client, _) = setup();
    let sport = client.get_sport(SportKind::Running).unwrap();
    assert_eq!(sport.name(), Some("Running"));
    assert!(sport.id().is_some());
}

#[test]
fn test_get_user_subscription() {
    let (client, _) = setup();
    let subscription = client
        .get_user_subscription(user(&client, "user123", "test123"), SportKind::Running)
        .unwrap();
    assert_eq!(subscription.to_string(), "user123/running");
    assert_eq!(subscription.entries().len(), 3);
    assert!(subscription.datesubscribed().is_some());
}

#[test]
fn test_get_partnership_subscription() {
    let (client, _) = setup();
    let subscription = client
        .get_partnership_subscription(
            user(&client, "user123", "test123"),
            "user321",
            SportKind::Running,
        )
        .unwrap();
    assert!(matches!(subscription.owner(), SubscriptionOwner::Partnership(_)));
    assert_eq!(subscription.entries().len(), 1);
}

#[test]
fn test_missing_subscription() {
    let (client, _) = setup();
    let err = client
        .get_user_subscription("user123", SportKind::Boxing)
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_subscription_exists_check() {
    let (client, _) = setup();
    let subscription = coach_core::Subscription::for_user(&client, "user321", SportKind::Cycling);
    assert!(subscription.exist().unwrap());
    let missing = coach_core::Subscription::for_user(&client, "user321", SportKind::Soccer);
    assert!(!missing.exist().unwrap());
}

#[test]
fn test_unexpected_status_on_read() {
    let client = fixed_status_client(500);
    match client.get_user("user123").unwrap_err() {
        Error::UnexpectedStatus { status, url } => {
            assert_eq!(status, 500);
            assert!(url.ends_with("users/user123"));
        }
        other => panic!("expected UnexpectedStatus, got {:?}", other),
    }
}

#[test]
fn test_demo_config_uses_memory_service() {
    let config = Config {
        demo_mode: true,
        ..Config::default()
    };
    let client = Client::from_config(&config).unwrap();
    assert_eq!(client.transport_name(), "memory");
    assert!(client.get_user("user123").is_ok());
}
