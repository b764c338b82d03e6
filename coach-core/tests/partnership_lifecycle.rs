//! Partnership confirmation handshake against the in-memory service

mod common;

use coach_core::{Error, Partnership, Resource, User};

use common::{fixed_status_client, setup, user};

fn pending(client: &coach_core::Client) -> Partnership {
    Partnership::new(
        client,
        user(client, "partner1", "password"),
        user(client, "partner3", "password"),
    )
    .with_publicvisible(2)
}

#[test]
fn test_new_partnership_state_is_unknown() {
    let (client, service) = setup();
    let before = service.request_count();
    let partnership = pending(&client);

    assert_eq!(partnership.user1_confirmed(), None);
    assert_eq!(partnership.user2_confirmed(), None);
    assert_eq!(partnership.operational(), None);
    assert_eq!(service.request_count(), before);
}

#[test]
fn test_propose_then_confirm() {
    let (client, _) = setup();
    let mut partnership = pending(&client);

    partnership.propose().unwrap();
    assert_eq!(partnership.user1_confirmed(), Some(true));
    assert_ne!(partnership.operational(), Some(true));
    assert!(partnership.exist().unwrap());

    partnership.confirm().unwrap();
    assert_eq!(partnership.user2_confirmed(), Some(true));
    assert_eq!(partnership.operational(), Some(true));

    let fetched = client.get_partnership("partner1", "partner3").unwrap();
    assert_eq!(fetched.operational(), Some(true));
}

#[test]
fn test_two_saves_reach_operational() {
    let (client, _) = setup();
    let mut partnership = pending(&client);

    partnership.save().unwrap();
    assert_eq!(partnership.user1_confirmed(), Some(true));
    assert_ne!(partnership.user2_confirmed(), Some(true));

    partnership.save().unwrap();
    assert_eq!(partnership.operational(), Some(true));
}

#[test]
fn test_save_when_operational_updates_attributes() {
    let (client, _) = setup();
    let mut partnership = Partnership::new(
        &client,
        user(&client, "partner1", "wrong"),
        user(&client, "partner2", "password"),
    );
    partnership.update().unwrap();
    assert_eq!(partnership.operational(), Some(true));

    partnership.publicvisible = Some(1);
    partnership.save().unwrap();
    assert_eq!(partnership.operational(), Some(true));

    let mut fetched = Partnership::new(
        &client,
        user(&client, "partner1", "password"),
        User::new(&client, "partner2"),
    );
    fetched.update().unwrap();
    assert_eq!(fetched.publicvisible, Some(1));
}

#[test]
fn test_flags_follow_member_order() {
    let (client, _) = setup();
    let mut partnership = pending(&client);
    partnership.propose().unwrap();

    let mut reversed = Partnership::new(
        &client,
        user(&client, "partner3", "password"),
        user(&client, "partner1", "password"),
    );
    reversed.update().unwrap();
    assert_eq!(reversed.user1_confirmed(), Some(false));
    assert_eq!(reversed.user2_confirmed(), Some(true));
}

#[test]
fn test_update_rebuilds_subscriptions() {
    let (client, _) = setup();
    let mut partnership = Partnership::new(
        &client,
        user(&client, "user123", "test123"),
        User::new(&client, "user321"),
    );
    partnership.update().unwrap();
    let first = partnership.subscriptions().len();
    assert!(first > 0);

    partnership.update().unwrap();
    assert_eq!(partnership.subscriptions().len(), first);
}

#[test]
fn test_cancel_and_invalidate() {
    let (client, _) = setup();
    let mut partnership = Partnership::new(
        &client,
        user(&client, "partner1", "password"),
        user(&client, "partner2", "password"),
    );

    partnership.invalidate().unwrap();
    assert_eq!(partnership.user2_confirmed(), Some(false));
    assert_ne!(partnership.operational(), Some(true));
    assert!(partnership.exist().unwrap());

    partnership.cancel().unwrap();
    assert_eq!(partnership.user1_confirmed(), Some(false));
    assert!(!partnership.exist().unwrap());
}

#[test]
fn test_delete_operational_partnership() {
    let (client, _) = setup();
    let mut partnership = Partnership::new(
        &client,
        user(&client, "partner1", "password"),
        user(&client, "partner2", "password"),
    );

    assert!(partnership.delete().unwrap());
    assert_eq!(partnership.user1_confirmed(), Some(false));
    assert_eq!(partnership.user2_confirmed(), Some(false));
    assert!(!partnership.exist().unwrap());
}

#[test]
fn test_delete_missing_partnership() {
    let (client, _) = setup();
    let mut partnership = pending(&client);
    assert!(partnership.delete().unwrap_err().is_not_found());
}

#[test]
fn test_propose_without_password_sends_nothing() {
    let (client, service) = setup();
    let mut partnership = Partnership::new(&client, "partner1", "partner3").with_publicvisible(2);
    let before = service.request_count();

    match partnership.propose().unwrap_err() {
        Error::Unauthorized { user: Some(user) } => assert_eq!(user.username(), "partner1"),
        other => panic!("expected Unauthorized, got {:?}", other),
    }
    assert_eq!(service.request_count(), before);
}

#[test]
fn test_propose_with_wrong_password() {
    let (client, _) = setup();
    let mut partnership = Partnership::new(
        &client,
        user(&client, "partner1", "wrong"),
        user(&client, "partner3", "password"),
    )
    .with_publicvisible(2);

    assert!(partnership.propose().unwrap_err().is_unauthorized());
    assert_eq!(partnership.user1_confirmed(), None);
}

#[test]
fn test_propose_without_visibility_is_incomplete() {
    let (client, _) = setup();
    let mut partnership = Partnership::new(
        &client,
        user(&client, "partner1", "password"),
        user(&client, "partner3", "password"),
    );

    match partnership.propose().unwrap_err() {
        Error::IncompleteInformation(resource) => {
            assert_eq!(resource.to_string(), "partnership partner1;partner3")
        }
        other => panic!("expected IncompleteInformation, got {:?}", other),
    }
}

#[test]
fn test_rejected_writes_carry_the_partnership() {
    let client = fixed_status_client(500);
    let mut partnership = Partnership::new(
        &client,
        user(&client, "partner1", "password"),
        user(&client, "partner3", "password"),
    )
    .with_publicvisible(2);

    match partnership.propose().unwrap_err() {
        Error::NotProposed(rejected) => assert_eq!(rejected.to_string(), "partner1;partner3"),
        other => panic!("expected NotProposed, got {:?}", other),
    }
    match partnership.confirm().unwrap_err() {
        Error::NotConfirmed(rejected) => assert_eq!(rejected.user2().username(), "partner3"),
        other => panic!("expected NotConfirmed, got {:?}", other),
    }
}
