use std::net::SocketAddr;

use glam::Vec3;

use meridian_server::{
    ConnectEvent, DisconnectEvent, ElementKind, Server, ServerConfig, SyncerChangeEvent,
    SyncerChoice, SyncerState, WorldError,
};

fn server() -> Server {
    Server::new(ServerConfig::default())
}

fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

#[test]
fn connecting_creates_a_player_element_and_disconnecting_removes_it() {
    let mut server = server();

    let bob = server.connect_user("bob", addr(4000));
    let element = server.user(&bob).element();
    assert!(server.element_exists(&element));
    assert_eq!(server.element(&element).id(), "bob");
    assert_eq!(server.element(&element).user(), Some(bob));

    let mut events = server.advance_tick();
    assert_eq!(events.read::<ConnectEvent>().collect::<Vec<_>>(), vec![bob]);

    assert!(server.disconnect_user(&bob));
    assert!(!server.element_exists(&element));
    assert!(!server.user_exists(&bob));

    let mut events = server.advance_tick();
    assert_eq!(
        events.read::<DisconnectEvent>().collect::<Vec<_>>(),
        vec![bob]
    );
}

#[test]
fn range_pass_assigns_the_nearest_player_in_range() {
    let mut server = server();
    let root = server.root();

    let bob = server.connect_user("bob", addr(4000));
    let alice = server.connect_user("alice", addr(4001));
    let vehicle = server
        .spawn_element(ElementKind::Vehicle, "taxi", &root)
        .unwrap();

    let bob_element = server.user(&bob).element();
    let alice_element = server.user(&alice).element();
    server
        .element_mut(&bob_element)
        .set_position(Vec3::new(30.0, 0.0, 0.0));
    server
        .element_mut(&alice_element)
        .set_position(Vec3::new(120.0, 0.0, 0.0));

    server.advance_tick();
    assert_eq!(server.element_syncer(&vehicle), Some(bob));

    // bob drives off; alice is still within vehicle range
    server
        .element_mut(&bob_element)
        .set_position(Vec3::new(500.0, 0.0, 0.0));
    let mut events = server.advance_tick();
    assert_eq!(server.element_syncer(&vehicle), Some(alice));
    let changes: Vec<_> = events.read::<SyncerChangeEvent>().collect();
    assert_eq!(changes, vec![(vehicle, SyncerState::Auto(alice))]);

    // everyone out of range
    server
        .element_mut(&alice_element)
        .set_position(Vec3::new(500.0, 500.0, 0.0));
    server.advance_tick();
    assert_eq!(server.element_syncer(&vehicle), None);
}

#[test]
fn explicit_assignment_needs_a_live_user_and_a_syncable_element() {
    let mut server = server();
    let root = server.root();

    let bob = server.connect_user("bob", addr(4000));
    let vehicle = server
        .spawn_element(ElementKind::Vehicle, "taxi", &root)
        .unwrap();
    let marker = server
        .spawn_element(ElementKind::Marker, "beacon", &root)
        .unwrap();

    assert_eq!(
        server.set_element_syncer(&marker, SyncerChoice::User(bob)),
        Err(WorldError::NotSyncable)
    );

    server.disconnect_user(&bob);
    assert_eq!(
        server.set_element_syncer(&vehicle, SyncerChoice::User(bob)),
        Err(WorldError::NoSuchUser)
    );
}

#[test]
fn pinned_vehicle_is_skipped_by_the_range_pass() {
    let mut server = server();
    let root = server.root();

    let bob = server.connect_user("bob", addr(4000));
    let vehicle = server
        .spawn_element(ElementKind::Vehicle, "taxi", &root)
        .unwrap();
    let bob_element = server.user(&bob).element();
    server
        .element_mut(&bob_element)
        .set_position(Vec3::new(10.0, 0.0, 0.0));

    server
        .set_element_syncer(&vehicle, SyncerChoice::None)
        .unwrap();
    server.advance_tick();

    assert_eq!(server.element_syncer(&vehicle), None);
    assert_eq!(
        server.element_syncer_state(&vehicle),
        Some(SyncerState::Unassigned { pinned: true })
    );
}

#[test]
fn last_player_out_of_a_vehicle_becomes_its_syncer() {
    let mut server = server();
    let root = server.root();

    let bob = server.connect_user("bob", addr(4000));
    let alice = server.connect_user("alice", addr(4001));
    let vehicle = server
        .spawn_element(ElementKind::Vehicle, "taxi", &root)
        .unwrap();
    let bob_element = server.user(&bob).element();

    server
        .set_element_syncer(&vehicle, SyncerChoice::User(alice))
        .unwrap();

    server
        .warp_ped_into_vehicle(&bob_element, &vehicle, 0)
        .unwrap();
    server.remove_ped_from_vehicle(&bob_element).unwrap();

    // the occupant override beats the explicit assignment
    assert_eq!(
        server.element_syncer_state(&vehicle),
        Some(SyncerState::Auto(bob))
    );
}

#[test]
fn disconnecting_a_syncer_releases_their_elements() {
    let mut server = server();
    let root = server.root();

    let bob = server.connect_user("bob", addr(4000));
    let vehicle = server
        .spawn_element(ElementKind::Vehicle, "taxi", &root)
        .unwrap();
    server
        .set_element_syncer(&vehicle, SyncerChoice::User(bob))
        .unwrap();

    server.disconnect_user(&bob);

    assert_eq!(server.element_syncer(&vehicle), None);
    assert_eq!(
        server.element_syncer_state(&vehicle),
        Some(SyncerState::Unassigned { pinned: false })
    );
}

#[test]
fn seat_warp_evicts_the_previous_occupant() {
    let mut server = server();
    let root = server.root();

    let bob = server.connect_user("bob", addr(4000));
    let alice = server.connect_user("alice", addr(4001));
    let vehicle = server
        .spawn_element(ElementKind::Vehicle, "taxi", &root)
        .unwrap();
    let bob_element = server.user(&bob).element();
    let alice_element = server.user(&alice).element();

    server
        .warp_ped_into_vehicle(&bob_element, &vehicle, 0)
        .unwrap();
    server
        .warp_ped_into_vehicle(&alice_element, &vehicle, 0)
        .unwrap();

    // alice holds the seat now; bob is back on foot
    assert!(server
        .remove_ped_from_vehicle(&bob_element)
        .is_err());
    assert!(server.remove_ped_from_vehicle(&alice_element).is_ok());
}
