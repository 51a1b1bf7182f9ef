use meridian_server::{
    ElementKind, ResourceStartEvent, ResourceState, ResourceStopEvent, Server, ServerConfig,
    StartFlags, WorldError,
};

fn server() -> Server {
    Server::new(ServerConfig::default())
}

fn load_and_start(server: &mut Server, name: &str) -> meridian_server::ResourceKey {
    let key = server.load_resource(name);
    server.start_resource(&key, false, StartFlags::default()).unwrap();
    key
}

#[test]
fn starting_a_resource_builds_its_scaffold_roots() {
    let mut server = server();
    let key = server.load_resource("freeroam");
    assert_eq!(server.resource(&key).unwrap().state(), ResourceState::Loaded);

    server
        .start_resource(&key, false, StartFlags::default())
        .unwrap();
    // the scaffold exists when the call returns
    assert_eq!(
        server.resource(&key).unwrap().state(),
        ResourceState::Running
    );

    let mut events = server.advance_tick();
    assert_eq!(
        events.read::<ResourceStartEvent>().collect::<Vec<_>>(),
        vec![key]
    );

    let resource = server.resource(&key).unwrap();
    let map_root = resource.map_root().unwrap();
    let dynamic_root = resource.dynamic_root().unwrap();
    assert_eq!(server.element(&map_root).id(), "freeroam:map");
    assert_eq!(server.element(&dynamic_root).id(), "freeroam:dynamic");
    assert_eq!(server.element(&map_root).parent(), Some(server.root()));
}

#[test]
fn stop_is_queued_and_elements_survive_until_the_tick() {
    let mut server = server();
    let key = load_and_start(&mut server, "freeroam");

    let vehicle = server
        .spawn_element_in_resource(&key, ElementKind::Vehicle, "taxi")
        .unwrap();

    server.stop_resource(&key).unwrap();
    // same call frame: the world is untouched
    assert_eq!(
        server.resource(&key).unwrap().state(),
        ResourceState::Stopping
    );
    assert!(server.element_exists(&vehicle));

    let mut events = server.advance_tick();
    assert_eq!(
        events.read::<ResourceStopEvent>().collect::<Vec<_>>(),
        vec![key]
    );
    assert!(!server.element_exists(&vehicle));
    assert_eq!(server.resource(&key).unwrap().state(), ResourceState::Loaded);
    assert!(server.resource(&key).unwrap().dynamic_root().is_none());
}

#[test]
fn restart_stops_then_starts_within_one_tick() {
    let mut server = server();
    let key = load_and_start(&mut server, "freeroam");
    let old_dynamic = server.resource(&key).unwrap().dynamic_root().unwrap();

    server.restart_resource(&key).unwrap();
    let mut events = server.advance_tick();

    // both transitions land in the same batch, stop first
    assert!(events.read::<ResourceStopEvent>().next().is_some());
    assert!(events.read::<ResourceStartEvent>().next().is_some());

    let resource = server.resource(&key).unwrap();
    assert_eq!(resource.state(), ResourceState::Running);
    let new_dynamic = resource.dynamic_root().unwrap();
    assert_ne!(new_dynamic, old_dynamic);
    assert!(!server.element_exists(&old_dynamic));
}

#[test]
fn invalid_and_duplicate_names_park_the_resource_as_failed() {
    let mut server = server();

    let bad = server.load_resource("no spaces allowed");
    let resource = server.resource(&bad).unwrap();
    assert_eq!(resource.state(), ResourceState::FailedToLoad);
    assert_eq!(resource.failure_reason(), Some("invalid resource name"));
    assert_eq!(
        server.start_resource(&bad, false, StartFlags::default()),
        Err(WorldError::InvalidState(ResourceState::FailedToLoad))
    );

    let first = server.load_resource("freeroam");
    let second = server.load_resource("freeroam");
    assert_eq!(server.resource(&first).unwrap().state(), ResourceState::Loaded);
    assert_eq!(
        server.resource(&second).unwrap().state(),
        ResourceState::FailedToLoad
    );
    assert_eq!(
        server.resource(&second).unwrap().failure_reason(),
        Some("duplicate resource name")
    );
    assert_eq!(server.find_resource("freeroam"), Some(first));
}

#[test]
fn lifecycle_transitions_reject_wrong_states() {
    let mut server = server();
    let key = server.load_resource("freeroam");

    assert_eq!(
        server.stop_resource(&key),
        Err(WorldError::InvalidState(ResourceState::Loaded))
    );
    assert_eq!(
        server.restart_resource(&key),
        Err(WorldError::InvalidState(ResourceState::Loaded))
    );

    server
        .start_resource(&key, false, StartFlags::default())
        .unwrap();
    assert_eq!(
        server.start_resource(&key, false, StartFlags::default()),
        Err(WorldError::InvalidState(ResourceState::Running))
    );
}

#[test]
fn acl_requests_are_recorded_as_pending() {
    let mut server = server();
    let key = server.load_resource("admin_tools");

    let pending = server
        .request_acl_right(&key, "function.kickPlayer", true)
        .unwrap();
    assert!(pending);

    let resource = server.resource(&key).unwrap();
    assert_eq!(resource.acl_requests().len(), 1);
    assert_eq!(resource.acl_requests()[0].right, "function.kickPlayer");
    assert!(resource.acl_requests()[0].pending);
}
