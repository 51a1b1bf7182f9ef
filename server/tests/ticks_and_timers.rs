use std::{cell::RefCell, rc::Rc};

use meridian_server::{
    ElementKind, EventPriority, RemoteOutcome, RemoteResponseEvent, RequestOptions, Server,
    ServerConfig, TickEvent,
};
use meridian_shared::Value;

fn server() -> Server {
    Server::new(ServerConfig::default())
}

#[test]
fn every_advance_produces_exactly_one_tick_event() {
    let mut server = server();
    assert_eq!(server.current_tick(), 0);

    let mut events = server.advance_tick();
    assert_eq!(events.read::<TickEvent>().collect::<Vec<_>>(), vec![1]);
    let mut events = server.advance_tick();
    assert_eq!(events.read::<TickEvent>().collect::<Vec<_>>(), vec![2]);
    assert_eq!(server.current_tick(), 2);
}

#[test]
fn timers_fire_named_events_on_their_anchor() {
    let mut server = server();
    let root = server.root();
    let marker = server
        .spawn_element(ElementKind::Marker, "beacon", &root)
        .unwrap();

    let pulses = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&pulses);
    server
        .add_event_handler(
            "on_pulse",
            &root,
            EventPriority::Normal,
            true,
            move |context| {
                sink.borrow_mut().push(context.args().to_vec());
            },
        )
        .unwrap();

    server
        .set_timer("on_pulse", &marker, 2, Some(2), vec![Value::Int(9)])
        .unwrap();

    server.advance_tick();
    assert!(pulses.borrow().is_empty());
    server.advance_tick();
    assert_eq!(pulses.borrow().len(), 1);
    assert_eq!(pulses.borrow()[0], vec![Value::Int(9)]);

    server.advance_tick();
    server.advance_tick();
    assert_eq!(pulses.borrow().len(), 2);

    // both repeats are spent
    server.advance_tick();
    server.advance_tick();
    assert_eq!(pulses.borrow().len(), 2);
}

#[test]
fn destroying_the_anchor_silences_its_timers() {
    let mut server = server();
    let root = server.root();
    let marker = server
        .spawn_element(ElementKind::Marker, "beacon", &root)
        .unwrap();

    let pulses = Rc::new(RefCell::new(0));
    let sink = Rc::clone(&pulses);
    server
        .add_event_handler("on_pulse", &root, EventPriority::Normal, true, move |_| {
            *sink.borrow_mut() += 1;
        })
        .unwrap();
    server
        .set_timer("on_pulse", &marker, 1, None, Vec::new())
        .unwrap();

    server.advance_tick();
    assert_eq!(*pulses.borrow(), 1);

    server.destroy_element(&marker).unwrap();
    server.advance_tick();
    server.advance_tick();
    assert_eq!(*pulses.borrow(), 1);
}

#[test]
fn remote_request_times_out_after_its_attempts() {
    let mut server = server();

    let key = server.start_remote_request(
        "http://updates.example/check",
        Some(RequestOptions {
            attempts: 2,
            timeout: 2,
        }),
    );
    assert!(server.remote_request_pending(&key));

    for _ in 0..3 {
        let events = server.advance_tick();
        assert!(!events.has::<RemoteResponseEvent>());
    }

    let mut events = server.advance_tick();
    assert!(!server.remote_request_pending(&key));
    assert_eq!(
        events.read::<RemoteResponseEvent>().collect::<Vec<_>>(),
        vec![(key, RemoteOutcome::TimedOut)]
    );
}

#[test]
fn completed_request_delivers_its_payload() {
    let mut server = server();

    let key = server.start_remote_request("http://updates.example/check", None);
    assert!(server.complete_remote_request(&key, Value::from("ok")));
    assert!(!server.remote_request_pending(&key));

    let mut events = server.advance_tick();
    assert_eq!(
        events.read::<RemoteResponseEvent>().collect::<Vec<_>>(),
        vec![(key, RemoteOutcome::Completed(Value::from("ok")))]
    );
}

#[test]
fn aborted_request_never_reports_back() {
    let mut server = server();

    let key = server.start_remote_request(
        "http://updates.example/check",
        Some(RequestOptions {
            attempts: 1,
            timeout: 1,
        }),
    );
    assert!(server.abort_remote_request(&key));

    let events = server.advance_tick();
    assert!(!events.has::<RemoteResponseEvent>());
}
