use meridian_shared::{BigMapKey, Value};

use crate::{
    error::WorldError,
    world::{ElementKind, ElementTree},
    UserKey,
};

fn user(raw: u64) -> UserKey {
    UserKey::from_u64(raw)
}

#[test]
fn data_bag_stores_and_overwrites_values() {
    let mut tree = ElementTree::new();
    let root = tree.root();
    let marker = tree
        .create(ElementKind::Marker, "beacon", root, None)
        .unwrap();

    let element = tree.get_mut(&marker).unwrap();
    element.set_data("score", Value::Int(10)).unwrap();
    element.set_data("score", Value::Int(25)).unwrap();

    assert_eq!(element.data("score"), Some(&Value::Int(25)));
    assert_eq!(element.remove_data("score"), Some(Value::Int(25)));
    assert_eq!(element.data("score"), None);
}

#[test]
fn data_keys_are_length_checked() {
    let mut tree = ElementTree::new();
    let root = tree.root();
    let marker = tree
        .create(ElementKind::Marker, "beacon", root, None)
        .unwrap();
    let element = tree.get_mut(&marker).unwrap();

    assert_eq!(
        element.set_data("", Value::Nil),
        Err(WorldError::InvalidDataKey)
    );
    // 31 bytes is the limit, inclusive
    let at_limit = "k".repeat(31);
    assert!(element.set_data(&at_limit, Value::Nil).is_ok());
    let over_limit = "k".repeat(32);
    assert_eq!(
        element.set_data(&over_limit, Value::Nil),
        Err(WorldError::InvalidDataKey)
    );
}

#[test]
fn visibility_defaults_to_everyone_and_narrows_to_subscribers() {
    let mut tree = ElementTree::new();
    let root = tree.root();
    let marker = tree
        .create(ElementKind::Marker, "beacon", root, None)
        .unwrap();
    let element = tree.get_mut(&marker).unwrap();

    assert!(element.is_visible_to(&user(1)));
    assert!(element.is_visible_to(&user(2)));

    // the first override switches to an explicit subscriber set
    element.set_visible_to(user(1), true);
    assert!(element.is_visible_to(&user(1)));
    assert!(!element.is_visible_to(&user(2)));

    element.set_visible_to(user(2), true);
    element.set_visible_to(user(1), false);
    assert!(!element.is_visible_to(&user(1)));
    assert!(element.is_visible_to(&user(2)));

    element.clear_visible_to();
    assert!(element.is_visible_to(&user(1)));
}

#[test]
fn player_elements_remember_their_user() {
    let mut tree = ElementTree::new();
    let root = tree.root();
    let player = tree
        .create(ElementKind::Player, "bob", root, Some(user(7)))
        .unwrap();
    let ped = tree.create(ElementKind::Ped, "npc", root, None).unwrap();

    assert_eq!(tree.get(&player).unwrap().user(), Some(user(7)));
    assert_eq!(tree.get(&ped).unwrap().user(), None);
    // players carry ped state so they can occupy vehicle seats
    assert!(tree.get(&player).unwrap().as_ped().is_some());
}
