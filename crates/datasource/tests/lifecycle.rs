//! Handle safety, value semantics and array behavior through the facade.

use datasource::prelude::*;
use datasource_test_utils::{PlayerFixture, Recorder};
use proptest::prelude::*;

#[test]
fn handle_to_recycled_slot_never_resolves() {
    let mut store = Store::default();
    let old = store.find_or_create(Handle::INVALID, "Old");
    store.set(old, 1i32);
    store.destroy(old);

    let new = store.find_or_create(Handle::INVALID, "New");
    assert_eq!(new.id(), old.id(), "slot is recycled");
    assert_ne!(new, old);
    assert!(!store.is_alive(old));
    assert_eq!(store.get::<i32>(old), 0);
    assert!(!store.set(old, 5i32));
    assert_eq!(store.value_kind(new), ValueKind::Void);
}

#[test]
fn destroy_cascades_through_two_levels() {
    let mut store = Store::default();
    let player = PlayerFixture::build(&mut store);
    let labels: Vec<Handle> = player
        .items
        .iter()
        .filter_map(|&item| store.find(item, "Label"))
        .collect();
    assert_eq!(labels.len(), PlayerFixture::ITEM_COUNT);

    store.destroy(player.inventory);
    for h in player.items.iter().chain(&labels) {
        assert!(!store.is_alive(*h));
    }
    assert!(store.children(player.player).all(|c| c != player.inventory));
    assert!(store.is_alive(player.stats));

    store.destroy(player.player);
    for h in player.handles() {
        assert!(!store.is_alive(h));
    }
    assert_eq!(store.pool().live_count(), 1);
}

#[test]
fn equal_writes_raise_no_event() {
    let mut store = Store::default();
    let node = store.find_or_create(Handle::INVALID, "N");
    let recorder = Recorder::new();
    store.bind(node, recorder.callback());

    store.set(node, Text::localized("Hello", "en"));
    store.process_events();
    assert_eq!(recorder.take().len(), 1);

    assert!(!store.set(node, Text::localized("Hello", "en")));
    assert_eq!(store.process_events(), 0);

    assert!(store.set(node, Text::localized("Hello", "fr")));
    assert_eq!(store.process_events(), 1);
}

#[test]
fn kind_is_locked_until_cleared() {
    let mut store = Store::default();
    let node = store.find_or_create(Handle::INVALID, "N");
    store.set(node, 7i32);
    store.process_events();

    assert!(!store.set(node, 1.5f32));
    assert_eq!(store.get::<i32>(node), 7);
    assert_eq!(store.get::<f32>(node), 0.0);
    assert_eq!(store.try_get::<f32>(node), None);
    assert_eq!(store.monitor().pending_len(), 0);

    assert!(store.clear_value(node));
    assert!(store.set(node, 1.5f32));
    assert_eq!(store.value_kind(node), ValueKind::Float);
}

#[test]
fn every_value_kind_round_trips() {
    let mut store = Store::default();
    let n = |store: &mut Store, name: &str| store.find_or_create(Handle::INVALID, name);

    let a = n(&mut store, "Int");
    store.set(a, -3i32);
    let b = n(&mut store, "Bool");
    store.set(b, true);
    let c = n(&mut store, "Name");
    store.set(c, Name::from("hero"));
    let d = n(&mut store, "Image");
    store.set(d, ResourceRef("ui/portrait.png".into()));
    let e = n(&mut store, "Tag");
    store.set(e, GameplayTag("Status.Burning".into()));
    let f = n(&mut store, "Blob");
    store.set(
        f,
        StructBlob {
            type_name: "Vec2".into(),
            bytes: vec![1, 2],
        },
    );

    assert_eq!(store.get::<i32>(a), -3);
    assert!(store.get::<bool>(b));
    assert_eq!(&*store.get::<Name>(c), "hero");
    assert_eq!(store.get::<ResourceRef>(d).0, "ui/portrait.png");
    assert!(store
        .get::<GameplayTag>(e)
        .matches(&GameplayTag("Status".into())));
    assert_eq!(store.get::<StructBlob>(f).bytes, vec![1, 2]);
}

#[test]
fn exhausted_pool_degrades_to_the_sink() {
    let mut store = Store::new(StoreConfig::with_capacity(4)).unwrap();
    let deep = store.find_or_create(Handle::INVALID, "A.B.C");
    assert_eq!(deep, Handle::INVALID);
    assert!(!store.set(deep, 1i32));
    assert_eq!(store.get::<i32>(deep), 0);
    assert_eq!(store.process_events(), 0);

    let b = store.find(Handle::INVALID, "A.B").unwrap();
    assert!(store.make_array(b, false));
    assert_eq!(store.array_append(b), None);
    assert_eq!(store.array_num(b), 0);
}

#[test]
fn array_appends_are_contiguous_and_distinct() {
    let mut store = Store::default();
    let list = store.find_or_create(Handle::INVALID, "List");
    store.make_array(list, false);
    for _ in 0..10 {
        store.array_append(list);
    }
    assert_eq!(store.array_num(list), 10);

    let mut seen = std::collections::HashSet::new();
    for i in 0..10 {
        let child = store.array_child_at(list, i);
        assert!(store.is_alive(child));
        assert_eq!(store.name_of(child), format!("Item#{i}"));
        assert!(seen.insert(child));
    }
}

#[test]
fn array_count_changes_are_observable() {
    let mut store = Store::default();
    let list = store.find_or_create(Handle::INVALID, "List");
    store.make_array(list, false);
    store.process_events();
    let recorder = Recorder::new();
    store.bind(list, recorder.callback());

    store.array_append(list);
    store.array_append_front(list);
    assert_eq!(store.process_events(), 1, "count changes collapse into one event");
    assert_eq!(store.get::<i32>(list), 2);
}

#[test]
fn array_with_a_foreign_count_refuses_appends() {
    let mut store = Store::default();
    let list = store.find_or_create(Handle::INVALID, "List");
    store.make_array(list, false);
    let first = store.array_append(list).unwrap();

    store.clear_value(list);
    assert!(store.set(list, Name::from("oops")));
    assert_eq!(store.array_append(list), None);
    assert_eq!(store.array_append_front(list), None);
    assert_eq!(store.array_num(list), 0);
    assert_eq!(store.value_kind(list), ValueKind::Name);

    store.array_empty(list, false);
    assert_eq!(store.array_append(list), Some(first));
    let second = store.array_append(list).unwrap();
    assert_ne!(second, first);
    assert_eq!(store.array_num(list), 2);
}

proptest! {
    #[test]
    fn one_event_per_changed_node_per_batch(
        writes in proptest::collection::vec((0usize..4, 0i32..3), 0..30),
    ) {
        let mut store = Store::default();
        let nodes: Vec<Handle> = (0..4)
            .map(|i| store.find_or_create(Handle::INVALID, &format!("N{i}")))
            .collect();
        let recorders: Vec<Recorder> = nodes
            .iter()
            .map(|&h| {
                let r = Recorder::new();
                store.bind(h, r.callback());
                r
            })
            .collect();

        let mut current: Vec<Option<i32>> = vec![None; 4];
        let mut changed = [false; 4];
        for (i, v) in writes {
            if current[i] != Some(v) {
                changed[i] = true;
                current[i] = Some(v);
            }
            store.set(nodes[i], v);
        }
        store.process_events();

        for i in 0..4 {
            prop_assert_eq!(recorders[i].len(), usize::from(changed[i]));
            prop_assert_eq!(store.try_get::<i32>(nodes[i]), current[i]);
        }
    }
}
