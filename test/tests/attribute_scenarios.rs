//! End-to-end attribute replication scenarios
//!
//! A RecordingOwner stands in for the entity: every mutation on an owned
//! tree must reach it exactly once, in call order, before the call returns.

use meridian_shared::{
    AttrChange, AttrKey, AttrNode, AttributeValue, ListNode, MapNode, PlainValue, VisibilityFlag,
};
use meridian_test::{assert_paths_consistent, owned_root};

#[test]
fn list_append_append_pop() {
    let (owner, root) = owned_root(VisibilityFlag::ALL_CLIENTS);
    let list = ListNode::new();
    root.set("list", list.clone());
    owner.take();

    list.append(5);
    list.append("x");
    let popped = list.pop();

    assert_eq!(popped, Some(AttributeValue::from("x")));
    assert_eq!(list.to_list(), vec![PlainValue::Int(5)]);
    assert_eq!(
        owner.take(),
        vec![
            AttrChange::Append {
                path: vec![AttrKey::from("list")],
                value: PlainValue::Int(5),
            },
            AttrChange::Append {
                path: vec![AttrKey::from("list")],
                value: PlainValue::from("x"),
            },
            AttrChange::Pop {
                path: vec![AttrKey::from("list")],
            },
        ]
    );
}

#[test]
fn map_set_twice() {
    let (owner, root) = owned_root(VisibilityFlag::OWN_CLIENT);

    root.set("hp", 100);
    root.set("hp", 80);

    assert_eq!(root.get("hp"), Ok(AttributeValue::Int(80)));
    let values: Vec<PlainValue> = owner
        .take()
        .into_iter()
        .map(|change| match change {
            AttrChange::Set { key, value, .. } => {
                assert_eq!(key, AttrKey::from("hp"));
                value
            }
            other => panic!("unexpected change {:?}", other),
        })
        .collect();
    assert_eq!(values, vec![PlainValue::Int(100), PlainValue::Int(80)]);
}

#[test]
fn flag_is_forwarded_with_every_change() {
    let (owner, root) = owned_root(VisibilityFlag::OWN_CLIENT);
    let list = ListNode::new();
    root.set("list", list.clone());
    list.append(1);
    list.pop();

    assert_eq!(owner.flags(), vec![VisibilityFlag::OWN_CLIENT; 3]);
}

#[test]
fn popped_subtree_is_fully_unowned_and_reusable() {
    let (owner, root) = owned_root(VisibilityFlag::ALL_CLIENTS);
    let list = ListNode::new();
    root.set("list", list.clone());

    let item = MapNode::new();
    let nested = ListNode::new();
    nested.append(MapNode::new());
    item.set("nested", nested.clone());
    list.append(item.clone());
    assert!(nested.get_map(0).has_owner());

    let Some(AttributeValue::Map(popped)) = list.pop() else {
        panic!("expected the map back");
    };
    assert!(popped.ptr_eq(&item));
    assert!(!item.has_owner());
    assert!(!nested.has_owner());
    assert!(!nested.get_map(0).has_owner());
    assert!(item.parent().is_none());

    // reattach elsewhere under a different owner and flag
    owner.take();
    let (other_owner, other_root) = owned_root(VisibilityFlag::OWN_CLIENT);
    other_root.set("moved", item.clone());
    for (node, _) in meridian_test::collect_nodes(&AttrNode::Map(item.clone())) {
        assert!(node.has_owner());
        assert_eq!(node.flag(), VisibilityFlag::OWN_CLIENT);
    }
    assert_paths_consistent!(AttrNode::Map(other_root.clone()));

    nested.append(7);
    assert!(owner.is_empty());
    assert_eq!(
        other_owner.take().last(),
        Some(&AttrChange::Append {
            path: vec![AttrKey::from("moved"), AttrKey::from("nested")],
            value: PlainValue::Int(7),
        })
    );
}

#[test]
fn entity_destruction_clears_whole_tree() {
    let (owner, root) = owned_root(VisibilityFlag::ALL_CLIENTS);
    let list = ListNode::new();
    let inner = MapNode::new();
    list.append(inner.clone());
    root.set("list", list.clone());
    owner.take();

    root.clear_owner();

    for node in [
        AttrNode::Map(root.clone()),
        AttrNode::List(list.clone()),
        AttrNode::Map(inner.clone()),
    ] {
        assert!(!node.has_owner());
        assert_eq!(node.flag(), VisibilityFlag::NONE);
    }
    inner.set("after", true);
    list.append(1);
    assert!(owner.is_empty());
}

#[test]
fn materialized_snapshot_is_independent() {
    let (_owner, root) = owned_root(VisibilityFlag::ALL_CLIENTS);
    let bag = ListNode::new();
    bag.append("sword");
    root.set("bag", bag.clone());

    let PlainValue::Map(mut snapshot) = AttrNode::Map(root.clone()).materialize() else {
        panic!("expected a plain map");
    };
    if let Some(PlainValue::List(items)) = snapshot.get_mut("bag") {
        items.push(PlainValue::from("shield"));
    }
    snapshot.insert("gold".to_string(), PlainValue::Int(10));

    assert_eq!(bag.len(), 1);
    assert!(!root.has_key("gold"));

    bag.append("bow");
    assert_eq!(
        snapshot.get("bag"),
        Some(&PlainValue::List(vec![
            PlainValue::from("sword"),
            PlainValue::from("shield")
        ]))
    );
}

#[test]
fn assigning_plain_state_replicates_field_by_field() {
    let (owner, root) = owned_root(VisibilityFlag::OWN_CLIENT);
    let plain = PlainValue::Map(
        [
            ("bag".to_string(), PlainValue::List(vec![PlainValue::Int(1)])),
            ("hp".to_string(), PlainValue::Int(100)),
        ]
        .into(),
    );
    let PlainValue::Map(fields) = &plain else {
        unreachable!();
    };

    root.assign_map(fields);

    let changes = owner.take();
    assert_eq!(changes.len(), 2);
    assert!(changes
        .iter()
        .all(|change| matches!(change, AttrChange::Set { path, .. } if path.is_empty())));
    assert_eq!(AttrNode::Map(root.clone()).materialize(), plain);
    assert!(root.get_list("bag").has_owner());
    assert_paths_consistent!(AttrNode::Map(root.clone()));
}
