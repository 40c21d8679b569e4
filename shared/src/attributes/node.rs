use std::sync::{RwLock, Weak};

use super::{
    error::AttributeError,
    list_node::{ListData, ListNode},
    map_node::{MapData, MapNode},
    owner::{AttributeOwner, VisibilityFlag},
    value::{AttrKey, AttrPath, AttributeValue, PlainValue},
};

pub(crate) type OwnerRef = Weak<dyn AttributeOwner>;

/// Upward bookkeeping carried by every container node. Every reference here
/// is weak; ownership of the tree only ever points downward.
#[derive(Default)]
pub(crate) struct NodeLinks {
    pub owner: Option<OwnerRef>,
    pub parent: Option<ParentRef>,
    pub key: Option<AttrKey>,
    pub flag: VisibilityFlag,
    pub path: Option<AttrPath>,
}

impl NodeLinks {
    /// Whether the node still sits under a live parent or a live owner.
    /// Links whose target has been dropped do not count.
    fn is_linked(&self) -> bool {
        self.live_parent_key().is_some()
            || self.owner.as_ref().is_some_and(|owner| owner.strong_count() > 0)
    }

    fn live_parent_key(&self) -> Option<AttrKey> {
        match &self.parent {
            Some(parent) if parent.is_alive() => self.key.clone(),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub(crate) enum ParentRef {
    Map(Weak<RwLock<MapData>>),
    List(Weak<RwLock<ListData>>),
}

impl ParentRef {
    fn is_alive(&self) -> bool {
        match self {
            ParentRef::Map(weak) => weak.strong_count() > 0,
            ParentRef::List(weak) => weak.strong_count() > 0,
        }
    }

    fn upgrade(&self) -> Option<AttrNode> {
        match self {
            ParentRef::Map(weak) => weak.upgrade().map(|inner| AttrNode::Map(MapNode::from_inner(inner))),
            ParentRef::List(weak) => weak
                .upgrade()
                .map(|inner| AttrNode::List(ListNode::from_inner(inner))),
        }
    }
}

/// Handle to a container node of either kind
#[derive(Clone, Debug)]
pub enum AttrNode {
    Map(MapNode),
    List(ListNode),
}

impl AttrNode {
    pub fn kind(&self) -> &'static str {
        match self {
            AttrNode::Map(_) => "MapNode",
            AttrNode::List(_) => "ListNode",
        }
    }

    /// Key of this node inside its parent, `None` when detached
    pub fn key(&self) -> Option<AttrKey> {
        self.read_links(|links| links.key.clone())
    }

    /// The immediately enclosing container, `None` at the root or when
    /// detached
    pub fn parent(&self) -> Option<AttrNode> {
        self.read_links(|links| links.parent.clone())
            .and_then(|parent| parent.upgrade())
    }

    pub fn has_owner(&self) -> bool {
        self.read_links(|links| links.owner.is_some())
    }

    pub fn flag(&self) -> VisibilityFlag {
        self.read_links(|links| links.flag)
    }

    pub fn ptr_eq(&self, other: &AttrNode) -> bool {
        match (self, other) {
            (AttrNode::Map(a), AttrNode::Map(b)) => a.ptr_eq(b),
            (AttrNode::List(a), AttrNode::List(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub fn materialize(&self) -> PlainValue {
        match self {
            AttrNode::Map(node) => PlainValue::Map(node.to_map()),
            AttrNode::List(node) => PlainValue::List(node.to_list()),
        }
    }

    /// Keys from the tree root down to this node. Cached until the node is
    /// detached, re-attached or re-keyed.
    pub fn resolve_path(&self) -> AttrPath {
        let (cached, parent, key, owner) = self.read_links(|links| {
            (
                links.path.clone(),
                links.parent.clone(),
                links.key.clone(),
                links.owner.clone(),
            )
        });
        if let Some(path) = cached {
            return path;
        }

        let path = match (parent.and_then(|parent| parent.upgrade()), key) {
            (Some(parent), Some(key)) => {
                let mut path = parent.resolve_path();
                path.push(key);
                path
            }
            _ => owner
                .and_then(|owner| owner.upgrade())
                .map(|owner| owner.root_path())
                .unwrap_or_default(),
        };

        self.write_links(|links| links.path = Some(path.clone()));
        path
    }

    // Tree bookkeeping

    pub(crate) fn downgrade(&self) -> ParentRef {
        match self {
            AttrNode::Map(node) => ParentRef::Map(node.downgrade()),
            AttrNode::List(node) => ParentRef::List(node.downgrade()),
        }
    }

    pub(crate) fn owner_and_flag(&self) -> (Option<OwnerRef>, VisibilityFlag) {
        self.read_links(|links| (links.owner.clone(), links.flag))
    }

    /// Fails when `value` is a container that is already linked somewhere,
    /// or when placing it under `container` would make it its own ancestor
    pub(crate) fn check_attachable(
        container: &AttrNode,
        key: &AttrKey,
        value: &AttributeValue,
    ) -> Result<(), AttributeError> {
        let Some(child) = value.as_node() else {
            return Ok(());
        };
        if child.read_links(NodeLinks::is_linked) || child.is_ancestor_or_self_of(container) {
            return Err(AttributeError::OwnershipViolation {
                kind: child.kind(),
                key: key.clone(),
            });
        }
        Ok(())
    }

    /// Fails when this node sits inside a live parent. Only tree roots take
    /// or drop an owner directly.
    pub(crate) fn check_root(&self) -> Result<(), AttributeError> {
        match self.read_links(NodeLinks::live_parent_key) {
            Some(key) => Err(AttributeError::OwnershipViolation {
                kind: self.kind(),
                key,
            }),
            None => Ok(()),
        }
    }

    /// Links `value` under `container` at `key` when it is a container,
    /// stamping the container's owner and flag on the whole subtree
    pub(crate) fn attach_value(container: &AttrNode, key: AttrKey, value: &AttributeValue) {
        if let Some(child) = value.as_node() {
            let (owner, flag) = container.owner_and_flag();
            child.set_parent(container.downgrade(), key, owner, flag);
        }
    }

    pub(crate) fn detach_value(value: &AttributeValue) {
        if let Some(child) = value.as_node() {
            child.clear_parent();
        }
    }

    pub(crate) fn set_parent(
        &self,
        parent: ParentRef,
        key: AttrKey,
        owner: Option<OwnerRef>,
        flag: VisibilityFlag,
    ) {
        self.write_links(|links| {
            links.parent = Some(parent);
            links.key = Some(key);
        });
        self.set_owner(owner, flag);
    }

    pub(crate) fn clear_parent(&self) {
        self.write_links(|links| {
            links.parent = None;
            links.key = None;
        });
        self.clear_owner();
    }

    pub(crate) fn set_owner(&self, owner: Option<OwnerRef>, flag: VisibilityFlag) {
        self.write_links(|links| {
            links.owner = owner.clone();
            links.flag = flag;
            links.path = None;
        });
        for child in self.child_nodes() {
            child.set_owner(owner.clone(), flag);
        }
    }

    pub(crate) fn clear_owner(&self) {
        self.write_links(|links| {
            links.owner = None;
            links.flag = VisibilityFlag::NONE;
            links.path = None;
        });
        for child in self.child_nodes() {
            child.clear_owner();
        }
    }

    /// Moves this node to a new key inside the same parent
    pub(crate) fn rekey(&self, key: AttrKey) {
        self.write_links(|links| links.key = Some(key));
        self.invalidate_path();
    }

    fn invalidate_path(&self) {
        self.write_links(|links| links.path = None);
        for child in self.child_nodes() {
            child.invalidate_path();
        }
    }

    fn is_ancestor_or_self_of(&self, other: &AttrNode) -> bool {
        let mut cursor = Some(other.clone());
        while let Some(node) = cursor {
            if node.ptr_eq(self) {
                return true;
            }
            cursor = node.parent();
        }
        false
    }

    fn child_nodes(&self) -> Vec<AttrNode> {
        match self {
            AttrNode::Map(node) => node
                .read_data()
                .items
                .values()
                .filter_map(AttributeValue::as_node)
                .collect(),
            AttrNode::List(node) => node
                .read_data()
                .items
                .iter()
                .filter_map(AttributeValue::as_node)
                .collect(),
        }
    }

    fn read_links<R>(&self, f: impl FnOnce(&NodeLinks) -> R) -> R {
        match self {
            AttrNode::Map(node) => f(&node.read_data().links),
            AttrNode::List(node) => f(&node.read_data().links),
        }
    }

    fn write_links<R>(&self, f: impl FnOnce(&mut NodeLinks) -> R) -> R {
        match self {
            AttrNode::Map(node) => f(&mut node.write_data().links),
            AttrNode::List(node) => f(&mut node.write_data().links),
        }
    }
}
