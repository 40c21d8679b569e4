use std::{
    fmt,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak},
};

use log::warn;

use super::{
    error::AttributeError,
    map_node::MapNode,
    node::{AttrNode, NodeLinks},
    notifier::Notification,
    owner::{AttrChange, AttributeOwner, VisibilityFlag},
    value::{AttrKey, AttrPath, AttributeValue, FromAttribute, PlainValue},
};

pub(crate) struct ListData {
    pub links: NodeLinks,
    pub items: Vec<AttributeValue>,
}

/// A replicable ordered container.
///
/// `ListNode` is a cheap handle: clones refer to the same live node. While
/// the node is reachable from an owner, every `set`, `append` and `pop`
/// notifies that owner before returning.
#[derive(Clone)]
pub struct ListNode {
    inner: Arc<RwLock<ListData>>,
}

impl ListNode {
    /// Creates an empty, detached ListNode
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(ListData {
                links: NodeLinks::default(),
                items: Vec::new(),
            })),
        }
    }

    pub(crate) fn from_inner(inner: Arc<RwLock<ListData>>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<RwLock<ListData>> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn read_data(&self) -> RwLockReadGuard<'_, ListData> {
        let Ok(data) = self.inner.as_ref().read() else {
            panic!("ListNode lock poisoned");
        };
        data
    }

    pub(crate) fn write_data(&self) -> RwLockWriteGuard<'_, ListData> {
        let Ok(data) = self.inner.as_ref().write() else {
            panic!("ListNode lock poisoned");
        };
        data
    }

    fn as_node(&self) -> AttrNode {
        AttrNode::List(self.clone())
    }

    /// Whether both handles refer to the same node
    pub fn ptr_eq(&self, other: &ListNode) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn len(&self) -> usize {
        self.read_data().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_data().items.is_empty()
    }

    // Reads

    pub fn get(&self, index: usize) -> Result<AttributeValue, AttributeError> {
        self.read_data()
            .items
            .get(index)
            .cloned()
            .ok_or(AttributeError::NotFound {
                key: AttrKey::Index(index),
            })
    }

    pub fn get_as<T: FromAttribute>(&self, index: usize) -> Result<T, AttributeError> {
        let value = self.get(index)?;
        T::read(AttrKey::Index(index), value)
    }

    fn get_or_panic<T: FromAttribute>(&self, index: usize) -> T {
        match self.get_as(index) {
            Ok(value) => value,
            Err(error) => panic!("{}", error),
        }
    }

    /// # Panics
    ///
    /// Panics if `index` is out of range or does not hold an Int.
    /// Use `get_as::<i64>` for non-panicking access.
    pub fn get_int(&self, index: usize) -> i64 {
        self.get_or_panic(index)
    }

    pub fn get_float(&self, index: usize) -> f64 {
        self.get_or_panic(index)
    }

    pub fn get_bool(&self, index: usize) -> bool {
        self.get_or_panic(index)
    }

    pub fn get_str(&self, index: usize) -> String {
        self.get_or_panic(index)
    }

    pub fn get_map(&self, index: usize) -> MapNode {
        self.get_or_panic(index)
    }

    pub fn get_list(&self, index: usize) -> ListNode {
        self.get_or_panic(index)
    }

    // Mutations

    /// Replaces the element at `index`, detaching the container it held
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of range or `value` is a container that is
    /// already attached elsewhere. Consider using `try_set` instead.
    pub fn set(&self, index: usize, value: impl Into<AttributeValue>) {
        if let Err(error) = self.try_set(index, value) {
            panic!("{}", error);
        }
    }

    pub fn try_set(&self, index: usize, value: impl Into<AttributeValue>) -> Result<(), AttributeError> {
        let value = value.into();
        let attr_key = AttrKey::Index(index);
        let this = self.as_node();
        AttrNode::check_attachable(&this, &attr_key, &value)?;

        let previous = {
            let mut data = self.write_data();
            let Some(slot) = data.items.get_mut(index) else {
                return Err(AttributeError::NotFound { key: attr_key });
            };
            std::mem::replace(slot, value.clone())
        };
        AttrNode::detach_value(&previous);
        AttrNode::attach_value(&this, attr_key.clone(), &value);

        if let Some(notification) = Notification::for_node(&this) {
            notification.send(AttrChange::Set {
                path: this.resolve_path(),
                key: attr_key,
                value: value.materialize(),
            });
        }
        Ok(())
    }

    /// Pushes `value` onto the end of the list
    ///
    /// # Panics
    ///
    /// Panics if `value` is a container that is already attached elsewhere.
    /// Consider using `try_append` for non-panicking error handling.
    pub fn append(&self, value: impl Into<AttributeValue>) {
        if let Err(error) = self.try_append(value) {
            panic!("{}", error);
        }
    }

    pub fn try_append(&self, value: impl Into<AttributeValue>) -> Result<(), AttributeError> {
        let value = value.into();
        let this = self.as_node();
        let attr_key = AttrKey::Index(self.len());
        AttrNode::check_attachable(&this, &attr_key, &value)?;

        let index = {
            let mut data = self.write_data();
            data.items.push(value.clone());
            data.items.len() - 1
        };
        AttrNode::attach_value(&this, AttrKey::Index(index), &value);

        if let Some(notification) = Notification::for_node(&this) {
            notification.send(AttrChange::Append {
                path: this.resolve_path(),
                value: value.materialize(),
            });
        }
        Ok(())
    }

    /// Appends a fresh live copy of every plain item, in order. Nested plain
    /// maps and lists become new containers.
    pub fn assign_list(&self, items: &[PlainValue]) {
        for item in items {
            self.append(AttributeValue::from_plain(item));
        }
    }

    /// Removes the last element and hands it back, fully detached
    pub fn pop(&self) -> Option<AttributeValue> {
        let popped = self.write_data().items.pop()?;
        AttrNode::detach_value(&popped);

        let this = self.as_node();
        if let Some(notification) = Notification::for_node(&this) {
            notification.send(AttrChange::Pop {
                path: this.resolve_path(),
            });
        }
        Some(popped)
    }

    /// Removes the first element equal to `value`. Returns whether one was
    /// found.
    ///
    /// Owners are not notified: there is no wire message for removing an
    /// arbitrary list element, so client mirrors keep the stale element.
    pub fn delete(&self, value: &AttributeValue) -> bool {
        let (removed, shifted) = {
            let mut data = self.write_data();
            let Some(index) = data.items.iter().position(|item| item == value) else {
                return false;
            };
            let removed = data.items.remove(index);
            let shifted: Vec<(usize, AttrNode)> = data.items[index..]
                .iter()
                .enumerate()
                .filter_map(|(offset, item)| item.as_node().map(|node| (index + offset, node)))
                .collect();
            (removed, shifted)
        };
        AttrNode::detach_value(&removed);
        for (index, node) in shifted {
            node.rekey(AttrKey::Index(index));
        }

        if self.has_owner() {
            warn!(
                "ListNode at {:?}: deleted element is not replicated to clients",
                self.resolve_path()
            );
        }
        true
    }

    /// Visits elements in order until `f` returns false. Works on a snapshot,
    /// so `f` may read or mutate this list.
    pub fn for_each(&self, mut f: impl FnMut(usize, &AttributeValue) -> bool) {
        let items = self.read_data().items.clone();
        for (index, item) in items.iter().enumerate() {
            if !f(index, item) {
                break;
            }
        }
    }

    // Ownership

    /// Makes `owner` the owner of this root and its whole subtree
    ///
    /// # Panics
    ///
    /// Panics if this node is attached under a parent. Consider using
    /// `try_set_owner` instead.
    pub fn set_owner<O: AttributeOwner + 'static>(&self, owner: &Arc<O>, flag: VisibilityFlag) {
        if let Err(error) = self.try_set_owner(owner, flag) {
            panic!("{}", error);
        }
    }

    pub fn try_set_owner<O: AttributeOwner + 'static>(
        &self,
        owner: &Arc<O>,
        flag: VisibilityFlag,
    ) -> Result<(), AttributeError> {
        let this = self.as_node();
        this.check_root()?;
        let owner: Arc<dyn AttributeOwner> = owner.clone();
        this.set_owner(Some(Arc::downgrade(&owner)), flag);
        Ok(())
    }

    /// Marks this root and every descendant unowned
    ///
    /// # Panics
    ///
    /// Panics if this node is attached under a parent; detach it from the
    /// parent instead. Consider using `try_clear_owner` instead.
    pub fn clear_owner(&self) {
        if let Err(error) = self.try_clear_owner() {
            panic!("{}", error);
        }
    }

    pub fn try_clear_owner(&self) -> Result<(), AttributeError> {
        let this = self.as_node();
        this.check_root()?;
        this.clear_parent();
        Ok(())
    }

    pub fn has_owner(&self) -> bool {
        self.as_node().has_owner()
    }

    pub fn flag(&self) -> VisibilityFlag {
        self.as_node().flag()
    }

    pub fn parent(&self) -> Option<AttrNode> {
        self.as_node().parent()
    }

    pub fn key(&self) -> Option<AttrKey> {
        self.as_node().key()
    }

    pub fn resolve_path(&self) -> AttrPath {
        self.as_node().resolve_path()
    }

    // Materialization

    /// Deep copy of this list into plain values
    pub fn to_list(&self) -> Vec<PlainValue> {
        let items = self.read_data().items.clone();
        items.iter().map(AttributeValue::materialize).collect()
    }
}

impl Default for ListNode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ListNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListNode").field(&self.to_list()).finish()
    }
}
