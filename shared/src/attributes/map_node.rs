use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak},
};

use super::{
    error::AttributeError,
    list_node::ListNode,
    node::{AttrNode, NodeLinks},
    notifier::Notification,
    owner::{AttrChange, AttributeOwner, VisibilityFlag},
    value::{AttrKey, AttrPath, AttributeValue, FromAttribute, PlainValue},
};

pub(crate) struct MapData {
    pub links: NodeLinks,
    pub items: HashMap<String, AttributeValue>,
}

/// A replicable string-keyed container.
///
/// `MapNode` is a cheap handle: clones refer to the same live node. While
/// the node is reachable from an owner, every `set`, `delete` and `pop`
/// notifies that owner before returning.
#[derive(Clone)]
pub struct MapNode {
    inner: Arc<RwLock<MapData>>,
}

impl MapNode {
    /// Creates an empty, detached MapNode
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MapData {
                links: NodeLinks::default(),
                items: HashMap::new(),
            })),
        }
    }

    pub(crate) fn from_inner(inner: Arc<RwLock<MapData>>) -> Self {
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> Weak<RwLock<MapData>> {
        Arc::downgrade(&self.inner)
    }

    pub(crate) fn read_data(&self) -> RwLockReadGuard<'_, MapData> {
        let Ok(data) = self.inner.as_ref().read() else {
            panic!("MapNode lock poisoned");
        };
        data
    }

    pub(crate) fn write_data(&self) -> RwLockWriteGuard<'_, MapData> {
        let Ok(data) = self.inner.as_ref().write() else {
            panic!("MapNode lock poisoned");
        };
        data
    }

    fn as_node(&self) -> AttrNode {
        AttrNode::Map(self.clone())
    }

    /// Whether both handles refer to the same node
    pub fn ptr_eq(&self, other: &MapNode) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn len(&self) -> usize {
        self.read_data().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_data().items.is_empty()
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.read_data().items.contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.read_data().items.keys().cloned().collect()
    }

    // Reads

    pub fn get(&self, key: &str) -> Result<AttributeValue, AttributeError> {
        self.read_data()
            .items
            .get(key)
            .cloned()
            .ok_or_else(|| AttributeError::NotFound {
                key: AttrKey::from(key),
            })
    }

    pub fn get_as<T: FromAttribute>(&self, key: &str) -> Result<T, AttributeError> {
        let value = self.get(key)?;
        T::read(AttrKey::from(key), value)
    }

    fn get_or_panic<T: FromAttribute>(&self, key: &str) -> T {
        match self.get_as(key) {
            Ok(value) => value,
            Err(error) => panic!("{}", error),
        }
    }

    /// # Panics
    ///
    /// Panics if `key` is absent or does not hold an Int.
    /// Use `get_as::<i64>` for non-panicking access.
    pub fn get_int(&self, key: &str) -> i64 {
        self.get_or_panic(key)
    }

    pub fn get_float(&self, key: &str) -> f64 {
        self.get_or_panic(key)
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get_or_panic(key)
    }

    pub fn get_str(&self, key: &str) -> String {
        self.get_or_panic(key)
    }

    pub fn get_map(&self, key: &str) -> MapNode {
        self.get_or_panic(key)
    }

    pub fn get_list(&self, key: &str) -> ListNode {
        self.get_or_panic(key)
    }

    // Mutations

    /// Stores `value` under `key`, detaching whatever container was there
    ///
    /// # Panics
    ///
    /// Panics if `value` is a container that is already attached elsewhere.
    /// Consider using `try_set` for non-panicking error handling.
    pub fn set(&self, key: &str, value: impl Into<AttributeValue>) {
        if let Err(error) = self.try_set(key, value) {
            panic!("{}", error);
        }
    }

    /// Stores `value` under `key`
    ///
    /// Returns an error, leaving the map untouched, if `value` is a
    /// container that is already attached elsewhere.
    pub fn try_set(&self, key: &str, value: impl Into<AttributeValue>) -> Result<(), AttributeError> {
        let value = value.into();
        let attr_key = AttrKey::from(key);
        let this = self.as_node();
        AttrNode::check_attachable(&this, &attr_key, &value)?;

        let previous = self.write_data().items.insert(key.to_string(), value.clone());
        if let Some(previous) = previous {
            AttrNode::detach_value(&previous);
        }
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

    /// Stores a fresh live copy of every plain field. Nested plain maps and
    /// lists become new containers.
    pub fn assign_map(&self, fields: &BTreeMap<String, PlainValue>) {
        for (key, value) in fields {
            self.set(key, AttributeValue::from_plain(value));
        }
    }

    /// Removes `key`, detaching its value. Returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.pop(key).is_some()
    }

    /// Removes `key` and hands back its value, now fully detached
    pub fn pop(&self, key: &str) -> Option<AttributeValue> {
        let removed = self.write_data().items.remove(key)?;
        AttrNode::detach_value(&removed);

        let this = self.as_node();
        if let Some(notification) = Notification::for_node(&this) {
            notification.send(AttrChange::Delete {
                path: this.resolve_path(),
                key: AttrKey::from(key),
            });
        }
        Some(removed)
    }

    /// Visits entries in key order until `f` returns false. Works on a
    /// snapshot, so `f` may read or mutate this map.
    pub fn for_each(&self, mut f: impl FnMut(&str, &AttributeValue) -> bool) {
        let mut items: Vec<(String, AttributeValue)> = self
            .read_data()
            .items
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        items.sort_by(|a, b| a.0.cmp(&b.0));
        for (key, value) in &items {
            if !f(key, value) {
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

    /// Deep copy of this map into plain values
    pub fn to_map(&self) -> BTreeMap<String, PlainValue> {
        let items: Vec<(String, AttributeValue)> = self
            .read_data()
            .items
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        items
            .into_iter()
            .map(|(key, value)| (key, value.materialize()))
            .collect()
    }
}

impl Default for MapNode {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MapNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MapNode").field(&self.to_map()).finish()
    }
}
