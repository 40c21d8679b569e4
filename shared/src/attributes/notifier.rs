use std::sync::Arc;

use log::trace;

use super::{
    node::AttrNode,
    owner::{AttrChange, AttributeOwner, VisibilityFlag},
};

/// A live owner captured right after a mutation. Holding no node lock, so
/// the owner may freely read the tree from inside its callback.
pub(crate) struct Notification {
    owner: Arc<dyn AttributeOwner>,
    flag: VisibilityFlag,
}

impl Notification {
    /// Returns `None` when the container is detached or its owner is gone
    pub fn for_node(node: &AttrNode) -> Option<Self> {
        let (owner, flag) = node.owner_and_flag();
        let owner = owner?.upgrade()?;
        Some(Self { owner, flag })
    }

    pub fn send(self, change: AttrChange) {
        trace!("attribute change (flag {:#04b}): {:?}", self.flag.bits(), change);
        self.owner.on_attr_change(self.flag, change);
    }
}
