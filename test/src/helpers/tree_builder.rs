use std::sync::Arc;

use meridian_shared::{AttributeValue, MapNode, PlainValue, VisibilityFlag};

use super::RecordingOwner;

/// A MapNode root owned by a fresh RecordingOwner
pub fn owned_root(flag: VisibilityFlag) -> (Arc<RecordingOwner>, MapNode) {
    let owner = Arc::new(RecordingOwner::new());
    let root = MapNode::new();
    root.set_owner(&owner, flag);
    (owner, root)
}

/// Builds a detached live tree mirroring `plain`
pub fn build_value(plain: &PlainValue) -> AttributeValue {
    AttributeValue::from_plain(plain)
}
