//! # Meridian Shared
//! Replicable entity state shared by every Meridian server process: map and
//! list attribute nodes that track their owning entity, their position in
//! the tree, and emit a minimal structural change for every mutation.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod attributes;

pub use attributes::{
    error::AttributeError,
    list_node::ListNode,
    map_node::MapNode,
    node::AttrNode,
    owner::{AttrChange, AttributeOwner, VisibilityFlag},
    value::{AttrKey, AttrPath, AttributeValue, FromAttribute, PlainValue},
};
