use std::ops::BitOr;

use super::value::{AttrKey, AttrPath, PlainValue};

/// Audience a subtree's mutations are replicated to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VisibilityFlag(u8);

impl VisibilityFlag {
    /// Server-only state, never replicated
    pub const NONE: Self = Self(0);
    /// Replicated to the owning entity's own client
    pub const OWN_CLIENT: Self = Self(1 << 0);
    /// Replicated to every client that can see the owning entity
    pub const ALL_CLIENTS: Self = Self(1 << 1);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u8 {
        self.0
    }

    pub const fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_client_visible(&self) -> bool {
        self.0 & (Self::OWN_CLIENT.0 | Self::ALL_CLIENTS.0) != 0
    }
}

impl BitOr for VisibilityFlag {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// A single structural change made to an owned attribute container.
///
/// `path` always addresses the container that was mutated, never the
/// changed element itself.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrChange {
    /// `key` inside the container at `path` now holds `value`
    Set {
        path: AttrPath,
        key: AttrKey,
        value: PlainValue,
    },
    /// `value` was pushed onto the end of the list at `path`
    Append { path: AttrPath, value: PlainValue },
    /// The last element of the list at `path` was removed
    Pop { path: AttrPath },
    /// `key` was removed from the map at `path`
    Delete { path: AttrPath, key: AttrKey },
}

impl AttrChange {
    pub fn path(&self) -> &AttrPath {
        match self {
            AttrChange::Set { path, .. }
            | AttrChange::Append { path, .. }
            | AttrChange::Pop { path }
            | AttrChange::Delete { path, .. } => path,
        }
    }
}

/// Implemented by the entity at the root of an attribute tree.
///
/// Trees hold their owner weakly; a dropped owner simply stops receiving
/// changes.
pub trait AttributeOwner: Send + Sync {
    /// Called synchronously, once per structural mutation, before the
    /// mutating call returns. Filtering by `flag` and turning the change
    /// into an outbound message is up to the owner.
    fn on_attr_change(&self, flag: VisibilityFlag, change: AttrChange);

    /// Keys leading from the owner to its root container
    fn root_path(&self) -> AttrPath {
        AttrPath::new()
    }
}
