pub mod tree_builder;

pub use assertions::{collect_nodes, naive_path, wait_until};
pub use recording_delegate::{DelegateEvent, RecordingDelegate};
pub use recording_owner::RecordingOwner;
pub use tree_builder::{build_value, owned_root};
