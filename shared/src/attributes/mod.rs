pub mod error;
pub mod list_node;
pub mod map_node;
pub mod node;
pub mod owner;
pub mod value;

mod notifier;
