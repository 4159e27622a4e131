pub mod builder;
pub mod interface;
pub mod manager;
pub mod subscription;
pub mod types;

pub use builder::ConnectionBuilder;
pub use interface::LifecycleHandlers;
pub use manager::ConnectionManager;
pub use subscription::{SubscriptionCallback, SubscriptionId};
pub use types::{ConnectionConfig, DEFAULT_ROOT_ID};
