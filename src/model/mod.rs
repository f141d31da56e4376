// Type aliases used across the model
pub type BrokerId = u32;
pub type TopicName = String;
pub type PartitionId = u32;

// Module declarations
mod broker;
mod cluster;
mod partition;

// Re-exports
pub use broker::Broker;
pub use cluster::ClusterModel;
pub use partition::{Partition, TopicPartition};
