use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use crate::plan::Action;
use crate::RebalancerError;

use super::{Broker, BrokerId, Partition, PartitionId, TopicName, TopicPartition};

/// The broker/partition graph for one rebalancing run.
///
/// Brokers and partitions reference each other through ids rather than direct
/// references, and every mutation goes through an operation that updates both
/// sides of the relation within the same call. The fields are public so
/// topology loaders and orchestrators can read them freely; mutating them
/// directly bypasses the consistency guarantees, which `validate` can audit.
#[derive(Debug, Clone, Default)]
pub struct ClusterModel {
    pub brokers: HashMap<BrokerId, Broker>,
    pub partitions: BTreeMap<TopicPartition, Partition>,
}

impl ClusterModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_broker(&mut self, broker: Broker) {
        self.brokers.insert(broker.id, broker);
    }

    pub fn broker(&self, id: BrokerId) -> Option<&Broker> {
        self.brokers.get(&id)
    }

    pub fn partition(&self, key: &TopicPartition) -> Option<&Partition> {
        self.partitions.get(key)
    }

    /// All partitions in (topic, partition) order.
    pub fn all_partitions(&self) -> impl Iterator<Item = &Partition> {
        self.partitions.values()
    }

    /// Register a partition replicated on `replicas`, given leader-first.
    ///
    /// Entry point for topology loading; the replica brokers must already be
    /// registered. Nothing is mutated on error.
    pub fn create_partition(
        &mut self,
        topic: impl Into<TopicName>,
        id: PartitionId,
        replicas: &[BrokerId],
    ) -> Result<(), RebalancerError> {
        let topic = topic.into();
        let key = TopicPartition::new(topic.clone(), id);
        if self.partitions.contains_key(&key) {
            return Err(RebalancerError::InvalidClusterState(format!(
                "partition {key} already exists"
            )));
        }
        for broker_id in replicas {
            if !self.brokers.contains_key(broker_id) {
                return Err(RebalancerError::UnknownBroker(*broker_id));
            }
        }
        let mut partition = Partition::new(topic, id, Vec::new());
        for broker_id in replicas {
            if let Some(broker) = self.brokers.get_mut(broker_id) {
                broker.add_partition(&mut partition);
            }
        }
        self.partitions.insert(key, partition);
        Ok(())
    }

    /// Add a replica of an existing partition to `broker`.
    pub fn add_replica(
        &mut self,
        broker_id: BrokerId,
        key: &TopicPartition,
    ) -> Result<(), RebalancerError> {
        let partition = self
            .partitions
            .get_mut(key)
            .ok_or_else(|| RebalancerError::UnknownPartition(key.clone()))?;
        let broker = self
            .brokers
            .get_mut(&broker_id)
            .ok_or(RebalancerError::UnknownBroker(broker_id))?;
        broker.add_partition(partition);
        Ok(())
    }

    /// Remove the replica of `key` held by `broker`.
    ///
    /// Removing the leader replica promotes the next replica in order; see
    /// [`Broker::remove_partition`].
    pub fn remove_replica(
        &mut self,
        broker_id: BrokerId,
        key: &TopicPartition,
    ) -> Result<(), RebalancerError> {
        let partition = self
            .partitions
            .get_mut(key)
            .ok_or_else(|| RebalancerError::UnknownPartition(key.clone()))?;
        let broker = self
            .brokers
            .get_mut(&broker_id)
            .ok_or(RebalancerError::UnknownBroker(broker_id))?;
        broker.remove_partition(partition)
    }

    /// Move one replica of `key` from `source` to `destination`.
    ///
    /// All failure conditions are checked before any mutation: the destination
    /// must exist and must not already hold the partition, the partition must
    /// exist, and the source must hold it. A failed move therefore leaves the
    /// model untouched, and a successful one is atomic from the caller's point
    /// of view.
    pub fn move_partition(
        &mut self,
        key: &TopicPartition,
        source: BrokerId,
        destination: BrokerId,
    ) -> Result<(), RebalancerError> {
        match self.brokers.get(&destination) {
            None => return Err(RebalancerError::UnknownBroker(destination)),
            Some(dest) if dest.has_partition(key) => {
                return Err(RebalancerError::ReplicaAlreadyAssigned {
                    topic: key.topic.clone(),
                    partition: key.partition,
                    broker: destination,
                })
            }
            Some(_) => {}
        }
        let partition = self
            .partitions
            .get_mut(key)
            .ok_or_else(|| RebalancerError::UnknownPartition(key.clone()))?;
        self.brokers
            .get_mut(&source)
            .ok_or(RebalancerError::UnknownBroker(source))?
            .remove_partition(partition)?;
        // Destination presence and absence of the replica were checked above,
        // so the add half cannot fail.
        if let Some(dest) = self.brokers.get_mut(&destination) {
            dest.add_partition(partition);
        }
        debug!(partition = %key, from = source, to = destination, "replica moved");
        Ok(())
    }

    /// Reduce `broker`'s leader count toward `opt_count`; id-resolving wrapper
    /// around [`Broker::decrease_leader_count`].
    pub fn decrease_leader_count(
        &mut self,
        broker_id: BrokerId,
        leaders_per_broker: &mut HashMap<BrokerId, usize>,
        opt_count: usize,
    ) -> Result<Vec<Action>, RebalancerError> {
        let broker = self
            .brokers
            .get(&broker_id)
            .ok_or(RebalancerError::UnknownBroker(broker_id))?;
        Ok(broker.decrease_leader_count(&mut self.partitions, leaders_per_broker, opt_count))
    }

    /// Best partition to transfer between a broker pair; id-resolving wrapper
    /// around [`Broker::get_eligible_partition`].
    pub fn get_eligible_partition(
        &self,
        source: BrokerId,
        destination: BrokerId,
    ) -> Result<(TopicPartition, usize), RebalancerError> {
        let source_broker = self
            .brokers
            .get(&source)
            .ok_or(RebalancerError::UnknownBroker(source))?;
        let dest_broker = self
            .brokers
            .get(&destination)
            .ok_or(RebalancerError::UnknownBroker(destination))?;
        source_broker.get_eligible_partition(dest_broker)
    }

    /// Leader count per broker, with every registered broker present (zero when
    /// it leads nothing).
    ///
    /// Builds the mutable counts map an orchestrator owns for the duration of
    /// one leadership-balancing pass.
    pub fn leaders_per_broker(&self) -> HashMap<BrokerId, usize> {
        let mut counts: HashMap<BrokerId, usize> =
            self.brokers.keys().map(|&id| (id, 0)).collect();
        for partition in self.partitions.values() {
            if let Some(leader) = partition.leader() {
                if let Some(count) = counts.get_mut(&leader) {
                    *count += 1;
                }
            }
        }
        counts
    }

    /// Audit the bidirectional membership relation and replica-list shape.
    ///
    /// Checks that every broker membership is mirrored in the partition's
    /// replica list, every replica entry is mirrored in a broker's membership
    /// set, no replica list holds a broker twice, and no live partition is
    /// replica-less. Reports the first breach found.
    pub fn validate(&self) -> Result<(), RebalancerError> {
        for broker in self.brokers.values() {
            for key in broker.partitions() {
                let partition = self.partitions.get(key).ok_or_else(|| {
                    RebalancerError::InvalidClusterState(format!(
                        "broker {} references unknown partition {}",
                        broker.id, key
                    ))
                })?;
                if !partition.replicas.contains(&broker.id) {
                    return Err(RebalancerError::InvalidClusterState(format!(
                        "broker {} holds {} but is missing from its replica list",
                        broker.id, key
                    )));
                }
            }
        }
        for partition in self.partitions.values() {
            if partition.replicas.is_empty() {
                return Err(RebalancerError::InvalidClusterState(format!(
                    "partition {}/{} has no replicas",
                    partition.topic, partition.id
                )));
            }
            let mut seen = HashSet::new();
            for &replica in &partition.replicas {
                if !seen.insert(replica) {
                    return Err(RebalancerError::InvalidClusterState(format!(
                        "partition {}/{} lists broker {} twice",
                        partition.topic, partition.id, replica
                    )));
                }
                let broker = self.brokers.get(&replica).ok_or_else(|| {
                    RebalancerError::InvalidClusterState(format!(
                        "partition {}/{} references unknown broker {}",
                        partition.topic, partition.id, replica
                    ))
                })?;
                if !broker.has_partition(&partition.key()) {
                    return Err(RebalancerError::InvalidClusterState(format!(
                        "partition {}/{} replica on broker {} is not in its membership set",
                        partition.topic, partition.id, replica
                    )));
                }
            }
        }
        Ok(())
    }
}
