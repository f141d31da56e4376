use std::fmt;

use serde::{Deserialize, Serialize};

use super::{BrokerId, PartitionId, TopicName};

/// Identity of a partition: owning topic plus index within that topic.
///
/// Ordering is (topic, partition index). Every ordered container in this crate
/// is keyed on this type, so iteration order, and with it every tie-break in
/// the selection heuristics, is deterministic and reproducible.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TopicPartition {
    pub topic: TopicName,
    pub partition: PartitionId,
}

impl TopicPartition {
    pub fn new(topic: impl Into<TopicName>, partition: PartitionId) -> Self {
        Self {
            topic: topic.into(),
            partition,
        }
    }

    /// Number of partitions in `others` belonging to this partition's topic.
    ///
    /// Used as a co-location penalty when picking a partition to transfer: the
    /// fewer siblings already on the destination broker, the better the topic
    /// spread after the move.
    pub fn count_siblings<'a, I>(&self, others: I) -> usize
    where
        I: IntoIterator<Item = &'a TopicPartition>,
    {
        others.into_iter().filter(|p| p.topic == self.topic).count()
    }
}

impl fmt::Display for TopicPartition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.topic, self.partition)
    }
}

/// A partition replicated across an ordered list of brokers.
///
/// The first replica is the current leader, the remainder are followers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Partition {
    pub topic: TopicName,
    pub id: PartitionId,
    pub replicas: Vec<BrokerId>,
}

impl Partition {
    pub fn new(topic: impl Into<TopicName>, id: PartitionId, replicas: Vec<BrokerId>) -> Self {
        Self {
            topic: topic.into(),
            id,
            replicas,
        }
    }

    pub fn key(&self) -> TopicPartition {
        TopicPartition {
            topic: self.topic.clone(),
            partition: self.id,
        }
    }

    /// Current leader, i.e. the first replica.
    pub fn leader(&self) -> Option<BrokerId> {
        self.replicas.first().copied()
    }

    /// Non-leader replicas, in order.
    pub fn followers(&self) -> &[BrokerId] {
        self.replicas.get(1..).unwrap_or(&[])
    }

    /// Promote `new_leader` to the front of the replica list, preserving the
    /// relative order of all other replicas.
    ///
    /// Panics if `new_leader` is not a replica of this partition; callers pick
    /// the target from `followers()`, so reaching the panic means an invariant
    /// was already broken upstream.
    pub fn swap_leader(&mut self, new_leader: BrokerId) {
        let pos = self
            .replicas
            .iter()
            .position(|&b| b == new_leader)
            .unwrap_or_else(|| {
                panic!(
                    "broker {} is not a replica of {}/{}",
                    new_leader, self.topic, self.id
                )
            });
        let broker = self.replicas.remove(pos);
        self.replicas.insert(0, broker);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leader_and_followers_follow_replica_order() {
        let partition = Partition::new("logs", 0, vec![3, 1, 2]);
        assert_eq!(partition.leader(), Some(3));
        assert_eq!(partition.followers(), &[1, 2]);
    }

    #[test]
    fn empty_partition_has_no_leader() {
        let partition = Partition::new("logs", 0, Vec::new());
        assert_eq!(partition.leader(), None);
        assert!(partition.followers().is_empty());
    }

    #[test]
    fn swap_leader_preserves_order_of_other_replicas() {
        let mut partition = Partition::new("logs", 0, vec![1, 2, 3, 4]);
        partition.swap_leader(3);
        assert_eq!(partition.replicas, vec![3, 1, 2, 4]);
        assert_eq!(partition.leader(), Some(3));
    }

    #[test]
    #[should_panic(expected = "is not a replica")]
    fn swap_leader_to_non_replica_panics() {
        let mut partition = Partition::new("logs", 0, vec![1, 2]);
        partition.swap_leader(9);
    }

    #[test]
    fn count_siblings_counts_same_topic_only() {
        let candidate = TopicPartition::new("logs", 0);
        let others = [
            TopicPartition::new("logs", 1),
            TopicPartition::new("logs", 2),
            TopicPartition::new("metrics", 0),
        ];
        assert_eq!(candidate.count_siblings(others.iter()), 2);
        assert_eq!(TopicPartition::new("events", 0).count_siblings(others.iter()), 0);
    }

    #[test]
    fn identity_orders_by_topic_then_partition() {
        let mut keys = vec![
            TopicPartition::new("metrics", 0),
            TopicPartition::new("logs", 1),
            TopicPartition::new("logs", 0),
        ];
        keys.sort();
        assert_eq!(
            keys,
            vec![
                TopicPartition::new("logs", 0),
                TopicPartition::new("logs", 1),
                TopicPartition::new("metrics", 0),
            ]
        );
    }
}
