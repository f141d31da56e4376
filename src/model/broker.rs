use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::plan::Action;
use crate::resolver::{HostResolver, DEFAULT_HOSTNAME};
use crate::RebalancerError;

use super::{BrokerId, Partition, TopicName, TopicPartition};

/// A node in the cluster holding replicas of zero or more partitions.
///
/// The membership set and each partition's replica list are two views of the
/// same relation. `add_partition` and `remove_partition` are the only ways
/// membership changes, and both update the two sides within the same call, so
/// the relation stays bidirectionally consistent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Broker {
    pub id: BrokerId,
    partitions: BTreeSet<TopicPartition>,
}

impl Broker {
    pub fn new(id: BrokerId) -> Self {
        Self {
            id,
            partitions: BTreeSet::new(),
        }
    }

    /// Identities of the partitions replicated here, in (topic, partition) order.
    pub fn partitions(&self) -> impl Iterator<Item = &TopicPartition> {
        self.partitions.iter()
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.len()
    }

    pub fn has_partition(&self, partition: &TopicPartition) -> bool {
        self.partitions.contains(partition)
    }

    /// Distinct topics currently replicated on this broker.
    pub fn topics(&self) -> BTreeSet<&TopicName> {
        self.partitions.iter().map(|p| &p.topic).collect()
    }

    /// Count of this broker's partitions belonging to `topic`.
    pub fn count_partitions(&self, topic: &str) -> usize {
        self.partitions.iter().filter(|p| p.topic == topic).count()
    }

    /// Number of partitions for which this broker is the current leader.
    pub fn count_preferred_replica(
        &self,
        partitions: &BTreeMap<TopicPartition, Partition>,
    ) -> usize {
        self.partitions
            .iter()
            .filter(|key| partitions.get(key).and_then(Partition::leader) == Some(self.id))
            .count()
    }

    /// Hostname of this broker per the coordination service, falling back to
    /// `"localhost"` when the lookup fails.
    ///
    /// The hostname is advisory (diagnostics, reporting) and never feeds a
    /// rebalancing decision, so a failed lookup warns instead of erroring.
    pub fn hostname(&self, resolver: &dyn HostResolver) -> String {
        match resolver.lookup(self.id) {
            Some(host) => host,
            None => {
                warn!(broker_id = self.id, "unknown host for broker, returning localhost");
                DEFAULT_HOSTNAME.to_owned()
            }
        }
    }

    /// Add `partition` to this broker and append the broker to its replica list.
    ///
    /// Appending never reorders existing replicas, so the broker never becomes
    /// leader as a side effect. Panics if the partition is already replicated
    /// here: eligibility selection is expected to rule that out, so hitting it
    /// means the caller bypassed the checks.
    pub fn add_partition(&mut self, partition: &mut Partition) {
        let inserted = self.partitions.insert(partition.key());
        assert!(
            inserted,
            "partition {}/{} already replicated on broker {}",
            partition.topic, partition.id, self.id
        );
        partition.replicas.push(self.id);
    }

    /// Remove `partition` from this broker and drop the broker from its replica
    /// list.
    ///
    /// When the removed broker was the leader, the next replica in order takes
    /// over (the replica list shifts left). Errors without mutating anything if
    /// the partition is not replicated here.
    pub fn remove_partition(&mut self, partition: &mut Partition) -> Result<(), RebalancerError> {
        if !self.partitions.remove(&partition.key()) {
            return Err(RebalancerError::PartitionNotFound {
                topic: partition.topic.clone(),
                partition: partition.id,
                broker: self.id,
            });
        }
        partition.replicas.retain(|&b| b != self.id);
        Ok(())
    }

    /// Reduce this broker's leader count toward `opt_count` by handing
    /// leadership to eligible followers, one partition at a time.
    ///
    /// Candidates are the partitions this broker leads that have more than one
    /// replica, visited in (topic, partition) order. A follower is eligible
    /// when promoting it keeps it at or under `opt_count` and the gap between
    /// the two counts is more than one, so a swap always strictly improves
    /// balance and two brokers can never trade the same leadership back and
    /// forth. The pass stops as soon as the count reaches `opt_count` and never
    /// pushes it below; with no eligible follower left it stops having made as
    /// much progress as it could.
    ///
    /// `leaders_per_broker` is owned by the caller for the duration of one
    /// rebalancing pass and must contain an entry for this broker and for every
    /// follower encountered; a missing entry is a caller bug and panics.
    ///
    /// Returns the leader elections performed.
    pub fn decrease_leader_count(
        &self,
        partitions: &mut BTreeMap<TopicPartition, Partition>,
        leaders_per_broker: &mut HashMap<BrokerId, usize>,
        opt_count: usize,
    ) -> Vec<Action> {
        let mut swaps = Vec::new();
        for partition in partitions.values_mut() {
            let own_count = leaders_per_broker[&self.id];
            if own_count <= opt_count {
                break;
            }
            if partition.leader() != Some(self.id) || partition.replicas.len() <= 1 {
                continue;
            }
            let new_leader = partition.followers().iter().copied().find(|follower| {
                let follower_count = leaders_per_broker[follower];
                follower_count <= opt_count && own_count > follower_count + 1
            });
            if let Some(new_leader) = new_leader {
                partition.swap_leader(new_leader);
                if let Some(count) = leaders_per_broker.get_mut(&new_leader) {
                    *count += 1;
                }
                if let Some(count) = leaders_per_broker.get_mut(&self.id) {
                    *count -= 1;
                }
                debug!(
                    topic = %partition.topic,
                    partition = partition.id,
                    from = self.id,
                    to = new_leader,
                    "leadership swapped"
                );
                swaps.push(Action::ElectLeader {
                    topic: partition.topic.clone(),
                    partition: partition.id,
                    old_leader: self.id,
                    new_leader,
                });
            }
        }
        swaps
    }

    /// Pick the best partition to transfer from this broker to `destination`.
    ///
    /// Valid candidates are the partitions `destination` does not already
    /// replicate (moving a shared one would put two replicas of the same
    /// partition on one broker). Among those, the candidate with the fewest
    /// siblings among `destination`'s own partitions wins; ties fall to the
    /// first candidate in (topic, partition) order, an ordering convention
    /// rather than a semantic guarantee. Returns the chosen identity together
    /// with its sibling count, or `NoEligiblePartition` when no legal move
    /// exists so the caller can skip the pair.
    pub fn get_eligible_partition(
        &self,
        destination: &Broker,
    ) -> Result<(TopicPartition, usize), RebalancerError> {
        let valid_dest: Vec<&TopicPartition> =
            destination.partitions.difference(&self.partitions).collect();
        self.partitions
            .difference(&destination.partitions)
            .map(|candidate| {
                let siblings = candidate.count_siblings(valid_dest.iter().copied());
                (candidate, siblings)
            })
            .min_by_key(|&(_, siblings)| siblings)
            .map(|(candidate, siblings)| (candidate.clone(), siblings))
            .ok_or(RebalancerError::NoEligiblePartition {
                source_broker: self.id,
                destination: destination.id,
            })
    }

    /// True when this broker holds more than `extra_partitions_per_broker`
    /// partitions above `other`.
    ///
    /// Pure predicate; the orchestrator uses it to decide whether a pair is
    /// worth rebalancing at all.
    pub fn is_relatively_unbalanced(
        &self,
        other: &Broker,
        extra_partitions_per_broker: usize,
    ) -> bool {
        self.partitions.len().saturating_sub(other.partitions.len())
            > extra_partitions_per_broker
    }
}
