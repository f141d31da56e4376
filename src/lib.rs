//! Broker-local rebalancing core for a partitioned, replicated messaging store.
//!
//! Given a cluster of brokers replicating topic partitions, this crate provides
//! the invariant-preserving mutation operations (add/remove/move a replica,
//! swap a partition's leader) and the greedy selection heuristics (transfer
//! eligibility, leader demotion) that a cluster-level orchestration loop
//! composes into a full rebalancing run. The orchestrator owns pair selection
//! and convergence; the core guarantees that a broker never holds two replicas
//! of the same partition and that a partition's leader is always one of its
//! current replica holders.

pub mod constraints;
pub mod model;
pub mod plan;
pub mod resolver;
pub mod stats;

use std::collections::HashMap;

use tracing::info;

pub use constraints::BalancingConstraints;
pub use model::{
    Broker, BrokerId, ClusterModel, Partition, PartitionId, TopicName, TopicPartition,
};
pub use plan::{Action, PlanSummary, RebalancePlan};
pub use resolver::{HostResolver, StaticHostResolver, DEFAULT_HOSTNAME};

#[derive(Debug, thiserror::Error)]
pub enum RebalancerError {
    #[error("partition {topic}:{partition} not found on broker {broker}")]
    PartitionNotFound {
        topic: TopicName,
        partition: PartitionId,
        broker: BrokerId,
    },

    #[error("no eligible partition to move from broker {source_broker} to broker {destination}")]
    NoEligiblePartition {
        source_broker: BrokerId,
        destination: BrokerId,
    },

    #[error("broker {broker} already holds a replica of {topic}:{partition}")]
    ReplicaAlreadyAssigned {
        topic: TopicName,
        partition: PartitionId,
        broker: BrokerId,
    },

    #[error("unknown broker: {0}")]
    UnknownBroker(BrokerId),

    #[error("unknown partition: {0}")]
    UnknownPartition(TopicPartition),

    #[error("invalid cluster state: {0}")]
    InvalidClusterState(String),
}

/// Main entry point for driving rebalancing passes over a cluster model.
///
/// One `Rebalancer` holds the constraints for a pass; the orchestrator picks
/// broker pairs, calls these methods one step at a time and folds the returned
/// actions into a [`RebalancePlan`] to apply to the live cluster.
pub struct Rebalancer {
    constraints: BalancingConstraints,
}

impl Rebalancer {
    pub fn new(constraints: BalancingConstraints) -> Self {
        Self { constraints }
    }

    pub fn constraints(&self) -> &BalancingConstraints {
        &self.constraints
    }

    /// Attempt a single partition transfer from `source` to `destination`.
    ///
    /// Returns `Ok(None)` when the pair is not worth rebalancing: replica
    /// movements disabled, the pair within the allowed slack, or no legal move
    /// between the two. `Ok(Some(action))` means the move has already been
    /// applied to the model.
    pub fn transfer_partition(
        &self,
        cluster: &mut ClusterModel,
        source: BrokerId,
        destination: BrokerId,
    ) -> Result<Option<Action>, RebalancerError> {
        if !self.constraints.can_move_replicas() {
            return Ok(None);
        }
        let (key, siblings) = {
            let source_broker = cluster
                .broker(source)
                .ok_or(RebalancerError::UnknownBroker(source))?;
            let dest_broker = cluster
                .broker(destination)
                .ok_or(RebalancerError::UnknownBroker(destination))?;
            if !source_broker
                .is_relatively_unbalanced(dest_broker, self.constraints.extra_partitions_per_broker)
            {
                return Ok(None);
            }
            match source_broker.get_eligible_partition(dest_broker) {
                Ok(selection) => selection,
                Err(RebalancerError::NoEligiblePartition { .. }) => return Ok(None),
                Err(err) => return Err(err),
            }
        };
        cluster.move_partition(&key, source, destination)?;
        info!(partition = %key, from = source, to = destination, siblings, "transferred partition");
        Ok(Some(Action::MoveReplica {
            topic: key.topic,
            partition: key.partition,
            from_broker: source,
            to_broker: destination,
        }))
    }

    /// Reduce `broker`'s leader count toward `opt_count` by promoting eligible
    /// followers.
    ///
    /// Returns the leader elections performed, already applied to the model;
    /// empty when leadership changes are disabled or no eligible follower
    /// exists. `leaders_per_broker` is the caller-owned counts map for the
    /// current pass (see [`ClusterModel::leaders_per_broker`]).
    pub fn shed_leadership(
        &self,
        cluster: &mut ClusterModel,
        broker: BrokerId,
        leaders_per_broker: &mut HashMap<BrokerId, usize>,
        opt_count: usize,
    ) -> Result<Vec<Action>, RebalancerError> {
        if !self.constraints.can_change_leadership() {
            return Ok(Vec::new());
        }
        cluster.decrease_leader_count(broker, leaders_per_broker, opt_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_broker_cluster() -> ClusterModel {
        let mut cluster = ClusterModel::new();
        for id in [1, 2] {
            cluster.add_broker(Broker::new(id));
        }
        for p in 0..3 {
            cluster.create_partition("logs", p, &[1]).unwrap();
        }
        cluster
    }

    #[test]
    fn transfer_respects_the_movement_toggle() {
        let mut cluster = two_broker_cluster();
        let rebalancer = Rebalancer::new(BalancingConstraints::leader_election_only());
        let action = rebalancer.transfer_partition(&mut cluster, 1, 2).unwrap();
        assert!(action.is_none());
        assert_eq!(cluster.broker(1).unwrap().partition_count(), 3);
    }

    #[test]
    fn transfer_skips_balanced_pairs() {
        let mut cluster = two_broker_cluster();
        let rebalancer = Rebalancer::new(BalancingConstraints {
            extra_partitions_per_broker: 5,
            ..Default::default()
        });
        let action = rebalancer.transfer_partition(&mut cluster, 1, 2).unwrap();
        assert!(action.is_none());
    }

    #[test]
    fn transfer_moves_one_partition_and_reports_it() {
        let mut cluster = two_broker_cluster();
        let rebalancer = Rebalancer::new(BalancingConstraints::default());
        let action = rebalancer
            .transfer_partition(&mut cluster, 1, 2)
            .unwrap()
            .expect("pair is unbalanced");
        assert_eq!(
            action,
            Action::MoveReplica {
                topic: "logs".to_string(),
                partition: 0,
                from_broker: 1,
                to_broker: 2,
            }
        );
        assert_eq!(cluster.broker(1).unwrap().partition_count(), 2);
        assert_eq!(cluster.broker(2).unwrap().partition_count(), 1);
        cluster.validate().unwrap();
    }

    #[test]
    fn transfer_rejects_unknown_brokers() {
        let mut cluster = two_broker_cluster();
        let rebalancer = Rebalancer::new(BalancingConstraints::default());
        let err = rebalancer.transfer_partition(&mut cluster, 1, 9).unwrap_err();
        assert!(matches!(err, RebalancerError::UnknownBroker(9)));
    }

    #[test]
    fn shed_leadership_respects_the_leadership_toggle() {
        let mut cluster = ClusterModel::new();
        for id in [1, 2] {
            cluster.add_broker(Broker::new(id));
        }
        cluster.create_partition("logs", 0, &[1, 2]).unwrap();
        cluster.create_partition("logs", 1, &[1, 2]).unwrap();
        let mut leaders = cluster.leaders_per_broker();

        let rebalancer = Rebalancer::new(BalancingConstraints::partition_movement_only());
        let swaps = rebalancer
            .shed_leadership(&mut cluster, 1, &mut leaders, 1)
            .unwrap();
        assert!(swaps.is_empty());
        assert_eq!(leaders[&1], 2);
    }
}
