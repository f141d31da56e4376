use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{BrokerId, ClusterModel, PartitionId, TopicName};

/// A reassignment the core has applied to the model and the orchestrator still
/// has to apply to the live cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Move a replica from one broker to another
    MoveReplica {
        topic: TopicName,
        partition: PartitionId,
        from_broker: BrokerId,
        to_broker: BrokerId,
    },

    /// Elect a new leader for a partition
    ElectLeader {
        topic: TopicName,
        partition: PartitionId,
        old_leader: BrokerId,
        new_leader: BrokerId,
    },
}

impl Action {
    /// Get the brokers affected by this action
    pub fn affected_brokers(&self) -> Vec<BrokerId> {
        match self {
            Action::MoveReplica {
                from_broker,
                to_broker,
                ..
            } => vec![*from_broker, *to_broker],
            Action::ElectLeader {
                old_leader,
                new_leader,
                ..
            } => vec![*old_leader, *new_leader],
        }
    }

    pub fn is_leader_movement(&self) -> bool {
        matches!(self, Action::ElectLeader { .. })
    }

    /// Get a human-readable description
    pub fn description(&self) -> String {
        match self {
            Action::MoveReplica {
                topic,
                partition,
                from_broker,
                to_broker,
            } => format!(
                "Move replica of {}/{} from broker {} to {}",
                topic, partition, from_broker, to_broker
            ),
            Action::ElectLeader {
                topic,
                partition,
                old_leader,
                new_leader,
            } => format!(
                "Elect broker {} as leader for {}/{} (was {})",
                new_leader, topic, partition, old_leader
            ),
        }
    }
}

/// A complete rebalancing plan with ordered actions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalancePlan {
    pub actions: Vec<Action>,
    pub metadata: PlanMetadata,
}

impl RebalancePlan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self {
            actions,
            metadata: PlanMetadata::default(),
        }
    }

    pub fn push(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn extend(&mut self, actions: impl IntoIterator<Item = Action>) {
        self.actions.extend(actions);
    }

    /// Check if this plan is empty
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Get summary statistics
    pub fn summary(&self) -> PlanSummary {
        let leader_election_count = self
            .actions
            .iter()
            .filter(|a| a.is_leader_movement())
            .count();
        PlanSummary {
            total_actions: self.actions.len(),
            move_count: self.actions.len() - leader_election_count,
            leader_election_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub created_at: Option<DateTime<Utc>>,
    pub cluster_stats: Option<ClusterStats>,
}

impl Default for PlanMetadata {
    fn default() -> Self {
        Self {
            created_at: Some(Utc::now()),
            cluster_stats: None,
        }
    }
}

/// Size of the cluster a plan was computed against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterStats {
    pub broker_count: usize,
    pub topic_count: usize,
    pub partition_count: usize,
    pub replica_count: usize,
}

impl ClusterStats {
    pub fn for_cluster(cluster: &ClusterModel) -> Self {
        let topics: BTreeSet<&TopicName> =
            cluster.all_partitions().map(|p| &p.topic).collect();
        Self {
            broker_count: cluster.brokers.len(),
            topic_count: topics.len(),
            partition_count: cluster.partitions.len(),
            replica_count: cluster.all_partitions().map(|p| p.replicas.len()).sum(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlanSummary {
    pub total_actions: usize,
    pub move_count: usize,
    pub leader_election_count: usize,
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total Actions: {}, Moves: {}, Leader Elections: {}",
            self.total_actions, self.move_count, self.leader_election_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Broker;

    fn sample_actions() -> Vec<Action> {
        vec![
            Action::MoveReplica {
                topic: "logs".to_string(),
                partition: 0,
                from_broker: 1,
                to_broker: 2,
            },
            Action::ElectLeader {
                topic: "logs".to_string(),
                partition: 1,
                old_leader: 1,
                new_leader: 3,
            },
        ]
    }

    #[test]
    fn summary_splits_moves_from_elections() {
        let plan = RebalancePlan::new(sample_actions());
        let summary = plan.summary();
        assert_eq!(summary.total_actions, 2);
        assert_eq!(summary.move_count, 1);
        assert_eq!(summary.leader_election_count, 1);
        assert_eq!(
            summary.to_string(),
            "Total Actions: 2, Moves: 1, Leader Elections: 1"
        );
    }

    #[test]
    fn affected_brokers_and_descriptions() {
        let actions = sample_actions();
        assert_eq!(actions[0].affected_brokers(), vec![1, 2]);
        assert_eq!(actions[1].affected_brokers(), vec![1, 3]);
        assert_eq!(
            actions[0].description(),
            "Move replica of logs/0 from broker 1 to 2"
        );
        assert!(actions[1].description().contains("Elect broker 3"));
    }

    #[test]
    fn cluster_stats_count_the_whole_topology() {
        let mut cluster = ClusterModel::new();
        for id in [1, 2] {
            cluster.add_broker(Broker::new(id));
        }
        cluster.create_partition("logs", 0, &[1, 2]).unwrap();
        cluster.create_partition("metrics", 0, &[2]).unwrap();

        let stats = ClusterStats::for_cluster(&cluster);
        assert_eq!(stats.broker_count, 2);
        assert_eq!(stats.topic_count, 2);
        assert_eq!(stats.partition_count, 2);
        assert_eq!(stats.replica_count, 3);
    }

    #[test]
    fn plans_serialize_for_the_outer_tooling() {
        let plan = RebalancePlan::new(sample_actions());
        let json = serde_json::to_string(&plan).unwrap();
        assert!(json.contains("MoveReplica"));
        assert!(json.contains("ElectLeader"));
        let parsed: RebalancePlan = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.actions, plan.actions);
    }
}
