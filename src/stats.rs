use std::collections::HashMap;

use serde::Serialize;

use crate::model::{BrokerId, ClusterModel};

/// Distribution statistics over a per-broker count (partitions or leaders).
///
/// The coefficient of variation (std deviation / mean) is the balance metric:
/// unlike the raw deviation it is scale-independent, so the same threshold
/// works for small and large clusters.
#[derive(Debug, Clone, Serialize)]
pub struct ImbalanceStats {
    pub mean: f64,
    pub std_deviation: f64,
    pub coefficient_of_variation: f64,
    pub max_count: usize,
    pub min_count: usize,
    /// Brokers more than one standard deviation above the mean, ascending id.
    pub overloaded_brokers: Vec<BrokerId>,
    /// Brokers more than one standard deviation below the mean, ascending id.
    pub underloaded_brokers: Vec<BrokerId>,
}

impl ImbalanceStats {
    pub fn needs_rebalancing(&self, threshold: f64) -> bool {
        self.coefficient_of_variation > threshold
    }

    fn from_counts(counts: &HashMap<BrokerId, usize>) -> Self {
        // A meaningful imbalance needs at least two brokers.
        if counts.len() < 2 {
            return Self {
                mean: 0.0,
                std_deviation: 0.0,
                coefficient_of_variation: 0.0,
                max_count: 0,
                min_count: 0,
                overloaded_brokers: Vec::new(),
                underloaded_brokers: Vec::new(),
            };
        }

        let loads: Vec<f64> = counts.values().map(|&c| c as f64).collect();
        let mean = loads.iter().sum::<f64>() / loads.len() as f64;
        let variance =
            loads.iter().map(|load| (load - mean).powi(2)).sum::<f64>() / loads.len() as f64;
        let std_deviation = variance.sqrt();
        let coefficient_of_variation = if mean > 0.0 { std_deviation / mean } else { 0.0 };

        let max_count = counts.values().copied().max().unwrap_or(0);
        let min_count = counts.values().copied().min().unwrap_or(0);

        let mut overloaded_brokers = Vec::new();
        let mut underloaded_brokers = Vec::new();
        for (&broker, &count) in counts {
            let load = count as f64;
            if load > mean + std_deviation {
                overloaded_brokers.push(broker);
            } else if load < mean - std_deviation {
                underloaded_brokers.push(broker);
            }
        }
        overloaded_brokers.sort_unstable();
        underloaded_brokers.sort_unstable();

        Self {
            mean,
            std_deviation,
            coefficient_of_variation,
            max_count,
            min_count,
            overloaded_brokers,
            underloaded_brokers,
        }
    }
}

/// Partition-count balance across all brokers.
pub fn partition_imbalance(cluster: &ClusterModel) -> ImbalanceStats {
    let counts: HashMap<BrokerId, usize> = cluster
        .brokers
        .values()
        .map(|b| (b.id, b.partition_count()))
        .collect();
    ImbalanceStats::from_counts(&counts)
}

/// Leader-count balance across all brokers.
pub fn leader_imbalance(cluster: &ClusterModel) -> ImbalanceStats {
    ImbalanceStats::from_counts(&cluster.leaders_per_broker())
}

/// Per-broker leader-count target for a leadership-balancing pass.
pub fn opt_leader_count(cluster: &ClusterModel) -> usize {
    if cluster.brokers.is_empty() {
        0
    } else {
        cluster.partitions.len() / cluster.brokers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Broker;

    fn cluster_with(partition_spread: &[(BrokerId, &[(&str, u32)])]) -> ClusterModel {
        let mut cluster = ClusterModel::new();
        for &(id, _) in partition_spread {
            cluster.add_broker(Broker::new(id));
        }
        for &(id, partitions) in partition_spread {
            for &(topic, p) in partitions {
                cluster.create_partition(topic, p, &[id]).unwrap();
            }
        }
        cluster
    }

    #[test]
    fn partition_imbalance_flags_the_outlier() {
        let cluster = cluster_with(&[
            (1, &[("logs", 0), ("logs", 1), ("logs", 2), ("logs", 3)]),
            (2, &[("metrics", 0)]),
            (3, &[("events", 0)]),
        ]);

        let stats = partition_imbalance(&cluster);
        assert_eq!(stats.mean, 2.0);
        assert_eq!(stats.max_count, 4);
        assert_eq!(stats.min_count, 1);
        assert_eq!(stats.overloaded_brokers, vec![1]);
        assert!(stats.underloaded_brokers.is_empty());
        assert!(stats.needs_rebalancing(0.5));
        assert!(!stats.needs_rebalancing(0.8));
    }

    #[test]
    fn leader_imbalance_follows_leadership_not_membership() {
        let mut cluster = ClusterModel::new();
        for id in [1, 2] {
            cluster.add_broker(Broker::new(id));
        }
        // Both brokers replicate everything, broker 1 leads everything.
        cluster.create_partition("logs", 0, &[1, 2]).unwrap();
        cluster.create_partition("logs", 1, &[1, 2]).unwrap();

        assert_eq!(partition_imbalance(&cluster).coefficient_of_variation, 0.0);
        let leaders = leader_imbalance(&cluster);
        assert_eq!(leaders.mean, 1.0);
        assert_eq!(leaders.max_count, 2);
        assert_eq!(leaders.min_count, 0);
    }

    #[test]
    fn degenerate_clusters_report_as_balanced() {
        let single = cluster_with(&[(1, &[("logs", 0)])]);
        let stats = partition_imbalance(&single);
        assert_eq!(stats.coefficient_of_variation, 0.0);
        assert!(!stats.needs_rebalancing(0.0));
    }

    #[test]
    fn opt_leader_count_is_the_floor_of_the_average() {
        let cluster = cluster_with(&[
            (1, &[("logs", 0), ("logs", 1), ("logs", 2)]),
            (2, &[("metrics", 0)]),
        ]);
        assert_eq!(opt_leader_count(&cluster), 2);
        assert_eq!(opt_leader_count(&ClusterModel::new()), 0);
    }
}
