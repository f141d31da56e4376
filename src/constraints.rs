/// Constraints that control how a rebalancing pass behaves
#[derive(Debug, Clone)]
pub struct BalancingConstraints {
    /// Partition-count headroom a broker may have over a peer before the pair
    /// counts as unbalanced
    pub extra_partitions_per_broker: usize,

    /// Whether to allow replica movements
    pub allow_replica_movements: bool,

    /// Whether to allow leadership changes
    pub allow_leadership_changes: bool,
}

impl Default for BalancingConstraints {
    fn default() -> Self {
        Self {
            extra_partitions_per_broker: 1,
            allow_replica_movements: true,
            allow_leadership_changes: true,
        }
    }
}

impl BalancingConstraints {
    /// Create constraints for a preferred leader election pass only
    pub fn leader_election_only() -> Self {
        Self {
            allow_replica_movements: false,
            allow_leadership_changes: true,
            ..Default::default()
        }
    }

    /// Create constraints for evening out partition counts without moving leaders
    pub fn partition_movement_only() -> Self {
        Self {
            allow_replica_movements: true,
            allow_leadership_changes: false,
            ..Default::default()
        }
    }

    /// Check if replica movements are allowed
    pub fn can_move_replicas(&self) -> bool {
        self.allow_replica_movements
    }

    /// Check if leadership changes are allowed
    pub fn can_change_leadership(&self) -> bool {
        self.allow_leadership_changes
    }
}
